use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, instrument};

use super::{SavedItemStore, StoreError};
use crate::model::SavedItem;

/// Local `saved_tweets` table with the same columns as the remote one.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let normalized = prepare_sqlite_url(database_url);
        let options = SqliteConnectOptions::from_str(&normalized)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` is its own database, so keep exactly one alive.
        let pool = if is_memory_url(&normalized) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        }
        .connect_with(options)
        .await?;
        if !is_memory_url(&normalized) {
            sqlx::query("PRAGMA journal_mode=WAL;")
                .execute(&pool)
                .await?;
        }
        let store = Self::from_pool(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.starts_with("sqlite::memory") || url.contains("mode=memory")
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if is_memory_url(url) {
        return url.to_string();
    }
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = format!("sqlite://{expanded_path}");
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

/// Fixed-width UTC text so lexical order equals time order.
fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl SavedItemStore for SqliteStore {
    #[instrument(skip_all)]
    async fn list_all(&self) -> Result<Vec<SavedItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, content, created_at FROM saved_tweets ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let items = rows
            .into_iter()
            .map(|row| {
                Ok(SavedItem {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        debug!(count = items.len(), "fetched saved items");
        Ok(items)
    }

    #[instrument(skip_all)]
    async fn create(&self, content: &str) -> Result<(), StoreError> {
        let row = sqlx::query(
            "INSERT INTO saved_tweets (content, created_at) VALUES (?, ?) RETURNING id",
        )
        .bind(content)
        .bind(timestamp_text(Utc::now()))
        .fetch_one(&self.pool)
        .await?;
        let id: i64 = row.try_get("id")?;
        info!(id, "saved item created");
        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn update(&self, id: i64, content: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE saved_tweets SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            debug!(id, "update matched no rows");
        } else {
            info!(id, "saved item updated");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM saved_tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            debug!(id, "delete matched no rows");
        } else {
            info!(id, "saved item deleted");
        }
        Ok(())
    }
}
