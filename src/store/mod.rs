//! Saved-item repositories.
//!
//! - `supabase`: the remote PostgREST table used in production.
//! - `sqlite`: a local table with the same shape, for offline use and tests.
//!
//! Callers depend on the `SavedItemStore` trait only; the concrete client is
//! chosen once in `open_store` and injected.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{Backend, Config};
use crate::model::SavedItem;

pub mod sqlite;
pub mod supabase;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store setting is not configured: {0}")]
    MissingConfig(&'static str),
    #[error("failed to reach table service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("table service error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("invalid table response: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// CRUD over the saved-items table. Update and delete of an unknown id are not errors.
#[async_trait]
pub trait SavedItemStore: Send + Sync {
    /// All items, newest first.
    async fn list_all(&self) -> Result<Vec<SavedItem>, StoreError>;

    async fn create(&self, content: &str) -> Result<(), StoreError>;

    async fn update(&self, id: i64, content: &str) -> Result<(), StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Build the configured backend.
pub async fn open_store(cfg: &Config) -> anyhow::Result<Arc<dyn SavedItemStore>> {
    match cfg.store.backend {
        Backend::Supabase => {
            info!(table = %cfg.supabase.table, "using supabase store");
            Ok(Arc::new(SupabaseStore::from_config(&cfg.supabase)))
        }
        Backend::Sqlite => {
            info!(url = %cfg.store.sqlite_url, "using sqlite store");
            let store = SqliteStore::connect(&cfg.store.sqlite_url).await?;
            Ok(Arc::new(store))
        }
    }
}
