use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use super::{SavedItemStore, StoreError};
use crate::config;
use crate::model::SavedItem;

#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    base_url: Option<Url>,
    anon_key: String,
    table: String,
}

impl fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Row as PostgREST returns it; `created_at` may or may not carry an offset.
#[derive(Deserialize, Debug)]
struct SavedRow {
    id: i64,
    content: String,
    created_at: String,
}

impl SupabaseStore {
    /// `base_url` of `None` makes every call fail with `MissingConfig`.
    pub fn new(base_url: Option<Url>, anon_key: String, table: String) -> Self {
        let base_url = base_url.map(|mut url| {
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            url
        });
        let http = Client::builder()
            .user_agent(concat!("content-remixer/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            anon_key,
            table,
        }
    }

    pub fn from_config(cfg: &config::Supabase) -> Self {
        let base_url = if cfg.url.trim().is_empty() {
            None
        } else {
            match Url::parse(&cfg.url) {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!(?err, "invalid supabase.url; table calls will fail");
                    None
                }
            }
        };
        Self::new(base_url, cfg.anon_key.clone(), cfg.table.clone())
    }

    /// `{base}/rest/v1/{table}`
    pub fn table_url(&self) -> Result<Url, StoreError> {
        let base = self
            .base_url
            .as_ref()
            .ok_or(StoreError::MissingConfig("supabase.url"))?;
        if self.anon_key.trim().is_empty() {
            return Err(StoreError::MissingConfig("supabase.anon_key"));
        }
        base.join(&format!("rest/v1/{}", self.table))
            .map_err(|err| StoreError::Decode(format!("invalid table URL: {err}")))
    }

    fn row_url(&self, id: i64) -> Result<Url, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    pub fn build_list_request(&self) -> Result<reqwest::Request, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc,id.desc");
        Ok(self.authed(self.http.get(url)).build()?)
    }

    pub fn build_create_request(&self, content: &str) -> Result<reqwest::Request, StoreError> {
        let url = self.table_url()?;
        Ok(self
            .authed(self.http.post(url))
            .header("Prefer", "return=minimal")
            .json(&json!([{ "content": content }]))
            .build()?)
    }

    pub fn build_update_request(
        &self,
        id: i64,
        content: &str,
    ) -> Result<reqwest::Request, StoreError> {
        let url = self.row_url(id)?;
        Ok(self
            .authed(self.http.patch(url))
            .header("Prefer", "return=minimal")
            .json(&json!({ "content": content }))
            .build()?)
    }

    pub fn build_delete_request(&self, id: i64) -> Result<reqwest::Request, StoreError> {
        let url = self.row_url(id)?;
        Ok(self.authed(self.http.delete(url)).build()?)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Response, StoreError> {
        debug!(method = %request.method(), url = %request.url(), "table request");
        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "table service returned an error");
            return Err(StoreError::Api { status, body });
        }
        Ok(res)
    }
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // `timestamp without time zone` columns come back without an offset.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| StoreError::Decode(format!("bad created_at {raw:?}: {err}")))
}

fn rows_to_items(body: &str) -> Result<Vec<SavedItem>, StoreError> {
    let rows: Vec<SavedRow> = serde_json::from_str(body)?;
    rows.into_iter()
        .map(|row| {
            Ok(SavedItem {
                id: row.id,
                content: row.content,
                created_at: parse_created_at(&row.created_at)?,
            })
        })
        .collect()
}

#[async_trait]
impl SavedItemStore for SupabaseStore {
    #[instrument(skip_all)]
    async fn list_all(&self) -> Result<Vec<SavedItem>, StoreError> {
        let res = self.execute(self.build_list_request()?).await?;
        let body = res.text().await?;
        let items = rows_to_items(&body)?;
        debug!(count = items.len(), "fetched saved items");
        Ok(items)
    }

    #[instrument(skip_all)]
    async fn create(&self, content: &str) -> Result<(), StoreError> {
        self.execute(self.build_create_request(content)?).await?;
        info!("saved item created");
        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn update(&self, id: i64, content: &str) -> Result<(), StoreError> {
        self.execute(self.build_update_request(id, content)?).await?;
        info!(id, "saved item updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.execute(self.build_delete_request(id)?).await?;
        info!(id, "saved item deleted");
        Ok(())
    }
}
