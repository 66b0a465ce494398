//! Configuration loader and validator for the content remixer.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1/";
pub const DEFAULT_TABLE: &str = "saved_tweets";
pub const DEFAULT_SQLITE_URL: &str = "sqlite://./data/remixer.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAi,
    #[serde(default)]
    pub supabase: Supabase,
    #[serde(default)]
    pub store: Store,
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenAi {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_base")]
    pub base_url: String,
}

/// Remote table settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supabase {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Supabase,
    Sqlite,
}

/// Which saved-item backend to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_openai_base() -> String {
    DEFAULT_OPENAI_BASE.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_sqlite_url() -> String {
    DEFAULT_SQLITE_URL.to_string()
}

impl Default for OpenAi {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_openai_base(),
        }
    }
}

impl Default for Supabase {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: default_table(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            sqlite_url: default_sqlite_url(),
        }
    }
}

/// Environment variables that override the three secrets, checked in order.
const ENV_OPENAI_API_KEY: [&str; 2] = ["OPENAI_API_KEY", "VITE_OPENAI_API_KEY"];
const ENV_SUPABASE_URL: [&str; 2] = ["SUPABASE_URL", "VITE_SUPABASE_URL"];
const ENV_SUPABASE_ANON_KEY: [&str; 2] = ["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"];

impl Config {
    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|&k| lookup(k))
                .find(|v| !v.trim().is_empty())
        };
        if let Some(v) = first(&ENV_OPENAI_API_KEY) {
            self.openai.api_key = v;
        }
        if let Some(v) = first(&ENV_SUPABASE_URL) {
            self.supabase.url = v;
        }
        if let Some(v) = first(&ENV_SUPABASE_ANON_KEY) {
            self.supabase.anon_key = v;
        }
    }

    /// Names of the secrets that are not set. Each one is logged as a warning;
    /// the feature depending on it will fail every call.
    pub fn warn_missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai.api_key.trim().is_empty() {
            missing.push("openai.api_key");
        }
        if self.store.backend == Backend::Supabase {
            if self.supabase.url.trim().is_empty() {
                missing.push("supabase.url");
            }
            if self.supabase.anon_key.trim().is_empty() {
                missing.push("supabase.anon_key");
            }
        }
        for key in &missing {
            warn!(setting = key, "configuration value is not defined");
        }
        missing
    }
}

/// Load configuration from a YAML file, overlay the environment and validate.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - A missing file yields the defaults; secrets may still come from the environment.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let mut cfg = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)?
    } else {
        warn!(path = %path.display(), "config file not found; using defaults");
        Config::default()
    };
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. Missing secrets are not errors.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.openai.model.trim().is_empty() {
        return Err(ConfigError::Invalid("openai.model must be non-empty"));
    }
    if Url::parse(&cfg.openai.base_url).is_err() {
        return Err(ConfigError::Invalid("openai.base_url must be a valid URL"));
    }
    if !cfg.supabase.url.trim().is_empty() && Url::parse(&cfg.supabase.url).is_err() {
        return Err(ConfigError::Invalid("supabase.url must be a valid URL"));
    }
    if cfg.supabase.table.trim().is_empty() {
        return Err(ConfigError::Invalid("supabase.table must be non-empty"));
    }
    if cfg.store.backend == Backend::Sqlite && cfg.store.sqlite_url.trim().is_empty() {
        return Err(ConfigError::Invalid("store.sqlite_url must be non-empty"));
    }
    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"openai:
  api_key: "YOUR_OPENAI_API_KEY"
  model: "gpt-4-turbo-preview"
  base_url: "https://api.openai.com/v1/"

supabase:
  url: "https://YOUR_PROJECT.supabase.co"
  anon_key: "YOUR_SUPABASE_ANON_KEY"
  table: "saved_tweets"

# backend: supabase | sqlite
store:
  backend: supabase
  sqlite_url: "sqlite://./data/remixer.db"
"#
}
