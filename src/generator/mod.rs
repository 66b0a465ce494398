//! Turns a blog post into short social posts through a chat-completion API.
use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config;
use crate::generator::model::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role};

pub mod model;

pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 1024;
pub const SEGMENT_SEPARATOR: &str = "---";

/// Shown in place of the generated posts when the completion has no content.
pub const UNEXPECTED_FORMAT_MESSAGE: &str = "Received unexpected response format from OpenAI.";
/// Shown in place of the generated posts for every other failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while remixing the text. Please make sure your API key is set correctly.";

pub const SYSTEM_PROMPT: &str = r#"You are a social media expert and ghostwriter.

You work for a popular blogger, and your job is to take their blog post and come up with a variety of tweets to share ideas from the post.

Since you are a ghostwriter, you need to make sure to follow the style, tone, and voice of the blog post as closely as possible.

Remember: Tweets cannot be longer than 280 characters.

Format your response as follows:
1. Each tweet must start with a number followed by a period and a space (e.g. "1. ")
2. Each tweet must be separated by "---" on its own line
3. Do not use any hashtags or emojis
4. Generate at least 5 tweets
5. Do not include any introductory text, just start with the tweets

Here is the blog post:"#;

static OPENAI_API_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse(config::DEFAULT_OPENAI_BASE).expect("valid default OpenAI URL"));

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion API key is not configured")]
    MissingApiKey,
    #[error("failed to reach completion service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("invalid completion response JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("completion returned no content")]
    EmptyContent,
    #[error("invalid completion endpoint: {0}")]
    Endpoint(String),
}

impl GenerationError {
    /// The single line the user sees instead of generated posts.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::EmptyContent => UNEXPECTED_FORMAT_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Seam over the remote completion endpoint.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the content of the first choice, `None` when there is none.
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, GenerationError>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_API_BASE.clone())
    }

    pub fn with_base_url(api_key: String, mut base_url: Url) -> Self {
        // `join` drops the last path segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(concat!("content-remixer/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn from_config(cfg: &config::OpenAi) -> anyhow::Result<Self> {
        let base_url = Url::parse(&cfg.base_url).context("invalid openai.base_url")?;
        Ok(Self::with_base_url(cfg.api_key.clone(), base_url))
    }

    pub fn build_request(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<reqwest::Request, GenerationError> {
        let endpoint = self
            .base_url
            .join("chat/completions")
            .map_err(|err| GenerationError::Endpoint(err.to_string()))?;
        Ok(self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .build()?)
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        let req = self.build_request(request)?;
        info!(url = %req.url(), "sending completion request");
        debug!(
            messages = request.messages.len(),
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "completion payload"
        );

        let res = self.http.execute(req).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "completion service returned an error");
            return Err(GenerationError::Api { status, body });
        }

        let body = res.text().await?;
        let payload: ChatCompletionResponse = serde_json::from_str(&body)?;
        Ok(payload.first_content())
    }
}

/// Build the chat request for one blog post.
pub fn build_completion_request(model: &str, source_text: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: source_text.to_string(),
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Split raw completion text into posts: cut on every `---`, trim, drop empties.
pub fn split_segments(raw: &str) -> Vec<String> {
    raw.split(SEGMENT_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct Generator {
    service: Arc<dyn CompletionService>,
    model: String,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn from_config(cfg: &config::OpenAi) -> anyhow::Result<Self> {
        let client = OpenAiClient::from_config(cfg)?;
        Ok(Self::new(Arc::new(client), cfg.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate posts for `source_text`. Blank input yields no posts and makes no call.
    #[instrument(skip_all)]
    pub async fn generate(&self, source_text: &str) -> Result<Vec<String>, GenerationError> {
        if source_text.trim().is_empty() {
            debug!("blank input; skipping completion request");
            return Ok(Vec::new());
        }
        let request = build_completion_request(&self.model, source_text);
        let content = self
            .service
            .complete(&request)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyContent)?;
        let segments = split_segments(&content);
        info!(segments = segments.len(), "completion parsed");
        Ok(segments)
    }
}
