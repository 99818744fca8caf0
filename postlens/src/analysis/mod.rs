//! Suggestion generation via an external chat completions service.
//!
//! The analysis step is an enrichment: the extracted text is the primary result and must reach
//! the caller even when the suggestion service is down. [`Analyze::analyze`] therefore has no
//! error path. Every failure (missing credential, transport error, non-2xx status, undecodable
//! body, empty `choices`) is logged and replaced by [`SUGGESTION_FAILED`].

pub mod models;

use crate::config::AnalysisConfig;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use async_openai::types::chat::CreateChatCompletionResponse;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

/// Suggestions returned when the analysis service could not be used.
pub const SUGGESTION_FAILED: &str = "AI suggestion failed.";

/// Outcome of one analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResult {
    pub suggestions: String,
    /// True when `suggestions` is the failure sentinel
    pub degraded: bool,
}

impl SuggestionResult {
    pub fn generated(suggestions: String) -> Self {
        Self {
            suggestions,
            degraded: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            suggestions: SUGGESTION_FAILED.to_string(),
            degraded: true,
        }
    }
}

/// Produces improvement suggestions for a piece of text. Infallible at this boundary.
#[async_trait]
pub trait Analyze: Send + Sync {
    async fn analyze(&self, text: &str) -> SuggestionResult;
}

/// The concrete implementation of [`Analyze`], talking to an OpenAI-compatible
/// `/chat/completions` endpoint with `reqwest`.
pub struct SuggestionClient {
    client: Client,
    completions_url: Url,
    model: String,
    api_key: Option<String>,
    referer: Option<String>,
    title: Option<String>,
}

impl SuggestionClient {
    pub fn new(config: &AnalysisConfig) -> anyhow::Result<Self> {
        let client = Client::builder().build().context("Failed to create HTTP client")?;
        let completions_url = ensure_slash(&config.base_url)
            .join("chat/completions")
            .context("Failed to construct chat completions URL")?;

        Ok(Self {
            client,
            completions_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    async fn request_suggestions(&self, text: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no API key configured for the suggestion service"))?;

        let body = models::suggestion_request(&self.model, text).context("Failed to build chat completion request")?;

        let mut request = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(api_key)
            .json(&body);

        if let Some(referer) = &self.referer {
            request = request.header("http-referer", referer);
        }
        if let Some(title) = &self.title {
            request = request.header("x-title", title);
        }

        let response = request.send().await.context("Suggestion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Suggestion API error: {} - {}", status, body));
        }

        let body_text = response.text().await.context("Failed to read suggestion response")?;
        debug!("Suggestion API response body: {}", body_text);

        let parsed: CreateChatCompletionResponse =
            serde_json::from_str(&body_text).map_err(|e| anyhow!("error decoding response body: {}", e))?;

        models::first_content(parsed).ok_or_else(|| anyhow!("Suggestion API returned no content"))
    }
}

#[async_trait]
impl Analyze for SuggestionClient {
    #[instrument(skip_all, fields(model = %self.model, chars = text.len()))]
    async fn analyze(&self, text: &str) -> SuggestionResult {
        match self.request_suggestions(text).await {
            Ok(suggestions) => SuggestionResult::generated(suggestions),
            Err(e) => {
                warn!("AI suggestion failed: {:#}", e);
                SuggestionResult::failed()
            }
        }
    }
}

/// Makes sure a url has a trailing slash, so `join` appends instead of replacing the last
/// path segment.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}
