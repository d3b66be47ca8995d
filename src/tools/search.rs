use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::SearchSettings;
use crate::core::retry::{RetryPolicy, SendError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid web search configuration: {0}")]
    InvalidConfig(String),
    #[error("TAVILY_API_KEY is not set")]
    MissingApiKey,
    #[error("web search failed: {0}")]
    Transport(String),
    #[error("web search returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed web search response: {0}")]
    Malformed(String),
}

impl From<SendError> for SearchError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Transport(e) => SearchError::Transport(e.to_string()),
            SendError::Status { status, body } => SearchError::Status {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Tavily search API client.
#[derive(Clone)]
pub struct TavilySearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
    retry: RetryPolicy,
}

impl TavilySearch {
    pub fn new(
        settings: &SearchSettings,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            max_results: settings.max_results,
            retry,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::MissingApiKey);
        }

        let url = format!("{}/search", self.base_url);
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
        });

        let response = self
            .retry
            .send("tavily search", || self.client.post(&url).json(&body))
            .await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;

        let items = payload
            .get("results")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SearchError::Malformed("missing results array".to_string()))?;

        let mut results = Vec::new();
        for item in items.iter().take(self.max_results) {
            let title = item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let url = item
                .get("url")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let snippet = item
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if !url.is_empty() {
                results.push(SearchResult {
                    title,
                    url,
                    snippet,
                });
            }
        }

        tracing::debug!("Web search for {:?} returned {} results", query, results.len());
        Ok(results)
    }
}

/// Render results as a block the model can read as extra context.
pub fn format_results(results: &[SearchResult]) -> String {
    let mut out = String::from("Web search results:\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "\n[{}] {}\n{}\n{}\n",
            i + 1,
            result.title,
            result.url,
            result.snippet
        ));
    }
    out
}
