//! Hosted embedding client.
//!
//! Talks to any OpenAI-compatible `/embeddings` endpoint. Inputs are sent in
//! batches and the returned vectors are re-ordered by their `index` field, so
//! output order always matches input order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::EmbeddingSettings;
use crate::core::retry::{RetryPolicy, SendError};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid embedding configuration: {0}")]
    InvalidConfig(String),
    #[error("embedding service unreachable: {0}")]
    Transport(String),
    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

impl From<SendError> for EmbeddingError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Transport(e) => EmbeddingError::Transport(e.to_string()),
            SendError::Status { status, body } => EmbeddingError::Status {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;

    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: Option<usize>,
        timeout: Duration,
        batch_size: usize,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        if model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig(
                "missing embedding model name".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "batch size must be greater than zero".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        if !api_key.trim().is_empty() {
            let auth = format!("Bearer {}", api_key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|_| EmbeddingError::InvalidConfig("invalid API key".to_string()))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimensions,
            batch_size,
            retry,
        })
    }

    pub fn from_settings(
        settings: &EmbeddingSettings,
        retry: RetryPolicy,
    ) -> Result<Self, EmbeddingError> {
        Self::new(
            &settings.api_key,
            &settings.base_url,
            &settings.model,
            settings.dimensions,
            Duration::from_secs(settings.timeout_secs),
            settings.batch_size,
            retry,
        )
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };

        let response = self
            .retry
            .send("embedding request", || {
                self.client.post(&self.endpoint).json(&request)
            })
            .await?;

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(EmbeddingError::Malformed(format!(
                "received {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        parsed.data.sort_by_key(|entry| entry.index);

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch).await?);
        }
        tracing::debug!(
            "Embedded {} inputs with {} (dim={})",
            inputs.len(),
            self.model,
            embeddings.first().map(Vec::len).unwrap_or(0)
        );
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
