use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{LlmError, Provider};
use super::types::ChatRequest;
use crate::core::config::ProviderSettings;
use crate::core::retry::RetryPolicy;

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    provider: Provider,
    base_url: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl OpenAiCompatProvider {
    pub fn new(
        provider: Provider,
        settings: &ProviderSettings,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Transport {
                provider,
                message: e.to_string(),
            })?;

        Ok(Self {
            provider,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.trim().to_string(),
            client,
            retry,
        })
    }

    pub async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "chat request has no messages".to_string(),
            ));
        }
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey(self.provider));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
        }

        let label = format!("{} chat", self.provider);
        let res = self
            .retry
            .send(&label, || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            })
            .await
            .map_err(|e| LlmError::from_send(self.provider, e))?;

        let payload: Value = res.json().await.map_err(|e| LlmError::Malformed {
            provider: self.provider,
            message: e.to_string(),
        })?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Malformed {
                provider: self.provider,
                message: "missing choices[0].message.content".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use super::*;
    use crate::llm::types::ChatMessage;

    async fn mock_completions(
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer secret" {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        let last = body["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();
        let reply = format!("  {} says: {}  ", body["model"].as_str().unwrap_or("?"), last);
        (
            StatusCode::OK,
            Json(json!({"choices": [{"message": {"role": "assistant", "content": reply}}]})),
        )
    }

    async fn spawn_mock() -> String {
        let app = Router::new().route("/v1/chat/completions", post(mock_completions));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn settings(base_url: &str, api_key: &str) -> ProviderSettings {
        ProviderSettings {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            models: vec!["m".to_string()],
            temperature: None,
        }
    }

    #[tokio::test]
    async fn returns_trimmed_first_choice() {
        let base_url = spawn_mock().await;
        let provider = OpenAiCompatProvider::new(
            Provider::Groq,
            &settings(&base_url, "secret"),
            Duration::from_secs(5),
            RetryPolicy::none(),
        )
        .unwrap();

        let answer = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "llama")
            .await
            .unwrap();
        assert_eq!(answer, "llama says: hi");
    }

    #[tokio::test]
    async fn surfaces_upstream_status() {
        let base_url = spawn_mock().await;
        let provider = OpenAiCompatProvider::new(
            Provider::OpenAi,
            &settings(&base_url, "wrong"),
            Duration::from_secs(5),
            RetryPolicy::none(),
        )
        .unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "gpt")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected() {
        let provider = OpenAiCompatProvider::new(
            Provider::Groq,
            &settings("http://127.0.0.1:9", "secret"),
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap();

        let err = provider
            .chat(ChatRequest::new(Vec::new()), "llama")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let provider = OpenAiCompatProvider::new(
            Provider::Groq,
            &settings("http://127.0.0.1:9", ""),
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]), "llama")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Groq API key is missing");
    }
}
