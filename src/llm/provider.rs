use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ChatRequest;
use crate::core::retry::SendError;

/// Hosted LLM providers the backend can route a chat to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Groq,
    #[serde(rename = "OpenAI")]
    OpenAi,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAi => "OpenAI",
        }
    }

    /// Config-file key (`providers.<key>`).
    pub fn config_key(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAi => "openai",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Some(Provider::Groq),
            "openai" => Some(Provider::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0} API key is missing")]
    MissingApiKey(Provider),
    #[error("{0} is not configured")]
    NotConfigured(Provider),
    #[error("{provider} request failed: {message}")]
    Transport { provider: Provider, message: String },
    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },
    #[error("{provider} returned a malformed response: {message}")]
    Malformed { provider: Provider, message: String },
}

impl LlmError {
    pub(crate) fn from_send(provider: Provider, err: SendError) -> Self {
        match err {
            SendError::Transport(e) => LlmError::Transport {
                provider,
                message: e.to_string(),
            },
            SendError::Status { status, body } => LlmError::Status {
                provider,
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Non-streaming chat completion. Returns the assistant's reply text.
    async fn chat(
        &self,
        provider: Provider,
        model: &str,
        request: ChatRequest,
    ) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip_through_serde() {
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"OpenAI\"");
        let parsed: Provider = serde_json::from_str("\"Groq\"").unwrap();
        assert_eq!(parsed, Provider::Groq);
        assert!(serde_json::from_str::<Provider>("\"Anthropic\"").is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Provider::parse("openai"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse(" GROQ "), Some(Provider::Groq));
        assert_eq!(Provider::parse("ollama"), None);
    }
}
