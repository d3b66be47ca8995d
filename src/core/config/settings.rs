//! Typed application settings.
//!
//! Resolved from the merged YAML config (see [`super::ConfigService`]) with
//! defaults for every key. Provider and search API keys are read from the
//! environment and take precedence over the config files.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ApiError;
use crate::core::retry::RetryPolicy;
use crate::llm::Provider;
use crate::rag::{DistanceMetric, DEFAULT_MAX_SESSIONS};

pub const DEFAULT_SYSTEM_PROMPT: &str = "Act as an AI chatbot who is smart and friendly";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub providers: ProvidersSettings,
    pub search: SearchSettings,
    pub chat: ChatSettings,
    pub retry: RetryPolicy,
    pub llm_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            max_upload_bytes: 20 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_context_chars: usize,
    pub metric: DistanceMetric,
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
    /// Sessions holding an index at once; the oldest index is evicted past this.
    pub max_sessions: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 3,
            max_context_chars: 6000,
            metric: DistanceMetric::Cosine,
            provider: Provider::Groq,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.5,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// Models a chat request may select for this provider.
    pub models: Vec<String>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub groq: ProviderSettings,
    pub openai: ProviderSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            models: Vec::new(),
            temperature: None,
        }
    }
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            groq: ProviderSettings {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                models: vec!["llama-3.3-70b-versatile".to_string()],
                temperature: Some(0.1),
                ..ProviderSettings::default()
            },
            openai: ProviderSettings {
                base_url: "https://api.openai.com/v1".to_string(),
                models: vec!["gpt-4o-mini".to_string()],
                ..ProviderSettings::default()
            },
        }
    }
}

impl ProvidersSettings {
    pub fn get(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Groq => &self.groq,
            Provider::OpenAi => &self.openai,
        }
    }

    fn get_mut(&mut self, provider: Provider) -> &mut ProviderSettings {
        match provider {
            Provider::Groq => &mut self.groq,
            Provider::OpenAi => &mut self.openai,
        }
    }

    pub fn allows_model(&self, provider: Provider, model: &str) -> bool {
        self.get(provider).models.iter().any(|m| m == model)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: String,
    pub api_key: String,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: String::new(),
            max_results: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub default_system_prompt: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RetrySection {
    max_attempts: usize,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LlmSection {
    timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    server: ServerSettings,
    rag: RagSettings,
    embedding: EmbeddingSettings,
    providers: ProvidersSettings,
    search: SearchSettings,
    chat: ChatSettings,
    retry: RetrySection,
    llm: LlmSection,
}

impl AppSettings {
    /// Resolve settings from a merged config value and the process environment.
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        Self::from_config_with_env(config, |key| std::env::var(key).ok())
    }

    pub fn from_config_with_env<F>(config: &Value, env: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawSettings = serde_json::from_value(config.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {}", e)))?;

        let mut settings = AppSettings {
            server: raw.server,
            rag: raw.rag,
            embedding: raw.embedding,
            providers: raw.providers,
            search: raw.search,
            chat: raw.chat,
            retry: RetryPolicy {
                max_attempts: raw.retry.max_attempts.max(1),
                base_delay: Duration::from_millis(raw.retry.base_delay_ms),
                max_delay: Duration::from_millis(raw.retry.max_delay_ms),
            },
            llm_timeout_secs: raw.llm.timeout_secs,
        };

        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let provider_defaults = ProvidersSettings::default();
        for provider in Provider::ALL {
            let defaults = provider_defaults.get(provider);
            let configured = settings.providers.get_mut(provider);
            if configured.base_url.trim().is_empty() {
                configured.base_url = defaults.base_url.clone();
            }
            if configured.models.is_empty() {
                configured.models = defaults.models.clone();
            }
            if configured.temperature.is_none() {
                configured.temperature = defaults.temperature;
            }
            if let Some(key) = non_empty(provider.api_key_env()) {
                configured.api_key = key;
            }
        }
        if let Some(key) = non_empty("TAVILY_API_KEY") {
            settings.search.api_key = key;
        }
        if let Some(key) = non_empty("EMBEDDING_API_KEY") {
            settings.embedding.api_key = key;
        } else if settings.embedding.api_key.is_empty() {
            settings.embedding.api_key = settings.providers.openai.api_key.clone();
        }
        if let Some(port) = non_empty("PORT").and_then(|v| v.parse::<u16>().ok()) {
            settings.server.port = port;
        }

        if settings.rag.chunk_overlap >= settings.rag.chunk_size {
            return Err(ApiError::BadRequest(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                settings.rag.chunk_overlap, settings.rag.chunk_size
            )));
        }

        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
