use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::openai_compat::OpenAiCompatProvider;
use super::provider::{LlmClient, LlmError, Provider};
use super::types::ChatRequest;
use crate::core::config::AppSettings;

/// Routes chat requests to the configured hosted provider.
#[derive(Clone)]
pub struct LlmService {
    providers: HashMap<Provider, OpenAiCompatProvider>,
}

impl LlmService {
    pub fn new(settings: &AppSettings) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(settings.llm_timeout_secs);
        let mut providers = HashMap::new();
        for provider in Provider::ALL {
            let provider_settings = settings.providers.get(provider);
            if provider_settings.api_key.is_empty() {
                tracing::warn!(
                    "{} is not set; {} requests will fail",
                    provider.api_key_env(),
                    provider
                );
            }
            providers.insert(
                provider,
                OpenAiCompatProvider::new(provider, provider_settings, timeout, settings.retry)?,
            );
        }
        Ok(Self { providers })
    }
}

#[async_trait]
impl LlmClient for LlmService {
    async fn chat(
        &self,
        provider: Provider,
        model: &str,
        request: ChatRequest,
    ) -> Result<String, LlmError> {
        let client = self
            .providers
            .get(&provider)
            .ok_or(LlmError::NotConfigured(provider))?;

        tracing::debug!(
            "Routing chat to {} model={} messages={}",
            provider,
            model,
            request.messages.len()
        );
        client.chat(request, model).await
    }
}
