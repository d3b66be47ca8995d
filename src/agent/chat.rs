// Chat Agent
// Direct conversation with a hosted model, optionally grounded on web search

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::config::{ChatSettings, ProvidersSettings};
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient, Provider, Role};
use crate::tools::{format_results, WebSearch};

pub const INVALID_MODEL_MESSAGE: &str = "Invalid model name. Kindly select a valid AI model.";

/// A conversation turn as sent by clients. Plain strings are user messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Text(String),
    Message(ChatMessage),
}

impl IncomingMessage {
    fn into_message(self) -> ChatMessage {
        match self {
            IncomingMessage::Text(content) => ChatMessage::user(content),
            IncomingMessage::Message(message) => message,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub model_name: String,
    pub model_provider: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub allow_search: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
}

pub struct ChatAgent {
    llm: Arc<dyn LlmClient>,
    search: Option<Arc<dyn WebSearch>>,
    providers: ProvidersSettings,
    chat: ChatSettings,
}

impl ChatAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Option<Arc<dyn WebSearch>>,
        providers: ProvidersSettings,
        chat: ChatSettings,
    ) -> Self {
        Self {
            llm,
            search,
            providers,
            chat,
        }
    }

    pub async fn respond(&self, turn: ChatTurn) -> Result<ChatReply, ApiError> {
        let provider = Provider::parse(&turn.model_provider)
            .ok_or_else(|| ApiError::BadRequest(INVALID_MODEL_MESSAGE.to_string()))?;
        if !self.providers.allows_model(provider, &turn.model_name) {
            return Err(ApiError::BadRequest(INVALID_MODEL_MESSAGE.to_string()));
        }

        let conversation: Vec<ChatMessage> = turn
            .messages
            .into_iter()
            .map(IncomingMessage::into_message)
            .filter(|m| !m.content.trim().is_empty())
            .collect();
        let last_user = conversation
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .ok_or_else(|| ApiError::BadRequest("At least one user message is required.".to_string()))?;

        let system_prompt = turn
            .system_prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.chat.default_system_prompt.clone());

        let mut messages = vec![ChatMessage::system(system_prompt)];
        if turn.allow_search {
            if let Some(context) = self.search_context(&last_user).await {
                messages.push(ChatMessage::system(context));
            }
        }
        messages.extend(conversation);

        let mut request = ChatRequest::new(messages);
        if let Some(temperature) = self.providers.get(provider).temperature {
            request = request.with_temperature(temperature);
        }

        let answer = self.llm.chat(provider, &turn.model_name, request).await?;
        Ok(ChatReply { answer })
    }

    async fn search_context(&self, query: &str) -> Option<String> {
        let Some(search) = &self.search else {
            tracing::warn!("Web search requested but TAVILY_API_KEY is not set; answering without it");
            return None;
        };

        match search.search(query).await {
            Ok(results) if results.is_empty() => None,
            Ok(results) => Some(format_results(&results)),
            Err(err) => {
                tracing::warn!("Web search failed, answering without it: {}", err);
                None
            }
        }
    }
}
