pub mod openai_compat;
pub mod provider;
pub mod service;
pub mod types;

pub use provider::{LlmClient, LlmError, Provider};
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest, Role};
