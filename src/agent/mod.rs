pub mod chat;

pub use chat::{ChatAgent, ChatReply, ChatTurn, IncomingMessage, INVALID_MODEL_MESSAGE};
