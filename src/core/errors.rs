use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::rag::{ChunkError, EmbeddingError, IndexError, PdfError};

pub const EMPTY_INDEX_MESSAGE: &str =
    "No document has been indexed for this session. Upload a PDF first.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("empty index")]
    EmptyIndex,
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("remote service error: {0}")]
    RemoteService(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::EmptyIndex => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RemoteService(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            ApiError::EmptyIndex => EMPTY_INDEX_MESSAGE.to_string(),
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::RemoteService(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, "{}", message);
        } else {
            tracing::warn!(status = %status, "{}", message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<ChunkError> for ApiError {
    fn from(err: ChunkError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Empty => ApiError::EmptyIndex,
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidConfig(msg) => ApiError::Internal(msg),
            other => ApiError::RemoteService(other.to_string()),
        }
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::RemoteService(other.to_string()),
        }
    }
}
