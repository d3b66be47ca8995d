use axum::http::HeaderMap;

use crate::rag::DEFAULT_SESSION_ID;

pub const SESSION_HEADER: &str = "x-session-id";

/// Session named by the `x-session-id` header, or the shared default session.
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string()
}
