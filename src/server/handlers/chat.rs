use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::agent::ChatTurn;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatTurn>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(turn) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::info!(
        "Chat request: provider={} model={} messages={} search={}",
        turn.model_provider,
        turn.model_name,
        turn.messages.len(),
        turn.allow_search
    );
    let reply = state.chat_agent.respond(turn).await?;
    Ok(Json(reply))
}
