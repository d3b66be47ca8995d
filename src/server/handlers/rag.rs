use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::utils::session_id;
use crate::core::errors::ApiError;
use crate::rag::extract_document;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// Extract, chunk and embed an uploaded PDF, then make it the session's index.
/// A failed upload leaves the previous index in place.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session = session_id(&headers);

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            upload = Some(read_file_field(field).await?);
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty.".to_string()));
    }

    tracing::info!(
        "Upload for session {}: {} ({} bytes)",
        session,
        filename,
        bytes.len()
    );

    let document_id = filename.clone();
    let document = tokio::task::spawn_blocking(move || extract_document(&document_id, &bytes))
        .await
        .map_err(ApiError::internal)??;

    let index = state.orchestrator.build_index(&document).await?;
    let snapshot = state
        .sessions
        .replace(&session, &document.id, document.page_count, index);

    Ok(Json(json!({
        "status": "uploaded",
        "filename": filename,
        "pages": snapshot.page_count,
        "chunks": snapshot.index.len(),
        "index_version": snapshot.version,
    })))
}

async fn read_file_field(field: Field<'_>) -> Result<(String, Vec<u8>), ApiError> {
    let filename = field
        .file_name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("upload-{}.pdf", Uuid::new_v4()));
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok((filename, bytes.to_vec()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Form<AskRequest>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session = session_id(&headers);

    // this snapshot stays valid for the whole query even if an upload replaces it
    let snapshot = state
        .sessions
        .snapshot(&session)
        .ok_or(ApiError::EmptyIndex)?;

    tracing::info!(
        "Question for session {} against {} v{}",
        session,
        snapshot.document_id,
        snapshot.version
    );
    let answer = state
        .orchestrator
        .answer(&snapshot.index, &request.question)
        .await?;
    Ok(Json(answer))
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = session_id(&headers);
    match state.sessions.snapshot(&session) {
        Some(snapshot) => {
            let summary = snapshot.summary();
            Json(json!({
                "indexed": true,
                "session": session,
                "document": summary.document,
                "pages": summary.pages,
                "chunks": summary.chunks,
                "index_version": summary.index_version,
                "indexed_at": summary.indexed_at,
            }))
        }
        None => Json(json!({ "indexed": false, "session": session })),
    }
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = session_id(&headers);
    let cleared = state.sessions.clear(&session);
    if cleared {
        tracing::info!("Cleared index for session {}", session);
    }
    Json(json!({ "status": "cleared", "cleared": cleared }))
}
