use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::utils::SESSION_HEADER;
use crate::server::handlers::{chat, health, rag};
use crate::server::ui;
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// This function sets up:
/// - The UI page and health check
/// - Chat and PDF question-answering endpoints
/// - Upload size limit, CORS and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    let body_limit = state.settings.server.max_upload_bytes;
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/upload", post(rag::upload))
        .route("/ask_rag", post(rag::ask))
        .route("/rag/status", get(rag::status))
        .route("/rag", delete(rag::clear))
        .fallback(health::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(configured)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_HEADER),
        ])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:8501".to_string(),
        "http://localhost:9999".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:8501".to_string(),
        "http://127.0.0.1:9999".to_string(),
    ]
}
