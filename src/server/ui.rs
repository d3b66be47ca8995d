use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Single-page UI for chatting and asking questions about an uploaded PDF.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
