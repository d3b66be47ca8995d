mod common;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{sample_pdf, spawn_app, spawn_app_with, TestServer};

const RUST_PAGE: &str = "Rust is a systems programming language focused on safety.";
const TOKIO_PAGE: &str = "Tokio is an asynchronous runtime for writing network services.";

async fn upload(server: &TestServer, session: Option<&str>, bytes: Vec<u8>) -> reqwest::Response {
    let part = Part::bytes(bytes)
        .file_name("guide.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let mut request = server
        .client
        .post(server.url("/upload"))
        .multipart(Form::new().part("file", part));
    if let Some(session) = session {
        request = request.header("x-session-id", session);
    }
    request.send().await.unwrap()
}

async fn ask(server: &TestServer, session: Option<&str>, question: &str) -> reqwest::Response {
    let mut request = server
        .client
        .post(server.url("/ask_rag"))
        .form(&[("question", question)]);
    if let Some(session) = session {
        request = request.header("x-session-id", session);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let server = spawn_app().await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn root_serves_the_ui() {
    let server = spawn_app().await;
    let resp = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("<title>PDF Chat</title>"));
}

#[tokio::test]
async fn asking_before_upload_is_a_conflict() {
    let server = spawn_app().await;
    let resp = ask(&server, None, "What is Rust?").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "No document has been indexed for this session. Upload a PDF first."
    );
    assert!(server.llm.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_then_ask_returns_grounded_answer() {
    let server = spawn_app().await;

    let resp = upload(&server, None, sample_pdf(&[RUST_PAGE, TOKIO_PAGE])).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "uploaded");
    assert_eq!(body["filename"], "guide.pdf");
    assert_eq!(body["pages"], 2);
    assert!(body["chunks"].as_u64().unwrap() >= 2);
    assert_eq!(body["index_version"], 1);

    let resp = ask(&server, None, "What is Tokio?").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("Answer the following question using the context."));
    assert!(answer.ends_with("Question: What is Tokio?"));

    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty() && sources.len() <= 3);
    assert_eq!(sources[0]["document"], "guide.pdf");
}

#[tokio::test]
async fn sessions_are_isolated_and_clearable() {
    let server = spawn_app().await;

    let resp = upload(&server, Some("alice"), sample_pdf(&[RUST_PAGE])).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ask(&server, Some("bob"), "What is Rust?").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let status: Value = server
        .client
        .get(server.url("/rag/status"))
        .header("x-session-id", "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["indexed"], true);
    assert_eq!(status["document"], "guide.pdf");
    assert_eq!(status["pages"], 1);

    let cleared: Value = server
        .client
        .delete(server.url("/rag"))
        .header("x-session-id", "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["cleared"], true);

    let resp = ask(&server, Some("alice"), "What is Rust?").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reupload_bumps_the_index_version() {
    let server = spawn_app().await;

    let first: Value = upload(&server, None, sample_pdf(&[RUST_PAGE]))
        .await
        .json()
        .await
        .unwrap();
    let second: Value = upload(&server, None, sample_pdf(&[TOKIO_PAGE]))
        .await
        .json()
        .await
        .unwrap();
    assert!(second["index_version"].as_u64() > first["index_version"].as_u64());
}

#[tokio::test]
async fn invalid_uploads_keep_the_previous_index() {
    let server = spawn_app().await;
    upload(&server, None, sample_pdf(&[RUST_PAGE])).await;

    let resp = upload(&server, None, b"not a pdf at all".to_vec()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());

    let resp = server
        .client
        .post(server.url("/upload"))
        .multipart(Form::new().text("other", "value"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ask(&server, None, "What is Rust?").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_multipart_upload_is_a_json_error() {
    let server = spawn_app().await;
    let resp = server
        .client
        .post(server.url("/upload"))
        .json(&json!({ "file": "guide.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let server = spawn_app_with(json!({ "server": { "max_upload_bytes": 1024 } })).await;

    let resp = upload(&server, None, vec![b'x'; 8 * 1024]).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());

    let status: Value = server
        .client
        .get(server.url("/rag/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["indexed"], false);
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let server = spawn_app().await;
    upload(&server, None, sample_pdf(&[RUST_PAGE])).await;

    let resp = ask(&server, None, "   ").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_validates_model_and_answers() {
    let server = spawn_app().await;

    let resp = server
        .client
        .post(server.url("/chat"))
        .json(&json!({
            "model_name": "mixtral-8x7b",
            "model_provider": "Groq",
            "messages": ["hi"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid model name. Kindly select a valid AI model."
    );

    let resp = server
        .client
        .post(server.url("/chat"))
        .json(&json!({
            "model_name": "gpt-4o-mini",
            "model_provider": "OpenAI",
            "messages": ["What is Rust?"],
            "allow_search": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["answer"], "What is Rust?");
}

#[tokio::test]
async fn malformed_chat_body_is_a_json_error() {
    let server = spawn_app().await;
    let resp = server
        .client
        .post(server.url("/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.json::<Value>().await.unwrap()["error"].is_string());
}

#[tokio::test]
async fn unknown_routes_return_json_not_found() {
    let server = spawn_app().await;
    let resp = server.client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.json::<Value>().await.unwrap()["error"],
        "No route for /nope"
    );
}
