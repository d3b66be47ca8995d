#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use pdfchat_backend::core::config::AppSettings;
use pdfchat_backend::llm::{ChatRequest, LlmClient, LlmError, Provider};
use pdfchat_backend::rag::{Embedder, EmbeddingError};
use pdfchat_backend::server::router::router;
use pdfchat_backend::state::AppState;

/// Embeds text as lowercase letter frequencies plus a constant bias term.
pub struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    fn model(&self) -> &str {
        "letter-frequency"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(inputs
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; 27];
                for c in text.chars().filter(char::is_ascii_alphabetic) {
                    vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
                }
                vector[26] = 1.0;
                vector
            })
            .collect())
    }
}

/// Replies with the content of the last message it was sent.
#[derive(Default)]
pub struct EchoLlm {
    pub calls: Mutex<Vec<(Provider, String, ChatRequest)>>,
}

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat(
        &self,
        provider: Provider,
        model: &str,
        request: ChatRequest,
    ) -> Result<String, LlmError> {
        let reply = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((provider, model.to_string(), request));
        Ok(reply)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub llm: Arc<EchoLlm>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Serve the full router on an ephemeral port with fake hosted services.
pub async fn spawn_app() -> TestServer {
    spawn_app_with(json!({ "rag": { "chunk_size": 60, "chunk_overlap": 10 } })).await
}

pub async fn spawn_app_with(config: Value) -> TestServer {
    let settings = AppSettings::from_config_with_env(&config, |_| None).unwrap();

    let llm = Arc::new(EchoLlm::default());
    let state =
        AppState::with_components(settings, Arc::new(LetterEmbedder), llm.clone(), None).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        llm,
    }
}

/// Build a minimal PDF with one page per entry of `pages`.
pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
