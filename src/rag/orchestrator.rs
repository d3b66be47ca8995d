//! Retrieval orchestrator.
//!
//! Build phase: document text -> chunks -> embeddings -> [`SimilarityIndex`].
//! Query phase: question -> embedding -> top-k chunks -> bounded context ->
//! prompt -> hosted LLM -> answer.

use std::sync::Arc;

use serde::Serialize;

use super::chunker::DocumentChunker;
use super::context_builder::{build_prompt, ContextBuilder, RetrievedSource};
use super::embedder::Embedder;
use super::index::{SearchHit, SimilarityIndex};
use super::pdf::Document;
use crate::core::config::RagSettings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<RetrievedSource>,
}

pub struct RetrievalOrchestrator {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmClient>,
    chunker: DocumentChunker,
    context: ContextBuilder,
    settings: RagSettings,
    dimensions: Option<usize>,
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        settings: RagSettings,
        dimensions: Option<usize>,
    ) -> Result<Self, ApiError> {
        let chunker = DocumentChunker::new(settings.chunk_size, settings.chunk_overlap)?;
        let context = ContextBuilder::new(settings.max_context_chars);
        Ok(Self {
            embedder,
            llm,
            chunker,
            context,
            settings,
            dimensions,
        })
    }

    /// Chunk and embed `document` into a fresh index.
    pub async fn build_index(&self, document: &Document) -> Result<SimilarityIndex, ApiError> {
        let chunks = self.chunker.split(&document.text, &document.id);
        if chunks.is_empty() {
            return Err(ApiError::BadRequest(
                "No text chunks produced from PDF.".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(ApiError::RemoteService(format!(
                "Embedding service returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut index = match self.dimensions {
            Some(dim) => SimilarityIndex::with_dimension(self.settings.metric, dim),
            None => SimilarityIndex::new(self.settings.metric),
        };
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.insert(chunk, embedding)?;
        }

        tracing::info!(
            "Indexed {} ({} pages) into {} chunks with {}",
            document.id,
            document.page_count,
            index.len(),
            self.embedder.model()
        );
        Ok(index)
    }

    /// Embed `question` and return the nearest chunks of `index`.
    pub async fn retrieve<'a>(
        &self,
        index: &'a SimilarityIndex,
        question: &str,
    ) -> Result<Vec<SearchHit<'a>>, ApiError> {
        if index.is_empty() {
            return Err(ApiError::EmptyIndex);
        }

        let query = self.embedder.embed(&[question.to_string()]).await?;
        let query = query.into_iter().next().ok_or_else(|| {
            ApiError::RemoteService("Embedding service returned no vector for the query".to_string())
        })?;

        Ok(index.search(&query, self.settings.top_k)?)
    }

    /// Answer `question` from the chunks of `index`. No conversation state is
    /// kept between calls.
    pub async fn answer(
        &self,
        index: &SimilarityIndex,
        question: &str,
    ) -> Result<RagAnswer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest(
                "Please enter a question about the uploaded PDF.".to_string(),
            ));
        }

        let hits = self.retrieve(index, question).await?;
        let (context, used) = self.context.build_context(&hits);
        let prompt = build_prompt(&context, question);
        tracing::debug!(
            "RAG prompt preview: {}",
            prompt.chars().take(300).collect::<String>()
        );

        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.settings.temperature);
        let answer = self
            .llm
            .chat(self.settings.provider, &self.settings.model, request)
            .await?;

        Ok(RagAnswer {
            answer,
            sources: used.iter().map(RetrievedSource::from).collect(),
        })
    }
}
