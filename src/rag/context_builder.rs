//! Context and prompt assembly for grounded answers.

use serde::Serialize;

use super::index::SearchHit;

const CHUNK_SEPARATOR: &str = "\n\n";

/// Where a retrieved passage came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedSource {
    pub document: String,
    pub chunk_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub distance: f32,
}

impl From<&SearchHit<'_>> for RetrievedSource {
    fn from(hit: &SearchHit<'_>) -> Self {
        let chunk = &hit.entry.chunk;
        Self {
            document: chunk.document_id.clone(),
            chunk_index: chunk.chunk_index,
            start_offset: chunk.start_offset,
            end_offset: chunk.end_offset,
            distance: hit.distance,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    max_context_chars: usize,
}

impl ContextBuilder {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Join retrieved chunks, best first, with blank lines in between.
    ///
    /// Chunks are appended until the next one would push the context past
    /// `max_context_chars`. A first chunk that is longer than the bound on its
    /// own is truncated rather than dropped. Returns the context together with
    /// the hits that made it in.
    pub fn build_context<'a>(&self, hits: &[SearchHit<'a>]) -> (String, Vec<SearchHit<'a>>) {
        let mut context = String::new();
        let mut used = Vec::new();
        let mut current_chars = 0usize;

        for hit in hits {
            let text = hit.entry.chunk.text.as_str();
            let text_chars = text.chars().count();

            if used.is_empty() {
                if text_chars > self.max_context_chars {
                    context.extend(text.chars().take(self.max_context_chars));
                    used.push(*hit);
                    break;
                }
                context.push_str(text);
                current_chars = text_chars;
                used.push(*hit);
                continue;
            }

            let addition = CHUNK_SEPARATOR.len() + text_chars;
            if current_chars + addition > self.max_context_chars {
                break;
            }
            context.push_str(CHUNK_SEPARATOR);
            context.push_str(text);
            current_chars += addition;
            used.push(*hit);
        }

        (context, used)
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the following question using the context. If the answer is not in the context, say 'I don't know':\n\nContext:\n{}\n\nQuestion: {}",
        context, question
    )
}
