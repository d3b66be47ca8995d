//! Document chunker.
//!
//! Splits document text into fixed-size, overlapping passages. Offsets are
//! counted in chars so a chunk never cuts a UTF-8 code point in half.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// A passage of a document. `[start_offset, end_offset)` is a char range into
/// the text it was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub document_id: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub chunk_index: usize,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into overlapping chunks.
    ///
    /// Chunk `i` starts at `i * (chunk_size - chunk_overlap)`. Splitting stops
    /// as soon as a chunk reaches the end of the text, so the last chunk may be
    /// shorter than `chunk_size` and is never contained in its predecessor.
    pub fn split(&self, text: &str, document_id: &str) -> Vec<TextChunk> {
        // byte position of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        if total_chars == 0 {
            return chunks;
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            chunks.push(TextChunk {
                text: text[boundaries[start]..boundaries[end]].to_string(),
                document_id: document_id.to_string(),
                start_offset: start,
                end_offset: end,
                chunk_index: chunks.len(),
            });

            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}
