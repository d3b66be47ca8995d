//! PDF retrieval pipeline.
//!
//! - `pdf`: text extraction from uploaded PDFs
//! - `chunker`: fixed-size overlapping character chunks
//! - `embedder`: hosted embedding client
//! - `index`: in-memory nearest-neighbour search
//! - `session`: per-session index snapshots
//! - `orchestrator`: build and query phases tied together

mod chunker;
mod context_builder;
mod embedder;
mod index;
mod orchestrator;
mod pdf;
mod session;

pub use chunker::{ChunkError, DocumentChunker, TextChunk};
pub use context_builder::{build_prompt, ContextBuilder, RetrievedSource};
pub use embedder::{Embedder, EmbeddingError, OpenAiEmbedder};
pub use index::{DistanceMetric, IndexEntry, IndexError, SearchHit, SimilarityIndex};
pub use orchestrator::{RagAnswer, RetrievalOrchestrator};
pub use pdf::{extract_document, Document, PdfError};
pub use session::{
    IndexSnapshot, SessionRegistry, SnapshotSummary, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_ID,
};
