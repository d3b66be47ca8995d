//! In-memory similarity index.
//!
//! Holds `(chunk, embedding)` pairs for a single document and answers top-k
//! queries with a linear scan. The index is small (one uploaded document per
//! session), so no approximate structure is used.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chunker::TextChunk;
use crate::vector_math::{cosine_similarity, euclidean_distance};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("index is empty")]
    Empty,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding must not be empty")]
    EmptyEmbedding,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`, in `[0, 2]`.
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: TextChunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entry: &'a IndexEntry,
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    metric: DistanceMetric,
    dimension: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl SimilarityIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimension: None,
            entries: Vec::new(),
        }
    }

    /// An index that only accepts vectors of `dimension` components.
    pub fn with_dimension(metric: DistanceMetric, dimension: usize) -> Self {
        Self {
            metric,
            dimension: Some(dimension),
            entries: Vec::new(),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry. Duplicates are kept. The first insert fixes the
    /// dimension when none was configured.
    pub fn insert(&mut self, chunk: TextChunk, embedding: Vec<f32>) -> Result<(), IndexError> {
        self.check_dimension(&embedding)?;
        self.dimension.get_or_insert(embedding.len());
        self.entries.push(IndexEntry { chunk, embedding });
        Ok(())
    }

    /// Return the `k` entries closest to `query`, nearest first. Equal
    /// distances keep insertion order. `k` is clamped to `len()`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, IndexError> {
        if self.entries.is_empty() {
            return Err(IndexError::Empty);
        }
        self.check_dimension(query)?;

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|entry| {
                let distance = self.metric.distance(query, &entry.embedding);
                SearchHit {
                    entry,
                    distance: if distance.is_nan() {
                        f32::INFINITY
                    } else {
                        distance
                    },
                }
            })
            .collect();

        // stable sort keeps insertion order among ties
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        hits.truncate(k.min(self.entries.len()));
        Ok(hits)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.is_empty() {
            return Err(IndexError::EmptyEmbedding);
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }
}
