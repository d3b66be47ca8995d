//! Per-session index snapshots.
//!
//! Each session owns at most one immutable [`IndexSnapshot`]. An upload builds
//! a complete new index before calling [`SessionRegistry::replace`], which
//! swaps the `Arc` under a short write lock. Queries clone the `Arc` and keep
//! reading the snapshot they started with, even if a newer one is swapped in
//! while they run.
//!
//! The registry holds at most `max_sessions` snapshots. Installing one for a
//! new session at capacity evicts the session with the oldest index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::index::SimilarityIndex;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug)]
pub struct IndexSnapshot {
    pub index: SimilarityIndex,
    pub document_id: String,
    pub page_count: usize,
    pub version: u64,
    pub indexed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub document: String,
    pub pages: usize,
    pub chunks: usize,
    pub index_version: u64,
    pub indexed_at: DateTime<Utc>,
}

impl IndexSnapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            document: self.document_id.clone(),
            pages: self.page_count,
            chunks: self.index.len(),
            index_version: self.version,
            indexed_at: self.indexed_at,
        }
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 64;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<IndexSnapshot>>>,
    next_version: AtomicU64,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_version: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Install `index` as the session's current snapshot and return it.
    pub fn replace(
        &self,
        session_id: &str,
        document_id: &str,
        page_count: usize,
        index: SimilarityIndex,
    ) -> Arc<IndexSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(IndexSnapshot {
            index,
            document_id: document_id.to_string(),
            page_count,
            version,
            indexed_at: Utc::now(),
        });

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, snapshot)| snapshot.version)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::info!(
                    "Evicted index of session {} ({} sessions max)",
                    oldest,
                    self.max_sessions
                );
            }
        }
        if let Some(previous) = sessions.insert(session_id.to_string(), snapshot.clone()) {
            tracing::info!(
                "Session {} index replaced (v{} -> v{})",
                session_id,
                previous.version,
                version
            );
        }
        snapshot
    }

    pub fn snapshot(&self, session_id: &str) -> Option<Arc<IndexSnapshot>> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .cloned()
    }

    /// Drop the session's snapshot. Returns whether one existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(session_id)
            .is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::TextChunk;
    use crate::rag::index::DistanceMetric;

    fn index_with(texts: &[&str]) -> SimilarityIndex {
        let mut index = SimilarityIndex::new(DistanceMetric::Cosine);
        for (i, text) in texts.iter().enumerate() {
            index
                .insert(
                    TextChunk {
                        text: text.to_string(),
                        document_id: "doc".to_string(),
                        start_offset: i,
                        end_offset: i + 1,
                        chunk_index: i,
                    },
                    vec![1.0, i as f32],
                )
                .unwrap();
        }
        index
    }

    #[test]
    fn snapshots_are_scoped_per_session() {
        let registry = SessionRegistry::new();
        registry.replace("a", "a.pdf", 1, index_with(&["alpha"]));

        assert!(registry.snapshot("a").is_some());
        assert!(registry.snapshot("b").is_none());
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn held_snapshot_survives_replacement() {
        let registry = SessionRegistry::new();
        registry.replace("s", "old.pdf", 1, index_with(&["old"]));

        let in_flight = registry.snapshot("s").unwrap();
        let newer = registry.replace("s", "new.pdf", 2, index_with(&["new", "newer"]));

        assert_eq!(in_flight.document_id, "old.pdf");
        assert_eq!(in_flight.index.len(), 1);
        assert!(newer.version > in_flight.version);

        let current = registry.snapshot("s").unwrap();
        assert_eq!(current.document_id, "new.pdf");
        assert_eq!(current.summary().chunks, 2);
    }

    #[test]
    fn clear_removes_the_snapshot() {
        let registry = SessionRegistry::new();
        registry.replace("s", "doc.pdf", 1, index_with(&["x"]));

        assert!(registry.clear("s"));
        assert!(!registry.clear("s"));
        assert!(registry.snapshot("s").is_none());
    }

    #[test]
    fn oldest_session_is_evicted_at_capacity() {
        let registry = SessionRegistry::with_capacity(2);
        registry.replace("a", "a.pdf", 1, index_with(&["a"]));
        registry.replace("b", "b.pdf", 1, index_with(&["b"]));
        // refreshing "a" makes "b" the oldest
        registry.replace("a", "a2.pdf", 1, index_with(&["a"]));
        registry.replace("c", "c.pdf", 1, index_with(&["c"]));

        assert_eq!(registry.session_count(), 2);
        assert!(registry.snapshot("b").is_none());
        assert_eq!(registry.snapshot("a").unwrap().document_id, "a2.pdf");
        assert!(registry.snapshot("c").is_some());
    }

    #[test]
    fn replacing_at_capacity_keeps_other_sessions() {
        let registry = SessionRegistry::with_capacity(2);
        registry.replace("a", "a.pdf", 1, index_with(&["a"]));
        registry.replace("b", "b.pdf", 1, index_with(&["b"]));
        registry.replace("b", "b2.pdf", 1, index_with(&["b"]));

        assert_eq!(registry.session_count(), 2);
        assert!(registry.snapshot("a").is_some());
    }

    #[test]
    fn concurrent_replace_and_read_never_observe_partial_state() {
        let registry = Arc::new(SessionRegistry::new());
        registry.replace("s", "v0.pdf", 1, index_with(&["a", "b"]));

        let writer = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    registry.replace("s", &format!("v{i}.pdf"), 1, index_with(&["a", "b"]));
                }
            })
        };

        for _ in 0..200 {
            let snapshot = registry.snapshot("s").unwrap();
            assert_eq!(snapshot.index.len(), 2);
        }
        writer.join().unwrap();
    }
}
