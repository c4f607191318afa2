//! In-memory vector index with brute-force cosine similarity search.
//!
//! The knowledge base is a few dozen chunks, so an O(n) scan per query is
//! plenty.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use sqlrag_core::SqlRagError;

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    /// Cosine similarity score.
    pub score: f64,
    /// Passage text.
    pub text: String,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    text: String,
    metadata: Value,
    /// Insertion order, used to break score ties.
    seq: u64,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<Uuid, VectorEntry>,
    next_seq: u64,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Arc<RwLock<Entries>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a passage and its embedding into the index.
    ///
    /// Overwrites any existing entry with the same ID.
    pub fn insert(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        text: impl Into<String>,
        metadata: Value,
    ) -> Result<(), SqlRagError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| SqlRagError::Retrieval(format!("Lock poisoned: {}", e)))?;
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            id,
            VectorEntry {
                embedding,
                text: text.into(),
                metadata,
                seq,
            },
        );
        Ok(())
    }

    /// Search for the k nearest neighbors to the query vector by cosine similarity.
    ///
    /// Returns results sorted by descending score; equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, SqlRagError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| SqlRagError::Retrieval(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<(u64, SearchHit)> = entries
            .map
            .iter()
            .map(|(id, entry)| {
                let hit = SearchHit {
                    id: *id,
                    score: cosine_similarity(query, &entry.embedding),
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                };
                (entry.seq, hit)
            })
            .collect();

        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
