// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// In-memory vector index for one uploaded document
// Built once per document, immutable afterwards, queried by L2 distance

use std::cmp::Ordering;
use tracing::debug;

use super::chunker::DocumentChunk;
use super::errors::{IndexError, RetrievalError};
use crate::embeddings::Embedder;

/// Number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

/// Entry stored in the index
#[derive(Clone, Debug)]
pub struct IndexedChunk {
    pub vector: Vec<f32>,
    pub chunk: DocumentChunk,
}

/// Result from a nearest-neighbour query
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// Euclidean distance to the query vector (smaller is closer)
    pub distance: f32,
}

/// How many chunks a query returns and whether distant ones are dropped
///
/// The default returns the 4 nearest chunks with no threshold, so a
/// question always gets context even when nothing is relevant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalPolicy {
    pub top_k: usize,
    /// Drop results farther than this distance
    pub max_distance: Option<f32>,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_distance: None,
        }
    }
}

/// Exact nearest-neighbour index over the chunks of one document
/// - No mutating methods after `build`
/// - Shared between the session cache and the active reference via `Arc`
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from (vector, chunk) pairs
    ///
    /// # Returns
    /// * `Err` if there are no entries, dimensions disagree, or a vector
    ///   contains NaN or Infinity
    pub fn build(pairs: Vec<(Vec<f32>, DocumentChunk)>) -> Result<Self, IndexError> {
        let dimension = match pairs.first() {
            Some((vector, _)) => vector.len(),
            None => return Err(IndexError::Empty),
        };

        for (position, (vector, _)) in pairs.iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(IndexError::NonFiniteVector { position });
            }
        }

        let entries = pairs
            .into_iter()
            .map(|(vector, chunk)| IndexedChunk { vector, chunk })
            .collect();

        Ok(Self { entries, dimension })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Chunks in source order
    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Return the `top_k` chunks nearest to `query`, ascending by distance
    ///
    /// Equal distances are ordered by chunk index. Fewer than `top_k`
    /// results are returned only when the index is smaller or the
    /// policy's distance threshold drops some.
    pub fn search(
        &self,
        query: &[f32],
        policy: &RetrievalPolicy,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::QueryDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::NonFiniteQuery);
        }

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                distance: euclidean_distance(query, &entry.vector),
                chunk: entry.chunk.clone(),
            })
            .collect();

        if let Some(max_distance) = policy.max_distance {
            results.retain(|r| r.distance <= max_distance);
        }

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        results.truncate(policy.top_k);

        Ok(results)
    }

    /// Encode `question` with `embedder` and search
    ///
    /// `embedder` must be the one that produced the indexed vectors.
    pub async fn similarity_search(
        &self,
        embedder: &dyn Embedder,
        question: &str,
        policy: &RetrievalPolicy,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let query = embedder.embed(question).await?;
        let results = self.search(&query, policy)?;
        debug!(
            "Retrieved {} of {} chunks (k={})",
            results.len(),
            self.len(),
            policy.top_k
        );
        Ok(results)
    }
}

/// L2 distance between two vectors of equal length
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}
