// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sentence embeddings for chunks and questions
//!
//! The same `Embedder` instance must encode both the indexed chunks and the
//! query text; distances are only meaningful inside one embedding space.

pub mod model_files;
pub mod onnx_model;

pub use model_files::{load_embedding_model, resolve_model_files, ModelFiles};
pub use onnx_model::OnnxEmbeddingModel;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while encoding text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected embedding dimension: {actual} (expected {expected})")]
    Dimension { expected: usize, actual: usize },
}

/// Maps text to a fixed-length dense vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Encode several texts, preserving order
    ///
    /// The default implementation calls `embed` once per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model
    fn model_name(&self) -> String;
}
