// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for document ingestion and retrieval
//!
//! Covers:
//! - PDF errors (unreadable file, no extractable text)
//! - Embedding errors (model failure during indexing or query encoding)
//! - Index errors (empty input, dimension mismatch, non-finite vectors)

use thiserror::Error;

use crate::embeddings::EmbeddingError;

/// Errors raised while building a vector index from an uploaded document
#[derive(Error, Debug)]
pub enum IngestError {
    /// The PDF could not be parsed
    #[error("Failed to read PDF {filename}: {reason}")]
    PdfUnreadable { filename: String, reason: String },

    /// The PDF parsed but no page survived normalization
    #[error("No extractable text in {filename}")]
    NoExtractableText { filename: String },

    /// Chunk embedding failed
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index construction failed
    #[error("Failed to build index: {0}")]
    IndexBuild(#[from] IndexError),

    /// Invalid chunking configuration
    #[error("Invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// Temporary file handling failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Get user-friendly error message for display
    pub fn user_message(&self) -> String {
        match self {
            IngestError::PdfUnreadable { filename, .. } => {
                format!(
                    "Error processing PDF: '{}' could not be read. It may be corrupt or encrypted.",
                    filename
                )
            }
            IngestError::NoExtractableText { filename } => {
                format!(
                    "Error processing PDF: '{}' contains no extractable text (it may be image-based).",
                    filename
                )
            }
            IngestError::Embedding(e) => format!("Error processing PDF: {}", e),
            _ => format!("Error processing PDF: {}", self),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::PdfUnreadable { .. } => "PDF_UNREADABLE",
            IngestError::NoExtractableText { .. } => "NO_EXTRACTABLE_TEXT",
            IngestError::Embedding(_) => "EMBEDDING_FAILED",
            IngestError::IndexBuild(_) => "INDEX_BUILD_FAILED",
            IngestError::InvalidConfig(_) => "INVALID_CONFIG",
            IngestError::Io(_) => "IO_ERROR",
        }
    }
}

/// Errors raised by vector index construction and queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Build was called with no entries
    #[error("Cannot build an index from zero chunks")]
    Empty,

    /// Vector dimensions don't match the rest of the index
    #[error("Dimension mismatch at entry {position}: expected {expected}D, got {actual}D")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },

    /// Vector contains NaN or Infinity
    #[error("Entry {position} contains NaN or Infinity")]
    NonFiniteVector { position: usize },

    /// Query vector dimension doesn't match the index
    #[error("Invalid query dimensions: expected {expected}, got {actual}")]
    QueryDimension { expected: usize, actual: usize },

    /// Query vector contains NaN or Infinity
    #[error("Query vector contains NaN or Infinity")]
    NonFiniteQuery,
}

/// Errors raised while answering a question against an index
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
