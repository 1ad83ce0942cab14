// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Document retrieval: PDF extraction, chunking, vector index, prompt composition

pub mod chunker;
pub mod errors;
pub mod ingest;
pub mod normalizer;
pub mod pdf;
pub mod prompt;
pub mod vector_index;

pub use chunker::{ChunkerConfig, DocumentChunk, TextChunker};
pub use errors::{IndexError, IngestError, RetrievalError};
pub use ingest::IngestPipeline;
pub use normalizer::{is_indexable, normalize_text};
pub use prompt::{build_prompt, format_context, SYSTEM_INSTRUCTION};
pub use vector_index::{RetrievalPolicy, ScoredChunk, VectorIndex};
