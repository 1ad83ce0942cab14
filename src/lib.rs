// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod assistant;
pub mod cli;
pub mod completion;
pub mod config;
pub mod embeddings;
pub mod rag;
pub mod session;
pub mod version;

// Re-export main types
pub use assistant::{
    AnswerOutcome, AnswerReport, Assistant, IngestReport, NullSink, ResponseSink, SessionError,
};
pub use completion::{CompletionClient, CompletionError, CompletionModel, GroqClient, TokenStream};
pub use config::{AppConfig, ConfigError};
pub use embeddings::{Embedder, EmbeddingError, OnnxEmbeddingModel};
pub use rag::{DocumentChunk, IngestError, IngestPipeline, RetrievalPolicy, VectorIndex};
pub use session::{Session, SessionState};
