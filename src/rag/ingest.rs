// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Document ingestion: PDF -> pages -> chunks -> embeddings -> index

use std::time::Instant;
use tracing::{debug, info};

use super::chunker::{ChunkerConfig, TextChunker};
use super::errors::IngestError;
use super::pdf::extract_pages;
use super::vector_index::VectorIndex;
use crate::embeddings::{Embedder, EmbeddingError};

/// Turns an uploaded document into a searchable vector index
#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    chunker: TextChunker,
}

impl IngestPipeline {
    pub fn new(config: ChunkerConfig) -> Result<Self, IngestError> {
        Ok(Self {
            chunker: TextChunker::new(config)?,
        })
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Build an index from raw page texts
    ///
    /// # Returns
    /// * `Err(NoExtractableText)` if no page has content after normalization
    pub async fn build_from_pages<S: AsRef<str>>(
        &self,
        filename: &str,
        pages: &[S],
        embedder: &dyn Embedder,
    ) -> Result<VectorIndex, IngestError> {
        let start = Instant::now();
        let chunks = self.chunker.split_sections(pages);
        if chunks.is_empty() {
            return Err(IngestError::NoExtractableText {
                filename: filename.to_string(),
            });
        }
        debug!("Split {} into {} chunks", filename, chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(IngestError::Embedding(EmbeddingError::Inference(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            ))));
        }

        let index = VectorIndex::build(vectors.into_iter().zip(chunks).collect())?;
        info!(
            "Indexed {} ({} chunks, {}D) in {:?}",
            filename,
            index.len(),
            index.dimension(),
            start.elapsed()
        );
        Ok(index)
    }

    /// Extract a PDF and build its index
    pub async fn build_from_pdf(
        &self,
        filename: &str,
        bytes: &[u8],
        embedder: &dyn Embedder,
    ) -> Result<VectorIndex, IngestError> {
        let pages = extract_pages(filename, bytes).await?;
        self.build_from_pages(filename, &pages, embedder).await
    }
}
