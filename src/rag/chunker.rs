// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-window document chunking
//!
//! Splits normalized document text into overlapping character windows.
//! Each window after the first starts `chunk_size - chunk_overlap`
//! characters after the previous one, so text spanning a window boundary
//! is always fully contained in at least one chunk.

use serde::{Deserialize, Serialize};

use super::errors::IngestError;
use super::normalizer::{is_indexable, normalize_text};

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Chunking configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    /// Distance between the starts of two consecutive windows
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        Ok(())
    }
}

/// A bounded span of document text, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Window ordinal in source order
    pub index: usize,
    /// Character offset of the window in the joined document text
    pub start: usize,
    pub content: String,
}

impl DocumentChunk {
    /// Character offset one past the end of the window
    pub fn end(&self) -> usize {
        self.start + self.content.chars().count()
    }
}

/// Splits text into overlapping fixed-size windows
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Number of windows produced for a text of `len` characters
    pub fn expected_chunk_count(&self, len: usize) -> usize {
        let size = self.config.chunk_size;
        if len == 0 {
            0
        } else if len <= size {
            1
        } else {
            1 + (len - size).div_ceil(self.config.stride())
        }
    }

    /// Split one text into windows
    ///
    /// Windows that hold no content after normalization are skipped, but
    /// the surviving chunks keep their original window ordinals.
    pub fn split_text(&self, text: &str) -> Vec<DocumentChunk> {
        // Byte offset of every char boundary, plus the end of the string
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(self.expected_chunk_count(len));
        let mut start = 0;
        let mut index = 0;

        while start < len {
            let end = (start + self.config.chunk_size).min(len);
            let content = &text[boundaries[start]..boundaries[end]];

            if is_indexable(content) {
                chunks.push(DocumentChunk {
                    index,
                    start,
                    content: content.to_string(),
                });
            }

            if end == len {
                break;
            }
            start += self.config.stride();
            index += 1;
        }

        chunks
    }

    /// Normalize each section, drop empty ones, join with a single space,
    /// and split the joined text
    pub fn split_sections<S: AsRef<str>>(&self, sections: &[S]) -> Vec<DocumentChunk> {
        let document = join_normalized_sections(sections);
        self.split_text(&document)
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

/// Normalize sections and join the non-empty ones with a single space
pub fn join_normalized_sections<S: AsRef<str>>(sections: &[S]) -> String {
    sections
        .iter()
        .map(|s| normalize_text(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
