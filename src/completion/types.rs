// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat-completion wire types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{CompletionModel, MAX_TOKENS, TEMPERATURE, TOP_P};

/// Errors from the completion service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Transport failure: connection, timeout, malformed response
    #[error("{0}")]
    Request(String),

    #[error("Invalid API key (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Failure after the response started streaming
    #[error("{0}")]
    Stream(String),
}

impl CompletionError {
    /// Get user-friendly error message for display
    pub fn user_message(&self) -> String {
        match self {
            CompletionError::Unauthorized { .. } => {
                "The Groq API rejected the API key. Check the key and try again.".to_string()
            }
            CompletionError::RateLimited => {
                "The Groq API rate limit was reached. Wait a moment and try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            CompletionError::Request(_) => "REQUEST_FAILED",
            CompletionError::Unauthorized { .. } => "UNAUTHORIZED",
            CompletionError::RateLimited => "RATE_LIMITED",
            CompletionError::Api { .. } => "API_ERROR",
            CompletionError::Stream(_) => "STREAM_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: CompletionModel,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Streaming request with the fixed sampling parameters
    pub fn streaming(model: CompletionModel, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: true,
        }
    }
}

/// One `data:` payload of a streamed response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error object returned in-band or as a non-success body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Non-success response body: `{"error": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
