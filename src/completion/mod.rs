// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Streaming chat completions

pub mod groq;
pub mod models;
pub mod sse;
pub mod types;

pub use groq::GroqClient;
pub use models::CompletionModel;
pub use types::CompletionError;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Read-once sequence of answer fragments
///
/// `None` means the answer is complete; an `Err` item means the stream
/// failed part-way and yields nothing further.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// Sends a grounded prompt to a chat model and streams the answer back
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a streamed completion
    ///
    /// # Returns
    /// * `Err` if the request could not be made or was refused
    /// * `Ok(TokenStream)` once the server started responding
    async fn complete(
        &self,
        prompt: &str,
        model: CompletionModel,
        api_key: &str,
    ) -> Result<TokenStream, CompletionError>;
}
