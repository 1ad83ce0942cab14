// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Groq chat-completion client (OpenAI-compatible API)

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::sse::{SseDecoder, SseEvent};
use super::types::{ApiErrorResponse, ChatCompletionRequest, ChatMessage, CompletionError};
use super::{CompletionClient, CompletionModel, TokenStream};
use crate::config::CompletionSettings;
use crate::rag::prompt::SYSTEM_INSTRUCTION;

/// Fragments buffered between the body reader and the consumer
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Client for `{base_url}/chat/completions`
///
/// Holds one `reqwest::Client` for the life of the process.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(settings: &CompletionSettings) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        prompt: &str,
        model: CompletionModel,
        api_key: &str,
    ) -> Result<TokenStream, CompletionError> {
        let request = ChatCompletionRequest::streaming(
            model,
            vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)],
        );

        info!("Requesting completion from {} ({} prompt chars)", model, prompt.len());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Completion request failed: {}", e);
                if e.is_timeout() {
                    CompletionError::Request("timeout".to_string())
                } else {
                    CompletionError::Request(e.to_string())
                }
            })?;

        let response = check_status(response).await?;
        debug!("Completion stream opened for {}", model);

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(pump_events(response, tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Map non-success statuses to typed errors
async fn check_status(response: Response) -> Result<Response, CompletionError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == 429 {
        return Err(CompletionError::RateLimited);
    }

    if status == 401 || status == 403 {
        return Err(CompletionError::Unauthorized {
            status: status.as_u16(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|r| r.error.message)
        .unwrap_or(body);
    warn!("Completion API returned {}: {}", status, message);
    Err(CompletionError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Read the response body and forward decoded fragments until the stream ends
async fn pump_events(
    response: Response,
    tx: mpsc::Sender<Result<String, CompletionError>>,
) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut fragments = 0usize;

    while let Some(chunk) = body.next().await {
        let bytes: Bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Completion stream interrupted: {}", e);
                let _ = tx.send(Err(CompletionError::Stream(e.to_string()))).await;
                return;
            }
        };

        for event in decoder.push(&bytes) {
            if !forward(&tx, event, &mut fragments).await {
                return;
            }
        }
    }

    if let Some(event) = decoder.finish() {
        forward(&tx, event, &mut fragments).await;
    }
    debug!("Completion stream ended after {} fragments", fragments);
}

/// Returns false once nothing more should be sent
async fn forward(
    tx: &mpsc::Sender<Result<String, CompletionError>>,
    event: SseEvent,
    fragments: &mut usize,
) -> bool {
    match event {
        SseEvent::Delta(text) => {
            *fragments += 1;
            // Receiver dropped: the consumer stopped reading
            tx.send(Ok(text)).await.is_ok()
        }
        SseEvent::Done => {
            debug!("Completion stream finished after {} fragments", fragments);
            false
        }
        SseEvent::Error(message) => {
            warn!("Completion stream error: {}", message);
            let _ = tx.send(Err(CompletionError::Stream(message))).await;
            false
        }
    }
}
