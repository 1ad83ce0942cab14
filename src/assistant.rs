// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document question answering
//!
//! Ties the ingestion pipeline, the per-session index cache, retrieval and
//! the streaming completion client together. Every operation takes the
//! `Session` by `&mut`, so one upload, question or reset is handled to
//! completion before the next one starts.

use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::completion::{CompletionClient, CompletionModel};
use crate::embeddings::Embedder;
use crate::rag::{
    build_prompt, format_context, IngestError, IngestPipeline, RetrievalPolicy, VectorIndex,
};
use crate::session::{CacheStatus, Role, Session, SessionState};

/// Prefix of the reply stored when the completion request itself fails
pub const REQUEST_FAILED_PREFIX: &str = "API request failed";

/// Prefix of the reply stored when retrieval or the stream fails
pub const PROCESSING_FAILED_PREFIX: &str = "An error occurred while processing your request";

/// Preconditions that stop a question before anything is recorded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("No document has been processed")]
    NoActiveIndex,

    #[error("Question is empty")]
    EmptyQuestion,
}

impl SessionError {
    /// Get user-friendly error message for display
    pub fn user_message(&self) -> String {
        match self {
            SessionError::MissingApiKey => "Please enter your Groq API Key with /key or set the GROQ_API_KEY environment variable.".to_string(),
            SessionError::NoActiveIndex => "Please upload and process a PDF file first.".to_string(),
            SessionError::EmptyQuestion => "Please enter a question.".to_string(),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::MissingApiKey => "MISSING_API_KEY",
            SessionError::NoActiveIndex => "NO_ACTIVE_INDEX",
            SessionError::EmptyQuestion => "EMPTY_QUESTION",
        }
    }
}

/// Receives the answer as it is produced
pub trait ResponseSink: Send {
    /// Called after each non-empty fragment with the fragment and the text so far
    fn on_fragment(&mut self, fragment: &str, partial: &str);

    /// Called once with the final reply, which may be an error message
    fn on_complete(&mut self, reply: &str);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl ResponseSink for NullSink {
    fn on_fragment(&mut self, _fragment: &str, _partial: &str) {}
    fn on_complete(&mut self, _reply: &str) {}
}

/// Result of an upload
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub filename: String,
    pub status: CacheStatus,
    pub chunks: usize,
}

impl IngestReport {
    pub fn message(&self) -> &'static str {
        match self.status {
            CacheStatus::Built => "Document processed successfully! Ready to chat!",
            CacheStatus::Hit => "Document already processed. Ready to chat!",
        }
    }
}

/// How a question turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered,
    RetrievalFailed,
    RequestFailed,
    StreamFailed,
}

/// Result of a question turn; `reply` is what was stored in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerReport {
    pub reply: String,
    pub outcome: AnswerOutcome,
    pub sources: usize,
    pub fragments: usize,
}

impl AnswerReport {
    fn failed(reply: String, outcome: AnswerOutcome, sources: usize) -> Self {
        Self {
            reply,
            outcome,
            sources,
            fragments: 0,
        }
    }
}

/// Answers questions about uploaded documents
pub struct Assistant {
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionClient>,
    pipeline: IngestPipeline,
    policy: RetrievalPolicy,
    env_api_key: Option<String>,
}

impl Assistant {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionClient>,
        pipeline: IngestPipeline,
        policy: RetrievalPolicy,
    ) -> Self {
        Self {
            embedder,
            completion,
            pipeline,
            policy,
            env_api_key: None,
        }
    }

    /// Fallback key used when the session has none
    pub fn with_env_api_key(mut self, key: Option<String>) -> Self {
        self.env_api_key = key;
        self
    }

    pub fn policy(&self) -> &RetrievalPolicy {
        &self.policy
    }

    /// Index an uploaded PDF and make it the session's active document
    ///
    /// On error the session is left untouched, including any previously
    /// active document.
    pub async fn ingest_pdf(
        &self,
        session: &mut Session,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestReport, IngestError> {
        let key = session.cache_key(filename);
        let pipeline = &self.pipeline;
        let embedder = self.embedder.as_ref();

        let result = session
            .cache_mut()
            .get_or_build(key, || pipeline.build_from_pdf(filename, bytes, embedder))
            .await;
        self.finish_ingest(session, filename, result)
    }

    /// Same as `ingest_pdf` for text that was already extracted page by page
    pub async fn ingest_pages<S: AsRef<str> + Sync>(
        &self,
        session: &mut Session,
        filename: &str,
        pages: &[S],
    ) -> Result<IngestReport, IngestError> {
        let key = session.cache_key(filename);
        let pipeline = &self.pipeline;
        let embedder = self.embedder.as_ref();

        let result = session
            .cache_mut()
            .get_or_build(key, || pipeline.build_from_pages(filename, pages, embedder))
            .await;
        self.finish_ingest(session, filename, result)
    }

    fn finish_ingest(
        &self,
        session: &mut Session,
        filename: &str,
        result: Result<(Arc<VectorIndex>, CacheStatus), IngestError>,
    ) -> Result<IngestReport, IngestError> {
        match result {
            Ok((index, status)) => {
                let chunks = index.len();
                session.activate(filename, index);
                info!(
                    "Upload {} ({:?}, {} chunks) active in session {}",
                    filename,
                    status,
                    chunks,
                    session.id()
                );
                Ok(IngestReport {
                    filename: filename.to_string(),
                    status,
                    chunks,
                })
            }
            Err(e) => {
                error!("[{}] Failed to ingest {}: {}", e.error_code(), filename, e);
                Err(e)
            }
        }
    }

    /// Answer a question against the active document
    ///
    /// Precondition failures return `Err` and leave the session unchanged.
    /// Once the question is accepted, exactly one user message and one
    /// assistant message are appended, whether or not the answer succeeds.
    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
        sink: &mut dyn ResponseSink,
    ) -> Result<AnswerReport, SessionError> {
        let api_key = session
            .resolve_api_key(self.env_api_key.as_deref())
            .ok_or(SessionError::MissingApiKey)?;
        let index = session.active_index().ok_or(SessionError::NoActiveIndex)?;
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        session.record(Role::User, question);
        session.set_state(SessionState::Answering);

        let report = self
            .answer(&index, question, session.model(), &api_key, sink)
            .await;

        session.record(Role::Assistant, report.reply.clone());
        session.set_state(SessionState::Ready);
        sink.on_complete(&report.reply);

        Ok(report)
    }

    async fn answer(
        &self,
        index: &VectorIndex,
        question: &str,
        model: CompletionModel,
        api_key: &str,
        sink: &mut dyn ResponseSink,
    ) -> AnswerReport {
        let chunks = match index
            .similarity_search(self.embedder.as_ref(), question, &self.policy)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Retrieval failed: {}", e);
                return AnswerReport::failed(
                    format!("{}: {}", PROCESSING_FAILED_PREFIX, e),
                    AnswerOutcome::RetrievalFailed,
                    0,
                );
            }
        };
        let sources = chunks.len();

        let prompt = build_prompt(&format_context(&chunks), question);
        let mut stream = match self.completion.complete(&prompt, model, api_key).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("[{}] Completion request failed: {}", e.error_code(), e);
                return AnswerReport::failed(
                    format!("{}: {}", REQUEST_FAILED_PREFIX, e),
                    AnswerOutcome::RequestFailed,
                    sources,
                );
            }
        };

        let mut response = String::new();
        let mut fragments = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) if fragment.is_empty() => continue,
                Ok(fragment) => {
                    response.push_str(&fragment);
                    fragments += 1;
                    sink.on_fragment(&fragment, &response);
                }
                Err(e) => {
                    warn!(
                        "[{}] Completion stream failed after {} fragments: {}",
                        e.error_code(),
                        fragments,
                        e
                    );
                    return AnswerReport {
                        reply: format!("{}: {}", PROCESSING_FAILED_PREFIX, e),
                        outcome: AnswerOutcome::StreamFailed,
                        sources,
                        fragments,
                    };
                }
            }
        }

        info!(
            "Answered with {} fragments from {} sources",
            fragments, sources
        );
        AnswerReport {
            reply: response,
            outcome: AnswerOutcome::Answered,
            sources,
            fragments,
        }
    }
}
