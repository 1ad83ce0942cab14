// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Explicit per-session context: conversation, active index, cache, credentials

use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::cache::{CacheKey, SessionCache};
use super::conversation::{Conversation, Role};
use crate::completion::CompletionModel;
use crate::rag::VectorIndex;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No active document
    Empty,
    /// A document is active and questions can be asked
    Ready,
    /// A question is being answered
    Answering,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Empty => f.write_str("empty"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::Answering => f.write_str("answering"),
        }
    }
}

/// State owned by one interactive user
///
/// All mutation goes through `&mut self`, so one interaction finishes
/// before the next can start.
pub struct Session {
    id: Uuid,
    conversation: Conversation,
    active_index: Option<Arc<VectorIndex>>,
    active_document: Option<String>,
    cache: SessionCache,
    api_key: Option<String>,
    model: CompletionModel,
    state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("messages", &self.conversation.len())
            .field("active_document", &self.active_document)
            .field("cached_indexes", &self.cache.len())
            .field("has_api_key", &self.api_key.is_some())
            .field("model", &self.model)
            .field("state", &self.state)
            .finish()
    }
}

impl Session {
    pub fn new(model: CompletionModel) -> Self {
        Self::with_id(Uuid::new_v4(), model)
    }

    pub fn with_id(id: Uuid, model: CompletionModel) -> Self {
        Self {
            id,
            conversation: Conversation::new(),
            active_index: None,
            active_document: None,
            cache: SessionCache::new(),
            api_key: None,
            model,
            state: SessionState::Empty,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub fn model(&self) -> CompletionModel {
        self.model
    }

    pub fn set_model(&mut self, model: CompletionModel) {
        self.model = model;
    }

    /// Set the session API key; blank input clears it
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Session key first, then the environment key
    pub fn resolve_api_key(&self, env_key: Option<&str>) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env_key.filter(|k| !k.trim().is_empty()).map(str::to_string))
    }

    /// Messages so far; only `record` and `reset` change them
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub(crate) fn record(&mut self, role: Role, content: impl Into<String>) {
        self.conversation.append(role, content);
    }

    pub fn cache_key(&self, filename: &str) -> CacheKey {
        CacheKey::new(self.id, filename)
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    pub fn active_index(&self) -> Option<Arc<VectorIndex>> {
        self.active_index.clone()
    }

    pub fn active_document(&self) -> Option<&str> {
        self.active_document.as_deref()
    }

    pub(crate) fn activate(&mut self, filename: &str, index: Arc<VectorIndex>) {
        self.active_index = Some(index);
        self.active_document = Some(filename.to_string());
        self.state = SessionState::Ready;
    }

    /// Clear the conversation and the active document
    ///
    /// Cached indexes are kept, so uploading the same file again is a hit.
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.active_index = None;
        self.active_document = None;
        self.state = SessionState::Empty;
        info!("Session {} reset", self.id);
    }
}
