// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Per-session cache of built vector indexes
// Keyed by session id and upload filename; entries live as long as the session

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::rag::VectorIndex;

/// Identifies one uploaded document within one session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub session_id: Uuid,
    pub filename: String,
}

impl CacheKey {
    pub fn new(session_id: Uuid, filename: impl Into<String>) -> Self {
        Self {
            session_id,
            filename: filename.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session_id, self.filename)
    }
}

/// Whether `get_or_build` reused an index or built a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Built,
}

#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<CacheKey, Arc<VectorIndex>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `key`, or run `build` and store its result
    ///
    /// `build` is not called on a hit. A failed build stores nothing.
    pub async fn get_or_build<F, Fut, E>(
        &mut self,
        key: CacheKey,
        build: F,
    ) -> Result<(Arc<VectorIndex>, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex, E>>,
    {
        if let Some(index) = self.entries.get(&key) {
            debug!("Index cache hit for {}", key);
            return Ok((Arc::clone(index), CacheStatus::Hit));
        }

        let index = Arc::new(build().await?);
        info!("Cached index for {} ({} chunks)", key, index.len());
        self.entries.insert(key, Arc::clone(&index));
        Ok((index, CacheStatus::Built))
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<VectorIndex>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
