// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Session state: transcript, index cache and the active document

pub mod cache;
pub mod context;
pub mod conversation;

pub use cache::{CacheKey, CacheStatus, SessionCache};
pub use context::{Session, SessionState};
pub use conversation::{Conversation, Message, Role};
