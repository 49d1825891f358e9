// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session and request context.
//!
//! The host owns one `SessionState` per web session (usually behind an
//! `Arc` stored in its own session object) and passes it explicitly to every
//! composer and validator call. Dropping it drops the page history with it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::KeyScope;
use crate::engine_core::constants::audit;
use crate::engine_core::crypto::KeyRing;
use crate::engine_core::models::SessionId;
use crate::store::history::SessionStateHistory;

#[derive(Debug)]
pub struct SessionState {
    id: SessionId,
    history: SessionStateHistory,
    sequence: AtomicU64,
    keys: Option<KeyRing>,
}

impl SessionState {
    pub fn new(history_capacity: usize, key_scope: KeyScope) -> Self {
        Self::with_id(SessionId::generate(), history_capacity, key_scope)
    }

    pub fn with_id(id: SessionId, history_capacity: usize, key_scope: KeyScope) -> Self {
        let keys = match key_scope {
            KeyScope::Session => Some(KeyRing::generate()),
            KeyScope::Process => None,
        };
        Self {
            id,
            history: SessionStateHistory::new(history_capacity),
            sequence: AtomicU64::new(0),
            keys,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn history(&self) -> &SessionStateHistory {
        &self.history
    }

    /// Next page sequence number; strictly increasing within the session.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Session-scoped keys when configured, otherwise the process ring.
    pub fn keys<'a>(&'a self, process: &'a KeyRing) -> &'a KeyRing {
        self.keys.as_ref().unwrap_or(process)
    }
}

/// Where the request came from, for attack logs.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub remote_addr: Option<String>,
    pub forwarded_for: Option<String>,
    pub user: Option<String>,
}

impl ClientInfo {
    /// Build from the host's request using a header lookup function.
    pub fn from_request<F>(remote_addr: Option<String>, header: F, user: Option<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            remote_addr,
            forwarded_for: header(audit::FORWARDED_FOR_HEADER),
            user,
        }
    }
}

/// Explicit per-request context handed to the validator and guard.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: Arc<SessionState>,
    pub target: String,
    pub client: ClientInfo,
}

impl RequestContext {
    pub fn new(session: Arc<SessionState>, target: impl Into<String>) -> Self {
        Self {
            session,
            target: target.into(),
            client: ClientInfo::default(),
        }
    }

    pub fn with_client(mut self, client: ClientInfo) -> Self {
        self.client = client;
        self
    }
}
