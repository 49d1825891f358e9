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

//! Cipher strategy.
//!
//! The whole encoded PageState travels inside the token, sealed with
//! AES-256-GCM. The session id and page id are bound in as associated data,
//! so a token lifted from another session or re-labelled with another page
//! id fails to open. Nothing is stored server side.

use std::sync::Arc;
use tracing::debug;

use crate::codec::encoder::StateEncoder;
use crate::codec::traits::{StateCodec, Submission};
use crate::codec::{binding, decode_payload, format_token, parse_token};
use crate::config::Strategy;
use crate::engine_core::crypto::KeyRing;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageState, Token};
use crate::engine_core::session::SessionState;

// Every open failure reports this; decryption and tag failures look alike.
const INTEGRITY_FAILURE: &str = "token failed integrity check";

#[derive(Debug, Clone)]
pub struct CipherCodec {
    keys: KeyRing,
    allowed_length: usize,
}

impl CipherCodec {
    pub fn new(keys: KeyRing, allowed_length: usize) -> Self {
        Self {
            keys,
            allowed_length,
        }
    }

    pub fn allowed_length(&self) -> usize {
        self.allowed_length
    }
}

fn tamper(reason: &str) -> StateError {
    debug!(reason, "Cipher token rejected");
    StateError::Tamper(INTEGRITY_FAILURE.to_string())
}

impl StateCodec for CipherCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Cipher
    }

    fn finalize_token(
        &self,
        state: &PageState,
        session: &SessionState,
    ) -> Result<Token, StateError> {
        let encoded = StateEncoder::encode(state);
        if encoded.len() > self.allowed_length {
            return Err(StateError::StateTooLarge {
                length: encoded.len(),
                allowed: self.allowed_length,
            });
        }

        let aad = binding(&session.id(), &state.page_id);
        let sealed = session.keys(&self.keys).seal(&aad, &encoded)?;
        Ok(format_token(&state.page_id, Some(&sealed)))
    }

    fn open_token(
        &self,
        token: &Token,
        submission: &Submission<'_>,
    ) -> Result<Arc<PageState>, StateError> {
        let session = submission.session;
        let parts = parse_token(token).ok_or_else(|| tamper("unparseable token"))?;
        let payload = parts.payload.ok_or_else(|| tamper("missing payload"))?;
        let sealed = decode_payload(payload).ok_or_else(|| tamper("invalid base64"))?;

        let aad = binding(&session.id(), &parts.page_id);
        let plaintext = session
            .keys(&self.keys)
            .open(&aad, &sealed)
            .ok_or_else(|| tamper("authentication failed"))?;

        // authentic but unreadable means the format changed underneath us, not an attack
        let state = StateEncoder::decode(&plaintext)?;
        if state.page_id != parts.page_id {
            return Err(tamper("page id mismatch"));
        }
        Ok(Arc::new(state))
    }
}
