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

//! Hash strategy.
//!
//! The PageState is kept in the session history like the memory strategy, and
//! the token additionally carries two keyed tags:
//!
//! - a page tag over (session id, page id), checked before the store is
//!   consulted, so any edit of the token is reported as tampering even when
//!   the page has since been evicted;
//! - a structure tag over the structural encoding of the state, recomputed
//!   from the stored copy on every submit.
//!
//! Once the page is authenticated, the parameter names the request claims for
//! its target are compared with the recorded structure: a parameter the page
//! never rendered, or a missing fixed single-value field, is tampering. With
//! confidentiality on, every value of a fixed parameter must also be an id
//! the page issued for it.

use std::sync::Arc;
use tracing::debug;

use crate::codec::encoder::StateEncoder;
use crate::codec::traits::{StateCodec, Submission};
use crate::codec::{decode_payload, format_token, parse_token};
use crate::config::Strategy;
use crate::engine_core::constants::{crypto, token as token_consts};
use crate::engine_core::crypto::KeyRing;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageState, Token, ValueId};
use crate::engine_core::session::SessionState;

#[derive(Debug, Clone)]
pub struct HashCodec {
    keys: KeyRing,
    allowed_length: usize,
}

impl HashCodec {
    pub fn new(keys: KeyRing, allowed_length: usize) -> Self {
        Self {
            keys,
            allowed_length,
        }
    }

    /// Compare what the request claims for its target with the page structure.
    fn check_claimed_structure(
        state: &PageState,
        submission: &Submission<'_>,
    ) -> Result<(), StateError> {
        for (name, values) in submission.params {
            if name == token_consts::STATE_PARAM {
                continue;
            }
            let Some(record) = state.record(submission.target, name) else {
                if submission.allows_unrecorded(name) {
                    continue;
                }
                return Err(StateError::Tamper(format!(
                    "parameter '{}' is not part of the page",
                    name
                )));
            };
            if record.editable || !state.confidential {
                continue;
            }
            for value in values {
                let issued = value
                    .parse::<ValueId>()
                    .ok()
                    .is_some_and(|id| record.value_by_id(&id).is_some());
                if !issued {
                    return Err(StateError::Tamper(format!(
                        "parameter '{}' carries a value id this page never issued",
                        name
                    )));
                }
            }
        }

        if let Some(missing) = state
            .records_for_target(submission.target)
            .find(|r| r.is_required() && !submission.params.contains_key(&r.name))
        {
            return Err(StateError::Tamper(format!(
                "parameter '{}' is missing",
                missing.name
            )));
        }
        Ok(())
    }
}

impl StateCodec for HashCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Hash
    }

    fn finalize_token(
        &self,
        state: &PageState,
        session: &SessionState,
    ) -> Result<Token, StateError> {
        let structure = StateEncoder::encode_structure(state);
        if structure.len() > self.allowed_length {
            return Err(StateError::StateTooLarge {
                length: structure.len(),
                allowed: self.allowed_length,
            });
        }

        let keys = session.keys(&self.keys);
        let session_id = session.id();
        let page_tag = keys.digest(
            crypto::PAGE_TAG_LABEL,
            &[session_id.as_bytes().as_slice(), state.page_id.as_bytes().as_slice()],
        )?;
        let structure_tag = keys.digest(
            crypto::STRUCTURE_TAG_LABEL,
            &[session_id.as_bytes().as_slice(), structure.as_slice()],
        )?;

        let mut payload =
            Vec::with_capacity(crypto::PAGE_TAG_LENGTH + crypto::STRUCTURE_TAG_LENGTH);
        payload.extend_from_slice(&page_tag[..crypto::PAGE_TAG_LENGTH]);
        payload.extend_from_slice(&structure_tag);

        session.history().put(state.clone());
        debug!(page_id = %state.page_id, "Stored page state with digest");
        Ok(format_token(&state.page_id, Some(&payload)))
    }

    fn open_token(
        &self,
        token: &Token,
        submission: &Submission<'_>,
    ) -> Result<Arc<PageState>, StateError> {
        let session = submission.session;
        let tampered = || StateError::Tamper("token digest mismatch".to_string());

        let parts = parse_token(token).ok_or_else(tampered)?;
        let payload = parts
            .payload
            .and_then(decode_payload)
            .filter(|p| p.len() == crypto::PAGE_TAG_LENGTH + crypto::STRUCTURE_TAG_LENGTH)
            .ok_or_else(tampered)?;
        let (page_tag, structure_tag) = payload.split_at(crypto::PAGE_TAG_LENGTH);

        let keys = session.keys(&self.keys);
        let session_id = session.id();
        if !keys.verify_digest(
            crypto::PAGE_TAG_LABEL,
            &[session_id.as_bytes().as_slice(), parts.page_id.as_bytes().as_slice()],
            page_tag,
        ) {
            return Err(tampered());
        }

        // authentic reference from here on; a miss means eviction, not forgery
        let state = session
            .history()
            .get(&parts.page_id)
            .ok_or_else(|| StateError::UnknownPage(parts.page_id.to_string()))?;

        let structure = StateEncoder::encode_structure(&state);
        if !keys.verify_digest(
            crypto::STRUCTURE_TAG_LABEL,
            &[session_id.as_bytes().as_slice(), structure.as_slice()],
            structure_tag,
        ) {
            return Err(tampered());
        }

        Self::check_claimed_structure(&state, submission)?;
        Ok(state)
    }
}
