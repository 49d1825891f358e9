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

// Memory strategy - state stays in the session, the client only sees the page id

use std::sync::Arc;
use tracing::debug;

use crate::codec::traits::{StateCodec, Submission};
use crate::codec::{format_token, parse_token};
use crate::config::Strategy;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageState, Token};
use crate::engine_core::session::SessionState;

#[derive(Debug, Clone, Default)]
pub struct MemoryCodec;

impl MemoryCodec {
    pub fn new() -> Self {
        Self
    }
}

impl StateCodec for MemoryCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Memory
    }

    fn finalize_token(
        &self,
        state: &PageState,
        session: &SessionState,
    ) -> Result<Token, StateError> {
        session.history().put(state.clone());
        debug!(page_id = %state.page_id, entries = state.entries.len(), "Stored page state");
        Ok(format_token(&state.page_id, None))
    }

    fn open_token(
        &self,
        token: &Token,
        submission: &Submission<'_>,
    ) -> Result<Arc<PageState>, StateError> {
        // a bare reference carries nothing to tamper with; anything unreadable is just unknown
        let parts = parse_token(token)
            .filter(|p| p.payload.is_none())
            .ok_or_else(|| StateError::UnknownPage(token.to_string()))?;

        submission
            .session
            .history()
            .get(&parts.page_id)
            .ok_or_else(|| StateError::UnknownPage(parts.page_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyScope;
    use crate::engine_core::ids::IdGenerator;

    #[test]
    fn test_token_is_only_a_reference() {
        let session = SessionState::new(3, KeyScope::Process);
        let codec = MemoryCodec::new();
        let state = PageState::new(IdGenerator::new().next_page_id(), 1, 0, false);

        let token = codec.finalize_token(&state, &session).unwrap();
        assert_eq!(token.as_str(), format!("1.{}", state.page_id));

        let opened = codec
            .open_token(&token, &Submission::token_only(&session))
            .unwrap();
        assert_eq!(*opened, state);
    }

    #[test]
    fn test_unknown_page() {
        let session = SessionState::new(3, KeyScope::Process);
        let codec = MemoryCodec::new();
        let forged = Token::new(format!("1.{}", IdGenerator::new().next_page_id()));
        assert!(matches!(
            codec.open_token(&forged, &Submission::token_only(&session)),
            Err(StateError::UnknownPage(_))
        ));
        assert!(matches!(
            codec.open_token(&Token::new("junk"), &Submission::token_only(&session)),
            Err(StateError::UnknownPage(_))
        ));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let a = SessionState::new(3, KeyScope::Process);
        let b = SessionState::new(3, KeyScope::Process);
        let codec = MemoryCodec::new();
        let state = PageState::new(IdGenerator::new().next_page_id(), 1, 0, false);
        let token = codec.finalize_token(&state, &a).unwrap();
        assert!(codec.open_token(&token, &Submission::token_only(&b)).is_err());
    }
}
