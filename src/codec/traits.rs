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

//! Strategy Codec Trait.
//!
//! Defines the contract every token strategy implements: turning a finished
//! PageState into a client-visible token, and turning a submitted token back
//! into the PageState it was issued for.

use std::sync::Arc;

use crate::config::Strategy;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageState, SubmittedParams, Token};
use crate::engine_core::session::{RequestContext, SessionState};
use crate::validator::ParameterWhitelist;

static NO_PARAMS: SubmittedParams = SubmittedParams::new();

/// The request a token came back with.
///
/// `extras` answers whether a parameter the page never rendered may still be
/// present; it is only set when the validator runs a whitelist policy.
#[derive(Clone, Copy)]
pub struct Submission<'a> {
    pub session: &'a SessionState,
    pub target: &'a str,
    pub params: &'a SubmittedParams,
    extras: Option<&'a dyn ParameterWhitelist>,
}

impl<'a> Submission<'a> {
    pub fn new(session: &'a SessionState, target: &'a str, params: &'a SubmittedParams) -> Self {
        Self {
            session,
            target,
            params,
            extras: None,
        }
    }

    pub fn from_context(ctx: &'a RequestContext, params: &'a SubmittedParams) -> Self {
        Self::new(&ctx.session, &ctx.target, params)
    }

    /// Token alone, for tooling that only wants the page state back.
    pub fn token_only(session: &'a SessionState) -> Self {
        Self::new(session, "", &NO_PARAMS)
    }

    pub fn with_extras(mut self, whitelist: &'a dyn ParameterWhitelist) -> Self {
        self.extras = Some(whitelist);
        self
    }

    /// Whether `name` may be submitted without a record for this target.
    pub fn allows_unrecorded(&self, name: &str) -> bool {
        self.extras
            .is_some_and(|w| w.is_whitelisted(self.target, name))
    }
}

impl std::fmt::Debug for Submission<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("session", &self.session.id())
            .field("target", &self.target)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

pub trait StateCodec: Send + Sync {
    /// Which strategy this codec implements
    fn strategy(&self) -> Strategy;

    /// Called exactly once when rendering of a page completes.
    fn finalize_token(&self, state: &PageState, session: &SessionState)
        -> Result<Token, StateError>;

    /// Called exactly once per incoming request validation.
    fn open_token(
        &self,
        token: &Token,
        submission: &Submission<'_>,
    ) -> Result<Arc<PageState>, StateError>;
}
