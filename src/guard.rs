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

//! Request Guard.
//!
//! Drives one request through the whole lifecycle: validate the incoming
//! state, let the host render the response while recording its parameters,
//! finalize the new token. Hosts that only need one half can use
//! [`Validator`] or [`ComposerFactory`] directly.

use std::sync::Arc;
use tracing::{info, warn};

use crate::codec::memory::MemoryCodec;
use crate::codec::StrategyCodec;
use crate::composer::{ComposerFactory, DataComposer};
use crate::config::Config;
use crate::engine_core::audit::TamperRecord;
use crate::engine_core::constants::token as token_consts;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{SubmittedParams, Token};
use crate::engine_core::session::RequestContext;
use crate::engine_core::taint::Verified;
use crate::utils::patterns::PatternWhitelist;
use crate::validator::Validator;

#[derive(Debug)]
pub enum GuardOutcome<T> {
    /// Request was legal and the response rendered
    Proceed {
        output: T,
        token: Token,
        resolved: Verified<SubmittedParams>,
    },
    /// Request must not reach the application
    Reject { redirect: String, reason: StateError },
}

impl<T> GuardOutcome<T> {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardOutcome::Proceed { .. })
    }
}

#[derive(Debug)]
pub struct RequestGuard {
    factory: ComposerFactory,
    validator: Validator,
    start_pages: PatternWhitelist,
    error_page: String,
}

impl RequestGuard {
    pub fn new(
        factory: ComposerFactory,
        validator: Validator,
        start_pages: PatternWhitelist,
        error_page: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            validator,
            start_pages,
            error_page: error_page.into(),
        }
    }

    /// Composer and validator built around one shared codec.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        config.validate()?;
        let factory = ComposerFactory::from_config(config)?;
        let validator = Validator::from_config(config, factory.shared_codec());
        info!(
            strategy = %config.strategy,
            confidentiality = config.confidentiality,
            history_capacity = config.history_capacity,
            "Request guard ready"
        );
        Ok(Self::new(
            factory,
            validator,
            PatternWhitelist::new(config.start_pages.iter().cloned()),
            config.error_page.clone(),
        ))
    }

    pub fn factory(&self) -> &ComposerFactory {
        &self.factory
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn handle<T, F>(
        &self,
        ctx: &RequestContext,
        token: Option<&str>,
        submitted: &SubmittedParams,
        render: F,
    ) -> GuardOutcome<T>
    where
        F: FnOnce(&mut DataComposer) -> Result<T, StateError>,
    {
        let resolved = match self.check(ctx, token, submitted) {
            Ok(resolved) => resolved,
            Err(reason) => return self.reject(reason),
        };

        let mut composer = self.factory.new_instance(Arc::clone(&ctx.session));
        if let Err(e) = composer.begin_page() {
            return self.reject(e);
        }
        let output = match render(&mut composer) {
            Ok(output) => output,
            Err(e) => return self.reject(e),
        };

        let token = match composer.end_page() {
            Ok(token) => token,
            Err(StateError::StateTooLarge { length, allowed }) => {
                warn!(length, allowed, "Page state too large, falling back to memory");
                match composer.end_page_with(&StrategyCodec::Memory(MemoryCodec::new())) {
                    Ok(token) => token,
                    Err(e) => return self.reject(e),
                }
            }
            Err(e) => return self.reject(e),
        };

        GuardOutcome::Proceed {
            output,
            token,
            resolved,
        }
    }

    fn check(
        &self,
        ctx: &RequestContext,
        token: Option<&str>,
        submitted: &SubmittedParams,
    ) -> Result<Verified<SubmittedParams>, StateError> {
        let Some(token) = token else {
            if self.start_pages.matches(&ctx.target) {
                // entry points carry no state to check
                return Ok(Verified::new_unchecked(submitted.clone()));
            }
            self.validator.sink().record(
                &TamperRecord::new("MISSING_STATE", &ctx.target, token_consts::STATE_PARAM, ""),
                &ctx.client,
            );
            return Err(StateError::Tamper(format!(
                "missing {} parameter",
                token_consts::STATE_PARAM
            )));
        };

        let report = self.validator.validate(ctx, token, submitted)?;
        let failed: Vec<&str> = report.failures().iter().map(|(name, _)| *name).collect();
        if !failed.is_empty() {
            return Err(StateError::Tamper(format!(
                "parameters failed validation: {}",
                failed.join(", ")
            )));
        }
        report
            .into_resolved()
            .ok_or_else(|| StateError::Tamper("request not accepted".to_string()))
    }

    fn reject<T>(&self, reason: StateError) -> GuardOutcome<T> {
        GuardOutcome::Reject {
            redirect: self.error_page.clone(),
            reason,
        }
    }
}
