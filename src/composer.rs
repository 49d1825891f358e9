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

//! Data Composer.
//!
//! One `DataComposer` records one page while it renders. The factory is built
//! once at startup and hands out a composer per rendering pass, bound to the
//! session it renders for.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::codec::{StateCodec, StrategyCodec};
use crate::config::Config;
use crate::engine_core::errors::StateError;
use crate::engine_core::ids::IdGenerator;
use crate::engine_core::models::{
    PageId, PageState, ParameterRecord, RecordedValue, Token, TokenLifecycle, ValueId,
};
use crate::engine_core::session::SessionState;

/// What the renderer embeds in the markup for one composed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedValue {
    /// Opaque stand-in for the real value (confidentiality on)
    Id(ValueId),
    /// The real value, still registered for validation
    Value(String),
}

impl std::fmt::Display for ComposedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposedValue::Id(id) => write!(f, "{}", id),
            ComposedValue::Value(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposerFactory {
    codec: Arc<StrategyCodec>,
    confidentiality: bool,
    ids: IdGenerator,
}

impl ComposerFactory {
    pub fn new(codec: StrategyCodec, confidentiality: bool) -> Self {
        Self::with_shared_codec(Arc::new(codec), confidentiality)
    }

    /// Share one codec (and so one key ring) with the validator.
    pub fn with_shared_codec(codec: Arc<StrategyCodec>, confidentiality: bool) -> Self {
        Self {
            codec,
            confidentiality,
            ids: IdGenerator::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        Ok(Self::new(
            StrategyCodec::from_config(config)?,
            config.confidentiality,
        ))
    }

    pub fn codec(&self) -> &StrategyCodec {
        &self.codec
    }

    pub fn shared_codec(&self) -> Arc<StrategyCodec> {
        Arc::clone(&self.codec)
    }

    pub fn confidentiality(&self) -> bool {
        self.confidentiality
    }

    pub fn new_instance(&self, session: Arc<SessionState>) -> DataComposer {
        DataComposer {
            session,
            codec: Arc::clone(&self.codec),
            confidentiality: self.confidentiality,
            ids: self.ids,
            phase: Phase::Idle,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Rendering(PageState),
    Finalized(PageState),
}

/// Records the protected parameters of one page.
///
/// Not shareable between concurrent renderings: each in-flight page gets its
/// own instance from [`ComposerFactory::new_instance`].
#[derive(Debug)]
pub struct DataComposer {
    session: Arc<SessionState>,
    codec: Arc<StrategyCodec>,
    confidentiality: bool,
    ids: IdGenerator,
    phase: Phase,
}

impl DataComposer {
    /// Open a fresh PageState. A finalized composer may start another page.
    pub fn begin_page(&mut self) -> Result<PageId, StateError> {
        if matches!(self.phase, Phase::Rendering(_)) {
            return Err(StateError::ComposerClosed("a page is already being rendered"));
        }
        let state = PageState::new(
            self.ids.next_page_id(),
            self.session.next_sequence(),
            Utc::now().timestamp_millis(),
            self.confidentiality,
        );
        let page_id = state.page_id;
        debug!(%page_id, session = %self.session.id(), "Begin page");
        self.phase = Phase::Rendering(state);
        Ok(page_id)
    }

    /// Register one value of a single-choice parameter.
    ///
    /// Repeated calls for the same target and name build up the set of
    /// offered choices (a radio group or select), of which exactly one must
    /// come back. Editable values are always returned as-is since the client
    /// is expected to overwrite them.
    pub fn compose_parameter(
        &mut self,
        target: &str,
        name: &str,
        value: &str,
        editable: bool,
    ) -> Result<ComposedValue, StateError> {
        self.compose(target, name, value, editable, false)
    }

    /// Register one value of a control that may submit several of its values
    /// at once (checkbox group, multi-select).
    pub fn compose_multi_value(
        &mut self,
        target: &str,
        name: &str,
        value: &str,
        editable: bool,
    ) -> Result<ComposedValue, StateError> {
        self.compose(target, name, value, editable, true)
    }

    fn compose(
        &mut self,
        target: &str,
        name: &str,
        value: &str,
        editable: bool,
        multiple: bool,
    ) -> Result<ComposedValue, StateError> {
        let Phase::Rendering(state) = &mut self.phase else {
            return Err(StateError::ComposerClosed("compose_parameter outside of a page"));
        };

        let id = match state.record_mut(target, name) {
            Some(record) => {
                record.editable &= editable;
                record.multiple |= multiple;
                match record.id_for_value(value) {
                    Some(id) => id,
                    None => {
                        let id = self.ids.next_value_id();
                        record.values.push(RecordedValue {
                            id,
                            value: value.to_string(),
                        });
                        id
                    }
                }
            }
            None => {
                let id = self.ids.next_value_id();
                let mut record = ParameterRecord::new(target, name, editable);
                record.multiple = multiple;
                record.values.push(RecordedValue {
                    id,
                    value: value.to_string(),
                });
                state.entries.push(record);
                id
            }
        };

        if state.confidential && !editable {
            Ok(ComposedValue::Id(id))
        } else {
            Ok(ComposedValue::Value(value.to_string()))
        }
    }

    /// Finalize with the configured codec.
    pub fn end_page(&mut self) -> Result<Token, StateError> {
        let codec = Arc::clone(&self.codec);
        self.end_page_with(&codec)
    }

    /// Finalize with an explicit codec, e.g. a memory fallback after the
    /// configured one reported `StateTooLarge`. On any error the page stays
    /// open.
    pub fn end_page_with(&mut self, codec: &StrategyCodec) -> Result<Token, StateError> {
        let Phase::Rendering(state) = &self.phase else {
            return Err(StateError::ComposerClosed("end_page outside of a page"));
        };

        match codec.finalize_token(state, &self.session) {
            Ok(token) => {
                debug!(
                    page_id = %state.page_id,
                    strategy = %codec.strategy(),
                    values = state.value_count(),
                    "End page"
                );
                if let Phase::Rendering(state) = std::mem::replace(&mut self.phase, Phase::Idle) {
                    self.phase = Phase::Finalized(state);
                }
                Ok(token)
            }
            Err(e) => {
                warn!(
                    page_id = %state.page_id,
                    strategy = %codec.strategy(),
                    error = %e,
                    "Finalize failed"
                );
                Err(e)
            }
        }
    }

    pub fn page_id(&self) -> Option<PageId> {
        self.current().map(|s| s.page_id)
    }

    /// Real value behind an id issued for the current page.
    pub fn resolve(&self, id: &ValueId) -> Option<&str> {
        self.current().and_then(|s| s.resolve(id))
    }

    pub fn lifecycle(&self) -> Option<TokenLifecycle> {
        match self.phase {
            Phase::Idle => None,
            Phase::Rendering(_) => Some(TokenLifecycle::Rendering),
            Phase::Finalized(_) => Some(TokenLifecycle::Finalized),
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    fn current(&self) -> Option<&PageState> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Rendering(s) | Phase::Finalized(s) => Some(s),
        }
    }
}
