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

use std::sync::Arc;

use crate::codec::cipher::CipherCodec;
use crate::codec::hash::HashCodec;
use crate::codec::memory::MemoryCodec;
use crate::codec::traits::{StateCodec, Submission};
use crate::config::{Config, Strategy};
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageState, Token};
use crate::engine_core::session::SessionState;

/// Enum-based dispatch over the configured codec (zero-cost, no vtable).
#[derive(Debug, Clone)]
pub enum StrategyCodec {
    Memory(MemoryCodec),
    Cipher(CipherCodec),
    Hash(HashCodec),
}

impl StrategyCodec {
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        Ok(match config.strategy {
            Strategy::Memory => Self::Memory(MemoryCodec::new()),
            Strategy::Cipher => Self::Cipher(CipherCodec::new(
                config.key_ring()?,
                config.allowed_length,
            )),
            Strategy::Hash => Self::Hash(HashCodec::new(config.key_ring()?, config.allowed_length)),
        })
    }

    /// Resolve a strategy by name, the way deployment descriptors spell it.
    pub fn from_name(name: &str, config: &Config) -> Result<Self, StateError> {
        let strategy: Strategy = name.parse()?;
        Self::from_config(&Config {
            strategy,
            ..config.clone()
        })
    }
}

impl StateCodec for StrategyCodec {
    fn strategy(&self) -> Strategy {
        match self {
            Self::Memory(c) => c.strategy(),
            Self::Cipher(c) => c.strategy(),
            Self::Hash(c) => c.strategy(),
        }
    }

    fn finalize_token(
        &self,
        state: &PageState,
        session: &SessionState,
    ) -> Result<Token, StateError> {
        match self {
            Self::Memory(c) => c.finalize_token(state, session),
            Self::Cipher(c) => c.finalize_token(state, session),
            Self::Hash(c) => c.finalize_token(state, session),
        }
    }

    fn open_token(
        &self,
        token: &Token,
        submission: &Submission<'_>,
    ) -> Result<Arc<PageState>, StateError> {
        match self {
            Self::Memory(c) => c.open_token(token, submission),
            Self::Cipher(c) => c.open_token(token, submission),
            Self::Hash(c) => c.open_token(token, submission),
        }
    }
}
