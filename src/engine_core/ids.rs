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

//! Identifier generation.
//!
//! Page ids are random UUIDs and value ids are 64 random bits, both drawn
//! from the thread-local CSPRNG. Uniqueness comes from the size of the space,
//! so generation never retries and never fails.

use rand::RngCore;
use uuid::Uuid;

use crate::engine_core::constants::encoding;
use crate::engine_core::models::{PageId, ValueId};

#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_page_id(&self) -> PageId {
        PageId::new(Uuid::new_v4())
    }

    pub fn next_value_id(&self) -> ValueId {
        let mut bytes = [0u8; encoding::VALUE_ID_LENGTH];
        rand::rng().fill_bytes(&mut bytes);
        ValueId::from_bytes(bytes)
    }
}
