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

//! Domain models for formseal.
//!
//! Pure data structures describing what a rendered page offered to the
//! client. Nothing in here performs I/O or cryptography.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::engine_core::constants::encoding;

/// Submitted request parameters: name -> values in submission order.
pub type SubmittedParams = BTreeMap<String, Vec<String>>;

/// Identifier text that is not in the canonical rendered form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

/// Newtype wrapper around Uuid for type-safe page identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(Uuid);

impl PageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn from_bytes(bytes: [u8; encoding::PAGE_ID_LENGTH]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; encoding::PAGE_ID_LENGTH] {
        self.0.as_bytes()
    }
}

impl FromStr for PageId {
    type Err = IdParseError;

    /// Accepts only the 32 char lowercase form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::try_parse(s)
            .map(PageId)
            .map_err(|e| IdParseError(e.to_string()))?;
        if id.to_string() != s {
            return Err(IdParseError("non-canonical page id".to_string()));
        }
        Ok(id)
    }
}

impl From<PageId> for String {
    fn from(id: PageId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PageId {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Opaque identifier rendered in place of a real value in confidentiality mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueId([u8; encoding::VALUE_ID_LENGTH]);

impl ValueId {
    pub fn from_bytes(bytes: [u8; encoding::VALUE_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; encoding::VALUE_ID_LENGTH] {
        &self.0
    }
}

impl FromStr for ValueId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; encoding::VALUE_ID_LENGTH];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| IdParseError(e.to_string()))?;
        let id = Self(bytes);
        if id.to_string() != s {
            return Err(IdParseError("non-canonical value id".to_string()));
        }
        Ok(id)
    }
}

impl From<ValueId> for String {
    fn from(id: ValueId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ValueId {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Newtype wrapper around Uuid identifying a web session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0.to_string()
    }
}

impl TryFrom<String> for SessionId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(&s).map(SessionId)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One value offered for a parameter, with the id that stands in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedValue {
    pub id: ValueId,
    pub value: String,
}

/// One protected parameter of one target.
///
/// `multiple` marks controls that may legitimately send back several of the
/// offered values at once (checkbox groups, multi-selects). Every other record
/// takes exactly one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub target: String,
    pub name: String,
    pub editable: bool,
    pub multiple: bool,
    pub values: Vec<RecordedValue>,
}

impl ParameterRecord {
    pub fn new(target: impl Into<String>, name: impl Into<String>, editable: bool) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
            editable,
            multiple: false,
            values: Vec::new(),
        }
    }

    pub fn multi_valued(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.value == value)
    }

    pub fn value_by_id(&self, id: &ValueId) -> Option<&str> {
        self.values
            .iter()
            .find(|v| &v.id == id)
            .map(|v| v.value.as_str())
    }

    pub fn id_for_value(&self, value: &str) -> Option<ValueId> {
        self.values.iter().find(|v| v.value == value).map(|v| v.id)
    }

    pub fn expects_single_value(&self) -> bool {
        !self.multiple
    }

    /// A fixed field with one offered value (a hidden input) must come back
    /// with every submit of its target.
    pub fn is_required(&self) -> bool {
        !self.editable && !self.multiple && self.values.len() == 1
    }
}

/// Everything protectable that one rendered page offered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub page_id: PageId,
    pub sequence: u64,
    pub created_at_ms: i64,
    pub confidential: bool,
    pub entries: Vec<ParameterRecord>,
}

impl PageState {
    pub fn new(page_id: PageId, sequence: u64, created_at_ms: i64, confidential: bool) -> Self {
        Self {
            page_id,
            sequence,
            created_at_ms,
            confidential,
            entries: Vec::new(),
        }
    }

    pub fn record(&self, target: &str, name: &str) -> Option<&ParameterRecord> {
        self.entries
            .iter()
            .find(|r| r.target == target && r.name == name)
    }

    pub(crate) fn record_mut(&mut self, target: &str, name: &str) -> Option<&mut ParameterRecord> {
        self.entries
            .iter_mut()
            .find(|r| r.target == target && r.name == name)
    }

    pub fn records_for_target<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = &'a ParameterRecord> + 'a {
        self.entries.iter().filter(move |r| r.target == target)
    }

    /// Resolve a value id anywhere in the page back to its real value.
    pub fn resolve(&self, id: &ValueId) -> Option<&str> {
        self.entries.iter().find_map(|r| r.value_by_id(id))
    }

    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|r| r.values.len()).sum()
    }
}

/// Client-visible opaque reference to a PageState.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle of a token: Rendering -> Finalized -> {Validated | Tampered | Expired}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TokenLifecycle {
    Rendering,
    Finalized,
    Validated,
    Tampered,
    Expired,
}
