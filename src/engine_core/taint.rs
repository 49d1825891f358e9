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

//! Type-System separation of client input.
//!
//! Request parameters arrive as `Untrusted` and only the validator can turn
//! them into `Verified` values, so handler code cannot accidentally consume
//! parameters that were never checked against the page state.

use serde::Serialize;

/// Data exactly as the client submitted it.
#[derive(Debug, Clone)]
pub struct Untrusted<T> {
    inner: T,
}

/// Data that passed validation against the recorded page state.
///
/// Serializable for handing on, but never deserializable: the only way in is
/// through the validator.
#[derive(Debug, Clone, Serialize)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Untrusted<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read access for inspection; does not bless the data.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Dangerous! Bypasses validation.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Verified<T> {
    /// Only the validator should construct verified data.
    pub(crate) fn new_unchecked(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> std::ops::Deref for Verified<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_core::models::SubmittedParams;

    #[test]
    fn test_verified_serializes_inner_value() {
        let mut params = SubmittedParams::new();
        params.insert("id".into(), vec!["42".into()]);
        let verified = Verified::new_unchecked(params);
        assert_eq!(verified["id"], vec!["42".to_string()]);
        assert_eq!(
            serde_json::to_value(&verified).unwrap(),
            serde_json::json!({ "inner": { "id": ["42"] } })
        );
    }

    #[test]
    fn test_untrusted_only_reads() {
        let raw = Untrusted::new(vec![1, 2]);
        assert_eq!(raw.inner().len(), 2);
        assert_eq!(raw.into_inner(), vec![1, 2]);
    }
}
