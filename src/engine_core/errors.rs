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

// Domain error types - classified per-request outcomes with no information disclosure

use thiserror::Error;

/// Main error type for composing and validating page state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Bytes could not be decoded into a PageState
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// Encoded state exceeds the configured limit at finalize time
    #[error("State too large: {length} bytes exceeds allowed {allowed}")]
    StateTooLarge { length: usize, allowed: usize },

    /// Page id not present in the session history (evicted, expired or forged)
    #[error("Unknown page: {0}")]
    UnknownPage(String),

    /// Integrity or consistency check failed
    #[error("Tamper detected: {0}")]
    Tamper(String),

    /// Composer used outside of an open page
    #[error("Composer closed: {0}")]
    ComposerClosed(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Cryptographic operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has the wrong shape
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Sealing primitive failed
    #[error("Failed to seal state")]
    SealError,
}

impl StateError {
    /// Get user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StateError::MalformedState(_) => "Invalid request state".to_string(),
            StateError::StateTooLarge { .. } => "Page state too large".to_string(),
            StateError::UnknownPage(_) => "Page expired, please reload".to_string(),
            StateError::Tamper(_) => "Invalid request".to_string(),
            StateError::ComposerClosed(_) => "Internal error".to_string(),
            StateError::Configuration(_) => "Internal error".to_string(),
            StateError::Crypto(_) => "Internal error".to_string(),
        }
    }

    /// True when the error must turn the current request into a rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StateError::MalformedState(_) | StateError::UnknownPage(_) | StateError::Tamper(_)
        )
    }

    /// Short kind label used in tamper records and attack logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StateError::MalformedState(_) => "MALFORMED_STATE",
            StateError::StateTooLarge { .. } => "STATE_TOO_LARGE",
            StateError::UnknownPage(_) => "UNKNOWN_PAGE",
            StateError::Tamper(_) => "TAMPER",
            StateError::ComposerClosed(_) => "COMPOSER_CLOSED",
            StateError::Configuration(_) => "CONFIGURATION",
            StateError::Crypto(_) => "CRYPTO",
        }
    }
}
