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

//! formseal constants - Single source of truth for wire formats and defaults.
//!
//! This module centralizes all magic numbers, token separators and
//! configuration keys so the codecs and the config layer cannot drift apart.

/// Token wire format
pub mod token {
    /// Token format version, first segment of every token
    pub const VERSION: &str = "1";
    /// Segment separator
    pub const SEPARATOR: char = '.';
    /// Name of the request parameter that carries the token
    pub const STATE_PARAM: &str = "_FORMSEAL_STATE_";
}

/// Canonical state encoding
pub mod encoding {
    /// Leading magic bytes of an encoded PageState
    pub const MAGIC: &[u8; 2] = b"FS";
    /// Encoding format version
    pub const FORMAT_VERSION: u8 = 1;
    /// Raw length of a value identifier
    pub const VALUE_ID_LENGTH: usize = 8;
    /// Raw length of a page identifier
    pub const PAGE_ID_LENGTH: usize = 16;
}

/// Cryptographic constants
pub mod crypto {
    /// AES-256-GCM key length in bytes
    pub const CIPHER_KEY_LENGTH: usize = 32;
    /// HMAC-SHA256 key length in bytes
    pub const MAC_KEY_LENGTH: usize = 32;
    /// AES-GCM nonce length in bytes
    pub const NONCE_LENGTH: usize = 12;
    /// AES-GCM authentication tag length in bytes
    pub const AEAD_TAG_LENGTH: usize = 16;
    /// Truncated page tag carried by hash tokens
    pub const PAGE_TAG_LENGTH: usize = 16;
    /// Full HMAC-SHA256 output carried as the structure tag
    pub const STRUCTURE_TAG_LENGTH: usize = 32;
    /// Domain separation labels for the hash strategy
    pub const PAGE_TAG_LABEL: &[u8] = b"formseal/page";
    pub const STRUCTURE_TAG_LABEL: &[u8] = b"formseal/structure";
}

/// Defaults applied when configuration leaves a value unset
pub mod defaults {
    /// Maximum encoded state length accepted by cipher and hash strategies
    pub const ALLOWED_LENGTH: usize = 4000;
    /// Pages kept per session before the oldest is evicted
    pub const HISTORY_CAPACITY: usize = 5;
    /// Relative path the host redirects to on rejection
    pub const ERROR_PAGE: &str = "/formseal-error";
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_CONFIG_PATH: &str = "FORMSEAL_CONFIG_PATH";
    pub const ENV_STRATEGY: &str = "FORMSEAL_STRATEGY";
    pub const ENV_ALLOWED_LENGTH: &str = "FORMSEAL_ALLOWED_LENGTH";
    pub const ENV_HISTORY_CAPACITY: &str = "FORMSEAL_HISTORY_CAPACITY";
    pub const ENV_CONFIDENTIALITY: &str = "FORMSEAL_CONFIDENTIALITY";
    pub const ENV_KEY_SCOPE: &str = "FORMSEAL_KEY_SCOPE";
    pub const ENV_CIPHER_KEY: &str = "FORMSEAL_CIPHER_KEY";
    pub const ENV_HASH_KEY: &str = "FORMSEAL_HASH_KEY";
    pub const ENV_UNEXPECTED_POLICY: &str = "FORMSEAL_UNEXPECTED_POLICY";
    pub const ENV_START_PAGES: &str = "FORMSEAL_START_PAGES";
    pub const ENV_START_PARAMETERS: &str = "FORMSEAL_START_PARAMETERS";
    pub const ENV_ERROR_PAGE: &str = "FORMSEAL_ERROR_PAGE";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Attack log
pub mod audit {
    /// Field separator of the formatted attack line
    pub const FIELD_SEPARATOR: char = ';';
    /// Header consulted for the client address behind a proxy
    pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";
    /// Placeholder when a field is unknown
    pub const UNKNOWN: &str = "-";
}
