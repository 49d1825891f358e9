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

use crate::engine_core::constants::{config as keys, defaults};
use crate::engine_core::crypto::KeyRing;
use crate::engine_core::errors::StateError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// How page state travels between render and submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Memory,
    Cipher,
    Hash,
}

impl FromStr for Strategy {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Strategy::Memory),
            "cipher" => Ok(Strategy::Cipher),
            "hash" => Ok(Strategy::Hash),
            other => Err(StateError::Configuration(format!(
                "Unknown state strategy '{}': expected memory, cipher or hash",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::Memory => "memory",
            Strategy::Cipher => "cipher",
            Strategy::Hash => "hash",
        })
    }
}

/// Lifetime of the sealing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    /// One key ring for the whole process, from config or generated at startup
    Process,
    /// Fresh keys per session; tokens die with the session
    Session,
}

impl FromStr for KeyScope {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "process" => Ok(KeyScope::Process),
            "session" => Ok(KeyScope::Session),
            other => Err(StateError::Configuration(format!(
                "Unknown key scope '{}': expected process or session",
                other
            ))),
        }
    }
}

/// What to do with a submitted parameter the page never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnexpectedPolicy {
    Reject,
    AllowWhitelisted,
}

impl FromStr for UnexpectedPolicy {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(UnexpectedPolicy::Reject),
            "allow_whitelisted" | "whitelist" => Ok(UnexpectedPolicy::AllowWhitelisted),
            other => Err(StateError::Configuration(format!(
                "Unknown unexpected-parameter policy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: Strategy,
    pub allowed_length: usize,
    pub history_capacity: usize,
    pub confidentiality: bool,
    pub key_scope: KeyScope,
    #[serde(skip_serializing)]
    pub cipher_key: Option<String>,
    #[serde(skip_serializing)]
    pub hash_key: Option<String>,
    pub unexpected_policy: UnexpectedPolicy,
    pub start_pages: Vec<String>,
    pub start_parameters: Vec<String>,
    pub error_page: String,
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(name: &str, s: &str) -> Result<bool, StateError> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(StateError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            name, s
        ))),
    }
}

fn parse_usize(name: &str, s: &str) -> Result<usize, StateError> {
    s.trim().parse::<usize>().map_err(|e| {
        StateError::Configuration(format!("{} must be a positive integer: {}", name, e))
    })
}

impl Config {
    /// Load from `FORMSEAL_CONFIG_PATH` (if set) and apply env overrides on top.
    pub fn from_env() -> Result<Self, StateError> {
        let mut config = match env::var(keys::ENV_CONFIG_PATH) {
            Ok(path) => Self::from_yaml_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(v) = env::var(keys::ENV_STRATEGY) {
            config.strategy = v.parse()?;
        }
        if let Ok(v) = env::var(keys::ENV_ALLOWED_LENGTH) {
            config.allowed_length = parse_usize(keys::ENV_ALLOWED_LENGTH, &v)?;
        }
        if let Ok(v) = env::var(keys::ENV_HISTORY_CAPACITY) {
            config.history_capacity = parse_usize(keys::ENV_HISTORY_CAPACITY, &v)?;
        }
        if let Ok(v) = env::var(keys::ENV_CONFIDENTIALITY) {
            config.confidentiality = parse_bool(keys::ENV_CONFIDENTIALITY, &v)?;
        }
        if let Ok(v) = env::var(keys::ENV_KEY_SCOPE) {
            config.key_scope = v.parse()?;
        }
        if let Ok(v) = env::var(keys::ENV_CIPHER_KEY) {
            config.cipher_key = Some(v);
        }
        if let Ok(v) = env::var(keys::ENV_HASH_KEY) {
            config.hash_key = Some(v);
        }
        if let Ok(v) = env::var(keys::ENV_UNEXPECTED_POLICY) {
            config.unexpected_policy = v.parse()?;
        }
        if let Ok(v) = env::var(keys::ENV_START_PAGES) {
            config.start_pages = parse_list(&v);
        }
        if let Ok(v) = env::var(keys::ENV_START_PARAMETERS) {
            config.start_parameters = parse_list(&v);
        }
        if let Ok(v) = env::var(keys::ENV_ERROR_PAGE) {
            config.error_page = v;
        }
        if let Ok(v) = env::var(keys::ENV_LOG_LEVEL) {
            config.log_level = v;
        }
        if let Ok(v) = env::var(keys::ENV_LOG_FORMAT) {
            config.log_format = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StateError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, StateError> {
        let config: Config = serde_yaml_ng::from_str(raw)
            .map_err(|e| StateError::Configuration(format!("Invalid YAML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings that would only surface at request time.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.allowed_length == 0 {
            return Err(StateError::Configuration(
                "allowed_length must be greater than zero".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(StateError::Configuration(
                "history_capacity must be greater than zero".to_string(),
            ));
        }
        if !self.error_page.starts_with('/') {
            return Err(StateError::Configuration(format!(
                "error_page must be an absolute path, got '{}'",
                self.error_page
            )));
        }
        if self.key_scope == KeyScope::Session
            && (self.cipher_key.is_some() || self.hash_key.is_some())
        {
            return Err(StateError::Configuration(
                "explicit keys require key_scope = process".to_string(),
            ));
        }
        self.key_ring()?;
        Ok(())
    }

    /// Process-wide key ring built from configured keys (missing keys are generated).
    pub fn key_ring(&self) -> Result<KeyRing, StateError> {
        Ok(KeyRing::from_hex(
            self.cipher_key.as_deref(),
            self.hash_key.as_deref(),
        )?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::Memory,
            allowed_length: defaults::ALLOWED_LENGTH,
            history_capacity: defaults::HISTORY_CAPACITY,
            confidentiality: true,
            key_scope: KeyScope::Process,
            cipher_key: None,
            hash_key: None,
            unexpected_policy: UnexpectedPolicy::Reject,
            start_pages: Vec::new(),
            start_parameters: Vec::new(),
            error_page: defaults::ERROR_PAGE.to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}
