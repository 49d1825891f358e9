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

//! Tamper records and the attack log.
//!
//! The validator hands every rejected parameter or token to a `TamperSink`.
//! `AttackLogger` is the default sink: one `tracing` event per record on the
//! `attack` target, carrying both structured fields and the classic line
//! `kind;target;parameter;value;userLocalIP;remoteIP;userId`.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::engine_core::constants::audit;
use crate::engine_core::session::ClientInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TamperRecord {
    pub kind: String,
    pub target: String,
    pub parameter: String,
    pub value: String,
}

impl TamperRecord {
    pub fn new(
        kind: impl Into<String>,
        target: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            target: target.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

/// Receiver of tamper records; implemented by the host's alerting layer.
pub trait TamperSink: Send + Sync {
    fn record(&self, record: &TamperRecord, client: &ClientInfo);
}

/// Resolves the application user behind a request.
pub trait UserData: Send + Sync {
    fn username(&self, client: &ClientInfo) -> Option<String>;
}

/// Uses the user name the host already placed in `ClientInfo`.
#[derive(Debug, Default)]
pub struct ClientUser;

impl UserData for ClientUser {
    fn username(&self, client: &ClientInfo) -> Option<String> {
        client.user.clone()
    }
}

pub struct AttackLogger {
    user_data: Box<dyn UserData>,
}

impl Default for AttackLogger {
    fn default() -> Self {
        Self::new(Box::new(ClientUser))
    }
}

impl AttackLogger {
    pub fn new(user_data: Box<dyn UserData>) -> Self {
        Self { user_data }
    }

    /// Address of the user, preferring the proxy-forwarded one.
    fn user_local_ip(client: &ClientInfo) -> &str {
        client
            .forwarded_for
            .as_deref()
            .or(client.remote_addr.as_deref())
            .unwrap_or(audit::UNKNOWN)
    }

    pub fn format(&self, record: &TamperRecord, client: &ClientInfo) -> String {
        let user = self
            .user_data
            .username(client)
            .unwrap_or_else(|| audit::UNKNOWN.to_string());
        let fields = [
            record.kind.as_str(),
            record.target.as_str(),
            record.parameter.as_str(),
            record.value.as_str(),
            Self::user_local_ip(client),
            client.remote_addr.as_deref().unwrap_or(audit::UNKNOWN),
            user.as_str(),
        ];
        fields.join(&audit::FIELD_SEPARATOR.to_string())
    }
}

impl TamperSink for AttackLogger {
    fn record(&self, record: &TamperRecord, client: &ClientInfo) {
        let line = self.format(record, client);
        info!(
            target: "attack",
            kind = %record.kind,
            request_target = %record.target,
            parameter = %record.parameter,
            value = %record.value,
            "{}",
            line
        );
    }
}

/// Keeps records in memory; handy for hosts that batch alerts and for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<TamperRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TamperRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TamperSink for CollectingSink {
    fn record(&self, record: &TamperRecord, _client: &ClientInfo) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}
