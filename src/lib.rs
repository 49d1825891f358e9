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

//! formseal: tamper-evident state for editable web request parameters.
//!
//! While a page renders, every protected parameter and value is recorded by a
//! [`composer::DataComposer`]. At the end of rendering the record is turned into
//! an opaque token by the configured [`codec::StrategyCodec`]. When the page is
//! submitted back, the [`validator::Validator`] opens the token and checks every
//! submitted parameter against what the page offered.

pub mod codec;
pub mod composer;
pub mod config;
pub mod engine_core;
pub mod guard;
pub mod store;
pub mod utils;
pub mod validator;

pub use codec::StrategyCodec;
pub use composer::{ComposedValue, ComposerFactory, DataComposer};
pub use config::{Config, KeyScope, Strategy};
pub use engine_core::errors::StateError;
pub use engine_core::models::{PageId, PageState, ParameterRecord, SubmittedParams, Token, ValueId};
pub use engine_core::session::SessionState;
pub use validator::{ValidationReport, Validator, Verdict};
