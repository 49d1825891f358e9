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

//! Request validation against recorded page state.
//!
//! The validator opens the submitted token, then gives every submitted
//! parameter, and every fixed field the request left out, a verdict. A single
//! failed verdict rejects the request; the report still carries every verdict
//! so the attack log can say exactly which parameters were touched.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::codec::{StateCodec, StrategyCodec, Submission};
use crate::config::{Config, UnexpectedPolicy};
use crate::engine_core::audit::{AttackLogger, TamperRecord, TamperSink};
use crate::engine_core::constants::token as token_consts;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{
    PageId, ParameterRecord, SubmittedParams, Token, TokenLifecycle, ValueId,
};
use crate::engine_core::session::RequestContext;
use crate::engine_core::taint::{Untrusted, Verified};
use crate::utils::patterns::PatternWhitelist;

/// Host-side list of parameters that may appear without being rendered.
pub trait ParameterWhitelist: Send + Sync {
    fn is_whitelisted(&self, target: &str, parameter: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TamperKind {
    /// Value not among the recorded ones
    ValueMismatch,
    /// Confidential mode, but the submitted text is not an id issued for this parameter
    UnknownValueId,
    /// Wrong number of values, or the same value twice
    Multiplicity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accepted,
    UnexpectedParameter,
    TamperDetected(TamperKind),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Label used in attack records.
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Accepted => "ACCEPTED",
            Verdict::UnexpectedParameter => "UNEXPECTED_PARAMETER",
            Verdict::TamperDetected(TamperKind::ValueMismatch) => "VALUE_MISMATCH",
            Verdict::TamperDetected(TamperKind::UnknownValueId) => "UNKNOWN_VALUE_ID",
            Verdict::TamperDetected(TamperKind::Multiplicity) => "MULTIPLICITY",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    page_id: PageId,
    verdicts: BTreeMap<String, Verdict>,
    #[serde(skip)]
    resolved: SubmittedParams,
}

impl ValidationReport {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn verdicts(&self) -> &BTreeMap<String, Verdict> {
        &self.verdicts
    }

    pub fn verdict(&self, parameter: &str) -> Option<Verdict> {
        self.verdicts.get(parameter).copied()
    }

    pub fn is_accepted(&self) -> bool {
        self.verdicts.values().all(Verdict::is_accepted)
    }

    pub fn failures(&self) -> Vec<(&str, Verdict)> {
        self.verdicts
            .iter()
            .filter(|(_, v)| !v.is_accepted())
            .map(|(name, v)| (name.as_str(), *v))
            .collect()
    }

    pub fn lifecycle(&self) -> TokenLifecycle {
        if self.is_accepted() {
            TokenLifecycle::Validated
        } else {
            TokenLifecycle::Tampered
        }
    }

    /// Submitted parameters with value ids swapped for the real values.
    /// Only available when the whole request was accepted.
    pub fn resolved(&self) -> Option<Verified<SubmittedParams>> {
        self.is_accepted()
            .then(|| Verified::new_unchecked(self.resolved.clone()))
    }

    pub fn into_resolved(self) -> Option<Verified<SubmittedParams>> {
        if self.is_accepted() {
            Some(Verified::new_unchecked(self.resolved))
        } else {
            None
        }
    }
}

pub struct Validator {
    codec: Arc<StrategyCodec>,
    policy: UnexpectedPolicy,
    whitelist: Box<dyn ParameterWhitelist>,
    sink: Arc<dyn TamperSink>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("strategy", &self.codec.strategy())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Reject unexpected parameters and log attacks through `AttackLogger`.
    pub fn new(codec: Arc<StrategyCodec>) -> Self {
        Self {
            codec,
            policy: UnexpectedPolicy::Reject,
            whitelist: Box::new(PatternWhitelist::default()),
            sink: Arc::new(AttackLogger::default()),
        }
    }

    /// Policy and whitelist (`start_parameters`) from config.
    pub fn from_config(config: &Config, codec: Arc<StrategyCodec>) -> Self {
        Self::new(codec)
            .with_policy(config.unexpected_policy)
            .with_whitelist(Box::new(PatternWhitelist::new(
                config.start_parameters.iter().cloned(),
            )))
    }

    pub fn with_policy(mut self, policy: UnexpectedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_whitelist(mut self, whitelist: Box<dyn ParameterWhitelist>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TamperSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn codec(&self) -> &StrategyCodec {
        &self.codec
    }

    pub fn sink(&self) -> &Arc<dyn TamperSink> {
        &self.sink
    }

    /// Validate one request.
    ///
    /// Token-level failures come back as `Err`; per-parameter findings are in
    /// the report. Both are handed to the tamper sink.
    pub fn validate(
        &self,
        ctx: &RequestContext,
        token: &str,
        submitted: &SubmittedParams,
    ) -> Result<ValidationReport, StateError> {
        let submitted = Untrusted::new(submitted);
        let token = Token::new(token);

        let mut submission = Submission::from_context(ctx, submitted.inner());
        if self.policy == UnexpectedPolicy::AllowWhitelisted {
            submission = submission.with_extras(self.whitelist.as_ref());
        }

        let state = match self.codec.open_token(&token, &submission) {
            Ok(state) => state,
            Err(e) => {
                if e.is_rejection() {
                    warn!(
                        target_path = %ctx.target,
                        session = %ctx.session.id(),
                        kind = e.kind(),
                        error = %e,
                        "State token rejected"
                    );
                    let record = TamperRecord::new(
                        e.kind(),
                        &ctx.target,
                        token_consts::STATE_PARAM,
                        token.as_str(),
                    );
                    self.sink.record(&record, &ctx.client);
                }
                return Err(e);
            }
        };

        let mut verdicts = BTreeMap::new();
        let mut resolved = SubmittedParams::new();

        for (name, values) in submitted.into_inner() {
            if name == token_consts::STATE_PARAM {
                continue;
            }
            let verdict = match state.record(&ctx.target, name) {
                None => {
                    if self.policy == UnexpectedPolicy::AllowWhitelisted
                        && self.whitelist.is_whitelisted(&ctx.target, name)
                    {
                        resolved.insert(name.clone(), values.clone());
                        Verdict::Accepted
                    } else {
                        Verdict::UnexpectedParameter
                    }
                }
                Some(record) if record.editable => {
                    resolved.insert(name.clone(), values.clone());
                    Verdict::Accepted
                }
                Some(record) => match check_values(record, values, state.confidential) {
                    Ok(real) => {
                        resolved.insert(name.clone(), real);
                        Verdict::Accepted
                    }
                    Err(kind) => Verdict::TamperDetected(kind),
                },
            };

            if !verdict.is_accepted() {
                self.sink.record(
                    &TamperRecord::new(verdict.kind(), &ctx.target, name, values.join(",")),
                    &ctx.client,
                );
            }
            verdicts.insert(name.clone(), verdict);
        }

        // a fixed single-value field the client dropped
        for record in state.records_for_target(&ctx.target) {
            if record.is_required() && !verdicts.contains_key(&record.name) {
                let verdict = Verdict::TamperDetected(TamperKind::Multiplicity);
                self.sink.record(
                    &TamperRecord::new(verdict.kind(), &ctx.target, &record.name, ""),
                    &ctx.client,
                );
                verdicts.insert(record.name.clone(), verdict);
            }
        }

        let report = ValidationReport {
            page_id: state.page_id,
            verdicts,
            resolved,
        };
        if report.is_accepted() {
            debug!(page_id = %report.page_id, params = report.verdicts.len(), "Request validated");
        } else {
            warn!(
                page_id = %report.page_id,
                target_path = %ctx.target,
                failures = report.failures().len(),
                "Request failed validation"
            );
        }
        Ok(report)
    }
}

/// Check the values of a non-editable parameter and map them to real values.
fn check_values(
    record: &ParameterRecord,
    values: &[String],
    confidential: bool,
) -> Result<Vec<String>, TamperKind> {
    let count_ok = if record.expects_single_value() {
        values.len() == 1
    } else {
        values.len() <= record.values.len()
    };
    if !count_ok {
        return Err(TamperKind::Multiplicity);
    }

    let mut real = Vec::with_capacity(values.len());
    let mut seen = HashSet::with_capacity(values.len());
    for submitted in values {
        let value = if confidential {
            submitted
                .parse::<ValueId>()
                .ok()
                .and_then(|id| record.value_by_id(&id))
                .ok_or(TamperKind::UnknownValueId)?
        } else if record.contains_value(submitted) {
            submitted.as_str()
        } else {
            return Err(TamperKind::ValueMismatch);
        };
        if !seen.insert(value) {
            return Err(TamperKind::Multiplicity);
        }
        real.push(value.to_string());
    }
    Ok(real)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::memory::MemoryCodec;
    use crate::composer::{ComposedValue, ComposerFactory};
    use crate::config::KeyScope;
    use crate::engine_core::audit::CollectingSink;
    use crate::engine_core::session::SessionState;

    struct Fixture {
        factory: ComposerFactory,
        validator: Validator,
        sink: Arc<CollectingSink>,
        ctx: RequestContext,
    }

    fn fixture(confidential: bool) -> Fixture {
        let codec = Arc::new(StrategyCodec::Memory(MemoryCodec::new()));
        let sink = Arc::new(CollectingSink::new());
        let session = Arc::new(SessionState::new(5, KeyScope::Process));
        Fixture {
            factory: ComposerFactory::with_shared_codec(Arc::clone(&codec), confidential),
            validator: Validator::new(codec).with_sink(sink.clone()),
            sink,
            ctx: RequestContext::new(session, "/order"),
        }
    }

    fn params(pairs: &[(&str, &[&str])]) -> SubmittedParams {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_editable_accepts_anything() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/order", "note", "A", true).unwrap();
        let token = c.end_page().unwrap();

        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("note", &["ZZZ"])]))
            .unwrap();
        assert!(report.is_accepted());
        assert_eq!(report.lifecycle(), TokenLifecycle::Validated);
        assert_eq!(report.resolved().unwrap()["note"], vec!["ZZZ".to_string()]);
    }

    #[test]
    fn test_fixed_value_must_be_recorded() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/order", "size", "A", false).unwrap();
        c.compose_parameter("/order", "size", "B", false).unwrap();
        let token = c.end_page().unwrap();

        let ok = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("size", &["A"])]))
            .unwrap();
        assert!(ok.is_accepted());

        let bad = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("size", &["C"])]))
            .unwrap();
        assert_eq!(
            bad.verdict("size"),
            Some(Verdict::TamperDetected(TamperKind::ValueMismatch))
        );
        assert!(bad.resolved().is_none());
        assert_eq!(bad.lifecycle(), TokenLifecycle::Tampered);

        let records = f.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parameter, "size");
        assert_eq!(records[0].value, "C");
        assert_eq!(records[0].kind, "VALUE_MISMATCH");
    }

    #[test]
    fn test_multiplicity() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/order", "id", "7", false).unwrap();
        for v in ["x", "y"] {
            c.compose_multi_value("/order", "tags", v, false).unwrap();
        }
        for v in ["basic", "premium"] {
            c.compose_parameter("/order", "plan", v, false).unwrap();
        }
        let token = c.end_page().unwrap();

        let check = |p: SubmittedParams, name: &str| {
            f.validator
                .validate(&f.ctx, token.as_str(), &p)
                .unwrap()
                .verdict(name)
                .unwrap()
        };
        let multiplicity = Verdict::TamperDetected(TamperKind::Multiplicity);
        assert_eq!(check(params(&[("id", &["7", "7"])]), "id"), multiplicity);
        assert_eq!(check(params(&[("id", &[])]), "id"), multiplicity);
        assert_eq!(check(params(&[("tags", &["x", "y"])]), "tags"), Verdict::Accepted);
        assert_eq!(check(params(&[("tags", &[])]), "tags"), Verdict::Accepted);
        assert_eq!(check(params(&[("tags", &["x", "x"])]), "tags"), multiplicity);
        assert_eq!(check(params(&[("plan", &["basic"])]), "plan"), Verdict::Accepted);
        assert_eq!(check(params(&[("plan", &["basic", "premium"])]), "plan"), multiplicity);
        assert_eq!(check(params(&[("plan", &[])]), "plan"), multiplicity);
    }

    #[test]
    fn test_dropped_hidden_field() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/order", "amount", "100", false).unwrap();
        c.compose_parameter("/order", "note", "", true).unwrap();
        for v in ["basic", "premium"] {
            c.compose_parameter("/order", "plan", v, false).unwrap();
        }
        c.compose_parameter("/other", "ref", "9", false).unwrap();
        let token = c.end_page().unwrap();

        // the unchosen radio group and the other target's field are not required
        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("note", &["hi"])]))
            .unwrap();
        assert!(!report.is_accepted());
        assert_eq!(
            report.failures(),
            vec![("amount", Verdict::TamperDetected(TamperKind::Multiplicity))]
        );

        let records = f.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parameter, "amount");
        assert_eq!(records[0].kind, "MULTIPLICITY");
    }

    #[test]
    fn test_confidential_ids_resolve() {
        let f = fixture(true);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        let id = c.compose_parameter("/order", "account", "DE-1234", false).unwrap();
        assert!(matches!(id, ComposedValue::Id(_)));
        let id_text = id.to_string();
        let token = c.end_page().unwrap();

        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("account", &[id_text.as_str()])]))
            .unwrap();
        let resolved = report.into_resolved().unwrap();
        assert_eq!(resolved["account"], vec!["DE-1234".to_string()]);

        // the real value itself is not an acceptable submission
        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("account", &["DE-1234"])]))
            .unwrap();
        assert_eq!(
            report.verdict("account"),
            Some(Verdict::TamperDetected(TamperKind::UnknownValueId))
        );
    }

    #[test]
    fn test_unexpected_parameter_policy() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        let token = c.end_page().unwrap();
        let submitted = params(&[("utm_source", &["mail"]), (token_consts::STATE_PARAM, &["x"])]);

        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &submitted)
            .unwrap();
        assert_eq!(report.verdict("utm_source"), Some(Verdict::UnexpectedParameter));
        assert_eq!(report.verdict(token_consts::STATE_PARAM), None);

        let lenient = Validator::new(Arc::new(StrategyCodec::Memory(MemoryCodec::new())))
            .with_policy(UnexpectedPolicy::AllowWhitelisted)
            .with_whitelist(Box::new(PatternWhitelist::new(["utm_*"])))
            .with_sink(f.sink.clone());
        let report = lenient.validate(&f.ctx, token.as_str(), &submitted).unwrap();
        assert!(report.is_accepted());
    }

    #[test]
    fn test_parameter_of_other_target_is_unexpected() {
        let f = fixture(false);
        let mut c = f.factory.new_instance(f.ctx.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/admin", "role", "user", false).unwrap();
        let token = c.end_page().unwrap();

        let report = f
            .validator
            .validate(&f.ctx, token.as_str(), &params(&[("role", &["user"])]))
            .unwrap();
        assert_eq!(report.verdict("role"), Some(Verdict::UnexpectedParameter));
    }

    #[test]
    fn test_token_error_reaches_sink() {
        let f = fixture(false);
        let err = f
            .validator
            .validate(&f.ctx, "1.00000000000000000000000000000000", &SubmittedParams::new())
            .unwrap_err();
        assert!(matches!(err, StateError::UnknownPage(_)));
        let records = f.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "UNKNOWN_PAGE");
        assert_eq!(records[0].parameter, token_consts::STATE_PARAM);
    }
}
