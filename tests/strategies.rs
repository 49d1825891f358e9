// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

use formseal::composer::ComposedValue;
use formseal::config::UnexpectedPolicy;
use formseal::engine_core::audit::CollectingSink;
use formseal::engine_core::session::RequestContext;
use formseal::validator::TamperKind;
use formseal::{
    ComposerFactory, Config, KeyScope, SessionState, StateError, Strategy, SubmittedParams,
    Validator, Verdict,
};
use std::sync::Arc;

struct Harness {
    factory: ComposerFactory,
    validator: Validator,
    sink: Arc<CollectingSink>,
    session: Arc<SessionState>,
}

fn harness(strategy: Strategy, confidentiality: bool, capacity: usize) -> Harness {
    let config = Config {
        strategy,
        confidentiality,
        history_capacity: capacity,
        ..Config::default()
    };
    let factory = ComposerFactory::from_config(&config).unwrap();
    let sink = Arc::new(CollectingSink::new());
    let validator = Validator::from_config(&config, factory.shared_codec()).with_sink(sink.clone());
    Harness {
        factory,
        validator,
        sink,
        session: Arc::new(SessionState::new(capacity, KeyScope::Process)),
    }
}

fn submit(pairs: &[(&str, &str)]) -> SubmittedParams {
    let mut params = SubmittedParams::new();
    for (k, v) in pairs {
        params.entry(k.to_string()).or_default().push(v.to_string());
    }
    params
}

const ALL: [Strategy; 3] = [Strategy::Memory, Strategy::Cipher, Strategy::Hash];

#[test]
fn test_order_form_round_trip_every_strategy() {
    for strategy in ALL {
        let h = harness(strategy, true, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        let product = c.compose_parameter("/checkout", "product", "sku-991", false).unwrap();
        let express = c.compose_parameter("/checkout", "shipping", "express", false).unwrap();
        c.compose_parameter("/checkout", "shipping", "standard", false).unwrap();
        let note = c.compose_parameter("/checkout", "note", "", true).unwrap();
        let token = c.end_page().unwrap();

        assert!(matches!(product, ComposedValue::Id(_)), "{strategy}");
        assert_eq!(note, ComposedValue::Value(String::new()));
        assert!(!token.as_str().contains("sku-991"), "{strategy}");

        let ctx = RequestContext::new(h.session.clone(), "/checkout");
        let (product, express) = (product.to_string(), express.to_string());
        let submitted = submit(&[
            ("product", product.as_str()),
            ("shipping", express.as_str()),
            ("note", "leave at the door"),
        ]);
        let report = h.validator.validate(&ctx, token.as_str(), &submitted).unwrap();
        assert!(report.is_accepted(), "{strategy}: {:?}", report.failures());

        let resolved = report.into_resolved().unwrap();
        assert_eq!(resolved["product"], vec!["sku-991".to_string()]);
        assert_eq!(resolved["shipping"], vec!["express".to_string()]);
        assert_eq!(resolved["note"], vec!["leave at the door".to_string()]);
        assert!(h.sink.records().is_empty());
    }
}

#[test]
fn test_editable_semantics_plain_mode() {
    for strategy in ALL {
        let h = harness(strategy, false, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/f", "free", "A", true).unwrap();
        c.compose_parameter("/f", "pick", "A", false).unwrap();
        c.compose_parameter("/f", "pick", "B", false).unwrap();
        let token = c.end_page().unwrap();
        let ctx = RequestContext::new(h.session.clone(), "/f");

        let r = h
            .validator
            .validate(&ctx, token.as_str(), &submit(&[("free", "ZZZ"), ("pick", "A")]))
            .unwrap();
        assert!(r.is_accepted(), "{strategy}");

        let r = h
            .validator
            .validate(&ctx, token.as_str(), &submit(&[("pick", "C")]))
            .unwrap();
        assert_eq!(
            r.verdict("pick"),
            Some(Verdict::TamperDetected(TamperKind::ValueMismatch)),
            "{strategy}"
        );
        assert_eq!(h.sink.records().len(), 1);
    }
}

#[test]
fn test_confidential_forged_id() {
    // memory and cipher report it per parameter
    for strategy in [Strategy::Memory, Strategy::Cipher] {
        let h = harness(strategy, true, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/f", "pick", "A", false).unwrap();
        let token = c.end_page().unwrap();
        let ctx = RequestContext::new(h.session.clone(), "/f");

        let r = h
            .validator
            .validate(&ctx, token.as_str(), &submit(&[("pick", "0011223344556677")]))
            .unwrap();
        assert_eq!(
            r.verdict("pick"),
            Some(Verdict::TamperDetected(TamperKind::UnknownValueId))
        );
    }

    // hash catches it while opening the token
    let h = harness(Strategy::Hash, true, 5);
    let mut c = h.factory.new_instance(h.session.clone());
    c.begin_page().unwrap();
    c.compose_parameter("/f", "pick", "A", false).unwrap();
    let token = c.end_page().unwrap();
    let ctx = RequestContext::new(h.session.clone(), "/f");
    let err = h
        .validator
        .validate(&ctx, token.as_str(), &submit(&[("pick", "0011223344556677")]))
        .unwrap_err();
    assert!(matches!(err, StateError::Tamper(_)));
    assert_eq!(h.sink.records()[0].kind, "TAMPER");
}

#[test]
fn test_eviction_of_oldest_page() {
    for strategy in [Strategy::Memory, Strategy::Hash] {
        let h = harness(strategy, true, 2);
        let mut tokens = Vec::new();
        for _ in 0..3 {
            let mut c = h.factory.new_instance(h.session.clone());
            c.begin_page().unwrap();
            tokens.push(c.end_page().unwrap());
        }
        let ctx = RequestContext::new(h.session.clone(), "/");
        let empty = SubmittedParams::new();

        assert!(matches!(
            h.validator.validate(&ctx, tokens[0].as_str(), &empty),
            Err(StateError::UnknownPage(_))
        ));
        for token in &tokens[1..] {
            assert!(h.validator.validate(&ctx, token.as_str(), &empty).unwrap().is_accepted());
        }
    }
}

#[test]
fn test_cipher_survives_eviction() {
    // nothing is stored server side, so history capacity does not apply
    let h = harness(Strategy::Cipher, true, 1);
    let mut tokens = Vec::new();
    for _ in 0..3 {
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        tokens.push(c.end_page().unwrap());
    }
    let ctx = RequestContext::new(h.session.clone(), "/");
    assert!(h
        .validator
        .validate(&ctx, tokens[0].as_str(), &SubmittedParams::new())
        .is_ok());
}

#[test]
fn test_token_bound_to_session() {
    for strategy in ALL {
        let h = harness(strategy, true, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        let token = c.end_page().unwrap();

        let stranger = Arc::new(SessionState::new(5, KeyScope::Process));
        let ctx = RequestContext::new(stranger, "/");
        let err = h
            .validator
            .validate(&ctx, token.as_str(), &SubmittedParams::new())
            .unwrap_err();
        assert!(err.is_rejection(), "{strategy}");
    }
}

#[test]
fn test_replay_is_allowed() {
    let h = harness(Strategy::Hash, false, 5);
    let mut c = h.factory.new_instance(h.session.clone());
    c.begin_page().unwrap();
    c.compose_parameter("/f", "id", "1", false).unwrap();
    let token = c.end_page().unwrap();
    let ctx = RequestContext::new(h.session.clone(), "/f");
    for _ in 0..3 {
        let r = h
            .validator
            .validate(&ctx, token.as_str(), &submit(&[("id", "1")]))
            .unwrap();
        assert!(r.is_accepted());
    }
}

#[test]
fn test_unexpected_parameters_under_both_policies() {
    let config = Config {
        unexpected_policy: UnexpectedPolicy::AllowWhitelisted,
        start_parameters: vec!["utm_*".into()],
        ..Config::default()
    };
    let factory = ComposerFactory::from_config(&config).unwrap();
    let validator = Validator::from_config(&config, factory.shared_codec())
        .with_sink(Arc::new(CollectingSink::new()));
    let session = Arc::new(SessionState::new(5, KeyScope::Process));
    let mut c = factory.new_instance(session.clone());
    c.begin_page().unwrap();
    let token = c.end_page().unwrap();
    let ctx = RequestContext::new(session, "/landing");

    let r = validator
        .validate(&ctx, token.as_str(), &submit(&[("utm_campaign", "x")]))
        .unwrap();
    assert!(r.is_accepted());

    let r = validator
        .validate(&ctx, token.as_str(), &submit(&[("admin", "1")]))
        .unwrap();
    assert_eq!(r.verdict("admin"), Some(Verdict::UnexpectedParameter));
}

fn rejected(result: Result<formseal::validator::ValidationReport, StateError>) -> bool {
    match result {
        Ok(report) => !report.is_accepted(),
        Err(e) => e.is_rejection(),
    }
}

#[test]
fn test_dropped_hidden_field_every_strategy() {
    for strategy in ALL {
        let h = harness(strategy, false, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/pay", "amount", "100", false).unwrap();
        c.compose_parameter("/pay", "note", "", true).unwrap();
        let token = c.end_page().unwrap();
        let ctx = RequestContext::new(h.session.clone(), "/pay");

        let result = h.validator.validate(&ctx, token.as_str(), &submit(&[("note", "hi")]));
        if strategy == Strategy::Hash {
            assert!(matches!(result, Err(StateError::Tamper(_))));
        } else {
            let report = result.unwrap();
            assert_eq!(
                report.verdict("amount"),
                Some(Verdict::TamperDetected(TamperKind::Multiplicity)),
                "{strategy}"
            );
        }
        assert_eq!(h.sink.records().len(), 1, "{strategy}");

        let full = submit(&[("amount", "100"), ("note", "hi")]);
        let report = h.validator.validate(&ctx, token.as_str(), &full).unwrap();
        assert!(report.is_accepted(), "{strategy}");
    }
}

#[test]
fn test_single_choice_takes_one_value() {
    for strategy in ALL {
        let h = harness(strategy, true, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        let basic = c.compose_parameter("/plan", "plan", "basic", false).unwrap();
        let premium = c.compose_parameter("/plan", "plan", "premium", false).unwrap();
        let wrap = c.compose_multi_value("/plan", "extras", "gift-wrap", false).unwrap();
        let insure = c.compose_multi_value("/plan", "extras", "insurance", false).unwrap();
        let token = c.end_page().unwrap();
        let ctx = RequestContext::new(h.session.clone(), "/plan");

        let (basic, premium) = (basic.to_string(), premium.to_string());
        let (wrap, insure) = (wrap.to_string(), insure.to_string());
        let both_plans = submit(&[("plan", basic.as_str()), ("plan", premium.as_str())]);
        let report = h.validator.validate(&ctx, token.as_str(), &both_plans).unwrap();
        assert_eq!(
            report.verdict("plan"),
            Some(Verdict::TamperDetected(TamperKind::Multiplicity)),
            "{strategy}"
        );

        let both_extras = submit(&[
            ("plan", premium.as_str()),
            ("extras", wrap.as_str()),
            ("extras", insure.as_str()),
        ]);
        let report = h.validator.validate(&ctx, token.as_str(), &both_extras).unwrap();
        assert!(report.is_accepted(), "{strategy}: {:?}", report.failures());
        let resolved = report.into_resolved().unwrap();
        assert_eq!(resolved["extras"], vec!["gift-wrap", "insurance"]);
    }
}

#[test]
fn test_whitelisted_parameter_on_other_target_every_strategy() {
    for strategy in ALL {
        let config = Config {
            strategy,
            unexpected_policy: UnexpectedPolicy::AllowWhitelisted,
            start_parameters: vec!["page".into()],
            ..Config::default()
        };
        let factory = ComposerFactory::from_config(&config).unwrap();
        let validator = Validator::from_config(&config, factory.shared_codec())
            .with_sink(Arc::new(CollectingSink::new()));
        let session = Arc::new(SessionState::new(5, KeyScope::Process));
        let mut c = factory.new_instance(session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/a", "page", "1", false).unwrap();
        let token = c.end_page().unwrap();

        // "page" is fixed for "/a" only; on "/b" it is an ordinary whitelisted extra
        let ctx = RequestContext::new(session, "/b");
        let report = validator
            .validate(&ctx, token.as_str(), &submit(&[("page", "7")]))
            .unwrap();
        assert!(report.is_accepted(), "{strategy}");
    }
}

#[test]
fn test_added_parameter_and_edited_value_plain_mode() {
    for strategy in ALL {
        let h = harness(strategy, false, 5);
        let mut c = h.factory.new_instance(h.session.clone());
        c.begin_page().unwrap();
        c.compose_parameter("/f", "id", "1", false).unwrap();
        let token = c.end_page().unwrap();
        let ctx = RequestContext::new(h.session.clone(), "/f");

        let forged = submit(&[("admin", "1"), ("id", "999")]);
        let result = h.validator.validate(&ctx, token.as_str(), &forged);
        if strategy == Strategy::Hash {
            assert!(matches!(result, Err(StateError::Tamper(_))));
        } else {
            assert!(rejected(result), "{strategy}");
        }

        let edited = submit(&[("id", "999")]);
        let report = h.validator.validate(&ctx, token.as_str(), &edited).unwrap();
        assert_eq!(
            report.verdict("id"),
            Some(Verdict::TamperDetected(TamperKind::ValueMismatch)),
            "{strategy}"
        );
    }
}
