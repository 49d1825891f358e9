use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formseal::codec::StateEncoder;
use formseal::engine_core::session::RequestContext;
use formseal::{
    ComposerFactory, Config, KeyScope, PageState, SessionState, Strategy, SubmittedParams, Token,
    Validator,
};
use std::sync::Arc;

/// A select with 20 options plus 10 hidden fields, finalized with `strategy`.
fn render_page(
    factory: &ComposerFactory,
    session: &Arc<SessionState>,
) -> (Token, SubmittedParams) {
    let mut composer = factory.new_instance(Arc::clone(session));
    composer.begin_page().unwrap();
    let mut submitted = SubmittedParams::new();
    for i in 0..20 {
        let shown = composer
            .compose_parameter("/bench", "option", &format!("choice-{}", i), false)
            .unwrap();
        if i == 7 {
            submitted.insert("option".into(), vec![shown.to_string()]);
        }
    }
    for i in 0..10 {
        let name = format!("hidden_{}", i);
        let shown = composer
            .compose_parameter("/bench", &name, &format!("value-{}", i), false)
            .unwrap();
        submitted.insert(name, vec![shown.to_string()]);
    }
    (composer.end_page().unwrap(), submitted)
}

fn bench_encoder(c: &mut Criterion) {
    let factory = ComposerFactory::from_config(&Config::default()).unwrap();
    let session = Arc::new(SessionState::new(5, KeyScope::Process));
    let (token, _) = render_page(&factory, &session);
    let page_id = token.as_str().split('.').nth(1).unwrap().parse().unwrap();
    let state: Arc<PageState> = session.history().get(&page_id).unwrap();
    let bytes = StateEncoder::encode(&state);

    c.bench_function("encode_page_30_params", |b| {
        b.iter(|| StateEncoder::encode(black_box(&state)))
    });
    c.bench_function("decode_page_30_params", |b| {
        b.iter(|| StateEncoder::decode(black_box(&bytes)))
    });
}

fn bench_strategies(c: &mut Criterion) {
    for strategy in [Strategy::Memory, Strategy::Cipher, Strategy::Hash] {
        let config = Config {
            strategy,
            allowed_length: 1 << 16,
            ..Config::default()
        };
        let factory = ComposerFactory::from_config(&config).unwrap();
        let validator = Validator::from_config(&config, factory.shared_codec());
        let session = Arc::new(SessionState::new(config.history_capacity, KeyScope::Process));

        c.bench_function(&format!("compose_finalize_{}", strategy), |b| {
            b.iter(|| render_page(black_box(&factory), &session))
        });

        let (token, submitted) = render_page(&factory, &session);
        let ctx = RequestContext::new(Arc::clone(&session), "/bench");
        c.bench_function(&format!("validate_{}", strategy), |b| {
            b.iter(|| validator.validate(&ctx, black_box(token.as_str()), &submitted))
        });
    }
}

criterion_group!(benches, bench_encoder, bench_strategies);
criterion_main!(benches);
