use alpha_policy_engine::policy::{ClassifyContext, DecisionEngine, RuleSetConfig};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const RULES: &str = r#"
version: "1.0"
rules:
  - id: "adult"
    pattern: "porn|xxx"
    match_type: "regex"
    category: "C"
  - id: "social"
    pattern: "facebook.com"
    match_type: "domain"
    category: "B"
  - id: "malware"
    pattern: "http://bad.example.com/evil"
    match_type: "exact"
    category: "C"
  - id: "tracker"
    pattern: "^https?://[a-z0-9.-]*tracker\\."
    match_type: "regex"
    category: "B"
"#;

fn context() -> ClassifyContext {
    ClassifyContext::utc(Utc.with_ymd_and_hms(2026, 5, 4, 11, 0, 0).unwrap())
}

fn bench_engine_creation(c: &mut Criterion) {
    let config = RuleSetConfig::from_yaml(RULES).unwrap();
    c.bench_function("engine_from_config", |b| {
        b.iter(|| DecisionEngine::from_config(black_box(config.clone())))
    });
}

fn bench_classify_rule_match(c: &mut Criterion) {
    let engine = DecisionEngine::from_config(RuleSetConfig::from_yaml(RULES).unwrap());
    let ctx = context();
    c.bench_function("classify_domain_rule", |b| {
        b.iter(|| engine.classify(black_box("https://www.facebook.com/feed"), &ctx))
    });
}

fn bench_classify_window(c: &mut Criterion) {
    let engine = DecisionEngine::from_config(RuleSetConfig::from_yaml(RULES).unwrap());
    let ctx = context();
    c.bench_function("classify_policy_window", |b| {
        b.iter(|| engine.classify(black_box("https://www.tiktok.com/@someone"), &ctx))
    });
}

fn bench_classify_default(c: &mut Criterion) {
    let engine = DecisionEngine::from_config(RuleSetConfig::from_yaml(RULES).unwrap());
    let ctx = context();
    c.bench_function("classify_default", |b| {
        b.iter(|| engine.classify(black_box("https://docs.example.org/guide/intro"), &ctx))
    });
}

criterion_group!(
    benches,
    bench_engine_creation,
    bench_classify_rule_match,
    bench_classify_window,
    bench_classify_default,
);
criterion_main!(benches);
