#![no_main]

use alpha_policy_engine::policy::{
    Category, ClassifyContext, DecisionEngine, MatchKind, Rule,
};
use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    pattern: String,
    kind: u8,
    category: u8,
    active: bool,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    url: String,
    domain_hint: Option<String>,
    seconds_of_day: u32,
    rules: Vec<FuzzRule>,
}

fuzz_target!(|input: FuzzInput| {
    let rules = input.rules.into_iter().enumerate().map(|(i, r)| {
        let kind = match r.kind % 3 {
            0 => MatchKind::Exact,
            1 => MatchKind::Domain,
            _ => MatchKind::Regex,
        };
        let category = match r.category % 3 {
            0 => Category::A,
            1 => Category::B,
            _ => Category::C,
        };
        let rule = Rule::new(format!("r{}", i), r.pattern, kind, category);
        if r.active {
            rule
        } else {
            rule.inactive()
        }
    });
    let engine = DecisionEngine::new(rules);

    let midnight = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let now = midnight + chrono::Duration::seconds(i64::from(input.seconds_of_day % 86_400));
    let mut ctx = ClassifyContext::utc(now);
    if let Some(hint) = input.domain_hint {
        ctx = ctx.with_domain_hint(hint);
    }

    // Classification must never panic and must be deterministic
    let first = engine.classify(&input.url, &ctx);
    let second = engine.classify(&input.url, &ctx);
    assert_eq!(first, second);
});
