use alpha_policy_engine::policy::{
    Category, ClassifyContext, DecisionEngine, DecisionSource, MatchKind, Rule, RuleSetConfig,
};
use chrono::{DateTime, TimeZone, Utc};

const SEED_RULES: &str = r#"
version: "1.0"
rules:
  - id: "adult"
    pattern: "porn"
    match_type: "regex"
    category: "C"
    reason: "adult content"
  - id: "social"
    pattern: "facebook.com"
    match_type: "domain"
    category: "B"
    reason: "social during hours"
  - id: "malware"
    pattern: "http://bad.example.com/evil"
    match_type: "exact"
    category: "C"
    reason: "malware"
"#;

fn engine() -> DecisionEngine {
    DecisionEngine::from_config(RuleSetConfig::from_yaml(SEED_RULES).unwrap())
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, hour, minute, 0).unwrap()
}

#[test]
fn test_regex_rule_scenario() {
    let decision = engine().classify("http://xx-porn-site.com/a", &ClassifyContext::utc(at(14, 0)));
    assert_eq!(decision.category, Category::C);
    assert!(decision.is_denied());
}

#[test]
fn test_domain_rule_matches_any_case_subdomain() {
    let decision = engine().classify("http://www.FACEBOOK.com/x", &ClassifyContext::utc(at(2, 0)));
    assert_eq!(decision.category, Category::B);
    assert_eq!(decision.matched_pattern(), Some("facebook.com"));
}

#[test]
fn test_explicit_rule_overrides_time_window() {
    let engine = engine();
    for hour in 0..24 {
        let decision = engine.classify("http://facebook.com/feed", &ClassifyContext::utc(at(hour, 30)));
        assert_eq!(decision.category, Category::B, "hour {}", hour);
        assert_eq!(decision.source, DecisionSource::Rule);
    }
}

#[test]
fn test_category_c_rule_wins_regardless_of_time_and_keywords() {
    let engine = DecisionEngine::new(vec![Rule::new(
        "block-uni",
        "university.example.edu",
        MatchKind::Domain,
        Category::C,
    )]);
    for hour in [0, 9, 13, 17, 23] {
        let decision = engine.classify(
            "https://scholar.university.example.edu/khanacademy",
            &ClassifyContext::utc(at(hour, 0)),
        );
        assert_eq!(decision.category, Category::C);
    }
}

#[test]
fn test_no_rule_education_scenario() {
    let decision = DecisionEngine::default()
        .classify("http://scholar.example.edu", &ClassifyContext::utc(at(10, 0)));
    assert_eq!(decision.category, Category::A);
    assert!(decision.matched_rule.is_none());
    assert!(decision.reason.to_lowercase().contains("heuristic"));
}

#[test]
fn test_default_category_is_a() {
    let decision = engine().classify("http://edu.example.com", &ClassifyContext::utc(at(10, 0)));
    assert_eq!(decision.category, Category::A);
    assert_eq!(decision.reason, "No matching restrictions");
}

#[test]
fn test_rule_order_is_stable_across_engines() {
    let rules = vec![
        Rule::new("b-first", "example", MatchKind::Regex, Category::B),
        Rule::new("c-second", "example.com", MatchKind::Domain, Category::C),
    ];
    let ctx = ClassifyContext::utc(at(20, 0));

    for _ in 0..10 {
        let decision = DecisionEngine::new(rules.clone()).classify("https://example.com/", &ctx);
        assert_eq!(decision.matched_rule.unwrap().id, "b-first");
    }

    let mut reversed = rules;
    reversed.reverse();
    let decision = DecisionEngine::new(reversed).classify("https://example.com/", &ctx);
    assert_eq!(decision.matched_rule.unwrap().id, "c-second");
}

#[test]
fn test_identical_inputs_yield_identical_decisions() {
    let engine = engine();
    let ctx = ClassifyContext::utc(at(16, 45));
    let urls = [
        "http://xx-porn-site.com/a",
        "https://www.instagram.com/",
        "https://www.roblox.com/",
        "not a url at all",
        "",
    ];
    for url in urls {
        assert_eq!(engine.classify(url, &ctx), engine.classify(url, &ctx));
    }
}
