// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use crate::policy::category::Category;
use crate::policy::config::RuleSetConfig;
use crate::policy::decision::{Decision, DecisionSource, MatchedRule};
use crate::policy::domain::extract_domain;
use crate::policy::heuristics;
use crate::policy::rule::{CompiledRule, Rule};
use crate::policy::window::PolicyWindow;

pub const DEFAULT_REASON: &str = "No matching restrictions";
pub const WINDOW_REASON: &str = "Time-based policy window";

/// Evaluation inputs besides the URL and the rules
#[derive(Debug, Clone)]
pub struct ClassifyContext {
    /// Evaluation instant; its offset defines the local time-of-day
    pub now: DateTime<FixedOffset>,
    /// Overrides the domain derived from the URL when non-empty
    pub domain_hint: Option<String>,
}

impl ClassifyContext {
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            now,
            domain_hint: None,
        }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::at(now.fixed_offset())
    }

    pub fn with_domain_hint(mut self, hint: impl Into<String>) -> Self {
        self.domain_hint = Some(hint.into());
        self
    }

    fn domain_for(&self, url: &str) -> String {
        match self.domain_hint.as_deref().map(str::trim) {
            Some(hint) if !hint.is_empty() => hint.to_lowercase(),
            _ => extract_domain(url),
        }
    }
}

/// Deterministic URL classifier over a fixed, ordered rule set.
///
/// Rules are evaluated in the order they were supplied and the first match
/// wins. Inactive rules are dropped at construction; regex rules that fail to
/// compile are logged once here and never match.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    rules: Vec<CompiledRule>,
    window: PolicyWindow,
}

impl DecisionEngine {
    /// Build an engine from rules in their stable store order
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| r.active)
            .map(|rule| {
                let (compiled, error) = CompiledRule::compile(rule);
                if let Some(e) = error {
                    warn!(
                        rule_id = %compiled.rule().id,
                        pattern = %compiled.rule().pattern,
                        error = %e,
                        "invalid regex rule will never match"
                    );
                }
                compiled
            })
            .collect();

        Self {
            rules,
            window: PolicyWindow::default(),
        }
    }

    /// Build an engine from a parsed rule-set file
    pub fn from_config(config: RuleSetConfig) -> Self {
        Self::new(config.rules)
    }

    /// Replace the policy window
    pub fn with_window(mut self, window: PolicyWindow) -> Self {
        self.window = window;
        self
    }

    /// Number of active rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Active rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(CompiledRule::rule)
    }

    /// Ids of regex rules whose pattern failed to compile
    pub fn invalid_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| !r.is_valid())
            .map(|r| r.rule().id.as_str())
            .collect()
    }

    /// First rule matching the URL, in evaluation order
    pub fn first_match(&self, url: &str, domain: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.check(url, domain).is_match())
            .map(CompiledRule::rule)
    }

    /// Classify a URL. Never fails: malformed URLs and broken rules degrade
    /// to best-effort evaluation.
    pub fn classify(&self, url: &str, ctx: &ClassifyContext) -> Decision {
        let domain = ctx.domain_for(url);
        let evaluated_at = ctx.now.with_timezone(&Utc);

        let decision = |category, reason: String, matched_rule, source| Decision {
            category,
            reason,
            matched_rule,
            source,
            evaluated_at,
        };

        let matched = self.first_match(url, &domain);

        if let Some(rule) = matched {
            if rule.category != Category::A {
                debug!(rule_id = %rule.id, category = %rule.category, "rule matched");
                return decision(
                    rule.category,
                    rule_reason(rule),
                    Some(MatchedRule::from(rule)),
                    DecisionSource::Rule,
                );
            }
        }

        if self.window.contains(ctx.now.time()) && self.window.covers(&domain) {
            return decision(
                Category::B,
                WINDOW_REASON.to_string(),
                None,
                DecisionSource::PolicyWindow,
            );
        }

        // An explicit allow rule outranks keyword heuristics
        if let Some(rule) = matched {
            return decision(
                Category::A,
                rule_reason(rule),
                Some(MatchedRule::from(rule)),
                DecisionSource::Rule,
            );
        }

        match heuristics::classify(url, &domain) {
            Some(verdict) => decision(
                verdict.category,
                verdict.reason.to_string(),
                None,
                DecisionSource::Heuristic,
            ),
            None => decision(
                Category::A,
                DEFAULT_REASON.to_string(),
                None,
                DecisionSource::Default,
            ),
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn rule_reason(rule: &Rule) -> String {
    match rule.reason.as_deref() {
        Some(reason) if !reason.trim().is_empty() => reason.to_string(),
        _ => format!("Matched rule {}", rule.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::rule::MatchKind;
    use chrono::TimeZone;

    fn at_utc(hour: u32, minute: u32) -> ClassifyContext {
        ClassifyContext::utc(Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, 0).unwrap())
    }

    fn seed_rules() -> Vec<Rule> {
        vec![
            Rule::new("r1", "porn", MatchKind::Regex, Category::C).with_reason("adult content"),
            Rule::new("r2", "facebook.com", MatchKind::Domain, Category::B)
                .with_reason("social during hours"),
            Rule::new("r3", "http://bad.example.com/evil", MatchKind::Exact, Category::C)
                .with_reason("malware"),
        ]
    }

    #[test]
    fn test_regex_rule_blocks() {
        let engine = DecisionEngine::new(seed_rules());
        let decision = engine.classify("http://xx-porn-site.com/a", &at_utc(20, 0));
        assert_eq!(decision.category, Category::C);
        assert_eq!(decision.reason, "adult content");
        assert_eq!(decision.matched_rule.unwrap().id, "r1");
        assert_eq!(decision.source, DecisionSource::Rule);
    }

    #[test]
    fn test_domain_rule_overrides_window_at_any_time() {
        let engine = DecisionEngine::new(seed_rules());
        for hour in [3, 9, 12, 17, 23] {
            let decision = engine.classify("http://facebook.com/feed", &at_utc(hour, 0));
            assert_eq!(decision.category, Category::B);
            assert_eq!(decision.source, DecisionSource::Rule);
        }
    }

    #[test]
    fn test_domain_rule_matches_host_port_without_scheme() {
        let engine = DecisionEngine::new(vec![Rule::new(
            "fb",
            "facebook.com",
            MatchKind::Domain,
            Category::C,
        )]);
        for url in [
            "http://facebook.com:443/feed",
            "facebook.com:443/feed",
            "m.facebook.com:8080",
        ] {
            let decision = engine.classify(url, &at_utc(20, 0));
            assert_eq!(decision.category, Category::C, "{}", url);
            assert_eq!(decision.matched_pattern(), Some("facebook.com"));
        }
    }

    #[test]
    fn test_exact_rule_blocks() {
        let engine = DecisionEngine::new(seed_rules());
        let decision = engine.classify("HTTP://BAD.example.com/evil", &at_utc(10, 0));
        assert_eq!(decision.category, Category::C);
        assert_eq!(decision.matched_pattern(), Some("http://bad.example.com/evil"));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let engine = DecisionEngine::new(vec![
            Rule::new("first", "example.com", MatchKind::Domain, Category::B),
            Rule::new("second", "example", MatchKind::Regex, Category::C),
        ]);
        let decision = engine.classify("https://www.example.com/", &at_utc(20, 0));
        assert_eq!(decision.category, Category::B);
        assert_eq!(decision.matched_rule.unwrap().id, "first");
    }

    #[test]
    fn test_inactive_rules_are_ignored() {
        let engine = DecisionEngine::new(vec![
            Rule::new("off", "example.com", MatchKind::Domain, Category::C).inactive(),
        ]);
        assert_eq!(engine.rule_count(), 0);
        let decision = engine.classify("https://example.com/", &at_utc(20, 0));
        assert_eq!(decision.category, Category::A);
        assert_eq!(decision.source, DecisionSource::Default);
    }

    #[test]
    fn test_window_applies_to_social_media() {
        let engine = DecisionEngine::default();

        let inside = engine.classify("https://www.instagram.com/p/1", &at_utc(9, 0));
        assert_eq!(inside.category, Category::B);
        assert_eq!(inside.reason, WINDOW_REASON);
        assert_eq!(inside.source, DecisionSource::PolicyWindow);

        let outside = engine.classify("https://www.instagram.com/p/1", &at_utc(17, 1));
        assert_eq!(outside.category, Category::A);
        assert_eq!(outside.source, DecisionSource::Heuristic);
    }

    #[test]
    fn test_window_uses_local_time_of_context() {
        let engine = DecisionEngine::default();
        // 07:30 UTC is 10:30 at UTC+3
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2026, 3, 10, 7, 30, 0)
            .unwrap()
            .with_timezone(&offset);
        let decision = engine.classify("https://tiktok.com/", &ClassifyContext::at(now));
        assert_eq!(decision.category, Category::B);
    }

    #[test]
    fn test_allow_rule_does_not_bypass_window() {
        let engine = DecisionEngine::new(vec![Rule::new(
            "allow-fb",
            "facebook.com",
            MatchKind::Domain,
            Category::A,
        )]);
        let inside = engine.classify("https://facebook.com/", &at_utc(10, 0));
        assert_eq!(inside.category, Category::B);

        let outside = engine.classify("https://facebook.com/", &at_utc(22, 0));
        assert_eq!(outside.category, Category::A);
        assert_eq!(outside.matched_rule.unwrap().id, "allow-fb");
        assert_eq!(outside.reason, "Matched rule allow-fb");
    }

    #[test]
    fn test_allow_rule_outranks_heuristics() {
        let engine = DecisionEngine::new(vec![Rule::new(
            "allow-games",
            "minecraft.net",
            MatchKind::Domain,
            Category::A,
        )]);
        let decision = engine.classify("https://www.minecraft.net/", &at_utc(20, 0));
        assert_eq!(decision.category, Category::A);
        assert_eq!(decision.source, DecisionSource::Rule);
    }

    #[test]
    fn test_heuristic_fallbacks() {
        let engine = DecisionEngine::default();
        let ctx = at_utc(20, 0);

        assert_eq!(
            engine.classify("http://hentai.example.com", &ctx).category,
            Category::C
        );
        assert_eq!(
            engine.classify("https://www.roblox.com/", &ctx).category,
            Category::B
        );

        let edu = engine.classify("http://scholar.example.edu", &ctx);
        assert_eq!(edu.category, Category::A);
        assert_eq!(edu.source, DecisionSource::Heuristic);

        let plain = engine.classify("https://example.org/", &ctx);
        assert_eq!(plain.category, Category::A);
        assert_eq!(plain.reason, DEFAULT_REASON);
        assert!(plain.matched_rule.is_none());
    }

    #[test]
    fn test_invalid_regex_is_reported_and_skipped() {
        let engine = DecisionEngine::new(vec![
            Rule::new("broken", "(porn", MatchKind::Regex, Category::C),
            Rule::new("ok", "example.com", MatchKind::Domain, Category::B),
        ]);
        assert_eq!(engine.invalid_rules(), vec!["broken"]);

        let decision = engine.classify("https://example.com/(porn", &at_utc(20, 0));
        assert_eq!(decision.matched_rule.unwrap().id, "ok");
    }

    #[test]
    fn test_domain_hint_overrides_url_host() {
        let engine = DecisionEngine::new(vec![Rule::new(
            "r1",
            "blocked.example",
            MatchKind::Domain,
            Category::C,
        )]);
        let ctx = at_utc(20, 0).with_domain_hint("CDN.Blocked.Example");
        let decision = engine.classify("https://203.0.113.7/asset.js", &ctx);
        assert_eq!(decision.category, Category::C);
    }

    #[test]
    fn test_malformed_url_never_fails() {
        let engine = DecisionEngine::new(seed_rules());
        let decision = engine.classify("::::not a url::::", &at_utc(10, 0));
        assert_eq!(decision.category, Category::A);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let engine = DecisionEngine::new(seed_rules());
        let ctx = at_utc(11, 15);
        let first = engine.classify("https://www.facebook.com/x", &ctx);
        let second = engine.classify("https://www.facebook.com/x", &ctx);
        assert_eq!(first, second);
        assert_eq!(first.evaluated_at, ctx.now.with_timezone(&Utc));
    }
}
