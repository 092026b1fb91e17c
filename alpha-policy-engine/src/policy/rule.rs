// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::policy::category::Category;

/// How a rule pattern is compared against a URL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Case-insensitive equality with the full URL
    Exact,
    /// Case-insensitive suffix of the URL's domain
    Domain,
    /// Case-insensitive regex search over the raw URL
    Regex,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Domain => "domain",
            MatchKind::Regex => "regex",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking directive as stored by administrators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub id: String,
    pub pattern: String,
    #[serde(rename = "match_type")]
    pub match_kind: MatchKind,
    pub category: Category,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        match_kind: MatchKind,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            match_kind,
            category,
            reason: None,
            active: true,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Result of testing a rule against a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Match,
    NoMatch,
}

impl MatchOutcome {
    pub fn is_match(self) -> bool {
        self == MatchOutcome::Match
    }
}

impl From<bool> for MatchOutcome {
    fn from(matched: bool) -> Self {
        if matched {
            MatchOutcome::Match
        } else {
            MatchOutcome::NoMatch
        }
    }
}

/// Compiled matcher for a rule
#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Domain(String),
    Regex(Regex),
    /// Regex pattern that failed to compile
    Invalid,
}

/// A rule ready for evaluation
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    matcher: Matcher,
}

impl CompiledRule {
    /// Compile a rule. A regex that fails to compile yields a rule that never
    /// matches; the error is returned alongside so the caller can log it once.
    pub fn compile(rule: Rule) -> (Self, Option<regex::Error>) {
        let (matcher, error) = match rule.match_kind {
            MatchKind::Exact => (Matcher::Exact(rule.pattern.to_lowercase()), None),
            MatchKind::Domain => (Matcher::Domain(rule.pattern.trim().to_lowercase()), None),
            MatchKind::Regex => match RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(re) => (Matcher::Regex(re), None),
                Err(e) => (Matcher::Invalid, Some(e)),
            },
        };

        (Self { rule, matcher }, error)
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.matcher, Matcher::Invalid)
    }

    /// Test the rule against a URL and its derived (lowercase) domain
    pub fn check(&self, url: &str, domain: &str) -> MatchOutcome {
        let matched = match &self.matcher {
            Matcher::Exact(pattern) => url.to_lowercase() == *pattern,
            Matcher::Domain(pattern) => domain.ends_with(pattern.as_str()),
            Matcher::Regex(re) => re.is_match(url),
            Matcher::Invalid => false,
        };
        MatchOutcome::from(matched)
    }
}
