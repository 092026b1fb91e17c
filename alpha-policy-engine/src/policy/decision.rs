// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::category::Category;
use crate::policy::rule::{MatchKind, Rule};

/// Which stage of evaluation produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Rule,
    PolicyWindow,
    Heuristic,
    Default,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Rule => "rule",
            DecisionSource::PolicyWindow => "policy_window",
            DecisionSource::Heuristic => "heuristic",
            DecisionSource::Default => "default",
        }
    }
}

/// Reference to the rule that produced a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub id: String,
    pub pattern: String,
    #[serde(rename = "type")]
    pub match_kind: MatchKind,
}

impl From<&Rule> for MatchedRule {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            pattern: rule.pattern.clone(),
            match_kind: rule.match_kind,
        }
    }
}

/// Classification of one URL evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub category: Category,
    pub reason: String,
    pub matched_rule: Option<MatchedRule>,
    pub source: DecisionSource,
    pub evaluated_at: DateTime<Utc>,
}

impl Decision {
    /// Whether the agent must deny access
    pub fn is_denied(&self) -> bool {
        self.category.is_denied()
    }

    /// Whether an alert must be raised for this decision
    pub fn requires_alert(&self) -> bool {
        self.category.requires_alert()
    }

    pub fn matched_pattern(&self) -> Option<&str> {
        self.matched_rule.as_ref().map(|r| r.pattern.as_str())
    }
}
