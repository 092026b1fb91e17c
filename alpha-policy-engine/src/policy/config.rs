// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::policy::rule::Rule;

/// Errors that can occur while loading a rule-set file
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Duplicate rule id: {0}")]
    DuplicateId(String),
    #[error("Rule {0} has an empty pattern")]
    EmptyPattern(String),
}

/// Root structure of a rule-set YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetConfig {
    pub version: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSetConfig {
    /// Parse and validate a rule set from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the rule set to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Rule ids must be unique and patterns non-empty
    pub fn validate(&self) -> Result<(), RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleSetError::DuplicateId(rule.id.clone()));
            }
            if rule.pattern.trim().is_empty() {
                return Err(RuleSetError::EmptyPattern(rule.id.clone()));
            }
        }
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.active).count()
    }
}
