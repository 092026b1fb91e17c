// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Alpha Policy Engine - deterministic URL access classification
//!
//! This crate turns a URL, an evaluation instant and an ordered set of
//! administrator rules into an A/B/C access [`Decision`]. It performs no I/O
//! and keeps no mutable state, so the same inputs always yield the same
//! decision.
//!
//! # Example
//!
//! ```rust
//! use alpha_policy_engine::policy::{Category, ClassifyContext, DecisionEngine, RuleSetConfig};
//! use chrono::{TimeZone, Utc};
//!
//! let rules = r#"
//! version: "1.0"
//! rules:
//!   - id: "adult"
//!     pattern: "porn"
//!     match_type: "regex"
//!     category: "C"
//!     reason: "adult content"
//! "#;
//!
//! let engine = DecisionEngine::from_config(RuleSetConfig::from_yaml(rules).unwrap());
//! let ctx = ClassifyContext::utc(Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap());
//!
//! let decision = engine.classify("http://xx-porn-site.com/a", &ctx);
//! assert_eq!(decision.category, Category::C);
//! ```

pub mod policy;

// Re-export commonly used types at the crate root
pub use policy::{
    Category, ClassifyContext, Decision, DecisionEngine, MatchKind, Rule, RuleSetConfig,
    RuleSetError,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Classify a URL against rules loaded from YAML
///
/// This is a convenience function for one-off evaluations.
///
/// # Example
///
/// ```rust
/// use alpha_policy_engine::{classify_url, Category};
/// use chrono::Utc;
///
/// let rules = r#"
/// version: "1.0"
/// rules:
///   - id: "games"
///     pattern: "roblox.com"
///     match_type: "domain"
///     category: "B"
/// "#;
///
/// let decision = classify_url(rules, "https://www.roblox.com/home", Utc::now()).unwrap();
/// assert_eq!(decision.category, Category::B);
/// ```
pub fn classify_url(
    rules_yaml: &str,
    url: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Decision, RuleSetError> {
    let engine = DecisionEngine::from_config(RuleSetConfig::from_yaml(rules_yaml)?);
    Ok(engine.classify(url, &ClassifyContext::utc(now)))
}
