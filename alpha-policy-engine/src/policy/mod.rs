// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
pub mod category;
pub mod config;
pub mod decision;
pub mod domain;
pub mod engine;
pub mod heuristics;
pub mod rule;
pub mod window;

pub use category::Category;
pub use config::{RuleSetConfig, RuleSetError};
pub use decision::{Decision, DecisionSource, MatchedRule};
pub use domain::extract_domain;
pub use engine::{ClassifyContext, DecisionEngine};
pub use rule::{CompiledRule, MatchKind, MatchOutcome, Rule};
pub use window::PolicyWindow;
