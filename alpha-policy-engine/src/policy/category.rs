// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Access Categories
//!
//! Category levels:
//! - A: Unrestricted, silent allow
//! - B: Restricted, access allowed but an alert is raised
//! - C: Blocked, access denied and an alert is raised

use serde::{Deserialize, Serialize};

// =============================================================================
// Category Enum
// =============================================================================

/// Access tier assigned to a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Unrestricted
    #[default]
    A,
    /// Restricted with alert
    B,
    /// Blocked
    C,
}

impl Category {
    /// Whether access must be denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, Category::C)
    }

    /// Whether an alert side effect is required.
    pub fn requires_alert(&self) -> bool {
        matches!(self, Category::B | Category::C)
    }

    /// Label used for browsing records.
    pub fn label(&self) -> &'static str {
        match self {
            Category::A => "unrestricted",
            Category::B => "partially_restricted",
            Category::C => "blocked",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::A => write!(f, "A"),
            Category::B => write!(f, "B"),
            Category::C => write!(f, "C"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
