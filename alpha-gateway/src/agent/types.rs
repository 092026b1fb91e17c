// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Wire types of the agent protocol.

use alpha_policy_engine::policy::{Category, MatchKind, PolicyWindow, Rule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Handshake
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandshakeRequest {
    pub device_id: String,
    #[serde(default)]
    pub system_info: serde_json::Value,
    #[serde(default)]
    pub agent_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandshakeResponse {
    pub auth_token: String,
    pub device_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Report
// =============================================================================

/// One visit observed by the agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<String>,
    /// Seconds spent on the page
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub focus_mode_state: Option<bool>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Report batch. Entries are kept as raw JSON so a malformed entry only
/// rejects itself, not the batch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentReportRequest {
    pub logs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoredLog {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RejectedLog {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportResponse {
    pub count: usize,
    pub logs: Vec<StoredLog>,
    pub rejected: Vec<RejectedLog>,
}

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlocklistEntry {
    pub id: String,
    pub pattern: String,
    pub match_type: MatchKind,
    pub category: Category,
    pub reason: Option<String>,
}

impl From<Rule> for BlocklistEntry {
    fn from(rule: Rule) -> Self {
        Self {
            id: rule.id,
            pattern: rule.pattern,
            match_type: rule.match_kind,
            category: rule.category,
            reason: rule.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolicyDescriptor {
    pub default_category: Category,
    pub time_based_rules: bool,
    pub focus_mode_enabled: bool,
    pub policy_window: PolicyWindow,
    pub case_insensitive: bool,
}

impl PolicyDescriptor {
    pub fn new(window: PolicyWindow) -> Self {
        Self {
            default_category: Category::A,
            time_based_rules: true,
            focus_mode_enabled: true,
            policy_window: window,
            case_insensitive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FocusModeSchedule {
    pub enabled: bool,
    /// ISO weekdays, Monday = 1
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
}

impl Default for FocusModeSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            weekdays: vec![1, 2, 3, 4, 5],
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfigResponse {
    pub blocklist: Vec<BlocklistEntry>,
    pub policy: PolicyDescriptor,
    pub focus_mode_schedule: FocusModeSchedule,
}

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyRequest {
    pub url: String,
    #[serde(default)]
    pub principal: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyResponse {
    pub category: Category,
    pub reason: String,
    pub matched_pattern: Option<String>,
    pub timestamp: DateTime<Utc>,
}
