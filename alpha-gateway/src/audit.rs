// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Audit events
//!
//! Every security-relevant outcome (credential issued or refused, restricted
//! decision, report ingested, config served) is emitted to an [`AuditSink`].
//! Alert delivery consumes these events downstream.

use alpha_policy_engine::policy::{Category, Decision, DecisionSource};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    DecisionEvaluated {
        principal: String,
        url: String,
        category: Category,
        reason: String,
        matched_rule: Option<String>,
        source: DecisionSource,
    },
    AgentAuthenticated {
        device_id: Uuid,
        agent_version: Option<String>,
    },
    AgentRejected {
        device_id: Option<String>,
        reason: String,
    },
    VisitsReported {
        device_id: Uuid,
        accepted: usize,
        rejected: usize,
    },
    ConfigServed {
        device_id: Uuid,
        rules: usize,
    },
}

impl AuditEvent {
    pub fn decision(principal: &str, url: &str, decision: &Decision) -> Self {
        AuditEvent::DecisionEvaluated {
            principal: principal.to_string(),
            url: url.to_string(),
            category: decision.category,
            reason: decision.reason.clone(),
            matched_rule: decision.matched_rule.as_ref().map(|r| r.id.clone()),
            source: decision.source,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::DecisionEvaluated { .. } => "decision_evaluated",
            AuditEvent::AgentAuthenticated { .. } => "agent_authenticated",
            AuditEvent::AgentRejected { .. } => "agent_rejected",
            AuditEvent::VisitsReported { .. } => "visits_reported",
            AuditEvent::ConfigServed { .. } => "config_served",
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

// =============================================================================
// Tracing sink
// =============================================================================

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        match &event {
            AuditEvent::DecisionEvaluated {
                principal,
                url,
                category,
                reason,
                matched_rule,
                source,
            } => {
                if category.requires_alert() {
                    warn!(
                        target: "audit",
                        event = event.name(),
                        principal = %principal,
                        url = %url,
                        category = %category,
                        reason = %reason,
                        matched_rule = ?matched_rule,
                        source = source.as_str(),
                        "restricted decision"
                    );
                } else {
                    info!(
                        target: "audit",
                        event = event.name(),
                        principal = %principal,
                        url = %url,
                        category = %category,
                        source = source.as_str(),
                        "decision"
                    );
                }
            }
            AuditEvent::AgentAuthenticated {
                device_id,
                agent_version,
            } => {
                info!(
                    target: "audit",
                    event = event.name(),
                    device_id = %device_id,
                    agent_version = ?agent_version,
                    "agent credential issued"
                );
            }
            AuditEvent::AgentRejected { device_id, reason } => {
                warn!(
                    target: "audit",
                    event = event.name(),
                    device_id = ?device_id,
                    reason = %reason,
                    "agent rejected"
                );
            }
            AuditEvent::VisitsReported {
                device_id,
                accepted,
                rejected,
            } => {
                info!(
                    target: "audit",
                    event = event.name(),
                    device_id = %device_id,
                    accepted,
                    rejected,
                    "browsing report ingested"
                );
            }
            AuditEvent::ConfigServed { device_id, rules } => {
                info!(
                    target: "audit",
                    event = event.name(),
                    device_id = %device_id,
                    rules,
                    "agent config served"
                );
            }
        }
    }
}

// =============================================================================
// Memory sink
// =============================================================================

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
