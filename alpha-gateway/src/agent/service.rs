// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Agent Gateway service
//!
//! Handshake, visit reporting and config distribution for endpoint agents.
//! Handlers stay thin; everything with a failure mode lives here.

use alpha_policy_engine::policy::{extract_domain, PolicyWindow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{
    AgentConfigResponse, AgentReport, AgentReportRequest, BlocklistEntry, FocusModeSchedule,
    HandshakeRequest, HandshakeResponse, PolicyDescriptor, RejectedLog, ReportResponse, StoredLog,
};
use crate::audit::{AuditEvent, AuditSink};
use crate::auth::{AgentTrustManager, AuthenticatedAgent};
use crate::error::GatewayError;
use crate::store::{BrowsingRecord, BrowsingStore, RuleSnapshot, RuleStore};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_CATEGORY_LENGTH: usize = 64;
pub const DEFAULT_VISIT_CATEGORY: &str = "unrestricted";

pub struct AgentGateway {
    trust: Arc<AgentTrustManager>,
    rules: Arc<dyn RuleStore>,
    browsing: Arc<dyn BrowsingStore>,
    audit: Arc<dyn AuditSink>,
    window: PolicyWindow,
    store_timeout: Duration,
}

impl AgentGateway {
    pub fn new(
        trust: Arc<AgentTrustManager>,
        rules: Arc<dyn RuleStore>,
        browsing: Arc<dyn BrowsingStore>,
        audit: Arc<dyn AuditSink>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            trust,
            rules,
            browsing,
            audit,
            window: PolicyWindow::default(),
            store_timeout,
        }
    }

    pub fn with_window(mut self, window: PolicyWindow) -> Self {
        self.window = window;
        self
    }

    pub fn trust(&self) -> &Arc<AgentTrustManager> {
        &self.trust
    }

    // =========================================================================
    // Handshake
    // =========================================================================

    pub async fn handshake(
        &self,
        req: HandshakeRequest,
    ) -> Result<HandshakeResponse, GatewayError> {
        let issued = match self
            .trust
            .authenticate(&req.device_id, req.system_info, req.agent_version.clone())
            .await
        {
            Ok(issued) => issued,
            Err(e) => {
                warn!(device_id = %req.device_id, error = %e, "handshake refused");
                self.audit.emit(AuditEvent::AgentRejected {
                    device_id: Some(req.device_id),
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.audit.emit(AuditEvent::AgentAuthenticated {
            device_id: issued.device_id,
            agent_version: req.agent_version,
        });

        Ok(HandshakeResponse {
            auth_token: issued.token,
            device_id: issued.device_id,
            expires_at: issued.expires_at,
        })
    }

    // =========================================================================
    // Report
    // =========================================================================

    /// Persist a batch of visits.
    ///
    /// Entries are handled independently: an invalid entry or a failed write
    /// is listed in `rejected` and the rest of the batch proceeds.
    pub async fn report(
        &self,
        agent: &AuthenticatedAgent,
        req: AgentReportRequest,
    ) -> Result<ReportResponse, GatewayError> {
        let device = self.trust.require_device(agent.device_id).await?;

        let mut logs = Vec::with_capacity(req.logs.len());
        let mut rejected = Vec::new();

        for (index, raw) in req.logs.into_iter().enumerate() {
            let entry = match serde_json::from_value::<AgentReport>(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    rejected.push(RejectedLog {
                        index,
                        reason: format!("Malformed entry: {}", e),
                    });
                    continue;
                }
            };

            if let Err(reason) = validate_entry(&entry) {
                rejected.push(RejectedLog { index, reason });
                continue;
            }

            let record = to_record(device.id, entry);
            let stored = StoredLog {
                url: record.url.clone(),
                timestamp: record.timestamp,
                category: record.category.clone(),
            };

            let write = self.browsing.record_visit(record);
            match tokio::time::timeout(self.store_timeout, write).await {
                Ok(Ok(())) => logs.push(stored),
                Ok(Err(e)) => {
                    warn!(device_id = %device.id, index, error = %e, "visit write failed");
                    rejected.push(RejectedLog {
                        index,
                        reason: format!("Storage error: {}", e),
                    });
                }
                Err(_) => {
                    warn!(device_id = %device.id, index, "visit write timed out");
                    rejected.push(RejectedLog {
                        index,
                        reason: "Storage timed out".to_string(),
                    });
                }
            }
        }

        info!(
            device_id = %device.id,
            stored = logs.len(),
            rejected = rejected.len(),
            "agent report processed"
        );
        self.audit.emit(AuditEvent::VisitsReported {
            device_id: device.id,
            accepted: logs.len(),
            rejected: rejected.len(),
        });

        Ok(ReportResponse {
            count: logs.len(),
            logs,
            rejected,
        })
    }

    // =========================================================================
    // Config
    // =========================================================================

    /// Current blocklist plus the static policy descriptor and schedule.
    pub async fn config(
        &self,
        agent: &AuthenticatedAgent,
    ) -> Result<AgentConfigResponse, GatewayError> {
        let device = self.trust.require_device(agent.device_id).await?;
        let snapshot = self.load_rules().await?;
        let rule_count = snapshot.rules.len();

        debug!(
            device_id = %device.id,
            revision = snapshot.revision,
            rules = rule_count,
            "serving agent config"
        );
        self.audit.emit(AuditEvent::ConfigServed {
            device_id: device.id,
            rules: rule_count,
        });

        Ok(AgentConfigResponse {
            blocklist: snapshot.rules.into_iter().map(BlocklistEntry::from).collect(),
            policy: PolicyDescriptor::new(self.window.clone()),
            focus_mode_schedule: FocusModeSchedule::default(),
        })
    }

    async fn load_rules(&self) -> Result<RuleSnapshot, GatewayError> {
        match tokio::time::timeout(self.store_timeout, self.rules.active_rules()).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => Err(GatewayError::UpstreamUnavailable(e.to_string())),
            Err(_) => {
                warn!("rule store timed out");
                Err(GatewayError::UpstreamUnavailable(
                    "rule store timed out".to_string(),
                ))
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_entry(entry: &AgentReport) -> Result<(), String> {
    let url = entry.url.trim();
    if url.is_empty() {
        return Err("URL is empty".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(format!("URL exceeds {} characters", MAX_URL_LENGTH));
    }
    if matches!(entry.duration, Some(d) if d < 0) {
        return Err("Duration must not be negative".to_string());
    }
    if matches!(&entry.category, Some(c) if c.len() > MAX_CATEGORY_LENGTH) {
        return Err(format!("Category exceeds {} characters", MAX_CATEGORY_LENGTH));
    }
    Ok(())
}

fn to_record(device_id: Uuid, entry: AgentReport) -> BrowsingRecord {
    let url = entry.url.trim().to_string();
    let category = entry
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_VISIT_CATEGORY.to_string());

    BrowsingRecord {
        id: Uuid::new_v4(),
        device_id,
        domain: extract_domain(&url),
        url,
        category,
        duration_seconds: entry.duration,
        timestamp: entry.timestamp,
        focus_mode_state: entry.focus_mode_state,
        metadata: entry.metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(url: &str) -> AgentReport {
        AgentReport {
            url: url.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
            category: None,
            duration: Some(30),
            focus_mode_state: None,
            metadata: None,
        }
    }

    #[test]
    fn test_validate_entry() {
        assert!(validate_entry(&entry("https://example.com")).is_ok());
        assert!(validate_entry(&entry("   ")).is_err());
        assert!(validate_entry(&entry(&"a".repeat(MAX_URL_LENGTH + 1))).is_err());

        let mut negative = entry("https://example.com");
        negative.duration = Some(-1);
        assert!(validate_entry(&negative).is_err());

        let mut long_category = entry("https://example.com");
        long_category.category = Some("x".repeat(MAX_CATEGORY_LENGTH + 1));
        assert!(validate_entry(&long_category).is_err());
    }

    #[test]
    fn test_to_record_defaults_category_and_derives_domain() {
        let record = to_record(Uuid::nil(), entry("https://WWW.Example.com/path?q=1"));
        assert_eq!(record.domain, "www.example.com");
        assert_eq!(record.category, DEFAULT_VISIT_CATEGORY);
        assert_eq!(record.duration_seconds, Some(30));
    }

    #[test]
    fn test_to_record_keeps_agent_category() {
        let mut e = entry("https://roblox.com");
        e.category = Some("partially_restricted".to_string());
        let record = to_record(Uuid::nil(), e);
        assert_eq!(record.category, "partially_restricted");
    }
}
