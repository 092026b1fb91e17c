// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::extract::FromRef;
use chrono::{Offset, Utc};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

use crate::agent::AgentGateway;
use crate::audit::AuditSink;
use crate::auth::{AgentTrustManager, AuthState, TrustSettings};
use crate::cache::ClassificationCache;
use crate::classifier::ClassificationService;
use crate::clock::Clock;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::store::{BrowsingStore, DeviceStore, MemoryStore, RuleStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub agents: Arc<AgentGateway>,
    pub classifier: Arc<ClassificationService>,
    pub audit: Arc<dyn AuditSink>,
    pub metrics: Metrics,
    /// Flag indicating if we're shutting down
    pub shutting_down: Arc<AtomicBool>,
}

impl AppState {
    /// Wire every service onto a single in-memory store.
    pub fn new(
        config: &Config,
        store: Arc<MemoryStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self::with_stores(config, store.clone(), store.clone(), store, clock, audit)
    }

    pub fn with_stores(
        config: &Config,
        rules: Arc<dyn RuleStore>,
        devices: Arc<dyn DeviceStore>,
        browsing: Arc<dyn BrowsingStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let metrics = Metrics::new();

        let trust = Arc::new(AgentTrustManager::new(
            TrustSettings::from_config(config),
            devices,
            clock.clone(),
        ));

        let agents = Arc::new(AgentGateway::new(
            trust,
            rules.clone(),
            browsing,
            audit.clone(),
            config.store_timeout(),
        ));

        let offset = config.policy_offset().unwrap_or_else(|| {
            warn!(
                minutes = config.policy_utc_offset_minutes,
                "policy UTC offset out of range, using UTC"
            );
            Utc.fix()
        });

        let classifier = Arc::new(ClassificationService::new(
            rules,
            ClassificationCache::new(config.classification_cache_ttl(), clock.clone()),
            clock,
            offset,
            config.store_timeout(),
            audit.clone(),
            metrics.clone(),
        ));

        Self {
            agents,
            classifier,
            audit,
            metrics,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState::new(self.agents.trust().clone(), self.audit.clone())
    }
}

impl FromRef<AppState> for Metrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
