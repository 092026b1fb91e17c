// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Classification service
//!
//! Puts the decision engine behind the rule store and the classification
//! cache. The compiled engine is reused until the store revision changes.

use alpha_policy_engine::policy::{ClassifyContext, Decision, DecisionEngine, PolicyWindow};
use chrono::FixedOffset;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::audit::{AuditEvent, AuditSink};
use crate::cache::{CacheKey, ClassificationCache};
use crate::clock::Clock;
use crate::error::GatewayError;
use crate::metrics::Metrics;
use crate::store::RuleStore;

pub struct ClassificationService {
    rules: Arc<dyn RuleStore>,
    cache: ClassificationCache,
    compiled: RwLock<Option<(u64, Arc<DecisionEngine>)>>,
    window: PolicyWindow,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    store_timeout: Duration,
    audit: Arc<dyn AuditSink>,
    metrics: Metrics,
}

impl ClassificationService {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        cache: ClassificationCache,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        store_timeout: Duration,
        audit: Arc<dyn AuditSink>,
        metrics: Metrics,
    ) -> Self {
        Self {
            rules,
            cache,
            compiled: RwLock::new(None),
            window: PolicyWindow::default(),
            clock,
            offset,
            store_timeout,
            audit,
            metrics,
        }
    }

    pub fn with_window(mut self, window: PolicyWindow) -> Self {
        self.window = window;
        self
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    /// Classify `url` for `principal`, serving from the cache when possible.
    pub async fn classify(&self, url: &str, principal: &str) -> Result<Decision, GatewayError> {
        let key = CacheKey::new(principal, url);
        let decision = match self.cache.get(&key) {
            Some(decision) => {
                self.metrics.record_cache_lookup(true);
                decision
            }
            None => {
                self.metrics.record_cache_lookup(false);
                self.cache
                    .get_or_try_compute(key, || self.evaluate(url))
                    .await?
            }
        };

        self.metrics.record_decision(&decision);
        // Cache hits alert too
        if decision.requires_alert() {
            self.audit
                .emit(AuditEvent::decision(principal, url, &decision));
        }

        debug!(
            principal = %principal,
            category = %decision.category,
            source = decision.source.as_str(),
            "url classified"
        );
        Ok(decision)
    }

    async fn evaluate(&self, url: &str) -> Result<Decision, GatewayError> {
        let engine = self.engine().await?;
        let now = self.clock.now().with_timezone(&self.offset);
        Ok(engine.classify(url, &ClassifyContext::at(now)))
    }

    /// Compiled engine for the current rule revision.
    async fn engine(&self) -> Result<Arc<DecisionEngine>, GatewayError> {
        let load = self.rules.active_rules();
        let snapshot = match tokio::time::timeout(self.store_timeout, load).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => return Err(GatewayError::UpstreamUnavailable(e.to_string())),
            Err(_) => {
                warn!("rule store timed out");
                return Err(GatewayError::UpstreamUnavailable(
                    "rule store timed out".to_string(),
                ));
            }
        };

        {
            let compiled = self.compiled.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((revision, engine)) = compiled.as_ref() {
                if *revision == snapshot.revision {
                    return Ok(engine.clone());
                }
            }
        }

        let revision = snapshot.revision;
        let engine =
            Arc::new(DecisionEngine::new(snapshot.rules).with_window(self.window.clone()));
        debug!(revision, rules = engine.rule_count(), "decision engine compiled");

        let mut compiled = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        *compiled = Some((revision, engine.clone()));
        Ok(engine)
    }
}
