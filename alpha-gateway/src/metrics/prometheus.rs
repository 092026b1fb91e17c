// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use alpha_policy_engine::policy::Decision;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Prometheus metrics for the gateway.
///
/// Thread-safe registry tracking request latency and throughput per endpoint,
/// classification outcomes and cache effectiveness.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Request duration histogram: gateway_request_duration_seconds{endpoint, status}
    request_duration: HistogramVec,

    /// Request counter: gateway_request_total{endpoint, status}
    request_total: CounterVec,

    /// Decisions: classification_decisions_total{category, source}
    decisions_total: CounterVec,

    /// Cache lookups: classification_cache_lookups_total{result}
    cache_lookups_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        // Request duration: buckets from 1ms to 10s (exponential)
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "gateway_request_duration_seconds",
                "Request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["endpoint", "status"],
        )
        .expect("failed to create request_duration histogram");

        let request_total = CounterVec::new(
            Opts::new("gateway_request_total", "Total number of requests"),
            &["endpoint", "status"],
        )
        .expect("failed to create request_total counter");

        let decisions_total = CounterVec::new(
            Opts::new(
                "classification_decisions_total",
                "Classification decisions by category and source",
            ),
            &["category", "source"],
        )
        .expect("failed to create decisions_total counter");

        let cache_lookups_total = CounterVec::new(
            Opts::new(
                "classification_cache_lookups_total",
                "Classification cache lookups (hit/miss)",
            ),
            &["result"],
        )
        .expect("failed to create cache_lookups_total counter");

        registry
            .register(Box::new(request_duration.clone()))
            .expect("failed to register request_duration");
        registry
            .register(Box::new(request_total.clone()))
            .expect("failed to register request_total");
        registry
            .register(Box::new(decisions_total.clone()))
            .expect("failed to register decisions_total");
        registry
            .register(Box::new(cache_lookups_total.clone()))
            .expect("failed to register cache_lookups_total");

        Self {
            registry: Arc::new(registry),
            request_duration,
            request_total,
            decisions_total,
            cache_lookups_total,
        }
    }

    /// Record a handled request.
    pub fn record_request(&self, endpoint: &str, duration: Duration, status: u16) {
        let status_str = status.to_string();

        self.request_duration
            .with_label_values(&[endpoint, &status_str])
            .observe(duration.as_secs_f64());
        self.request_total
            .with_label_values(&[endpoint, &status_str])
            .inc();
    }

    /// Record a freshly evaluated decision.
    pub fn record_decision(&self, decision: &Decision) {
        self.decisions_total
            .with_label_values(&[decision.category.label(), decision.source.as_str()])
            .inc();
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        self.cache_lookups_total
            .with_label_values(&[if hit { "hit" } else { "miss" }])
            .inc();
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
