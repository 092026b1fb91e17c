// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::require_agent;
use crate::handlers::{
    agent_config, agent_handshake, agent_report, classify_url, health_live, health_ready,
    health_startup, metrics_handler, track_requests,
};
use crate::state::AppState;

/// Build the gateway router.
///
/// Agent endpoints other than the handshake sit behind [`require_agent`],
/// which runs before the body is extracted.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/agent/report", post(agent_report))
        .route("/agent/config", get(agent_config))
        .route("/filter/classify", post(classify_url))
        .route_layer(middleware::from_fn_with_state(
            state.auth_state(),
            require_agent,
        ));

    Router::new()
        .route("/agent/handshake", post(agent_handshake))
        .merge(protected)
        // Health endpoints
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/health/startup", get(health_startup))
        // Metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
