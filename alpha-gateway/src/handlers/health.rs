// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::Ordering;

use crate::state::AppState;

/// Health check response body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Kubernetes liveness probe endpoint.
///
/// Returns 200 OK if the process is alive.
///
/// # Endpoint
/// `GET /health/live`
pub async fn health_live() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

/// Kubernetes readiness probe endpoint.
///
/// Returns 503 once shutdown has begun so the load balancer drains us.
///
/// # Endpoint
/// `GET /health/ready`
pub async fn health_ready(State(state): State<AppState>) -> Response {
    if state.shutting_down.load(Ordering::SeqCst) {
        let response = HealthResponse {
            status: "shutting_down",
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response();
    }

    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

/// Kubernetes startup probe endpoint.
///
/// # Endpoint
/// `GET /health/startup`
pub async fn health_startup() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}
