// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{extract::State, Json};
use tracing::warn;

use crate::agent::{ClassifyRequest, ClassifyResponse};
use crate::auth::AuthAgent;
use crate::error::GatewayError;
use crate::state::AppState;

/// Classify a URL into category A, B or C for the calling agent.
///
/// The principal defaults to the credential's device and may not name
/// another one.
///
/// # Endpoint
/// `POST /filter/classify`
pub async fn classify_url(
    State(state): State<AppState>,
    AuthAgent(agent): AuthAgent,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, GatewayError> {
    let principal = agent.principal();
    if let Some(requested) = req.principal.as_deref() {
        if requested != principal {
            warn!(device_id = %agent.device_id, requested = %requested, "principal mismatch");
            return Err(GatewayError::Forbidden("Principal mismatch".to_string()));
        }
    }

    let url = req.url.trim();
    if url.is_empty() {
        return Err(GatewayError::BadRequest("URL is empty".to_string()));
    }

    state.agents.trust().require_device(agent.device_id).await?;
    let decision = state.classifier.classify(url, &principal).await?;

    Ok(Json(ClassifyResponse {
        category: decision.category,
        matched_pattern: decision.matched_pattern().map(str::to_string),
        reason: decision.reason,
        timestamp: decision.evaluated_at,
    }))
}
