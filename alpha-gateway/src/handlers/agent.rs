// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{extract::State, Json};

use crate::agent::{
    AgentConfigResponse, AgentReportRequest, HandshakeRequest, HandshakeResponse, ReportResponse,
};
use crate::auth::AuthAgent;
use crate::error::GatewayError;
use crate::state::AppState;

/// Exchange a registered device id for an agent credential.
///
/// # Endpoint
/// `POST /agent/handshake`
pub async fn agent_handshake(
    State(state): State<AppState>,
    Json(req): Json<HandshakeRequest>,
) -> Result<Json<HandshakeResponse>, GatewayError> {
    state.agents.handshake(req).await.map(Json)
}

/// Ingest a batch of visits observed by the agent.
///
/// # Endpoint
/// `POST /agent/report`
pub async fn agent_report(
    State(state): State<AppState>,
    AuthAgent(agent): AuthAgent,
    Json(req): Json<AgentReportRequest>,
) -> Result<Json<ReportResponse>, GatewayError> {
    state.agents.report(&agent, req).await.map(Json)
}

/// Current blocklist, policy descriptor and focus-mode schedule.
///
/// # Endpoint
/// `GET /agent/config`
pub async fn agent_config(
    State(state): State<AppState>,
    AuthAgent(agent): AuthAgent,
) -> Result<Json<AgentConfigResponse>, GatewayError> {
    state.agents.config(&agent).await.map(Json)
}
