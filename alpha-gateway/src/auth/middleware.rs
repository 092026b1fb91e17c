// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Auth Middleware
//!
//! Axum middleware for agent credentials.
//!
//! - Extract the bearer token from the Authorization header
//! - Verify it with the trust manager
//! - Inject the authenticated agent into request extensions
//!
//! Runs before the body extractor, so a rejected request never has its body
//! read or persisted.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::AgentClaims;
use super::trust::{AgentTrustManager, TrustError};
use crate::audit::{AuditEvent, AuditSink};
use crate::error::GatewayError;

// =============================================================================
// Auth State
// =============================================================================

/// Authentication state shared with the middleware.
#[derive(Clone)]
pub struct AuthState {
    pub trust: Arc<AgentTrustManager>,
    pub audit: Arc<dyn AuditSink>,
}

impl AuthState {
    pub fn new(trust: Arc<AgentTrustManager>, audit: Arc<dyn AuditSink>) -> Self {
        Self { trust, audit }
    }
}

// =============================================================================
// Authenticated Agent (Request Extension)
// =============================================================================

/// Verified agent, injected into request extensions by [`require_agent`].
#[derive(Debug, Clone)]
pub struct AuthenticatedAgent {
    pub device_id: Uuid,
    pub agent_version: Option<String>,
    pub claims: AgentClaims,
}

impl AuthenticatedAgent {
    pub fn from_claims(claims: AgentClaims) -> Result<Self, TrustError> {
        let device_id = claims.device_uuid().ok_or(TrustError::InvalidDeviceId)?;
        Ok(Self {
            device_id,
            agent_version: claims.agent_version.clone(),
            claims,
        })
    }

    /// Principal used for classification caching and audit
    pub fn principal(&self) -> String {
        self.device_id.to_string()
    }
}

// =============================================================================
// Auth Middleware
// =============================================================================

/// Agent credential middleware. Missing or invalid credentials yield 401.
pub async fn require_agent(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let verified = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(TrustError::MissingHeader)
        .and_then(|v| v.to_str().map_err(|_| TrustError::InvalidHeaderFormat))
        .and_then(AgentTrustManager::extract_bearer)
        .and_then(|token| auth_state.trust.verify(token))
        .and_then(AuthenticatedAgent::from_claims);

    let agent = match verified {
        Ok(agent) => agent,
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "agent credential rejected");
            auth_state.audit.emit(AuditEvent::AgentRejected {
                device_id: None,
                reason: e.to_string(),
            });
            return Err(GatewayError::Unauthorized(e.to_string()));
        }
    };

    debug!(device_id = %agent.device_id, "agent authenticated");
    request.extensions_mut().insert(agent);

    Ok(next.run(request).await)
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor for the authenticated agent.
///
/// ```ignore
/// async fn handler(AuthAgent(agent): AuthAgent) -> impl IntoResponse {
///     agent.device_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthAgent(pub AuthenticatedAgent);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthAgent
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAgent>()
            .cloned()
            .map(AuthAgent)
            .ok_or_else(|| GatewayError::Unauthorized("No authenticated agent".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
