// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Agent Trust
//!
//! Devices prove their registration once through the handshake and receive a
//! short-lived HS256 credential. Every later agent call presents it as a
//! bearer token.
//!
//! ## Components
//!
//! - **claims**: agent credential claims
//! - **trust**: credential minting and verification, device resolution
//! - **middleware**: Axum middleware and extractor for agent requests
//!
//! ## Usage
//!
//! ```ignore
//! let trust = Arc::new(AgentTrustManager::new(settings, devices, clock));
//! let auth_state = AuthState::new(trust, audit);
//!
//! let app = Router::new()
//!     .route("/agent/config", get(agent_config))
//!     .layer(middleware::from_fn_with_state(auth_state, require_agent));
//!
//! async fn agent_config(AuthAgent(agent): AuthAgent) -> impl IntoResponse {
//!     format!("Hello, {}", agent.device_id)
//! }
//! ```

pub mod claims;
pub mod middleware;
pub mod trust;

pub use claims::{AgentClaims, AGENT_ROLE, TOKEN_TYPE};
pub use middleware::{require_agent, AuthAgent, AuthState, AuthenticatedAgent};
pub use trust::{AgentTrustManager, IssuedCredential, TrustError, TrustSettings};
