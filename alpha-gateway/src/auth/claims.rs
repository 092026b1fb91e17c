// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Agent credential claims.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AGENT_ROLE: &str = "agent";
pub const TOKEN_TYPE: &str = "access";

/// Claims carried by an agent credential.
///
/// The capability marker is the pair `agent == true` and `role == "agent"`;
/// both default to a failing value when absent from the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentClaims {
    /// Subject (device ID)
    pub sub: String,

    /// Device ID the credential is bound to
    pub device_id: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub agent: bool,

    #[serde(default)]
    pub typ: String,

    pub iss: String,

    /// Opaque description of the endpoint, as sent at handshake
    #[serde(default)]
    pub system_info: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AgentClaims {
    pub fn has_agent_capability(&self) -> bool {
        self.agent && self.role == AGENT_ROLE
    }

    pub fn device_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.device_id).ok()
    }
}
