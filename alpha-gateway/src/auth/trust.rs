// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Agent Trust Manager
//!
//! Mints HS256 agent credentials at handshake and verifies them on every
//! agent request. Expiry is checked against the injected clock, not by
//! `jsonwebtoken`, so tests can move time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::claims::{AgentClaims, AGENT_ROLE, TOKEN_TYPE};
use crate::clock::Clock;
use crate::config::Config;
use crate::store::{Device, DeviceStore};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header format (expected 'Bearer <token>')")]
    InvalidHeaderFormat,

    #[error("Token expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token decode error: {0}")]
    DecodeError(String),

    #[error("Token is not an agent credential")]
    MissingCapability,

    #[error("Token device_id is not a valid UUID")]
    InvalidDeviceId,

    #[error("Device not found or inactive")]
    DeviceNotFound,

    #[error("Device store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to sign credential: {0}")]
    Signing(String),
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone)]
pub struct TrustSettings {
    pub secret: String,
    pub issuer: String,
    pub ttl: Duration,
    /// Clock skew tolerated on expiry, in seconds
    pub leeway_seconds: i64,
    pub store_timeout: std::time::Duration,
}

impl TrustSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            ttl: config.agent_token_ttl(),
            leeway_seconds: config.token_leeway_seconds.max(0),
            store_timeout: config.store_timeout(),
        }
    }
}

impl Default for TrustSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A freshly minted credential.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCredential {
    pub token: String,
    pub device_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Trust Manager
// =============================================================================

pub struct AgentTrustManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: TrustSettings,
    devices: Arc<dyn DeviceStore>,
    clock: Arc<dyn Clock>,
}

impl AgentTrustManager {
    pub fn new(
        settings: TrustSettings,
        devices: Arc<dyn DeviceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            settings,
            devices,
            clock,
        }
    }

    /// Exchange a registered, active device id for a credential.
    ///
    /// An id that does not parse as a UUID is reported as an unknown device.
    pub async fn authenticate(
        &self,
        device_id: &str,
        system_info: serde_json::Value,
        agent_version: Option<String>,
    ) -> Result<IssuedCredential, TrustError> {
        let id = Uuid::parse_str(device_id.trim()).map_err(|_| TrustError::DeviceNotFound)?;
        let device = self.require_device(id).await?;

        let now = self.clock.now();
        let expires_at = now + self.settings.ttl;
        let claims = AgentClaims {
            sub: device.id.to_string(),
            device_id: device.id.to_string(),
            role: AGENT_ROLE.to_string(),
            agent: true,
            typ: TOKEN_TYPE.to_string(),
            iss: self.settings.issuer.clone(),
            system_info,
            agent_version,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TrustError::Signing(e.to_string()))?;

        info!(
            device_id = %device.id,
            expires_at = %expires_at,
            "agent credential issued"
        );

        Ok(IssuedCredential {
            token,
            device_id: device.id,
            expires_at,
        })
    }

    /// Verify a credential and return its claims.
    ///
    /// Fails closed: anything other than a well-formed, correctly signed,
    /// unexpired agent credential from this issuer is rejected.
    pub fn verify(&self, token: &str) -> Result<AgentClaims, TrustError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[self.settings.issuer.as_str()]);

        let claims = decode::<AgentClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => TrustError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TrustError::InvalidSignature,
                _ => TrustError::DecodeError(e.to_string()),
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp + self.settings.leeway_seconds {
            return Err(TrustError::Expired);
        }

        if !claims.has_agent_capability() {
            warn!(sub = %claims.sub, role = %claims.role, "credential lacks agent capability");
            return Err(TrustError::MissingCapability);
        }

        if claims.device_uuid().is_none() {
            return Err(TrustError::InvalidDeviceId);
        }

        debug!(device_id = %claims.device_id, "agent credential verified");
        Ok(claims)
    }

    /// Load the device, failing when it is absent or deactivated.
    pub async fn require_device(&self, id: Uuid) -> Result<Device, TrustError> {
        match tokio::time::timeout(self.settings.store_timeout, self.devices.get_device(id)).await {
            Err(_) => {
                warn!(device_id = %id, "device store timed out");
                Err(TrustError::StoreUnavailable("device store timed out".to_string()))
            }
            Ok(Err(e)) => Err(TrustError::StoreUnavailable(e.to_string())),
            Ok(Ok(Some(device))) if device.active => Ok(device),
            Ok(Ok(_)) => Err(TrustError::DeviceNotFound),
        }
    }

    /// Extract the token from an Authorization header value.
    pub fn extract_bearer(auth_header: &str) -> Result<&str, TrustError> {
        let mut parts = auth_header.splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().map(str::trim).unwrap_or_default();

        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(TrustError::InvalidHeaderFormat);
        }

        Ok(token)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStore, NewDevice};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    async fn setup() -> (AgentTrustManager, Arc<MemoryStore>, ManualClock, Device) {
        let store = Arc::new(MemoryStore::new());
        let device = store
            .register_device(NewDevice {
                owner_id: Uuid::new_v4(),
                name: "kids-laptop".to_string(),
                hardware_address: "AA:BB:CC:DD:EE:01".to_string(),
            })
            .await
            .unwrap();
        let clock = ManualClock::new(start());
        let settings = TrustSettings {
            secret: "test-secret".to_string(),
            ..Default::default()
        };
        let manager = AgentTrustManager::new(settings, store.clone(), Arc::new(clock.clone()));
        (manager, store, clock, device)
    }

    fn forge(claims: &AgentClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_and_verify() {
        let (manager, _, _, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::json!({"os": "linux"}), None)
            .await
            .unwrap();

        assert_eq!(issued.device_id, device.id);
        assert_eq!(issued.expires_at, start() + Duration::minutes(1440));

        let claims = manager.verify(&issued.token).unwrap();
        assert_eq!(claims.device_id, device.id.to_string());
        assert_eq!(claims.sub, claims.device_id);
        assert!(claims.has_agent_capability());
        assert_eq!(claims.typ, TOKEN_TYPE);
        assert_eq!(claims.system_info["os"], "linux");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_device() {
        let (manager, _, _, _) = setup().await;
        let result = manager
            .authenticate(&Uuid::new_v4().to_string(), serde_json::Value::Null, None)
            .await;
        assert!(matches!(result, Err(TrustError::DeviceNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_unparseable_device_id() {
        let (manager, _, _, _) = setup().await;
        let result = manager
            .authenticate("not-a-uuid", serde_json::Value::Null, None)
            .await;
        assert!(matches!(result, Err(TrustError::DeviceNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_device() {
        let (manager, store, _, device) = setup().await;
        store.set_device_active(device.id, false).await.unwrap();
        let result = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await;
        assert!(matches!(result, Err(TrustError::DeviceNotFound)));
    }

    #[tokio::test]
    async fn test_verify_expired() {
        let (manager, _, clock, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await
            .unwrap();

        clock.advance(Duration::minutes(1439));
        assert!(manager.verify(&issued.token).is_ok());

        clock.advance(Duration::minutes(1));
        assert!(matches!(manager.verify(&issued.token), Err(TrustError::Expired)));
    }

    #[tokio::test]
    async fn test_verify_wrong_secret() {
        let (manager, _, _, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await
            .unwrap();
        let claims = manager.verify(&issued.token).unwrap();

        let forged = forge(&claims, "another-secret");
        assert!(matches!(
            manager.verify(&forged),
            Err(TrustError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_verify_tampered_payload() {
        let (manager, _, _, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await
            .unwrap();

        let parts: Vec<&str> = issued.token.split('.').collect();
        let claims = manager.verify(&issued.token).unwrap();
        let elevated = AgentClaims {
            device_id: Uuid::new_v4().to_string(),
            ..claims
        };
        let forged_payload = forge(&elevated, "test-secret");
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(
            manager.verify(&tampered),
            Err(TrustError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_verify_missing_capability() {
        let (manager, _, _, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await
            .unwrap();
        let mut claims = manager.verify(&issued.token).unwrap();

        claims.role = "parent".to_string();
        let token = forge(&claims, "test-secret");
        assert!(matches!(
            manager.verify(&token),
            Err(TrustError::MissingCapability)
        ));

        claims.role = AGENT_ROLE.to_string();
        claims.agent = false;
        let token = forge(&claims, "test-secret");
        assert!(matches!(
            manager.verify(&token),
            Err(TrustError::MissingCapability)
        ));
    }

    #[tokio::test]
    async fn test_verify_wrong_issuer() {
        let (manager, _, _, device) = setup().await;
        let issued = manager
            .authenticate(&device.id.to_string(), serde_json::Value::Null, None)
            .await
            .unwrap();
        let mut claims = manager.verify(&issued.token).unwrap();

        claims.iss = "someone-else".to_string();
        let token = forge(&claims, "test-secret");
        assert!(matches!(manager.verify(&token), Err(TrustError::InvalidIssuer)));
    }

    #[tokio::test]
    async fn test_verify_garbage() {
        let (manager, _, _, _) = setup().await;
        assert!(matches!(
            manager.verify("not.a.token"),
            Err(TrustError::DecodeError(_))
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(AgentTrustManager::extract_bearer("Bearer abc").unwrap(), "abc");
        assert_eq!(AgentTrustManager::extract_bearer("bearer abc").unwrap(), "abc");
        assert!(matches!(
            AgentTrustManager::extract_bearer("abc"),
            Err(TrustError::InvalidHeaderFormat)
        ));
        assert!(matches!(
            AgentTrustManager::extract_bearer("Basic dXNlcjpwYXNz"),
            Err(TrustError::InvalidHeaderFormat)
        ));
        assert!(matches!(
            AgentTrustManager::extract_bearer("Bearer "),
            Err(TrustError::InvalidHeaderFormat)
        ));
    }
}
