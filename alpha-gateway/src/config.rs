// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use chrono::FixedOffset;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_JWT_SECRET: &str = "change_me";

/// Configuration loaded from environment variables.
///
/// All configuration is externalized to support 12-factor app deployment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty" (default: json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// HMAC secret used to sign agent credentials
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Issuer claim of agent credentials (default: alpha-gateway)
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,

    /// Agent credential lifetime in minutes (default: 1440)
    #[serde(default = "default_agent_token_ttl")]
    pub agent_token_ttl_minutes: i64,

    /// Clock skew tolerated on credential expiry, in seconds (default: 0)
    #[serde(default)]
    pub token_leeway_seconds: i64,

    /// Classification cache TTL in seconds (default: 300)
    #[serde(default = "default_cache_ttl")]
    pub classification_cache_ttl_secs: i64,

    /// Rule/device store timeout in milliseconds (default: 2000)
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    /// UTC offset, in minutes, of the local time used by the policy window
    #[serde(default)]
    pub policy_utc_offset_minutes: i32,

    /// Browsing records kept in memory before the oldest are dropped
    #[serde(default = "default_visit_retention")]
    pub visit_retention: usize,

    /// Optional YAML file with rules and devices to load at startup
    #[serde(default)]
    pub seed_path: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_jwt_issuer() -> String {
    "alpha-gateway".to_string()
}

fn default_agent_token_ttl() -> i64 {
    1440
}

fn default_cache_ttl() -> i64 {
    300
}

fn default_store_timeout() -> u64 {
    2000
}

fn default_visit_retention() -> usize {
    100_000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are uppercase with underscore separators.
    /// Example: `JWT_SECRET`, `LOG_LEVEL`, etc.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn agent_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.agent_token_ttl_minutes)
    }

    pub fn classification_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.classification_cache_ttl_secs)
    }

    /// Offset of the policy window's local time; `None` when out of range.
    pub fn policy_offset(&self) -> Option<FixedOffset> {
        self.policy_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_jwt_issuer(),
            agent_token_ttl_minutes: default_agent_token_ttl(),
            token_leeway_seconds: 0,
            classification_cache_ttl_secs: default_cache_ttl(),
            store_timeout_ms: default_store_timeout(),
            policy_utc_offset_minutes: 0,
            visit_retention: default_visit_retention(),
            seed_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars that might interfere
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("AGENT_TOKEN_TTL_MINUTES");
        std::env::remove_var("CLASSIFICATION_CACHE_TTL_SECS");
        std::env::remove_var("VISIT_RETENTION");

        let config = Config::from_env().expect("Failed to load config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.agent_token_ttl_minutes, 1440);
        assert_eq!(config.classification_cache_ttl_secs, 300);
        assert_eq!(config.visit_retention, 100_000);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config::default();
        assert_eq!(config.store_timeout(), Duration::from_secs(2));
        assert_eq!(config.agent_token_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.classification_cache_ttl(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_policy_offset() {
        let mut config = Config::default();
        assert_eq!(config.policy_offset(), FixedOffset::east_opt(0));

        config.policy_utc_offset_minutes = -300;
        assert_eq!(config.policy_offset(), FixedOffset::west_opt(5 * 3600));

        config.policy_utc_offset_minutes = 24 * 60;
        assert!(config.policy_offset().is_none());
    }
}
