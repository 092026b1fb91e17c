// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Persistence contracts consumed by the gateway.
//!
//! The gateway only depends on the traits below; [`MemoryStore`] is the
//! in-process implementation used by the server binary and tests.

use alpha_policy_engine::policy::Rule;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod seed;

pub use memory::{MemoryStore, NewDevice, NewRule, RuleUpdate};
pub use seed::{SeedData, SeedError};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Models
// =============================================================================

/// A registered endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub hardware_address: String,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

/// One visit reported by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowsingRecord {
    pub id: Uuid,
    pub device_id: Uuid,
    pub url: String,
    pub domain: String,
    pub category: String,
    pub duration_seconds: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub focus_mode_state: Option<bool>,
    pub metadata: Option<serde_json::Value>,
}

/// Active rules in stable store order, tagged with the store revision
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    pub revision: u64,
    pub rules: Vec<Rule>,
}

// =============================================================================
// Traits
// =============================================================================

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All currently active rules, in insertion order
    async fn active_rules(&self) -> Result<RuleSnapshot, StoreError>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn get_device(&self, id: Uuid) -> Result<Option<Device>, StoreError>;
}

#[async_trait]
pub trait BrowsingStore: Send + Sync {
    async fn record_visit(&self, record: BrowsingRecord) -> Result<(), StoreError>;
}
