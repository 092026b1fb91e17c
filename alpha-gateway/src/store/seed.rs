// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Startup seeding of the in-memory store from a YAML file.

use alpha_policy_engine::policy::{Rule, RuleSetConfig, RuleSetError};
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::{Device, MemoryStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed rules: {0}")]
    Rules(#[from] RuleSetError),

    #[error("Seed rejected by store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSeed {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub hardware_address: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Seed file contents
///
/// ```yaml
/// version: "1"
/// rules:
///   - id: block-adult
///     pattern: "porn|xxx"
///     match_type: regex
///     category: C
/// devices:
///   - id: 6f1c8f9e-2f4b-4c65-9a55-5ad0f1f0c001
///     owner_id: 0b7e2d1a-6c0a-4a3c-8f0e-1d2b3c4d5e6f
///     name: kids-laptop
///     hardware_address: "AA:BB:CC:DD:EE:01"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub devices: Vec<DeviceSeed>,
}

impl SeedData {
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        let seed: SeedData = serde_yaml::from_str(yaml)?;
        RuleSetConfig {
            version: seed.version.clone().unwrap_or_else(|| "1".to_string()),
            rules: seed.rules.clone(),
        }
        .validate()?;
        Ok(seed)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load rules (in file order) and devices into `store`.
    pub async fn apply(self, store: &MemoryStore) -> Result<(), SeedError> {
        let rule_count = self.rules.len();
        let device_count = self.devices.len();

        for rule in self.rules {
            store.insert_rule(rule).await;
        }

        let registered_at = Utc::now();
        for seed in self.devices {
            store
                .insert_device(Device {
                    id: seed.id,
                    owner_id: seed.owner_id,
                    name: seed.name,
                    hardware_address: seed.hardware_address,
                    active: seed.active,
                    registered_at,
                })
                .await?;
        }

        info!(rules = rule_count, devices = device_count, "store seeded");
        Ok(())
    }
}
