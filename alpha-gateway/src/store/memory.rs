// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use alpha_policy_engine::policy::{Category, MatchKind, Rule};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    BrowsingRecord, BrowsingStore, Device, DeviceStore, RuleSnapshot, RuleStore, StoreError,
};

/// Rule creation request from the administrative collaborator
#[derive(Debug, Clone)]
pub struct NewRule {
    pub pattern: String,
    pub match_kind: MatchKind,
    pub category: Category,
    pub reason: Option<String>,
}

/// Partial rule edit
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub pattern: Option<String>,
    pub match_kind: Option<MatchKind>,
    pub category: Option<Category>,
    pub reason: Option<String>,
    pub active: Option<bool>,
}

/// Device registration request
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub owner_id: Uuid,
    pub name: String,
    pub hardware_address: String,
}

#[derive(Default)]
struct Inner {
    /// Insertion order is the engine's tie-break order
    rules: Vec<Rule>,
    revision: u64,
    devices: HashMap<Uuid, Device>,
    visits: VecDeque<BrowsingRecord>,
}

impl Inner {
    fn hardware_address_taken(&self, address: &str, except: Option<Uuid>) -> bool {
        self.devices.values().any(|d| {
            Some(d.id) != except && d.hardware_address.eq_ignore_ascii_case(address)
        })
    }
}

/// In-process rule, device and browsing store.
///
/// Rules are never removed, only deactivated. Every rule mutation bumps the
/// revision so consumers can tell when their compiled view is outdated.
///
/// Browsing records form a bounded log: once `visit_capacity` is reached the
/// oldest record is dropped for each new one.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    visit_capacity: usize,
}

pub const DEFAULT_VISIT_CAPACITY: usize = 100_000;

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_visit_capacity(DEFAULT_VISIT_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visit_capacity(visit_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            visit_capacity: visit_capacity.max(1),
        }
    }

    // -------------------------------------------------------------------------
    // Rules
    // -------------------------------------------------------------------------

    pub async fn add_rule(&self, new: NewRule) -> Rule {
        let rule = Rule {
            id: Uuid::new_v4().to_string(),
            pattern: new.pattern,
            match_kind: new.match_kind,
            category: new.category,
            reason: new.reason,
            active: true,
        };
        self.insert_rule(rule.clone()).await;
        rule
    }

    /// Append a rule with a caller-chosen id. An existing id is replaced in place.
    pub async fn insert_rule(&self, rule: Rule) {
        let mut inner = self.inner.write().await;
        match inner.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => inner.rules.push(rule),
        }
        inner.revision += 1;
    }

    pub async fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<Rule, StoreError> {
        let mut inner = self.inner.write().await;
        let rule = inner
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("rule {}", id)))?;

        if let Some(pattern) = update.pattern {
            rule.pattern = pattern;
        }
        if let Some(match_kind) = update.match_kind {
            rule.match_kind = match_kind;
        }
        if let Some(category) = update.category {
            rule.category = category;
        }
        if update.reason.is_some() {
            rule.reason = update.reason;
        }
        if let Some(active) = update.active {
            rule.active = active;
        }

        let updated = rule.clone();
        inner.revision += 1;
        Ok(updated)
    }

    pub async fn deactivate_rule(&self, id: &str) -> Result<Rule, StoreError> {
        let rule = self
            .update_rule(
                id,
                RuleUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        info!(rule_id = %id, "rule deactivated");
        Ok(rule)
    }

    /// All rules, including inactive ones
    pub async fn all_rules(&self) -> Vec<Rule> {
        self.inner.read().await.rules.clone()
    }

    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }

    // -------------------------------------------------------------------------
    // Devices
    // -------------------------------------------------------------------------

    pub async fn register_device(&self, new: NewDevice) -> Result<Device, StoreError> {
        self.insert_device(Device {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name: new.name,
            hardware_address: new.hardware_address,
            active: true,
            registered_at: Utc::now(),
        })
        .await
    }

    /// Insert a fully specified device. Hardware addresses are unique.
    pub async fn insert_device(&self, device: Device) -> Result<Device, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.hardware_address_taken(&device.hardware_address, Some(device.id)) {
            return Err(StoreError::Conflict(format!(
                "hardware address {} already registered",
                device.hardware_address
            )));
        }
        inner.devices.insert(device.id, device.clone());
        Ok(device)
    }

    pub async fn set_device_active(&self, id: Uuid, active: bool) -> Result<Device, StoreError> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("device {}", id)))?;
        device.active = active;
        Ok(device.clone())
    }

    // -------------------------------------------------------------------------
    // Browsing
    // -------------------------------------------------------------------------

    pub async fn browsing_records(&self, device_id: Uuid) -> Vec<BrowsingRecord> {
        self.inner
            .read()
            .await
            .visits
            .iter()
            .filter(|v| v.device_id == device_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn active_rules(&self) -> Result<RuleSnapshot, StoreError> {
        let inner = self.inner.read().await;
        Ok(RuleSnapshot {
            revision: inner.revision,
            rules: inner.rules.iter().filter(|r| r.active).cloned().collect(),
        })
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn get_device(&self, id: Uuid) -> Result<Option<Device>, StoreError> {
        Ok(self.inner.read().await.devices.get(&id).cloned())
    }
}

#[async_trait]
impl BrowsingStore for MemoryStore {
    async fn record_visit(&self, record: BrowsingRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.visits.len() >= self.visit_capacity {
            inner.visits.pop_front();
        }
        inner.visits.push_back(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_rule(pattern: &str, category: Category) -> NewRule {
        NewRule {
            pattern: pattern.to_string(),
            match_kind: MatchKind::Domain,
            category,
            reason: None,
        }
    }

    fn new_device(address: &str) -> NewDevice {
        NewDevice {
            owner_id: Uuid::new_v4(),
            name: "laptop".to_string(),
            hardware_address: address.to_string(),
        }
    }

    #[tokio::test]
    async fn test_active_rules_keep_insertion_order() {
        let store = MemoryStore::new();
        let a = store.add_rule(new_rule("a.com", Category::B)).await;
        let b = store.add_rule(new_rule("b.com", Category::C)).await;
        let c = store.add_rule(new_rule("c.com", Category::A)).await;

        let snapshot = store.active_rules().await.unwrap();
        let ids: Vec<_> = snapshot.rules.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_rule_and_bumps_revision() {
        let store = MemoryStore::new();
        let rule = store.add_rule(new_rule("a.com", Category::B)).await;
        let before = store.revision().await;

        let deactivated = store.deactivate_rule(&rule.id).await.unwrap();
        assert!(!deactivated.active);
        assert!(store.revision().await > before);

        assert!(store.active_rules().await.unwrap().rules.is_empty());
        assert_eq!(store.all_rules().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_rule() {
        let store = MemoryStore::new();
        let result = store.update_rule("nope", RuleUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rule_fields() {
        let store = MemoryStore::new();
        let rule = store.add_rule(new_rule("a.com", Category::B)).await;
        let updated = store
            .update_rule(
                &rule.id,
                RuleUpdate {
                    category: Some(Category::C),
                    reason: Some("escalated".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.category, Category::C);
        assert_eq!(updated.reason.as_deref(), Some("escalated"));
        assert_eq!(updated.pattern, "a.com");
    }

    #[tokio::test]
    async fn test_hardware_address_unique() {
        let store = MemoryStore::new();
        store
            .register_device(new_device("AA:BB:CC:DD:EE:FF"))
            .await
            .unwrap();
        let duplicate = store.register_device(new_device("aa:bb:cc:dd:ee:ff")).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_device_active() {
        let store = MemoryStore::new();
        let device = store.register_device(new_device("01")).await.unwrap();
        assert!(device.active);

        store.set_device_active(device.id, false).await.unwrap();
        let fetched = store.get_device(device.id).await.unwrap().unwrap();
        assert!(!fetched.active);

        let missing = store.set_device_active(Uuid::new_v4(), true).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    fn visit(device_id: Uuid, url: &str) -> BrowsingRecord {
        BrowsingRecord {
            id: Uuid::new_v4(),
            device_id,
            url: url.to_string(),
            domain: "example.com".to_string(),
            category: "unrestricted".to_string(),
            duration_seconds: None,
            timestamp: Utc::now(),
            focus_mode_state: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_visit_log_drops_oldest_at_capacity() {
        let store = MemoryStore::with_visit_capacity(2);
        let device = Uuid::new_v4();
        for url in ["https://example.com/1", "https://example.com/2", "https://example.com/3"] {
            store.record_visit(visit(device, url)).await.unwrap();
        }

        let urls: Vec<String> = store
            .browsing_records(device)
            .await
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(urls, vec!["https://example.com/2", "https://example.com/3"]);
    }
}
