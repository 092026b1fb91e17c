// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Classification Cache
//!
//! Memoizes decisions per `(principal, url)` with a fixed TTL. Entries are
//! never invalidated by rule changes, only by time.

use alpha_policy_engine::policy::Decision;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::clock::{Clock, SystemClock};

pub const DEFAULT_TTL_SECONDS: i64 = 300;

// =============================================================================
// Keys and entries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub principal: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(principal: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    decision: Decision,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now >= self.cached_at + ttl
    }
}

// =============================================================================
// Classification Cache
// =============================================================================

/// Thread-safe TTL cache of classification decisions.
pub struct ClassificationCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ClassificationCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached decision, unless absent or expired.
    pub fn get(&self, key: &CacheKey) -> Option<Decision> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .map(|entry| entry.decision.clone())
    }

    pub fn put(&self, key: CacheKey, decision: Decision) {
        let entry = CacheEntry {
            decision,
            cached_at: self.clock.now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, entry);
    }

    /// Return the cached decision or compute, store and return a fresh one.
    ///
    /// Concurrent misses for the same key may both compute; the last write wins.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Decision
    where
        F: FnOnce() -> Decision,
    {
        if let Some(decision) = self.get(&key) {
            return decision;
        }
        let decision = compute();
        self.put(key, decision.clone());
        decision
    }

    /// Fallible async variant of [`Self::get_or_compute`]. Errors are not cached.
    pub async fn get_or_try_compute<F, Fut, E>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Decision, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Decision, E>>,
    {
        if let Some(decision) = self.get(&key) {
            return Ok(decision);
        }
        let decision = compute().await?;
        self.put(key, decision.clone());
        Ok(decision)
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let total = entries.len();
        let expired = entries
            .values()
            .filter(|e| e.is_expired(now, self.ttl))
            .count();

        CacheStats {
            total,
            valid: total - expired,
            expired,
        }
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECONDS), Arc::new(SystemClock))
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

// =============================================================================
// Tests
// =============================================================================
