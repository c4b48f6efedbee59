// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Locals cache, in-flight harvest tracking, and the dedup set (§3, §4.C).
//!
//! All three are owned by the Debugger Session and guarded by a lock here
//! rather than relying on the source's single-threaded-cooperative
//! assumption (§9 design note: "every shared structure must be guarded by a
//! mutex" once the target has true parallelism, which tokio does).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use aivory_core::{CapturedValue, StackFrame};
use tokio::sync::{Mutex, Notify};

pub const CACHE_CAPACITY: usize = 100;
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(5);
pub const DEDUP_CAPACITY: usize = 100;

/// A harvest handed to a caller: the cache's bookkeeping fields stripped.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub locals: BTreeMap<String, CapturedValue>,
    pub stack_trace: Vec<StackFrame>,
}

struct CachedHarvest {
    harvest: Harvest,
    created_at: u128,
}

fn now_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// The bounded, age-evicting locals cache, keyed by stack key.
#[derive(Default)]
struct LocalsCacheInner {
    order: VecDeque<String>,
    entries: HashMap<String, CachedHarvest>,
}

impl LocalsCacheInner {
    fn prune_expired(&mut self) {
        let cutoff = now_ms().saturating_sub(CACHE_MAX_AGE.as_millis());
        while let Some(oldest_key) = self.order.front() {
            let expired = self.entries.get(oldest_key).map(|e| e.created_at < cutoff).unwrap_or(true);
            if !expired {
                break;
            }
            let key = self.order.pop_front().unwrap_or_default();
            self.entries.remove(&key);
        }
    }

    fn insert(&mut self, key: String, harvest: Harvest) {
        if self.entries.len() >= CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key.clone(), CachedHarvest { harvest, created_at: now_ms() });
        self.order.push_back(key);
    }

    fn consume(&mut self, key: &str) -> Option<Harvest> {
        self.prune_expired();
        let cached = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(cached.harvest)
    }
}

struct PendingEntry {
    notify: Arc<Notify>,
}

/// Coordinates the Variable Harvester (writer) and the Exception Pipeline
/// (reader) across the two correlation maps.
pub struct LocalsCache {
    cache: Mutex<LocalsCacheInner>,
    pending: Mutex<HashMap<String, PendingEntry>>,
}

impl LocalsCache {
    pub fn new() -> Self {
        Self { cache: Mutex::new(LocalsCacheInner::default()), pending: Mutex::new(HashMap::new()) }
    }

    /// Register a pending harvest under `key` before the (possibly slow)
    /// property walk begins, so a concurrent reader can wait on it.
    pub async fn begin_pending(&self, key: &str) {
        let mut pending = self.pending.lock().await;
        pending.entry(key.to_owned()).or_insert_with(|| PendingEntry { notify: Arc::new(Notify::new()) });
    }

    /// Store the completed harvest and wake anyone waiting on `begin_pending`.
    pub async fn complete(&self, key: &str, harvest: Harvest) {
        self.cache.lock().await.insert(key.to_owned(), harvest);
        if let Some(entry) = self.pending.lock().await.remove(key) {
            entry.notify.notify_waiters();
        }
    }

    /// Drop a pending registration without ever completing it (harvest
    /// errored before producing a result).
    pub async fn abandon_pending(&self, key: &str) {
        self.pending.lock().await.remove(key);
    }

    /// `locals_for_stack_key` (§9 capture-source capability): if cached,
    /// consume it; if in flight, wait up to `timeout`; otherwise `None`.
    pub async fn locals_for_stack_key(&self, key: &str, timeout: Duration) -> Option<Harvest> {
        if let Some(harvest) = self.cache.lock().await.consume(key) {
            return Some(harvest);
        }
        let notify = {
            let pending = self.pending.lock().await;
            pending.get(key).map(|e| e.notify.clone())
        };
        let Some(notify) = notify else {
            // `complete` may have raced us between the two locks above,
            // moving the harvest into `cache` and clearing `pending` before we
            // looked for it. Check `cache` once more before giving up.
            return self.cache.lock().await.consume(key);
        };
        let _ = tokio::time::timeout(timeout, notify.notified()).await;
        self.cache.lock().await.consume(key)
    }
}

impl Default for LocalsCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded, FIFO-evicting set of dedup fingerprints already emitted via the
/// debugger path.
#[derive(Default)]
pub struct DedupSet {
    order: VecDeque<String>,
    members: HashMap<String, ()>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fingerprint: String) {
        if self.members.contains_key(&fingerprint) {
            return;
        }
        if self.members.len() >= DEDUP_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(fingerprint.clone(), ());
        self.order.push_back(fingerprint);
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.members.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
