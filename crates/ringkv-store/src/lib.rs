//! Per-node in-memory data tier: a primary map plus `R-1` replica maps,
//! keyed by replica level.
//!
//! The store knows nothing about the ring or cluster membership; it
//! exposes the bulk primitives (`extract_range`, `extract_replica`,
//! `promote_replica_to_primary`) the Coordinator needs to move data
//! during a rebalance (spec §4.2).
//!
//! Each tier is individually concurrent-safe (`DashMap`, generalizing the
//! teacher's "migrate `Arc<RwLock<HashMap>>` to `DashMap` for low lock
//! contention" guidance — see `harborgrid-justin-rusty-db`'s
//! `common::concurrent_map` notes — to a multi-tier store). Bulk
//! operations are atomic per-key but not atomic across the whole
//! operation: a concurrent put can race with an in-flight extraction.
//! That's acceptable per spec §5 because the rebalance flag keeps client
//! writes rejected for the whole window a bulk operation runs in.

use dashmap::DashMap;
use ringkv_core::hash::hash_bytes;
use std::collections::HashMap;

pub type Key = Vec<u8>;
pub type Value = Vec<u8>;

/// The per-node data tier: one primary map, `R-1` replica maps.
pub struct LocalStore {
    primary: DashMap<Key, Value>,
    /// `replicas[i]` holds replica level `i + 1`; level 0 is reserved and
    /// never materialised — primary is its logical equivalent (spec §3).
    replicas: Vec<DashMap<Key, Value>>,
}

impl LocalStore {
    /// Allocates a store with `replication_factor - 1` replica tiers
    /// (levels `1..=replication_factor-1`), each starting empty.
    pub fn new(replication_factor: usize) -> Self {
        let levels = replication_factor.saturating_sub(1);
        Self {
            primary: DashMap::new(),
            replicas: (0..levels).map(|_| DashMap::new()).collect(),
        }
    }

    fn replica_index(&self, level: usize) -> Option<usize> {
        if level == 0 {
            return None;
        }
        let idx = level - 1;
        if idx < self.replicas.len() {
            Some(idx)
        } else {
            None
        }
    }

    // --- Primary tier -----------------------------------------------

    pub fn put_primary(&self, key: Key, value: Value) {
        self.primary.insert(key, value);
    }

    pub fn get_primary(&self, key: &[u8]) -> Option<Value> {
        self.primary.get(key).map(|entry| entry.value().clone())
    }

    /// Removes `key` from the primary tier; returns whether it existed.
    pub fn delete_primary(&self, key: &[u8]) -> bool {
        self.primary.remove(key).is_some()
    }

    pub fn put_all_primary(&self, data: HashMap<Key, Value>) {
        for (k, v) in data {
            self.primary.insert(k, v);
        }
    }

    /// Snapshot of the whole primary tier (used by `GET /api/data/primary`
    /// and by the "inherit from predecessor" rebalance step).
    pub fn snapshot_primary(&self) -> HashMap<Key, Value> {
        self.primary
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    // --- Replica tiers -------------------------------------------------

    /// Writes to an unallocated level are silently dropped (logged at
    /// warn) per spec §7's `InvalidReplicaLevel`.
    pub fn put_replica(&self, level: usize, key: Key, value: Value) {
        match self.replica_index(level) {
            Some(idx) => {
                self.replicas[idx].insert(key, value);
            }
            None => {
                tracing::warn!(level, "put to unallocated replica level dropped");
            }
        }
    }

    pub fn get_replica(&self, level: usize, key: &[u8]) -> Option<Value> {
        self.replica_index(level)
            .and_then(|idx| self.replicas[idx].get(key).map(|e| e.value().clone()))
    }

    /// Delete on an unallocated level returns `false`.
    pub fn delete_replica(&self, level: usize, key: &[u8]) -> bool {
        match self.replica_index(level) {
            Some(idx) => self.replicas[idx].remove(key).is_some(),
            None => false,
        }
    }

    /// Merges `data` into the replica tier at `level` in one call.
    pub fn put_bulk_replica(&self, level: usize, data: HashMap<Key, Value>) {
        match self.replica_index(level) {
            Some(idx) => {
                for (k, v) in data {
                    self.replicas[idx].insert(k, v);
                }
            }
            None => {
                tracing::warn!(level, "bulk put to unallocated replica level dropped");
            }
        }
    }

    pub fn replica_len(&self, level: usize) -> usize {
        self.replica_index(level)
            .map(|idx| self.replicas[idx].len())
            .unwrap_or(0)
    }

    /// Number of allocated replica tiers (`R - 1`). Levels `1..=replica_tier_count()`
    /// are valid; anything outside that is silently dropped by the put/delete
    /// operations above.
    pub fn replica_tier_count(&self) -> usize {
        self.replicas.len()
    }

    /// Non-destructive snapshot of the replica tier at `level`, for
    /// introspection endpoints (`GET /api/data/all`) that must not drain
    /// the tier the way `extract_replica` does.
    pub fn snapshot_replica(&self, level: usize) -> HashMap<Key, Value> {
        match self.replica_index(level) {
            Some(idx) => self.replicas[idx]
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            None => HashMap::new(),
        }
    }

    // --- Bulk rebalance primitives --------------------------------------

    /// Scans the primary tier; for every key whose hash falls within the
    /// inclusive interval `[lo, hi]` (wrapping if `lo > hi`: the range is
    /// `[lo, MAX] ∪ [0, hi]`), removes it from primary and returns it.
    ///
    /// Atomic per key; keys are collected before any removal so the
    /// iteration never holds a shard lock while that same shard is
    /// mutated (DashMap's sharded locks would otherwise risk a
    /// self-deadlock on a single-threaded caller).
    pub fn extract_range(&self, lo: u32, hi: u32) -> HashMap<Key, Value> {
        let in_range = |h: u32| if lo <= hi { h >= lo && h <= hi } else { h >= lo || h <= hi };

        let matching: Vec<Key> = self
            .primary
            .iter()
            .filter(|e| in_range(hash_bytes(e.key())))
            .map(|e| e.key().clone())
            .collect();

        let mut out = HashMap::with_capacity(matching.len());
        for k in matching {
            if let Some((k, v)) = self.primary.remove(&k) {
                out.insert(k, v);
            }
        }
        out
    }

    /// Drains the entire replica tier at `level` and returns its contents.
    pub fn extract_replica(&self, level: usize) -> HashMap<Key, Value> {
        let Some(idx) = self.replica_index(level) else {
            return HashMap::new();
        };
        let map = &self.replicas[idx];
        let keys: Vec<Key> = map.iter().map(|e| e.key().clone()).collect();
        let mut out = HashMap::with_capacity(keys.len());
        for k in keys {
            if let Some((k, v)) = map.remove(&k) {
                out.insert(k, v);
            }
        }
        out
    }

    /// Snapshots the replica tier at `level`, merges it into primary
    /// (primary values win on conflict only if already present;
    /// otherwise the replica value is written), clears the replica tier,
    /// and returns the snapshot.
    ///
    /// Calling this twice in a row returns an empty map the second time
    /// — the tier was already drained (spec §8, invariant 6).
    pub fn promote_replica_to_primary(&self, level: usize) -> HashMap<Key, Value> {
        let snapshot = self.extract_replica(level);
        for (k, v) in &snapshot {
            self.primary.entry(k.clone()).or_insert_with(|| v.clone());
        }
        snapshot
    }
}
