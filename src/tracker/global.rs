//! Global heavy-hitter aggregation (spec §4.4): either one concurrent map
//! every worker writes into directly, or a per-worker local view unioned on
//! query, selected by [`crate::config::AggregationMode`] — mirroring the
//! teacher's sharded-vs-global trade-off (`storage::lfu::tiny_lfu`'s sharded
//! admitter vs. a single shared `dashmap` elsewhere in the cache).
//!
//! Both implementations track a running `stream_size` (the sum of every
//! weight any worker has ever applied), so the engine can gate publishing
//! behind a dynamic `stream_size * theta` local threshold the way the
//! original's `add_if_heavy` does, rather than pushing every single update
//! into the shared structure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::tracker::local::LocalTracker;

/// The engine's view into "what the heavy hitters currently are", kept
/// current as workers report estimates from their sketches.
pub trait GlobalTracker: Send + Sync {
    /// Accumulates `weight` into the running total of all weight ever
    /// ingested, independent of whether the reporting key clears the
    /// publish threshold.
    fn add_weight(&self, weight: u32);

    /// The running total of all weight ever ingested (spec §4.4's `stream_size`).
    fn stream_size(&self) -> u64;

    /// Reports that `owner`'s sketch now estimates `key`'s count as `count`.
    fn record(&self, owner: usize, key: u32, count: u32);

    /// Every key whose tracked count is at least `threshold`.
    fn heavy_hitters(&self, threshold: u32) -> Vec<(u32, u32)>;

    /// The tracked count for `key`, or 0 if it isn't currently tracked.
    fn estimate(&self, key: u32) -> u32;
}

/// `AggregationMode::SharedMap`: one `DashMap<key, count>` every worker
/// writes into as its own sketch promotes or updates an entry.
pub struct SharedMapTracker {
    map: DashMap<u32, u32>,
    stream_size: AtomicU64,
}

impl SharedMapTracker {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            stream_size: AtomicU64::new(0),
        }
    }
}

impl Default for SharedMapTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalTracker for SharedMapTracker {
    fn add_weight(&self, weight: u32) {
        self.stream_size.fetch_add(weight as u64, Ordering::AcqRel);
    }

    fn stream_size(&self) -> u64 {
        self.stream_size.load(Ordering::Acquire)
    }

    fn record(&self, _owner: usize, key: u32, count: u32) {
        self.map
            .entry(key)
            .and_modify(|v| *v = count.max(*v))
            .or_insert(count);
    }

    fn heavy_hitters(&self, threshold: u32) -> Vec<(u32, u32)> {
        self.map
            .iter()
            .filter(|e| *e.value() >= threshold)
            .map(|e| (*e.key(), *e.value()))
            .collect()
    }

    fn estimate(&self, key: u32) -> u32 {
        self.map.get(&key).map(|v| *v).unwrap_or(0)
    }
}

/// `AggregationMode::OwnerLocal`: each worker's [`LocalTracker`] is the
/// source of truth for its own keys; a query takes a short lock per worker
/// and unions the results, trading query latency for zero cross-thread
/// writes on the hot update path.
pub struct OwnerLocalTracker {
    locals: Vec<Mutex<LocalTracker>>,
    stream_size: AtomicU64,
}

impl OwnerLocalTracker {
    pub fn new(num_threads: usize, local_heap_bound: usize) -> Self {
        Self {
            locals: (0..num_threads)
                .map(|_| Mutex::new(LocalTracker::new(local_heap_bound)))
                .collect(),
            stream_size: AtomicU64::new(0),
        }
    }

    pub fn local(&self, owner: usize) -> &Mutex<LocalTracker> {
        &self.locals[owner]
    }
}

impl GlobalTracker for OwnerLocalTracker {
    fn add_weight(&self, weight: u32) {
        self.stream_size.fetch_add(weight as u64, Ordering::AcqRel);
    }

    fn stream_size(&self) -> u64 {
        self.stream_size.load(Ordering::Acquire)
    }

    fn record(&self, owner: usize, key: u32, count: u32) {
        self.locals[owner].lock().observe(key, count);
    }

    fn heavy_hitters(&self, threshold: u32) -> Vec<(u32, u32)> {
        let mut merged: HashMap<u32, u32> = HashMap::new();
        for local in &self.locals {
            for (key, count) in local.lock().entries() {
                merged
                    .entry(key)
                    .and_modify(|v| *v = count.max(*v))
                    .or_insert(count);
            }
        }
        merged.into_iter().filter(|&(_, c)| c >= threshold).collect()
    }

    fn estimate(&self, key: u32) -> u32 {
        self.locals
            .iter()
            .filter_map(|l| l.lock().weight_of(key))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_map_tracker_keeps_the_max_reported_count() {
        let t = SharedMapTracker::new();
        t.record(0, 1, 5);
        t.record(1, 1, 3); // a smaller, stale report must not clobber the larger one
        assert_eq!(t.estimate(1), 5);
    }

    #[test]
    fn shared_map_tracker_filters_by_threshold() {
        let t = SharedMapTracker::new();
        t.record(0, 1, 10);
        t.record(0, 2, 2);
        let hh = t.heavy_hitters(5);
        assert_eq!(hh, vec![(1, 10)]);
    }

    #[test]
    fn shared_map_tracker_accumulates_stream_size_independent_of_record() {
        let t = SharedMapTracker::new();
        t.add_weight(3);
        t.add_weight(4);
        assert_eq!(t.stream_size(), 7);
    }

    #[test]
    fn owner_local_tracker_unions_across_workers() {
        let t = OwnerLocalTracker::new(2, 4);
        t.record(0, 1, 10);
        t.record(1, 2, 20);
        let mut hh = t.heavy_hitters(1);
        hh.sort();
        assert_eq!(hh, vec![(1, 10), (2, 20)]);
    }

    #[test]
    fn owner_local_tracker_estimate_takes_the_max_across_workers() {
        let t = OwnerLocalTracker::new(2, 4);
        t.record(0, 7, 3);
        t.record(1, 7, 9);
        assert_eq!(t.estimate(7), 9);
    }
}
