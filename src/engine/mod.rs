//! The top-level parallel heavy-hitter engine (spec §4, §5): owns the
//! worker threads, the per-worker ingest channels, and the global
//! heavy-hitter view they report into.

mod lifecycle;
mod stats;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hashing::OwnerTable;
use crate::sketch::{CuckooHeavyKeeper, FrequencyEstimator};
use crate::tracker::GlobalTracker;

pub use stats::{EngineStats, WorkerStats};

/// A running pool of worker threads, each holding its own
/// [`crate::sketch::CuckooHeavyKeeper`] and delegation fabric.
pub struct Engine {
    config: EngineConfig,
    senders: Vec<Sender<(u32, u32)>>,
    run: Arc<AtomicBool>,
    handles: Vec<JoinHandle<WorkerStats>>,
    global: Arc<dyn GlobalTracker>,
    owners: OwnerTable,
    /// One handle per worker, shared with that worker's [`worker::WorkerContext`],
    /// so `query_estimate` can read a sketch directly instead of going
    /// through the threshold-gated [`GlobalTracker`].
    sketches: Vec<Arc<Mutex<CuckooHeavyKeeper>>>,
}

impl Engine {
    /// Validates `config` and spawns one worker thread per `config.num_threads`.
    pub fn build(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        lifecycle::spawn(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.senders.len()
    }

    /// Feeds `key`/`weight` into worker `source`'s stream partition. Callers
    /// choose `source` (e.g. round-robin, or by originating shard) — it need
    /// not be the key's owner; the worker routes ownership internally.
    pub fn worker_feed(&self, source: usize, key: u32, weight: u32) {
        let _ = self.senders[source].send((key, weight));
    }

    /// The current estimated count for `key`, read directly from its
    /// owning worker's sketch (spec §6: "routed to owner's sketch") rather
    /// than the [`GlobalTracker`], which only holds keys that have already
    /// cleared the publish threshold.
    pub fn query_estimate(&self, key: u32) -> u32 {
        let owner = self.owners.find_owner(key) as usize;
        self.sketches[owner].lock().estimate(key)
    }

    /// Every key whose tracked count currently meets `threshold`.
    pub fn query_heavy_hitters(&self, threshold: u32) -> Vec<(u32, u32)> {
        self.global.heavy_hitters(threshold)
    }

    /// Signals every worker to drain and exit once its stream partition and
    /// inbox are empty, then collects their final stats.
    pub fn stop(mut self) -> EngineStats {
        self.run.store(false, Ordering::Release);
        self.senders.clear();

        let mut workers = Vec::with_capacity(self.handles.len());
        for h in self.handles.drain(..) {
            match h.join() {
                Ok(s) => workers.push(s),
                Err(_) => workers.push(WorkerStats::default()),
            }
        }
        EngineStats::from_workers(workers)
    }
}
