//! Engine construction and worker thread lifecycle (spec §5): spawning one
//! thread per `config.num_threads`, optionally pinning each to a CPU core.
//! CPU pinning itself is grounded in the pack's
//! `open-telemetry-otel-arrow/.../controller/src/lib.rs` use of
//! `core_affinity` — logging a warning and continuing unpinned rather than
//! failing hard when a core can't be claimed, matching that controller's
//! choice; the owner/thread topology mirrors the original's
//! `delegation_sketch_utils::setaffinity_oncpu` call site.

use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::{AggregationMode, EngineConfig};
use crate::delegation::{DelegationRouter, Inbox};
use crate::error::EngineError;
use crate::hashing::{mix64, OwnerTable};
use crate::sketch::CuckooHeavyKeeper;
use crate::tracker::{GlobalTracker, OwnerLocalTracker, SharedMapTracker};

use super::worker::{self, WorkerContext};
use super::Engine;

pub(super) fn spawn(config: EngineConfig) -> Result<Engine, EngineError> {
    let num_threads = config.num_threads;

    let global: Arc<dyn GlobalTracker> = match config.aggregation_mode {
        AggregationMode::SharedMap => Arc::new(SharedMapTracker::new()),
        AggregationMode::OwnerLocal => {
            Arc::new(OwnerLocalTracker::new(num_threads, config.local_heap_bound))
        }
    };

    let inboxes: Arc<Vec<Inbox>> =
        Arc::new((0..num_threads).map(|_| Inbox::default()).collect());
    let run = Arc::new(AtomicBool::new(true));

    let core_ids = if config.pin_threads {
        core_affinity::get_core_ids()
    } else {
        None
    };
    if config.pin_threads && core_ids.is_none() {
        warn!("pin_threads requested but core ids are unavailable on this host; running unpinned");
    }

    let owners = OwnerTable::new(num_threads as u32);
    let mut senders = Vec::with_capacity(num_threads);
    let mut handles = Vec::with_capacity(num_threads);
    let mut sketches = Vec::with_capacity(num_threads);

    for owner_id in 0..num_threads {
        let (tx, rx) = mpsc::channel();
        senders.push(tx);

        let router = DelegationRouter::new(
            owner_id,
            num_threads,
            config.filter_capacity,
            Arc::clone(&inboxes),
        );
        let sketch = Arc::new(Mutex::new(CuckooHeavyKeeper::new(
            config.bucket_count,
            config.theta,
            config.promotion_threshold,
            config.decay_base,
            config.max_kicks,
            config.heavy_ratio,
            mix64(owner_id as u64),
        )));
        sketches.push(Arc::clone(&sketch));
        let ctx = WorkerContext {
            owner_id,
            rx,
            router,
            inboxes: Arc::clone(&inboxes),
            sketch,
            global: Arc::clone(&global),
            run: Arc::clone(&run),
            num_threads,
            theta: config.theta,
        };

        let core_ids = core_ids.clone();
        let handle = thread::Builder::new()
            .name(format!("heavykeeper-worker-{owner_id}"))
            .spawn(move || {
                if let Some(ids) = &core_ids {
                    if let Some(id) = ids.get(owner_id % ids.len()) {
                        if !core_affinity::set_for_current(*id) {
                            warn!(owner = owner_id, "failed to pin worker to a cpu core");
                        }
                    }
                }
                worker::run(ctx)
            })
            .map_err(|e| EngineError::ThreadSpawnFailed(owner_id, e.to_string()))?;
        handles.push(handle);
    }

    Ok(Engine {
        config,
        senders,
        run,
        handles,
        global,
        owners,
        sketches,
    })
}
