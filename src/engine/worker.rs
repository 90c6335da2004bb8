//! A single worker's cooperative loop (spec §4.3): drain the incoming
//! stream partition, apply local keys directly and route remote ones,
//! then drain the inbox of filters other workers have handed off and fold
//! their deltas into the local sketch. Grounded in the original's
//! `ThreadLocalDelegationHeavyHitter::process_pending_inserts` /
//! `process_pending_queries` loop shape.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::delegation::{DelegationRouter, Inbox, RouteOutcome};
use crate::sketch::{CuckooHeavyKeeper, FrequencyEstimator};
use crate::tracker::GlobalTracker;

use super::stats::WorkerStats;

pub struct WorkerContext {
    pub owner_id: usize,
    pub rx: Receiver<(u32, u32)>,
    pub router: DelegationRouter,
    pub inboxes: Arc<Vec<Inbox>>,
    /// Shared with [`super::Engine`] so `query_estimate` can read this
    /// worker's sketch directly (briefly held, per spec §4.2/§4.4) rather
    /// than through the threshold-gated global tracker.
    pub sketch: Arc<Mutex<CuckooHeavyKeeper>>,
    pub global: Arc<dyn GlobalTracker>,
    pub run: Arc<AtomicBool>,
    pub num_threads: usize,
    pub theta: f64,
}

impl WorkerContext {
    fn own_inbox(&self) -> &Inbox {
        &self.inboxes[self.owner_id]
    }
}

pub fn run(mut ctx: WorkerContext) -> WorkerStats {
    let mut stats = WorkerStats::new(ctx.owner_id, ctx.num_threads);

    loop {
        let mut did_work = false;
        let mut stream_closed = false;

        match ctx.rx.try_recv() {
            Ok((key, weight)) => {
                did_work = true;
                stats.received_from_stream += 1;
                apply(&mut ctx, &mut stats, key, weight);
            }
            Err(TryRecvError::Disconnected) => stream_closed = true,
            Err(TryRecvError::Empty) => {}
        }

        if drain_inbox(&mut ctx, &mut stats) {
            did_work = true;
        }

        if !did_work {
            let stopping = stream_closed || !ctx.run.load(Ordering::Acquire);
            if stopping && ctx.own_inbox().is_empty() {
                break;
            }
            std::hint::spin_loop();
            std::thread::yield_now();
        }
    }

    ctx.router.flush_all();
    drain_inbox(&mut ctx, &mut stats);
    trace!(owner = ctx.owner_id, ?stats, "worker exiting");
    stats
}

fn apply(ctx: &mut WorkerContext, stats: &mut WorkerStats, key: u32, weight: u32) {
    loop {
        match ctx.router.route(key, weight) {
            RouteOutcome::Local => {
                stats.self_updates += 1;
                let count = ctx.sketch.lock().update_and_estimate(key, weight);
                publish(ctx, key, weight, count);
                return;
            }
            RouteOutcome::Delegated { owner } => {
                stats.delegated_to[owner] += 1;
                return;
            }
            RouteOutcome::Blocked { .. } => {
                // The destination hasn't drained either buffer yet. Rather
                // than spin in place, drain our own inbox so any worker
                // delegating to us still makes progress, then retry.
                drain_inbox(ctx, stats);
                std::hint::spin_loop();
                std::thread::yield_now();
            }
        }
    }
}

fn drain_inbox(ctx: &mut WorkerContext, stats: &mut WorkerStats) -> bool {
    let handed_off = ctx.own_inbox().drain_all();
    if handed_off.is_empty() {
        return false;
    }
    for (source, filter) in handed_off {
        let pairs = filter.drain();
        stats.delegated_from[source] += pairs.len() as u64;
        for (key, weight) in pairs {
            let count = ctx.sketch.lock().update_and_estimate(key, weight);
            publish(ctx, key, weight, count);
        }
    }
    true
}

/// Mirrors `add_if_heavy`: always folds `weight` into the running stream
/// size, but only pushes the estimate into the global view once it clears
/// the dynamic `stream_size * theta` local threshold — avoids flooding the
/// shared structure with cold keys on every single update.
fn publish(ctx: &WorkerContext, key: u32, weight: u32, count: u32) {
    ctx.global.add_weight(weight);
    let local_threshold = (ctx.global.stream_size() as f64 * ctx.theta) as u32;
    if count >= local_threshold {
        ctx.global.record(ctx.owner_id, key, count);
    }
}
