//! Owner assignment and per-destination delegation-filter routing (spec
//! §4.1), grounded in `examples/original_source/src/delegation_sketch/`
//! `DelegationHeavyHitter.hpp`'s `ThreadLocalDelegationHeavyHitter`: a double
//! buffer of filters per destination owner, swapped and handed off to that
//! owner's inbox once the active one fills.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::delegation::filter::DelegationFilter;
use crate::delegation::inbox::Inbox;
use crate::hashing::OwnerTable;

/// Where a routed key ended up.
#[derive(Debug)]
pub enum RouteOutcome {
    /// `key` belongs to this worker; the caller applies it to its own sketch.
    Local,
    /// `key` was folded into (or seeded a new slot in) `owner`'s active filter.
    Delegated { owner: usize },
    /// Both of `owner`'s buffers are currently full; `owner` hasn't drained
    /// either yet. The caller must make progress some other way (draining
    /// its own inbox, per spec §4.1/§4.3) before calling `route` again.
    Blocked { owner: usize },
}

/// One worker's delegation fabric: for every other owner, a double-buffered
/// pair of filters this worker alone writes to.
pub struct DelegationRouter {
    owner_id: usize,
    owners: OwnerTable,
    filter_capacity: usize,
    /// `buffers[dest][0..2]` — the double buffer this worker writes to `dest` with.
    buffers: Vec<[Arc<DelegationFilter>; 2]>,
    /// `active[dest]` — which of `buffers[dest]` is currently being written.
    active: Vec<AtomicUsize>,
    inboxes: Arc<Vec<Inbox>>,
}

impl DelegationRouter {
    pub fn new(
        owner_id: usize,
        num_threads: usize,
        filter_capacity: usize,
        inboxes: Arc<Vec<Inbox>>,
    ) -> Self {
        let owners = OwnerTable::new(num_threads as u32);
        let buffers = (0..num_threads)
            .map(|_| {
                [
                    Arc::new(DelegationFilter::new(filter_capacity)),
                    Arc::new(DelegationFilter::new(filter_capacity)),
                ]
            })
            .collect();
        let active = (0..num_threads).map(|_| AtomicUsize::new(0)).collect();
        Self {
            owner_id,
            owners,
            filter_capacity,
            buffers,
            active,
            inboxes,
        }
    }

    pub fn owner_of(&self, key: u32) -> usize {
        self.owners.find_owner(key) as usize
    }

    pub fn filter_capacity(&self) -> usize {
        self.filter_capacity
    }

    /// Routes `key`/`weight`. Local keys are reported back so the caller
    /// applies them to its own sketch directly, rather than paying for a
    /// delegation round trip to itself. Remote keys are folded into the
    /// destination's active filter; once that fills, the full buffer is
    /// handed off to the destination's inbox and the router swaps to the
    /// other half of the pair. A single attempt only: if the other half is
    /// also still full (`owner` hasn't drained it yet), this returns
    /// `Blocked` instead of spinning here — the caller is expected to drain
    /// its own inbox and call `route` again, per spec §4.1/§4.3, so a
    /// worker stuck delegating to a lagging owner still makes progress as
    /// an owner itself rather than looping in place.
    pub fn route(&self, key: u32, weight: u32) -> RouteOutcome {
        let owner = self.owner_of(key);
        if owner == self.owner_id {
            return RouteOutcome::Local;
        }

        let idx = self.active[owner].load(Ordering::Acquire);
        let filter = &self.buffers[owner][idx];
        if filter.update_or_insert_if_not_full(key, weight) {
            return RouteOutcome::Delegated { owner };
        }

        let next = 1 - idx;
        if self.active[owner]
            .compare_exchange(idx, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inboxes[owner].push(self.owner_id, Arc::clone(filter));
        }
        // Either this call swapped the buffer, or a racing call already
        // did; either way the fresh active buffer is the one to retry on.

        let idx = self.active[owner].load(Ordering::Acquire);
        let filter = &self.buffers[owner][idx];
        if filter.update_or_insert_if_not_full(key, weight) {
            RouteOutcome::Delegated { owner }
        } else {
            RouteOutcome::Blocked { owner }
        }
    }

    /// Forces a handoff of whichever buffer is currently active for `owner`,
    /// even if it isn't full, so a worker can flush pending delegations
    /// before shutting down (spec §4.6, "flush on stop").
    pub fn flush(&self, owner: usize) {
        if owner == self.owner_id {
            return;
        }
        let idx = self.active[owner].load(Ordering::Acquire);
        let filter = &self.buffers[owner][idx];
        if filter.is_empty() {
            return;
        }
        let next = 1 - idx;
        if self.active[owner]
            .compare_exchange(idx, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inboxes[owner].push(self.owner_id, Arc::clone(filter));
        }
    }

    pub fn flush_all(&self) {
        for owner in 0..self.buffers.len() {
            self.flush(owner);
        }
    }
}
