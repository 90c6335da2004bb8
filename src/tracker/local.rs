//! A worker's local view of its own heavy hitters (spec §4.4), grounded in
//! `examples/original_source/src/delegation_sketch/DelegationHeavyHitter.hpp`'s
//! `LocalHeavyHitterTracker`: a bounded min-heap of currently-tracked keys
//! plus a floor (`threshold`) an untracked key must clear to be worth
//! admitting.

use crate::pqueue::IndexedPriorityQueue;

pub struct LocalTracker {
    heap: IndexedPriorityQueue,
    threshold: u32,
}

impl LocalTracker {
    pub fn new(bound: usize) -> Self {
        Self {
            heap: IndexedPriorityQueue::with_bound(bound),
            threshold: 0,
        }
    }

    /// Folds a (key, estimate) observation into the local top-K view —
    /// mirrors `add_if_is_local_heavy_hitter`: an already-tracked key always
    /// updates in place; a new key only enters while there's room, or once
    /// it clears the current floor.
    pub fn observe(&mut self, key: u32, estimate: u32) {
        let floor = self.heap.peek_min().map(|(_, w)| w).unwrap_or(0);
        if self.heap.contains(key) || !self.heap.is_full() || estimate > floor {
            self.heap.push(key, estimate);
        }
        self.update_threshold();
    }

    /// Mirrors `update_threshold`: zero while the view still has room, the
    /// current minimum tracked weight once it's full.
    fn update_threshold(&mut self) {
        self.threshold = if self.heap.is_full() {
            self.heap.peek_min().map(|(_, w)| w).unwrap_or(0)
        } else {
            0
        };
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn entries(&self) -> Vec<(u32, u32)> {
        self.heap.iter().collect()
    }

    pub fn weight_of(&self, key: u32) -> Option<u32> {
        self.heap.weight_of(key)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
