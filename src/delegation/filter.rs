//! The delegation filter: a small fixed-capacity key/weight accumulator one
//! worker writes into on behalf of another (spec §4.1).
//!
//! Grounded in `examples/original_source/src/delegation_sketch/`
//! `DelegationFilter.hpp`/`.cpp` — parallel `keys`/`counts` arrays, an atomic
//! `size`, and an insert-or-accumulate probe. The original also carries a
//! `__m128i`-based SIMD probe; this port keeps the scalar fallback the
//! original falls back to on non-x86 builds; the spec's Design Notes treat
//! the probe's correctness, not its vectorization, as the contract.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

const EMPTY_KEY: u32 = u32::MAX;

/// A fixed-capacity, single-writer accumulator of (key, weight) pairs.
///
/// Reads (`lookup`, `drain`) may run concurrently with the writer; this
/// crate never hands the same filter to two concurrent writers, but the
/// atomics keep a draining consumer's view consistent without a lock, the
/// same trade the teacher makes in `storage::lfu::count_min_sketch::Sketch`.
#[derive(Debug)]
pub struct DelegationFilter {
    capacity: usize,
    keys: Vec<AtomicU32>,
    counts: Vec<AtomicU32>,
    size: AtomicUsize,
}

impl DelegationFilter {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && capacity % 4 == 0);
        Self {
            capacity,
            keys: (0..capacity).map(|_| AtomicU32::new(EMPTY_KEY)).collect(),
            counts: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            size: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire).min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Linear probe over the occupied prefix, in blocks of four keys at a
    /// time (the original's SIMD lane width; here just a loop stride so the
    /// scan order matches its batched comparison pattern).
    fn lookup_index(&self, key: u32) -> Option<usize> {
        let n = self.len();
        let mut i = 0;
        while i < n {
            let block_end = (i + 4).min(n);
            for slot in i..block_end {
                if self.keys[slot].load(Ordering::Acquire) == key {
                    return Some(slot);
                }
            }
            i = block_end;
        }
        None
    }

    /// Adds `weight` to `key`'s running total, inserting a new slot if `key`
    /// is not already present. Returns `false` only when `key` is new and the
    /// filter has no free slot; the caller then routes the update elsewhere
    /// (spec §4.1, "direct update on saturation").
    pub fn update_or_insert_if_not_full(&self, key: u32, weight: u32) -> bool {
        if let Some(idx) = self.lookup_index(key) {
            self.counts[idx].fetch_add(weight, Ordering::AcqRel);
            return true;
        }
        let pos = self.size.fetch_add(1, Ordering::AcqRel);
        if pos >= self.capacity {
            self.size.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        self.keys[pos].store(key, Ordering::Release);
        self.counts[pos].store(weight, Ordering::Release);
        true
    }

    /// Returns the current estimate this filter holds for `key`, if present.
    pub fn lookup(&self, key: u32) -> Option<u32> {
        self.lookup_index(key)
            .map(|idx| self.counts[idx].load(Ordering::Acquire))
    }

    /// Drains every (key, weight) pair and resets the filter for reuse
    /// (spec §4.1/§4.3 double buffering: the consuming owner folds these
    /// into its sketch, then the buffer goes back into rotation).
    pub fn drain(&self) -> Vec<(u32, u32)> {
        let n = self.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let k = self.keys[i].load(Ordering::Acquire);
            if k != EMPTY_KEY {
                out.push((k, self.counts[i].load(Ordering::Acquire)));
            }
        }
        self.reset();
        out
    }

    pub fn reset(&self) {
        self.size.store(0, Ordering::Release);
        for k in &self.keys {
            k.store(EMPTY_KEY, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_until_capacity_then_refuses_new_keys() {
        let f = DelegationFilter::new(4);
        assert!(f.update_or_insert_if_not_full(1, 1));
        assert!(f.update_or_insert_if_not_full(2, 1));
        assert!(f.update_or_insert_if_not_full(3, 1));
        assert!(f.update_or_insert_if_not_full(4, 1));
        assert!(f.is_full());
        assert!(!f.update_or_insert_if_not_full(5, 1));
    }

    #[test]
    fn repeated_key_accumulates_without_consuming_capacity() {
        let f = DelegationFilter::new(4);
        for _ in 0..10 {
            assert!(f.update_or_insert_if_not_full(7, 1));
        }
        assert_eq!(f.len(), 1);
        assert_eq!(f.lookup(7), Some(10));
    }

    #[test]
    fn drain_empties_the_filter_and_reports_every_pair() {
        let f = DelegationFilter::new(4);
        f.update_or_insert_if_not_full(1, 3);
        f.update_or_insert_if_not_full(2, 5);
        let mut pairs = f.drain();
        pairs.sort();
        assert_eq!(pairs, vec![(1, 3), (2, 5)]);
        assert!(f.is_empty());
        assert!(f.update_or_insert_if_not_full(9, 1));
    }
}
