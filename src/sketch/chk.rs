//! Cuckoo-Heavy-Keeper: the per-worker frequency estimator (spec §4.2).
//!
//! Grounded directly on `examples/original_source/src/frequency_estimator/`
//! `CuckooHeavyKeeper.hpp`/`.cpp`: two cuckoo tables of three-slot buckets
//! (slot 0 is the "lobby", slots 1-2 are "heavy"), a precomputed decay
//! expectation table driving probabilistic lobby decay, and a promotion /
//! bounded-kickout pipeline between the two tables.
//!
//! A sketch is owned and mutated by exactly one worker thread; it carries no
//! internal synchronization. Cross-thread sharing (the `OwnerLocal`
//! aggregation mode's read path) wraps a sketch in `parking_lot::Mutex`, the
//! same "short critical section, no atomics inside" pattern the teacher uses
//! for `storage::map::shard::Shard`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hashing::{alt_index, fingerprint_and_index, hash_key};

const ENTRIES_PER_BUCKET: usize = 3;
const LOBBY_SLOT: usize = 0;
const HEAVY_SLOTS: [usize; 2] = [1, 2];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Entry {
    fingerprint: u16,
    counter: u32,
}

impl Entry {
    #[inline]
    fn is_empty(&self) -> bool {
        self.counter == 0
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    entries: [Entry; ENTRIES_PER_BUCKET],
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            entries: [Entry::default(); ENTRIES_PER_BUCKET],
        }
    }
}

impl Bucket {
    /// Index (within `HEAVY_SLOTS`) of the heavy slot with the smaller counter,
    /// ties broken toward the first slot (mirrors `_get_smallest_heavy_entry`).
    #[inline]
    fn smallest_heavy(&self) -> usize {
        if self.entries[HEAVY_SLOTS[0]].counter <= self.entries[HEAVY_SLOTS[1]].counter {
            HEAVY_SLOTS[0]
        } else {
            HEAVY_SLOTS[1]
        }
    }

    #[inline]
    fn first_empty_heavy(&self) -> Option<usize> {
        HEAVY_SLOTS.into_iter().find(|&s| self.entries[s].is_empty())
    }
}

/// Per-worker, single-writer Cuckoo-Heavy-Keeper sketch.
#[derive(Debug)]
pub struct CuckooHeavyKeeper {
    tables: [Vec<Bucket>; 2],
    bucket_count: usize,
    promotion_threshold: u32,
    decay_base: f64,
    max_kicks: usize,
    heavy_ratio: f64,
    theta: f64,
    /// `decay_expectations[k] = sum_{i=1}^{k} decay_base^i`, binary-searched
    /// by `decay_counter` when a lobby occupant absorbs weight > 1.
    decay_expectations: Vec<f64>,
    seed: u64,
    total: u64,
    rng: StdRng,
}

impl CuckooHeavyKeeper {
    pub fn new(
        bucket_count: usize,
        theta: f64,
        promotion_threshold: u32,
        decay_base: f64,
        max_kicks: usize,
        heavy_ratio: f64,
        seed: u64,
    ) -> Self {
        debug_assert!(bucket_count.is_power_of_two());
        debug_assert!(promotion_threshold > 0);

        let mut decay_expectations = vec![0.0f64; promotion_threshold as usize + 1];
        for i in 1..=promotion_threshold as usize {
            decay_expectations[i] = decay_expectations[i - 1] + decay_base.powi(i as i32);
        }

        Self {
            tables: [
                vec![Bucket::default(); bucket_count],
                vec![Bucket::default(); bucket_count],
            ],
            bucket_count,
            promotion_threshold,
            decay_base,
            max_kicks,
            heavy_ratio,
            theta,
            decay_expectations,
            seed,
            total: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// A slot's occupant survives a kickout only while it still looks like a
    /// heavy hitter relative to the stream seen so far (spec §4.2.2: `count
    /// >= total * theta * heavy_ratio`).
    #[inline]
    fn is_heavy_hitter(&self, count: u32) -> bool {
        (count as f64) >= (self.total as f64) * self.theta * self.heavy_ratio
    }

    pub fn estimate(&self, key: u32) -> u32 {
        let h = hash_key(key, self.seed);
        let (fp, i1) = fingerprint_and_index(h, self.bucket_count);
        let i2 = alt_index(fp, i1, self.bucket_count);

        let mut best = 0u32;
        for &(t, idx) in &[(0usize, i1), (1usize, i2)] {
            let bucket = &self.tables[t][idx];
            for entry in &bucket.entries {
                if entry.fingerprint == fp && !entry.is_empty() {
                    best = best.max(entry.counter);
                }
            }
        }
        best
    }

    pub fn update_and_estimate(&mut self, key: u32, w: u32) -> u32 {
        if w == 0 {
            return self.estimate(key);
        }
        self.total += w as u64;

        let h = hash_key(key, self.seed);
        let (fp, i1) = fingerprint_and_index(h, self.bucket_count);
        let i2 = alt_index(fp, i1, self.bucket_count);
        let candidates = [(0usize, i1), (1usize, i2)];

        if let Some(result) = self.check_and_update_heavy(fp, w, &candidates) {
            return result;
        }
        if let Some(result) = self.check_and_update_lobby(fp, w, &candidates) {
            return result;
        }
        self.insert_into_lobby(fp, w, &candidates)
    }

    /// Scans both tables' heavy slots for a fingerprint match, adding `w` in
    /// place; if absent but an empty heavy slot exists, seeds it directly.
    fn check_and_update_heavy(
        &mut self,
        fp: u16,
        w: u32,
        candidates: &[(usize, usize); 2],
    ) -> Option<u32> {
        let mut first_empty: Option<(usize, usize, usize)> = None;

        for &(t, idx) in candidates {
            let bucket = &self.tables[t][idx];
            for &slot in &HEAVY_SLOTS {
                let entry = bucket.entries[slot];
                if !entry.is_empty() && entry.fingerprint == fp {
                    let new_counter = entry.counter + w;
                    self.tables[t][idx].entries[slot].counter = new_counter;
                    return Some(new_counter);
                }
                if entry.is_empty() && first_empty.is_none() {
                    first_empty = Some((t, idx, slot));
                }
            }
        }

        first_empty.map(|(t, idx, slot)| {
            self.tables[t][idx].entries[slot] = Entry {
                fingerprint: fp,
                counter: w,
            };
            w
        })
    }

    /// Scans both tables' lobby slots for a fingerprint match; on a match,
    /// adds `w` and, once the lobby reaches the promotion threshold, attempts
    /// to promote it into the smaller of the two heavy slots.
    fn check_and_update_lobby(
        &mut self,
        fp: u16,
        w: u32,
        candidates: &[(usize, usize); 2],
    ) -> Option<u32> {
        for &(t, idx) in candidates {
            let lobby = self.tables[t][idx].entries[LOBBY_SLOT];
            if lobby.is_empty() || lobby.fingerprint != fp {
                continue;
            }
            let new_counter = lobby.counter + w;
            self.tables[t][idx].entries[LOBBY_SLOT].counter = new_counter;

            if new_counter >= self.promotion_threshold {
                return Some(self.try_promote(t, idx));
            }
            return Some(new_counter);
        }
        None
    }

    /// No existing entry matched; place (or decay-and-maybe-replace) the
    /// lobby occupant of whichever candidate bucket the fingerprint prefers.
    fn insert_into_lobby(&mut self, fp: u16, w: u32, candidates: &[(usize, usize); 2]) -> u32 {
        let (t, idx) = if self.tables[candidates[0].0][candidates[0].1].entries[LOBBY_SLOT]
            .is_empty()
        {
            candidates[0]
        } else if self.tables[candidates[1].0][candidates[1].1].entries[LOBBY_SLOT].is_empty() {
            candidates[1]
        } else if fp & 1 == 0 {
            candidates[0]
        } else {
            candidates[1]
        };

        let lobby = self.tables[t][idx].entries[LOBBY_SLOT];
        if lobby.is_empty() {
            self.tables[t][idx].entries[LOBBY_SLOT] = Entry {
                fingerprint: fp,
                counter: w,
            };
            return w;
        }

        let old_counter = lobby.counter;
        let new_count = self.decay_counter(old_counter, w);
        let new_entry = if new_count == 0 {
            let absorbed = self.decay_expectations[old_counter as usize];
            let remaining = ((w as f64) - absorbed).max(0.0) as u32;
            Entry {
                fingerprint: fp,
                counter: remaining,
            }
        } else {
            Entry {
                fingerprint: lobby.fingerprint,
                counter: new_count,
            }
        };
        self.tables[t][idx].entries[LOBBY_SLOT] = new_entry;

        if new_entry.counter >= self.promotion_threshold {
            return self.try_promote(t, idx);
        }
        new_entry.counter
    }

    /// Probabilistic decay of a lobby occupant absorbing weight `w`, per
    /// spec §4.2.1 / `CuckooHeavyKeeper::_decay_counter`: a single-weight
    /// update decays by at most one via `decay_base^-current`; heavier
    /// updates binary-search the precomputed expectation table.
    fn decay_counter(&mut self, current: u32, w: u32) -> u32 {
        if current == 0 {
            return 0;
        }
        if w == 1 {
            let decay_prob = self.decay_base.powf(-(current as f64));
            if self.rng.gen::<f64>() < decay_prob {
                current - 1
            } else {
                current
            }
        } else {
            let de_current = self.decay_expectations[current as usize];
            if (w as f64) >= de_current {
                return 0;
            }
            let (mut lo, mut hi) = (0usize, current as usize);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if self.decay_expectations[mid] + (w as f64) >= de_current {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            lo as u32
        }
    }

    /// Attempts to swap the bucket's lobby into its smaller heavy slot,
    /// kicking the displaced heavy occupant to its alternate table on
    /// success. Returns the resulting counter at `(t, idx)`'s smallest heavy
    /// slot (if promoted) or the capped lobby counter (if not).
    fn try_promote(&mut self, t: usize, idx: usize) -> u32 {
        let smallest = self.tables[t][idx].smallest_heavy();
        let target = self.tables[t][idx].entries[smallest];
        let lobby = self.tables[t][idx].entries[LOBBY_SLOT];

        let promote = if target.is_empty() {
            true
        } else if target.counter > lobby.counter {
            let prob = (lobby.counter - self.promotion_threshold) as f64
                / (target.counter - self.promotion_threshold) as f64;
            self.rng.gen::<f64>() < prob
        } else {
            true
        };

        if !promote {
            self.tables[t][idx].entries[LOBBY_SLOT].counter = self.promotion_threshold;
            return self.promotion_threshold;
        }

        let kicked = target;
        self.tables[t][idx].entries[smallest] = lobby;
        self.tables[t][idx].entries[LOBBY_SLOT] = Entry::default();

        if !kicked.is_empty() {
            self.do_kickout(kicked, t, idx);
        }
        self.tables[t][idx].entries[smallest].counter
    }

    /// Bounded kickout chain across alternate tables (spec §4.2.2), capped at
    /// `max_kicks`; an entry that no longer looks like a heavy hitter is
    /// dropped rather than propagated further.
    fn do_kickout(&mut self, mut kicked: Entry, mut table_idx: usize, mut idx: usize) {
        for _ in 0..self.max_kicks {
            if !self.is_heavy_hitter(kicked.counter) {
                return;
            }
            table_idx = 1 - table_idx;
            idx = alt_index(kicked.fingerprint, idx, self.bucket_count);

            let bucket = &mut self.tables[table_idx][idx];
            let smallest = bucket.smallest_heavy();
            if let Some(empty_slot) = bucket.first_empty_heavy() {
                bucket.entries[empty_slot] = kicked;
                return;
            }
            let displaced = bucket.entries[smallest];
            bucket.entries[smallest] = kicked;
            kicked = displaced;
        }
    }
}
