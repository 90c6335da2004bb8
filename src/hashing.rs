//! Hashing and owner assignment.
//!
//! The 64-bit mixer follows the SplitMix64 finisher already used by the
//! teacher's `storage::lfu::helper::mix64` (there, to decorrelate the four
//! Count-Min probe indices; here, to turn a 32-bit key plus a per-sketch seed
//! into a Bob-style 64-bit hash per spec §4.2).

use xxhash_rust::xxh3::xxh3_64_with_seed;

const ALT_INDEX_MULTIPLIER: u64 = 0x5bd1_e995;

/// Produces well-diffused pseudo-independent values from a single 64-bit seed.
/// SplitMix64 mixing function (public-domain; Steele et al.), reused verbatim
/// from the teacher's admission-control helpers.
#[inline]
pub fn mix64(x: u64) -> u64 {
    const SPLITMIX64_INCREMENT: u64 = 0x9E37_79B9_7F4A_7C15;
    const SPLITMIX64_MUL1: u64 = 0xBF58_476D_1CE4_E5B9;
    const SPLITMIX64_MUL2: u64 = 0x94D0_49BB_1331_11EB;

    let mut x = x.wrapping_add(SPLITMIX64_INCREMENT);
    x = (x ^ (x >> 30)).wrapping_mul(SPLITMIX64_MUL1);
    x = (x ^ (x >> 27)).wrapping_mul(SPLITMIX64_MUL2);
    x ^ (x >> 31)
}

/// Returns the smallest power-of-two >= x (reused from the teacher's
/// `storage::lfu::helper::next_pow2`).
pub fn next_pow2(x: usize) -> usize {
    if x <= 1 {
        return 1;
    }
    let mut x = x - 1;
    x |= x >> 1;
    x |= x >> 2;
    x |= x >> 4;
    x |= x >> 8;
    x |= x >> 16;
    #[cfg(target_pointer_width = "64")]
    {
        x |= x >> 32;
    }
    x + 1
}

/// A worker-private 64-bit hash of a key, seeded so that distinct workers'
/// CHK sketches don't share adversarial fingerprint collisions.
#[inline]
pub fn hash_key(key: u32, seed: u64) -> u64 {
    xxh3_64_with_seed(&key.to_le_bytes(), seed)
}

/// Derives (fingerprint, primary bucket index) from a 64-bit hash, per spec §4.2:
/// `fp = low 16 bits`, `i1 = (h >> 32) mod bucket_count`.
#[inline]
pub fn fingerprint_and_index(h: u64, bucket_count: usize) -> (u16, usize) {
    debug_assert!(bucket_count.is_power_of_two());
    let fp = (h & 0xFFFF) as u16;
    let mask = (bucket_count - 1) as u64;
    let i1 = ((h >> 32) & mask) as usize;
    (fp, i1)
}

/// Derives the alternate bucket index from a fingerprint and an index, per
/// spec §4.2: `i2 = (i1 XOR (0x5bd1e995 * fp)) mod bucket_count`.
#[inline]
pub fn alt_index(fp: u16, idx: usize, bucket_count: usize) -> usize {
    let mask = (bucket_count - 1) as u64;
    let mixed = (fp as u64).wrapping_mul(ALT_INDEX_MULTIPLIER);
    ((idx as u64 ^ mixed) & mask) as usize
}

/// A precomputed 512-entry owner table, speeding up `key mod num_threads`
/// for the common case where `num_threads` divides 512 (spec §4.1).
///
/// The table only ever stores `i % num_threads` at slot `i`, so looking it
/// up with `key & 511` gives `(key % 512) % num_threads`, which equals the
/// true `key % num_threads` only when `num_threads` divides 512 evenly — for
/// any other thread count the low 9 bits of `key` aren't enough information.
/// The table is therefore only built (and only ever consulted) in that
/// case; every other thread count falls back to direct modulo.
#[derive(Debug, Clone)]
pub struct OwnerTable {
    num_threads: u32,
    table: Option<Box<[u32; 512]>>,
}

impl OwnerTable {
    pub fn new(num_threads: u32) -> Self {
        debug_assert!(num_threads > 0);
        let table = if num_threads <= 512 && 512 % num_threads == 0 {
            let mut t = Box::new([0u32; 512]);
            let mut c = 0u32;
            for slot in t.iter_mut() {
                *slot = c;
                c += 1;
                c %= num_threads;
            }
            Some(t)
        } else {
            None
        };
        Self { num_threads, table }
    }

    /// `find_owner(key) = key mod num_threads`, using the precomputed table
    /// when `num_threads` divides 512 evenly, direct modulo otherwise.
    #[inline]
    pub fn find_owner(&self, key: u32) -> u32 {
        match &self.table {
            Some(t) => t[(key & 511) as usize],
            None => key % self.num_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix64_is_deterministic_and_disperses() {
        assert_eq!(mix64(42), mix64(42));
        assert_ne!(mix64(42), mix64(43));
    }

    #[test]
    fn next_pow2_rounds_up() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(2), 2);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(1000), 1024);
    }

    #[test]
    fn owner_table_matches_modulo_for_small_thread_counts() {
        let table = OwnerTable::new(4);
        for key in 0u32..10_000 {
            assert_eq!(table.find_owner(key), key % 4);
        }
    }

    #[test]
    fn owner_table_falls_back_to_modulo_above_512_threads() {
        let table = OwnerTable::new(600);
        for key in 0u32..5_000 {
            assert_eq!(table.find_owner(key), key % 600);
        }
    }

    #[test]
    fn owner_table_falls_back_to_modulo_when_thread_count_does_not_divide_512() {
        // 6 does not divide 512, so the precomputed table would silently
        // diverge from true modulo for keys whose low 9 bits differ from
        // their full value (e.g. key=512: (512 & 511) % 6 == 0 != 512 % 6 == 2).
        let table = OwnerTable::new(6);
        for key in 0u32..5_000 {
            assert_eq!(table.find_owner(key), key % 6);
        }
    }

    #[test]
    fn alt_index_is_involutive_given_same_fingerprint() {
        let bucket_count = 1024;
        let h = hash_key(12345, 7);
        let (fp, i1) = fingerprint_and_index(h, bucket_count);
        let i2 = alt_index(fp, i1, bucket_count);
        let back = alt_index(fp, i2, bucket_count);
        assert_eq!(back, i1);
    }
}
