//! Shared helpers for the end-to-end scenario tests.

use std::time::Duration;

use heavykeeper::Engine;

/// Polls `engine.query_estimate(probe_key)` until it stops changing across
/// `stable_rounds` consecutive checks, or a generous deadline elapses.
/// Workers process their channels and inboxes cooperatively with no external
/// barrier, so tests snapshot the system once it has gone quiet rather than
/// assuming a fixed processing time.
pub fn wait_for_quiescence(engine: &Engine, probe_key: u32) {
    let mut last = u32::MAX;
    let mut stable_rounds = 0;
    for _ in 0..500 {
        let now = engine.query_estimate(probe_key);
        if now == last {
            stable_rounds += 1;
            if stable_rounds >= 5 {
                return;
            }
        } else {
            stable_rounds = 0;
        }
        last = now;
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// A deterministic, dependency-free approximate Zipf(alpha) sampler over
/// `1..=max_key`, using inverse-CDF sampling against the precomputed
/// harmonic normalizer. Good enough to exercise heavy-hitter detection
/// against an exact reference counter; not a statistical-quality generator.
pub struct ZipfStream {
    cumulative: Vec<f64>,
    max_key: u32,
    rng_state: u64,
}

impl ZipfStream {
    pub fn new(alpha: f64, max_key: u32, seed: u64) -> Self {
        let mut weights: Vec<f64> = (1..=max_key as u64)
            .map(|rank| 1.0 / (rank as f64).powf(alpha))
            .collect();
        let total: f64 = weights.iter().sum();
        let mut acc = 0.0;
        for w in weights.iter_mut() {
            acc += *w / total;
            *w = acc;
        }
        Self {
            cumulative: weights,
            max_key,
            rng_state: seed | 1,
        }
    }

    fn next_f64(&mut self) -> f64 {
        // xorshift64*, sufficient entropy for a test-only sampler.
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn sample(&mut self) -> u32 {
        let target = self.next_f64();
        match self.cumulative.partition_point(|&c| c < target) {
            idx if idx < self.max_key as usize => (idx + 1) as u32,
            _ => self.max_key,
        }
    }
}
