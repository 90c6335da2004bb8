//! Per-worker frequency estimators.

mod chk;

pub use chk::CuckooHeavyKeeper;

/// Capability interface a frequency estimator must expose to the engine
/// (spec §9, "Template-per-estimator dispatch"). `CuckooHeavyKeeper` is the
/// only implementation this crate requires; the trait exists so an
/// alternative estimator (Count-Min, Space-Saving — out of scope here) could
/// be plugged in without touching the delegation/tracker code.
pub trait FrequencyEstimator: Send {
    /// Applies weight `w` to `key`, without returning the resulting estimate.
    fn update(&mut self, key: u32, w: u32);

    /// Returns the current estimate for `key`. Never exceeds the true count.
    fn estimate(&self, key: u32) -> u32;

    /// Applies weight `w` to `key` and returns the resulting estimate in one call.
    fn update_and_estimate(&mut self, key: u32, w: u32) -> u32;

    /// Total weight ever applied to this sketch.
    fn total(&self) -> u64;
}

impl FrequencyEstimator for CuckooHeavyKeeper {
    fn update(&mut self, key: u32, w: u32) {
        self.update_and_estimate(key, w);
    }

    fn estimate(&self, key: u32) -> u32 {
        CuckooHeavyKeeper::estimate(self, key)
    }

    fn update_and_estimate(&mut self, key: u32, w: u32) -> u32 {
        CuckooHeavyKeeper::update_and_estimate(self, key, w)
    }

    fn total(&self) -> u64 {
        self.total()
    }
}
