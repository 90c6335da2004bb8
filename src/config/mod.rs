//! Engine configuration.
//!
//! Mirrors the teacher's `config` module: a `serde`-derived record, loadable
//! from YAML, validated once at construction rather than at every use site.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Aggregation strategy for the global heavy-hitter view (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// A single concurrent map shared by all workers.
    SharedMap,
    /// Each worker keeps its own heavy-hitter view; queries union them.
    OwnerLocal,
}

impl Default for AggregationMode {
    fn default() -> Self {
        AggregationMode::SharedMap
    }
}

/// What the (optional) evaluator thread spends its time measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    Throughput,
    Latency,
    Accuracy,
}

impl Default for EvaluationMode {
    fn default() -> Self {
        EvaluationMode::Throughput
    }
}

/// Top-level engine configuration (the "enumerated record" of spec §6).
///
/// Every field has a sensible default so a config loaded from a partial YAML
/// document (or built with `..Default::default()`) still validates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads (T in the spec).
    pub num_threads: usize,
    /// Heavy-hitter threshold fraction θ.
    pub theta: f64,
    /// Capacity C of each delegation filter.
    pub filter_capacity: usize,
    /// Bucket count B per CHK table (must be a power of two).
    pub bucket_count: usize,
    /// Lobby promotion threshold P.
    pub promotion_threshold: u32,
    /// Exponential decay base b.
    pub decay_base: f64,
    /// Maximum kick-out chain depth D.
    pub max_kicks: usize,
    /// Fraction of θ·N a kicked entry must retain to survive a kick (spec §4.2.2, default 0.8).
    pub heavy_ratio: f64,
    /// Bound K on each worker's local heavy-hitter heap.
    pub local_heap_bound: usize,
    pub aggregation_mode: AggregationMode,
    pub evaluation_mode: EvaluationMode,
    /// Pin worker threads to CPU cores 2..T+1 (disabled by default so tests
    /// and CI containers without enough cores still run).
    pub pin_threads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            theta: 0.01,
            filter_capacity: 16,
            bucket_count: 1024,
            promotion_threshold: 16,
            decay_base: 1.08,
            max_kicks: 10,
            heavy_ratio: 0.8,
            local_heap_bound: 1024,
            aggregation_mode: AggregationMode::SharedMap,
            evaluation_mode: EvaluationMode::Throughput,
            pin_threads: false,
        }
    }
}

impl EngineConfig {
    /// Loads a config from a YAML file, filling unspecified fields with defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_yaml::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates every invariant from spec §7's "Configuration errors" taxonomy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.bucket_count == 0 || (self.bucket_count & (self.bucket_count - 1)) != 0 {
            return Err(ConfigError::BucketCountNotPowerOfTwo(self.bucket_count));
        }
        if !(0.0..1.0).contains(&self.theta) {
            return Err(ConfigError::InvalidTheta(self.theta));
        }
        if self.filter_capacity == 0 || self.filter_capacity % 4 != 0 {
            return Err(ConfigError::FilterCapacityNotMultipleOfFour(
                self.filter_capacity,
            ));
        }
        if self.promotion_threshold == 0 {
            return Err(ConfigError::ZeroPromotionThreshold);
        }
        if self.decay_base <= 1.0 {
            return Err(ConfigError::InvalidDecayBase(self.decay_base));
        }
        if self.max_kicks == 0 {
            return Err(ConfigError::ZeroMaxKicks);
        }
        if !(0.0..=1.0).contains(&self.heavy_ratio) || self.heavy_ratio == 0.0 {
            return Err(ConfigError::InvalidHeavyRatio(self.heavy_ratio));
        }
        Ok(())
    }
}
