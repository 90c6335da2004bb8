//! Crate-level error types.
//!
//! Following the teacher's convention, each module boundary that can fail
//! defines its own `thiserror` enum rather than routing everything through
//! `anyhow`; `anyhow` is reserved for the demo binary's glue code.

use thiserror::Error;

/// Errors raised while validating an [`crate::config::EngineConfig`] or building an
/// [`crate::engine::Engine`] from one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("num_threads must be > 0")]
    ZeroThreads,

    #[error("bucket_count ({0}) must be a power of two")]
    BucketCountNotPowerOfTwo(usize),

    #[error("theta ({0}) must be in [0, 1)")]
    InvalidTheta(f64),

    #[error("filter_capacity ({0}) must be a positive multiple of 4")]
    FilterCapacityNotMultipleOfFour(usize),

    #[error("promotion_threshold must be > 0")]
    ZeroPromotionThreshold,

    #[error("decay_base ({0}) must be > 1.0")]
    InvalidDecayBase(f64),

    #[error("max_kicks must be > 0")]
    ZeroMaxKicks,

    #[error("heavy_ratio ({0}) must be in (0, 1]")]
    InvalidHeavyRatio(f64),
}

/// Errors raised by the engine's lifecycle operations (`build`, `stop`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker {0} failed to pin to a cpu core")]
    AffinityUnavailable(usize),

    #[error("failed to spawn worker thread {0}: {1}")]
    ThreadSpawnFailed(usize, String),

    #[error("worker thread {0} panicked: {1}")]
    WorkerPanicked(usize, String),
}
