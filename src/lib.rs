//! A parallel, approximate heavy-hitter detector for integer key streams.
//!
//! The engine shards an incoming stream across worker threads, each holding
//! its own Cuckoo-Heavy-Keeper frequency sketch; keys that belong to another
//! worker are batched through a delegation filter instead of contending on a
//! shared structure on every update, and a configurable aggregation mode
//! (shared map or per-worker local view) exposes the resulting
//! heavy-hitter set to callers.

pub mod config;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod pqueue;
pub mod sketch;
pub mod tracker;

pub use config::EngineConfig;
pub use engine::{Engine, EngineStats, WorkerStats};
pub use error::{ConfigError, EngineError};
