//! Structured per-worker and engine-wide statistics (SPEC_FULL.md §10.6),
//! grounded in the original's `StatCollector.hpp` —
//! `ThreadPairWiseStatCollector` / `ThreadOverallStatCollector`: plain
//! counters summed once at shutdown rather than sampled continuously, the
//! same "counters, not a metrics pipeline" scope this crate's non-goals
//! around observability leave room for.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub owner_id: usize,
    pub received_from_stream: u64,
    pub self_updates: u64,
    /// Indexed by destination owner: records this worker delegated out.
    pub delegated_to: Vec<u64>,
    /// Indexed by source owner: records this worker absorbed from others.
    pub delegated_from: Vec<u64>,
}

impl WorkerStats {
    pub fn new(owner_id: usize, num_threads: usize) -> Self {
        Self {
            owner_id,
            received_from_stream: 0,
            self_updates: 0,
            delegated_to: vec![0; num_threads],
            delegated_from: vec![0; num_threads],
        }
    }
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub workers: Vec<WorkerStats>,
}

impl EngineStats {
    pub fn from_workers(workers: Vec<WorkerStats>) -> Self {
        Self { workers }
    }

    /// Total records ingested across every worker's stream partition.
    pub fn total_received(&self) -> u64 {
        self.workers.iter().map(|w| w.received_from_stream).sum()
    }

    /// Cross-check invariant (spec §8): every ingested record is either
    /// applied to the receiving worker's own sketch or delegated exactly
    /// once — `Σ_o delegated_to[o] == received_from_stream - self_updates`.
    pub fn accounting_is_consistent(&self) -> bool {
        self.workers.iter().all(|w| {
            let delegated_out: u64 = w.delegated_to.iter().sum();
            w.self_updates + delegated_out == w.received_from_stream
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_accounting_passes_the_cross_check() {
        let mut w = WorkerStats::new(0, 2);
        w.received_from_stream = 10;
        w.self_updates = 4;
        w.delegated_to = vec![3, 3];
        let stats = EngineStats::from_workers(vec![w]);
        assert!(stats.accounting_is_consistent());
    }

    #[test]
    fn inconsistent_accounting_fails_the_cross_check() {
        let mut w = WorkerStats::new(0, 2);
        w.received_from_stream = 10;
        w.self_updates = 4;
        w.delegated_to = vec![3, 2]; // sums to 9, not 6
        let stats = EngineStats::from_workers(vec![w]);
        assert!(!stats.accounting_is_consistent());
    }
}
