//! Per-owner inbox of full delegation filters handed off by other workers
//! (spec §4.6), grounded in the teacher's `storage::map::queue::Queue` —
//! generalized here from a bounded ring buffer to an unbounded deque behind
//! a single short-held lock, since a delegation fabric has no natural upper
//! bound on in-flight handoffs between a flush cycle and the next drain.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::delegation::filter::DelegationFilter;

#[derive(Default)]
pub struct Inbox {
    queue: Mutex<VecDeque<(usize, Arc<DelegationFilter>)>>,
}

impl Inbox {
    pub fn push(&self, source: usize, filter: Arc<DelegationFilter>) {
        self.queue.lock().push_back((source, filter));
    }

    pub fn pop(&self) -> Option<(usize, Arc<DelegationFilter>)> {
        self.queue.lock().pop_front()
    }

    /// Drains every filter currently queued, for a worker's per-cycle sweep
    /// (spec §4.3: ingest, then drain inbox, then publish deltas).
    pub fn drain_all(&self) -> Vec<(usize, Arc<DelegationFilter>)> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
