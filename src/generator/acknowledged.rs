use crate::generator::{CounterGenerator, Generator};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The insertion frontier: the highest key number below which every number is known inserted.
///
/// Numbers can be acknowledged in any order. The frontier only moves over a contiguous run of
/// acknowledged numbers, so a number that is still in flight (or whose insert failed) holds back
/// every number above it.
#[derive(Debug)]
pub struct AcknowledgedCounterGenerator {
    limit: Arc<CounterGenerator>,
    /// Acknowledged numbers above the frontier, waiting for the gap below them to close.
    pending: Mutex<BTreeSet<u64>>,
}

impl AcknowledgedCounterGenerator {
    /// Every number below `start` counts as acknowledged.
    pub fn new(start: u64) -> Self {
        Self {
            limit: Arc::new(CounterGenerator::new(start)),
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    /// A counter whose `last` follows the frontier, for generators that skew toward it.
    pub fn basis(&self) -> Arc<CounterGenerator> {
        self.limit.clone()
    }

    /// Mark `value` as inserted. Numbers at or below the frontier are ignored.
    pub fn acknowledge(&self, value: u64) {
        let mut pending = self.pending.lock();
        let mut next = self.limit.last().wrapping_add(1);
        if value < next {
            return;
        }
        pending.insert(value);
        while pending.remove(&next) {
            next += 1;
        }
        // only writer, the lock is held
        self.limit.set(next);
    }

    /// The frontier itself.
    pub fn last(&self) -> u64 {
        self.limit.last()
    }

    /// Number of acknowledgements waiting for a gap to close.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}
