use crate::generator::Generator;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces increasing integers starting from a seed: `seed, seed + 1, ...`.
///
/// [`Generator::next`] is a single atomic increment, so a counter can be shared by any number of
/// threads. [`Generator::last`] is a plain load: while other threads call `next`, it is only a
/// watermark, not an exact count.
#[derive(Debug)]
pub struct CounterGenerator(AtomicU64);

impl CounterGenerator {
    pub fn new(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }

    /// Rewrite the counter; the next call to `next` returns `value`.
    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Release);
    }
}

impl Generator<u64> for CounterGenerator {
    fn next(&self, _rng: &mut impl Rng) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel)
    }

    fn last(&self) -> u64 {
        self.0.load(Ordering::Acquire).wrapping_sub(1)
    }
}
