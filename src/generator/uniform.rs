use crate::error::{Error, Result};
use crate::generator::Generator;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Draws integers uniformly from `[lower, upper]`, both inclusive.
#[derive(Debug)]
pub struct UniformGenerator {
    lower: u64,
    upper: u64,
    last: AtomicU64,
}

impl UniformGenerator {
    pub fn new(lower: u64, upper: u64) -> Result<Self> {
        if lower > upper {
            return Err(Error::OutOfBounds {
                what: "uniform lower bound",
                value: lower,
                min: 0,
                max: upper,
            });
        }
        Ok(Self {
            lower,
            upper,
            last: AtomicU64::new(lower),
        })
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.lower, self.upper)
    }
}

impl Generator<u64> for UniformGenerator {
    fn next(&self, rng: &mut impl Rng) -> u64 {
        let v = rng.random_range(self.lower..=self.upper);
        self.last.store(v, Ordering::Relaxed);
        v
    }

    fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
