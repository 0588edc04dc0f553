//! Value generators that drive a workload.
//!
//! A generator is a stateful sequence producer: [`Generator::next`] advances and returns a new
//! value, [`Generator::last`] returns the most recent one without advancing. Calling `last` before
//! the first `next` is a precondition violation.
//!
//! ## Concurrency
//!
//! A single workload instance is shared by every worker thread, so every generator here is
//! `Send + Sync` and synchronizes its own state:
//!
//! - [`CounterGenerator`] uses an atomic counter.
//! - [`AcknowledgedCounterGenerator`] keeps out-of-order acknowledgements behind a mutex.
//! - [`ZipfianGenerator`] (and the generators built on it) keep all mutable state behind one
//!   mutex, so draws from a shared instance are serialized.
//! - [`ConstGenerator`], [`UniformGenerator`] and [`DiscreteGenerator`] are immutable after
//!   construction, apart from the last drawn value.
//!
//! Randomness is not part of a generator's state: the caller passes its own RNG to `next`. Each
//! worker owns an independently seeded RNG while all of them still draw from one global
//! distribution (one Zipfian zeta, one insertion frontier).

use rand::Rng;

/// A stateful sequence producer.
pub trait Generator<T> {
    /// Advance and return the next value.
    fn next(&self, rng: &mut impl Rng) -> T;

    /// The value returned by the most recent call to [`Generator::next`].
    fn last(&self) -> T;
}

const FNV_OFFSET_BASIS_64: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME_64: u64 = 1_099_511_628_211;

/// FNV-1a over the eight little-endian bytes of `value`.
pub fn fnv_hash64(value: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS_64;
    let mut v = value;
    for _ in 0..8 {
        let octet = v & 0xff;
        v >>= 8;
        hash ^= octet;
        hash = hash.wrapping_mul(FNV_PRIME_64);
    }
    hash
}

/// A string of `len` printable ASCII characters (33..=126), each drawn independently.
pub fn random_printable(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.random_range(33u8..=126)))
        .collect()
}

mod acknowledged;
mod constant;
mod counter;
mod discrete;
mod latest;
mod uniform;
mod zipfian;

pub use acknowledged::AcknowledgedCounterGenerator;
pub use constant::ConstGenerator;
pub use counter::CounterGenerator;
pub use discrete::DiscreteGenerator;
pub use latest::SkewedLatestGenerator;
pub use uniform::UniformGenerator;
pub use zipfian::{ScrambledZipfianGenerator, ZipfianGenerator, ZIPFIAN_CONSTANT};

use std::sync::Arc;

/// A numeric generator for one role in a workload (field length, key chooser, scan length...).
///
/// The set of numeric generators is closed, so a role holds one of these variants directly
/// instead of a boxed trait object.
#[derive(Debug)]
pub enum NumberGenerator {
    Const(ConstGenerator),
    Counter(Arc<CounterGenerator>),
    Uniform(UniformGenerator),
    Zipfian(ZipfianGenerator),
    ScrambledZipfian(ScrambledZipfianGenerator),
    SkewedLatest(SkewedLatestGenerator),
}

impl Generator<u64> for NumberGenerator {
    fn next(&self, rng: &mut impl Rng) -> u64 {
        match self {
            NumberGenerator::Const(g) => g.next(rng),
            NumberGenerator::Counter(g) => g.next(rng),
            NumberGenerator::Uniform(g) => g.next(rng),
            NumberGenerator::Zipfian(g) => g.next(rng),
            NumberGenerator::ScrambledZipfian(g) => g.next(rng),
            NumberGenerator::SkewedLatest(g) => g.next(rng),
        }
    }

    fn last(&self) -> u64 {
        match self {
            NumberGenerator::Const(g) => g.last(),
            NumberGenerator::Counter(g) => g.last(),
            NumberGenerator::Uniform(g) => g.last(),
            NumberGenerator::Zipfian(g) => g.last(),
            NumberGenerator::ScrambledZipfian(g) => g.last(),
            NumberGenerator::SkewedLatest(g) => g.last(),
        }
    }
}
