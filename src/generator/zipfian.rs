//! Zipfian-distributed integers.
//!
//! The algorithm is from "Quickly Generating Billion-Record Synthetic Databases", Jim Gray et al.,
//! SIGMOD 1994. Item `base` is the most popular, `base + 1` the second most popular, and so on.
//!
//! Construction computes `zeta(n) = sum(1 / i^theta)` for `i` in `1..=n`, which is linear in the
//! number of items and can take a while for hundreds of millions of items. When a draw asks for a
//! larger item count than the one zeta was computed for, zeta is extended incrementally from where
//! it left off. A smaller item count forces a full recomputation.

use crate::error::{Error, Result};
use crate::generator::{fnv_hash64, Generator};
use parking_lot::Mutex;
use rand::Rng;

/// The default skew constant.
pub const ZIPFIAN_CONSTANT: f64 = 0.99;

/// Exclusive upper bound of the supported item count.
const MAX_NUM_ITEMS: u64 = 1 << 40;

#[derive(Debug)]
struct ZipfianState {
    zeta_n: f64,
    /// The item count `zeta_n` was computed for.
    n_for_zeta: u64,
    eta: f64,
    last: u64,
}

/// Zipfian integers over `[min, max]`, with the popular items clustered at `min`.
#[derive(Debug)]
pub struct ZipfianGenerator {
    num_items: u64,
    base: u64,
    theta: f64,
    alpha: f64,
    zeta2: f64,
    state: Mutex<ZipfianState>,
}

fn zeta(last_num: u64, cur_num: u64, theta: f64, last_zeta: f64) -> f64 {
    let mut sum = last_zeta;
    for i in (last_num + 1)..=cur_num {
        sum += 1.0 / (i as f64).powf(theta);
    }
    sum
}

fn eta(num: u64, theta: f64, zeta2: f64, zeta_n: f64) -> f64 {
    (1.0 - (2.0 / num as f64).powf(1.0 - theta)) / (1.0 - zeta2 / zeta_n)
}

fn check_items(num_items: u64) -> Result<()> {
    if num_items < 2 || num_items >= MAX_NUM_ITEMS {
        return Err(Error::OutOfBounds {
            what: "zipfian item count",
            value: num_items,
            min: 2,
            max: MAX_NUM_ITEMS - 1,
        });
    }
    Ok(())
}

impl ZipfianGenerator {
    /// Items in `[min, max]` with the default constant.
    pub fn new(min: u64, max: u64) -> Result<Self> {
        Self::with_constant(min, max, ZIPFIAN_CONSTANT)
    }

    /// Items in `[0, num_items - 1]` with the default constant.
    pub fn with_items(num_items: u64) -> Result<Self> {
        check_items(num_items)?;
        Self::new(0, num_items - 1)
    }

    pub fn with_constant(min: u64, max: u64, theta: f64) -> Result<Self> {
        let num_items = max.checked_sub(min).map_or(0, |d| d.saturating_add(1));
        check_items(num_items)?;
        let zeta2 = zeta(0, 2, theta, 0.0);
        let alpha = 1.0 / (1.0 - theta);
        let zeta_n = zeta(0, num_items, theta, 0.0);
        let state = ZipfianState {
            zeta_n,
            n_for_zeta: num_items,
            eta: eta(num_items, theta, zeta2, zeta_n),
            last: min,
        };
        Ok(Self {
            num_items,
            base: min,
            theta,
            alpha,
            zeta2,
            state: Mutex::new(state),
        })
    }

    pub fn num_items(&self) -> u64 {
        self.num_items
    }

    /// Draw from a universe of `num` items starting at the base. `num` may differ from the
    /// construction-time count; zeta is adjusted before drawing.
    pub fn next_with(&self, num: u64, rng: &mut impl Rng) -> u64 {
        let mut s = self.state.lock();
        self.draw(&mut s, num, rng)
    }

    /// Like [`ZipfianGenerator::next_with`], but the item count is read by `num` while the state
    /// is locked, and returned along with the draw. A count that only grows, read this way, only
    /// ever extends zeta and never forces a recomputation.
    pub fn next_with_current(&self, num: impl FnOnce() -> u64, rng: &mut impl Rng) -> (u64, u64) {
        let mut s = self.state.lock();
        let num = num();
        (num, self.draw(&mut s, num, rng))
    }

    fn draw(&self, s: &mut ZipfianState, num: u64, rng: &mut impl Rng) -> u64 {
        debug_assert!(num >= 2 && num < MAX_NUM_ITEMS);
        if num > s.n_for_zeta {
            s.zeta_n = zeta(s.n_for_zeta, num, self.theta, s.zeta_n);
            s.n_for_zeta = num;
            s.eta = eta(num, self.theta, self.zeta2, s.zeta_n);
        } else if num < s.n_for_zeta {
            s.zeta_n = zeta(0, num, self.theta, 0.0);
            s.n_for_zeta = num;
            s.eta = eta(num, self.theta, self.zeta2, s.zeta_n);
        }

        let u = rng.random::<f64>();
        let uz = u * s.zeta_n;

        let v = if uz < 1.0 {
            self.base
        } else if uz < 1.0 + 0.5f64.powf(self.theta) {
            self.base + 1
        } else {
            let offset = (num as f64 * (s.eta * u - s.eta + 1.0).powf(self.alpha)) as u64;
            self.base + offset.min(num - 1)
        };
        s.last = v;
        v
    }
}

impl Generator<u64> for ZipfianGenerator {
    fn next(&self, rng: &mut impl Rng) -> u64 {
        self.next_with(self.num_items, rng)
    }

    fn last(&self) -> u64 {
        self.state.lock().last
    }
}

/// Zipfian popularity, but with the popular items scattered over the item space.
///
/// The rank drawn by an inner [`ZipfianGenerator`] is hashed into `[min, max]`, so the skew is
/// the same while the hottest items are no longer the lowest-numbered ones.
#[derive(Debug)]
pub struct ScrambledZipfianGenerator {
    base: u64,
    num_items: u64,
    inner: ZipfianGenerator,
}

impl ScrambledZipfianGenerator {
    pub fn new(min: u64, max: u64) -> Result<Self> {
        let num_items = max.checked_sub(min).map_or(0, |d| d.saturating_add(1));
        let inner = ZipfianGenerator::with_items(num_items)?;
        Ok(Self {
            base: min,
            num_items,
            inner,
        })
    }

    pub fn with_items(num_items: u64) -> Result<Self> {
        check_items(num_items)?;
        Self::new(0, num_items - 1)
    }

    fn scramble(&self, value: u64) -> u64 {
        self.base + fnv_hash64(value) % self.num_items
    }
}

impl Generator<u64> for ScrambledZipfianGenerator {
    fn next(&self, rng: &mut impl Rng) -> u64 {
        self.scramble(self.inner.next(rng))
    }

    fn last(&self) -> u64 {
        self.scramble(self.inner.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn frequencies(g: &impl Generator<u64>, n: usize) -> HashMap<u64, u64> {
        let mut rng = SmallRng::seed_from_u64(1994);
        let mut dist: HashMap<u64, u64> = HashMap::new();
        for _ in 0..n {
            *dist.entry(g.next(&mut rng)).or_insert(0) += 1;
        }
        dist
    }

    fn most_popular(dist: &HashMap<u64, u64>) -> u64 {
        let (v, _) = dist.iter().max_by_key(|(_, c)| **c).unwrap();
        *v
    }

    #[test]
    fn stays_in_range() {
        let mut rng = rand::rng();
        for (lo, hi) in [(0, 1), (0, 2), (10, 50), (100, 200)] {
            let g = ZipfianGenerator::new(lo, hi).unwrap();
            for _ in 0..10000 {
                let v = g.next(&mut rng);
                assert!(v >= lo && v <= hi, "{} not in [{}, {}]", v, lo, hi);
                assert_eq!(g.last(), v);
            }
        }
    }

    #[test]
    fn head_is_most_popular() {
        let g = ZipfianGenerator::with_items(1000).unwrap();
        let dist = frequencies(&g, 200000);
        let head = dist[&0];
        for (v, c) in dist.iter() {
            if *v != 0 {
                assert!(head > *c, "item {} drawn {} times, head {}", v, c, head);
            }
        }
        // rank 1 beats rank 10 beats rank 100
        assert!(dist[&1] > dist[&10]);
        assert!(dist[&10] > dist.get(&100).copied().unwrap_or(0));
    }

    #[test]
    fn skew_roughly_follows_theta() {
        let g = ZipfianGenerator::with_items(100).unwrap();
        let dist = frequencies(&g, 500000);
        // p(0) / p(1) should be close to 2^0.99
        let ratio = dist[&0] as f64 / dist[&1] as f64;
        assert!(ratio > 1.8 && ratio < 2.2, "ratio {}", ratio);
    }

    #[test]
    fn bounds() {
        assert!(ZipfianGenerator::with_items(0).is_err());
        assert!(ZipfianGenerator::with_items(1).is_err());
        assert!(ZipfianGenerator::with_items(2).is_ok());
        assert!(ZipfianGenerator::new(5, 4).is_err());
        assert!(matches!(
            ZipfianGenerator::with_items(MAX_NUM_ITEMS),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn grow_and_shrink_universe() {
        let mut rng = SmallRng::seed_from_u64(3);
        let g = ZipfianGenerator::with_items(10).unwrap();
        for _ in 0..1000 {
            assert!(g.next_with(1000, &mut rng) < 1000);
        }
        let grown = g.state.lock().zeta_n;
        assert_eq!(g.state.lock().n_for_zeta, 1000);
        assert!((grown - zeta(0, 1000, ZIPFIAN_CONSTANT, 0.0)).abs() < 1e-9);
        for _ in 0..1000 {
            assert!(g.next_with(20, &mut rng) < 20);
        }
        let shrunk = g.state.lock().zeta_n;
        assert!((shrunk - zeta(0, 20, ZIPFIAN_CONSTANT, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn count_read_under_lock() {
        let mut rng = SmallRng::seed_from_u64(5);
        let g = ZipfianGenerator::with_items(10).unwrap();
        let mut count = 10;
        for _ in 0..100 {
            count += 7;
            let (num, v) = g.next_with_current(|| count, &mut rng);
            assert_eq!(num, count);
            assert!(v < num);
            assert_eq!(g.state.lock().n_for_zeta, count);
        }
        let full = zeta(0, count, ZIPFIAN_CONSTANT, 0.0);
        assert!((g.state.lock().zeta_n - full).abs() < 1e-9);
    }

    #[test]
    fn incremental_zeta_matches_full() {
        let partial = zeta(0, 500, ZIPFIAN_CONSTANT, 0.0);
        let extended = zeta(500, 2000, ZIPFIAN_CONSTANT, partial);
        let full = zeta(0, 2000, ZIPFIAN_CONSTANT, 0.0);
        assert!((extended - full).abs() < 1e-9);
    }

    #[test]
    fn scrambled_stays_in_range() {
        let mut rng = rand::rng();
        let g = ScrambledZipfianGenerator::with_items(123).unwrap();
        for _ in 0..10000 {
            let v = g.next(&mut rng);
            assert!(v <= 122);
            assert_eq!(g.last(), v);
        }
        let g = ScrambledZipfianGenerator::new(100, 200).unwrap();
        for _ in 0..10000 {
            let v = g.next(&mut rng);
            assert!(v >= 100 && v <= 200);
        }
    }

    #[test]
    fn scrambled_head_is_not_clustered() {
        let g = ScrambledZipfianGenerator::with_items(123).unwrap();
        let dist = frequencies(&g, 200000);
        let hottest = most_popular(&dist);
        assert_eq!(hottest, fnv_hash64(0) % 123);
        assert_ne!(hottest, 0);
        // still skewed: the hottest item is far above the uniform share
        assert!(dist[&hottest] > 3 * 200000 / 123);
    }
}
