use crate::error::Result;
use crate::generator::{CounterGenerator, Generator, ZipfianGenerator};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Zipfian popularity skewed toward the most recently inserted items.
///
/// The basis counter tracks the insertion frontier. Every draw re-reads the frontier, so items
/// inserted after construction become the popular ones as soon as the frontier moves. The frontier
/// is read under the Zipfian lock, so concurrent draws see it move forward only.
#[derive(Debug)]
pub struct SkewedLatestGenerator {
    basis: Arc<CounterGenerator>,
    zipfian: ZipfianGenerator,
    last: AtomicU64,
}

impl SkewedLatestGenerator {
    pub fn new(basis: Arc<CounterGenerator>) -> Result<Self> {
        let max = basis.last();
        let zipfian = ZipfianGenerator::with_items(max)?;
        Ok(Self {
            basis,
            zipfian,
            last: AtomicU64::new(max),
        })
    }
}

impl Generator<u64> for SkewedLatestGenerator {
    fn next(&self, rng: &mut impl Rng) -> u64 {
        let (max, offset) = self.zipfian.next_with_current(|| self.basis.last(), rng);
        let v = max - offset;
        self.last.store(v, Ordering::Relaxed);
        v
    }

    fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn counter_at(last: u64) -> Arc<CounterGenerator> {
        let c = Arc::new(CounterGenerator::new(0));
        c.set(last + 1);
        c
    }

    #[test]
    fn bounded_by_frontier() {
        let mut rng = rand::rng();
        let basis = counter_at(9);
        assert_eq!(basis.last(), 9);
        let g = SkewedLatestGenerator::new(basis).unwrap();
        for _ in 0..10000 {
            let v = g.next(&mut rng);
            assert!(v <= 9);
            assert_eq!(g.last(), v);
        }
    }

    #[test]
    fn follows_moving_frontier() {
        let mut rng = rand::rng();
        let basis = counter_at(99);
        let g = SkewedLatestGenerator::new(basis.clone()).unwrap();
        basis.set(1001);
        let mut dist: HashMap<u64, u64> = HashMap::new();
        let mut beyond_old = 0;
        for _ in 0..100000 {
            let v = g.next(&mut rng);
            assert!(v <= 1000);
            if v > 99 {
                beyond_old += 1;
            }
            *dist.entry(v).or_insert(0) += 1;
        }
        // newest item is the hottest
        let (hottest, _) = dist.iter().max_by_key(|(_, c)| **c).unwrap();
        assert_eq!(*hottest, 1000);
        assert!(beyond_old > 50000);
    }

    #[test]
    fn concurrent_frontier_moves() {
        let basis = counter_at(1000);
        let g = Arc::new(SkewedLatestGenerator::new(basis.clone()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let g = g.clone();
                let basis = basis.clone();
                std::thread::spawn(move || {
                    let mut rng = rand::rng();
                    for i in 0..5000 {
                        if (i + t) % 20 == 0 {
                            let _ = basis.next(&mut rng);
                        }
                        let v = g.next(&mut rng);
                        assert!(v <= basis.last());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(basis.last(), 2000);
    }

    #[test]
    fn too_few_items() {
        assert!(SkewedLatestGenerator::new(counter_at(1)).is_err());
    }
}
