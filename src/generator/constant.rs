use crate::generator::Generator;
use rand::Rng;

/// Always returns the same value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstGenerator(u64);

impl ConstGenerator {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl Generator<u64> for ConstGenerator {
    fn next(&self, _rng: &mut impl Rng) -> u64 {
        self.0
    }

    fn last(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant() {
        let mut rng = rand::rng();
        let g = ConstGenerator::new(11);
        for _ in 0..10 {
            assert_eq!(g.next(&mut rng), 11);
        }
        assert_eq!(g.last(), 11);
    }
}
