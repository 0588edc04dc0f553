use crate::generator::Generator;
use parking_lot::Mutex;
use rand::Rng;

/// Draws one of a finite set of values according to their weights.
///
/// Weights do not need to sum to one; they are normalized at draw time. Values are registered
/// with [`DiscreteGenerator::add_value`] before the generator is shared, and the insertion order
/// decides ties.
#[derive(Debug)]
pub struct DiscreteGenerator<T> {
    values: Vec<(T, f64)>,
    sum: f64,
    last: Mutex<Option<T>>,
}

impl<T: Clone> DiscreteGenerator<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            sum: 0.0,
            last: Mutex::new(None),
        }
    }

    pub fn add_value(&mut self, value: T, weight: f64) {
        self.values.push((value, weight));
        self.sum += weight;
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<T: Clone> Default for DiscreteGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Generator<T> for DiscreteGenerator<T> {
    fn next(&self, rng: &mut impl Rng) -> T {
        assert!(
            !self.values.is_empty(),
            "discrete generator needs at least one value"
        );
        let u = rng.random::<f64>() * self.sum;
        let mut acc = 0.0f64;
        // floating point may leave the cumulative sum just below u, fall back to the tail
        let mut chosen = &self.values[self.values.len() - 1].0;
        for (value, weight) in self.values.iter() {
            acc += weight;
            if u <= acc {
                chosen = value;
                break;
            }
        }
        let chosen = chosen.clone();
        *self.last.lock() = Some(chosen.clone());
        chosen
    }

    fn last(&self) -> T {
        match self.last.lock().as_ref() {
            Some(v) => v.clone(),
            None => panic!("last() called on a discrete generator before next()"),
        }
    }
}
