//! Randomized variants of parameter values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_yaml::Value;

/// Largest relative change applied to a value.
pub const MAX_RELATIVE_CHANGE: f64 = 0.5;

/// Generates perturbed copies of numeric parameter values.
///
/// Each value `v` becomes `v + f * v` with `f` drawn uniformly from
/// `[-0.5, 0.5]`, then rounded to two significant figures.
#[derive(Debug, Clone)]
pub struct Perturber<R = StdRng> {
    rng: R,
}

impl Perturber<StdRng> {
    /// A reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Perturber<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// One perturbed value per input, in order.
    pub fn perturb(&mut self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.perturb_one(v)).collect()
    }

    /// Perturb the numeric entries of `values`; anything else is copied.
    pub fn perturb_values(&mut self, values: &[Value]) -> Vec<Value> {
        values
            .iter()
            .map(|value| match value.as_f64() {
                Some(v) => Value::from(self.perturb_one(v)),
                None => {
                    log::debug!("Leaving non-numeric value {value:?} unchanged");
                    value.clone()
                }
            })
            .collect()
    }

    fn perturb_one(&mut self, value: f64) -> f64 {
        let factor = self
            .rng
            .gen_range(-MAX_RELATIVE_CHANGE..=MAX_RELATIVE_CHANGE);
        round_significant(value + factor * value)
    }
}

/// Round through two-significant-figure scientific notation.
fn round_significant(value: f64) -> f64 {
    format!("{value:.1e}").parse().unwrap_or(value)
}
