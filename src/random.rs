//! Uniform draws the simulation consumes. Every function takes the caller's RNG so a
//! world seeded with the same value replays the same draws.

use crate::error::SimError;
use rand::Rng;

/// Uniform integer in `[0, max)`. Returns 0 when `max` is 0.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    rng.random_range(0..max)
}

/// Uniform integer in `[min, max)`. Returns `min` for an empty range.
pub fn random_int_between<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

/// Uniform real in `[min, max)`.
pub fn random_number_between<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + rng.random::<f64>() * (max - min)
}

/// True with probability `probability`, clamped to 0..=1. NaN never fires.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.random_bool(probability.clamp(0.0, 1.0))
}

/// Picks one option with probability proportional to its weight.
///
/// Negative and non-finite weights count as zero. If nothing has positive weight the
/// choice is uniform over all options.
pub fn weighted_random<R: Rng + ?Sized, T: Copy>(
    rng: &mut R,
    options: &[(f64, T)],
) -> Result<T, SimError> {
    let weights: Vec<f64> = options
        .iter()
        .map(|(weight, _)| {
            if weight.is_finite() {
                weight.max(0.0)
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        if options.is_empty() {
            return Err(SimError::SelectionExhausted);
        }
        let index = random_int(rng, options.len() as u32) as usize;
        return Ok(options[index].1);
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (weight, (_, option)) in weights.iter().zip(options) {
        cumulative += weight;
        if *weight > 0.0 && target <= cumulative {
            return Ok(*option);
        }
    }

    Err(SimError::SelectionExhausted)
}
