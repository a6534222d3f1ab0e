//! Numeric and sampling helpers shared by policies, models and backups.

use rand::{Rng, SeedableRng, distr::StandardUniform, prelude::IndexedRandom, rngs::StdRng};

/// Build a random number generator, seeded when a seed is given.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Boltzmann (softmax) distribution over `values` with inverse temperature `beta`.
///
/// Values are shifted by their maximum before exponentiation so large
/// magnitudes do not overflow.
///
/// # Examples
///
/// ```
/// use mdpkit::utils::softmax;
///
/// let probs = softmax(&[1.0, 1.0], 3.0);
/// assert_eq!(probs, vec![0.5, 0.5]);
/// ```
pub fn softmax(values: &[f64], beta: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (beta * (v - max)).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Indices of every entry equal to the maximum of `values`.
///
/// Returns an empty vector for empty input.
pub fn argmax_all(values: &[f64]) -> Vec<usize> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == max)
        .map(|(i, _)| i)
        .collect()
}

/// Draw one item with probability proportional to its weight.
///
/// Without any positive weight the draw is uniform. Rounding at the end of
/// the cumulative walk lands on the last item.
pub fn weighted_sample<R, T>(rng: &mut R, items: &[(T, f64)]) -> Option<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    if items.is_empty() {
        return None;
    }

    let total: f64 = items.iter().map(|(_, w)| *w).sum();
    if total <= 0.0 {
        return items.choose(rng).map(|(item, _)| item.clone());
    }

    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;
    for (item, weight) in items {
        if threshold < *weight {
            return Some(item.clone());
        }
        threshold -= weight;
    }

    items.last().map(|(item, _)| item.clone())
}
