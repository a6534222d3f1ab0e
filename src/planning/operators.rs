//! Backup operators: how a state's value is formed from its Q-values.

use std::fmt::Debug;

use ndarray::Array1;

use crate::utils::softmax;

/// Collapses Q-values into a state value.
///
/// Callers never pass an empty slice; states without actions are handled
/// before the operator is consulted.
pub trait BackupOperator: Debug {
    fn backup(&self, q_values: &[f64]) -> f64;
}

/// Backup that also carries the derivative of the value with respect to the
/// reward parameters.
pub trait DifferentiableBackupOperator: BackupOperator {
    /// Value and gradient from per-action values and gradients.
    fn backup_with_gradient(&self, q_values: &[f64], q_gradients: &[Array1<f64>]) -> (f64, Array1<f64>);
}

/// The Bellman optimality backup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxBackup;

impl BackupOperator for MaxBackup {
    fn backup(&self, q_values: &[f64]) -> f64 {
        q_values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl DifferentiableBackupOperator for MaxBackup {
    /// Subgradient: the gradient of the first maximizing action.
    fn backup_with_gradient(&self, q_values: &[f64], q_gradients: &[Array1<f64>]) -> (f64, Array1<f64>) {
        let (best, value) = q_values
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, q)| if q > acc.1 { (i, q) } else { acc });
        (value, q_gradients[best].clone())
    }
}

/// Boltzmann-weighted average of the Q-values, `Σ π_a Q_a` with
/// `π = softmax(β·Q)`. Approaches the max backup as β grows.
#[derive(Debug, Clone, Copy)]
pub struct SoftmaxBackup {
    beta: f64,
}

impl SoftmaxBackup {
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl BackupOperator for SoftmaxBackup {
    fn backup(&self, q_values: &[f64]) -> f64 {
        softmax(q_values, self.beta)
            .iter()
            .zip(q_values)
            .map(|(p, q)| p * q)
            .sum()
    }
}

impl DifferentiableBackupOperator for SoftmaxBackup {
    fn backup_with_gradient(&self, q_values: &[f64], q_gradients: &[Array1<f64>]) -> (f64, Array1<f64>) {
        let probs = softmax(q_values, self.beta);
        let dim = q_gradients.first().map_or(0, Array1::len);

        let mut mean_gradient = Array1::zeros(dim);
        for (p, dq) in probs.iter().zip(q_gradients) {
            mean_gradient.scaled_add(*p, dq);
        }

        // d/dθ Σ π_a Q_a = Σ π_a dQ_a + β Σ π_a Q_a (dQ_a − Σ_b π_b dQ_b)
        let mut gradient = mean_gradient.clone();
        let mut value = 0.0;
        for ((p, q), dq) in probs.iter().zip(q_values).zip(q_gradients) {
            value += p * q;
            gradient.scaled_add(self.beta * p * q, &(dq - &mean_gradient));
        }
        (value, gradient)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn max_backup_takes_largest() {
        assert_eq!(MaxBackup.backup(&[1.0, 4.0, -2.0]), 4.0);
        let (v, g) = MaxBackup.backup_with_gradient(&[1.0, 4.0], &[array![1.0], array![2.0]]);
        assert_eq!(v, 4.0);
        assert_eq!(g, array![2.0]);
    }

    #[test]
    fn softmax_backup_approaches_max() {
        let qs = [1.0, 2.0, 3.0];
        assert!((SoftmaxBackup::new(50.0).backup(&qs) - 3.0).abs() < 1e-6);
        assert!((SoftmaxBackup::new(0.0).backup(&qs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn softmax_gradient_matches_finite_difference() {
        // Q_a(θ) = θ·c_a for a single parameter
        let coefficients = [1.0, -0.5, 2.0];
        let theta = 0.3;
        let operator = SoftmaxBackup::new(1.7);
        let value_at = |t: f64| {
            let qs: Vec<f64> = coefficients.iter().map(|c| c * t).collect();
            operator.backup(&qs)
        };

        let qs: Vec<f64> = coefficients.iter().map(|c| c * theta).collect();
        let grads: Vec<Array1<f64>> = coefficients.iter().map(|c| array![*c]).collect();
        let (value, gradient) = operator.backup_with_gradient(&qs, &grads);

        let h = 1e-6;
        let numeric = (value_at(theta + h) - value_at(theta - h)) / (2.0 * h);
        assert!((value - value_at(theta)).abs() < 1e-12);
        assert!((gradient[0] - numeric).abs() < 1e-6);
    }
}
