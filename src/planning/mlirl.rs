//! Maximum-likelihood inverse reinforcement learning.
//!
//! Reward parameters are tuned by gradient ascent on the log-likelihood of
//! expert episodes under the Boltzmann policy of a [`DifferentiableVi`]
//! planner.

use std::fmt::Debug;

use ndarray::Array1;
use tracing::{debug, info};

use super::{DifferentiableReward, DifferentiableVi};
use crate::{
    Error, Result,
    episode::Episode,
    ports::FullModel,
    types::Action,
    utils::softmax,
};

/// Outcome of an [`Mlirl::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct MlirlReport {
    /// Gradient steps taken
    pub steps: usize,
    /// Log-likelihood of the episodes before each step, plus the final one
    pub log_likelihoods: Vec<f64>,
}

/// Gradient-ascent driver.
#[derive(Debug, Clone, Copy)]
pub struct Mlirl {
    learning_rate: f64,
    max_likelihood_change: f64,
    max_steps: usize,
}

impl Mlirl {
    /// Stops after `max_steps` updates or once an update changes the
    /// log-likelihood by less than `max_likelihood_change`.
    pub fn new(learning_rate: f64, max_likelihood_change: f64, max_steps: usize) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("learning rate must be positive, got {learning_rate}"),
            });
        }
        Ok(Self {
            learning_rate,
            max_likelihood_change,
            max_steps,
        })
    }

    #[tracing::instrument(level = "info", skip_all, fields(episodes = episodes.len()))]
    pub fn run<S, A, M, R>(
        &self,
        planner: &mut DifferentiableVi<S, A, M, R>,
        episodes: &[Episode<S, A>],
    ) -> Result<MlirlReport>
    where
        S: Clone + Debug,
        A: Action,
        M: FullModel<S, A>,
        R: DifferentiableReward<S, A>,
    {
        if episodes.iter().all(Episode::is_empty) {
            return Err(Error::EmptyDataset);
        }

        let mut report = MlirlReport {
            steps: 0,
            log_likelihoods: Vec::new(),
        };
        for step in 0..self.max_steps {
            let (likelihood, gradient) = Self::likelihood_and_gradient(planner, episodes)?;
            debug!(step, likelihood, "log-likelihood");
            if let Some(previous) = report.log_likelihoods.last() {
                if (likelihood - previous).abs() < self.max_likelihood_change {
                    report.log_likelihoods.push(likelihood);
                    info!(steps = report.steps, likelihood, "likelihood converged");
                    return Ok(report);
                }
            }
            report.log_likelihoods.push(likelihood);

            let mut parameters = planner.reward().parameters();
            parameters.scaled_add(self.learning_rate, &gradient);
            planner.reward_mut().set_parameters(parameters)?;
            report.steps = step + 1;
        }

        let (likelihood, _) = Self::likelihood_and_gradient(planner, episodes)?;
        report.log_likelihoods.push(likelihood);
        info!(steps = report.steps, likelihood, "step budget exhausted");
        Ok(report)
    }

    /// Log-likelihood of the episodes under the planner's current reward.
    pub fn log_likelihood<S, A, M, R>(
        planner: &mut DifferentiableVi<S, A, M, R>,
        episodes: &[Episode<S, A>],
    ) -> Result<f64>
    where
        S: Clone + Debug,
        A: Action,
        M: FullModel<S, A>,
        R: DifferentiableReward<S, A>,
    {
        Ok(Self::likelihood_and_gradient(planner, episodes)?.0)
    }

    fn likelihood_and_gradient<S, A, M, R>(
        planner: &mut DifferentiableVi<S, A, M, R>,
        episodes: &[Episode<S, A>],
    ) -> Result<(f64, Array1<f64>)>
    where
        S: Clone + Debug,
        A: Action,
        M: FullModel<S, A>,
        R: DifferentiableReward<S, A>,
    {
        planner.reset_solver();
        for episode in episodes {
            for state in &episode.states {
                planner.perform_reachability_from(state)?;
            }
        }
        planner.run_vi()?;

        let beta = planner.beta();
        let mut likelihood = 0.0;
        let mut gradient = Array1::zeros(planner.reward().num_parameters());
        for episode in episodes {
            for (t, action) in episode.actions.iter().enumerate() {
                let qs = planner.q_gradients(&episode.states[t])?;
                let Some(taken) = qs.iter().position(|q| &q.action == action) else {
                    return Err(Error::Model {
                        message: format!("episode action {action:?} is not applicable"),
                    });
                };
                let values: Vec<f64> = qs.iter().map(|q| q.q).collect();
                let probs = softmax(&values, beta);
                likelihood += probs[taken].ln();

                // ∇ log π(a|s) = β (∇Q(s,a) − Σ_b π(b|s) ∇Q(s,b))
                gradient.scaled_add(beta, &qs[taken].gradient);
                for (p, q) in probs.iter().zip(&qs) {
                    gradient.scaled_add(-beta * p, &q.gradient);
                }
            }
        }
        Ok((likelihood, gradient))
    }
}
