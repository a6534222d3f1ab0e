//! Policies derived from state-action value estimates.
//!
//! Each policy wraps any [`QProvider`], owned or borrowed, so a planner can
//! hand out `GreedyQPolicy<&Self>` while a learner keeps an owned critic.

use std::fmt::Debug;

use rand::{Rng, prelude::IndexedRandom, rngs::StdRng};

use crate::{
    Error, Result,
    ports::{EnumerablePolicy, Policy, QProvider},
    types::{Action, ActionProb, QValue},
    utils::{argmax_all, build_rng, softmax, weighted_sample},
};

fn nonempty_q_values<S: Debug, A, Q: QProvider<S, A>>(source: &Q, state: &S) -> Result<Vec<QValue<A>>> {
    let qs = source.q_values(state)?;
    if qs.is_empty() {
        return Err(Error::NoApplicableActions {
            state: format!("{state:?}"),
        });
    }
    Ok(qs)
}

fn greedy_indices<A>(qs: &[QValue<A>]) -> Vec<usize> {
    let values: Vec<f64> = qs.iter().map(|q| q.q).collect();
    argmax_all(&values)
}

/// Chooses a maximizing action, breaking ties uniformly at random.
#[derive(Debug)]
pub struct GreedyQPolicy<Q> {
    source: Q,
    rng: StdRng,
}

impl<Q> GreedyQPolicy<Q> {
    pub fn new(source: Q) -> Self {
        Self {
            source,
            rng: build_rng(None),
        }
    }

    /// Seed the tie-breaking random number generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn source(&self) -> &Q {
        &self.source
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> Policy<S, A> for GreedyQPolicy<Q> {
    fn action(&mut self, state: &S) -> Result<A> {
        let qs = nonempty_q_values(&self.source, state)?;
        let best = greedy_indices(&qs);
        let idx = best.choose(&mut self.rng).copied().unwrap_or(0);
        Ok(qs[idx].action.clone())
    }

    fn defined_for(&self, state: &S) -> bool {
        self.source.q_values(state).is_ok_and(|qs| !qs.is_empty())
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> EnumerablePolicy<S, A> for GreedyQPolicy<Q> {
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        let qs = nonempty_q_values(&self.source, state)?;
        let best = greedy_indices(&qs);
        let p = 1.0 / best.len() as f64;
        Ok(best
            .into_iter()
            .map(|i| ActionProb::new(qs[i].action.clone(), p))
            .collect())
    }
}

/// Samples actions with probability proportional to `exp(Q / temperature)`.
#[derive(Debug)]
pub struct BoltzmannQPolicy<Q> {
    source: Q,
    temperature: f64,
    rng: StdRng,
}

impl<Q> BoltzmannQPolicy<Q> {
    /// `temperature` must be positive; small values approach greedy selection.
    pub fn new(source: Q, temperature: f64) -> Self {
        Self {
            source,
            temperature,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> Policy<S, A> for BoltzmannQPolicy<Q> {
    fn action(&mut self, state: &S) -> Result<A> {
        let weighted: Vec<(A, f64)> = self
            .action_distribution(state)?
            .into_iter()
            .map(|ap| (ap.action, ap.probability))
            .collect();
        weighted_sample(&mut self.rng, &weighted).ok_or_else(|| Error::NoApplicableActions {
            state: format!("{state:?}"),
        })
    }

    fn defined_for(&self, state: &S) -> bool {
        self.source.q_values(state).is_ok_and(|qs| !qs.is_empty())
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> EnumerablePolicy<S, A> for BoltzmannQPolicy<Q> {
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        let qs = nonempty_q_values(&self.source, state)?;
        let values: Vec<f64> = qs.iter().map(|q| q.q).collect();
        let probs = softmax(&values, 1.0 / self.temperature);
        Ok(qs
            .into_iter()
            .zip(probs)
            .map(|(q, p)| ActionProb::new(q.action, p))
            .collect())
    }
}

/// Greedy with probability `1 - epsilon`, uniformly random otherwise.
#[derive(Debug)]
pub struct EpsilonGreedy<Q> {
    source: Q,
    epsilon: f64,
    rng: StdRng,
}

impl<Q> EpsilonGreedy<Q> {
    pub fn new(source: Q, epsilon: f64) -> Self {
        Self {
            source,
            epsilon,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> Policy<S, A> for EpsilonGreedy<Q> {
    fn action(&mut self, state: &S) -> Result<A> {
        let qs = nonempty_q_values(&self.source, state)?;
        let idx = if self.rng.random::<f64>() < self.epsilon {
            self.rng.random_range(0..qs.len())
        } else {
            let best = greedy_indices(&qs);
            best.choose(&mut self.rng).copied().unwrap_or(0)
        };
        Ok(qs[idx].action.clone())
    }

    fn defined_for(&self, state: &S) -> bool {
        self.source.q_values(state).is_ok_and(|qs| !qs.is_empty())
    }
}

impl<S: Debug, A: Action, Q: QProvider<S, A>> EnumerablePolicy<S, A> for EpsilonGreedy<Q> {
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        let qs = nonempty_q_values(&self.source, state)?;
        let best = greedy_indices(&qs);
        let uniform = self.epsilon / qs.len() as f64;
        let greedy = (1.0 - self.epsilon) / best.len() as f64;
        Ok(qs
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                let p = if best.contains(&i) { uniform + greedy } else { uniform };
                ActionProb::new(q.action, p)
            })
            .collect())
    }
}
