//! Model port - transition and reward dynamics consumed by planners
//!
//! Two capabilities are distinguished:
//! - [`SampleModel`]: draw one outcome of taking an action (search, online
//!   learning, sample collection)
//! - [`FullModel`]: enumerate every outcome with its probability (value
//!   iteration and other exact backups)

use rand::Rng;

use crate::{Result, utils::weighted_sample};

/// One sampled result of executing an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<S> {
    /// Resulting state
    pub state: S,
    /// Reward received (costs are negative rewards)
    pub reward: f64,
    /// Whether `state` is terminal
    pub terminated: bool,
    /// Primitive time steps that elapsed; greater than one for temporally
    /// extended actions
    pub steps: u32,
}

impl<S> Outcome<S> {
    /// Outcome of a primitive, single-step action.
    pub fn new(state: S, reward: f64, terminated: bool) -> Self {
        Self {
            state,
            reward,
            terminated,
            steps: 1,
        }
    }

    /// Mark the outcome as spanning `steps` primitive steps.
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }
}

/// One enumerated outcome of an action, with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub probability: f64,
    pub state: S,
    pub reward: f64,
}

impl<S> Transition<S> {
    pub fn new(probability: f64, state: S, reward: f64) -> Self {
        Self {
            probability,
            state,
            reward,
        }
    }
}

/// Model that can sample outcomes.
///
/// Sampling takes `&mut self` so stochastic models can own their random
/// number generator.
pub trait SampleModel<S, A> {
    /// Sample one outcome of taking `action` in `state`.
    ///
    /// # Errors
    ///
    /// Any error is treated as fatal by the planners and propagated unchanged.
    fn sample(&mut self, state: &S, action: &A) -> Result<Outcome<S>>;

    /// Whether `state` is terminal. Terminal states are never expanded and
    /// have no continuation value.
    fn is_terminal(&self, state: &S) -> bool;
}

/// Model that enumerates outcome distributions.
///
/// Implementations must return every outcome with nonzero probability and
/// the probabilities must sum to one; planners rely on this to discover the
/// full reachable state space.
pub trait FullModel<S, A>: SampleModel<S, A> {
    fn transitions(&self, state: &S, action: &A) -> Result<Vec<Transition<S>>>;
}

impl<S, A, M: SampleModel<S, A> + ?Sized> SampleModel<S, A> for Box<M> {
    fn sample(&mut self, state: &S, action: &A) -> Result<Outcome<S>> {
        (**self).sample(state, action)
    }

    fn is_terminal(&self, state: &S) -> bool {
        (**self).is_terminal(state)
    }
}

/// Draw one transition according to its probability.
///
/// Helper for models that implement [`SampleModel::sample`] on top of
/// [`FullModel::transitions`].
pub fn sample_transition<S: Clone, R: Rng + ?Sized>(
    transitions: &[Transition<S>],
    rng: &mut R,
) -> Option<Transition<S>> {
    let weighted: Vec<(usize, f64)> = transitions
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t.probability))
        .collect();
    weighted_sample(rng, &weighted).map(|i| transitions[i].clone())
}
