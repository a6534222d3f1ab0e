//! Policy port - mapping states to actions
//!
//! Planners expose their results through these traits; learners and rollouts
//! consume them.

use crate::{
    Result,
    types::{ActionProb, QValue},
};

/// A (possibly stochastic) mapping from states to actions.
pub trait Policy<S, A> {
    /// Select an action for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PolicyUndefined`] for states the policy does
    /// not cover, and [`crate::Error::NoApplicableActions`] when no action can
    /// be taken.
    fn action(&mut self, state: &S) -> Result<A>;

    /// Whether [`Policy::action`] would succeed for `state`.
    fn defined_for(&self, state: &S) -> bool;
}

/// Policy that can report its full action distribution.
pub trait EnumerablePolicy<S, A>: Policy<S, A> {
    /// Probability of each action that has nonzero probability in `state`.
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>>;
}

/// Source of state-action value estimates.
///
/// Value-based planners and learners implement this; the generic policies in
/// [`crate::policy`] turn any provider into a policy.
pub trait QProvider<S, A> {
    /// Q-value of every applicable action in `state`.
    fn q_values(&self, state: &S) -> Result<Vec<QValue<A>>>;

    /// Q-value of one action.
    fn q_value(&self, state: &S, action: &A) -> Result<f64>;

    /// State value, the maximum Q-value (zero when no action applies).
    fn value(&self, state: &S) -> Result<f64> {
        let qs = self.q_values(state)?;
        if qs.is_empty() {
            return Ok(0.0);
        }
        Ok(qs.iter().map(|q| q.q).fold(f64::NEG_INFINITY, f64::max))
    }
}

impl<S, A, Q: QProvider<S, A> + ?Sized> QProvider<S, A> for &Q {
    fn q_values(&self, state: &S) -> Result<Vec<QValue<A>>> {
        (**self).q_values(state)
    }

    fn q_value(&self, state: &S, action: &A) -> Result<f64> {
        (**self).q_value(state, action)
    }

    fn value(&self, state: &S) -> Result<f64> {
        (**self).value(state)
    }
}

impl<S, A, P: Policy<S, A> + ?Sized> Policy<S, A> for &mut P {
    fn action(&mut self, state: &S) -> Result<A> {
        (**self).action(state)
    }

    fn defined_for(&self, state: &S) -> bool {
        (**self).defined_for(state)
    }
}
