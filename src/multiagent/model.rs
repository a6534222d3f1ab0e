//! Joint dynamics and per-agent rewards of a stochastic game.

use super::JointAction;
use crate::Result;

/// Successor state with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition<S> {
    pub probability: f64,
    pub state: S,
}

impl<S> StateTransition<S> {
    pub fn new(probability: f64, state: S) -> Self {
        Self { probability, state }
    }
}

/// Fully enumerable dynamics under joint actions.
///
/// As with single-agent full models, every nonzero-probability successor must
/// be listed and probabilities must sum to one.
pub trait JointModel<S, A> {
    fn transitions(&self, state: &S, action: &JointAction<A>) -> Result<Vec<StateTransition<S>>>;

    fn is_terminal(&self, state: &S) -> bool;
}

/// Reward of every agent for one joint transition, in agent order.
pub trait JointRewardFunction<S, A> {
    fn rewards(&self, state: &S, action: &JointAction<A>, next: &S) -> Result<Vec<f64>>;
}

impl<S, A, F> JointRewardFunction<S, A> for F
where
    F: Fn(&S, &JointAction<A>, &S) -> Vec<f64>,
{
    fn rewards(&self, state: &S, action: &JointAction<A>, next: &S) -> Result<Vec<f64>> {
        Ok(self(state, action, next))
    }
}
