//! Environment port - the world a learning agent acts in

use super::model::Outcome;
use crate::Result;

/// An interactive environment with a current state.
///
/// Unlike a model, an environment cannot be queried at arbitrary states: the
/// agent only observes what its own actions produce.
pub trait Environment<S, A> {
    /// The state the environment is currently in.
    fn current_state(&self) -> &S;

    /// Execute `action` and advance the environment.
    fn execute(&mut self, action: &A) -> Result<Outcome<S>>;

    /// Whether the current state is terminal.
    fn is_in_terminal(&self) -> bool;

    /// Return the environment to its initial state.
    fn reset(&mut self) -> Result<()>;
}
