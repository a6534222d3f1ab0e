//! Learner port - agents that improve from interaction
//!
//! This port defines the interface every online learner implements, allowing
//! experiment code to drive:
//! - value critics with a fixed behavior policy
//! - actor-critic agents
//! - least-squares policy iteration in learning mode

use super::environment::Environment;
use crate::{Result, episode::Episode};

/// Learning agent trait - unified interface for online learners.
///
/// # Examples
///
/// ```no_run
/// use mdpkit::{episode::Episode, ports::{Environment, LearningAgent}};
///
/// fn train<S, A>(
///     agent: &mut dyn LearningAgent<S, A>,
///     env: &mut dyn Environment<S, A>,
///     episodes: usize,
/// ) -> mdpkit::Result<Vec<Episode<S, A>>> {
///     (0..episodes)
///         .map(|_| {
///             env.reset()?;
///             agent.run_learning_episode(env, 100)
///         })
///         .collect()
/// }
/// ```
pub trait LearningAgent<S, A> {
    /// Act in `env` from its current state until it terminates or
    /// `max_steps` actions were taken, learning along the way.
    ///
    /// # Errors
    ///
    /// Environment and model failures propagate unchanged.
    fn run_learning_episode(
        &mut self,
        env: &mut dyn Environment<S, A>,
        max_steps: usize,
    ) -> Result<Episode<S, A>>;

    /// Get the learner's name.
    ///
    /// Used for identification in comparisons and logging.
    fn name(&self) -> &str;

    /// Reset learned state to initial conditions.
    ///
    /// # Default Implementation
    ///
    /// Does nothing, suitable for stateless agents.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}
