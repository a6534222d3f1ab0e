//! Environment adapter backed by a sampling model.
//!
//! This adapter turns any [`SampleModel`] into an [`Environment`], so the
//! same domain description serves planners and online learners alike.

use crate::{
    Result,
    ports::{Environment, Outcome, SampleModel},
};

/// Simulated environment driven by a sampling model.
///
/// # Examples
///
/// ```
/// use mdpkit::adapters::SimulatedEnvironment;
/// use mdpkit::domains::GraphDomain;
/// use mdpkit::ports::Environment;
///
/// let domain = GraphDomain::builder(2)
///     .edge(0, "go", 1, -1.0)?
///     .terminal(1)
///     .build()?;
/// let start = domain.state(0)?;
/// let mut env = SimulatedEnvironment::new(domain, start);
/// let outcome = env.execute(&"go".to_string())?;
/// assert!(outcome.terminated);
/// assert!(env.is_in_terminal());
/// # Ok::<(), mdpkit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedEnvironment<M, S> {
    model: M,
    initial: S,
    current: S,
}

impl<M, S: Clone> SimulatedEnvironment<M, S> {
    /// Create an environment starting (and resetting to) `initial`.
    pub fn new(model: M, initial: S) -> Self {
        Self {
            model,
            current: initial.clone(),
            initial,
        }
    }

    /// Change the state future resets return to.
    pub fn set_initial_state(&mut self, initial: S) {
        self.initial = initial;
    }

    /// Overwrite the current state without touching the reset state.
    pub fn set_current_state(&mut self, state: S) {
        self.current = state;
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

impl<S: Clone, A, M: SampleModel<S, A>> Environment<S, A> for SimulatedEnvironment<M, S> {
    fn current_state(&self) -> &S {
        &self.current
    }

    fn execute(&mut self, action: &A) -> Result<Outcome<S>> {
        let outcome = self.model.sample(&self.current, action)?;
        self.current = outcome.state.clone();
        Ok(outcome)
    }

    fn is_in_terminal(&self) -> bool {
        self.model.is_terminal(&self.current)
    }

    fn reset(&mut self) -> Result<()> {
        self.current = self.initial.clone();
        Ok(())
    }
}
