//! Value iteration over the reachable state space of a full model.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{BackupOperator, MaxBackup, reachability::StateSpace};
use crate::{
    Error, Result,
    config::{ConfigFile, SolverConfig},
    policy::GreedyQPolicy,
    ports::{ActionSpace, FullModel, QProvider},
    state::{HashableState, HashingScheme},
    types::{Action, Discount, QValue},
    value::{ValueInitializer, ValueTable},
};

/// Order in which a sweep commits new values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Each backup sees the values already updated earlier in the sweep
    #[default]
    InPlace,
    /// Every backup of a sweep reads the previous sweep's values
    Synchronous,
}

/// Summary of one solver run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Sweeps performed
    pub iterations: usize,
    /// Largest absolute value change of each sweep
    pub deltas: Vec<f64>,
    /// Whether the last sweep changed no value by more than the threshold
    pub converged: bool,
}

impl SweepReport {
    pub fn final_delta(&self) -> Option<f64> {
        self.deltas.last().copied()
    }
}

/// Value iteration planner.
///
/// Planning from a state first discovers every state reachable from it, then
/// sweeps Bellman backups over all known states until the largest change
/// drops below the threshold or the iteration cap is hit. Terminal states are
/// worth zero.
pub struct ValueIteration<S, A, M> {
    model: M,
    actions: ActionSpace<S, A>,
    hashing: Box<dyn HashingScheme<S>>,
    config: SolverConfig,
    discount: Discount,
    operator: Box<dyn BackupOperator>,
    mode: SweepMode,
    values: ValueTable<S>,
    space: StateSpace<S>,
    has_run: bool,
    last_report: Option<SweepReport>,
}

impl<S, A, M> ValueIteration<S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
{
    /// # Errors
    ///
    /// Returns a configuration error when `config` fails validation.
    pub fn new(
        model: M,
        actions: ActionSpace<S, A>,
        hashing: impl HashingScheme<S> + 'static,
        config: SolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            actions,
            hashing: Box::new(hashing),
            discount: config.discount()?,
            config,
            operator: Box::new(MaxBackup),
            mode: SweepMode::default(),
            values: ValueTable::constant(0.0),
            space: StateSpace::new(true),
            has_run: false,
            last_report: None,
        })
    }

    pub fn with_operator(mut self, operator: impl BackupOperator + 'static) -> Self {
        self.operator = Box::new(operator);
        self
    }

    pub fn with_sweep_mode(mut self, mode: SweepMode) -> Self {
        self.mode = mode;
        self
    }

    /// Initial value of states before their first backup.
    pub fn with_value_initializer(mut self, init: impl ValueInitializer<S> + 'static) -> Self {
        self.values = ValueTable::new(init);
        self
    }

    /// Whether reachability stops at terminal states (default true).
    pub fn with_terminal_pruning(mut self, prune: bool) -> Self {
        self.space.set_prune_terminals(prune);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable model access; call [`ValueIteration::recompute_reachable_states`]
    /// after changing its dynamics.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn values(&self) -> &ValueTable<S> {
        &self.values
    }

    pub fn last_report(&self) -> Option<&SweepReport> {
        self.last_report.as_ref()
    }

    pub fn hash(&self, state: &S) -> Result<HashableState<S>> {
        self.hashing.hash_state(state)
    }

    /// Discover and initialize every state reachable from `state`.
    ///
    /// Returns whether any new state was found.
    pub fn perform_reachability_from(&mut self, state: &S) -> Result<bool> {
        let seed = self.hashing.hash_state(state)?;
        let found = self
            .space
            .explore(&self.model, &self.actions, self.hashing.as_ref(), seed)?;
        let mut added = false;
        for s in &found {
            added |= self.values.ensure(s);
        }
        Ok(added)
    }

    /// Add a single state to the backup set without exploring from it.
    pub fn add_state_to_state_space(&mut self, state: &S) -> Result<()> {
        let hashed = self.hashing.hash_state(state)?;
        self.values.ensure(&hashed);
        Ok(())
    }

    /// Explore from `state` and, when new states appeared or no solve has
    /// happened yet, rerun value iteration.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn plan_from_state(&mut self, state: &S) -> Result<GreedyQPolicy<&Self>> {
        let added = self.perform_reachability_from(state)?;
        if added || !self.has_run {
            self.run_vi()?;
        }
        Ok(GreedyQPolicy::new(&*self))
    }

    /// Sweep backups over every known state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReachabilityNotPerformed`] when no state is known yet.
    pub fn run_vi(&mut self) -> Result<SweepReport> {
        if self.values.is_empty() {
            return Err(Error::ReachabilityNotPerformed);
        }
        let states: Vec<HashableState<S>> = self.values.states().to_vec();
        let mut report = SweepReport::default();

        for iteration in 0..self.config.max_iterations {
            let delta = match self.mode {
                SweepMode::InPlace => {
                    let mut delta: f64 = 0.0;
                    for s in &states {
                        let new = self.backup(s)?;
                        delta = delta.max((new - self.values.peek(s)).abs());
                        self.values.set(s, new);
                    }
                    delta
                }
                SweepMode::Synchronous => {
                    let updated = states
                        .iter()
                        .map(|s| self.backup(s))
                        .collect::<Result<Vec<f64>>>()?;
                    let mut delta: f64 = 0.0;
                    for (s, new) in states.iter().zip(updated) {
                        delta = delta.max((new - self.values.peek(s)).abs());
                        self.values.set(s, new);
                    }
                    delta
                }
            };
            report.iterations = iteration + 1;
            report.deltas.push(delta);
            trace!(iteration, delta, "sweep finished");
            if delta < self.config.max_delta {
                report.converged = true;
                break;
            }
        }

        if report.converged {
            debug!(states = states.len(), iterations = report.iterations, "value iteration converged");
        } else {
            warn!(
                iterations = report.iterations,
                delta = report.final_delta(),
                "value iteration hit the iteration cap before converging"
            );
        }
        self.has_run = true;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Force the next planning call to rediscover reachable states, for
    /// example after the model changed.
    pub fn recompute_reachable_states(&mut self) {
        self.space.forget_exploration();
        self.has_run = false;
    }

    /// Forget every value and every explored state.
    pub fn reset_solver(&mut self) {
        self.values.reset();
        self.space.forget_exploration();
        self.has_run = false;
        self.last_report = None;
    }

    fn state_value(&self, state: &HashableState<S>) -> f64 {
        if self.model.is_terminal(state.state()) {
            0.0
        } else {
            self.values.peek(state)
        }
    }

    fn q(&self, state: &S, action: &A) -> Result<f64> {
        let gamma = self.discount.value();
        let mut q = 0.0;
        for t in self.model.transitions(state, action)? {
            let next = self.hashing.hash_state(&t.state)?;
            q += t.probability * (t.reward + gamma * self.state_value(&next));
        }
        Ok(q)
    }

    fn backup(&self, state: &HashableState<S>) -> Result<f64> {
        if self.model.is_terminal(state.state()) {
            return Ok(0.0);
        }
        let qs = self
            .actions
            .applicable(state.state())
            .iter()
            .map(|a| self.q(state.state(), a))
            .collect::<Result<Vec<f64>>>()?;
        if qs.is_empty() {
            return Ok(0.0);
        }
        Ok(self.operator.backup(&qs))
    }
}

impl<S, A, M> QProvider<S, A> for ValueIteration<S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
{
    fn q_values(&self, state: &S) -> Result<Vec<QValue<A>>> {
        self.actions
            .applicable(state)
            .into_iter()
            .map(|a| {
                let q = self.q(state, &a)?;
                Ok(QValue::new(a, q))
            })
            .collect()
    }

    fn q_value(&self, state: &S, action: &A) -> Result<f64> {
        self.q(state, action)
    }

    fn value(&self, state: &S) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self.state_value(&hashed))
    }
}
