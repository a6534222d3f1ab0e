//! TD(λ) state-value critic with accumulating-then-replacing eligibility
//! traces.

use std::{collections::HashMap, fmt::Debug};

use tracing::trace;

use super::learning_rate::LearningRate;
use crate::{
    Result,
    config::{ConfigFile, TdConfig},
    episode::Episode,
    ports::{Environment, Outcome, Policy},
    state::{HashableState, HashingScheme},
    types::{Discount, TraceDecay},
    value::ValueTable,
};

/// Tabular TD(λ) critic.
///
/// For a transition `s → s'` with reward `r` lasting `k` steps:
/// `δ = r + γ^k·V(s') − V(s)` (`V(s') = 0` when `s'` is terminal). Every
/// traced state moves by `α·δ·e` and its trace decays by `λ·γ^k`; the
/// current state's trace is reset to one before the update. Traces are
/// cleared at the start of each episode.
pub struct TdLambda<S> {
    hashing: Box<dyn HashingScheme<S>>,
    discount: Discount,
    lambda: TraceDecay,
    learning_rate: Box<dyn LearningRate>,
    values: ValueTable<S>,
    traces: HashMap<HashableState<S>, f64>,
}

impl<S: Clone + Debug> TdLambda<S> {
    pub fn new(hashing: impl HashingScheme<S> + 'static, config: TdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hashing: Box::new(hashing),
            discount: config.discount()?,
            lambda: config.lambda()?,
            learning_rate: config.learning_rate.build()?,
            values: ValueTable::constant(config.initial_value),
            traces: HashMap::new(),
        })
    }

    /// Replace the step-size schedule.
    pub fn with_learning_rate(mut self, learning_rate: impl LearningRate + 'static) -> Self {
        self.learning_rate = Box::new(learning_rate);
        self
    }

    /// Clear eligibility traces; call before every episode.
    pub fn initialize_episode(&mut self) {
        self.traces.clear();
    }

    /// Learn from one observed transition and return its TD error.
    pub fn critique(&mut self, state: &S, outcome: &Outcome<S>) -> Result<f64> {
        let current = self.hashing.hash_state(state)?;
        let next = self.hashing.hash_state(&outcome.state)?;

        let discount = self.discount.over(outcome.steps);
        let next_value = if outcome.terminated {
            0.0
        } else {
            self.values.value(&next)
        };
        let delta = outcome.reward + discount * next_value - self.values.value(&current);
        let rate = self.learning_rate.poll();
        let decay = self.lambda.value() * discount;

        let mut found = false;
        let previous = std::mem::take(&mut self.traces);
        let mut traces = HashMap::with_capacity(previous.len() + 1);
        for (traced, eligibility) in previous {
            let eligibility = if traced == current {
                found = true;
                1.0
            } else {
                eligibility
            };
            let v = self.values.value(&traced);
            self.values.set(&traced, v + rate * delta * eligibility);
            if eligibility * decay != 0.0 {
                traces.insert(traced, eligibility * decay);
            }
        }
        if !found {
            let v = self.values.value(&current);
            self.values.set(&current, v + rate * delta);
            if decay != 0.0 {
                traces.insert(current, decay);
            }
        }
        self.traces = traces;

        trace!(delta, rate, traced = self.traces.len(), "td update");
        Ok(delta)
    }

    /// Run `policy` in `env` for one episode, critiquing every transition.
    pub fn evaluate_episode<A, P, E>(
        &mut self,
        policy: &mut P,
        env: &mut E,
        max_steps: usize,
    ) -> Result<Episode<S, A>>
    where
        A: Clone,
        P: Policy<S, A> + ?Sized,
        E: Environment<S, A> + ?Sized,
    {
        self.initialize_episode();
        let mut episode = Episode::new(env.current_state().clone());
        while episode.len() < max_steps && !env.is_in_terminal() {
            let state = env.current_state().clone();
            let action = policy.action(&state)?;
            let outcome = env.execute(&action)?;
            self.critique(&state, &outcome)?;
            episode.record(action, outcome);
        }
        Ok(episode)
    }

    /// Current estimate of `V(state)`.
    pub fn value(&self, state: &S) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self.values.peek(&hashed))
    }

    pub fn values(&self) -> &ValueTable<S> {
        &self.values
    }

    /// Eligibility of `state`, zero when untraced.
    pub fn eligibility(&self, state: &S) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self.traces.get(&hashed).copied().unwrap_or(0.0))
    }

    /// Forget values and traces, and restart the learning-rate schedule.
    pub fn reset(&mut self) {
        self.values.reset();
        self.traces.clear();
        self.learning_rate.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::LearningRateSchedule,
        domains::GraphState,
    };

    fn critic(lambda: f64) -> TdLambda<GraphState> {
        let config = TdConfig::new(0.5, lambda)
            .with_learning_rate(LearningRateSchedule::Constant { rate: 0.5 });
        TdLambda::new(GraphState::hashing(), config).unwrap()
    }

    #[test]
    fn terminal_successor_has_no_continuation() {
        let mut td = critic(0.0);
        let outcome = Outcome::new(GraphState::new(1), 2.0, true);
        let delta = td.critique(&GraphState::new(0), &outcome).unwrap();
        assert_eq!(delta, 2.0);
        assert_eq!(td.value(&GraphState::new(0)).unwrap(), 1.0);
    }

    #[test]
    fn traces_carry_credit_backwards() {
        let mut td = critic(1.0);
        td.critique(&GraphState::new(0), &Outcome::new(GraphState::new(1), 0.0, false))
            .unwrap();
        assert_eq!(td.eligibility(&GraphState::new(0)).unwrap(), 0.5);
        td.critique(&GraphState::new(1), &Outcome::new(GraphState::new(2), 4.0, true))
            .unwrap();
        // δ = 4, state 1 gets 0.5·4, state 0 gets 0.5·4·0.5
        assert_eq!(td.value(&GraphState::new(1)).unwrap(), 2.0);
        assert_eq!(td.value(&GraphState::new(0)).unwrap(), 1.0);
    }

    #[test]
    fn initialize_episode_clears_traces() {
        let mut td = critic(1.0);
        td.critique(&GraphState::new(0), &Outcome::new(GraphState::new(1), 0.0, false))
            .unwrap();
        td.initialize_episode();
        assert_eq!(td.eligibility(&GraphState::new(0)).unwrap(), 0.0);
    }

    #[test]
    fn multi_step_outcomes_discount_by_duration() {
        let mut td = critic(0.0);
        td.critique(&GraphState::new(1), &Outcome::new(GraphState::new(2), 4.0, true))
            .unwrap();
        let outcome = Outcome::new(GraphState::new(1), 0.0, false).with_steps(2);
        let delta = td.critique(&GraphState::new(0), &outcome).unwrap();
        assert_eq!(delta, 0.25 * 2.0);
    }
}
