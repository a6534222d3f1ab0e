//! Recorded interaction histories and the rollout loop that produces them.

use tracing::trace;

use crate::{
    Result,
    ports::{Environment, Outcome, Policy},
};

/// One recorded trajectory.
///
/// `states` holds one more entry than `actions` and `rewards`: the state the
/// episode started in followed by the result of every action.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode<S, A> {
    pub states: Vec<S>,
    pub actions: Vec<A>,
    pub rewards: Vec<f64>,
    /// Primitive steps each action took
    pub durations: Vec<u32>,
}

impl<S, A> Episode<S, A> {
    pub fn new(initial: S) -> Self {
        Self {
            states: vec![initial],
            actions: Vec::new(),
            rewards: Vec::new(),
            durations: Vec::new(),
        }
    }

    /// Append the result of taking `action`.
    pub fn record(&mut self, action: A, outcome: Outcome<S>) {
        self.actions.push(action);
        self.rewards.push(outcome.reward);
        self.durations.push(outcome.steps);
        self.states.push(outcome.state);
    }

    /// Number of actions taken.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn last_state(&self) -> Option<&S> {
        self.states.last()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    /// Discounted return from the first state, honoring action durations.
    pub fn discounted_return(&self, discount: f64) -> f64 {
        let mut elapsed = 0u32;
        let mut total = 0.0;
        for (reward, steps) in self.rewards.iter().zip(&self.durations) {
            total += discount.powi(elapsed as i32) * reward;
            elapsed += steps;
        }
        total
    }

    /// (state, action, reward, next state) quadruples in order.
    pub fn transitions(&self) -> impl Iterator<Item = (&S, &A, f64, &S)> + '_ {
        self.actions
            .iter()
            .enumerate()
            .map(|(t, a)| (&self.states[t], a, self.rewards[t], &self.states[t + 1]))
    }
}

/// Follow `policy` in `env` until a terminal state or `max_steps` actions.
///
/// The environment is not reset first; the episode starts wherever it is.
pub fn rollout<S, A, P, E>(policy: &mut P, env: &mut E, max_steps: usize) -> Result<Episode<S, A>>
where
    S: Clone,
    A: Clone,
    P: Policy<S, A> + ?Sized,
    E: Environment<S, A> + ?Sized,
{
    let mut episode = Episode::new(env.current_state().clone());
    while episode.len() < max_steps && !env.is_in_terminal() {
        let action = policy.action(env.current_state())?;
        let outcome = env.execute(&action)?;
        episode.record(action, outcome);
    }
    trace!(steps = episode.len(), "rollout finished");
    Ok(episode)
}
