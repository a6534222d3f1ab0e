//! Actor-critic agent: a Boltzmann actor over action preferences, trained by
//! the TD error of a TD(λ) critic.

use std::{collections::HashMap, fmt::Debug};

use rand::rngs::StdRng;
use tracing::debug;

use super::td_lambda::TdLambda;
use crate::{
    Error, Result,
    config::TdConfig,
    episode::Episode,
    ports::{ActionSpace, EnumerablePolicy, Environment, LearningAgent, Policy},
    state::{HashableState, HashingScheme},
    types::{Action, ActionProb},
    utils::{build_rng, softmax, weighted_sample},
};

pub struct ActorCritic<S, A> {
    name: String,
    actions: ActionSpace<S, A>,
    hashing: Box<dyn HashingScheme<S>>,
    preferences: HashMap<HashableState<S>, HashMap<A, f64>>,
    critic: TdLambda<S>,
    actor_rate: f64,
    temperature: f64,
    rng: StdRng,
}

impl<S, A> ActorCritic<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    /// `actor_rate` scales preference updates; `temperature` is the Boltzmann
    /// temperature of the actor.
    pub fn new<H>(
        actions: ActionSpace<S, A>,
        hashing: H,
        critic: TdConfig,
        actor_rate: f64,
        temperature: f64,
    ) -> Result<Self>
    where
        H: HashingScheme<S> + Clone + 'static,
    {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("temperature must be positive, got {temperature}"),
            });
        }
        Ok(Self {
            name: "actor-critic".to_string(),
            actions,
            critic: TdLambda::new(hashing.clone(), critic)?,
            hashing: Box::new(hashing),
            preferences: HashMap::new(),
            actor_rate,
            temperature,
            rng: build_rng(None),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn critic(&self) -> &TdLambda<S> {
        &self.critic
    }

    /// Preference of the actor for `action` in `state`, zero if untouched.
    pub fn preference(&self, state: &S, action: &A) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self
            .preferences
            .get(&hashed)
            .and_then(|prefs| prefs.get(action))
            .copied()
            .unwrap_or(0.0))
    }

    fn distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        let actions = self.actions.applicable(state);
        if actions.is_empty() {
            return Err(Error::NoApplicableActions {
                state: format!("{state:?}"),
            });
        }
        let prefs = actions
            .iter()
            .map(|a| self.preference(state, a))
            .collect::<Result<Vec<f64>>>()?;
        let probs = softmax(&prefs, 1.0 / self.temperature);
        Ok(actions
            .into_iter()
            .zip(probs)
            .map(|(a, p)| ActionProb::new(a, p))
            .collect())
    }
}

impl<S, A> Policy<S, A> for ActorCritic<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    fn action(&mut self, state: &S) -> Result<A> {
        let weighted: Vec<(A, f64)> = self
            .distribution(state)?
            .into_iter()
            .map(|ap| (ap.action, ap.probability))
            .collect();
        weighted_sample(&mut self.rng, &weighted).ok_or_else(|| Error::NoApplicableActions {
            state: format!("{state:?}"),
        })
    }

    fn defined_for(&self, state: &S) -> bool {
        !self.actions.applicable(state).is_empty()
    }
}

impl<S, A> EnumerablePolicy<S, A> for ActorCritic<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        self.distribution(state)
    }
}

impl<S, A> LearningAgent<S, A> for ActorCritic<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    #[tracing::instrument(level = "debug", skip_all, fields(agent = %self.name))]
    fn run_learning_episode(
        &mut self,
        env: &mut dyn Environment<S, A>,
        max_steps: usize,
    ) -> Result<Episode<S, A>> {
        self.critic.initialize_episode();
        let mut episode = Episode::new(env.current_state().clone());
        while episode.len() < max_steps && !env.is_in_terminal() {
            let state = env.current_state().clone();
            let action = self.action(&state)?;
            let outcome = env.execute(&action)?;
            let delta = self.critic.critique(&state, &outcome)?;

            let hashed = self.hashing.hash_state(&state)?;
            *self
                .preferences
                .entry(hashed)
                .or_default()
                .entry(action.clone())
                .or_insert(0.0) += self.actor_rate * delta;

            episode.record(action, outcome);
        }
        debug!(steps = episode.len(), reward = episode.total_reward(), "episode finished");
        Ok(episode)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) -> Result<()> {
        self.preferences.clear();
        self.critic.reset();
        Ok(())
    }
}
