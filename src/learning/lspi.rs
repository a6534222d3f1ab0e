//! Least-squares policy iteration over linear state-action features.

use std::{collections::VecDeque, fmt::Debug};

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, rngs::StdRng};
use tracing::{debug, info, warn};

use super::dataset::{SarsDataset, collect_uniform_random};
use crate::{
    Error, Result,
    config::{ConfigFile, LspiConfig},
    episode::{Episode, rollout},
    features::{StateActionFeatures, check_dimension},
    policy::{EpsilonGreedy, GreedyQPolicy},
    ports::{ActionSpace, Environment, LearningAgent, QProvider, SampleModel},
    types::{Action, Discount, QValue},
    utils::build_rng,
};

/// Summary of one policy-iteration run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyIterationReport {
    pub iterations: usize,
    /// Euclidean norm of each weight update
    pub changes: Vec<f64>,
    pub converged: bool,
}

/// Least-squares policy iteration.
///
/// `Q(s, a) = w·φ(s, a)`. Each iteration solves LSTDQ for the greedy policy
/// of the current weights with a Sherman–Morrison rank-one update per sample.
/// Works either as a planner (samples drawn from a model) or as a learning
/// agent (samples gathered from its own episodes).
pub struct Lspi<S, A> {
    name: String,
    features: Box<dyn StateActionFeatures<S, A>>,
    actions: ActionSpace<S, A>,
    config: LspiConfig,
    discount: Discount,
    weights: Array1<f64>,
    dataset: SarsDataset<S, A>,
    model: Option<Box<dyn SampleModel<S, A>>>,
    episodes: VecDeque<Episode<S, A>>,
    steps_since_policy_iteration: usize,
    rng: StdRng,
}

impl<S, A> Lspi<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    pub fn new(
        features: impl StateActionFeatures<S, A> + 'static,
        actions: ActionSpace<S, A>,
        config: LspiConfig,
    ) -> Result<Self> {
        config.validate()?;
        let dimension = features.dimension();
        Ok(Self {
            name: "lspi".to_string(),
            features: Box::new(features),
            actions,
            discount: config.discount()?,
            config,
            weights: Array1::zeros(dimension),
            dataset: SarsDataset::new(),
            model: None,
            episodes: VecDeque::new(),
            steps_since_policy_iteration: 0,
            rng: build_rng(None),
        })
    }

    /// Model used by [`Lspi::plan_from_state`] to collect samples.
    pub fn with_model(mut self, model: impl SampleModel<S, A> + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: Array1<f64>) -> Result<()> {
        check_dimension(self.features.dimension(), weights.len())?;
        self.weights = weights;
        Ok(())
    }

    pub fn dataset(&self) -> &SarsDataset<S, A> {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut SarsDataset<S, A> {
        &mut self.dataset
    }

    /// Most recent learning episodes, oldest first.
    pub fn episodes(&self) -> impl Iterator<Item = &Episode<S, A>> + '_ {
        self.episodes.iter()
    }

    /// Solve LSTDQ on the dataset for the greedy policy of the current
    /// weights, without changing them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] when there are no samples.
    pub fn run_lstdq(&self) -> Result<Array1<f64>> {
        if self.dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let k = self.features.dimension();
        let gamma = self.discount.value();
        let mut inverse = Array2::<f64>::eye(k) * self.config.identity_scalar;
        let mut b = Array1::<f64>::zeros(k);

        for sample in self.dataset.iter() {
            let phi = self.features.features(&sample.state, &sample.action)?;
            let next_phi = if sample.terminated {
                Array1::zeros(k)
            } else {
                match self.greedy_action(&sample.next)? {
                    Some(next_action) => self.features.features(&sample.next, &next_action)?,
                    None => Array1::zeros(k),
                }
            };
            let diff = &phi - &(next_phi * gamma);

            let inverse_phi = inverse.dot(&phi);
            let diff_inverse = diff.dot(&inverse);
            let denominator = 1.0 + diff.dot(&inverse_phi);
            let numerator = inverse_phi
                .view()
                .insert_axis(Axis(1))
                .dot(&diff_inverse.view().insert_axis(Axis(0)));
            inverse.scaled_add(-1.0 / denominator, &numerator);
            b.scaled_add(sample.reward, &phi);
        }
        Ok(inverse.dot(&b))
    }

    /// Alternate LSTDQ and greedy improvement until the weights move less
    /// than `max_change` or `max_iterations` rounds ran.
    #[tracing::instrument(level = "debug", skip(self), fields(samples = self.dataset.len()))]
    pub fn run_policy_iteration(&mut self, max_iterations: usize, max_change: f64) -> Result<PolicyIterationReport> {
        let mut report = PolicyIterationReport::default();
        for iteration in 0..max_iterations {
            let updated = self.run_lstdq()?;
            let change = (&updated - &self.weights).mapv(|x| x * x).sum().sqrt();
            self.weights = updated;
            report.iterations = iteration + 1;
            report.changes.push(change);
            debug!(iteration, change, "lstdq solved");
            if change < max_change {
                report.converged = true;
                break;
            }
        }
        if !report.converged {
            warn!(iterations = report.iterations, "policy iteration hit the iteration cap");
        }
        Ok(report)
    }

    /// Collect samples from `state` with a uniform random policy, add them to
    /// the dataset and run policy iteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingModel`] when no model was configured.
    pub fn plan_from_state(&mut self, state: &S) -> Result<GreedyQPolicy<&Self>> {
        let Some(model) = self.model.as_mut() else {
            return Err(Error::MissingModel {
                operation: "plan_from_state".to_string(),
            });
        };
        let samples = collect_uniform_random(
            model.as_mut(),
            &self.actions,
            state,
            self.config.planning_samples,
            self.config.planning_samples,
            &mut self.rng,
        )?;
        self.dataset.extend(samples);
        let report = self.run_policy_iteration(self.config.max_iterations, self.config.max_change)?;
        info!(iterations = report.iterations, converged = report.converged, "lspi planning finished");
        Ok(GreedyQPolicy::new(&*self))
    }

    fn greedy_action(&self, state: &S) -> Result<Option<A>> {
        let mut best: Option<(A, f64)> = None;
        for action in self.actions.applicable(state) {
            let q = self.q(state, &action)?;
            if best.as_ref().is_none_or(|(_, b)| q > *b) {
                best = Some((action, q));
            }
        }
        Ok(best.map(|(a, _)| a))
    }

    fn q(&self, state: &S, action: &A) -> Result<f64> {
        Ok(self.weights.dot(&self.features.features(state, action)?))
    }
}

impl<S, A> QProvider<S, A> for Lspi<S, A>
where
    S: Clone + Debug,
    A: Action,
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
}

impl<S, A> LearningAgent<S, A> for Lspi<S, A>
where
    S: Clone + Debug,
    A: Action,
{
    /// Act epsilon-greedily, keep the transitions and rerun policy iteration
    /// once enough new steps have accumulated.
    #[tracing::instrument(level = "debug", skip_all, fields(agent = %self.name))]
    fn run_learning_episode(
        &mut self,
        env: &mut dyn Environment<S, A>,
        max_steps: usize,
    ) -> Result<Episode<S, A>> {
        let seed = self.rng.random::<u64>();
        let episode = {
            let mut policy = EpsilonGreedy::new(&*self, self.config.exploration).with_seed(seed);
            rollout(&mut policy, &mut *env, max_steps)?
        };

        self.dataset.extend_from_episode(&episode, env.is_in_terminal());
        self.steps_since_policy_iteration += episode.len();
        if self.steps_since_policy_iteration >= self.config.min_new_steps {
            self.run_policy_iteration(self.config.max_iterations, self.config.max_change)?;
            self.steps_since_policy_iteration = 0;
        }

        self.episodes.push_back(episode.clone());
        while self.episodes.len() > self.config.episodes_to_store {
            self.episodes.pop_front();
        }
        Ok(episode)
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Forget weights, samples and episodes.
    fn reset(&mut self) -> Result<()> {
        self.weights = Array1::zeros(self.features.dimension());
        self.dataset.clear();
        self.episodes.clear();
        self.steps_since_policy_iteration = 0;
        Ok(())
    }
}
