//! Value iteration that also tracks the gradient of every state value with
//! respect to the parameters of a differentiable reward function.

use std::{collections::HashMap, fmt::Debug};

use ndarray::Array1;
use tracing::{debug, trace, warn};

use super::{
    DifferentiableBackupOperator, SoftmaxBackup, SweepReport, reachability::StateSpace,
};
use crate::{
    Error, Result,
    config::{ConfigFile, SolverConfig},
    features::{StateFeatures, check_dimension},
    policy::BoltzmannQPolicy,
    ports::{ActionSpace, FullModel, QProvider},
    state::{HashableState, HashingScheme},
    types::{Action, Discount, QValue},
    value::ValueTable,
};

/// Reward function with tunable parameters θ and a known gradient.
pub trait DifferentiableReward<S, A> {
    fn num_parameters(&self) -> usize;

    fn parameters(&self) -> Array1<f64>;

    /// # Errors
    ///
    /// Returns [`Error::FeatureDimension`] when the length is wrong.
    fn set_parameters(&mut self, parameters: Array1<f64>) -> Result<()>;

    fn reward(&self, state: &S, action: &A, next: &S) -> Result<f64>;

    /// ∂r/∂θ for the transition.
    fn gradient(&self, state: &S, action: &A, next: &S) -> Result<Array1<f64>>;
}

/// `r(s, a, s') = θ·φ(s')`.
pub struct LinearStateReward<F> {
    features: F,
    weights: Array1<f64>,
}

impl<F> LinearStateReward<F> {
    /// Reward with all weights zero.
    pub fn new<S>(features: F) -> Self
    where
        F: StateFeatures<S>,
    {
        let weights = Array1::zeros(features.dimension());
        Self { features, weights }
    }

    pub fn with_weights(mut self, weights: Array1<f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }
}

impl<S, A, F: StateFeatures<S>> DifferentiableReward<S, A> for LinearStateReward<F> {
    fn num_parameters(&self) -> usize {
        self.features.dimension()
    }

    fn parameters(&self) -> Array1<f64> {
        self.weights.clone()
    }

    fn set_parameters(&mut self, parameters: Array1<f64>) -> Result<()> {
        check_dimension(self.features.dimension(), parameters.len())?;
        self.weights = parameters;
        Ok(())
    }

    fn reward(&self, _state: &S, _action: &A, next: &S) -> Result<f64> {
        Ok(self.weights.dot(&self.features.features(next)?))
    }

    fn gradient(&self, _state: &S, _action: &A, next: &S) -> Result<Array1<f64>> {
        self.features.features(next)
    }
}

/// Q-value of one action together with its parameter gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct QGradient<A> {
    pub action: A,
    pub q: f64,
    pub gradient: Array1<f64>,
}

/// Value iteration with reward-parameter gradients.
///
/// Rewards come from the [`DifferentiableReward`], not from the model. Each
/// backup returns value and gradient together; the default operator is the
/// Boltzmann softmax with inverse temperature `β`, which is also the
/// temperature of the policy the planner exposes.
pub struct DifferentiableVi<S, A, M, R> {
    model: M,
    actions: ActionSpace<S, A>,
    hashing: Box<dyn HashingScheme<S>>,
    reward: R,
    config: SolverConfig,
    discount: Discount,
    beta: f64,
    operator: Box<dyn DifferentiableBackupOperator>,
    values: ValueTable<S>,
    gradients: HashMap<HashableState<S>, Array1<f64>>,
    space: StateSpace<S>,
    has_run: bool,
}

impl<S, A, M, R> DifferentiableVi<S, A, M, R>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
    R: DifferentiableReward<S, A>,
{
    pub fn new(
        model: M,
        actions: ActionSpace<S, A>,
        hashing: impl HashingScheme<S> + 'static,
        reward: R,
        config: SolverConfig,
        beta: f64,
    ) -> Result<Self> {
        config.validate()?;
        if !(beta.is_finite() && beta > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("boltzmann beta must be positive, got {beta}"),
            });
        }
        Ok(Self {
            model,
            actions,
            hashing: Box::new(hashing),
            reward,
            discount: config.discount()?,
            config,
            beta,
            operator: Box::new(SoftmaxBackup::new(beta)),
            values: ValueTable::constant(0.0),
            gradients: HashMap::new(),
            space: StateSpace::new(true),
            has_run: false,
        })
    }

    pub fn with_operator(mut self, operator: impl DifferentiableBackupOperator + 'static) -> Self {
        self.operator = Box::new(operator);
        self
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn reward(&self) -> &R {
        &self.reward
    }

    /// Mutable reward access; values are stale until the solver is reset and
    /// rerun.
    pub fn reward_mut(&mut self) -> &mut R {
        &mut self.reward
    }

    pub fn values(&self) -> &ValueTable<S> {
        &self.values
    }

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

    pub fn add_state_to_state_space(&mut self, state: &S) -> Result<()> {
        let hashed = self.hashing.hash_state(state)?;
        self.values.ensure(&hashed);
        Ok(())
    }

    /// Solve from `state` if it has no value yet, and return the Boltzmann
    /// policy over the resulting Q-values.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn plan_from_state(&mut self, state: &S) -> Result<BoltzmannQPolicy<&Self>> {
        let hashed = self.hashing.hash_state(state)?;
        if !self.values.contains(&hashed) || !self.has_run {
            self.perform_reachability_from(state)?;
            self.run_vi()?;
        }
        Ok(BoltzmannQPolicy::new(&*self, 1.0 / self.beta))
    }

    pub fn run_vi(&mut self) -> Result<SweepReport> {
        if self.values.is_empty() {
            return Err(Error::ReachabilityNotPerformed);
        }
        let states: Vec<HashableState<S>> = self.values.states().to_vec();
        let mut report = SweepReport::default();

        for iteration in 0..self.config.max_iterations {
            let mut delta: f64 = 0.0;
            for s in &states {
                let (value, gradient) = self.backup(s)?;
                delta = delta.max((value - self.values.peek(s)).abs());
                self.values.set(s, value);
                self.gradients.insert(s.clone(), gradient);
            }
            report.iterations = iteration + 1;
            report.deltas.push(delta);
            trace!(iteration, delta, "differentiable sweep finished");
            if delta < self.config.max_delta {
                report.converged = true;
                break;
            }
        }

        if report.converged {
            debug!(iterations = report.iterations, "differentiable value iteration converged");
        } else {
            warn!(
                iterations = report.iterations,
                "differentiable value iteration hit the iteration cap before converging"
            );
        }
        self.has_run = true;
        Ok(report)
    }

    pub fn reset_solver(&mut self) {
        self.values.reset();
        self.gradients.clear();
        self.space.forget_exploration();
        self.has_run = false;
    }

    /// ∂V(s)/∂θ; zero for terminal and not yet backed-up states.
    pub fn value_gradient(&self, state: &S) -> Result<Array1<f64>> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self.stored_gradient(&hashed))
    }

    /// Q-value and gradient of every applicable action.
    pub fn q_gradients(&self, state: &S) -> Result<Vec<QGradient<A>>> {
        self.actions
            .applicable(state)
            .into_iter()
            .map(|action| {
                let (q, gradient) = self.q_with_gradient(state, &action)?;
                Ok(QGradient {
                    action,
                    q,
                    gradient,
                })
            })
            .collect()
    }

    fn zero_gradient(&self) -> Array1<f64> {
        Array1::zeros(self.reward.num_parameters())
    }

    fn stored_gradient(&self, state: &HashableState<S>) -> Array1<f64> {
        if self.model.is_terminal(state.state()) {
            return self.zero_gradient();
        }
        self.gradients
            .get(state)
            .cloned()
            .unwrap_or_else(|| self.zero_gradient())
    }

    fn state_value(&self, state: &HashableState<S>) -> f64 {
        if self.model.is_terminal(state.state()) {
            0.0
        } else {
            self.values.peek(state)
        }
    }

    fn q_with_gradient(&self, state: &S, action: &A) -> Result<(f64, Array1<f64>)> {
        let gamma = self.discount.value();
        let mut q = 0.0;
        let mut gradient = self.zero_gradient();
        for t in self.model.transitions(state, action)? {
            let next = self.hashing.hash_state(&t.state)?;
            let r = self.reward.reward(state, action, &t.state)?;
            let dr = self.reward.gradient(state, action, &t.state)?;
            q += t.probability * (r + gamma * self.state_value(&next));
            gradient.scaled_add(t.probability, &dr);
            gradient.scaled_add(t.probability * gamma, &self.stored_gradient(&next));
        }
        Ok((q, gradient))
    }

    fn backup(&self, state: &HashableState<S>) -> Result<(f64, Array1<f64>)> {
        if self.model.is_terminal(state.state()) {
            return Ok((0.0, self.zero_gradient()));
        }
        let qs = self.q_gradients(state.state())?;
        if qs.is_empty() {
            return Ok((0.0, self.zero_gradient()));
        }
        let values: Vec<f64> = qs.iter().map(|q| q.q).collect();
        let gradients: Vec<Array1<f64>> = qs.into_iter().map(|q| q.gradient).collect();
        Ok(self.operator.backup_with_gradient(&values, &gradients))
    }
}

impl<S, A, M, R> QProvider<S, A> for DifferentiableVi<S, A, M, R>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
    R: DifferentiableReward<S, A>,
{
    fn q_values(&self, state: &S) -> Result<Vec<QValue<A>>> {
        Ok(self
            .q_gradients(state)?
            .into_iter()
            .map(|q| QValue::new(q.action, q.q))
            .collect())
    }

    fn q_value(&self, state: &S, action: &A) -> Result<f64> {
        Ok(self.q_with_gradient(state, action)?.0)
    }

    fn value(&self, state: &S) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        Ok(self.state_value(&hashed))
    }
}
