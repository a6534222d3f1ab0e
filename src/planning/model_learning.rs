//! Value iteration over a model that is learned while acting.
//!
//! The planner remembers every state it has been asked about. Whenever the
//! model changes, values are rebuilt from scratch over everything reachable
//! from those states.

use std::{collections::HashSet, fmt::Debug};

use rand::{prelude::IndexedRandom, rngs::StdRng};
use tracing::debug;

use super::{SweepReport, ValueIteration};
use crate::{
    Error, Result,
    config::SolverConfig,
    policy::GreedyQPolicy,
    ports::{ActionSpace, FullModel, Policy, QProvider},
    state::{HashableState, HashingScheme},
    types::Action,
    utils::{argmax_all, build_rng},
};

/// Value iteration planner for an evolving model.
pub struct ModelLearningVi<S, A, M> {
    vi: ValueIteration<S, A, M>,
    observed: Vec<HashableState<S>>,
    seen: HashSet<HashableState<S>>,
}

impl<S, A, M> ModelLearningVi<S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
{
    pub fn new(
        model: M,
        actions: ActionSpace<S, A>,
        hashing: impl HashingScheme<S> + 'static,
        config: SolverConfig,
    ) -> Result<Self> {
        Ok(Self {
            vi: ValueIteration::new(model, actions, hashing, config)?,
            observed: Vec::new(),
            seen: HashSet::new(),
        })
    }

    pub fn planner(&self) -> &ValueIteration<S, A, M> {
        &self.vi
    }

    /// Mutable model access; follow changes with
    /// [`ModelLearningVi::model_changed`].
    pub fn model_mut(&mut self) -> &mut M {
        self.vi.model_mut()
    }

    pub fn has_observed(&self, state: &S) -> Result<bool> {
        Ok(self.seen.contains(&self.vi.hash(state)?))
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    /// Record `state` as observed and solve from it.
    pub fn plan_from_state(&mut self, state: &S) -> Result<()> {
        let hashed = self.vi.hash(state)?;
        if self.seen.insert(hashed.clone()) {
            self.observed.push(hashed);
        }
        self.vi.plan_from_state(state)?;
        Ok(())
    }

    /// Rebuild values over everything reachable from the observed states.
    #[tracing::instrument(level = "debug", skip_all, fields(observed = self.observed.len()))]
    pub fn model_changed(&mut self) -> Result<Option<SweepReport>> {
        self.vi.reset_solver();
        for state in &self.observed {
            self.vi.perform_reachability_from(state.state())?;
        }
        if self.vi.values().is_empty() {
            debug!("no observed states yet; nothing to solve");
            return Ok(None);
        }
        self.vi.run_vi().map(Some)
    }

    /// Greedy policy that plans first from any state it has not seen.
    pub fn policy(&mut self) -> ReplanIfUnseenPolicy<'_, S, A, M> {
        ReplanIfUnseenPolicy {
            planner: self,
            rng: build_rng(None),
        }
    }

    pub fn reset_solver(&mut self) {
        self.vi.reset_solver();
        self.observed.clear();
        self.seen.clear();
    }
}

/// Greedy policy over a [`ModelLearningVi`] that replans from unseen states.
pub struct ReplanIfUnseenPolicy<'a, S, A, M> {
    planner: &'a mut ModelLearningVi<S, A, M>,
    rng: StdRng,
}

impl<S, A, M> ReplanIfUnseenPolicy<'_, S, A, M> {
    /// Seed greedy tie-breaking.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }
}

impl<S, A, M> Policy<S, A> for ReplanIfUnseenPolicy<'_, S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: FullModel<S, A>,
{
    fn action(&mut self, state: &S) -> Result<A> {
        if !self.planner.has_observed(state)? {
            self.planner.plan_from_state(state)?;
        }
        let qs = self.planner.vi.q_values(state)?;
        let values: Vec<f64> = qs.iter().map(|q| q.q).collect();
        argmax_all(&values)
            .choose(&mut self.rng)
            .map(|&i| qs[i].action.clone())
            .ok_or_else(|| Error::NoApplicableActions {
                state: format!("{state:?}"),
            })
    }

    fn defined_for(&self, state: &S) -> bool {
        GreedyQPolicy::new(&self.planner.vi).defined_for(state)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        config::SolverConfig,
        domains::GraphState,
        ports::{Outcome, SampleModel, Transition, UniversalActionType},
    };

    /// Learned dynamics: unvisited pairs are assumed to loop with reward one.
    #[derive(Default)]
    struct Optimistic {
        known: HashMap<usize, (usize, f64)>,
    }

    impl Optimistic {
        fn learn(&mut self, from: usize, to: usize, reward: f64) {
            self.known.insert(from, (to, reward));
        }

        fn next(&self, state: &GraphState) -> (usize, f64) {
            self.known.get(&state.node()).copied().unwrap_or((state.node(), 1.0))
        }
    }

    impl SampleModel<GraphState, char> for Optimistic {
        fn sample(&mut self, state: &GraphState, _action: &char) -> Result<Outcome<GraphState>> {
            let (to, reward) = self.next(state);
            Ok(Outcome::new(GraphState::new(to), reward, to == 2))
        }

        fn is_terminal(&self, state: &GraphState) -> bool {
            state.node() == 2
        }
    }

    impl FullModel<GraphState, char> for Optimistic {
        fn transitions(&self, state: &GraphState, _action: &char) -> Result<Vec<Transition<GraphState>>> {
            let (to, reward) = self.next(state);
            Ok(vec![Transition::new(1.0, GraphState::new(to), reward)])
        }
    }

    fn planner() -> ModelLearningVi<GraphState, char, Optimistic> {
        let actions = ActionSpace::new().with(UniversalActionType::new("step", 'a'));
        let config = SolverConfig::new(0.9).with_max_delta(1e-10).with_max_iterations(10_000);
        ModelLearningVi::new(Optimistic::default(), actions, GraphState::hashing(), config).unwrap()
    }

    #[test]
    fn rebuilds_values_after_the_model_changes() {
        let mut planner = planner();
        planner.plan_from_state(&GraphState::new(0)).unwrap();
        let v0 = planner.planner().value(&GraphState::new(0)).unwrap();
        assert!((v0 - 10.0).abs() < 1e-6);

        planner.model_mut().learn(0, 1, 0.0);
        let report = planner.model_changed().unwrap().unwrap();
        assert!(report.converged);
        let v0 = planner.planner().value(&GraphState::new(0)).unwrap();
        let v1 = planner.planner().value(&GraphState::new(1)).unwrap();
        assert!((v1 - 10.0).abs() < 1e-6);
        assert!((v0 - 9.0).abs() < 1e-6);
        assert_eq!(planner.planner().values().len(), 2);
    }

    #[test]
    fn model_change_without_observations_is_a_no_op() {
        let mut planner = planner();
        assert!(planner.model_changed().unwrap().is_none());
    }

    #[test]
    fn policy_plans_from_unseen_states() {
        let mut planner = planner();
        planner.plan_from_state(&GraphState::new(0)).unwrap();
        assert!(!planner.has_observed(&GraphState::new(1)).unwrap());
        {
            let mut policy = planner.policy().with_seed(1);
            assert_eq!(policy.action(&GraphState::new(1)).unwrap(), 'a');
        }
        assert!(planner.has_observed(&GraphState::new(1)).unwrap());
        assert_eq!(planner.observed_len(), 2);

        planner.reset_solver();
        assert_eq!(planner.observed_len(), 0);
    }
}
