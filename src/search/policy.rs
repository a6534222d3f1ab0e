//! Policies read off search results.

use std::{collections::HashMap, fmt::Debug};

use super::{AStar, PlanStep};
use crate::{
    Error, Result,
    ports::{EnumerablePolicy, Policy, SampleModel},
    state::{HashableState, HashingScheme},
    types::{Action, ActionProb},
};

/// Follows the plans a search produced.
///
/// Only states on a found path have an action; anything else is an error.
pub struct SearchPolicy<'a, S, A> {
    hashing: &'a dyn HashingScheme<S>,
    plan: &'a HashMap<HashableState<S>, PlanStep<S, A>>,
}

impl<'a, S, A: Clone> SearchPolicy<'a, S, A> {
    pub(crate) fn new(
        hashing: &'a dyn HashingScheme<S>,
        plan: &'a HashMap<HashableState<S>, PlanStep<S, A>>,
    ) -> Self {
        Self { hashing, plan }
    }

    fn lookup(&self, state: &S) -> Result<A> {
        let hashed = self.hashing.hash_state(state)?;
        self.plan
            .get(&hashed)
            .map(|step| step.action.clone())
            .ok_or_else(|| Error::PolicyUndefined {
                state: hashed.to_string(),
            })
    }
}

impl<S, A: Clone> Policy<S, A> for SearchPolicy<'_, S, A> {
    fn action(&mut self, state: &S) -> Result<A> {
        self.lookup(state)
    }

    fn defined_for(&self, state: &S) -> bool {
        self.lookup(state).is_ok()
    }
}

impl<S, A: Clone> EnumerablePolicy<S, A> for SearchPolicy<'_, S, A> {
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<A>>> {
        Ok(vec![ActionProb::new(self.lookup(state)?, 1.0)])
    }
}

/// Like [`SearchPolicy`], but searches again from any state without a plan.
pub struct ReplanningSearchPolicy<'a, S, A, M> {
    planner: &'a mut AStar<S, A, M>,
}

impl<'a, S, A, M> ReplanningSearchPolicy<'a, S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: SampleModel<S, A>,
{
    pub fn new(planner: &'a mut AStar<S, A, M>) -> Self {
        Self { planner }
    }
}

impl<S, A, M> Policy<S, A> for ReplanningSearchPolicy<'_, S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: SampleModel<S, A>,
{
    fn action(&mut self, state: &S) -> Result<A> {
        self.planner.plan_from_state(state)?.action(state)
    }

    fn defined_for(&self, state: &S) -> bool {
        !self.planner.model().is_terminal(state)
            || self.planner.policy().defined_for(state)
    }
}
