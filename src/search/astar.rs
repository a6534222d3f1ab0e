//! A* and its weighted variants.

use std::{collections::HashMap, fmt::Debug};

use tracing::{debug, trace};

use super::{HashIndexedHeap, Heuristic, SearchPolicy, StateCondition};
use crate::{
    Error, Result,
    config::{ConfigFile, SearchWeighting},
    ports::{ActionSpace, SampleModel},
    state::{HashableState, HashingScheme},
    types::Action,
};

/// One step of a found plan: the action taken in a state and what it led to.
#[derive(Debug, Clone)]
pub struct PlanStep<S, A> {
    pub action: A,
    pub next: HashableState<S>,
    pub reward: f64,
}

struct SearchNode<S, A> {
    state: HashableState<S>,
    /// Parent node index, generating action and its reward
    parent: Option<(usize, A, f64)>,
    g: f64,
    /// Primitive steps from the start
    depth: usize,
}

/// Best-first search planner.
///
/// Successors are obtained by sampling the model once per applicable action,
/// so the model is expected to be deterministic. Found plans are memoized:
/// planning from a state already covered by an earlier plan returns
/// immediately.
pub struct AStar<S, A, M> {
    model: M,
    actions: ActionSpace<S, A>,
    hashing: Box<dyn HashingScheme<S>>,
    heuristic: Box<dyn Heuristic<S>>,
    goal: Box<dyn StateCondition<S>>,
    weighting: SearchWeighting,
    plan: HashMap<HashableState<S>, PlanStep<S, A>>,
    last_expanded: usize,
}

impl<S, A, M> AStar<S, A, M>
where
    S: Clone + Debug,
    A: Action,
    M: SampleModel<S, A>,
{
    /// Plain A* (uniform weighting).
    pub fn new(
        model: M,
        actions: ActionSpace<S, A>,
        hashing: impl HashingScheme<S> + 'static,
        heuristic: impl Heuristic<S> + 'static,
        goal: impl StateCondition<S> + 'static,
    ) -> Self {
        Self {
            model,
            actions,
            hashing: Box::new(hashing),
            heuristic: Box::new(heuristic),
            goal: Box::new(goal),
            weighting: SearchWeighting::Uniform,
            plan: HashMap::new(),
            last_expanded: 0,
        }
    }

    /// Switch to static or dynamic heuristic weighting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGreediness`] for `ε < 1` and
    /// [`Error::InvalidConfiguration`] for an expected depth of zero.
    pub fn with_weighting(mut self, weighting: SearchWeighting) -> Result<Self> {
        weighting.validate()?;
        self.weighting = weighting;
        Ok(self)
    }

    pub fn weighting(&self) -> SearchWeighting {
        self.weighting
    }

    /// Nodes expanded by the most recent search.
    pub fn last_expanded(&self) -> usize {
        self.last_expanded
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn hash(&self, state: &S) -> Result<HashableState<S>> {
        self.hashing.hash_state(state)
    }

    pub fn has_plan_for(&self, state: &HashableState<S>) -> bool {
        self.plan.contains_key(state)
    }

    /// Search from `state` unless an earlier plan already covers it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPlanFound`] when the open list empties without
    /// reaching a goal. Model and hashing failures propagate.
    #[tracing::instrument(level = "debug", skip_all, fields(weighting = ?self.weighting))]
    pub fn plan_from_state(&mut self, state: &S) -> Result<SearchPolicy<'_, S, A>> {
        let start = self.hashing.hash_state(state)?;
        if self.plan.contains_key(&start) {
            trace!(%start, "start state already planned");
            self.last_expanded = 0;
        } else {
            self.search(start)?;
        }
        Ok(self.policy())
    }

    /// Policy over every plan found so far.
    pub fn policy(&self) -> SearchPolicy<'_, S, A> {
        SearchPolicy::new(self.hashing.as_ref(), &self.plan)
    }

    /// Steps of the memoized plan starting at `start`, ending at a goal.
    pub fn path(&self, start: &S) -> Result<Vec<PlanStep<S, A>>> {
        let mut current = self.hashing.hash_state(start)?;
        let mut steps = Vec::new();
        while let Some(step) = self.plan.get(&current) {
            if steps.len() > self.plan.len() {
                break;
            }
            current = step.next.clone();
            steps.push(step.clone());
        }
        if steps.is_empty() && !self.goal.satisfies(start) {
            return Err(Error::PolicyUndefined {
                state: current.to_string(),
            });
        }
        Ok(steps)
    }

    /// Forget every memoized plan.
    pub fn reset_solver(&mut self) {
        self.plan.clear();
        self.last_expanded = 0;
    }

    fn priority(&self, g: f64, depth: usize, state: &S) -> f64 {
        g + self.weighting.heuristic_factor(depth) * self.heuristic.h(state)
    }

    fn search(&mut self, start: HashableState<S>) -> Result<()> {
        let mut nodes = vec![SearchNode {
            state: start.clone(),
            parent: None,
            g: 0.0,
            depth: 0,
        }];
        let mut open: HashIndexedHeap<HashableState<S>, usize> = HashIndexedHeap::new();
        let mut closed: HashMap<HashableState<S>, f64> = HashMap::new();
        let start_priority = self.priority(0.0, 0, start.state());
        open.push(start, 0, start_priority);

        let mut expanded = 0;
        let goal = loop {
            let Some((state, idx, _)) = open.pop() else {
                self.last_expanded = expanded;
                debug!(expanded, "open list exhausted without reaching a goal");
                return Err(Error::NoPlanFound { expanded });
            };
            let (g, depth) = (nodes[idx].g, nodes[idx].depth);
            closed.insert(state.clone(), g);

            if self.goal.satisfies(state.state()) {
                break idx;
            }
            if self.model.is_terminal(state.state()) {
                continue;
            }

            expanded += 1;
            for action in self.actions.applicable(state.state()) {
                let outcome = self.model.sample(state.state(), &action)?;
                let next = self.hashing.hash_state(&outcome.state)?;
                let next_g = g + outcome.reward;
                let next_depth = depth + outcome.steps as usize;

                // Reopening only happens through a strictly better g.
                if closed.get(&next).is_some_and(|&closed_g| closed_g >= next_g) {
                    continue;
                }
                if let Some((&open_idx, _)) = open.get(&next) {
                    if nodes[open_idx].g > next_g {
                        continue;
                    }
                }

                let priority = self.priority(next_g, next_depth, next.state());
                trace!(state = %next, g = next_g, priority, "queue successor");
                nodes.push(SearchNode {
                    state: next.clone(),
                    parent: Some((idx, action, outcome.reward)),
                    g: next_g,
                    depth: next_depth,
                });
                open.push(next, nodes.len() - 1, priority);
            }
        };

        self.last_expanded = expanded;
        debug!(expanded, reward = nodes[goal].g, "goal reached");

        let mut idx = goal;
        while let Some((parent, action, reward)) = nodes[idx].parent.take() {
            let step = PlanStep {
                action,
                next: nodes[idx].state.clone(),
                reward,
            };
            self.plan.insert(nodes[parent].state.clone(), step);
            idx = parent;
        }
        Ok(())
    }
}
