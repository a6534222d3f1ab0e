//! Breadth-first discovery of the states reachable under a full model.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::{
    Result,
    ports::{ActionSpace, FullModel},
    state::{HashableState, HashingScheme},
};

/// Incrementally grown set of explored states.
///
/// A state is explored once its outgoing transitions have been enumerated
/// (or it was found terminal while pruning). Later searches skip explored
/// states, so adding seeds never revisits old territory until
/// [`StateSpace::forget_exploration`] is called.
#[derive(Debug)]
pub struct StateSpace<S> {
    explored: HashSet<HashableState<S>>,
    prune_terminals: bool,
}

impl<S> StateSpace<S> {
    pub fn new(prune_terminals: bool) -> Self {
        Self {
            explored: HashSet::new(),
            prune_terminals,
        }
    }

    pub fn set_prune_terminals(&mut self, prune: bool) {
        self.prune_terminals = prune;
    }

    pub fn explored_len(&self) -> usize {
        self.explored.len()
    }

    /// Make the next search re-enumerate every state it meets.
    pub fn forget_exploration(&mut self) {
        self.explored.clear();
    }

    /// Explore from `seed`, returning every state met for the first time in
    /// breadth-first order (the seed first, when new).
    ///
    /// Terminal states are returned but, when pruning, never expanded.
    pub fn explore<A, M>(
        &mut self,
        model: &M,
        actions: &ActionSpace<S, A>,
        hashing: &dyn HashingScheme<S>,
        seed: HashableState<S>,
    ) -> Result<Vec<HashableState<S>>>
    where
        M: FullModel<S, A>,
    {
        let mut found = Vec::new();
        if self.explored.contains(&seed) {
            return Ok(found);
        }

        let mut queue = VecDeque::new();
        self.explored.insert(seed.clone());
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            found.push(current.clone());
            if self.prune_terminals && model.is_terminal(current.state()) {
                continue;
            }
            for action in actions.applicable(current.state()) {
                let transitions = model.transitions(current.state(), &action)?;
                debug_assert!(
                    (transitions.iter().map(|t| t.probability).sum::<f64>() - 1.0).abs() < 1e-6,
                    "transition probabilities must sum to one"
                );
                for t in transitions {
                    let next = hashing.hash_state(&t.state)?;
                    if self.explored.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        debug!(new_states = found.len(), total = self.explored.len(), "reachability pass finished");
        Ok(found)
    }
}
