//! Best-first search over sampled successors.
//!
//! | Weighting | Priority |
//! |-----------|----------|
//! | Uniform (A*) | `g + H` |
//! | Static | `g + (1 + ε)·H` |
//! | Dynamic | `g + (1 + ε·max(1 − d/N, 0))·H` |
//!
//! `g` is the cumulative reward of the path so far and `H` an optimistic
//! (non-positive for cost domains) estimate of the reward still to come.

pub mod astar;
pub mod heap;
pub mod policy;

pub use astar::{AStar, PlanStep};
pub use heap::HashIndexedHeap;
pub use policy::{ReplanningSearchPolicy, SearchPolicy};

/// Estimate of the reward still obtainable from a state.
///
/// Admissible heuristics never underestimate it; for cost domains this means
/// a non-positive value no smaller than the negated remaining cost.
pub trait Heuristic<S> {
    fn h(&self, state: &S) -> f64;
}

impl<S, F: Fn(&S) -> f64> Heuristic<S> for F {
    fn h(&self, state: &S) -> f64 {
        self(state)
    }
}

/// Heuristic that knows nothing; turns A* into uniform-cost search.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl<S> Heuristic<S> for ZeroHeuristic {
    fn h(&self, _state: &S) -> f64 {
        0.0
    }
}

/// Predicate over states, used as the search goal.
pub trait StateCondition<S> {
    fn satisfies(&self, state: &S) -> bool;
}

impl<S, F: Fn(&S) -> bool> StateCondition<S> for F {
    fn satisfies(&self, state: &S) -> bool {
        self(state)
    }
}
