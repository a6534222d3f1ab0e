//! Action port - which actions are applicable in a state
//!
//! Planners never enumerate actions themselves; they ask an [`ActionSpace`],
//! which aggregates one or more [`ActionType`]s.

use std::{fmt, sync::Arc};

/// A family of actions, each applicable in some states.
pub trait ActionType<S, A> {
    /// Name of the action family, for logging.
    fn type_name(&self) -> &str;

    /// Every action of this family that can be taken in `state`.
    fn applicable_actions(&self, state: &S) -> Vec<A>;
}

/// A single action that is applicable everywhere.
#[derive(Debug, Clone)]
pub struct UniversalActionType<A> {
    name: String,
    action: A,
}

impl<A> UniversalActionType<A> {
    pub fn new(name: impl Into<String>, action: A) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<S, A: Clone> ActionType<S, A> for UniversalActionType<A> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn applicable_actions(&self, _state: &S) -> Vec<A> {
        vec![self.action.clone()]
    }
}

/// Action family backed by a closure.
pub struct FnActionType<F> {
    name: String,
    actions: F,
}

impl<F> FnActionType<F> {
    pub fn new(name: impl Into<String>, actions: F) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }
}

impl<S, A, F: Fn(&S) -> Vec<A>> ActionType<S, A> for FnActionType<F> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn applicable_actions(&self, state: &S) -> Vec<A> {
        (self.actions)(state)
    }
}

/// The set of action families available to an agent.
pub struct ActionSpace<S, A> {
    types: Vec<Arc<dyn ActionType<S, A>>>,
}

impl<S, A> ActionSpace<S, A> {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Builder-style registration of an action family.
    pub fn with<T: ActionType<S, A> + 'static>(mut self, action_type: T) -> Self {
        self.types.push(Arc::new(action_type));
        self
    }

    pub fn push(&mut self, action_type: Arc<dyn ActionType<S, A>>) {
        self.types.push(action_type);
    }

    /// Applicable actions of every registered family, in registration order.
    pub fn applicable(&self, state: &S) -> Vec<A> {
        self.types
            .iter()
            .flat_map(|t| t.applicable_actions(state))
            .collect()
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.type_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<S, A> Default for ActionSpace<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Clone for ActionSpace<S, A> {
    fn clone(&self) -> Self {
        Self {
            types: self.types.clone(),
        }
    }
}

impl<S, A> fmt::Debug for ActionSpace<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpace")
            .field("types", &self.type_names())
            .finish()
    }
}
