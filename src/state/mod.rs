//! State representation and hashing.
//!
//! A state is an opaque container of named variables. Planners never inspect
//! variables directly; they go through a [`HashingScheme`] that turns a state
//! into a [`HashableState`], the key type of every value and policy table.
//!
//! ## Representations
//!
//! - Flat states implement [`State`] directly (see
//!   [`crate::domains::graph::GraphState`]).
//! - Object-oriented states ([`ObjectState`]) decompose into named object
//!   instances with typed attributes.
//!
//! ## Hashing schemes
//!
//! | Scheme | Key | Object names |
//! |--------|-----|--------------|
//! | [`SimpleHashing`] | every (variable, value) binding | significant |
//! | [`SchemaHashing`] | values of a fixed schema, rejects unknown keys | significant |
//! | [`ObjectHashing`] | per-class multiset of attribute vectors | ignored |

pub mod hashing;
pub mod oo;
pub mod value;

use std::{borrow::Cow, fmt};

pub use hashing::{HashableState, HashingScheme, ObjectHashing, SchemaHashing, SimpleHashing, StateKey};
pub use oo::{ObjectInstance, ObjectState, OoState};
pub use value::Value;

use crate::{Result, identifiers::VariableKey};

/// A state of the world, addressed by variable keys.
///
/// Implementations must treat states as values: planners clone them freely and
/// never mutate them in place.
pub trait State: Clone + fmt::Debug {
    /// Keys of every variable bound in this state.
    fn variable_keys(&self) -> Vec<VariableKey>;

    /// Value bound to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingVariable`] if the state has no such variable.
    fn get(&self, key: &VariableKey) -> Result<Value>;
}

/// The fixed set of variable keys a state type exposes.
///
/// State types with a static layout declare their schema as a constant so it
/// is shared by every instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSchema {
    keys: Cow<'static, [VariableKey]>,
}

impl StateSchema {
    /// Schema over a constant key list.
    pub const fn from_static(keys: &'static [VariableKey]) -> Self {
        Self {
            keys: Cow::Borrowed(keys),
        }
    }

    /// Schema over keys known only at runtime.
    pub fn new(keys: Vec<VariableKey>) -> Self {
        Self {
            keys: Cow::Owned(keys),
        }
    }

    pub fn keys(&self) -> &[VariableKey] {
        &self.keys
    }

    pub fn contains(&self, key: &VariableKey) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
