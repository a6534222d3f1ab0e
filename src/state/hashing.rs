//! Hashable state wrappers and the hashing schemes that build them.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use super::{OoState, State, StateSchema, Value};
use crate::{Error, Result};

/// Canonical encoding of a state produced by a hashing scheme.
///
/// Two states are the same key exactly when their encodings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[Value]>);

impl StateKey {
    pub fn new(parts: Vec<Value>) -> Self {
        StateKey(parts.into_boxed_slice())
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, "]")
    }
}

struct Hashed<S> {
    state: S,
    key: StateKey,
    hash: u64,
}

/// A state together with its canonical key and precomputed hash.
///
/// Cloning is cheap (shared ownership), so the same hashed state can key the
/// value table, the open list and the policy map at once. Equality and
/// hashing look only at the key, never at the wrapped state.
pub struct HashableState<S>(Arc<Hashed<S>>);

impl<S> HashableState<S> {
    pub fn new(state: S, key: StateKey) -> Self {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        HashableState(Arc::new(Hashed { state, key, hash }))
    }

    /// The wrapped state.
    pub fn state(&self) -> &S {
        &self.0.state
    }

    pub fn key(&self) -> &StateKey {
        &self.0.key
    }

    pub fn hash_code(&self) -> u64 {
        self.0.hash
    }
}

impl<S> Clone for HashableState<S> {
    fn clone(&self) -> Self {
        HashableState(Arc::clone(&self.0))
    }
}

impl<S> PartialEq for HashableState<S> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.key == other.0.key)
    }
}

impl<S> Eq for HashableState<S> {}

impl<S> Hash for HashableState<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl<S> fmt::Debug for HashableState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashableState").field(&self.0.key).finish()
    }
}

impl<S> fmt::Display for HashableState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.key)
    }
}

/// Turns states into hashable keys.
///
/// Implementations must be deterministic and side-effect free: hashing the
/// same semantic state twice yields equal keys.
pub trait HashingScheme<S> {
    /// # Errors
    ///
    /// Returns a domain-shape error ([`Error::InvalidStateKind`],
    /// [`Error::MissingVariable`]) when the state does not fit the scheme.
    fn hash_state(&self, state: &S) -> Result<HashableState<S>>;
}

impl<S, H: HashingScheme<S> + ?Sized> HashingScheme<S> for &H {
    fn hash_state(&self, state: &S) -> Result<HashableState<S>> {
        (**self).hash_state(state)
    }
}

/// Keys a state by all of its (variable, value) bindings.
///
/// Variable order does not matter; object names in OO states do.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHashing;

impl<S: State> HashingScheme<S> for SimpleHashing {
    fn hash_state(&self, state: &S) -> Result<HashableState<S>> {
        let mut keys = state.variable_keys();
        keys.sort();
        let mut parts = Vec::with_capacity(keys.len() * 2);
        for key in keys {
            let value = state.get(&key)?;
            parts.push(Value::Text(key.as_str().to_string()));
            parts.push(value);
        }
        Ok(HashableState::new(state.clone(), StateKey::new(parts)))
    }
}

/// Keys a state by the values of a fixed schema.
///
/// States exposing a key outside the schema fail with
/// [`Error::InvalidStateKind`]; states lacking a schema key fail with
/// [`Error::MissingVariable`].
#[derive(Debug, Clone)]
pub struct SchemaHashing {
    schema: StateSchema,
}

impl SchemaHashing {
    pub fn new(schema: StateSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }
}

impl<S: State> HashingScheme<S> for SchemaHashing {
    fn hash_state(&self, state: &S) -> Result<HashableState<S>> {
        if let Some(unknown) = state
            .variable_keys()
            .into_iter()
            .find(|key| !self.schema.contains(key))
        {
            return Err(Error::InvalidStateKind {
                key: unknown.to_string(),
            });
        }
        let parts = self
            .schema
            .keys()
            .iter()
            .map(|key| state.get(key))
            .collect::<Result<Vec<_>>>()?;
        Ok(HashableState::new(state.clone(), StateKey::new(parts)))
    }
}

/// Keys an object-oriented state independently of object identity.
///
/// Objects are reduced to (class, attribute bindings) and the resulting
/// multiset is sorted, so renaming or reordering objects of the same class
/// leaves the key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectHashing;

impl<S: OoState> HashingScheme<S> for ObjectHashing {
    fn hash_state(&self, state: &S) -> Result<HashableState<S>> {
        let mut objects: Vec<Vec<Value>> = state
            .objects()
            .iter()
            .map(|object| {
                let mut parts = Vec::with_capacity(1 + object.attributes().len() * 2);
                parts.push(Value::Text(object.class().as_str().to_string()));
                for (name, value) in object.attributes() {
                    parts.push(Value::Text(name.clone()));
                    parts.push(value.clone());
                }
                parts
            })
            .collect();
        objects.sort();

        let mut parts = Vec::new();
        for object in objects {
            parts.push(Value::Int(object.len() as i64));
            parts.extend(object);
        }
        Ok(HashableState::new(state.clone(), StateKey::new(parts)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{identifiers::VariableKey, state::ObjectInstance, state::ObjectState};

    #[derive(Debug, Clone)]
    struct Pair {
        keys: Vec<(&'static str, i64)>,
    }

    impl State for Pair {
        fn variable_keys(&self) -> Vec<VariableKey> {
            self.keys.iter().map(|(k, _)| VariableKey::from_static(k)).collect()
        }

        fn get(&self, key: &VariableKey) -> Result<Value> {
            self.keys
                .iter()
                .find(|(k, _)| key == k)
                .map(|(_, v)| Value::Int(*v))
                .ok_or_else(|| Error::MissingVariable {
                    key: key.to_string(),
                })
        }
    }

    #[test]
    fn simple_hashing_ignores_variable_order() {
        let a = Pair {
            keys: vec![("x", 1), ("y", 2)],
        };
        let b = Pair {
            keys: vec![("y", 2), ("x", 1)],
        };
        let ha = SimpleHashing.hash_state(&a).unwrap();
        let hb = SimpleHashing.hash_state(&b).unwrap();
        assert_eq!(ha, hb);

        let mut table = HashMap::new();
        table.insert(ha, 1.0);
        assert_eq!(table.get(&hb), Some(&1.0));
    }

    #[test]
    fn simple_hashing_distinguishes_values() {
        let a = Pair {
            keys: vec![("x", 1)],
        };
        let b = Pair {
            keys: vec![("x", 2)],
        };
        assert_ne!(
            SimpleHashing.hash_state(&a).unwrap(),
            SimpleHashing.hash_state(&b).unwrap()
        );
    }

    #[test]
    fn schema_hashing_rejects_unknown_keys() {
        const KEYS: &[VariableKey] = &[VariableKey::from_static("x")];
        let scheme = SchemaHashing::new(StateSchema::from_static(KEYS));
        let state = Pair {
            keys: vec![("x", 1), ("z", 3)],
        };
        let err = scheme.hash_state(&state).unwrap_err();
        assert!(matches!(err, Error::InvalidStateKind { key } if key == "z"));
    }

    #[test]
    fn schema_hashing_reports_missing_keys() {
        let scheme = SchemaHashing::new(StateSchema::new(vec![
            VariableKey::from_static("x"),
            VariableKey::from_static("y"),
        ]));
        let state = Pair {
            keys: vec![("x", 1)],
        };
        let err = scheme.hash_state(&state).unwrap_err();
        assert!(matches!(err, Error::MissingVariable { key } if key == "y"));
    }

    #[test]
    fn object_hashing_ignores_names_and_order() {
        let a = ObjectState::new(vec![
            ObjectInstance::new("block0", "block").with("x", 1).with("y", 0),
            ObjectInstance::new("block1", "block").with("x", 4).with("y", 2),
        ]);
        let b = ObjectState::new(vec![
            ObjectInstance::new("b", "block").with("x", 4).with("y", 2),
            ObjectInstance::new("a", "block").with("x", 1).with("y", 0),
        ]);
        assert_eq!(
            ObjectHashing.hash_state(&a).unwrap(),
            ObjectHashing.hash_state(&b).unwrap()
        );
        assert_ne!(
            SimpleHashing.hash_state(&a).unwrap(),
            SimpleHashing.hash_state(&b).unwrap()
        );
    }

    #[test]
    fn object_hashing_keeps_classes_apart() {
        let a = ObjectState::new(vec![ObjectInstance::new("o", "agent").with("x", 1)]);
        let b = ObjectState::new(vec![ObjectInstance::new("o", "goal").with("x", 1)]);
        assert_ne!(
            ObjectHashing.hash_state(&a).unwrap(),
            ObjectHashing.hash_state(&b).unwrap()
        );
    }

    #[test]
    fn object_hashing_is_stable_for_nan_attributes() {
        let a = ObjectState::new(vec![
            ObjectInstance::new("a", "block").with("x", Value::Real(-f64::NAN)),
            ObjectInstance::new("b", "block").with("x", Value::Real(1.0)),
        ]);
        let b = ObjectState::new(vec![
            ObjectInstance::new("a", "block").with("x", Value::Real(f64::NAN)),
            ObjectInstance::new("b", "block").with("x", Value::Real(1.0)),
        ]);
        let c = ObjectState::new(vec![
            ObjectInstance::new("b", "block").with("x", Value::Real(1.0)),
            ObjectInstance::new("a", "block").with("x", Value::Real(-f64::NAN)),
        ]);
        let ha = ObjectHashing.hash_state(&a).unwrap();
        assert_eq!(ha.key(), ObjectHashing.hash_state(&b).unwrap().key());
        assert_eq!(ha.key(), ObjectHashing.hash_state(&c).unwrap().key());
    }
}
