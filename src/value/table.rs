//! Lazily initialized value storage keyed by hashed states.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::state::HashableState;

/// Supplies the value of a state the first time it is looked up.
pub trait ValueInitializer<S> {
    fn initial_value(&self, state: &S) -> f64;
}

/// Same initial value for every state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantValue(pub f64);

impl<S> ValueInitializer<S> for ConstantValue {
    fn initial_value(&self, _state: &S) -> f64 {
        self.0
    }
}

impl<S, F: Fn(&S) -> f64> ValueInitializer<S> for F {
    fn initial_value(&self, state: &S) -> f64 {
        self(state)
    }
}

/// Map from hashed state to value estimate.
///
/// Entries are only ever added or overwritten; [`ValueTable::reset`] is the
/// one way to forget them. Iteration follows insertion order, which keeps
/// sweeps deterministic.
pub struct ValueTable<S> {
    values: HashMap<HashableState<S>, f64>,
    order: Vec<HashableState<S>>,
    init: Arc<dyn ValueInitializer<S>>,
}

impl<S> ValueTable<S> {
    pub fn new(init: impl ValueInitializer<S> + 'static) -> Self {
        Self::with_shared(Arc::new(init))
    }

    pub fn with_shared(init: Arc<dyn ValueInitializer<S>>) -> Self {
        Self {
            values: HashMap::new(),
            order: Vec::new(),
            init,
        }
    }

    /// Table whose unseen states start at `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(ConstantValue(value))
    }

    /// Stored value, or the initializer's value without storing it.
    pub fn peek(&self, state: &HashableState<S>) -> f64 {
        self.values
            .get(state)
            .copied()
            .unwrap_or_else(|| self.init.initial_value(state.state()))
    }

    /// Stored value, initializing and storing it on first access.
    pub fn value(&mut self, state: &HashableState<S>) -> f64 {
        if let Some(v) = self.values.get(state) {
            return *v;
        }
        let v = self.init.initial_value(state.state());
        self.insert_new(state.clone(), v);
        v
    }

    pub fn get(&self, state: &HashableState<S>) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// Overwrite (or create) the entry for `state`.
    pub fn set(&mut self, state: &HashableState<S>, value: f64) {
        match self.values.get_mut(state) {
            Some(slot) => *slot = value,
            None => self.insert_new(state.clone(), value),
        }
    }

    /// Initialize `state` if absent. Returns whether it was new.
    pub fn ensure(&mut self, state: &HashableState<S>) -> bool {
        if self.values.contains_key(state) {
            return false;
        }
        let v = self.init.initial_value(state.state());
        self.insert_new(state.clone(), v);
        true
    }

    pub fn initial_value(&self, state: &S) -> f64 {
        self.init.initial_value(state)
    }

    pub fn contains(&self, state: &HashableState<S>) -> bool {
        self.values.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Stored states in insertion order.
    pub fn states(&self) -> &[HashableState<S>] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HashableState<S>, f64)> + '_ {
        self.order.iter().map(|s| (s, self.values[s]))
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.values.clear();
        self.order.clear();
    }

    fn insert_new(&mut self, state: HashableState<S>, value: f64) {
        self.order.push(state.clone());
        self.values.insert(state, value);
    }
}

impl<S> Clone for ValueTable<S> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            order: self.order.clone(),
            init: Arc::clone(&self.init),
        }
    }
}

impl<S> fmt::Debug for ValueTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().map(|s| (s, self.values[s])))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateKey;

    fn hashed(n: i64) -> HashableState<i64> {
        HashableState::new(n, StateKey::new(vec![n.into()]))
    }

    #[test]
    fn peek_does_not_store() {
        let table: ValueTable<i64> = ValueTable::constant(2.5);
        assert_eq!(table.peek(&hashed(1)), 2.5);
        assert!(table.is_empty());
    }

    #[test]
    fn value_stores_initializer_output() {
        let mut table = ValueTable::new(|s: &i64| *s as f64 * 10.0);
        assert_eq!(table.value(&hashed(3)), 30.0);
        assert_eq!(table.get(&hashed(3)), Some(30.0));
        table.set(&hashed(3), 1.0);
        assert_eq!(table.value(&hashed(3)), 1.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut table: ValueTable<i64> = ValueTable::constant(0.0);
        table.set(&hashed(1), 4.0);
        table.set(&hashed(2), 5.0);
        assert_eq!(table.states().len(), 2);
        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.peek(&hashed(1)), 0.0);
    }
}
