//! Object-oriented states: a state is a set of named, classed objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{State, Value};
use crate::{
    Error, Result,
    identifiers::{ObjectClass, VariableKey},
};

/// One object of an object-oriented state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInstance {
    name: String,
    class: ObjectClass,
    attributes: BTreeMap<String, Value>,
}

impl ObjectInstance {
    pub fn new(name: impl Into<String>, class: impl Into<ObjectClass>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute assignment.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &ObjectClass {
        &self.class
    }

    /// Attributes sorted by name.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// States decomposed into object instances.
pub trait OoState: State {
    fn objects(&self) -> &[ObjectInstance];

    fn object(&self, name: &str) -> Option<&ObjectInstance> {
        self.objects().iter().find(|o| o.name() == name)
    }

    fn objects_of_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ObjectInstance> + 'a {
        self.objects().iter().filter(move |o| o.class().as_str() == class)
    }
}

/// A general-purpose object-oriented state.
///
/// Variables are addressed as `object.attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectState {
    objects: Vec<ObjectInstance>,
}

impl ObjectState {
    pub fn new(objects: Vec<ObjectInstance>) -> Self {
        Self { objects }
    }

    /// Copy of this state with one object replaced (or added when absent).
    pub fn with_object(&self, object: ObjectInstance) -> Self {
        let mut objects = self.objects.clone();
        match objects.iter_mut().find(|o| o.name == object.name) {
            Some(slot) => *slot = object,
            None => objects.push(object),
        }
        Self { objects }
    }
}

impl State for ObjectState {
    fn variable_keys(&self) -> Vec<VariableKey> {
        self.objects
            .iter()
            .flat_map(|o| {
                o.attributes
                    .keys()
                    .map(move |a| VariableKey::object_attribute(&o.name, a))
            })
            .collect()
    }

    fn get(&self, key: &VariableKey) -> Result<Value> {
        let missing = || Error::MissingVariable {
            key: key.to_string(),
        };
        let (object, attribute) = key.as_str().split_once('.').ok_or_else(missing)?;
        self.object(object)
            .and_then(|o| o.attribute(attribute))
            .cloned()
            .ok_or_else(missing)
    }
}

impl OoState for ObjectState {
    fn objects(&self) -> &[ObjectInstance] {
        &self.objects
    }
}
