//! Identifier types for state variables and object classes.
//!
//! These types provide type-safe wrappers around the string names used to
//! address state variables and to group objects by class.

use std::{borrow::Borrow, borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

/// Name of a state variable.
///
/// Flat state types usually hand out `'static` keys from a constant schema,
/// object-oriented states build `object.attribute` keys on demand.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableKey(Cow<'static, str>);

impl VariableKey {
    /// Create a key from a static string without allocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdpkit::identifiers::VariableKey;
    ///
    /// const NODE: VariableKey = VariableKey::from_static("node");
    /// assert_eq!(NODE.as_str(), "node");
    /// ```
    pub const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Create a key from any owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    /// Key of an attribute belonging to a named object.
    pub fn object_attribute(object: &str, attribute: &str) -> Self {
        Self::new(format!("{object}.{attribute}"))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for VariableKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Borrow<str> for VariableKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for VariableKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for VariableKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for VariableKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Name of an object class in an object-oriented state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectClass(String);

impl ObjectClass {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectClass {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_owned_keys_compare_equal() {
        let a = VariableKey::from_static("x");
        let b = VariableKey::new(String::from("x"));
        assert_eq!(a, b);
        assert_eq!(a, "x");
    }

    #[test]
    fn object_attribute_keys_are_dotted() {
        let key = VariableKey::object_attribute("agent0", "x");
        assert_eq!(key.as_str(), "agent0.x");
    }
}
