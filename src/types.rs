//! Newtype wrappers and small value records shared by the planners and learners.

use std::{fmt, hash::Hash};

use serde::{Deserialize, Serialize};

/// Bounds every action type must satisfy.
///
/// Actions are used as map keys (policies, actor preferences) and are cloned
/// into search nodes and episodes.
pub trait Action: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Action for T {}

/// A discount factor γ in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Discount(f64);

impl Discount {
    /// Create a new discount factor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDiscount`] if the value is outside [0, 1] or NaN.
    pub fn new(value: f64) -> Result<Self, crate::Error> {
        if (0.0..=1.0).contains(&value) {
            Ok(Discount(value))
        } else {
            Err(crate::Error::InvalidDiscount { value })
        }
    }

    /// Get the inner value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Discount applied over `steps` primitive time steps (γ^k).
    pub fn over(&self, steps: u32) -> f64 {
        self.0.powi(steps as i32)
    }
}

impl From<Discount> for f64 {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Eligibility trace decay λ in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TraceDecay(f64);

impl TraceDecay {
    /// Create a new trace decay.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidTraceDecay`] if the value is outside [0, 1] or NaN.
    pub fn new(value: f64) -> Result<Self, crate::Error> {
        if (0.0..=1.0).contains(&value) {
            Ok(TraceDecay(value))
        } else {
            Err(crate::Error::InvalidTraceDecay { value })
        }
    }

    /// Get the inner value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Estimated value of taking an action in a state.
#[derive(Debug, Clone, PartialEq)]
pub struct QValue<A> {
    pub action: A,
    pub q: f64,
}

impl<A> QValue<A> {
    pub fn new(action: A, q: f64) -> Self {
        QValue { action, q }
    }
}

/// An action paired with the probability a policy assigns to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionProb<A> {
    pub action: A,
    pub probability: f64,
}

impl<A> ActionProb<A> {
    pub fn new(action: A, probability: f64) -> Self {
        ActionProb {
            action,
            probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_validation() {
        assert!(Discount::new(0.0).is_ok());
        assert!(Discount::new(1.0).is_ok());
        assert!(Discount::new(0.95).is_ok());
        assert!(Discount::new(-0.1).is_err());
        assert!(Discount::new(1.01).is_err());
        assert!(Discount::new(f64::NAN).is_err());
    }

    #[test]
    fn test_discount_over_steps() {
        let discount = Discount::new(0.5).unwrap();
        assert_eq!(discount.over(1), 0.5);
        assert_eq!(discount.over(3), 0.125);
        assert_eq!(discount.over(0), 1.0);
    }

    #[test]
    fn test_trace_decay_validation() {
        assert!(TraceDecay::new(0.0).is_ok());
        assert!(TraceDecay::new(0.9).is_ok());
        assert!(TraceDecay::new(2.0).is_err());
    }
}
