//! Learning-rate schedules for incremental estimators.

use std::fmt::Debug;

/// A step-size schedule.
///
/// `poll` is called once per update and may advance the schedule; `peek`
/// never does.
pub trait LearningRate: Debug {
    fn peek(&self) -> f64;

    fn poll(&mut self) -> f64;

    /// Restart the schedule from its initial rate.
    fn reset(&mut self);
}

/// Fixed step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantRate {
    rate: f64,
}

impl ConstantRate {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Default for ConstantRate {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl LearningRate for ConstantRate {
    fn peek(&self) -> f64 {
        self.rate
    }

    fn poll(&mut self) -> f64 {
        self.rate
    }

    fn reset(&mut self) {}
}

/// Step size multiplied by `decay` after every poll, floored at `minimum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    initial: f64,
    decay: f64,
    minimum: f64,
    current: f64,
}

impl ExponentialDecay {
    pub fn new(initial: f64, decay: f64, minimum: f64) -> Self {
        Self {
            initial,
            decay,
            minimum,
            current: initial,
        }
    }
}

impl LearningRate for ExponentialDecay {
    fn peek(&self) -> f64 {
        self.current
    }

    fn poll(&mut self) -> f64 {
        let rate = self.current;
        self.current = (self.current * self.decay).max(self.minimum);
        rate
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}
