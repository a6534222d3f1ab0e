//! Configuration records for the planners and learners.
//!
//! Every record is serde-deserializable, builds with `with_*` methods and is
//! validated both when loaded and when handed to an engine constructor.
//!
//! # Examples
//!
//! ```
//! use mdpkit::config::{ConfigFile, SolverConfig};
//!
//! let config = SolverConfig::new(0.95).with_max_delta(1e-6).with_max_iterations(200);
//! assert!(config.validate().is_ok());
//!
//! let loaded = SolverConfig::from_json(r#"{ "discount": 0.9 }"#)?;
//! assert_eq!(loaded.max_iterations, SolverConfig::default().max_iterations);
//! # Ok::<(), mdpkit::Error>(())
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error, Result,
    learning::learning_rate::{ConstantRate, ExponentialDecay, LearningRate},
    types::{Discount, TraceDecay},
};

/// Loading and validation shared by every configuration record.
pub trait ConfigFile: DeserializeOwned {
    /// Check every field against its legal range.
    fn validate(&self) -> Result<()>;

    /// Parse and validate a JSON document.
    fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read configuration from {}", path.display()),
            source,
        })?;
        Self::from_json(&text)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            message: format!("{name} must be positive and finite, got {value}"),
        })
    }
}

fn nonzero(name: &str, value: usize) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            message: format!("{name} must be at least 1"),
        })
    }
}

/// Dynamic-programming solver settings (value iteration and its variants).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Discount factor γ
    pub discount: f64,
    /// Sweeps stop once the largest value change falls below this
    pub max_delta: f64,
    /// Hard cap on the number of sweeps
    pub max_iterations: usize,
}

impl SolverConfig {
    pub fn new(discount: f64) -> Self {
        Self {
            discount,
            ..Self::default()
        }
    }

    pub fn with_max_delta(mut self, max_delta: f64) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// The validated discount factor.
    pub fn discount(&self) -> Result<Discount> {
        Discount::new(self.discount)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            max_delta: 1e-4,
            max_iterations: 1000,
        }
    }
}

impl ConfigFile for SolverConfig {
    fn validate(&self) -> Result<()> {
        self.discount()?;
        if !(self.max_delta.is_finite() && self.max_delta >= 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("max_delta must be non-negative, got {}", self.max_delta),
            });
        }
        nonzero("max_iterations", self.max_iterations)
    }
}

/// How the heuristic is weighted in best-first search.
///
/// With heuristic `H`, cumulative reward `g` and depth `d` the priority is
/// - `Uniform`: `g + H`
/// - `Static`: `g + (1 + ε)·H`
/// - `Dynamic`: `g + (1 + ε·max(1 − d/N, 0))·H`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWeighting {
    #[default]
    Uniform,
    /// Inflates the heuristic by `1 + ε`, not `ε`: this is `Dynamic` with
    /// `N → ∞`, so `Static { epsilon: 1.0 }` doubles `H`.
    Static { epsilon: f64 },
    Dynamic { epsilon: f64, expected_depth: usize },
}

impl SearchWeighting {
    /// Multiplier applied to the heuristic at search depth `depth`.
    pub fn heuristic_factor(&self, depth: usize) -> f64 {
        match *self {
            SearchWeighting::Uniform => 1.0,
            SearchWeighting::Static { epsilon } => 1.0 + epsilon,
            SearchWeighting::Dynamic {
                epsilon,
                expected_depth,
            } => {
                let w = (1.0 - depth as f64 / expected_depth as f64).max(0.0);
                1.0 + epsilon * w
            }
        }
    }
}

impl ConfigFile for SearchWeighting {
    fn validate(&self) -> Result<()> {
        match *self {
            SearchWeighting::Uniform => Ok(()),
            SearchWeighting::Static { epsilon } => greediness(epsilon),
            SearchWeighting::Dynamic {
                epsilon,
                expected_depth,
            } => {
                greediness(epsilon)?;
                nonzero("expected_depth", expected_depth)
            }
        }
    }
}

fn greediness(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon >= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidGreediness { value: epsilon })
    }
}

/// Serializable description of a learning-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningRateSchedule {
    Constant { rate: f64 },
    Exponential { initial: f64, decay: f64, minimum: f64 },
}

impl LearningRateSchedule {
    /// Instantiate the schedule.
    pub fn build(&self) -> Result<Box<dyn LearningRate>> {
        self.validate()?;
        Ok(match *self {
            LearningRateSchedule::Constant { rate } => Box::new(ConstantRate::new(rate)),
            LearningRateSchedule::Exponential {
                initial,
                decay,
                minimum,
            } => Box::new(ExponentialDecay::new(initial, decay, minimum)),
        })
    }
}

impl Default for LearningRateSchedule {
    fn default() -> Self {
        LearningRateSchedule::Constant { rate: 0.1 }
    }
}

impl ConfigFile for LearningRateSchedule {
    fn validate(&self) -> Result<()> {
        match *self {
            LearningRateSchedule::Constant { rate } => positive("rate", rate),
            LearningRateSchedule::Exponential {
                initial,
                decay,
                minimum,
            } => {
                positive("initial", initial)?;
                if !(decay > 0.0 && decay <= 1.0) {
                    return Err(Error::InvalidConfiguration {
                        message: format!("decay must lie in (0, 1], got {decay}"),
                    });
                }
                if !(minimum.is_finite() && minimum >= 0.0 && minimum <= initial) {
                    return Err(Error::InvalidConfiguration {
                        message: format!("minimum must lie in [0, initial], got {minimum}"),
                    });
                }
                Ok(())
            }
        }
    }
}

/// TD(λ) critic settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdConfig {
    pub discount: f64,
    /// Eligibility trace decay λ
    pub lambda: f64,
    pub learning_rate: LearningRateSchedule,
    /// Value of states before their first update
    pub initial_value: f64,
}

impl TdConfig {
    pub fn new(discount: f64, lambda: f64) -> Self {
        Self {
            discount,
            lambda,
            ..Self::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: LearningRateSchedule) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    pub fn discount(&self) -> Result<Discount> {
        Discount::new(self.discount)
    }

    pub fn lambda(&self) -> Result<TraceDecay> {
        TraceDecay::new(self.lambda)
    }
}

impl Default for TdConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            lambda: 0.9,
            learning_rate: LearningRateSchedule::default(),
            initial_value: 0.0,
        }
    }
}

impl ConfigFile for TdConfig {
    fn validate(&self) -> Result<()> {
        self.discount()?;
        self.lambda()?;
        self.learning_rate.validate()?;
        if self.initial_value.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidConfiguration {
                message: "initial_value must be finite".to_string(),
            })
        }
    }
}

/// Least-squares policy iteration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LspiConfig {
    pub discount: f64,
    /// Policy-iteration rounds per run
    pub max_iterations: usize,
    /// Stop once the weight vector moves less than this (Euclidean norm)
    pub max_change: f64,
    /// Scale of the identity matrix seeding the inverse estimate
    pub identity_scalar: f64,
    /// Transitions collected when planning from a state
    pub planning_samples: usize,
    /// New transitions needed before a learning episode reruns policy iteration
    pub min_new_steps: usize,
    /// Exploration probability of the learning policy
    pub exploration: f64,
    /// Episodes kept in the history
    pub episodes_to_store: usize,
}

impl LspiConfig {
    pub fn new(discount: f64) -> Self {
        Self {
            discount,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_change(mut self, max_change: f64) -> Self {
        self.max_change = max_change;
        self
    }

    pub fn with_identity_scalar(mut self, identity_scalar: f64) -> Self {
        self.identity_scalar = identity_scalar;
        self
    }

    pub fn with_planning_samples(mut self, planning_samples: usize) -> Self {
        self.planning_samples = planning_samples;
        self
    }

    pub fn with_min_new_steps(mut self, min_new_steps: usize) -> Self {
        self.min_new_steps = min_new_steps;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_episodes_to_store(mut self, episodes_to_store: usize) -> Self {
        self.episodes_to_store = episodes_to_store;
        self
    }

    pub fn discount(&self) -> Result<Discount> {
        Discount::new(self.discount)
    }
}

impl Default for LspiConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            max_iterations: 30,
            max_change: 1e-6,
            identity_scalar: 100.0,
            planning_samples: 10_000,
            min_new_steps: 100,
            exploration: 0.1,
            episodes_to_store: 1,
        }
    }
}

impl ConfigFile for LspiConfig {
    fn validate(&self) -> Result<()> {
        self.discount()?;
        nonzero("max_iterations", self.max_iterations)?;
        positive("identity_scalar", self.identity_scalar)?;
        if !(self.max_change.is_finite() && self.max_change >= 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("max_change must be non-negative, got {}", self.max_change),
            });
        }
        if !(0.0..=1.0).contains(&self.exploration) {
            return Err(Error::InvalidConfiguration {
                message: format!("exploration must lie in [0, 1], got {}", self.exploration),
            });
        }
        Ok(())
    }
}
