//! Ports (trait boundaries) between the algorithms and their collaborators.
//!
//! Following hexagonal architecture, these traits are owned by the planning
//! and learning core and implemented by domains and adapters.

pub mod action;
pub mod environment;
pub mod learner;
pub mod model;
pub mod policy;

pub use action::{ActionSpace, ActionType, FnActionType, UniversalActionType};
pub use environment::Environment;
pub use learner::LearningAgent;
pub use model::{FullModel, Outcome, SampleModel, Transition, sample_transition};
pub use policy::{EnumerablePolicy, Policy, QProvider};
