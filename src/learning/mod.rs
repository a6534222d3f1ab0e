//! Online and batch learners.
//!
//! - [`TdLambda`]: tabular state-value critic
//! - [`ActorCritic`]: Boltzmann actor trained by a [`TdLambda`] critic
//! - [`Lspi`]: least-squares policy iteration over linear features

pub mod actor_critic;
pub mod dataset;
pub mod learning_rate;
pub mod lspi;
pub mod td_lambda;

pub use actor_critic::ActorCritic;
pub use dataset::{Sars, SarsDataset, collect_uniform_random};
pub use learning_rate::{ConstantRate, ExponentialDecay, LearningRate};
pub use lspi::{Lspi, PolicyIterationReport};
pub use td_lambda::TdLambda;
