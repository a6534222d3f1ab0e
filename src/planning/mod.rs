//! Dynamic-programming planners over full models.
//!
//! - [`ValueIteration`]: reachability-seeded Bellman sweeps with a pluggable
//!   [`BackupOperator`]
//! - [`DifferentiableVi`]: the same sweeps carrying reward-parameter gradients
//! - [`Mlirl`]: inverse reinforcement learning on top of [`DifferentiableVi`]
//! - [`ModelLearningVi`]: value iteration that rebuilds when its model changes

pub mod differentiable;
pub mod mlirl;
pub mod model_learning;
pub mod operators;
pub mod reachability;
pub mod value_iteration;

pub use differentiable::{DifferentiableReward, DifferentiableVi, LinearStateReward, QGradient};
pub use mlirl::{Mlirl, MlirlReport};
pub use model_learning::{ModelLearningVi, ReplanIfUnseenPolicy};
pub use operators::{BackupOperator, DifferentiableBackupOperator, MaxBackup, SoftmaxBackup};
pub use reachability::StateSpace;
pub use value_iteration::{SweepMode, SweepReport, ValueIteration};
