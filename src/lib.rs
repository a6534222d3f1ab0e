//! Planning and learning for Markov decision processes
//!
//! This crate provides:
//! - Hashable states and lazily initialized value tables
//! - Best-first search: A*, statically and dynamically weighted A*
//! - Value iteration, a differentiable variant and maximum-likelihood IRL
//! - Multi-agent dynamic programming for stochastic games
//! - TD(λ), actor-critic and least-squares policy iteration
//! - A graph domain loadable from JSON for experiments

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domains;
pub mod episode;
pub mod error;
pub mod features;
pub mod identifiers;
pub mod learning;
pub mod multiagent;
pub mod planning;
pub mod policy;
pub mod ports;
pub mod search;
pub mod state;
pub mod types;
pub mod utils;
pub mod value;

pub use error::{Error, Result};
pub use types::{Action, ActionProb, Discount, QValue, TraceDecay};
