//! Adapters implementing the ports.
//!
//! Following hexagonal architecture, adapters depend on ports, not the other
//! way around.

pub mod simulated_environment;

pub use simulated_environment::SimulatedEnvironment;
