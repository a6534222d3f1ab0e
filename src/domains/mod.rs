//! Small built-in domains for tests, demos and the command-line runner.

pub mod graph;

pub use graph::{EdgeSpec, GraphDomain, GraphDomainBuilder, GraphSpec, GraphState, OutcomeSpec};
