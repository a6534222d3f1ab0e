//! Command-line interface for running planners and learners on graph
//! domains.

pub mod commands;
pub mod output;

use std::path::Path;

use anyhow::{Context, Result};

use crate::domains::{GraphDomain, GraphSpec};

/// Load a graph domain from its JSON description.
pub fn load_graph(path: &Path) -> Result<GraphDomain> {
    let spec = GraphSpec::from_path(path).with_context(|| format!("loading graph {}", path.display()))?;
    GraphDomain::from_spec(&spec).with_context(|| format!("building graph {}", path.display()))
}
