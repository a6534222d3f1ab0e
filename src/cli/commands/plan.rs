//! Plan command - solve a graph domain with value iteration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        load_graph,
        output::{export_json, print_kv, print_section},
    },
    config::{ConfigFile, SolverConfig},
    domains::GraphState,
    planning::{SoftmaxBackup, SweepMode, ValueIteration},
    ports::QProvider,
};

#[derive(Parser, Debug)]
#[command(about = "Solve a graph domain with value iteration")]
pub struct PlanArgs {
    /// Graph description (JSON)
    pub graph: PathBuf,

    /// Node to plan from
    #[arg(long, short = 's', default_value_t = 0)]
    pub start: usize,

    /// Solver configuration file; replaces the discount and stopping flags
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 0.99)]
    pub discount: f64,

    #[arg(long, default_value_t = 1e-4)]
    pub max_delta: f64,

    #[arg(long, default_value_t = 1000)]
    pub max_iterations: usize,

    /// Compute each sweep from the previous sweep's values only
    #[arg(long)]
    pub synchronous: bool,

    /// Use a softmax backup with this inverse temperature instead of max
    #[arg(long)]
    pub beta: Option<f64>,

    /// Export values and greedy actions to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Serialize)]
struct StateRow {
    node: usize,
    value: f64,
    action: Option<String>,
}

#[derive(Serialize)]
struct PlanExport {
    iterations: usize,
    converged: bool,
    final_delta: Option<f64>,
    states: Vec<StateRow>,
}

pub fn execute(args: PlanArgs) -> Result<()> {
    let domain = load_graph(&args.graph)?;
    let config = match &args.config {
        Some(path) => SolverConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => SolverConfig::new(args.discount)
            .with_max_delta(args.max_delta)
            .with_max_iterations(args.max_iterations),
    };
    let start = domain.state(args.start)?;
    let actions = domain.actions();
    let mode = if args.synchronous {
        SweepMode::Synchronous
    } else {
        SweepMode::InPlace
    };

    let mut vi = ValueIteration::new(domain, actions, GraphState::hashing(), config)?.with_sweep_mode(mode);
    if let Some(beta) = args.beta {
        vi = vi.with_operator(SoftmaxBackup::new(beta));
    }
    vi.plan_from_state(&start)?;

    let mut rows = Vec::new();
    for (state, value) in vi.values().iter() {
        let action = vi
            .q_values(state.state())?
            .into_iter()
            .fold(None::<(String, f64)>, |best, qv| match best {
                Some((_, q)) if q >= qv.q => best,
                _ => Some((qv.action, qv.q)),
            })
            .map(|(a, _)| a);
        rows.push(StateRow {
            node: state.state().node(),
            value,
            action,
        });
    }
    rows.sort_by_key(|r| r.node);

    let report = vi.last_report().cloned().unwrap_or_default();
    print_section("Value Iteration");
    print_kv("States", &rows.len().to_string());
    print_kv("Iterations", &report.iterations.to_string());
    print_kv("Converged", &report.converged.to_string());
    if let Some(delta) = report.final_delta() {
        print_kv("Final delta", &format!("{delta:.3e}"));
    }

    print_section("Policy");
    for row in &rows {
        println!(
            "  node {:>4}  V = {:>10.4}  {}",
            row.node,
            row.value,
            row.action.as_deref().unwrap_or("-")
        );
    }

    if let Some(path) = &args.export {
        export_json(
            &PlanExport {
                iterations: report.iterations,
                converged: report.converged,
                final_delta: report.final_delta(),
                states: rows,
            },
            path,
        )?;
    }
    Ok(())
}
