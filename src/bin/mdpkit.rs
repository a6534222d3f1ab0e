//! mdpkit CLI - planning and learning experiments on graph MDPs
//!
//! This CLI provides a unified interface for:
//! - Solving a graph with value iteration
//! - Finding goal paths with A* and weighted A*
//! - Training online learners in a simulated environment

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "mdpkit")]
#[command(version, about = "Planning and learning on graph MDPs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a graph with value iteration
    Plan(mdpkit::cli::commands::plan::PlanArgs),

    /// Search for a path to a goal node
    Search(mdpkit::cli::commands::search::SearchArgs),

    /// Train an online learner
    Learn(mdpkit::cli::commands::learn::LearnArgs),
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mdpkit=info,warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan(args) => mdpkit::cli::commands::plan::execute(args),
        Commands::Search(args) => mdpkit::cli::commands::search::execute(args),
        Commands::Learn(args) => mdpkit::cli::commands::learn::execute(args),
    }
}
