//! Search command - A* and weighted A* between graph nodes

use std::{collections::BTreeSet, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        load_graph,
        output::{export_json, print_kv, print_section},
    },
    config::{ConfigFile, SearchWeighting},
    domains::GraphState,
    search::{AStar, ZeroHeuristic},
};

#[derive(Parser, Debug)]
#[command(about = "Find a path to a goal node with best-first search")]
pub struct SearchArgs {
    /// Graph description (JSON)
    pub graph: PathBuf,

    /// Node to search from
    #[arg(long, short = 's', default_value_t = 0)]
    pub start: usize,

    /// Goal node; repeat for several goals
    #[arg(long, short = 'g', required = true)]
    pub goal: Vec<usize>,

    /// Heuristic weighting file; replaces `--epsilon` and `--expected-depth`
    #[arg(long)]
    pub weighting: Option<PathBuf>,

    /// Heuristic inflation ε (static weighting unless an expected depth is given)
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Expected solution depth N for dynamic weighting
    #[arg(long, requires = "epsilon")]
    pub expected_depth: Option<usize>,

    /// Export the path to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Serialize)]
struct StepRow {
    from: usize,
    action: String,
    to: usize,
    reward: f64,
}

#[derive(Serialize)]
struct SearchExport {
    weighting: SearchWeighting,
    expanded: usize,
    total_reward: f64,
    steps: Vec<StepRow>,
}

pub fn execute(args: SearchArgs) -> Result<()> {
    let domain = load_graph(&args.graph)?;
    let weighting = match (&args.weighting, args.epsilon, args.expected_depth) {
        (Some(path), _, _) => {
            SearchWeighting::from_path(path).with_context(|| format!("loading {}", path.display()))?
        }
        (None, Some(epsilon), Some(expected_depth)) => SearchWeighting::Dynamic {
            epsilon,
            expected_depth,
        },
        (None, Some(epsilon), None) => SearchWeighting::Static { epsilon },
        (None, None, _) => SearchWeighting::Uniform,
    };

    for &goal in &args.goal {
        domain.state(goal)?;
    }
    let goals: BTreeSet<usize> = args.goal.iter().copied().collect();
    let start = domain.state(args.start)?;
    let actions = domain.actions();

    let mut search = AStar::new(
        domain,
        actions,
        GraphState::hashing(),
        ZeroHeuristic,
        move |s: &GraphState| goals.contains(&s.node()),
    )
    .with_weighting(weighting)?;

    search.plan_from_state(&start)?;
    let expanded = search.last_expanded();
    let path = search.path(&start)?;

    let mut from = args.start;
    let mut steps = Vec::with_capacity(path.len());
    for step in path {
        let to = step.next.state().node();
        steps.push(StepRow {
            from,
            action: step.action,
            to,
            reward: step.reward,
        });
        from = to;
    }
    let total_reward: f64 = steps.iter().map(|s| s.reward).sum();

    print_section("Search");
    print_kv("Weighting", &format!("{weighting:?}"));
    print_kv("Expanded", &expanded.to_string());
    print_kv("Steps", &steps.len().to_string());
    print_kv("Total reward", &format!("{total_reward:.4}"));

    print_section("Path");
    for step in &steps {
        println!("  {:>4} --{}--> {:<4} ({:+.4})", step.from, step.action, step.to, step.reward);
    }

    if let Some(path) = &args.export {
        export_json(
            &SearchExport {
                weighting,
                expanded,
                total_reward,
                steps,
            },
            path,
        )?;
    }
    Ok(())
}
