//! Learn command - run an online learner on a simulated graph domain

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::{
    adapters::SimulatedEnvironment,
    cli::{
        load_graph,
        output::{export_json, print_kv, print_section},
    },
    config::{LspiConfig, TdConfig},
    domains::GraphState,
    features::{ActionBlockFeatures, IndicatorFeatures},
    learning::{ActorCritic, Lspi},
    ports::{Environment, LearningAgent},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Algorithm {
    ActorCritic,
    Lspi,
}

#[derive(Parser, Debug)]
#[command(about = "Train an online learner on a graph domain")]
pub struct LearnArgs {
    /// Graph description (JSON)
    pub graph: PathBuf,

    #[arg(long, short = 'a', value_enum, default_value = "actor-critic")]
    pub algorithm: Algorithm,

    /// Node every episode starts from
    #[arg(long, short = 's', default_value_t = 0)]
    pub start: usize,

    #[arg(long, short = 'e', default_value_t = 200)]
    pub episodes: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 100)]
    pub max_steps: usize,

    #[arg(long, default_value_t = 0.99)]
    pub discount: f64,

    /// Critic trace decay λ (actor-critic)
    #[arg(long, default_value_t = 0.9)]
    pub lambda: f64,

    /// Actor preference step size (actor-critic)
    #[arg(long, default_value_t = 0.1)]
    pub actor_rate: f64,

    /// Boltzmann temperature of the actor (actor-critic)
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    /// Exploration rate (LSPI)
    #[arg(long, default_value_t = 0.1)]
    pub exploration: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Export per-episode returns to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Serialize)]
struct LearnExport {
    learner: String,
    returns: Vec<f64>,
    lengths: Vec<usize>,
}

pub fn execute(args: LearnArgs) -> Result<()> {
    let mut domain = load_graph(&args.graph)?;
    if let Some(seed) = args.seed {
        domain = domain.reseeded(seed);
    }
    let start = domain.state(args.start)?;
    let actions = domain.actions();

    let mut agent: Box<dyn LearningAgent<GraphState, String>> = match args.algorithm {
        Algorithm::ActorCritic => {
            let critic = TdConfig::new(args.discount, args.lambda);
            let agent = ActorCritic::new(
                actions,
                GraphState::hashing(),
                critic,
                args.actor_rate,
                args.temperature,
            )?;
            Box::new(match args.seed {
                Some(seed) => agent.with_seed(seed),
                None => agent,
            })
        }
        Algorithm::Lspi => {
            let features = ActionBlockFeatures::new(
                IndicatorFeatures::new(domain.size(), |s: &GraphState| -> crate::Result<usize> { Ok(s.node()) }),
                domain.action_names(),
            );
            let config = LspiConfig::new(args.discount).with_exploration(args.exploration);
            let agent = Lspi::new(features, actions, config)?;
            Box::new(match args.seed {
                Some(seed) => agent.with_seed(seed),
                None => agent,
            })
        }
    };

    let mut env = SimulatedEnvironment::new(domain, start);
    let mut returns = Vec::with_capacity(args.episodes);
    let mut lengths = Vec::with_capacity(args.episodes);
    for episode_index in 0..args.episodes {
        env.reset()?;
        let episode = agent.run_learning_episode(&mut env, args.max_steps)?;
        let ret = episode.discounted_return(args.discount);
        info!(episode = episode_index, steps = episode.len(), ret, "episode finished");
        returns.push(ret);
        lengths.push(episode.len());
    }

    let tail = (args.episodes / 10).max(1).min(returns.len());
    let recent = &returns[returns.len() - tail..];
    let recent_mean = if recent.is_empty() {
        0.0
    } else {
        recent.iter().sum::<f64>() / recent.len() as f64
    };

    print_section("Learning");
    print_kv("Learner", agent.name());
    print_kv("Episodes", &args.episodes.to_string());
    print_kv("Mean return (last)", &format!("{recent_mean:.4} over {tail} episodes"));

    if let Some(path) = &args.export {
        export_json(
            &LearnExport {
                learner: agent.name().to_string(),
                returns,
                lengths,
            },
            path,
        )?;
    }
    Ok(())
}
