mod common;

use common::{approx_eq, stochastic};
use mdpkit::{
    Error,
    config::SolverConfig,
    domains::{GraphDomain, GraphState},
    episode::Episode,
    features::IndicatorFeatures,
    planning::{DifferentiableVi, LinearStateReward, Mlirl},
    ports::{Outcome, Policy, QProvider},
};
use ndarray::{Array1, array};

type NodeIndicator = IndicatorFeatures<fn(&GraphState) -> mdpkit::Result<usize>>;

fn node_index(s: &GraphState) -> mdpkit::Result<usize> {
    Ok(s.node())
}

fn planner(
    domain: GraphDomain,
    weights: Array1<f64>,
) -> DifferentiableVi<GraphState, String, GraphDomain, LinearStateReward<NodeIndicator>> {
    let features: NodeIndicator = IndicatorFeatures::new(domain.size(), node_index as fn(&GraphState) -> mdpkit::Result<usize>);
    let reward = LinearStateReward::new::<GraphState>(features).with_weights(weights);
    let actions = domain.actions();
    let config = SolverConfig::new(0.9).with_max_delta(1e-12).with_max_iterations(20_000);
    DifferentiableVi::new(domain, actions, GraphState::hashing(), reward, config, 1.0).unwrap()
}

fn value_at(weights: Array1<f64>, node: usize) -> f64 {
    let mut vi = planner(stochastic(), weights);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    vi.value(&GraphState::new(node)).unwrap()
}

#[test]
fn value_gradient_matches_finite_differences() {
    let theta = array![-0.5, 0.2, 1.0, 3.0];
    let mut vi = planner(stochastic(), theta.clone());
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let gradient = vi.value_gradient(&GraphState::new(0)).unwrap();

    let h = 1e-5;
    for i in 0..theta.len() {
        let mut up = theta.clone();
        up[i] += h;
        let mut down = theta.clone();
        down[i] -= h;
        let numeric = (value_at(up, 0) - value_at(down, 0)) / (2.0 * h);
        assert!(
            approx_eq(gradient[i], numeric, 1e-4),
            "parameter {i}: analytic {} numeric {numeric}",
            gradient[i]
        );
    }
}

#[test]
fn terminal_states_have_zero_gradient() {
    let mut vi = planner(stochastic(), array![0.0, 0.0, 0.0, 1.0]);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let g = vi.value_gradient(&GraphState::new(3)).unwrap();
    assert!(g.iter().all(|x| *x == 0.0));
}

#[test]
fn boltzmann_policy_follows_the_reward() {
    let domain = GraphDomain::builder(3)
        .edge(0, "up", 1, 0.0)
        .unwrap()
        .edge(0, "down", 2, 0.0)
        .unwrap()
        .terminal(1)
        .terminal(2)
        .build()
        .unwrap();
    let mut vi = planner(domain, array![0.0, 5.0, 0.0]);
    let mut policy = vi.plan_from_state(&GraphState::new(0)).unwrap().with_seed(4);
    let ups = (0..200)
        .filter(|_| policy.action(&GraphState::new(0)).unwrap() == "up")
        .count();
    assert!(ups > 180, "{ups}");
}

fn expert_episodes() -> Vec<Episode<GraphState, String>> {
    // Both routes out of node 0 end in terminal nodes; the expert goes up.
    (0..5)
        .map(|_| {
            let mut episode = Episode::new(GraphState::new(0));
            episode.record("up".to_string(), Outcome::new(GraphState::new(1), 0.0, true));
            episode
        })
        .collect()
}

fn fork() -> GraphDomain {
    GraphDomain::builder(3)
        .edge(0, "up", 1, 0.0)
        .unwrap()
        .edge(0, "down", 2, 0.0)
        .unwrap()
        .terminal(1)
        .terminal(2)
        .build()
        .unwrap()
}

#[test]
fn mlirl_increases_the_likelihood_of_expert_behavior() {
    let mut vi = planner(fork(), Array1::zeros(3));
    let episodes = expert_episodes();
    let before = Mlirl::log_likelihood(&mut vi, &episodes).unwrap();

    let report = Mlirl::new(0.5, 1e-6, 20).unwrap().run(&mut vi, &episodes).unwrap();
    let after = Mlirl::log_likelihood(&mut vi, &episodes).unwrap();

    assert!(report.steps > 0);
    assert!(after > before, "before {before} after {after}");
    assert!(report.log_likelihoods.windows(2).all(|w| w[1] >= w[0] - 1e-9));
    let theta = vi.reward().weights();
    assert!(theta[1] > theta[2]);
}

#[test]
fn mlirl_rejects_empty_data() {
    let mut vi = planner(fork(), Array1::zeros(3));
    let empty = vec![Episode::new(GraphState::new(0))];
    assert!(matches!(
        Mlirl::new(0.5, 1e-6, 20).unwrap().run(&mut vi, &empty),
        Err(Error::EmptyDataset)
    ));
    assert!(Mlirl::new(0.0, 1e-6, 20).is_err());
}
