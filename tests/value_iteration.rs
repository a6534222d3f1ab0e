mod common;

use common::{approx_eq, chain, stochastic};
use mdpkit::{
    Error,
    config::SolverConfig,
    domains::GraphState,
    planning::{SweepMode, ValueIteration},
    ports::{FullModel, Policy, QProvider, SampleModel},
};

fn solver(mode: SweepMode) -> ValueIteration<GraphState, String, mdpkit::domains::GraphDomain> {
    let domain = stochastic();
    let actions = domain.actions();
    let config = SolverConfig::new(0.9).with_max_delta(1e-10).with_max_iterations(10_000);
    ValueIteration::new(domain, actions, GraphState::hashing(), config)
        .unwrap()
        .with_sweep_mode(mode)
}

#[test]
fn chain_values_are_discounted_step_costs() {
    let domain = chain(3);
    let actions = domain.actions();
    let mut vi = ValueIteration::new(domain, actions, GraphState::hashing(), SolverConfig::new(0.9)).unwrap();
    vi.plan_from_state(&GraphState::new(0)).unwrap();

    assert!(approx_eq(vi.value(&GraphState::new(0)).unwrap(), -1.9, 1e-6));
    assert!(approx_eq(vi.value(&GraphState::new(1)).unwrap(), -1.0, 1e-6));
    assert_eq!(vi.value(&GraphState::new(2)).unwrap(), 0.0);
    assert_eq!(vi.values().len(), 3);
}

#[test]
fn converged_values_satisfy_the_bellman_equation() {
    let mut vi = solver(SweepMode::InPlace);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    assert!(vi.last_report().unwrap().converged);

    let actions = vi.model().actions();
    for node in 0..4 {
        let state = GraphState::new(node);
        if vi.model().is_terminal(&state) {
            assert_eq!(vi.value(&state).unwrap(), 0.0);
            continue;
        }
        let best = actions
            .applicable(&state)
            .iter()
            .map(|a| {
                vi.model()
                    .transitions(&state, a)
                    .unwrap()
                    .iter()
                    .map(|t| t.probability * (t.reward + 0.9 * vi.value(&t.state).unwrap()))
                    .sum::<f64>()
            })
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(
            approx_eq(vi.value(&state).unwrap(), best, 1e-8),
            "node {node}: {} vs {best}",
            vi.value(&state).unwrap()
        );
    }
}

#[test]
fn sweep_modes_agree_on_the_fixed_point() {
    let mut in_place = solver(SweepMode::InPlace);
    let mut synchronous = solver(SweepMode::Synchronous);
    in_place.plan_from_state(&GraphState::new(0)).unwrap();
    synchronous.plan_from_state(&GraphState::new(0)).unwrap();
    for node in 0..4 {
        let s = GraphState::new(node);
        assert!(approx_eq(in_place.value(&s).unwrap(), synchronous.value(&s).unwrap(), 1e-8));
    }
}

#[test]
fn synchronous_deltas_never_grow() {
    let mut vi = solver(SweepMode::Synchronous);
    vi.perform_reachability_from(&GraphState::new(0)).unwrap();
    let report = vi.run_vi().unwrap();
    assert!(report.iterations > 2);
    for pair in report.deltas.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "{:?}", report.deltas);
    }
}

#[test]
fn greedy_policy_takes_the_better_branch() {
    let domain = mdpkit::domains::GraphDomain::builder(3)
        .edge(0, "short", 2, -5.0)
        .unwrap()
        .edge(0, "long", 1, -1.0)
        .unwrap()
        .edge(1, "go", 2, -1.0)
        .unwrap()
        .terminal(2)
        .build()
        .unwrap();
    let actions = domain.actions();
    let mut vi = ValueIteration::new(domain, actions, GraphState::hashing(), SolverConfig::new(1.0)).unwrap();
    let mut policy = vi.plan_from_state(&GraphState::new(0)).unwrap();
    assert_eq!(policy.action(&GraphState::new(0)).unwrap(), "long");
}

#[test]
fn solving_without_states_is_an_error() {
    let mut vi = solver(SweepMode::InPlace);
    assert!(matches!(vi.run_vi(), Err(Error::ReachabilityNotPerformed)));
}

#[test]
fn replanning_known_states_does_not_sweep_again() {
    let mut vi = solver(SweepMode::InPlace);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let first = vi.last_report().cloned();
    assert!(!vi.perform_reachability_from(&GraphState::new(1)).unwrap());
    vi.plan_from_state(&GraphState::new(1)).unwrap();
    assert_eq!(vi.last_report().cloned(), first);

    vi.reset_solver();
    assert!(vi.values().is_empty());
    assert!(vi.last_report().is_none());
}
