mod common;

use common::approx_eq;
use mdpkit::{
    Error, Result,
    config::SolverConfig,
    domains::GraphState,
    multiagent::{
        AgentQSourceMap, AgentType, JointAction, JointModel, MaValueIteration, MaxQOperator, MaxWelfarePolicy,
        MinMaxOperator, SgBackupOperator, StateTransition,
    },
    ports::{ActionSpace, FnActionType, Policy},
};

/// Node 0 moves to node 1 under every joint action; node 1 loops forever.
struct TwoStage;

impl JointModel<GraphState, &'static str> for TwoStage {
    fn transitions(
        &self,
        _state: &GraphState,
        _action: &JointAction<&'static str>,
    ) -> Result<Vec<StateTransition<GraphState>>> {
        Ok(vec![StateTransition::new(1.0, GraphState::new(1))])
    }

    fn is_terminal(&self, _state: &GraphState) -> bool {
        false
    }
}

fn rewards(state: &GraphState, joint: &JointAction<&'static str>, _next: &GraphState) -> Vec<f64> {
    if state.node() == 1 {
        vec![1.0, 1.0]
    } else if joint.actions() == &["y", "q"][..] {
        vec![3.0, 3.0]
    } else {
        vec![1.0, -2.0]
    }
}

fn agent(name: &str, first: &'static str, second: &'static str) -> AgentType<GraphState, &'static str> {
    let actions = ActionSpace::new().with(FnActionType::new("choice", move |s: &GraphState| {
        if s.node() == 0 { vec![first, second] } else { vec!["wait"] }
    }));
    AgentType::new(name, actions)
}

type Reward = fn(&GraphState, &JointAction<&'static str>, &GraphState) -> Vec<f64>;

fn solver(
    operator: impl SgBackupOperator<GraphState, &'static str> + 'static,
) -> MaValueIteration<GraphState, &'static str, TwoStage, Reward> {
    let config = SolverConfig::new(0.9).with_max_delta(1e-10).with_max_iterations(10_000);
    let mut vi = MaValueIteration::new(TwoStage, rewards as Reward, GraphState::hashing(), config, operator).unwrap();
    vi.set_agent_definitions(vec![agent("row", "x", "y"), agent("column", "p", "q")])
        .unwrap();
    vi
}

#[test]
fn q_values_add_discounted_successor_values() {
    let mut vi = solver(MaxQOperator);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    assert_eq!(vi.num_states(), 2);

    let s0 = GraphState::new(0);
    let s1 = GraphState::new(1);
    assert!(approx_eq(vi.value(0, &s1).unwrap(), 10.0, 1e-6));
    assert!(approx_eq(vi.value(1, &s1).unwrap(), 10.0, 1e-6));

    let joint = JointAction::new(vec!["x", "p"]);
    let v0 = vi.value(0, &s1).unwrap();
    let v1 = vi.value(1, &s1).unwrap();
    assert!(approx_eq(vi.q_value(0, &s0, &joint).unwrap(), 1.0 + 0.9 * v0, 1e-9));
    assert!(approx_eq(vi.q_value(1, &s0, &joint).unwrap(), -2.0 + 0.9 * v1, 1e-9));

    // Cooperative backup takes the best joint action for each agent.
    assert!(approx_eq(vi.value(0, &s0).unwrap(), 12.0, 1e-6));
    assert!(approx_eq(vi.value(1, &s0).unwrap(), 12.0, 1e-6));
}

#[test]
fn security_values_assume_the_worst_partner() {
    let mut vi = solver(MinMaxOperator);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let s0 = GraphState::new(0);
    assert!(approx_eq(vi.value(0, &s0).unwrap(), 10.0, 1e-6));
    assert!(approx_eq(vi.value(1, &s0).unwrap(), 7.0, 1e-6));
}

#[test]
fn joint_q_values_cover_every_joint_action() {
    let mut vi = solver(MaxQOperator);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let table = vi.joint_q_values(&GraphState::new(0)).unwrap();
    assert_eq!(table.len(), 4);
    for (joint, qs) in &table {
        assert_eq!(qs.len(), 2);
        assert_eq!(joint.len(), 2);
    }
}

#[test]
fn max_welfare_policy_picks_the_shared_payoff() {
    let mut vi = solver(MaxQOperator);
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    let agents = vi.agents().to_vec();
    let mut policy = MaxWelfarePolicy::new(&vi, &agents).with_seed(1);
    let joint = policy.action(&GraphState::new(0)).unwrap();
    assert_eq!(joint.actions(), &["y", "q"][..]);
    assert_eq!(joint.to_string(), r#"<"y", "q">"#);
}

#[test]
fn agent_definitions_lock_once_planning_starts() {
    let mut vi = solver(MaxQOperator);
    assert!(!vi.planning_started());
    vi.set_agent_definitions(vec![agent("row", "x", "y"), agent("column", "p", "q")])
        .unwrap();
    vi.plan_from_state(&GraphState::new(0)).unwrap();
    assert!(vi.planning_started());
    assert!(matches!(
        vi.set_agent_definitions(Vec::new()),
        Err(Error::AgentDefinitionsLocked)
    ));
}

#[test]
fn planning_requires_agents() {
    let config = SolverConfig::new(0.9);
    let mut vi = MaValueIteration::new(TwoStage, rewards as Reward, GraphState::hashing(), config, MaxQOperator).unwrap();
    assert!(matches!(
        vi.plan_from_state(&GraphState::new(0)),
        Err(Error::InvalidConfiguration { .. })
    ));
    assert!(matches!(vi.run_vi(), Err(Error::ReachabilityNotPerformed)));
}

#[test]
fn planning_after_explicit_reachability_still_sweeps() {
    let mut vi = solver(MaxQOperator);
    let s0 = GraphState::new(0);
    let s1 = GraphState::new(1);
    assert!(vi.perform_reachability_from(&s0).unwrap());

    vi.plan_from_state(&s0).unwrap();
    assert!(approx_eq(vi.value(0, &s1).unwrap(), 10.0, 1e-6));
    assert!(approx_eq(vi.value(1, &s0).unwrap(), 12.0, 1e-6));

    vi.reset_solver();
    assert!(vi.perform_reachability_from(&s0).unwrap());
    vi.plan_from_state(&s0).unwrap();
    assert!(approx_eq(vi.value(0, &s0).unwrap(), 12.0, 1e-6));
}
