mod common;

use common::{grid, manhattan};
use mdpkit::{
    Error,
    config::SearchWeighting,
    domains::{GraphDomain, GraphState},
    ports::Policy,
    search::{AStar, ReplanningSearchPolicy, ZeroHeuristic},
};

fn goal(node: usize) -> impl Fn(&GraphState) -> bool + 'static {
    move |s| s.node() == node
}

fn total_reward(search: &AStar<GraphState, String, GraphDomain>, start: usize) -> f64 {
    search
        .path(&GraphState::new(start))
        .unwrap()
        .iter()
        .map(|step| step.reward)
        .sum()
}

#[test]
fn finds_the_cheaper_longer_path() {
    let domain = GraphDomain::builder(5)
        .edge(0, "a", 1, -1.0)
        .unwrap()
        .edge(1, "a", 2, -1.0)
        .unwrap()
        .edge(2, "a", 4, -1.0)
        .unwrap()
        .edge(0, "jump", 3, -1.0)
        .unwrap()
        .edge(3, "a", 4, -5.0)
        .unwrap()
        .build()
        .unwrap();
    let actions = domain.actions();
    let mut search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(4));
    search.plan_from_state(&GraphState::new(0)).unwrap();

    let path = search.path(&GraphState::new(0)).unwrap();
    let nodes: Vec<usize> = path.iter().map(|s| s.next.state().node()).collect();
    assert_eq!(nodes, vec![1, 2, 4]);
    assert_eq!(total_reward(&search, 0), -3.0);
}

#[test]
fn closed_states_reopen_on_a_better_path() {
    // S=0, A=1, B=2, C=3, G=4; the heuristic pulls B's route to C first.
    let domain = GraphDomain::builder(5)
        .edge(0, "to_a", 1, -1.0)
        .unwrap()
        .edge(0, "to_b", 2, -1.0)
        .unwrap()
        .edge(1, "to_c", 3, -1.0)
        .unwrap()
        .edge(2, "to_c", 3, -3.0)
        .unwrap()
        .edge(3, "to_g", 4, -3.0)
        .unwrap()
        .build()
        .unwrap();
    let actions = domain.actions();
    let heuristic = |s: &GraphState| if s.node() == 1 { -4.0 } else { 0.0 };
    let mut search = AStar::new(domain, actions, GraphState::hashing(), heuristic, goal(4));
    search.plan_from_state(&GraphState::new(0)).unwrap();

    assert_eq!(total_reward(&search, 0), -5.0);
    let actions: Vec<String> = search
        .path(&GraphState::new(0))
        .unwrap()
        .into_iter()
        .map(|s| s.action)
        .collect();
    assert_eq!(actions, vec!["to_a", "to_c", "to_g"]);
    // S, B, C, A and C again
    assert_eq!(search.last_expanded(), 5);
}

#[test]
fn unreachable_goal_reports_expansions() {
    let domain = GraphDomain::builder(3).edge(0, "go", 1, -1.0).unwrap().build().unwrap();
    let actions = domain.actions();
    let mut search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(2));
    let err = search.plan_from_state(&GraphState::new(0)).err().unwrap();
    assert!(matches!(err, Error::NoPlanFound { expanded: 2 }), "{err:?}");
}

#[test]
fn terminal_states_are_not_expanded() {
    let domain = GraphDomain::builder(3)
        .edge(0, "go", 1, -1.0)
        .unwrap()
        .edge(1, "go", 2, -1.0)
        .unwrap()
        .terminal(1)
        .build()
        .unwrap();
    let actions = domain.actions();
    let mut search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(2));
    assert!(matches!(
        search.plan_from_state(&GraphState::new(0)),
        Err(Error::NoPlanFound { expanded: 1 })
    ));
}

#[test]
fn plans_are_memoized_along_the_path() {
    let domain = common::chain(4);
    let actions = domain.actions();
    let mut search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(3));
    search.plan_from_state(&GraphState::new(0)).unwrap();
    assert_eq!(search.last_expanded(), 3);

    let mut policy = search.plan_from_state(&GraphState::new(1)).unwrap();
    assert_eq!(policy.action(&GraphState::new(2)).unwrap(), "right");
    assert!(matches!(
        policy.action(&GraphState::new(3)),
        Err(Error::PolicyUndefined { .. })
    ));
    assert_eq!(search.last_expanded(), 0);

    search.reset_solver();
    assert!(!search.has_plan_for(&search.hash(&GraphState::new(0)).unwrap()));
}

#[test]
fn replanning_policy_searches_from_new_states() {
    let domain = common::chain(4);
    let actions = domain.actions();
    let mut search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(3));
    {
        let mut policy = ReplanningSearchPolicy::new(&mut search);
        assert_eq!(policy.action(&GraphState::new(1)).unwrap(), "right");
    }
    assert!(search.has_plan_for(&search.hash(&GraphState::new(2)).unwrap()));
    assert!(!search.has_plan_for(&search.hash(&GraphState::new(0)).unwrap()));
}

#[test]
fn unbounded_dynamic_weighting_matches_static() {
    let start = GraphState::new(0);
    let run = |weighting: SearchWeighting| {
        let domain = grid(6, 6);
        let actions = domain.actions();
        let mut search = AStar::new(domain, actions, GraphState::hashing(), manhattan(6, 35), goal(35))
            .with_weighting(weighting)
            .unwrap();
        search.plan_from_state(&start).unwrap();
        (search.last_expanded(), total_reward(&search, 0))
    };
    let fixed = run(SearchWeighting::Static { epsilon: 1.0 });
    let dynamic = run(SearchWeighting::Dynamic {
        epsilon: 1.0,
        expected_depth: usize::MAX,
    });
    assert_eq!(fixed, dynamic);
}

#[test]
fn dynamic_weighting_past_the_expected_depth_is_plain_astar() {
    let start = GraphState::new(0);
    let run = |weighting: SearchWeighting| {
        let domain = grid(5, 5);
        let actions = domain.actions();
        let mut search = AStar::new(domain, actions, GraphState::hashing(), manhattan(5, 24), goal(24))
            .with_weighting(weighting)
            .unwrap();
        search.plan_from_state(&start).unwrap();
        (search.last_expanded(), total_reward(&search, 0))
    };
    let plain = run(SearchWeighting::Uniform);
    let dynamic = run(SearchWeighting::Dynamic {
        epsilon: 3.0,
        expected_depth: 1,
    });
    assert_eq!(plain, dynamic);
}

#[test]
fn weighted_search_stays_within_its_bound() {
    let start = GraphState::new(0);
    let run = |weighting: SearchWeighting| {
        let domain = grid(8, 8);
        let actions = domain.actions();
        let mut search = AStar::new(domain, actions, GraphState::hashing(), manhattan(8, 63), goal(63))
            .with_weighting(weighting)
            .unwrap();
        search.plan_from_state(&start).unwrap();
        (search.last_expanded(), total_reward(&search, 0))
    };
    let (optimal_expanded, optimal) = run(SearchWeighting::Uniform);
    let (weighted_expanded, weighted) = run(SearchWeighting::Static { epsilon: 2.0 });
    assert_eq!(optimal, -14.0);
    assert!(weighted >= 3.0 * optimal);
    assert!(weighted_expanded <= optimal_expanded);
}

#[test]
fn invalid_weighting_is_rejected() {
    let domain = common::chain(2);
    let actions = domain.actions();
    let search = AStar::new(domain, actions, GraphState::hashing(), ZeroHeuristic, goal(1));
    assert!(matches!(
        search.with_weighting(SearchWeighting::Static { epsilon: 0.5 }),
        Err(Error::InvalidGreediness { .. })
    ));
}
