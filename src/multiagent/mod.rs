//! Multi-agent planning for stochastic games.
//!
//! Every agent keeps its own value function. Q-values are defined over joint
//! actions by marginalizing a joint model; how a state value is formed from
//! them (cooperative max, security value, ...) is a pluggable
//! [`SgBackupOperator`].

pub mod dynamic_programming;
pub mod model;
pub mod operators;
pub mod policy;

use std::fmt;

pub use dynamic_programming::MaValueIteration;
pub use model::{JointModel, JointRewardFunction, StateTransition};
pub use operators::{AgentQSourceMap, MaxQOperator, MinMaxOperator, SgBackupOperator};
pub use policy::MaxWelfarePolicy;

use crate::{ports::ActionSpace, types::Action};

/// A participant of a stochastic game: a name and the actions it can take.
#[derive(Debug, Clone)]
pub struct AgentType<S, A> {
    name: String,
    actions: ActionSpace<S, A>,
}

impl<S, A> AgentType<S, A> {
    pub fn new(name: impl Into<String>, actions: ActionSpace<S, A>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &ActionSpace<S, A> {
        &self.actions
    }
}

/// One action per agent, in agent-definition order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JointAction<A>(Vec<A>);

impl<A> JointAction<A> {
    pub fn new(actions: Vec<A>) -> Self {
        Self(actions)
    }

    pub fn actions(&self) -> &[A] {
        &self.0
    }

    /// Action of the agent at `index`.
    pub fn action(&self, index: usize) -> Option<&A> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<A: fmt::Debug> fmt::Display for JointAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a:?}")?;
        }
        write!(f, ">")
    }
}

/// Every joint action available in `state`: the cartesian product of the
/// agents' applicable actions. Empty if any agent has no action.
pub fn joint_actions<S, A: Action>(agents: &[AgentType<S, A>], state: &S) -> Vec<JointAction<A>> {
    let mut partial: Vec<Vec<A>> = vec![Vec::new()];
    for agent in agents {
        let options = agent.actions.applicable(state);
        partial = partial
            .iter()
            .flat_map(|prefix| {
                options.iter().map(move |a| {
                    let mut next = prefix.clone();
                    next.push(a.clone());
                    next
                })
            })
            .collect();
    }
    if agents.is_empty() {
        return Vec::new();
    }
    partial.into_iter().map(JointAction::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FnActionType;

    fn agent(name: &str, actions: Vec<char>) -> AgentType<u8, char> {
        AgentType::new(
            name,
            ActionSpace::new().with(FnActionType::new(name, move |_: &u8| actions.clone())),
        )
    }

    #[test]
    fn joint_actions_form_cartesian_product() {
        let agents = vec![agent("a", vec!['x', 'y']), agent("b", vec!['p', 'q', 'r'])];
        let joint = joint_actions(&agents, &0);
        assert_eq!(joint.len(), 6);
        assert_eq!(joint[0], JointAction::new(vec!['x', 'p']));
        assert_eq!(joint[5], JointAction::new(vec!['y', 'r']));
        assert_eq!(joint[1].to_string(), "<'x', 'q'>");
    }

    #[test]
    fn agent_without_actions_blocks_every_joint_action() {
        let agents = vec![agent("a", vec!['x']), agent("b", vec![])];
        assert!(joint_actions(&agents, &0).is_empty());
        assert!(joint_actions::<u8, char>(&[], &0).is_empty());
    }
}
