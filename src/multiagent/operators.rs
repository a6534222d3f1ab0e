//! Solution-concept backup operators for stochastic games.

use std::{collections::HashMap, fmt::Debug};

use super::{AgentType, JointAction, joint_actions};
use crate::{Result, types::Action};

/// Read-only access to every agent's joint-action Q-values.
pub trait AgentQSourceMap<S, A> {
    fn num_agents(&self) -> usize;

    /// `Q_agent(state, joint)`.
    fn q_value(&self, agent: usize, state: &S, joint: &JointAction<A>) -> Result<f64>;
}

/// Computes one agent's state value from the Q-values of all agents.
pub trait SgBackupOperator<S, A>: Debug {
    fn backup(
        &self,
        state: &S,
        agent: usize,
        agents: &[AgentType<S, A>],
        q_sources: &dyn AgentQSourceMap<S, A>,
    ) -> Result<f64>;
}

/// Cooperative backup: the best joint action for the agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxQOperator;

impl<S, A: Action> SgBackupOperator<S, A> for MaxQOperator {
    fn backup(
        &self,
        state: &S,
        agent: usize,
        agents: &[AgentType<S, A>],
        q_sources: &dyn AgentQSourceMap<S, A>,
    ) -> Result<f64> {
        let mut best: Option<f64> = None;
        for joint in joint_actions(agents, state) {
            let q = q_sources.q_value(agent, state, &joint)?;
            best = Some(best.map_or(q, |b| b.max(q)));
        }
        Ok(best.unwrap_or(0.0))
    }
}

/// Pure-strategy security value: the agent picks the action whose worst case
/// over everyone else's choices is best.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxOperator;

impl<S, A: Action> SgBackupOperator<S, A> for MinMaxOperator {
    fn backup(
        &self,
        state: &S,
        agent: usize,
        agents: &[AgentType<S, A>],
        q_sources: &dyn AgentQSourceMap<S, A>,
    ) -> Result<f64> {
        let mut worst_case: HashMap<A, f64> = HashMap::new();
        for joint in joint_actions(agents, state) {
            let Some(own) = joint.action(agent) else {
                continue;
            };
            let q = q_sources.q_value(agent, state, &joint)?;
            worst_case
                .entry(own.clone())
                .and_modify(|w| *w = w.min(q))
                .or_insert(q);
        }
        Ok(worst_case
            .into_values()
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
            .unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ActionSpace, FnActionType};

    /// Matching pennies payoffs for agent 0; agent 1 gets the negation.
    struct Pennies;

    impl AgentQSourceMap<u8, bool> for Pennies {
        fn num_agents(&self) -> usize {
            2
        }

        fn q_value(&self, agent: usize, _state: &u8, joint: &JointAction<bool>) -> Result<f64> {
            let same = joint.action(0) == joint.action(1);
            let payoff = if same { 1.0 } else { -1.0 };
            Ok(if agent == 0 { payoff } else { -payoff })
        }
    }

    fn agents() -> Vec<AgentType<u8, bool>> {
        let coin = || ActionSpace::new().with(FnActionType::new("coin", |_: &u8| vec![true, false]));
        vec![AgentType::new("even", coin()), AgentType::new("odd", coin())]
    }

    #[test]
    fn max_q_is_optimistic() {
        let v = MaxQOperator.backup(&0u8, 0, &agents(), &Pennies).unwrap();
        assert_eq!(v, 1.0);
    }

    #[test]
    fn minmax_is_the_security_value() {
        let v0 = MinMaxOperator.backup(&0u8, 0, &agents(), &Pennies).unwrap();
        let v1 = MinMaxOperator.backup(&0u8, 1, &agents(), &Pennies).unwrap();
        assert_eq!(v0, -1.0);
        assert_eq!(v1, -1.0);
    }
}
