//! Joint policies derived from multi-agent Q-values.

use std::fmt::Debug;

use rand::{prelude::IndexedRandom, rngs::StdRng};

use super::{AgentQSourceMap, AgentType, JointAction, joint_actions};
use crate::{
    Error, Result,
    ports::{EnumerablePolicy, Policy},
    types::{Action, ActionProb},
    utils::{argmax_all, build_rng},
};

/// Picks the joint action with the largest sum of agent Q-values.
pub struct MaxWelfarePolicy<'a, S, A, Q: ?Sized> {
    q_sources: &'a Q,
    agents: &'a [AgentType<S, A>],
    rng: StdRng,
}

impl<'a, S, A: Action, Q: AgentQSourceMap<S, A> + ?Sized> MaxWelfarePolicy<'a, S, A, Q> {
    pub fn new(q_sources: &'a Q, agents: &'a [AgentType<S, A>]) -> Self {
        Self {
            q_sources,
            agents,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    fn best(&self, state: &S) -> Result<(Vec<JointAction<A>>, Vec<usize>)>
    where
        S: Debug,
    {
        let joint = joint_actions(self.agents, state);
        if joint.is_empty() {
            return Err(Error::NoApplicableActions {
                state: format!("{state:?}"),
            });
        }
        let welfare = joint
            .iter()
            .map(|ja| {
                (0..self.q_sources.num_agents())
                    .map(|agent| self.q_sources.q_value(agent, state, ja))
                    .sum::<Result<f64>>()
            })
            .collect::<Result<Vec<f64>>>()?;
        let best = argmax_all(&welfare);
        Ok((joint, best))
    }
}

impl<S: Debug, A: Action, Q: AgentQSourceMap<S, A> + ?Sized> Policy<S, JointAction<A>>
    for MaxWelfarePolicy<'_, S, A, Q>
{
    fn action(&mut self, state: &S) -> Result<JointAction<A>> {
        let (joint, best) = self.best(state)?;
        let idx = best.choose(&mut self.rng).copied().unwrap_or(0);
        Ok(joint[idx].clone())
    }

    fn defined_for(&self, state: &S) -> bool {
        !joint_actions(self.agents, state).is_empty()
    }
}

impl<S: Debug, A: Action, Q: AgentQSourceMap<S, A> + ?Sized> EnumerablePolicy<S, JointAction<A>>
    for MaxWelfarePolicy<'_, S, A, Q>
{
    fn action_distribution(&self, state: &S) -> Result<Vec<ActionProb<JointAction<A>>>> {
        let (joint, best) = self.best(state)?;
        let p = 1.0 / best.len() as f64;
        Ok(best
            .into_iter()
            .map(|i| ActionProb::new(joint[i].clone(), p))
            .collect())
    }
}
