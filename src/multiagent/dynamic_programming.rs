//! Value iteration for stochastic games.

use std::{
    collections::{HashSet, VecDeque},
    fmt::Debug,
};

use tracing::{debug, trace, warn};

use super::{
    AgentQSourceMap, AgentType, JointAction, JointModel, JointRewardFunction, SgBackupOperator,
    joint_actions,
};
use crate::{
    Error, Result,
    config::{ConfigFile, SolverConfig},
    planning::SweepReport,
    state::{HashableState, HashingScheme},
    types::{Action, Discount},
    value::ValueTable,
};

/// Multi-agent value iteration.
///
/// Keeps one value function per agent. `Q_i(s, ja) = Σ p·(r_i + γ·V_i(s'))`
/// with terminal successors contributing no continuation value, and
/// `V_i(s)` is whatever the configured [`SgBackupOperator`] makes of those
/// Q-values. Within a sweep, all agents' new values for a state are computed
/// from the same snapshot before any of them is written.
pub struct MaValueIteration<S, A, M, R> {
    model: M,
    rewards: R,
    hashing: Box<dyn HashingScheme<S>>,
    agents: Vec<AgentType<S, A>>,
    config: SolverConfig,
    discount: Discount,
    operator: Box<dyn SgBackupOperator<S, A>>,
    initial_value: f64,
    values: Vec<ValueTable<S>>,
    states: Vec<HashableState<S>>,
    explored: HashSet<HashableState<S>>,
    planning_started: bool,
    has_run: bool,
}

impl<S, A, M, R> MaValueIteration<S, A, M, R>
where
    S: Clone + Debug,
    A: Action,
    M: JointModel<S, A>,
    R: JointRewardFunction<S, A>,
{
    pub fn new(
        model: M,
        rewards: R,
        hashing: impl HashingScheme<S> + 'static,
        config: SolverConfig,
        operator: impl SgBackupOperator<S, A> + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            rewards,
            hashing: Box::new(hashing),
            agents: Vec::new(),
            discount: config.discount()?,
            config,
            operator: Box::new(operator),
            initial_value: 0.0,
            values: Vec::new(),
            states: Vec::new(),
            explored: HashSet::new(),
            planning_started: false,
            has_run: false,
        })
    }

    /// Value of non-terminal states before their first backup.
    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    /// Fix the participating agents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AgentDefinitionsLocked`] once planning has started.
    pub fn set_agent_definitions(&mut self, agents: Vec<AgentType<S, A>>) -> Result<()> {
        if self.planning_started {
            return Err(Error::AgentDefinitionsLocked);
        }
        self.values = agents
            .iter()
            .map(|_| ValueTable::constant(self.initial_value))
            .collect();
        self.agents = agents;
        Ok(())
    }

    pub fn agents(&self) -> &[AgentType<S, A>] {
        &self.agents
    }

    pub fn planning_started(&self) -> bool {
        self.planning_started
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Discover every state reachable from `state` under any joint action.
    pub fn perform_reachability_from(&mut self, state: &S) -> Result<bool> {
        self.require_agents("reachability")?;
        let seed = self.hashing.hash_state(state)?;
        if self.explored.contains(&seed) {
            return Ok(false);
        }
        let before = self.states.len();
        let mut queue = VecDeque::from([seed.clone()]);
        self.explored.insert(seed);
        while let Some(current) = queue.pop_front() {
            self.states.push(current.clone());
            if self.model.is_terminal(current.state()) {
                continue;
            }
            for joint in joint_actions(&self.agents, current.state()) {
                for t in self.model.transitions(current.state(), &joint)? {
                    let next = self.hashing.hash_state(&t.state)?;
                    if self.explored.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
        }
        debug!(new_states = self.states.len() - before, "joint reachability pass finished");
        Ok(self.states.len() > before)
    }

    /// Explore from `state` and solve when new states appeared or no sweep
    /// has run yet.
    #[tracing::instrument(level = "debug", skip_all, fields(agents = self.agents.len()))]
    pub fn plan_from_state(&mut self, state: &S) -> Result<()> {
        self.require_agents("planning")?;
        self.planning_started = true;
        let added = self.perform_reachability_from(state)?;
        if added || !self.has_run {
            self.run_vi()?;
        }
        Ok(())
    }

    /// Sweep until every agent's values settle or the cap is hit.
    pub fn run_vi(&mut self) -> Result<SweepReport> {
        if self.states.is_empty() {
            return Err(Error::ReachabilityNotPerformed);
        }
        self.planning_started = true;
        self.has_run = true;
        let mut report = SweepReport::default();
        for iteration in 0..self.config.max_iterations {
            let delta = self.backup_all_value_functions()?;
            report.iterations = iteration + 1;
            report.deltas.push(delta);
            trace!(iteration, delta, "joint sweep finished");
            if delta < self.config.max_delta {
                report.converged = true;
                break;
            }
        }
        if !report.converged {
            warn!(
                iterations = report.iterations,
                "multi-agent value iteration hit the iteration cap before converging"
            );
        }
        Ok(report)
    }

    /// One sweep over every known state, returning the largest change of any
    /// agent's value.
    pub fn backup_all_value_functions(&mut self) -> Result<f64> {
        let mut delta: f64 = 0.0;
        for i in 0..self.states.len() {
            let state = self.states[i].clone();
            let updated = self.backup_state(&state)?;
            for (agent, value) in updated.into_iter().enumerate() {
                delta = delta.max((value - self.values[agent].peek(&state)).abs());
                self.values[agent].set(&state, value);
            }
        }
        Ok(delta)
    }

    /// `V_agent(state)`; zero for terminal states.
    pub fn value(&self, agent: usize, state: &S) -> Result<f64> {
        let hashed = self.hashing.hash_state(state)?;
        self.agent_value(agent, &hashed)
    }

    /// Every joint action in `state` with each agent's Q-value for it.
    pub fn joint_q_values(&self, state: &S) -> Result<Vec<(JointAction<A>, Vec<f64>)>> {
        joint_actions(&self.agents, state)
            .into_iter()
            .map(|joint| {
                let qs = (0..self.agents.len())
                    .map(|agent| self.q_value(agent, state, &joint))
                    .collect::<Result<Vec<f64>>>()?;
                Ok((joint, qs))
            })
            .collect()
    }

    pub fn reset_solver(&mut self) {
        for table in &mut self.values {
            table.reset();
        }
        self.states.clear();
        self.explored.clear();
        self.has_run = false;
    }

    fn require_agents(&self, operation: &str) -> Result<()> {
        if self.agents.is_empty() {
            Err(Error::InvalidConfiguration {
                message: format!("{operation} requires agent definitions"),
            })
        } else {
            Ok(())
        }
    }

    fn agent_value(&self, agent: usize, state: &HashableState<S>) -> Result<f64> {
        let table = self.values.get(agent).ok_or_else(|| Error::InvalidConfiguration {
            message: format!("agent index {agent} out of range ({} agents)", self.agents.len()),
        })?;
        if self.model.is_terminal(state.state()) {
            Ok(0.0)
        } else {
            Ok(table.peek(state))
        }
    }

    fn backup_state(&self, state: &HashableState<S>) -> Result<Vec<f64>> {
        if self.model.is_terminal(state.state()) {
            return Ok(vec![0.0; self.agents.len()]);
        }
        (0..self.agents.len())
            .map(|agent| self.operator.backup(state.state(), agent, &self.agents, self))
            .collect()
    }
}

impl<S, A, M, R> AgentQSourceMap<S, A> for MaValueIteration<S, A, M, R>
where
    S: Clone + Debug,
    A: Action,
    M: JointModel<S, A>,
    R: JointRewardFunction<S, A>,
{
    fn num_agents(&self) -> usize {
        self.agents.len()
    }

    fn q_value(&self, agent: usize, state: &S, joint: &JointAction<A>) -> Result<f64> {
        if self.model.is_terminal(state) {
            return Ok(0.0);
        }
        let gamma = self.discount.value();
        let mut q = 0.0;
        for t in self.model.transitions(state, joint)? {
            let rewards = self.rewards.rewards(state, joint, &t.state)?;
            let reward = rewards.get(agent).copied().ok_or_else(|| Error::Model {
                message: format!("reward function returned {} rewards, agent {agent} missing", rewards.len()),
            })?;
            let next = self.hashing.hash_state(&t.state)?;
            q += t.probability * (reward + gamma * self.agent_value(agent, &next)?);
        }
        Ok(q)
    }
}
