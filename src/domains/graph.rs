//! Finite graph MDPs: states are node ids, actions are named edges with
//! (possibly stochastic) outcome distributions.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
    sync::Arc,
};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    identifiers::VariableKey,
    ports::{ActionSpace, FnActionType, FullModel, Outcome, SampleModel, Transition, sample_transition},
    state::{SchemaHashing, State, StateSchema, Value},
    utils::build_rng,
};

const NODE: VariableKey = VariableKey::from_static("node");
const KEYS: &[VariableKey] = &[NODE];

/// Tolerance on distribution totals.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A position in a [`GraphDomain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphState {
    node: usize,
}

impl GraphState {
    /// Every graph state exposes exactly the `node` variable.
    pub const SCHEMA: StateSchema = StateSchema::from_static(KEYS);

    pub fn new(node: usize) -> Self {
        Self { node }
    }

    pub fn node(&self) -> usize {
        self.node
    }

    /// Hashing scheme keyed by the node id.
    pub fn hashing() -> SchemaHashing {
        SchemaHashing::new(Self::SCHEMA)
    }
}

impl State for GraphState {
    fn variable_keys(&self) -> Vec<VariableKey> {
        KEYS.to_vec()
    }

    fn get(&self, key: &VariableKey) -> Result<Value> {
        if *key == NODE {
            Ok(Value::from(self.node))
        } else {
            Err(Error::MissingVariable {
                key: key.to_string(),
            })
        }
    }
}

type EdgeMap = BTreeMap<usize, BTreeMap<String, Vec<Transition<usize>>>>;

/// A finite MDP over numbered nodes.
///
/// Implements both model capabilities; sampling uses an internal, seedable
/// random number generator.
#[derive(Debug, Clone)]
pub struct GraphDomain {
    size: usize,
    edges: Arc<EdgeMap>,
    terminals: BTreeSet<usize>,
    rng: StdRng,
}

impl GraphDomain {
    pub fn builder(size: usize) -> GraphDomainBuilder {
        GraphDomainBuilder {
            size,
            edges: BTreeMap::new(),
            terminals: BTreeSet::new(),
            seed: None,
        }
    }

    /// Build a domain from its serializable description.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self> {
        let mut builder = Self::builder(spec.nodes);
        for edge in &spec.edges {
            for outcome in &edge.outcomes {
                builder = builder.outcome(
                    edge.from,
                    edge.action.clone(),
                    outcome.to,
                    outcome.probability,
                    outcome.reward,
                )?;
            }
        }
        for &node in &spec.terminals {
            builder = builder.terminal(node);
        }
        if let Some(seed) = spec.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Same graph with a freshly seeded sampler.
    pub fn reseeded(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    /// The state for `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] when `node` is out of range.
    pub fn state(&self, node: usize) -> Result<GraphState> {
        check_node(node, self.size)?;
        Ok(GraphState::new(node))
    }

    pub fn terminals(&self) -> impl Iterator<Item = usize> + '_ {
        self.terminals.iter().copied()
    }

    /// Action names available at each node, in name order.
    pub fn actions(&self) -> ActionSpace<GraphState, String> {
        let edges = Arc::clone(&self.edges);
        ActionSpace::new().with(FnActionType::new("edge", move |s: &GraphState| {
            edges
                .get(&s.node)
                .map(|by_action| by_action.keys().cloned().collect())
                .unwrap_or_default()
        }))
    }

    /// Every action name used anywhere in the graph, sorted.
    pub fn action_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.edges.values().flat_map(|by_action| by_action.keys()).collect();
        names.into_iter().cloned().collect()
    }

    fn distribution(&self, state: &GraphState, action: &str) -> Result<&[Transition<usize>]> {
        self.edges
            .get(&state.node)
            .and_then(|by_action| by_action.get(action))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Model {
                message: format!("action '{action}' is not defined at node {}", state.node),
            })
    }
}

impl SampleModel<GraphState, String> for GraphDomain {
    fn sample(&mut self, state: &GraphState, action: &String) -> Result<Outcome<GraphState>> {
        let edges = Arc::clone(&self.edges);
        let outcomes = edges
            .get(&state.node)
            .and_then(|by_action| by_action.get(action.as_str()))
            .ok_or_else(|| Error::Model {
                message: format!("action '{action}' is not defined at node {}", state.node),
            })?;
        let t = sample_transition(outcomes, &mut self.rng).ok_or_else(|| Error::Model {
            message: format!("action '{action}' at node {} has no outcomes", state.node),
        })?;
        Ok(Outcome::new(
            GraphState::new(t.state),
            t.reward,
            self.terminals.contains(&t.state),
        ))
    }

    fn is_terminal(&self, state: &GraphState) -> bool {
        self.terminals.contains(&state.node)
    }
}

impl FullModel<GraphState, String> for GraphDomain {
    fn transitions(&self, state: &GraphState, action: &String) -> Result<Vec<Transition<GraphState>>> {
        Ok(self
            .distribution(state, action)?
            .iter()
            .map(|t| Transition::new(t.probability, GraphState::new(t.state), t.reward))
            .collect())
    }
}

fn check_node(node: usize, size: usize) -> Result<()> {
    if node < size {
        Ok(())
    } else {
        Err(Error::UnknownNode { node, size })
    }
}

/// Incremental construction of a [`GraphDomain`].
#[derive(Debug, Clone)]
pub struct GraphDomainBuilder {
    size: usize,
    edges: EdgeMap,
    terminals: BTreeSet<usize>,
    seed: Option<u64>,
}

impl GraphDomainBuilder {
    /// Deterministic edge: `action` at `from` always leads to `to`.
    pub fn edge(self, from: usize, action: impl Into<String>, to: usize, reward: f64) -> Result<Self> {
        self.outcome(from, action, to, 1.0, reward)
    }

    /// Add one outcome to the distribution of `action` at `from`.
    pub fn outcome(
        mut self,
        from: usize,
        action: impl Into<String>,
        to: usize,
        probability: f64,
        reward: f64,
    ) -> Result<Self> {
        check_node(from, self.size)?;
        check_node(to, self.size)?;
        self.edges
            .entry(from)
            .or_default()
            .entry(action.into())
            .or_default()
            .push(Transition::new(probability, to, reward));
        Ok(self)
    }

    pub fn terminal(mut self, node: usize) -> Self {
        self.terminals.insert(node);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] for an out-of-range terminal and
    /// [`Error::InvalidTransitionDistribution`] when an action's outcome
    /// probabilities do not sum to one.
    pub fn build(self) -> Result<GraphDomain> {
        for &node in &self.terminals {
            check_node(node, self.size)?;
        }
        for (node, by_action) in &self.edges {
            for (action, outcomes) in by_action {
                let total: f64 = outcomes.iter().map(|t| t.probability).sum();
                let negative = outcomes.iter().any(|t| t.probability < 0.0);
                if negative || (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(Error::InvalidTransitionDistribution {
                        context: format!("node {node} action '{action}'"),
                        total,
                    });
                }
            }
        }
        Ok(GraphDomain {
            size: self.size,
            edges: Arc::new(self.edges),
            terminals: self.terminals,
            rng: build_rng(self.seed),
        })
    }
}

fn one() -> f64 {
    1.0
}

/// Serializable description of a graph domain.
///
/// ```json
/// {
///   "nodes": 3,
///   "terminals": [2],
///   "edges": [
///     { "from": 0, "action": "go", "outcomes": [{ "to": 1, "reward": -1.0 }] },
///     { "from": 1, "action": "go", "outcomes": [
///         { "to": 2, "probability": 0.8, "reward": -1.0 },
///         { "to": 0, "probability": 0.2, "reward": -1.0 } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: usize,
    #[serde(default)]
    pub terminals: Vec<usize>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: usize,
    pub action: String,
    pub outcomes: Vec<OutcomeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSpec {
    pub to: usize,
    #[serde(default = "one")]
    pub probability: f64,
    #[serde(default)]
    pub reward: f64,
}

impl GraphSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read graph description from {}", path.display()),
            source,
        })?;
        Self::from_json(&text)
    }
}
