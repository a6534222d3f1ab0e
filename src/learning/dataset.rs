//! (state, action, reward, next state) samples and their collection.

use rand::{Rng, prelude::IndexedRandom};
use tracing::debug;

use crate::{
    Result,
    episode::Episode,
    ports::{ActionSpace, SampleModel},
};

/// One observed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Sars<S, A> {
    pub state: S,
    pub action: A,
    pub reward: f64,
    pub next: S,
    /// Whether `next` is terminal
    pub terminated: bool,
}

/// Append-only list of transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct SarsDataset<S, A> {
    samples: Vec<Sars<S, A>>,
}

impl<S, A> SarsDataset<S, A> {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: Sars<S, A>) {
        self.samples.push(sample);
    }

    pub fn extend(&mut self, other: SarsDataset<S, A>) {
        self.samples.extend(other.samples);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sars<S, A>> + '_ {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<S: Clone, A: Clone> SarsDataset<S, A> {
    /// Append every transition of `episode`; the last one is flagged terminal
    /// when `ended_in_terminal` is set.
    pub fn extend_from_episode(&mut self, episode: &Episode<S, A>, ended_in_terminal: bool) {
        let last = episode.len().saturating_sub(1);
        for (t, (state, action, reward, next)) in episode.transitions().enumerate() {
            self.samples.push(Sars {
                state: state.clone(),
                action: action.clone(),
                reward,
                next: next.clone(),
                terminated: ended_in_terminal && t == last,
            });
        }
    }
}

impl<S, A> Default for SarsDataset<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect `samples` transitions by acting uniformly at random from `start`.
///
/// A trajectory restarts from `start` when it reaches a terminal state, a
/// state without actions, or `max_trajectory_steps`. Collection stops early
/// if the start state itself admits no transition.
pub fn collect_uniform_random<S, A, M, R>(
    model: &mut M,
    actions: &ActionSpace<S, A>,
    start: &S,
    samples: usize,
    max_trajectory_steps: usize,
    rng: &mut R,
) -> Result<SarsDataset<S, A>>
where
    S: Clone,
    A: Clone,
    M: SampleModel<S, A> + ?Sized,
    R: Rng + ?Sized,
{
    let mut dataset = SarsDataset::new();
    let mut state = start.clone();
    let mut steps = 0;
    while dataset.len() < samples {
        let available = actions.applicable(&state);
        let stuck = model.is_terminal(&state) || available.is_empty() || steps >= max_trajectory_steps;
        if stuck {
            if steps == 0 {
                break;
            }
            state = start.clone();
            steps = 0;
            continue;
        }
        let Some(action) = available.choose(rng).cloned() else {
            break;
        };
        let outcome = model.sample(&state, &action)?;
        dataset.push(Sars {
            state: state.clone(),
            action,
            reward: outcome.reward,
            next: outcome.state.clone(),
            terminated: outcome.terminated,
        });
        state = outcome.state;
        steps += 1;
    }
    debug!(samples = dataset.len(), "collected random transitions");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        domains::{GraphDomain, GraphState},
        ports::Outcome,
    };

    #[test]
    fn episode_transitions_flag_only_the_last_as_terminal() {
        let mut episode = Episode::new(0);
        episode.record('a', Outcome::new(1, -1.0, false));
        episode.record('a', Outcome::new(2, 5.0, true));

        let mut dataset = SarsDataset::new();
        dataset.extend_from_episode(&episode, true);
        let flags: Vec<bool> = dataset.iter().map(|s| s.terminated).collect();
        assert_eq!(flags, vec![false, true]);

        let mut truncated = SarsDataset::new();
        truncated.extend_from_episode(&episode, false);
        assert!(truncated.iter().all(|s| !s.terminated));
    }

    #[test]
    fn random_collection_restarts_at_terminals() {
        let mut domain = GraphDomain::builder(2)
            .edge(0, "go", 1, 1.0)
            .unwrap()
            .terminal(1)
            .build()
            .unwrap();
        let actions = domain.actions();
        let mut rng = StdRng::seed_from_u64(5);
        let dataset =
            collect_uniform_random(&mut domain, &actions, &GraphState::new(0), 10, 100, &mut rng).unwrap();
        assert_eq!(dataset.len(), 10);
        assert!(dataset.iter().all(|s| s.state.node() == 0 && s.terminated));
    }

    #[test]
    fn random_collection_stops_when_the_start_is_stuck() {
        let mut domain = GraphDomain::builder(1).build().unwrap();
        let actions = domain.actions();
        let mut rng = StdRng::seed_from_u64(5);
        let dataset =
            collect_uniform_random(&mut domain, &actions, &GraphState::new(0), 10, 100, &mut rng).unwrap();
        assert!(dataset.is_empty());
    }
}
