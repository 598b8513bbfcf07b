//! Task adapter and brain contracts
//!
//! The adapter encapsulates all task-specific knowledge — state encoding,
//! legal moves, termination, reward shaping — so brains stay
//! environment-agnostic and only ever see `(state, valid_actions)`.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::grid::{Observation, Position, World};

/// Execution mode for action selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Exploration enabled for brains that explore
    Train,
    /// Always greedy
    Test,
}

/// Per-episode bookkeeping owned by the agent
///
/// Always present (possibly empty) and cleared by `episode_reset`; adapters
/// receive it explicitly instead of attaching state to the agent themselves.
#[derive(Debug, Clone, Default)]
pub struct EpisodeMemory {
    /// Cells entered so far this episode, for revisit penalties
    pub visited: HashSet<Position>,
}

impl EpisodeMemory {
    pub fn clear(&mut self) {
        self.visited.clear();
    }
}

/// State representation produced by an adapter
///
/// Hashable and serializable so the tabular brain can key its table and
/// persist it; `encode` provides the fixed-width numeric view consumed by
/// the neural brain. The encoded width never varies for a given adapter
/// configuration.
pub trait TaskState: Clone + Debug + Eq + Hash + Serialize + DeserializeOwned {
    /// Append this state's numeric features to `out`
    fn encode(&self, out: &mut Vec<f64>);
}

/// An action label from a small closed alphabet
///
/// `ALL` fixes the canonical vocabulary and its order; a neural brain's
/// output neurons are positionally aligned to this order, never to the
/// currently-valid subset.
pub trait TaskAction: Copy + Debug + Eq + Hash + Serialize + DeserializeOwned + 'static {
    /// Canonical ordered action vocabulary
    const ALL: &'static [Self];

    /// Index into [`TaskAction::ALL`]
    fn index(self) -> usize;

    /// Stable label used in persisted policies
    fn label(self) -> &'static str;
}

/// Task-specific translation layer between world and brain
pub trait TaskAdapter {
    type State: TaskState;
    type Action: TaskAction;

    /// Fixed dimensionality of the encoded state vector
    fn observation_size(&self) -> usize;

    /// Size of the canonical action vocabulary
    fn action_size(&self) -> usize {
        Self::Action::ALL.len()
    }

    /// Build the brain-facing state from an observation
    ///
    /// Deterministic and pure: same position, last action, observation, and
    /// world geometry always yield the same state.
    fn build_state(
        &self,
        position: Position,
        last_action: Option<Self::Action>,
        obs: &Observation,
        world: &World,
    ) -> Self::State;

    /// Actions whose move lands on a non-blocked, in-bounds cell
    ///
    /// An empty result means the agent is stuck and must end its turn
    /// without acting.
    fn valid_actions(&self, position: Position, world: &World) -> Vec<Self::Action>;

    /// Map an action to its target cell (pure coordinate arithmetic)
    fn action_to_move(&self, position: Position, action: Self::Action) -> Position;

    /// True when the observation indicates the goal was reached, or the
    /// agent's own flag is already set
    fn is_terminal(&self, reached_goal: bool, obs: &Observation, world: &World) -> bool;

    /// Shaped reward for the step that just finished
    ///
    /// `obs` is the re-observation taken after the move was applied, and
    /// `new_state` the state built from it. Default: no shaping.
    #[allow(clippy::too_many_arguments)]
    fn reward(
        &self,
        _episode: &mut EpisodeMemory,
        _position: Position,
        _prev_state: Option<&Self::State>,
        _action: Option<Self::Action>,
        _new_state: &Self::State,
        _obs: &Observation,
        _step: usize,
        _max_steps: usize,
    ) -> f64 {
        0.0
    }
}

/// Decision policy over an adapter's state/action space
///
/// `update` and `reset` are default no-ops so callers never probe for
/// optional capabilities: brains that learn online override `update`,
/// brains with internal memory override `reset`.
pub trait Brain<S: TaskState, A: TaskAction> {
    /// Choose an action from `valid_actions`
    ///
    /// Must return a member of `valid_actions`; callers guarantee the list
    /// is non-empty.
    fn select_action(&mut self, state: &S, valid_actions: &[A], mode: Mode) -> A;

    /// One learning step (no-op for brains that do not learn online)
    #[allow(clippy::too_many_arguments)]
    fn update(
        &mut self,
        _prev_state: &S,
        _action: A,
        _reward: f64,
        _new_state: &S,
        _done: bool,
        _next_valid_actions: Option<&[A]>,
    ) {
    }

    /// Clear internal per-episode memory (no-op for memoryless brains)
    fn reset(&mut self) {}
}
