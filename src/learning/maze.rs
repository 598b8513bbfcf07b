//! Maze task adapter
//!
//! Four orthogonal moves; the state is the wall bits, goal-adjacency bits,
//! and a one-hot of the previous action (13 features). The adapter can be
//! configured to also expose the absolute position: tabular Q-learning
//! wants it to avoid state aliasing, while the evolved recurrent controller
//! deliberately goes without it and must rely on local sensing plus memory.

use serde::{Deserialize, Serialize};

use crate::grid::{Observation, Position, World};

use super::adapter::{EpisodeMemory, TaskAction, TaskAdapter, TaskState};

/// Moves available in the maze, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MazeAction {
    Up,
    Down,
    Left,
    Right,
}

impl MazeAction {
    /// (row, col) displacement; rows grow downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            MazeAction::Up => (-1, 0),
            MazeAction::Down => (1, 0),
            MazeAction::Left => (0, -1),
            MazeAction::Right => (0, 1),
        }
    }
}

impl TaskAction for MazeAction {
    const ALL: &'static [MazeAction] = &[
        MazeAction::Up,
        MazeAction::Down,
        MazeAction::Left,
        MazeAction::Right,
    ];

    fn index(self) -> usize {
        match self {
            MazeAction::Up => 0,
            MazeAction::Down => 1,
            MazeAction::Left => 2,
            MazeAction::Right => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MazeAction::Up => "up",
            MazeAction::Down => "down",
            MazeAction::Left => "left",
            MazeAction::Right => "right",
        }
    }
}

/// Maze task state
///
/// `position` is only populated when the adapter was configured to include
/// it; both variants are intentional (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MazeState {
    /// Wall bits in [`MazeAction::ALL`] order
    pub walls: [bool; 4],
    /// Goal-adjacency bits in [`MazeAction::ALL`] order
    pub goal_adjacent: [bool; 4],
    pub last_action: Option<MazeAction>,
    pub position: Option<Position>,
}

impl TaskState for MazeState {
    fn encode(&self, out: &mut Vec<f64>) {
        for &wall in &self.walls {
            out.push(if wall { 1.0 } else { 0.0 });
        }
        for &adjacent in &self.goal_adjacent {
            out.push(if adjacent { 1.0 } else { 0.0 });
        }

        // last action one-hot: [none, up, down, left, right]
        let mut one_hot = [0.0; 5];
        match self.last_action {
            None => one_hot[0] = 1.0,
            Some(action) => one_hot[1 + action.index()] = 1.0,
        }
        out.extend_from_slice(&one_hot);

        if let Some(pos) = self.position {
            out.push(pos.row as f64);
            out.push(pos.col as f64);
        }
    }
}

/// Adapter for the maze task
#[derive(Debug, Clone, Copy)]
pub struct MazeAdapter {
    include_position: bool,
}

impl MazeAdapter {
    /// `include_position` adds the absolute position to the state record
    pub fn new(include_position: bool) -> Self {
        Self { include_position }
    }

    pub fn include_position(&self) -> bool {
        self.include_position
    }

    fn observed_position(&self, fallback: Position, obs: &Observation) -> Position {
        match obs {
            Observation::Maze { position, .. } => *position,
            Observation::Beacon { .. } => fallback,
        }
    }

    fn at_goal(obs: &Observation) -> bool {
        match obs {
            Observation::Maze {
                position, goals, ..
            } => goals.contains(position),
            Observation::Beacon { .. } => false,
        }
    }
}

impl TaskAdapter for MazeAdapter {
    type State = MazeState;
    type Action = MazeAction;

    fn observation_size(&self) -> usize {
        // 4 walls + 4 goal-adjacency + 5 last-action one-hot (+2 position)
        if self.include_position {
            15
        } else {
            13
        }
    }

    fn build_state(
        &self,
        position: Position,
        last_action: Option<MazeAction>,
        obs: &Observation,
        world: &World,
    ) -> MazeState {
        let pos = self.observed_position(position, obs);
        let goals: &[Position] = match obs {
            Observation::Maze { goals, .. } => goals,
            Observation::Beacon { .. } => world.goals(),
        };

        let mut walls = [false; 4];
        let mut goal_adjacent = [false; 4];
        for (i, action) in MazeAction::ALL.iter().enumerate() {
            let (d_row, d_col) = action.delta();
            let neighbor = pos.offset(d_row, d_col);
            walls[i] = world.is_blocked(neighbor);
            goal_adjacent[i] = goals.contains(&neighbor);
        }

        MazeState {
            walls,
            goal_adjacent,
            last_action,
            position: self.include_position.then_some(pos),
        }
    }

    fn valid_actions(&self, position: Position, world: &World) -> Vec<MazeAction> {
        MazeAction::ALL
            .iter()
            .copied()
            .filter(|action| {
                let (d_row, d_col) = action.delta();
                !world.is_blocked(position.offset(d_row, d_col))
            })
            .collect()
    }

    fn action_to_move(&self, position: Position, action: MazeAction) -> Position {
        let (d_row, d_col) = action.delta();
        position.offset(d_row, d_col)
    }

    fn is_terminal(&self, reached_goal: bool, obs: &Observation, _world: &World) -> bool {
        reached_goal || Self::at_goal(obs)
    }

    fn reward(
        &self,
        episode: &mut EpisodeMemory,
        position: Position,
        _prev_state: Option<&MazeState>,
        _action: Option<MazeAction>,
        _new_state: &MazeState,
        obs: &Observation,
        step: usize,
        max_steps: usize,
    ) -> f64 {
        let pos = self.observed_position(position, obs);

        let mut r = -0.05;
        if episode.visited.contains(&pos) {
            r -= 0.2;
        } else {
            episode.visited.insert(pos);
        }

        if Self::at_goal(obs) {
            r += 50.0 * (1.0 - step as f64 / max_steps as f64);
        }

        r
    }
}
