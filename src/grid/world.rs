use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::observation::{Compass, Observation};

/// A position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset position by a (row, col) delta
    pub fn offset(&self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

/// Which kind of observation the world produces for its agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorMode {
    /// Agents only get a compass direction toward the beacon
    Beacon,
    /// Agents get their position, blocked neighbors, and goal cells
    Maze,
}

/// World-side representation of an agent: where it stands and whether it
/// has reached a goal cell. Mutated in place by [`World::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentBody {
    pub position: Position,
    pub reached_goal: bool,
}

impl AgentBody {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            reached_goal: false,
        }
    }
}

/// Bounded occupancy grid with goal cells and obstacle cells
///
/// Cloning yields an independent world with the identical static layout,
/// which is what evolutionary evaluation relies on.
#[derive(Debug, Clone)]
pub struct World {
    height: i32,
    width: i32,
    goals: Vec<Position>,
    obstacles: HashSet<Position>,
    mode: SensorMode,
}

impl World {
    pub fn new(
        height: i32,
        width: i32,
        goals: Vec<Position>,
        obstacles: HashSet<Position>,
        mode: SensorMode,
    ) -> Self {
        Self {
            height,
            width,
            goals,
            obstacles,
            mode,
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn goals(&self) -> &[Position] {
        &self.goals
    }

    pub fn mode(&self) -> SensorMode {
        self.mode
    }

    /// Check if a position is within the grid bounds
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    /// In bounds and not an obstacle
    pub fn is_valid_position(&self, pos: Position) -> bool {
        self.in_bounds(pos) && !self.obstacles.contains(&pos)
    }

    /// True for obstacles and for anything outside the grid
    pub fn is_blocked(&self, pos: Position) -> bool {
        !self.is_valid_position(pos)
    }

    pub fn is_goal(&self, pos: Position) -> bool {
        self.goals.contains(&pos)
    }

    /// Produce a fresh observation for an agent, depending on the sensor mode
    pub fn observe_for(&self, body: &AgentBody) -> Observation {
        match self.mode {
            SensorMode::Beacon => {
                let direction = match self.goals.first() {
                    Some(&goal) => Compass::towards(body.position, goal),
                    None => Compass::Here,
                };
                Observation::Beacon { direction }
            }
            SensorMode::Maze => {
                let blocked = self
                    .neighbors4(body.position)
                    .into_iter()
                    .filter(|&pos| !self.is_valid_position(pos))
                    .collect();
                Observation::Maze {
                    position: body.position,
                    blocked,
                    goals: self.goals.clone(),
                }
            }
        }
    }

    /// Apply a chosen move: update the body in place, flipping the goal flag
    /// if the destination is a goal cell. Invalid targets leave the body
    /// where it is.
    pub fn apply(&self, target: Position, body: &mut AgentBody) {
        if self.is_valid_position(target) {
            body.position = target;
            if self.is_goal(target) {
                body.reached_goal = true;
            }
        }
    }

    fn neighbors4(&self, pos: Position) -> [Position; 4] {
        [
            pos.offset(-1, 0),
            pos.offset(1, 0),
            pos.offset(0, -1),
            pos.offset(0, 1),
        ]
    }
}
