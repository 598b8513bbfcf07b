//! Beacon task adapter
//!
//! Eight compass moves; the state seen by both brains is the compass
//! reading one-hot (9 slots, `Here` included) plus the eight
//! blocked-neighbor bits in action order — 17 features total.

use serde::{Deserialize, Serialize};

use crate::grid::{Compass, Observation, Position, World};

use super::adapter::{EpisodeMemory, TaskAction, TaskAdapter, TaskState};

/// Moves available on the beacon task, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeaconAction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl BeaconAction {
    /// (row, col) displacement; rows grow southward
    pub fn delta(self) -> (i32, i32) {
        match self {
            BeaconAction::North => (-1, 0),
            BeaconAction::South => (1, 0),
            BeaconAction::East => (0, 1),
            BeaconAction::West => (0, -1),
            BeaconAction::NorthEast => (-1, 1),
            BeaconAction::NorthWest => (-1, -1),
            BeaconAction::SouthEast => (1, 1),
            BeaconAction::SouthWest => (1, -1),
        }
    }

    /// The three moves consistent with a compass reading
    fn cone(direction: Compass) -> &'static [BeaconAction] {
        match direction {
            Compass::North => &[BeaconAction::North, BeaconAction::NorthEast, BeaconAction::NorthWest],
            Compass::South => &[BeaconAction::South, BeaconAction::SouthEast, BeaconAction::SouthWest],
            Compass::East => &[BeaconAction::East, BeaconAction::NorthEast, BeaconAction::SouthEast],
            Compass::West => &[BeaconAction::West, BeaconAction::NorthWest, BeaconAction::SouthWest],
            Compass::NorthEast => &[BeaconAction::NorthEast, BeaconAction::North, BeaconAction::East],
            Compass::NorthWest => &[BeaconAction::NorthWest, BeaconAction::North, BeaconAction::West],
            Compass::SouthEast => &[BeaconAction::SouthEast, BeaconAction::South, BeaconAction::East],
            Compass::SouthWest => &[BeaconAction::SouthWest, BeaconAction::South, BeaconAction::West],
            Compass::Here => &[],
        }
    }
}

impl TaskAction for BeaconAction {
    const ALL: &'static [BeaconAction] = &[
        BeaconAction::North,
        BeaconAction::South,
        BeaconAction::East,
        BeaconAction::West,
        BeaconAction::NorthEast,
        BeaconAction::NorthWest,
        BeaconAction::SouthEast,
        BeaconAction::SouthWest,
    ];

    fn index(self) -> usize {
        match self {
            BeaconAction::North => 0,
            BeaconAction::South => 1,
            BeaconAction::East => 2,
            BeaconAction::West => 3,
            BeaconAction::NorthEast => 4,
            BeaconAction::NorthWest => 5,
            BeaconAction::SouthEast => 6,
            BeaconAction::SouthWest => 7,
        }
    }

    fn label(self) -> &'static str {
        match self {
            BeaconAction::North => "N",
            BeaconAction::South => "S",
            BeaconAction::East => "E",
            BeaconAction::West => "W",
            BeaconAction::NorthEast => "NE",
            BeaconAction::NorthWest => "NW",
            BeaconAction::SouthEast => "SE",
            BeaconAction::SouthWest => "SW",
        }
    }
}

/// Beacon task state: sensed direction plus blocked-neighbor bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconState {
    pub direction: Compass,
    /// Blocked bits in [`BeaconAction::ALL`] order
    pub blocked: [bool; 8],
}

impl TaskState for BeaconState {
    fn encode(&self, out: &mut Vec<f64>) {
        let dir_idx = self.direction.index();
        for i in 0..Compass::ALL.len() {
            out.push(if i == dir_idx { 1.0 } else { 0.0 });
        }
        for &bit in &self.blocked {
            out.push(if bit { 1.0 } else { 0.0 });
        }
    }
}

/// Adapter for the beacon task
#[derive(Debug, Clone, Copy, Default)]
pub struct BeaconAdapter;

impl BeaconAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl TaskAdapter for BeaconAdapter {
    type State = BeaconState;
    type Action = BeaconAction;

    fn observation_size(&self) -> usize {
        // 9 direction one-hot (Here included) + 8 blocked bits
        17
    }

    fn build_state(
        &self,
        position: Position,
        _last_action: Option<BeaconAction>,
        obs: &Observation,
        world: &World,
    ) -> BeaconState {
        let direction = obs.compass().unwrap_or(Compass::Here);

        let mut blocked = [false; 8];
        for (i, action) in BeaconAction::ALL.iter().enumerate() {
            let (d_row, d_col) = action.delta();
            blocked[i] = !world.is_valid_position(position.offset(d_row, d_col));
        }

        BeaconState { direction, blocked }
    }

    fn valid_actions(&self, position: Position, world: &World) -> Vec<BeaconAction> {
        BeaconAction::ALL
            .iter()
            .copied()
            .filter(|action| {
                let (d_row, d_col) = action.delta();
                world.is_valid_position(position.offset(d_row, d_col))
            })
            .collect()
    }

    fn action_to_move(&self, position: Position, action: BeaconAction) -> Position {
        let (d_row, d_col) = action.delta();
        position.offset(d_row, d_col)
    }

    fn is_terminal(&self, reached_goal: bool, obs: &Observation, _world: &World) -> bool {
        reached_goal || obs.compass() == Some(Compass::Here)
    }

    fn reward(
        &self,
        episode: &mut EpisodeMemory,
        position: Position,
        prev_state: Option<&BeaconState>,
        action: Option<BeaconAction>,
        new_state: &BeaconState,
        _obs: &Observation,
        step: usize,
        max_steps: usize,
    ) -> f64 {
        let mut r = if episode.visited.contains(&position) {
            -2.0
        } else {
            episode.visited.insert(position);
            -0.1
        };

        let direction_now = new_state.direction;

        if prev_state.is_some() && direction_now != Compass::Here {
            if let Some(action) = action {
                if BeaconAction::cone(direction_now).contains(&action) {
                    r += 1.0;
                }
            }
        }

        if direction_now == Compass::Here {
            r += 100.0 * (1.0 - step as f64 / max_steps as f64);
            episode.visited.clear();
        }

        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::grid::SensorMode;

    fn open_world() -> World {
        World::new(
            10,
            10,
            vec![Position::new(0, 9)],
            HashSet::new(),
            SensorMode::Beacon,
        )
    }

    fn state(direction: Compass) -> BeaconState {
        BeaconState {
            direction,
            blocked: [false; 8],
        }
    }

    #[test]
    fn test_state_encoding_width() {
        let adapter = BeaconAdapter::new();
        let world = open_world();
        let obs = Observation::Beacon {
            direction: Compass::NorthEast,
        };

        let built = adapter.build_state(Position::new(5, 5), None, &obs, &world);
        let mut features = Vec::new();
        built.encode(&mut features);

        assert_eq!(features.len(), adapter.observation_size());
        // exactly one direction slot is hot
        assert_eq!(features[..9].iter().filter(|&&f| f == 1.0).count(), 1);
        assert_eq!(features[5], 1.0); // NorthEast one-hot slot
    }

    #[test]
    fn test_corner_blocks_actions() {
        let adapter = BeaconAdapter::new();
        let world = open_world();

        let valid = adapter.valid_actions(Position::new(0, 0), &world);
        assert_eq!(valid.len(), 3);
        assert!(valid.contains(&BeaconAction::South));
        assert!(valid.contains(&BeaconAction::East));
        assert!(valid.contains(&BeaconAction::SouthEast));
    }

    #[test]
    fn test_action_to_move_matches_deltas() {
        let adapter = BeaconAdapter::new();
        let pos = Position::new(5, 5);
        assert_eq!(
            adapter.action_to_move(pos, BeaconAction::North),
            Position::new(4, 5)
        );
        assert_eq!(
            adapter.action_to_move(pos, BeaconAction::SouthWest),
            Position::new(6, 4)
        );
    }

    #[test]
    fn test_terminal_on_here_sensor() {
        let adapter = BeaconAdapter::new();
        let world = open_world();
        let here = Observation::Beacon {
            direction: Compass::Here,
        };
        let away = Observation::Beacon {
            direction: Compass::North,
        };

        assert!(adapter.is_terminal(false, &here, &world));
        assert!(!adapter.is_terminal(false, &away, &world));
        assert!(adapter.is_terminal(true, &away, &world));
    }

    #[test]
    fn test_novel_cell_step_cost() {
        let adapter = BeaconAdapter::new();
        let mut episode = EpisodeMemory::default();
        let obs = Observation::Beacon {
            direction: Compass::North,
        };

        let r = adapter.reward(
            &mut episode,
            Position::new(5, 5),
            None,
            None,
            &state(Compass::North),
            &obs,
            0,
            100,
        );
        assert_eq!(r, -0.1);
        assert!(episode.visited.contains(&Position::new(5, 5)));
    }

    #[test]
    fn test_revisit_penalty() {
        let adapter = BeaconAdapter::new();
        let mut episode = EpisodeMemory::default();
        episode.visited.insert(Position::new(5, 5));
        let obs = Observation::Beacon {
            direction: Compass::North,
        };

        let r = adapter.reward(
            &mut episode,
            Position::new(5, 5),
            None,
            None,
            &state(Compass::North),
            &obs,
            0,
            100,
        );
        assert_eq!(r, -2.0);
    }

    #[test]
    fn test_cone_alignment_bonus() {
        let adapter = BeaconAdapter::new();
        let mut episode = EpisodeMemory::default();
        let prev = state(Compass::North);
        let obs = Observation::Beacon {
            direction: Compass::North,
        };

        // NorthEast lies in the North cone: -0.1 + 1.0
        let r = adapter.reward(
            &mut episode,
            Position::new(5, 5),
            Some(&prev),
            Some(BeaconAction::NorthEast),
            &state(Compass::North),
            &obs,
            0,
            100,
        );
        assert_eq!(r, 0.9);

        // South does not
        let r = adapter.reward(
            &mut episode,
            Position::new(4, 5),
            Some(&prev),
            Some(BeaconAction::South),
            &state(Compass::North),
            &obs,
            0,
            100,
        );
        assert_eq!(r, -0.1);
    }

    #[test]
    fn test_terminal_bonus_boundaries() {
        let adapter = BeaconAdapter::new();
        let obs = Observation::Beacon {
            direction: Compass::Here,
        };
        let max_steps = 200;

        // step == max_steps: bonus term vanishes, base step cost remains
        let mut episode = EpisodeMemory::default();
        let r = adapter.reward(
            &mut episode,
            Position::new(0, 9),
            None,
            None,
            &state(Compass::Here),
            &obs,
            max_steps,
            max_steps,
        );
        assert!((r - (-0.1)).abs() < 1e-9);

        // step == 1: near-maximum bonus
        let mut episode = EpisodeMemory::default();
        let r = adapter.reward(
            &mut episode,
            Position::new(0, 9),
            None,
            None,
            &state(Compass::Here),
            &obs,
            1,
            max_steps,
        );
        let expected = -0.1 + 100.0 * (1.0 - 1.0 / max_steps as f64);
        assert!((r - expected).abs() < 1e-9);
    }

    #[test]
    fn test_visited_cleared_at_terminal() {
        let adapter = BeaconAdapter::new();
        let mut episode = EpisodeMemory::default();
        episode.visited.insert(Position::new(1, 1));
        let obs = Observation::Beacon {
            direction: Compass::Here,
        };

        adapter.reward(
            &mut episode,
            Position::new(0, 9),
            None,
            None,
            &state(Compass::Here),
            &obs,
            10,
            200,
        );
        assert!(episode.visited.is_empty());
    }
}
