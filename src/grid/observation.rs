use serde::{Deserialize, Serialize};

use super::world::Position;

/// Compass reading toward the beacon, as sensed by an agent
///
/// `Here` means the agent is standing on the beacon cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    Here,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Compass {
    /// All readings in their canonical encoding order (`Here` first)
    pub const ALL: [Compass; 9] = [
        Compass::Here,
        Compass::North,
        Compass::South,
        Compass::East,
        Compass::West,
        Compass::NorthEast,
        Compass::NorthWest,
        Compass::SouthEast,
        Compass::SouthWest,
    ];

    /// Index into the canonical order, used for one-hot encoding
    pub fn index(self) -> usize {
        match self {
            Compass::Here => 0,
            Compass::North => 1,
            Compass::South => 2,
            Compass::East => 3,
            Compass::West => 4,
            Compass::NorthEast => 5,
            Compass::NorthWest => 6,
            Compass::SouthEast => 7,
            Compass::SouthWest => 8,
        }
    }

    /// Compass reading at `from` pointing toward `to`
    ///
    /// Rows grow southward and columns grow eastward, so a negative row
    /// delta reads North and a negative column delta reads West.
    pub fn towards(from: Position, to: Position) -> Compass {
        let d_row = to.row - from.row;
        let d_col = to.col - from.col;

        match (d_row.signum(), d_col.signum()) {
            (0, 0) => Compass::Here,
            (-1, 0) => Compass::North,
            (1, 0) => Compass::South,
            (0, 1) => Compass::East,
            (0, -1) => Compass::West,
            (-1, 1) => Compass::NorthEast,
            (-1, -1) => Compass::NorthWest,
            (1, 1) => Compass::SouthEast,
            _ => Compass::SouthWest,
        }
    }
}

/// Immutable sensor bundle produced by the world for one agent at one
/// instant; created fresh every step and discarded after the adapter
/// consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Beacon task: only a compass direction toward the beacon
    Beacon { direction: Compass },
    /// Maze task: own position, blocked 4-neighbors, and known goal cells
    Maze {
        position: Position,
        blocked: Vec<Position>,
        goals: Vec<Position>,
    },
}

impl Observation {
    /// Compass reading, if this is a beacon observation
    pub fn compass(&self) -> Option<Compass> {
        match self {
            Observation::Beacon { direction } => Some(*direction),
            Observation::Maze { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_towards_cardinals() {
        let origin = Position::new(5, 5);
        assert_eq!(Compass::towards(origin, Position::new(2, 5)), Compass::North);
        assert_eq!(Compass::towards(origin, Position::new(8, 5)), Compass::South);
        assert_eq!(Compass::towards(origin, Position::new(5, 9)), Compass::East);
        assert_eq!(Compass::towards(origin, Position::new(5, 1)), Compass::West);
    }

    #[test]
    fn test_towards_diagonals_and_here() {
        let origin = Position::new(5, 5);
        assert_eq!(
            Compass::towards(origin, Position::new(1, 9)),
            Compass::NorthEast
        );
        assert_eq!(
            Compass::towards(origin, Position::new(0, 0)),
            Compass::NorthWest
        );
        assert_eq!(
            Compass::towards(origin, Position::new(9, 6)),
            Compass::SouthEast
        );
        assert_eq!(
            Compass::towards(origin, Position::new(6, 4)),
            Compass::SouthWest
        );
        assert_eq!(Compass::towards(origin, origin), Compass::Here);
    }

    #[test]
    fn test_index_matches_canonical_order() {
        for (i, dir) in Compass::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
        }
    }
}
