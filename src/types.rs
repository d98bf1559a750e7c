use std::fmt;

use serde::{Deserialize, Serialize};

/// Disc colour. Black always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colour {
    Black,
    White,
}

impl Colour {
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::White => "White",
        }
    }

    /// Wire/array encoding: 1=black, 2=white.
    pub fn code(self) -> u8 {
        match self {
            Self::Black => 1,
            Self::White => 2,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Content of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Disc(Colour),
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Disc(colour) => colour.code(),
        }
    }
}

/// A board coordinate. Ordered row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Steps one cell in `dir`, returning `None` when that leaves an
    /// `size`×`size` board.
    pub fn step(self, dir: Direction, size: usize) -> Option<Self> {
        let (dr, dc) = dir.delta();
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        let limit = size as i32;
        if (0..limit).contains(&row) && (0..limit).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }
}

/// The eight compass directions. North is towards row 0, west towards column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::West,
        Direction::East,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    /// `(row delta, col delta)`.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
            Self::West => (0, -1),
            Self::East => (0, 1),
            Self::SouthWest => (1, -1),
            Self::South => (1, 0),
            Self::SouthEast => (1, 1),
        }
    }

    pub const fn reverse(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::West => Self::East,
            Self::East => Self::West,
            Self::SouthWest => Self::NorthEast,
            Self::South => Self::North,
            Self::SouthEast => Self::NorthWest,
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of directions along which a move captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |dir| self.contains(*dir))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::default();
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}

/// Public game state returned from the UI/WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub size: u8,
    /// Row-major cells: 0=empty, 1=black, 2=white.
    pub board: Vec<u8>,
    pub current_player: u8,
    pub black_count: u32,
    pub white_count: u32,
    pub is_game_over: bool,
    /// Contract:
    /// - `true` when the previous action was a pass.
    /// - `false` when the previous action was a normal move.
    pub is_pass: bool,
    /// Contract:
    /// - Normal move: list of flipped positions.
    /// - Pass: must be an empty list.
    pub flipped: Vec<Position>,
}

/// Final result after game over. `winner` is 0 on a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub winner: u8,
    pub black_count: u32,
    pub white_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_direction_negates_delta() {
        for dir in Direction::ALL {
            let (dr, dc) = dir.delta();
            assert_eq!(dir.reverse().delta(), (-dr, -dc));
        }
    }

    #[test]
    fn step_stays_on_board() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::North, 8), None);
        assert_eq!(corner.step(Direction::West, 8), None);
        assert_eq!(
            corner.step(Direction::SouthEast, 8),
            Some(Position::new(1, 1))
        );
        assert_eq!(Position::new(7, 7).step(Direction::South, 8), None);
    }

    #[test]
    fn direction_set_tracks_membership() {
        let set: DirectionSet = [Direction::East, Direction::North].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(Direction::East));
        assert!(!set.contains(Direction::West));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Direction::North, Direction::East]
        );
    }

    #[test]
    fn positions_order_row_major() {
        assert!(Position::new(0, 7) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
    }
}
