use std::collections::BTreeMap;
use std::fmt;

use crate::error::GameError;
use crate::types::{Cell, Colour, Direction, DirectionSet, Position};

pub const DEFAULT_SIZE: usize = 8;
pub const MIN_SIZE: usize = 4;
pub const MAX_SIZE: usize = 26;

/// Legal moves for the colour they were generated for: landing cell to the
/// directions along which placing there captures.
pub type LegalMoveMap = BTreeMap<Position, DirectionSet>;

/// Othello board state on an `N`×`N` grid.
///
/// The legal-move map is cached for `current_colour()` only. It must be
/// regenerated with [`Board::init_legal_moves`] whenever the mover changes;
/// applying a move clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    black: u32,
    white: u32,
    current: Colour,
    legal: LegalMoveMap,
    /// Discs that may still border an empty cell. Bounds the legal-move scan.
    candidates: Vec<Position>,
}

impl Board {
    /// Creates the opening position:
    /// d4=white, e4=black, d5=black, e5=white (on 8×8), Black to move.
    pub fn new(size: usize) -> Result<Self, GameError> {
        check_size(size)?;
        Ok(Self::opening(size))
    }

    /// Builds an arbitrary position from row-major cells, Black to move.
    pub fn from_cells(size: usize, cells: &[Cell]) -> Result<Self, GameError> {
        check_size(size)?;
        if cells.len() != size * size {
            return Err(GameError::InvalidBoardSize(size));
        }

        let mut board = Self::empty(size);
        for (idx, cell) in cells.iter().enumerate() {
            if let Cell::Disc(colour) = *cell {
                let pos = Position::new((idx / size) as u8, (idx % size) as u8);
                board.place_disc(pos, colour);
            }
        }
        board.init_legal_moves(Colour::Black);
        Ok(board)
    }

    fn opening(size: usize) -> Self {
        let mut board = Self::empty(size);
        let lo = (size / 2 - 1) as u8;
        let hi = (size / 2) as u8;
        board.place_disc(Position::new(lo, lo), Colour::White);
        board.place_disc(Position::new(hi, hi), Colour::White);
        board.place_disc(Position::new(lo, hi), Colour::Black);
        board.place_disc(Position::new(hi, lo), Colour::Black);
        board.init_legal_moves(Colour::Black);
        board
    }

    fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
            black: 0,
            white: 0,
            current: Colour::Black,
            legal: LegalMoveMap::new(),
            candidates: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, pos: Position) -> bool {
        (pos.row as usize) < self.size && (pos.col as usize) < self.size
    }

    pub fn cell(&self, pos: Position) -> Cell {
        self.cells[self.index(pos)]
    }

    pub fn has_disc(&self, pos: Position) -> bool {
        self.cell(pos) != Cell::Empty
    }

    pub fn count(&self, colour: Colour) -> u32 {
        match colour {
            Colour::Black => self.black,
            Colour::White => self.white,
        }
    }

    /// Disc differential from `colour`'s point of view.
    pub fn score(&self, colour: Colour) -> i32 {
        self.count(colour) as i32 - self.count(colour.opponent()) as i32
    }

    pub fn total_discs(&self) -> u32 {
        self.black + self.white
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.total_discs() as usize
    }

    /// Occupied cells in row-major order.
    pub fn discs(&self) -> impl Iterator<Item = (Position, Colour)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, cell)| match cell {
            Cell::Disc(colour) => Some((self.position_of(idx), *colour)),
            Cell::Empty => None,
        })
    }

    /// Colour the cached legal-move map belongs to.
    pub fn current_colour(&self) -> Colour {
        self.current
    }

    /// Regenerates and caches the legal-move map for `colour`.
    pub fn init_legal_moves(&mut self, colour: Colour) {
        self.current = colour;
        self.legal.clear();

        let candidates = std::mem::take(&mut self.candidates);
        let mut kept = Vec::with_capacity(candidates.len());

        for pos in candidates {
            let open = self.open_directions(pos);
            if open.is_empty() {
                // Fully surrounded discs never border an empty cell again.
                continue;
            }
            kept.push(pos);

            if self.cell(pos) == Cell::Disc(colour) {
                continue;
            }

            for dir in open.iter() {
                let Some(landing) = pos.step(dir, self.size) else {
                    continue;
                };
                let capture_dir = dir.reverse();
                if self.captures(landing, capture_dir, colour) {
                    self.legal.entry(landing).or_default().insert(capture_dir);
                }
            }
        }

        self.candidates = kept;
    }

    pub fn legal_moves_possible(&self) -> usize {
        self.legal.len()
    }

    pub fn is_legal_move(&self, pos: Position) -> bool {
        self.legal.contains_key(&pos)
    }

    pub fn legal_move_map(&self) -> &LegalMoveMap {
        &self.legal
    }

    /// Legal moves in map iteration (row-major) order.
    pub fn legal_move_list(&self) -> Vec<Position> {
        self.legal.keys().copied().collect()
    }

    /// Places a disc for `colour` and flips every captured run.
    ///
    /// `pos` must be in the legal-move map generated for `colour`; otherwise
    /// the board is left untouched and `IllegalMove` is returned.
    /// Returns the flipped cells.
    pub fn make_move(&mut self, pos: Position, colour: Colour) -> Result<Vec<Position>, GameError> {
        let directions = match self.legal.get(&pos) {
            Some(dirs) if self.current == colour => *dirs,
            _ => {
                return Err(GameError::IllegalMove {
                    row: pos.row,
                    col: pos.col,
                });
            }
        };

        self.place_disc(pos, colour);

        let opponent = Cell::Disc(colour.opponent());
        let mut flipped = Vec::new();
        for dir in directions.iter() {
            let mut next = pos.step(dir, self.size);
            while let Some(square) = next {
                if self.cell(square) != opponent {
                    break;
                }
                self.flip(square, colour);
                flipped.push(square);
                next = square.step(dir, self.size);
            }
        }

        self.legal.clear();
        Ok(flipped)
    }

    /// Converts board to row-major codes: 0=empty, 1=black, 2=white.
    pub fn to_array(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.code()).collect()
    }

    /// Whether placing at `landing` for `colour` captures along `dir`.
    fn captures(&self, landing: Position, dir: Direction, colour: Colour) -> bool {
        let mut next = landing.step(dir, self.size);
        let mut has_opponent = false;

        while let Some(square) = next {
            match self.cell(square) {
                Cell::Disc(c) if c == colour => return has_opponent,
                Cell::Disc(_) => has_opponent = true,
                Cell::Empty => return false,
            }
            next = square.step(dir, self.size);
        }

        false
    }

    /// Directions from `pos` towards an empty neighbour.
    fn open_directions(&self, pos: Position) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                pos.step(*dir, self.size)
                    .is_some_and(|square| !self.has_disc(square))
            })
            .collect()
    }

    fn place_disc(&mut self, pos: Position, colour: Colour) {
        let idx = self.index(pos);
        self.cells[idx] = Cell::Disc(colour);
        *self.counter_mut(colour) += 1;
        self.candidates.push(pos);
    }

    fn flip(&mut self, pos: Position, colour: Colour) {
        let idx = self.index(pos);
        self.cells[idx] = Cell::Disc(colour);
        *self.counter_mut(colour) += 1;
        *self.counter_mut(colour.opponent()) -= 1;
    }

    fn counter_mut(&mut self, colour: Colour) -> &mut u32 {
        match colour {
            Colour::Black => &mut self.black,
            Colour::White => &mut self.white,
        }
    }

    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.size + pos.col as usize
    }

    fn position_of(&self, idx: usize) -> Position {
        Position::new((idx / self.size) as u8, (idx % self.size) as u8)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::opening(DEFAULT_SIZE)
    }
}

/// Console rendering: files across, ranks down, `L` marks a legal move.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.size.to_string().len();
        write!(f, "{:width$} ", "")?;
        for col in 0..self.size {
            write!(f, "{} ", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;

        for row in 0..self.size {
            write!(f, "{:>width$} ", row + 1)?;
            for col in 0..self.size {
                let pos = Position::new(row as u8, col as u8);
                let symbol = match self.cell(pos) {
                    Cell::Disc(Colour::Black) => 'B',
                    Cell::Disc(Colour::White) => 'W',
                    Cell::Empty if self.is_legal_move(pos) => 'L',
                    Cell::Empty => ' ',
                };
                write!(f, "{symbol} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn check_size(size: usize) -> Result<(), GameError> {
    if (MIN_SIZE..=MAX_SIZE).contains(&size) && size % 2 == 0 {
        Ok(())
    } else {
        Err(GameError::InvalidBoardSize(size))
    }
}
