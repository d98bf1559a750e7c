use log::debug;

use crate::board::Board;
use crate::error::GameError;
use crate::types::{Colour, GameResult, GameState, Position};

/// Source of moves for the computer side.
pub trait MoveSelector: Send {
    fn select_move(&mut self, board: &Board, colour: Colour) -> Result<Position, GameError>;
}

#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FirstLegalMoveSelector;

#[cfg(test)]
impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(&mut self, board: &Board, colour: Colour) -> Result<Position, GameError> {
        let mut node = board.clone();
        node.init_legal_moves(colour);
        node.legal_move_list()
            .first()
            .copied()
            .ok_or(GameError::NoLegalMoves(colour))
    }
}

/// Disc counts after a change to the authoritative board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub black: u32,
    pub white: u32,
}

pub type ScoreObserver = Box<dyn FnMut(&ScoreEvent) + Send>;

/// A local game between a person and a [`MoveSelector`].
///
/// Owns the authoritative board; its legal-move map is always generated for
/// `current_player`.
pub struct GameInstance {
    board: Board,
    pub current_player: Colour,
    pub human: Colour,
    pub is_game_over: bool,
    pub is_pass: bool,
    pub flipped: Vec<Position>,
    selector: Box<dyn MoveSelector>,
    observers: Vec<ScoreObserver>,
}

impl GameInstance {
    pub fn new(
        size: usize,
        human: Colour,
        selector: Box<dyn MoveSelector>,
    ) -> Result<Self, GameError> {
        Ok(Self {
            board: Board::new(size)?,
            current_player: Colour::Black,
            human,
            is_game_over: false,
            is_pass: false,
            flipped: Vec::new(),
            selector,
            observers: Vec::new(),
        })
    }

    #[cfg(test)]
    fn new_with_default_selector() -> Self {
        Self {
            board: Board::default(),
            current_player: Colour::Black,
            human: Colour::Black,
            is_game_over: false,
            is_pass: false,
            flipped: Vec::new(),
            selector: Box::new(FirstLegalMoveSelector),
            observers: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Registers a callback fired after every count change.
    pub fn subscribe(&mut self, observer: ScoreObserver) {
        self.observers.push(observer);
    }

    /// The person's move. An illegal move leaves everything unchanged so the
    /// same player can try again.
    pub fn place(&mut self, row: u8, col: u8) -> Result<(), GameError> {
        if self.is_game_over {
            return Err(GameError::GameOver);
        }
        if self.current_player != self.human {
            return Err(GameError::NotYourTurn(self.human));
        }

        let pos = self.checked_position(row, col)?;
        self.apply_move(pos)
    }

    pub fn has_legal_moves_for_current(&self) -> bool {
        self.board.legal_moves_possible() > 0
    }

    /// Hands the turn over when the side to move has no legal move.
    pub fn pass(&mut self) -> Result<(), GameError> {
        if self.is_game_over {
            return Err(GameError::GameOver);
        }
        if self.has_legal_moves_for_current() {
            return Err(GameError::MustMove(self.current_player));
        }

        debug!("{} passes", self.current_player);
        self.is_pass = true;
        self.flipped.clear();
        self.advance_turn();
        Ok(())
    }

    pub fn end_game(&mut self) {
        self.is_game_over = true;
    }

    pub fn do_ai_move(&mut self) -> Result<(), GameError> {
        if self.is_game_over {
            return Err(GameError::GameOver);
        }
        let colour = self.current_player;
        if colour == self.human {
            return Err(GameError::NotYourTurn(colour.opponent()));
        }
        if !self.has_legal_moves_for_current() {
            return Err(GameError::NoLegalMoves(colour));
        }

        let selected = self.selector.select_move(&self.board, colour)?;
        if !self.board.contains(selected) {
            return Err(GameError::OutOfBounds {
                row: selected.row,
                col: selected.col,
            });
        }

        self.apply_move(selected)
    }

    pub fn get_legal_moves(&self) -> Vec<Position> {
        self.board.legal_move_list()
    }

    pub fn to_game_state(&self) -> GameState {
        GameState {
            size: self.board.size() as u8,
            board: self.board.to_array(),
            current_player: self.current_player.code(),
            black_count: self.board.count(Colour::Black),
            white_count: self.board.count(Colour::White),
            is_game_over: self.is_game_over,
            is_pass: self.is_pass,
            flipped: self.flipped.clone(),
        }
    }

    pub fn to_game_result(&self) -> GameResult {
        let black_count = self.board.count(Colour::Black);
        let white_count = self.board.count(Colour::White);
        GameResult {
            winner: if black_count > white_count {
                Colour::Black.code()
            } else if white_count > black_count {
                Colour::White.code()
            } else {
                0
            },
            black_count,
            white_count,
        }
    }

    fn apply_move(&mut self, pos: Position) -> Result<(), GameError> {
        let flips = self.board.make_move(pos, self.current_player)?;

        self.is_pass = false;
        self.flipped = flips;
        self.notify();
        self.advance_turn();

        Ok(())
    }

    /// Gives the turn to the opponent; ends the game on a full board or when
    /// neither side can move.
    fn advance_turn(&mut self) {
        let next = self.current_player.opponent();
        self.current_player = next;
        self.board.init_legal_moves(next);

        if self.board.empty_count() == 0 {
            self.end_game();
            return;
        }

        if !self.has_legal_moves_for_current() {
            let mut probe = self.board.clone();
            probe.init_legal_moves(next.opponent());
            if probe.legal_moves_possible() == 0 {
                debug!("neither side can move, game over");
                self.end_game();
            }
        }
    }

    fn notify(&mut self) {
        let event = ScoreEvent {
            black: self.board.count(Colour::Black),
            white: self.board.count(Colour::White),
        };
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn checked_position(&self, row: u8, col: u8) -> Result<Position, GameError> {
        let pos = Position::new(row, col);
        if self.board.contains(pos) {
            Ok(pos)
        } else {
            Err(GameError::OutOfBounds { row, col })
        }
    }

    #[cfg(test)]
    fn set_board_for_test(&mut self, board: Board, current_player: Colour) {
        self.board = board;
        self.board.init_legal_moves(current_player);
        self.current_player = current_player;
        self.is_game_over = false;
        self.is_pass = false;
        self.flipped.clear();
    }
}
