//! One side of a networked game, independent of the transport.
//!
//! The caller reads lines from the socket and feeds them to [`Session`];
//! every returned line must be written back. Read deadlines are enforced by
//! the transport, which reports them through [`Session::timeout`].

use log::{info, warn};

use crate::board::Board;
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::game::{MoveSelector, ScoreEvent, ScoreObserver};
use crate::protocol::{self, Command};
use crate::types::Colour;

pub const DEFAULT_RESEND_LIMIT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    LocalWin,
    RemoteWin,
    Tie,
    /// `bye` without a result.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshake,
    Playing,
    Finished(Outcome),
}

pub struct Session {
    board: Board,
    local: Colour,
    turn: Colour,
    state: SessionState,
    last_sent: Option<String>,
    /// Consecutive malformed lines or resend requests tolerated before
    /// the remote side forfeits.
    resend_limit: u8,
    malformed_streak: u8,
    resend_streak: u8,
    observers: Vec<ScoreObserver>,
}

impl Session {
    /// The wire format only spells 8×8 coordinates; other sizes are
    /// rejected with `InvalidBoardSize`.
    pub fn new(board: Board, local: Colour) -> Result<Self, GameError> {
        if board.size() != protocol::BOARD_SIZE {
            return Err(GameError::InvalidBoardSize(board.size()));
        }

        Ok(Self {
            board,
            local,
            turn: Colour::Black,
            state: SessionState::Handshake,
            last_sent: None,
            resend_limit: DEFAULT_RESEND_LIMIT,
            malformed_streak: 0,
            resend_streak: 0,
            observers: Vec::new(),
        })
    }

    /// Fresh opening position sized and limited by `config`.
    pub fn from_config(config: &EngineConfig, local: Colour) -> Result<Self, GameError> {
        let board = Board::new(config.board_size)?;
        Ok(Self::new(board, local)?.with_resend_limit(config.resend_limit))
    }

    pub fn with_resend_limit(mut self, limit: u8) -> Self {
        self.resend_limit = limit;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Registers a callback fired after every move applied to the board.
    pub fn subscribe(&mut self, observer: ScoreObserver) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_colour(&self) -> Colour {
        self.local
    }

    /// Colour expected to move next.
    pub fn turn(&self) -> Colour {
        self.turn
    }

    pub fn is_local_turn(&self) -> bool {
        self.state == SessionState::Playing && self.turn == self.local
    }

    /// Answers a handshake line from the requesting side.
    pub fn answer_handshake(&mut self, line: &str, accept: bool) -> Result<String, GameError> {
        self.expect_state(SessionState::Handshake)?;

        match protocol::parse_command(line)? {
            Command::Hello => self.send(Command::Hello),
            Command::NewGame if accept => {
                info!("new game accepted, playing {}", self.local);
                self.state = SessionState::Playing;
                self.send(Command::Accept)
            }
            Command::NewGame => {
                self.state = SessionState::Finished(Outcome::Abandoned);
                self.send(Command::Reject)
            }
            _ => Err(GameError::MalformedCommand(line.to_string())),
        }
    }

    /// Handles the reply to our own handshake request. Returns `true` once
    /// the game has started.
    pub fn handshake_reply(&mut self, line: &str) -> Result<bool, GameError> {
        self.expect_state(SessionState::Handshake)?;

        match protocol::parse_command(line)? {
            Command::Hello => Ok(false),
            Command::Accept => {
                info!("new game accepted, playing {}", self.local);
                self.state = SessionState::Playing;
                Ok(true)
            }
            Command::Reject => {
                self.state = SessionState::Finished(Outcome::Abandoned);
                Ok(false)
            }
            _ => Err(GameError::MalformedCommand(line.to_string())),
        }
    }

    /// Processes one line from the remote side during play. Returns the line
    /// to send back, if any.
    pub fn receive(&mut self, line: &str) -> Result<Option<String>, GameError> {
        self.expect_state(SessionState::Playing)?;
        let remote = self.local.opponent();

        let command = match protocol::parse_command(line) {
            Ok(Command::Hello | Command::NewGame | Command::Accept | Command::Reject) => {
                return self.malformed(line);
            }
            Ok(command) => command,
            Err(GameError::MalformedCommand(_)) => return self.malformed(line),
            Err(err) => return Err(err),
        };

        match protocol::localise_outcome(command, remote) {
            Command::Resend => {
                if self.resend_streak >= self.resend_limit {
                    warn!("{remote} asked for too many resends, forfeiting");
                    return self.forfeit_remote();
                }
                self.resend_streak += 1;
                Ok(self.last_sent.clone())
            }
            Command::Bye => {
                self.finish(Outcome::Abandoned);
                Ok(None)
            }
            // Remote's point of view: "You win" concedes to us.
            Command::YouWin => {
                self.finish(Outcome::LocalWin);
                Ok(None)
            }
            Command::IWin => {
                let outcome = self.scored_outcome();
                if outcome != Outcome::RemoteWin {
                    warn!(
                        "remote claims a win but the board reads {} {} - {} {}",
                        self.local,
                        self.board.count(self.local),
                        remote,
                        self.board.count(remote)
                    );
                }
                self.finish(outcome);
                Ok(None)
            }
            Command::Tie => {
                self.finish(Outcome::Tie);
                Ok(None)
            }
            Command::Pass => {
                self.expect_turn(remote)?;
                self.reset_streaks();
                self.turn = self.local;
                Ok(None)
            }
            Command::Move(pos) => {
                self.expect_turn(remote)?;
                self.board.init_legal_moves(remote);
                if self.board.make_move(pos, remote).is_err() {
                    warn!("{remote} sent illegal move {line:?}, forfeiting");
                    return self.forfeit_remote();
                }
                self.reset_streaks();
                self.turn = self.local;
                self.notify();
                Ok(None)
            }
            Command::Hello
            | Command::NewGame
            | Command::Accept
            | Command::Reject
            | Command::ColourWin(_) => self.malformed(line),
        }
    }

    /// Plays the local side's turn: a move, a pass, or the final result.
    pub fn local_move(&mut self, selector: &mut dyn MoveSelector) -> Result<String, GameError> {
        self.expect_state(SessionState::Playing)?;
        self.expect_turn(self.local)?;

        self.board.init_legal_moves(self.local);
        if self.board.legal_moves_possible() > 0 {
            let pos = selector.select_move(&self.board, self.local)?;
            // Encode first: the board only changes once the reply exists.
            let line = Command::Move(pos).to_line()?;
            self.board.init_legal_moves(self.local);
            self.board.make_move(pos, self.local)?;
            self.turn = self.local.opponent();
            self.notify();
            self.last_sent = Some(line.clone());
            return Ok(line);
        }

        let reply = protocol::localise_outcome(
            protocol::end_of_game_reply(&self.board, self.local),
            self.local,
        );
        match reply {
            Command::Pass => self.turn = self.local.opponent(),
            Command::IWin => self.finish(Outcome::LocalWin),
            Command::YouWin => self.finish(Outcome::RemoteWin),
            _ => self.finish(Outcome::Tie),
        }
        self.send(reply)
    }

    /// The remote side missed its read deadline and loses by default.
    pub fn timeout(&mut self) -> Result<String, GameError> {
        self.expect_state(SessionState::Playing)?;
        warn!("{}: {} forfeits", GameError::Timeout, self.local.opponent());
        self.finish(Outcome::LocalWin);
        self.send(Command::IWin)
    }

    fn malformed(&mut self, line: &str) -> Result<Option<String>, GameError> {
        if self.malformed_streak < self.resend_limit {
            self.malformed_streak += 1;
            warn!(
                "malformed line {line:?} ({}/{}), asking for resend",
                self.malformed_streak, self.resend_limit
            );
            return Ok(Some(Command::Resend.to_line()?));
        }

        warn!("too many malformed lines in a row, forfeiting");
        self.forfeit_remote()
    }

    fn reset_streaks(&mut self) {
        self.malformed_streak = 0;
        self.resend_streak = 0;
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

    fn forfeit_remote(&mut self) -> Result<Option<String>, GameError> {
        self.finish(Outcome::LocalWin);
        self.send(Command::IWin).map(Some)
    }

    fn scored_outcome(&self) -> Outcome {
        match self.board.score(self.local) {
            0 => Outcome::Tie,
            score if score > 0 => Outcome::LocalWin,
            _ => Outcome::RemoteWin,
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(
            "game over: {outcome:?} (Black {} - White {})",
            self.board.count(Colour::Black),
            self.board.count(Colour::White)
        );
        self.state = SessionState::Finished(outcome);
    }

    fn send(&mut self, command: Command) -> Result<String, GameError> {
        let line = command.to_line()?;
        self.last_sent = Some(line.clone());
        Ok(line)
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), GameError> {
        match self.state {
            state if state == expected => Ok(()),
            SessionState::Finished(_) => Err(GameError::GameOver),
            _ => Err(GameError::MalformedCommand(format!(
                "unexpected in state {:?}",
                self.state
            ))),
        }
    }

    fn expect_turn(&self, colour: Colour) -> Result<(), GameError> {
        if self.turn == colour {
            Ok(())
        } else {
            Err(GameError::NotYourTurn(colour))
        }
    }
}
