//! Line-oriented text protocol for networked games.
//!
//! Handshake: `hello`, `new game`, answered by `accept` / `reject`.
//! Play: `move <file><rank>` (e.g. `move e3`), `move pass`, `resend`, `bye`,
//! and the results `You win`, `I win`, `we tie`, `<Colour> win`.

use crate::board::Board;
use crate::error::GameError;
use crate::types::{Colour, Position};

pub const MOVE_PREFIX: &str = "move ";
const MOVE_LINE_LEN: usize = 7;
/// Only 8×8 coordinates have a `move XN` spelling.
pub const BOARD_SIZE: usize = 8;
const FILES: &[u8; BOARD_SIZE] = b"abcdefgh";
const RANKS: &[u8; BOARD_SIZE] = b"12345678";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hello,
    NewGame,
    Accept,
    Reject,
    Move(Position),
    Pass,
    Resend,
    Bye,
    YouWin,
    IWin,
    Tie,
    /// Result named by colour; translated to `IWin`/`YouWin` by each side.
    ColourWin(Colour),
}

impl Command {
    pub fn to_line(self) -> Result<String, GameError> {
        Ok(match self {
            Self::Hello => "hello".to_string(),
            Self::NewGame => "new game".to_string(),
            Self::Accept => "accept".to_string(),
            Self::Reject => "reject".to_string(),
            Self::Move(pos) => encode_move(pos)?,
            Self::Pass => "move pass".to_string(),
            Self::Resend => "resend".to_string(),
            Self::Bye => "bye".to_string(),
            Self::YouWin => "You win".to_string(),
            Self::IWin => "I win".to_string(),
            Self::Tie => "we tie".to_string(),
            Self::ColourWin(colour) => format!("{colour} win"),
        })
    }
}

/// Parses one received line. Trailing CR/LF is ignored.
pub fn parse_command(line: &str) -> Result<Command, GameError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let command = match line {
        "hello" => Command::Hello,
        "new game" => Command::NewGame,
        "accept" => Command::Accept,
        "reject" => Command::Reject,
        "move pass" => Command::Pass,
        "resend" => Command::Resend,
        "bye" => Command::Bye,
        "You win" => Command::YouWin,
        "I win" => Command::IWin,
        "we tie" => Command::Tie,
        "Black win" => Command::ColourWin(Colour::Black),
        "White win" => Command::ColourWin(Colour::White),
        _ => Command::Move(decode_move(line)?),
    };
    Ok(command)
}

/// Decodes the exact form `move XN`: file `a`..`h` is the column,
/// rank `1`..`8` the row.
pub fn decode_move(line: &str) -> Result<Position, GameError> {
    let malformed = || GameError::MalformedCommand(line.to_string());

    if line.len() != MOVE_LINE_LEN {
        return Err(malformed());
    }
    let coord = line.strip_prefix(MOVE_PREFIX).ok_or_else(malformed)?.as_bytes();

    let col = FILES.iter().position(|&f| f == coord[0]).ok_or_else(malformed)?;
    let row = RANKS.iter().position(|&r| r == coord[1]).ok_or_else(malformed)?;
    Ok(Position::new(row as u8, col as u8))
}

pub fn encode_move(pos: Position) -> Result<String, GameError> {
    let (row, col) = (pos.row as usize, pos.col as usize);
    if row >= RANKS.len() || col >= FILES.len() {
        return Err(GameError::OutOfBounds {
            row: pos.row,
            col: pos.col,
        });
    }
    Ok(format!(
        "{MOVE_PREFIX}{}{}",
        FILES[col] as char, RANKS[row] as char
    ))
}

/// Translates a colour-named result into `local`'s own perspective.
pub fn localise_outcome(command: Command, local: Colour) -> Command {
    match command {
        Command::ColourWin(colour) if colour == local => Command::IWin,
        Command::ColourWin(_) => Command::YouWin,
        other => other,
    }
}

/// What `colour` announces when it has no legal move: a pass while the
/// opponent can still play, otherwise the colour-named result.
pub fn end_of_game_reply(board: &Board, colour: Colour) -> Command {
    let mut probe = board.clone();
    probe.init_legal_moves(colour.opponent());
    if probe.legal_moves_possible() > 0 {
        return Command::Pass;
    }

    let black = board.count(Colour::Black);
    let white = board.count(Colour::White);
    if black == white {
        Command::Tie
    } else if black > white {
        Command::ColourWin(Colour::Black)
    } else {
        Command::ColourWin(Colour::White)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::types::Cell;

    #[test_case("move e3", 2, 4 ; "e3")]
    #[test_case("move a1", 0, 0 ; "a1")]
    #[test_case("move h8", 7, 7 ; "h8")]
    #[test_case("move d6", 5, 3 ; "d6")]
    fn decodes_file_as_column_and_rank_as_row(line: &str, row: u8, col: u8) {
        assert_eq!(decode_move(line), Ok(Position::new(row, col)));
    }

    #[test_case("move e" ; "six characters")]
    #[test_case("move e33" ; "eight characters")]
    #[test_case("move i3" ; "file past h")]
    #[test_case("move e9" ; "rank past 8")]
    #[test_case("move E3" ; "uppercase file")]
    #[test_case("mover e3" ; "wrong verb")]
    #[test_case("jump e3" ; "unknown verb of same length")]
    fn rejects_malformed_moves(line: &str) {
        assert_eq!(
            decode_move(line),
            Err(GameError::MalformedCommand(line.to_string()))
        );
    }

    #[test]
    fn encodes_row_and_column() {
        assert_eq!(encode_move(Position::new(2, 4)).unwrap(), "move e3");
        assert_eq!(encode_move(Position::new(7, 0)).unwrap(), "move a8");
        assert!(encode_move(Position::new(8, 0)).is_err());
    }

    #[test_case("hello", Command::Hello ; "hello")]
    #[test_case("new game", Command::NewGame ; "new game")]
    #[test_case("accept\r\n", Command::Accept ; "accept with crlf")]
    #[test_case("reject", Command::Reject ; "reject")]
    #[test_case("move pass", Command::Pass ; "pass")]
    #[test_case("resend", Command::Resend ; "resend")]
    #[test_case("bye", Command::Bye ; "bye")]
    #[test_case("You win", Command::YouWin ; "you win")]
    #[test_case("I win", Command::IWin ; "i win")]
    #[test_case("we tie", Command::Tie ; "tie")]
    #[test_case("White win", Command::ColourWin(Colour::White) ; "white win")]
    #[test_case("move c4", Command::Move(Position::new(3, 2)) ; "move")]
    fn parses_every_command(line: &str, expected: Command) {
        assert_eq!(parse_command(line), Ok(expected));
        assert_eq!(
            parse_command(&expected.to_line().unwrap()),
            Ok(expected)
        );
    }

    #[test]
    fn unknown_line_is_malformed() {
        assert!(matches!(
            parse_command("good game"),
            Err(GameError::MalformedCommand(_))
        ));
    }

    #[test]
    fn colour_results_are_localised() {
        let white_win = Command::ColourWin(Colour::White);

        assert_eq!(localise_outcome(white_win, Colour::White), Command::IWin);
        assert_eq!(localise_outcome(white_win, Colour::Black), Command::YouWin);
        assert_eq!(localise_outcome(Command::Tie, Colour::Black), Command::Tie);
    }

    #[test]
    fn stuck_side_passes_while_opponent_can_move() {
        let mut cells = vec![Cell::Disc(Colour::White); 64];
        cells[0] = Cell::Empty;
        cells[1] = Cell::Disc(Colour::Black);
        let board = Board::from_cells(8, &cells).unwrap();

        assert_eq!(end_of_game_reply(&board, Colour::Black), Command::Pass);
    }

    #[test]
    fn finished_board_announces_the_leader() {
        let mut cells = vec![Cell::Disc(Colour::White); 64];
        cells[0] = Cell::Empty;
        let board = Board::from_cells(8, &cells).unwrap();
        assert_eq!(
            end_of_game_reply(&board, Colour::Black),
            Command::ColourWin(Colour::White)
        );

        let cells: Vec<Cell> = (0..16)
            .map(|i| Cell::Disc(if i % 2 == 0 { Colour::Black } else { Colour::White }))
            .collect();
        let board = Board::from_cells(4, &cells).unwrap();
        assert_eq!(end_of_game_reply(&board, Colour::White), Command::Tie);
    }
}
