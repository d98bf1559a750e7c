use std::path::PathBuf;

use crate::types::Colour;

/// Errors raised by board mutation, move selection and the wire protocol.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("malformed command: {0:?}")]
    MalformedCommand(String),

    #[error("illegal move at row {row}, col {col}")]
    IllegalMove { row: u8, col: u8 },

    #[error("unsupported board size {0}: expected an even size in 4..=26")]
    InvalidBoardSize(usize),

    #[error("position row {row}, col {col} is off the board")]
    OutOfBounds { row: u8, col: u8 },

    #[error("opponent did not respond before the read deadline")]
    Timeout,

    #[error("search failed: {0}")]
    SearchFailure(String),

    #[error("{0} has no legal moves")]
    NoLegalMoves(Colour),

    #[error("it is not {0}'s turn")]
    NotYourTurn(Colour),

    #[error("{0} has a legal move and cannot pass")]
    MustMove(Colour),

    #[error("game is already over")]
    GameOver,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
