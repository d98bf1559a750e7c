pub mod heuristic;
pub mod search;

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::board::Board;
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::game::MoveSelector;
use crate::types::{Colour, Position};

pub use heuristic::{DiscDifferential, Evaluator, HeuristicEvaluator, HeuristicWeights};
pub use search::{SearchLimits, SearchReport, Searcher};

/// Computer opponent strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Uniformly random legal move.
    #[default]
    Novice,
    /// Best immediate disc differential.
    Adept,
    /// Fixed-depth minimax on disc differential.
    Expert,
    /// Iterative-deepening alpha-beta on the positional heuristic.
    Master,
}

impl Difficulty {
    /// Parses a difficulty label; anything unrecognised plays randomly.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Adept" => Self::Adept,
            "Expert" => Self::Expert,
            "Master" => Self::Master,
            _ => Self::Novice,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Novice => "Novice",
            Self::Adept => "Adept",
            Self::Expert => "Expert",
            Self::Master => "Master",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Computer player: dispatches to the strategy for its difficulty.
pub struct Engine {
    difficulty: Difficulty,
    limits: SearchLimits,
    evaluator: HeuristicEvaluator,
    rng: StdRng,
}

impl Engine {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            limits: SearchLimits::default(),
            evaluator: HeuristicEvaluator::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.difficulty).with_limits(config.search_limits())
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Deterministic random choices, for reproducible games.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Picks a move for `colour`. The caller's board is never modified.
    pub fn choose(&mut self, board: &Board, colour: Colour) -> Result<Position, GameError> {
        let mut node = board.clone();
        node.init_legal_moves(colour);
        if node.legal_moves_possible() == 0 {
            return Err(GameError::NoLegalMoves(colour));
        }

        match self.difficulty {
            Difficulty::Novice => search::random_move(&node, &mut self.rng),
            Difficulty::Adept => search::greedy_move(&node, colour),
            Difficulty::Expert => {
                search::minimax_move(&node, colour, self.limits.minimax_depth, &mut self.rng)
            }
            Difficulty::Master => Searcher::new(&self.evaluator, self.limits)
                .search(&node, colour)
                .map(|report| report.best_move),
        }
    }
}

impl MoveSelector for Engine {
    fn select_move(&mut self, board: &Board, colour: Colour) -> Result<Position, GameError> {
        self.choose(board, colour)
    }
}

/// One-shot move selection with the given difficulty label and think time.
pub fn select_move(
    board: &Board,
    colour: Colour,
    label: &str,
    think_time: Duration,
) -> Result<Position, GameError> {
    let limits = SearchLimits {
        think_time: Some(think_time),
        ..SearchLimits::default()
    };
    Engine::new(Difficulty::from_label(label))
        .with_limits(limits)
        .choose(board, colour)
}
