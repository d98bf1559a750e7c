use log::{debug, info};
use rand::Rng;
use rand::seq::IndexedRandom;
use web_time::{Duration, Instant};

use crate::ai::heuristic::{Evaluator, MAX_EVAL, MIN_EVAL};
use crate::board::Board;
use crate::error::GameError;
use crate::types::{Colour, Position};

pub const MINIMAX_DEPTH: u8 = 4;
pub const START_DEPTH: u8 = 3;
pub const MAX_DEPTH: u8 = 25;
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(4950);

// Out of range for any disc differential up to 8×8; widened for larger boards.
const SENTINEL: i32 = 99;

fn sentinel(board: &Board) -> i32 {
    let cells = (board.size() * board.size()) as i32;
    SENTINEL.max(cells + 1)
}

/// Depth and time limits for the tree searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    pub minimax_depth: u8,
    pub start_depth: u8,
    /// Iterative deepening stops before reaching this depth.
    pub max_depth: u8,
    /// `None` disables the wall-clock deadline.
    pub think_time: Option<Duration>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            minimax_depth: MINIMAX_DEPTH,
            start_depth: START_DEPTH,
            max_depth: MAX_DEPTH,
            think_time: Some(DEFAULT_THINK_TIME),
        }
    }
}

/// Per-call bookkeeping: start time, deadline and node counter.
#[derive(Debug, Clone)]
pub struct SearchContext {
    start_time: Instant,
    timeout: Option<Duration>,
    enforce_deadline: bool,
    nodes: u64,
}

impl SearchContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            timeout,
            enforce_deadline: true,
            nodes: 0,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn expired(&self) -> bool {
        self.enforce_deadline
            && self
                .timeout
                .is_some_and(|timeout| self.start_time.elapsed() >= timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchResult {
    Complete(Option<Position>, f64),
    TimedOut,
}

/// Outcome of an iterative-deepening search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchReport {
    pub best_move: Position,
    pub score: f64,
    /// Deepest fully searched depth; 0 when the move was forced.
    pub depth_completed: u8,
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Uniformly random legal move.
/// Caller contract: `board` holds the legal-move map of the side to move.
pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Result<Position, GameError> {
    board
        .legal_move_list()
        .choose(rng)
        .copied()
        .ok_or(GameError::NoLegalMoves(board.current_colour()))
}

/// One-ply lookahead on disc differential. Ties keep the earliest move.
/// Caller contract: `board` holds the legal-move map for `colour`.
pub fn greedy_move(board: &Board, colour: Colour) -> Result<Position, GameError> {
    let mut best: Option<(Position, i32)> = None;

    for mv in board.legal_move_list() {
        let next = play(board, mv, colour)?;
        let score = next.score(colour);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((mv, score));
        }
    }

    best.map(|(mv, _)| mv)
        .ok_or(GameError::NoLegalMoves(colour))
}

/// Fixed-depth minimax on disc differential.
/// Caller contract: `board` holds the legal-move map for `colour`.
pub fn minimax_move<R: Rng + ?Sized>(
    board: &Board,
    colour: Colour,
    depth: u8,
    rng: &mut R,
) -> Result<Position, GameError> {
    if board.legal_moves_possible() == 0 {
        return Err(GameError::NoLegalMoves(colour));
    }

    let mut search = Minimax {
        root: colour,
        rng,
        nodes: 0,
    };
    let (score, best) = search.minimax(board, depth.max(1), colour)?;
    debug!(
        "minimax depth {depth}: score {score}, {} nodes",
        search.nodes
    );
    best.ok_or_else(|| GameError::SearchFailure("minimax returned no move".to_string()))
}

struct Minimax<'r, R: ?Sized> {
    root: Colour,
    rng: &'r mut R,
    nodes: u64,
}

impl<R: Rng + ?Sized> Minimax<'_, R> {
    fn minimax(
        &mut self,
        board: &Board,
        depth: u8,
        mover: Colour,
    ) -> Result<(i32, Option<Position>), GameError> {
        self.nodes += 1;

        if depth == 0 {
            return Ok((board.score(self.root), None));
        }

        let mut node = board.clone();
        node.init_legal_moves(mover);
        if is_over(&node) {
            return Ok((node.score(self.root), None));
        }
        if node.legal_moves_possible() == 0 {
            // Forced pass: the opponent moves at the same depth.
            let (score, _) = self.minimax(&node, depth, mover.opponent())?;
            return Ok((score, None));
        }

        let maximising = mover == self.root;
        let bound = sentinel(&node);
        let mut best_score = if maximising { -bound } else { bound };
        let mut best_move = None;

        for mv in node.legal_move_list() {
            let next = play(&node, mv, mover)?;
            let (score, _) = self.minimax(&next, depth - 1, mover.opponent())?;
            let improves = if maximising {
                score > best_score
            } else {
                score < best_score
            };
            if improves {
                best_score = score;
                best_move = Some(mv);
            }
        }

        if best_move.is_none() {
            best_move = Some(random_move(&node, &mut *self.rng)?);
        }

        Ok((best_score, best_move))
    }
}

/// Alpha-beta searcher over a pluggable evaluator.
pub struct Searcher<'a, E: Evaluator> {
    evaluator: &'a E,
    limits: SearchLimits,
    root: Colour,
    ctx: SearchContext,
}

impl<'a, E: Evaluator> Searcher<'a, E> {
    pub fn new(evaluator: &'a E, limits: SearchLimits) -> Self {
        Self {
            evaluator,
            limits,
            root: Colour::Black,
            ctx: SearchContext::new(limits.think_time),
        }
    }

    /// Iterative deepening from `start_depth` while time remains.
    ///
    /// A depth's result is only kept when that whole depth finished inside
    /// the time budget. The starting depth is always searched to completion.
    /// Caller contract: `board` holds the legal-move map for `colour`.
    pub fn search(&mut self, board: &Board, colour: Colour) -> Result<SearchReport, GameError> {
        self.root = colour;
        self.ctx = SearchContext::new(self.limits.think_time);

        let moves = board.legal_move_list();
        let Some(&first) = moves.first() else {
            return Err(GameError::NoLegalMoves(colour));
        };

        let mut report = SearchReport {
            best_move: first,
            score: MIN_EVAL,
            depth_completed: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
        };
        if moves.len() == 1 {
            return Ok(report);
        }

        info!("{colour} thinking...");

        let start_depth = self.limits.start_depth.max(1);
        let mut depth = start_depth;
        while depth < self.limits.max_depth || depth == start_depth {
            self.ctx.enforce_deadline = depth > start_depth;
            if self.ctx.expired() {
                break;
            }

            match self.alpha_beta(board, depth, colour, MIN_EVAL, MAX_EVAL)? {
                SearchResult::Complete(Some(mv), score) if !self.ctx.expired() => {
                    report.best_move = mv;
                    report.score = score;
                    report.depth_completed = depth;
                }
                SearchResult::Complete(..) if !self.ctx.expired() => {
                    report.depth_completed = depth;
                }
                _ => {
                    debug!("depth {depth} aborted, keeping depth {}", report.depth_completed);
                    break;
                }
            }
            depth += 1;
        }

        report.nodes = self.ctx.nodes();
        report.elapsed = self.ctx.elapsed();
        let secs = report.elapsed.as_secs_f64();
        info!(
            "search finished at depth {}: {} nodes, {:.0} nodes/s",
            report.depth_completed,
            report.nodes,
            if secs > 0.0 { report.nodes as f64 / secs } else { 0.0 }
        );

        Ok(report)
    }

    /// Single alpha-beta pass at a fixed depth with no deadline.
    /// Caller contract: `board` holds the legal-move map for `colour`.
    pub fn search_depth(
        &mut self,
        board: &Board,
        colour: Colour,
        depth: u8,
    ) -> Result<(Position, f64), GameError> {
        self.root = colour;
        self.ctx = SearchContext::new(None);

        if board.legal_moves_possible() == 0 {
            return Err(GameError::NoLegalMoves(colour));
        }

        match self.alpha_beta(board, depth.max(1), colour, MIN_EVAL, MAX_EVAL)? {
            SearchResult::Complete(Some(mv), score) => Ok((mv, score)),
            _ => Err(GameError::SearchFailure(
                "alpha-beta returned no move".to_string(),
            )),
        }
    }

    pub fn nodes(&self) -> u64 {
        self.ctx.nodes()
    }

    fn alpha_beta(
        &mut self,
        board: &Board,
        depth: u8,
        mover: Colour,
        alpha: f64,
        beta: f64,
    ) -> Result<SearchResult, GameError> {
        self.ctx.nodes += 1;

        let mut node = board.clone();
        if depth == 0 {
            let score = self.evaluator.evaluate(&mut node, self.root);
            return Ok(SearchResult::Complete(None, score));
        }

        node.init_legal_moves(mover);
        if is_over(&node) {
            let score = self.evaluator.evaluate(&mut node, self.root);
            return Ok(SearchResult::Complete(None, score));
        }
        if node.legal_moves_possible() == 0 {
            // Forced pass: the opponent moves at the same depth.
            return Ok(
                match self.alpha_beta(&node, depth, mover.opponent(), alpha, beta)? {
                    SearchResult::Complete(_, score) => SearchResult::Complete(None, score),
                    SearchResult::TimedOut => SearchResult::TimedOut,
                },
            );
        }

        let maximising = mover == self.root;
        let mut alpha = alpha;
        let mut beta = beta;
        let mut best_move = None;

        for mv in node.legal_move_list() {
            let next = play(&node, mv, mover)?;
            let score = match self.alpha_beta(&next, depth - 1, mover.opponent(), alpha, beta)? {
                SearchResult::Complete(_, score) => score,
                SearchResult::TimedOut => return Ok(SearchResult::TimedOut),
            };
            if self.ctx.expired() {
                return Ok(SearchResult::TimedOut);
            }

            if maximising {
                if score > alpha {
                    alpha = score;
                    best_move = Some(mv);
                }
            } else if score < beta {
                beta = score;
                best_move = Some(mv);
            }
            if alpha >= beta {
                break;
            }
        }

        let bound = if maximising { alpha } else { beta };
        Ok(SearchResult::Complete(best_move, bound))
    }
}

/// Neither the side whose moves `board` holds nor its opponent can move.
fn is_over(board: &Board) -> bool {
    if board.legal_moves_possible() > 0 {
        return false;
    }
    let mut probe = board.clone();
    probe.init_legal_moves(board.current_colour().opponent());
    probe.legal_moves_possible() == 0
}

/// Clones `board` and applies `mv` for `colour` on the copy.
fn play(board: &Board, mv: Position, colour: Colour) -> Result<Board, GameError> {
    let mut next = board.clone();
    next.make_move(mv, colour)
        .map_err(|err| GameError::SearchFailure(err.to_string()))?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::ai::heuristic::{DiscDifferential, HeuristicEvaluator};
    use crate::types::Cell;

    fn unbounded(max_depth: u8) -> SearchLimits {
        SearchLimits {
            max_depth,
            think_time: None,
            ..SearchLimits::default()
        }
    }

    /// Plays `plies` random moves from the opening; returns the board with
    /// legal moves generated for the side to move.
    fn random_position(seed: u64, plies: usize) -> (Board, Colour) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::default();
        let mut colour = Colour::Black;
        for _ in 0..plies {
            board.init_legal_moves(colour);
            if let Ok(mv) = random_move(&board, &mut rng) {
                board.make_move(mv, colour).unwrap();
            }
            colour = colour.opponent();
        }
        board.init_legal_moves(colour);
        if board.legal_moves_possible() == 0 {
            colour = colour.opponent();
            board.init_legal_moves(colour);
        }
        (board, colour)
    }

    #[test]
    fn random_move_is_always_legal() {
        let board = Board::default();
        let legal = board.legal_move_list();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let mv = random_move(&board, &mut rng).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn random_move_without_moves_is_an_error() {
        let mut cells = vec![Cell::Disc(Colour::Black); 16];
        cells[0] = Cell::Empty;
        let board = Board::from_cells(4, &cells).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(
            random_move(&board, &mut rng),
            Err(GameError::NoLegalMoves(Colour::Black))
        );
    }

    #[test]
    fn greedy_takes_first_of_equal_opening_moves() {
        // Every opening move flips one disc; d3 comes first.
        let board = Board::default();

        assert_eq!(greedy_move(&board, Colour::Black), Ok(Position::new(2, 3)));
    }

    #[test]
    fn greedy_prefers_the_larger_capture() {
        let b = Cell::Disc(Colour::Black);
        let w = Cell::Disc(Colour::White);
        let mut cells = vec![Cell::Empty; 64];
        // a1 captures b1; a8 captures b8, c8 and d8.
        cells[1] = w;
        cells[2] = b;
        cells[7 * 8 + 1] = w;
        cells[7 * 8 + 2] = w;
        cells[7 * 8 + 3] = w;
        cells[7 * 8 + 4] = b;
        let board = Board::from_cells(8, &cells).unwrap();

        assert_eq!(greedy_move(&board, Colour::Black), Ok(Position::new(7, 0)));
    }

    #[test]
    fn minimax_scores_beyond_a_hundred_on_large_boards() {
        let b = Cell::Disc(Colour::Black);
        let mut cells = vec![b; 144];
        cells[0] = Cell::Empty;
        cells[2] = Cell::Disc(Colour::White);
        let board = Board::from_cells(12, &cells).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut search = Minimax {
            root: Colour::Black,
            rng: &mut rng,
            nodes: 0,
        };

        let (score, best) = search.minimax(&board, 1, Colour::White).unwrap();

        assert_eq!(score, 138);
        assert_eq!(best, Some(Position::new(0, 0)));
    }

    #[test]
    fn minimax_move_is_legal_and_leaves_input_untouched() {
        let (board, colour) = random_position(5, 10);
        let before = board.clone();
        let mut rng = StdRng::seed_from_u64(1);

        let mv = minimax_move(&board, colour, MINIMAX_DEPTH, &mut rng).unwrap();

        assert!(board.is_legal_move(mv));
        assert_eq!(board, before);
    }

    #[test]
    fn alpha_beta_matches_minimax_on_disc_differential() {
        for seed in 0..6 {
            let (board, colour) = random_position(seed, 8 + seed as usize);
            for depth in 1..=3 {
                let mut rng = StdRng::seed_from_u64(seed);
                let expected = minimax_move(&board, colour, depth, &mut rng).unwrap();

                let mut searcher = Searcher::new(&DiscDifferential, unbounded(MAX_DEPTH));
                let (mv, _) = searcher.search_depth(&board, colour, depth).unwrap();

                assert_eq!(mv, expected, "seed {seed}, depth {depth}");
            }
        }
    }

    #[test]
    fn iterative_deepening_stops_before_max_depth() {
        let evaluator = HeuristicEvaluator::default();
        let board = Board::default();
        let mut searcher = Searcher::new(&evaluator, unbounded(5));

        let report = searcher.search(&board, Colour::Black).unwrap();

        assert_eq!(report.depth_completed, 4);
        assert!(board.is_legal_move(report.best_move));
        assert!(report.nodes > 0);
    }

    #[test]
    fn iterative_deepening_returns_last_completed_depth() {
        let evaluator = HeuristicEvaluator::default();
        let mut board = Board::default();
        board.make_move(Position::new(2, 3), Colour::Black).unwrap();
        board.init_legal_moves(Colour::White);

        let mut deepening = Searcher::new(&evaluator, unbounded(5));
        let report = deepening.search(&board, Colour::White).unwrap();

        let mut fixed = Searcher::new(&evaluator, unbounded(5));
        let (mv, score) = fixed.search_depth(&board, Colour::White, 4).unwrap();

        assert_eq!(report.depth_completed, 4);
        assert_eq!(report.best_move, mv);
        assert_eq!(report.score, score);
    }

    #[test]
    fn start_depth_completes_even_when_out_of_time() {
        let evaluator = HeuristicEvaluator::default();
        let board = Board::default();
        let limits = SearchLimits {
            think_time: Some(Duration::ZERO),
            ..SearchLimits::default()
        };
        let mut searcher = Searcher::new(&evaluator, limits);

        let report = searcher.search(&board, Colour::Black).unwrap();

        assert_eq!(report.depth_completed, START_DEPTH);
        assert!(board.is_legal_move(report.best_move));
    }

    #[test]
    fn alpha_beta_aborts_once_deadline_has_passed() {
        let evaluator = HeuristicEvaluator::default();
        let board = Board::default();
        let limits = SearchLimits {
            think_time: Some(Duration::ZERO),
            ..SearchLimits::default()
        };
        let mut searcher = Searcher::new(&evaluator, limits);
        searcher.root = Colour::Black;
        searcher.ctx.start_time = Instant::now() - Duration::from_millis(1);

        let result = searcher
            .alpha_beta(&board, 4, Colour::Black, MIN_EVAL, MAX_EVAL)
            .unwrap();

        assert_eq!(result, SearchResult::TimedOut);
    }

    #[test]
    fn single_legal_move_is_returned_without_searching() {
        // White's only move is a1.
        let mut cells = vec![Cell::Disc(Colour::White); 64];
        cells[0] = Cell::Empty;
        cells[1] = Cell::Disc(Colour::Black);
        let mut board = Board::from_cells(8, &cells).unwrap();
        board.init_legal_moves(Colour::White);
        let evaluator = HeuristicEvaluator::default();
        let mut searcher = Searcher::new(&evaluator, SearchLimits::default());

        let report = searcher.search(&board, Colour::White).unwrap();

        assert_eq!(report.best_move, Position::new(0, 0));
        assert_eq!(report.depth_completed, 0);
    }

    #[test]
    fn is_over_requires_both_sides_to_be_stuck() {
        let mut cells = vec![Cell::Disc(Colour::Black); 16];
        cells[0] = Cell::Empty;
        let board = Board::from_cells(4, &cells).unwrap();
        assert!(is_over(&board));

        // Black is stuck but White can still take a1.
        let mut cells = vec![Cell::Disc(Colour::White); 16];
        cells[0] = Cell::Empty;
        cells[1] = Cell::Disc(Colour::Black);
        let board = Board::from_cells(4, &cells).unwrap();
        assert_eq!(board.legal_moves_possible(), 0);
        assert!(!is_over(&board));
    }

    #[test]
    fn forced_pass_keeps_searching_for_the_opponent() {
        // Black to move has nothing; White answers at a1.
        let mut cells = vec![Cell::Disc(Colour::White); 16];
        cells[0] = Cell::Empty;
        cells[1] = Cell::Disc(Colour::Black);
        let board = Board::from_cells(4, &cells).unwrap();
        let mut searcher = Searcher::new(&DiscDifferential, unbounded(MAX_DEPTH));
        searcher.root = Colour::Black;

        let result = searcher
            .alpha_beta(&board, 1, Colour::Black, MIN_EVAL, MAX_EVAL)
            .unwrap();

        // After White plays a1 the whole board is white.
        assert_eq!(result, SearchResult::Complete(None, -16.0));
    }
}
