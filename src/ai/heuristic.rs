use crate::board::Board;
use crate::types::{Cell, Colour, Direction, Position};

/// Initial alpha-beta window bounds.
pub const MAX_EVAL: f64 = 999_999.0;
pub const MIN_EVAL: f64 = -999_999.0;

/// Static positional weights (8×8 only): corners high, cells next to corners negative.
const STABILITY_TABLE: [[i32; 8]; 8] = [
    [4, -3, 2, 2, 2, 2, -3, 4],
    [-3, -4, -1, -1, -1, -1, -4, -3],
    [2, -1, 1, 0, 0, 1, -1, 2],
    [2, -1, 0, 1, 1, 0, -1, 2],
    [2, -1, 0, 1, 1, 0, -1, 2],
    [2, -1, 1, 0, 0, 1, -1, 2],
    [-3, -4, -1, -1, -1, -1, -4, -3],
    [4, -3, 2, 2, 2, 2, -3, 4],
];

/// Scores a position from one colour's point of view.
///
/// Takes the board mutably: evaluators may regenerate the cached legal-move
/// map, so callers that still need the mover's map must recompute it.
pub trait Evaluator {
    fn evaluate(&self, board: &mut Board, perspective: Colour) -> f64;
}

/// Raw disc differential, `own - opponent`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscDifferential;

impl Evaluator for DiscDifferential {
    fn evaluate(&self, board: &mut Board, perspective: Colour) -> f64 {
        board.score(perspective) as f64
    }
}

/// Feature weights (empirically tuned).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicWeights {
    pub stability: f64,
    pub parity: f64,
    pub frontier: f64,
    pub corner_occupancy: f64,
    pub corner_closeness: f64,
    pub mobility: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            stability: 10.0,
            parity: 10.0,
            frontier: 74.396,
            corner_occupancy: 801.724,
            corner_closeness: 382.026,
            mobility: 78.922,
        }
    }
}

/// Unweighted feature values, each relative to the perspective colour.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureScores {
    pub stability: f64,
    pub parity: f64,
    pub frontier: f64,
    pub corner_occupancy: f64,
    pub corner_closeness: f64,
    pub mobility: f64,
}

impl FeatureScores {
    pub fn weighted(&self, weights: &HeuristicWeights) -> f64 {
        self.stability * weights.stability
            + self.parity * weights.parity
            + self.frontier * weights.frontier
            + self.corner_occupancy * weights.corner_occupancy
            + self.corner_closeness * weights.corner_closeness
            + self.mobility * weights.mobility
    }
}

/// Six-feature positional evaluator used by the strongest search level.
#[derive(Debug, Default, Clone)]
pub struct HeuristicEvaluator {
    weights: HeuristicWeights,
}

impl HeuristicEvaluator {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Computes every feature. Leaves the board's legal-move map generated
    /// for the opponent of `perspective`.
    pub fn features(&self, board: &mut Board, perspective: Colour) -> FeatureScores {
        let own = Cell::Disc(perspective);
        let size = board.size();

        let mut stability = 0;
        let mut own_front = 0;
        let mut opp_front = 0;
        for (pos, colour) in board.discs() {
            let weight = stability_weight(pos, size);
            let is_front = is_frontier(board, pos);
            if colour == perspective {
                stability += weight;
                own_front += u32::from(is_front);
            } else {
                stability -= weight;
                opp_front += u32::from(is_front);
            }
        }

        let counters = board.count(perspective);
        let opp_counters = board.count(perspective.opponent());
        let parity = lead_percentage(counters, opp_counters, counters + opp_counters);
        // Exposed discs are a liability.
        let frontier = -lead_percentage(own_front, opp_front, own_front + opp_front);

        let mut corner_owned = 0i32;
        let mut close = 0i32;
        for (corner, neighbours) in corner_zones(size) {
            match board.cell(corner) {
                Cell::Empty => {
                    for square in neighbours {
                        match board.cell(square) {
                            Cell::Empty => {}
                            cell if cell == own => close += 1,
                            _ => close -= 1,
                        }
                    }
                }
                cell if cell == own => corner_owned += 1,
                _ => corner_owned -= 1,
            }
        }

        board.init_legal_moves(perspective);
        let moves = board.legal_moves_possible() as u32;
        board.init_legal_moves(perspective.opponent());
        let opp_moves = board.legal_moves_possible() as u32;
        let mobility = lead_percentage(moves, opp_moves, moves + opp_moves);

        FeatureScores {
            stability: stability as f64,
            parity,
            frontier,
            corner_occupancy: 25.0 * corner_owned as f64,
            corner_closeness: -12.5 * close as f64,
            mobility,
        }
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, board: &mut Board, perspective: Colour) -> f64 {
        self.features(board, perspective).weighted(&self.weights)
    }
}

/// Share of the leading side as an integer percentage, signed towards `own`.
fn lead_percentage(own: u32, opp: u32, total: u32) -> f64 {
    if own > opp {
        (100 * own / total) as f64
    } else if opp > own {
        -((100 * opp / total) as f64)
    } else {
        0.0
    }
}

// Positional weights only exist for the standard board.
fn stability_weight(pos: Position, size: usize) -> i32 {
    if size == 8 {
        STABILITY_TABLE[pos.row as usize][pos.col as usize]
    } else {
        0
    }
}

fn is_frontier(board: &Board, pos: Position) -> bool {
    Direction::ALL.into_iter().any(|dir| {
        pos.step(dir, board.size())
            .is_some_and(|square| !board.has_disc(square))
    })
}

/// Each corner with the three cells touching it.
fn corner_zones(size: usize) -> [(Position, [Position; 3]); 4] {
    let far = (size - 1) as u8;
    let near = far - 1;
    let p = Position::new;
    [
        (p(0, 0), [p(0, 1), p(1, 1), p(1, 0)]),
        (p(0, far), [p(0, near), p(1, near), p(1, far)]),
        (p(far, 0), [p(far, 1), p(near, 1), p(near, 0)]),
        (p(far, far), [p(near, far), p(near, near), p(far, near)]),
    ]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;

    use super::*;

    fn board_after(moves: &[(u8, u8)]) -> Board {
        let mut board = Board::default();
        let mut colour = Colour::Black;
        for &(row, col) in moves {
            board.init_legal_moves(colour);
            board.make_move(Position::new(row, col), colour).unwrap();
            colour = colour.opponent();
        }
        board
    }

    #[test]
    fn opening_position_is_balanced() {
        let evaluator = HeuristicEvaluator::default();
        let mut board = Board::default();

        assert_eq!(evaluator.evaluate(&mut board, Colour::Black), 0.0);
        assert_eq!(evaluator.evaluate(&mut board, Colour::White), 0.0);
    }

    #[test]
    fn features_after_first_move() {
        let evaluator = HeuristicEvaluator::default();
        let mut board = board_after(&[(2, 3)]); // d3

        let features = evaluator.features(&mut board, Colour::Black);

        assert_eq!(features.stability, 2.0);
        assert_eq!(features.parity, 80.0);
        assert_eq!(features.frontier, -80.0);
        assert_eq!(features.corner_occupancy, 0.0);
        assert_eq!(features.corner_closeness, 0.0);
        // Three replies each side.
        assert_eq!(features.mobility, 0.0);

        let score = evaluator.evaluate(&mut board, Colour::Black);
        assert!((score - (20.0 + 800.0 - 80.0 * 74.396)).abs() < 1e-9);
    }

    #[test]
    fn corners_reward_owner_and_closeness_penalises_neighbours() {
        let mut cells = vec![Cell::Empty; 64];
        cells[0] = Cell::Disc(Colour::Black); // a1 corner
        cells[1] = Cell::Disc(Colour::White); // b1, next to an occupied corner
        cells[6] = Cell::Disc(Colour::White); // g1, next to the empty h1
        cells[8 + 6] = Cell::Disc(Colour::White); // g2
        cells[7 * 8 + 6] = Cell::Disc(Colour::Black); // g8, next to the empty h8
        let mut board = Board::from_cells(8, &cells).unwrap();
        let evaluator = HeuristicEvaluator::default();

        let black = evaluator.features(&mut board, Colour::Black);
        let white = evaluator.features(&mut board, Colour::White);

        assert_eq!(black.corner_occupancy, 25.0);
        assert_eq!(white.corner_occupancy, -25.0);
        // Black: one close disc, White: two.
        assert_eq!(black.corner_closeness, 12.5);
        assert_eq!(white.corner_closeness, -12.5);
    }

    #[test]
    fn mobility_leaves_opponent_moves_cached() {
        let evaluator = HeuristicEvaluator::default();
        let mut board = Board::default();

        evaluator.evaluate(&mut board, Colour::Black);

        assert_eq!(board.current_colour(), Colour::White);
        assert_eq!(board.legal_moves_possible(), 4);
    }

    #[test]
    fn evaluation_is_antisymmetric_between_colours() {
        let evaluator = HeuristicEvaluator::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut board = Board::default();
        let mut colour = Colour::Black;

        for _ in 0..30 {
            let black = evaluator.evaluate(&mut board, Colour::Black);
            let white = evaluator.evaluate(&mut board, Colour::White);
            assert!((black + white).abs() < 1e-9, "{black} vs {white}");

            board.init_legal_moves(colour);
            if let Some(&mv) = board.legal_move_list().choose(&mut rng) {
                board.make_move(mv, colour).unwrap();
            }
            colour = colour.opponent();
        }
    }

    #[test]
    fn disc_differential_matches_score() {
        let mut board = board_after(&[(2, 3)]);

        assert_eq!(DiscDifferential.evaluate(&mut board, Colour::Black), 3.0);
        assert_eq!(DiscDifferential.evaluate(&mut board, Colour::White), -3.0);
    }

    #[test]
    fn non_standard_sizes_skip_positional_weights() {
        let evaluator = HeuristicEvaluator::default();
        let mut board = Board::new(6).unwrap();
        board.make_move(Position::new(1, 2), Colour::Black).unwrap();

        let features = evaluator.features(&mut board, Colour::Black);

        assert_eq!(features.stability, 0.0);
        assert!(features.parity > 0.0);
    }
}
