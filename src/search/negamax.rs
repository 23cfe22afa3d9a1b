//! Depth-bounded negamax search.
//!
//! Every reachable node at the requested depth is visited: no pruning, no
//! move ordering, no transposition table. That keeps the search a pure,
//! easily verified function of (position, scorer, depth) at the cost of
//! practical depth.

use crate::board::packed_board::PackedBoard;
use crate::board::packed_move::PackedMove;
use crate::rules::rules_engine::{RulesEngine, RulesResult};
use crate::search::board_scoring::BoardScorer;

/// Base score for a side with no legal moves; the remaining depth is
/// subtracted so that dead ends found nearer the root score worse.
pub const LOSS_SCORE: f64 = -100_000.0;

/// How a position with no legal moves is scored.
///
/// `LossLikeMate` reproduces the historical behavior: stalemate scores like
/// checkmate, as a loss for the side to move. `DrawWhenNotInCheck` scores
/// stalemate as a dead draw and reserves the loss score for true mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalemateScoring {
    #[default]
    LossLikeMate,
    DrawWhenNotInCheck,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub depth: u8,
    pub stalemate_scoring: StalemateScoring,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            stalemate_scoring: StalemateScoring::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_depth(depth: u8) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// `None` at the depth horizon and on positions with no legal moves.
    pub best_move: Option<PackedMove>,
    pub value: f64,
}

pub fn negamax_search<R, S>(
    rules: &R,
    scorer: &S,
    board: &PackedBoard,
    config: SearchConfig,
) -> RulesResult<SearchOutcome>
where
    R: RulesEngine + ?Sized,
    S: BoardScorer + ?Sized,
{
    if config.depth == 0 {
        return Ok(SearchOutcome {
            best_move: None,
            value: scorer.score(board),
        });
    }

    let moves = rules.legal_moves(board)?;
    if moves.is_empty() {
        let loss = LOSS_SCORE - f64::from(config.depth);
        let value = match config.stalemate_scoring {
            StalemateScoring::LossLikeMate => loss,
            StalemateScoring::DrawWhenNotInCheck => {
                if rules.in_check(board)? {
                    loss
                } else {
                    0.0
                }
            }
        };
        return Ok(SearchOutcome {
            best_move: None,
            value,
        });
    }

    let mut best_move = None;
    let mut best_value = f64::NEG_INFINITY;
    for mv in moves {
        let child = rules.apply(board, &mv)?;
        let reply = negamax_search(
            rules,
            scorer,
            &child,
            SearchConfig {
                depth: config.depth - 1,
                ..config
            },
        )?;
        // The opponent's optimum from their perspective is our pessimum.
        let value = -reply.value;
        if value > best_value {
            best_value = value;
            best_move = Some(mv);
        }
    }

    Ok(SearchOutcome {
        best_move,
        value: best_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::packed_board::{PackedBoard, WHITE_PAWN};
    use crate::rules::fen::STARTING_FEN;
    use crate::rules::library_rules::LibraryRules;
    use crate::rules::rules_engine::{RulesError, RulesResult};
    use crate::search::board_scoring::MaterialScorer;

    fn board(fen: &str) -> PackedBoard {
        LibraryRules.from_fen(fen).expect("FEN should parse")
    }

    /// Rules stub with a scripted move list; applying any move returns the
    /// board unchanged.
    struct ScriptedRules {
        moves: Vec<PackedMove>,
        in_check: bool,
    }

    impl RulesEngine for ScriptedRules {
        fn legal_moves(&self, _board: &PackedBoard) -> RulesResult<Vec<PackedMove>> {
            Ok(self.moves.clone())
        }

        fn apply(&self, board: &PackedBoard, _mv: &PackedMove) -> RulesResult<PackedBoard> {
            Ok(*board)
        }

        fn in_check(&self, _board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.in_check)
        }

        fn is_mate(&self, _board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.moves.is_empty() && self.in_check)
        }

        fn is_stalemate(&self, _board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.moves.is_empty() && !self.in_check)
        }

        fn to_fen(&self, _board: &PackedBoard) -> String {
            "scripted".to_owned()
        }

        fn from_fen(&self, text: &str) -> RulesResult<PackedBoard> {
            Err(RulesError::InvalidFen(text.to_owned()))
        }
    }

    #[test]
    fn depth_zero_returns_the_static_score_and_no_move() {
        let outcome = negamax_search(
            &LibraryRules,
            &MaterialScorer,
            &board("4k3/8/8/8/8/8/8/3QK3 w - -"),
            SearchConfig::with_depth(0),
        )
        .expect("search should run");
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.value, 9.0);
    }

    #[test]
    fn dead_end_score_grows_more_negative_with_remaining_depth() {
        let rules = ScriptedRules {
            moves: Vec::new(),
            in_check: true,
        };
        let board = PackedBoard::empty();
        for depth in [1u8, 2, 5] {
            let outcome =
                negamax_search(&rules, &MaterialScorer, &board, SearchConfig::with_depth(depth))
                    .expect("search should run");
            assert_eq!(outcome.best_move, None);
            assert_eq!(outcome.value, LOSS_SCORE - f64::from(depth));
        }
    }

    #[test]
    fn stalemate_scores_as_loss_by_default_and_draw_when_redesigned() {
        let stalemate = board("k7/8/1Q6/8/8/8/8/K7 b - -");
        let compatible = negamax_search(
            &LibraryRules,
            &MaterialScorer,
            &stalemate,
            SearchConfig::with_depth(3),
        )
        .expect("search should run");
        assert_eq!(compatible.value, LOSS_SCORE - 3.0);

        let redesigned = negamax_search(
            &LibraryRules,
            &MaterialScorer,
            &stalemate,
            SearchConfig {
                depth: 3,
                stalemate_scoring: StalemateScoring::DrawWhenNotInCheck,
            },
        )
        .expect("search should run");
        assert_eq!(redesigned.value, 0.0);
        assert_eq!(redesigned.best_move, None);
    }

    #[test]
    fn checkmate_keeps_the_loss_score_under_both_scoring_modes() {
        let mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq -");
        for scoring in [StalemateScoring::LossLikeMate, StalemateScoring::DrawWhenNotInCheck] {
            let outcome = negamax_search(
                &LibraryRules,
                &MaterialScorer,
                &mated,
                SearchConfig {
                    depth: 2,
                    stalemate_scoring: scoring,
                },
            )
            .expect("search should run");
            assert_eq!(outcome.value, LOSS_SCORE - 2.0);
        }
    }

    #[test]
    fn search_finds_mate_in_one() {
        // Fool's mate: black mates with Qd8-h4.
        let outcome = negamax_search(
            &LibraryRules,
            &MaterialScorer,
            &board("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq -"),
            SearchConfig::with_depth(2),
        )
        .expect("search should run");
        let best = outcome.best_move.expect("a move should be chosen");
        assert_eq!(best.from_square, 59);
        assert_eq!(best.to_square, 31);
        assert_eq!(outcome.value, -(LOSS_SCORE - 1.0));
    }

    #[test]
    fn value_is_the_negation_of_the_best_reply_value() {
        let rules = LibraryRules;
        let start = board(STARTING_FEN);
        let config = SearchConfig::with_depth(2);
        let outcome = negamax_search(&rules, &MaterialScorer, &start, config)
            .expect("search should run");
        let best = outcome.best_move.expect("a move should be chosen");

        let after = rules.apply(&start, &best).expect("best move should apply");
        let reply = negamax_search(&rules, &MaterialScorer, &after, SearchConfig::with_depth(1))
            .expect("reply search should run");
        assert_eq!(outcome.value, -reply.value);
    }

    #[test]
    fn first_move_wins_ties() {
        let first = PackedMove::quiet(8, 16, WHITE_PAWN);
        let second = PackedMove::quiet(9, 17, WHITE_PAWN);
        let rules = ScriptedRules {
            moves: vec![first, second],
            in_check: false,
        };
        // Every child is the same board, so every move scores identically.
        let outcome = negamax_search(
            &rules,
            &MaterialScorer,
            &PackedBoard::empty(),
            SearchConfig::with_depth(1),
        )
        .expect("search should run");
        assert_eq!(outcome.best_move, Some(first));
    }
}
