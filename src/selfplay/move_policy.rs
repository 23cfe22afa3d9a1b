//! Move-selection policies for self-play.
//!
//! A policy maps a position to one legal move. The softmax policy is the
//! workhorse for dataset generation: it weights every legal move by the
//! scorer's opinion of the successor and samples from that distribution, so
//! games stay varied without being uniformly random.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::packed_board::PackedBoard;
use crate::board::packed_move::PackedMove;
use crate::rules::library_rules::LibraryRules;
use crate::rules::rules_engine::{RulesEngine, RulesError, RulesResult};
use crate::search::board_scoring::BoardScorer;
use crate::search::negamax::{negamax_search, SearchConfig};

pub trait MovePolicy {
    /// Picks one legal move. Callers guarantee the position has at least
    /// one; a policy that still finds none reports `InvalidState`.
    fn select_move(&mut self, board: &PackedBoard) -> RulesResult<PackedMove>;
}

fn no_moves_error(board: &PackedBoard) -> RulesError {
    RulesError::InvalidState(format!(
        "policy asked to move in a terminal position: {}",
        crate::rules::fen::board_to_fen(board)
    ))
}

/// Uniform choice over the legal moves.
pub struct UniformRandomPolicy {
    rules: LibraryRules,
    rng: StdRng,
}

impl UniformRandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rules: LibraryRules,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MovePolicy for UniformRandomPolicy {
    fn select_move(&mut self, board: &PackedBoard) -> RulesResult<PackedMove> {
        let moves = self.rules.legal_moves(board)?;
        moves
            .as_slice()
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| no_moves_error(board))
    }
}

/// Samples a move with probability proportional to the softmax of its
/// score.
///
/// Each successor is scored from its own side-to-move perspective (the
/// opponent), so the value of the move for the current mover is the
/// negation. Shifting by the maximum before exponentiating leaves the
/// distribution unchanged and keeps the weights finite.
pub struct SoftmaxScorerPolicy<S: BoardScorer> {
    rules: LibraryRules,
    scorer: S,
    rng: StdRng,
}

impl<S: BoardScorer> SoftmaxScorerPolicy<S> {
    pub fn new(scorer: S, seed: u64) -> Self {
        Self {
            rules: LibraryRules,
            scorer,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<S: BoardScorer> MovePolicy for SoftmaxScorerPolicy<S> {
    fn select_move(&mut self, board: &PackedBoard) -> RulesResult<PackedMove> {
        let moves = self.rules.legal_moves(board)?;
        if moves.is_empty() {
            return Err(no_moves_error(board));
        }

        let mut values = Vec::with_capacity(moves.len());
        for mv in &moves {
            let successor = self.rules.apply(board, mv)?;
            values.push(-self.scorer.score(&successor));
        }

        let shift = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = values.iter().map(|value| (value - shift).exp()).collect();
        let distribution = WeightedIndex::new(&weights).map_err(|err| {
            RulesError::InvalidState(format!("softmax weights are unusable: {err}"))
        })?;

        Ok(moves[distribution.sample(&mut self.rng)])
    }
}

/// Deterministic best move from a fixed-depth negamax search.
pub struct NegamaxPolicy<S: BoardScorer> {
    rules: LibraryRules,
    scorer: S,
    config: SearchConfig,
}

impl<S: BoardScorer> NegamaxPolicy<S> {
    pub fn new(scorer: S, config: SearchConfig) -> Self {
        Self {
            rules: LibraryRules,
            scorer,
            config,
        }
    }
}

impl<S: BoardScorer> MovePolicy for NegamaxPolicy<S> {
    fn select_move(&mut self, board: &PackedBoard) -> RulesResult<PackedMove> {
        negamax_search(&self.rules, &self.scorer, board, self.config)?
            .best_move
            .ok_or_else(|| no_moves_error(board))
    }
}
