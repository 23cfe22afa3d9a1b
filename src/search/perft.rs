//! Exhaustive legal-move tree leaf counting.
//!
//! Used to validate the rules boundary against published reference counts
//! and to measure raw traversal throughput. Purely structural: the scorer
//! is never consulted.

use crate::board::packed_board::PackedBoard;
use crate::rules::rules_engine::{RulesEngine, RulesResult};

/// Counts leaf nodes of the legal-move tree at `depth`.
///
/// A position at the depth horizon counts as one leaf; a position with no
/// legal moves above the horizon contributes zero. The asymmetry matches
/// the published perft corpus and must not be "fixed".
pub fn perft<R>(rules: &R, board: &PackedBoard, depth: u8) -> RulesResult<u64>
where
    R: RulesEngine + ?Sized,
{
    if depth == 0 {
        return Ok(1);
    }

    let moves = rules.legal_moves(board)?;
    if moves.is_empty() {
        return Ok(0);
    }

    let mut nodes = 0;
    for mv in &moves {
        // Each branch traverses its own copy; siblings never observe each
        // other's state.
        let child = rules.apply(board, mv)?;
        nodes += perft(rules, &child, depth - 1)?;
    }
    Ok(nodes)
}
