//! Rules-engine boundary.
//!
//! Search, perft, and the self-play simulator never implement chess rules
//! themselves; they consume this trait. The production implementation lives
//! in [`crate::rules::library_rules`]; tests substitute mock providers to
//! exercise terminal and repetition edge cases deterministically.

use std::error::Error;
use std::fmt;

use crate::board::packed_board::PackedBoard;
use crate::board::packed_move::PackedMove;

pub type RulesResult<T> = Result<T, RulesError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The position text could not be parsed or describes an invalid board.
    InvalidFen(String),
    /// A move was applied that is not legal in the given position.
    IllegalMove(String),
    /// The boundary was driven into a state it cannot service.
    InvalidState(String),
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::InvalidFen(text) => write!(f, "invalid FEN: {text}"),
            RulesError::IllegalMove(mv) => write!(f, "illegal move: {mv}"),
            RulesError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl Error for RulesError {}

/// Narrow contract with the external rules collaborator.
///
/// `legal_moves` returns the empty list exactly on terminal positions;
/// `apply` must only be fed moves drawn from `legal_moves` on the same
/// board (behavior on other input is a caller error). `is_stalemate` is
/// additionally true for the engine's detectable insufficient-material
/// draws. The FEN codec reads and writes four space-separated fields,
/// omitting the half-move clock and full-move number.
pub trait RulesEngine: Send + Sync {
    fn legal_moves(&self, board: &PackedBoard) -> RulesResult<Vec<PackedMove>>;

    fn apply(&self, board: &PackedBoard, mv: &PackedMove) -> RulesResult<PackedBoard>;

    fn in_check(&self, board: &PackedBoard) -> RulesResult<bool>;

    fn is_mate(&self, board: &PackedBoard) -> RulesResult<bool>;

    fn is_stalemate(&self, board: &PackedBoard) -> RulesResult<bool>;

    fn to_fen(&self, board: &PackedBoard) -> String;

    fn from_fen(&self, text: &str) -> RulesResult<PackedBoard>;
}
