//! Production rules engine backed by the `chess` crate.
//!
//! The adapter converts the packed encoding to a `chess::Board` for move
//! generation, move application, and status checks, then converts the
//! result back. Conversion goes through the FEN codec in both directions so
//! that the packed encoding stays the single source of truth for what a
//! position looks like.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece};

use crate::board::packed_board::{
    is_black_piece, PackedBoard, BLACK_PAWN, NO_PIECE, NO_SQUARE, WHITE_PAWN,
};
use crate::board::packed_move::PackedMove;
use crate::rules::fen::{board_from_fen, board_to_fen};
use crate::rules::rules_engine::{RulesEngine, RulesError, RulesResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryRules;

impl LibraryRules {
    fn library_board(&self, board: &PackedBoard) -> RulesResult<Board> {
        let fen = board_to_fen(board);
        Board::from_str(&fen)
            .map_err(|err| RulesError::InvalidState(format!("unplayable position '{fen}': {err}")))
    }

    fn packed_board(&self, board: &Board) -> RulesResult<PackedBoard> {
        board_from_fen(&board.to_string())
    }

    /// Rebuilds the six-field move record from a library move and the board
    /// it applies to. En passant is the one case where the captured square
    /// differs from the destination.
    fn packed_move(&self, board: &PackedBoard, mv: ChessMove) -> PackedMove {
        let from_square = mv.get_source().to_index() as u8;
        let to_square = mv.get_dest().to_index() as u8;
        let moving_piece = board.piece_at(from_square);
        let mover_is_black = is_black_piece(moving_piece);

        let resulting_piece = match mv.get_promotion() {
            Some(piece) => piece_code(piece, mover_is_black),
            None => moving_piece,
        };

        let target_piece = board.piece_at(to_square);
        let (captured_square, captured_piece) = if target_piece != NO_PIECE {
            (to_square, target_piece)
        } else if moving_piece % 6 == WHITE_PAWN && from_square % 8 != to_square % 8 {
            // Diagonal pawn move onto an empty square: en passant. The
            // captured pawn sits on the origin rank of the destination file.
            let captured_square = if mover_is_black {
                to_square + 8
            } else {
                to_square - 8
            };
            let captured_piece = if mover_is_black { WHITE_PAWN } else { BLACK_PAWN };
            (captured_square, captured_piece)
        } else {
            (NO_SQUARE, NO_PIECE)
        };

        PackedMove::new(
            from_square,
            to_square,
            captured_square,
            moving_piece,
            resulting_piece,
            captured_piece,
        )
    }

    fn library_move(&self, mv: &PackedMove) -> ChessMove {
        let promotion = if mv.is_promotion() {
            Some(code_piece(mv.resulting_piece))
        } else {
            None
        };
        ChessMove::new(
            square_from_index(mv.from_square),
            square_from_index(mv.to_square),
            promotion,
        )
    }

    /// Detectable insufficient-material draw: no pawns, rooks, or queens on
    /// the board, and neither side has more than one minor piece.
    fn insufficient_material(&self, board: &PackedBoard) -> bool {
        let mut white_minors = 0;
        let mut black_minors = 0;
        for square in 0..64 {
            let code = board.piece_at(square);
            if code == NO_PIECE {
                continue;
            }
            match code % 6 {
                0 | 3 | 4 => return false, // pawn, rook, or queen
                1 | 2 => {
                    if is_black_piece(code) {
                        black_minors += 1;
                    } else {
                        white_minors += 1;
                    }
                }
                _ => {}
            }
        }
        white_minors <= 1 && black_minors <= 1
    }
}

impl RulesEngine for LibraryRules {
    fn legal_moves(&self, board: &PackedBoard) -> RulesResult<Vec<PackedMove>> {
        let library = self.library_board(board)?;
        Ok(MoveGen::new_legal(&library)
            .map(|mv| self.packed_move(board, mv))
            .collect())
    }

    fn apply(&self, board: &PackedBoard, mv: &PackedMove) -> RulesResult<PackedBoard> {
        let library = self.library_board(board)?;
        let library_move = self.library_move(mv);
        if !library.legal(library_move) {
            return Err(RulesError::IllegalMove(mv.to_string()));
        }
        self.packed_board(&library.make_move_new(library_move))
    }

    fn in_check(&self, board: &PackedBoard) -> RulesResult<bool> {
        Ok(self.library_board(board)?.checkers().popcnt() > 0)
    }

    fn is_mate(&self, board: &PackedBoard) -> RulesResult<bool> {
        Ok(self.library_board(board)?.status() == BoardStatus::Checkmate)
    }

    fn is_stalemate(&self, board: &PackedBoard) -> RulesResult<bool> {
        if self.library_board(board)?.status() == BoardStatus::Stalemate {
            return Ok(true);
        }
        Ok(self.insufficient_material(board))
    }

    fn to_fen(&self, board: &PackedBoard) -> String {
        board_to_fen(board)
    }

    fn from_fen(&self, text: &str) -> RulesResult<PackedBoard> {
        let board = board_from_fen(text)?;
        // Reject positions the move generator cannot service (missing kings,
        // side not to move already delivering check, ...).
        self.library_board(&board)
            .map_err(|_| RulesError::InvalidFen(text.to_owned()))?;
        Ok(board)
    }
}

fn piece_code(piece: Piece, black: bool) -> u8 {
    piece.to_index() as u8 + if black { 6 } else { 0 }
}

fn code_piece(code: u8) -> Piece {
    match code % 6 {
        0 => Piece::Pawn,
        1 => Piece::Knight,
        2 => Piece::Bishop,
        3 => Piece::Rook,
        4 => Piece::Queen,
        _ => Piece::King,
    }
}

fn square_from_index(square: u8) -> chess::Square {
    chess::Square::make_square(
        chess::Rank::from_index(usize::from(square / 8)),
        chess::File::from_index(usize::from(square % 8)),
    )
}
