//! Packed move record.
//!
//! A move carries everything needed to replay it on a board without
//! re-deriving legality: origin, destination, the square and code of any
//! captured piece (distinct from the destination for en-passant), and the
//! piece codes before and after the move (they differ only on promotion).

use std::fmt;

use crate::board::packed_board::{NO_PIECE, NO_SQUARE, WHITE_KING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedMove {
    pub from_square: u8,
    pub to_square: u8,
    /// Square of the captured piece, [`NO_SQUARE`] for quiet moves.
    pub captured_square: u8,
    pub moving_piece: u8,
    /// Piece occupying `to_square` afterwards; differs from `moving_piece`
    /// only for promotions.
    pub resulting_piece: u8,
    pub captured_piece: u8,
}

impl PackedMove {
    pub fn new(
        from_square: u8,
        to_square: u8,
        captured_square: u8,
        moving_piece: u8,
        resulting_piece: u8,
        captured_piece: u8,
    ) -> Self {
        Self {
            from_square,
            to_square,
            captured_square,
            moving_piece,
            resulting_piece,
            captured_piece,
        }
    }

    /// A non-capturing, non-promoting move.
    pub fn quiet(from_square: u8, to_square: u8, piece: u8) -> Self {
        Self::new(from_square, to_square, NO_SQUARE, piece, piece, NO_PIECE)
    }

    pub fn is_capture(&self) -> bool {
        self.captured_piece != NO_PIECE
    }

    pub fn is_en_passant(&self) -> bool {
        self.is_capture() && self.captured_square != self.to_square
    }

    pub fn is_promotion(&self) -> bool {
        self.resulting_piece != self.moving_piece
    }

    /// Castling shows up as the king travelling two files.
    pub fn is_castle(&self) -> bool {
        (self.moving_piece % 6) == WHITE_KING
            && self.from_square.abs_diff(self.to_square) == 2
    }
}

/// Algebraic name ("a1".."h8") for a square index, or "-" for the sentinel.
pub fn square_name(square: u8) -> String {
    if square >= NO_SQUARE {
        return "-".to_owned();
    }
    let file = (b'a' + square % 8) as char;
    let rank = (b'1' + square / 8) as char;
    format!("{file}{rank}")
}

impl fmt::Display for PackedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.from_square), square_name(self.to_square))?;
        if self.is_promotion() {
            let letter = match self.resulting_piece % 6 {
                1 => 'n',
                2 => 'b',
                3 => 'r',
                _ => 'q',
            };
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}
