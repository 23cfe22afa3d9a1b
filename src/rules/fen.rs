//! FEN reader and writer for the packed encoding.
//!
//! Reads a board descriptor, side-to-move letter, castling token, and
//! en-passant token; any trailing clock fields are accepted and ignored.
//! The writer emits exactly those four fields.

use crate::board::packed_board::{
    PackedBoard, BLACK_BISHOP, BLACK_KING, BLACK_KNIGHT, BLACK_PAWN, BLACK_QUEEN, BLACK_ROOK,
    NO_PIECE, NO_SQUARE, WHITE_BISHOP, WHITE_KING, WHITE_KNIGHT, WHITE_PAWN, WHITE_QUEEN,
    WHITE_ROOK,
};
use crate::board::packed_move::square_name;
use crate::rules::rules_engine::{RulesError, RulesResult};

/// Standard chess starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

pub fn board_to_fen(board: &PackedBoard) -> String {
    let mut fen = String::with_capacity(80);

    for rank in (0..8u8).rev() {
        let mut blanks = 0;
        for file in 0..8u8 {
            let code = board.piece_at(rank * 8 + file);
            if code == NO_PIECE {
                blanks += 1;
                continue;
            }
            if blanks > 0 {
                fen.push(char::from(b'0' + blanks));
                blanks = 0;
            }
            fen.push(piece_char(code));
        }
        if blanks > 0 {
            fen.push(char::from(b'0' + blanks));
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(if board.black_to_move() { 'b' } else { 'w' });

    fen.push(' ');
    let castles: String = [
        (false, false, 'K'),
        (false, true, 'Q'),
        (true, false, 'k'),
        (true, true, 'q'),
    ]
    .iter()
    .filter(|(black, queenside, _)| board.has_castle_right(*black, *queenside))
    .map(|(_, _, letter)| *letter)
    .collect();
    if castles.is_empty() {
        fen.push('-');
    } else {
        fen.push_str(&castles);
    }

    fen.push(' ');
    fen.push_str(&square_name(board.en_passant_square()));

    fen
}

pub fn board_from_fen(text: &str) -> RulesResult<PackedBoard> {
    let mut parts = text.split_whitespace();
    let board_part = parts
        .next()
        .ok_or_else(|| RulesError::InvalidFen(format!("missing board layout in '{text}'")))?;
    let side_part = parts
        .next()
        .ok_or_else(|| RulesError::InvalidFen(format!("missing side-to-move in '{text}'")))?;
    let castling_part = parts
        .next()
        .ok_or_else(|| RulesError::InvalidFen(format!("missing castling rights in '{text}'")))?;
    let en_passant_part = parts
        .next()
        .ok_or_else(|| RulesError::InvalidFen(format!("missing en-passant square in '{text}'")))?;

    let mut board = PackedBoard::empty();
    parse_ranks(board_part, &mut board)?;

    match side_part {
        "w" => board.set_black_to_move(false),
        "b" => board.set_black_to_move(true),
        other => {
            return Err(RulesError::InvalidFen(format!(
                "invalid side-to-move field '{other}'"
            )))
        }
    }

    if castling_part != "-" {
        for ch in castling_part.chars() {
            match ch {
                'K' => board.grant_castle_right(false, false),
                'Q' => board.grant_castle_right(false, true),
                'k' => board.grant_castle_right(true, false),
                'q' => board.grant_castle_right(true, true),
                other => {
                    return Err(RulesError::InvalidFen(format!(
                        "invalid castling character '{other}'"
                    )))
                }
            }
        }
    }

    if en_passant_part == "-" {
        board.set_en_passant_square(NO_SQUARE);
    } else {
        board.set_en_passant_square(algebraic_to_square(en_passant_part)?);
    }

    Ok(board)
}

pub fn algebraic_to_square(name: &str) -> RulesResult<u8> {
    let mut chars = name.chars();
    let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(RulesError::InvalidFen(format!("invalid square name '{name}'")));
    };
    if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return Err(RulesError::InvalidFen(format!("invalid square name '{name}'")));
    }
    Ok((rank as u8 - b'1') * 8 + (file as u8 - b'a'))
}

fn parse_ranks(board_part: &str, board: &mut PackedBoard) -> RulesResult<()> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(RulesError::InvalidFen(
            "board layout must contain 8 ranks".to_owned(),
        ));
    }

    for (fen_rank, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank as u8;
        let mut file = 0u8;
        for ch in rank_text.chars() {
            if let Some(step) = ch.to_digit(10) {
                if !(1..=8).contains(&step) {
                    return Err(RulesError::InvalidFen(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += step as u8;
                continue;
            }
            if file >= 8 {
                return Err(RulesError::InvalidFen(
                    "board rank has too many files".to_owned(),
                ));
            }
            let code = piece_code(ch).ok_or_else(|| {
                RulesError::InvalidFen(format!("invalid piece character '{ch}'"))
            })?;
            board.set_piece(rank * 8 + file, code);
            file += 1;
        }
        if file != 8 {
            return Err(RulesError::InvalidFen(
                "board rank does not sum to 8 files".to_owned(),
            ));
        }
    }

    Ok(())
}

fn piece_char(code: u8) -> char {
    match code {
        WHITE_PAWN => 'P',
        WHITE_KNIGHT => 'N',
        WHITE_BISHOP => 'B',
        WHITE_ROOK => 'R',
        WHITE_QUEEN => 'Q',
        WHITE_KING => 'K',
        BLACK_PAWN => 'p',
        BLACK_KNIGHT => 'n',
        BLACK_BISHOP => 'b',
        BLACK_ROOK => 'r',
        BLACK_QUEEN => 'q',
        _ => 'k',
    }
}

fn piece_code(ch: char) -> Option<u8> {
    match ch {
        'P' => Some(WHITE_PAWN),
        'N' => Some(WHITE_KNIGHT),
        'B' => Some(WHITE_BISHOP),
        'R' => Some(WHITE_ROOK),
        'Q' => Some(WHITE_QUEEN),
        'K' => Some(WHITE_KING),
        'p' => Some(BLACK_PAWN),
        'n' => Some(BLACK_KNIGHT),
        'b' => Some(BLACK_BISHOP),
        'r' => Some(BLACK_ROOK),
        'q' => Some(BLACK_QUEEN),
        'k' => Some(BLACK_KING),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE_FEN: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";

    #[test]
    fn starting_position_round_trips() {
        let board = board_from_fen(STARTING_FEN).expect("starting FEN should parse");
        assert_eq!(board_to_fen(&board), STARTING_FEN);
        assert_eq!(board.piece_at(0), WHITE_ROOK);
        assert_eq!(board.piece_at(4), WHITE_KING);
        assert_eq!(board.piece_at(60), BLACK_KING);
        assert_eq!(board.piece_at(63), BLACK_ROOK);
        assert!(!board.black_to_move());
    }

    #[test]
    fn kiwipete_round_trips() {
        let board = board_from_fen(KIWIPETE_FEN).expect("kiwipete FEN should parse");
        assert_eq!(board_to_fen(&board), KIWIPETE_FEN);
    }

    #[test]
    fn en_passant_square_round_trips() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3";
        let board = board_from_fen(fen).expect("FEN should parse");
        assert_eq!(board.en_passant_square(), 20);
        assert_eq!(board_to_fen(&board), fen);
    }

    #[test]
    fn trailing_clock_fields_are_ignored() {
        let board = board_from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .expect("six-field FEN should parse");
        assert_eq!(board_to_fen(&board), STARTING_FEN);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(board_from_fen("").is_err());
        assert!(board_from_fen("rnbqkbnr/pppppppp w KQkq -").is_err());
        assert!(board_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq -").is_err());
        assert!(board_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Xq -").is_err());
        assert!(board_from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
        assert!(board_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9").is_err());
    }

    #[test]
    fn algebraic_names_map_to_rank_major_indices() {
        assert_eq!(algebraic_to_square("a1").expect("a1"), 0);
        assert_eq!(algebraic_to_square("h1").expect("h1"), 7);
        assert_eq!(algebraic_to_square("a2").expect("a2"), 8);
        assert_eq!(algebraic_to_square("h8").expect("h8"), 63);
        assert!(algebraic_to_square("i1").is_err());
        assert!(algebraic_to_square("a9").is_err());
    }
}
