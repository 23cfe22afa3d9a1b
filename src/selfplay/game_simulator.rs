//! Self-play game loop.
//!
//! Drives two policies through a full game, snapshotting the position once
//! per ply before the move for that ply is chosen. Terminal conditions are
//! checked in a fixed priority order: mate, stalemate (including the rules
//! engine's detectable insufficient-material draws), threefold repetition
//! of an identical snapshot, then the cooperative turn limit. The fifty-move
//! rule is not modelled.

use std::collections::HashMap;

use crate::board::packed_board::PackedBoard;
use crate::rules::fen::STARTING_FEN;
use crate::rules::rules_engine::{RulesEngine, RulesResult};
use crate::selfplay::move_policy::MovePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWin,
    BlackWin,
    Draw,
    /// The turn limit was reached before any other terminal condition.
    Unfinished,
}

impl GameOutcome {
    /// Dataset label: 0 = white won, 1 = black won, 0.5 = draw,
    /// -1 = unfinished.
    pub fn label(self) -> f32 {
        match self {
            GameOutcome::WhiteWin => 0.0,
            GameOutcome::BlackWin => 1.0,
            GameOutcome::Draw => 0.5,
            GameOutcome::Unfinished => -1.0,
        }
    }

    /// Inverse of [`GameOutcome::label`]; `None` for unrecognized labels.
    pub fn from_label(label: f32) -> Option<Self> {
        if label == 0.0 {
            Some(GameOutcome::WhiteWin)
        } else if label == 1.0 {
            Some(GameOutcome::BlackWin)
        } else if label == 0.5 {
            Some(GameOutcome::Draw)
        } else if label == -1.0 {
            Some(GameOutcome::Unfinished)
        } else {
            None
        }
    }
}

/// Everything a finished simulation leaves behind: one FEN snapshot per ply
/// (the terminal position included) and the outcome.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub snapshots: Vec<String>,
    pub outcome: GameOutcome,
}

/// Plays one game from the standard starting position.
pub fn play_game<R>(
    rules: &R,
    white: &mut dyn MovePolicy,
    black: &mut dyn MovePolicy,
    max_turns: usize,
) -> RulesResult<GameRecord>
where
    R: RulesEngine + ?Sized,
{
    let start = rules.from_fen(STARTING_FEN)?;
    play_game_from(rules, start, white, black, max_turns)
}

/// Plays one game from a caller-provided position.
pub fn play_game_from<R>(
    rules: &R,
    start: PackedBoard,
    white: &mut dyn MovePolicy,
    black: &mut dyn MovePolicy,
    max_turns: usize,
) -> RulesResult<GameRecord>
where
    R: RulesEngine + ?Sized,
{
    let mut board = start;
    let mut snapshots = Vec::new();
    let mut occurrences: HashMap<String, u32> = HashMap::new();
    let mut ply = 0;
    let mut black_to_play = start.black_to_move();

    let outcome = loop {
        let snapshot = rules.to_fen(&board);
        let seen = {
            let count = occurrences.entry(snapshot.clone()).or_insert(0);
            *count += 1;
            *count
        };
        snapshots.push(snapshot);

        if rules.is_mate(&board)? {
            break if black_to_play {
                GameOutcome::WhiteWin
            } else {
                GameOutcome::BlackWin
            };
        }
        if rules.is_stalemate(&board)? {
            break GameOutcome::Draw;
        }
        if seen == 3 {
            break GameOutcome::Draw;
        }
        if ply >= max_turns {
            break GameOutcome::Unfinished;
        }

        let mv = if black_to_play {
            black.select_move(&board)?
        } else {
            white.select_move(&board)?
        };
        board = rules.apply(&board, &mv)?;
        black_to_play = !black_to_play;
        ply += 1;
    };

    Ok(GameRecord { snapshots, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::packed_board::{PackedBoard, WHITE_KING};
    use crate::board::packed_move::PackedMove;
    use crate::rules::library_rules::LibraryRules;
    use crate::rules::rules_engine::{RulesError, RulesResult};
    use crate::selfplay::move_policy::UniformRandomPolicy;

    /// Rules stub that walks a fixed cycle of snapshot names. The board's
    /// en-passant field is abused as a program counter so the stub stays a
    /// pure function of the position it is handed.
    struct CyclingRules {
        snapshots: Vec<&'static str>,
        mate_at: Option<usize>,
        stalemate_at: Option<usize>,
    }

    impl CyclingRules {
        fn cursor(board: &PackedBoard) -> usize {
            usize::from(board.en_passant_square())
        }
    }

    impl RulesEngine for CyclingRules {
        fn legal_moves(&self, board: &PackedBoard) -> RulesResult<Vec<PackedMove>> {
            let cursor = Self::cursor(board);
            if self.mate_at == Some(cursor) || self.stalemate_at == Some(cursor) {
                return Ok(Vec::new());
            }
            Ok(vec![PackedMove::quiet(0, 1, WHITE_KING)])
        }

        fn apply(&self, board: &PackedBoard, _mv: &PackedMove) -> RulesResult<PackedBoard> {
            let mut next = *board;
            let cursor = (Self::cursor(board) + 1) % self.snapshots.len();
            next.set_en_passant_square(cursor as u8);
            next.set_black_to_move(!board.black_to_move());
            Ok(next)
        }

        fn in_check(&self, board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.mate_at == Some(Self::cursor(board)))
        }

        fn is_mate(&self, board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.mate_at == Some(Self::cursor(board)))
        }

        fn is_stalemate(&self, board: &PackedBoard) -> RulesResult<bool> {
            Ok(self.stalemate_at == Some(Self::cursor(board)))
        }

        fn to_fen(&self, board: &PackedBoard) -> String {
            self.snapshots[Self::cursor(board)].to_owned()
        }

        fn from_fen(&self, text: &str) -> RulesResult<PackedBoard> {
            Err(RulesError::InvalidFen(text.to_owned()))
        }
    }

    struct ScriptedPolicy;

    impl MovePolicy for ScriptedPolicy {
        fn select_move(&mut self, _board: &PackedBoard) -> RulesResult<PackedMove> {
            Ok(PackedMove::quiet(0, 1, WHITE_KING))
        }
    }

    fn run_cycle(rules: &CyclingRules, max_turns: usize) -> GameRecord {
        let mut start = PackedBoard::empty();
        start.set_en_passant_square(0); // park the cursor on the first snapshot
        let mut white = ScriptedPolicy;
        let mut black = ScriptedPolicy;
        play_game_from(rules, start, &mut white, &mut black, max_turns)
            .expect("simulation should run")
    }

    #[test]
    fn repetition_draw_fires_exactly_at_the_third_occurrence() {
        // Two alternating snapshots: A B A B A -> A has now occurred three
        // times, so the game must end there and not later.
        let rules = CyclingRules {
            snapshots: vec!["snapshot-a", "snapshot-b"],
            mate_at: None,
            stalemate_at: None,
        };
        let record = run_cycle(&rules, 100);
        assert_eq!(record.outcome, GameOutcome::Draw);
        assert_eq!(record.snapshots.len(), 5);
        assert_eq!(record.snapshots.last().map(String::as_str), Some("snapshot-a"));
    }

    #[test]
    fn mate_awards_the_win_to_the_other_player() {
        // Cursor 1 is mate; it is reached after one ply, with black to play.
        let rules = CyclingRules {
            snapshots: vec!["opening", "mated"],
            mate_at: Some(1),
            stalemate_at: None,
        };
        let record = run_cycle(&rules, 100);
        assert_eq!(record.outcome, GameOutcome::WhiteWin);
        assert_eq!(record.snapshots.len(), 2);
    }

    #[test]
    fn stalemate_is_a_draw_for_either_player() {
        let rules = CyclingRules {
            snapshots: vec!["opening", "stuck"],
            mate_at: None,
            stalemate_at: Some(1),
        };
        let record = run_cycle(&rules, 100);
        assert_eq!(record.outcome, GameOutcome::Draw);
        assert_eq!(record.snapshots.len(), 2);
    }

    #[test]
    fn zero_turn_limit_ends_immediately_with_one_snapshot() {
        let rules = CyclingRules {
            snapshots: vec!["opening", "other"],
            mate_at: None,
            stalemate_at: None,
        };
        let record = run_cycle(&rules, 0);
        assert_eq!(record.outcome, GameOutcome::Unfinished);
        assert_eq!(record.snapshots.len(), 1);
    }

    #[test]
    fn random_self_play_respects_the_turn_limit() {
        let rules = LibraryRules;
        let mut white = UniformRandomPolicy::new(21);
        let mut black = UniformRandomPolicy::new(22);
        let record =
            play_game(&rules, &mut white, &mut black, 6).expect("simulation should run");
        assert!(!record.snapshots.is_empty());
        assert!(record.snapshots.len() <= 7);
        if record.outcome == GameOutcome::Unfinished {
            assert_eq!(record.snapshots.len(), 7);
        }
    }

    #[test]
    fn outcome_labels_round_trip_and_reject_garbage() {
        for outcome in [
            GameOutcome::WhiteWin,
            GameOutcome::BlackWin,
            GameOutcome::Draw,
            GameOutcome::Unfinished,
        ] {
            assert_eq!(GameOutcome::from_label(outcome.label()), Some(outcome));
        }
        assert_eq!(GameOutcome::from_label(0.25), None);
        assert_eq!(GameOutcome::from_label(2.0), None);
    }
}
