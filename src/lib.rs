//! Crate root module declarations for the Damson self-play chess project.
//!
//! This file exposes all top-level subsystems (packed board model, rules
//! boundary, search, and self-play collection) so binaries, tests, and
//! external tooling can import stable module paths.

pub mod board {
    pub mod packed_board;
    pub mod packed_move;
}

pub mod rules {
    pub mod fen;
    pub mod library_rules;
    pub mod rules_engine;
}

pub mod search {
    pub mod board_scoring;
    pub mod negamax;
    pub mod perft;
}

pub mod selfplay {
    pub mod game_simulator;
    pub mod move_policy;
    pub mod snapshot_collector;
}
