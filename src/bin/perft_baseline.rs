//! Perft reference validation and throughput baseline.
//!
//! Run with:
//! `cargo run --release --bin perft_baseline`
//! `cargo run --release --bin perft_baseline -- --depth 5`
//!
//! Verifies the rules boundary against published node counts and reports
//! nodes per second at each depth.

use std::time::Instant;

use damson_chess::rules::library_rules::LibraryRules;
use damson_chess::rules::rules_engine::RulesEngine;
use damson_chess::search::perft::perft;

struct PerftCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[PerftCase] = &[
    PerftCase {
        name: "startpos",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
        expected_nodes: &[20, 400, 8_902, 197_281, 4_865_609],
    },
    PerftCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        expected_nodes: &[48, 2_039, 97_862, 4_085_603],
    },
];

fn parse_arg_u8(flag: &str, default: u8) -> u8 {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            if let Ok(value) = args[i + 1].parse::<u8>() {
                return value.max(1);
            }
        }
    }
    default
}

fn main() -> Result<(), String> {
    let max_depth = parse_arg_u8("--depth", 4);
    let rules = LibraryRules;

    for case in CASES {
        let board = rules.from_fen(case.fen).map_err(|err| err.to_string())?;
        for (depth_idx, expected) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_idx + 1) as u8;
            if depth > max_depth {
                break;
            }

            let started = Instant::now();
            let nodes = perft(&rules, &board, depth).map_err(|err| err.to_string())?;
            let elapsed = started.elapsed();

            if nodes != *expected {
                return Err(format!(
                    "{} depth {}: counted {} nodes, reference says {}",
                    case.name, depth, nodes, expected
                ));
            }

            let nps = nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            println!(
                "{}: depth={} nodes={} elapsed_ms={} nps={:.0}",
                case.name,
                depth,
                nodes,
                elapsed.as_millis(),
                nps
            );
        }
    }

    println!("all reference counts verified");
    Ok(())
}
