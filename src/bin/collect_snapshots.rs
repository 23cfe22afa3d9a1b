//! Standalone self-play snapshot collection runner.
//!
//! Run with:
//! `cargo run --release --bin collect_snapshots`
//! `cargo run --release --bin collect_snapshots -- --games 500 --workers 4`
//!
//! Flags: `--games`, `--workers`, `--max-turns`, `--samples`, `--seed`,
//! `--policy random|softmax|negamax`, `--depth` (negamax only),
//! `--keep-unfinished`, `--out <file>`.

use damson_chess::search::board_scoring::MaterialScorer;
use damson_chess::search::negamax::SearchConfig;
use damson_chess::selfplay::move_policy::{
    MovePolicy, NegamaxPolicy, SoftmaxScorerPolicy, UniformRandomPolicy,
};
use damson_chess::selfplay::snapshot_collector::{collect_snapshots, CollectConfig};
use std::path::PathBuf;

fn parse_arg<T: std::str::FromStr>(flag: &str, default: T) -> T {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            if let Ok(value) = args[i + 1].parse::<T>() {
                return value;
            }
        }
    }
    default
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|arg| arg == flag)
}

fn policy_factory(kind: &str, depth: u8) -> Box<dyn Fn(u64) -> Box<dyn MovePolicy> + Sync> {
    match kind {
        "random" => Box::new(|seed| -> Box<dyn MovePolicy> {
            Box::new(UniformRandomPolicy::new(seed))
        }),
        "negamax" => Box::new(move |_seed| -> Box<dyn MovePolicy> {
            Box::new(NegamaxPolicy::new(
                MaterialScorer,
                SearchConfig::with_depth(depth),
            ))
        }),
        _ => Box::new(|seed| -> Box<dyn MovePolicy> {
            Box::new(SoftmaxScorerPolicy::new(MaterialScorer, seed))
        }),
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt().init();

    let config = CollectConfig {
        num_games: parse_arg("--games", 100),
        max_turns: parse_arg("--max-turns", 100),
        samples_per_game: parse_arg("--samples", 10),
        drop_unfinished: !has_flag("--keep-unfinished"),
        workers: parse_arg("--workers", 1),
        base_seed: parse_arg("--seed", 0),
    };
    let policy = parse_arg("--policy", "softmax".to_owned());
    let depth = parse_arg("--depth", 2u8);
    let output: PathBuf = parse_arg(
        "--out",
        format!(
            "snapshots_{}.csv",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ),
    )
    .into();

    println!(
        "playing {} games with {} workers, {} max turns, {} samples per game, {} unfinished games",
        config.num_games,
        config.workers,
        config.max_turns,
        config.samples_per_game,
        if config.drop_unfinished { "no" } else { "including" }
    );
    println!("writing dataset to {}", output.display());

    let white = policy_factory(&policy, depth);
    let black = policy_factory(&policy, depth);
    let totals =
        collect_snapshots(white, black, &config, &output).map_err(|err| err.to_string())?;

    println!("{}", totals.report());
    println!("wrote dataset to {}", output.display());
    Ok(())
}
