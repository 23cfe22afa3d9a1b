//! Multi-game snapshot collection.
//!
//! Repeats self-play games, samples a handful of snapshots per accepted
//! game, and appends the labelled rows to a shared CSV table. Workers run
//! fully independent simulation loops; the writer mutex around the batch
//! append is the only shared-mutation point, and it is never held across a
//! game.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::thread;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::rules::library_rules::LibraryRules;
use crate::rules::rules_engine::RulesError;
use crate::selfplay::game_simulator::{play_game, GameOutcome};
use crate::selfplay::move_policy::MovePolicy;

pub type CollectResult<T> = Result<T, CollectError>;

#[derive(Debug)]
pub enum CollectError {
    Rules(RulesError),
    Io(std::io::Error),
    Csv(csv::Error),
    /// A row carried a label outside {0, 1, 0.5, -1}. Never coerced.
    InvalidOutcomeLabel(f32),
    NoGamesRequested,
    Worker(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Rules(err) => write!(f, "rules engine failure: {err}"),
            CollectError::Io(err) => write!(f, "dataset file failure: {err}"),
            CollectError::Csv(err) => write!(f, "dataset encoding failure: {err}"),
            CollectError::InvalidOutcomeLabel(label) => {
                write!(f, "invalid outcome label {label}")
            }
            CollectError::NoGamesRequested => write!(f, "must play at least 1 game"),
            CollectError::Worker(msg) => write!(f, "collection worker failed: {msg}"),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<RulesError> for CollectError {
    fn from(err: RulesError) -> Self {
        CollectError::Rules(err)
    }
}

impl From<std::io::Error> for CollectError {
    fn from(err: std::io::Error) -> Self {
        CollectError::Io(err)
    }
}

impl From<csv::Error> for CollectError {
    fn from(err: csv::Error) -> Self {
        CollectError::Csv(err)
    }
}

#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Accepted games to produce across all workers.
    pub num_games: usize,
    pub max_turns: usize,
    pub samples_per_game: usize,
    /// Discard unfinished games and replay instead of counting them.
    pub drop_unfinished: bool,
    pub workers: usize,
    pub base_seed: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            num_games: 100,
            max_turns: 100,
            samples_per_game: 10,
            drop_unfinished: true,
            workers: 1,
            base_seed: 0,
        }
    }
}

/// One labelled dataset row: snapshot text, outcome label, ply number.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub fen: String,
    pub outcome: f32,
    pub ply: usize,
}

/// Per-label game counts for a collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTotals {
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    pub unfinished: usize,
}

impl OutcomeTotals {
    /// Tallies one game by its label; unrecognized labels are fatal.
    pub fn record(&mut self, label: f32) -> CollectResult<()> {
        match GameOutcome::from_label(label) {
            Some(GameOutcome::WhiteWin) => self.white_wins += 1,
            Some(GameOutcome::BlackWin) => self.black_wins += 1,
            Some(GameOutcome::Draw) => self.draws += 1,
            Some(GameOutcome::Unfinished) => self.unfinished += 1,
            None => return Err(CollectError::InvalidOutcomeLabel(label)),
        }
        Ok(())
    }

    pub fn merge(&mut self, rhs: OutcomeTotals) {
        self.white_wins += rhs.white_wins;
        self.black_wins += rhs.black_wins;
        self.draws += rhs.draws;
        self.unfinished += rhs.unfinished;
    }

    pub fn games(&self) -> usize {
        self.white_wins + self.black_wins + self.draws + self.unfinished
    }

    pub fn report(&self) -> String {
        format!(
            "games={} white_wins={} black_wins={} draws={} unfinished={}",
            self.games(),
            self.white_wins,
            self.black_wins,
            self.draws,
            self.unfinished
        )
    }
}

/// Append-only CSV sink for dataset rows.
pub struct SnapshotWriter {
    writer: csv::Writer<std::fs::File>,
}

impl SnapshotWriter {
    /// Opens `path` for appending, creating it if needed.
    pub fn append_to(path: &Path) -> CollectResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file),
        })
    }

    /// Writes a whole batch and flushes it to disk before returning.
    pub fn append_batch(&mut self, rows: &[DatasetRow]) -> CollectResult<()> {
        for row in rows {
            self.writer.write_record([
                row.fen.as_str(),
                row.outcome.to_string().as_str(),
                row.ply.to_string().as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Picks `min(samples_per_game, snapshot_count)` distinct ply indices
/// uniformly without replacement, ascending.
pub fn sample_plies<R: Rng + ?Sized>(
    rng: &mut R,
    snapshot_count: usize,
    samples_per_game: usize,
) -> Vec<usize> {
    let take = samples_per_game.min(snapshot_count);
    let mut plies = rand::seq::index::sample(rng, snapshot_count, take).into_vec();
    plies.sort_unstable();
    plies
}

/// Runs the whole collection: splits `config.num_games` across workers,
/// plays and samples games, appends every worker's batch to `output` under
/// the writer lock, and returns the merged outcome totals.
pub fn collect_snapshots<F1, F2>(
    white_factory: F1,
    black_factory: F2,
    config: &CollectConfig,
    output: &Path,
) -> CollectResult<OutcomeTotals>
where
    F1: Fn(u64) -> Box<dyn MovePolicy> + Sync,
    F2: Fn(u64) -> Box<dyn MovePolicy> + Sync,
{
    if config.num_games == 0 {
        return Err(CollectError::NoGamesRequested);
    }

    let workers = config.workers.max(1);
    let writer = Mutex::new(SnapshotWriter::append_to(output)?);
    let progress = ProgressBar::new(config.num_games as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} games [{eta} remaining]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results: Vec<CollectResult<OutcomeTotals>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let games = config.num_games / workers
                + usize::from(worker < config.num_games % workers);
            if games == 0 {
                continue;
            }
            let white_factory = &white_factory;
            let black_factory = &black_factory;
            let writer = &writer;
            let progress = &progress;
            handles.push(scope.spawn(move || {
                // Independent random streams per worker: policies and the
                // sampler are seeded from the worker identity.
                let worker_seed = config.base_seed.wrapping_add(worker as u64);
                let mut white = white_factory(worker_seed.wrapping_mul(2));
                let mut black = black_factory(worker_seed.wrapping_mul(2).wrapping_add(1));
                let mut sampler =
                    StdRng::seed_from_u64(worker_seed ^ 0x9E37_79B9_7F4A_7C15);

                info!(worker, games, "collection worker started");
                let (rows, totals) = run_worker(
                    white.as_mut(),
                    black.as_mut(),
                    games,
                    config,
                    &mut sampler,
                    progress,
                )?;

                debug!(worker, rows = rows.len(), "appending snapshot batch");
                let mut guard = writer
                    .lock()
                    .map_err(|_| CollectError::Worker("writer lock poisoned".to_owned()))?;
                guard.append_batch(&rows)?;
                drop(guard);

                info!(worker, totals = %totals.report(), "collection worker finished");
                Ok(totals)
            }));
        }

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CollectError::Worker("worker panicked".to_owned())))
            })
            .collect()
    });

    progress.finish_and_clear();

    let mut totals = OutcomeTotals::default();
    for result in results {
        totals.merge(result?);
    }
    Ok(totals)
}

fn run_worker(
    white: &mut dyn MovePolicy,
    black: &mut dyn MovePolicy,
    games: usize,
    config: &CollectConfig,
    sampler: &mut StdRng,
    progress: &ProgressBar,
) -> CollectResult<(Vec<DatasetRow>, OutcomeTotals)> {
    let rules = LibraryRules;
    let mut rows = Vec::new();
    let mut totals = OutcomeTotals::default();
    let mut accepted = 0;

    while accepted < games {
        let record = play_game(&rules, white, black, config.max_turns)?;
        if config.drop_unfinished && record.outcome == GameOutcome::Unfinished {
            continue;
        }

        let label = record.outcome.label();
        for ply in sample_plies(sampler, record.snapshots.len(), config.samples_per_game) {
            rows.push(DatasetRow {
                fen: record.snapshots[ply].clone(),
                outcome: label,
                ply,
            });
        }
        totals.record(label)?;
        accepted += 1;
        progress.inc(1);
    }

    Ok((rows, totals))
}
