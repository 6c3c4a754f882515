//! Actor - self-play data generator
//!
//! A batch process that:
//! 1. Resolves the configured game and search settings
//! 2. Plays self-play games with the sequential or batched MCTS engine
//! 3. Saves the backfilled training tuples to `<data_dir>/replay.db` (SQLite)
//! 4. Writes a stats snapshot next to the database

use anyhow::Result;
use clap::Parser;
use engine_core::Game;
use engine_games::with_game;
use indicatif::{ProgressBar, ProgressStyle};
use mcts::{Evaluator, MctsParallel, MctsSearch, UniformEvaluator};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::path::Path;
use tracing::{error, info};

use actor::{
    play_game, play_games_parallel, GameSummary, Orchestrator, ReplayStore, SelfPlayStats,
    SqliteReplayStore, TrainingExample,
};

mod config;

use crate::config::{Config, EvaluatorKind};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Sink for finished games: replay store, stats and progress display.
struct Recorder<'a> {
    store: &'a dyn ReplayStore,
    env_id: &'static str,
    stats: SelfPlayStats,
    progress: Option<ProgressBar>,
    log_interval: u32,
}

impl Recorder<'_> {
    fn save(&self, examples: &[TrainingExample]) -> Result<()> {
        self.store.store_examples(self.env_id, examples)
    }

    fn tally(&mut self, summary: &GameSummary) {
        self.stats.record(summary);

        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
        if self.log_interval > 0 && self.stats.games() % self.log_interval == 0 {
            self.stats.log_summary();
        }
    }
}

fn progress_bar(num_games: u32) -> Result<Option<ProgressBar>> {
    if num_games == 0 || !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        return Ok(None);
    }
    let pb = ProgressBar::new(num_games as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} games ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}

fn run_sequential<G: Game, E: Evaluator>(
    game: &G,
    search: &MctsSearch<'_, G, E>,
    num_games: u32,
    rng: &mut ChaCha20Rng,
    recorder: &mut Recorder<'_>,
) -> Result<()> {
    for _ in 0..num_games {
        let (examples, summary) = play_game(game, search, rng)?;
        recorder.save(&examples)?;
        recorder.tally(&summary);
    }
    Ok(())
}

fn run_parallel<G: Game, E: Evaluator>(
    game: &G,
    engine: &MctsParallel<'_, G, E>,
    num_games: u32,
    rng: &mut ChaCha20Rng,
    recorder: &mut Recorder<'_>,
) -> Result<()> {
    let k = engine.config().num_parallel_games;
    let mut remaining = num_games as usize;

    while remaining > 0 {
        let batch = remaining.min(k);
        let (examples, summaries) = play_games_parallel(game, engine, batch, rng)?;
        recorder.save(&examples)?;
        summaries.iter().for_each(|summary| recorder.tally(summary));
        remaining -= batch;
    }
    Ok(())
}

fn run<G: Game>(game: &G, config: &Config) -> Result<()> {
    let db_path = config.replay_db_path();
    let store = SqliteReplayStore::new(&db_path)?;
    store.store_metadata(&game.metadata())?;
    info!(path = %db_path.display(), "Replay database ready");

    let mut recorder = Recorder {
        store: &store,
        env_id: game.env_id(),
        stats: SelfPlayStats::new(game.env_id()),
        progress: progress_bar(config.num_games)?,
        log_interval: config.log_interval,
    };
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let mcts = config.mcts_config();
    let evaluator = UniformEvaluator::new();

    match (config.evaluator, config.orchestrator) {
        (EvaluatorKind::Rollout, _) => {
            let search = MctsSearch::with_rollouts(game, mcts)?;
            run_sequential(game, &search, config.num_games, &mut rng, &mut recorder)?;
        }
        (EvaluatorKind::Uniform, Orchestrator::Sequential) => {
            let search = MctsSearch::new(game, &evaluator, mcts)?;
            run_sequential(game, &search, config.num_games, &mut rng, &mut recorder)?;
        }
        (EvaluatorKind::Uniform, Orchestrator::Parallel) => {
            let engine = MctsParallel::new(game, &evaluator, mcts)?;
            run_parallel(game, &engine, config.num_games, &mut rng, &mut recorder)?;
        }
    }

    if let Some(pb) = &recorder.progress {
        pb.finish_and_clear();
    }
    recorder.stats.log_summary();
    recorder.stats.write_snapshot(Path::new(&config.data_dir))?;
    info!(
        stored = store.count(game.env_id())?,
        "Self-play run complete"
    );
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(
        env_id = %config.env_id,
        num_games = config.num_games,
        num_searches = config.num_searches,
        evaluator = %config.evaluator,
        orchestrator = %config.orchestrator,
        seed = config.seed,
        "Actor starting"
    );

    let game_id = config.game_id()?;
    let result = with_game!(game_id, |game| run(&game, &config));
    if let Err(e) = &result {
        error!("Actor failed: {:#}", e);
    }
    result
}
