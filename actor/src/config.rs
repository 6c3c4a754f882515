//! Configuration for the actor binary
//!
//! Defaults come from the central config (config.toml, then `ALPHAPLAY_*`
//! environment overrides). CLI arguments take highest priority.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use actor::Orchestrator;
use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use engine_games::GameId;
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_env_id() -> String {
    CENTRAL_CONFIG.common.env_id.clone()
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_num_games() -> u32 {
    CENTRAL_CONFIG.selfplay.num_games
}

fn default_num_searches() -> u32 {
    CENTRAL_CONFIG.mcts.num_searches
}

fn default_c_puct() -> f32 {
    CENTRAL_CONFIG.mcts.c_puct as f32
}

fn default_dirichlet_alpha() -> f32 {
    CENTRAL_CONFIG.mcts.dirichlet_alpha as f32
}

fn default_dirichlet_epsilon() -> f32 {
    CENTRAL_CONFIG.mcts.dirichlet_epsilon as f32
}

fn default_temperature() -> f32 {
    CENTRAL_CONFIG.mcts.temperature as f32
}

fn default_num_parallel_games() -> usize {
    CENTRAL_CONFIG.selfplay.num_parallel_games
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.selfplay.seed
}

fn default_evaluator() -> EvaluatorKind {
    CENTRAL_CONFIG.selfplay.evaluator.parse().unwrap_or_default()
}

fn default_orchestrator() -> Orchestrator {
    CENTRAL_CONFIG
        .selfplay
        .orchestrator
        .parse()
        .unwrap_or_default()
}

fn default_log_interval() -> u32 {
    CENTRAL_CONFIG.selfplay.log_interval
}

fn default_replay_db() -> String {
    CENTRAL_CONFIG.storage.replay_db.clone()
}

/// How leaves are valued during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluatorKind {
    /// Flat priors and a zero value for every position
    #[default]
    Uniform,
    /// Flat priors and the result of one random playout
    Rollout,
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvaluatorKind::Uniform => "uniform",
            EvaluatorKind::Rollout => "rollout",
        })
    }
}

impl FromStr for EvaluatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(EvaluatorKind::Uniform),
            "rollout" => Ok(EvaluatorKind::Rollout),
            other => Err(format!(
                "Unknown evaluator '{}' (expected uniform or rollout)",
                other
            )),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Self-play data generator")]
#[command(
    long_about = "Plays self-play games with Monte Carlo Tree Search and stores the
resulting (state, search policy, outcome) tuples in a SQLite replay database.

Configuration is loaded from config.toml with ALPHAPLAY_* environment variable
overrides. CLI arguments take highest priority."
)]
pub struct Config {
    /// Environment ID to play (tictactoe, connect4)
    #[arg(long, default_value_t = default_env_id())]
    pub env_id: String,

    /// Directory for the replay database and stats snapshot
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Number of games to play
    #[arg(long, default_value_t = default_num_games())]
    pub num_games: u32,

    /// MCTS simulations per move
    #[arg(long, default_value_t = default_num_searches())]
    pub num_searches: u32,

    /// Exploration constant in the PUCT score
    #[arg(long, default_value_t = default_c_puct())]
    pub c_puct: f32,

    /// Dirichlet alpha for root noise
    #[arg(long, default_value_t = default_dirichlet_alpha())]
    pub dirichlet_alpha: f32,

    /// Weight of root noise (0 disables it)
    #[arg(long, default_value_t = default_dirichlet_epsilon())]
    pub dirichlet_epsilon: f32,

    /// Move sampling temperature (0 plays the most visited move)
    #[arg(long, default_value_t = default_temperature())]
    pub temperature: f32,

    /// Games searched together by the parallel orchestrator
    #[arg(long, default_value_t = default_num_parallel_games())]
    pub num_parallel_games: usize,

    /// Seed for the random number generator
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Leaf evaluator (uniform, rollout)
    #[arg(long, default_value_t = default_evaluator())]
    pub evaluator: EvaluatorKind,

    /// Self-play driver (sequential, parallel)
    #[arg(long, default_value_t = default_orchestrator())]
    pub orchestrator: Orchestrator,

    /// Replay database file, relative to data_dir unless absolute
    #[arg(long, default_value_t = default_replay_db())]
    pub replay_db: String,

    /// Log progress every N games (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.game_id()?;

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        if self.replay_db.is_empty() {
            return Err(anyhow!("replay_db cannot be empty"));
        }

        // Rollouts only exist on the sequential engine
        if self.evaluator == EvaluatorKind::Rollout && self.orchestrator == Orchestrator::Parallel
        {
            return Err(anyhow!(
                "the rollout evaluator requires --orchestrator sequential"
            ));
        }

        self.mcts_config().validate()?;
        Ok(())
    }

    pub fn game_id(&self) -> Result<GameId> {
        Ok(self.env_id.parse()?)
    }

    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig::default()
            .with_searches(self.num_searches)
            .with_c_puct(self.c_puct)
            .with_dirichlet(self.dirichlet_alpha, self.dirichlet_epsilon)
            .with_temperature(self.temperature)
            .with_parallel_games(self.num_parallel_games)
    }

    /// Path to the replay database
    pub fn replay_db_path(&self) -> PathBuf {
        let db = PathBuf::from(&self.replay_db);
        if db.is_absolute() {
            db
        } else {
            PathBuf::from(&self.data_dir).join(db)
        }
    }
}
