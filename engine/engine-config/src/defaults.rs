//! Built-in defaults, read from the workspace's config.defaults.toml.
//!
//! The shared TOML file is embedded at compile time so every binary agrees on
//! the same defaults.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// Compiled-in copy of config.defaults.toml
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed on first access
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Shape of config.defaults.toml (every key required)
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: MctsDefaults,
    selfplay: SelfPlayDefaults,
    training: TrainingDefaults,
    storage: StorageDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    env_id: String,
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_searches: u32,
    c_puct: f64,
    dirichlet_alpha: f64,
    dirichlet_epsilon: f64,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    num_games: u32,
    num_parallel_games: usize,
    seed: u64,
    evaluator: String,
    orchestrator: String,
    log_interval: u32,
}

#[derive(Debug, Deserialize)]
struct TrainingDefaults {
    num_iterations: u32,
    num_selfplay_iterations: u32,
    num_epochs: u32,
    batch_size: usize,
}

#[derive(Debug, Deserialize)]
struct StorageDefaults {
    replay_db: String,
}

// ============================================================================
// Accessors
// ============================================================================

// Common
pub fn env_id() -> &'static str {
    &DEFAULTS.common.env_id
}
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// MCTS
pub fn num_searches() -> u32 {
    DEFAULTS.mcts.num_searches
}
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn dirichlet_epsilon() -> f64 {
    DEFAULTS.mcts.dirichlet_epsilon
}
pub fn temperature() -> f64 {
    DEFAULTS.mcts.temperature
}

// Self-play
pub fn num_games() -> u32 {
    DEFAULTS.selfplay.num_games
}
pub fn num_parallel_games() -> usize {
    DEFAULTS.selfplay.num_parallel_games
}
pub fn seed() -> u64 {
    DEFAULTS.selfplay.seed
}
pub fn evaluator() -> &'static str {
    &DEFAULTS.selfplay.evaluator
}
pub fn orchestrator() -> &'static str {
    &DEFAULTS.selfplay.orchestrator
}
pub fn log_interval() -> u32 {
    DEFAULTS.selfplay.log_interval
}

// Training
pub fn num_iterations() -> u32 {
    DEFAULTS.training.num_iterations
}
pub fn num_selfplay_iterations() -> u32 {
    DEFAULTS.training.num_selfplay_iterations
}
pub fn num_epochs() -> u32 {
    DEFAULTS.training.num_epochs
}
pub fn batch_size() -> usize {
    DEFAULTS.training.batch_size
}

// Storage
pub fn replay_db() -> &'static str {
    &DEFAULTS.storage.replay_db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        assert_eq!(env_id(), "tictactoe");
        assert_eq!(data_dir(), "./data");
        assert_eq!(log_level(), "info");
    }

    #[test]
    fn test_mcts_defaults() {
        assert_eq!(num_searches(), 60);
        assert!((c_puct() - 2.0).abs() < f64::EPSILON);
        assert!((dirichlet_epsilon() - 0.25).abs() < f64::EPSILON);
        assert!((temperature() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selfplay_defaults() {
        assert_eq!(num_parallel_games(), 100);
        assert_eq!(evaluator(), "uniform");
        assert_eq!(orchestrator(), "parallel");
    }

    #[test]
    fn test_training_defaults() {
        assert_eq!(num_iterations(), 3);
        assert_eq!(num_epochs(), 4);
        assert_eq!(batch_size(), 64);
    }
}
