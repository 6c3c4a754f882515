//! Typed view of config.toml.
//!
//! Every key is optional in the file; missing keys take the built-in default.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Per-field serde defaults
// ============================================================================

fn d_env_id() -> String {
    defaults::env_id().into()
}
fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_num_searches() -> u32 {
    defaults::num_searches()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_epsilon() -> f64 {
    defaults::dirichlet_epsilon()
}
fn d_temperature() -> f64 {
    defaults::temperature()
}
fn d_num_games() -> u32 {
    defaults::num_games()
}
fn d_num_parallel_games() -> usize {
    defaults::num_parallel_games()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_evaluator() -> String {
    defaults::evaluator().into()
}
fn d_orchestrator() -> String {
    defaults::orchestrator().into()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}
fn d_num_iterations() -> u32 {
    defaults::num_iterations()
}
fn d_num_selfplay_iterations() -> u32 {
    defaults::num_selfplay_iterations()
}
fn d_num_epochs() -> u32 {
    defaults::num_epochs()
}
fn d_batch_size() -> usize {
    defaults::batch_size()
}
fn d_replay_db() -> String {
    defaults::replay_db().into()
}

// ============================================================================
// Sections
// ============================================================================

/// Whole config file, one field per `[section]`
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub selfplay: SelfPlayConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Settings shared by every binary
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_env_id")]
    pub env_id: String,
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            env_id: defaults::env_id().into(),
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search parameters shared by both search engines
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_searches")]
    pub num_searches: u32,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    /// Noise weight at the root; 0 disables noise
    #[serde(default = "d_dirichlet_epsilon")]
    pub dirichlet_epsilon: f64,
    #[serde(default = "d_temperature")]
    pub temperature: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_searches: defaults::num_searches(),
            c_puct: defaults::c_puct(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_epsilon: defaults::dirichlet_epsilon(),
            temperature: defaults::temperature(),
        }
    }
}

/// Self-play generation settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Games to generate per actor run
    #[serde(default = "d_num_games")]
    pub num_games: u32,
    /// Concurrent games (K) for the parallel orchestrator
    #[serde(default = "d_num_parallel_games")]
    pub num_parallel_games: usize,
    #[serde(default = "d_seed")]
    pub seed: u64,
    /// "uniform" or "rollout"
    #[serde(default = "d_evaluator")]
    pub evaluator: String,
    /// "sequential" or "parallel"
    #[serde(default = "d_orchestrator")]
    pub orchestrator: String,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_games: defaults::num_games(),
            num_parallel_games: defaults::num_parallel_games(),
            seed: defaults::seed(),
            evaluator: defaults::evaluator().into(),
            orchestrator: defaults::orchestrator().into(),
            log_interval: defaults::log_interval(),
        }
    }
}

/// Learning loop settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    #[serde(default = "d_num_iterations")]
    pub num_iterations: u32,
    /// Self-play games per iteration
    #[serde(default = "d_num_selfplay_iterations")]
    pub num_selfplay_iterations: u32,
    #[serde(default = "d_num_epochs")]
    pub num_epochs: u32,
    #[serde(default = "d_batch_size")]
    pub batch_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_iterations: defaults::num_iterations(),
            num_selfplay_iterations: defaults::num_selfplay_iterations(),
            num_epochs: defaults::num_epochs(),
            batch_size: defaults::batch_size(),
        }
    }
}

/// Replay storage settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file name, relative to `common.data_dir` unless absolute
    #[serde(default = "d_replay_db")]
    pub replay_db: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            replay_db: defaults::replay_db().into(),
        }
    }
}
