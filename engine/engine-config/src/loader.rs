//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from subdirectory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the ALPHAPLAY_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("ALPHAPLAY_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from ALPHAPLAY_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "ALPHAPLAY_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults with a
/// warning.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, f64, etc.); unparseable values are ignored
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, raw),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ALPHAPLAY_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.env_id, "ALPHAPLAY_COMMON_ENV_ID");
    env_override!(config, common.data_dir, "ALPHAPLAY_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "ALPHAPLAY_COMMON_LOG_LEVEL");

    // MCTS
    env_override!(
        config,
        mcts.num_searches,
        "ALPHAPLAY_MCTS_NUM_SEARCHES",
        parse
    );
    env_override!(config, mcts.c_puct, "ALPHAPLAY_MCTS_C_PUCT", parse);
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "ALPHAPLAY_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_epsilon,
        "ALPHAPLAY_MCTS_DIRICHLET_EPSILON",
        parse
    );
    env_override!(
        config,
        mcts.temperature,
        "ALPHAPLAY_MCTS_TEMPERATURE",
        parse
    );

    // Self-play
    env_override!(
        config,
        selfplay.num_games,
        "ALPHAPLAY_SELFPLAY_NUM_GAMES",
        parse
    );
    env_override!(
        config,
        selfplay.num_parallel_games,
        "ALPHAPLAY_SELFPLAY_NUM_PARALLEL_GAMES",
        parse
    );
    env_override!(config, selfplay.seed, "ALPHAPLAY_SELFPLAY_SEED", parse);
    env_override!(config, selfplay.evaluator, "ALPHAPLAY_SELFPLAY_EVALUATOR");
    env_override!(
        config,
        selfplay.orchestrator,
        "ALPHAPLAY_SELFPLAY_ORCHESTRATOR"
    );
    env_override!(
        config,
        selfplay.log_interval,
        "ALPHAPLAY_SELFPLAY_LOG_INTERVAL",
        parse
    );

    // Training
    env_override!(
        config,
        training.num_iterations,
        "ALPHAPLAY_TRAINING_NUM_ITERATIONS",
        parse
    );
    env_override!(
        config,
        training.num_selfplay_iterations,
        "ALPHAPLAY_TRAINING_NUM_SELFPLAY_ITERATIONS",
        parse
    );
    env_override!(
        config,
        training.num_epochs,
        "ALPHAPLAY_TRAINING_NUM_EPOCHS",
        parse
    );
    env_override!(
        config,
        training.batch_size,
        "ALPHAPLAY_TRAINING_BATCH_SIZE",
        parse
    );

    // Storage
    env_override!(config, storage.replay_db, "ALPHAPLAY_STORAGE_REPLAY_DB");

    config
}
