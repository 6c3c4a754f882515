//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared by the
//! actor binary and any other front end.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ALPHAPLAY_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, compiled in)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ALPHAPLAY_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ALPHAPLAY_COMMON_ENV_ID=connect4
//!     ALPHAPLAY_MCTS_NUM_SEARCHES=200
//!     ALPHAPLAY_SELFPLAY_ORCHESTRATOR=sequential
//!     ALPHAPLAY_TRAINING_BATCH_SIZE=128
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;
