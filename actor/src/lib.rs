//! Self-play data generation and the AlphaZero learning loop.
//!
//! - [`self_play`]: sequential and lockstep-parallel game generation
//! - [`training`]: training tuples and outcome backfill
//! - [`learner`]: the trainer seam and the iterate/play/train/snapshot loop
//! - [`storage`]: replay stores for the generated training tuples
//! - [`stats`]: run-level counters for logging

pub mod learner;
pub mod self_play;
pub mod stats;
pub mod storage;
pub mod training;

pub use learner::{IterationReport, Learner, LearningConfig, LearningLoop};
pub use self_play::{play_game, play_games_parallel, GameSummary, Orchestrator};
pub use stats::{SelfPlayStats, StatsSnapshot};
pub use storage::{MemoryReplayStore, ReplayStore, SqliteReplayStore};
pub use training::TrainingExample;
