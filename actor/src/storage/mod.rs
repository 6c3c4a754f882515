//! Replay storage for self-play training tuples.
//!
//! The external trainer reads tuples and the game's shape metadata from the
//! store, so a database written by the actor is self-describing.
//!
//! # Usage
//!
//! ```rust,no_run
//! use actor::storage::{ReplayStore, SqliteReplayStore};
//! use engine_core::Game;
//! use games_tictactoe::TicTacToe;
//!
//! let store = SqliteReplayStore::new("./data/replay.db".as_ref())?;
//! store.store_metadata(&TicTacToe::new().metadata())?;
//! println!("{} tuples", store.count("tictactoe")?);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod sqlite;

pub use sqlite::SqliteReplayStore;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use engine_core::GameMetadata;

use crate::training::TrainingExample;

/// Abstract interface for replay storage.
///
/// Implementations are shared by reference, so every method takes `&self`.
pub trait ReplayStore: Send + Sync {
    /// Append training tuples for one environment.
    fn store_examples(&self, env_id: &str, examples: &[TrainingExample]) -> Result<()>;

    /// Number of stored tuples for an environment.
    fn count(&self, env_id: &str) -> Result<usize>;

    /// Stored tuples in insertion order, at most `limit` of the most recent
    /// ones when a limit is given.
    fn load_examples(&self, env_id: &str, limit: Option<usize>) -> Result<Vec<TrainingExample>>;

    /// Store or replace game metadata.
    fn store_metadata(&self, metadata: &GameMetadata) -> Result<()>;

    fn metadata(&self, env_id: &str) -> Result<Option<GameMetadata>>;

    /// Delete all tuples. Metadata is kept.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    examples: HashMap<String, Vec<TrainingExample>>,
    metadata: HashMap<String, GameMetadata>,
}

/// In-process store, for tests and runs that do not need persistence.
#[derive(Debug, Default)]
pub struct MemoryReplayStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))
    }
}

impl ReplayStore for MemoryReplayStore {
    fn store_examples(&self, env_id: &str, examples: &[TrainingExample]) -> Result<()> {
        self.lock()?
            .examples
            .entry(env_id.to_string())
            .or_default()
            .extend_from_slice(examples);
        Ok(())
    }

    fn count(&self, env_id: &str) -> Result<usize> {
        Ok(self.lock()?.examples.get(env_id).map_or(0, Vec::len))
    }

    fn load_examples(&self, env_id: &str, limit: Option<usize>) -> Result<Vec<TrainingExample>> {
        let inner = self.lock()?;
        let Some(all) = inner.examples.get(env_id) else {
            return Ok(Vec::new());
        };
        let start = limit.map_or(0, |n| all.len().saturating_sub(n));
        Ok(all[start..].to_vec())
    }

    fn store_metadata(&self, metadata: &GameMetadata) -> Result<()> {
        self.lock()?
            .metadata
            .insert(metadata.env_id.clone(), metadata.clone());
        Ok(())
    }

    fn metadata(&self, env_id: &str) -> Result<Option<GameMetadata>> {
        Ok(self.lock()?.metadata.get(env_id).cloned())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.examples.clear();
        Ok(())
    }
}
