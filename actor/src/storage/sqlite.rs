//! SQLite backend for replay storage.
//!
//! Observations and policies are stored as little-endian f32 BLOBs.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use engine_core::GameMetadata;
use rusqlite::{params, Connection, OptionalExtension};

use super::ReplayStore;
use crate::training::TrainingExample;

/// SQLite-based replay store.
///
/// Uses a Mutex for thread-safety since rusqlite Connection is not Sync.
pub struct SqliteReplayStore {
    conn: Mutex<Connection>,
}

impl SqliteReplayStore {
    /// Open or create the database, creating parent directories as needed.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS examples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                env_id TEXT NOT NULL,
                observation BLOB NOT NULL,
                policy BLOB NOT NULL,
                outcome REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_examples_env ON examples(env_id);
            CREATE TABLE IF NOT EXISTS game_metadata (
                env_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                board_width INTEGER NOT NULL,
                board_height INTEGER NOT NULL,
                num_actions INTEGER NOT NULL,
                obs_planes INTEGER NOT NULL,
                obs_size INTEGER NOT NULL,
                player_names TEXT NOT NULL,
                description TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))
    }
}

fn f32s_to_blob(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn blob_to_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        anyhow::bail!("Corrupt f32 blob of {} bytes", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

impl ReplayStore for SqliteReplayStore {
    fn store_examples(&self, env_id: &str, examples: &[TrainingExample]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        // Prepare the INSERT statement once and reuse it for the whole batch
        let mut stmt = tx.prepare_cached(
            "INSERT INTO examples (env_id, observation, policy, outcome)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for example in examples {
            stmt.execute(params![
                env_id,
                f32s_to_blob(&example.observation),
                f32s_to_blob(&example.policy),
                example.outcome,
            ])?;
        }

        drop(stmt);
        tx.commit()?;
        Ok(())
    }

    fn count(&self, env_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM examples WHERE env_id = ?1",
            params![env_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn load_examples(&self, env_id: &str, limit: Option<usize>) -> Result<Vec<TrainingExample>> {
        let conn = self.lock()?;
        // Newest first so LIMIT keeps the most recent rows; reversed below
        let limit = limit.map_or(-1, |n| n as i64);
        let mut stmt = conn.prepare_cached(
            "SELECT observation, policy, outcome FROM examples
             WHERE env_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![env_id, limit], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut examples = Vec::new();
        for row in rows {
            let (observation, policy, outcome) = row?;
            examples.push(TrainingExample {
                observation: blob_to_f32s(&observation)?,
                policy: blob_to_f32s(&policy)?,
                outcome: outcome as f32,
            });
        }
        examples.reverse();
        Ok(examples)
    }

    fn store_metadata(&self, metadata: &GameMetadata) -> Result<()> {
        let conn = self.lock()?;
        let player_names = serde_json::to_string(&metadata.player_names)?;
        conn.execute(
            "INSERT OR REPLACE INTO game_metadata
             (env_id, display_name, board_width, board_height, num_actions,
              obs_planes, obs_size, player_names, description, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, CURRENT_TIMESTAMP)",
            params![
                metadata.env_id,
                metadata.display_name,
                metadata.board_width as i64,
                metadata.board_height as i64,
                metadata.num_actions as i64,
                metadata.obs_planes as i64,
                metadata.observation_size() as i64,
                player_names,
                metadata.description,
            ],
        )?;
        Ok(())
    }

    fn metadata(&self, env_id: &str) -> Result<Option<GameMetadata>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT display_name, board_width, board_height, num_actions,
                        obs_planes, player_names, description
                 FROM game_metadata WHERE env_id = ?1",
                params![env_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((display_name, width, height, actions, planes, players, description)) = row
        else {
            return Ok(None);
        };
        let player_names: Vec<String> = serde_json::from_str(&players)
            .with_context(|| format!("Corrupt player names for {}", env_id))?;

        Ok(Some(
            GameMetadata::new(env_id, display_name)
                .with_board(width as usize, height as usize)
                .with_actions(actions as usize)
                .with_planes(planes as usize)
                .with_players(player_names)
                .with_description(description),
        ))
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM examples", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Game;
    use games_connect4::Connect4;
    use tempfile::tempdir;

    fn create_test_example(outcome: f32) -> TrainingExample {
        TrainingExample {
            observation: vec![0.0, 1.0, 0.5, -0.25],
            policy: vec![0.25, 0.75],
            outcome,
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> SqliteReplayStore {
        SqliteReplayStore::new(&dir.path().join("replay.db")).unwrap()
    }

    #[test]
    fn test_create_store_in_nested_dir() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("replay.db");
        assert!(SqliteReplayStore::new(&db_path).is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_store_and_count() {
        let temp_dir = tempdir().unwrap();
        let store = open_store(&temp_dir);

        let batch: Vec<_> = (0..10).map(|i| create_test_example(i as f32)).collect();
        store.store_examples("tictactoe", &batch).unwrap();
        store.store_examples("connect4", &batch[..3]).unwrap();

        assert_eq!(store.count("tictactoe").unwrap(), 10);
        assert_eq!(store.count("connect4").unwrap(), 3);
    }

    #[test]
    fn test_load_preserves_floats_and_order() {
        let temp_dir = tempdir().unwrap();
        let store = open_store(&temp_dir);
        let batch: Vec<_> = (0..5).map(|i| create_test_example(i as f32)).collect();
        store.store_examples("tictactoe", &batch).unwrap();

        assert_eq!(store.load_examples("tictactoe", None).unwrap(), batch);

        let recent = store.load_examples("tictactoe", Some(2)).unwrap();
        assert_eq!(recent, batch[3..].to_vec());
    }

    #[test]
    fn test_clear_keeps_metadata() {
        let temp_dir = tempdir().unwrap();
        let store = open_store(&temp_dir);
        store.store_metadata(&Connect4::new().metadata()).unwrap();
        store
            .store_examples("connect4", &[create_test_example(1.0)])
            .unwrap();

        store.clear().unwrap();

        assert_eq!(store.count("connect4").unwrap(), 0);
        assert!(store.metadata("connect4").unwrap().is_some());
    }

    #[test]
    fn test_metadata_roundtrip_and_upsert() {
        let temp_dir = tempdir().unwrap();
        let store = open_store(&temp_dir);
        let meta = Connect4::new().metadata();

        store.store_metadata(&meta).unwrap();
        store.store_metadata(&meta).unwrap();

        assert_eq!(store.metadata("connect4").unwrap(), Some(meta));
        assert_eq!(store.metadata("chess").unwrap(), None);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let temp_dir = tempdir().unwrap();
        open_store(&temp_dir)
            .store_examples("tictactoe", &[create_test_example(-1.0)])
            .unwrap();

        let store = open_store(&temp_dir);
        assert_eq!(store.count("tictactoe").unwrap(), 1);
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        assert!(blob_to_f32s(&[0, 0, 0]).is_err());
        assert_eq!(blob_to_f32s(&f32s_to_blob(&[1.5, -2.0])).unwrap(), vec![1.5, -2.0]);
    }
}
