//! Self-play statistics.
//!
//! Counts game outcomes and search effort over a run, logs periodic
//! summaries, and writes a JSON snapshot to the data directory so external
//! tooling can follow progress.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use engine_core::Player;
use mcts::SearchStats;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::self_play::GameSummary;

/// File name of the snapshot written by [`SelfPlayStats::write_snapshot`].
pub const STATS_FILE: &str = "selfplay_stats.json";

/// Running totals over completed games.
#[derive(Debug, Clone)]
pub struct SelfPlayStats {
    env_id: String,
    games: u32,
    /// Equal to the number of training tuples produced
    moves: u64,
    first_player_wins: u32,
    second_player_wins: u32,
    draws: u32,
    search: SearchStats,
    started: Instant,
}

/// Serializable view of [`SelfPlayStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub env_id: String,
    pub games: u32,
    pub examples: u64,
    pub first_player_wins: u32,
    pub second_player_wins: u32,
    pub draws: u32,
    pub avg_game_length: f64,
    pub games_per_second: f64,
    pub runtime_seconds: f64,
    pub evaluator_calls: u64,
    pub avg_batch_size: f64,
    pub avg_search_us: f64,
    pub timestamp: u64,
}

impl SelfPlayStats {
    pub fn new(env_id: &str) -> Self {
        Self {
            env_id: env_id.to_string(),
            games: 0,
            moves: 0,
            first_player_wins: 0,
            second_player_wins: 0,
            draws: 0,
            search: SearchStats::default(),
            started: Instant::now(),
        }
    }

    /// Record a finished game.
    pub fn record(&mut self, summary: &GameSummary) {
        self.games += 1;
        self.moves += summary.moves as u64;
        match summary.winner {
            Some(Player::One) => self.first_player_wins += 1,
            Some(Player::Two) => self.second_player_wins += 1,
            None => self.draws += 1,
        }
        self.search.merge(&summary.search);
    }

    pub fn games(&self) -> u32 {
        self.games
    }

    pub fn examples(&self) -> usize {
        self.moves as usize
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let runtime = self.started.elapsed().as_secs_f64();
        let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
        let searches = self.moves as f64;

        StatsSnapshot {
            env_id: self.env_id.clone(),
            games: self.games,
            examples: self.moves,
            first_player_wins: self.first_player_wins,
            second_player_wins: self.second_player_wins,
            draws: self.draws,
            avg_game_length: ratio(self.moves as f64, self.games as f64),
            games_per_second: ratio(self.games as f64, runtime),
            runtime_seconds: runtime,
            evaluator_calls: self.search.evaluator_calls as u64,
            avg_batch_size: ratio(
                self.search.evaluated_leaves as f64,
                self.search.evaluator_calls as f64,
            ),
            avg_search_us: ratio(self.search.total_time_us as f64, searches),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Log the running totals at info level.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            env = %s.env_id,
            games = s.games,
            examples = s.examples,
            first_wins = s.first_player_wins,
            second_wins = s.second_player_wins,
            draws = s.draws,
            avg_len = format!("{:.1}", s.avg_game_length),
            games_per_sec = format!("{:.2}", s.games_per_second),
            avg_batch = format!("{:.1}", s.avg_batch_size),
            "Self-play progress"
        );
    }

    /// Write the current snapshot as JSON into `data_dir`.
    pub fn write_snapshot(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let path = data_dir.join(STATS_FILE);
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Stats snapshot written");
        Ok(())
    }
}
