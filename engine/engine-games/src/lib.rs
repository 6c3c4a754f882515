//! Game selection by environment id
//!
//! This crate is the single place that knows every available game. Callers
//! resolve an env id string (from config or CLI) to a [`GameId`] and then
//! dispatch to generic code with [`with_game!`].
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use engine_games::{with_game, GameId};
//!
//! let id: GameId = "connect4".parse().unwrap();
//! let actions = with_game!(id, |game| game.action_size());
//! assert_eq!(actions, 7);
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use games_connect4::Connect4;
pub use games_tictactoe::TicTacToe;

/// Errors from resolving a game id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameIdError {
    #[error("Unknown game '{0}' (expected one of: {list})", list = GameId::ALL_IDS.join(", "))]
    Unknown(String),
}

/// Every game this workspace ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameId {
    TicTacToe,
    Connect4,
}

impl GameId {
    pub const ALL: [GameId; 2] = [GameId::TicTacToe, GameId::Connect4];
    pub const ALL_IDS: [&'static str; 2] = ["tictactoe", "connect4"];

    pub fn as_str(self) -> &'static str {
        match self {
            GameId::TicTacToe => "tictactoe",
            GameId::Connect4 => "connect4",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameId {
    type Err = GameIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tictactoe" | "tic-tac-toe" => Ok(GameId::TicTacToe),
            "connect4" | "connect-four" => Ok(GameId::Connect4),
            other => Err(GameIdError::Unknown(other.to_string())),
        }
    }
}

/// List all known env ids.
pub fn list_games() -> Vec<&'static str> {
    GameId::ALL_IDS.to_vec()
}

/// Run a generic expression against the concrete game behind a [`GameId`].
///
/// The closure-like body is expanded once per game type, so it may call
/// generic functions bounded on `engine_core::Game`.
#[macro_export]
macro_rules! with_game {
    ($id:expr, |$game:ident| $body:expr) => {
        match $id {
            $crate::GameId::TicTacToe => {
                let $game = $crate::TicTacToe::new();
                $body
            }
            $crate::GameId::Connect4 => {
                let $game = $crate::Connect4::new();
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Game;

    #[test]
    fn test_parse_known_games() {
        assert_eq!("tictactoe".parse::<GameId>(), Ok(GameId::TicTacToe));
        assert_eq!("Connect4".parse::<GameId>(), Ok(GameId::Connect4));
        assert_eq!(" connect-four ".parse::<GameId>(), Ok(GameId::Connect4));
    }

    #[test]
    fn test_parse_unknown_game() {
        let err = "chess".parse::<GameId>().unwrap_err();
        assert_eq!(err, GameIdError::Unknown("chess".to_string()));
        assert!(err.to_string().contains("tictactoe"));
    }

    #[test]
    fn test_display_roundtrip() {
        for id in GameId::ALL {
            assert_eq!(id.to_string().parse::<GameId>(), Ok(id));
        }
    }

    #[test]
    fn test_with_game_dispatch_matches_env_id() {
        for id in GameId::ALL {
            let env_id = with_game!(id, |game| game.env_id());
            assert_eq!(env_id, id.as_str());
        }
    }

    #[test]
    fn test_list_games() {
        let games = list_games();
        assert!(games.contains(&"tictactoe"));
        assert!(games.contains(&"connect4"));
    }
}
