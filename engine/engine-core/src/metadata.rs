//! Self-describing shape information for a game.
//!
//! Stored next to the training tuples so an external trainer can size its
//! network input and policy head without linking against the game rules.

use serde::{Deserialize, Serialize};

use crate::game::Player;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Env id used for lookup, e.g. "connect4"
    pub env_id: String,
    pub display_name: String,
    pub board_width: usize,
    pub board_height: usize,
    /// Length of the policy vector
    pub num_actions: usize,
    /// Encoded planes, each covering the whole board
    pub obs_planes: usize,
    /// First mover first
    pub player_names: Vec<String>,
    pub description: String,
}

impl GameMetadata {
    /// Metadata with an empty board; fill in the shape with the `with_*`
    /// setters.
    pub fn new(env_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            env_id: env_id.into(),
            display_name: display_name.into(),
            board_width: 0,
            board_height: 0,
            num_actions: 0,
            obs_planes: 0,
            player_names: vec!["First".to_string(), "Second".to_string()],
            description: String::new(),
        }
    }

    pub fn with_board(self, width: usize, height: usize) -> Self {
        Self {
            board_width: width,
            board_height: height,
            ..self
        }
    }

    pub fn with_actions(self, num_actions: usize) -> Self {
        Self {
            num_actions,
            ..self
        }
    }

    pub fn with_planes(self, obs_planes: usize) -> Self {
        Self { obs_planes, ..self }
    }

    pub fn with_players(self, player_names: Vec<String>) -> Self {
        Self {
            player_names,
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    pub fn cells(&self) -> usize {
        self.board_width * self.board_height
    }

    /// Floats in one encoded state.
    pub fn observation_size(&self) -> usize {
        self.obs_planes * self.cells()
    }

    pub fn player_name(&self, player: Player) -> Option<&str> {
        let index = match player {
            Player::One => 0,
            Player::Two => 1,
        };
        self.player_names.get(index).map(String::as_str)
    }
}
