//! Core traits and types for two-player, zero-sum self-play.
//!
//! This crate provides the game contract consumed by the search engine:
//! - `Game`: board rules, perspective flips and evaluator encoding
//! - `Player`: the two movers, signed +1 / -1
//! - `GameMetadata`: self-describing shape information for trainers

pub mod game;
pub mod metadata;

pub use game::{legal_count, Game, Player};
pub use metadata::GameMetadata;
