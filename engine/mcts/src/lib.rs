//! Monte Carlo Tree Search (MCTS) for AlphaZero-style self-play.
//!
//! This crate provides a game-agnostic PUCT search that works with any game
//! implementing the `engine-core` [`Game`](engine_core::Game) trait.
//!
//! # Overview
//!
//! Each simulation consists of four phases:
//!
//! 1. **Selection**: Descend the tree by PUCT score to an unexpanded node
//! 2. **Evaluation**: Ask the [`Evaluator`] for policy logits and a value
//!    (or play a random rollout when searching without a model)
//! 3. **Expansion**: Add one child per legal action with positive prior
//! 4. **Backpropagation**: Update visit counts and value sums up to the root,
//!    flipping the value's perspective at every level
//!
//! A finished game is detected before evaluation and backpropagates its exact
//! outcome instead.
//!
//! # Engines
//!
//! - [`MctsSearch`]: one tree at a time, one evaluator call per simulation
//! - [`MctsParallel`]: many trees in lockstep, one batched evaluator call per
//!   round
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_tictactoe::TicTacToe;
//! use mcts::{run_mcts, MctsConfig, UniformEvaluator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let game = TicTacToe::new();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//! let result = run_mcts(
//!     &game,
//!     &UniformEvaluator::new(),
//!     MctsConfig::for_testing(),
//!     &game.initial_state(),
//!     &mut rng,
//! )
//! .unwrap();
//!
//! assert_eq!(result.policy.len(), 9);
//! ```

pub mod config;
pub mod evaluator;
pub mod node;
pub mod parallel;
pub mod policy;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use evaluator::{EvalBatch, Evaluator, EvaluatorError, FnEvaluator, UniformEvaluator};
pub use node::{MctsNode, NodeId};
pub use parallel::{BatchSearchResult, MctsParallel};
pub use policy::{
    apply_root_noise, dirichlet_noise, mask_and_normalize, sample_action, softmax,
    temperature_scale, visit_distribution,
};
pub use search::{rollout, run_mcts, MctsSearch, SearchError, SearchResult, SearchStats};
pub use tree::{MctsTree, TreeStats};
