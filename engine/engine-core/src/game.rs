//! The game contract.
//!
//! Games are pure functions over immutable boards. Every transition returns a
//! fresh state, so the search engine can expand nodes without sharing mutable
//! boards between tree vertices.

use std::fmt::Debug;

use crate::metadata::GameMetadata;

/// One of the two movers.
///
/// `One` moves first. After `Game::change_perspective` the player to move is
/// always described as `One`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Signed identity: +1 for `One`, -1 for `Two`.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Player::One => 1,
            Player::Two => -1,
        }
    }

    /// Map a board cell sign back to a player. Zero has no owner.
    pub fn from_sign(sign: i8) -> Option<Player> {
        match sign {
            1 => Some(Player::One),
            -1 => Some(Player::Two),
            _ => None,
        }
    }

    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// Main trait for game implementations.
///
/// Actions are flat indices into a fixed-size action space. Values are
/// expressed in {-1, 0, +1}.
///
/// # Example
///
/// ```rust
/// use engine_core::{Game, GameMetadata, Player};
///
/// #[derive(Debug)]
/// struct Nim;
///
/// impl Game for Nim {
///     type State = u8;
///
///     fn env_id(&self) -> &'static str { "nim" }
///     fn action_size(&self) -> usize { 2 }
///     fn observation_size(&self) -> usize { 1 }
///     fn initial_state(&self) -> u8 { 5 }
///     fn valid_moves(&self, s: &u8) -> Vec<bool> { vec![*s >= 1, *s >= 2] }
///     fn next_state(&self, s: &u8, a: usize, _p: Player) -> u8 { s - (a as u8 + 1) }
///     fn value_and_terminated(&self, s: &u8, last: Option<usize>) -> (f32, bool) {
///         if last.is_some() && *s == 0 { (1.0, true) } else { (0.0, false) }
///     }
///     fn change_perspective(&self, s: &u8, _p: Player) -> u8 { *s }
///     fn encode(&self, s: &u8) -> Vec<f32> { vec![*s as f32] }
///     fn metadata(&self) -> GameMetadata { GameMetadata::new("nim", "Nim") }
/// }
///
/// let game = Nim;
/// let s = game.next_state(&game.initial_state(), 1, Player::One);
/// assert_eq!(s, 3);
/// ```
pub trait Game: Send + Sync + Debug + 'static {
    /// Board representation. Cloning must be cheap enough to do per expansion.
    type State: Clone + Send + Sync + Debug + PartialEq;

    /// Environment identifier (e.g. "tictactoe").
    fn env_id(&self) -> &'static str;

    /// Number of discrete actions. Fixed per game.
    fn action_size(&self) -> usize;

    /// Number of floats produced by `encode` for one state.
    fn observation_size(&self) -> usize;

    fn initial_state(&self) -> Self::State;

    /// Legality mask over the action space (length = `action_size`).
    fn valid_moves(&self, state: &Self::State) -> Vec<bool>;

    /// Apply `action` for `player`, returning a new state.
    fn next_state(&self, state: &Self::State, action: usize, player: Player) -> Self::State;

    /// Outcome after `last_action` was played, from the point of view of the
    /// player who played it: `(1.0, true)` for a win, `(0.0, true)` for a
    /// draw, `(0.0, false)` while the game continues.
    fn value_and_terminated(&self, state: &Self::State, last_action: Option<usize>)
        -> (f32, bool);

    fn opponent(&self, player: Player) -> Player {
        player.opponent()
    }

    /// Zero-sum: a value for one mover is the negation for the other.
    fn opponent_value(&self, value: f32) -> f32 {
        -value
    }

    /// Canonicalize `state` so that `player` is described as `Player::One`.
    fn change_perspective(&self, state: &Self::State, player: Player) -> Self::State;

    /// Evaluator input for a single state (length = `observation_size`).
    fn encode(&self, state: &Self::State) -> Vec<f32>;

    /// Evaluator input for a batch, row-major `[batch, observation_size]`.
    fn encode_batch(&self, states: &[&Self::State]) -> Vec<f32> {
        let mut out = Vec::with_capacity(states.len() * self.observation_size());
        for state in states {
            out.extend(self.encode(state));
        }
        out
    }

    /// Get game metadata for trainers and storage.
    fn metadata(&self) -> GameMetadata;
}

/// Number of legal actions in a mask.
#[inline]
pub fn legal_count(mask: &[bool]) -> usize {
    mask.iter().filter(|&&legal| legal).count()
}
