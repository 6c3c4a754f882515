//! Training tuples produced by self-play.

use engine_core::{Game, Player};

/// One `(encoded state, search distribution, outcome)` tuple.
///
/// `observation` is the encoding of the state from the mover's perspective,
/// `policy` is the root visit distribution over the full action space, and
/// `outcome` is the final game value from that same mover's perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub observation: Vec<f32>,
    pub policy: Vec<f32>,
    pub outcome: f32,
}

/// A move recorded during play, before the game's outcome is known.
#[derive(Debug, Clone)]
pub(crate) struct PendingExample<S> {
    /// Canonical state the mover searched from
    pub state: S,
    pub policy: Vec<f32>,
    pub player: Player,
}

/// Attach the final outcome to every recorded move.
///
/// `value` is the terminal value from the perspective of `terminal_player`,
/// the player who made the last move. Moves by that player get `value`;
/// moves by the other player get the opponent's value.
pub(crate) fn backfill<G: Game>(
    game: &G,
    memory: Vec<PendingExample<G::State>>,
    terminal_player: Player,
    value: f32,
) -> Vec<TrainingExample> {
    memory
        .into_iter()
        .map(|m| {
            let outcome = if m.player == terminal_player {
                value
            } else {
                game.opponent_value(value)
            };
            TrainingExample {
                observation: game.encode(&m.state),
                policy: m.policy,
                outcome,
            }
        })
        .collect()
}
