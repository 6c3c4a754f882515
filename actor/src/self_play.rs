//! Self-play game generation.
//!
//! Two orchestrators share the same per-move logic: search the position from
//! the mover's perspective, sample a move from the temperature-scaled visit
//! distribution, record the tuple, and apply the move. When a game ends every
//! recorded tuple gets the final outcome from its own mover's perspective.
//!
//! - [`play_game`] runs one game with the sequential engine
//! - [`play_games_parallel`] runs K games in lockstep with the batched
//!   engine, dropping each game from the active set as it finishes

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use engine_core::{Game, Player};
use mcts::{
    sample_action, temperature_scale, Evaluator, MctsParallel, MctsSearch, SearchError,
    SearchResult, SearchStats,
};
use rand::Rng;
use tracing::{debug, trace};

use crate::training::{backfill, PendingExample, TrainingExample};

/// Which self-play driver to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orchestrator {
    /// One game at a time, one evaluator call per simulation
    Sequential,
    /// `num_parallel_games` games in lockstep, one evaluator call per round
    #[default]
    Parallel,
}

impl Orchestrator {
    pub fn as_str(self) -> &'static str {
        match self {
            Orchestrator::Sequential => "sequential",
            Orchestrator::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orchestrator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Orchestrator::Sequential),
            "parallel" => Ok(Orchestrator::Parallel),
            other => Err(format!(
                "Unknown orchestrator '{}' (expected sequential or parallel)",
                other
            )),
        }
    }
}

/// Outcome and counters for one finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    /// Moves played, equal to the number of training tuples produced
    pub moves: u32,
    /// `None` for a draw
    pub winner: Option<Player>,
    /// Player who made the final move
    pub terminal_player: Player,
    /// Terminal value from `terminal_player`'s perspective
    pub terminal_value: f32,
    /// Search counters summed over every move of the game
    pub search: SearchStats,
    pub duration_ms: u64,
}

impl GameSummary {
    /// Terminal value from the first player's perspective: +1 first player
    /// wins, -1 second player wins, 0 draw.
    pub fn first_player_value(&self) -> f32 {
        match self.winner {
            Some(Player::One) => 1.0,
            Some(Player::Two) => -1.0,
            None => 0.0,
        }
    }
}

/// One game in flight inside the parallel orchestrator.
struct SelfPlayGame<S> {
    /// Absolute board, not perspective-flipped
    state: S,
    player: Player,
    memory: Vec<PendingExample<S>>,
    search: SearchStats,
    started: Instant,
}

impl<S> SelfPlayGame<S> {
    fn new(state: S) -> Self {
        Self {
            state,
            player: Player::One,
            memory: Vec::new(),
            search: SearchStats::default(),
            started: Instant::now(),
        }
    }
}

/// Result of applying one sampled move.
enum Step {
    Continue,
    Finished { value: f32 },
}

/// Sample a move from a finished search, record the tuple, and advance the
/// game.
fn advance<G: Game, R: Rng + ?Sized>(
    game: &G,
    spg: &mut SelfPlayGame<G::State>,
    neutral: G::State,
    result: SearchResult,
    temperature: f32,
    rng: &mut R,
) -> Result<Step, SearchError> {
    spg.search.merge(&result.stats);

    let probs = temperature_scale(&result.policy, temperature)?;
    let action = sample_action(&probs, rng)?;
    trace!(
        player = ?spg.player,
        action,
        root_value = result.value,
        "Move sampled"
    );

    spg.memory.push(PendingExample {
        state: neutral,
        policy: result.policy,
        player: spg.player,
    });

    spg.state = game.next_state(&spg.state, action, spg.player);
    let (value, terminated) = game.value_and_terminated(&spg.state, Some(action));
    if terminated {
        return Ok(Step::Finished { value });
    }

    spg.player = game.opponent(spg.player);
    Ok(Step::Continue)
}

/// Backfill outcomes for a finished game and build its summary.
fn finish<G: Game>(
    game: &G,
    spg: SelfPlayGame<G::State>,
    value: f32,
) -> (Vec<TrainingExample>, GameSummary) {
    let terminal_player = spg.player;
    let winner = if value > 0.0 {
        Some(terminal_player)
    } else if value < 0.0 {
        Some(game.opponent(terminal_player))
    } else {
        None
    };

    let summary = GameSummary {
        moves: spg.memory.len() as u32,
        winner,
        terminal_player,
        terminal_value: value,
        search: spg.search,
        duration_ms: spg.started.elapsed().as_millis() as u64,
    };
    let examples = backfill(game, spg.memory, terminal_player, value);
    (examples, summary)
}

/// Play one game to the end with the sequential engine.
///
/// Returns one training tuple per move played.
pub fn play_game<G, E, R>(
    game: &G,
    search: &MctsSearch<'_, G, E>,
    rng: &mut R,
) -> Result<(Vec<TrainingExample>, GameSummary), SearchError>
where
    G: Game,
    E: Evaluator,
    R: Rng + ?Sized,
{
    let temperature = search.config().temperature;
    let mut spg = SelfPlayGame::new(game.initial_state());

    loop {
        let neutral = game.change_perspective(&spg.state, spg.player);
        let result = search.search(&neutral, rng)?;

        let step = advance(game, &mut spg, neutral, result, temperature, rng)?;
        if let Step::Finished { value } = step {
            let (examples, summary) = finish(game, spg, value);
            debug!(
                env = game.env_id(),
                moves = summary.moves,
                winner = ?summary.winner,
                "Game finished"
            );
            return Ok((examples, summary));
        }
    }
}

/// Play `num_games` games concurrently with the batched engine.
///
/// All active games advance one move per round. Finished games are removed
/// from the active set, so the evaluator batch shrinks as games end.
/// Summaries are returned in the order games finished.
pub fn play_games_parallel<G, E, R>(
    game: &G,
    engine: &MctsParallel<'_, G, E>,
    num_games: usize,
    rng: &mut R,
) -> Result<(Vec<TrainingExample>, Vec<GameSummary>), SearchError>
where
    G: Game,
    E: Evaluator,
    R: Rng + ?Sized,
{
    let temperature = engine.config().temperature;
    let mut games: Vec<SelfPlayGame<G::State>> = (0..num_games)
        .map(|_| SelfPlayGame::new(game.initial_state()))
        .collect();

    let mut examples = Vec::new();
    let mut summaries = Vec::with_capacity(num_games);
    let mut round = 0u32;

    while !games.is_empty() {
        let states: Vec<G::State> = games
            .iter()
            .map(|spg| game.change_perspective(&spg.state, spg.player))
            .collect();
        let batch = engine.search(&states, rng)?;
        round += 1;
        trace!(
            round,
            active = games.len(),
            evaluator_calls = batch.stats.evaluator_calls,
            "Self-play round searched"
        );

        // Walk backwards so removing a finished game keeps lower indices valid
        let slots = batch.results.into_iter().zip(states);
        for (i, (result, neutral)) in slots.enumerate().rev() {
            let step = advance(game, &mut games[i], neutral, result, temperature, rng)?;
            if let Step::Finished { value } = step {
                let spg = games.remove(i);
                let (game_examples, summary) = finish(game, spg, value);
                examples.extend(game_examples);
                summaries.push(summary);
            }
        }
    }

    debug!(
        env = game.env_id(),
        games = summaries.len(),
        rounds = round,
        examples = examples.len(),
        "Parallel self-play finished"
    );
    Ok((examples, summaries))
}
