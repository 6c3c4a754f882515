//! Sequential MCTS search.
//!
//! One simulation:
//! 1. Selection: descend from the root by PUCT to an unexpanded node
//! 2. Terminal check: a finished game backpropagates its exact outcome
//! 3. Evaluation: priors and value from the evaluator (or a random rollout)
//! 4. Expansion + backpropagation along the parent chain
//!
//! Search always runs on a canonical state: the player to move reads as
//! `Player::One`.

use std::time::Instant;

use engine_core::{legal_count, Game, Player};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::{EvalBatch, Evaluator, EvaluatorError, UniformEvaluator};
use crate::policy::{apply_root_noise, mask_and_normalize, softmax, visit_distribution};
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid MCTS config: {0}")]
    InvalidConfig(String),

    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Evaluator returned {actual} {what}, expected {expected}")]
    EvaluatorShape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Evaluator returned value {value} for row {row}, expected a finite value in [-1, 1]")]
    InvalidValue { row: usize, value: f32 },

    #[error("Legal move mask has length {actual}, expected {expected}")]
    MaskShape { expected: usize, actual: usize },

    #[error("No legal moves available in a non-terminal state")]
    NoLegalMoves,

    #[error("Policy has no probability mass on legal moves")]
    DegeneratePolicy,

    #[error("Distribution has no probability mass")]
    EmptyDistribution,
}

/// Counters for one search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Simulations run, summed over roots
    pub simulations: u32,
    /// Number of evaluator invocations (batched calls count once)
    pub evaluator_calls: u32,
    /// Number of states sent to the evaluator, roots included
    pub evaluated_leaves: u32,
    /// Simulations that ended in a finished game
    pub terminal_hits: u32,
    /// Wall time spent searching
    pub total_time_us: u64,
}

impl SearchStats {
    /// Accumulate counters from another search.
    pub fn merge(&mut self, other: &SearchStats) {
        self.simulations += other.simulations;
        self.evaluator_calls += other.evaluator_calls;
        self.evaluated_leaves += other.evaluated_leaves;
        self.terminal_hits += other.terminal_hits;
        self.total_time_us += other.total_time_us;
    }
}

/// Result of an MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Root visit counts normalized over the full action space
    pub policy: Vec<f32>,

    /// Raw root child visit counts, indexed by action
    pub visit_counts: Vec<u32>,

    /// Mean value at the root, from the mover's perspective
    pub value: f32,

    pub stats: SearchStats,
}

impl SearchResult {
    pub(crate) fn from_tree<S: Clone>(
        tree: &MctsTree<S>,
        num_actions: usize,
        stats: SearchStats,
    ) -> Result<Self, SearchError> {
        let visit_counts = tree.root_visit_counts(num_actions);
        let policy = visit_distribution(&visit_counts)?;
        Ok(Self {
            policy,
            visit_counts,
            value: tree.get(tree.root()).mean_value(),
            stats,
        })
    }
}

/// How leaves get their priors and values.
#[derive(Debug)]
enum EvalMode<'a, E> {
    Network(&'a E),
    /// Uniform priors over legal moves, value from one random playout.
    Rollout,
}

/// Sequential MCTS over a single game.
pub struct MctsSearch<'a, G: Game, E: Evaluator = UniformEvaluator> {
    game: &'a G,
    mode: EvalMode<'a, E>,
    config: MctsConfig,
}

impl<'a, G: Game, E: Evaluator> MctsSearch<'a, G, E> {
    /// Create a search driven by `evaluator`.
    pub fn new(game: &'a G, evaluator: &'a E, config: MctsConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            game,
            mode: EvalMode::Network(evaluator),
            config,
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Run the configured number of simulations from a canonical state and
    /// return the root visit distribution.
    pub fn search<R: Rng + ?Sized>(
        &self,
        state: &G::State,
        rng: &mut R,
    ) -> Result<SearchResult, SearchError> {
        let (tree, stats) = self.search_tree(state, rng)?;
        SearchResult::from_tree(&tree, self.game.action_size(), stats)
    }

    /// Like [`search`](Self::search) but hands back the whole tree.
    pub fn search_tree<R: Rng + ?Sized>(
        &self,
        state: &G::State,
        rng: &mut R,
    ) -> Result<(MctsTree<G::State>, SearchStats), SearchError> {
        let start = Instant::now();
        let num_actions = self.game.action_size();
        let mut stats = SearchStats::default();

        let root_logits = match self.mode {
            EvalMode::Network(evaluator) => {
                let batch = evaluate_states(self.game, evaluator, &[state], &mut stats)?;
                batch.policy_logits
            }
            EvalMode::Rollout => vec![0.0; num_actions],
        };
        let mut tree = expand_root(self.game, &self.config, state, &root_logits, rng)?;

        for _ in 0..self.config.num_searches {
            self.simulate(&mut tree, rng, &mut stats)?;
        }

        stats.simulations = self.config.num_searches;
        stats.total_time_us = start.elapsed().as_micros() as u64;

        debug!(
            env = self.game.env_id(),
            simulations = stats.simulations,
            nodes = tree.len(),
            terminal_hits = stats.terminal_hits,
            elapsed_us = stats.total_time_us,
            "MCTS search complete"
        );

        Ok((tree, stats))
    }

    /// Run a single simulation (select -> evaluate -> expand -> backpropagate).
    fn simulate<R: Rng + ?Sized>(
        &self,
        tree: &mut MctsTree<G::State>,
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError> {
        let leaf_id = tree.select_leaf(self.config.c_puct);
        let leaf = tree.get(leaf_id);

        if let Some(value) = terminal_value(self.game, &leaf.state, leaf.action) {
            stats.terminal_hits += 1;
            tree.backpropagate_with(leaf_id, value, |v| self.game.opponent_value(v));
            return Ok(());
        }

        let state = leaf.state.clone();
        let (priors, value) = match self.mode {
            EvalMode::Network(evaluator) => {
                let batch = evaluate_states(self.game, evaluator, &[&state], stats)?;
                let priors = leaf_priors(
                    self.game,
                    &state,
                    batch.logits(0, self.game.action_size()),
                )?;
                (priors, batch.value(0))
            }
            EvalMode::Rollout => {
                let uniform = vec![0.0; self.game.action_size()];
                let priors = leaf_priors(self.game, &state, &uniform)?;
                (priors, rollout(self.game, &state, rng)?)
            }
        };

        tree.expand(self.game, leaf_id, &priors);
        tree.backpropagate_with(leaf_id, value, |v| self.game.opponent_value(v));

        trace!(leaf = leaf_id.0, value = value, "MCTS simulation complete");
        Ok(())
    }
}

impl<'a, G: Game> MctsSearch<'a, G, UniformEvaluator> {
    /// Create a model-free search that values leaves by random playouts.
    pub fn with_rollouts(game: &'a G, config: MctsConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            game,
            mode: EvalMode::Rollout,
            config,
        })
    }
}

/// Convenience function to run a single MCTS search.
pub fn run_mcts<G: Game, E: Evaluator, R: Rng + ?Sized>(
    game: &G,
    evaluator: &E,
    config: MctsConfig,
    state: &G::State,
    rng: &mut R,
) -> Result<SearchResult, SearchError> {
    MctsSearch::new(game, evaluator, config)?.search(state, rng)
}

/// Outcome of reaching `state` via `action`, translated to the perspective of
/// the player now to move. `None` while the game continues.
pub(crate) fn terminal_value<G: Game>(
    game: &G,
    state: &G::State,
    action: Option<usize>,
) -> Option<f32> {
    let (value, terminated) = game.value_and_terminated(state, action);
    terminated.then(|| game.opponent_value(value))
}

/// Encode `states`, run one evaluator call, and check the output shape and
/// value range.
pub(crate) fn evaluate_states<G: Game, E: Evaluator + ?Sized>(
    game: &G,
    evaluator: &E,
    states: &[&G::State],
    stats: &mut SearchStats,
) -> Result<EvalBatch, SearchError> {
    let num_actions = game.action_size();
    let observations = game.encode_batch(states);
    let batch = evaluator.evaluate(&observations, states.len(), num_actions)?;

    if batch.values.len() != states.len() {
        return Err(SearchError::EvaluatorShape {
            what: "values",
            expected: states.len(),
            actual: batch.values.len(),
        });
    }
    if batch.policy_logits.len() != states.len() * num_actions {
        return Err(SearchError::EvaluatorShape {
            what: "policy logits",
            expected: states.len() * num_actions,
            actual: batch.policy_logits.len(),
        });
    }
    if let Some((row, &value)) = batch
        .values
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && (-1.0..=1.0).contains(*v)))
    {
        return Err(SearchError::InvalidValue { row, value });
    }

    stats.evaluator_calls += 1;
    stats.evaluated_leaves += states.len() as u32;
    Ok(batch)
}

/// Legality mask for `state`, checked against the action space.
pub(crate) fn checked_valid_moves<G: Game>(
    game: &G,
    state: &G::State,
) -> Result<Vec<bool>, SearchError> {
    let valid = game.valid_moves(state);
    if valid.len() != game.action_size() {
        return Err(SearchError::MaskShape {
            expected: game.action_size(),
            actual: valid.len(),
        });
    }
    if legal_count(&valid) == 0 {
        return Err(SearchError::NoLegalMoves);
    }
    Ok(valid)
}

/// Softmax the logits and restrict them to the legal moves of `state`.
pub(crate) fn leaf_priors<G: Game>(
    game: &G,
    state: &G::State,
    logits: &[f32],
) -> Result<Vec<f32>, SearchError> {
    let valid = checked_valid_moves(game, state)?;
    let mut priors = softmax(logits);
    mask_and_normalize(&mut priors, &valid)?;
    Ok(priors)
}

/// Build a tree for `state` and expand its root from `logits`, mixing in
/// Dirichlet noise over the full action space when enabled.
pub(crate) fn expand_root<G: Game, R: Rng + ?Sized>(
    game: &G,
    config: &MctsConfig,
    state: &G::State,
    logits: &[f32],
    rng: &mut R,
) -> Result<MctsTree<G::State>, SearchError> {
    let valid = checked_valid_moves(game, state)?;
    let mut priors = softmax(logits);
    if config.uses_root_noise() {
        apply_root_noise(
            &mut priors,
            config.dirichlet_alpha,
            config.dirichlet_epsilon,
            rng,
        )?;
    }
    mask_and_normalize(&mut priors, &valid)?;

    let mut tree = MctsTree::new(state.clone());
    tree.expand(game, tree.root(), &priors);
    Ok(tree)
}

/// Play uniformly random moves to the end and return the outcome for the
/// player to move at `state`.
pub fn rollout<G: Game, R: Rng + ?Sized>(
    game: &G,
    state: &G::State,
    rng: &mut R,
) -> Result<f32, SearchError> {
    let mut state = state.clone();
    let mut player = Player::One;

    loop {
        let legal: Vec<usize> = game
            .valid_moves(&state)
            .iter()
            .enumerate()
            .filter_map(|(a, &ok)| ok.then_some(a))
            .collect();
        let &action = legal.choose(rng).ok_or(SearchError::NoLegalMoves)?;

        state = game.next_state(&state, action, player);
        let (value, terminated) = game.value_and_terminated(&state, Some(action));
        if terminated {
            return Ok(match player {
                Player::One => value,
                Player::Two => game.opponent_value(value),
            });
        }
        player = game.opponent(player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FnEvaluator;
    use games_tictactoe::{State, TicTacToe};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_mcts_basic_search() {
        let game = TicTacToe::new();
        let evaluator = UniformEvaluator::new();
        let config = MctsConfig::for_testing();
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let result = run_mcts(&game, &evaluator, config, &game.initial_state(), &mut rng).unwrap();

        let sum: f32 = result.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(result.visit_counts.iter().sum::<u32>(), 50);
        assert_eq!(result.stats.simulations, 50);
        // Root plus at most one leaf per simulation
        assert!(result.stats.evaluated_leaves <= 51);
    }

    #[test]
    fn test_mcts_finds_winning_move() {
        // X X .
        // O O .
        // . . .
        let game = TicTacToe::new();
        let state = State::from_board([1, 1, 0, -1, -1, 0, 0, 0, 0]);
        let evaluator = UniformEvaluator::new();
        let config = MctsConfig::for_testing().with_searches(200);
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let result = run_mcts(&game, &evaluator, config, &state, &mut rng).unwrap();
        let best = result
            .policy
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(a, _)| a)
            .unwrap();
        assert_eq!(best, 2);
    }

    #[test]
    fn test_search_never_visits_illegal_moves() {
        let game = TicTacToe::new();
        let state = State::from_board([1, -1, 1, 0, -1, 0, 0, 0, 0]);
        let evaluator = UniformEvaluator::new();
        let mut rng = ChaCha20Rng::seed_from_u64(5);

        let result = run_mcts(
            &game,
            &evaluator,
            MctsConfig::for_training().with_searches(30),
            &state,
            &mut rng,
        )
        .unwrap();

        for action in [0, 1, 2, 4] {
            assert_eq!(result.policy[action], 0.0);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let game = TicTacToe::new();
        let evaluator = UniformEvaluator::new();
        let config = MctsConfig::default().with_searches(0);
        assert!(matches!(
            MctsSearch::new(&game, &evaluator, config),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_evaluator_shape_error() {
        let game = TicTacToe::new();
        let evaluator = FnEvaluator::new(|_: &[f32]| (vec![0.0; 9], 0.0));
        struct Short;
        impl Evaluator for Short {
            fn evaluate(
                &self,
                _observations: &[f32],
                batch_size: usize,
                _num_actions: usize,
            ) -> Result<EvalBatch, EvaluatorError> {
                Ok(EvalBatch {
                    policy_logits: vec![0.0; 3 * batch_size],
                    values: vec![0.0; batch_size],
                })
            }
        }
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        assert!(run_mcts(
            &game,
            &evaluator,
            MctsConfig::for_testing(),
            &game.initial_state(),
            &mut rng
        )
        .is_ok());

        let err = run_mcts(
            &game,
            &Short,
            MctsConfig::for_testing(),
            &game.initial_state(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::EvaluatorShape {
                what: "policy logits",
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let game = TicTacToe::new();
        let evaluator = FnEvaluator::new(|_: &[f32]| (vec![0.0; 9], f32::NAN));
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = run_mcts(
            &game,
            &evaluator,
            MctsConfig::for_testing().with_searches(40),
            &game.initial_state(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let game = TicTacToe::new();
        let state = State::from_board([1, -1, 0, 0, 0, 0, 0, 0, 0]);
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        for bad in [1.5, -2.0, f32::INFINITY] {
            let evaluator = FnEvaluator::new(move |_: &[f32]| (vec![0.0; 9], bad));
            let err = run_mcts(&game, &evaluator, MctsConfig::for_testing(), &state, &mut rng)
                .unwrap_err();
            assert!(err.to_string().contains("[-1, 1]"));
        }

        // Both bounds are legal values
        for edge in [1.0, -1.0] {
            let evaluator = FnEvaluator::new(move |_: &[f32]| (vec![0.0; 9], edge));
            assert!(
                run_mcts(&game, &evaluator, MctsConfig::for_testing(), &state, &mut rng).is_ok()
            );
        }
    }

    #[test]
    fn test_degenerate_policy_at_root() {
        // All mass on an occupied cell
        let game = TicTacToe::new();
        let state = State::from_board([1, 0, 0, 0, 0, 0, 0, 0, 0]);
        let evaluator = FnEvaluator::new(|_: &[f32]| {
            let mut logits = vec![f32::NEG_INFINITY; 9];
            logits[0] = 0.0;
            (logits, 0.0)
        });
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let err = run_mcts(&game, &evaluator, MctsConfig::for_testing(), &state, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SearchError::DegeneratePolicy));
    }

    #[test]
    fn test_rollout_search_finds_winning_move() {
        let game = TicTacToe::new();
        let state = State::from_board([1, 1, 0, -1, -1, 0, 0, 0, 0]);
        let search =
            MctsSearch::with_rollouts(&game, MctsConfig::for_testing().with_searches(300)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        let (tree, stats) = search.search_tree(&state, &mut rng).unwrap();
        assert_eq!(stats.evaluator_calls, 0);
        assert_eq!(tree.best_action().map(|(a, _)| a), Some(2));
    }

    #[test]
    fn test_rollout_value_is_from_mover_perspective() {
        // X X .
        // X O O
        // O . .
        let game = TicTacToe::new();
        let state = State::from_board([1, 1, 0, 1, -1, -1, -1, 0, 0]);
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        for _ in 0..50 {
            let v = rollout(&game, &state, &mut rng).unwrap();
            assert!((-1.0..=1.0).contains(&v));
        }

        let won = State::from_board([1, 1, 0, 1, -1, -1, -1, -1, 1]);
        // Only cell 2 is open and it completes the top row for X
        assert_eq!(rollout(&game, &won, &mut rng).unwrap(), 1.0);
    }
}
