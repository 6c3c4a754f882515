//! Batched MCTS over many games at once.
//!
//! Each round every tree descends to one leaf. Finished games backpropagate
//! immediately; the rest are collected and sent to the evaluator in a single
//! call, and the results are dispatched back to their trees. Per-tree work
//! (selection, expansion, backpropagation) runs on the rayon pool.

use std::time::Instant;

use engine_core::Game;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::Evaluator;
use crate::node::NodeId;
use crate::search::{
    evaluate_states, expand_root, leaf_priors, terminal_value, SearchError, SearchResult,
    SearchStats,
};
use crate::tree::MctsTree;

/// Output of one batched search.
#[derive(Debug, Clone)]
pub struct BatchSearchResult {
    /// One result per input state, in input order
    pub results: Vec<SearchResult>,

    /// Aggregate counters; `evaluator_calls` counts actual batched calls
    pub stats: SearchStats,
}

/// Search state for one game in the batch.
struct Slot<S> {
    tree: MctsTree<S>,
    /// Leaf waiting for this round's evaluator output
    pending: Option<NodeId>,
    stats: SearchStats,
}

/// Batched MCTS engine.
pub struct MctsParallel<'a, G: Game, E: Evaluator> {
    game: &'a G,
    evaluator: &'a E,
    config: MctsConfig,
}

impl<'a, G: Game, E: Evaluator> MctsParallel<'a, G, E> {
    pub fn new(game: &'a G, evaluator: &'a E, config: MctsConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            game,
            evaluator,
            config,
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Search every canonical state in `states` for the configured number of
    /// rounds, sharing evaluator calls across games.
    pub fn search<R: Rng + ?Sized>(
        &self,
        states: &[G::State],
        rng: &mut R,
    ) -> Result<BatchSearchResult, SearchError> {
        let (trees, per_game, stats) = self.search_trees(states, rng)?;
        let num_actions = self.game.action_size();

        let results = trees
            .iter()
            .zip(per_game)
            .map(|(tree, game_stats)| SearchResult::from_tree(tree, num_actions, game_stats))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchSearchResult { results, stats })
    }

    /// Like [`search`](Self::search) but hands back the trees and per-game
    /// counters.
    #[allow(clippy::type_complexity)]
    pub fn search_trees<R: Rng + ?Sized>(
        &self,
        states: &[G::State],
        rng: &mut R,
    ) -> Result<(Vec<MctsTree<G::State>>, Vec<SearchStats>, SearchStats), SearchError> {
        let start = Instant::now();
        let mut stats = SearchStats::default();
        if states.is_empty() {
            return Ok((Vec::new(), Vec::new(), stats));
        }

        let mut slots = self.expand_roots(states, rng, &mut stats)?;

        for round in 0..self.config.num_searches {
            let pending = self.select_leaves(&mut slots);
            if pending == 0 {
                trace!(round, "all leaves terminal, skipping evaluator");
                continue;
            }
            self.evaluate_pending(&mut slots, pending, &mut stats)?;
        }

        for slot in &mut slots {
            slot.stats.simulations = self.config.num_searches;
            stats.terminal_hits += slot.stats.terminal_hits;
        }
        stats.simulations = self.config.num_searches * slots.len() as u32;
        stats.total_time_us = start.elapsed().as_micros() as u64;

        debug!(
            env = self.game.env_id(),
            games = slots.len(),
            rounds = self.config.num_searches,
            evaluator_calls = stats.evaluator_calls,
            evaluated_leaves = stats.evaluated_leaves,
            elapsed_us = stats.total_time_us,
            "Batched MCTS search complete"
        );

        let (trees, per_game) = slots.into_iter().map(|s| (s.tree, s.stats)).unzip();
        Ok((trees, per_game, stats))
    }

    /// One evaluator call for every root, then noise and expansion per game
    /// in input order.
    fn expand_roots<R: Rng + ?Sized>(
        &self,
        states: &[G::State],
        rng: &mut R,
        stats: &mut SearchStats,
    ) -> Result<Vec<Slot<G::State>>, SearchError> {
        let num_actions = self.game.action_size();
        let roots: Vec<&G::State> = states.iter().collect();
        let batch = evaluate_states(self.game, self.evaluator, &roots, stats)?;

        states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let tree = expand_root(
                    self.game,
                    &self.config,
                    state,
                    batch.logits(i, num_actions),
                    rng,
                )?;
                Ok(Slot {
                    tree,
                    pending: None,
                    stats: SearchStats {
                        evaluator_calls: 1,
                        evaluated_leaves: 1,
                        ..SearchStats::default()
                    },
                })
            })
            .collect()
    }

    /// Descend every tree; backpropagate finished games and mark the rest
    /// pending. Returns how many leaves await evaluation.
    fn select_leaves(&self, slots: &mut [Slot<G::State>]) -> usize {
        let game = self.game;
        let c_puct = self.config.c_puct;

        slots
            .par_iter_mut()
            .map(|slot| {
                let leaf_id = slot.tree.select_leaf(c_puct);
                let leaf = slot.tree.get(leaf_id);
                match terminal_value(game, &leaf.state, leaf.action) {
                    Some(value) => {
                        slot.stats.terminal_hits += 1;
                        slot.tree
                            .backpropagate_with(leaf_id, value, |v| game.opponent_value(v));
                        0
                    }
                    None => {
                        slot.pending = Some(leaf_id);
                        1
                    }
                }
            })
            .sum()
    }

    /// Evaluate all pending leaves in one call and dispatch the results.
    fn evaluate_pending(
        &self,
        slots: &mut [Slot<G::State>],
        pending: usize,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError> {
        let game = self.game;
        let num_actions = game.action_size();

        let batch = {
            let leaves: Vec<&G::State> = slots
                .iter()
                .filter_map(|slot| slot.pending.map(|id| &slot.tree.get(id).state))
                .collect();
            debug_assert_eq!(leaves.len(), pending);
            evaluate_states(game, self.evaluator, &leaves, stats)?
        };

        // Batch row for each slot, in slot order
        let mut next_row = 0;
        let rows: Vec<Option<usize>> = slots
            .iter()
            .map(|slot| {
                slot.pending.map(|_| {
                    let row = next_row;
                    next_row += 1;
                    row
                })
            })
            .collect();

        slots
            .par_iter_mut()
            .zip(rows.into_par_iter())
            .try_for_each(|(slot, row)| {
                let (Some(leaf_id), Some(row)) = (slot.pending.take(), row) else {
                    return Ok(());
                };
                let priors = leaf_priors(
                    game,
                    &slot.tree.get(leaf_id).state,
                    batch.logits(row, num_actions),
                )?;
                slot.tree.expand(game, leaf_id, &priors);
                slot.tree
                    .backpropagate_with(leaf_id, batch.value(row), |v| game.opponent_value(v));
                slot.stats.evaluator_calls += 1;
                slot.stats.evaluated_leaves += 1;
                Ok(())
            })
    }
}
