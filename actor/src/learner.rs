//! The AlphaZero learning loop.
//!
//! Each iteration generates fresh self-play games with the current model,
//! trains on them for a fixed number of epochs, and saves one snapshot.
//! The model itself is an external collaborator behind [`Learner`].

use anyhow::{Context, Result};
use engine_config::CentralConfig;
use engine_core::Game;
use mcts::{Evaluator, MctsConfig, MctsParallel, MctsSearch};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::self_play::{play_game, play_games_parallel, Orchestrator};
use crate::stats::SelfPlayStats;
use crate::storage::ReplayStore;
use crate::training::TrainingExample;

/// A trainable policy/value model.
///
/// The same model evaluates positions during self-play (through
/// [`Evaluator`]) and is updated from the tuples that self-play produces.
pub trait Learner: Evaluator {
    /// Take one optimization step on a mini-batch; returns the batch loss.
    fn train_batch(&mut self, batch: &[TrainingExample]) -> Result<f32>;

    /// Persist model and optimizer state for a completed iteration.
    fn save_snapshot(&mut self, iteration: u32, env_id: &str) -> Result<()>;
}

/// Learning loop settings.
#[derive(Debug, Clone)]
pub struct LearningConfig {
    pub num_iterations: u32,
    /// Self-play games per iteration
    pub num_selfplay_iterations: u32,
    /// Passes over the iteration's memory
    pub num_epochs: u32,
    pub batch_size: usize,
    pub orchestrator: Orchestrator,
    pub mcts: MctsConfig,
}

impl LearningConfig {
    /// Build loop settings from the central config file.
    pub fn from_central(config: &CentralConfig) -> Result<Self> {
        let orchestrator = config
            .selfplay
            .orchestrator
            .parse()
            .map_err(anyhow::Error::msg)?;
        let mcts = MctsConfig {
            num_searches: config.mcts.num_searches,
            c_puct: config.mcts.c_puct as f32,
            dirichlet_alpha: config.mcts.dirichlet_alpha as f32,
            dirichlet_epsilon: config.mcts.dirichlet_epsilon as f32,
            temperature: config.mcts.temperature as f32,
            num_parallel_games: config.selfplay.num_parallel_games,
        };

        let learning = Self {
            num_iterations: config.training.num_iterations,
            num_selfplay_iterations: config.training.num_selfplay_iterations,
            num_epochs: config.training.num_epochs,
            batch_size: config.training.batch_size,
            orchestrator,
            mcts,
        };
        learning.validate()?;
        Ok(learning)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be positive");
        }
        self.mcts.validate().context("Invalid MCTS settings")?;
        Ok(())
    }
}

/// What one iteration produced.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: u32,
    pub examples: usize,
    /// Mean mini-batch loss over all epochs, 0 when nothing was trained
    pub mean_loss: f32,
    pub batches: usize,
    pub stats: SelfPlayStats,
}

/// Alternates self-play with model updates.
pub struct LearningLoop<'a, G: Game, L: Learner> {
    game: &'a G,
    learner: L,
    config: LearningConfig,
    store: Option<&'a dyn ReplayStore>,
}

impl<'a, G: Game, L: Learner> LearningLoop<'a, G, L> {
    pub fn new(game: &'a G, learner: L, config: LearningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            game,
            learner,
            config,
            store: None,
        })
    }

    /// Also persist every iteration's tuples to a replay store.
    pub fn with_store(mut self, store: &'a dyn ReplayStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    /// Run every configured iteration.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<IterationReport>> {
        let env_id = self.game.env_id();
        if let Some(store) = self.store {
            store.store_metadata(&self.game.metadata())?;
        }

        let mut reports = Vec::with_capacity(self.config.num_iterations as usize);
        for iteration in 0..self.config.num_iterations {
            let mut stats = SelfPlayStats::new(env_id);
            let mut memory = self.self_play(&mut stats, rng)?;

            if let Some(store) = self.store {
                store.store_examples(env_id, &memory)?;
            }

            let (mean_loss, batches) = self.train(&mut memory, rng)?;
            self.learner
                .save_snapshot(iteration, env_id)
                .with_context(|| format!("Failed to save snapshot for iteration {}", iteration))?;

            info!(
                env = env_id,
                iteration,
                games = stats.games(),
                examples = memory.len(),
                batches,
                mean_loss,
                "Iteration complete"
            );
            reports.push(IterationReport {
                iteration,
                examples: memory.len(),
                mean_loss,
                batches,
                stats,
            });
        }
        Ok(reports)
    }

    /// Generate `num_selfplay_iterations` games with the current model.
    fn self_play<R: Rng + ?Sized>(
        &self,
        stats: &mut SelfPlayStats,
        rng: &mut R,
    ) -> Result<Vec<TrainingExample>> {
        let total = self.config.num_selfplay_iterations as usize;
        let mut memory = Vec::new();

        match self.config.orchestrator {
            Orchestrator::Sequential => {
                let search = MctsSearch::new(self.game, &self.learner, self.config.mcts.clone())?;
                for _ in 0..total {
                    let (examples, summary) = play_game(self.game, &search, rng)?;
                    stats.record(&summary);
                    memory.extend(examples);
                }
            }
            Orchestrator::Parallel => {
                let engine = MctsParallel::new(self.game, &self.learner, self.config.mcts.clone())?;
                let k = self.config.mcts.num_parallel_games;
                let mut remaining = total;
                while remaining > 0 {
                    let batch = remaining.min(k);
                    let (examples, summaries) = play_games_parallel(self.game, &engine, batch, rng)?;
                    summaries.iter().for_each(|summary| stats.record(summary));
                    memory.extend(examples);
                    remaining -= batch;
                }
            }
        }

        debug!(games = total, examples = memory.len(), "Self-play phase finished");
        Ok(memory)
    }

    /// Shuffled mini-batch passes over `memory`. Returns the mean loss and
    /// the number of batches trained.
    fn train<R: Rng + ?Sized>(
        &mut self,
        memory: &mut [TrainingExample],
        rng: &mut R,
    ) -> Result<(f32, usize)> {
        let mut total_loss = 0.0;
        let mut batches = 0;

        for epoch in 0..self.config.num_epochs {
            memory.shuffle(rng);
            for batch in memory.chunks(self.config.batch_size) {
                total_loss += self.learner.train_batch(batch)?;
                batches += 1;
            }
            debug!(epoch, batches, "Epoch finished");
        }

        let mean_loss = if batches > 0 {
            total_loss / batches as f32
        } else {
            0.0
        };
        Ok((mean_loss, batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReplayStore;
    use games_tictactoe::TicTacToe;
    use mcts::{EvalBatch, EvaluatorError, UniformEvaluator};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Uniform model that records what the loop asks of it.
    #[derive(Default)]
    struct MockLearner {
        batch_sizes: Vec<usize>,
        snapshots: Vec<(u32, String)>,
    }

    impl Evaluator for MockLearner {
        fn evaluate(
            &self,
            observations: &[f32],
            batch_size: usize,
            num_actions: usize,
        ) -> Result<EvalBatch, EvaluatorError> {
            UniformEvaluator.evaluate(observations, batch_size, num_actions)
        }
    }

    impl Learner for MockLearner {
        fn train_batch(&mut self, batch: &[TrainingExample]) -> Result<f32> {
            self.batch_sizes.push(batch.len());
            Ok(0.5)
        }

        fn save_snapshot(&mut self, iteration: u32, env_id: &str) -> Result<()> {
            self.snapshots.push((iteration, env_id.to_string()));
            Ok(())
        }
    }

    fn test_config(orchestrator: Orchestrator) -> LearningConfig {
        LearningConfig {
            num_iterations: 2,
            num_selfplay_iterations: 3,
            num_epochs: 2,
            batch_size: 4,
            orchestrator,
            mcts: MctsConfig::for_testing().with_searches(10).with_parallel_games(2),
        }
    }

    #[test]
    fn test_one_snapshot_per_iteration() {
        let game = TicTacToe::new();
        let mut lp =
            LearningLoop::new(&game, MockLearner::default(), test_config(Orchestrator::Sequential))
                .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let reports = lp.run(&mut rng).unwrap();

        assert_eq!(reports.len(), 2);
        let learner = lp.into_learner();
        assert_eq!(
            learner.snapshots,
            vec![(0, "tictactoe".to_string()), (1, "tictactoe".to_string())]
        );
    }

    #[test]
    fn test_epochs_cover_memory_in_minibatches() {
        let game = TicTacToe::new();
        let mut lp =
            LearningLoop::new(&game, MockLearner::default(), test_config(Orchestrator::Sequential))
                .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(2);

        let reports = lp.run(&mut rng).unwrap();
        let report = &reports[0];

        // Two epochs, each covering every example exactly once
        let per_epoch = report.examples.div_ceil(4);
        assert_eq!(report.batches, 2 * per_epoch);
        assert!((report.mean_loss - 0.5).abs() < 1e-6);

        let sizes = &lp.learner().batch_sizes[..report.batches];
        assert_eq!(sizes.iter().sum::<usize>(), 2 * report.examples);
        assert!(sizes.iter().all(|&s| (1..=4).contains(&s)));
    }

    #[test]
    fn test_parallel_orchestrator_plays_requested_games() {
        let game = TicTacToe::new();
        let mut lp =
            LearningLoop::new(&game, MockLearner::default(), test_config(Orchestrator::Parallel))
                .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let reports = lp.run(&mut rng).unwrap();
        for report in &reports {
            // Batches of 2 then 1
            assert_eq!(report.stats.games(), 3);
            assert_eq!(report.stats.examples(), report.examples);
        }
    }

    #[test]
    fn test_store_receives_every_example() {
        let game = TicTacToe::new();
        let store = MemoryReplayStore::new();
        let mut lp =
            LearningLoop::new(&game, MockLearner::default(), test_config(Orchestrator::Sequential))
                .unwrap()
                .with_store(&store);
        let mut rng = ChaCha20Rng::seed_from_u64(4);

        let reports = lp.run(&mut rng).unwrap();
        let total: usize = reports.iter().map(|r| r.examples).sum();

        assert_eq!(store.count("tictactoe").unwrap(), total);
        assert!(store.metadata("tictactoe").unwrap().is_some());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let game = TicTacToe::new();
        let mut config = test_config(Orchestrator::Sequential);
        config.batch_size = 0;
        assert!(LearningLoop::new(&game, MockLearner::default(), config).is_err());
    }

    #[test]
    fn test_from_central_defaults() {
        let config = LearningConfig::from_central(&CentralConfig::default()).unwrap();
        assert_eq!(config.num_iterations, 3);
        assert_eq!(config.num_selfplay_iterations, 500);
        assert_eq!(config.num_epochs, 4);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.orchestrator, Orchestrator::Parallel);
        assert_eq!(config.mcts.num_parallel_games, 100);
        assert!((config.mcts.c_puct - 2.0).abs() < 1e-6);
    }
}
