//! MCTS configuration parameters.

use crate::search::SearchError;

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run per decision.
    pub num_searches: u32,

    /// Exploration constant `C` in the PUCT score.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub c_puct: f32,

    /// Dirichlet noise alpha for root node exploration.
    pub dirichlet_alpha: f32,

    /// Fraction of the root prior that comes from Dirichlet noise.
    /// Set to 0.0 to disable noise (for evaluation/inference).
    pub dirichlet_epsilon: f32,

    /// Temperature for move sampling after search.
    /// 1.0 = sample proportional to visit counts
    /// 0.0 = always pick most-visited (argmax)
    pub temperature: f32,

    /// Number of concurrently tracked games (parallel engine only).
    pub num_parallel_games: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_searches: 60,
            c_puct: 2.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
            temperature: 1.25,
            num_parallel_games: 100,
        }
    }
}

impl MctsConfig {
    /// Create config for training (with exploration noise).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            num_searches: 50,
            c_puct: 2.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.0,
            temperature: 1.0,
            num_parallel_games: 4,
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_searches(mut self, n: u32) -> Self {
        self.num_searches = n;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set temperature.
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    /// Builder pattern: set root noise parameters.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Builder pattern: set number of parallel games.
    pub fn with_parallel_games(mut self, k: usize) -> Self {
        self.num_parallel_games = k;
        self
    }

    /// Whether root noise is mixed into the prior.
    #[inline]
    pub fn uses_root_noise(&self) -> bool {
        self.dirichlet_epsilon > 0.0
    }

    /// Reject configurations that would make the search degenerate.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.num_searches == 0 {
            return Err(SearchError::InvalidConfig(
                "num_searches must be at least 1".into(),
            ));
        }
        if !self.c_puct.is_finite() || self.c_puct < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "c_puct must be a non-negative number, got {}",
                self.c_puct
            )));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(SearchError::InvalidConfig(format!(
                "dirichlet_epsilon must be in [0, 1], got {}",
                self.dirichlet_epsilon
            )));
        }
        if self.uses_root_noise() && !(self.dirichlet_alpha > 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "dirichlet_alpha must be positive when noise is enabled, got {}",
                self.dirichlet_alpha
            )));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if self.num_parallel_games == 0 {
            return Err(SearchError::InvalidConfig(
                "num_parallel_games must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
