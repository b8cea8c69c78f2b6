//! Hybrid optimizer configuration.
//!
//! [`HybridConfig`] holds every knob of the decomposition-evolution loop:
//! GA parameters, annealer budgets, migration policy, and run limits.

use crate::decomposition::DecompositionStrategy;

/// Configuration for the hybrid decomposition-evolution optimizer.
///
/// # Defaults
///
/// ```
/// use hybrid_roster::hybrid::HybridConfig;
///
/// let config = HybridConfig::default();
/// assert_eq!(config.population_size, 20);
/// assert_eq!(config.n_islands, 4);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use hybrid_roster::hybrid::HybridConfig;
/// use hybrid_roster::decomposition::DecompositionStrategy;
///
/// let config = HybridConfig::default()
///     .with_strategy(DecompositionStrategy::ByPerson)
///     .with_population_size(8)
///     .with_n_islands(2)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HybridConfig {
    /// Total number of individuals across all islands.
    ///
    /// Each island holds `population_size / n_islands` individuals.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: u32,

    /// Decomposition strategy of island 0; islands 1+ follow the fixed
    /// rotation ByTimeWindow, Adaptive, Adaptive.
    pub strategy: DecompositionStrategy,

    /// Sub-problem count for Adaptive partitions and the rotation's derived
    /// window size.
    pub n_subproblems: usize,

    /// Partitions with fewer cells than this skip annealing and take a
    /// random assignment.
    pub min_subproblem_size: usize,

    /// Probability of uniform partition crossover (0.0–1.0). When not
    /// applied, offspring partitions are straight copies of the parents'.
    pub crossover_rate: f64,

    /// Per-cell probability of re-labeling during mutation (0.0–1.0).
    pub mutation_rate: f64,

    /// Individuals copied unchanged into the next generation, per island.
    pub elite_size: usize,

    /// Independent annealer restarts per sub-problem.
    pub anneal_reads: usize,

    /// Annealer sweeps per read.
    pub anneal_sweeps: usize,

    /// Wall-clock budget per sub-problem anneal, in milliseconds.
    /// `None` disables the per-sub-problem budget.
    pub anneal_timeout_ms: Option<u64>,

    /// Whether islands exchange elites at all.
    pub enable_migration: bool,

    /// Migration runs when `generation % migration_interval == 0`
    /// (and `generation > 0`).
    pub migration_interval: u32,

    /// Champions copied per island per migration; the same number of worst
    /// individuals is replaced.
    pub migration_size: usize,

    /// Number of independently evolving populations.
    pub n_islands: usize,

    /// Overall run timeout in seconds, checked at the top of each
    /// generation. Exceeding it is a normal termination, not an error.
    pub timeout_seconds: f64,

    /// Whether to evolve islands in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            max_generations: 50,
            strategy: DecompositionStrategy::Adaptive { n_subproblems: 4 },
            n_subproblems: 4,
            min_subproblem_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_size: 1,
            anneal_reads: 2,
            anneal_sweeps: 100,
            anneal_timeout_ms: None,
            enable_migration: true,
            migration_interval: 5,
            migration_size: 1,
            n_islands: 4,
            timeout_seconds: 60.0,
            parallel: true,
            seed: None,
        }
    }
}

impl HybridConfig {
    /// Sets the total population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation cap.
    pub fn with_max_generations(mut self, n: u32) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets island 0's decomposition strategy.
    pub fn with_strategy(mut self, strategy: DecompositionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the sub-problem count used by Adaptive partitions.
    pub fn with_n_subproblems(mut self, n: usize) -> Self {
        self.n_subproblems = n;
        self
    }

    /// Sets the minimum partition size below which annealing is skipped.
    pub fn with_min_subproblem_size(mut self, n: usize) -> Self {
        self.min_subproblem_size = n;
        self
    }

    /// Sets the crossover rate, clamped to `[0, 1]`.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate, clamped to `[0, 1]`.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-island elite count.
    pub fn with_elite_size(mut self, n: usize) -> Self {
        self.elite_size = n;
        self
    }

    /// Sets the annealer restart count per sub-problem.
    pub fn with_anneal_reads(mut self, n: usize) -> Self {
        self.anneal_reads = n;
        self
    }

    /// Sets the annealer sweep count per read.
    pub fn with_anneal_sweeps(mut self, n: usize) -> Self {
        self.anneal_sweeps = n;
        self
    }

    /// Sets the per-sub-problem anneal budget in milliseconds.
    pub fn with_anneal_timeout_ms(mut self, ms: u64) -> Self {
        self.anneal_timeout_ms = Some(ms);
        self
    }

    /// Enables or disables migration.
    pub fn with_migration(mut self, enabled: bool) -> Self {
        self.enable_migration = enabled;
        self
    }

    /// Sets the migration interval in generations.
    pub fn with_migration_interval(mut self, interval: u32) -> Self {
        self.migration_interval = interval;
        self
    }

    /// Sets how many champions migrate per island per exchange.
    pub fn with_migration_size(mut self, n: usize) -> Self {
        self.migration_size = n;
        self
    }

    /// Sets the island count.
    pub fn with_n_islands(mut self, n: usize) -> Self {
        self.n_islands = n;
        self
    }

    /// Sets the overall run timeout in seconds.
    pub fn with_timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Enables or disables parallel island evolution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Per-island population size.
    pub fn island_population(&self) -> usize {
        self.population_size / self.n_islands.max(1)
    }

    /// Preset for quick runs: small population, short anneals, 2 islands.
    pub fn fast() -> Self {
        Self {
            population_size: 8,
            max_generations: 20,
            anneal_reads: 1,
            anneal_sweeps: 50,
            n_islands: 2,
            timeout_seconds: 10.0,
            ..Self::default()
        }
    }

    /// Preset for quality runs: larger population, longer anneals.
    pub fn quality() -> Self {
        Self {
            population_size: 40,
            max_generations: 100,
            anneal_reads: 4,
            anneal_sweeps: 200,
            timeout_seconds: 300.0,
            ..Self::default()
        }
    }

    /// Picks a preset from the grid size (`n_people * n_slots`).
    pub fn auto_select(cell_count: usize) -> Self {
        if cell_count < 100 {
            Self::fast()
        } else if cell_count < 1000 {
            Self::default()
        } else {
            Self::quality()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid. This is
    /// the only user-visible error of the optimizer: an invalid config
    /// refuses to start rather than run with undefined behavior.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_islands == 0 {
            return Err("n_islands must be at least 1".into());
        }
        if self.population_size < self.n_islands {
            return Err(format!(
                "population_size {} cannot fill {} islands",
                self.population_size, self.n_islands
            ));
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err("crossover_rate must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err("mutation_rate must be in [0, 1]".into());
        }
        if self.elite_size >= self.island_population() {
            return Err("elite_size must leave room for offspring on each island".into());
        }
        if self.n_subproblems == 0 {
            return Err("n_subproblems must be at least 1".into());
        }
        if self.anneal_sweeps == 0 {
            return Err("anneal_sweeps must be at least 1".into());
        }
        if self.enable_migration {
            if self.migration_interval == 0 {
                return Err("migration_interval must be at least 1".into());
            }
            if self.migration_size > self.island_population() {
                return Err("migration_size cannot exceed the per-island population".into());
            }
        }
        if self.timeout_seconds < 0.0 {
            return Err("timeout_seconds must be non-negative".into());
        }
        if let DecompositionStrategy::ByTimeWindow { window_size } = self.strategy {
            if window_size == 0 {
                return Err("window_size must be at least 1".into());
            }
        }
        if let DecompositionStrategy::Adaptive { n_subproblems } = self.strategy {
            if n_subproblems == 0 {
                return Err("Adaptive n_subproblems must be at least 1".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HybridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.population_size, 20);
        assert_eq!(config.n_islands, 4);
        assert_eq!(config.island_population(), 5);
        assert!(config.enable_migration);
    }

    #[test]
    fn test_builder_pattern() {
        let config = HybridConfig::default()
            .with_population_size(8)
            .with_max_generations(5)
            .with_strategy(DecompositionStrategy::ByPerson)
            .with_n_islands(2)
            .with_crossover_rate(0.7)
            .with_mutation_rate(0.2)
            .with_elite_size(1)
            .with_migration_interval(3)
            .with_seed(42);

        assert_eq!(config.population_size, 8);
        assert_eq!(config.max_generations, 5);
        assert_eq!(config.strategy, DecompositionStrategy::ByPerson);
        assert_eq!(config.n_islands, 2);
        assert!((config.crossover_rate - 0.7).abs() < 1e-15);
        assert!((config.mutation_rate - 0.2).abs() < 1e-15);
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rates_clamped() {
        let config = HybridConfig::default()
            .with_crossover_rate(1.5)
            .with_mutation_rate(-0.5);
        assert!((config.crossover_rate - 1.0).abs() < 1e-15);
        assert!((config.mutation_rate - 0.0).abs() < 1e-15);
    }

    #[test]
    fn test_validate_zero_islands() {
        let config = HybridConfig::default().with_n_islands(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_population_smaller_than_islands() {
        let config = HybridConfig::default()
            .with_population_size(2)
            .with_n_islands(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_elite_fills_island() {
        let config = HybridConfig::default()
            .with_population_size(8)
            .with_n_islands(4)
            .with_elite_size(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_window() {
        let config = HybridConfig::default()
            .with_strategy(DecompositionStrategy::ByTimeWindow { window_size: 0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_migration_size_bound() {
        let config = HybridConfig::default()
            .with_population_size(8)
            .with_n_islands(4)
            .with_migration_size(3);
        assert!(config.validate().is_err());

        let disabled = config.with_migration(false);
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_validate_negative_timeout() {
        let config = HybridConfig::default().with_timeout_seconds(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_valid() {
        // A zero budget is a legal way to request "initialize only".
        let config = HybridConfig::default().with_timeout_seconds(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(HybridConfig::fast().validate().is_ok());
        assert!(HybridConfig::quality().validate().is_ok());
    }

    #[test]
    fn test_auto_select() {
        assert_eq!(HybridConfig::auto_select(24).population_size, 8);
        assert_eq!(HybridConfig::auto_select(500).population_size, 20);
        assert_eq!(HybridConfig::auto_select(5000).population_size, 40);
    }
}
