//! Hybrid optimization loop execution.
//!
//! [`HybridRunner`] orchestrates the full run: island initialization with a
//! strategy rotation, per-generation evolution on every island, scheduled
//! ring migration, global-best tracking, and termination on the generation
//! cap or the wall-clock timeout. Both stop conditions are normal,
//! successful terminations.

use crate::chromosome::{Chromosome, Individual};
use crate::context::{FitnessOracle, FitnessVector, SchedulingContext};
use crate::decomposition::DecompositionStrategy;
use crate::hybrid::config::HybridConfig;
use crate::hybrid::island::Island;
use crate::hybrid::migration::migrate_ring;
use crate::qubo::SolverMetrics;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Fitness snapshot of the whole population after one generation.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationStats {
    /// 1-based generation number this snapshot was taken after.
    pub generation: u32,

    /// Best `weighted_sum` across all islands.
    pub best_fitness: f64,

    /// Worst `weighted_sum` across all islands.
    pub worst_fitness: f64,

    /// Mean `weighted_sum`.
    pub mean_fitness: f64,

    /// Population standard deviation of `weighted_sum`.
    pub std_dev: f64,

    /// Total number of individuals across all islands.
    pub population_size: usize,
}

/// Aggregate sub-problem solver statistics for a run.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverStats {
    /// Total sub-problem solve calls across all islands.
    pub total_subproblem_calls: u64,

    /// How many of those fell back to random assignment.
    pub fallback_count: u64,

    /// Mean anneal wall-clock time per call, in milliseconds.
    pub avg_anneal_time_ms: f64,

    /// Mean formulation energy per call (lower = better sub-solutions).
    pub avg_energy: f64,
}

impl SolverStats {
    fn from_metrics(metrics: &SolverMetrics) -> Self {
        let calls = metrics.calls.max(1) as f64;
        Self {
            total_subproblem_calls: metrics.calls,
            fallback_count: metrics.fallbacks,
            avg_anneal_time_ms: metrics.anneal_time.as_secs_f64() * 1000.0 / calls,
            avg_energy: metrics.total_energy / calls,
        }
    }
}

/// Result of a hybrid optimization run.
#[derive(Debug, Clone)]
pub struct HybridResult<V: FitnessVector> {
    /// The best individual found across the whole run.
    pub best: Individual<V>,

    /// Number of generations actually executed.
    pub generations_run: u32,

    /// One [`PopulationStats`] entry per executed generation.
    pub evolution_history: Vec<PopulationStats>,

    /// Aggregate sub-problem solver statistics.
    pub solver_stats: SolverStats,

    /// Whether the wall-clock timeout cut the run short.
    pub timed_out: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,
}

/// Executes the hybrid decomposition-evolution optimization.
///
/// # Usage
///
/// ```ignore
/// let config = HybridConfig::default().with_seed(42);
/// let result = HybridRunner::run(&oracle, &context, &config)?;
/// println!("best: {:?}", result.best.fitness);
/// ```
pub struct HybridRunner;

impl HybridRunner {
    /// Runs the optimization.
    ///
    /// The only error path is an invalid configuration; timeouts and the
    /// generation cap both return `Ok` with the best individual found.
    pub fn run<C, O>(
        oracle: &O,
        context: &C,
        config: &HybridConfig,
    ) -> Result<HybridResult<O::Fitness>, String>
    where
        C: SchedulingContext,
        O: FitnessOracle<C>,
    {
        Self::run_with_cancel(oracle, context, config, None)
    }

    /// Runs the optimization with an optional cancellation token.
    ///
    /// Cancellation is cooperative: the flag is checked at the top of each
    /// generation, alongside the wall-clock timeout, and behaves like a
    /// shortened timeout — the best solution found so far is returned.
    pub fn run_with_cancel<C, O>(
        oracle: &O,
        context: &C,
        config: &HybridConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<HybridResult<O::Fitness>, String>
    where
        C: SchedulingContext,
        O: FitnessOracle<C>,
    {
        config.validate()?;

        let n_people = context.n_people();
        let n_slots = context.n_slots();

        // "Nothing to schedule" is a valid input, not an error.
        if n_people == 0 || n_slots == 0 {
            let chromosome = Chromosome::zeros(n_people, n_slots);
            let fitness = oracle.evaluate(&chromosome, context);
            return Ok(HybridResult {
                best: Individual::founder(chromosome, fitness),
                generations_run: 0,
                evolution_history: Vec::new(),
                solver_stats: SolverStats::default(),
                timed_out: false,
                cancelled: false,
            });
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let island_size = config.island_population();

        // Initialize islands; each gets a strategy from the rotation and an
        // independently derived seed so parallel and sequential runs agree.
        let rotation = strategy_rotation(config, n_slots);
        let mut islands: Vec<Island<O::Fitness>> = (0..config.n_islands)
            .map(|i| {
                Island::new(
                    rotation[i % rotation.len()],
                    n_people,
                    n_slots,
                    island_seed(seed, i),
                )
            })
            .collect();

        if config.parallel {
            islands
                .par_iter_mut()
                .for_each(|island| island.seed_population(island_size, oracle, context, config));
        } else {
            for island in &mut islands {
                island.seed_population(island_size, oracle, context, config);
            }
        }

        let mut best = global_best(&islands).clone();
        let mut evolution_history = Vec::with_capacity(config.max_generations as usize);
        let mut generations_run = 0u32;
        let mut timed_out = false;
        let mut cancelled = false;
        let started = Instant::now();

        for generation in 1..=config.max_generations {
            if started.elapsed().as_secs_f64() >= config.timeout_seconds {
                timed_out = true;
                break;
            }
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            // All islands finish the generation before migration begins.
            if config.parallel {
                islands
                    .par_iter_mut()
                    .for_each(|island| island.evolve_generation(generation, oracle, context, config));
            } else {
                for island in &mut islands {
                    island.evolve_generation(generation, oracle, context, config);
                }
            }

            if config.enable_migration && generation % config.migration_interval == 0 {
                migrate_ring(&mut islands, config.migration_size);
            }

            // Serialized after the per-generation join: single writer for
            // the incumbent and the history. Ties keep the incumbent.
            let challenger = global_best(&islands);
            if challenger.weighted_sum() > best.weighted_sum() {
                best = challenger.clone();
            }

            let stats = population_stats(generation, &islands);
            debug!(
                generation,
                best = stats.best_fitness,
                mean = stats.mean_fitness,
                "generation complete"
            );
            evolution_history.push(stats);
            generations_run = generation;
        }

        let mut metrics = SolverMetrics::default();
        for island in &islands {
            metrics.merge(&island.metrics());
        }

        Ok(HybridResult {
            best,
            generations_run,
            evolution_history,
            solver_stats: SolverStats::from_metrics(&metrics),
            timed_out,
            cancelled,
        })
    }
}

/// Island strategy rotation: the configured strategy first, then
/// ByTimeWindow and a doubled Adaptive for exploration diversity.
fn strategy_rotation(config: &HybridConfig, n_slots: usize) -> [DecompositionStrategy; 4] {
    let window_size = n_slots.div_ceil(config.n_subproblems.max(1)).max(1);
    [
        config.strategy,
        DecompositionStrategy::ByTimeWindow { window_size },
        DecompositionStrategy::Adaptive {
            n_subproblems: config.n_subproblems,
        },
        DecompositionStrategy::Adaptive {
            n_subproblems: config.n_subproblems,
        },
    ]
}

/// Derives an island's RNG seed from the run seed (golden-ratio mixing).
fn island_seed(run_seed: u64, island_index: usize) -> u64 {
    run_seed.wrapping_add((island_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Best individual across all islands.
///
/// # Panics
/// Panics if every island is empty; the runner seeds at least one
/// individual per island before calling this.
fn global_best<V: FitnessVector>(islands: &[Island<V>]) -> &Individual<V> {
    islands
        .iter()
        .filter_map(|island| island.best())
        .max_by(|a, b| {
            a.weighted_sum()
                .partial_cmp(&b.weighted_sum())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("islands must be populated")
}

/// Fitness statistics over every individual on every island.
fn population_stats<V: FitnessVector>(generation: u32, islands: &[Island<V>]) -> PopulationStats {
    let fitnesses: Vec<f64> = islands
        .iter()
        .flat_map(|island| island.population().iter().map(|ind| ind.weighted_sum()))
        .collect();
    let n = fitnesses.len();
    let mean = fitnesses.iter().sum::<f64>() / n.max(1) as f64;
    let variance = fitnesses.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n.max(1) as f64;

    PopulationStats {
        generation,
        best_fitness: fitnesses.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        worst_fitness: fitnesses.iter().cloned().fold(f64::INFINITY, f64::min),
        mean_fitness: mean,
        std_dev: variance.sqrt(),
        population_size: n,
    }
}
