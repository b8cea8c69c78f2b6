//! Island evolution driver.
//!
//! One [`Island`] owns an independently evolving population and the
//! decomposition strategy it was assigned at initialization. A generation is
//! a single transition: rank, preserve elites, reproduce via tournament
//! selection + partition crossover/mutation, re-solve offspring, replace.
//!
//! Islands know nothing about wall-clock time; the orchestrator drives
//! termination.

use crate::chromosome::Individual;
use crate::context::{FitnessOracle, FitnessVector, SchedulingContext};
use crate::decomposition::{DecompositionStrategy, ProblemDecomposition};
use crate::hybrid::config::HybridConfig;
use crate::qubo::{AnnealParams, SolverMetrics};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Tournament size for parent selection.
const TOURNAMENT_SIZE: usize = 3;

/// One independently evolving population.
pub struct Island<V: FitnessVector> {
    strategy: DecompositionStrategy,
    n_subproblems: usize,
    n_people: usize,
    n_slots: usize,
    population: Vec<Individual<V>>,
    rng: StdRng,
    metrics: SolverMetrics,
}

impl<V: FitnessVector> Island<V> {
    /// Creates an empty island with its own deterministically seeded RNG.
    pub fn new(
        strategy: DecompositionStrategy,
        n_people: usize,
        n_slots: usize,
        seed: u64,
    ) -> Self {
        Self {
            strategy,
            n_subproblems: strategy.subproblem_count(n_people, n_slots),
            n_people,
            n_slots,
            population: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            metrics: SolverMetrics::default(),
        }
    }

    /// Fills the island with `size` freshly decomposed-and-solved founders.
    pub fn seed_population<C, O>(&mut self, size: usize, oracle: &O, context: &C, config: &HybridConfig)
    where
        C: SchedulingContext,
        O: FitnessOracle<C, Fitness = V>,
    {
        self.population = (0..size)
            .map(|_| {
                let decomposition = ProblemDecomposition::from_strategy(
                    self.strategy,
                    self.n_people,
                    self.n_slots,
                    &mut self.rng,
                );
                solve_and_score(
                    decomposition,
                    oracle,
                    context,
                    config,
                    &mut self.metrics,
                    &mut self.rng,
                    0,
                    None,
                )
            })
            .collect();
    }

    /// Runs one generation: rank, elitism, reproduce, replace.
    pub fn evolve_generation<C, O>(
        &mut self,
        generation: u32,
        oracle: &O,
        context: &C,
        config: &HybridConfig,
    ) where
        C: SchedulingContext,
        O: FitnessOracle<C, Fitness = V>,
    {
        let target = self.population.len();
        if target == 0 {
            return;
        }

        self.sort_descending();

        let elite_count = config.elite_size.min(target);
        let mut next_generation: Vec<Individual<V>> = self.population[..elite_count].to_vec();

        while next_generation.len() < target {
            let p1 = self.tournament();
            let p2 = self.tournament();
            let parent_ids = [self.population[p1].id, self.population[p2].id];

            // Recover each parent's partition from its merged chromosome;
            // the original decomposition object is long gone.
            let labels_a = self.recover_labels(p1);
            let labels_b = self.recover_labels(p2);

            let (mut child_a, mut child_b) =
                if self.rng.random_range(0.0..1.0) < config.crossover_rate {
                    uniform_crossover(&labels_a, &labels_b, &mut self.rng)
                } else {
                    (labels_a, labels_b)
                };

            self.mutate_labels(&mut child_a, config.mutation_rate);
            self.mutate_labels(&mut child_b, config.mutation_rate);

            for labels in [child_a, child_b] {
                if next_generation.len() >= target {
                    break;
                }
                let decomposition = ProblemDecomposition::from_labels(
                    labels,
                    self.n_people,
                    self.n_slots,
                    self.n_subproblems,
                    self.strategy,
                );
                let child = solve_and_score(
                    decomposition,
                    oracle,
                    context,
                    config,
                    &mut self.metrics,
                    &mut self.rng,
                    generation,
                    Some(parent_ids),
                );
                next_generation.push(child);
            }
        }

        next_generation.truncate(target);
        self.population = next_generation;
    }

    /// Tournament selection: draw three, best `weighted_sum` wins.
    fn tournament(&mut self) -> usize {
        let n = self.population.len();
        let mut best = self.rng.random_range(0..n);
        for _ in 1..TOURNAMENT_SIZE {
            let candidate = self.rng.random_range(0..n);
            if self.population[candidate].weighted_sum() > self.population[best].weighted_sum() {
                best = candidate;
            }
        }
        best
    }

    /// `gene % n_subproblems` per cell for the individual at `index`.
    fn recover_labels(&self, index: usize) -> Vec<usize> {
        self.population[index]
            .chromosome
            .genes()
            .iter()
            .map(|&g| g as usize % self.n_subproblems)
            .collect()
    }

    /// Re-labels each cell independently with probability `rate`.
    fn mutate_labels(&mut self, labels: &mut [usize], rate: f64) {
        for label in labels.iter_mut() {
            if self.rng.random_range(0.0..1.0) < rate {
                *label = self.rng.random_range(0..self.n_subproblems);
            }
        }
    }

    /// Sorts the population best-first by `weighted_sum`.
    pub fn sort_descending(&mut self) {
        self.population.sort_by(|a, b| {
            b.weighted_sum()
                .partial_cmp(&a.weighted_sum())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Best individual on this island, if any.
    pub fn best(&self) -> Option<&Individual<V>> {
        self.population.iter().max_by(|a, b| {
            a.weighted_sum()
                .partial_cmp(&b.weighted_sum())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn population(&self) -> &[Individual<V>] {
        &self.population
    }

    pub(crate) fn population_mut(&mut self) -> &mut Vec<Individual<V>> {
        &mut self.population
    }

    pub fn strategy(&self) -> DecompositionStrategy {
        self.strategy
    }

    /// Cumulative solver metrics for this island.
    pub fn metrics(&self) -> SolverMetrics {
        self.metrics
    }
}

/// Per-cell coin flip: heads takes parent A's label, tails parent B's.
/// The second child takes the complement.
fn uniform_crossover<R: Rng>(a: &[usize], b: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut child_a = Vec::with_capacity(a.len());
    let mut child_b = Vec::with_capacity(b.len());
    for (&la, &lb) in a.iter().zip(b.iter()) {
        if rng.random_bool(0.5) {
            child_a.push(la);
            child_b.push(lb);
        } else {
            child_a.push(lb);
            child_b.push(la);
        }
    }
    (child_a, child_b)
}

/// Solves a decomposition, merges it, and scores the result via the oracle.
#[allow(clippy::too_many_arguments)]
fn solve_and_score<C, O, V>(
    mut decomposition: ProblemDecomposition,
    oracle: &O,
    context: &C,
    config: &HybridConfig,
    metrics: &mut SolverMetrics,
    rng: &mut StdRng,
    generation: u32,
    parents: Option<[u64; 2]>,
) -> Individual<V>
where
    C: SchedulingContext,
    O: FitnessOracle<C, Fitness = V>,
    V: FitnessVector,
{
    let params = AnnealParams {
        num_reads: config.anneal_reads,
        num_sweeps: config.anneal_sweeps,
        timeout: config.anneal_timeout_ms.map(Duration::from_millis),
    };
    decomposition.solve_all(
        context.n_templates(),
        config.min_subproblem_size,
        &params,
        metrics,
        rng,
    );
    let chromosome = decomposition.merge();
    let fitness = oracle.evaluate(&chromosome, context);

    match parents {
        Some(ids) => Individual::offspring(chromosome, fitness, generation, ids),
        None => Individual::founder(chromosome, fitness),
    }
}
