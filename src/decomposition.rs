//! Problem decomposition.
//!
//! Partitions the (person × slot) assignment grid into disjoint labeled
//! sub-problems, each small enough for the QUBO annealer. The partition is
//! exhaustive by construction: every cell carries exactly one label in
//! `[0, n_subproblems)`, so merging solved sub-grids back into a chromosome
//! needs no conflict resolution.

use crate::chromosome::Chromosome;
use crate::qubo::{self, AnnealParams, SolverMetrics, SubproblemSolution};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::warn;

/// How to partition the grid into sub-problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecompositionStrategy {
    /// One sub-problem per person: label = row index. Deterministic.
    ByPerson,

    /// One sub-problem per contiguous slot window: label = `col / window_size`.
    /// Deterministic.
    ByTimeWindow {
        /// Window width in slots. Must be ≥ 1.
        window_size: usize,
    },

    /// Label drawn uniformly at random per cell. Needs a seeded RNG for
    /// reproducibility.
    Adaptive {
        /// Number of sub-problems to scatter cells across. Must be ≥ 1.
        n_subproblems: usize,
    },
}

impl DecompositionStrategy {
    /// Number of sub-problems this strategy yields on a grid of the given shape.
    pub fn subproblem_count(&self, n_people: usize, n_slots: usize) -> usize {
        match *self {
            DecompositionStrategy::ByPerson => n_people.max(1),
            DecompositionStrategy::ByTimeWindow { window_size } => {
                n_slots.div_ceil(window_size.max(1)).max(1)
            }
            DecompositionStrategy::Adaptive { n_subproblems } => n_subproblems.max(1),
        }
    }
}

/// A labeled partition of the assignment grid, plus per-label solutions.
///
/// Lifecycle: created fresh per offspring, solved immediately via
/// [`solve_all`](ProblemDecomposition::solve_all), merged once into a
/// [`Chromosome`], then discarded (labels and energies stay readable for
/// diagnostics).
#[derive(Debug, Clone)]
pub struct ProblemDecomposition {
    labels: Vec<usize>,
    n_people: usize,
    n_slots: usize,
    n_subproblems: usize,
    strategy: DecompositionStrategy,
    solutions: Vec<Option<SubproblemSolution>>,

    /// Cumulative wall-clock time spent in the annealer.
    pub anneal_time: Duration,

    /// Wall-clock time of the merge step.
    pub merge_time: Duration,
}

impl ProblemDecomposition {
    /// One sub-problem per person; label = row index.
    pub fn by_person(n_people: usize, n_slots: usize) -> Self {
        let labels = (0..n_people * n_slots).map(|cell| cell / n_slots.max(1)).collect();
        Self::from_labels(labels, n_people, n_slots, n_people.max(1), DecompositionStrategy::ByPerson)
    }

    /// One sub-problem per contiguous slot window; label = `col / window_size`.
    pub fn by_time_window(n_people: usize, n_slots: usize, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        let n_subproblems = n_slots.div_ceil(window_size).max(1);
        let labels = (0..n_people * n_slots)
            .map(|cell| (cell % n_slots.max(1)) / window_size)
            .collect();
        Self::from_labels(
            labels,
            n_people,
            n_slots,
            n_subproblems,
            DecompositionStrategy::ByTimeWindow { window_size },
        )
    }

    /// Uniformly random label per cell.
    pub fn adaptive<R: Rng>(
        n_people: usize,
        n_slots: usize,
        n_subproblems: usize,
        rng: &mut R,
    ) -> Self {
        let n_subproblems = n_subproblems.max(1);
        let labels = (0..n_people * n_slots)
            .map(|_| rng.random_range(0..n_subproblems))
            .collect();
        Self::from_labels(
            labels,
            n_people,
            n_slots,
            n_subproblems,
            DecompositionStrategy::Adaptive { n_subproblems },
        )
    }

    /// Dispatches on the strategy tag.
    pub fn from_strategy<R: Rng>(
        strategy: DecompositionStrategy,
        n_people: usize,
        n_slots: usize,
        rng: &mut R,
    ) -> Self {
        match strategy {
            DecompositionStrategy::ByPerson => Self::by_person(n_people, n_slots),
            DecompositionStrategy::ByTimeWindow { window_size } => {
                Self::by_time_window(n_people, n_slots, window_size)
            }
            DecompositionStrategy::Adaptive { n_subproblems } => {
                Self::adaptive(n_people, n_slots, n_subproblems, rng)
            }
        }
    }

    /// Recovers an approximate partition from a merged chromosome by
    /// `gene % n_subproblems`.
    ///
    /// This is a lossy re-encoding: it conflates "which template was
    /// assigned" with "which sub-problem produced it". It is kept on purpose
    /// — partition information rides inside the chromosome itself, so
    /// crossover never needs the parent's original decomposition object.
    pub fn from_chromosome(
        chromosome: &Chromosome,
        n_subproblems: usize,
        strategy: DecompositionStrategy,
    ) -> Self {
        let n_subproblems = n_subproblems.max(1);
        let labels = chromosome
            .genes()
            .iter()
            .map(|&g| g as usize % n_subproblems)
            .collect();
        Self::from_labels(
            labels,
            chromosome.n_people(),
            chromosome.n_slots(),
            n_subproblems,
            strategy,
        )
    }

    /// Builds a decomposition from an explicit label grid.
    ///
    /// # Panics
    /// Debug-asserts that the label grid has the right length and every
    /// label is in `[0, n_subproblems)`.
    pub fn from_labels(
        labels: Vec<usize>,
        n_people: usize,
        n_slots: usize,
        n_subproblems: usize,
        strategy: DecompositionStrategy,
    ) -> Self {
        debug_assert_eq!(labels.len(), n_people * n_slots);
        debug_assert!(labels.iter().all(|&l| l < n_subproblems));
        Self {
            labels,
            n_people,
            n_slots,
            n_subproblems,
            strategy,
            solutions: vec![None; n_subproblems],
            anneal_time: Duration::ZERO,
            merge_time: Duration::ZERO,
        }
    }

    pub fn n_people(&self) -> usize {
        self.n_people
    }

    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    pub fn n_subproblems(&self) -> usize {
        self.n_subproblems
    }

    pub fn strategy(&self) -> DecompositionStrategy {
        self.strategy
    }

    /// Partition label of a flat row-major cell index.
    pub fn label(&self, cell: usize) -> usize {
        self.labels[cell]
    }

    /// The full label grid, row-major.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Flat cell indices carrying the given label.
    pub fn cells_with_label(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Energy of one label's solved sub-problem, if solved.
    pub fn energy(&self, label: usize) -> Option<f64> {
        self.solutions.get(label)?.as_ref().map(|s| s.energy)
    }

    /// Sum of per-label energies across solved sub-problems.
    pub fn total_energy(&self) -> f64 {
        self.solutions
            .iter()
            .flatten()
            .map(|s| s.energy)
            .sum()
    }

    /// Solves every label's sub-problem.
    ///
    /// Labels below `min_subproblem_size` cells skip annealing and take a
    /// uniformly random assignment (energy 0) — annealing overhead is not
    /// worth it on degenerate tiny partitions. A solve error on one label is
    /// local: it logs, falls back to a random assignment, and the remaining
    /// labels still run.
    pub fn solve_all<R: Rng>(
        &mut self,
        n_templates: usize,
        min_subproblem_size: usize,
        params: &AnnealParams,
        metrics: &mut SolverMetrics,
        rng: &mut R,
    ) {
        for label in 0..self.n_subproblems {
            let cells = self.cells_with_label(label);
            let started = Instant::now();

            let solution = if cells.len() < min_subproblem_size {
                let solution = qubo::random_assignment(&cells, n_templates, rng);
                metrics.record(started.elapsed(), solution.energy);
                solution
            } else {
                match qubo::solve_subproblem(&cells, n_templates, params, rng) {
                    Ok(solution) => {
                        metrics.record(started.elapsed(), solution.energy);
                        solution
                    }
                    Err(reason) => {
                        warn!(label, %reason, "sub-problem solve failed, using random assignment");
                        metrics.record_fallback(started.elapsed());
                        qubo::random_assignment(&cells, n_templates, rng)
                    }
                }
            };

            self.anneal_time += started.elapsed();
            self.solutions[label] = Some(solution);
        }
    }

    /// Identity merge: every cell takes its label's solved value.
    ///
    /// Labels partition the grid exhaustively and disjointly, so after
    /// [`solve_all`](Self::solve_all) every cell is written exactly once.
    /// Unsolved labels (only possible when `solve_all` was skipped) leave
    /// their cells at 0.
    pub fn merge(&mut self) -> Chromosome {
        let started = Instant::now();
        let mut chromosome = Chromosome::zeros(self.n_people, self.n_slots);
        for solution in self.solutions.iter().flatten() {
            for &(cell, template) in &solution.assignments {
                chromosome.set_gene(cell, template);
            }
        }
        self.merge_time = started.elapsed();
        chromosome
    }
}
