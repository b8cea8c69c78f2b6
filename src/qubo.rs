//! QUBO-style sub-problem solver.
//!
//! Formulates one partition's cells as an unconstrained binary quadratic
//! problem over `masked_cells × n_templates` variables and solves it with
//! classical simulated annealing (a classical approximation of quantum
//! annealing — no quantum hardware involved).
//!
//! # Formulation
//!
//! - Linear term: −1.0 per variable. Every assignment is weakly preferred
//!   over none, rewarding coverage.
//! - Quadratic term: +100.0 for each pair of variables that would place two
//!   different templates on the *same* cell, a soft one-hot penalty.
//!
//! The one-hot constraint is a relaxation, not a guarantee: decoding picks
//! the first set template per cell if the penalty was ever violated.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lucas (2014), "Ising formulations of many NP problems"

use rand::Rng;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Coverage reward per set variable.
const LINEAR_REWARD: f64 = -1.0;

/// Penalty for two templates occupying the same cell.
const ONE_HOT_PENALTY: f64 = 100.0;

/// Starting temperature of the linear anneal schedule.
const T_START: f64 = 1.0;

/// Temperature floor; the schedule never cools below this.
const T_FLOOR: f64 = 0.01;

/// Why a sub-problem could not be annealed.
///
/// All variants are recoverable: the caller falls back to a random
/// assignment for the affected label and the run continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// The partition label selects no cells.
    #[error("sub-problem has no masked cells")]
    NoCells,

    /// The context exposes no role templates, so there are no variables.
    #[error("sub-problem has no templates to assign")]
    NoTemplates,
}

/// Annealing knobs for one sub-problem, extracted from the run config.
#[derive(Debug, Clone, Copy)]
pub struct AnnealParams {
    /// Independent restarts; the best state across all reads wins.
    pub num_reads: usize,

    /// Sweeps per read. One sweep attempts a flip of every variable.
    pub num_sweeps: usize,

    /// Wall-clock budget per sub-problem. Expiry keeps the best state seen
    /// so far; it is a budget, not a failure.
    pub timeout: Option<Duration>,
}

/// Assignment for one partition label plus its formulation energy.
///
/// `assignments` holds `(flat_cell_index, template_id)` pairs covering every
/// masked cell; template id 0 means the anneal left the cell unassigned.
/// Lower energy is better; a perfect one-hot cover scores `-n_cells`.
#[derive(Debug, Clone)]
pub struct SubproblemSolution {
    pub assignments: Vec<(usize, u32)>,
    pub energy: f64,
}

/// Anneals the binary formulation for one label's cells.
///
/// Initializes variables uniformly in `{0, 1}`, then for `num_sweeps` rounds
/// linearly cools the temperature from 1.0 to the 0.01 floor, attempting a
/// bit-flip of every variable per sweep with Metropolis acceptance. The
/// best-seen state is tracked independently of the (possibly worse) current
/// state and decoded at the end.
pub fn solve_subproblem<R: Rng>(
    cells: &[usize],
    n_templates: usize,
    params: &AnnealParams,
    rng: &mut R,
) -> Result<SubproblemSolution, SolveError> {
    if cells.is_empty() {
        return Err(SolveError::NoCells);
    }
    if n_templates == 0 {
        return Err(SolveError::NoTemplates);
    }

    let n_cells = cells.len();
    let n_vars = n_cells * n_templates;
    let num_sweeps = params.num_sweeps.max(1);
    let num_reads = params.num_reads.max(1);
    let start = Instant::now();

    let mut best_state = vec![false; n_vars];
    let mut best_energy = f64::INFINITY;

    'reads: for _ in 0..num_reads {
        // Random initial state and its energy bookkeeping: set_per_cell[c]
        // counts set variables on cell c, which makes flip deltas O(1).
        let mut state: Vec<bool> = (0..n_vars).map(|_| rng.random_bool(0.5)).collect();
        let mut set_per_cell: Vec<usize> = (0..n_cells)
            .map(|c| {
                state[c * n_templates..(c + 1) * n_templates]
                    .iter()
                    .filter(|&&b| b)
                    .count()
            })
            .collect();
        let mut energy = formulation_energy(&set_per_cell);

        if energy < best_energy {
            best_energy = energy;
            best_state.copy_from_slice(&state);
        }

        for sweep in 0..num_sweeps {
            if let Some(budget) = params.timeout {
                if start.elapsed() >= budget {
                    break 'reads;
                }
            }

            let temperature = (T_START
                - sweep as f64 * (T_START - T_FLOOR) / num_sweeps as f64)
                .max(T_FLOOR);

            for var in 0..n_vars {
                let cell = var / n_templates;
                let k = set_per_cell[cell];

                // Turning a variable on adds the reward plus a penalty edge
                // to every other set template on the same cell; off reverses it.
                let delta = if state[var] {
                    -LINEAR_REWARD - ONE_HOT_PENALTY * (k - 1) as f64
                } else {
                    LINEAR_REWARD + ONE_HOT_PENALTY * k as f64
                };

                let accept = delta < 0.0
                    || rng.random_range(0.0..1.0) < (-delta / temperature).exp();

                if accept {
                    state[var] = !state[var];
                    if state[var] {
                        set_per_cell[cell] += 1;
                    } else {
                        set_per_cell[cell] -= 1;
                    }
                    energy += delta;

                    if energy < best_energy {
                        best_energy = energy;
                        best_state.copy_from_slice(&state);
                    }
                }
            }
        }
    }

    Ok(SubproblemSolution {
        assignments: decode(cells, n_templates, &best_state),
        energy: best_energy,
    })
}

/// Uniformly random template per cell, energy 0.
///
/// Used both as the escape hatch for partitions below the minimum anneal
/// size and as the fallback when [`solve_subproblem`] fails for a label.
pub fn random_assignment<R: Rng>(
    cells: &[usize],
    n_templates: usize,
    rng: &mut R,
) -> SubproblemSolution {
    let assignments = cells
        .iter()
        .map(|&cell| {
            let template = if n_templates == 0 {
                0
            } else {
                rng.random_range(0..n_templates) as u32 + 1
            };
            (cell, template)
        })
        .collect();

    SubproblemSolution {
        assignments,
        energy: 0.0,
    }
}

/// Total formulation energy from per-cell set counts.
fn formulation_energy(set_per_cell: &[usize]) -> f64 {
    set_per_cell
        .iter()
        .map(|&k| {
            LINEAR_REWARD * k as f64 + ONE_HOT_PENALTY * (k * k.saturating_sub(1) / 2) as f64
        })
        .sum()
}

/// Per cell, first set template wins; no set template leaves the cell at 0.
fn decode(cells: &[usize], n_templates: usize, state: &[bool]) -> Vec<(usize, u32)> {
    cells
        .iter()
        .enumerate()
        .map(|(pos, &cell)| {
            let template = (0..n_templates)
                .find(|&t| state[pos * n_templates + t])
                .map(|t| t as u32 + 1)
                .unwrap_or(0);
            (cell, template)
        })
        .collect()
}

/// Running totals over all sub-problem solves, per island.
///
/// Merged by the orchestrator into the run-level solver statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverMetrics {
    /// Number of sub-problem solve calls (annealed or escaped).
    pub calls: u64,

    /// How many of those fell back to random assignment after a solve error.
    pub fallbacks: u64,

    /// Cumulative wall-clock time spent annealing.
    pub anneal_time: Duration,

    /// Sum of per-label energies, for average-energy reporting.
    pub total_energy: f64,
}

impl SolverMetrics {
    /// Records one completed solve.
    pub fn record(&mut self, elapsed: Duration, energy: f64) {
        self.calls += 1;
        self.anneal_time += elapsed;
        self.total_energy += energy;
    }

    /// Records one solve that went through the random fallback.
    pub fn record_fallback(&mut self, elapsed: Duration) {
        self.fallbacks += 1;
        self.record(elapsed, 0.0);
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &SolverMetrics) {
        self.calls += other.calls;
        self.fallbacks += other.fallbacks;
        self.anneal_time += other.anneal_time;
        self.total_energy += other.total_energy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(reads: usize, sweeps: usize) -> AnnealParams {
        AnnealParams {
            num_reads: reads,
            num_sweeps: sweeps,
            timeout: None,
        }
    }

    #[test]
    fn test_empty_cells_is_error() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = solve_subproblem(&[], 2, &params(1, 10), &mut rng);
        assert_eq!(result.unwrap_err(), SolveError::NoCells);
    }

    #[test]
    fn test_zero_templates_is_error() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = solve_subproblem(&[0, 1], 0, &params(1, 10), &mut rng);
        assert_eq!(result.unwrap_err(), SolveError::NoTemplates);
    }

    #[test]
    fn test_anneal_covers_every_cell() {
        let mut rng = StdRng::seed_from_u64(42);
        let cells = [3, 7, 11, 12];
        let solution = solve_subproblem(&cells, 2, &params(2, 200), &mut rng).unwrap();

        assert_eq!(solution.assignments.len(), cells.len());
        for (i, &(cell, template)) in solution.assignments.iter().enumerate() {
            assert_eq!(cell, cells[i]);
            assert!(template <= 2, "template id out of range: {template}");
        }
    }

    #[test]
    fn test_anneal_finds_one_hot_ground_state() {
        // 3 cells × 2 templates = 6 variables; the ground state (exactly one
        // template per cell) has energy -3 and is easily reached.
        let mut rng = StdRng::seed_from_u64(42);
        let solution = solve_subproblem(&[0, 1, 2], 2, &params(4, 300), &mut rng).unwrap();

        assert!(
            solution.energy <= -3.0 + 1e-9,
            "expected ground-state energy -3, got {}",
            solution.energy
        );
        assert!(solution.assignments.iter().all(|&(_, t)| t >= 1));
    }

    #[test]
    fn test_anneal_deterministic_under_seed() {
        let cells = [0, 1, 2, 3, 4];
        let p = params(2, 100);

        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        let a = solve_subproblem(&cells, 3, &p, &mut rng1).unwrap();
        let b = solve_subproblem(&cells, 3, &p, &mut rng2).unwrap();

        assert_eq!(a.assignments, b.assignments);
        assert!((a.energy - b.energy).abs() < 1e-15);
    }

    #[test]
    fn test_timeout_still_returns_complete_solution() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = AnnealParams {
            num_reads: 1000,
            num_sweeps: 1000,
            timeout: Some(Duration::ZERO),
        };
        let solution = solve_subproblem(&[0, 1, 2], 2, &p, &mut rng).unwrap();

        // Budget expired before any sweep; the random initial state still
        // decodes to a full assignment vector.
        assert_eq!(solution.assignments.len(), 3);
    }

    #[test]
    fn test_random_assignment_in_template_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let cells = [2, 5, 9];
        let solution = random_assignment(&cells, 3, &mut rng);

        assert!((solution.energy - 0.0).abs() < 1e-15);
        assert_eq!(solution.assignments.len(), 3);
        for &(_, template) in &solution.assignments {
            assert!((1..=3).contains(&template));
        }
    }

    #[test]
    fn test_random_assignment_zero_templates_leaves_unassigned() {
        let mut rng = StdRng::seed_from_u64(42);
        let solution = random_assignment(&[0, 1], 0, &mut rng);
        assert!(solution.assignments.iter().all(|&(_, t)| t == 0));
    }

    #[test]
    fn test_formulation_energy() {
        // One set bit per cell: pure reward, no penalty.
        assert!((formulation_energy(&[1, 1, 1]) + 3.0).abs() < 1e-15);
        // Two set bits on one cell: -2 reward + 100 penalty.
        assert!((formulation_energy(&[2]) - 98.0).abs() < 1e-15);
        // Three set bits: -3 + 3 pairs * 100.
        assert!((formulation_energy(&[3]) - 297.0).abs() < 1e-15);
    }

    #[test]
    fn test_metrics_merge() {
        let mut a = SolverMetrics::default();
        a.record(Duration::from_millis(10), -4.0);

        let mut b = SolverMetrics::default();
        b.record_fallback(Duration::from_millis(5));

        a.merge(&b);
        assert_eq!(a.calls, 2);
        assert_eq!(a.fallbacks, 1);
        assert_eq!(a.anneal_time, Duration::from_millis(15));
        assert!((a.total_energy + 4.0).abs() < 1e-15);
    }
}
