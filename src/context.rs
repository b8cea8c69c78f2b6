//! External interface traits.
//!
//! The optimizer is a library component: it consumes a read-only
//! [`SchedulingContext`] (grid dimensions) and a [`FitnessOracle`]
//! (constraint scoring), both supplied by the caller, and produces an
//! optimization result. Nothing in this crate knows what a constraint is —
//! the oracle is the single source of truth for "is this schedule good."

use crate::chromosome::Chromosome;

/// Read-only description of the scheduling problem dimensions.
///
/// Supplies the grid shape (people × time-slots) and the valid role-template
/// range. The optimizer never mutates the context.
pub trait SchedulingContext: Send + Sync {
    /// Number of people (chromosome rows).
    fn n_people(&self) -> usize;

    /// Number of time-slots (chromosome columns).
    fn n_slots(&self) -> usize;

    /// Number of role templates. Gene values range over `0..=n_templates`,
    /// where 0 means unassigned.
    fn n_templates(&self) -> usize;
}

/// Fitness of a complete schedule, opaque beyond its scalar ranking.
///
/// The optimizer only ever compares individuals by [`weighted_sum`]
/// (higher is better); the vector's components are the oracle's business.
///
/// A plain `f64` implements this trait for single-objective callers.
///
/// [`weighted_sum`]: FitnessVector::weighted_sum
pub trait FitnessVector: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Scalar ranking value. Higher is better.
    fn weighted_sum(&self) -> f64;
}

impl FitnessVector for f64 {
    fn weighted_sum(&self) -> f64 {
        *self
    }
}

/// Scores a complete chromosome against the caller's constraint model.
///
/// # Contract
///
/// `evaluate` must be a pure function of its inputs and must always return a
/// value — a schedule that violates every constraint is expressed as a bad
/// fitness, never as an error. This keeps the evolutionary loop free of
/// oracle-failure handling.
///
/// # Thread Safety
///
/// `Send + Sync` because islands may be evolved in parallel via rayon.
pub trait FitnessOracle<C: SchedulingContext>: Send + Sync {
    /// The fitness type produced by this oracle.
    type Fitness: FitnessVector;

    /// Evaluates a chromosome. Higher `weighted_sum()` is better.
    fn evaluate(&self, chromosome: &Chromosome, context: &C) -> Self::Fitness;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GridContext {
        people: usize,
        slots: usize,
        templates: usize,
    }

    impl SchedulingContext for GridContext {
        fn n_people(&self) -> usize {
            self.people
        }
        fn n_slots(&self) -> usize {
            self.slots
        }
        fn n_templates(&self) -> usize {
            self.templates
        }
    }

    struct CoverageOracle;

    impl FitnessOracle<GridContext> for CoverageOracle {
        type Fitness = f64;

        fn evaluate(&self, chromosome: &Chromosome, _context: &GridContext) -> f64 {
            chromosome.genes().iter().filter(|&&g| g != 0).count() as f64
        }
    }

    #[test]
    fn test_f64_fitness_vector() {
        let f: f64 = 3.5;
        assert!((f.weighted_sum() - 3.5).abs() < 1e-15);
    }

    #[test]
    fn test_coverage_oracle_counts_assigned_cells() {
        let ctx = GridContext {
            people: 2,
            slots: 3,
            templates: 2,
        };
        let mut chromosome = Chromosome::zeros(2, 3);
        chromosome.set(0, 0, 1);
        chromosome.set(1, 2, 2);

        let fitness = CoverageOracle.evaluate(&chromosome, &ctx);
        assert!((fitness.weighted_sum() - 2.0).abs() < 1e-15);
    }
}
