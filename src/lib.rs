//! Hybrid decomposition-evolution optimizer for duty rostering.
//!
//! Assigns people to time-bounded duty slots by searching the assignment
//! space with a hybrid metaheuristic:
//!
//! - **Decomposition**: the (person × slot) grid is partitioned into
//!   disjoint labeled sub-problems — per person, per time window, or
//!   randomly (adaptive).
//! - **QUBO-style annealing**: each sub-problem becomes an unconstrained
//!   binary quadratic formulation solved by classical simulated annealing.
//! - **Island-model evolution**: multiple populations evolve partition
//!   encodings in parallel, exchanging elites on a ring.
//!
//! The crate is a library component: constraint checking lives behind the
//! [`context::FitnessOracle`] trait supplied by the caller, and the
//! optimizer's output is the best schedule found plus run statistics.
//!
//! # Example
//!
//! ```
//! use hybrid_roster::chromosome::Chromosome;
//! use hybrid_roster::context::{FitnessOracle, SchedulingContext};
//! use hybrid_roster::decomposition::DecompositionStrategy;
//! use hybrid_roster::hybrid::{HybridConfig, HybridRunner};
//!
//! struct Roster { people: usize, slots: usize }
//!
//! impl SchedulingContext for Roster {
//!     fn n_people(&self) -> usize { self.people }
//!     fn n_slots(&self) -> usize { self.slots }
//!     fn n_templates(&self) -> usize { 2 }
//! }
//!
//! struct Coverage;
//!
//! impl FitnessOracle<Roster> for Coverage {
//!     type Fitness = f64;
//!     fn evaluate(&self, chromosome: &Chromosome, _: &Roster) -> f64 {
//!         chromosome.genes().iter().filter(|&&g| g != 0).count() as f64
//!     }
//! }
//!
//! let context = Roster { people: 4, slots: 6 };
//! let config = HybridConfig::fast()
//!     .with_strategy(DecompositionStrategy::ByPerson)
//!     .with_max_generations(3)
//!     .with_parallel(false)
//!     .with_seed(42);
//!
//! let result = HybridRunner::run(&Coverage, &context, &config).unwrap();
//! assert_eq!(result.best.chromosome.n_people(), 4);
//! ```

pub mod chromosome;
pub mod context;
pub mod decomposition;
pub mod hybrid;
pub mod qubo;
