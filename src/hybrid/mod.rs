//! Hybrid decomposition-evolution optimizer.
//!
//! An island-model genetic algorithm whose chromosomes encode *how to
//! partition* the scheduling grid into independently solvable sub-problems.
//! Each offspring's partition is solved label by label with the QUBO-style
//! annealer, merged into a full schedule, and scored by the caller's fitness
//! oracle. Islands run different decomposition strategies and periodically
//! exchange elites on a ring.
//!
//! # Key Types
//!
//! - [`HybridConfig`]: run parameters (population, rates, anneal budgets,
//!   migration policy, timeout, seed)
//! - [`HybridRunner`]: executes the optimization loop
//! - [`HybridResult`]: best individual plus per-generation statistics
//!
//! # References
//!
//! - Whitley, Rana & Heckendorn (1999), "The Island Model Genetic Algorithm"
//! - Cantú-Paz (2000), *Efficient and Accurate Parallel Genetic Algorithms*

mod config;
mod island;
mod migration;
mod runner;

pub use config::HybridConfig;
pub use island::Island;
pub use migration::migrate_ring;
pub use runner::{HybridResult, HybridRunner, PopulationStats, SolverStats};
