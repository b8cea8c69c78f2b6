//! Chromosome grid and scored individuals.
//!
//! A [`Chromosome`] is the full (person × slot) assignment grid under
//! evolution: a dense row-major grid of template ids, 0 meaning unassigned.
//! An [`Individual`] couples a chromosome with its oracle fitness and
//! lineage metadata.
//!
//! Chromosomes are owned exclusively by the individual holding them and are
//! always copied, never aliased, on crossover and mutation.

use crate::context::FitnessVector;
use std::sync::atomic::{AtomicU64, Ordering};

/// Dense (people × slots) assignment grid, row-major.
///
/// Gene values are role-template ids: 0 = unassigned, `1..=n_templates`
/// for assigned cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    n_people: usize,
    n_slots: usize,
    genes: Vec<u32>,
}

impl Chromosome {
    /// Creates an all-unassigned grid of the given shape.
    pub fn zeros(n_people: usize, n_slots: usize) -> Self {
        Self {
            n_people,
            n_slots,
            genes: vec![0; n_people * n_slots],
        }
    }

    /// Number of rows (people).
    pub fn n_people(&self) -> usize {
        self.n_people
    }

    /// Number of columns (time-slots).
    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.genes.len()
    }

    /// True for a zero-area grid (nothing to schedule).
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Gene at `(person, slot)`.
    ///
    /// # Panics
    /// Panics if the indices are out of bounds.
    pub fn get(&self, person: usize, slot: usize) -> u32 {
        self.genes[person * self.n_slots + slot]
    }

    /// Sets the gene at `(person, slot)`.
    ///
    /// # Panics
    /// Panics if the indices are out of bounds.
    pub fn set(&mut self, person: usize, slot: usize, template: u32) {
        self.genes[person * self.n_slots + slot] = template;
    }

    /// Gene at a flat row-major cell index.
    pub fn gene(&self, cell: usize) -> u32 {
        self.genes[cell]
    }

    /// Sets the gene at a flat row-major cell index.
    pub fn set_gene(&mut self, cell: usize, template: u32) {
        self.genes[cell] = template;
    }

    /// Flat view of all genes, row-major.
    pub fn genes(&self) -> &[u32] {
        &self.genes
    }
}

static NEXT_INDIVIDUAL_ID: AtomicU64 = AtomicU64::new(1);

fn next_individual_id() -> u64 {
    NEXT_INDIVIDUAL_ID.fetch_add(1, Ordering::Relaxed)
}

/// A scored member of an island population.
///
/// Immutable once built: reproduction creates new individuals (with fresh
/// ids and `parent_ids` lineage) rather than editing in place.
#[derive(Debug, Clone)]
pub struct Individual<V: FitnessVector> {
    /// Process-unique, monotonically increasing id.
    pub id: u64,

    /// The assignment grid. Owned; copied on reproduction.
    pub chromosome: Chromosome,

    /// Oracle fitness. `None` only for never-evaluated placeholders.
    pub fitness: Option<V>,

    /// Generation this individual was produced in (0 = initial population).
    pub generation: u32,

    /// Ids of the two parents, when produced by reproduction.
    pub parent_ids: Option<[u64; 2]>,
}

impl<V: FitnessVector> Individual<V> {
    /// Builds a scored founding individual (generation 0, no parents).
    pub fn founder(chromosome: Chromosome, fitness: V) -> Self {
        Self {
            id: next_individual_id(),
            chromosome,
            fitness: Some(fitness),
            generation: 0,
            parent_ids: None,
        }
    }

    /// Builds a scored offspring with lineage.
    pub fn offspring(chromosome: Chromosome, fitness: V, generation: u32, parents: [u64; 2]) -> Self {
        Self {
            id: next_individual_id(),
            chromosome,
            fitness: Some(fitness),
            generation,
            parent_ids: Some(parents),
        }
    }

    /// Scalar ranking value; unevaluated individuals rank below everything.
    pub fn weighted_sum(&self) -> f64 {
        self.fitness
            .as_ref()
            .map(|f| f.weighted_sum())
            .unwrap_or(f64::NEG_INFINITY)
    }
}
