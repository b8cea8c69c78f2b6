//! Ring migration between islands.
//!
//! Every `migration_interval` generations, each island's champions are
//! copied to the next island in a one-directional ring, replacing its worst
//! individuals. Champions are collected from all islands *before* any
//! replacement, so an exchange never forwards freshly arrived migrants, and
//! worst-replacement means no island ever loses its own best.

use crate::chromosome::Individual;
use crate::context::FitnessVector;
use crate::hybrid::island::Island;

/// Copies each island's top `migration_size` individuals over the worst of
/// island `(i+1) mod n` — equivalently, island `i` receives from `(i-1) mod n`.
///
/// Population sizes are unchanged; at most `migration_size` individuals per
/// island differ afterwards. A single island or a zero size is a no-op.
pub fn migrate_ring<V: FitnessVector>(islands: &mut [Island<V>], migration_size: usize) {
    let n = islands.len();
    if n < 2 || migration_size == 0 {
        return;
    }

    // Snapshot champions first; migration must not chain within one exchange.
    let champions: Vec<Vec<Individual<V>>> = islands
        .iter()
        .map(|island| {
            let mut ranked: Vec<Individual<V>> = island.population().to_vec();
            ranked.sort_by(|a, b| {
                b.weighted_sum()
                    .partial_cmp(&a.weighted_sum())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            ranked.truncate(migration_size);
            ranked
        })
        .collect();

    for (i, island) in islands.iter_mut().enumerate() {
        let source = (i + n - 1) % n;
        island.sort_descending();

        let population = island.population_mut();
        let len = population.len();
        for (offset, migrant) in champions[source].iter().enumerate() {
            if offset >= len {
                break;
            }
            population[len - 1 - offset] = migrant.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::Chromosome;
    use crate::decomposition::DecompositionStrategy;

    fn island_with_fitnesses(seed: u64, fitnesses: &[f64]) -> Island<f64> {
        let mut island = Island::new(DecompositionStrategy::ByPerson, 2, 2, seed);
        *island.population_mut() = fitnesses
            .iter()
            .map(|&f| Individual::founder(Chromosome::zeros(2, 2), f))
            .collect();
        island
    }

    #[test]
    fn test_ring_replaces_worst_with_upstream_champions() {
        let mut islands = vec![
            island_with_fitnesses(1, &[10.0, 8.0, 1.0]),
            island_with_fitnesses(2, &[5.0, 4.0, 2.0]),
        ];

        migrate_ring(&mut islands, 1);

        // Island 1 received island 0's champion (10.0) over its worst (2.0).
        let fitness_1: Vec<f64> = islands[1].population().iter().map(|i| i.weighted_sum()).collect();
        assert!(fitness_1.contains(&10.0));
        assert!(!fitness_1.contains(&2.0));

        // Island 0 received island 1's champion (5.0) over its worst (1.0).
        let fitness_0: Vec<f64> = islands[0].population().iter().map(|i| i.weighted_sum()).collect();
        assert!(fitness_0.contains(&5.0));
        assert!(!fitness_0.contains(&1.0));
    }

    #[test]
    fn test_population_sizes_unchanged() {
        let mut islands = vec![
            island_with_fitnesses(1, &[3.0, 2.0, 1.0]),
            island_with_fitnesses(2, &[6.0, 5.0, 4.0]),
            island_with_fitnesses(3, &[9.0, 8.0, 7.0]),
        ];

        migrate_ring(&mut islands, 2);

        for island in &islands {
            assert_eq!(island.population().len(), 3);
        }
    }

    #[test]
    fn test_at_most_migration_size_differ() {
        let mut islands = vec![
            island_with_fitnesses(1, &[10.0, 9.0, 8.0, 7.0]),
            island_with_fitnesses(2, &[4.0, 3.0, 2.0, 1.0]),
        ];
        let before: Vec<u64> = islands[1].population().iter().map(|i| i.id).collect();

        migrate_ring(&mut islands, 2);

        let after: Vec<u64> = islands[1].population().iter().map(|i| i.id).collect();
        let changed = after.iter().filter(|id| !before.contains(id)).count();
        assert!(changed <= 2, "at most migration_size individuals may change");
    }

    #[test]
    fn test_no_island_loses_its_best() {
        let mut islands = vec![
            island_with_fitnesses(1, &[10.0, 1.0]),
            island_with_fitnesses(2, &[20.0, 2.0]),
            island_with_fitnesses(3, &[30.0, 3.0]),
        ];

        migrate_ring(&mut islands, 1);

        assert_eq!(islands[0].best().unwrap().weighted_sum(), 30.0);
        assert_eq!(islands[1].best().unwrap().weighted_sum(), 20.0);
        assert_eq!(islands[2].best().unwrap().weighted_sum(), 30.0);
    }

    #[test]
    fn test_single_island_is_noop() {
        let mut islands = vec![island_with_fitnesses(1, &[2.0, 1.0])];
        let before: Vec<u64> = islands[0].population().iter().map(|i| i.id).collect();

        migrate_ring(&mut islands, 1);

        let after: Vec<u64> = islands[0].population().iter().map(|i| i.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_ring_direction_is_one_way() {
        // With three islands, island 2's champion lands on island 0 only.
        let mut islands = vec![
            island_with_fitnesses(1, &[1.0, 0.5]),
            island_with_fitnesses(2, &[2.0, 0.5]),
            island_with_fitnesses(3, &[99.0, 0.5]),
        ];

        migrate_ring(&mut islands, 1);

        let has_99 = |island: &Island<f64>| {
            island
                .population()
                .iter()
                .any(|i| (i.weighted_sum() - 99.0).abs() < 1e-15)
        };
        assert!(has_99(&islands[0]), "island 0 receives from island 2");
        assert!(!has_99(&islands[1]), "island 1 must not receive island 2's champion");
    }
}
