//! Genetic operators: selection, crossover and mutation.
//!
//! All operators expect populations that have already been ranked best first, so a lower index
//! always means a better (or equally good) individual.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::gp::Tree;
use crate::settings::Settings;

/// How survivors are chosen from a ranked population.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep the best individuals.
    Truncation,
    /// Keep the best individual, then fill the remaining places with tournament winners. The
    /// same individual may win more than once.
    Tournament,
}

/// The parameters shared by the genetic operators.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub selection: SelectionPolicy,
    pub tournament_size: usize,
    pub max_depth: u32,
    pub mutation_probability: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Truncation
    }
}

impl<'a> From<&'a Settings> for Config {
    fn from(settings: &'a Settings) -> Self {
        Config {
            selection: settings.selection,
            tournament_size: settings.tournament_size,
            max_depth: settings.max_depth,
            mutation_probability: settings.mutation_probability,
        }
    }
}

/// Choose the index of a tournament winner within a ranked population of `len` individuals.
///
/// As the population is ranked, the winner is simply the contestant with the lowest index.
pub fn tournament<R>(rng: &mut R, len: usize, size: usize) -> usize
where
    R: Rng,
{
    (0..size.max(1)).map(|_| rng.gen_range(0..len)).min().unwrap_or(0)
}

/// Choose `count` survivors to carry into the next generation unmodified.
///
/// `count` is clamped to `1..=population.len()`, so the result is only empty when the population
/// is. The best individual always survives.
pub fn selection<R, I, F>(
    rng: &mut R,
    population: &[(I, F)],
    count: usize,
    config: &Config,
) -> Vec<(I, F)>
where
    R: Rng,
    I: Clone,
    F: Clone,
{
    if population.is_empty() {
        return Vec::new();
    }
    let count = count.max(1).min(population.len());
    match config.selection {
        SelectionPolicy::Truncation => population[..count].to_vec(),
        SelectionPolicy::Tournament => {
            let mut survivors = Vec::with_capacity(count);
            survivors.push(population[0].clone());
            while survivors.len() < count {
                let winner = tournament(rng, population.len(), config.tournament_size);
                survivors.push(population[winner].clone());
            }
            survivors
        }
    }
}

/// Swap a random subtree of `a` with a random subtree of `b`, producing two new children.
///
/// The parents are left untouched. Children deeper than `max_depth` are trimmed, replacing the
/// functions on their final level with random terminals.
pub fn crossover<R>(rng: &mut R, a: &Tree, b: &Tree, max_depth: u32) -> (Tree, Tree)
where
    R: Rng,
{
    let a_point = a.random_node(rng);
    let b_point = b.random_node(rng);
    let a_sub = a.subtree(a_point);
    let b_sub = b.subtree(b_point);
    let mut c = a.replace_subtree(a_point, &b_sub);
    let mut d = b.replace_subtree(b_point, &a_sub);
    c.trim_to_depth(rng, max_depth);
    d.trim_to_depth(rng, max_depth);
    (c, d)
}

/// Produce `count` children by crossing over pairs of tournament-selected parents.
///
/// A single parent is paired with itself. No children are produced from an empty population.
pub fn crossover_trees<R>(
    rng: &mut R,
    parents: &[(Tree, f64)],
    count: usize,
    config: &Config,
) -> Vec<Tree>
where
    R: Rng,
{
    let mut children = Vec::new();
    if parents.is_empty() {
        return children;
    }
    while children.len() < count {
        let a = &parents[tournament(rng, parents.len(), config.tournament_size)].0;
        let b = &parents[tournament(rng, parents.len(), config.tournament_size)].0;
        let (c, d) = crossover(rng, a, b, config.max_depth);
        children.push(c);
        if children.len() < count {
            children.push(d);
        }
    }
    children
}

/// Replace a random subtree of `tree` with a freshly generated one.
///
/// The new subtree is generated with whatever depth remains below the chosen node, so the
/// result never exceeds `max_depth`.
pub fn mutate<R>(rng: &mut R, tree: &Tree, max_depth: u32) -> Tree
where
    R: Rng,
{
    let point = tree.random_node(rng);
    let budget = max_depth.saturating_sub(tree.node_depth(point)) + 1;
    let fresh = Tree::random(rng, budget);
    let mut mutated = tree.replace_subtree(point, &fresh);
    mutated.trim_to_depth(rng, max_depth);
    mutated
}

/// Mutate each child in place with probability `config.mutation_probability`.
pub fn mutate_trees<R>(rng: &mut R, children: &mut [Tree], config: &Config)
where
    R: Rng,
{
    for child in children.iter_mut() {
        if rng.gen_bool(config.mutation_probability) {
            *child = mutate(rng, child, config.max_depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::evaluate_fitness;
    use crate::training::{Target, TrainingSet};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn config() -> Config {
        Config {
            selection: SelectionPolicy::Truncation,
            tournament_size: 3,
            max_depth: 5,
            mutation_probability: 0.5,
        }
    }

    fn ranked_population(rng: &mut XorShiftRng, size: usize) -> Vec<(Tree, f64)> {
        let training = TrainingSet::generate(Target::Quadratic, 10);
        let mut population = (0..size)
            .map(|_| {
                let tree = Tree::random(rng, config().max_depth);
                let fitness = evaluate_fitness(training.samples(), &tree).unwrap();
                (tree, fitness)
            })
            .collect::<Vec<_>>();
        crate::ga::rank(&mut population);
        population
    }

    fn render(population: &[(Tree, f64)]) -> Vec<String> {
        population.iter().map(|&(ref t, f)| format!("{} {}", t, f)).collect()
    }

    #[test]
    fn truncation_keeps_the_best() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        let population = ranked_population(&mut rng, 10);
        let survivors = selection(&mut rng, &population, 4, &config());
        assert_eq!(render(&survivors), render(&population[..4]));
        assert_eq!(selection(&mut rng, &population, 0, &config()).len(), 1);
        assert_eq!(selection(&mut rng, &population, 50, &config()).len(), 10);
    }

    #[test]
    fn tournament_keeps_the_elite() {
        let mut rng = XorShiftRng::seed_from_u64(4);
        let population = ranked_population(&mut rng, 10);
        let config = Config { selection: SelectionPolicy::Tournament, ..config() };
        let survivors = selection(&mut rng, &population, 6, &config);
        assert_eq!(survivors.len(), 6);
        assert_eq!(render(&survivors[..1]), render(&population[..1]));
        let all = render(&population);
        for s in render(&survivors) {
            assert!(all.contains(&s));
        }
    }

    #[test]
    fn empty_population_selects_and_breeds_nothing() {
        let mut rng = XorShiftRng::seed_from_u64(5);
        let empty: Vec<(Tree, f64)> = Vec::new();
        assert!(selection(&mut rng, &empty, 3, &config()).is_empty());
        assert!(crossover_trees(&mut rng, &empty, 3, &config()).is_empty());
        // Nothing is reserved up front for an unreachable count.
        assert!(crossover_trees(&mut rng, &empty, usize::max_value(), &config()).is_empty());
    }

    #[test]
    fn single_individual_population() {
        let mut rng = XorShiftRng::seed_from_u64(6);
        let population = ranked_population(&mut rng, 1);
        let survivors = selection(&mut rng, &population, 1, &config());
        assert_eq!(survivors.len(), 1);
        let mut children = crossover_trees(&mut rng, &population, 1, &config());
        assert_eq!(children.len(), 1);
        mutate_trees(&mut rng, &mut children, &Config { mutation_probability: 1.0, ..config() });
        assert_eq!(children.len(), 1);
        assert!(children[0].depth() <= config().max_depth);
    }

    #[test]
    fn crossover_leaves_parents_untouched() {
        let mut rng = XorShiftRng::seed_from_u64(8);
        let population = ranked_population(&mut rng, 2);
        let before = render(&population);
        let _ = crossover(&mut rng, &population[0].0, &population[1].0, 5);
        assert_eq!(render(&population), before);
    }

    #[test]
    fn zero_mutation_probability_changes_nothing() {
        let mut rng = XorShiftRng::seed_from_u64(9);
        let population = ranked_population(&mut rng, 8);
        let mut children = population.iter().map(|&(ref t, _)| t.clone()).collect::<Vec<_>>();
        let before = children.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        mutate_trees(&mut rng, &mut children, &Config { mutation_probability: 0.0, ..config() });
        let after = children.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    proptest! {
        #[test]
        fn selection_is_a_nonempty_subset(seed in any::<u64>(), size in 1usize..30, count in 0usize..40) {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let population = ranked_population(&mut rng, size);
            let all = render(&population);
            for policy in &[SelectionPolicy::Truncation, SelectionPolicy::Tournament] {
                let config = Config { selection: *policy, ..config() };
                let survivors = selection(&mut rng, &population, count, &config);
                prop_assert!(!survivors.is_empty());
                prop_assert!(survivors.len() <= size);
                for s in render(&survivors) {
                    prop_assert!(all.contains(&s));
                }
            }
        }

        #[test]
        fn crossover_yields_requested_children_within_depth(seed in any::<u64>(), half in 1usize..15) {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let size = half * 2;
            let population = ranked_population(&mut rng, size);
            let children = crossover_trees(&mut rng, &population, size, &config());
            prop_assert_eq!(children.len(), size);
            for child in &children {
                prop_assert!(child.depth() <= config().max_depth);
            }
        }

        #[test]
        fn mutation_respects_max_depth(seed in any::<u64>(), max_depth in 1u32..7) {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let tree = Tree::random(&mut rng, max_depth);
            let mutated = mutate(&mut rng, &tree, max_depth);
            prop_assert!(mutated.depth() <= max_depth);
            for x in 0..=10 {
                prop_assert!(mutated.evaluate(f64::from(x)).is_finite());
            }
        }
    }
}
