//! Reporting the progress and result of a run.

use log::{debug, info};
use std::time::Duration;

use crate::evolution::Outcome;
use crate::gp::Tree;

/// A snapshot of a freshly ranked generation.
#[derive(Copy, Clone, Debug)]
pub struct GenerationStats<'a> {
    pub generation: u32,
    /// Time since the run started.
    pub elapsed: Duration,
    pub best: &'a Tree,
    pub best_fitness: f64,
    /// The ranked population, best first.
    pub population: &'a [(Tree, f64)],
}

/// Receives statistics as a run progresses.
pub trait Reporter {
    /// Called once for each generation, including the initial population.
    fn generation(&mut self, stats: &GenerationStats);
    /// Called once when the run stops.
    fn finish(&mut self, outcome: &Outcome);
}

/// Reports through the `log` facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogReporter {
    /// Also dump every individual of every generation.
    pub trace: bool,
}

/// Discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullReporter;

impl<'a> GenerationStats<'a> {
    pub fn population_size(&self) -> usize {
        self.population.len()
    }

    /// The mean fitness across the population.
    pub fn mean_fitness(&self) -> f64 {
        let sum: f64 = self.population.iter().map(|&(_, f)| f).sum();
        sum / self.population.len().max(1) as f64
    }
}

impl LogReporter {
    pub fn new(trace: bool) -> Self {
        LogReporter { trace }
    }
}

impl Reporter for LogReporter {
    fn generation(&mut self, stats: &GenerationStats) {
        info!(
            "Generation {}: Best: {}, Average: {}, Size: {}, Elapsed: {:?}",
            stats.generation,
            stats.best_fitness,
            stats.mean_fitness(),
            stats.population_size(),
            stats.elapsed,
        );
        debug!("Best expression: {}", stats.best);
        if self.trace {
            for (rank, &(ref tree, fitness)) in stats.population.iter().enumerate() {
                debug!("  {:>4} {:>16} {}", rank, fitness, tree);
            }
        }
    }

    fn finish(&mut self, outcome: &Outcome) {
        info!(
            "Finished after {} generations ({:?}), stopped by {:?}",
            outcome.generations, outcome.elapsed, outcome.reason,
        );
        if self.trace {
            for (rank, &(ref tree, fitness)) in outcome.population.iter().enumerate() {
                debug!("  {:>4} {:>16} {}", rank, fitness, tree);
            }
        }
        info!("Best expression ({}): {}", outcome.best_fitness, outcome.best);
    }
}

impl Reporter for NullReporter {
    fn generation(&mut self, _stats: &GenerationStats) {}
    fn finish(&mut self, _outcome: &Outcome) {}
}

impl<'a, R> Reporter for &'a mut R
where
    R: Reporter,
{
    fn generation(&mut self, stats: &GenerationStats) {
        (**self).generation(stats)
    }

    fn finish(&mut self, outcome: &Outcome) {
        (**self).finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_fitness_of_population() {
        let population = vec![(Tree::input(), 1.0), (Tree::constant(2.0), 3.0)];
        let stats = GenerationStats {
            generation: 0,
            elapsed: Duration::from_millis(1),
            best: &population[0].0,
            best_fitness: population[0].1,
            population: &population,
        };
        assert_eq!(stats.population_size(), 2);
        assert_eq!(stats.mean_fitness(), 2.0);
    }
}
