//! A module for abstracting common processes related to Genetic Algorithms.
//!
//! # Genetic Algorithms
//!
//! The genetic algorithm process can be described as follows:
//!
//! 1. Initialise a *Population* of *Individual*s.
//! 2. Evaluate the *Fitness* of each of the *Individual*s.
//! 3. Based on the *Fitness*, create a new generation via applying some genetic operators (e.g.
//!    Mutation, Crossover and Selection).
//! 4. If the terminal condition is met, we're done.
//! 5. GOTO 2.
//!
//! This module is responsible for step 2: evaluating a whole generation on a pool of worker
//! threads and ranking the result.

use scoped_threadpool::Pool as ThreadPool;
use std::cmp::Ordering;
use std::mem;
use std::sync::mpsc;

use crate::error::{Error, Result};

// Traits.

/// An **Individual** (sometimes referred to as "Phenotype") within a population.
///
/// `E` is the environment in which the individual's fitness is tested.
pub trait Individual<E>: Send + Sync {
    /// The measurement of fitness. Lower values are better.
    type Fitness: Fitness;
    /// Evaluate the fitness of the individual within the given environment.
    fn fitness(&self, environment: &E) -> Result<Self::Fitness>;
}

/// Types representing a measurement of fitness.
pub trait Fitness: Send + Sync + PartialOrd {}

/// A population alongside the fitness of each individual, best first.
pub type Population<I, F> = Vec<(I, F)>;

// Model.

/// Evaluates the fitness of entire generations in parallel.
pub struct Evaluator {
    thread_pool: ThreadPool,
}

// Impls.

impl Evaluator {
    /// An evaluator using one thread per CPU.
    pub fn new() -> Self {
        Self::with_num_threads(num_cpus::get() as _)
    }

    /// An evaluator using the given number of threads.
    pub fn with_num_threads(num_threads: u32) -> Self {
        let thread_pool = ThreadPool::new(num_threads.max(1));
        Evaluator { thread_pool }
    }

    pub fn num_threads(&self) -> u32 {
        self.thread_pool.thread_count()
    }

    /// Evaluate the fitness of every individual and rank them, best first.
    ///
    /// The order of the result does not depend on the order in which workers finish. If any
    /// evaluation fails, the error of the earliest failing individual is returned.
    pub fn evaluate<I, E, Is>(&mut self, individuals: Is, environment: &E) -> Result<Population<I, I::Fitness>>
    where
        I: Individual<E>,
        E: Sync,
        Is: IntoIterator<Item = I>,
    {
        let (tx, rx) = mpsc::channel();
        let mut count = 0;
        self.thread_pool.scoped(|scoped| {
            for (index, indv) in individuals.into_iter().enumerate() {
                count += 1;
                let tx = tx.clone();
                scoped.execute(move || {
                    let fit = indv.fitness(environment);
                    // The receiver outlives the scope, so this can not fail.
                    let _ = tx.send((index, indv, fit));
                });
            }
        });
        mem::drop(tx);
        let mut evaluated = rx.iter().collect::<Vec<_>>();
        if evaluated.len() != count {
            return Err(Error::WorkerPanicked);
        }

        // Restore submission order so that ranking is reproducible.
        evaluated.sort_by_key(|&(index, _, _)| index);
        let mut population = Vec::with_capacity(evaluated.len());
        for (_, indv, fit) in evaluated {
            population.push((indv, fit?));
        }
        rank(&mut population);
        Ok(population)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort the population by fitness, best (lowest) first.
///
/// The sort is stable so that ties keep their relative order.
pub fn rank<I, F>(population: &mut Population<I, F>)
where
    F: PartialOrd,
{
    population.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
}

/// The individual with the best fitness within a ranked population.
pub fn best<I, F>(population: &[(I, F)]) -> Option<&(I, F)> {
    population.first()
}

// Fitness

impl<T> Fitness for T where T: Send + Sync + PartialOrd {}

#[cfg(test)]
mod tests {
    use super::*;

    // The fitness of a number is its distance from the target.
    #[derive(Debug, PartialEq)]
    struct Guess(i64);

    impl Individual<i64> for Guess {
        type Fitness = u64;
        fn fitness(&self, target: &i64) -> Result<u64> {
            if self.0 < 0 {
                return Err(Error::Config(format!("negative guess {}", self.0)));
            }
            Ok((self.0 - *target).abs() as u64)
        }
    }

    #[test]
    fn ranks_best_first_and_stably() {
        let mut evaluator = Evaluator::with_num_threads(4);
        let guesses = vec![Guess(1), Guess(9), Guess(5), Guess(3), Guess(7), Guess(5)];
        let population = evaluator.evaluate(guesses, &5i64).unwrap();
        let order = population.iter().map(|&(ref g, _)| g.0).collect::<Vec<_>>();
        assert_eq!(order, vec![5, 5, 3, 7, 1, 9]);
        assert_eq!(best(&population), Some(&(Guess(5), 0)));
    }

    #[test]
    fn reports_the_earliest_failure() {
        let mut evaluator = Evaluator::with_num_threads(3);
        let guesses = vec![Guess(1), Guess(-2), Guess(-3)];
        match evaluator.evaluate(guesses, &0i64) {
            Err(Error::Config(msg)) => assert_eq!(msg, "negative guess -2"),
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn empty_generation_evaluates_to_empty_population() {
        let mut evaluator = Evaluator::with_num_threads(2);
        let population = evaluator.evaluate(Vec::<Guess>::new(), &0i64).unwrap();
        assert!(population.is_empty());
        assert!(best(&population).is_none());
    }
}
