//! The generational control loop.
//!
//! 1. Build a random initial population and rank it (generation `0`).
//! 2. Select survivors, breed children through crossover, mutate them.
//! 3. Combine survivors and children into the next generation and rank it.
//! 4. Stop once a termination condition holds, otherwise GOTO 2.

use fnv::FnvHashSet;
use log::{info, trace, warn};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::fitness::{Environment, Measure};
use crate::ga::{self, Evaluator, Population};
use crate::gp::Tree;
use crate::operators::{self, crossover_trees, mutate_trees, selection};
use crate::report::{GenerationStats, Reporter};
use crate::settings::{Settings, MAX_POPULATION_SIZE};
use crate::training::TrainingSet;

/// How the next generation is assembled from survivors and children.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationPolicy {
    /// Survivors plus every child. The population may grow from one generation to the next.
    Append,
    /// The best survivor plus `population_size - 1` children.
    Replace,
}

/// The population from which crossover parents are drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverSource {
    /// The whole ranked population, before selection.
    Population,
    /// Only the survivors of selection.
    Survivors,
}

/// When a run stops short of the generation limit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Stop once the threshold is met or the time budget is exhausted.
    SolvedOrTimeout,
    /// Stop only once the threshold is met while the time budget still has headroom. A run that
    /// exhausts its budget continues until the generation limit.
    SolvedWithinBudget,
}

/// Why a run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    Solved,
    TimeBudgetExhausted,
    GenerationLimit,
}

/// The per-run bookkeeping owned by the controller.
#[derive(Clone, Debug)]
struct RunState {
    generation: u32,
    start: Instant,
    best_history: Vec<(Tree, f64)>,
    population_sizes: Vec<usize>,
}

/// The result of a completed run.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// The best individual of the final generation.
    pub best: Tree,
    pub best_fitness: f64,
    /// The number of generations produced after the initial population.
    pub generations: u32,
    pub elapsed: Duration,
    pub reason: StopReason,
    /// The best individual of each generation, starting with generation `0`.
    pub best_history: Vec<(Tree, f64)>,
    /// The population size of each generation, starting with generation `0`.
    pub population_sizes: Vec<usize>,
    /// The final ranked population.
    pub population: Population<Tree, f64>,
    /// The seed from which the run's randomness was derived.
    pub seed: u64,
}

/// Drives a single evolutionary run.
pub struct Evolution<'a, P> {
    settings: Settings,
    training: &'a TrainingSet,
    reporter: P,
    evaluator: Evaluator,
    rng: XorShiftRng,
    seed: u64,
    // Settings whose clamping has already been reported.
    clamped: FnvHashSet<&'static str>,
}

impl Default for PopulationPolicy {
    fn default() -> Self {
        PopulationPolicy::Append
    }
}

impl Default for CrossoverSource {
    fn default() -> Self {
        CrossoverSource::Population
    }
}

impl Default for Termination {
    fn default() -> Self {
        Termination::SolvedOrTimeout
    }
}

impl RunState {
    fn new(start: Instant) -> Self {
        RunState {
            generation: 0,
            start,
            best_history: vec![],
            population_sizes: vec![],
        }
    }

    fn record(&mut self, population: &[(Tree, f64)]) -> Result<()> {
        let best = ga::best(population).ok_or(Error::EmptyPopulation)?;
        self.best_history.push(best.clone());
        self.population_sizes.push(population.len());
        Ok(())
    }

    fn best_fitness(&self) -> f64 {
        self.best_history.last().map(|&(_, f)| f).unwrap_or(std::f64::INFINITY)
    }
}

impl<'a, P> Evolution<'a, P>
where
    P: Reporter,
{
    /// Prepare a run over the given training samples.
    ///
    /// Fails if the settings are invalid.
    pub fn new(settings: Settings, training: &'a TrainingSet, reporter: P) -> Result<Self> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        let rng = XorShiftRng::seed_from_u64(seed);
        let evaluator = match settings.threads {
            Some(n) => Evaluator::with_num_threads(n as u32),
            None => Evaluator::new(),
        };
        Ok(Evolution {
            settings,
            training,
            reporter,
            evaluator,
            rng,
            seed,
            clamped: FnvHashSet::default(),
        })
    }

    /// Run the evolution to completion.
    pub fn run(mut self) -> Result<Outcome> {
        if self.training.is_empty() {
            return Err(Error::EmptyTrainingData);
        }
        let measure = Measure {
            deviation: self.settings.deviation,
            aggregation: self.settings.aggregation,
        };
        let training = self.training;
        let env = Environment::new(training, measure);

        info!(
            "Evolving {} individuals over {} samples with {} fitness workers (seed {})",
            self.settings.population_size,
            training.len(),
            self.evaluator.num_threads(),
            self.seed,
        );

        let start = Instant::now();
        let initial = (0..self.settings.population_size)
            .map(|_| Tree::random(&mut self.rng, self.settings.max_depth))
            .collect::<Vec<_>>();
        let mut population = self.evaluator.evaluate(initial, &env)?;
        let mut state = RunState::new(start);
        state.record(&population)?;
        self.report(&state, &population);

        let reason = loop {
            if let Some(reason) = self.stop_reason(&state) {
                break reason;
            }
            population = self.step(&population, &env)?;
            state.generation += 1;
            state.record(&population)?;
            self.report(&state, &population);
        };

        let (best, best_fitness) = population[0].clone();
        let outcome = Outcome {
            best,
            best_fitness,
            generations: state.generation,
            elapsed: state.start.elapsed(),
            reason,
            best_history: state.best_history,
            population_sizes: state.population_sizes,
            population,
            seed: self.seed,
        };
        self.reporter.finish(&outcome);
        Ok(outcome)
    }

    fn report(&mut self, state: &RunState, population: &[(Tree, f64)]) {
        let stats = GenerationStats {
            generation: state.generation,
            elapsed: state.start.elapsed(),
            best: &population[0].0,
            best_fitness: population[0].1,
            population,
        };
        self.reporter.generation(&stats);
    }

    fn stop_reason(&self, state: &RunState) -> Option<StopReason> {
        let solved = state.best_fitness() <= self.settings.fitness_threshold;
        let elapsed = state.start.elapsed();
        let budget = Duration::from_millis(self.settings.max_execution_time_ms);
        let timed_out = elapsed > budget;
        trace!("Run duration {:?} of {:?} budget", elapsed, budget);

        let reason = match self.settings.termination {
            Termination::SolvedOrTimeout if solved => Some(StopReason::Solved),
            Termination::SolvedOrTimeout if timed_out => Some(StopReason::TimeBudgetExhausted),
            Termination::SolvedWithinBudget if solved && !timed_out => Some(StopReason::Solved),
            _ => None,
        };
        reason.or_else(|| {
            if state.generation >= self.settings.max_generations {
                Some(StopReason::GenerationLimit)
            } else {
                None
            }
        })
    }

    // Produce, evaluate and rank the next generation.
    fn step(&mut self, population: &[(Tree, f64)], env: &Environment) -> Result<Population<Tree, f64>> {
        let config = operators::Config::from(&self.settings);
        let len = population.len();
        let requested = self.settings.selection_size.resolve(len);
        let kept = requested.max(1).min(len);
        if kept != requested {
            self.warn_clamped("selection_size", requested, kept);
        }
        let survivors = selection(&mut self.rng, population, kept, &config);
        let parents = match self.settings.crossover_source {
            CrossoverSource::Population => population,
            CrossoverSource::Survivors => &survivors[..],
        };
        let child_count = match self.settings.population_policy {
            PopulationPolicy::Append => {
                let requested = self.settings.crossover_count.resolve(len);
                let room = MAX_POPULATION_SIZE.saturating_sub(survivors.len());
                if requested > room {
                    self.warn_clamped("crossover_count", requested, room);
                }
                requested.min(room)
            }
            PopulationPolicy::Replace => self.settings.population_size - 1,
        };
        let mut children = crossover_trees(&mut self.rng, parents, child_count, &config);
        mutate_trees(&mut self.rng, &mut children, &config);

        // Survivors keep the fitness they were ranked with; only children need scoring.
        let children = self.evaluator.evaluate(children, env)?;
        let mut next = match self.settings.population_policy {
            PopulationPolicy::Append => survivors,
            PopulationPolicy::Replace => survivors.into_iter().take(1).collect(),
        };
        next.extend(children);
        ga::rank(&mut next);
        Ok(next)
    }

    fn warn_clamped(&mut self, setting: &'static str, requested: usize, used: usize) {
        if self.clamped.insert(setting) {
            warn!("`{}` resolved to {} individuals, clamped to {}", setting, requested, used);
        }
    }
}
