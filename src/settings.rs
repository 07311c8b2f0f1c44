//! The tunable parameters of a run.
//!
//! Settings are read once from a TOML file before the first generation. Every field has a
//! default, so a file only needs to name the values it changes:
//!
//! ```toml
//! population_size = 200
//! max_generations = 100
//! fitness_threshold = 0.0
//! max_execution_time_ms = 30000
//! selection_size = 0.5      # a fraction of the current population
//! crossover_count = 100     # or an absolute number of children
//! target = "cubic"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::evolution::{CrossoverSource, PopulationPolicy, Termination};
use crate::fitness::{Aggregation, Deviation};
use crate::operators::SelectionPolicy;
use crate::training::Target;

/// The largest population a run may hold, and the largest absolute count.
pub const MAX_POPULATION_SIZE: usize = 100_000;
/// The largest relative count.
pub const MAX_COUNT_FRACTION: f64 = 10.0;
/// The deepest tree a run may generate. A full binary tree of this depth has `2^16 - 1` nodes.
pub const MAX_TREE_DEPTH: u32 = 16;

/// A number of individuals, either absolute or relative to the current population's size.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Absolute(usize),
    Fraction(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The number of individuals within the initial population.
    pub population_size: usize,
    /// The generation counter value at which the run stops.
    pub max_generations: u32,
    /// A best fitness at or below this value counts as a solution.
    pub fitness_threshold: f64,
    /// The wall-clock budget of the run.
    pub max_execution_time_ms: u64,
    /// Log the time-budget checks and dump every population.
    pub trace: bool,
    /// The maximum number of levels of any tree.
    pub max_depth: u32,
    /// The probability with which each child is mutated.
    pub mutation_probability: f64,
    /// The number of survivors carried forward unmodified.
    pub selection_size: Count,
    /// The number of children produced by crossover each generation.
    pub crossover_count: Count,
    pub selection: SelectionPolicy,
    /// The number of contestants within each tournament.
    pub tournament_size: usize,
    pub population_policy: PopulationPolicy,
    pub crossover_source: CrossoverSource,
    pub termination: Termination,
    pub deviation: Deviation,
    pub aggregation: Aggregation,
    /// Training inputs range over `0..=max_input`.
    pub max_input: u32,
    pub target: Target,
    /// Seeds the run's random number generator. A random seed is used when absent.
    pub seed: Option<u64>,
    /// The number of fitness workers. Defaults to the number of CPUs.
    pub threads: Option<usize>,
}

impl Count {
    /// The number of individuals this count represents within a population of `len`.
    pub fn resolve(&self, len: usize) -> usize {
        match *self {
            Count::Absolute(n) => n,
            Count::Fraction(f) => (len as f64 * f).round() as usize,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match *self {
            Count::Absolute(n) if n > MAX_POPULATION_SIZE => Err(Error::Config(format!(
                "`{}` must be at most {}, got {}",
                name, MAX_POPULATION_SIZE, n
            ))),
            Count::Fraction(f) if !f.is_finite() || f < 0.0 || f > MAX_COUNT_FRACTION => {
                Err(Error::Config(format!(
                    "`{}` must be a fraction within [0, {}], got {}",
                    name, MAX_COUNT_FRACTION, f
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            population_size: 50,
            max_generations: 50,
            fitness_threshold: 0.0,
            max_execution_time_ms: 60_000,
            trace: false,
            max_depth: 6,
            mutation_probability: 0.1,
            selection_size: Count::Fraction(0.5),
            crossover_count: Count::Fraction(0.5),
            selection: SelectionPolicy::default(),
            tournament_size: 3,
            population_policy: PopulationPolicy::default(),
            crossover_source: CrossoverSource::default(),
            termination: Termination::default(),
            deviation: Deviation::default(),
            aggregation: Aggregation::default(),
            max_input: 10,
            target: Target::default(),
            seed: None,
            threads: None,
        }
    }
}

impl Settings {
    /// Read and validate settings from the TOML file at `path`.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every tunable lies within its valid range.
    pub fn validate(&self) -> Result<()> {
        fn at_least_one(name: &str, value: u64) -> Result<()> {
            if value < 1 {
                return Err(Error::Config(format!("`{}` must be at least 1", name)));
            }
            Ok(())
        }

        at_least_one("population_size", self.population_size as u64)?;
        at_least_one("max_generations", u64::from(self.max_generations))?;
        at_least_one("max_depth", u64::from(self.max_depth))?;
        at_least_one("tournament_size", self.tournament_size as u64)?;
        if self.population_size > MAX_POPULATION_SIZE {
            return Err(Error::Config(format!(
                "`population_size` must be at most {}, got {}",
                MAX_POPULATION_SIZE, self.population_size
            )));
        }
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(Error::Config(format!(
                "`max_depth` must be at most {}, got {}",
                MAX_TREE_DEPTH, self.max_depth
            )));
        }
        if let Some(threads) = self.threads {
            at_least_one("threads", threads as u64)?;
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(Error::Config(format!(
                "`mutation_probability` must lie within [0, 1], got {}",
                self.mutation_probability
            )));
        }
        if self.fitness_threshold.is_nan() {
            return Err(Error::Config("`fitness_threshold` must be a number".into()));
        }
        self.selection_size.validate("selection_size")?;
        self.crossover_count.validate("crossover_count")?;
        Ok(())
    }
}
