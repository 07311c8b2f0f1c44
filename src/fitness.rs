//! Scoring expression trees against training samples.
//!
//! Fitness is an error measure: lower is better and `0` is a perfect fit.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ga;
use crate::gp::Tree;
use crate::training::{TrainingSample, TrainingSet};

/// How the deviation of a single sample is measured.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    Absolute,
    Squared,
}

/// How per-sample deviations are combined into a single score.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

/// The complete description of how fitness is measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    pub deviation: Deviation,
    pub aggregation: Aggregation,
}

/// The environment in which a tree's fitness is tested.
#[derive(Copy, Clone, Debug)]
pub struct Environment<'a> {
    pub samples: &'a [TrainingSample],
    pub measure: Measure,
}

impl Default for Deviation {
    fn default() -> Self {
        Deviation::Absolute
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

impl Deviation {
    fn apply(&self, expected: f64, actual: f64) -> f64 {
        let diff = expected - actual;
        match *self {
            Deviation::Absolute => diff.abs(),
            Deviation::Squared => diff * diff,
        }
    }
}

impl<'a> Environment<'a> {
    pub fn new(training: &'a TrainingSet, measure: Measure) -> Self {
        Environment { samples: training.samples(), measure }
    }
}

/// Score `tree` using the sum of absolute deviations.
pub fn evaluate_fitness(samples: &[TrainingSample], tree: &Tree) -> Result<f64> {
    evaluate_fitness_with(samples, tree, Measure::default())
}

/// Score `tree` over every sample in order using the given measure.
///
/// Fails if there are no samples or if the score overflows to a non-finite value.
pub fn evaluate_fitness_with(
    samples: &[TrainingSample],
    tree: &Tree,
    measure: Measure,
) -> Result<f64> {
    if samples.is_empty() {
        return Err(Error::EmptyTrainingData);
    }
    let total = samples
        .iter()
        .map(|s| measure.deviation.apply(s.expected_output, tree.evaluate(s.input)))
        .fold(0.0, |acc, d| acc + d);
    let fitness = match measure.aggregation {
        Aggregation::Sum => total,
        Aggregation::Mean => total / samples.len() as f64,
    };
    if !fitness.is_finite() {
        return Err(Error::NonFiniteFitness { fitness });
    }
    Ok(fitness)
}

impl<'a> ga::Individual<Environment<'a>> for Tree {
    type Fitness = f64;
    fn fitness(&self, env: &Environment<'a>) -> Result<f64> {
        evaluate_fitness_with(env.samples, self, env.measure)
    }
}
