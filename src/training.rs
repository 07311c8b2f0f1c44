//! Training samples drawn from a reference target function.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// One input paired with the value the evolved expression should produce for it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub input: f64,
    pub expected_output: f64,
}

/// The reference functions that training samples may be drawn from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// `f(x) = x`
    Identity,
    /// `f(x) = x^2 + x + 1`
    Quadratic,
    /// `f(x) = x^3 - 2x`
    Cubic,
}

/// The immutable, ordered set of samples shared by every fitness evaluation of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingSet {
    samples: Vec<TrainingSample>,
}

impl Default for Target {
    fn default() -> Self {
        Target::Quadratic
    }
}

impl Target {
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Target::Identity => x,
            Target::Quadratic => x * x + x + 1.0,
            Target::Cubic => x * x * x - 2.0 * x,
        }
    }
}

impl TrainingSet {
    /// Sample `target` at every integer input within `0..=max_input`.
    pub fn generate(target: Target, max_input: u32) -> Self {
        let samples = (0..=max_input)
            .map(|x| {
                let input = f64::from(x);
                TrainingSample { input, expected_output: target.apply(input) }
            })
            .collect();
        TrainingSet { samples }
    }

    /// Load samples previously written with `save`.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut reader = csv::Reader::from_path(path)?;
        let samples = reader
            .deserialize()
            .collect::<std::result::Result<Vec<TrainingSample>, _>>()?;
        Ok(TrainingSet { samples })
    }

    /// Write the samples as CSV with an `input,expected_output` header.
    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let mut writer = csv::Writer::from_path(path)?;
        for sample in &self.samples {
            writer.serialize(sample)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<TrainingSample>> for TrainingSet {
    fn from(samples: Vec<TrainingSample>) -> Self {
        TrainingSet { samples }
    }
}
