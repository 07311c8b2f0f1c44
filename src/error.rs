//! Error types used throughout the crate.

use thiserror::Error;

/// Everything that may abort a run.
#[derive(Debug, Error)]
pub enum Error {
    /// A tunable was given a value outside of its valid range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing training samples failed.
    #[error("training data error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to start logging backend: {0}")]
    Logger(String),

    /// Fitness over zero samples is undefined.
    #[error("cannot evaluate fitness without training data")]
    EmptyTrainingData,

    /// A population must contain at least one individual to be ranked.
    #[error("population is empty")]
    EmptyPopulation,

    /// The aggregated error of an expression overflowed.
    #[error("fitness evaluated to a non-finite value ({fitness})")]
    NonFiniteFitness { fitness: f64 },

    /// A fitness worker exited before reporting its result.
    #[error("a fitness evaluation worker panicked")]
    WorkerPanicked,
}

/// Shorthand for results carrying the crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;
