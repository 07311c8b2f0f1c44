//! Symbolic regression through genetic programming.
//!
//! A population of arithmetic expression trees is evolved toward a target function sampled at a
//! range of inputs. Each generation the best trees survive, crossover and mutation breed new
//! trees, and the run stops once an expression is close enough to the samples or the time or
//! generation budget runs out.
//!
//! - `gp` holds the expression representation.
//! - `ga` evaluates and ranks whole generations in parallel.
//! - `fitness`, `operators` and `evolution` implement the evolutionary loop.
//! - `training`, `settings` and `report` are the loop's inputs and outputs.

pub mod error;
pub mod evolution;
pub mod fitness;
pub mod ga;
pub mod gp;
pub mod logging;
pub mod operators;
pub mod report;
pub mod settings;
pub mod training;

pub use error::{Error, Result};
pub use evolution::{Evolution, Outcome, StopReason};
pub use gp::Tree;
pub use settings::Settings;
pub use training::{Target, TrainingSample, TrainingSet};
