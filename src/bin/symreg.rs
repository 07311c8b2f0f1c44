//! Evolves an expression fitting the configured target function.
//!
//! 1. What is the "Terminal Set"?
//!
//! - The input `x` and integer constants.
//!
//! 2. What is the "Function Set"?
//!
//! - `+` `-` `*` and protected `/`.
//!
//! 3. What is the "Fitness Measure"?
//!
//! - The summed (or mean) absolute (or squared) error over the training samples.
//!
//! 4. What is the "Termination Criterion"?
//!
//! - A fitness at or below the threshold, the time budget OR the generation limit.

use log::info;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;
use symreg::report::LogReporter;
use symreg::{logging, Evolution, Result, Settings, TrainingSet};

#[derive(StructOpt, Debug)]
#[structopt(name = "symreg", about = "Symbolic regression through genetic programming")]
struct Cli {
    #[structopt(long = "config", parse(from_os_str), help = "TOML settings file")]
    config_path: Option<PathBuf>,
    #[structopt(long, help = "Seed for the random number generator, overriding the settings")]
    seed: Option<u64>,
    #[structopt(
        long = "training-data",
        parse(from_os_str),
        help = "Read training samples from a CSV file instead of generating them"
    )]
    training_data: Option<PathBuf>,
    #[structopt(
        long = "save-training-data",
        parse(from_os_str),
        help = "Write the training samples used by the run to a CSV file"
    )]
    save_training_data: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match cli.config_path {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    logging::init_logging(settings.trace)?;

    let training = match cli.training_data {
        Some(ref path) => {
            info!("Loading training data from {:?}", path);
            TrainingSet::load(path)?
        }
        None => {
            info!("Sampling {:?} over 0..={}", settings.target, settings.max_input);
            TrainingSet::generate(settings.target, settings.max_input)
        }
    };
    if let Some(ref path) = cli.save_training_data {
        training.save(path)?;
        info!("Wrote {} training samples to {:?}", training.len(), path);
    }

    let reporter = LogReporter::new(settings.trace);
    let outcome = Evolution::new(settings, &training, reporter)?.run()?;
    println!("{}", outcome.best);
    Ok(())
}

fn main() {
    let cli = Cli::from_args();
    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
