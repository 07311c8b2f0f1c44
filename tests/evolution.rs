use symreg::evolution::Termination;
use symreg::fitness::evaluate_fitness;
use symreg::gp::Tree;
use symreg::logging::init_test_logging;
use symreg::report::{GenerationStats, Reporter};
use symreg::{Evolution, Outcome, Settings, StopReason, Target, TrainingSet};

/// Remembers everything it is told.
#[derive(Default)]
struct Recorder {
    generations: Vec<(u32, f64, usize)>,
    finished: Option<(u32, f64)>,
}

impl Reporter for Recorder {
    fn generation(&mut self, stats: &GenerationStats) {
        self.generations.push((stats.generation, stats.best_fitness, stats.population_size()));
    }

    fn finish(&mut self, outcome: &Outcome) {
        self.finished = Some((outcome.generations, outcome.best_fitness));
    }
}

fn identity_settings(seed: u64) -> Settings {
    Settings {
        population_size: 50,
        max_generations: 20,
        fitness_threshold: 0.0,
        max_execution_time_ms: u64::max_value(),
        target: Target::Identity,
        max_input: 10,
        seed: Some(seed),
        ..Settings::default()
    }
}

#[test]
fn best_fitness_never_gets_worse() {
    init_test_logging();
    let training = TrainingSet::generate(Target::Identity, 10);
    for seed in 0..4 {
        let outcome = Evolution::new(identity_settings(seed), &training, symreg::report::NullReporter)
            .unwrap()
            .run()
            .unwrap();
        assert!(outcome.generations <= 20);
        assert!(outcome.reason == StopReason::Solved || outcome.reason == StopReason::GenerationLimit);
        let history = outcome.best_history.iter().map(|&(_, f)| f).collect::<Vec<_>>();
        assert_eq!(history.len() as u32, outcome.generations + 1);
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0], "best fitness got worse: {:?}", history);
        }
        assert_eq!(outcome.best_fitness, *history.last().unwrap());
        if outcome.reason == StopReason::Solved {
            assert_eq!(outcome.best_fitness, 0.0);
        }
    }
}

#[test]
fn reported_best_matches_recomputed_fitness() {
    init_test_logging();
    let training = TrainingSet::generate(Target::Quadratic, 10);
    let settings = Settings { target: Target::Quadratic, ..identity_settings(21) };
    let outcome = Evolution::new(settings, &training, symreg::report::NullReporter)
        .unwrap()
        .run()
        .unwrap();
    let recomputed = evaluate_fitness(training.samples(), &outcome.best).unwrap();
    assert_eq!(recomputed.to_bits(), outcome.best_fitness.to_bits());
    for &(ref tree, fitness) in &outcome.population {
        assert!(tree.depth() <= 6);
        assert_eq!(evaluate_fitness(training.samples(), tree).unwrap().to_bits(), fitness.to_bits());
    }
}

#[test]
fn reporter_sees_every_generation() {
    init_test_logging();
    let training = TrainingSet::generate(Target::Quadratic, 10);
    let settings = Settings {
        fitness_threshold: -1.0,
        max_generations: 7,
        ..identity_settings(5)
    };
    let mut recorder = Recorder::default();
    let outcome = Evolution::new(settings, &training, &mut recorder).unwrap().run().unwrap();
    let indices = recorder.generations.iter().map(|&(g, _, _)| g).collect::<Vec<_>>();
    assert_eq!(indices, (0..=7).collect::<Vec<_>>());
    let sizes = recorder.generations.iter().map(|&(_, _, n)| n).collect::<Vec<_>>();
    assert_eq!(sizes, outcome.population_sizes);
    assert_eq!(recorder.finished, Some((7, outcome.best_fitness)));
}

#[test]
fn population_of_one_evolves() {
    init_test_logging();
    let training = TrainingSet::generate(Target::Identity, 10);
    let settings = Settings {
        population_size: 1,
        max_generations: 10,
        fitness_threshold: -1.0,
        termination: Termination::SolvedOrTimeout,
        ..identity_settings(9)
    };
    let outcome = Evolution::new(settings, &training, symreg::report::NullReporter)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.generations, 10);
    assert!(outcome.population_sizes.iter().all(|&n| n >= 1));
}

#[test]
fn loaded_training_data_drives_a_run() {
    init_test_logging();
    let path = std::env::temp_dir().join(format!("symreg-it-{}.csv", std::process::id()));
    TrainingSet::generate(Target::Identity, 5).save(&path).unwrap();
    let training = TrainingSet::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(training.len(), 6);

    let outcome = Evolution::new(identity_settings(3), &training, symreg::report::NullReporter)
        .unwrap()
        .run()
        .unwrap();
    let _: &Tree = &outcome.best;
    assert!(outcome.best_fitness >= 0.0);
}

#[test]
fn shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
    let settings = Settings::load(path).unwrap();
    assert_eq!(settings, Settings::default());
}
