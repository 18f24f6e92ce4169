//! Runs a simulation from a configuration file, or samples the radio model.

use clap::Parser;
use log::{error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{error::Error, fs, process::ExitCode};
use wifisim::{
    algorithm::AlgorithmChoice,
    args::{CommandTask, ProfileCommand, RunCommand, SimArgs},
    config::Configuration,
    engine::Engine,
    propagation::Profile,
    reporter::RonReporter,
};

// Example:
// cargo run --bin wifisim -- run sim.ron
//                            -a centroid learning-centroid
//                            --seed 42
//                            --rate 0.1 --strategy random
//                            --out graphs/durdle

fn main() -> ExitCode {
    env_logger::init();
    let args = SimArgs::parse();

    let result = match args.command {
        CommandTask::Run(cmd) => run(cmd),
        CommandTask::Profile(cmd) => profile(cmd),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("** err: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cmd: RunCommand) -> Result<(), Box<dyn Error>> {
    let mut config = Configuration::from_path(&cmd.config)?;
    if let Some(seed) = cmd.seed {
        config.random_seed = Some(seed);
    }
    if let Some(cycles) = cmd.cycles {
        config.test_cycles = cycles;
    }
    if let Some(dir) = cmd.output_dir {
        config.output_dir = dir;
    }
    if let Some(rate) = cmd.replacement_rate {
        config.replacement_rate = rate;
    }
    if let Some(strategy) = cmd.replacement_strategy {
        config.replacement_strategy = Some(strategy);
    }

    let reporter = RonReporter::new(&config);
    info!("Writing reports to {}", reporter.dir().display());
    let mut engine = Engine::with_reporter(config, Box::new(reporter))?;

    let choices = if cmd.algorithms.is_empty() {
        AlgorithmChoice::all()
    } else {
        cmd.algorithms
    };
    for choice in choices {
        engine.add_choice(choice)?;
    }

    let report = engine.run()?;
    for (name, series) in &report.full_series {
        println!("{}", name);
        println!("\tmean error: {}", format_series(&series.mean_error));
        println!("\tmiss %:     {}", format_series(&series.miss_percentage));
    }
    Ok(())
}

fn profile(cmd: ProfileCommand) -> Result<(), Box<dyn Error>> {
    let mut rng = match cmd.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let distances = if cmd.distances.is_empty() {
        (1..=20).map(|i| i as f64 * 5.0).collect()
    } else {
        cmd.distances
    };

    let profile = Profile::measure(&distances, cmd.trials, &mut rng);
    for (distance, rate) in profile.distances.iter().zip(&profile.response_rates) {
        println!("{:>6.1}m  {:>5.1}% received", distance, rate);
    }

    fs::create_dir_all(&cmd.output_dir)?;
    let path = cmd.output_dir.join("profile.ron");
    let text = ron::ser::to_string_pretty(&profile, ron::ser::PrettyConfig::default())?;
    fs::write(&path, text)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn format_series(values: &[Option<f64>]) -> String {
    values
        .iter()
        .map(|v| match v {
            Some(v) => format!("{:.2}", v),
            None => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
