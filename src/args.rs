//! Commandline argument parser using clap for WifiSim

use crate::algorithm::AlgorithmChoice;
use crate::config::ReplacementStrategy;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top level arguments
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct SimArgs {
    #[command(subcommand)]
    /// Which task to perform, a simulation run or a radio model profile
    pub command: CommandTask,
}

/// The available tasks
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Run a simulation described by a RON configuration file
    Run(RunCommand),

    /// Sample the radio model and report response rates and strengths
    Profile(ProfileCommand),
}

/// Arguments of the `run` task
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// RON file holding the configuration
    pub config: PathBuf,

    /// Algorithms to test, e.g. `centroid` or `smart-learning-fingerprinting`.
    /// Every algorithm is tested when none are given
    #[arg(short = 'a', long = "algorithm")]
    #[clap(num_args = 1..)]
    pub algorithms: Vec<AlgorithmChoice>,

    /// Overrides the random seed from the configuration
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// Overrides the number of test cycles from the configuration
    #[arg(short = 'c', long = "cycles")]
    pub cycles: Option<usize>,

    /// Overrides the output directory from the configuration
    #[arg(short = 'o', long = "out")]
    pub output_dir: Option<PathBuf>,

    /// Overrides the replacement rate from the configuration
    #[arg(short = 'r', long = "rate")]
    pub replacement_rate: Option<f64>,

    /// Overrides the replacement strategy, `fifo` or `random`
    #[arg(long = "strategy")]
    pub replacement_strategy: Option<ReplacementStrategy>,
}

/// Arguments of the `profile` task
#[derive(Debug, Args, Clone)]
pub struct ProfileCommand {
    /// Samples drawn at every distance
    #[arg(short = 't', long = "trials", default_value_t = 100_000)]
    pub trials: usize,

    /// Distances to sample, in meters
    #[arg(short = 'd', long = "distances")]
    #[clap(num_args = 1..)]
    pub distances: Vec<f64>,

    /// Random seed, for reproducible profiles
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// Directory to write `profile.ron` into
    #[arg(short = 'o', long = "out", default_value = "graphs")]
    pub output_dir: PathBuf,
}
