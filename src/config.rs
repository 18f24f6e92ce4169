//! Simulation settings. A [`Configuration`] is usually read from a RON file
//! that looks like this:
//!
//! ```text
//! (
//!     map_width: 1000.0,
//!     map_height: 1000.0,
//!     access_point_density: 1500,
//!     seed_distance: 5.0,
//!     test_distance: 10.0,
//!     test_cycles: 50,
//!     replacement_rate: 0.1,
//!     replacement_strategy: Some(Fifo),
//!     output_dir: "graphs/durdle",
//! )
//! ```
//!
//! Fields that are left out take their [`Default`] value.

use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Maps smaller than this in either direction are rejected, since no test
/// location would be far enough from the edge.
pub const MIN_MAP_SIZE: f64 = 160.0;

/// How access points are picked for removal during churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementStrategy {
    /// Oldest access point first
    #[serde(alias = "fifo")]
    Fifo,
    /// Any live access point, uniformly
    #[serde(alias = "random")]
    Random,
}

impl fmt::Display for ReplacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementStrategy::Fifo => write!(f, "fifo"),
            ReplacementStrategy::Random => write!(f, "random"),
        }
    }
}

impl FromStr for ReplacementStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(ReplacementStrategy::Fifo),
            "random" => Ok(ReplacementStrategy::Random),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Everything a simulation run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Width of the map in meters
    pub map_width: f64,
    /// Height of the map in meters
    pub map_height: f64,
    /// Access points per square kilometer
    pub access_point_density: u32,
    /// Spacing of the seed grid in meters
    pub seed_distance: f64,
    /// Spacing of the test grid in meters
    pub test_distance: f64,
    /// Number of churn cycles after the first test cycle
    pub test_cycles: usize,
    /// Fraction of access points replaced before every cycle but the first
    pub replacement_rate: f64,
    /// Required whenever `replacement_rate` is not zero
    pub replacement_strategy: Option<ReplacementStrategy>,
    /// Makes a run reproducible. Without it the run is seeded from entropy.
    pub random_seed: Option<u64>,
    /// Where reports are written
    pub output_dir: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            map_width: 1000.0,
            map_height: 1000.0,
            access_point_density: 0,
            seed_distance: 5.0,
            test_distance: 10.0,
            test_cycles: 0,
            replacement_rate: 0.0,
            replacement_strategy: None,
            random_seed: None,
            output_dir: PathBuf::from("graphs"),
        }
    }
}

/// Everything that can be wrong with a [`Configuration`].
#[derive(Debug)]
pub enum ConfigError {
    /// A replacement rate was set but no strategy
    MissingStrategy,
    /// A strategy name that is neither `fifo` nor `random`
    UnknownStrategy(String),
    /// The replacement rate is outside `[0, 1]`
    ReplacementRate(f64),
    /// Access point density is zero
    ZeroDensity,
    /// Map width below [`MIN_MAP_SIZE`] or not finite
    MapWidth(f64),
    /// Map height below [`MIN_MAP_SIZE`] or not finite
    MapHeight(f64),
    /// Seed spacing is not positive or not finite
    SeedDistance(f64),
    /// Test spacing is not positive or not finite
    TestDistance(f64),
    /// Area times density does not fit the access point counter
    TooManyAccessPoints,
    /// Reading the configuration file failed
    IoError(std::io::Error),
    /// Parsing the configuration file failed
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ConfigError as CE;
        let msg = match self {
            CE::MissingStrategy => {
                Cow::from("replacement rate set without a replacement strategy")
            }
            CE::UnknownStrategy(name) => Cow::from(format!("unknown replacement strategy '{}'", name)),
            CE::ReplacementRate(rate) => {
                Cow::from(format!("replacement rate {} is not between 0 and 1", rate))
            }
            CE::ZeroDensity => Cow::from("access point density cannot be 0"),
            CE::MapWidth(w) => Cow::from(format!(
                "map width cannot be less than {} meters, got {}",
                MIN_MAP_SIZE, w
            )),
            CE::MapHeight(h) => Cow::from(format!(
                "map height cannot be less than {} meters, got {}",
                MIN_MAP_SIZE, h
            )),
            CE::SeedDistance(d) => Cow::from(format!("seed distance must be positive, got {}", d)),
            CE::TestDistance(d) => Cow::from(format!("test distance must be positive, got {}", d)),
            CE::TooManyAccessPoints => {
                Cow::from("map area and density give too many access points")
            }
            CE::IoError(error) => Cow::from(format!("io error: {}", error)),
            CE::RonSpannedError(error) => Cow::from(format!("ron error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl Configuration {
    /// Reads a configuration from a RON file. The result is not validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_ron(&text)
    }

    /// Parses a configuration from RON text. The result is not validated.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::RonSpannedError)
    }

    /// Checks that the configuration describes a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.replacement_rate) {
            return Err(ConfigError::ReplacementRate(self.replacement_rate));
        }
        if self.replacement_rate != 0.0 && self.replacement_strategy.is_none() {
            return Err(ConfigError::MissingStrategy);
        }
        if self.access_point_density == 0 {
            return Err(ConfigError::ZeroDensity);
        }
        // Written so that NaN fails too
        if !(self.map_width.is_finite() && self.map_width >= MIN_MAP_SIZE) {
            return Err(ConfigError::MapWidth(self.map_width));
        }
        if !(self.map_height.is_finite() && self.map_height >= MIN_MAP_SIZE) {
            return Err(ConfigError::MapHeight(self.map_height));
        }
        if !(self.seed_distance.is_finite() && self.seed_distance > 0.0) {
            return Err(ConfigError::SeedDistance(self.seed_distance));
        }
        if !(self.test_distance.is_finite() && self.test_distance > 0.0) {
            return Err(ConfigError::TestDistance(self.test_distance));
        }
        self.access_point_count()?;
        Ok(())
    }

    /// How many access points the map starts with: area in km² times
    /// density, rounded down.
    pub fn access_point_count(&self) -> Result<usize, ConfigError> {
        let area = self.map_width * self.map_height;
        if !(area.is_finite() && area < u64::MAX as f64) {
            return Err(ConfigError::TooManyAccessPoints);
        }
        (area as u64)
            .checked_mul(self.access_point_density as u64)
            .map(|n| n / 1_000_000)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(ConfigError::TooManyAccessPoints)
    }
}
