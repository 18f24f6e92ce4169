//! The error type returned by a simulation run.

use crate::config::ConfigError;
use crate::reporter::ReportError;
use crate::signal::KeyCapacityError;

use std::{error::Error, fmt::Display};

/// Anything that stops a simulation. None of these are retried.
#[derive(Debug)]
pub enum SimError {
    /// The configuration was rejected before anything ran
    Config(ConfigError),
    /// A reading held more access points than a fingerprint key can
    Capacity(KeyCapacityError),
    /// The reporter failed to take the results
    Report(ReportError),
    /// An algorithm was registered after the engine had seeded
    LateRegistration(String),
}

impl Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::Config(e) => write!(f, "configuration error: {}", e),
            SimError::Capacity(e) => write!(f, "capacity error: {}", e),
            SimError::Report(e) => write!(f, "report error: {}", e),
            SimError::LateRegistration(name) => {
                write!(f, "algorithm {} was registered after seeding", name)
            }
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimError::Config(e) => Some(e),
            SimError::Capacity(e) => Some(e),
            SimError::Report(e) => Some(e),
            SimError::LateRegistration(_) => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<KeyCapacityError> for SimError {
    fn from(value: KeyCapacityError) -> Self {
        Self::Capacity(value)
    }
}

impl From<ReportError> for SimError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}
