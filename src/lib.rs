//! WifiSim simulates a field of wireless access points and measures how well
//! different localization algorithms can place a device from the signal
//! strengths it observes.
//!
//! The pieces, from the bottom up:
//!
//! - [`propagation`] is the radio model: whether a signal is heard at a
//!   given distance, and how strong it is.
//! - [`map`] owns the access points and the random stream, and produces
//!   [`signal`] readings at any location.
//! - [`algorithm`] defines what a localization algorithm is. [`centroid`]
//!   and [`fingerprinting`] are the two families, each with enhanced,
//!   learning and smart variants.
//! - [`engine`] seeds the algorithms, tests them over a number of cycles
//!   while access points are replaced, and collects [`stats`].
//! - [`reporter`] is where the results go. Plotting them is left to other
//!   tools.
//!
//! A run is reproducible when [`config::Configuration::random_seed`] is set.

#![warn(missing_docs)]
pub mod algorithm;
pub mod args;
pub mod centroid;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod fingerprinting;
pub mod location;
pub mod map;
pub mod propagation;
pub mod reporter;
pub mod signal;
pub mod stats;
