//! Points on the simulated map.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A point on the map, in meters.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Location {
    /// Creates a new [`Location`] at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        distance(self, other)
    }

    /// Nudges this location 10% of the way toward `truth`. This is the only
    /// place a location is ever changed in place.
    pub fn enhance(&mut self, truth: &Self) {
        self.x += (truth.x - self.x) * 0.1;
        self.y += (truth.y - self.y) * 0.1;
    }

    /// The unweighted mean of `locations`, or `None` if there are none.
    pub fn average(locations: &[Location]) -> Option<Self> {
        if locations.is_empty() {
            return None;
        }
        let n = locations.len() as f64;
        let (x, y) = locations
            .iter()
            .fold((0.0, 0.0), |(x, y), l| (x + l.x, y + l.y));
        Some(Self::new(x / n, y / n))
    }
}

/// Euclidean distance between two locations.
pub fn distance(l1: &Location, l2: &Location) -> f64 {
    let x = l1.x - l2.x;
    let y = l1.y - l2.y;
    (x * x + y * y).sqrt()
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
