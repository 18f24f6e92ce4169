//! Per-cycle accuracy bookkeeping.

use crate::location::Location;

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Which test locations a statistic covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// Every test location
    Full,
    /// Only test locations in the central 500×500 meters
    Center,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Full => write!(f, "Full"),
            Partition::Center => write!(f, "Center"),
        }
    }
}

/// Raw errors and misses for one algorithm, one slot per cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleStats {
    errors: Vec<Vec<f64>>,
    misses: Vec<u64>,
}

impl CycleStats {
    /// Room for `cycles` cycles.
    pub fn new(cycles: usize) -> Self {
        Self {
            errors: vec![Vec::new(); cycles],
            misses: vec![0; cycles],
        }
    }

    /// Records a successful estimate that was `error` meters off.
    pub fn record_hit(&mut self, cycle: usize, error: f64) {
        self.errors[cycle].push(error);
    }

    /// Records a read that produced no estimate.
    pub fn record_miss(&mut self, cycle: usize) {
        self.misses[cycle] += 1;
    }

    /// Errors of every successful estimate in `cycle`.
    pub fn errors(&self, cycle: usize) -> &[f64] {
        &self.errors[cycle]
    }

    /// Number of misses in `cycle`.
    pub fn misses(&self, cycle: usize) -> u64 {
        self.misses[cycle]
    }

    /// Number of successful estimates in `cycle`.
    pub fn hits(&self, cycle: usize) -> u64 {
        self.errors[cycle].len() as u64
    }

    /// Number of cycles tracked.
    pub fn cycles(&self) -> usize {
        self.misses.len()
    }

    /// Mean error of the successful estimates, or `None` without any.
    pub fn mean_error(&self, cycle: usize) -> Option<f64> {
        let errors = &self.errors[cycle];
        if errors.is_empty() {
            None
        } else {
            Some(errors.iter().sum::<f64>() / errors.len() as f64)
        }
    }

    /// Percentage of reads that missed, or `None` if nothing was read.
    pub fn miss_percentage(&self, cycle: usize) -> Option<f64> {
        let misses = self.misses[cycle] as f64;
        let total = misses + self.hits(cycle) as f64;
        if total == 0.0 {
            None
        } else {
            Some(misses / total * 100.0)
        }
    }

    /// The per-cycle summary handed to reporters.
    pub fn series(&self) -> Series {
        let cycles = 0..self.cycles();
        Series {
            mean_error: cycles.clone().map(|c| self.mean_error(c)).collect(),
            miss_percentage: cycles.map(|c| self.miss_percentage(c)).collect(),
        }
    }
}

/// Mean error and miss percentage over time, one entry per cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    /// Mean error of successful estimates, in meters
    pub mean_error: Vec<Option<f64>>,
    /// Misses as a percentage of all reads
    pub miss_percentage: Vec<Option<f64>>,
}

/// One estimate next to the location it was made for, drawn as an arrow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    /// Where the reading was taken
    pub source: Location,
    /// Where the algorithm placed it
    pub estimate: Location,
}

/// The successful estimates of every algorithm over a coarse grid, taken
/// after the last cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Arrows keyed by algorithm name
    pub arrows: BTreeMap<String, Vec<Arrow>>,
}
