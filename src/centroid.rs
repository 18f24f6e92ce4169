//! Centroid localization. Every access point is assumed to stand at the mean
//! of the locations it has been heard from, and a reading is placed at the
//! mean of the access points it contains.

use crate::algorithm::{Algorithm, Variant};
use crate::feedback::{FeedbackBuffer, TrainingEvent};
use crate::location::Location;
use crate::signal::{Id, KeyCapacityError, Signal};

use std::collections::HashMap;

/// An access point needs this many samples before it gets a centroid.
pub const MIN_MATCHES: usize = 4;

/// Smart variants stop recording samples for an access point at this many.
pub const SMART_HISTORY_LIMIT: usize = 300;

/// Everything recorded about one access point.
#[derive(Debug, Clone, Default)]
struct History {
    sum_x: f64,
    sum_y: f64,
    samples: usize,
    centroid: Option<Location>,
}

impl History {
    fn record(&mut self, location: &Location) {
        self.sum_x += location.x;
        self.sum_y += location.y;
        self.samples += 1;
        if self.samples >= MIN_MATCHES {
            let n = self.samples as f64;
            self.centroid = Some(Location::new(self.sum_x / n, self.sum_y / n));
        }
    }
}

/// The centroid family of algorithms.
#[derive(Debug, Clone)]
pub struct Centroid {
    variant: Variant,
    access_points: HashMap<Id, History>,
    feedback: FeedbackBuffer,
}

impl Centroid {
    /// Creates an untrained centroid algorithm.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            access_points: HashMap::new(),
            feedback: FeedbackBuffer::immediate(),
        }
    }

    /// The variant this instance runs as.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The estimated position of access point `id`, once it has enough
    /// samples.
    pub fn centroid_of(&self, id: Id) -> Option<Location> {
        self.access_points.get(&id).and_then(|h| h.centroid)
    }

    /// How many samples have been recorded for access point `id`.
    pub fn samples_of(&self, id: Id) -> usize {
        self.access_points.get(&id).map_or(0, |h| h.samples)
    }

    fn estimate(&self, signals: &[Signal]) -> Option<Location> {
        let centroids: Vec<Location> = signals
            .iter()
            .filter_map(|s| self.centroid_of(s.id))
            .collect();
        Location::average(&centroids)
    }
}

impl Algorithm for Centroid {
    fn feed(&mut self, signals: &[Signal], location: &Location) -> Result<(), KeyCapacityError> {
        for signal in signals {
            let history = self.access_points.entry(signal.id).or_default();
            if self.variant.is_smart() && history.samples >= SMART_HISTORY_LIMIT {
                continue;
            }
            history.record(location);
        }
        Ok(())
    }

    fn read(
        &mut self,
        signals: &[Signal],
        truth: &Location,
    ) -> Result<Option<Location>, KeyCapacityError> {
        let Some(mut estimate) = self.estimate(signals) else {
            return Ok(None);
        };

        if self.variant.is_enhanced() {
            estimate.enhance(truth);
        }

        if self.variant.is_learning() {
            let event = TrainingEvent {
                signals: signals.to_vec(),
                location: estimate,
            };
            for event in self.feedback.push(event).into_iter().flatten() {
                self.feed(&event.signals, &event.location)?;
            }
        }

        Ok(Some(estimate))
    }
}
