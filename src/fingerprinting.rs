//! Fingerprinting localization. Readings taken at known locations are stored
//! as fingerprints, grouped by the set of access points they contain. A new
//! reading is placed at the mean location of its nearest fingerprints.
//!
//! Nearness is decided in two steps. First, every stored group is ranked by
//! how many of the reading's access points it is missing (see
//! [`set_difference`]), and whole groups are taken in that order while they
//! fit within [`BEST_MATCHES`]. The group that would overflow is then ranked
//! by signal strength distance and only its closest fingerprints are taken.

use crate::algorithm::{Algorithm, Variant};
use crate::feedback::{FeedbackBuffer, TrainingEvent};
use crate::location::Location;
use crate::signal::{euclidean_distance, set_difference, sort_by_id, Key, KeyCapacityError, Signal, Signals};

use log::info;
use std::collections::BTreeMap;

/// The most fingerprints an estimate is built from.
pub const BEST_MATCHES: usize = 4;

/// Smart variants feed their estimates back in batches of this many.
pub const SMART_BATCH_SIZE: usize = 1000;

/// A stored training sample. `signals` is sorted by id.
#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    signals: Signals,
    location: Location,
}

/// The fingerprinting family of algorithms.
#[derive(Debug, Clone)]
pub struct Fingerprinting {
    variant: Variant,
    fingerprints: BTreeMap<Key, Vec<Fingerprint>>,
    feedback: FeedbackBuffer,
}

impl Fingerprinting {
    /// Creates an empty fingerprint database.
    pub fn new(variant: Variant) -> Self {
        let feedback = if variant.is_smart() {
            FeedbackBuffer::batched(SMART_BATCH_SIZE)
        } else {
            FeedbackBuffer::immediate()
        };
        Self {
            variant,
            fingerprints: BTreeMap::new(),
            feedback,
        }
    }

    /// The variant this instance runs as.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Number of stored fingerprints.
    pub fn len(&self) -> usize {
        self.fingerprints.values().map(Vec::len).sum()
    }

    /// True if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Number of distinct access point sets among the stored fingerprints.
    pub fn groups(&self) -> usize {
        self.fingerprints.len()
    }

    /// Estimates waiting to be fed back by a smart variant.
    pub fn pending_feedback(&self) -> usize {
        self.feedback.pending()
    }

    /// `query` must be sorted by id and `key` must be its key.
    fn estimate(&self, query: &[Signal], key: &Key) -> Option<Location> {
        let mut buckets: Vec<Vec<&Fingerprint>> = vec![Vec::new(); query.len() + 1];
        for (stored, fingerprints) in &self.fingerprints {
            buckets[set_difference(key, stored)].extend(fingerprints);
        }

        // Fingerprints missing every access point of the query never count
        let mut locations = Vec::with_capacity(BEST_MATCHES);
        let mut breakers: &[&Fingerprint] = &[];
        for bucket in buckets.iter().take(query.len()) {
            if locations.len() + bucket.len() > BEST_MATCHES {
                breakers = bucket;
                break;
            }
            locations.extend(bucket.iter().map(|fp| fp.location));
        }

        if !breakers.is_empty() {
            let mut ranked: Vec<(f64, Location)> = breakers
                .iter()
                .map(|fp| (euclidean_distance(query, &fp.signals), fp.location))
                .collect();
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
            let remaining = BEST_MATCHES - locations.len();
            locations.extend(ranked.into_iter().take(remaining).map(|(_, l)| l));
        }

        Location::average(&locations)
    }
}

impl Algorithm for Fingerprinting {
    fn feed(&mut self, signals: &[Signal], location: &Location) -> Result<(), KeyCapacityError> {
        if self.variant.is_enhanced() && signals.is_empty() {
            return Ok(());
        }

        let mut signals = signals.to_vec();
        sort_by_id(&mut signals);
        let key = Key::from_signals(&signals)?;
        self.fingerprints.entry(key).or_default().push(Fingerprint {
            signals,
            location: *location,
        });
        Ok(())
    }

    // Estimates are never enhanced here, `truth` goes unused. Enhanced
    // fingerprinting only differs in that it skips empty readings when fed.
    fn read(
        &mut self,
        signals: &[Signal],
        _truth: &Location,
    ) -> Result<Option<Location>, KeyCapacityError> {
        let mut query = signals.to_vec();
        sort_by_id(&mut query);
        let key = Key::from_signals(&query)?;

        let Some(estimate) = self.estimate(&query, &key) else {
            return Ok(None);
        };

        if self.variant.is_learning() {
            let event = TrainingEvent {
                signals: query,
                location: estimate,
            };
            if let Some(batch) = self.feedback.push(event) {
                if batch.len() > 1 {
                    info!("Batch feeding {} readings", batch.len());
                }
                for event in batch {
                    self.feed(&event.signals, &event.location)?;
                }
            }
        }

        Ok(Some(estimate))
    }
}
