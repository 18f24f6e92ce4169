//! The self-training loop of the learning algorithms. A learning algorithm
//! treats its own estimate as ground truth and feeds it back into itself.
//! Instead of doing that implicitly inside `read`, the estimate is pushed
//! into a [`FeedbackBuffer`] as a [`TrainingEvent`], and the algorithm feeds
//! whatever the buffer hands back.

use crate::location::Location;
use crate::signal::Signals;

/// A reading paired with the location it should be trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEvent {
    /// What was read
    pub signals: Signals,
    /// Where the algorithm believes it was read
    pub location: Location,
}

/// Holds [`TrainingEvent`]s until `batch_size` of them have been collected.
#[derive(Debug, Clone)]
pub struct FeedbackBuffer {
    pending: Vec<TrainingEvent>,
    batch_size: usize,
}

impl FeedbackBuffer {
    /// A buffer that releases every event as soon as it arrives.
    pub fn immediate() -> Self {
        Self::batched(1)
    }

    /// A buffer that releases events in batches of `batch_size`.
    pub fn batched(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            pending: Vec::with_capacity(batch_size.min(1024)),
            batch_size,
        }
    }

    /// Queues `event`. Once the buffer is full, the whole batch is drained
    /// and returned in arrival order.
    pub fn push(&mut self, event: TrainingEvent) -> Option<Vec<TrainingEvent>> {
        self.pending.push(event);
        if self.pending.len() >= self.batch_size {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }

    /// Number of events waiting for the batch to fill.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Events released per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
