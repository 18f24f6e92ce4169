//! Signal readings, and the [`Key`] that summarizes which access points were
//! seen in a reading.
//!
//! Every function here that walks two readings side by side expects them to
//! be sorted by id first, see [`sort_by_id`].

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// Access point identifier. Id `0` is never handed out by a [`crate::map::Map`].
pub type Id = usize;

/// The most access point ids a [`Key`] can hold.
pub const KEY_CAPACITY: usize = 50;

/// A single reading of one access point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The access point that was heard
    pub id: Id,
    /// Observed strength in dBm
    pub strength: f64,
}

impl Signal {
    /// Creates a new [`Signal`].
    pub fn new(id: Id, strength: f64) -> Self {
        Self { id, strength }
    }
}

/// All signals read at one location in one go.
pub type Signals = Vec<Signal>;

/// Sorts ascending by access point id. Required before building a [`Key`] or
/// comparing two readings.
pub fn sort_by_id(signals: &mut [Signal]) {
    signals.sort_by_key(|s| s.id);
}

/// Sorts strongest signal first.
pub fn sort_by_strength(signals: &mut [Signal]) {
    signals.sort_by(|a, b| b.strength.total_cmp(&a.strength));
}

/// Returned when a reading holds more access points than fit in a [`Key`].
/// This means the access point density is too high for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCapacityError {
    /// How many ids the reading contained
    pub observed: usize,
    /// How many ids a [`Key`] can hold
    pub capacity: usize,
}

impl fmt::Display for KeyCapacityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "reading holds {} access points, key capacity is {}",
            self.observed, self.capacity
        )
    }
}

impl std::error::Error for KeyCapacityError {}

/// The sorted set of access point ids present in a reading. Unlike a
/// zero-padded array, the number of ids in use is stored explicitly, so no id
/// value doubles as a sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    len: usize,
    ids: [Id; KEY_CAPACITY],
}

impl Key {
    /// Builds the key for a reading. The reading itself does not need to be
    /// sorted.
    pub fn from_signals(signals: &[Signal]) -> Result<Self, KeyCapacityError> {
        if signals.len() > KEY_CAPACITY {
            return Err(KeyCapacityError {
                observed: signals.len(),
                capacity: KEY_CAPACITY,
            });
        }
        let mut ids = [0; KEY_CAPACITY];
        for (slot, signal) in ids.iter_mut().zip(signals) {
            *slot = signal.id;
        }
        ids[..signals.len()].sort_unstable();
        Ok(Self {
            len: signals.len(),
            ids,
        })
    }

    /// The ids in ascending order.
    pub fn ids(&self) -> &[Id] {
        &self.ids[..self.len]
    }

    /// Number of ids in the key.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the reading saw no access points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.ids()).finish()
    }
}

/// Number of ids in `query` that do not appear in `stored`. This is not
/// symmetric.
pub fn set_difference(query: &Key, stored: &Key) -> usize {
    let (q, s) = (query.ids(), stored.ids());
    let (mut i, mut j) = (0, 0);
    let mut difference = 0;
    while i < q.len() && j < s.len() {
        match q[i].cmp(&s[j]) {
            Ordering::Less => {
                i += 1;
                difference += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    difference + (q.len() - i)
}

/// Euclidean distance between the strengths of the access points both
/// readings share. Ids seen by only one side are ignored. Both readings must
/// be sorted by id.
pub fn euclidean_distance(a: &[Signal], b: &[Signal]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].id.cmp(&b[j].id) {
            Ordering::Equal => {
                let diff = a[i].strength - b[j].strength;
                sum += diff * diff;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(ids: &[Id]) -> Signals {
        ids.iter().map(|&id| Signal::new(id, -60.0)).collect()
    }

    fn key(ids: &[Id]) -> Key {
        Key::from_signals(&signals(ids)).unwrap()
    }

    #[test]
    fn key_holds_sorted_ids() {
        let k = key(&[7, 3, 12, 1]);
        assert_eq!(k.ids(), &[1, 3, 7, 12]);
        assert_eq!(k.len(), 4);
        assert!(!k.is_empty());
        assert!(key(&[]).is_empty());
    }

    #[test]
    fn key_ignores_signal_order() {
        assert_eq!(key(&[5, 2, 9]), key(&[9, 5, 2]));
    }

    #[test]
    fn key_rejects_too_many_ids() {
        let ids: Vec<Id> = (1..=KEY_CAPACITY + 1).collect();
        let err = Key::from_signals(&signals(&ids)).unwrap_err();
        assert_eq!(err.observed, KEY_CAPACITY + 1);
        assert_eq!(err.capacity, KEY_CAPACITY);

        let ids: Vec<Id> = (1..=KEY_CAPACITY).collect();
        assert_eq!(key(&ids).len(), KEY_CAPACITY);
    }

    #[test]
    fn set_difference_counts_missing_ids() {
        let a = key(&[1, 2, 3, 4]);
        let b = key(&[2, 4, 6]);
        assert_eq!(set_difference(&a, &b), 2);
        assert_eq!(set_difference(&b, &a), 1);
        assert_eq!(set_difference(&a, &a), 0);
    }

    #[test]
    fn set_difference_zero_for_subsets() {
        let small = key(&[3, 8]);
        let big = key(&[1, 3, 5, 8, 13]);
        assert_eq!(set_difference(&small, &big), 0);
        assert_eq!(set_difference(&big, &small), 3);
        assert_eq!(set_difference(&key(&[]), &big), 0);
        assert_eq!(set_difference(&big, &key(&[])), 5);
    }

    #[test]
    fn euclidean_distance_uses_shared_ids_only() {
        let a = vec![Signal::new(1, -50.0), Signal::new(2, -60.0), Signal::new(5, -70.0)];
        let b = vec![Signal::new(2, -63.0), Signal::new(4, -10.0), Signal::new(5, -74.0)];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(&a, &[]), 0.0);
    }

    #[test]
    fn sorting_helpers() {
        let mut s = vec![Signal::new(3, -70.0), Signal::new(1, -50.0), Signal::new(2, -90.0)];
        sort_by_id(&mut s);
        assert_eq!(s.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        sort_by_strength(&mut s);
        assert_eq!(s.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }
}
