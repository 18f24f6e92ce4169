//! The simulated field of access points.

use crate::location::Location;
use crate::propagation::{signal_received, signal_strength};
use crate::signal::{Id, Signal, Signals};

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A transmitter at a fixed location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    /// Unique, strictly increasing in creation order
    pub id: Id,
    /// Where the access point stands
    pub location: Location,
}

impl Display for AccessPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.location)
    }
}

/// The set of live access points, plus the random stream that drives every
/// stochastic decision in a simulation.
///
/// Access points are kept in creation order, which is also id order, so the
/// oldest one is always at the front.
pub struct Map {
    width: f64,
    height: f64,
    access_points: Vec<AccessPoint>,
    last_id: Id,
    rng: ChaCha8Rng,
}

impl Map {
    /// Creates an empty map. With a seed, everything the map does afterwards
    /// is reproducible; without one the stream is seeded from entropy.
    pub fn new(width: f64, height: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(width, height, rng)
    }

    /// Creates an empty map drawing from the given random stream.
    pub fn with_rng(width: f64, height: f64, rng: ChaCha8Rng) -> Self {
        Self {
            width,
            height,
            access_points: Vec::new(),
            // Id 0 is reserved, the first access point gets id 1
            last_id: 0,
            rng,
        }
    }

    /// Width in meters.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The live access points, oldest first.
    pub fn access_points(&self) -> &[AccessPoint] {
        &self.access_points
    }

    /// Number of live access points.
    pub fn len(&self) -> usize {
        self.access_points.len()
    }

    /// True if no access points are live.
    pub fn is_empty(&self) -> bool {
        self.access_points.is_empty()
    }

    /// The most recently assigned id, or `0` if none has been assigned.
    pub fn last_id(&self) -> Id {
        self.last_id
    }

    /// Places a new access point at `location` and returns its id.
    pub fn add_access_point(&mut self, location: Location) -> Id {
        self.last_id += 1;
        self.access_points.push(AccessPoint {
            id: self.last_id,
            location,
        });
        self.last_id
    }

    /// Places a new access point uniformly at random on the map.
    pub fn add_random_access_point(&mut self) -> Id {
        let location = Location::new(
            self.rng.gen::<f64>() * self.width,
            self.rng.gen::<f64>() * self.height,
        );
        self.add_access_point(location)
    }

    /// Removes the access point with the given id, if it is live.
    pub fn remove_access_point(&mut self, id: Id) -> Option<AccessPoint> {
        let index = self.access_points.iter().position(|ap| ap.id == id)?;
        Some(self.access_points.remove(index))
    }

    /// Removes the oldest live access point.
    pub fn remove_oldest_access_point(&mut self) -> Option<Id> {
        if self.access_points.is_empty() {
            return None;
        }
        Some(self.access_points.remove(0).id)
    }

    /// Removes a uniformly chosen live access point.
    pub fn remove_random_access_point(&mut self) -> Option<Id> {
        if self.access_points.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.access_points.len());
        Some(self.access_points.remove(index).id)
    }

    /// Reads every access point from `location`. Signals come out in access
    /// point order, not sorted by strength.
    pub fn read(&mut self, location: &Location) -> Signals {
        let mut signals = Vec::with_capacity(self.access_points.len());
        for ap in &self.access_points {
            let distance = ap.location.distance(location);
            if signal_received(distance, &mut self.rng) {
                signals.push(Signal::new(ap.id, signal_strength(distance, &mut self.rng)));
            }
        }
        signals.shrink_to_fit();
        signals
    }

    /// Shuffles `items` with the map's random stream.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Display for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Map [{} x {}]\n{{", self.width, self.height)?;
        for ap in &self.access_points {
            write!(f, "{}, ", ap.location)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(map: &Map) -> Vec<Id> {
        map.access_points().iter().map(|ap| ap.id).collect()
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut map = Map::new(200.0, 200.0, Some(1));
        assert_eq!(map.last_id(), 0);
        let first = map.add_random_access_point();
        let second = map.add_access_point(Location::new(10.0, 10.0));
        assert_eq!((first, second), (1, 2));
        assert_eq!(map.last_id(), 2);
    }

    #[test]
    fn random_access_points_stay_on_the_map() {
        let mut map = Map::new(300.0, 170.0, Some(2));
        for _ in 0..500 {
            map.add_random_access_point();
        }
        assert!(map.access_points().iter().all(|ap| {
            (0.0..300.0).contains(&ap.location.x) && (0.0..170.0).contains(&ap.location.y)
        }));
    }

    #[test]
    fn remove_oldest_is_fifo() {
        let mut map = Map::new(200.0, 200.0, Some(3));
        for _ in 0..4 {
            map.add_random_access_point();
        }
        assert_eq!(map.remove_oldest_access_point(), Some(1));
        assert_eq!(map.remove_oldest_access_point(), Some(2));
        assert_eq!(ids(&map), vec![3, 4]);
    }

    #[test]
    fn remove_from_empty_map() {
        let mut map = Map::new(200.0, 200.0, Some(4));
        assert_eq!(map.remove_oldest_access_point(), None);
        assert_eq!(map.remove_random_access_point(), None);
        assert_eq!(map.remove_access_point(1), None);
    }

    #[test]
    fn remove_by_id_and_random() {
        let mut map = Map::new(200.0, 200.0, Some(5));
        for _ in 0..10 {
            map.add_random_access_point();
        }
        assert_eq!(map.remove_access_point(4).map(|ap| ap.id), Some(4));
        let removed = map.remove_random_access_point().unwrap();
        assert_eq!(map.len(), 8);
        assert!(!ids(&map).contains(&removed));
        assert!(!ids(&map).contains(&4));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut map = Map::new(200.0, 200.0, Some(6));
        for _ in 0..5 {
            map.add_random_access_point();
        }
        map.remove_random_access_point();
        map.remove_oldest_access_point();
        let new_id = map.add_random_access_point();
        assert_eq!(new_id, 6);
    }

    #[test]
    fn read_keeps_access_point_order() {
        let mut map = Map::new(200.0, 200.0, Some(7));
        let here = Location::new(100.0, 100.0);
        map.add_access_point(Location::new(102.0, 100.0));
        map.add_access_point(Location::new(100.0, 195.0));
        map.add_access_point(Location::new(98.0, 101.0));
        for _ in 0..50 {
            let signals = map.read(&here);
            // The two close access points are always heard, the far one never
            assert_eq!(signals.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 3]);
        }
    }

    #[test]
    fn seeded_maps_are_reproducible() {
        let build = || {
            let mut map = Map::new(500.0, 500.0, Some(42));
            for _ in 0..100 {
                map.add_random_access_point();
            }
            let signals = map.read(&Location::new(250.0, 250.0));
            (map.access_points().to_vec(), signals)
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn display_lists_locations() {
        let mut map = Map::new(160.0, 170.0, Some(8));
        map.add_access_point(Location::new(1.0, 2.0));
        assert_eq!(map.to_string(), "Map [160 x 170]\n{(1.00, 2.00), }");
    }
}
