//! The simulation engine. It builds a [`Map`], seeds every registered
//! [`Algorithm`] from a dense grid of readings, and then tests them over a
//! number of cycles while access points are replaced between cycles.
//!
//! Everything random is drawn from the map's single random stream, in a
//! fixed order: map generation, then seed readings, then for every cycle the
//! churn, the test order shuffle and the test readings. Learning algorithms
//! change as they are read, so the order in which test locations are visited
//! matters, and is kept exactly as shuffled.

use crate::algorithm::{Algorithm, AlgorithmChoice};
use crate::config::{ConfigError, Configuration, ReplacementStrategy};
use crate::error::SimError;
use crate::location::Location;
use crate::map::Map;
use crate::reporter::{NullReporter, Reporter};
use crate::signal::Id;
use crate::stats::{Arrow, CycleStats, FrameSnapshot, Partition, Series};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Test locations stay this far from the map edge, so access points can be
/// heard from every direction.
pub const TEST_MARGIN: f64 = 85.0;

/// Half the side of the central square tracked by [`Partition::Center`].
pub const CENTER_HALF_SIZE: f64 = 250.0;

/// Half the side of the center patch sampled for the last frame.
pub const FRAME_CENTER_HALF_SIZE: f64 = 165.0;

/// Number of intervals per axis of the last frame grids.
pub const FRAME_STEPS: f64 = 6.0;

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// The highest access point id of every generation, the first
    /// generation being the initial population
    pub generations: Vec<Id>,
    /// Raw statistics over every test location, keyed by algorithm name
    pub full: BTreeMap<String, CycleStats>,
    /// Raw statistics over the central test locations only
    pub center: BTreeMap<String, CycleStats>,
    /// Per-cycle summary of `full`
    pub full_series: BTreeMap<String, Series>,
    /// Per-cycle summary of `center`
    pub center_series: BTreeMap<String, Series>,
    /// Estimates over a coarse grid across the map after the last cycle
    pub last_frame_full: FrameSnapshot,
    /// Estimates over a coarse grid around the center after the last cycle
    pub last_frame_center: FrameSnapshot,
}

/// Runs one simulation.
pub struct Engine {
    config: Configuration,
    map: Map,
    algorithms: Vec<(String, Box<dyn Algorithm>)>,
    generations: Vec<Id>,
    reporter: Box<dyn Reporter>,
    seeded: bool,
}

impl Engine {
    /// Validates `config` and builds the map. Results are discarded.
    pub fn new(config: Configuration) -> Result<Self, SimError> {
        Self::with_reporter(config, Box::new(NullReporter))
    }

    /// Validates `config`, builds the map and publishes it to `reporter`,
    /// which also receives all later results.
    pub fn with_reporter(
        config: Configuration,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self, SimError> {
        config.validate()?;

        let mut map = Map::new(config.map_width, config.map_height, config.random_seed);
        let count = config.access_point_count()?;
        for _ in 0..count {
            map.add_random_access_point();
        }
        debug!("Placed {} access points on {}x{}m", count, config.map_width, config.map_height);

        let mut engine = Self {
            config,
            map,
            algorithms: Vec::new(),
            generations: Vec::new(),
            reporter,
            seeded: false,
        };
        engine.generations.push(engine.map.last_id());
        engine
            .reporter
            .map_snapshot(engine.map.access_points(), &engine.generations)?;
        Ok(engine)
    }

    /// Registers an algorithm under `name`. An algorithm already registered
    /// under that name is replaced. Registration is closed once the engine
    /// has seeded, since a late algorithm would be tested untrained.
    pub fn add_algorithm(
        &mut self,
        name: impl Into<String>,
        algorithm: Box<dyn Algorithm>,
    ) -> Result<(), SimError> {
        let name = name.into();
        if self.seeded {
            warn!("Refusing {}, algorithms were already seeded", name);
            return Err(SimError::LateRegistration(name));
        }
        if let Some(slot) = self.algorithms.iter_mut().find(|(n, _)| *n == name) {
            warn!("Replacing algorithm {}", name);
            slot.1 = algorithm;
        } else {
            self.algorithms.push((name, algorithm));
        }
        Ok(())
    }

    /// Registers a freshly built algorithm under its display name.
    pub fn add_choice(&mut self, choice: AlgorithmChoice) -> Result<(), SimError> {
        self.add_algorithm(choice.to_string(), choice.build())
    }

    /// Names of the registered algorithms, in registration order.
    pub fn algorithm_names(&self) -> Vec<&str> {
        self.algorithms.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// The map being simulated.
    pub fn map(&self) -> &Map {
        &self.map
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The highest access point id of every generation so far.
    pub fn generations(&self) -> &[Id] {
        &self.generations
    }

    /// Feeds every registered algorithm a reading from every point of the
    /// seed grid. Only the first call does anything.
    pub fn seed(&mut self) -> Result<(), SimError> {
        if self.seeded {
            warn!("Algorithms were already seeded");
            return Ok(());
        }
        let locations = self.seed_grid();
        for location in &locations {
            let signals = self.map.read(location);
            for (_, algorithm) in self.algorithms.iter_mut() {
                algorithm.feed(&signals, location)?;
            }
        }
        self.seeded = true;
        debug!("Seeded from {} locations", locations.len());
        Ok(())
    }

    /// Feeds a single algorithm that is not registered with the engine from
    /// the seed grid. Draws from the same random stream as everything else.
    pub fn seed_algorithm(&mut self, algorithm: &mut dyn Algorithm) -> Result<(), SimError> {
        for location in self.seed_grid() {
            let signals = self.map.read(&location);
            algorithm.feed(&signals, &location)?;
        }
        Ok(())
    }

    /// Replaces a fraction of the access points, as configured. All removals
    /// happen before any addition, so the population size stays the same
    /// and new access points always get fresh ids.
    pub fn replace_access_points(&mut self) -> Result<(), SimError> {
        let count = (self.map.len() as f64 * self.config.replacement_rate) as usize;

        for _ in 0..count {
            match self.config.replacement_strategy {
                Some(ReplacementStrategy::Fifo) => self.map.remove_oldest_access_point(),
                Some(ReplacementStrategy::Random) => self.map.remove_random_access_point(),
                None => return Err(ConfigError::MissingStrategy.into()),
            };
        }
        for _ in 0..count {
            self.map.add_random_access_point();
        }

        self.generations.push(self.map.last_id());
        debug!(
            "Replaced {} access points, generations: {:?}",
            count, self.generations
        );
        self.reporter
            .map_snapshot(self.map.access_points(), &self.generations)?;
        Ok(())
    }

    /// Seeds the algorithms if that has not happened yet, runs every test
    /// cycle, and hands the results to the reporter.
    pub fn run(mut self) -> Result<SimulationReport, SimError> {
        self.seed()?;

        let cycles = self.config.test_cycles + 1;
        let (width, height) = (self.config.map_width, self.config.map_height);
        let mut locations = grid(
            (TEST_MARGIN, width - TEST_MARGIN),
            (TEST_MARGIN, height - TEST_MARGIN),
            self.config.test_distance,
        );

        let mut full = vec![CycleStats::new(cycles); self.algorithms.len()];
        let mut center = full.clone();

        info!("Starting simulation");
        info!(
            "Performing {} localizations in each of {} cycles",
            locations.len(),
            self.config.test_cycles
        );

        for cycle in 0..cycles {
            if cycle != 0 {
                self.replace_access_points()?;
            }

            self.map.shuffle(&mut locations);

            for location in &locations {
                let signals = self.map.read(location);
                let central = in_center(location, width, height);
                for (i, (_, algorithm)) in self.algorithms.iter_mut().enumerate() {
                    match algorithm.read(&signals, location)? {
                        Some(estimate) => {
                            let error = location.distance(&estimate);
                            full[i].record_hit(cycle, error);
                            if central {
                                center[i].record_hit(cycle, error);
                            }
                        }
                        None => {
                            full[i].record_miss(cycle);
                            if central {
                                center[i].record_miss(cycle);
                            }
                        }
                    }
                }
            }
            info!("Completed tests for cycle {:2}", cycle);
        }

        info!("Simulation completed");
        let names: Vec<String> = self.algorithms.iter().map(|(n, _)| n.clone()).collect();
        let full: BTreeMap<String, CycleStats> = names.iter().cloned().zip(full).collect();
        let center: BTreeMap<String, CycleStats> = names.iter().cloned().zip(center).collect();
        let full_series = summarize(&full);
        let center_series = summarize(&center);

        for (name, series) in &full_series {
            debug!("{} errors: {:?}", name, series.mean_error);
        }

        self.reporter.cycle_series(Partition::Center, &center_series)?;
        self.reporter.cycle_series(Partition::Full, &full_series)?;

        let last_frame_full = self.last_frame(Partition::Full)?;
        self.reporter.last_frame(Partition::Full, &last_frame_full)?;
        let last_frame_center = self.last_frame(Partition::Center)?;
        self.reporter.last_frame(Partition::Center, &last_frame_center)?;

        Ok(SimulationReport {
            generations: self.generations,
            full,
            center,
            full_series,
            center_series,
            last_frame_full,
            last_frame_center,
        })
    }

    fn seed_grid(&self) -> Vec<Location> {
        grid(
            (0.0, self.config.map_width),
            (0.0, self.config.map_height),
            self.config.seed_distance,
        )
    }

    /// Reads every algorithm once more over a 6×6 interval grid, either
    /// across the map or around its center.
    fn last_frame(&mut self, partition: Partition) -> Result<FrameSnapshot, SimError> {
        let (width, height) = (self.config.map_width, self.config.map_height);
        let locations = match partition {
            Partition::Full => grid(
                (TEST_MARGIN, width - TEST_MARGIN + 1.0),
                (TEST_MARGIN, height - TEST_MARGIN + 1.0),
                (width - 2.0 * TEST_MARGIN) / FRAME_STEPS,
            ),
            Partition::Center => grid(
                (width / 2.0 - FRAME_CENTER_HALF_SIZE, width / 2.0 + FRAME_CENTER_HALF_SIZE),
                (height / 2.0 - FRAME_CENTER_HALF_SIZE, height / 2.0 + FRAME_CENTER_HALF_SIZE),
                2.0 * FRAME_CENTER_HALF_SIZE / FRAME_STEPS,
            ),
        };

        let mut frame = FrameSnapshot::default();
        for (name, _) in &self.algorithms {
            frame.arrows.insert(name.clone(), Vec::new());
        }
        for source in &locations {
            let signals = self.map.read(source);
            for (name, algorithm) in self.algorithms.iter_mut() {
                if let Some(estimate) = algorithm.read(&signals, source)? {
                    frame.arrows.entry(name.clone()).or_default().push(Arrow {
                        source: *source,
                        estimate,
                    });
                }
            }
        }
        Ok(frame)
    }
}

fn summarize(stats: &BTreeMap<String, CycleStats>) -> BTreeMap<String, Series> {
    stats
        .iter()
        .map(|(name, s)| (name.clone(), s.series()))
        .collect()
}

fn in_center(location: &Location, width: f64, height: f64) -> bool {
    let x = (width / 2.0 - CENTER_HALF_SIZE)..=(width / 2.0 + CENTER_HALF_SIZE);
    let y = (height / 2.0 - CENTER_HALF_SIZE)..=(height / 2.0 + CENTER_HALF_SIZE);
    x.contains(&location.x) && y.contains(&location.y)
}

/// Points from the low corner up to the high corner (inclusive), `step`
/// apart, column by column. The step is accumulated, not multiplied.
fn grid(x_range: (f64, f64), y_range: (f64, f64), step: f64) -> Vec<Location> {
    let mut locations = Vec::new();
    if !(step > 0.0) {
        return locations;
    }
    let mut x = x_range.0;
    while x <= x_range.1 {
        let mut y = y_range.0;
        while y <= y_range.1 {
            locations.push(Location::new(x, y));
            y += step;
        }
        x += step;
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Family, Variant};
    use crate::centroid::Centroid;
    use crate::fingerprinting::Fingerprinting;
    use crate::map::AccessPoint;
    use crate::reporter::ReportError;
    use std::{cell::RefCell, collections::HashSet, rc::Rc};

    fn small_config() -> Configuration {
        Configuration {
            map_width: 300.0,
            map_height: 300.0,
            access_point_density: 500,
            seed_distance: 10.0,
            test_distance: 20.0,
            test_cycles: 2,
            replacement_rate: 0.2,
            replacement_strategy: Some(ReplacementStrategy::Fifo),
            random_seed: Some(2024),
            ..Configuration::default()
        }
    }

    #[derive(Default)]
    struct Recorded {
        snapshots: Vec<(usize, Vec<Id>)>,
        series: Vec<Partition>,
        frames: Vec<Partition>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl Reporter for Recorder {
        fn map_snapshot(
            &mut self,
            access_points: &[AccessPoint],
            generations: &[Id],
        ) -> Result<(), ReportError> {
            self.0
                .borrow_mut()
                .snapshots
                .push((access_points.len(), generations.to_vec()));
            Ok(())
        }

        fn cycle_series(
            &mut self,
            partition: Partition,
            _series: &BTreeMap<String, Series>,
        ) -> Result<(), ReportError> {
            self.0.borrow_mut().series.push(partition);
            Ok(())
        }

        fn last_frame(
            &mut self,
            partition: Partition,
            _frame: &FrameSnapshot,
        ) -> Result<(), ReportError> {
            self.0.borrow_mut().frames.push(partition);
            Ok(())
        }
    }

    fn ids(engine: &Engine) -> Vec<Id> {
        engine.map().access_points().iter().map(|ap| ap.id).collect()
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = Configuration {
            access_point_density: 0,
            ..small_config()
        };
        assert!(matches!(
            Engine::new(config),
            Err(SimError::Config(ConfigError::ZeroDensity))
        ));
    }

    #[test]
    fn construction_places_access_points() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let engine =
            Engine::with_reporter(small_config(), Box::new(Recorder(recorded.clone()))).unwrap();
        // 90000 m² at 500 per km²
        assert_eq!(engine.map().len(), 45);
        assert_eq!(engine.generations(), &[45]);
        assert_eq!(recorded.borrow().snapshots, vec![(45, vec![45])]);
    }

    #[test]
    fn fifo_churn_replaces_the_oldest() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.replace_access_points().unwrap();
        // floor(45 * 0.2) = 9
        assert_eq!(ids(&engine), (10..=54).collect::<Vec<_>>());
        assert_eq!(engine.generations(), &[45, 54]);
    }

    #[test]
    fn random_churn_keeps_population_and_fresh_ids() {
        let config = Configuration {
            replacement_rate: 0.5,
            replacement_strategy: Some(ReplacementStrategy::Random),
            ..small_config()
        };
        let mut engine = Engine::new(config).unwrap();
        let mut seen: HashSet<Id> = ids(&engine).into_iter().collect();
        for _ in 0..5 {
            let before = ids(&engine);
            let highest = *before.iter().max().unwrap();
            engine.replace_access_points().unwrap();
            let after = ids(&engine);
            assert_eq!(after.len(), before.len());
            for id in after.iter().filter(|id| !before.contains(id)) {
                assert!(*id > highest);
                assert!(seen.insert(*id), "id {} was reused", id);
            }
            assert_eq!(after.iter().filter(|id| !before.contains(id)).count(), 22);
            assert!(after.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(engine.generations().len(), 6);
    }

    #[test]
    fn zero_rate_churn_changes_nothing() {
        let config = Configuration {
            replacement_rate: 0.0,
            replacement_strategy: None,
            ..small_config()
        };
        let mut engine = Engine::new(config).unwrap();
        let before = ids(&engine);
        engine.replace_access_points().unwrap();
        assert_eq!(ids(&engine), before);
        assert_eq!(engine.generations(), &[45, 45]);
    }

    #[test]
    fn seeding_feeds_every_algorithm_once() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine
            .add_algorithm("Fingerprinting", Box::new(Fingerprinting::new(Variant::Plain)))
            .unwrap();
        engine.seed().unwrap();
        engine.seed().unwrap();

        let mut probe = Fingerprinting::new(Variant::Plain);
        engine.seed_algorithm(&mut probe).unwrap();
        // 0, 10, ..., 300 in both directions
        assert_eq!(probe.len(), 31 * 31);
    }

    #[test]
    fn duplicate_names_replace() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.add_algorithm("A", Box::new(Centroid::new(Variant::Plain))).unwrap();
        engine.add_algorithm("B", Box::new(Centroid::new(Variant::Plain))).unwrap();
        engine.add_algorithm("A", Box::new(Fingerprinting::new(Variant::Plain))).unwrap();
        assert_eq!(engine.algorithm_names(), vec!["A", "B"]);
        engine.add_choice(AlgorithmChoice::new(Family::Centroid, Variant::SmartLearning)).unwrap();
        assert_eq!(engine.algorithm_names(), vec!["A", "B", "Smart Learning Centroid"]);
    }

    #[test]
    fn registration_closes_after_seeding() {
        let mut engine = Engine::new(small_config()).unwrap();
        engine.add_choice(AlgorithmChoice::new(Family::Centroid, Variant::Plain)).unwrap();
        engine.seed().unwrap();
        let late = engine.add_choice(AlgorithmChoice::new(Family::Fingerprinting, Variant::Plain));
        assert!(matches!(late, Err(SimError::LateRegistration(name)) if name == "Fingerprinting"));
        assert_eq!(engine.algorithm_names(), vec!["Centroid"]);
    }

    #[test]
    fn run_counts_every_test_location() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut engine =
            Engine::with_reporter(small_config(), Box::new(Recorder(recorded.clone()))).unwrap();
        for choice in AlgorithmChoice::all() {
            engine.add_choice(choice).unwrap();
        }
        let report = engine.run().unwrap();

        // 85, 105, ..., 205 in both directions
        let tests = 7 * 7;
        assert_eq!(report.generations.len(), 3);
        assert_eq!(report.full.len(), 10);
        for (name, stats) in &report.full {
            assert_eq!(stats.cycles(), 3);
            let central = &report.center[name];
            for cycle in 0..3 {
                assert_eq!(stats.hits(cycle) + stats.misses(cycle), tests);
                // The whole test grid lies in the center of a small map
                assert_eq!(central.hits(cycle), stats.hits(cycle));
                assert!(stats.errors(cycle).iter().all(|e| *e >= 0.0));
            }
            assert_eq!(report.full_series[name].mean_error.len(), 3);
        }

        let recorded = recorded.borrow();
        assert_eq!(recorded.snapshots.len(), 3);
        assert_eq!(recorded.series, vec![Partition::Center, Partition::Full]);
        assert_eq!(recorded.frames, vec![Partition::Full, Partition::Center]);
        assert_eq!(report.last_frame_full.arrows.len(), 10);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut engine = Engine::new(small_config()).unwrap();
            for (family, variant) in [
                (Family::Centroid, Variant::Learning),
                (Family::Fingerprinting, Variant::Learning),
                (Family::Fingerprinting, Variant::Enhanced),
            ] {
                engine.add_choice(AlgorithmChoice::new(family, variant)).unwrap();
            }
            engine.run().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn centroid_estimates_are_close_with_dense_seeding() {
        let config = Configuration {
            map_width: 500.0,
            map_height: 500.0,
            access_point_density: 1500,
            seed_distance: 5.0,
            test_distance: 10.0,
            test_cycles: 0,
            random_seed: Some(7),
            ..Configuration::default()
        };
        let mut engine = Engine::new(config).unwrap();
        engine.add_choice(AlgorithmChoice::new(Family::Centroid, Variant::Plain)).unwrap();
        let report = engine.run().unwrap();
        let stats = &report.full["Centroid"];
        assert!(stats.hits(0) > 0);
        let mean = report.full_series["Centroid"].mean_error[0].unwrap();
        assert!(mean < 30.0, "mean error {}", mean);
    }

    #[test]
    fn tiny_map_has_no_test_locations() {
        let config = Configuration {
            map_width: 160.0,
            map_height: 160.0,
            test_cycles: 0,
            replacement_rate: 0.0,
            replacement_strategy: None,
            ..small_config()
        };
        let mut engine = Engine::new(config).unwrap();
        engine.add_choice(AlgorithmChoice::new(Family::Centroid, Variant::Plain)).unwrap();
        let report = engine.run().unwrap();
        let series = &report.full_series["Centroid"];
        assert_eq!(series.mean_error, vec![None]);
        assert_eq!(series.miss_percentage, vec![None]);
    }

    #[test]
    fn crowded_map_overflows_fingerprint_keys() {
        let config = Configuration {
            map_width: 200.0,
            map_height: 200.0,
            access_point_density: 20_000,
            seed_distance: 50.0,
            ..small_config()
        };
        let mut engine = Engine::new(config).unwrap();
        engine.add_choice(AlgorithmChoice::new(Family::Fingerprinting, Variant::Plain)).unwrap();
        assert!(matches!(engine.run(), Err(SimError::Capacity(_))));
    }

    #[test]
    fn grid_without_a_positive_step_is_empty() {
        assert!(grid((85.0, 86.0), (85.0, 86.0), 0.0).is_empty());
        assert!(grid((85.0, 76.0), (85.0, 76.0), -1.5).is_empty());
    }

    #[test]
    fn grid_is_inclusive() {
        let points = grid((0.0, 20.0), (5.0, 15.0), 10.0);
        assert_eq!(points.len(), 3 * 2);
        assert_eq!(points[0], Location::new(0.0, 5.0));
        assert_eq!(points[5], Location::new(20.0, 15.0));
    }
}
