//! Where simulation results go. The engine never draws or writes anything
//! itself; it hands results to a [`Reporter`] as they become available.
//! [`RonReporter`] writes them out as RON files for an external plotting
//! tool to pick up.

use crate::config::Configuration;
use crate::map::AccessPoint;
use crate::signal::Id;
use crate::stats::{FrameSnapshot, Partition, Series};

use serde::Serialize;
use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

/// Returned when a reporter fails to store results.
#[derive(Debug)]
pub enum ReportError {
    /// Returned when creating a directory or writing a file fails.
    IoError(std::io::Error),

    /// Returned when serialization fails.
    RonError(ron::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ReportError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ReportError::RonError(error) => Cow::from(format!("ron error: {}", error)),
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for ReportError {}

///
/// Receives results from the engine. Every method defaults to discarding
/// what it is given.
///
pub trait Reporter {
    /// The live access points, after setup and after every churn.
    /// `generations` holds the highest id of every generation so far.
    fn map_snapshot(
        &mut self,
        _access_points: &[AccessPoint],
        _generations: &[Id],
    ) -> Result<(), ReportError> {
        Ok(())
    }

    /// Per-cycle mean error and miss percentage, keyed by algorithm name.
    fn cycle_series(
        &mut self,
        _partition: Partition,
        _series: &BTreeMap<String, Series>,
    ) -> Result<(), ReportError> {
        Ok(())
    }

    /// Estimates over a coarse grid after the last cycle, for the full map
    /// or the center patch.
    fn last_frame(
        &mut self,
        _partition: Partition,
        _frame: &FrameSnapshot,
    ) -> Result<(), ReportError> {
        Ok(())
    }
}

/// A [`Reporter`] that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

#[derive(Serialize)]
struct MapFile<'a> {
    generations: &'a [Id],
    access_points: &'a [AccessPoint],
}

/// A [`Reporter`] that writes one RON file per call into an output
/// directory. Map snapshots go to `maps/map<N>.ron`, where `N` is the number
/// of generations so far.
#[derive(Debug, Clone)]
pub struct RonReporter {
    dir: PathBuf,
    run_tag: String,
}

impl RonReporter {
    /// Creates a reporter writing into `config.output_dir`, naming files
    /// after the run settings.
    pub fn new(config: &Configuration) -> Self {
        let strategy = config
            .replacement_strategy
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        let run_tag = format!(
            "dens{}-dist{:.0}-Cyc{}-{}-{}",
            config.access_point_density / 100,
            config.seed_distance,
            config.test_cycles,
            (config.replacement_rate * 100.0) as i64,
            strategy,
        );
        Self {
            dir: config.output_dir.clone(),
            run_tag,
        }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File stem for cycle series: the run settings plus one letter per
    /// trait of each algorithm.
    pub fn series_stem(&self, names: impl IntoIterator<Item = impl AsRef<str>>) -> String {
        const LETTERS: [(&str, char); 4] = [
            ("Enhanced", 'E'),
            ("Learning", 'L'),
            ("Centroid", 'C'),
            ("Fingerprinting", 'F'),
        ];
        let mut letters = String::new();
        for name in names {
            let name = name.as_ref();
            for (word, letter) in LETTERS {
                if name.contains(word) {
                    letters.push(letter);
                }
            }
        }
        format!("{}-{}", self.run_tag, letters)
    }

    fn write(&self, path: &Path, value: &impl Serialize) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ReportError::IoError)?;
        }
        let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(ReportError::RonError)?;
        fs::write(path, text).map_err(ReportError::IoError)
    }
}

impl Reporter for RonReporter {
    fn map_snapshot(
        &mut self,
        access_points: &[AccessPoint],
        generations: &[Id],
    ) -> Result<(), ReportError> {
        let path = self
            .dir
            .join("maps")
            .join(format!("map{}.ron", generations.len()));
        self.write(
            &path,
            &MapFile {
                generations,
                access_points,
            },
        )
    }

    fn cycle_series(
        &mut self,
        partition: Partition,
        series: &BTreeMap<String, Series>,
    ) -> Result<(), ReportError> {
        let stem = self.series_stem(series.keys());
        let path = self.dir.join(format!("{}-{}.ron", stem, partition));
        self.write(&path, series)
    }

    fn last_frame(
        &mut self,
        partition: Partition,
        frame: &FrameSnapshot,
    ) -> Result<(), ReportError> {
        let suffix = match partition {
            Partition::Full => "full",
            Partition::Center => "center",
        };
        for (name, arrows) in &frame.arrows {
            let path = self.dir.join(format!("{}-{}.ron", name, suffix));
            self.write(&path, arrows)?;
        }
        Ok(())
    }
}
