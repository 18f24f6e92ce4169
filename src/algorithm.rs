//! Defines the [`Algorithm`] trait shared by every localization algorithm,
//! and the names used to pick one.

use crate::centroid::Centroid;
use crate::fingerprinting::Fingerprinting;
use crate::location::Location;
use crate::signal::{KeyCapacityError, Signal};

use std::{fmt, str::FromStr};

///
/// A localization algorithm. It is trained with readings taken at known
/// locations, and asked to estimate the location of new readings.
///
pub trait Algorithm {
    /// Records that `signals` were observed at `location`.
    fn feed(&mut self, signals: &[Signal], location: &Location) -> Result<(), KeyCapacityError>;

    /// Estimates where `signals` were observed. `truth` is the real location;
    /// only enhanced variants look at it, and only after the estimate is
    /// made. Returns `Ok(None)` when nothing the algorithm has seen supports
    /// an estimate.
    fn read(
        &mut self,
        signals: &[Signal],
        truth: &Location,
    ) -> Result<Option<Location>, KeyCapacityError>;
}

/// The two kinds of algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Averages the positions each access point has been seen from
    Centroid,
    /// Matches readings against a database of earlier readings
    Fingerprinting,
}

/// The behaviours layered on top of a [`Family`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Estimates only
    #[default]
    Plain,
    /// Gets help from the real location
    Enhanced,
    /// Trains itself on its own estimates
    Learning,
    /// Both of the above
    EnhancedLearning,
    /// Learning, but bounded or batched
    SmartLearning,
}

impl Variant {
    /// All variants, in display order.
    pub const ALL: [Variant; 5] = [
        Variant::Plain,
        Variant::Enhanced,
        Variant::Learning,
        Variant::EnhancedLearning,
        Variant::SmartLearning,
    ];

    /// True if the variant may use the real location.
    pub fn is_enhanced(self) -> bool {
        matches!(self, Variant::Enhanced | Variant::EnhancedLearning)
    }

    /// True if the variant feeds its own estimates back.
    pub fn is_learning(self) -> bool {
        matches!(
            self,
            Variant::Learning | Variant::EnhancedLearning | Variant::SmartLearning
        )
    }

    /// True if the variant limits its self-training.
    pub fn is_smart(self) -> bool {
        matches!(self, Variant::SmartLearning)
    }

    fn prefix(self) -> &'static str {
        match self {
            Variant::Plain => "",
            Variant::Enhanced => "Enhanced ",
            Variant::Learning => "Learning ",
            Variant::EnhancedLearning => "Enhanced Learning ",
            Variant::SmartLearning => "Smart Learning ",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Variant::Plain => "",
            Variant::Enhanced => "enhanced-",
            Variant::Learning => "learning-",
            Variant::EnhancedLearning => "enhanced-learning-",
            Variant::SmartLearning => "smart-learning-",
        }
    }
}

/// A family and variant, i.e. one concrete algorithm. Parses from names like
/// `smart-learning-centroid` and displays as `Smart Learning Centroid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorithmChoice {
    /// Which family
    pub family: Family,
    /// Which variant of it
    pub variant: Variant,
}

impl AlgorithmChoice {
    /// Creates a new [`AlgorithmChoice`].
    pub fn new(family: Family, variant: Variant) -> Self {
        Self { family, variant }
    }

    /// Every family and variant combination.
    pub fn all() -> Vec<Self> {
        [Family::Centroid, Family::Fingerprinting]
            .into_iter()
            .flat_map(|family| Variant::ALL.into_iter().map(move |v| Self::new(family, v)))
            .collect()
    }

    /// Builds a fresh, untrained algorithm.
    pub fn build(self) -> Box<dyn Algorithm> {
        match self.family {
            Family::Centroid => Box::new(Centroid::new(self.variant)),
            Family::Fingerprinting => Box::new(Fingerprinting::new(self.variant)),
        }
    }

    /// The kebab-case name accepted by [`FromStr`].
    pub fn slug(self) -> String {
        let family = match self.family {
            Family::Centroid => "centroid",
            Family::Fingerprinting => "fingerprinting",
        };
        format!("{}{}", self.variant.slug(), family)
    }
}

impl fmt::Display for AlgorithmChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family {
            Family::Centroid => "Centroid",
            Family::Fingerprinting => "Fingerprinting",
        };
        write!(f, "{}{}", self.variant.prefix(), family)
    }
}

impl FromStr for AlgorithmChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Self::all()
            .into_iter()
            .find(|choice| choice.slug() == wanted)
            .ok_or_else(|| format!("unknown algorithm '{}'", s))
    }
}
