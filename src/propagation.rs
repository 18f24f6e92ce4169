//! The radio model. Detection gets less likely with distance, and the
//! strength of a detected signal gets noisier as it gets weaker.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lowest strength bucket in a [`Profile`] histogram, in dBm.
pub const PROFILE_MIN_DBM: i32 = -100;
/// One past the highest strength bucket in a [`Profile`] histogram, in dBm.
pub const PROFILE_MAX_DBM: i32 = -50;

/// Probability that a signal is received at `distance` meters.
///
/// This is not clamped. Below roughly 11m it is above 1 and beyond roughly
/// 85m it is negative, which makes reception certain or impossible.
pub fn reception_probability(distance: f64) -> f64 {
    0.6 - (distance / 64.0 + 0.5).ln()
}

/// Median received signal strength at `distance` meters, in dBm.
pub fn median_strength(distance: f64) -> f64 {
    -58.0 - 14.0 * (distance + 5.0).log10()
}

/// Draws whether a signal at `distance` meters is received.
pub fn signal_received(distance: f64, rng: &mut impl Rng) -> bool {
    rng.gen::<f64>() < reception_probability(distance)
}

/// Draws a signal strength for `distance` meters: the median plus a normal
/// sample whose standard deviation grows as the median drops.
pub fn signal_strength(distance: f64, rng: &mut impl Rng) -> f64 {
    let rss = median_strength(distance);
    let stddev = 0.0497 * rss + 6.3438;
    let theta = 2.0 * PI * rng.gen::<f64>();
    let rho = (-2.0 * (1.0 - rng.gen::<f64>()).ln()).sqrt();
    rss + stddev * rho * theta.sin()
}

/// Response rates and strength histograms measured by sampling the model,
/// one entry per distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The distances that were sampled, in meters
    pub distances: Vec<f64>,
    /// Percentage of trials in which a signal was received
    pub response_rates: Vec<f64>,
    /// For each distance, the percentage of received readings that fell in
    /// each 1 dBm bucket from [`PROFILE_MIN_DBM`] up to [`PROFILE_MAX_DBM`]
    pub histograms: Vec<Vec<f64>>,
    /// [`median_strength`] at each distance
    pub medians: Vec<f64>,
}

impl Profile {
    /// Samples the model `trials` times at every distance.
    pub fn measure(distances: &[f64], trials: usize, rng: &mut impl Rng) -> Self {
        let buckets = (PROFILE_MAX_DBM - PROFILE_MIN_DBM) as usize;
        let mut counts = vec![vec![0usize; buckets]; distances.len()];
        let mut received = vec![0usize; distances.len()];

        for _ in 0..trials {
            for (i, &distance) in distances.iter().enumerate() {
                if !signal_received(distance, rng) {
                    continue;
                }
                received[i] += 1;
                // Truncation toward zero, the same bucketing as `as i32`
                let dbm = signal_strength(distance, rng) as i32;
                if (PROFILE_MIN_DBM..PROFILE_MAX_DBM).contains(&dbm) {
                    counts[i][(dbm - PROFILE_MIN_DBM) as usize] += 1;
                }
            }
        }

        let histograms = counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|&c| {
                        if total == 0 {
                            0.0
                        } else {
                            c as f64 / total as f64 * 100.0
                        }
                    })
                    .collect()
            })
            .collect();

        let response_rates = received
            .iter()
            .map(|&r| {
                if trials == 0 {
                    0.0
                } else {
                    r as f64 / trials as f64 * 100.0
                }
            })
            .collect();

        Self {
            distances: distances.to_vec(),
            response_rates,
            histograms,
            medians: distances.iter().map(|&d| median_strength(d)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn reception_probability_formula() {
        for d in [0.0, 5.0, 32.0, 64.0, 100.0] {
            let expected = 0.6 - (d / 64.0 + 0.5_f64).ln();
            assert_eq!(reception_probability(d), expected);
        }
    }

    #[test]
    fn reception_probability_decays() {
        let mut last = reception_probability(0.0);
        for step in 1..500 {
            let p = reception_probability(step as f64 * 0.5);
            assert!(p <= last);
            last = p;
        }
    }

    #[test]
    fn reception_is_certain_close_and_impossible_far() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(reception_probability(5.0) > 1.0);
        assert!(reception_probability(100.0) < 0.0);
        for _ in 0..1000 {
            assert!(signal_received(5.0, &mut rng));
            assert!(!signal_received(100.0, &mut rng));
        }
    }

    #[test]
    fn median_strength_at_five_meters() {
        // log10(10) == 1
        assert!((median_strength(5.0) - -72.0).abs() < 1e-12);
    }

    #[test]
    fn strength_centers_on_median() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;
        let mean = (0..n).map(|_| signal_strength(40.0, &mut rng)).sum::<f64>() / n as f64;
        assert!((mean - median_strength(40.0)).abs() < 0.2);
    }

    #[test]
    fn profile_rates_follow_distance() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let profile = Profile::measure(&[5.0, 50.0, 100.0], 2000, &mut rng);
        assert_eq!(profile.response_rates[0], 100.0);
        assert!(profile.response_rates[1] > 0.0 && profile.response_rates[1] < 100.0);
        assert_eq!(profile.response_rates[2], 0.0);
        let total: f64 = profile.histograms[0].iter().sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(profile.histograms[2].iter().all(|&p| p == 0.0));
        assert_eq!(profile.medians.len(), 3);
    }
}
