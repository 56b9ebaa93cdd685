//! Bootstrap confidence intervals for projections.
//!
//! Every draw gets its own random stream, derived from the run seed, the series being projected
//! and the draw index. Draws can therefore be evaluated in any order, on any thread, and still give
//! identical results.
use super::fit::{HistoryPoint, fit};
use super::ProjectionMethod;
use crate::model::MovingAverageParameters;
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

/// Derive the key for the random streams of one company and projection method.
///
/// The key depends only on the run seed, the company and the method, so a company's results do not
/// change when other companies are added to the run.
pub fn series_key(seed: u64, company: &str, method: ProjectionMethod) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(company.as_bytes());
    hasher.update([0u8]); // separator
    hasher.update(method.to_string().as_bytes());

    let mut key = [0; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

/// The random number generator for one bootstrap draw, which gets its own ChaCha stream
fn draw_rng(key: [u8; 32], draw: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::from_seed(key);
    rng.set_stream(u64::from(draw));
    rng
}

/// Resample `history` with replacement, keeping the same size, and sort the result by year
fn resample(history: &[HistoryPoint], rng: &mut ChaCha8Rng) -> Vec<HistoryPoint> {
    (0..history.len())
        .map(|_| history[rng.gen_range(0..history.len())])
        .sorted_by_key(|(year, _)| *year)
        .collect()
}

/// Get the `q`th quantile of sorted `values`, interpolating linearly between order statistics
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Settings for a set of bootstrap draws
#[derive(Debug, Clone, Copy)]
pub struct BootstrapOptions<'a> {
    /// The fitting method
    pub method: ProjectionMethod,
    /// Settings for the moving average method
    pub moving_average: &'a MovingAverageParameters,
    /// Number of resamples to draw
    pub samples: u32,
    /// Confidence level for the interval, in (0, 1)
    pub confidence_level: f64,
    /// Key for this series' random streams, from [`series_key`]
    pub key: [u8; 32],
}

/// Refit the method to one resample and evaluate it at each of `years`.
///
/// Returns `None` if the fit fails or any prediction is not finite.
fn draw_predictions(
    history: &[HistoryPoint],
    years: &[u32],
    options: &BootstrapOptions,
    draw: u32,
) -> Option<Vec<f64>> {
    let mut rng = draw_rng(options.key, draw);
    let sample = resample(history, &mut rng);
    let fitted = fit(options.method, &sample, options.moving_average)?;

    let predictions = years.iter().map(|year| fitted.predict(*year)).collect_vec();
    predictions
        .iter()
        .all(|value| value.is_finite())
        .then_some(predictions)
}

/// Calculate bootstrap confidence intervals for each of `years`.
///
/// Draws whose refit fails are discarded.
///
/// # Returns
///
/// A (lower, upper) pair for each year, or `None` if every draw failed.
pub fn bootstrap_intervals(
    history: &[HistoryPoint],
    years: &[u32],
    options: &BootstrapOptions,
) -> Option<Vec<(f64, f64)>> {
    let draws = (0..options.samples)
        .into_par_iter()
        .filter_map(|draw| draw_predictions(history, years, options, draw))
        .collect::<Vec<_>>();

    if draws.is_empty() {
        return None;
    }

    let lower_q = (1.0 - options.confidence_level) / 2.0;
    let upper_q = (1.0 + options.confidence_level) / 2.0;
    let intervals = (0..years.len())
        .map(|i| {
            let values = draws
                .iter()
                .map(|predictions| predictions[i])
                .sorted_by(f64::total_cmp)
                .collect_vec();
            (percentile(&values, lower_q), percentile(&values, upper_q))
        })
        .collect();

    Some(intervals)
}
