//! Trend models fitted to a company's historical emissions.
use super::{MovingAveragePolicy, ProjectionMethod};
use crate::model::MovingAverageParameters;
use itertools::Itertools;

/// A point in a historical series: (year, value)
pub type HistoryPoint = (u32, f64);

/// A fitted trend, which can be evaluated at any year
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fit {
    /// A straight line through the means of the data
    Linear {
        /// Mean of the years
        x_mean: f64,
        /// Mean of the values
        y_mean: f64,
        /// Change in value per year
        slope: f64,
    },
    /// A straight line in log space
    Exponential {
        /// Mean of the years
        x_mean: f64,
        /// Mean of the log values
        log_mean: f64,
        /// Change in log value per year
        slope: f64,
    },
    /// Compound growth from the most recent point
    GrowthRate {
        /// The most recent year
        last_year: u32,
        /// The value in the most recent year
        last_value: f64,
        /// Mean annual growth rate
        rate: f64,
    },
    /// A constant level
    Level {
        /// The projected value
        level: f64,
    },
}

impl Fit {
    /// Evaluate the fitted trend at `year`
    pub fn predict(&self, year: u32) -> f64 {
        let year = f64::from(year);
        match *self {
            Self::Linear {
                x_mean,
                y_mean,
                slope,
            } => y_mean + slope * (year - x_mean),
            Self::Exponential {
                x_mean,
                log_mean,
                slope,
            } => (log_mean + slope * (year - x_mean)).exp(),
            Self::GrowthRate {
                last_year,
                last_value,
                rate,
            } => last_value * (1.0 + rate).powf(year - f64::from(last_year)),
            Self::Level { level } => level,
        }
    }
}

/// Ordinary least squares fit of `ys` against `xs`, returning (x_mean, y_mean, slope).
///
/// If all the x values are the same, the slope is zero.
fn least_squares(xs: &[f64], ys: &[f64]) -> (f64, f64, f64) {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let (sxx, sxy) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
            let dx = x - x_mean;
            (sxx + dx * dx, sxy + dx * (y - y_mean))
        });
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    (x_mean, y_mean, slope)
}

/// The least squares slope of a series, in value per year
pub fn linear_slope(history: &[HistoryPoint]) -> f64 {
    let xs = history.iter().map(|(year, _)| f64::from(*year)).collect_vec();
    let ys = history.iter().map(|(_, value)| *value).collect_vec();
    least_squares(&xs, &ys).2
}

/// Fit a linear trend
fn fit_linear(history: &[HistoryPoint]) -> Fit {
    let xs = history.iter().map(|(year, _)| f64::from(*year)).collect_vec();
    let ys = history.iter().map(|(_, value)| *value).collect_vec();
    let (x_mean, y_mean, slope) = least_squares(&xs, &ys);

    Fit::Linear {
        x_mean,
        y_mean,
        slope,
    }
}

/// Fit an exponential trend. Fails if any value is not positive.
fn fit_exponential(history: &[HistoryPoint]) -> Option<Fit> {
    if history.iter().any(|(_, value)| *value <= 0.0) {
        return None;
    }

    let xs = history.iter().map(|(year, _)| f64::from(*year)).collect_vec();
    let ys = history.iter().map(|(_, value)| value.ln()).collect_vec();
    let (x_mean, log_mean, slope) = least_squares(&xs, &ys);

    Some(Fit::Exponential {
        x_mean,
        log_mean,
        slope,
    })
}

/// Fit a moving average over the last `window` points of `history`.
///
/// For [`MovingAveragePolicy::GrowthRate`], each pair of consecutive points gives an annualised
/// growth rate; pairs in the same year are skipped. Growth from a non-positive value is undefined,
/// so the fit fails in that case.
fn fit_moving_average(history: &[HistoryPoint], params: &MovingAverageParameters) -> Option<Fit> {
    let recent = &history[history.len().saturating_sub(params.window)..];
    let &(last_year, last_value) = recent.last()?;

    match params.policy {
        MovingAveragePolicy::Level => {
            let level = recent.iter().map(|(_, value)| value).sum::<f64>() / recent.len() as f64;
            Some(Fit::Level { level })
        }
        MovingAveragePolicy::GrowthRate => {
            let mut rates = Vec::new();
            for (&(x0, y0), &(x1, y1)) in recent.iter().tuple_windows() {
                if x1 == x0 {
                    continue;
                }
                if y0 <= 0.0 || y1 < 0.0 {
                    return None;
                }

                rates.push((y1 / y0).powf(1.0 / f64::from(x1 - x0)) - 1.0);
            }

            let rate = if rates.is_empty() {
                0.0
            } else {
                rates.iter().sum::<f64>() / rates.len() as f64
            };

            Some(Fit::GrowthRate {
                last_year,
                last_value,
                rate,
            })
        }
    }
}

/// Fit a trend to a historical series, which must be sorted by year and non-empty.
///
/// # Returns
///
/// The fitted trend or `None` if the method cannot be applied to this data.
pub fn fit(
    method: ProjectionMethod,
    history: &[HistoryPoint],
    moving_average: &MovingAverageParameters,
) -> Option<Fit> {
    if history.is_empty() || history.iter().any(|(_, value)| !value.is_finite()) {
        return None;
    }

    match method {
        ProjectionMethod::Linear => Some(fit_linear(history)),
        ProjectionMethod::Exponential => fit_exponential(history),
        ProjectionMethod::MovingAverage => fit_moving_average(history, moving_average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn moving_average(window: usize, policy: MovingAveragePolicy) -> MovingAverageParameters {
        MovingAverageParameters { window, policy }
    }

    #[test]
    fn test_linear_slope() {
        assert_approx_eq!(
            f64,
            linear_slope(&[(2020, 10.0), (2021, 11.0), (2022, 15.0)]),
            2.5
        );
        assert_eq!(linear_slope(&[(2020, 10.0)]), 0.0);
    }

    #[test]
    fn test_fit_linear_exact() {
        let history = [(2020, 10.0), (2021, 12.0), (2022, 14.0)];
        let fit = fit(
            ProjectionMethod::Linear,
            &history,
            &MovingAverageParameters::default(),
        )
        .unwrap();
        assert_approx_eq!(f64, fit.predict(2025), 20.0, epsilon = 1e-9);
        assert_approx_eq!(f64, fit.predict(2020), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_linear_single_year() {
        // Every point in the same year, e.g. from a resample
        let history = [(2020, 10.0), (2020, 14.0)];
        let fit = fit_linear(&history);
        assert_eq!(
            fit,
            Fit::Linear {
                x_mean: 2020.0,
                y_mean: 12.0,
                slope: 0.0
            }
        );
    }

    #[test]
    fn test_fit_exponential() {
        let history = [(2020, 100.0), (2021, 110.0), (2022, 121.0)];
        let fit = fit_exponential(&history).unwrap();
        assert_approx_eq!(f64, fit.predict(2023), 133.1, epsilon = 1e-6);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    fn test_fit_exponential_non_positive(#[case] value: f64) {
        let history = [(2020, 100.0), (2021, value), (2022, 121.0)];
        assert_eq!(fit_exponential(&history), None);
    }

    #[test]
    fn test_fit_moving_average_growth_rate() {
        // Only the last three points are used: growth of 10% then 20%
        let history = [
            (2018, 1.0),
            (2019, 50.0),
            (2020, 100.0),
            (2021, 110.0),
            (2022, 132.0),
        ];
        let fit = fit_moving_average(
            &history,
            &moving_average(3, MovingAveragePolicy::GrowthRate),
        )
        .unwrap();
        let Fit::GrowthRate {
            last_year,
            last_value,
            rate,
        } = fit
        else {
            panic!("Unexpected fit: {fit:?}");
        };
        assert_eq!(last_year, 2022);
        assert_approx_eq!(f64, last_value, 132.0);
        assert_approx_eq!(f64, rate, 0.15, epsilon = 1e-12);
        assert_approx_eq!(f64, fit.predict(2024), 132.0 * 1.15 * 1.15, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_moving_average_annualised() {
        // A gap of two years with 21% total growth is 10% per year
        let history = [(2020, 100.0), (2022, 121.0)];
        let fit = fit_moving_average(
            &history,
            &moving_average(3, MovingAveragePolicy::GrowthRate),
        )
        .unwrap();
        assert_approx_eq!(f64, fit.predict(2023), 133.1, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_moving_average_growth_from_zero() {
        let history = [(2020, 0.0), (2021, 10.0)];
        assert_eq!(
            fit_moving_average(
                &history,
                &moving_average(3, MovingAveragePolicy::GrowthRate)
            ),
            None
        );
    }

    #[test]
    fn test_fit_moving_average_duplicate_years() {
        // No usable pairs, so the value is held flat
        let history = [(2020, 5.0), (2020, 7.0)];
        let fit = fit_moving_average(
            &history,
            &moving_average(3, MovingAveragePolicy::GrowthRate),
        )
        .unwrap();
        assert_approx_eq!(f64, fit.predict(2030), 7.0);
    }

    #[test]
    fn test_fit_moving_average_level() {
        let history = [(2019, 100.0), (2020, 3.0), (2021, 6.0), (2022, 9.0)];
        let fit = fit_moving_average(&history, &moving_average(3, MovingAveragePolicy::Level))
            .unwrap();
        assert_eq!(fit, Fit::Level { level: 6.0 });
        assert_approx_eq!(f64, fit.predict(2040), 6.0);
    }

    #[test]
    fn test_fit_non_finite() {
        let history = [(2020, 1.0), (2021, f64::NAN)];
        assert_eq!(
            fit(
                ProjectionMethod::Linear,
                &history,
                &MovingAverageParameters::default()
            ),
            None
        );
    }
}
