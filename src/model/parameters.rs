//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::projection::{MovingAveragePolicy, ProjectionMethod};
use crate::units::EmissionFactor;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_use_technology_rates, bool, true);
define_param_default!(default_methods, Vec<ProjectionMethod>, vec![ProjectionMethod::Linear]);
define_param_default!(default_confidence_level, f64, 0.95);
define_param_default!(default_bootstrap_samples, u32, 1000);
define_param_default!(default_min_history_years, u32, 2);
define_param_default!(default_window, usize, 3);
define_param_default!(default_trend_min_years, u32, 5);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The first year of the analysis window
    pub start_year: u32,
    /// The last year of the analysis window (inclusive)
    pub end_year: u32,
    /// Emission factor for technologies without an entry in the emission factors table
    pub default_emission_factor: EmissionFactor,
    /// Whether to use technology-specific utilisation rates.
    ///
    /// If false, only country-level rates are used.
    #[serde(default = "default_use_technology_rates")]
    pub use_technology_rates: bool,
    /// Minimum number of years of history for a company to appear in the trend table
    #[serde(default = "default_trend_min_years")]
    pub trend_min_years: u32,
    /// Settings for emissions projections
    #[serde(default)]
    pub projection: ProjectionParameters,
}

/// Settings for emissions projections
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectionParameters {
    /// The methods to project with, in output order
    #[serde(default = "default_methods")]
    pub methods: Vec<ProjectionMethod>,
    /// The future years to project
    #[serde(default)]
    pub years: Vec<u32>,
    /// Confidence level for the bootstrap interval
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Number of bootstrap resamples per company and method
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: u32,
    /// Seed for the bootstrap random streams
    #[serde(default)]
    pub seed: u64,
    /// Minimum number of years of history needed to project a company
    #[serde(default = "default_min_history_years")]
    pub min_history_years: u32,
    /// Settings for the moving average method
    #[serde(default)]
    pub moving_average: MovingAverageParameters,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            years: Vec::new(),
            confidence_level: default_confidence_level(),
            bootstrap_samples: default_bootstrap_samples(),
            seed: 0,
            min_history_years: default_min_history_years(),
            moving_average: MovingAverageParameters::default(),
        }
    }
}

/// Settings for the moving average projection method
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MovingAverageParameters {
    /// Number of most recent years to average over
    #[serde(default = "default_window")]
    pub window: usize,
    /// How to extrapolate from the average
    #[serde(default)]
    pub policy: MovingAveragePolicy,
}

impl Default for MovingAverageParameters {
    fn default() -> Self {
        Self {
            window: default_window(),
            policy: MovingAveragePolicy::default(),
        }
    }
}

/// Check that the analysis window is valid
fn check_years(start_year: u32, end_year: u32) -> Result<()> {
    ensure!(
        start_year <= end_year,
        "start_year ({start_year}) cannot be later than end_year ({end_year})"
    );

    Ok(())
}

/// Check that the projection methods are valid
fn check_methods(methods: &[ProjectionMethod]) -> Result<()> {
    ensure!(!methods.is_empty(), "`projection.methods` is empty");
    ensure!(
        methods.iter().all_unique(),
        "`projection.methods` cannot contain duplicates"
    );

    Ok(())
}

/// Check that projection years are in order and all after the analysis window
fn check_projection_years(years: &[u32], end_year: u32) -> Result<()> {
    ensure!(
        is_sorted_and_unique(years),
        "`projection.years` must be composed of unique values in order"
    );
    ensure!(
        years.iter().all(|year| *year > end_year),
        "`projection.years` must all be after end_year ({end_year})"
    );

    Ok(())
}

/// Check the `confidence_level` parameter is valid
fn check_confidence_level(value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && value < 1.0,
        "confidence_level must be a number strictly between 0 and 1"
    );

    Ok(())
}

/// Check the `bootstrap_samples` parameter is valid
fn check_bootstrap_samples(value: u32) -> Result<()> {
    ensure!(value > 0, "bootstrap_samples cannot be zero");

    Ok(())
}

/// Check the `min_history_years` parameter is valid
fn check_min_history_years(value: u32) -> Result<()> {
    ensure!(
        value >= 2,
        "min_history_years must be at least 2, as a trend cannot be fitted to one point"
    );

    Ok(())
}

/// Check the `trend_min_years` parameter is valid
fn check_trend_min_years(value: u32) -> Result<()> {
    ensure!(value >= 2, "trend_min_years must be at least 2");

    Ok(())
}

/// Check the `moving_average.window` parameter is valid
fn check_window(value: usize) -> Result<()> {
    ensure!(value > 0, "moving_average.window cannot be zero");

    Ok(())
}

impl ProjectionParameters {
    /// Validate projection parameters
    fn validate(&self, end_year: u32) -> Result<()> {
        check_methods(&self.methods)?;
        check_projection_years(&self.years, end_year)?;
        check_confidence_level(self.confidence_level)?;
        check_bootstrap_samples(self.bootstrap_samples)?;
        check_min_history_years(self.min_history_years)?;
        check_window(self.moving_average.window)?;

        Ok(())
    }
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(self.start_year, self.end_year)?;
        check_trend_min_years(self.trend_min_years)?;

        // default_emission_factor is checked along with the emission factors table

        self.projection.validate(self.end_year)?;

        Ok(())
    }

    /// The years of the analysis window
    pub fn years(&self) -> std::ops::RangeInclusive<u32> {
        self.start_year..=self.end_year
    }
}
