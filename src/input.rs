//! Common routines for handling input data.
use crate::emissions::EmissionFactors;
use crate::model::{Model, ModelParameters};
use crate::plant::PlantRecord;
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

mod emission_factor;
use emission_factor::read_emission_factors;
mod national_production;
use national_production::read_national_production;
mod plant;
use plant::read_plants;
mod utilisation;
use utilisation::read_utilisation_rates;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) and the unvalidated plant records or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<(Model, Vec<PlantRecord>)> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let utilisation_rates = read_utilisation_rates(model_dir)?;
    let factors = read_emission_factors(model_dir)?;
    let emission_factors = EmissionFactors::new(factors, parameters.default_emission_factor)
        .context("Invalid emission factors")?;
    let national_production = read_national_production(model_dir)?;
    let plants = read_plants(model_dir)?;
    debug!("Read {} plant records", plants.len());

    let model = Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        utilisation_rates,
        emission_factors,
        national_production,
    };

    Ok((model, plants))
}
