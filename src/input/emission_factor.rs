//! Code for reading technology emission factors from a CSV file.
use super::*;
use crate::plant::Technology;
use crate::units::EmissionFactor;
use anyhow::ensure;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const EMISSION_FACTORS_FILE_NAME: &str = "emission_factors.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct EmissionFactorRaw {
    technology: Technology,
    value: EmissionFactor,
}

/// Read emission factors from the model directory.
///
/// Values are checked when [`EmissionFactors`] is constructed.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of emission factors keyed by technology or an error.
pub fn read_emission_factors(model_dir: &Path) -> Result<HashMap<Technology, EmissionFactor>> {
    let file_path = model_dir.join(EMISSION_FACTORS_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_emission_factors_from_iter(iter).with_context(|| input_err_msg(&file_path))
}

fn read_emission_factors_from_iter<I>(iter: I) -> Result<HashMap<Technology, EmissionFactor>>
where
    I: Iterator<Item = EmissionFactorRaw>,
{
    let mut factors = HashMap::new();
    for row in iter {
        ensure!(
            factors.insert(row.technology, row.value).is_none(),
            "Duplicate emission factor for technology {}",
            row.technology
        );
    }

    Ok(factors)
}
