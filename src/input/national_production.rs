//! Code for reading reported national production from a CSV file.
use super::*;
use crate::aggregation::NationalProductionMap;
use crate::plant::CountryID;
use crate::units::Production;
use anyhow::ensure;
use serde::Deserialize;
use std::path::Path;

const NATIONAL_PRODUCTION_FILE_NAME: &str = "national_production.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct NationalProductionRaw {
    country: String,
    year: u32,
    production: Production,
}

/// Read reported national production from the model directory, if the file is present.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// Reported production keyed by country and year, `None` if the file is absent, or an error.
pub fn read_national_production(model_dir: &Path) -> Result<Option<NationalProductionMap>> {
    let file_path = model_dir.join(NATIONAL_PRODUCTION_FILE_NAME);
    if !file_path.is_file() {
        return Ok(None);
    }

    let iter = read_csv_optional(&file_path)?;
    let map = read_national_production_from_iter(iter).with_context(|| input_err_msg(&file_path))?;

    Ok(Some(map))
}

fn read_national_production_from_iter<I>(iter: I) -> Result<NationalProductionMap>
where
    I: Iterator<Item = NationalProductionRaw>,
{
    let mut map = NationalProductionMap::new();
    for row in iter {
        ensure!(
            row.production.is_finite() && row.production >= Production(0.0),
            "Reported production must be a finite, non-negative number (got {} for {} in {})",
            row.production,
            row.country,
            row.year
        );

        let key = (CountryID::new(row.country.trim()), row.year);
        ensure!(
            !map.contains_key(&key),
            "Duplicate reported production for {} in {}",
            row.country,
            row.year
        );
        map.insert(key, row.production);
    }

    Ok(map)
}
