//! Code for reading utilisation rates from CSV files.
use super::*;
use crate::plant::{CountryID, Technology};
use crate::production::UtilisationRates;
use crate::units::Dimensionless;
use serde::Deserialize;
use std::path::Path;

const TECHNOLOGY_RATES_FILE_NAME: &str = "utilisation_rates.csv";
const COUNTRY_RATES_FILE_NAME: &str = "country_utilisation_rates.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct TechnologyRateRaw {
    technology: Technology,
    year: u32,
    value: Dimensionless,
}

#[derive(Debug, PartialEq, Deserialize)]
struct CountryRateRaw {
    country: String,
    year: u32,
    value: Dimensionless,
}

/// Read utilisation rates from the model directory.
///
/// Technology-specific rates are optional, but country-level rates are required, as they are the
/// fallback for every plant.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The utilisation rates or an error if any rate is invalid or duplicated.
pub fn read_utilisation_rates(model_dir: &Path) -> Result<UtilisationRates> {
    let mut rates = UtilisationRates::new();

    let file_path = model_dir.join(TECHNOLOGY_RATES_FILE_NAME);
    if file_path.is_file() {
        let iter = read_csv_optional(&file_path)?;
        read_technology_rates_from_iter(iter, &mut rates)
            .with_context(|| input_err_msg(&file_path))?;
    }

    let file_path = model_dir.join(COUNTRY_RATES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_country_rates_from_iter(iter, &mut rates).with_context(|| input_err_msg(&file_path))?;

    Ok(rates)
}

fn read_technology_rates_from_iter<I>(iter: I, rates: &mut UtilisationRates) -> Result<()>
where
    I: Iterator<Item = TechnologyRateRaw>,
{
    for row in iter {
        rates.insert_technology_rate(row.technology, row.year, row.value)?;
    }

    Ok(())
}

fn read_country_rates_from_iter<I>(iter: I, rates: &mut UtilisationRates) -> Result<()>
where
    I: Iterator<Item = CountryRateRaw>,
{
    for row in iter {
        let country = CountryID::new(row.country.trim());
        rates.insert_country_rate(country, row.year, row.value)?;
    }

    Ok(())
}
