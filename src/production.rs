//! Calculates plant production from rated capacity and utilisation rates.
use crate::plant::{CountryID, Plant, Technology};
use crate::status::{OperationalStatus, PlantYearStatus};
use crate::units::{Dimensionless, Production};
use anyhow::{Context, Result, ensure};
use std::collections::HashMap;

/// Utilisation rates keyed by technology and year, with country-level defaults.
///
/// All rates are checked to lie in [0, 1] as they are added.
#[derive(Debug, Default, PartialEq)]
pub struct UtilisationRates {
    technology: HashMap<(Technology, u32), Dimensionless>,
    country: HashMap<(CountryID, u32), Dimensionless>,
}

/// Check that a utilisation rate is a valid proportion
fn check_rate(rate: Dimensionless) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&rate.value()),
        "Utilisation rate must be between 0 and 1 inclusive (got {rate})"
    );

    Ok(())
}

impl UtilisationRates {
    /// Create an empty set of utilisation rates
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a technology-specific rate for a year
    pub fn insert_technology_rate(
        &mut self,
        technology: Technology,
        year: u32,
        rate: Dimensionless,
    ) -> Result<()> {
        check_rate(rate)?;
        ensure!(
            self.technology.insert((technology, year), rate).is_none(),
            "Duplicate utilisation rate for technology {technology} in {year}"
        );

        Ok(())
    }

    /// Add a country-level default rate for a year
    pub fn insert_country_rate(
        &mut self,
        country: CountryID,
        year: u32,
        rate: Dimensionless,
    ) -> Result<()> {
        check_rate(rate)?;
        let key = (country, year);
        ensure!(
            !self.country.contains_key(&key),
            "Duplicate utilisation rate for country {} in {year}",
            key.0
        );
        self.country.insert(key, rate);

        Ok(())
    }

    /// Look up the utilisation rate for a plant's technology and country in a given year.
    ///
    /// The technology-specific rate is preferred, if `use_technology_rates` is set; otherwise the
    /// country default is used.
    pub fn get(
        &self,
        technology: Technology,
        country: &CountryID,
        year: u32,
        use_technology_rates: bool,
    ) -> Option<Dimensionless> {
        let technology_rate = use_technology_rates
            .then(|| self.technology.get(&(technology, year)))
            .flatten();

        technology_rate
            .or_else(|| self.country.get(&(country.clone(), year)))
            .copied()
    }
}

/// The production of one plant in one year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantYearProduction<'a> {
    /// The plant
    pub plant: &'a Plant,
    /// The year
    pub year: u32,
    /// The plant's status in that year
    pub status: OperationalStatus,
    /// The utilisation rate applied, if the plant was operational
    pub utilisation_rate: Option<Dimensionless>,
    /// Steel produced
    pub production: Production,
}

/// Calculate the production of a plant in a year.
///
/// Non-operational plants produce nothing and no rate is looked up for them.
///
/// # Returns
///
/// The production or an error if no utilisation rate can be found for an operational plant.
pub fn calculate_plant_production<'a>(
    status: &PlantYearStatus<'a>,
    rates: &UtilisationRates,
    use_technology_rates: bool,
) -> Result<PlantYearProduction<'a>> {
    let plant = status.plant;
    let (utilisation_rate, production) = if status.status.is_operational() {
        let rate = rates
            .get(
                plant.technology,
                &plant.country,
                status.year,
                use_technology_rates,
            )
            .with_context(|| {
                format!(
                    "No utilisation rate for technology {} or country {} in {}",
                    plant.technology, plant.country, status.year
                )
            })?;
        (Some(rate), plant.capacity * rate)
    } else {
        (None, Production(0.0))
    };

    Ok(PlantYearProduction {
        plant,
        year: status.year,
        status: status.status,
        utilisation_rate,
        production,
    })
}

/// Calculate production for every plant-year.
///
/// Fails on the first operational plant-year for which no rate can be resolved, as the run cannot
/// proceed with incomplete configuration.
pub fn calculate_production<'a, I>(
    statuses: I,
    rates: &UtilisationRates,
    use_technology_rates: bool,
) -> Result<Vec<PlantYearProduction<'a>>>
where
    I: IntoIterator<Item = PlantYearStatus<'a>>,
{
    statuses
        .into_iter()
        .map(|status| {
            calculate_plant_production(&status, rates, use_technology_rates).with_context(|| {
                format!(
                    "Could not calculate production for plant {}",
                    status.plant.id
                )
            })
        })
        .collect()
}
