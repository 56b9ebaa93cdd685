//! Calculates plant-year emissions from production and technology emission factors.
use crate::plant::{CompanyID, CountryID, PlantID, Technology};
use crate::production::PlantYearProduction;
use crate::status::OperationalStatus;
use crate::units::{Capacity, Dimensionless, EmissionFactor, Emissions, Production};
use anyhow::{Context, Result, ensure};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Check that an emission factor is a finite, non-negative number
fn check_emission_factor(value: EmissionFactor) -> Result<()> {
    ensure!(
        value.is_finite() && value >= EmissionFactor(0.0),
        "Emission factor must be a finite number greater than or equal to zero (got {value})"
    );

    Ok(())
}

/// Emission factors for each technology, with a default for any technology not listed
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactors {
    factors: HashMap<Technology, EmissionFactor>,
    default: EmissionFactor,
}

impl EmissionFactors {
    /// Create a new set of emission factors, checking that all values are valid
    pub fn new(
        factors: HashMap<Technology, EmissionFactor>,
        default: EmissionFactor,
    ) -> Result<Self> {
        for (technology, value) in &factors {
            check_emission_factor(*value)
                .with_context(|| format!("Invalid emission factor for technology {technology}"))?;
        }
        check_emission_factor(default).context("Invalid default emission factor")?;

        Ok(Self { factors, default })
    }

    /// Get the emission factor for a technology, falling back to the default
    pub fn get(&self, technology: Technology) -> EmissionFactor {
        self.factors
            .get(&technology)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Production and emissions of one plant in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantYearRecord {
    /// The plant's ID
    pub plant_id: PlantID,
    /// The owning company
    pub company: CompanyID,
    /// The country in which the plant is located
    pub country: CountryID,
    /// The plant's technology category
    pub technology: Technology,
    /// Rated capacity of the plant
    pub capacity: Capacity,
    /// The year
    pub year: u32,
    /// The plant's status in that year
    pub status: OperationalStatus,
    /// Whether the plant was operating in that year
    pub operational: bool,
    /// The utilisation rate applied, if the plant was operational
    pub utilisation_rate: Option<Dimensionless>,
    /// Steel produced
    pub production: Production,
    /// The emission factor applied, if the plant was operational
    pub emission_factor: Option<EmissionFactor>,
    /// CO2 emitted
    pub emissions: Emissions,
}

/// Total capacity, production and emissions for a technology in a year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TechnologyYearEmissions {
    /// The technology
    pub technology: Technology,
    /// The year
    pub year: u32,
    /// Total rated capacity of operational plants
    pub capacity: Capacity,
    /// Total production of operational plants
    pub production: Production,
    /// Total emissions of operational plants
    pub emissions: Emissions,
    /// Number of operational plants
    pub plant_count: usize,
}

/// Calculate emissions for a single plant-year
pub fn calculate_plant_emissions(
    production: &PlantYearProduction,
    factors: &EmissionFactors,
) -> PlantYearRecord {
    let (emission_factor, emissions) = if production.status.is_operational() {
        let factor = factors.get(production.plant.technology);
        (Some(factor), production.production * factor)
    } else {
        (None, Emissions(0.0))
    };

    let plant = production.plant;
    PlantYearRecord {
        plant_id: plant.id.clone(),
        company: plant.company.clone(),
        country: plant.country.clone(),
        technology: plant.technology,
        capacity: plant.capacity,
        year: production.year,
        status: production.status,
        operational: production.status.is_operational(),
        utilisation_rate: production.utilisation_rate,
        production: production.production,
        emission_factor,
        emissions,
    }
}

/// Calculate emissions for every plant-year and summarise them by technology.
///
/// # Returns
///
/// The plant-year records, in the same order as `productions`, and the technology breakdown,
/// ordered by technology and then year. Only operational plant-years contribute to the breakdown.
pub fn calculate_emissions(
    productions: &[PlantYearProduction],
    factors: &EmissionFactors,
) -> (Vec<PlantYearRecord>, Vec<TechnologyYearEmissions>) {
    let mut breakdown: BTreeMap<(Technology, u32), TechnologyYearEmissions> = BTreeMap::new();
    let mut records = Vec::with_capacity(productions.len());

    for production in productions {
        let record = calculate_plant_emissions(production, factors);
        if record.operational {
            let technology = record.technology;
            let entry = breakdown
                .entry((technology, record.year))
                .or_insert(TechnologyYearEmissions {
                    technology,
                    year: record.year,
                    capacity: Capacity(0.0),
                    production: Production(0.0),
                    emissions: Emissions(0.0),
                    plant_count: 0,
                });
            entry.capacity += record.capacity;
            entry.production += record.production;
            entry.emissions += record.emissions;
            entry.plant_count += 1;
        }
        records.push(record);
    }

    debug!(
        "Calculated emissions for {} plant-years across {} technology-years",
        records.len(),
        breakdown.len()
    );

    (records, breakdown.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, emission_factors, plant};
    use crate::plant::Plant;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn production_for(plant: &Plant, year: u32, production: f64) -> PlantYearProduction<'_> {
        PlantYearProduction {
            plant,
            year,
            status: OperationalStatus::Operational,
            utilisation_rate: Some(Dimensionless(production / plant.capacity.value())),
            production: Production(production),
        }
    }

    #[rstest]
    #[case(Technology::BfBof, EmissionFactor(2.0))]
    #[case(Technology::Eaf, EmissionFactor(0.5))]
    #[case(Technology::Other, EmissionFactor(1.8))] // not in table
    fn test_emission_factor_get(
        emission_factors: EmissionFactors,
        #[case] technology: Technology,
        #[case] expected: EmissionFactor,
    ) {
        assert_eq!(emission_factors.get(technology), expected);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_emission_factors_invalid(#[case] value: f64) {
        let factors = HashMap::from([(Technology::Eaf, EmissionFactor(value))]);
        assert_error!(
            EmissionFactors::new(factors, EmissionFactor(1.0)),
            "Invalid emission factor for technology EAF"
        );
        assert_error!(
            EmissionFactors::new(HashMap::new(), EmissionFactor(value)),
            "Invalid default emission factor"
        );
    }

    #[rstest]
    fn test_calculate_plant_emissions(plant: Plant, emission_factors: EmissionFactors) {
        let production = production_for(&plant, 2020, 80.0);
        let record = calculate_plant_emissions(&production, &emission_factors);
        assert_eq!(record.emission_factor, Some(EmissionFactor(2.0)));
        assert_approx_eq!(Emissions, record.emissions, Emissions(160.0));
    }

    #[rstest]
    fn test_calculate_plant_emissions_not_operational(
        plant: Plant,
        emission_factors: EmissionFactors,
    ) {
        let production = PlantYearProduction {
            status: OperationalStatus::Decommissioned,
            utilisation_rate: None,
            ..production_for(&plant, 2020, 0.0)
        };
        let record = calculate_plant_emissions(&production, &emission_factors);
        assert_eq!(record.emission_factor, None);
        assert_eq!(record.emissions, Emissions(0.0));
    }

    #[rstest]
    fn test_calculate_emissions_breakdown(plant: Plant, emission_factors: EmissionFactors) {
        let eaf = Plant {
            id: "plant2".into(),
            technology: Technology::Eaf,
            capacity: Capacity(50.0),
            ..plant.clone()
        };
        let bof2 = Plant {
            id: "plant3".into(),
            ..plant.clone()
        };
        let productions = [
            production_for(&plant, 2020, 80.0),
            production_for(&eaf, 2020, 40.0),
            production_for(&bof2, 2020, 60.0),
            production_for(&plant, 2021, 75.0),
        ];

        let (records, breakdown) = calculate_emissions(&productions, &emission_factors);
        assert_eq!(records.len(), productions.len());
        for record in &records {
            let factor = record.emission_factor.unwrap();
            assert_approx_eq!(Emissions, record.emissions, record.production * factor);
        }

        let keys: Vec<_> = breakdown
            .iter()
            .map(|row| (row.technology, row.year, row.plant_count))
            .collect();
        assert_eq!(
            keys,
            [
                (Technology::BfBof, 2020, 2),
                (Technology::BfBof, 2021, 1),
                (Technology::Eaf, 2020, 1)
            ]
        );
        assert_approx_eq!(Capacity, breakdown[0].capacity, Capacity(200.0));
        assert_approx_eq!(Capacity, breakdown[2].capacity, Capacity(50.0));
        assert_approx_eq!(Production, breakdown[0].production, Production(140.0));
        assert_approx_eq!(Emissions, breakdown[0].emissions, Emissions(280.0));
        assert_approx_eq!(Emissions, breakdown[2].emissions, Emissions(20.0));
    }
}
