//! Fixtures for tests
use crate::emissions::EmissionFactors;
use crate::model::{Model, ModelParameters, ProjectionParameters};
use crate::plant::{Plant, PlantRecord, Technology};
use crate::production::UtilisationRates;
use crate::units::{Capacity, Dimensionless, EmissionFactor};
use rstest::fixture;
use std::collections::HashMap;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn plant_record() -> PlantRecord {
    PlantRecord {
        id: "plant1".into(),
        company: "company1".into(),
        country: "China".into(),
        technology: "BF-BOF".into(),
        capacity: Some(100.0),
        start_year: None,
        end_year: None,
        retired_year: None,
        idled_year: None,
    }
}

#[fixture]
pub fn plant() -> Plant {
    Plant {
        id: "plant1".into(),
        company: "company1".into(),
        country: "China".into(),
        technology: Technology::BfBof,
        capacity: Capacity(100.0),
        start_year: None,
        end_year: None,
    }
}

#[fixture]
pub fn utilisation_rates() -> UtilisationRates {
    let mut rates = UtilisationRates::new();
    for year in 2020..=2021 {
        rates
            .insert_technology_rate(Technology::BfBof, year, Dimensionless(0.8))
            .unwrap();
        rates
            .insert_country_rate("China".into(), year, Dimensionless(0.7))
            .unwrap();
    }

    rates
}

#[fixture]
pub fn emission_factors() -> EmissionFactors {
    let factors = HashMap::from([
        (Technology::BfBof, EmissionFactor(2.0)),
        (Technology::Eaf, EmissionFactor(0.5)),
    ]);
    EmissionFactors::new(factors, EmissionFactor(1.8)).unwrap()
}

#[fixture]
pub fn projection_parameters() -> ProjectionParameters {
    ProjectionParameters {
        years: vec![2031, 2035, 2040],
        bootstrap_samples: 200,
        ..ProjectionParameters::default()
    }
}

#[fixture]
pub fn model_parameters(projection_parameters: ProjectionParameters) -> ModelParameters {
    ModelParameters {
        start_year: 2020,
        end_year: 2021,
        default_emission_factor: EmissionFactor(1.8),
        use_technology_rates: true,
        trend_min_years: 2,
        projection: projection_parameters,
    }
}

#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    utilisation_rates: UtilisationRates,
    emission_factors: EmissionFactors,
) -> Model {
    Model {
        model_path: PathBuf::from("model"),
        parameters: model_parameters,
        utilisation_rates,
        emission_factors,
        national_production: None,
    }
}
