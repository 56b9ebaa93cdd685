//! The model represents the static input data provided by the user.
use crate::aggregation::NationalProductionMap;
use crate::emissions::EmissionFactors;
use crate::production::UtilisationRates;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{MovingAverageParameters, ModelParameters, ProjectionParameters};

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Utilisation rates by technology and by country
    pub utilisation_rates: UtilisationRates,
    /// Emission factors by technology
    pub emission_factors: EmissionFactors,
    /// Reported national production, if provided
    pub national_production: Option<NationalProductionMap>,
}
