//! Resolves whether a plant is operating in a given year.
use crate::plant::{Plant, PlantRegistry};
use serde_string_enum::SerializeLabeledStringEnum;

/// The operating state of a plant in a particular year.
///
/// States only ever advance in the order listed: a plant is pending until it opens, operational
/// while open and decommissioned once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, SerializeLabeledStringEnum)]
pub enum OperationalStatus {
    /// The plant has not yet opened
    #[string = "pending"]
    Pending,
    /// The plant is producing steel
    #[string = "operational"]
    Operational,
    /// The plant has closed
    #[string = "decommissioned"]
    Decommissioned,
}

impl OperationalStatus {
    /// Whether the plant is producing steel
    pub fn is_operational(self) -> bool {
        self == Self::Operational
    }
}

/// Get the status of `plant` in `year`.
///
/// A missing start year means the plant was already operating before the analysis window; a
/// missing end year means it keeps operating. The end year is inclusive.
pub fn resolve_status(plant: &Plant, year: u32) -> OperationalStatus {
    if plant.start_year.is_some_and(|start| year < start) {
        return OperationalStatus::Pending;
    }

    if plant.end_year.is_some_and(|end| year > end) {
        return OperationalStatus::Decommissioned;
    }

    OperationalStatus::Operational
}

/// The status of one plant in one year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantYearStatus<'a> {
    /// The plant
    pub plant: &'a Plant,
    /// The year
    pub year: u32,
    /// The plant's status in that year
    pub status: OperationalStatus,
}

/// Resolve the status of every plant in every year.
///
/// Results are ordered by plant (in registry order) and then by year.
pub fn resolve_statuses<I>(registry: &PlantRegistry, years: I) -> Vec<PlantYearStatus<'_>>
where
    I: IntoIterator<Item = u32> + Clone,
{
    registry
        .iter()
        .flat_map(|plant| {
            years.clone().into_iter().map(move |year| PlantYearStatus {
                plant,
                year,
                status: resolve_status(plant, year),
            })
        })
        .collect()
}
