//! Plants are the individual steelworks whose output and emissions are modelled.
//!
//! Plant records arrive unvalidated from the input layer as [`PlantRecord`]s. Building a
//! [`PlantRegistry`] validates them: records with data-quality problems are excluded and reported as
//! [`DataQualityIssue`]s rather than aborting the run.
use crate::id::{IDInterner, define_id_type};
use crate::units::Capacity;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::EnumIter;

define_id_type! {PlantID}
define_id_type! {CompanyID}
define_id_type! {CountryID}

/// The company name used for plants whose owner is not recorded
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Steelmaking technology category
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Technology {
    /// Blast furnace with basic oxygen furnace
    #[string = "BF-BOF"]
    BfBof,
    /// Electric arc furnace
    #[string = "EAF"]
    Eaf,
    /// Direct reduced iron
    #[string = "DRI"]
    Dri,
    /// Anything else, or not recorded
    #[string = "Other/Unknown"]
    Other,
}

/// Fragments of equipment descriptions which identify a technology, checked in order.
///
/// Fragments are upper case with whitespace removed. A description listing several kinds of
/// equipment (e.g. `BF; BOF; EAF`) takes the technology of the first fragment it contains.
const TECHNOLOGY_FRAGMENTS: [(&str, Technology); 6] = [
    ("OHF", Technology::BfBof),
    ("EAF;DRI", Technology::Eaf),
    ("DRI", Technology::Dri),
    ("EAF", Technology::Eaf),
    ("BOF", Technology::BfBof),
    ("BF", Technology::BfBof),
];

impl Technology {
    /// Map a free-text equipment description onto a technology category.
    ///
    /// Matching ignores case and whitespace and looks for known equipment names anywhere in the
    /// description. Unrecognised descriptions map to [`Technology::Other`].
    pub fn standardise(description: &str) -> Self {
        let key: String = description
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        TECHNOLOGY_FRAGMENTS
            .iter()
            .find(|(fragment, _)| key.contains(fragment))
            .map_or(Technology::Other, |(_, technology)| *technology)
    }
}

/// An unvalidated plant record, as provided by the input layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlantRecord {
    /// Unique identifier for the plant
    pub id: String,
    /// The owning (parent) company
    #[serde(default)]
    pub company: String,
    /// The country in which the plant is located
    pub country: String,
    /// Free-text description of the main production equipment
    #[serde(default)]
    pub technology: String,
    /// Rated capacity in million tonnes per year.
    ///
    /// Values which aren't numbers are read as missing, so the plant is excluded with a
    /// data-quality issue instead of the whole file being rejected.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub capacity: Option<f64>,
    /// The first year of operation
    #[serde(default)]
    pub start_year: Option<u32>,
    /// The last year of operation
    #[serde(default)]
    pub end_year: Option<u32>,
    /// The year the plant was retired, if any
    #[serde(default)]
    pub retired_year: Option<u32>,
    /// The year the plant was idled, if any
    #[serde(default)]
    pub idled_year: Option<u32>,
}

impl PlantRecord {
    /// The effective end year: the earliest of the end, retired and idled years
    pub fn effective_end_year(&self) -> Option<u32> {
        [self.end_year, self.retired_year, self.idled_year]
            .into_iter()
            .flatten()
            .min()
    }
}

/// A validated steel plant
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    /// Unique identifier for the plant
    pub id: PlantID,
    /// The owning company
    pub company: CompanyID,
    /// The country in which the plant is located
    pub country: CountryID,
    /// The plant's technology category
    pub technology: Technology,
    /// Rated capacity
    pub capacity: Capacity,
    /// The first year of operation. `None` means the plant predates the analysis window.
    pub start_year: Option<u32>,
    /// The last year of operation. `None` means the plant is still operating.
    pub end_year: Option<u32>,
}

/// The reason a plant record was excluded from the analysis
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum DataQualityReason {
    /// The record has no identifier
    #[display("plant ID is missing")]
    MissingID,
    /// Another record already used this identifier
    #[display("duplicate plant ID")]
    DuplicateID,
    /// No capacity value was given
    #[display("capacity is missing")]
    MissingCapacity,
    /// The capacity is negative or not finite
    #[display("capacity must be a finite, non-negative number (got {_0})")]
    InvalidCapacity(f64),
    /// The plant closes before it opens
    #[display("end year {end_year} is earlier than start year {start_year}")]
    EndBeforeStart {
        /// The recorded start year
        start_year: u32,
        /// The effective end year
        end_year: u32,
    },
}

/// A plant record excluded from the analysis, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityIssue {
    /// The plant identifier as it appeared in the input
    pub plant_id: String,
    /// Why the plant was excluded
    pub reason: DataQualityReason,
}

/// Check a single record, returning its validated capacity
fn check_record(record: &PlantRecord) -> Result<Capacity, DataQualityReason> {
    if record.id.trim().is_empty() {
        return Err(DataQualityReason::MissingID);
    }

    let capacity = record.capacity.ok_or(DataQualityReason::MissingCapacity)?;
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(DataQualityReason::InvalidCapacity(capacity));
    }

    if let (Some(start_year), Some(end_year)) = (record.start_year, record.effective_end_year()) {
        if end_year < start_year {
            return Err(DataQualityReason::EndBeforeStart {
                start_year,
                end_year,
            });
        }
    }

    Ok(Capacity(capacity))
}

/// The set of validated plants for a run, in input order
#[derive(Debug, Default)]
pub struct PlantRegistry {
    plants: IndexMap<PlantID, Plant>,
}

impl PlantRegistry {
    /// Validate plant records and build a registry from those which pass.
    ///
    /// # Returns
    ///
    /// The registry and a list of the records which were excluded, in input order.
    pub fn from_records<I>(records: I) -> (Self, Vec<DataQualityIssue>)
    where
        I: IntoIterator<Item = PlantRecord>,
    {
        let mut plants = IndexMap::new();
        let mut issues = Vec::new();
        let mut companies = IDInterner::<CompanyID>::new();
        let mut countries = IDInterner::<CountryID>::new();

        for record in records {
            let capacity = match check_record(&record) {
                Ok(capacity) => capacity,
                Err(reason) => {
                    issues.push(DataQualityIssue {
                        plant_id: record.id,
                        reason,
                    });
                    continue;
                }
            };

            let id = PlantID::new(record.id.trim());
            let Entry::Vacant(entry) = plants.entry(id) else {
                issues.push(DataQualityIssue {
                    plant_id: record.id,
                    reason: DataQualityReason::DuplicateID,
                });
                continue;
            };

            let company = match record.company.trim() {
                "" => UNKNOWN_COMPANY,
                name => name,
            };
            let plant = Plant {
                id: entry.key().clone(),
                company: companies.intern(company),
                country: countries.intern(record.country.trim()),
                technology: Technology::standardise(&record.technology),
                capacity,
                start_year: record.start_year,
                end_year: record.effective_end_year(),
            };
            entry.insert(plant);
        }

        (Self { plants }, issues)
    }

    /// Iterate over the plants in input order
    pub fn iter(&self) -> indexmap::map::Values<'_, PlantID, Plant> {
        self.plants.values()
    }

    /// Look up a plant by ID
    pub fn get(&self, id: &str) -> Option<&Plant> {
        self.plants.get(id)
    }

    /// The number of valid plants
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Whether there are no valid plants
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

/// Build a registry from plants which have already been validated.
///
/// Later plants replace earlier ones with the same ID.
impl FromIterator<Plant> for PlantRegistry {
    fn from_iter<T: IntoIterator<Item = Plant>>(iter: T) -> Self {
        Self {
            plants: iter
                .into_iter()
                .map(|plant| (plant.id.clone(), plant))
                .collect(),
        }
    }
}
