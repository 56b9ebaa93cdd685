//! The module responsible for writing output data to disk.
use crate::aggregation::CompanyYearAggregate;
use crate::pipeline::PipelineOutput;
use crate::plant::{CompanyID, DataQualityIssue, Technology};
use crate::units::{Dimensionless, EmissionFactor, Emissions, Production};
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "steel_emissions_results";

/// The output file name for plant-year detail
const PLANT_YEARS_FILE_NAME: &str = "plant_years.csv";

/// The output file name for company totals by year
const COMPANY_YEARS_FILE_NAME: &str = "company_years.csv";

/// The output file name for company totals across all years
const COMPANY_TOTALS_FILE_NAME: &str = "company_totals.csv";

/// The output file name for company emissions trends
const COMPANY_TRENDS_FILE_NAME: &str = "company_trends.csv";

/// The output file name for emissions projections
const PROJECTIONS_FILE_NAME: &str = "projections.csv";

/// The output file name for the technology breakdown
const TECHNOLOGY_EMISSIONS_FILE_NAME: &str = "technology_emissions.csv";

/// The output file name for the comparison with reported production
const PRODUCTION_COMPARISON_FILE_NAME: &str = "production_comparison.csv";

/// The output file name for excluded plants
const DATA_QUALITY_FILE_NAME: &str = "data_quality_warnings.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// If the directory already exists and is not empty, it is only replaced if `allow_overwrite` is
/// set.
///
/// # Returns
///
/// Whether an existing directory was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Empty folder
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the company-years output CSV file.
///
/// Technology shares are given one column each. They are empty if the company had no production in
/// that year.
#[derive(Serialize, Debug, PartialEq)]
struct CompanyYearRow {
    company: CompanyID,
    year: u32,
    total_capacity: f64,
    total_production: Production,
    total_emissions: Emissions,
    plant_count: usize,
    avg_utilisation_rate: Option<Dimensionless>,
    bf_bof_share: Option<Dimensionless>,
    eaf_share: Option<Dimensionless>,
    dri_share: Option<Dimensionless>,
    other_share: Option<Dimensionless>,
    emission_intensity: Option<EmissionFactor>,
}

impl CompanyYearRow {
    fn new(aggregate: &CompanyYearAggregate) -> Self {
        let share = |technology| {
            (!aggregate.technology_shares.is_empty()).then(|| {
                aggregate
                    .technology_shares
                    .get(&technology)
                    .copied()
                    .unwrap_or(Dimensionless(0.0))
            })
        };

        Self {
            company: aggregate.company.clone(),
            year: aggregate.year,
            total_capacity: aggregate.total_capacity.value(),
            total_production: aggregate.total_production,
            total_emissions: aggregate.total_emissions,
            plant_count: aggregate.plant_count,
            avg_utilisation_rate: aggregate.avg_utilisation_rate,
            bf_bof_share: share(Technology::BfBof),
            eaf_share: share(Technology::Eaf),
            dri_share: share(Technology::Dri),
            other_share: share(Technology::Other),
            emission_intensity: aggregate.emission_intensity,
        }
    }
}

/// Represents a row in the data-quality warnings output CSV file
#[derive(Serialize, Debug, PartialEq)]
struct DataQualityRow {
    plant_id: String,
    reason: String,
}

impl DataQualityRow {
    fn new(issue: &DataQualityIssue) -> Self {
        Self {
            plant_id: issue.plant_id.clone(),
            reason: issue.reason.to_string(),
        }
    }
}

/// Write rows to a new CSV file
fn write_csv<T, I>(file_path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(())
}

/// Write all output tables for a run to the specified folder.
///
/// The production comparison table is only written if reported production was provided.
pub fn write_outputs(output_path: &Path, output: &PipelineOutput) -> Result<()> {
    write_csv(&output_path.join(PLANT_YEARS_FILE_NAME), &output.plant_years)?;
    write_csv(
        &output_path.join(COMPANY_YEARS_FILE_NAME),
        output.company_years.iter().map(CompanyYearRow::new),
    )?;
    write_csv(
        &output_path.join(COMPANY_TOTALS_FILE_NAME),
        &output.company_totals,
    )?;
    write_csv(
        &output_path.join(COMPANY_TRENDS_FILE_NAME),
        &output.company_trends,
    )?;
    write_csv(&output_path.join(PROJECTIONS_FILE_NAME), &output.projections)?;
    write_csv(
        &output_path.join(TECHNOLOGY_EMISSIONS_FILE_NAME),
        &output.technology_emissions,
    )?;
    if let Some(comparison) = &output.production_comparison {
        write_csv(
            &output_path.join(PRODUCTION_COMPARISON_FILE_NAME),
            comparison,
        )?;
    }
    write_csv(
        &output_path.join(DATA_QUALITY_FILE_NAME),
        output.data_quality_issues.iter().map(DataQualityRow::new),
    )?;

    Ok(())
}
