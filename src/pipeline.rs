//! The programmatic entry point, which runs the full plant-to-projection pipeline.
use crate::aggregation::{
    CompanyTotal, CompanyTrend, CompanyYearAggregate, ProductionComparison,
    aggregate_by_company_and_year, aggregate_by_company_total, calculate_company_trends,
    compare_with_reported_production,
};
use crate::emissions::{PlantYearRecord, TechnologyYearEmissions, calculate_emissions};
use crate::model::Model;
use crate::plant::{DataQualityIssue, PlantRecord, PlantRegistry};
use crate::production::{PlantYearProduction, calculate_production};
use crate::projection::{ProjectionResult, project_all_companies};
use crate::status::resolve_statuses;
use anyhow::{Context, Result};
use log::{info, warn};

/// Every table produced by a run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Production and emissions for every plant and year, by plant input order then year
    pub plant_years: Vec<PlantYearRecord>,
    /// Company totals for each year, by company then year
    pub company_years: Vec<CompanyYearAggregate>,
    /// Company totals across all years, by emissions (descending) then company
    pub company_totals: Vec<CompanyTotal>,
    /// Historical emissions trends for companies with enough history, by company
    pub company_trends: Vec<CompanyTrend>,
    /// Emissions projections, by company then method then year
    pub projections: Vec<ProjectionResult>,
    /// Production and emissions by technology and year
    pub technology_emissions: Vec<TechnologyYearEmissions>,
    /// Comparison with reported national production, if provided
    pub production_comparison: Option<Vec<ProductionComparison>>,
    /// Plants excluded because of problems with their data
    pub data_quality_issues: Vec<DataQualityIssue>,
}

/// Build the plant registry, logging a warning for each excluded plant
fn build_registry<I>(records: I) -> (PlantRegistry, Vec<DataQualityIssue>)
where
    I: IntoIterator<Item = PlantRecord>,
{
    let (registry, issues) = PlantRegistry::from_records(records);
    for issue in &issues {
        warn!("Excluding plant '{}': {}", issue.plant_id, issue.reason);
    }
    info!(
        "Loaded {} plants ({} excluded because of data-quality issues)",
        registry.len(),
        issues.len()
    );

    (registry, issues)
}

/// Resolve plant statuses and production for every year of the analysis window
fn plant_production<'a>(
    registry: &'a PlantRegistry,
    model: &Model,
) -> Result<Vec<PlantYearProduction<'a>>> {
    let parameters = &model.parameters;
    let statuses = resolve_statuses(registry, parameters.years());
    calculate_production(
        statuses,
        &model.utilisation_rates,
        parameters.use_technology_rates,
    )
    .context("Failed to calculate plant production")
}

/// Check that a model can be run with the given plant records.
///
/// This fails if any configuration needed by the run is missing, e.g. a utilisation rate for a
/// plant which is operational in some year.
///
/// # Returns
///
/// The plants which would be excluded from a run.
pub fn check_pipeline<I>(records: I, model: &Model) -> Result<Vec<DataQualityIssue>>
where
    I: IntoIterator<Item = PlantRecord>,
{
    let (registry, issues) = build_registry(records);
    plant_production(&registry, model)?;
    if model.parameters.projection.years.is_empty() {
        warn!("No projection years specified, so no projections will be made");
    }

    Ok(issues)
}

/// Run the pipeline for a batch of plant records.
///
/// Plants with data-quality issues are excluded and reported, rather than causing the run to fail.
/// Projection failures for individual companies are reported in the status of their results.
///
/// # Arguments
///
/// * `records` - Unvalidated plant records
/// * `model` - The model configuration
///
/// # Returns
///
/// All output tables, or an error if the configuration is incomplete.
pub fn run_pipeline<I>(records: I, model: &Model) -> Result<PipelineOutput>
where
    I: IntoIterator<Item = PlantRecord>,
{
    let parameters = &model.parameters;
    let (registry, data_quality_issues) = build_registry(records);
    let productions = plant_production(&registry, model)?;

    let (plant_years, technology_emissions) =
        calculate_emissions(&productions, &model.emission_factors);
    info!("Calculated emissions for {} plant-years", plant_years.len());

    let company_years = aggregate_by_company_and_year(&plant_years);
    let company_totals = aggregate_by_company_total(&plant_years);
    let company_trends = calculate_company_trends(&company_years, parameters.trend_min_years);
    info!(
        "Aggregated to {} companies over {} company-years",
        company_totals.len(),
        company_years.len()
    );

    let production_comparison = model.national_production.as_ref().map(|reported| {
        compare_with_reported_production(&plant_years, reported, &parameters.years())
    });

    let projections = project_all_companies(&company_years, &parameters.projection);

    Ok(PipelineOutput {
        plant_years,
        company_years,
        company_totals,
        company_trends,
        projections,
        technology_emissions,
        production_comparison,
        data_quality_issues,
    })
}
