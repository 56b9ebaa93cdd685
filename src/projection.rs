//! Projects company emissions into future years, with bootstrap confidence bounds.
//!
//! A failure to project one company is recorded in the [`ProjectionStatus`] of its results and
//! never affects any other company.
use crate::aggregation::CompanyYearAggregate;
use crate::model::ProjectionParameters;
use crate::plant::CompanyID;
use crate::units::Emissions;
use bootstrap::{BootstrapOptions, bootstrap_intervals, series_key};
use fit::{HistoryPoint, fit};
use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::collections::BTreeMap;

pub mod bootstrap;
pub mod fit;

/// A method for extrapolating a historical series
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum ProjectionMethod {
    /// Ordinary least squares fit of emissions against year
    #[string = "linear"]
    Linear,
    /// Least squares fit of log emissions against year
    #[string = "exponential"]
    Exponential,
    /// Average over the most recent years
    #[string = "moving_average"]
    MovingAverage,
}

/// How the moving average method extrapolates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, DeserializeLabeledStringEnum)]
pub enum MovingAveragePolicy {
    /// Compound the mean annual growth rate forward from the latest value
    #[default]
    #[string = "growth_rate"]
    GrowthRate,
    /// Hold the mean value flat
    #[string = "level"]
    Level,
}

/// The outcome of projecting a company with a particular method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum)]
pub enum ProjectionStatus {
    /// Estimates and bounds were produced
    #[string = "success"]
    Success,
    /// The company has too few years of history to fit a trend
    #[string = "insufficient_history"]
    InsufficientHistory,
    /// The fit or every bootstrap refit failed, e.g. exponential fit to non-positive values
    #[string = "numeric_failure"]
    NumericFailure,
}

/// Projected emissions for a company in a future year, using one method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    /// The company
    pub company: CompanyID,
    /// The projected year
    pub year: u32,
    /// The fitting method
    pub method: ProjectionMethod,
    /// Emissions from the fit to the full history
    pub point_estimate: Option<Emissions>,
    /// Lower confidence bound
    pub lower_bound: Option<Emissions>,
    /// Upper confidence bound
    pub upper_bound: Option<Emissions>,
    /// Whether the projection succeeded
    pub status: ProjectionStatus,
    /// Number of historical years used
    pub history_years: usize,
}

/// Results for every projection year, all with the same failure status
fn failed_results(
    company: &CompanyID,
    history: &[HistoryPoint],
    method: ProjectionMethod,
    years: &[u32],
    status: ProjectionStatus,
) -> Vec<ProjectionResult> {
    years
        .iter()
        .map(|year| ProjectionResult {
            company: company.clone(),
            year: *year,
            method,
            point_estimate: None,
            lower_bound: None,
            upper_bound: None,
            status,
            history_years: history.len(),
        })
        .collect()
}

/// Project a company's emissions with one method.
///
/// # Arguments
///
/// * `company` - The company
/// * `history` - (year, emissions) pairs, sorted by year
/// * `method` - The fitting method
/// * `params` - Projection parameters
///
/// # Returns
///
/// One result per projection year, in the order given in `params`.
pub fn project_company(
    company: &CompanyID,
    history: &[HistoryPoint],
    method: ProjectionMethod,
    params: &ProjectionParameters,
) -> Vec<ProjectionResult> {
    let years = &params.years;
    let fail = |status| failed_results(company, history, method, years, status);

    if history.len() < params.min_history_years.max(2) as usize {
        return fail(ProjectionStatus::InsufficientHistory);
    }

    let Some(fitted) = fit(method, history, &params.moving_average) else {
        return fail(ProjectionStatus::NumericFailure);
    };

    let points = years.iter().map(|year| fitted.predict(*year)).collect_vec();
    if !points.iter().all(|value| value.is_finite()) {
        return fail(ProjectionStatus::NumericFailure);
    }

    let options = BootstrapOptions {
        method,
        moving_average: &params.moving_average,
        samples: params.bootstrap_samples,
        confidence_level: params.confidence_level,
        key: series_key(params.seed, company.as_str(), method),
    };
    let Some(intervals) = bootstrap_intervals(history, years, &options) else {
        return fail(ProjectionStatus::NumericFailure);
    };

    years
        .iter()
        .zip(points)
        .zip(intervals)
        .map(|((year, point), (lower, upper))| ProjectionResult {
            company: company.clone(),
            year: *year,
            method,
            point_estimate: Some(Emissions(point)),
            // Widen the interval, if needed, so it contains the point estimate
            lower_bound: Some(Emissions(lower.min(point))),
            upper_bound: Some(Emissions(upper.max(point))),
            status: ProjectionStatus::Success,
            history_years: history.len(),
        })
        .collect()
}

/// Get each company's historical emissions series from the company-year table
fn company_histories(
    aggregates: &[CompanyYearAggregate],
) -> BTreeMap<&CompanyID, Vec<HistoryPoint>> {
    let mut histories: BTreeMap<&CompanyID, Vec<HistoryPoint>> = BTreeMap::new();
    for aggregate in aggregates {
        histories
            .entry(&aggregate.company)
            .or_default()
            .push((aggregate.year, aggregate.total_emissions.value()));
    }

    for history in histories.values_mut() {
        history.sort_by_key(|(year, _)| *year);
    }

    histories
}

/// Project emissions for every company with every configured method.
///
/// Companies are projected in parallel.
///
/// # Returns
///
/// Results ordered by company, then method (in configured order), then year.
pub fn project_all_companies(
    aggregates: &[CompanyYearAggregate],
    params: &ProjectionParameters,
) -> Vec<ProjectionResult> {
    if params.years.is_empty() {
        warn!("No projection years specified, so no projections will be made");
        return Vec::new();
    }

    let histories = company_histories(aggregates).into_iter().collect_vec();
    let results: Vec<ProjectionResult> = histories
        .par_iter()
        .flat_map_iter(|(company, history)| {
            params
                .methods
                .iter()
                .flat_map(move |method| project_company(company, history, *method, params))
        })
        .collect();

    let counts = results.iter().counts_by(|result| result.status);
    info!(
        "Projected {} companies: {} succeeded, {} with insufficient history, {} numeric failures",
        histories.len(),
        counts.get(&ProjectionStatus::Success).unwrap_or(&0),
        counts.get(&ProjectionStatus::InsufficientHistory).unwrap_or(&0),
        counts.get(&ProjectionStatus::NumericFailure).unwrap_or(&0)
    );

    results
}
