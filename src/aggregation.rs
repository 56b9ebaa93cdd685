//! Aggregates plant-year records into company-level views.
//!
//! Only operational plant-years contribute. Records are reduced in a canonical order (by company,
//! year and plant ID) so that results do not depend on the order of the input.
use crate::emissions::PlantYearRecord;
use crate::plant::{CompanyID, CountryID, PlantID, Technology};
use crate::projection::fit::linear_slope;
use crate::units::{Capacity, Dimensionless, EmissionFactor, Emissions, Production};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;

/// Reported national production, keyed by country and year
pub type NationalProductionMap = HashMap<(CountryID, u32), Production>;

/// Totals for a company in a single year
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyYearAggregate {
    /// The company
    pub company: CompanyID,
    /// The year
    pub year: u32,
    /// Total rated capacity of the company's operational plants
    pub total_capacity: Capacity,
    /// Total production
    pub total_production: Production,
    /// Total emissions
    pub total_emissions: Emissions,
    /// Number of distinct operational plants
    pub plant_count: usize,
    /// Mean utilisation rate over the company's operational plants
    pub avg_utilisation_rate: Option<Dimensionless>,
    /// Each technology's share of the company's production.
    ///
    /// Empty if the company produced nothing this year.
    pub technology_shares: BTreeMap<Technology, Dimensionless>,
    /// Emissions per unit of production, if anything was produced
    pub emission_intensity: Option<EmissionFactor>,
}

/// Totals for a company across all years
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyTotal {
    /// The company
    pub company: CompanyID,
    /// Total production over all years
    pub total_production: Production,
    /// Total emissions over all years
    pub total_emissions: Emissions,
    /// Production-weighted emission factor, if anything was produced
    pub weighted_emission_factor: Option<EmissionFactor>,
    /// Number of distinct plants which operated in any year
    pub plant_count: usize,
    /// The first year with an operational plant
    pub first_year: u32,
    /// The last year with an operational plant
    pub last_year: u32,
    /// The number of years with an operational plant
    pub year_count: usize,
}

/// The direction and size of a company's emissions trend over the analysis window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyTrend {
    /// The company
    pub company: CompanyID,
    /// Least squares change in emissions per year
    pub trend_slope: f64,
    /// Change from the first to the last year as a percentage of the first, if that is non-zero
    pub percentage_change: Option<f64>,
    /// Mean annual emissions
    pub average_emissions: Emissions,
    /// The first year with an operational plant
    pub first_year: u32,
    /// The last year with an operational plant
    pub last_year: u32,
    /// The number of years with an operational plant
    pub year_count: usize,
}

/// Calculated production for a country and year, compared against the reported figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionComparison {
    /// The country
    pub country: CountryID,
    /// The year
    pub year: u32,
    /// Sum of production over the country's operational plants
    pub calculated_production: Production,
    /// Production reported in national statistics
    pub reported_production: Production,
    /// Calculated minus reported production
    pub difference: Production,
    /// The difference as a percentage of reported production, if that is non-zero
    pub percentage_difference: Option<f64>,
}

/// Divide emissions by production, unless production is zero
fn emission_intensity(emissions: Emissions, production: Production) -> Option<EmissionFactor> {
    (production > Production(0.0)).then(|| emissions / production)
}

/// The operational records, sorted by company, year and plant ID
fn sorted_operational_records(records: &[PlantYearRecord]) -> Vec<&PlantYearRecord> {
    records
        .iter()
        .filter(|record| record.operational)
        .sorted_by(|a, b| {
            (&a.company, a.year, &a.plant_id).cmp(&(&b.company, b.year, &b.plant_id))
        })
        .collect()
}

/// Build the aggregate for one company-year from its records, which are sorted by plant ID
fn aggregate_company_year(
    company: CompanyID,
    year: u32,
    records: &[&PlantYearRecord],
) -> CompanyYearAggregate {
    let total_capacity = records.iter().map(|record| record.capacity).sum();
    let total_production = records.iter().map(|record| record.production).sum();
    let total_emissions = records.iter().map(|record| record.emissions).sum();
    let plant_count = records.iter().map(|record| &record.plant_id).dedup().count();
    let rates = records
        .iter()
        .filter_map(|record| record.utilisation_rate)
        .map(Dimensionless::value)
        .collect_vec();
    let avg_utilisation_rate = (!rates.is_empty())
        .then(|| Dimensionless(rates.iter().sum::<f64>() / rates.len() as f64));

    let mut technology_shares = BTreeMap::new();
    if total_production > Production(0.0) {
        let mut by_technology: BTreeMap<Technology, Production> = BTreeMap::new();
        for record in records {
            *by_technology.entry(record.technology).or_default() += record.production;
        }
        technology_shares.extend(
            by_technology
                .into_iter()
                .map(|(technology, production)| (technology, production / total_production)),
        );
    }

    CompanyYearAggregate {
        company,
        year,
        total_capacity,
        total_production,
        total_emissions,
        plant_count,
        avg_utilisation_rate,
        technology_shares,
        emission_intensity: emission_intensity(total_emissions, total_production),
    }
}

/// Sum operational plant-year records for each company and year.
///
/// # Returns
///
/// One aggregate per company-year with at least one operational plant, ordered by company and
/// then year.
pub fn aggregate_by_company_and_year(records: &[PlantYearRecord]) -> Vec<CompanyYearAggregate> {
    sorted_operational_records(records)
        .into_iter()
        .chunk_by(|record| (record.company.clone(), record.year))
        .into_iter()
        .map(|((company, year), group)| {
            let group = group.collect_vec();
            aggregate_company_year(company, year, &group)
        })
        .collect()
}

/// Sum operational plant-year records for each company across all years.
///
/// # Returns
///
/// One total per company with at least one operational plant-year, ordered by total emissions
/// (descending) with ties broken by company.
pub fn aggregate_by_company_total(records: &[PlantYearRecord]) -> Vec<CompanyTotal> {
    let mut totals = sorted_operational_records(records)
        .into_iter()
        .chunk_by(|record| record.company.clone())
        .into_iter()
        .map(|(company, group)| {
            let group = group.collect_vec();
            let total_production = group.iter().map(|record| record.production).sum();
            let total_emissions = group.iter().map(|record| record.emissions).sum();
            let plants: HashSet<&PlantID> = group.iter().map(|record| &record.plant_id).collect();
            let years = group.iter().map(|record| record.year).dedup().collect_vec();

            CompanyTotal {
                company,
                total_production,
                total_emissions,
                weighted_emission_factor: emission_intensity(total_emissions, total_production),
                plant_count: plants.len(),
                // Groups are never empty and are sorted by year
                first_year: years[0],
                last_year: years[years.len() - 1],
                year_count: years.len(),
            }
        })
        .collect_vec();

    totals.sort_by(|a, b| {
        b.total_emissions
            .value()
            .total_cmp(&a.total_emissions.value())
            .then_with(|| a.company.cmp(&b.company))
    });

    totals
}

/// Summarise the emissions trend of each company with enough history.
///
/// Companies with fewer than `min_years` company-years are left out.
///
/// # Returns
///
/// One trend per company, ordered by company.
pub fn calculate_company_trends(
    aggregates: &[CompanyYearAggregate],
    min_years: u32,
) -> Vec<CompanyTrend> {
    aggregates
        .iter()
        .sorted_by(|a, b| (&a.company, a.year).cmp(&(&b.company, b.year)))
        .chunk_by(|aggregate| aggregate.company.clone())
        .into_iter()
        .filter_map(|(company, group)| {
            let history = group
                .map(|aggregate| (aggregate.year, aggregate.total_emissions.value()))
                .collect_vec();
            if history.len() < min_years as usize {
                return None;
            }

            let (first_year, first) = history[0];
            let (last_year, last) = history[history.len() - 1];
            let total: f64 = history.iter().map(|(_, emissions)| emissions).sum();

            Some(CompanyTrend {
                company,
                trend_slope: linear_slope(&history),
                percentage_change: (first > 0.0).then(|| 100.0 * (last - first) / first),
                average_emissions: Emissions(total / history.len() as f64),
                first_year,
                last_year,
                year_count: history.len(),
            })
        })
        .collect()
}

/// Compare calculated national production against reported figures.
///
/// A row is produced for every reported (country, year) pair where the year falls within
/// `years`, ordered by country and then year.
pub fn compare_with_reported_production(
    records: &[PlantYearRecord],
    reported: &NationalProductionMap,
    years: &RangeInclusive<u32>,
) -> Vec<ProductionComparison> {
    let mut calculated: BTreeMap<(&CountryID, u32), Production> = BTreeMap::new();
    for record in records.iter().filter(|record| record.operational).sorted_by(|a, b| {
        (&a.country, a.year, &a.plant_id).cmp(&(&b.country, b.year, &b.plant_id))
    }) {
        *calculated.entry((&record.country, record.year)).or_default() += record.production;
    }

    reported
        .iter()
        .filter(|((_, year), _)| years.contains(year))
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|((country, year), reported_production)| {
            let calculated_production = calculated
                .get(&(country, *year))
                .copied()
                .unwrap_or_default();
            let difference = calculated_production - *reported_production;
            let percentage_difference = (*reported_production != Production(0.0))
                .then(|| 100.0 * difference.value() / reported_production.value());

            ProductionComparison {
                country: country.clone(),
                year: *year,
                calculated_production,
                reported_production: *reported_production,
                difference,
                percentage_difference,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::OperationalStatus;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    fn record(
        plant_id: &str,
        company: &str,
        technology: Technology,
        year: u32,
        production: f64,
        factor: f64,
    ) -> PlantYearRecord {
        PlantYearRecord {
            plant_id: plant_id.into(),
            company: company.into(),
            country: "China".into(),
            technology,
            capacity: Capacity(100.0),
            year,
            status: OperationalStatus::Operational,
            operational: true,
            utilisation_rate: Some(Dimensionless(production / 100.0)),
            production: Production(production),
            emission_factor: Some(EmissionFactor(factor)),
            emissions: Emissions(production * factor),
        }
    }

    #[fixture]
    fn records() -> Vec<PlantYearRecord> {
        let mut pending = record("p4", "b", Technology::Eaf, 2020, 0.0, 0.5);
        pending.status = OperationalStatus::Pending;
        pending.operational = false;
        pending.utilisation_rate = None;
        pending.emission_factor = None;

        vec![
            record("p1", "a", Technology::BfBof, 2020, 80.0, 2.0),
            record("p2", "a", Technology::Eaf, 2020, 20.0, 0.5),
            record("p1", "a", Technology::BfBof, 2021, 70.0, 2.0),
            record("p3", "b", Technology::Dri, 2021, 10.0, 1.5),
            pending,
        ]
    }

    #[rstest]
    fn test_aggregate_by_company_and_year(records: Vec<PlantYearRecord>) {
        let aggregates = aggregate_by_company_and_year(&records);
        let keys = aggregates
            .iter()
            .map(|agg| (agg.company.as_str(), agg.year, agg.plant_count))
            .collect_vec();

        // Company b has no operational plants in 2020
        assert_eq!(keys, [("a", 2020, 2), ("a", 2021, 1), ("b", 2021, 1)]);

        let first = &aggregates[0];
        assert_approx_eq!(Production, first.total_production, Production(100.0));
        assert_approx_eq!(Emissions, first.total_emissions, Emissions(170.0));
        assert_approx_eq!(Capacity, first.total_capacity, Capacity(200.0));
        assert_approx_eq!(
            Dimensionless,
            first.avg_utilisation_rate.unwrap(),
            Dimensionless(0.5)
        );
        assert_approx_eq!(
            EmissionFactor,
            first.emission_intensity.unwrap(),
            EmissionFactor(1.7)
        );
        assert_approx_eq!(
            Dimensionless,
            first.technology_shares[&Technology::BfBof],
            Dimensionless(0.8)
        );
        assert_approx_eq!(
            Dimensionless,
            first.technology_shares[&Technology::Eaf],
            Dimensionless(0.2)
        );
    }

    #[rstest]
    fn test_aggregate_sum_invariant(records: Vec<PlantYearRecord>) {
        for agg in aggregate_by_company_and_year(&records) {
            let expected: Emissions = records
                .iter()
                .filter(|r| r.operational && r.company == agg.company && r.year == agg.year)
                .map(|r| r.emissions)
                .sum();
            assert_approx_eq!(Emissions, agg.total_emissions, expected);
        }
    }

    #[rstest]
    fn test_aggregate_order_independent(records: Vec<PlantYearRecord>) {
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(
            aggregate_by_company_and_year(&records),
            aggregate_by_company_and_year(&reversed)
        );
        assert_eq!(
            aggregate_by_company_total(&records),
            aggregate_by_company_total(&reversed)
        );
    }

    #[test]
    fn test_aggregate_zero_production() {
        let records = [record("p1", "a", Technology::BfBof, 2020, 0.0, 2.0)];
        let aggregates = aggregate_by_company_and_year(&records);
        assert_eq!(aggregates.len(), 1);
        assert!(aggregates[0].technology_shares.is_empty());
        assert_eq!(aggregates[0].emission_intensity, None);
    }

    #[rstest]
    fn test_aggregate_by_company_total(records: Vec<PlantYearRecord>) {
        let totals = aggregate_by_company_total(&records);
        assert_eq!(totals.len(), 2);

        // Ordered by emissions, descending
        let a = &totals[0];
        assert_eq!(a.company.as_str(), "a");
        assert_approx_eq!(Production, a.total_production, Production(170.0));
        assert_approx_eq!(Emissions, a.total_emissions, Emissions(310.0));
        assert_approx_eq!(
            EmissionFactor,
            a.weighted_emission_factor.unwrap(),
            EmissionFactor(310.0 / 170.0)
        );
        assert_eq!(a.plant_count, 2);
        assert_eq!((a.first_year, a.last_year, a.year_count), (2020, 2021, 2));

        let b = &totals[1];
        assert_eq!(b.company.as_str(), "b");
        assert_eq!((b.first_year, b.last_year, b.year_count), (2021, 2021, 1));
    }

    #[test]
    fn test_company_total_tie_broken_by_company() {
        let records = [
            record("p1", "z", Technology::Eaf, 2020, 10.0, 0.5),
            record("p2", "m", Technology::Eaf, 2020, 10.0, 0.5),
        ];
        let totals = aggregate_by_company_total(&records);
        assert_eq!(totals[0].company.as_str(), "m");
        assert_eq!(totals[1].company.as_str(), "z");
    }

    /// Company-year aggregates for one company with the given emissions, from 2020 onwards
    fn emissions_history(company: &str, emissions: &[f64]) -> Vec<CompanyYearAggregate> {
        let records = (2020..)
            .zip(emissions)
            .map(|(year, emissions)| record("p1", company, Technology::BfBof, year, *emissions, 1.0))
            .collect_vec();
        aggregate_by_company_and_year(&records)
    }

    #[test]
    fn test_calculate_company_trends() {
        let mut aggregates = emissions_history("b", &[20.0, 22.0, 21.0, 25.0, 27.0]);
        aggregates.extend(emissions_history("a", &[10.0, 9.0, 8.0, 7.0, 6.0, 5.0]));
        aggregates.extend(emissions_history("c", &[1.0, 2.0]));

        let trends = calculate_company_trends(&aggregates, 5);
        let companies = trends.iter().map(|trend| trend.company.as_str()).collect_vec();
        assert_eq!(companies, ["a", "b"]); // c has too few years

        let a = &trends[0];
        assert_approx_eq!(f64, a.trend_slope, -1.0);
        assert_approx_eq!(f64, a.percentage_change.unwrap(), -50.0);
        assert_approx_eq!(Emissions, a.average_emissions, Emissions(7.5));
        assert_eq!((a.first_year, a.last_year, a.year_count), (2020, 2025, 6));

        let b = &trends[1];
        assert_approx_eq!(f64, b.trend_slope, 1.7);
        assert_approx_eq!(f64, b.percentage_change.unwrap(), 35.0);
        assert_approx_eq!(Emissions, b.average_emissions, Emissions(23.0));
    }

    #[test]
    fn test_calculate_company_trends_zero_first_year() {
        let aggregates = emissions_history("a", &[0.0, 5.0, 10.0]);
        let trends = calculate_company_trends(&aggregates, 2);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].percentage_change, None);
        assert_approx_eq!(f64, trends[0].trend_slope, 5.0);
    }

    #[rstest]
    fn test_compare_with_reported_production(records: Vec<PlantYearRecord>) {
        let reported = NationalProductionMap::from([
            (("China".into(), 2020), Production(125.0)),
            (("China".into(), 2021), Production(0.0)),
            (("China".into(), 2030), Production(1.0)), // outside window
        ]);
        let comparison = compare_with_reported_production(&records, &reported, &(2020..=2021));

        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[0].year, 2020);
        assert_approx_eq!(
            Production,
            comparison[0].calculated_production,
            Production(100.0)
        );
        assert_approx_eq!(Production, comparison[0].difference, Production(-25.0));
        assert_approx_eq!(f64, comparison[0].percentage_difference.unwrap(), -20.0);

        assert_eq!(comparison[1].year, 2021);
        assert_eq!(comparison[1].percentage_difference, None);
    }
}
