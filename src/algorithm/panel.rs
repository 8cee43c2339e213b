//! Panel assembly: the dense annual panel and the mandate event-study panel.
//!
//! Both panels are pure joins over the upstream derived tables. Lags and
//! first differences are computed per entity in year order and are null
//! until the required history exists; they are never zero-filled, which
//! would leak a fabricated baseline into any regression run downstream.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::models::Municipality;
use crate::models::derived::fiscal::{DependencyRecord, FiscalYearSummary};
use crate::models::derived::efficiency::EfficiencyRecord;
use crate::models::derived::mandate::Mandate;
use crate::models::derived::panel::{AnnualPanelRow, MandatePanelRow};
use crate::models::raw::RawSocialSnapshot;
use crate::utils::ids::entity_year_id;
use crate::utils::stats::{guarded_div, guarded_ratio, mean_present};

/// Read-only join indices over the derived tables, keyed by (entity, year).
pub struct PanelFacts<'a> {
    summaries: FxHashMap<(&'a str, i32), &'a FiscalYearSummary>,
    dependency: FxHashMap<(&'a str, i32), &'a DependencyRecord>,
    efficiency: FxHashMap<(&'a str, i32), &'a EfficiencyRecord>,
    snapshots: FxHashMap<&'a str, Vec<&'a RawSocialSnapshot>>,
    population: &'a FxHashMap<(String, i32), u64>,
    fiscal_years: FxHashMap<&'a str, u32>,
}

impl<'a> PanelFacts<'a> {
    /// Index the derived tables for per-entity lookups.
    #[must_use]
    pub fn new(
        summaries: &'a [FiscalYearSummary],
        dependency: &'a [DependencyRecord],
        efficiency: &'a [EfficiencyRecord],
        social: &'a [RawSocialSnapshot],
        population: &'a FxHashMap<(String, i32), u64>,
    ) -> Self {
        let mut fiscal_years: FxHashMap<&str, u32> = FxHashMap::default();
        for summary in summaries {
            *fiscal_years.entry(summary.entity_id.as_str()).or_insert(0) += 1;
        }
        let mut snapshots: FxHashMap<&str, Vec<&RawSocialSnapshot>> = FxHashMap::default();
        for snapshot in social {
            snapshots
                .entry(snapshot.entity_id.as_str())
                .or_default()
                .push(snapshot);
        }
        for entity_snapshots in snapshots.values_mut() {
            entity_snapshots.sort_by_key(|s| s.year);
        }
        Self {
            summaries: summaries
                .iter()
                .map(|s| ((s.entity_id.as_str(), s.year), s))
                .collect(),
            dependency: dependency
                .iter()
                .map(|r| ((r.entity_id.as_str(), r.year), r))
                .collect(),
            efficiency: efficiency
                .iter()
                .map(|r| ((r.entity_id.as_str(), r.year), r))
                .collect(),
            snapshots,
            population,
            fiscal_years,
        }
    }

    fn population_at(&self, entity_id: &str, year: i32) -> Option<u64> {
        self.population.get(&(entity_id.to_string(), year)).copied()
    }

    fn development_at(&self, entity_id: &str, year: i32) -> Option<f64> {
        self.snapshots
            .get(entity_id)?
            .iter()
            .rev()
            .find(|s| s.year <= year)
            .map(|s| s.development_index)
    }
}

/// Assemble the dense annual panel over the configured year range.
///
/// Every entity appears in every year of the range; years without fiscal
/// data carry nulls. Entities are processed in parallel and the output
/// keeps the entity-sorted input order, so the table is deterministic.
#[must_use]
pub fn annual_panel(
    municipalities: &[Municipality],
    mandates: &[Mandate],
    facts: &PanelFacts<'_>,
    start_year: i32,
    end_year: i32,
) -> Vec<AnnualPanelRow> {
    let mut mandates_by_entity: FxHashMap<&str, Vec<&Mandate>> = FxHashMap::default();
    for mandate in mandates {
        mandates_by_entity
            .entry(mandate.entity_id.as_str())
            .or_default()
            .push(mandate);
    }

    municipalities
        .par_iter()
        .flat_map_iter(|municipality| {
            entity_rows(
                municipality,
                mandates_by_entity
                    .get(municipality.id.as_str())
                    .map_or(&[][..], Vec::as_slice),
                facts,
                start_year,
                end_year,
            )
        })
        .collect()
}

fn entity_rows(
    municipality: &Municipality,
    mandates: &[&Mandate],
    facts: &PanelFacts<'_>,
    start_year: i32,
    end_year: i32,
) -> Vec<AnnualPanelRow> {
    let entity_id = municipality.id.as_str();
    let insufficient_history = facts.fiscal_years.get(entity_id).copied().unwrap_or(0) < 2;

    let mut rows: Vec<AnnualPanelRow> = (start_year..=end_year)
        .map(|year| {
            let covering = mandates
                .iter()
                .find(|m| (m.term_start..=m.term_end).contains(&year));
            let summary = facts.summaries.get(&(entity_id, year)).copied();
            let population = facts.population_at(entity_id, year);
            let per_capita = |amount: Option<f64>| match (amount, population) {
                (Some(amount), Some(people)) => guarded_div(amount, people as f64),
                _ => None,
            };
            AnnualPanelRow {
                row_id: entity_year_id(entity_id, year),
                entity_id: entity_id.to_string(),
                year,
                state: municipality.state.clone(),
                region: municipality.region.as_str().to_string(),
                size_class: municipality.size_class.as_str().to_string(),
                population,
                mandate_party: covering.map(|m| m.winning_party.clone()),
                mandate_bloc: covering.and_then(|m| m.ideology_bloc.clone()),
                mandate_continuity: covering.map(|m| m.continuity),
                year_in_mandate: covering.map(|m| year - m.term_start + 1),
                net_revenue: summary.map(|s| s.net_revenue),
                paid_expense: summary.map(|s| s.paid_expense),
                fiscal_balance: summary.map(|s| s.fiscal_balance),
                execution_rate: summary.and_then(|s| s.execution_rate),
                spending_per_capita: per_capita(summary.map(|s| s.paid_expense)),
                revenue_per_capita: per_capita(summary.map(|s| s.net_revenue)),
                dependency_ratio: facts
                    .dependency
                    .get(&(entity_id, year))
                    .map(|r| r.dependency_ratio),
                efficiency_index: facts
                    .efficiency
                    .get(&(entity_id, year))
                    .map(|r| r.efficiency_index),
                development_index: facts.development_at(entity_id, year),
                lag1_spending_per_capita: None,
                lag2_spending_per_capita: None,
                delta_spending_per_capita: None,
                growth_spending_per_capita: None,
                lag1_dependency_ratio: None,
                delta_dependency_ratio: None,
                lag1_efficiency_index: None,
                delta_efficiency_index: None,
                lag1_fiscal_balance: None,
                delta_fiscal_balance: None,
                insufficient_history,
            }
        })
        .collect();

    // The panel is dense, so the row at i - 1 is exactly year - 1.
    for i in 0..rows.len() {
        let lag1_spending = (i >= 1).then(|| rows[i - 1].spending_per_capita).flatten();
        let lag2_spending = (i >= 2).then(|| rows[i - 2].spending_per_capita).flatten();
        let lag1_dependency = (i >= 1).then(|| rows[i - 1].dependency_ratio).flatten();
        let lag1_efficiency = (i >= 1).then(|| rows[i - 1].efficiency_index).flatten();
        let lag1_balance = (i >= 1).then(|| rows[i - 1].fiscal_balance).flatten();

        let row = &mut rows[i];
        row.lag1_spending_per_capita = lag1_spending;
        row.lag2_spending_per_capita = lag2_spending;
        row.delta_spending_per_capita = difference(row.spending_per_capita, lag1_spending);
        row.growth_spending_per_capita = match (row.spending_per_capita, lag1_spending) {
            (Some(current), Some(lag)) => guarded_ratio(current - lag, lag),
            _ => None,
        };
        row.lag1_dependency_ratio = lag1_dependency;
        row.delta_dependency_ratio = difference(row.dependency_ratio, lag1_dependency);
        row.lag1_efficiency_index = lag1_efficiency;
        row.delta_efficiency_index = difference(row.efficiency_index, lag1_efficiency);
        row.lag1_fiscal_balance = lag1_balance;
        row.delta_fiscal_balance = difference(row.fiscal_balance, lag1_balance);
    }
    rows
}

fn difference(current: Option<f64>, lag: Option<f64>) -> Option<f64> {
    match (current, lag) {
        (Some(current), Some(lag)) => Some(current - lag),
        _ => None,
    }
}

/// Term-window aggregates for one mandate, kept separate so the pre-period
/// join can reuse them without recomputation.
#[derive(Debug, Clone, Copy, Default)]
struct TermAggregates {
    population: Option<f64>,
    spending_per_capita: Option<f64>,
    revenue_per_capita: Option<f64>,
    fiscal_balance: Option<f64>,
    execution_rate: Option<f64>,
    dependency_ratio: Option<f64>,
    efficiency_index: Option<f64>,
}

fn term_aggregates(mandate: &Mandate, facts: &PanelFacts<'_>) -> TermAggregates {
    let entity_id = mandate.entity_id.as_str();
    let years: Vec<i32> = (mandate.term_start..=mandate.term_end).collect();

    let population: Vec<Option<f64>> = years
        .iter()
        .map(|&y| facts.population_at(entity_id, y).map(|p| p as f64))
        .collect();
    let per_capita = |amount: fn(&FiscalYearSummary) -> f64| -> Vec<Option<f64>> {
        years
            .iter()
            .map(|&y| {
                let summary = facts.summaries.get(&(entity_id, y)).copied()?;
                let people = facts.population_at(entity_id, y)?;
                guarded_div(amount(summary), people as f64)
            })
            .collect()
    };

    TermAggregates {
        population: mean_present(&population),
        spending_per_capita: mean_present(&per_capita(|s| s.paid_expense)),
        revenue_per_capita: mean_present(&per_capita(|s| s.net_revenue)),
        fiscal_balance: mean_present(
            &years
                .iter()
                .map(|&y| facts.summaries.get(&(entity_id, y)).map(|s| s.fiscal_balance))
                .collect::<Vec<_>>(),
        ),
        execution_rate: mean_present(
            &years
                .iter()
                .map(|&y| {
                    facts
                        .summaries
                        .get(&(entity_id, y))
                        .and_then(|s| s.execution_rate)
                })
                .collect::<Vec<_>>(),
        ),
        dependency_ratio: mean_present(
            &years
                .iter()
                .map(|&y| {
                    facts
                        .dependency
                        .get(&(entity_id, y))
                        .map(|r| r.dependency_ratio)
                })
                .collect::<Vec<_>>(),
        ),
        efficiency_index: mean_present(
            &years
                .iter()
                .map(|&y| {
                    facts
                        .efficiency
                        .get(&(entity_id, y))
                        .map(|r| r.efficiency_index)
                })
                .collect::<Vec<_>>(),
        ),
    }
}

/// Assemble the mandate-level event-study panel.
///
/// One row per resolved mandate, carrying the term-window means and the
/// immediately preceding mandate's means as the pre-period. A row is
/// design-valid only from the second mandate on and only when the
/// pre-period fiscal balance exists.
#[must_use]
pub fn mandate_panel(mandates: &[Mandate], facts: &PanelFacts<'_>) -> Vec<MandatePanelRow> {
    let aggregates: Vec<TermAggregates> = mandates
        .par_iter()
        .map(|mandate| term_aggregates(mandate, facts))
        .collect();
    let by_key: FxHashMap<(&str, i32), usize> = mandates
        .iter()
        .enumerate()
        .map(|(idx, m)| ((m.entity_id.as_str(), m.election_year), idx))
        .collect();

    mandates
        .iter()
        .zip(&aggregates)
        .map(|(mandate, own)| {
            let pre = mandate
                .predecessor_election_year
                .and_then(|year| by_key.get(&(mandate.entity_id.as_str(), year)))
                .map(|&idx| aggregates[idx])
                .unwrap_or_default();
            let did_valid = pre.fiscal_balance.is_some() && mandate.sequence >= 2;
            MandatePanelRow {
                row_id: entity_year_id(&mandate.entity_id, mandate.election_year),
                entity_id: mandate.entity_id.clone(),
                election_year: mandate.election_year,
                term_start: mandate.term_start,
                term_end: mandate.term_end,
                sequence: mandate.sequence,
                party: mandate.winning_party.clone(),
                bloc: mandate.ideology_bloc.clone(),
                continuity: mandate.continuity,
                transition: mandate.transition.clone(),
                ideology_delta: mandate.ideology_delta,
                mean_population: own.population,
                mean_spending_per_capita: own.spending_per_capita,
                mean_revenue_per_capita: own.revenue_per_capita,
                mean_fiscal_balance: own.fiscal_balance,
                mean_execution_rate: own.execution_rate,
                mean_dependency_ratio: own.dependency_ratio,
                mean_efficiency_index: own.efficiency_index,
                development_index: facts.development_at(&mandate.entity_id, mandate.term_start),
                pre_spending_per_capita: pre.spending_per_capita,
                pre_fiscal_balance: pre.fiscal_balance,
                pre_dependency_ratio: pre.dependency_ratio,
                pre_efficiency_index: pre.efficiency_index,
                delta_fiscal_balance: difference(own.fiscal_balance, pre.fiscal_balance),
                did_valid,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::derived::mandate::{CompetitionLevel, TERM_LENGTH, TransitionCategory};
    use crate::models::entity::{Region, SizeClass};

    fn municipality(id: &str) -> Municipality {
        Municipality {
            id: id.to_string(),
            name: format!("Town {id}"),
            state: "RO".to_string(),
            region: Region::North,
            size_class: SizeClass::SmallI,
        }
    }

    fn summary(entity: &str, year: i32, net: f64, paid: f64) -> FiscalYearSummary {
        FiscalYearSummary {
            summary_id: entity_year_id(entity, year),
            entity_id: entity.to_string(),
            year,
            committed_expense: paid,
            accrued_expense: paid,
            paid_expense: paid,
            gross_revenue: net,
            revenue_deductions: 0.0,
            net_revenue: net,
            transfer_revenue: 0.0,
            fiscal_balance: net - paid,
            execution_rate: Some(100.0),
        }
    }

    fn mandate(entity: &str, election_year: i32, party: &str, sequence: u32) -> Mandate {
        Mandate {
            mandate_id: entity_year_id(entity, election_year),
            entity_id: entity.to_string(),
            election_year,
            term_start: election_year + 1,
            term_end: election_year + TERM_LENGTH,
            winning_party: party.to_string(),
            vote_share: Some(55.0),
            competition: CompetitionLevel::Low.as_str().to_string(),
            sequence,
            predecessor_party: None,
            predecessor_election_year: (sequence > 1).then(|| election_year - 4),
            continuity: false,
            ideology_score: None,
            ideology_spectrum: None,
            ideology_bloc: None,
            ideology_delta: None,
            transition: TransitionCategory::NoHistory.as_str().to_string(),
        }
    }

    fn people(entries: &[(&str, i32, u64)]) -> FxHashMap<(String, i32), u64> {
        entries
            .iter()
            .map(|(entity, year, count)| (((*entity).to_string(), *year), *count))
            .collect()
    }

    #[test]
    fn panel_is_dense_with_null_facts() {
        let municipalities = vec![municipality("1100015")];
        let summaries = vec![summary("1100015", 2014, 120.0, 100.0)];
        let population = people(&[("1100015", 2014, 10)]);
        let facts = PanelFacts::new(&summaries, &[], &[], &[], &population);
        let rows = annual_panel(&municipalities, &[], &facts, 2013, 2015);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].year, 2013);
        assert_eq!(rows[0].net_revenue, None);
        assert_eq!(rows[1].net_revenue, Some(120.0));
        assert_eq!(rows[1].spending_per_capita, Some(10.0));
        assert_eq!(rows[2].net_revenue, None);
        // One fiscal year only.
        assert!(rows.iter().all(|r| r.insufficient_history));
    }

    #[test]
    fn lags_are_null_until_history_exists_never_zero() {
        let municipalities = vec![municipality("1100015")];
        let summaries = vec![
            summary("1100015", 2013, 120.0, 100.0),
            summary("1100015", 2014, 150.0, 110.0),
            summary("1100015", 2015, 160.0, 121.0),
        ];
        let population = people(&[
            ("1100015", 2013, 10),
            ("1100015", 2014, 10),
            ("1100015", 2015, 10),
        ]);
        let facts = PanelFacts::new(&summaries, &[], &[], &[], &population);
        let rows = annual_panel(&municipalities, &[], &facts, 2013, 2015);
        assert_eq!(rows[0].lag1_spending_per_capita, None);
        assert_eq!(rows[0].delta_spending_per_capita, None);
        assert_eq!(rows[1].lag1_spending_per_capita, Some(10.0));
        assert_eq!(rows[1].delta_spending_per_capita, Some(1.0));
        assert_eq!(rows[1].lag2_spending_per_capita, None);
        assert_eq!(rows[2].lag2_spending_per_capita, Some(10.0));
        assert!((rows[2].growth_spending_per_capita.unwrap() - 10.0).abs() < 1e-9);
        assert!(rows.iter().all(|r| !r.insufficient_history));
    }

    #[test]
    fn dependency_delta_follows_its_series() {
        let municipalities = vec![municipality("0000001")];
        let dependency = [
            DependencyRecord {
                record_id: entity_year_id("0000001", 2013),
                entity_id: "0000001".to_string(),
                year: 2013,
                population: None,
                transfer_per_capita: None,
                own_revenue_per_capita: None,
                dependency_ratio: 80.0,
                own_revenue_ratio: 20.0,
                national_median_dependency: None,
                national_median_own_revenue_pc: None,
                national_median_transfer_pc: None,
                effort_index: None,
            },
            DependencyRecord {
                record_id: entity_year_id("0000001", 2014),
                entity_id: "0000001".to_string(),
                year: 2014,
                population: None,
                transfer_per_capita: None,
                own_revenue_per_capita: None,
                dependency_ratio: 70.0,
                own_revenue_ratio: 30.0,
                national_median_dependency: None,
                national_median_own_revenue_pc: None,
                national_median_transfer_pc: None,
                effort_index: None,
            },
        ];
        let population = FxHashMap::default();
        let facts = PanelFacts::new(&[], &dependency, &[], &[], &population);
        let rows = annual_panel(&municipalities, &[], &facts, 2013, 2014);
        assert_eq!(rows[1].dependency_ratio, Some(70.0));
        assert_eq!(rows[1].delta_dependency_ratio, Some(-10.0));
    }

    #[test]
    fn covering_mandate_and_year_in_term() {
        let municipalities = vec![municipality("1100015")];
        let mandates = vec![mandate("1100015", 2012, "PT", 1)];
        let population = FxHashMap::default();
        let facts = PanelFacts::new(&[], &[], &[], &[], &population);
        let rows = annual_panel(&municipalities, &mandates, &facts, 2012, 2017);
        assert_eq!(rows[0].mandate_party, None);
        assert_eq!(rows[1].mandate_party.as_deref(), Some("PT"));
        assert_eq!(rows[1].year_in_mandate, Some(1));
        assert_eq!(rows[4].year_in_mandate, Some(4));
        assert_eq!(rows[5].mandate_party, None);
    }

    #[test]
    fn mandate_panel_joins_the_pre_period() {
        let mandates = vec![
            mandate("1100015", 2012, "PT", 1),
            mandate("1100015", 2016, "PL", 2),
        ];
        // First term 2013-2016 averages fiscal balance 20; second term
        // 2017-2020 averages 40.
        let summaries: Vec<FiscalYearSummary> = (2013..=2020)
            .map(|y| {
                let balance = if y <= 2016 { 20.0 } else { 40.0 };
                summary("1100015", y, 100.0 + balance, 100.0)
            })
            .collect();
        let population = people(&[("1100015", 2013, 10), ("1100015", 2017, 10)]);
        let facts = PanelFacts::new(&summaries, &[], &[], &[], &population);
        let rows = mandate_panel(&mandates, &facts);
        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        assert!(!first.did_valid);
        assert_eq!(first.pre_fiscal_balance, None);
        assert_eq!(first.mean_fiscal_balance, Some(20.0));
        let second = &rows[1];
        assert!(second.did_valid);
        assert_eq!(second.pre_fiscal_balance, Some(20.0));
        assert_eq!(second.mean_fiscal_balance, Some(40.0));
        assert_eq!(second.delta_fiscal_balance, Some(20.0));
        // Population is only counted in one year per term; the mean skips
        // the missing years instead of treating them as zero.
        assert_eq!(second.mean_population, Some(10.0));
    }

    #[test]
    fn first_mandate_without_pre_period_is_not_design_valid() {
        let mandates = vec![mandate("1100015", 2016, "PL", 2)];
        let summaries = vec![summary("1100015", 2017, 120.0, 100.0)];
        let population = FxHashMap::default();
        let facts = PanelFacts::new(&summaries, &[], &[], &[], &population);
        let rows = mandate_panel(&mandates, &facts);
        // Sequence says 2, but the predecessor mandate is not in the table.
        assert!(!rows[0].did_valid);
        assert_eq!(rows[0].pre_fiscal_balance, None);
    }
}
