//! Fiscal aggregation and dependency benchmarking.
//!
//! Two stages share this module. The aggregator folds the raw fiscal facts
//! into one [`FiscalYearSummary`] per entity-year, classifying revenue
//! accounts into transfer classes on the way. The benchmarker then runs the
//! two-phase map/reduce: per-entity ratios first, then year-partitioned
//! national medians broadcast back into each [`DependencyRecord`].

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::derived::fiscal::{DependencyRecord, FiscalYearSummary};
use crate::models::raw::{ExpenseStage, FiscalStage, RawFiscalRecord, RevenueStage};
use crate::models::year;
use crate::utils::ids::entity_year_id;
use crate::utils::stats::{guarded_div, guarded_ratio, median};

/// Class of a higher-government transfer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferClass {
    /// Earmarked education fund
    Fundeb,
    /// Federal revenue sharing
    FederalSharing,
    /// Public health system transfers
    Health,
    /// State tax sharing
    StateSharing,
    /// Other current transfers
    OtherCurrent,
    /// Capital transfers
    Capital,
}

/// Predicate side of a transfer rule.
#[derive(Debug, Clone, Copy)]
pub enum TransferPredicate {
    /// Case-insensitive substring match on the account label
    LabelContains(&'static str),
    /// Case-insensitive whole-word match on the account label. Acronym
    /// rules use this: "sus" as a substring would also hit unrelated
    /// labels like "Sustação".
    LabelWord(&'static str),
    /// Prefix match on the dotted account code
    CodePrefix(&'static str),
}

impl TransferPredicate {
    fn matches(self, account_code: &str, account_label: &str) -> bool {
        match self {
            Self::LabelContains(needle) => account_label.to_lowercase().contains(needle),
            Self::LabelWord(word) => account_label
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .any(|candidate| candidate == word),
            Self::CodePrefix(prefix) => account_code.starts_with(prefix),
        }
    }
}

/// Ordered transfer classification rules. Evaluation is first-match-wins:
/// the label rules outrank the code-prefix rules so that an earmarked fund
/// booked under a generic transfer code still gets its specific class.
/// Accounts matching no rule are not transfers.
pub const TRANSFER_RULES: &[(TransferPredicate, TransferClass)] = &[
    (TransferPredicate::LabelContains("fundeb"), TransferClass::Fundeb),
    (TransferPredicate::LabelWord("fpm"), TransferClass::FederalSharing),
    (
        TransferPredicate::LabelContains("fundo de participa"),
        TransferClass::FederalSharing,
    ),
    (TransferPredicate::LabelWord("sus"), TransferClass::Health),
    (TransferPredicate::LabelWord("icms"), TransferClass::StateSharing),
    (TransferPredicate::LabelWord("ipva"), TransferClass::StateSharing),
    (TransferPredicate::CodePrefix("1.7.1"), TransferClass::FederalSharing),
    (TransferPredicate::CodePrefix("1.7.2"), TransferClass::StateSharing),
    (TransferPredicate::CodePrefix("1.7"), TransferClass::OtherCurrent),
    (TransferPredicate::CodePrefix("2.4"), TransferClass::Capital),
];

/// Transfer class of a revenue account, or `None` for own revenue.
#[must_use]
pub fn classify_transfer(account_code: &str, account_label: &str) -> Option<TransferClass> {
    TRANSFER_RULES
        .iter()
        .find(|(predicate, _)| predicate.matches(account_code, account_label))
        .map(|&(_, class)| class)
}

#[derive(Debug, Default)]
struct StageSums {
    committed: f64,
    accrued: f64,
    paid: f64,
    gross: f64,
    deductions: f64,
    transfers: f64,
}

/// Fold the raw fiscal facts into one summary per entity-year.
///
/// Amounts are summed per execution stage; the transfer total only counts
/// gross-stage revenue whose account matches a transfer rule. Output is
/// sorted by (entity, year).
#[must_use]
pub fn aggregate_summaries(records: &[RawFiscalRecord]) -> Vec<FiscalYearSummary> {
    let mut sums: FxHashMap<(String, i32), StageSums> = FxHashMap::default();
    for record in records {
        let entry = sums
            .entry((record.entity_id.clone(), record.year))
            .or_default();
        match record.stage {
            FiscalStage::Expense(ExpenseStage::Committed) => entry.committed += record.amount,
            FiscalStage::Expense(ExpenseStage::Accrued) => entry.accrued += record.amount,
            FiscalStage::Expense(ExpenseStage::Paid) => entry.paid += record.amount,
            FiscalStage::Revenue(RevenueStage::Gross) => {
                entry.gross += record.amount;
                if classify_transfer(&record.account_code, &record.account_label).is_some() {
                    entry.transfers += record.amount;
                }
            }
            FiscalStage::Revenue(RevenueStage::Deduction) => entry.deductions += record.amount,
        }
    }

    sums.into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((entity_id, year), sums)| {
            let net_revenue = sums.gross - sums.deductions;
            FiscalYearSummary {
                summary_id: entity_year_id(&entity_id, year),
                entity_id,
                year,
                committed_expense: sums.committed,
                accrued_expense: sums.accrued,
                paid_expense: sums.paid,
                gross_revenue: sums.gross,
                revenue_deductions: sums.deductions,
                net_revenue,
                transfer_revenue: sums.transfers,
                fiscal_balance: net_revenue - sums.paid,
                execution_rate: guarded_ratio(sums.paid, sums.committed),
            }
        })
        .collect()
}

/// National medians for one fiscal year, computed over the entities with a
/// valid dependency ratio that year.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearBenchmarks {
    /// Median dependency ratio
    pub dependency: Option<f64>,
    /// Median own revenue per person
    pub own_revenue_per_capita: Option<f64>,
    /// Median transfer revenue per person
    pub transfer_per_capita: Option<f64>,
}

/// Counters for rows excluded or degraded while deriving dependency records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DependencyCounters {
    /// Entity-years whose dependency ratio fell outside [0, 100]
    pub range_violations: u64,
    /// Entity-years with zero net revenue, no ratio computable
    pub guarded_divisions: u64,
    /// Entity-years without a population count, per-capita values null
    pub missing_population: u64,
}

struct DependencySeed {
    entity_id: String,
    year: i32,
    population: Option<u64>,
    transfer_per_capita: Option<f64>,
    own_revenue_per_capita: Option<f64>,
    dependency_ratio: f64,
    own_revenue_ratio: f64,
}

/// Derive the dependency records for all summaries.
///
/// Phase one computes each entity-year's ratios and per-capita values;
/// entity-years with zero net revenue or an out-of-range dependency ratio
/// are dropped here (dropped, never clamped). Phase two computes the
/// national medians per year over the survivors and broadcasts them back;
/// years outside the national coverage window get null benchmarks.
/// Output is sorted by (entity, year).
#[must_use]
pub fn derive_dependency(
    summaries: &[FiscalYearSummary],
    population: &FxHashMap<(String, i32), u64>,
) -> (Vec<DependencyRecord>, DependencyCounters) {
    let mut counters = DependencyCounters::default();

    let mut seeds: Vec<DependencySeed> = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let own_revenue = summary.net_revenue - summary.transfer_revenue;
        let Some(dependency_ratio) = guarded_ratio(summary.transfer_revenue, summary.net_revenue)
        else {
            counters.guarded_divisions += 1;
            continue;
        };
        if !(0.0..=100.0).contains(&dependency_ratio) {
            counters.range_violations += 1;
            continue;
        }
        // Same denominator as the dependency ratio, so this cannot fail.
        let own_revenue_ratio =
            guarded_ratio(own_revenue, summary.net_revenue).unwrap_or(0.0);

        let count = population
            .get(&(summary.entity_id.clone(), summary.year))
            .copied();
        if count.is_none() {
            counters.missing_population += 1;
        }
        let per_capita = |amount: f64| {
            count.and_then(|people| guarded_div(amount, people as f64))
        };

        seeds.push(DependencySeed {
            entity_id: summary.entity_id.clone(),
            year: summary.year,
            population: count,
            transfer_per_capita: per_capita(summary.transfer_revenue),
            own_revenue_per_capita: per_capita(own_revenue),
            dependency_ratio,
            own_revenue_ratio,
        });
    }

    // Year-partitioned reduce: medians over the surviving cross-section.
    // Outside the years with national coverage the cross-section is a
    // fragment, so no benchmark is published and effort stays null; the
    // entity's own ratios are kept either way.
    let mut benchmarks: FxHashMap<i32, YearBenchmarks> = FxHashMap::default();
    for (year, group) in &seeds.iter().sorted_by_key(|s| s.year).chunk_by(|s| s.year) {
        if !year::has_benchmark_data(year) {
            continue;
        }
        let group: Vec<&DependencySeed> = group.collect();
        let dependency: Vec<f64> = group.iter().map(|s| s.dependency_ratio).collect();
        let own_pc: Vec<f64> = group
            .iter()
            .filter_map(|s| s.own_revenue_per_capita)
            .collect();
        let transfer_pc: Vec<f64> = group
            .iter()
            .filter_map(|s| s.transfer_per_capita)
            .collect();
        benchmarks.insert(
            year,
            YearBenchmarks {
                dependency: median(&dependency),
                own_revenue_per_capita: median(&own_pc),
                transfer_per_capita: median(&transfer_pc),
            },
        );
    }

    let mut records: Vec<DependencyRecord> = seeds
        .into_iter()
        .map(|seed| {
            let bench = benchmarks.get(&seed.year).copied().unwrap_or_default();
            let effort_index = match (seed.own_revenue_per_capita, bench.own_revenue_per_capita) {
                (Some(own), Some(national)) => guarded_div(own, national),
                _ => None,
            };
            DependencyRecord {
                record_id: entity_year_id(&seed.entity_id, seed.year),
                entity_id: seed.entity_id,
                year: seed.year,
                population: seed.population,
                transfer_per_capita: seed.transfer_per_capita,
                own_revenue_per_capita: seed.own_revenue_per_capita,
                dependency_ratio: seed.dependency_ratio,
                own_revenue_ratio: seed.own_revenue_ratio,
                national_median_dependency: bench.dependency,
                national_median_own_revenue_pc: bench.own_revenue_per_capita,
                national_median_transfer_pc: bench.transfer_per_capita,
                effort_index,
            }
        })
        .collect();
    records.sort_by(|a, b| (a.entity_id.as_str(), a.year).cmp(&(b.entity_id.as_str(), b.year)));

    (records, counters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revenue(entity: &str, year: i32, code: &str, label: &str, amount: f64) -> RawFiscalRecord {
        RawFiscalRecord {
            entity_id: entity.to_string(),
            year,
            account_code: code.to_string(),
            account_label: label.to_string(),
            stage: FiscalStage::Revenue(RevenueStage::Gross),
            amount,
        }
    }

    fn expense(entity: &str, year: i32, stage: ExpenseStage, amount: f64) -> RawFiscalRecord {
        RawFiscalRecord {
            entity_id: entity.to_string(),
            year,
            account_code: "3.0.00.00.00".to_string(),
            account_label: "Despesas Correntes".to_string(),
            stage: FiscalStage::Expense(stage),
            amount,
        }
    }

    #[test]
    fn label_rules_outrank_code_rules() {
        // An earmarked fund under a generic federal-sharing code keeps its
        // specific class.
        assert_eq!(
            classify_transfer("1.7.1.8.01.2.0", "Transferências do FUNDEB"),
            Some(TransferClass::Fundeb)
        );
        assert_eq!(
            classify_transfer("1.7.1.8.01.2.0", "Cota-Parte do FPM"),
            Some(TransferClass::FederalSharing)
        );
        assert_eq!(
            classify_transfer("1.7.2.8.01.1.0", "Cota-Parte do ICMS"),
            Some(TransferClass::StateSharing)
        );
        assert_eq!(
            classify_transfer("1.7.1.3.99.0.0", "Outras transferências"),
            Some(TransferClass::FederalSharing)
        );
        assert_eq!(
            classify_transfer("1.7.9.9.99.0.0", "Outras transferências correntes"),
            Some(TransferClass::OtherCurrent)
        );
        assert_eq!(
            classify_transfer("2.4.1.8.01.0.0", "Transferências de capital"),
            Some(TransferClass::Capital)
        );
        // Own tax revenue matches nothing.
        assert_eq!(classify_transfer("1.1.1.8.01.1.0", "IPTU"), None);
    }

    #[test]
    fn acronym_rules_match_whole_words_only() {
        assert_eq!(
            classify_transfer("1.9.2.2.99.0.0", "Sustação de Pagamentos"),
            None
        );
        assert_eq!(
            classify_transfer("1.9.9.9.99.0.0", "Receita de Suspensão Judicial"),
            None
        );
        assert_eq!(
            classify_transfer("1.9.9.9.99.0.0", "Transferências do SUS - Bloco de Custeio"),
            Some(TransferClass::Health)
        );
        assert_eq!(
            classify_transfer("1.9.9.9.99.0.0", "Repasse FPM/Extra"),
            Some(TransferClass::FederalSharing)
        );
    }

    #[test]
    fn aggregation_sums_per_stage_and_classifies_transfers() {
        let records = vec![
            revenue("1100015", 2015, "1.1.1.8.01.1.0", "IPTU", 40.0),
            revenue("1100015", 2015, "1.7.1.8.01.2.0", "Cota-Parte do FPM", 55.0),
            revenue("1100015", 2015, "1.7.2.8.01.1.0", "Cota-Parte do ICMS", 25.0),
            RawFiscalRecord {
                stage: FiscalStage::Revenue(RevenueStage::Deduction),
                ..revenue("1100015", 2015, "9.0.00.00.00", "Dedução FUNDEB", 20.0)
            },
            expense("1100015", 2015, ExpenseStage::Committed, 90.0),
            expense("1100015", 2015, ExpenseStage::Accrued, 85.0),
            expense("1100015", 2015, ExpenseStage::Paid, 81.0),
        ];
        let summaries = aggregate_summaries(&records);
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.gross_revenue, 120.0);
        assert_eq!(s.revenue_deductions, 20.0);
        assert_eq!(s.net_revenue, 100.0);
        assert_eq!(s.transfer_revenue, 80.0);
        assert_eq!(s.committed_expense, 90.0);
        assert_eq!(s.paid_expense, 81.0);
        assert_eq!(s.fiscal_balance, 19.0);
        assert_eq!(s.execution_rate, Some(90.0));
    }

    #[test]
    fn nothing_committed_means_null_execution_rate() {
        let records = vec![expense("1100015", 2015, ExpenseStage::Paid, 10.0)];
        let summaries = aggregate_summaries(&records);
        assert_eq!(summaries[0].execution_rate, None);
    }

    fn summary(entity: &str, year: i32, net: f64, transfers: f64) -> FiscalYearSummary {
        FiscalYearSummary {
            summary_id: entity_year_id(entity, year),
            entity_id: entity.to_string(),
            year,
            committed_expense: 0.0,
            accrued_expense: 0.0,
            paid_expense: 0.0,
            gross_revenue: net,
            revenue_deductions: 0.0,
            net_revenue: net,
            transfer_revenue: transfers,
            fiscal_balance: net,
            execution_rate: None,
        }
    }

    #[test]
    fn dependency_ratio_per_year() {
        let summaries = vec![
            summary("0000001", 2013, 100.0, 80.0),
            summary("0000001", 2014, 120.0, 84.0),
        ];
        let (records, counters) = derive_dependency(&summaries, &FxHashMap::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dependency_ratio, 80.0);
        assert_eq!(records[1].dependency_ratio, 70.0);
        assert_eq!(records[0].own_revenue_ratio, 20.0);
        assert_eq!(counters.missing_population, 2);
        assert_eq!(records[0].population, None);
        assert_eq!(records[0].transfer_per_capita, None);
    }

    #[test]
    fn out_of_range_ratios_are_dropped_not_clamped() {
        let summaries = vec![
            summary("1100015", 2015, 100.0, 150.0),
            summary("1100023", 2015, 100.0, -10.0),
            summary("1100031", 2015, 100.0, 60.0),
        ];
        let (records, counters) = derive_dependency(&summaries, &FxHashMap::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, "1100031");
        assert_eq!(counters.range_violations, 2);
    }

    #[test]
    fn zero_net_revenue_is_a_guarded_division() {
        let summaries = vec![summary("1100015", 2015, 0.0, 0.0)];
        let (records, counters) = derive_dependency(&summaries, &FxHashMap::default());
        assert!(records.is_empty());
        assert_eq!(counters.guarded_divisions, 1);
    }

    #[test]
    fn benchmarks_are_year_partitioned_medians() {
        let mut population = FxHashMap::default();
        for entity in ["1100015", "1100023", "1100031"] {
            population.insert((entity.to_string(), 2015), 1000_u64);
        }
        let summaries = vec![
            summary("1100015", 2015, 100.0, 40.0),
            summary("1100023", 2015, 100.0, 60.0),
            summary("1100031", 2015, 100.0, 80.0),
            summary("1100015", 2016, 100.0, 10.0),
        ];
        let (records, _) = derive_dependency(&summaries, &population);
        let r2015: Vec<&DependencyRecord> = records.iter().filter(|r| r.year == 2015).collect();
        assert_eq!(r2015[0].national_median_dependency, Some(60.0));
        // Own revenue pc: 0.06, 0.04, 0.02 → median 0.04; entity 1100015 has
        // own pc 0.06 → effort index 1.5.
        let first = r2015.iter().find(|r| r.entity_id == "1100015").unwrap();
        assert!((first.effort_index.unwrap() - 1.5).abs() < 1e-9);
        // 2016 is its own partition: single entity, median equals itself.
        let r2016 = records.iter().find(|r| r.year == 2016).unwrap();
        assert_eq!(r2016.national_median_dependency, Some(10.0));
    }

    #[test]
    fn years_without_national_coverage_get_null_benchmarks() {
        let mut population = FxHashMap::default();
        population.insert(("1100015".to_string(), 2012), 1000_u64);
        let summaries = vec![summary("1100015", 2012, 100.0, 40.0)];
        let (records, _) = derive_dependency(&summaries, &population);
        // The entity's own ratios survive; only the benchmarks are null.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dependency_ratio, 40.0);
        assert_eq!(records[0].national_median_dependency, None);
        assert_eq!(records[0].national_median_own_revenue_pc, None);
        assert_eq!(records[0].effort_index, None);
    }
}
