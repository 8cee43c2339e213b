//! Composite efficiency scoring and ranking.
//!
//! The fiscal year is the partition boundary for everything here: outcome
//! and spending percentiles, and all four rank scopes, are computed over
//! the cross-section of one year and never mix years. Census snapshots are
//! sparse, so the social baseline for a fiscal year is the most recent
//! snapshot at or before it, carried forward unchanged.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::Municipality;
use crate::models::derived::efficiency::{EfficiencyCategory, EfficiencyRecord};
use crate::models::derived::fiscal::FiscalYearSummary;
use crate::models::raw::RawSocialSnapshot;
use crate::utils::ids::entity_year_id;
use crate::utils::stats::percentile_ranks;

/// Weight of the development index in the outcome composite
pub const WEIGHT_DEVELOPMENT: f64 = 0.4;
/// Weight of (1 − vulnerability) in the outcome composite
pub const WEIGHT_VULNERABILITY: f64 = 0.3;
/// Weight of (1 − inequality) in the outcome composite
pub const WEIGHT_INEQUALITY: f64 = 0.3;

/// Weighted social-outcome composite in [0, 1].
///
/// Vulnerability and inequality enter inverted so a higher composite always
/// means a better outcome.
#[must_use]
pub fn social_outcome_score(snapshot: &RawSocialSnapshot) -> f64 {
    WEIGHT_DEVELOPMENT * snapshot.development_index
        + WEIGHT_VULNERABILITY * (1.0 - snapshot.vulnerability_index)
        + WEIGHT_INEQUALITY * (1.0 - snapshot.inequality_coefficient)
}

/// Fiscal-health modifier keyed to fiscal balance per person.
#[must_use]
pub fn fiscal_modifier(balance_per_capita: f64) -> i32 {
    if balance_per_capita < -500.0 {
        -5
    } else if balance_per_capita < -200.0 {
        -3
    } else if balance_per_capita < 0.0 {
        -1
    } else if balance_per_capita < 200.0 {
        1
    } else if balance_per_capita < 500.0 {
        3
    } else {
        5
    }
}

/// Counters for entity-years excluded from the efficiency table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EfficiencyCounters {
    /// Summary rows whose entity is not in the reference directory
    pub missing_reference: u64,
    /// Entity-years with no census snapshot at or before the year
    pub missing_baseline: u64,
    /// Entity-years without a population count, per-capita values undefined
    pub missing_population: u64,
}

struct Seed {
    entity_id: String,
    state: String,
    region: String,
    size_class: String,
    outcome: f64,
    spending_per_capita: f64,
    balance_per_capita: f64,
}

/// Derive the efficiency records for all summaries.
///
/// Rows only exist where the outcome baseline and the per-capita spending
/// are both computable; exclusions are counted, never zero-filled. Output
/// is sorted by (entity, year).
#[must_use]
pub fn derive_efficiency(
    municipalities: &[Municipality],
    social: &[RawSocialSnapshot],
    summaries: &[FiscalYearSummary],
    population: &FxHashMap<(String, i32), u64>,
) -> (Vec<EfficiencyRecord>, EfficiencyCounters) {
    let mut counters = EfficiencyCounters::default();

    let directory: FxHashMap<&str, &Municipality> =
        municipalities.iter().map(|m| (m.id.as_str(), m)).collect();

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
    let baseline_at = |entity_id: &str, year: i32| -> Option<&RawSocialSnapshot> {
        snapshots
            .get(entity_id)?
            .iter()
            .rev()
            .find(|s| s.year <= year)
            .copied()
    };

    let mut records: Vec<EfficiencyRecord> = Vec::new();
    for (year, group) in &summaries
        .iter()
        .sorted_by_key(|s| (s.year, s.entity_id.as_str()))
        .chunk_by(|s| s.year)
    {
        // Map phase: one seed per entity with a baseline and a population.
        // The group arrives entity-sorted, which fixes the tie-break order
        // of the percentile ranks below.
        let mut seeds: Vec<Seed> = Vec::new();
        for summary in group {
            let Some(municipality) = directory.get(summary.entity_id.as_str()) else {
                counters.missing_reference += 1;
                continue;
            };
            let Some(baseline) = baseline_at(&summary.entity_id, year) else {
                counters.missing_baseline += 1;
                continue;
            };
            let Some(people) = population
                .get(&(summary.entity_id.clone(), year))
                .copied()
                .filter(|&p| p > 0)
            else {
                counters.missing_population += 1;
                continue;
            };
            let people = people as f64;
            seeds.push(Seed {
                entity_id: summary.entity_id.clone(),
                state: municipality.state.clone(),
                region: municipality.region.as_str().to_string(),
                size_class: municipality.size_class.as_str().to_string(),
                outcome: social_outcome_score(baseline),
                spending_per_capita: summary.paid_expense / people,
                balance_per_capita: summary.fiscal_balance / people,
            });
        }
        if seeds.is_empty() {
            continue;
        }

        // Reduce phase: percentiles over the full year cross-section.
        let outcomes: Vec<f64> = seeds.iter().map(|s| s.outcome).collect();
        let spendings: Vec<f64> = seeds.iter().map(|s| s.spending_per_capita).collect();
        let outcome_percentiles = percentile_ranks(&outcomes);
        let spending_percentiles = percentile_ranks(&spendings);

        let year_start = records.len();
        for (idx, seed) in seeds.into_iter().enumerate() {
            let raw_efficiency = outcome_percentiles[idx] - spending_percentiles[idx] + 50.0;
            let modifier = fiscal_modifier(seed.balance_per_capita);
            let efficiency_index = (raw_efficiency + f64::from(modifier)).clamp(0.0, 100.0);
            records.push(EfficiencyRecord {
                record_id: entity_year_id(&seed.entity_id, year),
                entity_id: seed.entity_id,
                year,
                state: seed.state,
                region: seed.region,
                size_class: seed.size_class,
                social_outcome_score: seed.outcome,
                outcome_percentile: outcome_percentiles[idx],
                spending_per_capita: seed.spending_per_capita,
                spending_percentile: spending_percentiles[idx],
                raw_efficiency,
                fiscal_modifier: modifier,
                efficiency_index,
                category: EfficiencyCategory::from_index(efficiency_index)
                    .as_str()
                    .to_string(),
                rank_national: 0,
                rank_state: 0,
                rank_region: 0,
                rank_size_class: 0,
                delta_prior_year: None,
            });
        }
        assign_ranks(&mut records[year_start..]);
    }

    // Prior delta needs the entity's own series in year order. The lookup
    // tolerates gaps: the comparison point is the entity's most recent
    // earlier record, whatever year it was.
    records.sort_by(|a, b| (a.entity_id.as_str(), a.year).cmp(&(b.entity_id.as_str(), b.year)));
    let mut previous: Option<(String, f64)> = None;
    for record in &mut records {
        if let Some((entity, index)) = &previous {
            if *entity == record.entity_id {
                record.delta_prior_year = Some(record.efficiency_index - index);
            }
        }
        previous = Some((record.entity_id.clone(), record.efficiency_index));
    }

    (records, counters)
}

/// Assign the four rank scopes within one year cross-section. Rank 1 is the
/// best index; ties are broken by the entity-sorted input order, so ranks
/// are stable across runs.
fn assign_ranks(records: &mut [EfficiencyRecord]) {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        records[b]
            .efficiency_index
            .partial_cmp(&records[a].efficiency_index)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut national: u32 = 0;
    let mut by_state: FxHashMap<String, u32> = FxHashMap::default();
    let mut by_region: FxHashMap<String, u32> = FxHashMap::default();
    let mut by_size: FxHashMap<String, u32> = FxHashMap::default();
    for idx in order {
        national += 1;
        let record = &mut records[idx];
        record.rank_national = national;
        let state = by_state.entry(record.state.clone()).or_insert(0);
        *state += 1;
        record.rank_state = *state;
        let region = by_region.entry(record.region.clone()).or_insert(0);
        *region += 1;
        record.rank_region = *region;
        let size = by_size.entry(record.size_class.clone()).or_insert(0);
        *size += 1;
        record.rank_size_class = *size;
    }
}
