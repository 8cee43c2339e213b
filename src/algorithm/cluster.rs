//! Development-tier segmentation of the entity directory.
//!
//! K-means over standardized social indicators at the reference census
//! year (the latest census at or before the panel end). Everything is
//! deterministic: seeding is quantile-based instead of random, so the same
//! snapshot always partitions the same way, and the arbitrary k-means
//! labels are re-numbered afterwards so that tier 0 is always the most
//! developed group.

use log::warn;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::Municipality;
use crate::models::derived::cluster::{ClusterAssignment, TIER_COUNT, TIER_LABELS};
use crate::models::raw::RawSocialSnapshot;
use crate::models::year;
use crate::utils::ids::entity_year_id;
use crate::utils::stats::median;

/// Iteration cap for Lloyd's algorithm; assignment convergence usually
/// stops it far earlier.
const MAX_ITERATIONS: usize = 300;

/// Counter for entities excluded from the segmentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterCounters {
    /// Entities without a usable baseline: no census snapshot at or before
    /// the reference year, or no positive income per capita
    pub missing_indicators: u64,
}

struct Candidate<'a> {
    municipality: &'a Municipality,
    snapshot: &'a RawSocialSnapshot,
    income: f64,
}

/// Segment the directory into development tiers.
///
/// One row per entity with complete indicators at the reference census
/// year; an entity missing its baseline is counted and skipped. Output
/// follows the directory order (sorted by entity id). When fewer entities
/// than tiers survive, no segmentation is produced at all.
#[must_use]
pub fn derive_clusters(
    municipalities: &[Municipality],
    social: &[RawSocialSnapshot],
    panel_end_year: i32,
) -> (Vec<ClusterAssignment>, ClusterCounters) {
    let mut counters = ClusterCounters::default();
    let Some(reference_year) = year::latest_census_at(panel_end_year) else {
        warn!("No census year at or before {panel_end_year}, skipping segmentation");
        return (Vec::new(), counters);
    };

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

    let mut candidates: Vec<Candidate> = Vec::new();
    for municipality in municipalities {
        let baseline = snapshots
            .get(municipality.id.as_str())
            .and_then(|list| list.iter().rev().find(|s| s.year <= reference_year).copied());
        let income = baseline
            .and_then(|s| s.income_per_capita)
            .filter(|&v| v > 0.0);
        match (baseline, income) {
            (Some(snapshot), Some(income)) => candidates.push(Candidate {
                municipality,
                snapshot,
                income,
            }),
            _ => counters.missing_indicators += 1,
        }
    }
    if candidates.len() < TIER_COUNT {
        warn!(
            "Only {} entities with complete indicators at {reference_year}, \
             skipping segmentation",
            candidates.len()
        );
        return (Vec::new(), counters);
    }

    // Sub-indices are optional in the snapshots; an absent value takes the
    // column median so one missing component does not exclude the entity.
    let education_median = median(
        &candidates
            .iter()
            .filter_map(|c| c.snapshot.development_education)
            .collect::<Vec<f64>>(),
    )
    .unwrap_or(0.0);
    let income_component_median = median(
        &candidates
            .iter()
            .filter_map(|c| c.snapshot.development_income)
            .collect::<Vec<f64>>(),
    )
    .unwrap_or(0.0);

    // Vulnerability and inequality enter inverted so every feature points
    // the same way; income is log-scaled before standardization.
    let mut matrix: Vec<Vec<f64>> = candidates
        .iter()
        .map(|c| {
            vec![
                c.snapshot.development_index,
                c.snapshot
                    .development_education
                    .unwrap_or(education_median),
                c.snapshot
                    .development_income
                    .unwrap_or(income_component_median),
                1.0 - c.snapshot.vulnerability_index,
                1.0 - c.snapshot.inequality_coefficient,
                c.income.ln(),
            ]
        })
        .collect();
    standardize(&mut matrix);

    let raw = kmeans(&matrix, TIER_COUNT);

    // Raw k-means labels are arbitrary; re-number by mean development so
    // tier 0 is the most developed group.
    let mut sums: FxHashMap<usize, (f64, usize)> = FxHashMap::default();
    for (i, candidate) in candidates.iter().enumerate() {
        let entry = sums.entry(raw[i]).or_insert((0.0, 0));
        entry.0 += candidate.snapshot.development_index;
        entry.1 += 1;
    }
    let mut order: Vec<(usize, f64)> = sums
        .into_iter()
        .map(|(label, (sum, count))| (label, sum / count as f64))
        .collect();
    order.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let tier_of: FxHashMap<usize, usize> = order
        .iter()
        .enumerate()
        .map(|(tier, &(label, _))| (label, tier))
        .collect();

    let assignments = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let tier = tier_of[&raw[i]];
            ClusterAssignment {
                record_id: entity_year_id(&candidate.municipality.id, reference_year),
                entity_id: candidate.municipality.id.clone(),
                state: candidate.municipality.state.clone(),
                region: candidate.municipality.region.as_str().to_string(),
                size_class: candidate.municipality.size_class.as_str().to_string(),
                reference_year,
                cluster_id: tier as u32,
                cluster_label: TIER_LABELS[tier].to_string(),
                development_index: candidate.snapshot.development_index,
                vulnerability_index: candidate.snapshot.vulnerability_index,
                inequality_coefficient: candidate.snapshot.inequality_coefficient,
                income_per_capita: candidate.income,
            }
        })
        .collect();
    (assignments, counters)
}

/// Z-score each column in place. A constant column standardizes to zeros
/// instead of dividing by a zero spread.
fn standardize(matrix: &mut [Vec<f64>]) {
    let n = matrix.len() as f64;
    let dims = matrix[0].len();
    for j in 0..dims {
        let mean = matrix.iter().map(|row| row[j]).sum::<f64>() / n;
        let variance = matrix.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
        let spread = variance.sqrt();
        for row in matrix.iter_mut() {
            row[j] = if spread > 0.0 { (row[j] - mean) / spread } else { 0.0 };
        }
    }
}

/// Lloyd's algorithm with deterministic seeding: the initial centroids are
/// the points at evenly spaced positions of the first-feature ordering.
/// Ties in the nearest-centroid choice go to the lowest centroid index.
fn kmeans(points: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = points.len();
    debug_assert!(k >= 2 && n >= k);
    let dims = points[0].len();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        points[b][0]
            .partial_cmp(&points[a][0])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut centroids: Vec<Vec<f64>> = (0..k)
        .map(|j| points[order[j * (n - 1) / (k - 1)]].clone())
        .collect();

    let mut assignment = vec![0usize; n];
    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let distance: f64 = point
                    .iter()
                    .zip(centroid)
                    .map(|(p, q)| (p - q) * (p - q))
                    .sum();
                if distance < best_distance {
                    best_distance = distance;
                    best = c;
                }
            }
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (i, point) in points.iter().enumerate() {
            counts[assignment[i]] += 1;
            for (j, value) in point.iter().enumerate() {
                sums[assignment[i]][j] += value;
            }
        }
        for (c, count) in counts.iter().enumerate() {
            // A centroid that lost every point keeps its position.
            if *count > 0 {
                for j in 0..dims {
                    centroids[c][j] = sums[c][j] / *count as f64;
                }
            }
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn snapshot(entity: &str, year: i32, dev: f64, income: Option<f64>) -> RawSocialSnapshot {
        RawSocialSnapshot {
            entity_id: entity.to_string(),
            year,
            development_index: dev,
            development_education: Some(dev),
            development_longevity: None,
            development_income: Some(dev),
            vulnerability_index: 1.0 - dev,
            inequality_coefficient: 0.5,
            income_per_capita: income,
            life_expectancy: None,
        }
    }

    const IDS: [&str; 5] = ["1100015", "1100023", "1100031", "1100049", "1100056"];

    fn five_towns() -> (Vec<Municipality>, Vec<RawSocialSnapshot>) {
        let municipalities = IDS.iter().map(|id| municipality(id)).collect();
        let social = IDS
            .iter()
            .zip([0.9, 0.7, 0.5, 0.3, 0.1])
            .zip([2000.0, 1000.0, 600.0, 300.0, 100.0])
            .map(|((id, dev), income)| snapshot(id, 2010, dev, Some(income)))
            .collect();
        (municipalities, social)
    }

    #[test]
    fn kmeans_separates_distant_groups() {
        let points = vec![
            vec![0.0, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.1],
            vec![10.2, 9.9],
        ];
        let assignment = kmeans(&points, 2);
        assert_eq!(assignment[0], assignment[1]);
        assert_eq!(assignment[2], assignment[3]);
        assert_ne!(assignment[0], assignment[2]);
    }

    #[test]
    fn tiers_are_ordered_by_development() {
        let (municipalities, social) = five_towns();
        let (records, counters) = derive_clusters(&municipalities, &social, 2015);
        assert_eq!(records.len(), 5);
        assert_eq!(counters.missing_indicators, 0);
        assert!(records.iter().all(|r| r.reference_year == 2010));
        // Distinct indicator levels, one tier each, most developed first.
        let best = records.iter().find(|r| r.entity_id == "1100015").unwrap();
        let worst = records.iter().find(|r| r.entity_id == "1100056").unwrap();
        assert_eq!(best.cluster_id, 0);
        assert_eq!(best.cluster_label, "development_pole");
        assert_eq!(worst.cluster_id, 4);
        assert_eq!(worst.cluster_label, "critical");

        // Deterministic: the same snapshot partitions the same way.
        let (again, _) = derive_clusters(&municipalities, &social, 2015);
        assert_eq!(records, again);
    }

    #[test]
    fn missing_income_is_counted_and_skipped() {
        let (mut municipalities, mut social) = five_towns();
        municipalities.push(municipality("1100064"));
        municipalities.sort_by(|a, b| a.id.cmp(&b.id));
        social.push(snapshot("1100064", 2010, 0.6, None));
        let (records, counters) = derive_clusters(&municipalities, &social, 2015);
        assert_eq!(records.len(), 5);
        assert_eq!(counters.missing_indicators, 1);
        assert!(!records.iter().any(|r| r.entity_id == "1100064"));
    }

    #[test]
    fn missing_sub_indices_take_the_column_median() {
        let (municipalities, mut social) = five_towns();
        social[2].development_education = None;
        social[2].development_income = None;
        let (records, counters) = derive_clusters(&municipalities, &social, 2015);
        // Imputation keeps the entity in the segmentation.
        assert_eq!(records.len(), 5);
        assert_eq!(counters.missing_indicators, 0);
        assert!(records.iter().any(|r| r.entity_id == "1100031"));
    }

    #[test]
    fn fewer_entities_than_tiers_yields_no_segmentation() {
        let municipalities = vec![municipality("1100015"), municipality("1100023")];
        let social = vec![
            snapshot("1100015", 2010, 0.8, Some(900.0)),
            snapshot("1100023", 2010, 0.4, Some(400.0)),
        ];
        let (records, _) = derive_clusters(&municipalities, &social, 2015);
        assert!(records.is_empty());
    }

    #[test]
    fn future_census_does_not_leak_backwards() {
        let (municipalities, social) = five_towns();
        let social: Vec<RawSocialSnapshot> = social
            .into_iter()
            .map(|mut s| {
                s.year = 2022;
                s
            })
            .collect();
        let (records, counters) = derive_clusters(&municipalities, &social, 2015);
        assert!(records.is_empty());
        assert_eq!(counters.missing_indicators, 5);
    }
}
