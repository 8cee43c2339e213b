//! Entity & time normalization.
//!
//! Standardizes keys and types across the raw sources into one schema:
//! canonical 7-digit entity ids with a valid state prefix, the closed set
//! of 27 state codes, and years inside the supported domain. Fact rows
//! whose entity id is not in the normalized directory are excluded and
//! counted (missing reference, never fatal).

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::models::entity::{Municipality, Region, SizeClass, is_valid_state_code};
use crate::models::raw::{
    PopulationCount, RawElectionResult, RawFiscalRecord, RawSocialSnapshot,
};
use crate::models::year;
use crate::sources::directory::DirectoryRow;

/// Whether an id is a canonical entity identifier: exactly 7 ASCII digits
/// with a valid state prefix.
#[must_use]
pub fn is_canonical_entity_id(id: &str) -> bool {
    if id.len() != 7 || !id.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    id[0..2]
        .parse::<u8>()
        .is_ok_and(|prefix| Region::from_state_prefix(prefix).is_some())
}

/// All normalized tables, immutable inputs for the derivation stages.
#[derive(Debug)]
pub struct NormalizedData {
    /// Entity directory, one row per municipality
    pub municipalities: Vec<Municipality>,
    /// Population counts with valid keys
    pub population: Vec<PopulationCount>,
    /// Census social snapshots with valid keys
    pub social: Vec<RawSocialSnapshot>,
    /// Electoral results with valid keys
    pub elections: Vec<RawElectionResult>,
    /// Fiscal facts (revenue and expense merged) with valid keys
    pub fiscal: Vec<RawFiscalRecord>,
}

/// Exclusion bookkeeping for one normalization run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct NormalizeReport {
    /// Directory rows rejected for a malformed id or unknown state code
    pub invalid_directory_rows: usize,
    /// Entities with no population count (size tier defaults to the
    /// smallest)
    pub entities_without_population: usize,
    /// Fact rows rejected for a malformed id, an out-of-domain year, or a
    /// reference to an entity missing from the directory
    pub excluded_population: usize,
    pub excluded_social: usize,
    pub excluded_elections: usize,
    pub excluded_fiscal: usize,
}

/// Normalize all raw sources into one consistent schema.
#[must_use]
pub fn normalize(
    directory: Vec<DirectoryRow>,
    population: Vec<PopulationCount>,
    social: Vec<RawSocialSnapshot>,
    elections: Vec<RawElectionResult>,
    fiscal: Vec<RawFiscalRecord>,
) -> (NormalizedData, NormalizeReport) {
    let mut report = NormalizeReport::default();

    // Latest population count per entity decides the size tier.
    let mut latest_population: FxHashMap<&str, (i32, u64)> = FxHashMap::default();
    for count in &population {
        let entry = latest_population
            .entry(count.entity_id.as_str())
            .or_insert((count.year, count.population));
        if count.year > entry.0 {
            *entry = (count.year, count.population);
        }
    }

    let mut municipalities = Vec::with_capacity(directory.len());
    for row in &directory {
        if !is_canonical_entity_id(&row.entity_id) || !is_valid_state_code(&row.state) {
            report.invalid_directory_rows += 1;
            continue;
        }
        let prefix: u8 = row.entity_id[0..2].parse().unwrap_or(0);
        let Some(region) = Region::from_state_prefix(prefix) else {
            report.invalid_directory_rows += 1;
            continue;
        };
        let size_class = match latest_population.get(row.entity_id.as_str()) {
            Some((_, pop)) => SizeClass::from_population(*pop),
            None => {
                report.entities_without_population += 1;
                SizeClass::SmallI
            }
        };
        municipalities.push(Municipality {
            id: row.entity_id.clone(),
            name: row.name.clone(),
            state: row.state.clone(),
            region,
            size_class,
        });
    }
    // Deterministic output order regardless of snapshot ordering
    municipalities.sort_by(|a, b| a.id.cmp(&b.id));
    municipalities.dedup_by(|a, b| a.id == b.id);

    let ids: FxHashSet<&str> = municipalities.iter().map(|m| m.id.as_str()).collect();

    let before = population.len();
    let population: Vec<PopulationCount> = population
        .into_par_iter()
        .filter(|c| ids.contains(c.entity_id.as_str()) && year::in_domain(c.year))
        .collect();
    report.excluded_population = before - population.len();

    // Social indices come from the census; a row at any other year is a
    // mislabeled vintage and would poison the carried-forward baselines.
    let before = social.len();
    let social: Vec<RawSocialSnapshot> = social
        .into_par_iter()
        .filter(|s| ids.contains(s.entity_id.as_str()) && year::is_census_year(s.year))
        .collect();
    report.excluded_social = before - social.len();

    let before = elections.len();
    let elections: Vec<RawElectionResult> = elections
        .into_par_iter()
        .filter(|e| ids.contains(e.entity_id.as_str()) && year::is_election_year(e.year))
        .collect();
    report.excluded_elections = before - elections.len();

    let before = fiscal.len();
    let fiscal: Vec<RawFiscalRecord> = fiscal
        .into_par_iter()
        .filter(|f| ids.contains(f.entity_id.as_str()) && year::in_domain(f.year))
        .collect();
    report.excluded_fiscal = before - fiscal.len();

    log::info!(
        "Normalized {} entities ({} directory rows rejected); fact exclusions: \
         population {}, social {}, elections {}, fiscal {}",
        municipalities.len(),
        report.invalid_directory_rows,
        report.excluded_population,
        report.excluded_social,
        report.excluded_elections,
        report.excluded_fiscal
    );

    (
        NormalizedData {
            municipalities,
            population,
            social,
            elections,
            fiscal,
        },
        report,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(id: &str, state: &str) -> DirectoryRow {
        DirectoryRow {
            entity_id: id.to_string(),
            name: format!("Town {id}"),
            state: state.to_string(),
        }
    }

    #[test]
    fn canonical_id_format() {
        assert!(is_canonical_entity_id("1100015"));
        assert!(is_canonical_entity_id("3550308"));
        // Wrong length
        assert!(!is_canonical_entity_id("110001"));
        assert!(!is_canonical_entity_id("11000155"));
        // Non-numeric
        assert!(!is_canonical_entity_id("11A0015"));
        // Invalid state prefix (34 is a numbering hole, 99 out of range)
        assert!(!is_canonical_entity_id("3400015"));
        assert!(!is_canonical_entity_id("9900015"));
    }

    #[test]
    fn invalid_directory_rows_are_rejected_and_counted() {
        let (data, report) = normalize(
            vec![dir("1100015", "RO"), dir("badid", "RO"), dir("1100023", "XX")],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(data.municipalities.len(), 1);
        assert_eq!(report.invalid_directory_rows, 2);
    }

    #[test]
    fn facts_for_unknown_entities_are_excluded() {
        let (data, report) = normalize(
            vec![dir("1100015", "RO")],
            vec![
                PopulationCount {
                    entity_id: "1100015".into(),
                    year: 2013,
                    population: 25_000,
                },
                PopulationCount {
                    entity_id: "9999999".into(),
                    year: 2013,
                    population: 1,
                },
            ],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(data.population.len(), 1);
        assert_eq!(report.excluded_population, 1);
    }

    #[test]
    fn size_tier_uses_latest_count() {
        let (data, _) = normalize(
            vec![dir("1100015", "RO")],
            vec![
                PopulationCount {
                    entity_id: "1100015".into(),
                    year: 2010,
                    population: 15_000,
                },
                PopulationCount {
                    entity_id: "1100015".into(),
                    year: 2020,
                    population: 60_000,
                },
            ],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(data.municipalities[0].size_class, SizeClass::Medium);
    }

    #[test]
    fn non_census_year_social_rows_are_excluded() {
        let snap = |year| RawSocialSnapshot {
            entity_id: "1100015".into(),
            year,
            development_index: 0.6,
            development_education: None,
            development_longevity: None,
            development_income: None,
            vulnerability_index: 0.4,
            inequality_coefficient: 0.5,
            income_per_capita: None,
            life_expectancy: None,
        };
        let (data, report) = normalize(
            vec![dir("1100015", "RO")],
            vec![],
            vec![snap(2010), snap(2015)],
            vec![],
            vec![],
        );
        assert_eq!(data.social.len(), 1);
        assert_eq!(data.social[0].year, 2010);
        assert_eq!(report.excluded_social, 1);
    }

    #[test]
    fn non_election_year_results_are_excluded() {
        let (data, report) = normalize(
            vec![dir("1100015", "RO")],
            vec![],
            vec![],
            vec![RawElectionResult {
                entity_id: "1100015".into(),
                year: 2013,
                round: 1,
                party: "PT".into(),
                votes: 100,
                elected: true,
            }],
            vec![],
        );
        assert!(data.elections.is_empty());
        assert_eq!(report.excluded_elections, 1);
    }
}
