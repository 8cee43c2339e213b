//! Development-tier segmentation of the entity directory.

use serde::Serialize;

/// Number of development tiers.
pub const TIER_COUNT: usize = 5;

/// Tier labels, ordered from most to least developed; the index is the
/// cluster id.
pub const TIER_LABELS: [&str; TIER_COUNT] = [
    "development_pole",
    "advanced",
    "developing",
    "vulnerable",
    "critical",
];

/// One entity's development-tier assignment.
///
/// Grain: one row per entity, evaluated once at the reference census year.
/// Entities missing a core indicator at that baseline produce no row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    /// Deterministic surrogate id of (entity_id, reference_year)
    pub record_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// State code
    pub state: String,
    /// Macro-region label
    pub region: String,
    /// Size-tier label
    pub size_class: String,
    /// Census year the indicators were taken at
    pub reference_year: i32,
    /// Tier id; 0 is the most developed tier
    pub cluster_id: u32,
    /// Tier label
    pub cluster_label: String,
    /// Composite development index at the baseline
    pub development_index: f64,
    /// Social vulnerability index at the baseline
    pub vulnerability_index: f64,
    /// Inequality coefficient at the baseline
    pub inequality_coefficient: f64,
    /// Household income per capita at the baseline
    pub income_per_capita: f64,
}
