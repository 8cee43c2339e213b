//! Composite efficiency scores and rankings.

use serde::Serialize;

/// Efficiency band. Cutoffs are fixed: >= 65 high, >= 50 moderate,
/// >= 35 low, else inefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EfficiencyCategory {
    High,
    Moderate,
    Low,
    Inefficient,
}

impl EfficiencyCategory {
    /// Band a final (clamped) efficiency index.
    #[must_use]
    pub fn from_index(index: f64) -> Self {
        if index >= 65.0 {
            Self::High
        } else if index >= 50.0 {
            Self::Moderate
        } else if index >= 35.0 {
            Self::Low
        } else {
            Self::Inefficient
        }
    }

    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Inefficient => "inefficient",
        }
    }
}

/// Efficiency position of one entity-year.
///
/// Grain: (entity, fiscal year). All percentiles and ranks are computed
/// strictly within the year cross-section; benchmarks never cross years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRecord {
    /// Deterministic surrogate id of (entity_id, year)
    pub record_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Fiscal year
    pub year: i32,
    /// State code, carried for the scoped rankings
    pub state: String,
    /// Macro-region label, carried for the scoped rankings
    pub region: String,
    /// Size-tier label, carried for the scoped rankings
    pub size_class: String,
    /// Weighted social-outcome composite in [0, 1]
    pub social_outcome_score: f64,
    /// Percentile of the composite within the year, [0, 100]
    pub outcome_percentile: f64,
    /// Paid expense per person
    pub spending_per_capita: f64,
    /// Percentile of spending per person within the year, [0, 100]
    pub spending_percentile: f64,
    /// outcome percentile − spending percentile + 50
    pub raw_efficiency: f64,
    /// Fiscal-health modifier in {-5, -3, -1, +1, +3, +5}
    pub fiscal_modifier: i32,
    /// raw + modifier, clamped to [0, 100]
    pub efficiency_index: f64,
    /// Efficiency band label
    pub category: String,
    /// Rank within the whole year cross-section (1 = best)
    pub rank_national: u32,
    /// Rank within the entity's state
    pub rank_state: u32,
    /// Rank within the entity's macro-region
    pub rank_region: u32,
    /// Rank within the entity's size tier
    pub rank_size_class: u32,
    /// Index minus the entity's most recent earlier index, whatever year
    /// that was; null for the entity's first record
    pub delta_prior_year: Option<f64>,
}
