//! Raw snapshot row types.
//!
//! These are the immutable inputs of the pipeline, extracted once from the
//! Parquet snapshots and never mutated. Keys are already normalized by the
//! time these rows exist (see [`crate::normalize`]).

use serde::{Deserialize, Serialize};

/// One candidate result in the head-of-government race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElectionResult {
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Election year
    pub year: i32,
    /// Election round (1 or 2)
    pub round: i32,
    /// Party abbreviation as reported by the electoral authority
    pub party: String,
    /// Votes received
    pub votes: i64,
    /// Whether the candidate was elected
    pub elected: bool,
}

/// Execution stage of an expense amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseStage {
    Committed,
    Accrued,
    Paid,
}

/// Stage of a revenue amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenueStage {
    Gross,
    Deduction,
}

/// Side and stage of a fiscal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalStage {
    Expense(ExpenseStage),
    Revenue(RevenueStage),
}

/// One fiscal execution fact: entity × year × account × stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFiscalRecord {
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Fiscal year
    pub year: i32,
    /// Budget account code (dotted numeric prefix notation)
    pub account_code: String,
    /// Human-readable account label
    pub account_label: String,
    /// Side and execution stage of the amount
    pub stage: FiscalStage,
    /// Amount in currency units
    pub amount: f64,
}

/// Social indices for one entity at one census year.
///
/// All indices are normalized to [0, 1]; `income` and `life_expectancy` are
/// raw magnitudes carried through for the panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSocialSnapshot {
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Census year
    pub year: i32,
    /// Composite development index
    pub development_index: f64,
    /// Education sub-component
    pub development_education: Option<f64>,
    /// Longevity sub-component
    pub development_longevity: Option<f64>,
    /// Income sub-component
    pub development_income: Option<f64>,
    /// Social vulnerability index
    pub vulnerability_index: f64,
    /// Inequality coefficient
    pub inequality_coefficient: f64,
    /// Household income per capita, currency units
    pub income_per_capita: Option<f64>,
    /// Life expectancy at birth, years
    pub life_expectancy: Option<f64>,
}

/// Population count for one entity in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationCount {
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Reference year
    pub year: i32,
    /// Estimated resident population
    pub population: u64,
}
