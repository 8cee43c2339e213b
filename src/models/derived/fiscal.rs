//! Aggregated fiscal execution and dependency benchmarks.

use serde::Serialize;

/// Aggregated fiscal execution for one entity-year.
///
/// Grain: (entity, fiscal year). Amounts are sums over all accounts of the
/// respective stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiscalYearSummary {
    /// Deterministic surrogate id of (entity_id, year)
    pub summary_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Fiscal year
    pub year: i32,
    /// Committed expense, currency units
    pub committed_expense: f64,
    /// Accrued expense, currency units
    pub accrued_expense: f64,
    /// Paid expense, currency units
    pub paid_expense: f64,
    /// Gross revenue, currency units
    pub gross_revenue: f64,
    /// Revenue deductions, currency units
    pub revenue_deductions: f64,
    /// Gross revenue minus deductions
    pub net_revenue: f64,
    /// Revenue classified as higher-government transfers
    pub transfer_revenue: f64,
    /// Net revenue minus paid expense
    pub fiscal_balance: f64,
    /// Paid / committed × 100; null when nothing was committed
    pub execution_rate: Option<f64>,
}

/// Dependency position of one entity-year relative to the national
/// benchmarks of that year.
///
/// Grain: (entity, fiscal year). Rows only exist where the dependency ratio
/// is computable and inside [0, 100]; out-of-range ratios are dropped at
/// derivation time, never clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyRecord {
    /// Deterministic surrogate id of (entity_id, year)
    pub record_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Fiscal year
    pub year: i32,
    /// Resident population used for the per-capita values
    pub population: Option<u64>,
    /// Transfer revenue per person
    pub transfer_per_capita: Option<f64>,
    /// Own (non-transfer) revenue per person
    pub own_revenue_per_capita: Option<f64>,
    /// Transfers / net revenue × 100, guaranteed in [0, 100]
    pub dependency_ratio: f64,
    /// Own revenue / net revenue × 100
    pub own_revenue_ratio: f64,
    /// National median dependency ratio for the year
    pub national_median_dependency: Option<f64>,
    /// National median own revenue per person for the year
    pub national_median_own_revenue_pc: Option<f64>,
    /// National median transfer per person for the year
    pub national_median_transfer_pc: Option<f64>,
    /// Entity own revenue per person ÷ national median; null when either
    /// side is unavailable
    pub effort_index: Option<f64>,
}
