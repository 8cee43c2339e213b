//! Panel rows for causal designs.

use serde::Serialize;

/// One observation of the dense entity×year panel.
///
/// The panel is a full cross product of all normalized entities and the
/// configured year range; entity-years with no fiscal data still appear,
/// with nulls. Lags and differences are computed per entity in year order,
/// so the first observation of an entity has null lags, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualPanelRow {
    /// Deterministic surrogate id of (entity_id, year)
    pub row_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Calendar year
    pub year: i32,
    /// State code
    pub state: String,
    /// Macro-region label
    pub region: String,
    /// Size-tier label
    pub size_class: String,
    /// Resident population, if counted that year
    pub population: Option<u64>,

    /// Party holding office during the year, if a mandate covers it
    pub mandate_party: Option<String>,
    /// Ideology bloc of the office-holding party
    pub mandate_bloc: Option<String>,
    /// Continuity flag of the covering mandate
    pub mandate_continuity: Option<bool>,
    /// Position of the year inside the term, 1..=4
    pub year_in_mandate: Option<i32>,

    /// Net revenue, currency units
    pub net_revenue: Option<f64>,
    /// Paid expense, currency units
    pub paid_expense: Option<f64>,
    /// Net revenue minus paid expense
    pub fiscal_balance: Option<f64>,
    /// Budget execution rate, percent
    pub execution_rate: Option<f64>,
    /// Paid expense per person
    pub spending_per_capita: Option<f64>,
    /// Net revenue per person
    pub revenue_per_capita: Option<f64>,
    /// Dependency ratio, [0, 100]
    pub dependency_ratio: Option<f64>,
    /// Adjusted efficiency index, [0, 100]
    pub efficiency_index: Option<f64>,
    /// Development index from the latest census at or before the year
    pub development_index: Option<f64>,

    /// Spending per person one year earlier
    pub lag1_spending_per_capita: Option<f64>,
    /// Spending per person two years earlier
    pub lag2_spending_per_capita: Option<f64>,
    /// First difference of spending per person
    pub delta_spending_per_capita: Option<f64>,
    /// Year-over-year spending growth, percent
    pub growth_spending_per_capita: Option<f64>,
    /// Dependency ratio one year earlier
    pub lag1_dependency_ratio: Option<f64>,
    /// First difference of the dependency ratio
    pub delta_dependency_ratio: Option<f64>,
    /// Efficiency index one year earlier
    pub lag1_efficiency_index: Option<f64>,
    /// First difference of the efficiency index
    pub delta_efficiency_index: Option<f64>,
    /// Fiscal balance one year earlier
    pub lag1_fiscal_balance: Option<f64>,
    /// First difference of the fiscal balance
    pub delta_fiscal_balance: Option<f64>,

    /// Fewer than two years of fiscal data exist for this entity
    pub insufficient_history: bool,
}

/// One observation of the entity×mandate panel.
///
/// Grain: one row per resolved [`super::Mandate`], enriched with term-window
/// fiscal/social aggregates and pre-period values taken from the immediately
/// preceding mandate of the same entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MandatePanelRow {
    /// Deterministic surrogate id of (entity_id, election_year)
    pub row_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Year the mandate's election was held
    pub election_year: i32,
    /// First year in office
    pub term_start: i32,
    /// Last year in office
    pub term_end: i32,
    /// 1-based position in the entity's mandate history
    pub sequence: u32,
    /// Winning party abbreviation
    pub party: String,
    /// Ideology bloc label of the winning party
    pub bloc: Option<String>,
    /// Same party as the predecessor AND contiguous terms
    pub continuity: bool,
    /// Transition category label
    pub transition: String,
    /// Ideology delta versus the predecessor
    pub ideology_delta: Option<f64>,

    /// Mean resident population over the term years with counts
    pub mean_population: Option<f64>,
    /// Mean paid expense per person over the term
    pub mean_spending_per_capita: Option<f64>,
    /// Mean net revenue per person over the term
    pub mean_revenue_per_capita: Option<f64>,
    /// Mean fiscal balance over the term
    pub mean_fiscal_balance: Option<f64>,
    /// Mean execution rate over the term
    pub mean_execution_rate: Option<f64>,
    /// Mean dependency ratio over the term
    pub mean_dependency_ratio: Option<f64>,
    /// Mean efficiency index over the term
    pub mean_efficiency_index: Option<f64>,
    /// Development index at the census baseline of the term start
    pub development_index: Option<f64>,

    /// Predecessor's mean spending per person
    pub pre_spending_per_capita: Option<f64>,
    /// Predecessor's mean fiscal balance
    pub pre_fiscal_balance: Option<f64>,
    /// Predecessor's mean dependency ratio
    pub pre_dependency_ratio: Option<f64>,
    /// Predecessor's mean efficiency index
    pub pre_efficiency_index: Option<f64>,
    /// Mean fiscal balance minus the predecessor's
    pub delta_fiscal_balance: Option<f64>,

    /// Usable in a difference-in-differences design: non-null pre-period
    /// fiscal value and at least the second mandate of the entity
    pub did_valid: bool,
}
