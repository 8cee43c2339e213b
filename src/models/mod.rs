//! Data model for the derivation pipeline.
//!
//! Three layers, mirroring the flow of the pipeline: reference data
//! ([`entity`], [`party`], [`year`]), immutable raw snapshot rows ([`raw`]),
//! and derived analysis tables ([`derived`]).

pub mod derived;
pub mod entity;
pub mod party;
pub mod raw;
pub mod year;

pub use derived::{
    AnnualPanelRow, ClusterAssignment, DependencyRecord, EfficiencyRecord, FiscalYearSummary,
    Mandate, MandatePanelRow,
};
pub use entity::{Municipality, Region, SizeClass};
pub use party::{IdeologyBloc, IdeologySpectrum, Party};
pub use raw::{
    ExpenseStage, PopulationCount, RawElectionResult, RawFiscalRecord, RawSocialSnapshot,
    RevenueStage,
};
