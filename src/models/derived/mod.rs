//! Derived table row types.
//!
//! One struct per physical output table. Categorical columns are stored as
//! their stable string labels so the rows serialize directly to Arrow via
//! `serde_arrow`; the corresponding enums live next to each row type and
//! are used while the values are being computed.

pub mod cluster;
pub mod efficiency;
pub mod fiscal;
pub mod mandate;
pub mod panel;

pub use cluster::ClusterAssignment;
pub use efficiency::{EfficiencyCategory, EfficiencyRecord};
pub use fiscal::{DependencyRecord, FiscalYearSummary};
pub use mandate::{CompetitionLevel, Mandate, TransitionCategory};
pub use panel::{AnnualPanelRow, MandatePanelRow};
