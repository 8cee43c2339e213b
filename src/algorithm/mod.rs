//! Derivation algorithms, in pipeline order.
//!
//! [`mandates`] and [`continuity`] work per entity and are embarrassingly
//! parallel; [`fiscal`] and [`efficiency`] contain year-scoped reductions
//! that require the full cross-section to be materialized first; [`panel`]
//! consumes everything upstream. [`cluster`] is a side branch off the
//! normalized directory and the census snapshots.

pub mod cluster;
pub mod continuity;
pub mod efficiency;
pub mod fiscal;
pub mod mandates;
pub mod panel;
