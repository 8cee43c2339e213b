//! Municipal political-economy panels.
//!
//! Turns three independent, sparsely sampled source series about
//! municipalities (election results, fiscal execution, census social
//! indices) into analysis-ready derived tables: reconstructed mandates,
//! political-continuity classifications, fiscal dependency benchmarks,
//! composite efficiency rankings, and lagged annual/mandate panels.
//!
//! Every run recomputes deterministically from a static Parquet snapshot:
//! stable tie-breaks, sorted output orders, and surrogate ids derived from
//! natural keys mean the same input always produces byte-identical tables.
//!
//! The crate is organized as a strict pipeline:
//!
//! 1. [`sources`] reads and schema-checks the input snapshots
//! 2. [`normalize`] filters to valid entities and domain years
//! 3. [`algorithm::mandates`] and [`algorithm::continuity`] reconstruct
//!    terms of office and their ideological transitions
//! 4. [`algorithm::fiscal`] aggregates execution and benchmarks dependency
//! 5. [`algorithm::efficiency`] scores and ranks spending efficiency
//! 6. [`algorithm::panel`] assembles the panels for causal designs
//!
//! [`pipeline::run`] drives the whole derivation.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::RunSummary;
