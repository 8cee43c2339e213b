//! Configuration for the derivation pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::year;

/// Configuration for a single batch run.
///
/// Every run recomputes all derived tables from the snapshot directory;
/// there is no incremental state to configure.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Directory holding the raw Parquet snapshots
    pub input_dir: PathBuf,
    /// Directory the derived tables are written to
    pub output_dir: PathBuf,
    /// First year of the dense annual panel
    pub panel_start_year: i32,
    /// Last year of the dense annual panel
    pub panel_end_year: i32,
    /// Number of rayon worker threads (defaults to the available CPUs)
    pub threads: Option<usize>,
    /// Whether to write `run_summary.json` next to the derived tables
    pub write_run_summary: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/derived"),
            panel_start_year: 2000,
            panel_end_year: 2024,
            threads: None,
            write_run_summary: true,
        }
    }
}

impl PipelineConfig {
    /// Create a config for the given snapshot and output directories.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Set the annual panel year range.
    #[must_use]
    pub fn with_panel_years(mut self, start: i32, end: i32) -> Self {
        self.panel_start_year = start;
        self.panel_end_year = end;
        self
    }

    /// Validate the configuration before a run.
    ///
    /// The panel range must sit inside the supported year domain and the
    /// input directory must exist; the output directory is created lazily.
    pub fn validate(&self) -> Result<()> {
        if self.panel_start_year > self.panel_end_year {
            return Err(PipelineError::Config(format!(
                "panel year range is inverted: {}..={}",
                self.panel_start_year, self.panel_end_year
            )));
        }
        if self.panel_start_year < year::MIN_YEAR || self.panel_end_year > year::MAX_YEAR {
            return Err(PipelineError::Config(format!(
                "panel years must lie within {}..={}",
                year::MIN_YEAR,
                year::MAX_YEAR
            )));
        }
        if !self.input_dir.is_dir() {
            return Err(PipelineError::SnapshotNotFound(self.input_dir.clone()));
        }
        Ok(())
    }

}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Input Directory: {}", self.input_dir.display())?;
        writeln!(f, "  Output Directory: {}", self.output_dir.display())?;
        writeln!(
            f,
            "  Panel Years: {}..={}",
            self.panel_start_year, self.panel_end_year
        )?;
        if let Some(threads) = self.threads {
            writeln!(f, "  Threads: {threads}")?;
        }
        Ok(())
    }
}
