//! Logging and progress reporting helpers.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a stage progress bar
pub const STAGE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Log an operation start with consistent format.
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format.
pub fn log_operation_complete(operation: &str, items: usize, elapsed: Duration) {
    log::info!("{operation}: {items} rows in {elapsed:?}");
}

/// Create a progress bar for a pipeline stage.
#[must_use]
pub fn stage_progress_bar(length: u64, stage: &str) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(stage.to_string());
    pb
}
