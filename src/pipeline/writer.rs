//! Serialization of derived tables to Parquet.
//!
//! Row structs serialize through `serde_arrow`, with the schema traced from
//! the rows themselves. Numeric columns that can be null are `Option`
//! fields on the row structs and come out as nullable Parquet columns.

use std::path::{Path, PathBuf};

use arrow::datatypes::FieldRef;
use log::{info, warn};
use serde::Serialize;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::utils::io::parquet::write_record_batch;

/// Write one derived table as `{output_dir}/{name}.parquet`.
///
/// An empty table is never written: a run either produces a complete table
/// or the file is absent, so a consumer can distinguish "no data" from a
/// truncated run. Returns the written path, or `None` for an empty table.
pub fn write_table<T: Serialize>(
    output_dir: &Path,
    name: &str,
    rows: &[T],
) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        warn!("Table '{name}' has no rows, not writing it");
        return Ok(None);
    }
    let fields = Vec::<FieldRef>::from_samples(
        &rows,
        TracingOptions::default().allow_null_fields(true),
    )?;
    let batch = serde_arrow::to_record_batch(&fields, &rows)?;
    let path = output_dir.join(format!("{name}.parquet"));
    write_record_batch(&path, &batch)?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(Some(path))
}
