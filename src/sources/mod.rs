//! Raw snapshot loaders.
//!
//! One module per upstream source table. Each source declares its required
//! columns; presence and physical type are validated against the first
//! record batch before any row is extracted, and a violation is fatal for
//! the whole run (no partial output is ever persisted).
//!
//! Rows with a null entity id or null year cannot be keyed and are dropped
//! silently at extraction; the drop count is carried on the loaded source
//! and reported by the run summary.

pub mod directory;
pub mod elections;
pub mod fiscal;
pub mod population;
pub mod social;

use std::path::Path;

use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};
use crate::utils::arrow::ColumnKind;
use crate::utils::io::parquet::{read_parquet_file, source_path};

pub use directory::DirectorySource;
pub use elections::ElectionsSource;
pub use fiscal::{ExpenseSource, RevenueSource};
pub use population::PopulationSource;
pub use social::SocialSource;

/// A named upstream source with a fixed required column set.
pub trait SourceTable {
    /// Typed row produced by this source
    type Row;

    /// Source name; also the snapshot file stem
    const NAME: &'static str;

    /// Columns that must be present with a compatible type
    fn required_columns() -> &'static [(&'static str, ColumnKind)];

    /// Extract one row, or `None` if the row has no usable key.
    fn extract_row(batch: &RecordBatch, row: usize) -> Option<Self::Row>;
}

/// A fully loaded source with its extraction bookkeeping.
#[derive(Debug)]
pub struct LoadedSource<R> {
    /// Extracted typed rows
    pub rows: Vec<R>,
    /// Rows in the snapshot file
    pub source_rows: usize,
    /// Rows dropped for a null key (silent filter, counted)
    pub dropped: usize,
}

/// Validate that a batch carries every required column of a source.
pub fn validate_schema<S: SourceTable>(batch: &RecordBatch) -> Result<()> {
    let schema = batch.schema();
    for (name, kind) in S::required_columns() {
        match schema.index_of(name) {
            Err(_) => {
                return Err(PipelineError::schema(
                    S::NAME,
                    format!("required column '{name}' is missing"),
                ));
            }
            Ok(idx) => {
                let data_type = schema.field(idx).data_type();
                if !kind.accepts(data_type) {
                    return Err(PipelineError::schema(
                        S::NAME,
                        format!("column '{name}' has incompatible type {data_type:?}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Load a source snapshot: resolve the file, validate the schema once,
/// extract every row.
pub fn load_source<S: SourceTable>(input_dir: &Path) -> Result<LoadedSource<S::Row>> {
    let path = source_path(input_dir, S::NAME)?;
    let batches = read_parquet_file(&path)?;

    if let Some(first) = batches.first() {
        validate_schema::<S>(first)?;
    }

    let mut rows = Vec::new();
    let mut source_rows = 0;
    let mut dropped = 0;
    for batch in &batches {
        source_rows += batch.num_rows();
        for row in 0..batch.num_rows() {
            match S::extract_row(batch, row) {
                Some(typed) => rows.push(typed),
                None => dropped += 1,
            }
        }
    }

    log::info!(
        "Loaded source '{}': {} rows ({} dropped for null keys)",
        S::NAME,
        rows.len(),
        dropped
    );
    Ok(LoadedSource {
        rows,
        source_rows,
        dropped,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    /// Build a single-batch test table from typed columns.
    pub fn batch_of(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, a)| a).collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    pub fn str_col(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values))
    }

    pub fn int_col(values: Vec<Option<i64>>) -> ArrayRef {
        Arc::new(Int64Array::from(values))
    }

    pub fn float_col(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }
}
