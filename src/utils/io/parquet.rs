//! Parquet file operations.
//!
//! Reading goes through `ParquetRecordBatchReaderBuilder` into Arrow record
//! batches; writing goes through `ArrowWriter` with zstd compression. A
//! derived table is written to a temporary sibling and renamed into place,
//! so a partially written table is never visible.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

use crate::error::{PipelineError, Result};
use crate::utils::logging::log_operation_start;

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Batch size override from the environment.
#[must_use]
pub fn batch_size() -> usize {
    std::env::var("MUNI_PANELS_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Resolve the Parquet file for a named source inside the snapshot dir.
pub fn source_path(input_dir: &Path, source_name: &str) -> Result<PathBuf> {
    let path = input_dir.join(format!("{source_name}.parquet"));
    if !path.is_file() {
        return Err(PipelineError::SnapshotNotFound(path));
    }
    Ok(path)
}

/// Read a whole Parquet file into record batches.
pub fn read_parquet_file(path: &Path) -> Result<Vec<RecordBatch>> {
    log_operation_start("Reading Parquet file", path);
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.with_batch_size(batch_size()).build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Write one record batch as a Parquet file, atomically.
pub fn write_record_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("parquet.tmp");
    let file = File::create(&tmp_path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn write_then_read_round_trips() {
        let dir = std::env::temp_dir().join("muni_panels_io_test");
        let path = dir.join("t.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![1_i64, 2, 3]))],
        )
        .unwrap();

        write_record_batch(&path, &batch).unwrap();
        let batches = read_parquet_file(&path).unwrap();
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = source_path(Path::new("/nonexistent"), "elections").unwrap_err();
        assert!(matches!(err, PipelineError::SnapshotNotFound(_)));
    }
}
