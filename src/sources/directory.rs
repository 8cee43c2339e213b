//! Municipality reference directory.

use arrow::record_batch::RecordBatch;

use super::SourceTable;
use crate::utils::arrow::{ColumnKind, extract_string};

/// Unvalidated directory row; the normalizer turns these into
/// [`crate::models::Municipality`] values.
#[derive(Debug, Clone)]
pub struct DirectoryRow {
    pub entity_id: String,
    pub name: String,
    pub state: String,
}

/// The entity reference directory snapshot.
pub struct DirectorySource;

impl SourceTable for DirectorySource {
    type Row = DirectoryRow;

    const NAME: &'static str = "directory";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &[
            ("id_municipio", ColumnKind::Str),
            ("nome", ColumnKind::Str),
            ("sigla_uf", ColumnKind::Str),
        ]
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<DirectoryRow> {
        let entity_id = extract_string(batch, row, "id_municipio")?;
        let name = extract_string(batch, row, "nome").unwrap_or_default();
        let state = extract_string(batch, row, "sigla_uf")?;
        Some(DirectoryRow {
            entity_id,
            name,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::{batch_of, int_col, str_col};
    use crate::sources::validate_schema;

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let batch = batch_of(vec![
            ("id_municipio", str_col(vec![Some("1100015")])),
            ("nome", str_col(vec![Some("Alta Floresta")])),
        ]);
        assert!(validate_schema::<DirectorySource>(&batch).is_err());
    }

    #[test]
    fn mistyped_required_column_is_a_schema_error() {
        let batch = batch_of(vec![
            ("id_municipio", int_col(vec![Some(1_100_015)])),
            ("nome", str_col(vec![Some("Alta Floresta")])),
            ("sigla_uf", str_col(vec![Some("RO")])),
        ]);
        assert!(validate_schema::<DirectorySource>(&batch).is_err());
    }

    #[test]
    fn null_id_rows_are_skipped() {
        let batch = batch_of(vec![
            ("id_municipio", str_col(vec![Some("1100015"), None])),
            ("nome", str_col(vec![Some("Alta Floresta"), Some("X")])),
            ("sigla_uf", str_col(vec![Some("RO"), Some("RO")])),
        ]);
        assert!(DirectorySource::extract_row(&batch, 0).is_some());
        assert!(DirectorySource::extract_row(&batch, 1).is_none());
    }
}
