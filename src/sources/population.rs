//! Annual population counts.

use arrow::record_batch::RecordBatch;

use super::SourceTable;
use crate::models::PopulationCount;
use crate::utils::arrow::{ColumnKind, extract_i64, extract_string};

/// The historical population snapshot.
pub struct PopulationSource;

impl SourceTable for PopulationSource {
    type Row = PopulationCount;

    const NAME: &'static str = "population";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &[
            ("id_municipio", ColumnKind::Str),
            ("ano", ColumnKind::Int),
            ("populacao", ColumnKind::Int),
        ]
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<PopulationCount> {
        let entity_id = extract_string(batch, row, "id_municipio")?;
        let year = i32::try_from(extract_i64(batch, row, "ano")?).ok()?;
        let population = u64::try_from(extract_i64(batch, row, "populacao")?).ok()?;
        Some(PopulationCount {
            entity_id,
            year,
            population,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::{batch_of, int_col, str_col};

    #[test]
    fn negative_population_is_dropped() {
        let batch = batch_of(vec![
            ("id_municipio", str_col(vec![Some("1100015"), Some("1100015")])),
            ("ano", int_col(vec![Some(2013), Some(2014)])),
            ("populacao", int_col(vec![Some(25_000), Some(-1)])),
        ]);
        assert!(PopulationSource::extract_row(&batch, 0).is_some());
        assert!(PopulationSource::extract_row(&batch, 1).is_none());
    }
}
