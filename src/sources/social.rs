//! Census social indices.

use arrow::record_batch::RecordBatch;

use super::SourceTable;
use crate::models::RawSocialSnapshot;
use crate::utils::arrow::{ColumnKind, extract_f64, extract_i64, extract_string};

/// The census social-index snapshot.
///
/// The three composite indices are required; the sub-components and raw
/// magnitudes are optional and pass through as nulls when absent.
pub struct SocialSource;

impl SourceTable for SocialSource {
    type Row = RawSocialSnapshot;

    const NAME: &'static str = "social";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &[
            ("id_municipio", ColumnKind::Str),
            ("ano", ColumnKind::Int),
            ("idhm", ColumnKind::Float),
            ("ivs", ColumnKind::Float),
            ("indice_gini", ColumnKind::Float),
        ]
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<RawSocialSnapshot> {
        let entity_id = extract_string(batch, row, "id_municipio")?;
        let year = i32::try_from(extract_i64(batch, row, "ano")?).ok()?;
        // A snapshot without its composite indices carries no signal
        let development_index = extract_f64(batch, row, "idhm")?;
        let vulnerability_index = extract_f64(batch, row, "ivs")?;
        let inequality_coefficient = extract_f64(batch, row, "indice_gini")?;
        Some(RawSocialSnapshot {
            entity_id,
            year,
            development_index,
            development_education: extract_f64(batch, row, "idhm_educacao"),
            development_longevity: extract_f64(batch, row, "idhm_longevidade"),
            development_income: extract_f64(batch, row, "idhm_renda"),
            vulnerability_index,
            inequality_coefficient,
            income_per_capita: extract_f64(batch, row, "renda_per_capita"),
            life_expectancy: extract_f64(batch, row, "esperanca_vida"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::{batch_of, float_col, int_col, str_col};

    #[test]
    fn optional_columns_default_to_null() {
        let batch = batch_of(vec![
            ("id_municipio", str_col(vec![Some("3550308")])),
            ("ano", int_col(vec![Some(2010)])),
            ("idhm", float_col(vec![Some(0.805)])),
            ("ivs", float_col(vec![Some(0.35)])),
            ("indice_gini", float_col(vec![Some(0.62)])),
        ]);
        let snap = SocialSource::extract_row(&batch, 0).unwrap();
        assert_eq!(snap.development_index, 0.805);
        assert_eq!(snap.income_per_capita, None);
        assert_eq!(snap.development_education, None);
    }
}
