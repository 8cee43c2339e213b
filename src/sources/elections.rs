//! Electoral results for the head-of-government race.
//!
//! The snapshot is already filtered upstream to the mayoral race; one row
//! per candidate per entity per election year per round.

use arrow::record_batch::RecordBatch;

use super::SourceTable;
use crate::models::RawElectionResult;
use crate::utils::arrow::{ColumnKind, extract_i64, extract_string};

/// Outcome labels that mean the candidate took office. The electoral
/// authority distinguishes plain wins from proportional-quotient wins; both
/// start with the same word.
fn is_elected(outcome: &str) -> bool {
    outcome.to_lowercase().starts_with("eleito")
}

/// The electoral results snapshot.
pub struct ElectionsSource;

impl SourceTable for ElectionsSource {
    type Row = RawElectionResult;

    const NAME: &'static str = "elections";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &[
            ("id_municipio", ColumnKind::Str),
            ("ano", ColumnKind::Int),
            ("turno", ColumnKind::Int),
            ("sigla_partido", ColumnKind::Str),
            ("votos", ColumnKind::Int),
            ("resultado", ColumnKind::Str),
        ]
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<RawElectionResult> {
        let entity_id = extract_string(batch, row, "id_municipio")?;
        let year = i32::try_from(extract_i64(batch, row, "ano")?).ok()?;
        let round = i32::try_from(extract_i64(batch, row, "turno")?).ok()?;
        let party = extract_string(batch, row, "sigla_partido")?;
        let votes = extract_i64(batch, row, "votos")?;
        let elected = extract_string(batch, row, "resultado")
            .is_some_and(|outcome| is_elected(&outcome));
        Some(RawElectionResult {
            entity_id,
            year,
            round,
            party,
            votes,
            elected,
        })
    }
}
