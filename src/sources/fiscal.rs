//! Fiscal execution snapshots: revenue and expense.
//!
//! Both files share shape — entity, year, account, execution stage, amount —
//! and differ only in the stage vocabulary. Stage labels vary slightly
//! across snapshot vintages, so parsing matches on the invariant word stem.

use arrow::record_batch::RecordBatch;

use super::SourceTable;
use crate::models::raw::{ExpenseStage, FiscalStage, RawFiscalRecord, RevenueStage};
use crate::utils::arrow::{ColumnKind, extract_f64, extract_i64, extract_string};

const REQUIRED: [(&str, ColumnKind); 5] = [
    ("id_municipio", ColumnKind::Str),
    ("ano", ColumnKind::Int),
    ("estagio", ColumnKind::Str),
    ("conta", ColumnKind::Str),
    ("valor", ColumnKind::Float),
];

/// Parse an expense stage label.
fn parse_expense_stage(label: &str) -> Option<ExpenseStage> {
    let lower = label.to_lowercase();
    if lower.contains("empenhad") {
        Some(ExpenseStage::Committed)
    } else if lower.contains("liquidad") {
        Some(ExpenseStage::Accrued)
    } else if lower.contains("pag") {
        Some(ExpenseStage::Paid)
    } else {
        None
    }
}

/// Parse a revenue stage label.
fn parse_revenue_stage(label: &str) -> Option<RevenueStage> {
    let lower = label.to_lowercase();
    if lower.contains("dedu") {
        Some(RevenueStage::Deduction)
    } else if lower.contains("brut") || lower.contains("realizad") {
        Some(RevenueStage::Gross)
    } else {
        None
    }
}

fn extract_common(batch: &RecordBatch, row: usize) -> Option<(String, i32, String, String, f64)> {
    let entity_id = extract_string(batch, row, "id_municipio")?;
    let year = i32::try_from(extract_i64(batch, row, "ano")?).ok()?;
    let account_code = extract_string(batch, row, "conta")?;
    let account_label = extract_string(batch, row, "descricao_conta").unwrap_or_default();
    let amount = extract_f64(batch, row, "valor")?;
    Some((entity_id, year, account_code, account_label, amount))
}

/// The budget revenue snapshot.
pub struct RevenueSource;

impl SourceTable for RevenueSource {
    type Row = RawFiscalRecord;

    const NAME: &'static str = "revenue";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &REQUIRED
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<RawFiscalRecord> {
        let (entity_id, year, account_code, account_label, amount) = extract_common(batch, row)?;
        let stage = parse_revenue_stage(&extract_string(batch, row, "estagio")?)?;
        Some(RawFiscalRecord {
            entity_id,
            year,
            account_code,
            account_label,
            stage: FiscalStage::Revenue(stage),
            amount,
        })
    }
}

/// The budget expense snapshot.
pub struct ExpenseSource;

impl SourceTable for ExpenseSource {
    type Row = RawFiscalRecord;

    const NAME: &'static str = "expense";

    fn required_columns() -> &'static [(&'static str, ColumnKind)] {
        &REQUIRED
    }

    fn extract_row(batch: &RecordBatch, row: usize) -> Option<RawFiscalRecord> {
        let (entity_id, year, account_code, account_label, amount) = extract_common(batch, row)?;
        let stage = parse_expense_stage(&extract_string(batch, row, "estagio")?)?;
        Some(RawFiscalRecord {
            entity_id,
            year,
            account_code,
            account_label,
            stage: FiscalStage::Expense(stage),
            amount,
        })
    }
}
