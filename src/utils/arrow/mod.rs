//! Typed value extraction from Arrow record batches.
//!
//! The snapshot files come from an upstream warehouse export and are not
//! fully consistent about physical types (integers may arrive as any width,
//! strings as `Utf8` or `LargeUtf8`). These helpers extract a logical value
//! per row and absorb the width differences; column *presence* and gross
//! type mismatches are handled up front by source validation, so extraction
//! itself returns plain `Option`s with `None` for nulls.

use arrow::array::{
    Array, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

/// Logical type a source column is required to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Str,
    Int,
    Float,
}

impl ColumnKind {
    /// Whether an Arrow type is an acceptable physical carrier.
    #[must_use]
    pub fn accepts(self, data_type: &DataType) -> bool {
        match self {
            Self::Str => matches!(data_type, DataType::Utf8 | DataType::LargeUtf8),
            Self::Int => matches!(
                data_type,
                DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt32
                    | DataType::UInt64
            ),
            // Integer columns are acceptable where a float is expected
            Self::Float => {
                matches!(data_type, DataType::Float32 | DataType::Float64)
                    || Self::Int.accepts(data_type)
            }
        }
    }
}

/// Index of a column in a batch, if present.
#[must_use]
pub fn column_index(batch: &RecordBatch, name: &str) -> Option<usize> {
    batch.schema().index_of(name).ok()
}

fn downcast<'a, A: Array + 'static>(batch: &'a RecordBatch, idx: usize) -> Option<&'a A> {
    batch.column(idx).as_any().downcast_ref::<A>()
}

/// Extract a non-empty string value.
#[must_use]
pub fn extract_string(batch: &RecordBatch, row: usize, name: &str) -> Option<String> {
    let idx = column_index(batch, name)?;
    let value = if let Some(array) = downcast::<StringArray>(batch, idx) {
        (!array.is_null(row)).then(|| array.value(row).to_string())
    } else if let Some(array) = downcast::<LargeStringArray>(batch, idx) {
        (!array.is_null(row)).then(|| array.value(row).to_string())
    } else {
        None
    };
    value.filter(|v| !v.is_empty())
}

/// Extract an integer value from any supported integer width.
#[must_use]
pub fn extract_i64(batch: &RecordBatch, row: usize, name: &str) -> Option<i64> {
    let idx = column_index(batch, name)?;
    macro_rules! try_width {
        ($ty:ty) => {
            if let Some(array) = downcast::<$ty>(batch, idx) {
                return (!array.is_null(row)).then(|| array.value(row) as i64);
            }
        };
    }
    try_width!(Int64Array);
    try_width!(Int32Array);
    try_width!(Int16Array);
    try_width!(Int8Array);
    try_width!(UInt32Array);
    try_width!(UInt64Array);
    None
}

/// Extract a float value; integer columns are widened.
#[must_use]
pub fn extract_f64(batch: &RecordBatch, row: usize, name: &str) -> Option<f64> {
    let idx = column_index(batch, name)?;
    if let Some(array) = downcast::<Float64Array>(batch, idx) {
        return (!array.is_null(row)).then(|| array.value(row));
    }
    if let Some(array) = downcast::<Float32Array>(batch, idx) {
        return (!array.is_null(row)).then(|| f64::from(array.value(row)));
    }
    extract_i64(batch, row, name).map(|v| v as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("amount", DataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("1100015"), None, Some("")])),
                Arc::new(Int32Array::from(vec![Some(2013), Some(2014), None])),
                Arc::new(Float64Array::from(vec![Some(10.5), None, Some(0.0)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn nulls_and_empties_become_none() {
        let b = batch();
        assert_eq!(extract_string(&b, 0, "id").as_deref(), Some("1100015"));
        assert_eq!(extract_string(&b, 1, "id"), None);
        assert_eq!(extract_string(&b, 2, "id"), None);
        assert_eq!(extract_i64(&b, 2, "year"), None);
    }

    #[test]
    fn integers_widen_to_float() {
        let b = batch();
        assert_eq!(extract_f64(&b, 0, "year"), Some(2013.0));
        assert_eq!(extract_f64(&b, 0, "amount"), Some(10.5));
    }

    #[test]
    fn kind_acceptance() {
        assert!(ColumnKind::Float.accepts(&DataType::Int64));
        assert!(ColumnKind::Str.accepts(&DataType::LargeUtf8));
        assert!(!ColumnKind::Int.accepts(&DataType::Utf8));
    }
}
