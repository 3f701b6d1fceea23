//! Column extraction and assertion helpers.
//!
//! Values are cast before extraction, so the helpers work the same whether
//! a table came straight from the engine or back from Parquet (where strings
//! may be view-typed and partition columns are text).

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use arrow::array::{AsArray as _, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};

/// Returns every value of `column` across `batches`, as text.
///
/// # Panics
///
/// Panics if the column is missing or cannot be cast to text.
pub fn string_values(batches: &[RecordBatch], column: &str) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|batch| {
            let array = batch
                .column_by_name(column)
                .unwrap_or_else(|| panic!("missing column {column}"));
            let array = cast(array, &DataType::Utf8).expect("cast to utf8");
            array
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(ToString::to_string))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Returns every value of `column` across `batches`, as `i64`.
///
/// # Panics
///
/// Panics if the column is missing or cannot be cast to `i64`.
pub fn i64_values(batches: &[RecordBatch], column: &str) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|batch| {
            let array = batch
                .column_by_name(column)
                .unwrap_or_else(|| panic!("missing column {column}"));
            let array = cast(array, &DataType::Int64).expect("cast to int64");
            array
                .as_primitive::<Int64Type>()
                .iter()
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Asserts that no value appears twice.
///
/// # Panics
///
/// Panics on the first duplicate.
pub fn assert_unique<T: Eq + Hash + Debug>(values: &[T], what: &str) {
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
        assert!(seen.insert(value), "duplicate {what}: {value:?}");
    }
}

/// Asserts that every value is present and non-empty.
///
/// # Panics
///
/// Panics on the first null or empty value.
pub fn assert_non_empty(values: &[Option<String>], what: &str) {
    for value in values {
        assert!(
            value.as_deref().is_some_and(|v| !v.is_empty()),
            "expected non-empty {what}, got {value:?}"
        );
    }
}
