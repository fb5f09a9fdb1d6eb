//! Shared utilities for the feature pipeline.
//!
//! Small helpers for moving between polars columns and plain vectors, plus the
//! text-only CSV loader every stage boundary goes through.

use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::path::Path;

// =============================================================================
// Column Access Utilities
// =============================================================================

/// Column names of a frame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Read a series as optional text, casting non-text dtypes first.
pub fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let series = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Materialized series for a named column.
pub fn series_of(df: &DataFrame, name: &str) -> Result<Series> {
    Ok(df.column(name)?.as_materialized_series().clone())
}

/// A 0/1 indicator series, `Int32` when `as_int` is set and `Boolean` otherwise.
pub fn indicator_series(name: &str, bits: Vec<bool>, as_int: bool) -> Series {
    if as_int {
        let ints: Vec<i32> = bits.into_iter().map(i32::from).collect();
        Series::new(name.into(), ints)
    } else {
        Series::new(name.into(), bits)
    }
}

/// Number of rows a frame stands for. A frame without columns is one empty record.
pub fn record_count(df: &DataFrame) -> usize {
    if df.width() == 0 { 1 } else { df.height() }
}

// =============================================================================
// IO Utilities
// =============================================================================

/// Load a CSV file with a header row, reading every column as text.
///
/// No schema inference happens here: all parsing goes through the extractor
/// and classifier so a corpus and a single record are read the same way.
pub fn read_text_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_values_casts_numbers() {
        let series = Series::new("a".into(), &[Some(1i32), None, Some(3)]);
        assert_eq!(
            text_values(&series).unwrap(),
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_indicator_series() {
        let ints = indicator_series("f", vec![true, false], true);
        assert_eq!(ints.dtype(), &DataType::Int32);
        let bools = indicator_series("f", vec![true, false], false);
        assert_eq!(bools.dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_record_count() {
        assert_eq!(record_count(&DataFrame::empty()), 1);
        let df = df!["a" => [1, 2]].unwrap();
        assert_eq!(record_count(&df), 2);
    }

    #[test]
    fn test_read_text_csv_keeps_everything_as_text() {
        let path = std::env::temp_dir().join(format!(
            "listing_features_utils_{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, "a,b\n1,x\n2.5,\n").unwrap();
        let df = read_text_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
    }
}
