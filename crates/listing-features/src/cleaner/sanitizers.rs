//! Cell sanitization applied right after column renaming.

use crate::error::Result;
use crate::utils::{column_names, series_of, text_values};
use polars::prelude::*;
use tracing::debug;

/// Trim a raw cell; empty text and the literal `nan` become absent.
pub(crate) fn clean_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Apply [`clean_cell`] to every column, returning text columns throughout.
pub(crate) fn blank_to_null(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    let mut total_replacements = 0;

    for col_name in column_names(&df) {
        let series = series_of(&df, &col_name)?;
        let values = text_values(&series)?;
        let before = values.iter().filter(|v| v.is_some()).count();

        let cleaned: Vec<Option<String>> = values
            .into_iter()
            .map(|v| v.and_then(|s| clean_cell(&s)))
            .collect();
        total_replacements += before - cleaned.iter().filter(|v| v.is_some()).count();

        df.replace(&col_name, Series::new(col_name.as_str().into(), cleaned))?;
    }

    if total_replacements > 0 {
        debug!("Replaced {} blank or 'nan' cells with null", total_replacements);
    }
    Ok(df)
}
