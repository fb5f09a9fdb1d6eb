//! Column converters: text columns in, typed feature columns out.
//!
//! Every converter is a per-cell pure function lifted over a series, so the
//! same code runs for a training corpus and for a one-row inference frame.

use crate::classifier::RuleTable;
use crate::error::Result;
use crate::extractor::{BooleanTokens, UnitRule, extract_with_rule, is_plain_number};
use crate::normalizer::normalize_text_value;
use crate::rules::ResolutionColumn;
use crate::splitter::ResolutionFeatures;
use crate::utils::text_values;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Extract a Float64 column from unit-bearing text.
pub(crate) fn extract_numeric_series(series: &Series, rule: UnitRule) -> Result<Series> {
    let values: Vec<Option<f64>> = text_values(series)?
        .iter()
        .map(|v| v.as_deref().and_then(|s| extract_with_rule(s, rule)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Parse a Boolean column from localized tokens; unknown tokens are null.
pub(crate) fn parse_boolean_series(series: &Series, tokens: &BooleanTokens) -> Result<Series> {
    let values: Vec<Option<bool>> = text_values(series)?
        .iter()
        .map(|v| v.as_deref().and_then(|s| tokens.parse(s)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Classify every cell. Returns the label column and the raw values that fell
/// back, sorted and deduplicated.
pub(crate) fn classify_series(
    series: &Series,
    table: &RuleTable,
    output: &str,
) -> Result<(Series, BTreeSet<String>)> {
    let mut unknown = BTreeSet::new();
    let labels: Vec<Option<String>> = text_values(series)?
        .iter()
        .map(|v| {
            let result = table.classify(v.as_deref());
            if result.is_fallback()
                && let Some(raw) = v
            {
                unknown.insert(raw.clone());
            }
            result.label().map(str::to_string)
        })
        .collect();
    Ok((Series::new(output.into(), labels), unknown))
}

/// Split a resolution column into its four derived Float64 columns.
pub(crate) fn split_resolution_series(
    series: &Series,
    column: &ResolutionColumn,
) -> Result<Vec<Series>> {
    let features: Vec<ResolutionFeatures> = text_values(series)?
        .iter()
        .map(|v| ResolutionFeatures::from_raw(v.as_deref()))
        .collect();

    Ok(column
        .outputs()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<f64>> = features.iter().map(|f| f.values()[idx]).collect();
            Series::new((*name).into(), values)
        })
        .collect())
}

/// Normalize free-text values; values that normalize to nothing become null.
pub(crate) fn normalize_text_series(series: &Series) -> Result<Series> {
    let values: Vec<Option<String>> = text_values(series)?
        .iter()
        .map(|v| {
            v.as_deref()
                .map(normalize_text_value)
                .filter(|s| !s.is_empty())
        })
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// An undeclared column is numeric when every present value is a plain number.
/// A column with no present value counts as numeric.
pub(crate) fn looks_numeric(series: &Series) -> Result<bool> {
    Ok(text_values(series)?
        .iter()
        .flatten()
        .all(|v| is_plain_number(v)))
}
