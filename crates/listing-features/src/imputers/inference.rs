//! Inference-time missing-value resolution.

use super::{ImputationReport, missing_flag_name};
use crate::error::Result;
use crate::types::{ColumnKinds, FeatureKind};
use crate::utils::{indicator_series, record_count, text_values};
use polars::prelude::*;
use tracing::debug;

/// Resolve absent cells in freshly cleaned inference input.
///
/// No statistic is computed here. Training columns missing from the input are
/// materialized first, then:
/// - boolean absent is `false`
/// - categorical absent is the training sentinel, when there was one, but only
///   for fields the input carries; a field the input lacks stays absent so
///   none of its dummies is set
/// - numeric absent stays absent (the reconciler turns it into `0`)
/// - every indicator column from training is emitted, `1` where its source is absent
pub fn resolve_for_inference(
    df: DataFrame,
    kinds: &ColumnKinds,
    imputation: &ImputationReport,
) -> Result<DataFrame> {
    let height = record_count(&df);
    let mut columns: Vec<Column> = df.get_columns().to_vec();
    let present =
        |columns: &[Column], name: &str| columns.iter().position(|c| c.name().as_str() == name);

    let mut materialized = Vec::new();
    for (name, kind) in kinds {
        if present(&columns, name).is_some() {
            continue;
        }
        let series = match kind {
            FeatureKind::Numeric | FeatureKind::Derived => {
                Series::new(name.as_str().into(), vec![None::<f64>; height])
            }
            FeatureKind::Boolean => Series::new(name.as_str().into(), vec![None::<bool>; height]),
            FeatureKind::CategoricalClosed | FeatureKind::CategoricalOpen => {
                Series::new(name.as_str().into(), vec![None::<String>; height])
            }
        };
        materialized.push(name.as_str());
        columns.push(series.into_column());
    }
    if !materialized.is_empty() {
        debug!("Input lacks training column(s) {:?}", materialized);
    }

    for column in columns.iter_mut() {
        let name = column.name().to_string();
        let Some(kind) = kinds.get(&name) else {
            continue;
        };
        if kind.is_categorical() && materialized.contains(&name.as_str()) {
            continue;
        }
        let series = column.as_materialized_series();
        let resolved = match kind {
            FeatureKind::Boolean => {
                let values: Vec<bool> = series
                    .cast(&DataType::Boolean)?
                    .bool()?
                    .into_iter()
                    .map(|v| v.unwrap_or(false))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            FeatureKind::CategoricalClosed | FeatureKind::CategoricalOpen => {
                match &imputation.missing_token {
                    Some(token) => {
                        let values: Vec<String> = text_values(series)?
                            .into_iter()
                            .map(|v| v.unwrap_or_else(|| token.clone()))
                            .collect();
                        Series::new(name.as_str().into(), values)
                    }
                    None => continue,
                }
            }
            FeatureKind::Numeric | FeatureKind::Derived => continue,
        };
        *column = resolved.into_column();
    }

    let mut flags = Vec::new();
    for source in imputation.flagged_sources() {
        let bits: Vec<bool> = match present(&columns, source) {
            Some(idx) => columns[idx]
                .as_materialized_series()
                .is_null()
                .into_iter()
                .map(|b| b.unwrap_or(false))
                .collect(),
            None => vec![true; height],
        };
        flags.push(indicator_series(&missing_flag_name(source), bits, true).into_column());
    }
    columns.extend(flags);

    Ok(DataFrame::new(columns)?)
}
