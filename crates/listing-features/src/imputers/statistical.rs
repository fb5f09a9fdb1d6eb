//! Training-time missing-value resolution.
//!
//! Statistics come from the training corpus only and are computed in one pass
//! before any cell is replaced.

use super::{ImputationReport, missing_flag_name};
use crate::config::{CategoricalMissing, NumericImputation, PipelineConfig};
use crate::error::Result;
use crate::types::{ColumnKinds, FeatureKind};
use crate::utils::{column_names, indicator_series, series_of, text_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Column-type-specific imputation over a cleaned training table.
pub struct MissingValueResolver<'a> {
    config: &'a PipelineConfig,
}

impl<'a> MissingValueResolver<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Resolve absent cells and append missing indicators.
    ///
    /// - numeric and derived: median of present values (`0` when none),
    ///   indicator `<col>__missing` computed before filling
    /// - boolean: absent is `false`
    /// - categorical: absent is the sentinel token under explicit handling
    ///
    /// Columns without a kind (the target) are left alone.
    pub fn fit_transform(
        &self,
        df: DataFrame,
        kinds: &ColumnKinds,
    ) -> Result<(DataFrame, ImputationReport)> {
        let mut df = df;
        let mut report = ImputationReport {
            numeric_imputation: self.config.numeric_imputation,
            categorical_missing: self.config.categorical_missing,
            missing_token: match self.config.categorical_missing {
                CategoricalMissing::Explicit => Some(self.config.missing_token.clone()),
                CategoricalMissing::None => None,
            },
            ..Default::default()
        };
        let mut flags: Vec<Series> = Vec::new();

        info!("Resolving missing values...");

        for col_name in column_names(&df) {
            let Some(kind) = kinds.get(&col_name) else {
                continue;
            };
            let series = series_of(&df, &col_name)?;
            let null_count = series.null_count();

            match kind {
                FeatureKind::Numeric | FeatureKind::Derived => {
                    let series = series.cast(&DataType::Float64)?;
                    let add_flag = self.config.missing_flags && null_count > 0;
                    report.missing_flags.insert(col_name.clone(), add_flag);
                    if add_flag {
                        let bits: Vec<bool> = series
                            .is_null()
                            .into_iter()
                            .map(|b| b.unwrap_or(false))
                            .collect();
                        let flag_name = missing_flag_name(&col_name);
                        flags.push(indicator_series(&flag_name, bits, true));
                        report.missing_flag_columns.push(flag_name);
                    }

                    if self.config.numeric_imputation == NumericImputation::Median {
                        let fill = series.median().unwrap_or(0.0);
                        report.numeric_fill_values.insert(col_name.clone(), fill);
                        if null_count > 0 {
                            let filled: Vec<f64> = series
                                .f64()?
                                .into_iter()
                                .map(|v| v.unwrap_or(fill))
                                .collect();
                            df.replace(&col_name, Series::new(col_name.as_str().into(), filled))?;
                            debug!(
                                "Filled {} absent value(s) in '{}' with median {}",
                                null_count, col_name, fill
                            );
                        }
                    }
                }
                FeatureKind::Boolean => {
                    if null_count > 0 {
                        let filled: Vec<bool> = series
                            .cast(&DataType::Boolean)?
                            .bool()?
                            .into_iter()
                            .map(|v| v.unwrap_or(false))
                            .collect();
                        df.replace(&col_name, Series::new(col_name.as_str().into(), filled))?;
                        report.boolean_zero_filled.push(col_name.clone());
                        debug!("Filled {} absent value(s) in '{}' with 0", null_count, col_name);
                    }
                }
                FeatureKind::CategoricalClosed | FeatureKind::CategoricalOpen => {
                    if null_count == 0 {
                        continue;
                    }
                    report.categorical_missing_columns.push(col_name.clone());
                    if let Some(token) = &report.missing_token {
                        let filled: Vec<String> = text_values(&series)?
                            .into_iter()
                            .map(|v| v.unwrap_or_else(|| token.clone()))
                            .collect();
                        df.replace(&col_name, Series::new(col_name.as_str().into(), filled))?;
                        debug!(
                            "Filled {} absent value(s) in '{}' with '{}'",
                            null_count, col_name, token
                        );
                    }
                }
            }
        }

        for flag in flags {
            df.with_column(flag)?;
        }

        info!(
            "Missing values resolved: {} numeric fill value(s), {} indicator column(s)",
            report.numeric_fill_values.len(),
            report.missing_flag_columns.len()
        );
        Ok((df, report))
    }
}
