//! Categorical encoding and the persisted column layout.
//!
//! Training fits a [`CategoricalEncoder`] over the resolved corpus and returns
//! the encoded table, its [`FeatureSchema`] and a [`FittedEncoder`]. The fitted
//! encoder replays the exact same code path over a single inference record.

use crate::config::{EncodingStrategy, PipelineConfig};
use crate::error::Result;
use crate::schema::FeatureSchema;
use crate::types::{ColumnKinds, FeatureKind};
use crate::utils::{column_names, indicator_series, series_of, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Categorical column to value to code.
pub type OrdinalMappings = BTreeMap<String, BTreeMap<String, i32>>;

/// Code used for absent and unseen values under ordinal encoding.
pub const ORDINAL_MISSING_CODE: i32 = -1;

/// Suffix of the one-hot column that flags an absent value.
pub const DUMMY_NA_SUFFIX: &str = "nan";

/// Output of a training-time encoding.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    /// Encoded features, then the target (if any) as the last column.
    pub frame: DataFrame,
    /// Encoded column order without the target.
    pub schema: FeatureSchema,
    pub ordinal_mappings: OrdinalMappings,
}

/// One output column of a one-hot block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyColumn {
    /// Name in the encoded table.
    pub name: String,
    /// Category it flags; `None` flags an absent value.
    pub value: Option<String>,
}

/// Categorical column to its one-hot block, in output order.
pub type DummyLayout = BTreeMap<String, Vec<DummyColumn>>;

/// Fits categorical encodings over a training table.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalEncoder {
    strategy: EncodingStrategy,
    dummy_na: bool,
    bool_as_int: bool,
}

impl CategoricalEncoder {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            strategy: config.encoding,
            dummy_na: config.dummy_na,
            bool_as_int: config.bool_as_int,
        }
    }

    /// Encode the table and return the replayable encoder.
    ///
    /// Layout: non-categorical columns in table order, then (one-hot) the dummy
    /// blocks in categorical column order, then the target. Ordinal codes stay
    /// in place. With [`EncodingStrategy::None`] the table is returned as is.
    ///
    /// A dummy whose `<col>_<value>` name is already taken gets the first free
    /// `_2`, `_3`, ... suffix; the final names are part of the fitted encoder.
    pub fn fit_transform(
        &self,
        df: DataFrame,
        kinds: &ColumnKinds,
        target: Option<&str>,
    ) -> Result<(EncodedTable, FittedEncoder)> {
        let names = column_names(&df);
        let categorical_columns: Vec<String> = names
            .iter()
            .filter(|n| kinds.get(*n).is_some_and(FeatureKind::is_categorical))
            .cloned()
            .collect();
        let boolean_columns: Vec<String> = names
            .iter()
            .filter(|n| kinds.get(*n) == Some(&FeatureKind::Boolean))
            .cloned()
            .collect();

        let ordinal_mappings = match self.strategy {
            EncodingStrategy::Ordinal => fit_ordinal_mappings(&df, &categorical_columns)?,
            _ => OrdinalMappings::new(),
        };
        let dummy_columns = match self.strategy {
            EncodingStrategy::OneHot => fit_dummy_layout(&df, &categorical_columns, self.dummy_na)?,
            _ => DummyLayout::new(),
        };

        let fitted = FittedEncoder {
            strategy: self.strategy,
            categorical_columns,
            boolean_columns,
            ordinal_mappings: ordinal_mappings.clone(),
            dummy_columns,
            dummy_na: self.dummy_na,
            bool_as_int: self.bool_as_int,
        };

        info!("Encoding categorical columns ({})", self.strategy.as_str());
        let frame = fitted.encode(df, target)?;
        let schema = FeatureSchema::new(
            column_names(&frame)
                .into_iter()
                .filter(|n| Some(n.as_str()) != target)
                .collect(),
        )?;
        info!(
            "Encoded table: {} rows x {} columns",
            frame.height(),
            frame.width()
        );

        Ok((
            EncodedTable {
                frame,
                schema,
                ordinal_mappings,
            },
            fitted,
        ))
    }
}

/// Encoding fitted on a training corpus; immutable and replayable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoder {
    pub strategy: EncodingStrategy,
    /// Categorical columns in training table order.
    pub categorical_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
    pub ordinal_mappings: OrdinalMappings,
    #[serde(default)]
    pub dummy_columns: DummyLayout,
    pub dummy_na: bool,
    pub bool_as_int: bool,
}

static_assertions::assert_impl_all!(FittedEncoder: Send, Sync);

impl FittedEncoder {
    /// Encode inference input.
    ///
    /// One-hot output is always the full training block of every categorical
    /// column in the input, so a value never seen in training sets no dummy.
    /// Under ordinal encoding it gets the missing code.
    pub fn transform(&self, df: DataFrame) -> Result<DataFrame> {
        self.encode(df, None)
    }

    fn encode(&self, df: DataFrame, target: Option<&str>) -> Result<DataFrame> {
        let mut df = df;

        if self.bool_as_int {
            for name in &self.boolean_columns {
                if let Ok(column) = df.column(name) {
                    let ints = column.as_materialized_series().cast(&DataType::Int32)?;
                    df.replace(name, ints)?;
                }
            }
        }

        let dummy_names: BTreeSet<&str> = self
            .dummy_columns
            .values()
            .flatten()
            .map(|d| d.name.as_str())
            .collect();

        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        let mut dummies: Vec<Column> = Vec::new();
        let mut target_column: Option<Column> = None;

        for column in df.get_columns() {
            let name = column.name().as_str();
            if Some(name) == target {
                target_column = Some(column.clone());
                continue;
            }
            if !self.categorical_columns.iter().any(|c| c == name) {
                if self.strategy == EncodingStrategy::OneHot && dummy_names.contains(name) {
                    debug!("Input column '{}' shadows a dummy column; ignored", name);
                    continue;
                }
                columns.push(column.clone());
                continue;
            }

            let series = column.as_materialized_series();
            match self.strategy {
                EncodingStrategy::OneHot => {
                    let block = self
                        .dummy_columns
                        .get(name)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let encoded = one_hot(series, block, self.bool_as_int)?;
                    debug!("'{}' expanded into {} column(s)", name, encoded.len());
                    dummies.extend(encoded.into_iter().map(Series::into_column));
                }
                EncodingStrategy::Ordinal => {
                    let empty = BTreeMap::new();
                    let mapping = self.ordinal_mappings.get(name).unwrap_or(&empty);
                    columns.push(ordinal(series, mapping)?.into_column());
                }
                EncodingStrategy::None => columns.push(column.clone()),
            }
        }

        columns.extend(dummies);
        columns.extend(target_column);
        Ok(DataFrame::new(columns)?)
    }
}

/// Sorted distinct values coded from 0.
fn fit_ordinal_mappings(df: &DataFrame, categorical: &[String]) -> Result<OrdinalMappings> {
    let mut mappings = OrdinalMappings::new();
    for name in categorical {
        let values = text_values(&series_of(df, name)?)?;
        let distinct: BTreeSet<String> = values.into_iter().flatten().collect();
        let mapping = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, code as i32))
            .collect();
        mappings.insert(name.clone(), mapping);
    }
    Ok(mappings)
}

/// One dummy per observed value (`<col>_<value>`, sorted), plus `<col>_nan`
/// when requested. Names never repeat across the encoded table.
fn fit_dummy_layout(df: &DataFrame, categorical: &[String], dummy_na: bool) -> Result<DummyLayout> {
    let mut taken: BTreeSet<String> = column_names(df)
        .into_iter()
        .filter(|n| !categorical.contains(n))
        .collect();

    let mut layout = DummyLayout::new();
    for name in categorical {
        let categories: BTreeSet<String> = text_values(&series_of(df, name)?)?
            .into_iter()
            .flatten()
            .collect();

        let mut block = Vec::with_capacity(categories.len() + usize::from(dummy_na));
        for value in categories.into_iter().map(Some).chain(dummy_na.then_some(None)) {
            let base = format!("{name}_{}", value.as_deref().unwrap_or(DUMMY_NA_SUFFIX));
            let column = claim_name(&base, &mut taken);
            if column != base {
                warn!("Dummy column '{}' is already taken; writing it as '{}'", base, column);
            }
            block.push(DummyColumn {
                name: column,
                value,
            });
        }
        layout.insert(name.clone(), block);
    }
    Ok(layout)
}

fn claim_name(base: &str, taken: &mut BTreeSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn one_hot(series: &Series, block: &[DummyColumn], as_int: bool) -> Result<Vec<Series>> {
    let values = text_values(series)?;
    Ok(block
        .iter()
        .map(|dummy| {
            let bits = values
                .iter()
                .map(|v| v.as_deref() == dummy.value.as_deref())
                .collect();
            indicator_series(&dummy.name, bits, as_int)
        })
        .collect())
}

fn ordinal(series: &Series, mapping: &BTreeMap<String, i32>) -> Result<Series> {
    let codes: Vec<i32> = text_values(series)?
        .iter()
        .map(|v| {
            v.as_ref()
                .and_then(|value| mapping.get(value).copied())
                .unwrap_or(ORDINAL_MISSING_CODE)
        })
        .collect();
    Ok(Series::new(series.name().clone(), codes))
}
