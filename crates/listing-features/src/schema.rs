//! The persisted feature schema and inference-time reconciliation.
//!
//! A [`FeatureSchema`] is the ordered list of encoded columns a model was fit
//! against. At inference every encoded record is forced onto that exact
//! layout by [`FeatureSchema::reconcile`], which never fails on a mismatch.

use crate::error::{FeatureError, Result, ResultExt};
use crate::utils::{column_names, record_count};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Ordered encoded column names, target excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

static_assertions::assert_impl_all!(FeatureSchema: Send, Sync);

/// A frame forced onto the schema layout.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Exactly the schema columns, in order, all `Float64`, no absent cells.
    pub frame: DataFrame,
    /// Input columns the schema does not know.
    pub dropped: Vec<String>,
    /// Schema columns the input lacked, filled with `0`.
    pub filled: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema. Duplicate names are rejected.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(FeatureError::MalformedInput(format!(
                "duplicate column '{dup}' in feature schema"
            )));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Load a schema written by [`FeatureSchema::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| FeatureError::InvalidArtifact {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let columns: Vec<String> =
            serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        Self::new(columns).map_err(|e| invalid(e.to_string()))
    }

    /// Write the schema as a JSON array of names.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.columns)?;
        std::fs::write(path, json).context(format!("Failed to write {}", path.display()))
    }

    /// Project `df` onto the schema.
    ///
    /// Extra columns are dropped, missing schema columns are filled with `0`,
    /// and absent cells inside kept columns become `0`. A frame without columns
    /// counts as one empty record. Reconciling a reconciled frame is a no-op.
    pub fn reconcile(&self, df: &DataFrame) -> Result<Reconciled> {
        let height = record_count(df);
        let present = column_names(df);

        let dropped: Vec<String> = present
            .iter()
            .filter(|c| !self.contains(c))
            .cloned()
            .collect();
        let mut filled = Vec::new();
        let mut columns = Vec::with_capacity(self.columns.len());

        for name in &self.columns {
            let values: Vec<f64> = match df.column(name) {
                Ok(column) => match column.as_materialized_series().cast(&DataType::Float64) {
                    Ok(cast) => cast.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
                    Err(e) => {
                        debug!("'{}' is not numeric ({}), filling with 0", name, e);
                        filled.push(name.clone());
                        vec![0.0; height]
                    }
                },
                Err(_) => {
                    filled.push(name.clone());
                    vec![0.0; height]
                }
            };
            columns.push(Series::new(name.as_str().into(), values).into_column());
        }

        if !dropped.is_empty() {
            debug!("Dropped {} column(s) unknown to the schema: {:?}", dropped.len(), dropped);
        }
        if !filled.is_empty() {
            debug!("Filled {} schema column(s) with 0: {:?}", filled.len(), filled);
        }

        let frame = if columns.is_empty() {
            DataFrame::empty()
        } else {
            DataFrame::new(columns)?
        };
        Ok(Reconciled {
            frame,
            dropped,
            filled,
        })
    }
}
