//! Core types shared across the feature pipeline.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Raw Record
// =============================================================================

/// One scraped listing or one inbound prediction request, before any cleaning.
///
/// Field order is the order of insertion. Labels are kept verbatim; an absent
/// value is stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A label that already exists is overwritten in place.
    pub fn with_field(mut self, label: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(label, value.map(str::to_string));
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: Option<String>) {
        let label = label.into();
        match self.fields.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    /// Build a record from a JSON object of raw field to value.
    ///
    /// Strings are taken verbatim, numbers and booleans are rendered to text and
    /// `null` is absent. Nested arrays and objects are rendered as JSON text.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            FeatureError::MalformedInput(format!(
                "expected a JSON object of field to value, got {}",
                json_kind(value)
            ))
        })?;

        let mut record = RawRecord::new();
        for (label, cell) in object {
            let text = match cell {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) => Some(n.to_string()),
                other => Some(other.to_string()),
            };
            record.insert(label.as_str(), text);
        }
        Ok(record)
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(l, _)| l.as_str())
    }

    /// Convert to a one-row frame with every column typed as text, the same
    /// shape a CSV corpus has when it is loaded.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .fields
            .iter()
            .map(|(label, value)| {
                Series::new(label.as_str().into(), vec![value.clone()]).into_column()
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Feature Kinds
// =============================================================================

/// How a canonical column is interpreted by the resolver and the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Magnitude pulled out of unit-bearing text
    Numeric,
    /// Localized yes/no token
    Boolean,
    /// Output of a classifier rule table; fixed label set
    CategoricalClosed,
    /// Arbitrary free text
    CategoricalOpen,
    /// Computed from other fields (e.g. resolution split)
    Derived,
}

impl FeatureKind {
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::CategoricalClosed | Self::CategoricalOpen)
    }

    /// Numeric-valued columns that take part in median imputation.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric | Self::Derived)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::CategoricalClosed => "categorical_closed",
            Self::CategoricalOpen => "categorical_open",
            Self::Derived => "derived",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical column name to its kind. Ordered for stable reports.
pub type ColumnKinds = BTreeMap<String, FeatureKind>;
