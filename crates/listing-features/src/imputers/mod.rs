//! Missing-value resolution.
//!
//! This module provides:
//! - Training-time resolution with corpus statistics ([`MissingValueResolver`])
//! - Inference-time resolution that never computes a statistic
//!   ([`resolve_for_inference`])
//! - The audit record of what was filled ([`ImputationReport`])

mod inference;
mod statistical;

pub use inference::resolve_for_inference;
pub use statistical::MissingValueResolver;

use crate::config::{CategoricalMissing, NumericImputation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix appended to a numeric column name to form its missing indicator.
pub const MISSING_FLAG_SUFFIX: &str = "__missing";

/// Name of the missing-indicator column for `column`.
pub fn missing_flag_name(column: &str) -> String {
    format!("{column}{MISSING_FLAG_SUFFIX}")
}

/// What the training run filled in, per column.
///
/// Audit only: inference reads the flag and sentinel policy from it but never
/// the fill values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    pub numeric_imputation: NumericImputation,
    /// Numeric column to the value that replaced its absent cells.
    pub numeric_fill_values: BTreeMap<String, f64>,
    /// Numeric column to whether a missing indicator was added for it.
    pub missing_flags: BTreeMap<String, bool>,
    /// Indicator columns in the order they were appended.
    pub missing_flag_columns: Vec<String>,
    /// Boolean columns whose absent cells became `0`.
    pub boolean_zero_filled: Vec<String>,
    pub categorical_missing: CategoricalMissing,
    /// Sentinel written into absent categorical cells, if any.
    pub missing_token: Option<String>,
    /// Categorical columns that had absent cells.
    pub categorical_missing_columns: Vec<String>,
}

impl ImputationReport {
    /// Numeric columns that received a missing indicator.
    pub fn flagged_sources(&self) -> impl Iterator<Item = &str> {
        self.missing_flags
            .iter()
            .filter(|(_, added)| **added)
            .map(|(col, _)| col.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flag_name() {
        assert_eq!(missing_flag_name("tasarim_agirlik"), "tasarim_agirlik__missing");
    }

    #[test]
    fn test_flagged_sources() {
        let mut report = ImputationReport::default();
        report.missing_flags.insert("a".to_string(), true);
        report.missing_flags.insert("b".to_string(), false);
        assert_eq!(report.flagged_sources().collect::<Vec<_>>(), vec!["a"]);
    }
}
