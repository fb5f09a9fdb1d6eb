use crate::cleaner::CleanedTable;
use crate::config::{EncodingStrategy, PipelineConfig, TargetTransform};
use crate::encoder::{EncodedTable, FittedEncoder, OrdinalMappings};
use crate::error::{FeatureError, Result, ResultExt};
use crate::imputers::ImputationReport;
use crate::normalizer::RenameCollision;
use crate::types::ColumnKinds;
use crate::utils::column_names;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything a training run decided, in one JSON document.
///
/// Inference reads the config, the feature kinds, the imputation policy and
/// the fitted encoder back from this report. The remaining fields are audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, when the run read one
    pub input_file: Option<String>,
    /// Rows in the cleaned table
    pub rows: usize,
    /// Columns of the cleaned table, in order
    pub columns: Vec<String>,
    /// Original label to canonical name
    pub renamed_columns: BTreeMap<String, String>,
    pub rename_collisions: Vec<RenameCollision>,
    /// Raw values that fell back to the "other" label, per source column
    pub unknown_values: BTreeMap<String, Vec<String>>,
    pub feature_kinds: ColumnKinds,
    pub ordinal_mappings: OrdinalMappings,
    /// Rows dropped because their target was absent
    pub dropped_rows: usize,
    pub config: PipelineConfig,
    pub encoding: EncodingMetadata,
    /// Absent when encoding was disabled
    pub encoder: Option<FittedEncoder>,
}

/// Encoding-stage section of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingMetadata {
    pub strategy: EncodingStrategy,
    pub target: Option<String>,
    pub target_transform: TargetTransform,
    pub categorical_columns: Vec<String>,
    pub categorical_missing_token: Option<String>,
    pub categorical_missing_columns: Vec<String>,
    pub missing_flag_columns: Vec<String>,
    pub numeric_imputation_values: BTreeMap<String, f64>,
    /// Boolean columns written as 0/1 integers
    pub bool_cast_columns: Vec<String>,
    /// Encoded feature count, target excluded
    pub encoded_columns: usize,
    /// Encoded feature names in schema order; empty when encoding was disabled
    pub feature_columns: Vec<String>,
    /// Absent when encoding was disabled
    pub imputation: Option<ImputationReport>,
}

/// Inputs for [`ReportGenerator::build_report`].
pub struct ReportParams<'a> {
    pub input_file: Option<&'a str>,
    pub config: &'a PipelineConfig,
    pub cleaned: &'a CleanedTable,
    pub imputation: Option<&'a ImputationReport>,
    pub encoded: Option<(&'a EncodedTable, &'a FittedEncoder)>,
}

impl EncodingReport {
    /// Load a report written by [`ReportGenerator::write_report`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| FeatureError::InvalidArtifact {
            path: path.display().to_string(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))
    }

    /// Undo the target transform on a model output.
    pub fn restore_target(&self, value: f64) -> f64 {
        self.encoding.target_transform.inverse(value)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Builds reports and writes stage outputs.
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn build_report(params: ReportParams<'_>) -> EncodingReport {
        let ReportParams {
            input_file,
            config,
            cleaned,
            imputation,
            encoded,
        } = params;

        let (encoder, ordinal_mappings, feature_columns) = match encoded {
            Some((table, fitted)) => (
                Some(fitted.clone()),
                table.ordinal_mappings.clone(),
                table.schema.columns().to_vec(),
            ),
            None => (None, OrdinalMappings::new(), Vec::new()),
        };
        let categorical_columns = encoder
            .as_ref()
            .map(|e| e.categorical_columns.clone())
            .unwrap_or_default();
        let bool_cast_columns = encoder
            .as_ref()
            .filter(|e| e.bool_as_int)
            .map(|e| e.boolean_columns.clone())
            .unwrap_or_default();

        let encoding = EncodingMetadata {
            strategy: config.encoding,
            target: cleaned.target.clone(),
            target_transform: config.target_transform,
            categorical_columns,
            categorical_missing_token: imputation.and_then(|i| i.missing_token.clone()),
            categorical_missing_columns: imputation
                .map(|i| i.categorical_missing_columns.clone())
                .unwrap_or_default(),
            missing_flag_columns: imputation
                .map(|i| i.missing_flag_columns.clone())
                .unwrap_or_default(),
            numeric_imputation_values: imputation
                .map(|i| i.numeric_fill_values.clone())
                .unwrap_or_default(),
            bool_cast_columns,
            encoded_columns: feature_columns.len(),
            feature_columns,
            imputation: imputation.cloned(),
        };

        EncodingReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(str::to_string),
            rows: cleaned.frame.height(),
            columns: column_names(&cleaned.frame),
            renamed_columns: cleaned.renames.renamed.clone(),
            rename_collisions: cleaned.renames.collisions.clone(),
            unknown_values: cleaned.unknown_values.clone(),
            feature_kinds: cleaned.kinds.clone(),
            ordinal_mappings,
            dropped_rows: cleaned.dropped_rows,
            config: config.clone(),
            encoding,
            encoder,
        }
    }

    /// Write a frame as CSV with a header row, creating parent directories.
    pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent(path)?;
        let mut file =
            File::create(path).context(format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)?;
        info!("Dataset saved: {}", path.display());
        Ok(())
    }

    /// Write a report as pretty JSON.
    pub fn write_report(report: &EncodingReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent(path)?;
        let mut file =
            File::create(path).context(format!("Failed to create {}", path.display()))?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;
        info!("Report saved: {}", path.display());
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
