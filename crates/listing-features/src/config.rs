//! Configuration types for the feature pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! A configuration is fixed for the lifetime of a pipeline: policies such as
//! keeping compound source columns are decided once, never per record.

use serde::{Deserialize, Serialize};

/// Default sentinel written into absent categorical cells.
pub const DEFAULT_MISSING_TOKEN: &str = "__missing__";

/// Strategy for turning categorical columns into model-ready numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// One 0/1 column per observed value
    #[default]
    #[serde(alias = "one_hot")]
    OneHot,
    /// Sorted distinct values coded 0..n-1
    Ordinal,
    /// Skip encoding (and imputation); only the cleaned table is produced
    None,
}

impl EncodingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHot => "onehot",
            Self::Ordinal => "ordinal",
            Self::None => "none",
        }
    }
}

/// Strategy for imputing absent numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericImputation {
    /// Use the training-corpus median (0 if the column is entirely absent)
    #[default]
    Median,
    /// Leave absent values in place
    None,
}

/// Handling of absent categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalMissing {
    /// Replace absent cells with the missing token so "missing" is a category
    #[default]
    Explicit,
    /// Leave absent cells in place
    None,
}

/// Transform applied to the target column before it is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    #[default]
    None,
    /// `ln(1 + y)`; predictions are mapped back with `exp(p) - 1`
    Log1p,
}

impl TargetTransform {
    /// Apply the forward transform to a target value.
    pub fn forward(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Log1p => value.ln_1p(),
        }
    }

    /// Map a model output back onto the original target scale.
    pub fn inverse(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Log1p => value.exp_m1(),
        }
    }
}

/// Configuration for the cleaning and encoding pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration.
///
/// # Example
///
/// ```rust,ignore
/// use listing_features::config::{PipelineConfig, EncodingStrategy};
///
/// let config = PipelineConfig::builder()
///     .encoding(EncodingStrategy::OneHot)
///     .target_column("urun_fiyat")
///     .exclude_column("urun_puan")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Encoding applied to categorical columns.
    /// Default: OneHot
    pub encoding: EncodingStrategy,

    /// Column held out of encoding and appended last. Raw or canonical label.
    /// Default: None
    pub target_column: Option<String>,

    /// Target-like columns dropped before encoding (raw or canonical labels).
    /// Default: empty
    pub exclude_columns: Vec<String>,

    /// When set, only these columns (canonical names, after derivation) are
    /// kept in the cleaned table. The target is always kept.
    /// Default: None
    pub include_columns: Option<Vec<String>>,

    /// Keep compound/classified source columns next to their derived features.
    /// Default: false
    pub keep_source_columns: bool,

    /// Normalize every remaining free-text value to lowercase ASCII words.
    /// Default: false
    pub normalize_text_values: bool,

    /// Numeric imputation strategy.
    /// Default: Median
    pub numeric_imputation: NumericImputation,

    /// Add `<col>__missing` indicator columns for numeric columns with gaps.
    /// Default: true
    pub missing_flags: bool,

    /// Categorical missing-value handling.
    /// Default: Explicit
    pub categorical_missing: CategoricalMissing,

    /// Token used for absent categorical cells.
    /// Default: "__missing__"
    pub missing_token: String,

    /// Add a `<col>_nan` dummy per one-hot encoded column.
    /// Default: false
    pub dummy_na: bool,

    /// Cast boolean output columns to 0/1 integers.
    /// Default: true
    pub bool_as_int: bool,

    /// Transform applied to the target column.
    /// Default: None
    pub target_transform: TargetTransform,

    /// Drop training rows whose target is absent.
    /// Default: true
    pub drop_missing_target: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingStrategy::default(),
            target_column: None,
            exclude_columns: Vec::new(),
            include_columns: None,
            keep_source_columns: false,
            normalize_text_values: false,
            numeric_imputation: NumericImputation::default(),
            missing_flags: true,
            categorical_missing: CategoricalMissing::default(),
            missing_token: DEFAULT_MISSING_TOKEN.to_string(),
            dummy_na: false,
            bool_as_int: true,
            target_transform: TargetTransform::default(),
            drop_missing_target: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.missing_token.trim().is_empty() {
            return Err(ConfigValidationError::EmptyMissingToken);
        }

        if let Some(target) = &self.target_column {
            if target.trim().is_empty() {
                return Err(ConfigValidationError::EmptyTargetColumn);
            }
            let canonical = crate::normalizer::normalize_identifier(target);
            if self
                .exclude_columns
                .iter()
                .any(|c| crate::normalizer::normalize_identifier(c) == canonical)
            {
                return Err(ConfigValidationError::TargetExcluded(target.clone()));
            }
        } else if self.target_transform != TargetTransform::None {
            return Err(ConfigValidationError::TransformWithoutTarget);
        }

        Ok(())
    }

    /// Canonical name of the configured target column.
    pub fn canonical_target(&self) -> Option<String> {
        self.target_column
            .as_deref()
            .map(crate::normalizer::normalize_identifier)
    }

    /// Canonical names of the excluded columns.
    pub fn canonical_excludes(&self) -> Vec<String> {
        self.exclude_columns
            .iter()
            .map(|c| crate::normalizer::normalize_identifier(c))
            .collect()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing token must not be empty")]
    EmptyMissingToken,

    #[error("Target column name must not be empty")]
    EmptyTargetColumn,

    #[error("Target column '{0}' is also listed as excluded")]
    TargetExcluded(String),

    #[error("A target transform requires a target column")]
    TransformWithoutTarget,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    encoding: Option<EncodingStrategy>,
    target_column: Option<String>,
    exclude_columns: Vec<String>,
    include_columns: Option<Vec<String>>,
    keep_source_columns: Option<bool>,
    normalize_text_values: Option<bool>,
    numeric_imputation: Option<NumericImputation>,
    missing_flags: Option<bool>,
    categorical_missing: Option<CategoricalMissing>,
    missing_token: Option<String>,
    dummy_na: Option<bool>,
    bool_as_int: Option<bool>,
    target_transform: Option<TargetTransform>,
    drop_missing_target: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the categorical encoding strategy.
    pub fn encoding(mut self, encoding: EncodingStrategy) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Exclude one more column from the feature set.
    pub fn exclude_column(mut self, column: impl Into<String>) -> Self {
        self.exclude_columns.push(column.into());
        self
    }

    /// Restrict the cleaned table to these columns (plus the target).
    pub fn include_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Keep compound source columns (e.g. the raw resolution string).
    pub fn keep_source_columns(mut self, keep: bool) -> Self {
        self.keep_source_columns = Some(keep);
        self
    }

    /// Normalize free-text values to lowercase ASCII words.
    pub fn normalize_text_values(mut self, normalize: bool) -> Self {
        self.normalize_text_values = Some(normalize);
        self
    }

    /// Set the numeric imputation strategy.
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    /// Enable or disable missing-indicator columns.
    pub fn missing_flags(mut self, enable: bool) -> Self {
        self.missing_flags = Some(enable);
        self
    }

    /// Set categorical missing-value handling.
    pub fn categorical_missing(mut self, handling: CategoricalMissing) -> Self {
        self.categorical_missing = Some(handling);
        self
    }

    /// Set the sentinel token for absent categorical values.
    pub fn missing_token(mut self, token: impl Into<String>) -> Self {
        self.missing_token = Some(token.into());
        self
    }

    /// Add a dummy column for absent values in one-hot encoding.
    pub fn dummy_na(mut self, enable: bool) -> Self {
        self.dummy_na = Some(enable);
        self
    }

    /// Cast boolean output columns to 0/1 integers.
    pub fn bool_as_int(mut self, enable: bool) -> Self {
        self.bool_as_int = Some(enable);
        self
    }

    /// Set the target transform.
    pub fn target_transform(mut self, transform: TargetTransform) -> Self {
        self.target_transform = Some(transform);
        self
    }

    /// Drop rows whose target value is absent.
    pub fn drop_missing_target(mut self, drop: bool) -> Self {
        self.drop_missing_target = Some(drop);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            encoding: self.encoding.unwrap_or_default(),
            target_column: self.target_column,
            exclude_columns: self.exclude_columns,
            include_columns: self.include_columns,
            keep_source_columns: self.keep_source_columns.unwrap_or(false),
            normalize_text_values: self.normalize_text_values.unwrap_or(false),
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            missing_flags: self.missing_flags.unwrap_or(true),
            categorical_missing: self.categorical_missing.unwrap_or_default(),
            missing_token: self
                .missing_token
                .unwrap_or_else(|| DEFAULT_MISSING_TOKEN.to_string()),
            dummy_na: self.dummy_na.unwrap_or(false),
            bool_as_int: self.bool_as_int.unwrap_or(true),
            target_transform: self.target_transform.unwrap_or_default(),
            drop_missing_target: self.drop_missing_target.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
