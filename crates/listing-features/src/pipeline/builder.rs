//! Main feature pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating cleaning, missing-value resolution and encoding, for a
//! training corpus and for single inference records.

use crate::cleaner::{CleanedTable, FeatureCleaner};
use crate::config::{EncodingStrategy, PipelineConfig};
use crate::encoder::{CategoricalEncoder, EncodedTable};
use crate::error::{FeatureError, Result};
use crate::imputers::{MissingValueResolver, resolve_for_inference};
use crate::reporting::{EncodingReport, ReportGenerator, ReportParams};
use crate::rules::FeatureRules;
use crate::schema::{FeatureSchema, Reconciled};
use crate::types::RawRecord;
use polars::prelude::*;
use tracing::{debug, info};

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub cleaned: CleanedTable,
    /// Absent when encoding is disabled
    pub encoded: Option<EncodedTable>,
    pub report: EncodingReport,
}

impl PipelineOutput {
    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.encoded.as_ref().map(|e| &e.schema)
    }
}

/// The listing feature pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use listing_features::{Pipeline, PipelineConfig, RawRecord};
///
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::builder().target_column("Ürün Fiyat").build()?)
///     .build()?;
///
/// // Training
/// let output = pipeline.fit(corpus)?;
/// let schema = output.schema().unwrap().clone();
///
/// // Inference, same code path
/// let record = RawRecord::new().with_field("Kablosuz Bağlantılar NFC", Some("Var"));
/// let features = pipeline.prepare_record(&record, &output.report, &schema)?;
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    rules: FeatureRules,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rules(&self) -> &FeatureRules {
        &self.rules
    }

    /// Run the training path over a raw text table.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::MissingTargetColumn`] when the configured target
    /// is absent after column normalization. Nothing else about the data is
    /// fatal.
    pub fn fit(&self, df: DataFrame) -> Result<PipelineOutput> {
        self.fit_from(df, None)
    }

    /// [`Pipeline::fit`], recording the input path in the report.
    pub fn fit_from(&self, df: DataFrame, input_file: Option<&str>) -> Result<PipelineOutput> {
        info!("Starting feature pipeline...");

        info!("Step 1: Cleaning...");
        let cleaned = FeatureCleaner::new(&self.config, &self.rules).clean(df)?;

        if self.config.encoding == EncodingStrategy::None {
            info!("Step 2: Skipping imputation and encoding (disabled)");
            let report = ReportGenerator::build_report(ReportParams {
                input_file,
                config: &self.config,
                cleaned: &cleaned,
                imputation: None,
                encoded: None,
            });
            return Ok(PipelineOutput {
                cleaned,
                encoded: None,
                report,
            });
        }

        info!("Step 2: Resolving missing values...");
        let (resolved, imputation) = MissingValueResolver::new(&self.config)
            .fit_transform(cleaned.frame.clone(), &cleaned.kinds)?;

        info!("Step 3: Encoding...");
        let (encoded, fitted) = CategoricalEncoder::from_config(&self.config).fit_transform(
            resolved,
            &cleaned.kinds,
            cleaned.target.as_deref(),
        )?;

        let report = ReportGenerator::build_report(ReportParams {
            input_file,
            config: &self.config,
            cleaned: &cleaned,
            imputation: Some(&imputation),
            encoded: Some((&encoded, &fitted)),
        });

        info!(
            "Pipeline complete: {} rows, {} feature columns",
            encoded.frame.height(),
            encoded.schema.len()
        );
        Ok(PipelineOutput {
            cleaned,
            encoded: Some(encoded),
            report,
        })
    }

    /// Run the inference path over one raw record.
    ///
    /// Cleaning replays the training kinds, missing values are resolved
    /// without statistics and the fitted encoder is replayed. The output is
    /// not yet in schema layout; see [`Pipeline::prepare_record`].
    pub fn transform_record(&self, record: &RawRecord, report: &EncodingReport) -> Result<DataFrame> {
        let (Some(encoder), Some(imputation)) = (&report.encoder, &report.encoding.imputation)
        else {
            return Err(FeatureError::InvalidArtifact {
                path: "report".to_string(),
                reason: "training run has no fitted encoder".to_string(),
            });
        };

        debug!("Transforming record with {} field(s)", record.len());
        let df = record.to_frame()?;
        let cleaned =
            FeatureCleaner::new(&report.config, &self.rules).clean_known(df, &report.feature_kinds)?;
        let resolved = resolve_for_inference(cleaned.frame, &report.feature_kinds, imputation)?;
        encoder.transform(resolved)
    }

    /// Run the inference path and reconcile against the persisted schema.
    pub fn prepare_record(
        &self,
        record: &RawRecord,
        report: &EncodingReport,
        schema: &FeatureSchema,
    ) -> Result<Reconciled> {
        let encoded = self.transform_record(record, report)?;
        schema.reconcile(&encoded)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    rules: Option<FeatureRules>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the feature rule tables. Defaults to [`FeatureRules::smartphone`].
    pub fn rules(mut self, rules: FeatureRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Build the pipeline, validating the configuration and rules.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let rules = self.rules.unwrap_or_else(FeatureRules::smartphone);
        rules.validate()?;
        Ok(Pipeline { config, rules })
    }
}
