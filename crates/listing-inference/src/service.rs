//! Prediction service: a JSON record in, one price out.

use crate::error::{InferenceError, Result};
use crate::model::Regressor;
use listing_features::{EncodingReport, FeatureRules, FeatureSchema, Pipeline, RawRecord};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Scores raw listing records with a fitted model.
///
/// Artifacts are loaded once and never mutated, so one service can be shared
/// by any number of threads.
///
/// # Example
///
/// ```rust,ignore
/// use listing_inference::PredictService;
/// use listing_features::FeatureRules;
/// use std::sync::Arc;
///
/// let service = PredictService::load(
///     Arc::new(my_model),
///     "out/report.json",
///     "out/schema.json",
///     FeatureRules::smartphone(),
/// )?;
///
/// let price = service.predict(&serde_json::json!({
///     "Ekran Ekran Boyutu": "6.7 İnç",
///     "Kablosuz Bağlantılar NFC": "Var"
/// }))?;
/// ```
pub struct PredictService {
    regressor: Arc<dyn Regressor>,
    pipeline: Pipeline,
    report: EncodingReport,
    schema: FeatureSchema,
}

static_assertions::assert_impl_all!(PredictService: Send, Sync);

impl PredictService {
    /// Load the report and schema written by a training run.
    pub fn load(
        regressor: Arc<dyn Regressor>,
        report_path: impl AsRef<Path>,
        schema_path: impl AsRef<Path>,
        rules: FeatureRules,
    ) -> Result<Self> {
        let report = EncodingReport::load(report_path)?;
        let schema = FeatureSchema::load(schema_path)?;
        Self::from_parts(regressor, report, schema, rules)
    }

    /// Build a service from in-memory artifacts.
    ///
    /// `rules` must be the rule tables the training run used.
    pub fn from_parts(
        regressor: Arc<dyn Regressor>,
        report: EncodingReport,
        schema: FeatureSchema,
        rules: FeatureRules,
    ) -> Result<Self> {
        if report.encoder.is_none() {
            return Err(InferenceError::IncompatibleArtifacts(
                "report comes from a run with encoding disabled".to_string(),
            ));
        }
        if schema.columns() != report.encoding.feature_columns.as_slice() {
            return Err(InferenceError::IncompatibleArtifacts(format!(
                "schema ({} columns) is not the feature layout of the training run ({} columns)",
                schema.len(),
                report.encoding.feature_columns.len()
            )));
        }

        let pipeline = Pipeline::builder()
            .config(report.config.clone())
            .rules(rules)
            .build()?;

        Ok(Self {
            regressor,
            pipeline,
            report,
            schema,
        })
    }

    /// Encoded feature names the model expects, in order.
    pub fn expected_features(&self) -> &[String] {
        self.schema.columns()
    }

    /// Predict the target for one raw record (field label to value).
    ///
    /// The model output is mapped back through the target transform, so a model
    /// trained on `log1p(price)` still yields a price.
    pub fn predict(&self, input: &Value) -> Result<f64> {
        let record = RawRecord::from_json(input)?;
        let prepared = self
            .pipeline
            .prepare_record(&record, &self.report, &self.schema)?;
        if !prepared.dropped.is_empty() {
            debug!("Ignored fields unknown to the model: {:?}", prepared.dropped);
        }

        let outputs = self.regressor.predict(&prepared.frame)?;
        let [raw] = outputs.as_slice() else {
            return Err(InferenceError::Model(format!(
                "{} returned {} outputs for one record",
                self.regressor.name(),
                outputs.len()
            )));
        };
        Ok(self.report.restore_target(*raw))
    }

    /// Predict every record independently.
    pub fn predict_batch(&self, inputs: &[Value]) -> Result<Vec<f64>> {
        inputs.iter().map(|input| self.predict(input)).collect()
    }
}
