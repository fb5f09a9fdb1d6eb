//! Listing Feature Pipeline Library
//!
//! Turns scraped retail listing attributes (free text with units, localized
//! booleans, brand strings, compound fields) into a numeric feature table, and
//! replays exactly the same transformation on single records at inference.
//!
//! # Overview
//!
//! - **Normalization**: canonical column names and text values ([`normalizer`])
//! - **Extraction**: unit-aware numbers and localized booleans ([`extractor`])
//! - **Classification**: ordered rule tables with a fallback label ([`classifier`])
//! - **Splitting**: `W x H` resolutions into derived columns ([`splitter`])
//! - **Missing values**: medians, indicators and sentinels ([`imputers`])
//! - **Encoding**: one-hot or ordinal, fitted once and replayed ([`encoder`])
//! - **Reconciliation**: inference output forced onto the training layout ([`schema`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use listing_features::{Pipeline, PipelineConfig, RawRecord};
//! use listing_features::utils::read_text_csv;
//!
//! let df = read_text_csv("data/phones.csv")?;
//!
//! let pipeline = Pipeline::builder()
//!     .config(
//!         PipelineConfig::builder()
//!             .target_column("Ürün Fiyat")
//!             .exclude_column("Ürün Puan")
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let output = pipeline.fit(df)?;
//! let schema = output.schema().unwrap();
//! schema.save("out/schema.json")?;
//!
//! let record = RawRecord::new()
//!     .with_field("Ekran Ekran Boyutu", Some("6.9 İnç"))
//!     .with_field("Kablosuz Bağlantılar NFC", Some("Var"));
//! let features = pipeline.prepare_record(&record, &output.report, schema)?;
//! assert_eq!(features.frame.width(), schema.len());
//! ```
//!
//! # Rule Tables
//!
//! Which columns are numeric, boolean, classified or split is declared in
//! [`FeatureRules`]. The built-in set covers smartphone listings; a JSON file
//! can replace it:
//!
//! ```rust,ignore
//! let rules = FeatureRules::load("rules/phones.json")?;
//! let pipeline = Pipeline::builder().rules(rules).build()?;
//! ```

pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod imputers;
pub mod normalizer;
pub mod pipeline;
pub mod reporting;
pub mod rules;
pub mod schema;
pub mod splitter;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use classifier::{Classification, ClassRule, Matcher, RuleTable, classify};
pub use cleaner::{CleanedTable, FeatureCleaner};
pub use config::{
    CategoricalMissing, ConfigValidationError, EncodingStrategy, NumericImputation,
    PipelineConfig, PipelineConfigBuilder, TargetTransform,
};
pub use encoder::{CategoricalEncoder, EncodedTable, FittedEncoder, OrdinalMappings};
pub use error::{FeatureError, Result as FeatureResult, ResultExt};
pub use extractor::{BooleanTokens, UnitRule, extract_number};
pub use imputers::{ImputationReport, MissingValueResolver, resolve_for_inference};
pub use normalizer::{RenameReport, normalize_identifier, normalize_text_value, rename_columns};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOutput};
pub use reporting::{EncodingReport, ReportGenerator};
pub use rules::FeatureRules;
pub use schema::{FeatureSchema, Reconciled};
pub use splitter::{ResolutionFeatures, split_resolution};
pub use types::{ColumnKinds, FeatureKind, RawRecord};
