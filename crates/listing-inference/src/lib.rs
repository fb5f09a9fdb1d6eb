//! listing-inference: price prediction for single scraped listings.
//!
//! This crate wraps a fitted model behind the inference contract: a JSON
//! object of raw listing fields goes in, one number comes out. The record goes
//! through the same cleaning and encoding code the training corpus went
//! through, then gets reconciled onto the persisted feature schema.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use listing_inference::{PredictService, Regressor};
//! use listing_features::FeatureRules;
//! use std::sync::Arc;
//!
//! // Load artifacts once at startup
//! let service = PredictService::load(
//!     Arc::new(my_model),
//!     "out/report.json",
//!     "out/schema.json",
//!     FeatureRules::smartphone(),
//! )?;
//!
//! // Score requests, from any thread
//! let price = service.predict(&serde_json::json!({
//!     "Ekran Ekran Boyutu": "6.9 İnç",
//!     "Temel Donanım Yonga Seti (Chipset)": "Snapdragon 8 Gen 3"
//! }))?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! JSON object ──► RawRecord ──► clean (training kinds) ──► resolve missing
//!                                                              │
//!            price ◄── inverse target transform ◄── Regressor ◄── reconcile
//! ```

pub mod error;
pub mod model;
pub mod service;

pub use error::{InferenceError, Result};
pub use model::Regressor;
pub use service::PredictService;
