//! The model seam.
//!
//! Training happens elsewhere; here a model is only a function from an encoded
//! feature table to one number per row. Implement [`Regressor`] for whatever
//! holds the fitted model (a native booster, an ONNX session, a remote call).
//!
//! # Example
//!
//! ```rust,ignore
//! use listing_inference::{Regressor, Result};
//! use polars::prelude::*;
//!
//! struct Constant(f64);
//!
//! impl Regressor for Constant {
//!     fn predict(&self, features: &DataFrame) -> Result<Vec<f64>> {
//!         Ok(vec![self.0; features.height()])
//!     }
//! }
//! ```

use crate::error::Result;
use polars::prelude::DataFrame;

/// A fitted regression model.
///
/// `features` always has exactly the columns of the training feature schema,
/// in schema order, as `Float64` without absent cells. Implementations must
/// return one prediction per row, on the scale the model was trained on.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "regressor"
    }
}
