//! Pipeline module.
//!
//! This module provides the feature pipeline that ties cleaning, missing-value
//! resolution, encoding and reconciliation together.

mod builder;

pub use builder::{Pipeline, PipelineBuilder, PipelineOutput};
