//! Run reports and output files.
//!
//! Use [`EncodingReport`] for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--report-out` CLI flag)
//! - Replaying a training run at inference ([`EncodingReport::load`])
//!
//! # Example
//!
//! ```rust,ignore
//! use listing_features::reporting::ReportGenerator;
//!
//! let output = pipeline.fit(df)?;
//! ReportGenerator::write_report(&output.report, "out/report.json")?;
//! println!("{}", serde_json::to_string_pretty(&output.report)?);
//! ```

mod generator;

pub use generator::{EncodingMetadata, EncodingReport, ReportGenerator, ReportParams};
