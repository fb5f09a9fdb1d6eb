//! CLI entry point for the listing feature pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use listing_features::config::DEFAULT_MISSING_TOKEN;
use listing_features::utils::read_text_csv;
use listing_features::{
    CategoricalMissing, EncodingReport, EncodingStrategy, FeatureRules, NumericImputation,
    Pipeline, PipelineConfig, PipelineOutput, ReportGenerator, TargetTransform,
};
use std::path::Path;
use tracing::{error, info};

/// CLI-compatible encoding strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEncoding {
    /// One indicator column per category value
    Onehot,
    /// One integer code per category value
    Ordinal,
    /// Clean only; no imputation or encoding
    None,
}

impl From<CliEncoding> for EncodingStrategy {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::Onehot => EncodingStrategy::OneHot,
            CliEncoding::Ordinal => EncodingStrategy::Ordinal,
            CliEncoding::None => EncodingStrategy::None,
        }
    }
}

/// CLI-compatible numeric imputation enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericImputation {
    /// Median of the non-missing training values
    Median,
    /// Leave missing values in place
    None,
}

impl From<CliNumericImputation> for NumericImputation {
    fn from(cli: CliNumericImputation) -> Self {
        match cli {
            CliNumericImputation::Median => NumericImputation::Median,
            CliNumericImputation::None => NumericImputation::None,
        }
    }
}

/// CLI-compatible categorical missing-value handling enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategoricalMissing {
    /// Replace missing values with the missing token
    Explicit,
    /// Leave missing values in place
    None,
}

impl From<CliCategoricalMissing> for CategoricalMissing {
    fn from(cli: CliCategoricalMissing) -> Self {
        match cli {
            CliCategoricalMissing::Explicit => CategoricalMissing::Explicit,
            CliCategoricalMissing::None => CategoricalMissing::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Feature cleaning and encoding for scraped listings",
    long_about = "Cleans scraped listing attributes into typed features and encodes them \
                  into a numeric table, writing the feature schema and report needed to \
                  replay the transformation at inference.\n\n\
                  EXAMPLES:\n  \
                  # Clean and one-hot encode with a price target\n  \
                  listing-features -i phones.csv --target \"Ürün Fiyat\" \\\n    \
                  --encoded-out out/encoded.csv --schema-out out/schema.json \\\n    \
                  --report-out out/report.json\n\n  \
                  # Clean only\n  \
                  listing-features -i phones.csv --encoding none --clean-out out/clean.csv"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Write the cleaned (typed, unencoded) table
    #[arg(long)]
    clean_out: Option<String>,

    /// Write the encoded table
    #[arg(long)]
    encoded_out: Option<String>,

    /// Write the JSON run report
    #[arg(long)]
    report_out: Option<String>,

    /// Write the feature schema (ordered encoded column names)
    #[arg(long)]
    schema_out: Option<String>,

    /// JSON rule tables replacing the built-in smartphone rules
    #[arg(long)]
    rules: Option<String>,

    /// Categorical encoding strategy
    #[arg(long, value_enum, default_value = "onehot")]
    encoding: CliEncoding,

    /// Target column; rows without a target value are dropped
    #[arg(short, long)]
    target: Option<String>,

    /// Column to drop before encoding (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Keep only these columns in the cleaned table (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Add a `<col>_nan` indicator per one-hot encoded column
    #[arg(long)]
    dummy_na: bool,

    /// Keep compound source columns next to their derived features
    #[arg(long)]
    keep_source_columns: bool,

    /// Normalize free-text values (ASCII fold, lowercase)
    #[arg(long)]
    normalize_text_values: bool,

    /// Strategy for missing numeric values
    #[arg(long, value_enum, default_value = "median")]
    impute_numeric: CliNumericImputation,

    /// Add `<col>__missing` indicators for numeric columns with missing values
    #[arg(long, value_enum, default_value = "on")]
    missing_flags: Switch,

    /// Handling of missing categorical values
    #[arg(long, value_enum, default_value = "explicit")]
    categorical_missing: CliCategoricalMissing,

    /// Token written into missing categorical cells
    #[arg(long, default_value = DEFAULT_MISSING_TOKEN)]
    missing_token: String,

    /// Write boolean and indicator columns as 0/1 integers
    #[arg(long, value_enum, default_value = "on")]
    bool_as_int: Switch,

    /// Train on log1p of the target
    #[arg(long)]
    log_target: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the JSON report to stdout; disables logging
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    let rules = match &args.rules {
        Some(path) => {
            info!("Loading rule tables from: {}", path);
            FeatureRules::load(path)?
        }
        None => FeatureRules::smartphone(),
    };
    let pipeline = Pipeline::builder().config(config).rules(rules).build()?;

    info!("Loading dataset from: {}", args.input);
    let data = read_text_csv(&args.input)?;
    info!("Dataset loaded: {:?}", data.shape());

    match pipeline.fit_from(data, Some(&args.input)) {
        Ok(output) => write_outputs(output, &args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .encoding(args.encoding.into())
        .keep_source_columns(args.keep_source_columns)
        .normalize_text_values(args.normalize_text_values)
        .numeric_imputation(args.impute_numeric.into())
        .missing_flags(args.missing_flags.into())
        .categorical_missing(args.categorical_missing.into())
        .missing_token(&args.missing_token)
        .dummy_na(args.dummy_na)
        .bool_as_int(args.bool_as_int.into());

    if let Some(target) = &args.target {
        builder = builder.target_column(target);
    }
    for column in &args.exclude {
        builder = builder.exclude_column(column);
    }
    if !args.include.is_empty() {
        builder = builder.include_columns(args.include.iter());
    }
    if args.log_target {
        builder = builder.target_transform(TargetTransform::Log1p);
    }

    Ok(builder.build()?)
}

/// Write every requested output, then print the report or a summary.
fn write_outputs(output: PipelineOutput, args: &Args) -> Result<()> {
    let PipelineOutput {
        mut cleaned,
        encoded,
        report,
    } = output;

    if let Some(path) = &args.clean_out {
        ReportGenerator::write_csv(&mut cleaned.frame, path)?;
    }

    match encoded {
        Some(mut encoded) => {
            if let Some(path) = &args.encoded_out {
                ReportGenerator::write_csv(&mut encoded.frame, path)?;
            }
            if let Some(path) = &args.schema_out {
                encoded.schema.save(path)?;
                info!("Schema saved: {}", path);
            }
        }
        None => {
            if args.encoded_out.is_some() || args.schema_out.is_some() {
                info!("Encoding disabled; no encoded table or schema written");
            }
        }
    }

    if let Some(path) = &args.report_out {
        ReportGenerator::write_report(&report, path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !args.quiet {
        print_human_readable_summary(&report);
    }
    Ok(())
}

/// Print a short summary of the run.
///
/// Uses `println!` so the summary shows regardless of log level.
fn print_human_readable_summary(report: &EncodingReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("FEATURE PIPELINE COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    if let Some(input) = &report.input_file {
        println!("Input: {}", input);
    }
    println!(
        "Cleaned: {} rows x {} columns ({} rows dropped for missing target)",
        report.rows,
        report.columns.len(),
        report.dropped_rows
    );
    println!(
        "Encoding: {} ({} feature columns)",
        report.encoding.strategy.as_str(),
        report.encoding.encoded_columns
    );
    if let Some(target) = &report.encoding.target {
        println!("Target Column: {}", target);
    }
    println!();

    if !report.rename_collisions.is_empty() {
        println!("Rename Collisions:");
        for collision in &report.rename_collisions {
            println!("  ! {} <- {:?}", collision.canonical, collision.originals);
        }
        println!();
    }

    if !report.unknown_values.is_empty() {
        println!("Unclassified Values:");
        for (column, values) in &report.unknown_values {
            println!("  - {}: {} value(s)", column, values.len());
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
