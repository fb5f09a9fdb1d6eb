//! Cleaning stage: raw text table in, typed canonical table out.
//!
//! This module provides functionality for:
//! - Renaming columns to canonical names
//! - Blank and `nan` cells to null
//! - Target extraction, transform and row filtering
//! - Numeric, boolean, classified and split feature conversion
//!
//! The same [`FeatureCleaner`] runs over a training corpus (kinds inferred
//! from the rules and the data) and over a single inference record (kinds
//! replayed from training).

mod converters;
mod sanitizers;

use crate::config::PipelineConfig;
use crate::error::{FeatureError, Result};
use crate::extractor::UnitRule;
use crate::normalizer::{RenameReport, rename_columns};
use crate::rules::FeatureRules;
use crate::types::{ColumnKinds, FeatureKind};
use crate::utils::{column_names, series_of};
use converters::{
    classify_series, extract_numeric_series, looks_numeric, normalize_text_series,
    parse_boolean_series, split_resolution_series,
};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Output of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    /// Typed frame; the target column, when configured, is still inside.
    pub frame: DataFrame,
    /// Kind of every feature column (the target is not listed).
    pub kinds: ColumnKinds,
    /// Canonical target column name.
    pub target: Option<String>,
    pub renames: RenameReport,
    /// Raw values that fell back to the "other" label, per source column.
    pub unknown_values: BTreeMap<String, Vec<String>>,
    /// Rows dropped because their target was absent.
    pub dropped_rows: usize,
}

/// Where column kinds come from.
enum KindSource<'k> {
    /// Rules, then inference from the data
    Infer,
    /// Kinds recorded by a training run
    Known(&'k ColumnKinds),
}

/// Converts raw listing text into typed canonical columns.
pub struct FeatureCleaner<'a> {
    config: &'a PipelineConfig,
    rules: &'a FeatureRules,
}

impl<'a> FeatureCleaner<'a> {
    pub fn new(config: &'a PipelineConfig, rules: &'a FeatureRules) -> Self {
        Self { config, rules }
    }

    /// Clean a training corpus.
    ///
    /// Fails with [`FeatureError::MissingTargetColumn`] before any conversion
    /// when a target is configured but absent.
    pub fn clean(&self, df: DataFrame) -> Result<CleanedTable> {
        self.clean_internal(df, KindSource::Infer)
    }

    /// Clean inference input using the kinds recorded at training time.
    ///
    /// A target column, if the input carries one, is dropped.
    pub fn clean_known(&self, df: DataFrame, kinds: &ColumnKinds) -> Result<CleanedTable> {
        self.clean_internal(df, KindSource::Known(kinds))
    }

    fn clean_internal(&self, df: DataFrame, source: KindSource<'_>) -> Result<CleanedTable> {
        let training = matches!(source, KindSource::Infer);
        info!(
            "Cleaning {} rows x {} columns ({})",
            df.height(),
            df.width(),
            if training { "training" } else { "inference" }
        );

        // 1. Canonical names
        let (df, renames) = rename_columns(df)?;

        // 2. Blank cells
        let mut df = sanitizers::blank_to_null(df)?;

        // 3. Target
        let target = self.config.canonical_target();
        let mut dropped_rows = 0;
        if let Some(target) = &target {
            let present = df
                .get_column_names()
                .iter()
                .any(|c| c.as_str() == target.as_str());
            match (training, present) {
                (true, false) => return Err(FeatureError::MissingTargetColumn(target.clone())),
                (true, true) => {
                    let (prepared, dropped) = self.prepare_target(df, target)?;
                    df = prepared;
                    dropped_rows = dropped;
                }
                (false, true) => {
                    df = df.drop(target)?;
                }
                (false, false) => {}
            }
        }

        // 4. Excluded columns
        let excluded: Vec<PlSmallStr> = self
            .config
            .canonical_excludes()
            .into_iter()
            .filter(|c| df.get_column_names().iter().any(|n| n.as_str() == c.as_str()))
            .map(|c| c.as_str().into())
            .collect();
        if !excluded.is_empty() {
            debug!("Dropping excluded columns: {:?}", excluded);
            df = df.drop_many(excluded);
        }

        // 5. Typed conversion
        let mut kinds = ColumnKinds::new();
        let mut unknown_values = BTreeMap::new();
        let mut appended: Vec<Series> = Vec::new();
        let mut consumed: Vec<PlSmallStr> = Vec::new();

        for col_name in column_names(&df) {
            if target.as_deref() == Some(col_name.as_str()) {
                continue;
            }
            let series = series_of(&df, &col_name)?;

            if let Some(rule) = self.rules.classified.iter().find(|r| r.column == col_name) {
                let (labels, unknown) = classify_series(&series, &rule.table, &rule.output)?;
                if !unknown.is_empty() {
                    debug!(
                        "{} value(s) in '{}' did not match any rule",
                        unknown.len(),
                        col_name
                    );
                    unknown_values.insert(col_name.clone(), unknown.into_iter().collect());
                }
                kinds.insert(rule.output.clone(), FeatureKind::CategoricalClosed);
                appended.push(labels);
                self.keep_or_consume(&mut df, &col_name, &mut kinds, &mut consumed)?;
                continue;
            }

            if let Some(rule) = self.rules.resolution.iter().find(|r| r.column == col_name) {
                for output in split_resolution_series(&series, rule)? {
                    kinds.insert(output.name().to_string(), FeatureKind::Derived);
                    appended.push(output);
                }
                self.keep_or_consume(&mut df, &col_name, &mut kinds, &mut consumed)?;
                continue;
            }

            let kind = match &source {
                KindSource::Infer => self.infer_kind(&col_name, &series)?,
                KindSource::Known(known) => known
                    .get(&col_name)
                    .copied()
                    .or_else(|| self.rules.declared_kind(&col_name))
                    .unwrap_or(FeatureKind::CategoricalOpen),
            };

            let converted = match kind {
                FeatureKind::Numeric | FeatureKind::Derived => {
                    let rule = self.rules.unit_rule(&col_name).unwrap_or_default();
                    extract_numeric_series(&series, rule)?
                }
                FeatureKind::Boolean => match self.rules.boolean_tokens(&col_name) {
                    Some(tokens) => parse_boolean_series(&series, tokens)?,
                    None => parse_boolean_series(&series, &Default::default())?,
                },
                FeatureKind::CategoricalOpen if self.config.normalize_text_values => {
                    normalize_text_series(&series)?
                }
                FeatureKind::CategoricalOpen | FeatureKind::CategoricalClosed => series,
            };
            debug!("Column '{}' cleaned as {}", col_name, kind);
            df.replace(&col_name, converted)?;
            kinds.insert(col_name, kind);
        }

        if !consumed.is_empty() {
            df = df.drop_many(consumed);
        }
        for series in appended {
            df.with_column(series)?;
        }

        // 6. Include list
        if let Some(include) = &self.config.include_columns {
            df = self.restrict_columns(df, include, target.as_deref(), &mut kinds)?;
        }

        info!(
            "Cleaned table: {} rows x {} columns",
            df.height(),
            df.width()
        );

        Ok(CleanedTable {
            frame: df,
            kinds,
            target,
            renames,
            unknown_values,
            dropped_rows,
        })
    }

    /// Kind of an undeclared column is inferred from its values.
    fn infer_kind(&self, col_name: &str, series: &Series) -> Result<FeatureKind> {
        if let Some(kind) = self.rules.declared_kind(col_name) {
            return Ok(kind);
        }
        if looks_numeric(series)? {
            Ok(FeatureKind::Numeric)
        } else {
            Ok(FeatureKind::CategoricalOpen)
        }
    }

    /// Compound source columns are dropped unless the configuration keeps them,
    /// in which case they stay as free text.
    fn keep_or_consume(
        &self,
        df: &mut DataFrame,
        col_name: &str,
        kinds: &mut ColumnKinds,
        consumed: &mut Vec<PlSmallStr>,
    ) -> Result<()> {
        if self.config.keep_source_columns {
            if self.config.normalize_text_values {
                let normalized = normalize_text_series(&series_of(df, col_name)?)?;
                df.replace(col_name, normalized)?;
            }
            kinds.insert(col_name.to_string(), FeatureKind::CategoricalOpen);
        } else {
            consumed.push(col_name.into());
        }
        Ok(())
    }

    /// Convert the target to numbers, drop rows where it is absent and apply
    /// the configured transform.
    fn prepare_target(&self, df: DataFrame, target: &str) -> Result<(DataFrame, usize)> {
        let mut df = df;
        let rule = self.rules.unit_rule(target).unwrap_or(UnitRule::Decimal);
        let values = extract_numeric_series(&series_of(&df, target)?, rule)?;
        let transform = self.config.target_transform;
        let transformed: Vec<Option<f64>> = values
            .f64()?
            .into_iter()
            .map(|v| v.map(|y| transform.forward(y)))
            .collect();
        df.replace(target, Series::new(target.into(), transformed))?;

        let before = df.height();
        if self.config.drop_missing_target {
            let mask = df.column(target)?.as_materialized_series().is_not_null();
            df = df.filter(&mask)?;
        }
        let dropped = before - df.height();
        if dropped > 0 {
            warn!("Dropped {} rows with no value for target '{}'", dropped, target);
        }
        Ok((df, dropped))
    }

    fn restrict_columns(
        &self,
        df: DataFrame,
        include: &[String],
        target: Option<&str>,
        kinds: &mut ColumnKinds,
    ) -> Result<DataFrame> {
        let present: BTreeSet<String> = column_names(&df).into_iter().collect();
        let mut keep: Vec<String> = Vec::new();
        for name in include {
            let canonical = crate::normalizer::normalize_identifier(name);
            if present.contains(&canonical) {
                if !keep.contains(&canonical) {
                    keep.push(canonical);
                }
            } else {
                warn!("Included column '{}' is not in the cleaned table", canonical);
            }
        }
        if let Some(target) = target
            && present.contains(target)
            && !keep.iter().any(|k| k == target)
        {
            keep.push(target.to_string());
        }

        kinds.retain(|name, _| keep.contains(name));
        Ok(df.select(keep)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetTransform;
    use pretty_assertions::assert_eq;

    fn listing_frame() -> DataFrame {
        df![
            "Ürün Fiyat" => [Some("48.999 TL"), Some("12.499 TL"), None],
            "Ekran Ekran Boyutu" => [Some("6.9 İnç"), Some("6,1 inç"), Some("")],
            "Ağ Bağlantıları 5G" => [Some("Var"), Some("Yok"), None],
            "Temel Donanım Yonga Seti (Chipset)" => [Some("Snapdragon 8 Gen 3"), Some("Tiger T606"), None],
            "Ekran Ekran Çözünürlüğü" => [Some("1080x2400"), None, Some("720 x 1600")],
            "Renk" => [Some("Siyah"), Some("nan"), Some("Mavi")],
            "Çıkış Yılı" => [Some("2024"), Some("2023"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_types_every_column() {
        let config = PipelineConfig::default();
        let rules = FeatureRules::smartphone();
        let cleaned = FeatureCleaner::new(&config, &rules)
            .clean(listing_frame())
            .unwrap();

        let df = &cleaned.frame;
        assert_eq!(df.column("urun_fiyat").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            df.column("ekran_ekran_boyutu").unwrap().f64().unwrap().get(0),
            Some(6.9)
        );
        assert_eq!(df.column("ag_baglantilari_5g").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(
            df.column("temel_donanim_yonga_seti_marka").unwrap().str().unwrap().get(0),
            Some("Qualcomm")
        );
        assert!(df.column("temel_donanim_yonga_seti_chipset").is_err());
        assert!(df.column("ekran_ekran_cozunurlugu").is_err());
        assert_eq!(
            df.column("ekran_piksel_milyon").unwrap().f64().unwrap().get(2),
            Some(1.152)
        );
        assert_eq!(df.column("renk").unwrap().null_count(), 1);

        assert_eq!(cleaned.kinds["cikis_yili"], FeatureKind::Numeric);
        assert_eq!(cleaned.kinds["renk"], FeatureKind::CategoricalOpen);
        assert_eq!(cleaned.kinds["ekran_aspect_orani"], FeatureKind::Derived);
        assert_eq!(
            cleaned.kinds["temel_donanim_yonga_seti_marka"],
            FeatureKind::CategoricalClosed
        );
        assert_eq!(
            cleaned.unknown_values["temel_donanim_yonga_seti_chipset"],
            vec!["Tiger T606".to_string()]
        );
    }

    #[test]
    fn test_benchmark_scores_share_one_scale() {
        let df = df![
            "Temel Donanım AnTuTu Puanı (v10)" => ["697.900 Puan", "2.697.900 Puan", "1.250.000"],
        ]
        .unwrap();
        let config = PipelineConfig::default();
        let rules = FeatureRules::smartphone();
        let cleaned = FeatureCleaner::new(&config, &rules).clean(df).unwrap();

        let scores: Vec<Option<f64>> = cleaned
            .frame
            .column("temel_donanim_antutu_puani_v10")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(scores, vec![Some(697_900.0), Some(2_697_900.0), Some(1_250_000.0)]);
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let config = PipelineConfig::builder()
            .target_column("Fiyat")
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let err = FeatureCleaner::new(&config, &rules)
            .clean(listing_frame())
            .unwrap_err();
        assert!(matches!(err, FeatureError::MissingTargetColumn(ref c) if c == "fiyat"));
    }

    #[test]
    fn test_target_rows_dropped_and_transformed() {
        let config = PipelineConfig::builder()
            .target_column("Ürün Fiyat")
            .target_transform(TargetTransform::Log1p)
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let cleaned = FeatureCleaner::new(&config, &rules)
            .clean(listing_frame())
            .unwrap();

        assert_eq!(cleaned.dropped_rows, 1);
        assert_eq!(cleaned.frame.height(), 2);
        assert_eq!(cleaned.target.as_deref(), Some("urun_fiyat"));
        assert!(!cleaned.kinds.contains_key("urun_fiyat"));
        let y = cleaned.frame.column("urun_fiyat").unwrap().f64().unwrap().get(0).unwrap();
        assert!((y - 48_999f64.ln_1p()).abs() < 1e-9);
    }

    #[test]
    fn test_keep_source_columns() {
        let config = PipelineConfig::builder()
            .keep_source_columns(true)
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let cleaned = FeatureCleaner::new(&config, &rules)
            .clean(listing_frame())
            .unwrap();

        assert!(cleaned.frame.column("ekran_ekran_cozunurlugu").is_ok());
        assert_eq!(
            cleaned.kinds["temel_donanim_yonga_seti_chipset"],
            FeatureKind::CategoricalOpen
        );
    }

    #[test]
    fn test_exclude_and_include() {
        let config = PipelineConfig::builder()
            .exclude_column("Renk")
            .include_columns(["ekran_ekran_boyutu", "renk", "cikis_yili"])
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let cleaned = FeatureCleaner::new(&config, &rules)
            .clean(listing_frame())
            .unwrap();

        assert_eq!(
            column_names(&cleaned.frame),
            vec!["ekran_ekran_boyutu", "cikis_yili"]
        );
        assert_eq!(cleaned.kinds.len(), 2);
    }

    #[test]
    fn test_clean_known_replays_kinds_and_drops_target() {
        let config = PipelineConfig::builder()
            .target_column("urun_fiyat")
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let mut kinds = ColumnKinds::new();
        kinds.insert("cikis_yili".to_string(), FeatureKind::Numeric);

        let record = df![
            "Ürün Fiyat" => ["10.000 TL"],
            "Çıkış Yılı" => ["2022 (Mart)"],
        ]
        .unwrap();
        let cleaned = FeatureCleaner::new(&config, &rules)
            .clean_known(record, &kinds)
            .unwrap();

        assert!(cleaned.frame.column("urun_fiyat").is_err());
        assert_eq!(
            cleaned.frame.column("cikis_yili").unwrap().f64().unwrap().get(0),
            Some(2022.0)
        );
    }

    #[test]
    fn test_normalize_text_values() {
        let config = PipelineConfig::builder()
            .normalize_text_values(true)
            .build()
            .unwrap();
        let rules = FeatureRules::smartphone();
        let df = df!["Renk" => ["Gece Yarısı", "MAVİ"]].unwrap();
        let cleaned = FeatureCleaner::new(&config, &rules).clean(df).unwrap();

        let values: Vec<Option<&str>> = cleaned.frame.column("renk").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("gece yarisi"), Some("mavi")]);
    }
}
