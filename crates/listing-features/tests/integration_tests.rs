//! Integration tests for the listing feature pipeline.
//!
//! These tests run the training path over CSV fixtures and then score single
//! records through the inference path.

use listing_features::utils::{column_names, read_text_csv};
use listing_features::{
    EncodingReport, EncodingStrategy, FeatureError, FeatureKind, FeatureRules, FeatureSchema,
    Pipeline, PipelineConfig, PipelineOutput, RawRecord, ReportGenerator, TargetTransform,
};
use polars::prelude::*;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    read_text_csv(fixtures_path().join(filename)).expect("Failed to read CSV fixture")
}

fn price_config() -> listing_features::PipelineConfigBuilder {
    PipelineConfig::builder()
        .target_column("Ürün Fiyat")
        .exclude_column("Ürün Puan")
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::builder().config(config).build().unwrap()
}

fn trained() -> (Pipeline, PipelineOutput) {
    let pipeline = pipeline(price_config().build().unwrap());
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();
    (pipeline, output)
}

fn value(df: &DataFrame, column: &str) -> f64 {
    df.column(column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .get(0)
        .unwrap()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("listing_features_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================================
// Training Path
// ============================================================================

#[test]
fn test_full_pipeline_phones() {
    let (_, output) = trained();
    let encoded = output.encoded.as_ref().unwrap();
    let schema = output.schema().unwrap();

    // the listing without a price is gone
    assert_eq!(output.cleaned.dropped_rows, 1);
    assert_eq!(encoded.frame.height(), 5);

    let columns = column_names(&encoded.frame);
    assert_eq!(columns.last().map(String::as_str), Some("urun_fiyat"));
    assert!(!schema.contains("urun_fiyat"));
    assert!(!schema.contains("urun_puan"));
    assert!(!schema.contains("ekran_ekran_cozunurlugu"));
    assert!(!schema.contains("temel_donanim_yonga_seti_chipset"));

    for expected in [
        "ekran_ekran_boyutu",
        "kablosuz_baglantilar_nfc",
        "ag_baglantilari_5g",
        "tasarim_agirlik",
        "tasarim_agirlik__missing",
        "ekran_cozunurluk_genislik",
        "ekran_piksel_milyon",
        "ekran_cozunurluk_genislik__missing",
        "temel_donanim_yonga_seti_marka_Apple",
        "temel_donanim_yonga_seti_marka_Unisoc",
        "temel_donanim_yonga_seti_marka_Other",
        "renk_Siyah",
        "renk___missing__",
    ] {
        assert!(schema.contains(expected), "schema lacks {expected}");
    }
    assert_eq!(schema.columns(), &columns[..columns.len() - 1]);
}

#[test]
fn test_training_statistics() {
    let (_, output) = trained();
    let encoded = output.encoded.as_ref().unwrap();

    let weights: Vec<Option<f64>> = encoded
        .frame
        .column("tasarim_agirlik")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    // median of 174, 192, 195, 201
    assert_eq!(weights[2], Some(193.5));

    let prices: Vec<Option<f64>> = encoded
        .frame
        .column("urun_fiyat")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(prices[0], Some(48999.0));

    let report = &output.report;
    assert_eq!(report.encoding.numeric_imputation_values["tasarim_agirlik"], 193.5);
    assert_eq!(
        report.unknown_values["temel_donanim_yonga_seti_chipset"],
        vec!["Rockchip RK3566"]
    );
    assert_eq!(
        report.feature_kinds["temel_donanim_yonga_seti_marka"],
        FeatureKind::CategoricalClosed
    );
    assert_eq!(report.feature_kinds["renk"], FeatureKind::CategoricalOpen);
    assert_eq!(report.renamed_columns["Ürün Fiyat"], "urun_fiyat");
}

#[test]
fn test_missing_target_column_fails() {
    let pipeline = pipeline(
        PipelineConfig::builder()
            .target_column("Liste Fiyatı")
            .build()
            .unwrap(),
    );
    let err = pipeline.fit(load_csv("phones.csv")).unwrap_err();

    match err {
        FeatureError::MissingTargetColumn(column) => assert_eq!(column, "liste_fiyati"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_ordinal_pipeline() {
    let pipeline = pipeline(
        price_config()
            .encoding(EncodingStrategy::Ordinal)
            .build()
            .unwrap(),
    );
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();
    let encoded = output.encoded.as_ref().unwrap();

    let renk = &encoded.ordinal_mappings["renk"];
    assert_eq!(renk.len(), 4);
    assert!(renk.contains_key("__missing__"));
    assert_eq!(encoded.frame.column("renk").unwrap().dtype(), &DataType::Int32);
    assert!(output.schema().unwrap().contains("temel_donanim_yonga_seti_marka"));
}

#[test]
fn test_keep_source_columns() {
    let pipeline = pipeline(price_config().keep_source_columns(true).build().unwrap());
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();

    assert_eq!(
        output.cleaned.kinds["ekran_ekran_cozunurlugu"],
        FeatureKind::CategoricalOpen
    );
    let schema = output.schema().unwrap();
    assert!(schema.contains("ekran_ekran_cozunurlugu_1080x2400"));
    assert!(schema.contains("ekran_cozunurluk_genislik"));
}

#[test]
fn test_log_target() {
    let pipeline = pipeline(
        price_config()
            .target_transform(TargetTransform::Log1p)
            .build()
            .unwrap(),
    );
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();
    let encoded = output.encoded.as_ref().unwrap();

    let first = encoded.frame.column("urun_fiyat").unwrap().f64().unwrap().get(0).unwrap();
    assert!((first - 48999f64.ln_1p()).abs() < 1e-12);
    assert!((output.report.restore_target(first) - 48999.0).abs() < 1e-6);
}

#[test]
fn test_include_list_keeps_target() {
    let pipeline = pipeline(
        price_config()
            .include_columns(["Renk", "Tasarım Ağırlık"])
            .build()
            .unwrap(),
    );
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();
    assert_eq!(
        column_names(&output.cleaned.frame),
        vec!["renk", "tasarim_agirlik", "urun_fiyat"]
    );
}

#[test]
fn test_custom_rules_file() {
    let dir = temp_dir("rules");
    let path = dir.join("rules.json");
    std::fs::write(
        &path,
        r#"{
            "numeric": [{"column": "Ürün Fiyat", "unit": "grouped"}],
            "boolean": [{"column": "Kablosuz Bağlantılar NFC"}],
            "classified": [{
                "column": "Temel Donanım Yonga Seti (Chipset)",
                "output": "soc_vendor",
                "table": {
                    "rules": [{"label": "Apple", "matcher": {"pattern": "bionic"}}],
                    "fallback": "Other"
                }
            }]
        }"#,
    )
    .unwrap();
    let rules = FeatureRules::load(&path).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    let pipeline = Pipeline::builder()
        .config(price_config().build().unwrap())
        .rules(rules)
        .build()
        .unwrap();
    let output = pipeline.fit(load_csv("phones.csv")).unwrap();
    let schema = output.schema().unwrap();

    assert!(schema.contains("soc_vendor_Apple"));
    assert!(schema.contains("soc_vendor_Other"));
    // undeclared resolution text stays categorical
    assert_eq!(
        output.cleaned.kinds["ekran_ekran_cozunurlugu"],
        FeatureKind::CategoricalOpen
    );
}

// ============================================================================
// Inference Path
// ============================================================================

#[test]
fn test_display_size_with_localized_label() {
    let (pipeline, output) = trained();
    let record = RawRecord::new().with_field("Ekran Ekran Boyutu", Some("6.9 İnç"));
    let prepared = pipeline
        .prepare_record(&record, &output.report, output.schema().unwrap())
        .unwrap();

    assert_eq!(value(&prepared.frame, "ekran_ekran_boyutu"), 6.9);
}

#[test]
fn test_localized_booleans() {
    let (pipeline, output) = trained();
    let schema = output.schema().unwrap();
    let score = |raw: Option<&str>| {
        let record = RawRecord::new().with_field("Kablosuz Bağlantılar NFC", raw);
        let prepared = pipeline.prepare_record(&record, &output.report, schema).unwrap();
        value(&prepared.frame, "kablosuz_baglantilar_nfc")
    };

    assert_eq!(score(Some("Var")), 1.0);
    assert_eq!(score(Some("Yok")), 0.0);
    assert_eq!(score(None), 0.0);
}

#[test]
fn test_resolution_split() {
    let (pipeline, output) = trained();
    let record = RawRecord::new().with_field("Ekran Ekran Çözünürlüğü", Some("1080x2400"));
    let prepared = pipeline
        .prepare_record(&record, &output.report, output.schema().unwrap())
        .unwrap();
    let frame = &prepared.frame;

    assert_eq!(value(frame, "ekran_cozunurluk_genislik"), 1080.0);
    assert_eq!(value(frame, "ekran_cozunurluk_yukseklik"), 2400.0);
    assert!((value(frame, "ekran_piksel_milyon") - 2.592).abs() < 1e-9);
    assert!((value(frame, "ekran_aspect_orani") - 0.45).abs() < 1e-9);
    assert_eq!(value(frame, "ekran_cozunurluk_genislik__missing"), 0.0);
}

#[test]
fn test_record_missing_every_categorical() {
    let (pipeline, output) = trained();
    let schema = output.schema().unwrap();
    let record = RawRecord::new()
        .with_field("Ekran Ekran Boyutu", Some("6.1 inç"))
        .with_field("Tasarım Ağırlık", Some("180 gr"));

    let prepared = pipeline.prepare_record(&record, &output.report, schema).unwrap();
    let frame = &prepared.frame;

    assert_eq!(frame.width(), schema.len());
    assert_eq!(frame.height(), 1);
    for column in schema.columns() {
        let is_dummy = column.starts_with("renk_") || column.starts_with("temel_donanim_yonga_seti_marka_");
        if is_dummy {
            assert_eq!(value(frame, column), 0.0, "{column} should be 0");
        }
    }
    assert!(schema.contains("renk___missing__"));
    // absent numerics are 0 with their indicator raised
    assert_eq!(value(frame, "ekran_cozunurluk_genislik"), 0.0);
    assert_eq!(value(frame, "ekran_cozunurluk_genislik__missing"), 1.0);
    assert_eq!(value(frame, "tasarim_agirlik__missing"), 0.0);
}

#[test]
fn test_unseen_category_sets_no_dummy_and_unknown_field_is_dropped() {
    let (pipeline, output) = trained();
    let record = RawRecord::new()
        .with_field("Renk", Some("Turuncu"))
        .with_field("Kutu İçeriği", Some("Şarj aleti"));
    let prepared = pipeline
        .prepare_record(&record, &output.report, output.schema().unwrap())
        .unwrap();

    assert_eq!(prepared.dropped, vec!["kutu_icerigi"]);
    for column in prepared.frame.get_column_names() {
        if column.starts_with("renk_") {
            assert_eq!(value(&prepared.frame, column), 0.0, "{column} should be 0");
        }
    }
}

#[test]
fn test_json_record_through_persisted_artifacts() {
    let (pipeline, output) = trained();
    let dir = temp_dir("artifacts");
    let report_path = dir.join("report.json");
    let schema_path = dir.join("schema.json");
    ReportGenerator::write_report(&output.report, &report_path).unwrap();
    output.schema().unwrap().save(&schema_path).unwrap();

    let report = EncodingReport::load(&report_path).unwrap();
    let schema = FeatureSchema::load(&schema_path).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    let json = serde_json::json!({
        "Ekran Ekran Boyutu": "6.7 İnç",
        "Temel Donanım Yonga Seti (Chipset)": "Apple A16 Bionic",
        "Ağ Bağlantıları 5G": "Var",
        "Tasarım Ağırlık": 201,
        "Renk": null
    });
    let record = RawRecord::from_json(&json).unwrap();

    let from_disk = pipeline.prepare_record(&record, &report, &schema).unwrap();
    let in_memory = pipeline
        .prepare_record(&record, &output.report, output.schema().unwrap())
        .unwrap();

    assert!(from_disk.frame.equals(&in_memory.frame));
    assert_eq!(value(&from_disk.frame, "temel_donanim_yonga_seti_marka_Apple"), 1.0);
    assert_eq!(value(&from_disk.frame, "ag_baglantilari_5g"), 1.0);
    assert_eq!(value(&from_disk.frame, "tasarim_agirlik"), 201.0);
    // a field sent as null is a known blank, unlike a field left out
    assert_eq!(value(&from_disk.frame, "renk___missing__"), 1.0);
}
