//! Typed-feature rule tables.
//!
//! [`FeatureRules`] declares which canonical columns are numeric (and how
//! their units are read), boolean, classified into a closed taxonomy or split
//! into sub-features. It is loaded once per process and passed explicitly to
//! every stage; nothing in the pipeline mutates it.

use crate::classifier::{ClassRuleSpec, MatcherSpec, RuleTable, RuleTableSpec};
use crate::error::{FeatureError, Result, ResultExt};
use crate::extractor::{BooleanTokens, UnitRule};
use crate::normalizer::normalize_identifier;
use crate::types::FeatureKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    #[serde(default)]
    pub unit: UnitRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanColumn {
    pub column: String,
    #[serde(default)]
    pub tokens: BooleanTokens,
}

/// A source column classified into a closed label set written to `output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedColumn {
    pub column: String,
    pub output: String,
    pub table: RuleTable,
}

/// A `W x H` source column split into four derived columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionColumn {
    pub column: String,
    pub width: String,
    pub height: String,
    pub pixel_count: String,
    pub aspect_ratio: String,
}

impl ResolutionColumn {
    /// Output names in the order the splitter produces them.
    pub fn outputs(&self) -> [&str; 4] {
        [
            &self.width,
            &self.height,
            &self.pixel_count,
            &self.aspect_ratio,
        ]
    }
}

/// Immutable rule set for one listing domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureRules {
    pub numeric: Vec<NumericColumn>,
    pub boolean: Vec<BooleanColumn>,
    pub classified: Vec<ClassifiedColumn>,
    pub resolution: Vec<ResolutionColumn>,
}

static_assertions::assert_impl_all!(FeatureRules: Send, Sync);

impl FeatureRules {
    /// Parse a rules document and canonicalize every column name in it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: FeatureRules = serde_json::from_str(json)?;
        let rules = rules.canonicalized();
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rules file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .context(format!("Failed to read rules file {}", path.display()))?;
        Self::from_json_str(&content).map_err(|e| FeatureError::InvalidArtifact {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the rules as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)
            .context(format!("Failed to write rules file {}", path.display()))
    }

    fn canonicalized(mut self) -> Self {
        for rule in &mut self.numeric {
            rule.column = normalize_identifier(&rule.column);
        }
        for rule in &mut self.boolean {
            rule.column = normalize_identifier(&rule.column);
        }
        for rule in &mut self.classified {
            rule.column = normalize_identifier(&rule.column);
            rule.output = normalize_identifier(&rule.output);
        }
        for rule in &mut self.resolution {
            rule.column = normalize_identifier(&rule.column);
            rule.width = normalize_identifier(&rule.width);
            rule.height = normalize_identifier(&rule.height);
            rule.pixel_count = normalize_identifier(&rule.pixel_count);
            rule.aspect_ratio = normalize_identifier(&rule.aspect_ratio);
        }
        self
    }

    /// A column may be declared once, and a derived output must not shadow a
    /// declared source column.
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let declared = self
            .numeric
            .iter()
            .map(|r| r.column.as_str())
            .chain(self.boolean.iter().map(|r| r.column.as_str()))
            .chain(self.classified.iter().map(|r| r.column.as_str()))
            .chain(self.classified.iter().map(|r| r.output.as_str()))
            .chain(self.resolution.iter().map(|r| r.column.as_str()))
            .chain(self.resolution.iter().flat_map(|r| r.outputs()));

        for column in declared {
            if column.is_empty() {
                return Err(FeatureError::InvalidRule {
                    table: "columns".to_string(),
                    reason: "column name is empty after normalization".to_string(),
                });
            }
            if !seen.insert(column) {
                return Err(FeatureError::InvalidRule {
                    table: column.to_string(),
                    reason: "column is declared more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn unit_rule(&self, column: &str) -> Option<UnitRule> {
        self.numeric
            .iter()
            .find(|r| r.column == column)
            .map(|r| r.unit)
    }

    pub fn boolean_tokens(&self, column: &str) -> Option<&BooleanTokens> {
        self.boolean
            .iter()
            .find(|r| r.column == column)
            .map(|r| &r.tokens)
    }

    /// Kind implied by the rules for a column that exists after cleaning.
    pub fn declared_kind(&self, column: &str) -> Option<FeatureKind> {
        if self.unit_rule(column).is_some() {
            Some(FeatureKind::Numeric)
        } else if self.boolean_tokens(column).is_some() {
            Some(FeatureKind::Boolean)
        } else if self.classified.iter().any(|r| r.output == column) {
            Some(FeatureKind::CategoricalClosed)
        } else if self
            .resolution
            .iter()
            .any(|r| r.outputs().contains(&column))
        {
            Some(FeatureKind::Derived)
        } else {
            None
        }
    }

    /// Built-in rules for scraped smartphone listings.
    pub fn smartphone() -> Self {
        let decimal = [
            "ekran_ekran_boyutu",
            "ekran_ekran_yenileme_hizi",
            "batarya_batarya_kapasitesi_tipik",
            "batarya_hizli_sarj_gucu_maks",
            "kamera_kamera_cozunurlugu",
            "kamera_on_kamera_cozunurlugu",
            "kamera_video_fps_degeri",
            "temel_donanim_bellek_ram",
            "temel_donanim_dahili_depolama",
            "temel_donanim_cpu_uretim_teknolojisi",
            "temel_donanim_cpu_cekirdegi",
            "tasarim_kalinlik",
            "tasarim_agirlik",
            "temel_bilgiler_cikis_yili",
            "urun_puan",
        ];
        let grouped = ["urun_fiyat", "temel_donanim_antutu_puani_v10"];
        let boolean = [
            "batarya_kablosuz_sarj",
            "batarya_hizli_sarj",
            "kamera_optik_goruntu_sabitleyici_ois",
            "ozellikler_suya_dayaniklilik",
            "ag_baglantilari_5g",
            "kablosuz_baglantilar_nfc",
        ];

        let numeric = decimal
            .iter()
            .map(|c| (c, UnitRule::Decimal))
            .chain(grouped.iter().map(|c| (c, UnitRule::Grouped)))
            .map(|(column, unit)| NumericColumn {
                column: column.to_string(),
                unit,
            })
            .collect();

        let boolean = boolean
            .iter()
            .map(|column| BooleanColumn {
                column: column.to_string(),
                tokens: BooleanTokens::default(),
            })
            .collect();

        let chipset = RuleTable::compile(chipset_brand_table())
            .expect("built-in chipset rules must compile");

        Self {
            numeric,
            boolean,
            classified: vec![ClassifiedColumn {
                column: "temel_donanim_yonga_seti_chipset".to_string(),
                output: "temel_donanim_yonga_seti_marka".to_string(),
                table: chipset,
            }],
            resolution: vec![ResolutionColumn {
                column: "ekran_ekran_cozunurlugu".to_string(),
                width: "ekran_cozunurluk_genislik".to_string(),
                height: "ekran_cozunurluk_yukseklik".to_string(),
                pixel_count: "ekran_piksel_milyon".to_string(),
                aspect_ratio: "ekran_aspect_orani".to_string(),
            }],
        }
    }
}

/// Chipset vendor taxonomy, most specific first.
fn chipset_brand_table() -> RuleTableSpec {
    let pattern = |label: &str, re: &str| ClassRuleSpec {
        label: label.to_string(),
        matcher: MatcherSpec::Pattern(re.to_string()),
    };
    let keyword = |label: &str, words: &[&str]| ClassRuleSpec {
        label: label.to_string(),
        matcher: MatcherSpec::Keyword(words.iter().map(|w| w.to_string()).collect()),
    };

    RuleTableSpec {
        rules: vec![
            pattern("Apple", r"\bapple\b|\bbionic\b"),
            pattern("Samsung Exynos", r"\bexynoss?\b|\bsamsung\b"),
            pattern("Qualcomm", r"\bqualcomm\b|\bsnapdragon\b"),
            pattern(
                "MediaTek",
                r"\bmediatek\b|\bmedia\s*tek\b|\bdimensity\b|\bhelio\b|\bmtk\b",
            ),
            keyword("Unisoc", &["unisoc", "spreadtrum"]),
            pattern("HiSilicon Kirin", r"\bhisilicon\b|\bkirin\b|\bhuawei\b"),
            keyword("Google Tensor", &["tensor", "google"]),
        ],
        fallback: "Other".to_string(),
    }
}
