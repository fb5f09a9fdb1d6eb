//! First-match categorical classification against ordered rule tables.
//!
//! A rule table maps free text (chipset names, vendor strings) onto a closed
//! label set. Rules are evaluated in order against the normalized value and
//! the first match wins, so specific rules must be listed before generic ones.

use crate::error::{FeatureError, Result};
use crate::normalizer::normalize_text_value;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Predicate of a single classification rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Regular expression matched anywhere in the normalized value
    Pattern(Regex),
    /// Whole-word keywords; any one of them matches
    Keyword(Vec<String>),
}

impl Matcher {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(normalized),
            Matcher::Keyword(words) => {
                let padded = format!(" {normalized} ");
                words.iter().any(|w| padded.contains(&format!(" {w} ")))
            }
        }
    }
}

/// A labelled rule.
#[derive(Debug, Clone)]
pub struct ClassRule {
    pub label: String,
    pub matcher: Matcher,
}

/// Outcome of classifying one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The input was absent or empty after normalization
    Absent,
    /// A rule matched
    Matched(String),
    /// No rule matched; the caller should record the raw value
    Fallback(String),
}

impl Classification {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Matched(label) | Self::Fallback(label) => Some(label),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

// =============================================================================
// Serializable form
// =============================================================================

/// Serializable matcher, compiled into [`Matcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherSpec {
    Pattern(String),
    Keyword(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRuleSpec {
    pub label: String,
    pub matcher: MatcherSpec,
}

/// Serializable rule table as it appears in a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTableSpec {
    pub rules: Vec<ClassRuleSpec>,
    pub fallback: String,
}

// =============================================================================
// Rule table
// =============================================================================

/// Compiled, immutable rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<ClassRule>,
    fallback: String,
    spec: RuleTableSpec,
}

impl RuleTable {
    /// Compile a rule table. An invalid pattern or an empty label is an error.
    pub fn compile(spec: RuleTableSpec) -> Result<Self> {
        if spec.fallback.trim().is_empty() {
            return Err(FeatureError::InvalidRule {
                table: "<fallback>".to_string(),
                reason: "fallback label must not be empty".to_string(),
            });
        }

        let mut rules = Vec::with_capacity(spec.rules.len());
        for rule in &spec.rules {
            if rule.label.trim().is_empty() {
                return Err(FeatureError::InvalidRule {
                    table: spec.fallback.clone(),
                    reason: "rule label must not be empty".to_string(),
                });
            }
            let matcher = match &rule.matcher {
                MatcherSpec::Pattern(pattern) => {
                    let re = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| FeatureError::InvalidRule {
                            table: rule.label.clone(),
                            reason: e.to_string(),
                        })?;
                    Matcher::Pattern(re)
                }
                MatcherSpec::Keyword(words) => Matcher::Keyword(
                    words
                        .iter()
                        .map(|w| normalize_text_value(w))
                        .filter(|w| !w.is_empty())
                        .collect(),
                ),
            };
            rules.push(ClassRule {
                label: rule.label.clone(),
                matcher,
            });
        }

        Ok(Self {
            rules,
            fallback: spec.fallback.clone(),
            spec,
        })
    }

    pub fn rules(&self) -> &[ClassRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Every label this table can produce, rules first, fallback last.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::with_capacity(self.rules.len() + 1);
        for rule in &self.rules {
            if !labels.contains(&rule.label.as_str()) {
                labels.push(&rule.label);
            }
        }
        if !labels.contains(&self.fallback.as_str()) {
            labels.push(&self.fallback);
        }
        labels
    }

    pub fn classify(&self, raw: Option<&str>) -> Classification {
        classify(raw, self)
    }
}

impl TryFrom<RuleTableSpec> for RuleTable {
    type Error = FeatureError;

    fn try_from(spec: RuleTableSpec) -> Result<Self> {
        Self::compile(spec)
    }
}

impl From<RuleTable> for RuleTableSpec {
    fn from(table: RuleTable) -> Self {
        table.spec
    }
}

impl Serialize for RuleTable {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.spec.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let spec = RuleTableSpec::deserialize(deserializer)?;
        RuleTable::compile(spec).map_err(serde::de::Error::custom)
    }
}

/// Classify one raw cell against a rule table.
pub fn classify(raw: Option<&str>, table: &RuleTable) -> Classification {
    let Some(raw) = raw else {
        return Classification::Absent;
    };
    let normalized = normalize_text_value(raw);
    if normalized.is_empty() {
        return Classification::Absent;
    }

    table
        .rules
        .iter()
        .find(|rule| rule.matcher.matches(&normalized))
        .map(|rule| Classification::Matched(rule.label.clone()))
        .unwrap_or_else(|| Classification::Fallback(table.fallback.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pattern(label: &str, re: &str) -> ClassRuleSpec {
        ClassRuleSpec {
            label: label.to_string(),
            matcher: MatcherSpec::Pattern(re.to_string()),
        }
    }

    fn keyword(label: &str, words: &[&str]) -> ClassRuleSpec {
        ClassRuleSpec {
            label: label.to_string(),
            matcher: MatcherSpec::Keyword(words.iter().map(|w| w.to_string()).collect()),
        }
    }

    fn table(rules: Vec<ClassRuleSpec>) -> RuleTable {
        RuleTable::compile(RuleTableSpec {
            rules,
            fallback: "Other".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        // "samsung exynos" matches both rules
        let specific_first = table(vec![
            pattern("Samsung Exynos", r"\bexynos\b"),
            pattern("Samsung", r"\bsamsung\b"),
        ]);
        let generic_first = table(vec![
            pattern("Samsung", r"\bsamsung\b"),
            pattern("Samsung Exynos", r"\bexynos\b"),
        ]);

        assert_eq!(
            specific_first.classify(Some("Samsung Exynos 2400")),
            Classification::Matched("Samsung Exynos".to_string())
        );
        assert_eq!(
            generic_first.classify(Some("Samsung Exynos 2400")),
            Classification::Matched("Samsung".to_string())
        );
    }

    #[test]
    fn test_non_overlapping_rules_are_order_independent() {
        let forward = table(vec![
            pattern("Qualcomm", r"\bsnapdragon\b"),
            keyword("MediaTek", &["dimensity", "helio"]),
        ]);
        let backward = table(vec![
            keyword("MediaTek", &["dimensity", "helio"]),
            pattern("Qualcomm", r"\bsnapdragon\b"),
        ]);

        for raw in ["Snapdragon 8 Gen 3", "Dimensity 9300", "Helio G99", "Kirin 9000"] {
            assert_eq!(forward.classify(Some(raw)), backward.classify(Some(raw)), "input {raw:?}");
        }
    }

    #[test]
    fn test_unmatched_falls_back() {
        let t = table(vec![pattern("Apple", r"\bbionic\b")]);
        let result = t.classify(Some("Tiger T606"));
        assert_eq!(result, Classification::Fallback("Other".to_string()));
        assert!(result.is_fallback());
        assert_eq!(result.label(), Some("Other"));
    }

    #[test]
    fn test_absent_is_never_fallback() {
        let t = table(vec![pattern("Apple", r"\bbionic\b")]);
        assert_eq!(t.classify(None), Classification::Absent);
        assert_eq!(t.classify(Some("   ")), Classification::Absent);
        assert_eq!(t.classify(Some("--")), Classification::Absent);
        assert_eq!(t.classify(None).label(), None);
    }

    #[test]
    fn test_keyword_matches_whole_words_only() {
        let t = table(vec![keyword("Google Tensor", &["tensor"])]);
        assert!(matches!(t.classify(Some("Google Tensor G3")), Classification::Matched(_)));
        assert!(t.classify(Some("Tensorflow Lite")).is_fallback());
    }

    #[test]
    fn test_matching_uses_normalized_value() {
        let t = table(vec![pattern("MediaTek", r"\bmedia\s*tek\b")]);
        assert_eq!(
            t.classify(Some("MEDİA-TEK Dimensity")),
            Classification::Matched("MediaTek".to_string())
        );
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = RuleTable::compile(RuleTableSpec {
            rules: vec![pattern("Broken", r"(unclosed")],
            fallback: "Other".to_string(),
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RULE");
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_serde_roundtrip_through_spec() {
        let json = r#"{
            "rules": [
                {"label": "Apple", "matcher": {"pattern": "\\bbionic\\b"}},
                {"label": "Unisoc", "matcher": {"keyword": ["unisoc", "spreadtrum"]}}
            ],
            "fallback": "Other"
        }"#;
        let t: RuleTable = serde_json::from_str(json).unwrap();
        assert_eq!(t.labels(), vec!["Apple", "Unisoc", "Other"]);
        assert_eq!(
            t.classify(Some("Spreadtrum SC9863A")),
            Classification::Matched("Unisoc".to_string())
        );

        let back: RuleTableSpec = serde_json::from_str(&serde_json::to_string(&t).unwrap()).unwrap();
        assert_eq!(back.rules.len(), 2);
    }
}
