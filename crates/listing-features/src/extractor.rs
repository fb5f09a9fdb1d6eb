//! Unit-aware numeric extraction and boolean token parsing.
//!
//! Cells such as `"8.75 mm"`, `"4832 mAh"` or `"2.697.900 Puan"` carry one
//! magnitude mixed with units and locale punctuation. Extraction never fails:
//! text without digits is absent, never zero.

use crate::normalizer::normalize_text_value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.?\d+").expect("Invalid regex: number"));

static DIGIT_DOT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d.]*").expect("Invalid regex: digit run"));

/// How `.` is interpreted inside a numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRule {
    /// `.` is a decimal point unless the first number carries more than one of them
    #[default]
    Decimal,
    /// `.` is always a thousands separator; `,` is the decimal mark (prices)
    Grouped,
}

/// Extract the first number from unit-bearing text.
///
/// Within the first run of digits and dots, more than one `.` means the dots
/// are thousands separators and they are removed before matching. This is a
/// heuristic: `"1.5.3"` parses as `153`.
///
/// ```rust,ignore
/// assert_eq!(extract_number("8.75 mm"), Some(8.75));
/// assert_eq!(extract_number("2.697.900 Puan"), Some(2_697_900.0));
/// assert_eq!(extract_number("6,1 inç"), Some(6.1));
/// assert_eq!(extract_number("yok"), None);
/// ```
pub fn extract_number(raw: &str) -> Option<f64> {
    extract_with_rule(raw, UnitRule::Decimal)
}

/// Extract a number using an explicit unit rule.
pub fn extract_with_rule(raw: &str, rule: UnitRule) -> Option<f64> {
    let text = match rule {
        UnitRule::Decimal => strip_grouping_dots(raw),
        UnitRule::Grouped => raw.replace('.', ""),
    };
    let text = text.replace(',', ".");

    NUMBER
        .find(&text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Remove the dots of the first digit run when it holds more than one.
fn strip_grouping_dots(raw: &str) -> String {
    match DIGIT_DOT_RUN.find(raw) {
        Some(run) if run.as_str().matches('.').count() > 1 => {
            let mut text = String::with_capacity(raw.len());
            text.push_str(&raw[..run.start()]);
            text.push_str(&run.as_str().replace('.', ""));
            text.push_str(&raw[run.end()..]);
            text
        }
        _ => raw.to_string(),
    }
}

/// True when the whole cell is a plain number (optionally signed, one `.` or `,`).
///
/// Used to recognise undeclared numeric columns. Every such value extracts to
/// the same number through [`extract_number`].
pub fn is_plain_number(raw: &str) -> bool {
    static PLAIN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[-+]?\d*[.,]?\d+$").expect("Invalid regex: plain number"));
    PLAIN.is_match(raw.trim())
}

// =============================================================================
// Boolean tokens
// =============================================================================

/// Localized true/false tokens for a boolean column.
///
/// Tokens are compared after value normalization, so `"Var"`, `"VAR"` and
/// `" var "` are the same token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanTokens {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl Default for BooleanTokens {
    fn default() -> Self {
        Self {
            truthy: ["var", "evet", "yes", "true", "1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            falsy: ["yok", "hayir", "no", "false", "0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BooleanTokens {
    /// Parse a raw cell. Unknown tokens are absent.
    pub fn parse(&self, raw: &str) -> Option<bool> {
        let token = normalize_text_value(raw);
        if token.is_empty() {
            return None;
        }
        if self.truthy.iter().any(|t| normalize_text_value(t) == token) {
            Some(true)
        } else if self.falsy.iter().any(|t| normalize_text_value(t) == token) {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_units() {
        assert_eq!(extract_number("8.75 mm"), Some(8.75));
        assert_eq!(extract_number("4832 mAh"), Some(4832.0));
        assert_eq!(extract_number("3 nm"), Some(3.0));
        assert_eq!(extract_number("6.9 İnç"), Some(6.9));
        assert_eq!(extract_number("120 Hz"), Some(120.0));
    }

    #[test]
    fn test_extract_comma_decimal() {
        assert_eq!(extract_number("6,1 inç"), Some(6.1));
        assert_eq!(extract_number("0,5"), Some(0.5));
    }

    #[test]
    fn test_extract_signed_values() {
        assert_eq!(extract_number("-3.5 dB"), Some(-3.5));
        assert_eq!(extract_number("+12"), Some(12.0));
        assert_eq!(extract_number(".5 mm"), Some(0.5));
    }

    #[test]
    fn test_extract_thousands_separators() {
        assert_eq!(extract_number("2.697.900 Puan"), Some(2_697_900.0));
        assert_eq!(extract_number("1.234.567"), Some(1_234_567.0));
    }

    #[test]
    fn test_extract_documented_misparse() {
        // a small decimal with a stray dot is read as grouped digits
        assert_eq!(extract_number("1.5.3"), Some(153.0));
    }

    #[test]
    fn test_extract_only_first_number() {
        assert_eq!(extract_number("50 MP + 12 MP"), Some(50.0));
        assert_eq!(extract_number("Android 14"), Some(14.0));
    }

    #[test]
    fn test_extract_no_digits_is_absent() {
        assert_eq!(extract_number(""), None);
        assert_eq!(extract_number("yok"), None);
        assert_eq!(extract_number("Belirtilmemiş"), None);
        assert_eq!(extract_number("mm."), None);
    }

    #[test]
    fn test_extract_keeps_integer_part() {
        for (raw, leading) in [("4832 mAh", 4832.0), ("8.75 mm", 8.0), ("256 GB", 256.0)] {
            let value = extract_number(raw).unwrap();
            assert_eq!(value.trunc(), leading, "input {raw:?}");
        }
    }

    #[test]
    fn test_grouped_rule() {
        assert_eq!(extract_with_rule("48.999 TL", UnitRule::Grouped), Some(48_999.0));
        assert_eq!(extract_with_rule("1.299,90 TL", UnitRule::Grouped), Some(1_299.9));
        assert_eq!(extract_with_rule("TL", UnitRule::Grouped), None);
        assert_eq!(extract_with_rule("48.999 TL", UnitRule::Decimal), Some(48.999));
    }

    #[test]
    fn test_is_plain_number() {
        assert!(is_plain_number("2023"));
        assert!(is_plain_number(" -4.5 "));
        assert!(is_plain_number("6,1"));
        assert!(!is_plain_number("6.1 inç"));
        assert!(!is_plain_number("1e5"));
        assert!(!is_plain_number(""));
    }

    #[test]
    fn test_boolean_tokens() {
        let tokens = BooleanTokens::default();
        assert_eq!(tokens.parse("Var"), Some(true));
        assert_eq!(tokens.parse(" YOK "), Some(false));
        assert_eq!(tokens.parse("Hayır"), Some(false));
        assert_eq!(tokens.parse("belki"), None);
        assert_eq!(tokens.parse(""), None);
    }
}
