//! Column-label and free-text normalization.
//!
//! Folding goes through an explicit substitution table first and only then
//! through Unicode decomposition, so the result does not depend on the host
//! locale.

use crate::error::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static NON_IDENTIFIER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex: identifier run"));

/// Letters whose base form is not reachable through decomposition alone
/// (dotless i, cedilla/breve letters handled uniformly, ligatures, stroked letters).
const FOLD_TABLE: &[(char, &str)] = &[
    ('ı', "i"),
    ('İ', "i"),
    ('ş', "s"),
    ('Ş', "s"),
    ('ğ', "g"),
    ('Ğ', "g"),
    ('ü', "u"),
    ('Ü', "u"),
    ('ö', "o"),
    ('Ö', "o"),
    ('ç', "c"),
    ('Ç', "c"),
    ('ß', "ss"),
    ('æ', "ae"),
    ('Æ', "ae"),
    ('ø', "o"),
    ('Ø', "o"),
    ('đ', "d"),
    ('Đ', "d"),
    ('ł', "l"),
    ('Ł', "l"),
];

/// Fold, decompose, strip combining marks and lowercase.
fn fold_to_ascii_lower(text: &str) -> String {
    let mut substituted = String::with_capacity(text.len());
    for ch in text.chars() {
        match FOLD_TABLE.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => substituted.push_str(to),
            None => substituted.push(ch),
        }
    }

    substituted
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Derive the canonical column name for a raw label.
///
/// ```rust,ignore
/// assert_eq!(normalize_identifier("Ekran / Ekran Boyutu"), "ekran_ekran_boyutu");
/// assert_eq!(normalize_identifier("Hızlı Şarj Gücü (Maks.)"), "hizli_sarj_gucu_maks");
/// ```
pub fn normalize_identifier(text: &str) -> String {
    let folded = fold_to_ascii_lower(text);
    let replaced = NON_IDENTIFIER_RUN.replace_all(&folded, "_");
    replaced.trim_matches('_').to_string()
}

/// Normalize a free-text value into space-separated lowercase ASCII words.
///
/// Used before classification so that value comparisons are locale-insensitive.
pub fn normalize_text_value(text: &str) -> String {
    let folded = fold_to_ascii_lower(text);
    let replaced = NON_IDENTIFIER_RUN.replace_all(&folded, " ");
    replaced.trim().to_string()
}

/// Several raw labels that normalized to the same canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameCollision {
    pub canonical: String,
    /// Raw labels in input order; the last one supplied the data.
    pub originals: Vec<String>,
}

/// Audit record of a table-level rename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameReport {
    /// Every original label mapped to its canonical name.
    pub renamed: BTreeMap<String, String>,
    pub collisions: Vec<RenameCollision>,
}

impl RenameReport {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}

/// Replace every column label with its canonical name.
///
/// Labels that collide are merged last-write-wins: the merged column keeps the
/// position of the first label and the data of the last one.
pub fn rename_columns(df: DataFrame) -> Result<(DataFrame, RenameReport)> {
    let mut report = RenameReport::default();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for column in df.get_columns() {
        let original = column.name().to_string();
        let canonical = normalize_identifier(&original);
        report.renamed.insert(original.clone(), canonical.clone());
        groups.entry(canonical.clone()).or_default().push(original);

        let renamed = column.clone().with_name(canonical.as_str().into());
        match positions.get(&canonical) {
            Some(&idx) => columns[idx] = renamed,
            None => {
                positions.insert(canonical, columns.len());
                columns.push(renamed);
            }
        }
    }

    for (canonical, originals) in groups {
        if originals.len() > 1 {
            warn!(
                "Columns {:?} all normalize to '{}'; keeping the last one",
                originals, canonical
            );
            report.collisions.push(RenameCollision {
                canonical,
                originals,
            });
        }
    }

    Ok((DataFrame::new(columns)?, report))
}
