//! C2 — Quantity parser.
//!
//! Turns the free-text `qty_value_original` field into `{min, max, is_range, approx,
//! precision}`. A recipe markup lexer would parse these same shapes (plain numbers,
//! fractions, mixed numbers, ranges) token-by-token off a stream built for a whole
//! document; our input is always a single, already-isolated field, so this is a
//! plain string-level parser instead -- regexes compiled once via `once_cell` so
//! every row reuses the same compiled patterns rather than paying regex
//! compilation cost per row.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{RowReport, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QtyPrecisionCode {
    Integer,
    Decimal,
    Fraction,
    Mixed,
    Range,
    Text,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParsedQuantity {
    pub qty_min: Option<f64>,
    pub qty_max: Option<f64>,
    pub qty_is_range: bool,
    pub qty_approx_flag: bool,
    pub qty_precision_code: Option<QtyPrecisionCode>,
}

static APPROX_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(about|approximately|approx\.?|around|circa|c\.)\b").unwrap()
});
static TRAILING_PLUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+\s*$").unwrap());

static MIXED_UNICODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([¼-¾⅐-⅞])$").unwrap());
static SINGLE_UNICODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[¼-¾⅐-⅞]$").unwrap());
static MIXED_PLAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[\s-](\d+)\s*/\s*(\d+)$").unwrap());
static FRACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+$").unwrap());
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

fn unicode_fraction_value(c: char) -> Option<f64> {
    Some(match c {
        '\u{00BC}' => 1.0 / 4.0, // ¼
        '\u{00BD}' => 1.0 / 2.0, // ½
        '\u{00BE}' => 3.0 / 4.0, // ¾
        '\u{2150}' => 1.0 / 7.0,
        '\u{2151}' => 1.0 / 9.0,
        '\u{2152}' => 1.0 / 10.0,
        '\u{2153}' => 1.0 / 3.0, // ⅓
        '\u{2154}' => 2.0 / 3.0, // ⅔
        '\u{2155}' => 1.0 / 5.0, // ⅕
        '\u{2156}' => 2.0 / 5.0, // ⅖
        '\u{2157}' => 3.0 / 5.0, // ⅗
        '\u{2158}' => 4.0 / 5.0, // ⅘
        '\u{2159}' => 1.0 / 6.0, // ⅙
        '\u{215A}' => 5.0 / 6.0, // ⅚
        '\u{215B}' => 1.0 / 8.0, // ⅛
        '\u{215C}' => 3.0 / 8.0, // ⅜
        '\u{215D}' => 5.0 / 8.0, // ⅝
        '\u{215E}' => 7.0 / 8.0, // ⅞
        _ => return None,
    })
}

fn text_numeral_table() -> &'static HashMap<&'static str, f64> {
    static TABLE: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
        let mut m = HashMap::new();
        for (i, word) in [
            "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "eleven", "twelve",
        ]
        .iter()
        .enumerate()
        {
            m.insert(*word, i as f64);
        }
        m.insert("half", 0.5);
        m.insert("a half", 0.5);
        m.insert("quarter", 0.25);
        m.insert("a quarter", 0.25);
        m.insert("third", 1.0 / 3.0);
        m.insert("a third", 1.0 / 3.0);
        m.insert("dozen", 12.0);
        m.insert("a dozen", 12.0);
        m.insert("couple", 2.0);
        m.insert("a couple", 2.0);
        m
    });
    &TABLE
}

/// Strip a comma thousands separator only when every group after the first comma
/// is exactly three digits. The `regex` crate has no lookaround, so this is
/// done with a manual split rather than a regex.
fn strip_thousands_separators(s: &str) -> String {
    if !s.contains(',') {
        return s.to_string();
    }
    let parts: Vec<&str> = s.split(',').collect();
    let first_ok = parts[0].chars().all(|c| c.is_ascii_digit())
        && !parts[0].is_empty()
        && parts[0].len() <= 3;
    let rest_ok = parts[1..]
        .iter()
        .all(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_digit()));
    if first_ok && rest_ok && parts.len() > 1 {
        parts.concat()
    } else {
        s.to_string()
    }
}

fn strip_approx_markers(raw: &str) -> (String, bool) {
    let mut flag = false;
    let mut s = raw.to_string();
    if s.contains('~') || s.contains('\u{2248}') {
        flag = true;
        s = s.replace('~', " ").replace('\u{2248}', " ");
    }
    if APPROX_WORD_RE.is_match(&s) {
        flag = true;
        s = APPROX_WORD_RE.replace_all(&s, " ").into_owned();
    }
    if TRAILING_PLUS_RE.is_match(s.trim_end()) {
        flag = true;
        s = TRAILING_PLUS_RE.replace(s.trim_end(), "").into_owned();
    }
    (s.split_whitespace().collect::<Vec<_>>().join(" "), flag)
}

fn parse_single(raw: &str) -> Option<(f64, QtyPrecisionCode)> {
    let s = strip_thousands_separators(raw.trim());
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = MIXED_UNICODE_RE.captures(s) {
        let whole: f64 = caps[1].parse().ok()?;
        let frac = unicode_fraction_value(caps[2].chars().next()?)?;
        return Some((whole + frac, QtyPrecisionCode::Mixed));
    }
    if SINGLE_UNICODE_RE.is_match(s) {
        let frac = unicode_fraction_value(s.chars().next()?)?;
        return Some((frac, QtyPrecisionCode::Fraction));
    }
    if let Some(caps) = MIXED_PLAIN_RE.captures(s) {
        let whole: f64 = caps[1].parse().ok()?;
        let num: f64 = caps[2].parse().ok()?;
        let den: f64 = caps[3].parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some((whole + num / den, QtyPrecisionCode::Mixed));
    }
    if let Some(caps) = FRACTION_RE.captures(s) {
        let num: f64 = caps[1].parse().ok()?;
        let den: f64 = caps[2].parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some((num / den, QtyPrecisionCode::Fraction));
    }
    if DECIMAL_RE.is_match(s) {
        return s.parse().ok().map(|v| (v, QtyPrecisionCode::Decimal));
    }
    if INTEGER_RE.is_match(s) {
        return s.parse().ok().map(|v| (v, QtyPrecisionCode::Integer));
    }
    let lower = s.to_lowercase();
    if let Some(&v) = text_numeral_table().get(lower.as_str()) {
        return Some((v, QtyPrecisionCode::Text));
    }
    None
}

/// Try to split `s` into a range on the given separator, returning the two trimmed
/// sides of the *first* occurrence.
fn split_on(s: &str, sep: &str) -> Option<(String, String)> {
    let idx = s.find(sep)?;
    let (a, b) = s.split_at(idx);
    let b = &b[sep.len()..];
    Some((a.trim().to_string(), b.trim().to_string()))
}

fn has_second_occurrence(s: &str, sep: &str) -> bool {
    s.matches(sep).count() > 1
}

pub fn parse_quantity(raw: Option<&str>, report: &mut RowReport) -> ParsedQuantity {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return ParsedQuantity::default(),
    };

    let (core, approx_flag) = strip_approx_markers(raw);
    if core.is_empty() {
        return ParsedQuantity {
            qty_approx_flag: approx_flag,
            ..Default::default()
        };
    }

    if let Some((v, code)) = parse_single(&core) {
        return ParsedQuantity {
            qty_min: Some(v),
            qty_max: Some(v),
            qty_is_range: false,
            qty_approx_flag: approx_flag,
            qty_precision_code: Some(code),
        };
    }

    // Range separators in priority order: "to" word, en dash, em dash, hyphen.
    // Hyphen is tried last and only reached here because `parse_single` already
    // consumed the "1-1/2" mixed-number reading of a bare hyphen.
    const SEPARATORS: &[&str] = &[" to ", "\u{2013}", "\u{2014}", "-"];
    for sep in SEPARATORS {
        if !core.to_lowercase().contains(&sep.to_lowercase()) {
            continue;
        }
        let multiple = has_second_occurrence(&core.to_lowercase(), &sep.to_lowercase());
        let Some((a, b)) = split_on(&core, sep) else {
            continue;
        };
        let parsed_a = parse_single(&a);
        let parsed_b = parse_single(&b);
        match (parsed_a, parsed_b) {
            (Some((min, _)), Some((max, _))) => {
                if multiple {
                    report.warn(
                        Stage::Quantity,
                        "MULTIPLE_RANGE_SEPARATORS",
                        format!("multiple '{sep}' separators in quantity '{raw}', using first pair"),
                    );
                }
                let (min, max) = if min <= max { (min, max) } else { (max, min) };
                return ParsedQuantity {
                    qty_min: Some(min),
                    qty_max: Some(max),
                    qty_is_range: true,
                    qty_approx_flag: approx_flag,
                    qty_precision_code: Some(QtyPrecisionCode::Range),
                };
            }
            _ => {
                report.warn(
                    Stage::Quantity,
                    "QTY_RANGE_SIDE_INVALID",
                    format!("could not parse both sides of range '{raw}'"),
                );
                return ParsedQuantity {
                    qty_approx_flag: approx_flag,
                    ..Default::default()
                };
            }
        }
    }

    report.warn(
        Stage::Quantity,
        "NO_NUMERIC_QUANTITY",
        format!("could not parse any numeric quantity from '{raw}'"),
    );
    ParsedQuantity {
        qty_approx_flag: approx_flag,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> (ParsedQuantity, RowReport) {
        let mut report = RowReport::new();
        let q = parse_quantity(Some(s), &mut report);
        (q, report)
    }

    #[test]
    fn empty_is_all_null() {
        let (q, report) = parse(" ");
        assert_eq!(q.qty_min, None);
        assert_eq!(q.qty_max, None);
        assert!(report.is_empty());
    }

    #[test]
    fn plain_integer() {
        let (q, _) = parse("2");
        assert_eq!(q.qty_min, Some(2.0));
        assert_eq!(q.qty_max, Some(2.0));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Integer));
        assert!(!q.qty_is_range);
    }

    #[test]
    fn decimal() {
        let (q, _) = parse("2.5");
        assert_eq!(q.qty_min, Some(2.5));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Decimal));
    }

    #[test]
    fn simple_fraction() {
        let (q, _) = parse("1/2");
        assert_eq!(q.qty_min, Some(0.5));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Fraction));
    }

    #[test]
    fn unicode_fraction_eighth() {
        let (q, _) = parse("\u{215B}");
        assert_eq!(q.qty_min, Some(0.125));
    }

    #[test]
    fn mixed_space() {
        let (q, _) = parse("1 1/2");
        assert_eq!(q.qty_min, Some(1.5));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Mixed));
    }

    #[test]
    fn mixed_hyphen() {
        let (q, _) = parse("1-1/2");
        assert_eq!(q.qty_min, Some(1.5));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Mixed));
    }

    #[test]
    fn mixed_unicode_glyph() {
        let (q, _) = parse("1\u{00BD}");
        assert_eq!(q.qty_min, Some(1.5));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Mixed));
    }

    #[test]
    fn range_hyphen() {
        let (q, _) = parse("1-2");
        assert!(q.qty_is_range);
        assert_eq!(q.qty_min, Some(1.0));
        assert_eq!(q.qty_max, Some(2.0));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Range));
    }

    #[test]
    fn range_to_word() {
        let (q, _) = parse("1 to 2");
        assert!(q.qty_is_range);
        assert_eq!(q.qty_min, Some(1.0));
        assert_eq!(q.qty_max, Some(2.0));
    }

    #[test]
    fn range_en_dash() {
        let (q, _) = parse("1\u{2013}2");
        assert!(q.qty_is_range);
    }

    #[test]
    fn range_identical_endpoints() {
        let (q, _) = parse("2-2");
        assert_eq!(q.qty_min, q.qty_max);
    }

    #[test]
    fn approx_marker_tilde() {
        let (q, _) = parse("~2");
        assert!(q.qty_approx_flag);
        assert_eq!(q.qty_min, Some(2.0));
    }

    #[test]
    fn approx_marker_word() {
        let (q, _) = parse("about 2 1/2");
        assert!(q.qty_approx_flag);
        assert_eq!(q.qty_min, Some(2.5));
    }

    #[test]
    fn approx_trailing_plus() {
        let (q, _) = parse("2+");
        assert!(q.qty_approx_flag);
        assert_eq!(q.qty_min, Some(2.0));
    }

    #[test]
    fn thousands_separator_stripped() {
        let (q, _) = parse("1,234");
        assert_eq!(q.qty_min, Some(1234.0));
    }

    #[test]
    fn thousands_separator_not_stripped_when_not_groups_of_three() {
        let (q, report) = parse("1,23");
        assert_eq!(q.qty_min, None);
        assert!(report.codes().any(|c| c == "NO_NUMERIC_QUANTITY"));
    }

    #[test]
    fn text_numeral() {
        let (q, _) = parse("two");
        assert_eq!(q.qty_min, Some(2.0));
        assert_eq!(q.qty_precision_code, Some(QtyPrecisionCode::Text));
    }

    #[test]
    fn text_numeral_half() {
        let (q, _) = parse("half");
        assert_eq!(q.qty_min, Some(0.5));
    }

    #[test]
    fn unparseable_emits_warning() {
        let (q, report) = parse("some amount of");
        assert_eq!(q.qty_min, None);
        assert!(report.codes().any(|c| c == "NO_NUMERIC_QUANTITY"));
    }

    #[test]
    fn range_with_invalid_side_emits_warning() {
        let (q, report) = parse("1-banana");
        assert_eq!(q.qty_min, None);
        assert!(report.codes().any(|c| c == "QTY_RANGE_SIDE_INVALID"));
    }
}
