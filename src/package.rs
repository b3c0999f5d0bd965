//! C4 — Package / variant parser.
//!
//! Pulls a multiplier and a package size out of freeform text such as
//! `"3 x 400 g cans"` or `"(12 oz bag)"`. Regexes compiled once with
//! `once_cell`, the same pattern as [`crate::quantity`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

use crate::constants::{package_unit_to_si, PackageSiUnit, PackageSizeUnit};
use crate::error::{RowReport, Stage};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParsedPackage {
    pub package_multiplier: Option<f64>,
    pub package_size_value: Option<f64>,
    pub package_size_unit: Option<PackageSizeUnit>,
    pub package_size_value_si: Option<f64>,
    pub package_size_unit_si: Option<PackageSiUnit>,
}

static MULTIPLIER_X_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*[x\u{00d7}]\s*(\d+(?:\.\d+)?)\s*([a-z.]+)").unwrap()
});
static MULTIPLIER_PAREN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*\([^)]*?(\d+(?:\.\d+)?)\s*([a-z.]+)[^)]*?\)").unwrap()
});
static SIZE_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)-([a-z.]+)\b").unwrap());
static SIZE_PLAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*([a-z.]+)\b").unwrap());
static SIZE_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((\d+(?:\.\d+)?)\s*([a-z.]+)\)").unwrap());

/// Normalize a raw size-unit token (`"oz"`, `"g."`, `"FL OZ"`, ...) to a
/// [`PackageSizeUnit`], or `None` if it isn't one of the closed package units.
fn parse_size_unit(token: &str) -> Option<PackageSizeUnit> {
    let t = token.trim().trim_end_matches('.').to_lowercase();
    let t = t.replace(' ', "");
    match t.as_str() {
        "oz" | "ounce" | "ounces" => Some(PackageSizeUnit::Oz),
        "floz" => Some(PackageSizeUnit::FlOz),
        "g" | "gram" | "grams" => Some(PackageSizeUnit::G),
        "kg" | "kilogram" | "kilograms" => Some(PackageSizeUnit::Kg),
        "ml" | "milliliter" | "milliliters" => Some(PackageSizeUnit::Ml),
        "l" | "liter" | "liters" => Some(PackageSizeUnit::L),
        _ => PackageSizeUnit::from_str(&t.to_uppercase()).ok(),
    }
}

/// Parse a package/variant description.
///
/// Tries a multiplier pattern first (`N x V unit`, `N (... V unit ...)`); falls
/// back to a bare size pattern (`V-unit`, `V unit`, `(V unit)`); emits
/// `NO_PACKAGE_SIZE_FOUND` when nothing matches and the field was non-empty.
pub fn parse_package(raw: Option<&str>, report: &mut RowReport) -> ParsedPackage {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return ParsedPackage::default(),
    };

    if let Some(caps) = MULTIPLIER_X_RE.captures(raw) {
        if let (Ok(mult), Ok(size), Some(unit)) = (
            caps[1].parse::<f64>(),
            caps[2].parse::<f64>(),
            parse_size_unit(&caps[3]),
        ) {
            report.warn(
                Stage::Package,
                "MULTIPLIER_FOUND",
                format!("parsed multiplier {mult} from '{raw}'"),
            );
            return with_si(Some(mult), size, unit);
        }
    }
    if let Some(caps) = MULTIPLIER_PAREN_RE.captures(raw) {
        if let (Ok(mult), Ok(size), Some(unit)) = (
            caps[1].parse::<f64>(),
            caps[2].parse::<f64>(),
            parse_size_unit(&caps[3]),
        ) {
            report.warn(
                Stage::Package,
                "MULTIPLIER_FOUND",
                format!("parsed multiplier {mult} from '{raw}'"),
            );
            return with_si(Some(mult), size, unit);
        }
    }

    for re in [&*SIZE_PAREN_RE, &*SIZE_HYPHEN_RE, &*SIZE_PLAIN_RE] {
        if let Some(caps) = re.captures(raw) {
            if let (Ok(size), Some(unit)) = (caps[1].parse::<f64>(), parse_size_unit(&caps[2])) {
                if unit == PackageSizeUnit::Oz && looks_like_liquid_context(raw) {
                    report.warn(
                        Stage::Package,
                        "AMBIGUOUS_OZ_LIQUID",
                        format!("'{raw}' uses 'oz' in a liquid-sounding context; kept as mass"),
                    );
                }
                return with_si(None, size, unit);
            }
        }
    }

    report.warn(
        Stage::Package,
        "NO_PACKAGE_SIZE_FOUND",
        format!("could not find a package size in '{raw}'"),
    );
    ParsedPackage::default()
}

fn looks_like_liquid_context(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    ["bottle", "can", "liquid", "juice", "milk", "broth", "stock", "water"]
        .iter()
        .any(|w| lower.contains(w))
        && !lower.contains("fl")
}

fn with_si(multiplier: Option<f64>, size: f64, unit: PackageSizeUnit) -> ParsedPackage {
    let (factor, si_unit) = package_unit_to_si(unit);
    ParsedPackage {
        package_multiplier: multiplier,
        package_size_value: Some(size),
        package_size_unit: Some(unit),
        package_size_value_si: Some(size * factor),
        package_size_unit_si: Some(si_unit),
    }
}
