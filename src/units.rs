//! C3 — Unit normalizer.
//!
//! Maps free-text unit tokens to the closed [`UnitEnum`] via names, symbols and
//! aliases. The enum is closed by the external contract rather than
//! data-file-driven, so the synonym table is a `once_cell` static map built
//! once at first use.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{RowReport, Stage};

/// The closed unit enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum UnitEnum {
    // Mass
    Mg,
    G,
    Kg,
    Oz,
    Lb,
    // Volume
    Tsp,
    Tbsp,
    FlOz,
    Cup,
    Pint,
    Quart,
    Gallon,
    Ml,
    L,
    // Count
    Ea,
    Egg,
    Clove,
    Slice,
    Piece,
    // Special
    ToTaste,
    Pinch,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
    Special,
}

impl UnitEnum {
    pub fn dimension(self) -> Dimension {
        use UnitEnum::*;
        match self {
            Mg | G | Kg | Oz | Lb => Dimension::Mass,
            Tsp | Tbsp | FlOz | Cup | Pint | Quart | Gallon | Ml | L => Dimension::Volume,
            Ea | Egg | Clove | Slice | Piece => Dimension::Count,
            ToTaste | Pinch | Dash => Dimension::Special,
        }
    }
}

/// Result of normalizing a unit token.
#[derive(Debug, Clone, Default)]
pub struct NormalizedUnit {
    pub unit_enum: Option<UnitEnum>,
    pub original_dimension: Option<Dimension>,
    pub flag_nonstandard_unit: bool,
}

fn synonym_table() -> &'static HashMap<&'static str, UnitEnum> {
    static TABLE: Lazy<HashMap<&'static str, UnitEnum>> = Lazy::new(|| {
        use UnitEnum::*;
        let mut m = HashMap::new();
        let mut add = |keys: &[&'static str], unit: UnitEnum| {
            for k in keys {
                m.insert(*k, unit);
            }
        };
        add(&["mg", "milligram", "milligrams"], Mg);
        add(&["g", "gram", "grams", "gr"], G);
        add(&["kg", "kilogram", "kilograms"], Kg);
        add(&["oz", "ounce", "ounces"], Oz);
        add(&["lb", "lbs", "pound", "pounds"], Lb);
        add(&["tsp", "teaspoon", "teaspoons", "t"], Tsp);
        add(&["tbsp", "tablespoon", "tablespoons", "tbs", "tb"], Tbsp);
        add(
            &["floz", "fl oz", "fl. oz.", "fluid ounce", "fluid ounces"],
            FlOz,
        );
        add(&["cup", "cups", "c"], Cup);
        add(&["pint", "pints", "pt"], Pint);
        add(&["quart", "quarts", "qt"], Quart);
        add(&["gallon", "gallons", "gal"], Gallon);
        add(&["ml", "milliliter", "milliliters", "millilitre", "millilitres"], Ml);
        add(&["l", "liter", "liters", "litre", "litres"], L);
        add(&["ea", "each"], Ea);
        add(&["egg", "eggs"], Egg);
        add(&["clove", "cloves"], Clove);
        add(&["slice", "slices"], Slice);
        add(&["piece", "pieces", "pc", "pcs"], Piece);
        add(&["to taste", "totaste"], ToTaste);
        add(&["pinch", "pinches"], Pinch);
        add(&["dash", "dashes"], Dash);
        m
    });
    &TABLE
}

/// Lowercase, trim, strip trailing periods, collapse whitespace. Detect
/// `fl oz` **before** `oz` so a bare "oz" in a clearly fluid-ounce phrasing is
/// never misclassified as mass.
fn normalize_token(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let collapsed: String = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches('.').to_string()
}

/// Normalize a unit token.
///
/// `has_numeric_quantity` controls the "empty unit with numeric quantity defaults to
/// `EA`" rule -- an empty unit with no quantity at all stays `null`.
pub fn normalize_unit(raw: Option<&str>, has_numeric_quantity: bool) -> NormalizedUnit {
    let token = match raw {
        Some(r) if !r.trim().is_empty() => normalize_token(r),
        _ => {
            if has_numeric_quantity {
                return NormalizedUnit {
                    unit_enum: Some(UnitEnum::Ea),
                    original_dimension: Some(Dimension::Count),
                    flag_nonstandard_unit: false,
                };
            }
            return NormalizedUnit::default();
        }
    };

    // explicit fl oz patterns before generic synonym lookup, so "fl. oz." style
    // spacing variants all resolve to FlOz even if not individually tabulated.
    if is_fluid_ounce(&token) {
        return NormalizedUnit {
            unit_enum: Some(UnitEnum::FlOz),
            original_dimension: Some(Dimension::Volume),
            flag_nonstandard_unit: false,
        };
    }

    match synonym_table().get(token.as_str()) {
        Some(&unit) => NormalizedUnit {
            unit_enum: Some(unit),
            original_dimension: Some(unit.dimension()),
            flag_nonstandard_unit: false,
        },
        None => NormalizedUnit {
            unit_enum: None,
            original_dimension: None,
            flag_nonstandard_unit: true,
        },
    }
}

fn is_fluid_ounce(token: &str) -> bool {
    matches!(
        token,
        "fl oz" | "fl. oz" | "fl. oz." | "fluid ounce" | "fluid ounces" | "floz"
    )
}

/// Validates a raw unit token for structural well-formedness before
/// normalization, used by intake: mixed alphanumeric noise like `"2x!"` is
/// rejected outright rather than silently flagged nonstandard.
pub fn looks_structurally_malformed(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    let has_digit = trimmed.chars().any(|c| c.is_ascii_digit());
    let has_alpha = trimmed.chars().any(|c| c.is_alphabetic());
    let has_junk = trimmed
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace() && c != '.' && c != '\'');
    has_digit && has_alpha && has_junk
}

pub fn report_nonstandard(report: &mut RowReport, token: &str) {
    report.warn(
        Stage::Unit,
        "NONSTANDARD_UNIT",
        format!("unit token '{token}' is not in the closed unit table"),
    );
}
