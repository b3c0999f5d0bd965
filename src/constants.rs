//! Closed unit-conversion tables.
//!
//! These multipliers are part of the external contract: they must match byte
//! for byte, so they are plain `const` tables rather than anything loaded from
//! a file. The values themselves, not their layout, are the contract.

use crate::units::UnitEnum;

/// `unit * MASS_TO_G[unit] == grams`.
pub fn mass_to_g(unit: UnitEnum) -> Option<f64> {
    Some(match unit {
        UnitEnum::Mg => 0.001,
        UnitEnum::G => 1.0,
        UnitEnum::Kg => 1000.0,
        UnitEnum::Oz => 28.349_523_125,
        UnitEnum::Lb => 453.592_37,
        _ => return None,
    })
}

/// `unit * VOLUME_TO_ML[unit] == millilitres`.
pub fn volume_to_ml(unit: UnitEnum) -> Option<f64> {
    Some(match unit {
        UnitEnum::Tsp => 4.928_921_593_75,
        UnitEnum::Tbsp => 14.786_764_781_25,
        UnitEnum::FlOz => 29.573_529_562_5,
        UnitEnum::Cup => 236.588_236_5,
        UnitEnum::Pint => 473.176_473,
        UnitEnum::Quart => 946.352_946,
        UnitEnum::Gallon => 3785.411_784,
        UnitEnum::Ml => 1.0,
        UnitEnum::L => 1000.0,
        _ => return None,
    })
}

/// Package-size unit SI mirrors: `oz`->g, `fl oz`->mL, `kg`->g (x1000),
/// `l`->mL (x1000). `g` and `ml` mirror themselves.
pub fn package_unit_to_si(unit: PackageSizeUnit) -> (f64, PackageSiUnit) {
    match unit {
        PackageSizeUnit::Oz => (28.349_523_125, PackageSiUnit::G),
        PackageSizeUnit::FlOz => (29.573_529_562_5, PackageSiUnit::Ml),
        PackageSizeUnit::G => (1.0, PackageSiUnit::G),
        PackageSizeUnit::Kg => (1000.0, PackageSiUnit::G),
        PackageSizeUnit::Ml => (1.0, PackageSiUnit::Ml),
        PackageSizeUnit::L => (1000.0, PackageSiUnit::Ml),
    }
}

/// Snap floating point residue below this threshold to the nearest integer.
pub const SNAP_EPSILON: f64 = 1e-9;

pub fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        value
    }
}

/// Package size unit as recognized by the package parser: a closed set,
/// distinct from [`UnitEnum`] because package sizes never include count or
/// special units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum PackageSizeUnit {
    Oz,
    #[strum(serialize = "FLOZ")]
    FlOz,
    G,
    Kg,
    Ml,
    L,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum PackageSiUnit {
    G,
    #[strum(serialize = "ML")]
    Ml,
}
