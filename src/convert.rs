//! C9 — SI converter.
//!
//! Final arithmetic producing canonical numeric values, using the closed
//! conversion tables in [`crate::constants`]. Dispatches on a unit pair and
//! multiplies by a looked-up factor; the density-bridge branches extend that
//! same dispatch shape to cross dimensions.

use crate::constants::{mass_to_g, snap, volume_to_ml};
use crate::dimension::{BridgeRequired, CanonicalUnit};
use crate::units::UnitEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConversionPath {
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "mass→mass")]
    MassToMass,
    #[serde(rename = "vol→vol")]
    VolToVol,
    #[serde(rename = "vol→mass via density")]
    VolToMassViaDensity,
    #[serde(rename = "mass→vol via density")]
    MassToVolViaDensity,
}

impl std::fmt::Display for ConversionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConversionPath::Count => "count",
            ConversionPath::MassToMass => "mass\u{2192}mass",
            ConversionPath::VolToVol => "vol\u{2192}vol",
            ConversionPath::VolToMassViaDensity => "vol\u{2192}mass via density",
            ConversionPath::MassToVolViaDensity => "mass\u{2192}vol via density",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertResult {
    pub canonical_qty_min: Option<f64>,
    pub canonical_qty_max: Option<f64>,
    pub canonical_qty: Option<f64>,
    pub conversion_path: Option<ConversionPath>,
}

/// Convert `(qty_min, qty_max)` through the closed conversion table. Returns
/// `None` fields (but still a best-effort `conversion_path`, if determinable)
/// when a required input -- the unit, or a bridging density -- is missing;
/// callers must check `bridge_inputs_ready` upstream rather than infer it from
/// this result.
pub fn convert(
    canonical_unit: Option<CanonicalUnit>,
    bridge_required: BridgeRequired,
    unit_enum: Option<UnitEnum>,
    density_g_per_ml: Option<f64>,
    qty_min: Option<f64>,
    qty_max: Option<f64>,
) -> ConvertResult {
    let (Some(canonical_unit), Some(min), Some(max)) = (canonical_unit, qty_min, qty_max) else {
        return ConvertResult::default();
    };

    let (factor, path): (f64, ConversionPath) = match (canonical_unit, bridge_required) {
        (CanonicalUnit::Ea, BridgeRequired::None) => (1.0, ConversionPath::Count),
        (CanonicalUnit::G, BridgeRequired::None) => {
            let Some(unit) = unit_enum else { return ConvertResult::default() };
            let Some(f) = mass_to_g(unit) else { return ConvertResult::default() };
            (f, ConversionPath::MassToMass)
        }
        (CanonicalUnit::Ml, BridgeRequired::None) => {
            let Some(unit) = unit_enum else { return ConvertResult::default() };
            let Some(f) = volume_to_ml(unit) else { return ConvertResult::default() };
            (f, ConversionPath::VolToVol)
        }
        (CanonicalUnit::G, BridgeRequired::VolToMass) => {
            let (Some(unit), Some(density)) = (unit_enum, density_g_per_ml) else {
                return ConvertResult::default();
            };
            let Some(vol_factor) = volume_to_ml(unit) else { return ConvertResult::default() };
            (vol_factor * density, ConversionPath::VolToMassViaDensity)
        }
        (CanonicalUnit::Ml, BridgeRequired::MassToVol) => {
            let (Some(unit), Some(density)) = (unit_enum, density_g_per_ml) else {
                return ConvertResult::default();
            };
            if density <= 0.0 {
                return ConvertResult::default();
            }
            let Some(mass_factor) = mass_to_g(unit) else { return ConvertResult::default() };
            (mass_factor / density, ConversionPath::MassToVolViaDensity)
        }
        _ => return ConvertResult::default(),
    };

    let canonical_min = snap(min * factor);
    let canonical_max = snap(max * factor);
    let midpoint = snap((canonical_min + canonical_max) / 2.0);

    ConvertResult {
        canonical_qty_min: Some(canonical_min),
        canonical_qty_max: Some(canonical_max),
        canonical_qty: Some(midpoint),
        conversion_path: Some(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_passthrough() {
        let r = convert(Some(CanonicalUnit::Ea), BridgeRequired::None, None, None, Some(2.0), Some(2.0));
        assert_eq!(r.canonical_qty, Some(2.0));
        assert_eq!(r.conversion_path, Some(ConversionPath::Count));
    }

    #[test]
    fn mass_to_mass() {
        let r = convert(
            Some(CanonicalUnit::G),
            BridgeRequired::None,
            Some(UnitEnum::G),
            None,
            Some(200.0),
            Some(200.0),
        );
        assert_eq!(r.canonical_qty, Some(200.0));
        assert_eq!(r.conversion_path, Some(ConversionPath::MassToMass));
    }

    #[test]
    fn vol_to_vol_cup() {
        let r = convert(
            Some(CanonicalUnit::Ml),
            BridgeRequired::None,
            Some(UnitEnum::Cup),
            None,
            Some(0.5),
            Some(0.5),
        );
        assert!((r.canonical_qty.unwrap() - 118.294_118_25).abs() < 1e-6);
    }

    #[test]
    fn vol_to_mass_via_density() {
        let r = convert(
            Some(CanonicalUnit::G),
            BridgeRequired::VolToMass,
            Some(UnitEnum::Cup),
            Some(0.528),
            Some(1.0),
            Some(1.0),
        );
        assert!((r.canonical_qty.unwrap() - 124.918_556_88).abs() < 1e-3);
        assert_eq!(r.conversion_path, Some(ConversionPath::VolToMassViaDensity));
    }

    #[test]
    fn missing_density_yields_no_canonical_values() {
        let r = convert(Some(CanonicalUnit::G), BridgeRequired::VolToMass, Some(UnitEnum::Cup), None, Some(1.0), Some(1.0));
        assert_eq!(r.canonical_qty, None);
    }

    #[test]
    fn lb_to_g() {
        let r = convert(
            Some(CanonicalUnit::G),
            BridgeRequired::None,
            Some(UnitEnum::Lb),
            None,
            Some(0.5),
            Some(0.5),
        );
        assert!((r.canonical_qty.unwrap() - 226.796_185).abs() < 1e-6);
    }

    #[test]
    fn range_midpoint() {
        let r = convert(
            Some(CanonicalUnit::Ml),
            BridgeRequired::None,
            Some(UnitEnum::Tsp),
            None,
            Some(1.0),
            Some(2.0),
        );
        assert!((r.canonical_qty_min.unwrap() - 4.928_921_593_75).abs() < 1e-9);
        assert!((r.canonical_qty_max.unwrap() - 9.857_843_187_5).abs() < 1e-9);
        assert!((r.canonical_qty.unwrap() - 7.393_382_390_625).abs() < 1e-9);
    }
}
