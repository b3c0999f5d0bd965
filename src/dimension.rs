//! C7 — Canonical dimension selector.
//!
//! A small decision table: given the original dimension and the resolved form's
//! target dimension, pick `g` / `mL` / `ea` and whether a density bridge is
//! needed. Shaped like a unit-conversion dispatch over a closed match on unit
//! kind rather than a general rule engine.

use crate::error::{RowReport, Stage};
use crate::reference::model::TargetDimension;
use crate::units::Dimension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CanonicalUnit {
    #[serde(rename = "g")]
    G,
    #[serde(rename = "mL")]
    Ml,
    #[serde(rename = "ea")]
    Ea,
}

impl std::fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CanonicalUnit::G => "g",
            CanonicalUnit::Ml => "mL",
            CanonicalUnit::Ea => "ea",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum BridgeRequired {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "vol→mass")]
    VolToMass,
    #[serde(rename = "mass→vol")]
    MassToVol,
}

#[derive(Debug, Clone, Default)]
pub struct DimensionResult {
    pub canonical_unit: Option<CanonicalUnit>,
    pub canonical_dimension_selected: Option<Dimension>,
    pub bridge_required: BridgeRequired,
    /// Set false only when the row must terminate before conversion (special
    /// units, or no original dimension at all).
    pub bridge_inputs_ready: bool,
}

/// Decide the canonical unit and bridge requirement. `form_target` is
/// `None` when no form was resolved (mass/volume rows can still proceed with
/// `target_dimension = Auto` semantics in that case).
pub fn select_dimension(
    original_dimension: Option<Dimension>,
    form_target: Option<TargetDimension>,
    report: &mut RowReport,
) -> DimensionResult {
    let target = form_target.unwrap_or(TargetDimension::Auto);
    match original_dimension {
        None => DimensionResult {
            bridge_inputs_ready: false,
            ..Default::default()
        },
        Some(Dimension::Count) => DimensionResult {
            canonical_unit: Some(CanonicalUnit::Ea),
            canonical_dimension_selected: Some(Dimension::Count),
            bridge_required: BridgeRequired::None,
            bridge_inputs_ready: true,
        },
        Some(Dimension::Special) => {
            report.warn(
                Stage::Dimension,
                "SPECIAL_UNIT_TERMINATES",
                "special units (to-taste, pinch, dash) have no canonical numeric value",
            );
            DimensionResult {
                canonical_unit: None,
                canonical_dimension_selected: Some(Dimension::Special),
                bridge_required: BridgeRequired::None,
                bridge_inputs_ready: false,
            }
        }
        Some(Dimension::Mass) => match target {
            TargetDimension::G | TargetDimension::Auto => DimensionResult {
                canonical_unit: Some(CanonicalUnit::G),
                canonical_dimension_selected: Some(Dimension::Mass),
                bridge_required: BridgeRequired::None,
                bridge_inputs_ready: true,
            },
            TargetDimension::Ml => DimensionResult {
                canonical_unit: Some(CanonicalUnit::Ml),
                canonical_dimension_selected: Some(Dimension::Volume),
                bridge_required: BridgeRequired::MassToVol,
                bridge_inputs_ready: true,
            },
        },
        Some(Dimension::Volume) => match target {
            TargetDimension::Ml | TargetDimension::Auto => DimensionResult {
                canonical_unit: Some(CanonicalUnit::Ml),
                canonical_dimension_selected: Some(Dimension::Volume),
                bridge_required: BridgeRequired::None,
                bridge_inputs_ready: true,
            },
            TargetDimension::G => DimensionResult {
                canonical_unit: Some(CanonicalUnit::G),
                canonical_dimension_selected: Some(Dimension::Mass),
                bridge_required: BridgeRequired::VolToMass,
                bridge_inputs_ready: true,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_never_bridges() {
        let mut report = RowReport::new();
        let r = select_dimension(Some(Dimension::Count), None, &mut report);
        assert_eq!(r.canonical_unit, Some(CanonicalUnit::Ea));
        assert_eq!(r.bridge_required, BridgeRequired::None);
    }

    #[test]
    fn special_terminates() {
        let mut report = RowReport::new();
        let r = select_dimension(Some(Dimension::Special), None, &mut report);
        assert_eq!(r.canonical_unit, None);
        assert!(!r.bridge_inputs_ready);
    }

    #[test]
    fn volume_with_mass_target_bridges() {
        let mut report = RowReport::new();
        let r = select_dimension(Some(Dimension::Volume), Some(TargetDimension::G), &mut report);
        assert_eq!(r.canonical_unit, Some(CanonicalUnit::G));
        assert_eq!(r.bridge_required, BridgeRequired::VolToMass);
    }

    #[test]
    fn mass_with_auto_target_stays_mass() {
        let mut report = RowReport::new();
        let r = select_dimension(Some(Dimension::Mass), Some(TargetDimension::Auto), &mut report);
        assert_eq!(r.canonical_unit, Some(CanonicalUnit::G));
        assert_eq!(r.bridge_required, BridgeRequired::None);
    }
}
