//! C8 — Density bridge.
//!
//! Only runs when C7 set `bridge_required`. A tiered candidate search over the
//! density index with early exit per tier -- one pass per tier, not five
//! independent queries -- then a deterministic rank within the first
//! non-empty tier.

use time::Date;

use crate::error::{RowReport, Stage};
use crate::reference::model::{Density, PackedState};
use crate::reference::ReferenceRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
pub enum BridgeSelectionPath {
    #[serde(rename = "H0_NO_DENSITY")]
    #[strum(serialize = "H0_NO_DENSITY")]
    H0NoDensity,
    #[serde(rename = "H1_EXACT_FORM_PACKED")]
    #[strum(serialize = "H1_EXACT_FORM_PACKED")]
    H1ExactFormPacked,
    #[serde(rename = "H2_EXACT_FORM")]
    #[strum(serialize = "H2_EXACT_FORM")]
    H2ExactForm,
    #[serde(rename = "H3_FORM_GROUP")]
    #[strum(serialize = "H3_FORM_GROUP")]
    H3FormGroup,
    #[serde(rename = "H4_DEFAULT_FORM")]
    #[strum(serialize = "H4_DEFAULT_FORM")]
    H4DefaultForm,
    #[serde(rename = "H5_ANY_FORM")]
    #[strum(serialize = "H5_ANY_FORM")]
    H5AnyForm,
}

pub struct BridgeConfig {
    pub plausible_band: std::ops::RangeInclusive<f64>,
    pub today: Date,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plausible_band: 0.05..=2.0,
            today: crate::reference::today_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BridgeResult {
    pub density_id: Option<String>,
    pub density_g_per_ml: Option<f64>,
    pub bridge_selection_path: BridgeSelectionPath,
    pub bridge_inputs_ready: bool,
}

impl Default for BridgeSelectionPath {
    fn default() -> Self {
        BridgeSelectionPath::H0NoDensity
    }
}

/// Resolve the density to bridge with. `resolved_form_id` may be absent (form
/// resolution can fail independently of the bridge); in that case only H5
/// (any form) can produce a candidate.
pub fn resolve_density(
    ingredient_id: &str,
    resolved_form_id: Option<&str>,
    packed_state_hint: Option<PackedState>,
    repo: &ReferenceRepository,
    config: &BridgeConfig,
    report: &mut RowReport,
) -> BridgeResult {
    let active: Vec<&Density> = repo
        .densities_for(ingredient_id)
        .filter(|d| d.covers(config.today))
        .collect();

    let default_form = repo.default_form_for(ingredient_id);
    let form_group = resolved_form_id.and_then(|f| repo.form_group(f));

    let tiers: Vec<(BridgeSelectionPath, Vec<&Density>)> = vec![
        (
            BridgeSelectionPath::H1ExactFormPacked,
            active
                .iter()
                .copied()
                .filter(|d| {
                    Some(d.form_id.as_str()) == resolved_form_id
                        && packed_state_hint.is_some()
                        && d.packed_state == packed_state_hint
                })
                .collect(),
        ),
        (
            BridgeSelectionPath::H2ExactForm,
            active
                .iter()
                .copied()
                .filter(|d| Some(d.form_id.as_str()) == resolved_form_id)
                .collect(),
        ),
        (
            BridgeSelectionPath::H3FormGroup,
            active
                .iter()
                .copied()
                .filter(|d| form_group.map_or(false, |g| g.contains(&d.form_id)))
                .collect(),
        ),
        (
            BridgeSelectionPath::H4DefaultForm,
            active
                .iter()
                .copied()
                .filter(|d| default_form.as_deref() == Some(d.form_id.as_str()))
                .collect(),
        ),
        (BridgeSelectionPath::H5AnyForm, active.clone()),
    ];

    for (path, mut candidates) in tiers {
        if candidates.is_empty() {
            continue;
        }
        candidates.sort_by(|a, b| {
            b.source_priority
                .cmp(&a.source_priority)
                .then_with(|| b.effective_from.cmp(&a.effective_from))
                .then_with(|| b.quality_score.partial_cmp(&a.quality_score).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.id.cmp(&b.id))
        });
        let chosen = candidates[0];
        return evaluate_choice(chosen, path, resolved_form_id, packed_state_hint, config, report);
    }

    report.error(
        Stage::Bridge,
        "H0_NO_DENSITY",
        format!("no density available for ingredient {ingredient_id}"),
    );
    BridgeResult {
        bridge_selection_path: BridgeSelectionPath::H0NoDensity,
        bridge_inputs_ready: false,
        ..Default::default()
    }
}

fn evaluate_choice(
    chosen: &Density,
    path: BridgeSelectionPath,
    resolved_form_id: Option<&str>,
    packed_state_hint: Option<PackedState>,
    config: &BridgeConfig,
    report: &mut RowReport,
) -> BridgeResult {
    let mut inputs_ready = true;

    if !config.plausible_band.contains(&chosen.g_per_ml) {
        report.error(
            Stage::Bridge,
            "SANITY_RANGE_EDGE",
            format!(
                "density {} ({} g/mL) outside plausible band {:?}",
                chosen.id, chosen.g_per_ml, config.plausible_band
            ),
        );
        inputs_ready = false;
    }
    if packed_state_hint.is_some() && chosen.packed_state != packed_state_hint && Some(chosen.form_id.as_str()) == resolved_form_id {
        report.warn(
            Stage::Bridge,
            "PACKED_STATE_MISMATCH",
            format!("requested packed state not matched by density {}", chosen.id),
        );
    }
    if let Some(temp) = chosen.temp_c {
        if (temp - 20.0).abs() > 10.0 {
            report.warn(
                Stage::Bridge,
                "TEMP_MISMATCH",
                format!("density {} measured at {temp}\u{b0}C, far from 20\u{b0}C reference", chosen.id),
            );
        }
    }

    BridgeResult {
        density_id: Some(chosen.id.clone()),
        density_g_per_ml: Some(chosen.g_per_ml),
        bridge_selection_path: path,
        bridge_inputs_ready: inputs_ready,
    }
}
