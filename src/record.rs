//! The row data model: the input row and the append-only canonical record that
//! each stage adds fields to. Keeps a parsed representation alongside the
//! literal source text field-by-field, rather than replacing the source text
//! once parsed.
//!
//! Per-stage warning lists (`qty_parse_warnings`, `package_parse_warnings`,
//! `bridge_warning`) are not separate fields here; they live in the shared
//! `diagnostics` stream tagged by [`crate::error::Stage`], which carries the same
//! information without triplicating the accumulator type.

use serde::{Deserialize, Serialize};

use crate::bridge::BridgeSelectionPath;
use crate::constants::{PackageSiUnit, PackageSizeUnit};
use crate::convert::ConversionPath;
use crate::dimension::{BridgeRequired, CanonicalUnit};
use crate::error::Diagnostic;
use crate::form::FormSource;
use crate::linker::{LinkCandidates, LinkMethod};
use crate::quantity::QtyPrecisionCode;
use crate::units::{Dimension, UnitEnum};

/// A single ingredient line as it arrives from the recipe source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputRow {
    pub recipe_id: String,
    pub ingredient_line_number: u32,
    pub ingredient_original_text: String,
    pub qty_value_original: Option<String>,
    pub unit_original: Option<String>,
    pub package_size_raw: Option<String>,
    pub form_hint_raw: Option<String>,
    pub modifiers_raw: Option<String>,
    pub size_descriptor_raw: Option<String>,
    pub line_hash: Option<String>,
}

/// The append-only canonical record, built up stage by stage. Each stage's
/// fields live in their own block and are never touched again once written --
/// the pipeline enforces this by construction (each stage function only ever
/// returns the fields it owns, folded in once by the driver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    // C1 — identity & provenance.
    pub recipe_id: String,
    pub ingredient_line_number: u32,
    pub idempotency_key: String,
    pub ingredient_original_text: String,
    pub qty_value_original: Option<String>,
    pub unit_original: Option<String>,
    pub package_size_raw: Option<String>,

    // C2 — parsed quantity.
    pub qty_min: Option<f64>,
    pub qty_max: Option<f64>,
    pub qty_is_range: bool,
    pub qty_approx_flag: bool,
    pub qty_precision_code: Option<QtyPrecisionCode>,

    // C3 — normalized unit.
    pub unit_enum: Option<UnitEnum>,
    pub original_dimension: Option<Dimension>,
    pub flag_nonstandard_unit: bool,

    // C4 — package.
    pub package_multiplier: f64,
    pub package_size_value: Option<f64>,
    pub package_size_unit: Option<PackageSizeUnit>,
    pub package_size_si_value: Option<f64>,
    pub package_size_si_unit: Option<PackageSiUnit>,

    // C5 — ingredient link.
    pub ingredient_id: Option<String>,
    pub ingredient_canonical_name: Option<String>,
    pub link_confidence: Option<f64>,
    pub link_method: Option<LinkMethod>,
    pub link_candidates: LinkCandidates,

    // C6 — form.
    pub resolved_form_id: Option<String>,
    pub form_source: Option<FormSource>,
    pub form_conflict_flag: bool,

    // C7 — canonical dimension selection.
    pub canonical_unit: Option<CanonicalUnit>,
    pub canonical_dimension_selected: Option<Dimension>,
    pub bridge_required: BridgeRequired,
    pub bridge_inputs_ready: bool,

    // C8 — density bridge.
    pub density_id: Option<String>,
    pub density_g_per_ml: Option<f64>,
    pub bridge_selection_path: Option<BridgeSelectionPath>,

    // C9 — converted.
    pub canonical_qty_min: Option<f64>,
    pub canonical_qty_max: Option<f64>,
    pub canonical_qty: Option<f64>,
    pub conversion_path: Option<ConversionPath>,

    pub diagnostics: Vec<Diagnostic>,
}

impl CanonicalRecord {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn from_input(input: &InputRow, idempotency_key: String) -> Self {
        Self {
            recipe_id: input.recipe_id.clone(),
            ingredient_line_number: input.ingredient_line_number,
            idempotency_key,
            ingredient_original_text: input.ingredient_original_text.clone(),
            qty_value_original: input.qty_value_original.clone(),
            unit_original: input.unit_original.clone(),
            package_size_raw: input.package_size_raw.clone(),
            qty_min: None,
            qty_max: None,
            qty_is_range: false,
            qty_approx_flag: false,
            qty_precision_code: None,
            unit_enum: None,
            original_dimension: None,
            flag_nonstandard_unit: false,
            package_multiplier: 1.0,
            package_size_value: None,
            package_size_unit: None,
            package_size_si_value: None,
            package_size_si_unit: None,
            ingredient_id: None,
            ingredient_canonical_name: None,
            link_confidence: None,
            link_method: None,
            link_candidates: LinkCandidates::new(),
            resolved_form_id: None,
            form_source: None,
            form_conflict_flag: false,
            canonical_unit: None,
            canonical_dimension_selected: None,
            bridge_required: BridgeRequired::None,
            bridge_inputs_ready: true,
            density_id: None,
            density_g_per_ml: None,
            bridge_selection_path: None,
            canonical_qty_min: None,
            canonical_qty_max: None,
            canonical_qty: None,
            conversion_path: None,
            diagnostics: Vec::new(),
        }
    }
}
