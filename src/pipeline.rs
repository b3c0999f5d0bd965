//! The driver: runs C1→C9 over one row at a time and fans rows out across
//! worker threads with `rayon`. Rows have no cross-row state, so the whole
//! batch parallelizes trivially.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::bridge::{self, BridgeConfig};
use crate::config::PipelineConfig;
use crate::dimension;
use crate::error::RowReport;
use crate::form;
use crate::intake::{self, AcceptedRow, IntakeOutcome};
use crate::linker;
use crate::package;
use crate::quantity;
use crate::record::{CanonicalRecord, InputRow};
use crate::reference::model::PackedState;
use crate::reference::ReferenceRepository;
use crate::units;

/// Detect a packed-state hint from free-text modifiers.
fn detect_packed_state(modifiers_raw: Option<&str>) -> Option<PackedState> {
    let text = modifiers_raw?.to_lowercase();
    if text.contains("loosely packed") || text.contains("loose packed") {
        Some(PackedState::LooselyPacked)
    } else if text.contains("packed") {
        Some(PackedState::Packed)
    } else {
        None
    }
}

/// Strip the parsed quantity/unit/package substrings out of the original text to
/// leave the candidate ingredient phrase.
fn strip_known_tokens(original: &str, qty_raw: Option<&str>, unit_raw: Option<&str>, package_raw: Option<&str>) -> String {
    let mut remainder = original.to_string();
    for needle in [qty_raw, unit_raw, package_raw].into_iter().flatten() {
        if !needle.is_empty() {
            remainder = remainder.replacen(needle, " ", 1);
        }
    }
    remainder.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run the C2..C9 stages over one accepted row.
pub fn run_row(row: &AcceptedRow, repo: &ReferenceRepository, config: &PipelineConfig) -> CanonicalRecord {
    let input = InputRow {
        recipe_id: row.recipe_id.clone(),
        ingredient_line_number: row.ingredient_line_number,
        ingredient_original_text: row.ingredient_original_text.clone(),
        qty_value_original: row.qty_value_original.clone(),
        unit_original: row.unit_original.clone(),
        package_size_raw: row.package_size_raw.clone(),
        form_hint_raw: row.form_hint_raw.clone(),
        modifiers_raw: row.modifiers_raw.clone(),
        size_descriptor_raw: None,
        line_hash: None,
    };
    let mut record = CanonicalRecord::from_input(&input, row.idempotency_key.clone());
    let mut report = RowReport::new();

    // C2
    let qty = quantity::parse_quantity(row.qty_value_original.as_deref(), &mut report);
    record.qty_min = qty.qty_min;
    record.qty_max = qty.qty_max;
    record.qty_is_range = qty.qty_is_range;
    record.qty_approx_flag = qty.qty_approx_flag;
    record.qty_precision_code = qty.qty_precision_code;

    // C3
    let normalized_unit = units::normalize_unit(row.unit_original.as_deref(), record.qty_min.is_some());
    record.unit_enum = normalized_unit.unit_enum;
    record.original_dimension = normalized_unit.original_dimension;
    record.flag_nonstandard_unit = normalized_unit.flag_nonstandard_unit;
    if normalized_unit.flag_nonstandard_unit {
        if let Some(token) = row.unit_original.as_deref() {
            units::report_nonstandard(&mut report, token);
        }
    }

    // C4 — searches the concatenation of package_size_raw and the original text.
    let package_source = format!(
        "{} {}",
        row.package_size_raw.as_deref().unwrap_or(""),
        row.ingredient_original_text
    );
    let pkg = package::parse_package(Some(package_source.trim()), &mut report);
    record.package_multiplier = pkg.package_multiplier.unwrap_or(1.0);
    record.package_size_value = pkg.package_size_value;
    record.package_size_unit = pkg.package_size_unit;
    record.package_size_si_value = pkg.package_size_value_si;
    record.package_size_si_unit = pkg.package_size_unit_si;

    // C5
    let candidate_text = strip_known_tokens(
        &row.ingredient_original_text,
        row.qty_value_original.as_deref(),
        row.unit_original.as_deref(),
        row.package_size_raw.as_deref(),
    );
    let link = linker::link_ingredient(&candidate_text, repo, config, &mut report);
    record.ingredient_id = link.ingredient_id.clone();
    record.ingredient_canonical_name = link.ingredient_canonical_name;
    record.link_confidence = link.link_confidence;
    record.link_method = link.link_method;
    record.link_candidates = link.link_candidates;

    let ingredient = record.ingredient_id.as_deref().and_then(|id| repo.ingredient_by_id(id));

    // C6
    let form_source_text = format!(
        "{} {} {}",
        row.form_hint_raw.as_deref().unwrap_or(""),
        row.modifiers_raw.as_deref().unwrap_or(""),
        row.ingredient_original_text
    );
    let candidate_tokens: Vec<String> = linker::meaning_tokens(&form_source_text, repo.meaning_tokens())
        .into_iter()
        .collect();
    let form_result = form::resolve_form(ingredient, &candidate_tokens, record.unit_enum, repo, &mut report);
    record.resolved_form_id = form_result.resolved_form_id.clone();
    record.form_source = form_result.form_source;
    record.form_conflict_flag = form_result.form_conflict_flag;

    // C7
    let form_target = record
        .resolved_form_id
        .as_deref()
        .and_then(|id| repo.form(id))
        .map(|f| f.target_dimension);
    let dim = dimension::select_dimension(record.original_dimension, form_target, &mut report);
    record.canonical_unit = dim.canonical_unit;
    record.canonical_dimension_selected = dim.canonical_dimension_selected;
    record.bridge_required = dim.bridge_required;
    record.bridge_inputs_ready = dim.bridge_inputs_ready;

    // C8 — only when a bridge crossing is required and linking succeeded.
    if record.bridge_inputs_ready
        && !matches!(record.bridge_required, crate::dimension::BridgeRequired::None)
    {
        if let Some(ingredient_id) = record.ingredient_id.clone() {
            let packed_hint = detect_packed_state(row.modifiers_raw.as_deref());
            let bridge_config = BridgeConfig {
                plausible_band: config.plausible_band(),
                today: config.resolved_today(),
            };
            let bridge_result = bridge::resolve_density(
                &ingredient_id,
                record.resolved_form_id.as_deref(),
                packed_hint,
                repo,
                &bridge_config,
                &mut report,
            );
            record.density_id = bridge_result.density_id;
            record.density_g_per_ml = bridge_result.density_g_per_ml;
            record.bridge_selection_path = Some(bridge_result.bridge_selection_path);
            record.bridge_inputs_ready = bridge_result.bridge_inputs_ready;
        } else {
            record.bridge_inputs_ready = false;
        }
    }

    // C9 — an unresolved ingredient link terminates the row with null canonical
    // numbers regardless of what the dimension selector decided.
    let link_unresolved = record.link_method == Some(linker::LinkMethod::Unresolved);
    if link_unresolved {
        record.bridge_inputs_ready = false;
    } else if record.bridge_inputs_ready {
        let converted = crate::convert::convert(
            record.canonical_unit,
            record.bridge_required,
            record.unit_enum,
            record.density_g_per_ml,
            record.qty_min,
            record.qty_max,
        );
        record.canonical_qty_min = converted.canonical_qty_min;
        record.canonical_qty_max = converted.canonical_qty_max;
        record.canonical_qty = converted.canonical_qty;
        record.conversion_path = converted.conversion_path;
    }

    record.diagnostics = report.into_vec();
    record
}

/// Run intake then the stage pipeline over a batch of input rows, in parallel
/// across rows. Returns one [`CanonicalRecord`] per accepted, non-duplicate
/// row, plus the intake-time rejections.
pub fn run_batch(
    rows: &[InputRow],
    repo: &ReferenceRepository,
    config: &PipelineConfig,
) -> (Vec<CanonicalRecord>, Vec<crate::error::Diagnostic>) {
    let mut seen_keys = HashSet::new();
    let mut accepted = Vec::with_capacity(rows.len());
    let mut rejections = Vec::new();
    let mut line_numbers_by_recipe: std::collections::HashMap<String, Vec<u32>> = std::collections::HashMap::new();

    for row in rows {
        match intake::process_row(row, &mut seen_keys) {
            IntakeOutcome::Accepted(r) => {
                line_numbers_by_recipe
                    .entry(r.recipe_id.clone())
                    .or_default()
                    .push(r.ingredient_line_number);
                accepted.push(r);
            }
            IntakeOutcome::DuplicateSkipped => {}
            IntakeOutcome::Rejected(diag) => rejections.push(diag),
        }
    }

    let mut sequence_report = RowReport::new();
    for (recipe_id, numbers) in &line_numbers_by_recipe {
        intake::check_sequence_gap(recipe_id, numbers, &mut sequence_report);
    }
    rejections.extend(sequence_report.into_vec());

    let records: Vec<CanonicalRecord> = accepted
        .par_iter()
        .map(|row| run_row(row, repo, config))
        .collect();

    (records, rejections)
}
