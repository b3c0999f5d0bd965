//! C1 — Intake & validation.
//!
//! Normalizes whitespace/unicode, enforces required fields, computes the
//! idempotency key, and guards against section-header rows and structurally
//! malformed unit tokens. Shaped like a front-matter validation pass: reject a
//! row up front with a stable code before any further parsing is attempted.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::error::{Diagnostic, RowReport, Stage};
use crate::record::InputRow;
use crate::text;
use crate::units::looks_structurally_malformed;

#[derive(Debug, Clone)]
pub struct AcceptedRow {
    pub recipe_id: String,
    pub ingredient_line_number: u32,
    pub ingredient_original_text: String,
    pub qty_value_original: Option<String>,
    pub unit_original: Option<String>,
    pub package_size_raw: Option<String>,
    pub form_hint_raw: Option<String>,
    pub modifiers_raw: Option<String>,
    pub idempotency_key: String,
}

pub enum IntakeOutcome {
    Accepted(AcceptedRow),
    DuplicateSkipped,
    Rejected(Diagnostic),
}

fn idempotency_key(recipe_id: &str, line_number: u32, line_hash: Option<&str>, original_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(recipe_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(line_number.to_le_bytes());
    hasher.update(b"\0");
    hasher.update(line_hash.unwrap_or(original_text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Heuristic for a bare section-header row: short, no digits, and either ends
/// with `:` or is entirely uppercase.
fn looks_like_section_header(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let word_count = trimmed.split_whitespace().count();
    if word_count == 0 || word_count > 5 {
        return false;
    }
    trimmed.ends_with(':')
        || (trimmed.chars().any(char::is_alphabetic) && trimmed.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase))
}

/// Validate and normalize one input row, tracking per-recipe line numbers seen so
/// far for the `SEQUENCE_GAP` warning (emitted by [`finish_recipe`] once a
/// recipe's rows are all seen, not per-row).
pub fn process_row(
    row: &InputRow,
    seen_keys: &mut HashSet<String>,
) -> IntakeOutcome {
    if row.recipe_id.trim().is_empty() {
        return IntakeOutcome::Rejected(Diagnostic::error(
            Stage::Intake,
            "MISSING_REQUIRED_FIELD",
            "recipe_id is required",
        ));
    }
    if row.ingredient_line_number < 1 {
        return IntakeOutcome::Rejected(Diagnostic::error(
            Stage::Intake,
            "TYPE_MISMATCH",
            "ingredient_line_number must be >= 1",
        ));
    }
    let Some(original_text) = text::normalize(&row.ingredient_original_text) else {
        return IntakeOutcome::Rejected(Diagnostic::error(
            Stage::Intake,
            "MISSING_REQUIRED_FIELD",
            "ingredient_original_text is required",
        ));
    };

    if looks_like_section_header(&original_text) {
        return IntakeOutcome::Rejected(Diagnostic::error(
            Stage::Intake,
            "SECTION_HEADER_ROW",
            format!("'{original_text}' looks like a section header, not an ingredient line"),
        ));
    }

    if let Some(unit) = row.unit_original.as_deref() {
        if looks_structurally_malformed(unit) {
            return IntakeOutcome::Rejected(Diagnostic::error(
                Stage::Intake,
                "UNIT_INVALID_FORMAT",
                format!("unit token '{unit}' is structurally malformed"),
            ));
        }
    }

    let key = idempotency_key(
        &row.recipe_id,
        row.ingredient_line_number,
        row.line_hash.as_deref(),
        &original_text,
    );
    if !seen_keys.insert(key.clone()) {
        return IntakeOutcome::DuplicateSkipped;
    }

    IntakeOutcome::Accepted(AcceptedRow {
        recipe_id: row.recipe_id.clone(),
        ingredient_line_number: row.ingredient_line_number,
        ingredient_original_text: original_text,
        qty_value_original: row.qty_value_original.as_deref().and_then(text::normalize),
        unit_original: row.unit_original.as_deref().and_then(text::normalize),
        package_size_raw: row.package_size_raw.as_deref().and_then(text::normalize),
        form_hint_raw: row.form_hint_raw.as_deref().and_then(text::normalize),
        modifiers_raw: row.modifiers_raw.as_deref().and_then(text::normalize),
        idempotency_key: key,
    })
}

/// Emit `SEQUENCE_GAP` for a recipe once all its rows have been seen.
pub fn check_sequence_gap(recipe_id: &str, line_numbers: &[u32], report: &mut RowReport) {
    if line_numbers.is_empty() {
        return;
    }
    let max = *line_numbers.iter().max().unwrap();
    let seen: HashSet<u32> = line_numbers.iter().copied().collect();
    let missing: Vec<u32> = (1..=max).filter(|n| !seen.contains(n)).collect();
    if !missing.is_empty() {
        report.warn(
            Stage::Intake,
            "SEQUENCE_GAP",
            format!("recipe {recipe_id} is missing line numbers {missing:?}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text_: &str) -> InputRow {
        InputRow {
            recipe_id: "r1".into(),
            ingredient_line_number: 1,
            ingredient_original_text: text_.into(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_well_formed_row() {
        let mut seen = HashSet::new();
        match process_row(&row("1/2 cup chia seeds"), &mut seen) {
            IntakeOutcome::Accepted(r) => assert_eq!(r.ingredient_original_text, "1/2 cup chia seeds"),
            _ => panic!("expected accepted"),
        }
    }

    #[test]
    fn rejects_missing_recipe_id() {
        let mut seen = HashSet::new();
        let mut r = row("1 cup flour");
        r.recipe_id = "".into();
        match process_row(&r, &mut seen) {
            IntakeOutcome::Rejected(d) => assert_eq!(d.code, "MISSING_REQUIRED_FIELD"),
            _ => panic!("expected rejected"),
        }
    }

    #[test]
    fn rejects_section_header() {
        let mut seen = HashSet::new();
        match process_row(&row("FOR THE SAUCE:"), &mut seen) {
            IntakeOutcome::Rejected(d) => assert_eq!(d.code, "SECTION_HEADER_ROW"),
            _ => panic!("expected rejected"),
        }
    }

    #[test]
    fn duplicate_is_skipped() {
        let mut seen = HashSet::new();
        let r = row("2 eggs");
        assert!(matches!(process_row(&r, &mut seen), IntakeOutcome::Accepted(_)));
        assert!(matches!(process_row(&r, &mut seen), IntakeOutcome::DuplicateSkipped));
    }

    #[test]
    fn sequence_gap_detected() {
        let mut report = RowReport::new();
        check_sequence_gap("r1", &[1, 2, 4], &mut report);
        assert!(report.codes().any(|c| c == "SEQUENCE_GAP"));
    }

    #[test]
    fn no_gap_when_contiguous() {
        let mut report = RowReport::new();
        check_sequence_gap("r1", &[1, 2, 3], &mut report);
        assert!(report.is_empty());
    }
}
