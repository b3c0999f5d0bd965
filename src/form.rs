//! C6 — Form resolver.
//!
//! Five-tier precedence cascade over per-ingredient overrides, a global
//! token→form map, a unit-bias heuristic, and ingredient/category defaults.

use crate::error::{RowReport, Stage};
use crate::reference::model::Ingredient;
use crate::reference::ReferenceRepository;
use crate::units::UnitEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FormSource {
    Alias,
    Explicit,
    UnitBias,
    Default,
    CategoryDefault,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FormResult {
    pub resolved_form_id: Option<String>,
    pub form_source: Option<FormSource>,
    pub form_conflict_flag: bool,
}

/// Precedence order used when P2's global token map yields more than one
/// distinct form for the candidate token set: earlier entries in the
/// repository's declared form list win.
fn pick_highest_precedence<'a>(repo: &ReferenceRepository, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|form_id| repo.form(form_id).map(|_| form_id.as_str()))
        .min_by_key(|form_id| repo.form_declaration_order(form_id))
}

pub fn resolve_form(
    ingredient: Option<&Ingredient>,
    candidate_tokens: &[String],
    unit_enum: Option<UnitEnum>,
    repo: &ReferenceRepository,
    report: &mut RowReport,
) -> FormResult {
    let Some(ingredient) = ingredient else {
        return FormResult::default();
    };
    let hints = repo.form_hints();

    // P1: per-ingredient override map.
    if let Some(overrides) = hints.ingredient_overrides.get(&ingredient.id) {
        for token in candidate_tokens {
            if let Some(form_id) = overrides.get(token) {
                return FormResult {
                    resolved_form_id: Some(form_id.clone()),
                    form_source: Some(FormSource::Alias),
                    form_conflict_flag: false,
                };
            }
        }
    }

    // P2: global token -> form map, with conflict detection.
    let mut matched: Vec<String> = Vec::new();
    for token in candidate_tokens {
        if let Some(form_id) = hints.global_token_map.get(token) {
            if !matched.contains(form_id) {
                matched.push(form_id.clone());
            }
        }
    }
    if matched.len() == 1 {
        return FormResult {
            resolved_form_id: Some(matched.remove(0)),
            form_source: Some(FormSource::Explicit),
            form_conflict_flag: false,
        };
    }
    if matched.len() > 1 {
        let chosen = pick_highest_precedence(repo, &matched).map(str::to_string);
        report.warn(
            Stage::Form,
            "FORM_CONFLICT",
            format!("tokens imply conflicting forms {matched:?} for ingredient {}", ingredient.id),
        );
        return FormResult {
            resolved_form_id: chosen,
            form_source: Some(FormSource::Explicit),
            form_conflict_flag: true,
        };
    }

    // P3: unit-bias heuristic.
    if let Some(unit) = unit_enum {
        if let Some(form_id) = hints.unit_bias.get(&unit.to_string()) {
            if let Some(default_form) = &ingredient.default_form_id {
                if repo
                    .form_group(default_form)
                    .map_or(false, |group| group.contains(form_id))
                    || default_form == form_id
                {
                    return FormResult {
                        resolved_form_id: Some(form_id.clone()),
                        form_source: Some(FormSource::UnitBias),
                        form_conflict_flag: false,
                    };
                }
            }
        }
    }

    // P4: ingredient default.
    if let Some(default_form) = &ingredient.default_form_id {
        return FormResult {
            resolved_form_id: Some(default_form.clone()),
            form_source: Some(FormSource::Default),
            form_conflict_flag: false,
        };
    }

    // P5: category default -- a per-category default form, keyed the same way as
    // the global token map but under the ingredient's category instead of a token.
    if let Some(form_id) = hints.global_token_map.get(&format!("category:{}", ingredient.category)) {
        return FormResult {
            resolved_form_id: Some(form_id.clone()),
            form_source: Some(FormSource::CategoryDefault),
            form_conflict_flag: false,
        };
    }

    report.warn(
        Stage::Form,
        "NO_FORM_MATCH",
        format!("no form resolved for ingredient {}", ingredient.id),
    );
    FormResult::default()
}
