//! C5 — Ingredient linker.
//!
//! Four-tier match against the reference repository's ingredient index:
//! exact primary-name match, alias match, meaning-token-set match, then fuzzy
//! Jaccard over meaning tokens. Shaped like a case-insensitive alias/category
//! lookup over a flat alias map, generalized here into a tiered cascade.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::config::PipelineConfig;
use crate::error::{RowReport, Stage};
use crate::reference::{normalize_key, ReferenceRepository};

/// Candidate ids are always truncated to [`FUZZY_TOP_K`]'s review slice (3), so
/// this stays on the stack for the common empty/exact-match case.
pub type LinkCandidates = SmallVec<[String; 3]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LinkMethod {
    Exact,
    Alias,
    Normalized,
    Fuzzy,
    Review,
    Unresolved,
}

const FUZZY_TOP_K: usize = 5;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LinkResult {
    pub ingredient_id: Option<String>,
    pub ingredient_canonical_name: Option<String>,
    pub link_confidence: Option<f64>,
    pub link_method: Option<LinkMethod>,
    pub link_candidates: LinkCandidates,
}

/// Plural-fold a single token: a conservative `-es`/`-s` stripper, not a full
/// English inflector -- good enough for ingredient nouns, which is all this sees.
fn fold_plural(token: &str) -> String {
    if token.len() > 3 && (token.ends_with("ches") || token.ends_with("shes") || token.ends_with("xes")) {
        token[..token.len() - 2].to_string()
    } else if token.len() > 2 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Fold candidate text into `cand_norm`: lowercase, punctuation stripped, plurals
/// folded, whitespace collapsed.
pub fn normalize_candidate(text: &str) -> String {
    let lower = text.to_lowercase();
    let folded: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .map(fold_plural)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Restrict a normalized candidate to the meaning-carrying allow-list, dropping
/// stop words like units and connectives that never help identify an ingredient.
pub fn meaning_tokens(text: &str, allow_list: &BTreeSet<String>) -> BTreeSet<String> {
    let norm = normalize_candidate(text);
    if allow_list.is_empty() {
        return norm.split_whitespace().map(str::to_string).collect();
    }
    norm.split_whitespace()
        .filter(|t| allow_list.contains(*t))
        .map(str::to_string)
        .collect()
}

const MULTI_INGREDIENT_SEPARATORS: &[&str] = &[" or ", " and ", "/", ","];

fn looks_multi_ingredient(text: &str) -> bool {
    let lower = text.to_lowercase();
    MULTI_INGREDIENT_SEPARATORS.iter().any(|sep| lower.contains(sep))
}

/// Link a candidate ingredient phrase against the reference repository.
/// `candidate_text` is the original text with quantity/unit/package tokens
/// already stripped by the caller.
pub fn link_ingredient(
    candidate_text: &str,
    repo: &ReferenceRepository,
    config: &PipelineConfig,
    report: &mut RowReport,
) -> LinkResult {
    if candidate_text.trim().is_empty() {
        report.error(Stage::Linker, "NO_MATCH", "empty candidate ingredient text");
        return LinkResult {
            link_method: Some(LinkMethod::Unresolved),
            ..Default::default()
        };
    }

    let cand_norm = normalize_candidate(candidate_text);
    let key = normalize_key(&cand_norm);

    if let Some(ingredient) = repo.ingredient_by_primary(&key) {
        return LinkResult {
            ingredient_id: Some(ingredient.id.clone()),
            ingredient_canonical_name: Some(ingredient.primary_name.clone()),
            link_confidence: Some(1.00),
            link_method: Some(LinkMethod::Exact),
            link_candidates: LinkCandidates::new(),
        };
    }
    if let Some(ingredient) = repo.ingredient_by_alias(&key) {
        return LinkResult {
            ingredient_id: Some(ingredient.id.clone()),
            ingredient_canonical_name: Some(ingredient.primary_name.clone()),
            link_confidence: Some(0.99),
            link_method: Some(LinkMethod::Alias),
            link_candidates: LinkCandidates::new(),
        };
    }

    let tokens = meaning_tokens(&cand_norm, repo.meaning_tokens());
    if let Some(ingredient) = repo.ingredient_by_keep_tokens(&tokens) {
        return LinkResult {
            ingredient_id: Some(ingredient.id.clone()),
            ingredient_canonical_name: Some(ingredient.primary_name.clone()),
            link_confidence: Some(0.97),
            link_method: Some(LinkMethod::Normalized),
            link_candidates: LinkCandidates::new(),
        };
    }

    let top = repo.fuzzy_topk(&tokens, FUZZY_TOP_K);
    if let Some(best) = top.first() {
        if best.jaccard >= config.fuzzy_accept_threshold {
            return LinkResult {
                ingredient_id: Some(best.ingredient.id.clone()),
                ingredient_canonical_name: Some(best.ingredient.primary_name.clone()),
                link_confidence: Some(best.jaccard),
                link_method: Some(LinkMethod::Fuzzy),
                link_candidates: LinkCandidates::new(),
            };
        }
        if best.jaccard >= config.fuzzy_review_threshold {
            report.warn(Stage::Linker, "LOW_CONFIDENCE", format!(
                "top fuzzy match '{}' only scored {:.2}, marked for review",
                best.ingredient.id, best.jaccard
            ));
            return LinkResult {
                link_confidence: Some(best.jaccard),
                link_method: Some(LinkMethod::Review),
                link_candidates: top.iter().take(3).map(|m| m.ingredient.id.clone()).collect(),
                ..Default::default()
            };
        }
    }

    if looks_multi_ingredient(candidate_text) {
        report.error(
            Stage::Linker,
            "MULTI_INGREDIENT_LINE",
            format!("'{candidate_text}' looks like more than one ingredient"),
        );
    } else {
        report.error(Stage::Linker, "NO_MATCH", format!("no ingredient matched '{candidate_text}'"));
    }
    LinkResult {
        link_method: Some(LinkMethod::Unresolved),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_folding() {
        assert_eq!(fold_plural("tomatoes"), "tomato");
        assert_eq!(fold_plural("boxes"), "box");
        assert_eq!(fold_plural("eggs"), "egg");
        assert_eq!(fold_plural("glass"), "glass");
    }

    #[test]
    fn multi_ingredient_detection() {
        assert!(looks_multi_ingredient("coconut or coconut flakes"));
        assert!(looks_multi_ingredient("salt/pepper"));
        assert!(!looks_multi_ingredient("all-purpose flour"));
    }

    #[test]
    fn normalize_candidate_strips_punctuation() {
        assert_eq!(normalize_candidate("All-Purpose Flour!"), "all purpose flour");
    }
}
