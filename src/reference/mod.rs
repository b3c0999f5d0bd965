//! C0 — Reference repository.
//!
//! A read-only, load-once-per-process snapshot of ingredients, forms and
//! densities with indices built eagerly and queried lock-free.

pub mod model;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use time::Date;

use crate::error::ReferenceLoadError;
use model::{Density, Form, Ingredient, ReferenceSnapshot};

/// Normalize a name the same way across every index: lowercase, trim, collapse
/// internal whitespace. Plural folding lives in [`crate::linker`]; this is the
/// plain key-normalization shared by every index in this module.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch<'a> {
    pub ingredient: &'a Ingredient,
    pub jaccard: f64,
}

/// The immutable, indexed reference repository. Built once via
/// [`ReferenceRepository::load`]; every accessor takes `&self` and never
/// mutates.
pub struct ReferenceRepository {
    snapshot: ReferenceSnapshot,
    by_primary: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    by_keep_tokens: HashMap<BTreeSet<String>, usize>,
    ingredient_token_sets: Vec<(usize, BTreeSet<String>)>,
    alias_weight: HashMap<String, usize>,
    forms_by_id: IndexMap<String, usize>,
    form_groups: HashMap<String, BTreeSet<String>>,
    densities_by_ingredient: HashMap<String, Vec<usize>>,
}

impl ReferenceRepository {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReferenceLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot: ReferenceSnapshot = toml::from_str(&text)?;
        Self::build(snapshot)
    }

    pub fn build(snapshot: ReferenceSnapshot) -> Result<Self, ReferenceLoadError> {
        let mut by_primary = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut by_keep_tokens = HashMap::new();
        let mut ingredient_token_sets = Vec::new();
        let mut alias_weight = HashMap::new();

        for (idx, ingredient) in snapshot.ingredients.iter().enumerate() {
            // Indexed the same way a lookup key is folded (punctuation stripped,
            // not just whitespace-collapsed) so a hyphenated name like
            // "all-purpose flour" matches the same candidate text a recipe line
            // produces after stripping quantity/unit tokens.
            let primary_key = crate::linker::normalize_candidate(&ingredient.primary_name);
            if by_primary.insert(primary_key, idx).is_some() {
                return Err(ReferenceLoadError::DuplicateIngredientId(ingredient.id.clone()));
            }
            alias_weight.insert(ingredient.id.clone(), ingredient.aliases.len());
            for alias in &ingredient.aliases {
                by_alias.entry(crate::linker::normalize_candidate(alias)).or_insert(idx);
            }
            let tokens = crate::linker::meaning_tokens(
                &ingredient.primary_name,
                &snapshot.token_allow_list.meaning_tokens,
            );
            by_keep_tokens.entry(tokens.clone()).or_insert(idx);
            ingredient_token_sets.push((idx, tokens));
        }

        let mut forms_by_id = IndexMap::new();
        for (idx, form) in snapshot.forms.iter().enumerate() {
            if forms_by_id.insert(form.id.clone(), idx).is_some() {
                return Err(ReferenceLoadError::DuplicateFormId(form.id.clone()));
            }
        }
        let mut form_groups: HashMap<String, BTreeSet<String>> = HashMap::new();
        for form in &snapshot.forms {
            if let Some(group) = &form.group {
                form_groups
                    .entry(group.clone())
                    .or_default()
                    .insert(form.id.clone());
            }
        }

        let mut seen_density_ids = HashSet::new();
        let mut densities_by_ingredient: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, density) in snapshot.densities.iter().enumerate() {
            if !seen_density_ids.insert(density.id.clone()) {
                return Err(ReferenceLoadError::DuplicateDensityId(density.id.clone()));
            }
            if !snapshot.ingredients.iter().any(|i| i.id == density.ingredient_id) {
                return Err(ReferenceLoadError::UnknownIngredientRef {
                    density_id: density.id.clone(),
                    ingredient_id: density.ingredient_id.clone(),
                });
            }
            if !forms_by_id.contains_key(&density.form_id) {
                return Err(ReferenceLoadError::UnknownFormRef {
                    density_id: density.id.clone(),
                    form_id: density.form_id.clone(),
                });
            }
            densities_by_ingredient
                .entry(density.ingredient_id.clone())
                .or_default()
                .push(idx);
        }
        for ids in densities_by_ingredient.values_mut() {
            ids.sort_by(|&a, &b| snapshot.densities[a].id.cmp(&snapshot.densities[b].id));
        }

        Ok(Self {
            snapshot,
            by_primary,
            by_alias,
            by_keep_tokens,
            ingredient_token_sets,
            alias_weight,
            forms_by_id,
            form_groups,
            densities_by_ingredient,
        })
    }

    pub fn ingredient_by_primary(&self, name_norm: &str) -> Option<&Ingredient> {
        self.by_primary
            .get(name_norm)
            .map(|&idx| &self.snapshot.ingredients[idx])
    }

    pub fn ingredient_by_alias(&self, name_norm: &str) -> Option<&Ingredient> {
        self.by_alias
            .get(name_norm)
            .map(|&idx| &self.snapshot.ingredients[idx])
    }

    pub fn ingredient_by_keep_tokens(&self, tokens: &BTreeSet<String>) -> Option<&Ingredient> {
        self.by_keep_tokens.get(tokens).map(|&idx| &self.snapshot.ingredients[idx])
    }

    pub fn ingredient_by_id(&self, id: &str) -> Option<&Ingredient> {
        self.snapshot.ingredients.iter().find(|i| i.id == id)
    }

    pub fn alias_weight(&self, ingredient_id: &str) -> usize {
        *self.alias_weight.get(ingredient_id).unwrap_or(&0)
    }

    /// Jaccard similarity over meaning-token sets, top-`k`, deterministically
    /// ordered by (score desc, alias weight desc, id asc) so callers never need to
    /// re-sort for tie-breaking.
    pub fn fuzzy_topk(&self, tokens: &BTreeSet<String>, k: usize) -> Vec<FuzzyMatch<'_>> {
        let mut scored: Vec<FuzzyMatch<'_>> = self
            .ingredient_token_sets
            .iter()
            .map(|(idx, cand_tokens)| {
                let ingredient = &self.snapshot.ingredients[*idx];
                FuzzyMatch {
                    ingredient,
                    jaccard: jaccard(tokens, cand_tokens),
                }
            })
            .filter(|m| m.jaccard > 0.0)
            .collect();
        scored.sort_by(|a, b| {
            b.jaccard
                .partial_cmp(&a.jaccard)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.alias_weight(&b.ingredient.id).cmp(&self.alias_weight(&a.ingredient.id)))
                .then_with(|| a.ingredient.id.cmp(&b.ingredient.id))
        });
        scored.truncate(k);
        scored
    }

    pub fn form(&self, form_id: &str) -> Option<&Form> {
        self.forms_by_id.get(form_id).map(|&idx| &self.snapshot.forms[idx])
    }

    /// Position of `form_id` in the snapshot's declared form list, or
    /// `usize::MAX` if unknown. Used to break ties in favor of whichever
    /// conflicting form was declared first.
    pub fn form_declaration_order(&self, form_id: &str) -> usize {
        self.forms_by_id.get_index_of(form_id).unwrap_or(usize::MAX)
    }

    pub fn form_group(&self, form_id: &str) -> Option<&BTreeSet<String>> {
        let group = self.form(form_id)?.group.as_ref()?;
        self.form_groups.get(group)
    }

    pub fn default_form_for(&self, ingredient_id: &str) -> Option<String> {
        self.ingredient_by_id(ingredient_id)?.default_form_id.clone()
    }

    pub fn form_hints(&self) -> &model::FormHints {
        &self.snapshot.form_hints
    }

    pub fn meaning_tokens(&self) -> &BTreeSet<String> {
        &self.snapshot.token_allow_list.meaning_tokens
    }

    /// Densities for an ingredient, deterministically ordered by id.
    pub fn densities_for(&self, ingredient_id: &str) -> impl Iterator<Item = &Density> {
        self.densities_by_ingredient
            .get(ingredient_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.snapshot.densities[idx])
    }

}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub fn today_placeholder() -> Date {
    // Overridable via `PipelineConfig::today` for reproducible reruns across
    // density time windows; this is the fallback when unset.
    time::OffsetDateTime::now_utc().date()
}
