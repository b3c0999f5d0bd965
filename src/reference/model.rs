//! Reference entities: read-only data loaded once per process and never
//! mutated, as a small set of plain structs deserialized from TOML.

use std::collections::BTreeSet;

use serde::Deserialize;
use time::Date;

#[derive(Debug, Clone, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub primary_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub category: String,
    pub default_form_id: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDimension {
    G,
    Ml,
    Auto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Form {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub target_dimension: TargetDimension,
    #[serde(default)]
    pub display_rule_default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackedState {
    Packed,
    LooselyPacked,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Density {
    pub id: String,
    pub ingredient_id: String,
    pub form_id: String,
    pub g_per_ml: f64,
    #[serde(default)]
    pub packed_state: Option<PackedState>,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub source_priority: i32,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub effective_from: Option<Date>,
    #[serde(default)]
    pub effective_to: Option<Date>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Density {
    pub fn covers(&self, today: Date) -> bool {
        self.is_active
            && self.effective_from.map_or(true, |d| d <= today)
            && self.effective_to.map_or(true, |d| d >= today)
    }
}

/// A unit synonym or meaning-carrying token entry read from the snapshot's
/// `[constants]` table -- kept distinct from the hardcoded conversion factors
/// in [`crate::constants`], which are external-contract numbers, not data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenAllowList {
    #[serde(default)]
    pub meaning_tokens: BTreeSet<String>,
}

/// A snapshot's per-ingredient form override and global token-to-form maps used
/// by the form resolver's override and global-token-map tiers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormHints {
    #[serde(default)]
    pub ingredient_overrides: std::collections::HashMap<String, std::collections::HashMap<String, String>>,
    #[serde(default)]
    pub global_token_map: std::collections::HashMap<String, String>,
    /// Unit token (e.g. `"cup"`) to form id. Kept as a raw string key rather than
    /// [`UnitEnum`] because TOML table keys are always strings; resolved to a
    /// unit at lookup time by [`crate::form::resolve_form`].
    #[serde(default)]
    pub unit_bias: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceSnapshot {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub forms: Vec<Form>,
    #[serde(default)]
    pub densities: Vec<Density>,
    #[serde(default)]
    pub token_allow_list: TokenAllowList,
    #[serde(default)]
    pub form_hints: FormHints,
}
