//! End-to-end scenarios mirroring the literal cases documented for this
//! pipeline: given a small reference snapshot, each input line should resolve
//! to the expected canonical unit, conversion path and quantity (or the
//! expected classified failure).

use ingredient_canon::config::PipelineConfig;
use ingredient_canon::dimension::CanonicalUnit;
use ingredient_canon::linker::LinkMethod;
use ingredient_canon::record::InputRow;
use ingredient_canon::reference::model::{
    Density, Form, Ingredient, ReferenceSnapshot, TargetDimension, TokenAllowList,
};
use ingredient_canon::reference::ReferenceRepository;
use ingredient_canon::{convert::ConversionPath, pipeline};

fn meaning_tokens(words: &[&str]) -> std::collections::BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn test_repo() -> ReferenceRepository {
    let snapshot = ReferenceSnapshot {
        ingredients: vec![
            Ingredient {
                id: "INGR_01091".into(),
                primary_name: "chia seeds".into(),
                aliases: vec![],
                category: "seeds".into(),
                default_form_id: Some("FORM_SEEDS".into()),
                flags: vec![],
            },
            Ingredient {
                id: "INGR_FLOUR".into(),
                primary_name: "all-purpose flour".into(),
                aliases: vec![],
                category: "baking".into(),
                default_form_id: Some("FORM_POWDER".into()),
                flags: vec![],
            },
            Ingredient {
                id: "INGR_CINNAMON".into(),
                primary_name: "ground cinnamon".into(),
                aliases: vec![],
                category: "spices".into(),
                default_form_id: Some("FORM_GROUND".into()),
                flags: vec![],
            },
            Ingredient {
                id: "INGR_EGG".into(),
                primary_name: "eggs".into(),
                aliases: vec!["egg".into()],
                category: "dairy".into(),
                default_form_id: None,
                flags: vec![],
            },
            Ingredient {
                id: "INGR_COCONUT".into(),
                primary_name: "coconut".into(),
                aliases: vec![],
                category: "produce".into(),
                default_form_id: None,
                flags: vec![],
            },
            Ingredient {
                id: "INGR_BEEF".into(),
                primary_name: "ground beef".into(),
                aliases: vec![],
                category: "meat".into(),
                default_form_id: Some("FORM_GROUND_MEAT".into()),
                flags: vec![],
            },
        ],
        forms: vec![
            Form {
                id: "FORM_SEEDS".into(),
                name: "whole".into(),
                group: None,
                target_dimension: TargetDimension::Auto,
                display_rule_default: None,
            },
            Form {
                id: "FORM_POWDER".into(),
                name: "powder".into(),
                group: None,
                target_dimension: TargetDimension::G,
                display_rule_default: None,
            },
            Form {
                id: "FORM_GROUND".into(),
                name: "ground".into(),
                group: None,
                target_dimension: TargetDimension::Auto,
                display_rule_default: None,
            },
            Form {
                id: "FORM_GROUND_MEAT".into(),
                name: "ground".into(),
                group: None,
                target_dimension: TargetDimension::G,
                display_rule_default: None,
            },
        ],
        densities: vec![Density {
            id: "DEN_FLOUR_POWDER".into(),
            ingredient_id: "INGR_FLOUR".into(),
            form_id: "FORM_POWDER".into(),
            g_per_ml: 0.528,
            packed_state: None,
            temp_c: Some(20.0),
            source_priority: 1,
            quality_score: 1.0,
            effective_from: None,
            effective_to: None,
            is_active: true,
        }],
        token_allow_list: TokenAllowList {
            meaning_tokens: meaning_tokens(&[
                "chia", "seeds", "flour", "all", "purpose", "ground", "cinnamon", "eggs", "egg",
                "coconut", "flakes", "beef", "maca", "root", "powder",
            ]),
        },
        form_hints: Default::default(),
    };
    ReferenceRepository::build(snapshot).unwrap()
}

fn row(recipe: &str, line: u32, text: &str, qty: Option<&str>, unit: Option<&str>) -> InputRow {
    InputRow {
        recipe_id: recipe.into(),
        ingredient_line_number: line,
        ingredient_original_text: text.into(),
        qty_value_original: qty.map(str::to_string),
        unit_original: unit.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn scenario_cup_chia_seeds_is_vol_to_vol() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "1/2 cup chia seeds", Some("1/2"), Some("cup"))];
    let (records, rejections) = pipeline::run_batch(&rows, &repo, &config);
    assert!(rejections.is_empty());
    let record = &records[0];
    assert_eq!(record.ingredient_id.as_deref(), Some("INGR_01091"));
    assert_eq!(record.canonical_unit, Some(CanonicalUnit::Ml));
    assert_eq!(record.conversion_path, Some(ConversionPath::VolToVol));
    assert!((record.canonical_qty.unwrap() - 118.294_118_25).abs() < 1e-6);
}

#[test]
fn scenario_grams_flour_is_mass_to_mass() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "200 g all-purpose flour", Some("200"), Some("g"))];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.canonical_unit, Some(CanonicalUnit::G));
    assert_eq!(record.conversion_path, Some(ConversionPath::MassToMass));
    assert_eq!(record.canonical_qty, Some(200.0));
}

#[test]
fn scenario_cup_flour_bridges_via_density() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "1 cup all-purpose flour", Some("1"), Some("cup"))];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.conversion_path, Some(ConversionPath::VolToMassViaDensity));
    assert!((record.canonical_qty.unwrap() - 124.918_556_88).abs() < 1e-3);
}

#[test]
fn scenario_range_cinnamon_is_range() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "1-2 tsp ground cinnamon", Some("1-2"), Some("tsp"))];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert!(record.qty_is_range);
    assert!((record.canonical_qty_min.unwrap() - 4.928_921_593_75).abs() < 1e-9);
    assert!((record.canonical_qty_max.unwrap() - 9.857_843_187_5).abs() < 1e-9);
}

#[test]
fn scenario_eggs_is_count_no_density() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "2 eggs", Some("2"), None)];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.canonical_unit, Some(CanonicalUnit::Ea));
    assert_eq!(record.conversion_path, Some(ConversionPath::Count));
    assert_eq!(record.canonical_qty, Some(2.0));
    assert_eq!(record.density_id, None);
}

#[test]
fn scenario_multi_ingredient_line_is_unresolved() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "coconut or coconut flakes", None, None)];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.link_method, Some(LinkMethod::Unresolved));
    assert!(record.diagnostics.iter().any(|d| d.code == "MULTI_INGREDIENT_LINE"));
    assert_eq!(record.canonical_qty, None);
}

#[test]
fn scenario_unknown_ingredient_is_no_match() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "1 cup maca root powder", Some("1"), Some("cup"))];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.link_method, Some(LinkMethod::Unresolved));
    assert!(record.diagnostics.iter().any(|d| d.code == "NO_MATCH"));
    assert_eq!(record.canonical_qty, None);
}

#[test]
fn scenario_half_lb_ground_beef() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "\u{00BD} lb ground beef", Some("\u{00BD}"), Some("lb"))];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    let record = &records[0];
    assert_eq!(record.canonical_unit, Some(CanonicalUnit::G));
    assert!((record.canonical_qty.unwrap() - 226.796_185).abs() < 1e-6);
}

#[test]
fn idempotent_rerun_produces_identical_records() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![row("r1", 1, "200 g all-purpose flour", Some("200"), Some("g"))];
    let (first, _) = pipeline::run_batch(&rows, &repo, &config);
    let (second, _) = pipeline::run_batch(&rows, &repo, &config);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn duplicate_rows_are_deduplicated_by_idempotency_key() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![
        row("r1", 1, "200 g all-purpose flour", Some("200"), Some("g")),
        row("r1", 1, "200 g all-purpose flour", Some("200"), Some("g")),
    ];
    let (records, _) = pipeline::run_batch(&rows, &repo, &config);
    assert_eq!(records.len(), 1);
}

#[test]
fn sequence_gap_is_reported() {
    let repo = test_repo();
    let config = PipelineConfig::default();
    let rows = vec![
        row("r1", 1, "200 g all-purpose flour", Some("200"), Some("g")),
        row("r1", 3, "2 eggs", Some("2"), None),
    ];
    let (_, rejections) = pipeline::run_batch(&rows, &repo, &config);
    assert!(rejections.iter().any(|d| d.code == "SEQUENCE_GAP"));
}
