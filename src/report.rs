//! A structured diagnostic stream plus a human-readable summary grouped by
//! failure code with remediation hints, across a whole batch's worth of rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Diagnostic;
use crate::record::CanonicalRecord;

#[derive(Debug, Clone, Serialize)]
pub struct RowDiagnosticEntry {
    pub recipe_id: String,
    pub ingredient_line_number: u32,
    pub diagnostic: Diagnostic,
}

/// The machine-readable error stream: one entry per diagnostic across the batch,
/// including intake-time rejections (which carry no record).
pub fn structured_stream(
    records: &[CanonicalRecord],
    rejections: &[Diagnostic],
) -> Vec<RowDiagnosticEntry> {
    let mut entries: Vec<RowDiagnosticEntry> = records
        .iter()
        .flat_map(|r| {
            r.diagnostics.iter().map(move |d| RowDiagnosticEntry {
                recipe_id: r.recipe_id.clone(),
                ingredient_line_number: r.ingredient_line_number,
                diagnostic: d.clone(),
            })
        })
        .collect();
    entries.extend(rejections.iter().map(|d| RowDiagnosticEntry {
        recipe_id: String::new(),
        ingredient_line_number: 0,
        diagnostic: d.clone(),
    }));
    entries
}

fn remediation_for(code: &str) -> &'static str {
    match code {
        "NO_MATCH" => "add the ingredient (and its aliases) to the ingredient master table",
        "MULTI_INGREDIENT_LINE" => "split the line upstream into one ingredient per row",
        "LOW_CONFIDENCE" => "review the top candidates and add an alias if one matches",
        "H0_NO_DENSITY" => "add a density row for (ingredient_id, form_id)",
        "SANITY_RANGE_EDGE" => "verify the density value; it falls outside the plausible band",
        "NO_FORM_MATCH" => "add a form hint token or a default_form_id for this ingredient",
        "NONSTANDARD_UNIT" => "add the unit token to the unit synonym table",
        "NO_PACKAGE_SIZE_FOUND" => "no action needed; package metadata is optional",
        "SEQUENCE_GAP" => "check the upstream extractor for dropped or renumbered lines",
        _ => "no specific remediation on file for this code",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeSummary {
    pub code: String,
    pub count: usize,
    pub remediation: &'static str,
    pub sample_recipe_ids: Vec<String>,
}

/// Human-readable summary: counts per failure code plus a top-N sample of
/// offending recipe ids.
pub fn summarize(entries: &[RowDiagnosticEntry], sample_size: usize) -> Vec<CodeSummary> {
    let mut by_code: BTreeMap<&str, Vec<&RowDiagnosticEntry>> = BTreeMap::new();
    for entry in entries {
        by_code.entry(entry.diagnostic.code.as_ref()).or_default().push(entry);
    }
    let mut summaries: Vec<CodeSummary> = by_code
        .into_iter()
        .map(|(code, group)| CodeSummary {
            code: code.to_string(),
            count: group.len(),
            remediation: remediation_for(code),
            sample_recipe_ids: group
                .iter()
                .filter(|e| !e.recipe_id.is_empty())
                .map(|e| e.recipe_id.clone())
                .take(sample_size)
                .collect(),
        })
        .collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    summaries
}

pub fn render_human_summary(summaries: &[CodeSummary]) -> String {
    let mut out = String::new();
    for s in summaries {
        out.push_str(&format!("{:<28} {:>6}  {}\n", s.code, s.count, s.remediation));
        if !s.sample_recipe_ids.is_empty() {
            out.push_str(&format!("  e.g. recipes: {}\n", s.sample_recipe_ids.join(", ")));
        }
    }
    out
}
