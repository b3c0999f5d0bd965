//! Diagnostics for the pipeline.
//!
//! Two layers: a rich per-row diagnostic collected into a [`RowReport`], and a
//! small set of process-fatal errors. Here there are no source spans -- a row
//! is a structured record, not a text buffer -- so a [`Diagnostic`] carries a
//! stable code instead of a labeled span.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub type CowStr = Cow<'static, str>;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    /// Row processing cannot continue past this point; canonical numeric fields
    /// stay null.
    Error,
    /// Row processing continues; the field is still populated.
    Warning,
}

/// Which stage raised the diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Intake,
    Quantity,
    Unit,
    Package,
    Linker,
    Form,
    Dimension,
    Bridge,
    Convert,
}

/// A single diagnostic attached to a row.
///
/// `code` is a stable identifier from the failure taxonomy (e.g.
/// `"NO_NUMERIC_QUANTITY"`). It is what downstream consumers group and count by; the
/// human `message` is for the report, not for matching. Stored as a [`CowStr`]
/// rather than `&'static str` so a record round-trips through JSON: a borrowed
/// literal on the way out, an owned string on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub code: CowStr,
    pub message: CowStr,
}

impl Diagnostic {
    pub fn error(stage: Stage, code: &'static str, message: impl Into<CowStr>) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            code: Cow::Borrowed(code),
            message: message.into(),
        }
    }

    pub fn warning(stage: Stage, code: &'static str, message: impl Into<CowStr>) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            code: Cow::Borrowed(code),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.code, self.message)
    }
}

/// Per-row diagnostic accumulator: gathers both errors and warnings as a row
/// moves through the pipeline stages.
#[derive(Debug, Default, Clone)]
pub struct RowReport {
    diagnostics: Vec<Diagnostic>,
}

impl RowReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn error(&mut self, stage: Stage, code: &'static str, message: impl Into<CowStr>) {
        self.push(Diagnostic::error(stage, code, message));
    }

    pub fn warn(&mut self, stage: Stage, code: &'static str, message: impl Into<CowStr>) {
        self.push(Diagnostic::warning(stage, code, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.diagnostics.iter().map(|d| d.code.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn extend(&mut self, other: RowReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Errors that abort the whole batch: reference-data load and stream I/O.
///
/// Only these two classes of failure abort the process; every row-shaped
/// problem is a [`Diagnostic`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceLoadError {
    #[error("failed to read reference snapshot file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference snapshot TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate ingredient id in reference snapshot: {0}")]
    DuplicateIngredientId(String),
    #[error("duplicate form id in reference snapshot: {0}")]
    DuplicateFormId(String),
    #[error("duplicate density id in reference snapshot: {0}")]
    DuplicateDensityId(String),
    #[error("density {density_id} references unknown ingredient {ingredient_id}")]
    UnknownIngredientRef {
        density_id: String,
        ingredient_id: String,
    },
    #[error("density {density_id} references unknown form {form_id}")]
    UnknownFormRef { density_id: String, form_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to read input row stream: {0}")]
    InputIo(#[source] std::io::Error),
    #[error("failed to write output record stream: {0}")]
    OutputIo(#[source] std::io::Error),
    #[error("malformed input row at line {line}: {source}")]
    MalformedRow {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    ReferenceLoad(#[from] ReferenceLoadError),
}
