//! A deterministic, idempotent batch transformer for Stage-2 ingredient
//! canonicalization: turns loosely-structured recipe ingredient lines
//! (`"1/2 cup chia seeds"`) into a record carrying a machine-usable numeric
//! quantity (grams, millilitres, or count), a linked ingredient identity, a
//! resolved physical form, and the audit trail of how each decision was reached.
//!
//! The pipeline is nine stages over one row, leaf-first:
//! [`reference`] (read-only indexed reference data) feeds [`intake`]
//! (validation and dedup), which feeds [`quantity`], [`units`], [`package`],
//! [`linker`], [`form`], [`dimension`], [`bridge`] and finally [`convert`]. No
//! stage rewrites a field an earlier stage wrote; [`record::CanonicalRecord`]
//! accumulates monotonically. [`pipeline`] wires the stages together and runs
//! rows independently and in parallel.
//!
//! # Basic usage
//! ```no_run
//! use ingredient_canon::{config::PipelineConfig, pipeline, reference::ReferenceRepository};
//!
//! let repo = ReferenceRepository::load("reference.toml")?;
//! let config = PipelineConfig::default();
//! let rows = vec![]; // parsed from an NDJSON input stream
//! let (records, rejections) = pipeline::run_batch(&rows, &repo, &config);
//! # Ok::<(), ingredient_canon::error::ReferenceLoadError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod constants;
pub mod convert;
pub mod dimension;
pub mod error;
pub mod form;
pub mod intake;
pub mod linker;
pub mod package;
pub mod pipeline;
pub mod quantity;
pub mod record;
pub mod reference;
pub mod report;
pub mod text;
pub mod units;

pub use config::PipelineConfig;
pub use record::{CanonicalRecord, InputRow};
pub use reference::ReferenceRepository;
