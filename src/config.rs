//! Pipeline configuration: the density plausibility band and the pinned
//! `today` are explicitly configurable rather than hardcoded. A plain serde
//! struct, deserialized from TOML, with `Default` providing the fallbacks.

use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Default plausible density band, g/mL. Per-ingredient/form overrides
    /// are not yet part of the snapshot format; see `DESIGN.md`.
    pub density_plausible_min: f64,
    pub density_plausible_max: f64,
    /// Fuzzy-match acceptance threshold.
    pub fuzzy_accept_threshold: f64,
    /// Fuzzy-match review threshold.
    pub fuzzy_review_threshold: f64,
    /// Pins `today` for evaluating density effective windows, for reproducible
    /// re-runs. `None` uses the process clock.
    pub today: Option<Date>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            density_plausible_min: 0.05,
            density_plausible_max: 2.0,
            fuzzy_accept_threshold: 0.92,
            fuzzy_review_threshold: 0.80,
            today: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::ReferenceLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| crate::error::ReferenceLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn resolved_today(&self) -> Date {
        self.today.unwrap_or_else(crate::reference::today_placeholder)
    }

    pub fn plausible_band(&self) -> std::ops::RangeInclusive<f64> {
        self.density_plausible_min..=self.density_plausible_max
    }
}
