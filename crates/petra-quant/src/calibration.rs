//! Tracer calibration table.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuantError;

/// Imaging mode selecting the standardized output scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracerMode {
    Amyloid,
    Tau,
}

impl TracerMode {
    /// Key used in the calibration table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TracerMode::Amyloid => "amyloid",
            TracerMode::Tau => "tau",
        }
    }

    /// Name of the scale the calibrated value is expressed on.
    pub fn scale_units(&self) -> &'static str {
        match self {
            TracerMode::Amyloid => "Centiloid",
            TracerMode::Tau => "CenTauR (experimental)",
        }
    }
}

impl fmt::Display for TracerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear calibration coefficients for one tracer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    #[serde(default = "default_slope")]
    pub slope: f64,
    #[serde(default)]
    pub intercept: f64,
}

fn default_slope() -> f64 {
    1.0
}

impl CalibrationEntry {
    pub fn identity() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }
}

impl Default for CalibrationEntry {
    fn default() -> Self {
        Self::identity()
    }
}

/// Mode- and tracer-keyed calibration coefficients.
///
/// Loaded once from YAML and treated as read-only. Lookup falls back from
/// the exact tracer key to a `generic` entry within the mode, and finally
/// to the identity mapping when the mode or tracer is unknown, so an
/// unrecognized tracer still yields the uncalibrated ratio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationTable {
    modes: HashMap<String, HashMap<String, CalibrationEntry>>,
}

impl CalibrationTable {
    /// An empty table: every lookup resolves to the identity entry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse from YAML of the form
    /// `mode -> tracer -> {slope, intercept}`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, QuantError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuantError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| QuantError::CalibrationIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Resolve the coefficients for a tracer within a mode.
    pub fn resolve(&self, mode: TracerMode, tracer: &str) -> CalibrationEntry {
        let Some(table) = self.modes.get(mode.as_str()) else {
            debug!(%mode, tracer, "mode absent from calibration table, using identity");
            return CalibrationEntry::identity();
        };
        if let Some(entry) = table.get(tracer) {
            return *entry;
        }
        if let Some(entry) = table.get("generic") {
            debug!(%mode, tracer, "tracer not calibrated, using generic entry");
            return *entry;
        }
        debug!(%mode, tracer, "no calibration entry matched, using identity");
        CalibrationEntry::identity()
    }
}
