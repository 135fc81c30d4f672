// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Calibration Constants
//
// Rate constants derived offline from historical attrition data. The engine
// only reads them; when the export is missing or unreadable it falls back to
// the defaults below and says so in the report.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Externally derived rate parameters. Keys missing from the export keep
/// their default; keys the engine does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Base monthly stress gain before workload and policy scaling.
    pub stress_gain_rate: f64,
    /// Stress shed every month.
    pub recovery_rate: f64,
    pub shockwave_stress_factor: f64,
    pub shockwave_loyalty_factor: f64,
    /// Yearly quit probability above which stress-driven quits are possible.
    pub quit_threshold: f64,
    pub stress_threshold: f64,
    /// Baseline monthly turnover independent of state.
    pub monthly_natural_rate: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            stress_gain_rate: 0.0132,
            recovery_rate: 0.0104,
            shockwave_stress_factor: 0.268,
            shockwave_loyalty_factor: 0.093,
            quit_threshold: 0.37,
            stress_threshold: 0.5,
            monthly_natural_rate: 0.0145,
        }
    }
}

impl Calibration {
    fn is_usable(&self) -> bool {
        let rates = [
            self.stress_gain_rate,
            self.recovery_rate,
            self.shockwave_stress_factor,
            self.shockwave_loyalty_factor,
            self.quit_threshold,
            self.stress_threshold,
            self.monthly_natural_rate,
        ];
        rates.iter().all(|r| r.is_finite() && *r >= 0.0)
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Loaded from a calibration export.
    Calibrated,
    /// Export unavailable; built-in defaults in use.
    Defaults,
}

impl fmt::Display for CalibrationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibrated => write!(f, "calibrated"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// Calibration in effect for a batch, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedCalibration {
    pub calibration: Calibration,
    pub source: CalibrationSource,
}

impl LoadedCalibration {
    pub fn defaults() -> Self {
        Self { calibration: Calibration::default(), source: CalibrationSource::Defaults }
    }

    pub fn calibrated(calibration: Calibration) -> Self {
        Self { calibration, source: CalibrationSource::Calibrated }
    }
}

impl Default for LoadedCalibration {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Load the calibration export at `path`. Never fails: a missing path, an
/// unreadable file, malformed JSON or negative rates all fall back to the
/// defaults with a warning.
pub fn load_calibration(path: Option<&Path>) -> LoadedCalibration {
    let Some(path) = path else {
        warn!("no calibration file configured; using default rates");
        return LoadedCalibration::defaults();
    };
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "calibration unavailable; using default rates"
            );
            return LoadedCalibration::defaults();
        }
    };
    match serde_json::from_str::<Calibration>(&text) {
        Ok(cal) if cal.is_usable() => {
            info!(path = %path.display(), "calibration loaded");
            LoadedCalibration::calibrated(cal)
        }
        Ok(_) => {
            warn!(
                path = %path.display(),
                "calibration has negative or non-finite rates; using default rates"
            );
            LoadedCalibration::defaults()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "calibration is malformed; using default rates"
            );
            LoadedCalibration::defaults()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn defaults_when_unconfigured_or_missing() {
        let loaded = load_calibration(None);
        assert_eq!(loaded.source, CalibrationSource::Defaults);
        assert_eq!(loaded.calibration, Calibration::default());

        let dir = tempfile::tempdir().expect("temp dir");
        let loaded = load_calibration(Some(&dir.path().join("calibration.json")));
        assert_eq!(loaded.source, CalibrationSource::Defaults);
    }

    #[test]
    fn partial_export_keeps_remaining_defaults() {
        let file =
            write_temp(r#"{"stress_gain_rate": 0.02, "natural_scale": 1.7, "prob_scale": 0.4}"#);
        let loaded = load_calibration(Some(file.path()));
        assert_eq!(loaded.source, CalibrationSource::Calibrated);
        assert_eq!(loaded.calibration.stress_gain_rate, 0.02);
        assert_eq!(loaded.calibration.recovery_rate, 0.0104);
        assert_eq!(loaded.calibration.monthly_natural_rate, 0.0145);
    }

    #[test]
    fn malformed_export_falls_back() {
        let file = write_temp("{ not json");
        assert_eq!(load_calibration(Some(file.path())), LoadedCalibration::defaults());

        let file = write_temp(r#"{"recovery_rate": -0.5}"#);
        assert_eq!(load_calibration(Some(file.path())).source, CalibrationSource::Defaults);
    }

    #[test]
    fn source_serializes_snake_case() {
        let json = serde_json::to_string(&CalibrationSource::Defaults).expect("serialize");
        assert_eq!(json, "\"defaults\"");
        assert_eq!(CalibrationSource::Calibrated.to_string(), "calibrated");
    }
}
