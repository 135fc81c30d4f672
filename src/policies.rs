// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Management Policies
//
// A policy is a named SimulationConfig preset. The driver can start from a
// preset and override individual knobs from a TOML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CapabilityError, SimError, SimResult};

pub const POLICY_NAMES: [&str; 6] = [
    "baseline",
    "remote_work",
    "kpi_pressure",
    "hiring_freeze",
    "layoff",
    "promotion_freeze",
];

pub const DEFAULT_DURATION_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub workload_multiplier: f64,
    pub motivation_decay_rate: f64,
    pub shock_factor: f64,
    pub hiring_active: bool,
    pub layoff_ratio: f64,
    pub stress_gain_rate: f64,
    pub duration_months: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workload_multiplier: 1.0,
            motivation_decay_rate: 0.005,
            shock_factor: 0.2,
            hiring_active: false,
            layoff_ratio: 0.0,
            stress_gain_rate: 1.0,
            duration_months: DEFAULT_DURATION_MONTHS,
        }
    }
}

impl SimulationConfig {
    pub fn with_duration(mut self, months: u32) -> Self {
        self.duration_months = months;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        let check = |ok: bool, msg: &str| {
            if ok {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(msg.to_string()))
            }
        };
        check(
            self.workload_multiplier.is_finite() && self.workload_multiplier > 0.0,
            "workload_multiplier must be positive",
        )?;
        check(
            (0.0..=1.0).contains(&self.motivation_decay_rate),
            "motivation_decay_rate must be in [0, 1]",
        )?;
        check(
            self.shock_factor.is_finite() && self.shock_factor >= 0.0,
            "shock_factor must be non-negative",
        )?;
        check((0.0..1.0).contains(&self.layoff_ratio), "layoff_ratio must be in [0, 1)")?;
        check(
            self.stress_gain_rate.is_finite() && self.stress_gain_rate >= 0.0,
            "stress_gain_rate must be non-negative",
        )?;
        check(self.duration_months > 0, "duration_months must be at least 1")
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Named preset. Unknown names are rejected with the list of valid ones.
pub fn policy(name: &str) -> Result<SimulationConfig, CapabilityError> {
    let base = SimulationConfig::default();
    let config = match name {
        "baseline" => base,
        "remote_work" => SimulationConfig {
            workload_multiplier: 0.9,
            motivation_decay_rate: 0.004,
            shock_factor: 0.15,
            stress_gain_rate: 0.8,
            ..base
        },
        "kpi_pressure" => SimulationConfig {
            workload_multiplier: 1.3,
            motivation_decay_rate: 0.008,
            shock_factor: 0.25,
            stress_gain_rate: 1.2,
            ..base
        },
        "hiring_freeze" => SimulationConfig {
            hiring_active: false,
            workload_multiplier: 1.2,
            motivation_decay_rate: 0.008,
            shock_factor: 0.25,
            ..base
        },
        "layoff" => SimulationConfig {
            layoff_ratio: 0.15,
            stress_gain_rate: 1.8,
            shock_factor: 0.4,
            hiring_active: false,
            motivation_decay_rate: 0.02,
            ..base
        },
        "promotion_freeze" => SimulationConfig {
            motivation_decay_rate: 0.02,
            workload_multiplier: 1.1,
            shock_factor: 0.2,
            ..base
        },
        other => {
            return Err(CapabilityError::invalid(
                "policy registry",
                format!("unknown policy {other:?}; available: {}", POLICY_NAMES.join(", ")),
            ))
        }
    };
    Ok(config)
}

pub fn list_policies() -> Vec<(&'static str, SimulationConfig)> {
    POLICY_NAMES
        .iter()
        .filter_map(|&name| policy(name).ok().map(|cfg| (name, cfg)))
        .collect()
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Partial config read from TOML. `base` names the preset to start from.
///
/// ```toml
/// base = "kpi_pressure"
/// duration_months = 24
/// hiring_active = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverrides {
    pub base: Option<String>,
    pub workload_multiplier: Option<f64>,
    pub motivation_decay_rate: Option<f64>,
    pub shock_factor: Option<f64>,
    pub hiring_active: Option<bool>,
    pub layoff_ratio: Option<f64>,
    pub stress_gain_rate: Option<f64>,
    pub duration_months: Option<u32>,
}

impl PolicyOverrides {
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(v) = self.workload_multiplier {
            config.workload_multiplier = v;
        }
        if let Some(v) = self.motivation_decay_rate {
            config.motivation_decay_rate = v;
        }
        if let Some(v) = self.shock_factor {
            config.shock_factor = v;
        }
        if let Some(v) = self.hiring_active {
            config.hiring_active = v;
        }
        if let Some(v) = self.layoff_ratio {
            config.layoff_ratio = v;
        }
        if let Some(v) = self.stress_gain_rate {
            config.stress_gain_rate = v;
        }
        if let Some(v) = self.duration_months {
            config.duration_months = v;
        }
        config
    }

    /// Resolve to a validated config. `fallback` names the preset used when
    /// the file does not set `base`. Returns the preset name alongside.
    pub fn resolve(&self, fallback: &str) -> SimResult<(String, SimulationConfig)> {
        let name = self.base.clone().unwrap_or_else(|| fallback.to_string());
        let config = self.apply(policy(&name)?);
        config.validate()?;
        Ok((name, config))
    }
}
