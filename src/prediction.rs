// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Quit Probability Capability
//
// The engine does not train models. It consumes one through `QuitModel` and
// holds the current instance in a `ModelCache` that the retraining side can
// invalidate at any time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::QuitFeatures;
use crate::error::{CapabilityError, SimError, SimResult};

const CAPABILITY: &str = "quit model";

/// Yearly quit probability for one agent. Implementations must be pure.
pub trait QuitModel: Send + Sync + std::fmt::Debug {
    fn predict_yearly_quit_probability(
        &self,
        features: &QuitFeatures,
    ) -> Result<f64, CapabilityError>;
}

/// Reject NaN and out-of-range model output.
pub fn checked_probability(p: f64) -> Result<f64, CapabilityError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(CapabilityError::invalid(CAPABILITY, format!("probability {p} outside [0, 1]")))
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Same probability for everyone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantQuitModel(pub f64);

impl QuitModel for ConstantQuitModel {
    fn predict_yearly_quit_probability(
        &self,
        _features: &QuitFeatures,
    ) -> Result<f64, CapabilityError> {
        checked_probability(self.0)
    }
}

/// Exported linear classifier: `sigmoid(intercept + sum(w * x))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticQuitModel {
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl LogisticQuitModel {
    /// Build a model, rejecting coefficients for features the engine does
    /// not produce.
    pub fn new(
        intercept: f64,
        coefficients: BTreeMap<String, f64>,
    ) -> Result<Self, CapabilityError> {
        let model = Self { intercept, coefficients };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(text: &str) -> SimResult<Self> {
        let model: Self = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let model = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), features = model.coefficients.len(), "quit model loaded");
        Ok(model)
    }

    fn validate(&self) -> Result<(), CapabilityError> {
        if !self.intercept.is_finite() {
            return Err(CapabilityError::invalid(CAPABILITY, "intercept is not finite"));
        }
        for (name, w) in &self.coefficients {
            if !QuitFeatures::is_known(name) {
                let reason = format!("unknown feature {name:?}");
                return Err(CapabilityError::invalid(CAPABILITY, reason));
            }
            if !w.is_finite() {
                let reason = format!("coefficient for {name:?} is not finite");
                return Err(CapabilityError::invalid(CAPABILITY, reason));
            }
        }
        Ok(())
    }
}

impl QuitModel for LogisticQuitModel {
    fn predict_yearly_quit_probability(
        &self,
        features: &QuitFeatures,
    ) -> Result<f64, CapabilityError> {
        let mut z = self.intercept;
        for (name, w) in &self.coefficients {
            let x = features.get(name).ok_or_else(|| {
                CapabilityError::invalid(CAPABILITY, format!("unknown feature {name:?}"))
            })?;
            z += w * x;
        }
        checked_probability(1.0 / (1.0 + (-z).exp()))
    }
}

// ---------------------------------------------------------------------------
// ModelCache
// ---------------------------------------------------------------------------

pub type SharedQuitModel = Arc<dyn QuitModel>;
pub type ModelLoader = Box<dyn Fn() -> SimResult<SharedQuitModel> + Send + Sync>;

/// Holder for the current quit model. With a loader attached, an empty
/// cache reloads on the next `get()`; without one it reports
/// `NotConfigured`.
pub struct ModelCache {
    current: RwLock<Option<SharedQuitModel>>,
    loader: Option<ModelLoader>,
}

impl ModelCache {
    pub fn empty() -> Self {
        Self { current: RwLock::new(None), loader: None }
    }

    pub fn with_model(model: SharedQuitModel) -> Self {
        Self { current: RwLock::new(Some(model)), loader: None }
    }

    pub fn with_loader(loader: ModelLoader) -> Self {
        Self { current: RwLock::new(None), loader: Some(loader) }
    }

    pub fn get(&self) -> SimResult<SharedQuitModel> {
        if let Some(model) = self.current.read().as_ref() {
            return Ok(Arc::clone(model));
        }
        if self.loader.is_some() {
            return self.reload();
        }
        Err(CapabilityError::not_configured(CAPABILITY).into())
    }

    pub fn install(&self, model: SharedQuitModel) {
        *self.current.write() = Some(model);
    }

    /// Drop the current model. Runs already holding it keep their copy.
    pub fn invalidate(&self) {
        if self.current.write().take().is_some() {
            debug!("quit model invalidated");
        }
    }

    /// Run the loader and install its result.
    pub fn reload(&self) -> SimResult<SharedQuitModel> {
        let loader = self
            .loader
            .as_ref()
            .ok_or(SimError::Capability(CapabilityError::not_configured(CAPABILITY)))?;
        let model = loader()?;
        self.install(Arc::clone(&model));
        debug!("quit model reloaded");
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("loaded", &self.is_loaded())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}
