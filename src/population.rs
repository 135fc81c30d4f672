// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Population Sources

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{CapabilityError, SimResult};
use crate::types::EmployeeRecord;

/// Supplier of cleaned employee records. Called once per batch.
pub trait PopulationSource: Send + Sync {
    fn load_population(&self) -> SimResult<Vec<EmployeeRecord>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPopulation {
    records: Vec<EmployeeRecord>,
}

impl InMemoryPopulation {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}

impl PopulationSource for InMemoryPopulation {
    fn load_population(&self) -> SimResult<Vec<EmployeeRecord>> {
        Ok(self.records.clone())
    }
}

/// JSON array of `EmployeeRecord` on disk.
#[derive(Debug, Clone)]
pub struct JsonPopulationFile {
    path: PathBuf,
}

impl JsonPopulationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PopulationSource for JsonPopulationFile {
    fn load_population(&self) -> SimResult<Vec<EmployeeRecord>> {
        let text = fs::read_to_string(&self.path)?;
        let records: Vec<EmployeeRecord> = serde_json::from_str(&text)?;
        info!(path = %self.path.display(), employees = records.len(), "population loaded");
        Ok(records)
    }
}

/// Load from `source`, treating an empty population as not configured.
pub fn require_population(source: &dyn PopulationSource) -> SimResult<Vec<EmployeeRecord>> {
    let records = source.load_population()?;
    if records.is_empty() {
        return Err(CapabilityError::not_configured("population").into());
    }
    Ok(records)
}
