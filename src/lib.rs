// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite

pub mod types;
pub mod error;
pub mod rounding;
pub mod agent;
pub mod graph;
pub mod behavior;
pub mod attrition;
pub mod time_engine;
pub mod monte_carlo;
pub mod policies;
pub mod calibration;
pub mod prediction;
pub mod population;

pub use types::*;
pub use agent::{burnout_threshold, Agent, AgentState, QuitFeatures};
pub use calibration::{load_calibration, Calibration, CalibrationSource, LoadedCalibration};
pub use error::{CapabilityError, SimError, SimResult};
pub use graph::{Edge, GraphTemplate, Organization, RelationshipGraph, TemplateCache};
pub use monte_carlo::{
    aggregate_logs, AggregatedReport, CancellationToken, MetricStats, MonteCarloRunner,
    MonthAggregate,
};
pub use policies::{list_policies, policy, PolicyOverrides, SimulationConfig, POLICY_NAMES};
pub use population::{InMemoryPopulation, JsonPopulationFile, PopulationSource};
pub use prediction::{ConstantQuitModel, LogisticQuitModel, ModelCache, QuitModel, SharedQuitModel};
pub use time_engine::{SimulationResult, TimeEngine};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ─── Simulator Interface ────────────────────────────────────────────────────

/// A preset (or overridden preset) together with the name it reports under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPolicy {
    pub name: String,
    pub config: SimulationConfig,
}

impl NamedPolicy {
    pub fn new(name: impl Into<String>, config: SimulationConfig) -> Self {
        Self { name: name.into(), config }
    }

    pub fn preset(name: &str) -> SimResult<Self> {
        Ok(Self::new(name, policy(name)?))
    }

    pub fn with_duration(mut self, months: u32) -> Self {
        self.config.duration_months = months;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyComparison {
    pub policy_a: AggregatedReport,
    pub policy_b: AggregatedReport,
}

impl PolicyComparison {
    /// Final-month mean of `metric` under B minus under A.
    pub fn final_delta(&self, metric: &str) -> Option<f64> {
        let a = self.policy_a.final_month()?.metric(metric)?.mean;
        let b = self.policy_b.final_month()?.metric(metric)?.mean;
        Some(b - a)
    }
}

/// Entry point bundling the population source, the quit model and the
/// calibration in effect.
#[derive(Debug)]
pub struct WorkforceSimulator {
    runner: MonteCarloRunner,
}

impl WorkforceSimulator {
    pub fn new(
        source: Arc<dyn PopulationSource>,
        models: Arc<ModelCache>,
        calibration: LoadedCalibration,
    ) -> Self {
        Self { runner: MonteCarloRunner::new(source, models, calibration) }
    }

    pub fn from_runner(runner: MonteCarloRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &MonteCarloRunner {
        &self.runner
    }

    pub fn run_policy(
        &self,
        policy: &NamedPolicy,
        trial_count: usize,
    ) -> SimResult<AggregatedReport> {
        self.runner.run(&policy.config, trial_count, &policy.name)
    }

    /// Like `run_policy`, also handing back each trial's monthly logs.
    pub fn run_policy_with_trials(
        &self,
        policy: &NamedPolicy,
        trial_count: usize,
    ) -> SimResult<(AggregatedReport, Vec<Vec<MonthlyLog>>)> {
        self.runner.run_with_trials(&policy.config, trial_count, &policy.name)
    }

    /// Run both policies with the same seeds so the comparison is paired.
    pub fn compare_policies(
        &self,
        policy_a: &NamedPolicy,
        policy_b: &NamedPolicy,
        trial_count: usize,
    ) -> SimResult<PolicyComparison> {
        Ok(PolicyComparison {
            policy_a: self.run_policy(policy_a, trial_count)?,
            policy_b: self.run_policy(policy_b, trial_count)?,
        })
    }

    pub fn list_policies() -> Vec<(&'static str, SimulationConfig)> {
        list_policies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::record;

    fn simulator(p: f64) -> WorkforceSimulator {
        let records = (1..=8)
            .map(|i| record(i, "R&D", 1 + (i % 2) as u32, (i > 1).then_some(1)))
            .collect();
        WorkforceSimulator::new(
            Arc::new(InMemoryPopulation::new(records)),
            Arc::new(ModelCache::with_model(Arc::new(ConstantQuitModel(p)))),
            LoadedCalibration::defaults(),
        )
    }

    #[test]
    fn compare_runs_both_policies() {
        let sim = simulator(0.3);
        let a = NamedPolicy::preset("baseline").unwrap().with_duration(4);
        let b = NamedPolicy::preset("kpi_pressure").unwrap().with_duration(4);
        let cmp = sim.compare_policies(&a, &b, 3).unwrap();
        assert_eq!(cmp.policy_a.policy_name, "baseline");
        assert_eq!(cmp.policy_b.policy_name, "kpi_pressure");
        assert_eq!(cmp.policy_a.results.len(), 4);
        // More workload, more stress
        assert!(cmp.final_delta("avg_stress").unwrap() > 0.0);
        assert_eq!(cmp.final_delta("vibes"), None);
    }

    #[test]
    fn trial_logs_match_the_report() {
        let sim = simulator(0.3);
        let policy = NamedPolicy::preset("layoff").unwrap().with_duration(3);
        let (report, trials) = sim.run_policy_with_trials(&policy, 2).unwrap();
        assert_eq!(trials.len(), 2);
        assert!(trials.iter().all(|t| t.len() == 3));
        let seed = report.base_seed + 1;
        let base = sim.runner().base_organization().unwrap();
        let replay = sim.runner().run_trial(&base, &policy.config, seed).unwrap();
        assert_eq!(replay.logs, trials[1]);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(matches!(
            NamedPolicy::preset("unlimited_pto"),
            Err(SimError::Capability(CapabilityError::InvalidInput { .. }))
        ));
    }

    #[test]
    fn lists_all_presets() {
        let names: Vec<&str> =
            WorkforceSimulator::list_policies().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, POLICY_NAMES.to_vec());
    }
}
