// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Time Engine
//
// One full run: months 1..=duration in strict sequence. Each month runs the
// behavior step, then layoffs and quits, then backfill, then records a
// MonthlyLog. The only nondeterminism is the caller's RNG.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attrition::{backfill_hires, decide_quits, process_departures, select_layoffs, Departure};
use crate::behavior::step_population;
use crate::calibration::Calibration;
use crate::error::SimResult;
use crate::graph::Organization;
use crate::policies::SimulationConfig;
use crate::population::{require_population, PopulationSource};
use crate::prediction::SharedQuitModel;
use crate::types::{DepartureKind, MonthlyLog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub logs: Vec<MonthlyLog>,
}

pub struct TimeEngine {
    config: SimulationConfig,
    calibration: Calibration,
    model: SharedQuitModel,
}

impl TimeEngine {
    pub fn new(config: SimulationConfig, calibration: Calibration, model: SharedQuitModel) -> Self {
        Self { config, calibration, model }
    }

    /// Run every month against `org`, which is consumed.
    pub fn run<R: Rng + ?Sized>(
        &self,
        mut org: Organization,
        rng: &mut R,
    ) -> SimResult<SimulationResult> {
        self.config.validate()?;
        org.graph.verify_bindings(&org.agents)?;
        info!(
            headcount = org.headcount(),
            months = self.config.duration_months,
            "simulation started"
        );

        let mut next_id = org.max_id().0;
        let mut logs = Vec::with_capacity(self.config.duration_months as usize);
        for month in 1..=self.config.duration_months {
            logs.push(self.step_month(&mut org, month, &mut next_id, rng)?);
        }

        info!(headcount = org.headcount(), "simulation complete");
        Ok(SimulationResult { config: self.config.clone(), logs })
    }

    /// Load a population from `source`, build its graph and run.
    pub fn run_from_source<R: Rng + ?Sized>(
        &self,
        source: &dyn PopulationSource,
        rng: &mut R,
    ) -> SimResult<SimulationResult> {
        let org = Organization::from_records(require_population(source)?);
        self.run(org, rng)
    }

    /// Advance `org` by one month. `next_id` is the last agent id issued.
    pub fn step_month<R: Rng + ?Sized>(
        &self,
        org: &mut Organization,
        month: u32,
        next_id: &mut u64,
        rng: &mut R,
    ) -> SimResult<MonthlyLog> {
        step_population(&mut org.agents, &org.graph, &self.config, &self.calibration);

        let layoffs = select_layoffs(&org.agents, self.config.layoff_ratio);
        let laid_off: BTreeSet<usize> = layoffs.iter().copied().collect();
        let quits =
            decide_quits(&org.agents, &laid_off, self.model.as_ref(), &self.calibration, rng)?;

        let departures: Vec<Departure> = layoffs
            .iter()
            .map(|&slot| Departure { slot, kind: DepartureKind::Layoff })
            .chain(quits.iter().map(|&slot| Departure { slot, kind: DepartureKind::VoluntaryQuit }))
            .collect();
        process_departures(org, &departures, &self.config, &self.calibration)?;

        let hires = if self.config.hiring_active {
            backfill_hires(org, &quits, next_id)
        } else {
            0
        };

        let log = capture_metrics(month, org, layoffs.len(), quits.len(), hires);
        debug!(
            month,
            headcount = log.headcount,
            quits = log.attrition_count,
            layoffs = log.layoff_count,
            hires = log.hire_count,
            avg_stress = log.avg_stress,
            burnout = log.burnout_count,
            "month complete"
        );
        Ok(log)
    }
}

impl std::fmt::Debug for TimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeEngine")
            .field("config", &self.config)
            .field("calibration", &self.calibration)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the still-active agents. Means are 0 for an empty workforce.
pub fn capture_metrics(
    month: u32,
    org: &Organization,
    layoff_count: usize,
    attrition_count: usize,
    hire_count: usize,
) -> MonthlyLog {
    let active: Vec<_> = org.active_agents().collect();
    let n = active.len();
    let mean = |f: fn(&crate::agent::Agent) -> f64| {
        if n == 0 {
            0.0
        } else {
            active.iter().map(|a| f(a)).sum::<f64>() / n as f64
        }
    };
    MonthlyLog {
        month,
        headcount: n,
        attrition_count,
        layoff_count,
        hire_count,
        avg_stress: mean(|a| a.state.stress),
        avg_productivity: mean(|a| a.state.productivity),
        avg_motivation: mean(|a| a.state.motivation),
        avg_job_satisfaction: mean(|a| a.state.job_satisfaction),
        avg_work_life_balance: mean(|a| a.state.work_life_balance),
        avg_loyalty: mean(|a| a.state.loyalty),
        burnout_count: active.iter().filter(|a| a.is_burned_out()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::record;
    use crate::error::{CapabilityError, SimError};
    use crate::policies::policy;
    use crate::population::InMemoryPopulation;
    use crate::prediction::ConstantQuitModel;
    use rand::rngs::mock::StepRng;
    use std::sync::Arc;

    fn engine(config: SimulationConfig, p: f64) -> TimeEngine {
        TimeEngine::new(config, Calibration::default(), Arc::new(ConstantQuitModel(p)))
    }

    fn team() -> Organization {
        Organization::from_records(vec![
            record(1, "R&D", 3, None),
            record(2, "R&D", 2, Some(1)),
            record(3, "R&D", 2, Some(1)),
            record(4, "Sales", 1, None),
        ])
    }

    #[test]
    fn produces_one_log_per_month() {
        let cfg = policy("kpi_pressure").unwrap().with_duration(6);
        let result = engine(cfg, 0.1).run(team(), &mut StepRng::new(u64::MAX, 0)).unwrap();
        assert_eq!(result.logs.len(), 6);
        let months: Vec<u32> = result.logs.iter().map(|l| l.month).collect();
        assert_eq!(months, vec![1, 2, 3, 4, 5, 6]);
        assert!(result.logs.iter().all(|l| l.headcount == 4 && l.attrition_count == 0));
    }

    #[test]
    fn natural_attrition_with_backfill_keeps_headcount() {
        let mut cfg = policy("baseline").unwrap().with_duration(3);
        cfg.hiring_active = true;
        let result = engine(cfg, 0.1).run(team(), &mut StepRng::new(0, 0)).unwrap();
        for log in &result.logs {
            assert_eq!(log.attrition_count, 4);
            assert_eq!(log.hire_count, 4);
            assert_eq!(log.headcount, 4);
        }
    }

    #[test]
    fn natural_attrition_without_backfill_empties_org() {
        let cfg = policy("baseline").unwrap().with_duration(2);
        let result = engine(cfg, 0.1).run(team(), &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(result.logs[0].headcount, 0);
        assert_eq!(result.logs[0].attrition_count, 4);
        assert_eq!(result.logs[1], MonthlyLog { month: 2, ..MonthlyLog::default() });
    }

    #[test]
    fn hire_ids_are_never_reused() {
        let mut cfg = policy("baseline").unwrap().with_duration(2);
        cfg.hiring_active = true;
        let e = engine(cfg, 0.1);
        let mut org = team();
        let mut next_id = org.max_id().0;
        let mut rng = StepRng::new(0, 0);
        e.step_month(&mut org, 1, &mut next_id, &mut rng).unwrap();
        e.step_month(&mut org, 2, &mut next_id, &mut rng).unwrap();
        assert_eq!(next_id, 12);
        let mut ids: Vec<u64> = org.agents.iter().map(|a| a.id().0).collect();
        ids.dedup();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn burnout_counts_agents_over_their_limit() {
        let e = engine(policy("baseline").unwrap().with_duration(1), 0.1);
        let mut org = team();
        // Manager and the lone Sales hire will pick up some stress this month
        org.agents[0].burnout_limit = 0.0;
        org.agents[3].burnout_limit = 0.0;
        let mut next_id = org.max_id().0;
        let log = e.step_month(&mut org, 1, &mut next_id, &mut StepRng::new(u64::MAX, 0)).unwrap();
        assert_eq!(log.headcount, 4);
        assert!(org.agents[3].state.stress > 0.0);
        assert_eq!(log.burnout_count, 2);
    }

    #[test]
    fn model_failure_aborts_run() {
        let cfg = policy("baseline").unwrap().with_duration(2);
        let err = engine(cfg, 2.0).run(team(), &mut StepRng::new(u64::MAX, 0)).unwrap_err();
        assert!(matches!(err, SimError::Capability(CapabilityError::InvalidInput { .. })));
    }

    #[test]
    fn run_from_empty_source_is_not_configured() {
        let e = engine(SimulationConfig::default(), 0.1);
        let err = e
            .run_from_source(&InMemoryPopulation::default(), &mut StepRng::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, SimError::Capability(CapabilityError::NotConfigured { .. })));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = policy("baseline").unwrap().with_duration(0);
        let err = engine(cfg, 0.1).run(team(), &mut StepRng::new(0, 0)).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }
}
