// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Monte Carlo Runner
//
// N independent TimeEngine runs from one base population. Trial `i` is
// seeded with `base_seed + i`, so any single trial can be replayed alone.
// Per month and metric the runner reports mean/min/max/std across trials.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calibration::{CalibrationSource, LoadedCalibration};
use crate::error::{SimError, SimResult};
use crate::graph::{Organization, TemplateCache};
use crate::policies::SimulationConfig;
use crate::population::{require_population, PopulationSource};
use crate::prediction::ModelCache;
use crate::rounding::round_stat;
use crate::time_engine::{SimulationResult, TimeEngine};
use crate::types::MonthlyLog;

pub const DEFAULT_BASE_SEED: u64 = 0;

// ─── Statistics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation; 0 for a single sample.
    pub std: f64,
}

impl MetricStats {
    /// Welford accumulation, rounded to 4 decimal places.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut n = 0.0;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &x in samples {
            n += 1.0;
            let delta = x - mean;
            mean += delta / n;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }
        Self {
            mean: round_stat(mean),
            min: round_stat(min),
            max: round_stat(max),
            std: round_stat((m2 / n).max(0.0).sqrt()),
        }
    }
}

// ─── Aggregated Report ──────────────────────────────────────────────────────

/// One month across all trials, keyed by MonthlyLog metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAggregate {
    pub month: u32,
    pub headcount: MetricStats,
    pub attrition_count: MetricStats,
    pub layoff_count: MetricStats,
    pub hire_count: MetricStats,
    pub avg_stress: MetricStats,
    pub avg_productivity: MetricStats,
    pub avg_motivation: MetricStats,
    pub avg_job_satisfaction: MetricStats,
    pub avg_work_life_balance: MetricStats,
    pub avg_loyalty: MetricStats,
    pub burnout_count: MetricStats,
}

impl MonthAggregate {
    pub const METRICS: [&'static str; 11] = [
        "headcount",
        "attrition_count",
        "layoff_count",
        "hire_count",
        "avg_stress",
        "avg_productivity",
        "avg_motivation",
        "avg_job_satisfaction",
        "avg_work_life_balance",
        "avg_loyalty",
        "burnout_count",
    ];

    fn from_month(month: u32, logs: &[&MonthlyLog]) -> Self {
        let stats = |f: fn(&MonthlyLog) -> f64| {
            MetricStats::from_samples(&logs.iter().map(|l| f(l)).collect::<Vec<_>>())
        };
        Self {
            month,
            headcount: stats(|l| l.headcount as f64),
            attrition_count: stats(|l| l.attrition_count as f64),
            layoff_count: stats(|l| l.layoff_count as f64),
            hire_count: stats(|l| l.hire_count as f64),
            avg_stress: stats(|l| l.avg_stress),
            avg_productivity: stats(|l| l.avg_productivity),
            avg_motivation: stats(|l| l.avg_motivation),
            avg_job_satisfaction: stats(|l| l.avg_job_satisfaction),
            avg_work_life_balance: stats(|l| l.avg_work_life_balance),
            avg_loyalty: stats(|l| l.avg_loyalty),
            burnout_count: stats(|l| l.burnout_count as f64),
        }
    }

    pub fn metric(&self, name: &str) -> Option<&MetricStats> {
        let m = match name {
            "headcount" => &self.headcount,
            "attrition_count" => &self.attrition_count,
            "layoff_count" => &self.layoff_count,
            "hire_count" => &self.hire_count,
            "avg_stress" => &self.avg_stress,
            "avg_productivity" => &self.avg_productivity,
            "avg_motivation" => &self.avg_motivation,
            "avg_job_satisfaction" => &self.avg_job_satisfaction,
            "avg_work_life_balance" => &self.avg_work_life_balance,
            "avg_loyalty" => &self.avg_loyalty,
            "burnout_count" => &self.burnout_count,
            _ => return None,
        };
        Some(m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub policy_name: String,
    pub config: SimulationConfig,
    pub runs: usize,
    pub base_seed: u64,
    pub calibration_source: CalibrationSource,
    pub results: Vec<MonthAggregate>,
}

impl AggregatedReport {
    pub fn final_month(&self) -> Option<&MonthAggregate> {
        self.results.last()
    }
}

/// Fold per-trial logs into per-month statistics. Every trial must cover
/// the same months; a mismatch is an engine bug and is never truncated.
pub fn aggregate_logs(trials: &[Vec<MonthlyLog>]) -> SimResult<Vec<MonthAggregate>> {
    let Some(first) = trials.first() else {
        return Ok(Vec::new());
    };
    let expected = first.len();
    for (trial, logs) in trials.iter().enumerate() {
        if logs.len() != expected {
            return Err(SimError::InconsistentTrialLengths { trial, expected, found: logs.len() });
        }
    }
    let mut months = Vec::with_capacity(expected);
    for (m, log) in first.iter().enumerate() {
        let column: Vec<&MonthlyLog> = trials.iter().map(|t| &t[m]).collect();
        months.push(MonthAggregate::from_month(log.month, &column));
    }
    Ok(months)
}

// ─── Cancellation ───────────────────────────────────────────────────────────

/// Cooperative cancellation flag, checked between trials.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

// ─── Runner ─────────────────────────────────────────────────────────────────

pub struct MonteCarloRunner {
    source: Arc<dyn PopulationSource>,
    models: Arc<ModelCache>,
    calibration: LoadedCalibration,
    templates: Mutex<TemplateCache>,
    base_seed: u64,
    parallel: bool,
    cancel: CancellationToken,
}

impl MonteCarloRunner {
    pub fn new(
        source: Arc<dyn PopulationSource>,
        models: Arc<ModelCache>,
        calibration: LoadedCalibration,
    ) -> Self {
        Self {
            source,
            models,
            calibration,
            templates: Mutex::new(TemplateCache::new()),
            base_seed: DEFAULT_BASE_SEED,
            parallel: true,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    /// Run trials in order on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// (builds, hits) of the graph template cache.
    pub fn template_stats(&self) -> (usize, usize) {
        let cache = self.templates.lock();
        (cache.builds(), cache.hits())
    }

    /// Load the population and bind it to a (possibly cached) graph.
    pub fn base_organization(&self) -> SimResult<Organization> {
        let records = require_population(self.source.as_ref())?;
        let mut cache = self.templates.lock();
        Organization::from_records_cached(records, &mut cache)
    }

    fn engine(&self, config: &SimulationConfig) -> SimResult<TimeEngine> {
        config.validate()?;
        let model = self.models.get()?;
        Ok(TimeEngine::new(config.clone(), self.calibration.calibration.clone(), model))
    }

    /// Replay one trial against its own copy of `base`.
    pub fn run_trial(
        &self,
        base: &Organization,
        config: &SimulationConfig,
        seed: u64,
    ) -> SimResult<SimulationResult> {
        let engine = self.engine(config)?;
        run_seeded(&engine, base, seed)
    }

    /// Logs of `trial_count` trials, in trial order.
    pub fn run_trials(
        &self,
        config: &SimulationConfig,
        trial_count: usize,
    ) -> SimResult<Vec<Vec<MonthlyLog>>> {
        if trial_count == 0 {
            return Err(SimError::InvalidConfig("trial_count must be at least 1".to_string()));
        }
        // Fail on a missing model before touching the population.
        let engine = self.engine(config)?;
        let base = self.base_organization()?;
        let completed = AtomicUsize::new(0);

        let trial = |i: usize| -> SimResult<Vec<MonthlyLog>> {
            if self.cancel.is_cancelled() {
                return Err(SimError::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    requested: trial_count,
                });
            }
            let seed = self.base_seed.wrapping_add(i as u64);
            let result = run_seeded(&engine, &base, seed)?;
            completed.fetch_add(1, Ordering::Relaxed);
            debug!(trial = i, seed, "trial complete");
            Ok(result.logs)
        };

        if self.parallel {
            (0..trial_count).into_par_iter().map(trial).collect()
        } else {
            (0..trial_count).map(trial).collect()
        }
    }

    pub fn run(
        &self,
        config: &SimulationConfig,
        trial_count: usize,
        policy_name: &str,
    ) -> SimResult<AggregatedReport> {
        self.run_with_trials(config, trial_count, policy_name)
            .map(|(report, _)| report)
    }

    /// Aggregated report together with the per-trial logs it was built from.
    pub fn run_with_trials(
        &self,
        config: &SimulationConfig,
        trial_count: usize,
        policy_name: &str,
    ) -> SimResult<(AggregatedReport, Vec<Vec<MonthlyLog>>)> {
        info!(
            policy = policy_name,
            trials = trial_count,
            base_seed = self.base_seed,
            calibration = %self.calibration.source,
            "monte carlo batch started"
        );
        let trials = self.run_trials(config, trial_count)?;
        let results = aggregate_logs(&trials)?;
        info!(policy = policy_name, months = results.len(), "monte carlo batch complete");
        let report = AggregatedReport {
            policy_name: policy_name.to_string(),
            config: config.clone(),
            runs: trial_count,
            base_seed: self.base_seed,
            calibration_source: self.calibration.source,
            results,
        };
        Ok((report, trials))
    }
}

impl std::fmt::Debug for MonteCarloRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonteCarloRunner")
            .field("models", &self.models)
            .field("calibration", &self.calibration)
            .field("base_seed", &self.base_seed)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

fn run_seeded(engine: &TimeEngine, base: &Organization, seed: u64) -> SimResult<SimulationResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    engine.run(base.clone(), &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::record;
    use crate::error::CapabilityError;
    use crate::policies::policy;
    use crate::population::InMemoryPopulation;
    use crate::prediction::ConstantQuitModel;

    fn log(month: u32, headcount: usize, avg_stress: f64) -> MonthlyLog {
        MonthlyLog { month, headcount, avg_stress, ..MonthlyLog::default() }
    }

    fn runner(p: f64) -> MonteCarloRunner {
        let records = (1..=12)
            .map(|i| {
                let dept = if i % 2 == 0 { "R&D" } else { "Sales" };
                record(i, dept, 1 + (i % 3) as u32, (i > 2).then_some(1 + i % 2))
            })
            .collect();
        MonteCarloRunner::new(
            Arc::new(InMemoryPopulation::new(records)),
            Arc::new(ModelCache::with_model(Arc::new(ConstantQuitModel(p)))),
            LoadedCalibration::defaults(),
        )
    }

    #[test]
    fn stats_use_population_std() {
        let s = MetricStats::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std, 2.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(MetricStats::from_samples(&[]), MetricStats::default());
    }

    #[test]
    fn stats_round_to_four_places() {
        let s = MetricStats::from_samples(&[0.123456]);
        assert_eq!(s, MetricStats { mean: 0.1235, min: 0.1235, max: 0.1235, std: 0.0 });
    }

    #[test]
    fn aggregate_is_per_month() {
        let trials = vec![
            vec![log(1, 10, 0.1), log(2, 9, 0.2)],
            vec![log(1, 10, 0.3), log(2, 7, 0.4)],
        ];
        let months = aggregate_logs(&trials).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[1].month, 2);
        assert_eq!(months[1].headcount, MetricStats { mean: 8.0, min: 7.0, max: 9.0, std: 1.0 });
        assert_eq!(months[0].avg_stress.mean, 0.2);
        assert_eq!(months[0].metric("avg_stress"), Some(&months[0].avg_stress));
        assert!(MonthAggregate::METRICS.iter().all(|m| months[0].metric(m).is_some()));
    }

    #[test]
    fn ragged_trials_are_fatal() {
        let trials = vec![vec![log(1, 3, 0.0), log(2, 3, 0.0)], vec![log(1, 3, 0.0)]];
        let err = aggregate_logs(&trials).unwrap_err();
        assert!(matches!(
            err,
            SimError::InconsistentTrialLengths { trial: 1, expected: 2, found: 1 }
        ));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let cfg = policy("kpi_pressure").unwrap().with_duration(4);
        let par = runner(0.6).with_seed(11).run_trials(&cfg, 6).unwrap();
        let seq = runner(0.6).with_seed(11).sequential().run_trials(&cfg, 6).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn single_trial_replays_in_isolation() {
        let cfg = policy("layoff").unwrap().with_duration(5);
        let r = runner(0.6).with_seed(100);
        let batch = r.run_trials(&cfg, 4).unwrap();
        let base = r.base_organization().unwrap();
        let alone = r.run_trial(&base, &cfg, 102).unwrap();
        assert_eq!(alone.logs, batch[2]);
    }

    #[test]
    fn report_is_built_from_the_returned_trials() {
        let cfg = policy("layoff").unwrap().with_duration(3);
        let r = runner(0.4).with_seed(21);
        let (report, trials) = r.run_with_trials(&cfg, 4, "layoff").unwrap();
        assert_eq!(trials.len(), 4);
        assert_eq!(report.results, aggregate_logs(&trials).unwrap());
        assert_eq!(r.template_stats(), (1, 0), "trials ran once");
        assert_eq!(r.run(&cfg, 4, "layoff").unwrap(), report);
    }

    #[test]
    fn template_is_reused_across_batches() {
        let cfg = policy("baseline").unwrap().with_duration(1);
        let r = runner(0.1);
        r.run_trials(&cfg, 2).unwrap();
        r.run_trials(&cfg, 2).unwrap();
        assert_eq!(r.template_stats(), (1, 1));
    }

    #[test]
    fn zero_trials_is_invalid() {
        let cfg = policy("baseline").unwrap();
        assert!(matches!(runner(0.1).run_trials(&cfg, 0), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn missing_model_fails_before_any_trial() {
        let r = MonteCarloRunner::new(
            Arc::new(InMemoryPopulation::default()),
            Arc::new(ModelCache::empty()),
            LoadedCalibration::defaults(),
        );
        let err = r.run(&policy("baseline").unwrap(), 3, "baseline").unwrap_err();
        assert!(matches!(
            err,
            SimError::Capability(CapabilityError::NotConfigured { capability: "quit model" })
        ));
    }

    #[test]
    fn cancelled_batch_reports_progress() {
        let token = CancellationToken::new();
        let r = runner(0.1).sequential().with_cancellation(token.clone());
        token.cancel();
        let err = r.run_trials(&policy("baseline").unwrap(), 5).unwrap_err();
        assert!(matches!(err, SimError::Cancelled { completed: 0, requested: 5 }));
    }

    #[test]
    fn report_carries_provenance() {
        let cfg = policy("remote_work").unwrap().with_duration(3);
        let report = runner(0.2).with_seed(7).run(&cfg, 3, "remote_work").unwrap();
        assert_eq!(report.policy_name, "remote_work");
        assert_eq!(report.runs, 3);
        assert_eq!(report.base_seed, 7);
        assert_eq!(report.calibration_source, CalibrationSource::Defaults);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.final_month().map(|m| m.month), Some(3));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["results"][0]["avg_stress"]["std"].as_f64().is_some());
        assert_eq!(json["calibration_source"], "defaults");
    }
}
