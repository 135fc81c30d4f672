// Workforce Policy Runner - Monte Carlo policy comparison from the command line
// Seedable ChaCha8 trials, per-month aggregate statistics, optional JSONL trial logs
//
// Usage:
//   workforce policies
//   workforce run --population employees.json --model quit_model.json --policy layoff
//   workforce run --population employees.json --constant-quit 0.2 --overrides crunch.toml
//   workforce compare --population employees.json --model quit_model.json baseline kpi_pressure
//
// Log verbosity follows RUST_LOG (default: info).

mod report;
mod time_series;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use workforce_engine::*;

use report::{print_comparison, print_report, write_json};
use time_series::TrialRecorder;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "workforce")]
#[command(about = "Monte Carlo workforce attrition under management policies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one policy and print per-month statistics
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Preset to start from
        #[arg(long, default_value = "baseline")]
        policy: String,

        /// TOML file overriding individual policy knobs
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
    /// Run two presets with paired seeds and print the difference
    Compare {
        #[command(flatten)]
        common: CommonArgs,

        policy_a: String,
        policy_b: String,
    },
    /// List the policy presets
    Policies,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON array of employee records
    #[arg(long)]
    population: PathBuf,

    /// Exported logistic quit model (JSON)
    #[arg(long, conflicts_with = "constant_quit")]
    model: Option<PathBuf>,

    /// Use a fixed yearly quit probability instead of a model file
    #[arg(long)]
    constant_quit: Option<f64>,

    /// Calibration export; defaults are used when absent or unreadable
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Months to simulate (overrides the preset)
    #[arg(long)]
    months: Option<u32>,

    /// Number of Monte Carlo trials
    #[arg(long, default_value_t = 50)]
    runs: usize,

    /// Base seed; trial i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run trials on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Write the aggregated report here
    #[arg(long, default_value = "simulation-results/report.json")]
    out: PathBuf,

    /// Also write each trial's monthly logs as JSONL into this directory
    #[arg(long)]
    time_series: Option<PathBuf>,
}

// ─── Setup ──────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn model_cache(common: &CommonArgs) -> ModelCache {
    if let Some(p) = common.constant_quit {
        return ModelCache::with_model(Arc::new(ConstantQuitModel(p)));
    }
    match &common.model {
        Some(path) => {
            let path = path.clone();
            ModelCache::with_loader(Box::new(move || {
                Ok(Arc::new(LogisticQuitModel::load(&path)?) as SharedQuitModel)
            }))
        }
        None => ModelCache::empty(),
    }
}

fn simulator(common: &CommonArgs) -> WorkforceSimulator {
    let source = Arc::new(JsonPopulationFile::new(&common.population));
    let calibration = load_calibration(common.calibration.as_deref());
    let mut runner = MonteCarloRunner::new(source, Arc::new(model_cache(common)), calibration)
        .with_seed(common.seed);
    if common.sequential {
        runner = runner.sequential();
    }
    WorkforceSimulator::from_runner(runner)
}

fn named(name: &str, months: Option<u32>) -> SimResult<NamedPolicy> {
    let policy = NamedPolicy::preset(name)?;
    Ok(match months {
        Some(m) => policy.with_duration(m),
        None => policy,
    })
}

// ─── Commands ───────────────────────────────────────────────────────────────

/// Write the logs `run_with_trials` already produced; trial i ran with seed
/// `base_seed + i`.
fn write_time_series(
    report: &AggregatedReport,
    trials: &[Vec<MonthlyLog>],
    dir: &Path,
) -> SimResult<()> {
    let dir = dir.join(&report.policy_name);
    for (i, logs) in trials.iter().enumerate() {
        let seed = report.base_seed.wrapping_add(i as u64);
        let mut recorder = TrialRecorder::new(seed);
        for log in logs {
            recorder.record(log);
        }
        recorder.write_jsonl(&dir)?;
        info!(seed, months = recorder.len(), dir = %dir.display(), "trial log written");
    }
    Ok(())
}

fn run(common: &CommonArgs, policy: &str, overrides: Option<&Path>) -> SimResult<()> {
    let named_policy = match overrides {
        Some(path) => {
            let (name, config) = PolicyOverrides::load(path)?.resolve(policy)?;
            NamedPolicy::new(name, config)
        }
        None => named(policy, None)?,
    };
    let named_policy = match common.months {
        Some(m) => named_policy.with_duration(m),
        None => named_policy,
    };

    let sim = simulator(common);
    let (report, trials) = sim.run_policy_with_trials(&named_policy, common.runs)?;
    print_report(&report);
    write_json(&report, &common.out)?;
    println!("\n  Report written to {}", common.out.display());

    if let Some(dir) = &common.time_series {
        write_time_series(&report, &trials, dir)?;
    }
    Ok(())
}

fn compare(common: &CommonArgs, a: &str, b: &str) -> SimResult<()> {
    let policy_a = named(a, common.months)?;
    let policy_b = named(b, common.months)?;
    let sim = simulator(common);
    let (report_a, trials_a) = sim.run_policy_with_trials(&policy_a, common.runs)?;
    let (report_b, trials_b) = sim.run_policy_with_trials(&policy_b, common.runs)?;

    if let Some(dir) = &common.time_series {
        write_time_series(&report_a, &trials_a, dir)?;
        write_time_series(&report_b, &trials_b, dir)?;
    }

    let cmp = PolicyComparison { policy_a: report_a, policy_b: report_b };
    print_comparison(&cmp);
    write_json(&cmp, &common.out)?;
    println!("\n  Comparison written to {}", common.out.display());
    Ok(())
}

fn list() {
    println!(
        "  {:<18} {:>9} {:>7} {:>6} {:>7} {:>7} {:>6} {:>7}",
        "Policy", "Workload", "Decay", "Shock", "Hiring", "Layoff", "Gain", "Months"
    );
    println!("  {}", "-".repeat(74));
    for (name, c) in WorkforceSimulator::list_policies() {
        println!(
            "  {:<18} {:>9.2} {:>7.3} {:>6.2} {:>7} {:>7.2} {:>6.2} {:>7}",
            name,
            c.workload_multiplier,
            c.motivation_decay_rate,
            c.shock_factor,
            c.hiring_active,
            c.layoff_ratio,
            c.stress_gain_rate,
            c.duration_months,
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging();

    let outcome = match &cli.command {
        Command::Run { common, policy, overrides } => run(common, policy, overrides.as_deref()),
        Command::Compare { common, policy_a, policy_b } => compare(common, policy_a, policy_b),
        Command::Policies => {
            list();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
