// Console summary and JSON report output

use std::path::Path;

use serde::Serialize;
use workforce_engine::{AggregatedReport, PolicyComparison, SimResult};

// ─── Console Summary ────────────────────────────────────────────────────────

pub fn print_report(report: &AggregatedReport) {
    println!(
        "\n  Policy: {} | Runs: {} | Base seed: {} | Calibration: {}",
        report.policy_name, report.runs, report.base_seed, report.calibration_source
    );
    println!(
        "  {:>5} {:>10} {:>7} {:>7} {:>7} {:>8} {:>8} {:>8} {:>8}",
        "Month", "Headcount", "Quits", "Layoff", "Hires", "Stress", "Product", "Loyalty", "Burnout"
    );
    println!("  {}", "-".repeat(80));
    for m in &report.results {
        println!(
            "  {:>5} {:>6.1}±{:<3.1} {:>7.2} {:>7.2} {:>7.2} {:>8.4} {:>8.4} {:>8.4} {:>8.2}",
            m.month,
            m.headcount.mean,
            m.headcount.std,
            m.attrition_count.mean,
            m.layoff_count.mean,
            m.hire_count.mean,
            m.avg_stress.mean,
            m.avg_productivity.mean,
            m.avg_loyalty.mean,
            m.burnout_count.mean,
        );
    }
}

pub fn print_comparison(cmp: &PolicyComparison) {
    print_report(&cmp.policy_a);
    print_report(&cmp.policy_b);
    println!(
        "\n  Final month, {} vs {}:",
        cmp.policy_b.policy_name, cmp.policy_a.policy_name
    );
    for metric in ["headcount", "avg_stress", "avg_productivity", "avg_loyalty", "burnout_count"] {
        if let Some(delta) = cmp.final_delta(metric) {
            println!("    {:<18} {:>+10.4}", metric, delta);
        }
    }
}

// ─── JSON Output ────────────────────────────────────────────────────────────

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> SimResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
