// Per-Month JSONL Trial Recorder
// One JSON line per simulated month, one file per trial seed

use std::io::Write;
use std::path::Path;

use workforce_engine::MonthlyLog;

/// Accumulates a trial's monthly logs and writes them as JSONL.
pub struct TrialRecorder {
    seed: u64,
    months: Vec<MonthlyLog>,
}

impl TrialRecorder {
    pub fn new(seed: u64) -> Self {
        Self { seed, months: Vec::new() }
    }

    pub fn record(&mut self, log: &MonthlyLog) {
        self.months.push(log.clone());
    }

    /// Write to `<dir>/seed-<seed>.jsonl`, creating `dir` if needed.
    pub fn write_jsonl(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let mut file = std::fs::File::create(dir.join(format!("seed-{}.jsonl", self.seed)))?;
        for month in &self.months {
            let line = serde_json::to_string(month).map_err(std::io::Error::other)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }
}
