// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Agent Identity ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─── Employee Record ────────────────────────────────────────────────────────

/// Static snapshot of one employee as handed over by the ingestion layer.
///
/// Optional dataset columns are already defaulted by the time a record gets
/// here; the serde defaults only cover files written without those columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: AgentId,
    pub department: String,
    pub job_role: String,
    pub job_level: u32,
    #[serde(default)]
    pub manager_id: Option<AgentId>,

    pub age: u32,
    #[serde(default = "unknown")]
    pub marital_status: String,
    #[serde(default)]
    pub distance_from_home: f64,

    pub monthly_income: f64,
    #[serde(default)]
    pub percent_salary_hike: f64,
    #[serde(default)]
    pub stock_option_level: u32,

    pub years_at_company: f64,
    pub total_working_years: f64,
    pub num_companies_worked: f64,
    #[serde(default)]
    pub years_in_current_role: f64,
    #[serde(default)]
    pub years_since_last_promotion: f64,
    #[serde(default)]
    pub years_with_curr_manager: f64,

    pub performance_rating: u32,
    pub job_satisfaction: f64,
    pub work_life_balance: f64,
    #[serde(default = "neutral_score")]
    pub environment_satisfaction: f64,
    #[serde(default = "neutral_score")]
    pub job_involvement: f64,

    #[serde(default)]
    pub overtime: bool,
    #[serde(default)]
    pub business_travel: f64,
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn neutral_score() -> f64 {
    3.0
}

impl EmployeeRecord {
    /// Synthetic record for a backfill hire replacing `departed`.
    pub fn replacement_for(departed: &EmployeeRecord, id: AgentId) -> Self {
        Self {
            employee_id: id,
            department: departed.department.clone(),
            job_role: departed.job_role.clone(),
            job_level: departed.job_level,
            manager_id: departed.manager_id,
            age: 0,
            marital_status: unknown(),
            distance_from_home: 0.0,
            monthly_income: departed.monthly_income,
            percent_salary_hike: 0.0,
            stock_option_level: 0,
            years_at_company: 0.0,
            total_working_years: 0.0,
            num_companies_worked: 1.0,
            years_in_current_role: 0.0,
            years_since_last_promotion: 0.0,
            years_with_curr_manager: 0.0,
            performance_rating: 3,
            job_satisfaction: 3.0,
            work_life_balance: 3.0,
            environment_satisfaction: neutral_score(),
            job_involvement: neutral_score(),
            overtime: false,
            business_travel: 0.0,
        }
    }
}

// ─── Relationship Kind ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Manager,
    Peer,
    Skip,
}

// ─── Departure ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepartureKind {
    Layoff,
    VoluntaryQuit,
}

// ─── Monthly Log ────────────────────────────────────────────────────────────

/// Aggregate outcome of one simulated month in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLog {
    pub month: u32,
    pub headcount: usize,
    pub attrition_count: usize,
    pub layoff_count: usize,
    pub hire_count: usize,
    pub avg_stress: f64,
    pub avg_productivity: f64,
    pub avg_motivation: f64,
    pub avg_job_satisfaction: f64,
    pub avg_work_life_balance: f64,
    pub avg_loyalty: f64,
    pub burnout_count: usize,
}
