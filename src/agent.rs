// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Employee Agent

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rounding::{from_decimal, to_decimal};
use crate::types::{AgentId, EmployeeRecord};

pub const SATISFACTION_MIN: f64 = 1.0;
pub const SATISFACTION_MAX: f64 = 4.0;
pub const PRODUCTIVITY_MIN: f64 = 0.1;
pub const PRODUCTIVITY_MAX: f64 = 1.5;

/// Stress ceiling given to backfill hires until they have a track record.
pub const NEW_HIRE_BURNOUT_LIMIT: f64 = 0.4;

const BURNOUT_BASE: Decimal = dec!(0.3);
const BURNOUT_LEVEL_WEIGHT: Decimal = dec!(0.08);
const BURNOUT_EXPERIENCE_WEIGHT: Decimal = dec!(0.02);
const BURNOUT_EXPERIENCE_CAP: Decimal = dec!(20);
const BURNOUT_CEILING: Decimal = dec!(0.85);

/// Stress tolerance from seniority and experience, capped at 0.85.
///
/// `round(min(0.3 + (level-1)*0.08 + min(years,20)*0.02, 0.85), 3)`
pub fn burnout_threshold(job_level: u32, total_working_years: f64) -> f64 {
    let level = Decimal::from(job_level) - Decimal::ONE;
    let years = to_decimal(total_working_years).min(BURNOUT_EXPERIENCE_CAP);
    let threshold =
        BURNOUT_BASE + level * BURNOUT_LEVEL_WEIGHT + years * BURNOUT_EXPERIENCE_WEIGHT;
    from_decimal(threshold.min(BURNOUT_CEILING).round_dp(3))
}

// ─── Dynamic State ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub stress: f64,
    pub fatigue: f64,
    pub motivation: f64,
    pub loyalty: f64,
    pub productivity: f64,
    pub job_satisfaction: f64,
    pub work_life_balance: f64,
    pub is_active: bool,
}

impl AgentState {
    /// Clamp every bounded quantity back into its range.
    pub fn clamp(&mut self) {
        self.stress = self.stress.clamp(0.0, 1.0);
        self.fatigue = self.fatigue.clamp(0.0, 1.0);
        self.motivation = self.motivation.clamp(0.0, 1.0);
        self.loyalty = self.loyalty.clamp(0.0, 1.0);
        self.productivity = self.productivity.clamp(PRODUCTIVITY_MIN, PRODUCTIVITY_MAX);
        self.job_satisfaction = self.job_satisfaction.clamp(SATISFACTION_MIN, SATISFACTION_MAX);
        self.work_life_balance = self.work_life_balance.clamp(SATISFACTION_MIN, SATISFACTION_MAX);
    }

    pub fn is_within_bounds(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let score = |v: f64| (SATISFACTION_MIN..=SATISFACTION_MAX).contains(&v);
        unit(self.stress)
            && unit(self.fatigue)
            && unit(self.motivation)
            && unit(self.loyalty)
            && (PRODUCTIVITY_MIN..=PRODUCTIVITY_MAX).contains(&self.productivity)
            && score(self.job_satisfaction)
            && score(self.work_life_balance)
    }
}

// ─── Agent ──────────────────────────────────────────────────────────────────

/// One employee for the duration of a run. The record is never mutated;
/// everything the engine changes lives in `state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub record: EmployeeRecord,
    pub state: AgentState,
    pub baseline_satisfaction: f64,
    pub baseline_wlb: f64,
    pub burnout_limit: f64,
}

impl Agent {
    pub fn from_record(record: EmployeeRecord) -> Self {
        let baseline_satisfaction =
            record.job_satisfaction.clamp(SATISFACTION_MIN, SATISFACTION_MAX);
        let baseline_wlb = record.work_life_balance.clamp(SATISFACTION_MIN, SATISFACTION_MAX);
        let burnout_limit = burnout_threshold(record.job_level, record.total_working_years);
        let state = AgentState {
            stress: 0.0,
            fatigue: 0.0,
            motivation: baseline_satisfaction / 4.0,
            loyalty: (record.years_at_company / 10.0).clamp(0.0, 1.0),
            productivity: 1.0,
            job_satisfaction: baseline_satisfaction,
            work_life_balance: baseline_wlb,
            is_active: true,
        };
        Self { record, state, baseline_satisfaction, baseline_wlb, burnout_limit }
    }

    /// Backfill hire taking over the seat of `departed`.
    pub fn new_hire(departed: &Agent, id: AgentId) -> Self {
        let record = EmployeeRecord::replacement_for(&departed.record, id);
        let state = AgentState {
            stress: 0.1,
            fatigue: 0.0,
            motivation: 0.75,
            loyalty: 0.1,
            productivity: 1.0,
            job_satisfaction: record.job_satisfaction,
            work_life_balance: record.work_life_balance,
            is_active: true,
        };
        Self {
            baseline_satisfaction: record.job_satisfaction,
            baseline_wlb: record.work_life_balance,
            record,
            state,
            burnout_limit: NEW_HIRE_BURNOUT_LIMIT,
        }
    }

    pub fn id(&self) -> AgentId {
        self.record.employee_id
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn is_burned_out(&self) -> bool {
        self.state.stress > self.burnout_limit
    }

    /// Feature vector for the quit-probability model, reflecting the
    /// agent's current satisfaction and work-life balance.
    pub fn quit_features(&self) -> QuitFeatures {
        QuitFeatures::from_agent(self)
    }
}

// ─── Quit Model Features ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuitFeatures {
    pub job_satisfaction: f64,
    pub work_life_balance: f64,
    pub environment_satisfaction: f64,
    pub job_involvement: f64,
    pub monthly_income: f64,
    pub years_at_company: f64,
    pub total_working_years: f64,
    pub num_companies_worked: f64,
    pub job_level: f64,
    pub years_since_last_promotion: f64,
    pub years_with_curr_manager: f64,
    pub performance_rating: f64,
    pub stock_option_level: f64,
    pub age: f64,
    pub distance_from_home: f64,
    pub percent_salary_hike: f64,
    pub years_in_current_role: f64,
    pub overtime: f64,
    pub business_travel: f64,
    // Engineered
    pub stagnation_score: f64,
    pub satisfaction_composite: f64,
    pub career_velocity: f64,
    pub loyalty_index: f64,
    pub is_single: f64,
}

impl QuitFeatures {
    pub const NAMES: [&'static str; 24] = [
        "job_satisfaction",
        "work_life_balance",
        "environment_satisfaction",
        "job_involvement",
        "monthly_income",
        "years_at_company",
        "total_working_years",
        "num_companies_worked",
        "job_level",
        "years_since_last_promotion",
        "years_with_curr_manager",
        "performance_rating",
        "stock_option_level",
        "age",
        "distance_from_home",
        "percent_salary_hike",
        "years_in_current_role",
        "overtime",
        "business_travel",
        "stagnation_score",
        "satisfaction_composite",
        "career_velocity",
        "loyalty_index",
        "is_single",
    ];

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    pub fn from_agent(agent: &Agent) -> Self {
        let r = &agent.record;
        let job_satisfaction = agent.state.job_satisfaction;
        let work_life_balance = agent.state.work_life_balance;
        Self {
            job_satisfaction,
            work_life_balance,
            environment_satisfaction: r.environment_satisfaction,
            job_involvement: r.job_involvement,
            monthly_income: r.monthly_income,
            years_at_company: r.years_at_company,
            total_working_years: r.total_working_years,
            num_companies_worked: r.num_companies_worked,
            job_level: r.job_level as f64,
            years_since_last_promotion: r.years_since_last_promotion,
            years_with_curr_manager: r.years_with_curr_manager,
            performance_rating: r.performance_rating as f64,
            stock_option_level: r.stock_option_level as f64,
            age: r.age as f64,
            distance_from_home: r.distance_from_home,
            percent_salary_hike: r.percent_salary_hike,
            years_in_current_role: r.years_in_current_role,
            overtime: if r.overtime { 1.0 } else { 0.0 },
            business_travel: r.business_travel,
            stagnation_score: r.years_since_last_promotion / (r.years_at_company + 1.0),
            satisfaction_composite: (job_satisfaction
                + work_life_balance
                + r.environment_satisfaction)
                / 3.0,
            career_velocity: r.job_level as f64 / (r.total_working_years + 1.0),
            loyalty_index: r.years_at_company / (r.total_working_years + 1.0),
            is_single: if r.marital_status.eq_ignore_ascii_case("single") { 1.0 } else { 0.0 },
        }
    }

    /// Look up a feature by the column name the model was trained with.
    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "job_satisfaction" => self.job_satisfaction,
            "work_life_balance" => self.work_life_balance,
            "environment_satisfaction" => self.environment_satisfaction,
            "job_involvement" => self.job_involvement,
            "monthly_income" => self.monthly_income,
            "years_at_company" => self.years_at_company,
            "total_working_years" => self.total_working_years,
            "num_companies_worked" => self.num_companies_worked,
            "job_level" => self.job_level,
            "years_since_last_promotion" => self.years_since_last_promotion,
            "years_with_curr_manager" => self.years_with_curr_manager,
            "performance_rating" => self.performance_rating,
            "stock_option_level" => self.stock_option_level,
            "age" => self.age,
            "distance_from_home" => self.distance_from_home,
            "percent_salary_hike" => self.percent_salary_hike,
            "years_in_current_role" => self.years_in_current_role,
            "overtime" => self.overtime,
            "business_travel" => self.business_travel,
            "stagnation_score" => self.stagnation_score,
            "satisfaction_composite" => self.satisfaction_composite,
            "career_velocity" => self.career_velocity,
            "loyalty_index" => self.loyalty_index,
            "is_single" => self.is_single,
            _ => return None,
        };
        Some(v)
    }
}
