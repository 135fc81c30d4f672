// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Behavior Engine
//
// Per-agent monthly update. Each step reads the result of the previous one:
// neighbor influence -> stress -> fatigue -> motivation -> satisfaction/WLB
// -> productivity -> burnout penalty.

use crate::agent::{
    Agent, AgentState, PRODUCTIVITY_MAX, PRODUCTIVITY_MIN, SATISFACTION_MAX, SATISFACTION_MIN,
};
use crate::calibration::Calibration;
use crate::graph::RelationshipGraph;
use crate::policies::SimulationConfig;

const NEIGHBOR_STRESS_WEIGHT: f64 = 0.01;
const FATIGUE_STRESS_WEIGHT: f64 = 0.005;
const COMM_RELIEF_WEIGHT: f64 = 0.001;
const COMM_QUALITY_CAP: f64 = 5.0;

const FATIGUE_STRESS_LINE: f64 = 0.5;
const FATIGUE_GAIN: f64 = 0.03;
const FATIGUE_RECOVERY: f64 = 0.01;

const MOTIVATION_STRESS_LINE: f64 = 0.4;
const MOTIVATION_RECOVERY: f64 = 0.01;

const OVERTIME_BONUS_PER_EXTRA_LOAD: f64 = 0.25;
const WLB_STRESS_BUFFER: f64 = 0.2;
const WLB_STRESS_PENALTY: f64 = 3.0;
const WLB_MAX_FALL: f64 = 0.15;
const WLB_MAX_RISE: f64 = 0.1;

const CRUNCH_BOOST: f64 = 0.8;
const CRUNCH_FATIGUE_PENALTY: f64 = 1.5;

const BURNOUT_PRODUCTIVITY_FACTOR: f64 = 0.97;

/// Weighted stress of active neighbors and total tie strength.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborInfluence {
    pub neighbor_stress: f64,
    pub comm_quality: f64,
}

pub fn neighbor_influence(
    agent: &Agent,
    graph: &RelationshipGraph,
    agents: &[Agent],
) -> NeighborInfluence {
    let mut influence = NeighborInfluence::default();
    for (id, edge) in graph.neighbors(agent.id()) {
        let Some(neighbor) = graph.slot(id).and_then(|s| agents.get(s)) else {
            continue;
        };
        if neighbor.is_active() {
            influence.neighbor_stress += edge.weight * neighbor.state.stress;
            influence.comm_quality += edge.weight;
        }
    }
    influence
}

/// Productivity from current wellbeing and workload, in `[0.1, 1.5]`.
///
/// Under crunch (`workload_multiplier > 1`) extra load buys output, but the
/// gain shrinks with fatigue and turns into a drag for exhausted agents.
pub fn productivity_decay(
    stress: f64,
    fatigue: f64,
    job_satisfaction: f64,
    work_life_balance: f64,
    workload_multiplier: f64,
) -> f64 {
    let mut score = 1.0;
    score -= stress * 0.30;
    score -= fatigue * 0.20;
    score += (job_satisfaction - 3.0) * 0.10;
    score += (work_life_balance - 3.0) * 0.05;

    if workload_multiplier > 1.0 {
        let boost = (workload_multiplier - 1.0) * CRUNCH_BOOST;
        let penalty = fatigue * workload_multiplier * CRUNCH_FATIGUE_PENALTY;
        score += boost * (1.0 - penalty).max(-1.0);
    }
    score.clamp(PRODUCTIVITY_MIN, PRODUCTIVITY_MAX)
}

/// Advance one active agent by a month. Inactive agents are left untouched.
pub fn update_agent(
    agent: &mut Agent,
    influence: NeighborInfluence,
    config: &SimulationConfig,
    calibration: &Calibration,
) {
    if !agent.is_active() {
        return;
    }
    let overtime = agent.record.overtime;
    let baseline_satisfaction = agent.baseline_satisfaction;
    let baseline_wlb = agent.baseline_wlb;
    let burnout_limit = agent.burnout_limit;
    let s: &mut AgentState = &mut agent.state;

    // Stress
    let gain = calibration.stress_gain_rate * config.workload_multiplier * config.stress_gain_rate
        + NEIGHBOR_STRESS_WEIGHT * influence.neighbor_stress
        + FATIGUE_STRESS_WEIGHT * s.fatigue
        - COMM_RELIEF_WEIGHT * influence.comm_quality.min(COMM_QUALITY_CAP);
    s.stress = (s.stress + gain).clamp(0.0, 1.0);
    s.stress = (s.stress - calibration.recovery_rate).max(0.0);

    // Fatigue
    s.fatigue = if s.stress > FATIGUE_STRESS_LINE {
        (s.fatigue + FATIGUE_GAIN).min(1.0)
    } else {
        (s.fatigue - FATIGUE_RECOVERY).max(0.0)
    };

    // Motivation
    if s.stress > MOTIVATION_STRESS_LINE {
        s.motivation = (s.motivation - config.motivation_decay_rate).max(0.0);
    } else {
        let ceiling = baseline_satisfaction / 4.0;
        if s.motivation < ceiling {
            s.motivation = (s.motivation + MOTIVATION_RECOVERY).min(ceiling);
        }
    }

    // Satisfaction and work-life balance
    let overtime_bonus = if overtime {
        OVERTIME_BONUS_PER_EXTRA_LOAD * (config.workload_multiplier - 1.0).max(0.0)
    } else {
        0.0
    };
    s.job_satisfaction =
        (s.motivation * 4.0 + overtime_bonus).clamp(SATISFACTION_MIN, SATISFACTION_MAX);

    let target_wlb = baseline_wlb - (s.stress - WLB_STRESS_BUFFER).max(0.0) * WLB_STRESS_PENALTY;
    let step = (target_wlb - s.work_life_balance).clamp(-WLB_MAX_FALL, WLB_MAX_RISE);
    s.work_life_balance = (s.work_life_balance + step).clamp(SATISFACTION_MIN, SATISFACTION_MAX);

    // Productivity
    s.productivity = productivity_decay(
        s.stress,
        s.fatigue,
        s.job_satisfaction,
        s.work_life_balance,
        config.workload_multiplier,
    );

    // Burnout
    if s.stress > burnout_limit {
        s.productivity = (s.productivity * BURNOUT_PRODUCTIVITY_FACTOR).max(PRODUCTIVITY_MIN);
    }

    s.clamp();
}

/// Run the behavior step for every active agent, in arena order. Later
/// agents see the already-updated stress of earlier ones.
pub fn step_population(
    agents: &mut [Agent],
    graph: &RelationshipGraph,
    config: &SimulationConfig,
    calibration: &Calibration,
) {
    for i in 0..agents.len() {
        if !agents[i].is_active() {
            continue;
        }
        let influence = neighbor_influence(&agents[i], graph, agents);
        update_agent(&mut agents[i], influence, config, calibration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::record;
    use crate::policies::policy;
    use crate::types::AgentId;
    use proptest::prelude::*;

    fn baseline() -> SimulationConfig {
        policy("baseline").expect("baseline preset")
    }

    #[test]
    fn one_step_from_rest_matches_closed_form() {
        let cal = Calibration::default();
        let mut agent = Agent::from_record(record(1, "R&D", 2, None));
        let influence = NeighborInfluence { neighbor_stress: 0.0, comm_quality: 0.67 };
        update_agent(&mut agent, influence, &baseline(), &cal);

        let expected = 0.0132 * 1.0 * 1.0 - 0.001 * 0.67 - 0.0104;
        assert!((agent.state.stress - expected).abs() < 1e-12);
        assert_eq!(agent.state.fatigue, 0.0);
        // Resting agent stays at its baseline
        assert_eq!(agent.state.motivation, 0.75);
        assert_eq!(agent.state.job_satisfaction, 3.0);
        assert_eq!(agent.state.work_life_balance, 3.0);
        let p = productivity_decay(expected, 0.0, 3.0, 3.0, 1.0);
        assert!((agent.state.productivity - p).abs() < 1e-12);
    }

    #[test]
    fn stress_gain_rate_scales_base_gain() {
        let cal = Calibration::default();
        let mut calm = Agent::from_record(record(1, "R&D", 2, None));
        let mut pushed = calm.clone();
        let mut cfg = baseline();
        update_agent(&mut calm, NeighborInfluence::default(), &cfg, &cal);
        cfg.stress_gain_rate = 2.0;
        update_agent(&mut pushed, NeighborInfluence::default(), &cfg, &cal);
        assert!((pushed.state.stress - calm.state.stress - 0.0132).abs() < 1e-12);
    }

    #[test]
    fn high_stress_builds_fatigue_and_drains_motivation() {
        let cal = Calibration::default();
        let mut agent = Agent::from_record(record(1, "R&D", 1, None));
        agent.state.stress = 0.9;
        let mut cfg = baseline();
        cfg.motivation_decay_rate = 0.05;
        update_agent(&mut agent, NeighborInfluence::default(), &cfg, &cal);
        assert_eq!(agent.state.fatigue, 0.03);
        assert!((agent.state.motivation - 0.70).abs() < 1e-12);
        assert!((agent.state.job_satisfaction - 2.8).abs() < 1e-12);
        // WLB falls by at most 0.15 in one month
        assert!((agent.state.work_life_balance - 2.85).abs() < 1e-12);
        // 0.9 > burnout limit of a level-1 agent with 10 years (0.5)
        let p = productivity_decay(agent.state.stress, 0.03, 2.8, 2.85, 1.0) * 0.97;
        assert!((agent.state.productivity - p).abs() < 1e-12);
    }

    #[test]
    fn motivation_recovers_up_to_baseline_only() {
        let cal = Calibration::default();
        let mut agent = Agent::from_record(record(1, "R&D", 2, None));
        agent.state.motivation = 0.745;
        update_agent(&mut agent, NeighborInfluence::default(), &baseline(), &cal);
        assert_eq!(agent.state.motivation, 0.75);
    }

    #[test]
    fn wlb_rises_slowly_after_stress_clears() {
        let cal = Calibration::default();
        let mut agent = Agent::from_record(record(1, "R&D", 2, None));
        agent.state.work_life_balance = 2.0;
        update_agent(&mut agent, NeighborInfluence::default(), &baseline(), &cal);
        assert!((agent.state.work_life_balance - 2.1).abs() < 1e-12);
    }

    #[test]
    fn overtime_bonus_applies_only_under_crunch() {
        let cal = Calibration::default();
        let mut r = record(1, "R&D", 2, None);
        r.overtime = true;
        let mut agent = Agent::from_record(r);
        let mut cfg = baseline();
        cfg.workload_multiplier = 1.4;
        update_agent(&mut agent, NeighborInfluence::default(), &cfg, &cal);
        assert!((agent.state.job_satisfaction - 3.1).abs() < 1e-12);
    }

    #[test]
    fn crunch_boost_shrinks_with_fatigue() {
        let fresh = productivity_decay(0.2, 0.0, 3.0, 3.0, 1.3);
        let plain = productivity_decay(0.2, 0.0, 3.0, 3.0, 1.0);
        let tired = productivity_decay(0.2, 0.8, 3.0, 3.0, 1.3);
        assert!((fresh - plain - 0.24).abs() < 1e-12);
        assert!(tired < plain);
        assert_eq!(productivity_decay(1.0, 1.0, 1.0, 1.0, 3.0), PRODUCTIVITY_MIN);
        assert_eq!(productivity_decay(0.0, 0.0, 4.0, 4.0, 2.0), PRODUCTIVITY_MAX);
    }

    #[test]
    fn inactive_agents_are_skipped() {
        let cal = Calibration::default();
        let mut agent = Agent::from_record(record(1, "R&D", 2, None));
        agent.state.is_active = false;
        let before = agent.clone();
        let influence = NeighborInfluence { neighbor_stress: 3.0, comm_quality: 1.0 };
        update_agent(&mut agent, influence, &baseline(), &cal);
        assert_eq!(agent, before);
    }

    #[test]
    fn influence_ignores_inactive_neighbors() {
        let mut agents: Vec<Agent> = vec![
            Agent::from_record(record(1, "R&D", 4, None)),
            Agent::from_record(record(2, "R&D", 2, Some(1))),
            Agent::from_record(record(3, "R&D", 2, Some(1))),
        ];
        agents[1].state.stress = 0.5;
        agents[2].state.stress = 0.8;
        let graph = RelationshipGraph::build(&agents);
        let w = graph.edge(AgentId(1), AgentId(2)).expect("manager edge").weight;
        let all = neighbor_influence(&agents[0], &graph, &agents);
        assert!((all.neighbor_stress - w * 1.3).abs() < 1e-12);
        assert!((all.comm_quality - 2.0 * w).abs() < 1e-12);

        agents[2].state.is_active = false;
        let some = neighbor_influence(&agents[0], &graph, &agents);
        assert!((some.neighbor_stress - w * 0.5).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn update_keeps_state_bounded(
            stress in 0.0f64..=1.0,
            fatigue in 0.0f64..=1.0,
            motivation in 0.0f64..=1.0,
            sat in SATISFACTION_MIN..=SATISFACTION_MAX,
            wlb in SATISFACTION_MIN..=SATISFACTION_MAX,
            neighbor_stress in 0.0f64..20.0,
            comm_quality in 0.0f64..20.0,
            workload in 0.5f64..2.5,
            gain_rate in 0.0f64..3.0,
            overtime in any::<bool>(),
        ) {
            let mut r = record(1, "R&D", 2, None);
            r.overtime = overtime;
            let mut agent = Agent::from_record(r);
            agent.state = AgentState {
                stress, fatigue, motivation, loyalty: 0.5, productivity: 1.0,
                job_satisfaction: sat, work_life_balance: wlb, is_active: true,
            };
            let cfg = SimulationConfig {
                workload_multiplier: workload,
                motivation_decay_rate: 0.02,
                stress_gain_rate: gain_rate,
                ..baseline()
            };
            let influence = NeighborInfluence { neighbor_stress, comm_quality };
            update_agent(&mut agent, influence, &cfg, &Calibration::default());
            prop_assert!(agent.state.is_within_bounds(), "{:?}", agent.state);
        }
    }
}
