// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Attrition & Shockwave
//
// Monthly departure pipeline: layoffs, voluntary quits, shockwave on the
// departing agent's neighbors, removal from the graph, backfill hiring.
// Agents are addressed by arena slot throughout.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::trace;

use crate::agent::Agent;
use crate::calibration::Calibration;
use crate::error::{CapabilityError, SimError, SimResult};
use crate::graph::{Organization, NEW_HIRE_MANAGER_WEIGHT};
use crate::policies::SimulationConfig;
use crate::prediction::QuitModel;
use crate::types::{AgentId, DepartureKind, EdgeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub slot: usize,
    pub kind: DepartureKind,
}

// ---------------------------------------------------------------------------
// Layoffs
// ---------------------------------------------------------------------------

/// Slots of the `floor(active * ratio)` lowest-rated active agents. Ties
/// keep arena order.
pub fn select_layoffs(agents: &[Agent], layoff_ratio: f64) -> Vec<usize> {
    if layoff_ratio <= 0.0 {
        return Vec::new();
    }
    let mut active: Vec<usize> = (0..agents.len()).filter(|&i| agents[i].is_active()).collect();
    let count = (active.len() as f64 * layoff_ratio).floor() as usize;
    // sort_by_key is stable
    active.sort_by_key(|&i| agents[i].record.performance_rating);
    active.truncate(count);
    active
}

// ---------------------------------------------------------------------------
// Voluntary quits
// ---------------------------------------------------------------------------

/// Convert a yearly quit probability to the equivalent monthly hazard.
pub fn monthly_probability(yearly: f64) -> f64 {
    1.0 - (1.0 - yearly).powf(1.0 / 12.0)
}

/// Slots of active agents, not in `laid_off`, who quit this month.
///
/// Per candidate the model is queried first, then the natural-attrition
/// draw is taken; the stress-driven draw happens only when both stress and
/// yearly probability are above their thresholds.
pub fn decide_quits<R: Rng + ?Sized>(
    agents: &[Agent],
    laid_off: &BTreeSet<usize>,
    model: &dyn QuitModel,
    calibration: &Calibration,
    rng: &mut R,
) -> Result<Vec<usize>, CapabilityError> {
    let mut quitters = Vec::new();
    for (slot, agent) in agents.iter().enumerate() {
        if !agent.is_active() || laid_off.contains(&slot) {
            continue;
        }
        let yearly = model.predict_yearly_quit_probability(&agent.quit_features())?;
        let monthly = monthly_probability(yearly);

        if rng.gen::<f64>() < calibration.monthly_natural_rate {
            quitters.push(slot);
            continue;
        }
        if agent.state.stress > calibration.stress_threshold
            && yearly > calibration.quit_threshold
            && rng.gen::<f64>() < monthly
        {
            quitters.push(slot);
        }
    }
    Ok(quitters)
}

// ---------------------------------------------------------------------------
// Departures
// ---------------------------------------------------------------------------

/// Perturb every active neighbor of `departing`: stress up, loyalty down,
/// both scaled by edge weight.
pub fn apply_shockwave(
    org: &mut Organization,
    departing: AgentId,
    shock_factor: f64,
    calibration: &Calibration,
) {
    let hits: Vec<(usize, f64)> = org
        .graph
        .neighbors(departing)
        .filter_map(|(id, edge)| org.graph.slot(id).map(|slot| (slot, edge.weight)))
        .collect();
    for (slot, weight) in hits {
        let Some(neighbor) = org.agents.get_mut(slot) else {
            continue;
        };
        if !neighbor.is_active() {
            continue;
        }
        let s = &mut neighbor.state;
        let hit = shock_factor * weight;
        s.stress = (s.stress + hit * calibration.shockwave_stress_factor).min(1.0);
        s.loyalty = (s.loyalty - hit * calibration.shockwave_loyalty_factor).max(0.0);
    }
}

/// Shockwave, deactivate, then drop the node, for each departure in order.
/// A departing agent without a graph node is a desync.
pub fn process_departures(
    org: &mut Organization,
    departures: &[Departure],
    config: &SimulationConfig,
    calibration: &Calibration,
) -> SimResult<()> {
    for d in departures {
        let Some(id) = org.agents.get(d.slot).map(Agent::id) else {
            continue;
        };
        if !org.graph.contains(id) {
            return Err(SimError::MissingNode(id));
        }
        apply_shockwave(org, id, config.shock_factor, calibration);
        org.agents[d.slot].state.is_active = false;
        org.graph.remove_node(id);
        trace!(agent = %id, kind = ?d.kind, "departed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Hiring
// ---------------------------------------------------------------------------

/// Replace each quitter with a fresh hire. `next_id` holds the last id
/// issued and is advanced per hire. Returns the number of hires.
pub fn backfill_hires(org: &mut Organization, quitters: &[usize], next_id: &mut u64) -> usize {
    let mut hired = 0;
    for &slot in quitters {
        let Some(departed) = org.agents.get(slot) else {
            continue;
        };
        *next_id += 1;
        let hire = Agent::new_hire(departed, AgentId(*next_id));
        let id = hire.id();
        let manager = hire.record.manager_id;
        let new_slot = org.agents.len();
        org.agents.push(hire);
        org.graph.add_node(id, new_slot);
        if let Some(m) = manager {
            if org.graph.contains(m) {
                org.graph.add_edge(id, m, NEW_HIRE_MANAGER_WEIGHT, EdgeKind::Manager);
            }
        }
        hired += 1;
    }
    hired
}
