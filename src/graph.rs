// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Relationship Graph
//
// Undirected weighted graph over agent ids. Nodes hold the slot of their
// agent in the population arena; agents never point back into the graph, so
// cloning an `Organization` is a plain value copy.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::error::{SimError, SimResult};
use crate::rounding::round_weight;
use crate::types::{AgentId, EdgeKind, EmployeeRecord};

pub const MAX_PEER_EDGES: usize = 10;
pub const MAX_SKIP_EDGES: usize = 5;
/// Manager edge weight for backfill hires.
pub const NEW_HIRE_MANAGER_WEIGHT: f64 = 0.9;

const DEFAULT_MAX_LEVEL: u32 = 5;

// ---------------------------------------------------------------------------
// Edge weights
// ---------------------------------------------------------------------------

/// Uniform manager edge weight for one build, from average years with the
/// current manager across the population.
pub fn manager_weight(avg_years_with_manager: f64) -> f64 {
    round_weight((0.6 + (avg_years_with_manager / 10.0) * 0.35).min(0.95))
}

/// Same department, same level. Senior peers influence each other less.
pub fn peer_weight(level: u32, max_level: u32) -> f64 {
    round_weight(0.8 - (level as f64 / max_level.max(1) as f64) * 0.3)
}

/// Same department, level gap of at least two.
pub fn skip_weight(gap: u32) -> f64 {
    round_weight((0.4 - (gap as f64 - 1.0) * 0.1).max(0.1))
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub weight: f64,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    slot: usize,
    adjacency: BTreeMap<AgentId, Edge>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    nodes: BTreeMap<AgentId, Node>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build nodes and edges from scratch. Deterministic given agent order.
    pub fn build(agents: &[Agent]) -> Self {
        let mut graph = Self::new();
        for (slot, agent) in agents.iter().enumerate() {
            graph.add_node(agent.id(), slot);
        }

        // Manager edges first; they are never overwritten.
        let avg_mgr_years = agents
            .iter()
            .map(|a| a.record.years_with_curr_manager)
            .sum::<f64>()
            / agents.len().max(1) as f64;
        let mgr_weight = manager_weight(avg_mgr_years);
        for agent in agents {
            if let Some(manager) = agent.record.manager_id {
                if manager != agent.id() && graph.contains(manager) {
                    graph.add_edge(agent.id(), manager, mgr_weight, EdgeKind::Manager);
                }
            }
        }

        // Peers: same department and level
        let max_level = agents
            .iter()
            .map(|a| a.record.job_level)
            .max()
            .unwrap_or(DEFAULT_MAX_LEVEL);
        let mut by_dept_level: BTreeMap<(&str, u32), Vec<&EmployeeRecord>> = BTreeMap::new();
        for agent in agents {
            by_dept_level
                .entry((agent.record.department.as_str(), agent.record.job_level))
                .or_default()
                .push(&agent.record);
        }
        for ((_, level), group) in &by_dept_level {
            let weight = peer_weight(*level, max_level);
            for i in 0..group.len() {
                let mut count = 0;
                for other in &group[i + 1..] {
                    if count >= MAX_PEER_EDGES {
                        break;
                    }
                    let (a, b) = (group[i].employee_id, other.employee_id);
                    if graph.add_edge(a, b, weight, EdgeKind::Peer) {
                        count += 1;
                    }
                }
            }
        }

        // Skip-level: same department, gap >= 2
        let mut by_dept: BTreeMap<&str, Vec<&EmployeeRecord>> = BTreeMap::new();
        for agent in agents {
            by_dept
                .entry(agent.record.department.as_str())
                .or_default()
                .push(&agent.record);
        }
        for group in by_dept.values() {
            for i in 0..group.len() {
                let mut count = 0;
                for other in &group[i + 1..] {
                    if count >= MAX_SKIP_EDGES {
                        break;
                    }
                    let gap = group[i].job_level.abs_diff(other.job_level);
                    if gap >= 2
                        && graph.add_edge(
                            group[i].employee_id,
                            other.employee_id,
                            skip_weight(gap),
                            EdgeKind::Skip,
                        )
                    {
                        count += 1;
                    }
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "relationship graph built"
        );
        graph
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Arena slot of the agent bound to `id`.
    pub fn slot(&self, id: AgentId) -> Option<usize> {
        self.nodes.get(&id).map(|n| n.slot)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.adjacency.len()).sum::<usize>() / 2
    }

    pub fn degree(&self, id: AgentId) -> usize {
        self.nodes.get(&id).map_or(0, |n| n.adjacency.len())
    }

    /// Neighbors of `id` in ascending id order. Empty if `id` is not a node.
    pub fn neighbors(&self, id: AgentId) -> impl Iterator<Item = (AgentId, Edge)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|n| n.adjacency.iter().map(|(&k, &e)| (k, e)))
    }

    pub fn edge(&self, u: AgentId, v: AgentId) -> Option<Edge> {
        self.nodes.get(&u).and_then(|n| n.adjacency.get(&v)).copied()
    }

    pub fn has_edge(&self, u: AgentId, v: AgentId) -> bool {
        self.edge(u, v).is_some()
    }

    /// Insert a node bound to arena slot `slot`. An existing node is rebound
    /// and keeps its edges.
    pub fn add_node(&mut self, id: AgentId, slot: usize) {
        self.nodes
            .entry(id)
            .and_modify(|n| n.slot = slot)
            .or_insert_with(|| Node { slot, adjacency: BTreeMap::new() });
    }

    /// Add an undirected edge. Returns false without touching the graph when
    /// either endpoint is missing, `u == v`, or the pair is already linked.
    pub fn add_edge(&mut self, u: AgentId, v: AgentId, weight: f64, kind: EdgeKind) -> bool {
        if u == v || !self.contains(u) || !self.contains(v) || self.has_edge(u, v) {
            return false;
        }
        let edge = Edge { weight, kind };
        if let Some(n) = self.nodes.get_mut(&u) {
            n.adjacency.insert(v, edge);
        }
        if let Some(n) = self.nodes.get_mut(&v) {
            n.adjacency.insert(u, edge);
        }
        true
    }

    /// Remove a node and every edge touching it. Returns the removed
    /// neighbor list, or None if the node was absent.
    pub fn remove_node(&mut self, id: AgentId) -> Option<Vec<(AgentId, Edge)>> {
        let node = self.nodes.remove(&id)?;
        for neighbor in node.adjacency.keys() {
            if let Some(n) = self.nodes.get_mut(neighbor) {
                n.adjacency.remove(&id);
            }
        }
        Some(node.adjacency.into_iter().collect())
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Topology snapshot without agent bindings.
    pub fn template(&self) -> GraphTemplate {
        let nodes: Vec<AgentId> = self.nodes.keys().copied().collect();
        let mut edges = Vec::with_capacity(self.edge_count());
        for (&u, node) in &self.nodes {
            for (&v, &edge) in node.adjacency.range(u..) {
                if v != u {
                    edges.push((u, v, edge));
                }
            }
        }
        GraphTemplate { nodes, edges }
    }

    /// Rebind a frozen topology to a fresh agent arena without recomputing
    /// any edge. Every template node must have an agent and every agent a
    /// template node.
    pub fn clone_with_agents(template: &GraphTemplate, agents: &[Agent]) -> SimResult<Self> {
        let slots: HashMap<AgentId, usize> = agents
            .iter()
            .enumerate()
            .map(|(slot, a)| (a.id(), slot))
            .collect();

        let mut graph = Self::new();
        for &id in &template.nodes {
            let slot = *slots.get(&id).ok_or(SimError::UnboundNode(id))?;
            graph.add_node(id, slot);
        }
        if let Some(orphan) = agents.iter().find(|a| !graph.contains(a.id())) {
            return Err(SimError::MissingNode(orphan.id()));
        }
        for &(u, v, edge) in &template.edges {
            graph.add_edge(u, v, edge.weight, edge.kind);
        }
        Ok(graph)
    }

    /// Check that every node is bound to an active agent carrying the same
    /// id and that every active agent has a node.
    pub fn verify_bindings(&self, agents: &[Agent]) -> SimResult<()> {
        for (&id, node) in &self.nodes {
            match agents.get(node.slot) {
                Some(a) if a.id() == id && a.is_active() => {}
                _ => return Err(SimError::UnboundNode(id)),
            }
        }
        for agent in agents.iter().filter(|a| a.is_active()) {
            if self.slot(agent.id()).is_none() {
                return Err(SimError::MissingNode(agent.id()));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Agents linked to `manager` by a manager edge who name it as manager.
    pub fn direct_reports<'a>(&self, manager: AgentId, agents: &'a [Agent]) -> Vec<&'a Agent> {
        self.neighbors(manager)
            .filter(|(_, e)| e.kind == EdgeKind::Manager)
            .filter_map(|(id, _)| self.slot(id).and_then(|s| agents.get(s)))
            .filter(|a| a.record.manager_id == Some(manager))
            .collect()
    }

    /// Walk manager references upward from `id`, starting with the agent
    /// itself. Stops at the top, at a missing node, or on a cycle.
    pub fn chain_of_command<'a>(&self, id: AgentId, agents: &'a [Agent]) -> Vec<&'a Agent> {
        let mut chain = Vec::new();
        let mut visited = BTreeSet::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if !visited.insert(cur) {
                break;
            }
            let Some(agent) = self.slot(cur).and_then(|s| agents.get(s)) else {
                break;
            };
            chain.push(agent);
            current = agent.record.manager_id;
        }
        chain
    }
}

// ---------------------------------------------------------------------------
// GraphTemplate / TemplateCache
// ---------------------------------------------------------------------------

/// Frozen topology: node ids plus each undirected edge once, `u < v`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphTemplate {
    pub nodes: Vec<AgentId>,
    pub edges: Vec<(AgentId, AgentId, Edge)>,
}

impl GraphTemplate {
    /// True when the template's node set is exactly the ids of `agents`.
    pub fn matches(&self, agents: &[Agent]) -> bool {
        if self.nodes.len() != agents.len() {
            return false;
        }
        let ids: BTreeSet<AgentId> = agents.iter().map(|a| a.id()).collect();
        ids.len() == self.nodes.len() && self.nodes.iter().all(|id| ids.contains(id))
    }
}

/// Retains the last built topology keyed by population size.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entry: Option<(usize, GraphTemplate)>,
    builds: usize,
    hits: usize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph for `agents`, reusing the cached template when the population
    /// size matches and the node set is unchanged.
    pub fn graph_for(&mut self, agents: &[Agent]) -> SimResult<RelationshipGraph> {
        if let Some((size, template)) = &self.entry {
            if *size == agents.len() {
                if template.matches(agents) {
                    self.hits += 1;
                    return RelationshipGraph::clone_with_agents(template, agents);
                }
                warn!(size, "cached template has a different node set; rebuilding");
            }
        }
        let graph = RelationshipGraph::build(agents);
        self.entry = Some((agents.len(), graph.template()));
        self.builds += 1;
        Ok(graph)
    }

    pub fn cached_size(&self) -> Option<usize> {
        self.entry.as_ref().map(|(size, _)| *size)
    }

    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// Agent arena plus relationship graph; the unit copied per trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub agents: Vec<Agent>,
    pub graph: RelationshipGraph,
}

impl Organization {
    pub fn from_records(records: Vec<EmployeeRecord>) -> Self {
        let agents: Vec<Agent> = records.into_iter().map(Agent::from_record).collect();
        let graph = RelationshipGraph::build(&agents);
        Self { agents, graph }
    }

    pub fn from_records_cached(
        records: Vec<EmployeeRecord>,
        cache: &mut TemplateCache,
    ) -> SimResult<Self> {
        let agents: Vec<Agent> = records.into_iter().map(Agent::from_record).collect();
        let graph = cache.graph_for(&agents)?;
        Ok(Self { agents, graph })
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.graph
            .slot(id)
            .and_then(|s| self.agents.get(s))
            .or_else(|| self.agents.iter().find(|a| a.id() == id))
    }

    pub fn active_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_active())
    }

    pub fn headcount(&self) -> usize {
        self.active_agents().count()
    }

    pub fn max_id(&self) -> AgentId {
        self.agents.iter().map(|a| a.id()).max().unwrap_or(AgentId(0))
    }
}
