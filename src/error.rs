// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Error Types

use crate::types::AgentId;

// ---------------------------------------------------------------------------
// Capability boundary
// ---------------------------------------------------------------------------

/// Failures raised at the boundary with an external collaborator
/// (quit-probability model, population source).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapabilityError {
    #[error("{capability} is not configured")]
    NotConfigured { capability: &'static str },

    #[error("{capability} rejected input: {reason}")]
    InvalidInput {
        capability: &'static str,
        reason: String,
    },
}

impl CapabilityError {
    pub fn not_configured(capability: &'static str) -> Self {
        Self::NotConfigured { capability }
    }

    pub fn invalid(capability: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            capability,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("graph node {0} has no bound agent")]
    UnboundNode(AgentId),

    #[error("agent {0} has no node in the relationship graph")]
    MissingNode(AgentId),

    #[error("trial {trial} produced {found} months, expected {expected}")]
    InconsistentTrialLengths {
        trial: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("batch cancelled after {completed} of {requested} trials")]
    Cancelled { completed: usize, requested: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl SimError {
    /// True for graph/agent desynchronization, which indicates an engine bug.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::UnboundNode(_) | Self::MissingNode(_))
    }
}

pub type SimResult<T> = Result<T, SimError>;
