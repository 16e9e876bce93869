//! The resolution report handed to export and report collaborators.
//!
//! Field names are part of the external contract; the JSON produced by
//! serializing [`ResolutionReport`] has exactly the top-level keys
//! `final_allowed_tools`, `final_denied_tools`, `network_access`,
//! `collisions`, `delegation` and `opt_out`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::delegation::AuditLevel;

/// Kind of merged resource a collision concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Capability/tool identifiers
    Tool,
    /// Named external-service endpoints
    Server,
    /// Guidance-content sections keyed by heading
    Steering,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => write!(f, "tool name"),
            Self::Server => write!(f, "server name"),
            Self::Steering => write!(f, "steering section"),
        }
    }
}

/// How a detected clash was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionResolution {
    Excluded,
    Aliased,
    LastWins,
}

/// One detected name clash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Tool/server name or steering heading
    pub name: String,
    /// Contributing origins, in declaration order
    pub origins: Vec<String>,
    pub resolution: CollisionResolution,
    /// Human-readable final state (e.g. `query -> api_query (second)`)
    pub final_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Collision records grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub tool_collisions: Vec<CollisionRecord>,
    pub server_collisions: Vec<CollisionRecord>,
    pub steering_collisions: Vec<CollisionRecord>,
}

impl CollisionReport {
    pub fn push(&mut self, kind: CollisionKind, record: CollisionRecord) {
        match kind {
            CollisionKind::Tool => self.tool_collisions.push(record),
            CollisionKind::Server => self.server_collisions.push(record),
            CollisionKind::Steering => self.steering_collisions.push(record),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tool_collisions.is_empty()
            && self.server_collisions.is_empty()
            && self.steering_collisions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tool_collisions.len() + self.server_collisions.len() + self.steering_collisions.len()
    }
}

/// Why the final network decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkReason {
    #[serde(rename = "collection policy wins")]
    CollectionPolicyWins,
    #[serde(rename = "agent more restrictive")]
    AgentMoreRestrictive,
    #[serde(rename = "agent opt-out with audit")]
    AgentOptOut,
}

impl fmt::Display for NetworkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectionPolicyWins => write!(f, "collection policy wins"),
            Self::AgentMoreRestrictive => write!(f, "agent more restrictive"),
            Self::AgentOptOut => write!(f, "agent opt-out with audit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAccess {
    pub collection_policy: Option<bool>,
    pub agent_requested: Option<bool>,
    pub final_resolution: bool,
    pub resolution_reason: NetworkReason,
}

/// Delegation mode label as it appears in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationModeKind {
    Intersection,
    FullDelegation,
    Elevated,
}

impl fmt::Display for DelegationModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intersection => write!(f, "intersection"),
            Self::FullDelegation => write!(f, "full_delegation"),
            Self::Elevated => write!(f, "elevated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedElevation {
    pub pattern: String,
    pub justification: String,
    pub audit_level: AuditLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    OptOut,
    FullDelegation,
    Elevation,
}

/// One audited grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event: AuditEvent,
    /// What was granted (pattern, subagent name, or agent name)
    pub subject: String,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_level: Option<AuditLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationReport {
    pub mode: DelegationModeKind,
    pub effective_allowed_tools: Vec<String>,
    pub effective_denied_tools: Vec<String>,
    pub elevations: Vec<AppliedElevation>,
    pub audit_trail: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptOutRecord {
    pub requested: bool,
    pub justification: Option<String>,
}

/// The output artifact of a resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub final_allowed_tools: Vec<String>,
    pub final_denied_tools: Vec<String>,
    pub network_access: NetworkAccess,
    pub collisions: CollisionReport,
    pub delegation: Option<DelegationReport>,
    pub opt_out: OptOutRecord,
}
