//! Collection–agent constraint resolution.
//!
//! A collection's shared constraints bound every member agent. An agent may
//! always be stricter than its collection, never looser, unless it opts out
//! with a written justification that lands in the audit trail.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::constraints::{ConstraintSet, intersect};
use super::pattern::CapabilityPattern;
use crate::error::PolicyError;
use crate::report::{AuditEntry, AuditEvent, NetworkAccess, NetworkReason, OptOutRecord};

/// Shared policy declared by a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPolicy {
    pub name: String,
    pub constraints: ConstraintSet,
    pub requires_network: Option<bool>,
}

/// An agent's own declared policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentPolicy {
    pub name: String,
    pub constraints: ConstraintSet,
    pub requires_network: Option<bool>,
    pub opt_out: Option<OptOut>,
}

/// Opt-out from collection constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptOut {
    #[serde(default)]
    pub requested: bool,
    #[serde(default)]
    pub justification: Option<String>,
}

impl OptOut {
    #[must_use]
    pub fn justified(justification: impl Into<String>) -> Self {
        Self {
            requested: true,
            justification: Some(justification.into()),
        }
    }

    /// Trimmed, non-empty justification text.
    #[must_use]
    pub fn justification_text(&self) -> Option<&str> {
        self.justification
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// What to do when the intersection removes a pattern the agent asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Report as a non-fatal finding
    #[default]
    Warn,
    /// Reject the resolution
    Error,
    /// Say nothing
    Ignore,
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "deny" => Ok(Self::Error),
            "ignore" | "off" => Ok(Self::Ignore),
            other => Err(format!(
                "invalid conflict policy {other} (expected warn|error|ignore)"
            )),
        }
    }
}

/// Output of [`resolve_collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResolution {
    pub effective: ConstraintSet,
    pub network_access: NetworkAccess,
    pub opt_out: OptOutRecord,
    /// Agent-allowed patterns the collection removed (empty under `Ignore`)
    pub conflicts: Vec<CapabilityPattern>,
    pub audit: Option<AuditEntry>,
}

/// Network precedence without opt-out.
///
/// A collection that forbids network beats an agent that asks for it, and an
/// agent that agrees with the collection is credited to the collection. An
/// agent that declares a different value otherwise keeps it; an agent that
/// declares nothing inherits the collection's value. Nothing declared means
/// no network.
#[must_use]
pub fn resolve_network(collection: Option<bool>, agent: Option<bool>) -> (bool, NetworkReason) {
    match (collection, agent) {
        (Some(false), Some(true)) => (false, NetworkReason::CollectionPolicyWins),
        (Some(policy), Some(requested)) if policy == requested => {
            (policy, NetworkReason::CollectionPolicyWins)
        }
        (_, Some(requested)) => (requested, NetworkReason::AgentMoreRestrictive),
        (Some(policy), None) => (policy, NetworkReason::CollectionPolicyWins),
        (None, None) => (false, NetworkReason::AgentMoreRestrictive),
    }
}

/// Justification of the agent's opt-out, if it requested one.
///
/// A requested opt-out without a non-empty justification is rejected
/// whether or not a collection is present.
pub fn opt_out_justification<'a>(
    agent: &'a AgentPolicy,
    scope: &str,
) -> Result<Option<&'a str>, PolicyError> {
    let Some(opt_out) = agent.opt_out.as_ref().filter(|o| o.requested) else {
        return Ok(None);
    };
    opt_out
        .justification_text()
        .map(Some)
        .ok_or_else(|| PolicyError::MissingJustification {
            subject: format!("opt-out of {scope} constraints by agent '{}'", agent.name),
        })
}

/// Apply collection policy to an agent.
pub fn resolve_collection(
    collection: &CollectionPolicy,
    agent: &AgentPolicy,
    conflict_policy: ConflictPolicy,
) -> Result<CollectionResolution, Vec<PolicyError>> {
    let scope = format!("collection '{}'", collection.name);
    if let Some(justification) = opt_out_justification(agent, &scope).map_err(|err| vec![err])? {
        info!(
            agent = %agent.name,
            collection = %collection.name,
            "agent opted out of collection constraints"
        );

        return Ok(CollectionResolution {
            effective: agent.constraints.clone(),
            network_access: NetworkAccess {
                collection_policy: collection.requires_network,
                agent_requested: agent.requires_network,
                final_resolution: agent.requires_network.unwrap_or(false),
                resolution_reason: NetworkReason::AgentOptOut,
            },
            opt_out: OptOutRecord {
                requested: true,
                justification: Some(justification.to_string()),
            },
            conflicts: Vec::new(),
            audit: Some(AuditEntry {
                event: AuditEvent::OptOut,
                subject: agent.name.clone(),
                justification: justification.to_string(),
                audit_level: None,
            }),
        });
    }

    let effective = intersect(&collection.constraints, &agent.constraints);
    let removed: Vec<CapabilityPattern> = agent
        .constraints
        .allowed()
        .iter()
        .filter(|pattern| !effective.covers(pattern))
        .filter(|pattern| !agent.constraints.fully_denies(pattern))
        .cloned()
        .collect();

    debug!(
        agent = %agent.name,
        collection = %collection.name,
        allowed = effective.allowed().len(),
        denied = effective.denied().len(),
        removed = removed.len(),
        "intersected agent with collection constraints"
    );

    let conflicts = match conflict_policy {
        ConflictPolicy::Ignore => Vec::new(),
        ConflictPolicy::Warn => removed,
        ConflictPolicy::Error => {
            if !removed.is_empty() {
                return Err(removed
                    .iter()
                    .map(|pattern| PolicyError::ConstraintConflict {
                        agent: agent.name.clone(),
                        pattern: pattern.to_string(),
                    })
                    .collect());
            }
            Vec::new()
        }
    };

    let (final_resolution, resolution_reason) =
        resolve_network(collection.requires_network, agent.requires_network);

    Ok(CollectionResolution {
        effective,
        network_access: NetworkAccess {
            collection_policy: collection.requires_network,
            agent_requested: agent.requires_network,
            final_resolution,
            resolution_reason,
        },
        opt_out: OptOutRecord {
            requested: agent.opt_out.as_ref().is_some_and(|o| o.requested),
            justification: None,
        },
        conflicts,
        audit: None,
    })
}
