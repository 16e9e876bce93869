//! Per-agent resolution pipeline and parallel batches.
//!
//! [`resolve`] runs every resolver for one request and either returns a
//! complete [`Resolution`] or every policy error any stage produced. Nothing
//! here touches the filesystem; callers supply a request whose
//! [`ResolutionContext`](crate::registry::ResolutionContext) is already known.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compose::{MergedResources, resolve_collisions};
use crate::config::ResolutionConfig;
use crate::document::ResolutionRequest;
use crate::error::{PolicyError, PolicyErrors};
use crate::lint::{Diagnostic, RuleCategory};
use crate::policy::{
    AgentPolicy, CollectionPolicy, ConflictPolicy, ConstraintSet, opt_out_justification,
    resolve_collection, resolve_delegation, resolve_network,
};
use crate::registry::{DEFAULT_SUGGESTION_THRESHOLD, ResolvedSpecialist, resolve_specialist};
use crate::report::{AuditEntry, NetworkAccess, OptOutRecord, ResolutionReport};
use crate::security::redact_secrets;

/// Knobs for a resolution call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    pub conflict_policy: ConflictPolicy,
    pub suggestion_threshold: f64,
    /// Redact credentials from justifications before they reach the report
    pub redact_audit_text: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Warn,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            redact_audit_text: true,
        }
    }
}

impl From<&ResolutionConfig> for ResolveOptions {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            conflict_policy: config.conflict_policy,
            suggestion_threshold: config.suggestion_threshold,
            redact_audit_text: config.redact_audit_text,
        }
    }
}

/// A successful resolution: the report plus what did not block it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub agent: String,
    pub report: ResolutionReport,
    /// Non-fatal findings (collection conflicts, shadowed elevations, last-wins merges)
    pub findings: Vec<Diagnostic>,
    pub specialists: Vec<ResolvedSpecialist>,
    pub resources: MergedResources,
    /// Every audited grant, opt-out first
    pub audit: Vec<AuditEntry>,
}

/// Resolve one agent request.
pub fn resolve(
    request: &ResolutionRequest,
    options: &ResolveOptions,
) -> Result<Resolution, PolicyErrors> {
    let agent_name = request.label().to_string();
    let mut errors: Vec<PolicyError> = Vec::new();
    let mut findings = Vec::new();
    let mut audit = Vec::new();

    // Stage 1: collection/agent constraints.
    let agent_set = collect(request.agent.constraints(), &mut errors);
    let collection_set = request
        .collection
        .as_ref()
        .map(|doc| (doc, collect(doc.constraints(), &mut errors)));

    let mut base = None;
    if let Some(agent_constraints) = agent_set {
        let agent = AgentPolicy {
            name: agent_name.clone(),
            constraints: agent_constraints,
            requires_network: request.agent.requires_network,
            opt_out: request.agent.opt_out.clone(),
        };
        match collection_set {
            Some((doc, Some(constraints))) => {
                let collection = CollectionPolicy {
                    name: doc.name.clone(),
                    constraints,
                    requires_network: doc.requires_network,
                };
                match resolve_collection(&collection, &agent, options.conflict_policy) {
                    Ok(outcome) => {
                        for pattern in &outcome.conflicts {
                            warn!(
                                agent = %agent_name,
                                pattern = %pattern,
                                "collection policy removed an allowed pattern"
                            );
                            findings.push(
                                Diagnostic::warning(
                                    "collection-conflict",
                                    format!(
                                        "collection '{}' removes allowed pattern '{pattern}'",
                                        collection.name
                                    ),
                                )
                                .with_suggestion(format!(
                                    "drop '{pattern}' from the agent or request an opt-out"
                                ))
                                .with_category(RuleCategory::Policy),
                            );
                        }
                        audit.extend(outcome.audit);
                        base = Some((outcome.effective, outcome.network_access, outcome.opt_out));
                    }
                    Err(stage) => errors.extend(stage),
                }
            }
            Some((_, None)) => {}
            None => match opt_out_justification(&agent, "standalone") {
                Ok(_) => base = Some(standalone_base(&agent)),
                Err(err) => errors.push(err),
            },
        }
    }
    debug!(agent = %agent_name, ok = base.is_some(), "collection stage done");

    // Stage 2: module resource collisions.
    let contributions: Vec<_> = request.modules.iter().map(|m| m.contribution()).collect();
    let resources = collect(resolve_collisions(&contributions), &mut errors).unwrap_or_default();
    for record in &resources.collisions.steering_collisions {
        if let Some(warning) = &record.warning {
            findings.push(
                Diagnostic::warning("steering-last-wins", warning.clone())
                    .with_category(RuleCategory::Composition),
            );
        }
    }
    debug!(agent = %agent_name, collisions = resources.collisions.len(), "collision stage done");

    // Stage 3: specialist tokens.
    let mut specialists = Vec::new();
    match &request.context {
        Some(context) => {
            for token in &request.specialists {
                match resolve_specialist(token, context, options.suggestion_threshold) {
                    Ok(resolved) => specialists.push(resolved),
                    Err(err) => errors.push(err),
                }
            }
        }
        None if !request.specialists.is_empty() => {
            debug!(
                agent = %agent_name,
                tokens = request.specialists.len(),
                "no resolution context; specialist tokens left unresolved"
            );
        }
        None => {}
    }

    // Stage 4: delegation, delegator = the agent's effective set.
    let mut delegation = None;
    if let Some(doc) = &request.delegation {
        let subagent = collect(doc.subagent.constraints(), &mut errors);
        let config = collect(doc.security.into_config(), &mut errors);
        if let (Some((delegator, _, _)), Some(subagent), Some(config)) = (&base, subagent, config)
        {
            let subagent_name = if doc.subagent.name.is_empty() {
                "subagent"
            } else {
                doc.subagent.name.as_str()
            };
            match resolve_delegation(delegator, &subagent, subagent_name, &config) {
                Ok(outcome) => {
                    for pattern in &outcome.shadowed {
                        warn!(subagent = subagent_name, pattern = %pattern, "elevation shadowed by denial");
                        findings.push(
                            Diagnostic::warning(
                                "shadowed-elevation",
                                format!(
                                    "elevation '{pattern}' is still denied by the delegator and grants nothing"
                                ),
                            )
                            .with_category(RuleCategory::Audit),
                        );
                    }
                    audit.extend(outcome.report.audit_trail.iter().cloned());
                    delegation = Some(outcome.report);
                }
                Err(stage) => errors.extend(stage),
            }
        }
    }

    PolicyErrors::check(errors)?;

    // `base` is only unset when stage 1 recorded an error.
    let (effective, network_access, opt_out) =
        base.unwrap_or_else(|| standalone_base(&AgentPolicy::default()));

    let mut resolution = Resolution {
        report: ResolutionReport {
            final_allowed_tools: effective.allowed_strings(),
            final_denied_tools: effective.denied_strings(),
            network_access,
            collisions: resources.collisions.clone(),
            delegation,
            opt_out,
        },
        agent: agent_name,
        findings,
        specialists,
        resources,
        audit,
    };

    if options.redact_audit_text {
        redact_resolution(&mut resolution);
    }

    info!(
        agent = %resolution.agent,
        allowed = resolution.report.final_allowed_tools.len(),
        findings = resolution.findings.len(),
        "resolution complete"
    );
    Ok(resolution)
}

/// Resolve independent requests in parallel, one outcome per request in input order.
#[must_use]
pub fn resolve_batch(
    requests: &[ResolutionRequest],
    options: &ResolveOptions,
) -> Vec<Result<Resolution, PolicyErrors>> {
    debug!(requests = requests.len(), "resolving batch");
    requests
        .par_iter()
        .map(|request| resolve(request, options))
        .collect()
}

fn collect<T>(result: Result<T, Vec<PolicyError>>, errors: &mut Vec<PolicyError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(stage) => {
            errors.extend(stage);
            None
        }
    }
}

fn standalone_base(agent: &AgentPolicy) -> (ConstraintSet, NetworkAccess, OptOutRecord) {
    let (final_resolution, resolution_reason) = resolve_network(None, agent.requires_network);
    let opt_out = agent.opt_out.as_ref().map_or_else(OptOutRecord::default, |o| OptOutRecord {
        requested: o.requested,
        justification: o.justification_text().map(ToString::to_string),
    });
    (
        agent.constraints.clone(),
        NetworkAccess {
            collection_policy: None,
            agent_requested: agent.requires_network,
            final_resolution,
            resolution_reason,
        },
        opt_out,
    )
}

fn redact_resolution(resolution: &mut Resolution) {
    let report = &mut resolution.report;
    if let Some(text) = report.opt_out.justification.as_mut() {
        *text = redact_secrets(text);
    }
    if let Some(delegation) = report.delegation.as_mut() {
        for elevation in &mut delegation.elevations {
            elevation.justification = redact_secrets(&elevation.justification);
        }
        for entry in &mut delegation.audit_trail {
            entry.justification = redact_secrets(&entry.justification);
        }
    }
    for entry in &mut resolution.audit {
        entry.justification = redact_secrets(&entry.justification);
    }
}
