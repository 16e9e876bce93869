//! Delegation security: what a subagent may do when invoked by a delegator.
//!
//! The default is least privilege. A subagent invoked by a narrow delegator
//! only gets the intersection of both constraint sets, so a limited agent
//! cannot launder its requests through a broader one (the confused deputy).
//! Escalation is possible only through an explicit, justified, audited mode.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::constraints::{ConstraintSet, intersect};
use super::pattern::CapabilityPattern;
use crate::error::PolicyError;
use crate::report::{
    AppliedElevation, AuditEntry, AuditEvent, DelegationModeKind, DelegationReport,
};

/// Log verbosity for an audited elevation. Does not affect resolution.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// A justified grant beyond the delegator's own allowances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    pub pattern: CapabilityPattern,
    pub justification: String,
    pub audit_level: AuditLevel,
}

/// How a subagent's effective constraints are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DelegationMode {
    /// `intersect(delegator, subagent)`
    #[default]
    Intersection,
    /// The subagent's own constraints, verbatim
    FullDelegation { justification: String },
    /// The delegator's constraints plus explicit allowances
    Elevated { elevations: Vec<Elevation> },
}

impl DelegationMode {
    #[must_use]
    pub const fn kind(&self) -> DelegationModeKind {
        match self {
            Self::Intersection => DelegationModeKind::Intersection,
            Self::FullDelegation { .. } => DelegationModeKind::FullDelegation,
            Self::Elevated { .. } => DelegationModeKind::Elevated,
        }
    }
}

/// Mode plus the audit switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationSecurityConfig {
    mode: DelegationMode,
    audit_trail: bool,
}

impl Default for DelegationSecurityConfig {
    fn default() -> Self {
        Self::intersection()
    }
}

impl DelegationSecurityConfig {
    #[must_use]
    pub const fn intersection() -> Self {
        Self {
            mode: DelegationMode::Intersection,
            audit_trail: true,
        }
    }

    #[must_use]
    pub fn full_delegation(justification: impl Into<String>) -> Self {
        Self {
            mode: DelegationMode::FullDelegation {
                justification: justification.into(),
            },
            audit_trail: true,
        }
    }

    #[must_use]
    pub const fn elevated(elevations: Vec<Elevation>) -> Self {
        Self {
            mode: DelegationMode::Elevated { elevations },
            audit_trail: true,
        }
    }

    #[must_use]
    pub const fn with_audit_trail(mut self, enabled: bool) -> Self {
        self.audit_trail = enabled;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> &DelegationMode {
        &self.mode
    }

    #[must_use]
    pub const fn audit_trail(&self) -> bool {
        self.audit_trail
    }

    /// Every reason this configuration cannot be used.
    #[must_use]
    pub fn validate(&self) -> Vec<PolicyError> {
        let mut errors = Vec::new();

        if !matches!(self.mode, DelegationMode::Intersection) && !self.audit_trail {
            errors.push(PolicyError::AuditTrailRequired {
                mode: self.mode.kind().to_string(),
            });
        }

        match &self.mode {
            DelegationMode::Intersection => {}
            DelegationMode::FullDelegation { justification } => {
                if justification.trim().is_empty() {
                    errors.push(PolicyError::InsecureDelegationConfig {
                        reason: "full delegation requires a non-empty justification".to_string(),
                    });
                }
            }
            DelegationMode::Elevated { elevations } => {
                if elevations.is_empty() {
                    errors.push(PolicyError::InsecureDelegationConfig {
                        reason: "elevated mode requires at least one elevation".to_string(),
                    });
                }
                for elevation in elevations {
                    if elevation.justification.trim().is_empty() {
                        errors.push(PolicyError::MissingJustification {
                            subject: format!("elevation of {}", elevation.pattern),
                        });
                    }
                    if elevation.pattern.is_universal() {
                        errors.push(PolicyError::OverlyBroadElevation {
                            pattern: elevation.pattern.to_string(),
                        });
                    }
                }
            }
        }

        errors
    }
}

/// Raw `delegation_security` block as authored.
///
/// Converted into [`DelegationSecurityConfig`] by [`Self::into_config`], so
/// flag combinations with no valid meaning never reach resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSecurityDoc {
    #[serde(default)]
    pub intersection: Option<bool>,
    #[serde(default)]
    pub full_delegation: bool,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub elevations: Vec<ElevationDoc>,
    #[serde(default)]
    pub audit_trail: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationDoc {
    pub pattern: String,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub audit_level: AuditLevel,
}

impl DelegationSecurityDoc {
    /// Map the authored flags onto a single mode.
    pub fn into_config(&self) -> Result<DelegationSecurityConfig, Vec<PolicyError>> {
        let insecure = |reason: &str| {
            vec![PolicyError::InsecureDelegationConfig {
                reason: reason.to_string(),
            }]
        };

        let has_elevations = !self.elevations.is_empty();
        if self.full_delegation && has_elevations {
            return Err(insecure(
                "full_delegation and elevations are mutually exclusive",
            ));
        }
        if self.intersection == Some(true) && (self.full_delegation || has_elevations) {
            return Err(insecure(
                "intersection cannot be combined with full_delegation or elevations",
            ));
        }

        let mode = if self.full_delegation {
            DelegationMode::FullDelegation {
                justification: self.justification.clone().unwrap_or_default(),
            }
        } else if has_elevations {
            let mut elevations = Vec::with_capacity(self.elevations.len());
            let mut errors = Vec::new();
            for doc in &self.elevations {
                match CapabilityPattern::parse(&doc.pattern) {
                    Ok(pattern) => elevations.push(Elevation {
                        pattern,
                        justification: doc.justification.clone().unwrap_or_default(),
                        audit_level: doc.audit_level,
                    }),
                    Err(err) => errors.push(err),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            DelegationMode::Elevated { elevations }
        } else if self.intersection == Some(false) {
            return Err(insecure(
                "intersection disabled without full_delegation (with justification) or elevations",
            ));
        } else {
            DelegationMode::Intersection
        };

        Ok(DelegationSecurityConfig {
            mode,
            audit_trail: self.audit_trail.unwrap_or(true),
        })
    }
}

/// Output of [`resolve_delegation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationOutcome {
    pub effective: ConstraintSet,
    pub report: DelegationReport,
    /// Elevations the delegator still denies outright
    pub shadowed: Vec<CapabilityPattern>,
}

/// Compute the constraint set a subagent runs under.
pub fn resolve_delegation(
    delegator: &ConstraintSet,
    subagent: &ConstraintSet,
    subagent_name: &str,
    config: &DelegationSecurityConfig,
) -> Result<DelegationOutcome, Vec<PolicyError>> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut audit_trail = Vec::new();
    let mut applied = Vec::new();
    let mut shadowed = Vec::new();

    let effective = match config.mode() {
        DelegationMode::Intersection => intersect(delegator, subagent),
        DelegationMode::FullDelegation { justification } => {
            info!(subagent = subagent_name, "full delegation granted");
            audit_trail.push(AuditEntry {
                event: AuditEvent::FullDelegation,
                subject: subagent_name.to_string(),
                justification: justification.trim().to_string(),
                audit_level: None,
            });
            subagent.clone()
        }
        DelegationMode::Elevated { elevations } => {
            for elevation in elevations {
                info!(
                    subagent = subagent_name,
                    pattern = %elevation.pattern,
                    level = ?elevation.audit_level,
                    "elevation granted"
                );
                if delegator.fully_denies(&elevation.pattern) {
                    shadowed.push(elevation.pattern.clone());
                }
                applied.push(AppliedElevation {
                    pattern: elevation.pattern.to_string(),
                    justification: elevation.justification.trim().to_string(),
                    audit_level: elevation.audit_level,
                });
                audit_trail.push(AuditEntry {
                    event: AuditEvent::Elevation,
                    subject: elevation.pattern.to_string(),
                    justification: elevation.justification.trim().to_string(),
                    audit_level: Some(elevation.audit_level),
                });
            }
            delegator.with_allowed(elevations.iter().map(|e| e.pattern.clone()))
        }
    };

    debug!(
        subagent = subagent_name,
        mode = %config.mode().kind(),
        allowed = effective.allowed().len(),
        denied = effective.denied().len(),
        "resolved delegation"
    );

    Ok(DelegationOutcome {
        report: DelegationReport {
            mode: config.mode().kind(),
            effective_allowed_tools: effective.allowed_strings(),
            effective_denied_tools: effective.denied_strings(),
            elevations: applied,
            audit_trail,
        },
        effective,
        shadowed,
    })
}
