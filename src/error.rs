//! Error types for powerforge.
//!
//! Two layers:
//! - [`PolicyError`] is the structured taxonomy produced by resolution. A
//!   resolution call fails with a non-empty [`PolicyErrors`] list, never a
//!   single opaque error.
//! - [`ForgeError`] is the crate-level error used by loaders, configuration
//!   and the binary. It wraps [`PolicyErrors`] when a resolution is rejected.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::report::CollisionKind;

/// A structured policy validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PolicyError {
    /// Wildcard outside the trailing position, empty token, or invalid characters.
    #[error("malformed pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// The collection intersection removed a pattern the agent explicitly allowed.
    #[error(
        "constraint conflict: agent '{agent}' allows {pattern:?} but the collection policy removes it"
    )]
    ConstraintConflict { agent: String, pattern: String },

    #[error("{subject} requires a non-empty justification")]
    MissingJustification { subject: String },

    #[error("insecure delegation config: {reason}")]
    InsecureDelegationConfig { reason: String },

    #[error("elevation pattern {pattern:?} covers the entire capability namespace")]
    OverlyBroadElevation { pattern: String },

    #[error("audit trail cannot be disabled in {mode} delegation mode")]
    AuditTrailRequired { mode: String },

    #[error("unresolved {kind} collision on {name:?} between '{first}' and '{second}' (hint: {suggestion})")]
    UnresolvedCollision {
        kind: CollisionKind,
        name: String,
        first: String,
        second: String,
        suggestion: String,
    },

    #[error("{}", specialist_message(.token, .context, .available, .suggestion))]
    SpecialistNotFound {
        token: String,
        context: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },
}

impl PolicyError {
    /// Stable machine-readable code for robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedPattern { .. } => "malformed_pattern",
            Self::ConstraintConflict { .. } => "constraint_conflict",
            Self::MissingJustification { .. } => "missing_justification",
            Self::InsecureDelegationConfig { .. } => "insecure_delegation_config",
            Self::OverlyBroadElevation { .. } => "overly_broad_elevation",
            Self::AuditTrailRequired { .. } => "audit_trail_required",
            Self::UnresolvedCollision { .. } => "unresolved_collision",
            Self::SpecialistNotFound { .. } => "specialist_not_found",
        }
    }
}

fn specialist_message(
    token: &str,
    context: &str,
    available: &[String],
    suggestion: &Option<String>,
) -> String {
    let mut message = format!("specialist '{token}' not found in {context} context");
    if available.is_empty() {
        message.push_str(" (no candidates available)");
    } else {
        message.push_str(&format!(" (available: {})", available.join(", ")));
    }
    if let Some(suggestion) = suggestion {
        message.push_str(&format!("; did you mean {suggestion}?"));
    }
    message
}

/// A non-empty list of policy errors from a single resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PolicyErrors(Vec<PolicyError>);

impl PolicyErrors {
    /// Turn an accumulated error list into a result. Empty means success.
    pub fn check(errors: Vec<PolicyError>) -> std::result::Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[PolicyError] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<PolicyError> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A constructed list is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any error has the given code.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|err| err.code() == code)
    }
}

impl From<PolicyError> for PolicyErrors {
    fn from(error: PolicyError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for PolicyErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(f, "{count} policy error{}", if count == 1 { "" } else { "s" })?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PolicyErrors {}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Policy(#[from] PolicyErrors),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
