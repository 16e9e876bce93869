//! Constraint set algebra.
//!
//! Composition is defined at the identifier level, not as string-set
//! intersection: an identifier is permitted by `intersect(a, b)` iff both
//! sides allow it and neither side denies it. The pattern lists reported for
//! the composed set are chosen so that evaluating them gives exactly that
//! answer.

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use super::pattern::{self, CapabilityPattern};
use crate::error::PolicyError;

/// An allow/deny pair of capability patterns. Denial always dominates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    allowed: Vec<CapabilityPattern>,
    denied: Vec<CapabilityPattern>,
}

impl ConstraintSet {
    #[must_use]
    pub const fn new(allowed: Vec<CapabilityPattern>, denied: Vec<CapabilityPattern>) -> Self {
        Self { allowed, denied }
    }

    /// Build from raw pattern strings, reporting every malformed pattern.
    pub fn from_raw<A, D>(allowed: &[A], denied: &[D]) -> Result<Self, Vec<PolicyError>>
    where
        A: AsRef<str>,
        D: AsRef<str>,
    {
        let allowed = pattern::parse_all(allowed);
        let denied = pattern::parse_all(denied);
        match (allowed, denied) {
            (Ok(allowed), Ok(denied)) => Ok(Self { allowed, denied }),
            (allowed, denied) => {
                let mut errors = allowed.err().unwrap_or_default();
                errors.extend(denied.err().unwrap_or_default());
                Err(errors)
            }
        }
    }

    #[must_use]
    pub fn allowed(&self) -> &[CapabilityPattern] {
        &self.allowed
    }

    #[must_use]
    pub fn denied(&self) -> &[CapabilityPattern] {
        &self.denied
    }

    /// `∃ p ∈ allowed: matches(p, identifier)`
    #[must_use]
    pub fn allowed_under(&self, identifier: &str) -> bool {
        self.allowed.iter().any(|p| p.matches(identifier))
    }

    /// `∃ p ∈ denied: matches(p, identifier)`
    #[must_use]
    pub fn denied_under(&self, identifier: &str) -> bool {
        self.denied.iter().any(|p| p.matches(identifier))
    }

    /// Final evaluation: allowed and not denied.
    #[must_use]
    pub fn permits(&self, identifier: &str) -> bool {
        self.allowed_under(identifier) && !self.denied_under(identifier)
    }

    /// Whether everything `pattern` matches is covered by some allowed pattern.
    #[must_use]
    pub fn covers(&self, pattern: &CapabilityPattern) -> bool {
        self.allowed.iter().any(|p| p.subsumes(pattern))
    }

    /// Whether everything `pattern` matches is denied by a single denied pattern.
    #[must_use]
    pub fn fully_denies(&self, pattern: &CapabilityPattern) -> bool {
        self.denied.iter().any(|d| d.subsumes(pattern))
    }

    /// A new set with extra allowed patterns appended. Denied is untouched.
    #[must_use]
    pub fn with_allowed(&self, extra: impl IntoIterator<Item = CapabilityPattern>) -> Self {
        let mut allowed = self.allowed.clone();
        for pattern in extra {
            if !allowed.contains(&pattern) {
                allowed.push(pattern);
            }
        }
        Self {
            allowed,
            denied: self.denied.clone(),
        }
    }

    #[must_use]
    pub fn allowed_strings(&self) -> Vec<String> {
        self.allowed.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn denied_strings(&self) -> Vec<String> {
        self.denied.iter().map(ToString::to_string).collect()
    }
}

/// Compose two constraint sets.
///
/// Allowed keeps each pattern from one side that is subsumed by an allowed
/// pattern of the other side (side `a` first), minus redundant and
/// fully-denied entries. Denied is [`union_denied`].
#[must_use]
pub fn intersect(a: &ConstraintSet, b: &ConstraintSet) -> ConstraintSet {
    let from_a = a.allowed.iter().filter(|p| b.covers(p));
    let from_b = b.allowed.iter().filter(|p| a.covers(p));
    let candidates: Vec<CapabilityPattern> = from_a.chain(from_b).cloned().collect();

    let denied = union_denied(a, b);
    let allowed = minimize(&candidates)
        .into_iter()
        .filter(|p| !denied.iter().any(|d| d.subsumes(p)))
        .collect();

    ConstraintSet { allowed, denied }
}

/// Denied by either side.
#[must_use]
pub fn union_denied(a: &ConstraintSet, b: &ConstraintSet) -> Vec<CapabilityPattern> {
    let combined: Vec<CapabilityPattern> = a.denied.iter().chain(&b.denied).cloned().collect();
    minimize(&combined)
}

/// Drop duplicates (first occurrence wins) and patterns subsumed by another entry.
fn minimize(patterns: &[CapabilityPattern]) -> Vec<CapabilityPattern> {
    patterns
        .iter()
        .enumerate()
        .filter(|(idx, candidate)| {
            !patterns.iter().enumerate().any(|(other_idx, other)| {
                other_idx != *idx
                    && other.subsumes(candidate)
                    && (other != *candidate || other_idx < *idx)
            })
        })
        .map(|(_, pattern)| pattern.clone())
        .collect()
}

impl Serialize for ConstraintSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConstraintSet", 2)?;
        state.serialize_field("allowed_tools", &self.allowed_strings())?;
        state.serialize_field("denied_tools", &self.denied_strings())?;
        state.end()
    }
}
