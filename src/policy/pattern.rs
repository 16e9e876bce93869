//! Capability patterns and the prefix/wildcard matcher.
//!
//! A pattern is a dot-separated token path such as `filesystem.read`, optionally
//! ending in a single wildcard token (`network.*`) that covers the prefix and
//! everything beneath it. Matching is token-based: `network.*` covers
//! `network` and `network.internal.dns` but not `networking`.
//!
//! There is no general globbing. Partial wildcards (`fs*`, `**`) and wildcards
//! in non-final positions are rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The wildcard token.
pub const WILDCARD: &str = "*";

const SEPARATOR: char = '.';

/// A parsed, validated capability pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityPattern {
    prefix: Vec<String>,
    wildcard: bool,
}

impl CapabilityPattern {
    /// Parse and validate a raw pattern string.
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        let malformed = |reason: String| PolicyError::MalformedPattern {
            pattern: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(malformed("pattern is empty".to_string()));
        }

        let tokens: Vec<&str> = raw.split(SEPARATOR).collect();
        let last = tokens.len() - 1;
        let mut prefix = Vec::with_capacity(tokens.len());
        let mut wildcard = false;

        for (idx, token) in tokens.iter().enumerate() {
            if token.is_empty() {
                return Err(malformed(format!("empty token at position {}", idx + 1)));
            }
            if *token == WILDCARD {
                if idx != last {
                    return Err(malformed("wildcard must be the final token".to_string()));
                }
                wildcard = true;
                continue;
            }
            if token.contains('*') {
                return Err(malformed(format!(
                    "partial wildcard token {token:?} is not supported"
                )));
            }
            if let Some(bad) = token
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            {
                return Err(malformed(format!("invalid character {bad:?}")));
            }
            prefix.push((*token).to_string());
        }

        Ok(Self { prefix, wildcard })
    }

    /// The non-wildcard tokens.
    #[must_use]
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Whether the pattern ends in the wildcard token.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// A bare wildcard: matches every identifier in the namespace.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.wildcard && self.prefix.is_empty()
    }

    /// Whether this pattern covers a concrete identifier.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        let mut tokens = identifier.split(SEPARATOR);
        for expected in &self.prefix {
            match tokens.next() {
                Some(token) if token == expected => {}
                _ => return false,
            }
        }
        self.wildcard || tokens.next().is_none()
    }

    /// Whether every identifier matched by `other` is also matched by `self`.
    #[must_use]
    pub fn subsumes(&self, other: &Self) -> bool {
        if self.wildcard {
            other.prefix.starts_with(&self.prefix)
        } else {
            !other.wildcard && other.prefix == self.prefix
        }
    }
}

/// Contract form of [`CapabilityPattern::matches`].
#[must_use]
pub fn matches(pattern: &CapabilityPattern, identifier: &str) -> bool {
    pattern.matches(identifier)
}

/// Contract form of [`CapabilityPattern::subsumes`].
#[must_use]
pub fn subsumes(broader: &CapabilityPattern, narrower: &CapabilityPattern) -> bool {
    broader.subsumes(narrower)
}

/// Parse a list of raw patterns, collecting every malformed entry.
pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<CapabilityPattern>, Vec<PolicyError>> {
    let mut patterns = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();
    for entry in raw {
        match CapabilityPattern::parse(entry.as_ref()) {
            Ok(pattern) => patterns.push(pattern),
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        Ok(patterns)
    } else {
        Err(errors)
    }
}

impl fmt::Display for CapabilityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.prefix.join(".");
        match (self.prefix.is_empty(), self.wildcard) {
            (true, _) => write!(f, "{WILDCARD}"),
            (false, true) => write!(f, "{joined}.{WILDCARD}"),
            (false, false) => write!(f, "{joined}"),
        }
    }
}

impl FromStr for CapabilityPattern {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CapabilityPattern {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CapabilityPattern> for String {
    fn from(pattern: CapabilityPattern) -> Self {
        pattern.to_string()
    }
}
