//! Resolving specialist tokens to agent modules.
//!
//! Inside a collection the registry is authoritative and only module
//! basenames are lookup keys. Outside one, a token names a sibling directory
//! that holds an agent definition.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PolicyError;

/// Default minimum similarity for a "did you mean" suggestion.
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

/// One entry of a collection's agent registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub path: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(path: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role: Some(role.into()),
        }
    }

    /// Final path component, the module's lookup key.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.path
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.path)
    }
}

/// A directory next to the delegator's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingDir {
    pub name: String,
    pub has_agent_definition: bool,
}

impl SiblingDir {
    #[must_use]
    pub fn agent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_agent_definition: true,
        }
    }

    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_agent_definition: false,
        }
    }
}

/// Where a delegator lives, which decides how its specialists are found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionContext {
    Collection {
        collection: String,
        registry: Vec<RegistryEntry>,
    },
    Standalone {
        agent_dir: String,
        siblings: Vec<SiblingDir>,
    },
}

impl ResolutionContext {
    /// Label used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Collection { collection, .. } => format!("collection '{collection}'"),
            Self::Standalone { .. } => "standalone".to_string(),
        }
    }
}

/// A specialist token bound to a concrete module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSpecialist {
    pub token: String,
    pub module: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Resolve one specialist token in the delegator's context.
pub fn resolve_specialist(
    token: &str,
    context: &ResolutionContext,
    threshold: f64,
) -> Result<ResolvedSpecialist, PolicyError> {
    match context {
        ResolutionContext::Collection { registry, .. } => {
            if let Some(entry) = registry.iter().find(|e| e.basename() == token) {
                debug!(token, module = entry.basename(), "resolved specialist in collection");
                return Ok(ResolvedSpecialist {
                    token: token.to_string(),
                    module: entry.basename().to_string(),
                    path: entry.path.clone(),
                    role: entry.role.clone(),
                });
            }

            let available: Vec<String> =
                registry.iter().map(|e| e.basename().to_string()).collect();
            let by_role = registry
                .iter()
                .find(|e| {
                    e.role
                        .as_deref()
                        .is_some_and(|role| role.trim().eq_ignore_ascii_case(token.trim()))
                })
                .map(|e| e.basename().to_string());
            let suggestion =
                by_role.or_else(|| suggest(token, available.iter().map(String::as_str), threshold));

            Err(PolicyError::SpecialistNotFound {
                token: token.to_string(),
                context: context.describe(),
                available,
                suggestion,
            })
        }
        ResolutionContext::Standalone {
            agent_dir,
            siblings,
        } => {
            if let Some(sibling) = siblings
                .iter()
                .find(|s| s.name == token && s.has_agent_definition)
            {
                debug!(token, "resolved specialist as sibling directory");
                return Ok(ResolvedSpecialist {
                    token: token.to_string(),
                    module: sibling.name.clone(),
                    path: sibling_path(agent_dir, &sibling.name),
                    role: None,
                });
            }

            let available: Vec<String> = siblings.iter().map(|s| s.name.clone()).collect();
            let suggestion = suggest(
                token,
                siblings
                    .iter()
                    .filter(|s| s.has_agent_definition && s.name != token)
                    .map(|s| s.name.as_str()),
                threshold,
            );

            Err(PolicyError::SpecialistNotFound {
                token: token.to_string(),
                context: context.describe(),
                available,
                suggestion,
            })
        }
    }
}

fn sibling_path(agent_dir: &str, sibling: &str) -> String {
    let trimmed = agent_dir.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => format!("{}/{sibling}", &trimmed[..idx]),
        None => format!("../{sibling}"),
    }
}

/// Best near-miss for `token` among `candidates`.
///
/// Highest normalized Levenshtein similarity at or above `threshold` wins;
/// failing that, the first candidate whose leading segment abbreviates the
/// token's (`db_expert` -> `database-specialist`).
#[must_use]
pub fn suggest<'a>(
    token: &str,
    candidates: impl Iterator<Item = &'a str>,
    threshold: f64,
) -> Option<String> {
    let normalized_token = normalize(token);
    let mut best: Option<(f64, &str)> = None;
    let mut abbreviated: Option<&str> = None;

    for candidate in candidates {
        let score = strsim::normalized_levenshtein(&normalized_token, &normalize(candidate));
        if score >= threshold && best.is_none_or(|(top, _)| score > top) {
            best = Some((score, candidate));
        }
        if abbreviated.is_none() && abbreviates(&normalized_token, &normalize(candidate)) {
            abbreviated = Some(candidate);
        }
    }

    best.map(|(_, name)| name)
        .or(abbreviated)
        .map(ToString::to_string)
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

fn leading_segment(name: &str) -> &str {
    name.split('-').next().unwrap_or(name)
}

/// Whether the token's leading segment is an in-order abbreviation of the
/// candidate's leading segment, starting with the same letter.
fn abbreviates(token: &str, candidate: &str) -> bool {
    let short = leading_segment(token);
    let long = leading_segment(candidate);
    if short.is_empty() || short.len() >= long.len() {
        return false;
    }
    if short.chars().next() != long.chars().next() {
        return false;
    }
    let mut remaining = long.chars();
    short.chars().all(|c| remaining.any(|l| l == c))
}
