//! Builders for documents and contexts used across unit and integration tests.

use crate::compose::{ModuleContribution, ModuleReference, split_sections};
use crate::document::ConstraintDocument;
use crate::policy::ConstraintSet;
use crate::registry::{RegistryEntry, ResolutionContext, SiblingDir};

/// Parse a constraint set, panicking on malformed patterns.
#[must_use]
pub fn constraint_set(allowed: &[&str], denied: &[&str]) -> ConstraintSet {
    ConstraintSet::from_raw(allowed, denied).expect("fixture patterns are valid")
}

#[must_use]
pub fn constraint_doc(name: &str, allowed: &[&str], denied: &[&str]) -> ConstraintDocument {
    ConstraintDocument {
        name: name.to_string(),
        allowed_tools: allowed.iter().map(ToString::to_string).collect(),
        denied_tools: denied.iter().map(ToString::to_string).collect(),
        ..ConstraintDocument::default()
    }
}

/// A module contributing tools and optional steering markdown.
#[must_use]
pub fn contribution(reference: ModuleReference, tools: &[&str], steering: &str) -> ModuleContribution {
    ModuleContribution {
        reference,
        tools: tools.iter().map(ToString::to_string).collect(),
        servers: Vec::new(),
        steering: split_sections(steering),
    }
}

/// Collection context over `(path, role)` registry entries.
#[must_use]
pub fn collection_context(name: &str, entries: &[(&str, &str)]) -> ResolutionContext {
    ResolutionContext::Collection {
        collection: name.to_string(),
        registry: entries
            .iter()
            .map(|(path, role)| RegistryEntry::new(*path, *role))
            .collect(),
    }
}

/// Standalone context; `(name, has_agent_definition)` per sibling.
#[must_use]
pub fn standalone_context(agent_dir: &str, siblings: &[(&str, bool)]) -> ResolutionContext {
    ResolutionContext::Standalone {
        agent_dir: agent_dir.to_string(),
        siblings: siblings
            .iter()
            .map(|(name, is_agent)| {
                if *is_agent {
                    SiblingDir::agent(*name)
                } else {
                    SiblingDir::plain(*name)
                }
            })
            .collect(),
    }
}
