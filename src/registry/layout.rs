//! Derive a [`ResolutionContext`] from the directory layout around an agent.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, trace};

use super::specialist::{RegistryEntry, ResolutionContext, SiblingDir};
use crate::error::{ForgeError, Result};

/// Manifest file that marks a collection root.
pub const COLLECTION_MANIFEST: &str = "collection.yaml";
/// File that marks a directory as an agent module.
pub const AGENT_DEFINITION: &str = "agent.yaml";

/// How many ancestors are searched for a collection manifest.
const MAX_ANCESTOR_DEPTH: usize = 3;

#[derive(Debug, Default, Deserialize)]
struct CollectionManifest {
    #[serde(default)]
    meta: Option<ManifestMeta>,
    #[serde(default)]
    agents: Vec<RegistryEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestMeta {
    name: String,
}

/// Find the context an agent directory resolves its specialists in.
///
/// The nearest ancestor `collection.yaml` (within three levels) that
/// registers `agent_dir` makes it collection-scoped. Otherwise the agent is
/// standalone and its siblings are the parent's other subdirectories.
pub fn discover_context(agent_dir: &Path) -> Result<ResolutionContext> {
    let agent_dir = fs::canonicalize(agent_dir)?;

    for ancestor in agent_dir.ancestors().skip(1).take(MAX_ANCESTOR_DEPTH) {
        let manifest_path = ancestor.join(COLLECTION_MANIFEST);
        if !manifest_path.is_file() {
            continue;
        }
        let manifest = load_manifest(&manifest_path)?;
        let registered = manifest.agents.iter().any(|entry| {
            fs::canonicalize(ancestor.join(&entry.path)).is_ok_and(|path| path == agent_dir)
        });
        if !registered {
            trace!(manifest = %manifest_path.display(), "agent not registered in collection");
            continue;
        }

        let collection = manifest.meta.map_or_else(|| dir_name(ancestor), |meta| meta.name);
        debug!(
            collection = %collection,
            agents = manifest.agents.len(),
            "agent is collection-scoped"
        );
        return Ok(ResolutionContext::Collection {
            collection,
            registry: manifest.agents,
        });
    }

    let siblings = match agent_dir.parent() {
        Some(parent) => list_siblings(parent, &agent_dir)?,
        None => Vec::new(),
    };
    debug!(siblings = siblings.len(), "agent is standalone");

    Ok(ResolutionContext::Standalone {
        agent_dir: agent_dir.display().to_string(),
        siblings,
    })
}

fn load_manifest(path: &Path) -> Result<CollectionManifest> {
    let raw = fs::read_to_string(path)?;
    serde_yaml::from_str(&raw).map_err(|err| ForgeError::InvalidDocument {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn list_siblings(parent: &Path, agent_dir: &Path) -> Result<Vec<SiblingDir>> {
    let mut siblings = Vec::new();
    for entry in fs::read_dir(parent)? {
        let path = entry?.path();
        if !path.is_dir() || path == agent_dir {
            continue;
        }
        siblings.push(SiblingDir {
            name: dir_name(&path),
            has_agent_definition: path.join(AGENT_DEFINITION).is_file(),
        });
    }
    siblings.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(siblings)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
