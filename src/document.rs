//! Authored input documents.
//!
//! These are the raw, already-parsed shapes handed over by document loaders.
//! Nothing here is validated beyond its YAML/JSON structure; pattern syntax
//! and flag combinations are checked when the engine converts them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compose::{ModuleContribution, ModuleReference, split_sections};
use crate::error::{ForgeError, PolicyError, Result};
use crate::policy::{ConstraintSet, DelegationSecurityDoc, OptOut};
use crate::registry::ResolutionContext;

/// A constraint block as written in an agent, collection or subagent file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub denied_tools: Vec<String>,
    #[serde(default)]
    pub requires_network: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_out: Option<OptOut>,
}

impl ConstraintDocument {
    pub fn constraints(&self) -> std::result::Result<ConstraintSet, Vec<PolicyError>> {
        ConstraintSet::from_raw(&self.allowed_tools, &self.denied_tools)
    }
}

/// One referenced module and the resources it declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDoc {
    pub reference: ModuleReference,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub servers: Vec<String>,
    /// Markdown steering content, split on `#`/`##` headings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering: Option<String>,
}

impl ModuleDoc {
    #[must_use]
    pub fn contribution(&self) -> ModuleContribution {
        ModuleContribution {
            reference: self.reference.clone(),
            tools: self.tools.clone(),
            servers: self.servers.clone(),
            steering: self
                .steering
                .as_deref()
                .map(split_sections)
                .unwrap_or_default(),
        }
    }
}

/// A subagent invocation and the security block governing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationDoc {
    pub subagent: ConstraintDocument,
    #[serde(default)]
    pub security: DelegationSecurityDoc,
}

/// Everything needed to resolve one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub agent: ConstraintDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<ConstraintDocument>,
    #[serde(default)]
    pub modules: Vec<ModuleDoc>,
    /// Specialist tokens from the agent's delegation allow-list
    #[serde(default, alias = "allowed_specialists")]
    pub specialists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ResolutionContext>,
    /// Agent directory, used to discover `context` when it is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<DelegationDoc>,
}

impl ResolutionRequest {
    /// Display label: the agent name, else `"agent"`.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.agent.name.is_empty() {
            "agent"
        } else {
            &self.agent.name
        }
    }
}

/// Load a request from a YAML or JSON file.
pub fn load_request(path: &Path) -> Result<ResolutionRequest> {
    let raw = std::fs::read_to_string(path)?;
    parse_request(&raw).map_err(|message| ForgeError::InvalidDocument {
        path: path.display().to_string(),
        message,
    })
}

/// Parse a request from YAML or JSON text.
pub fn parse_request(raw: &str) -> std::result::Result<ResolutionRequest, String> {
    serde_yaml::from_str(raw).map_err(|err| err.to_string())
}
