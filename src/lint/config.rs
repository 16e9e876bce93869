//! Validation configuration.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::diagnostic::{Severity, SourceSpan};
use crate::config::LintConfig;
use crate::document::ConstraintDocument;
use crate::policy::DelegationSecurityDoc;

/// Configuration for validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Rules to disable by ID
    #[serde(default)]
    pub disabled_rules: HashSet<String>,

    /// Severity overrides by rule ID
    #[serde(default)]
    pub severity_overrides: HashMap<String, Severity>,

    /// Treat warnings as errors
    #[serde(default)]
    pub strict: bool,

    /// Maximum errors before stopping validation
    #[serde(default)]
    pub max_errors: Option<usize>,
}

impl ValidationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub const fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    #[must_use]
    pub fn disable_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.disabled_rules.insert(rule_id.into());
        self
    }

    #[must_use]
    pub fn override_severity(mut self, rule_id: impl Into<String>, severity: Severity) -> Self {
        self.severity_overrides.insert(rule_id.into(), severity);
        self
    }

    #[must_use]
    pub fn is_rule_disabled(&self, rule_id: &str) -> bool {
        self.disabled_rules.contains(rule_id)
    }

    /// Override first, then strict mode promotes warnings.
    #[must_use]
    pub fn effective_severity(&self, rule_id: &str, default: Severity) -> Severity {
        let severity = self
            .severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default);

        if self.strict && severity == Severity::Warning {
            Severity::Error
        } else {
            severity
        }
    }
}

impl From<&LintConfig> for ValidationConfig {
    fn from(config: &LintConfig) -> Self {
        Self {
            disabled_rules: config.disabled_rules.iter().cloned().collect(),
            strict: config.strict,
            ..Self::default()
        }
    }
}

/// What a rule gets to look at.
pub struct ValidationContext<'a> {
    /// The constraint document being validated
    pub document: &'a ConstraintDocument,

    /// Delegation block attached to the document, if any
    pub delegation: Option<&'a DelegationSecurityDoc>,

    pub config: &'a ValidationConfig,

    /// Original source text for span calculation
    pub source: Option<&'a str>,

    pub file_path: Option<&'a Path>,
}

impl<'a> ValidationContext<'a> {
    #[must_use]
    pub const fn new(document: &'a ConstraintDocument, config: &'a ValidationConfig) -> Self {
        Self {
            document,
            delegation: None,
            config,
            source: None,
            file_path: None,
        }
    }

    #[must_use]
    pub const fn with_delegation(mut self, delegation: &'a DelegationSecurityDoc) -> Self {
        self.delegation = Some(delegation);
        self
    }

    #[must_use]
    pub const fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub const fn with_file_path(mut self, path: &'a Path) -> Self {
        self.file_path = Some(path);
        self
    }

    /// Where `needle` first appears in the source, when source is known.
    #[must_use]
    pub fn span_of(&self, needle: &str) -> Option<SourceSpan> {
        self.source.and_then(|source| SourceSpan::locate(source, needle))
    }

    /// Every free-text justification in the document and its delegation block.
    #[must_use]
    pub fn justifications(&self) -> Vec<(String, &'a str)> {
        let mut out = Vec::new();
        if let Some(text) = self
            .document
            .opt_out
            .as_ref()
            .and_then(|o| o.justification.as_deref())
        {
            out.push(("opt-out".to_string(), text));
        }
        if let Some(delegation) = self.delegation {
            if let Some(text) = delegation.justification.as_deref() {
                out.push(("full delegation".to_string(), text));
            }
            for elevation in &delegation.elevations {
                if let Some(text) = elevation.justification.as_deref() {
                    out.push((format!("elevation of {}", elevation.pattern), text));
                }
            }
        }
        out
    }
}
