//! Validation engine for running rules against constraint documents.

use serde::Serialize;
use tracing::debug;

use crate::document::ConstraintDocument;

use super::config::{ValidationConfig, ValidationContext};
use super::diagnostic::{Diagnostic, RuleCategory, Severity};
use super::rule::BoxedRule;
use super::rules::all_rules;

/// Result of validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// All diagnostics collected
    pub diagnostics: Vec<Diagnostic>,
    /// Whether validation was truncated due to `max_errors`
    pub truncated: bool,
    /// Whether validation passed (no errors)
    pub passed: bool,
}

impl ValidationResult {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            truncated: false,
            passed: true,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
    }

    /// Filter diagnostics by category
    pub fn by_category(&self, category: RuleCategory) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.category == category)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.diagnostics.len()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// The validation engine that manages and runs rules
pub struct ValidationEngine {
    rules: Vec<BoxedRule>,
    config: ValidationConfig,
}

impl ValidationEngine {
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Engine with every built-in rule registered.
    #[must_use]
    pub fn builtin(config: ValidationConfig) -> Self {
        let mut engine = Self::new(config);
        for rule in all_rules() {
            engine.register(rule);
        }
        engine
    }

    pub fn register(&mut self, rule: BoxedRule) {
        self.rules.push(rule);
    }

    /// Register a validation rule (builder pattern)
    #[must_use]
    pub fn with_rule(mut self, rule: BoxedRule) -> Self {
        self.register(rule);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[BoxedRule] {
        &self.rules
    }

    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    #[must_use]
    pub fn validate(&self, document: &ConstraintDocument) -> ValidationResult {
        let ctx = ValidationContext::new(document, &self.config);
        self.validate_with_context(&ctx)
    }

    #[must_use]
    pub fn validate_with_context(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut error_count = 0;

        for rule in &self.rules {
            if self.config.is_rule_disabled(rule.id()) {
                debug!(rule = rule.id(), "rule disabled");
                continue;
            }

            for mut diag in rule.validate(ctx) {
                diag.severity = self
                    .config
                    .effective_severity(&diag.rule_id, diag.severity);

                if diag.severity == Severity::Error {
                    error_count += 1;
                }

                result.diagnostics.push(diag);

                if let Some(max) = self.config.max_errors {
                    if error_count >= max {
                        result.truncated = true;
                        result.passed = false;
                        return result;
                    }
                }
            }
        }

        result.passed = error_count == 0;
        result
    }

    #[must_use]
    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                id: r.id().to_string(),
                name: r.name().to_string(),
                description: r.description().to_string(),
                category: r.category(),
                default_severity: r.default_severity(),
                disabled: self.config.is_rule_disabled(r.id()),
            })
            .collect()
    }
}

/// Information about a registered rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    pub default_severity: Severity,
    pub disabled: bool,
}
