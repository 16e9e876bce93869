//! Structural validation rules for constraint documents.
//!
//! These rules check pattern grammar and how the allow and deny lists
//! relate to each other.

use crate::lint::config::ValidationContext;
use crate::lint::diagnostic::{Diagnostic, RuleCategory, Severity};
use crate::lint::rule::{BoxedRule, ValidationRule};
use crate::policy::CapabilityPattern;

/// Rule that checks every pattern parses.
pub struct ValidPatternSyntaxRule;

impl ValidationRule for ValidPatternSyntaxRule {
    fn id(&self) -> &'static str {
        "valid-pattern-syntax"
    }

    fn name(&self) -> &'static str {
        "Valid Pattern Syntax"
    }

    fn description(&self) -> &'static str {
        "Patterns must be dot-separated tokens with an optional trailing '*'"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structure
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic> {
        let document = ctx.document;
        let lists = [
            ("allowed_tools", &document.allowed_tools),
            ("denied_tools", &document.denied_tools),
        ];

        let mut diagnostics = Vec::new();
        for (field, raw) in lists {
            for entry in raw {
                if let Err(err) = CapabilityPattern::parse(entry) {
                    diagnostics.push(
                        Diagnostic::error(self.id(), format!("{field}: {err}"))
                            .with_span_opt(ctx.span_of(entry))
                            .with_suggestion("use tokens of [A-Za-z0-9_-] with '*' only at the end")
                            .with_category(RuleCategory::Structure),
                    );
                }
            }
        }
        diagnostics
    }
}

/// Rule that flags allowed patterns a denial already covers.
pub struct NoAllowDenyOverlapRule;

impl ValidationRule for NoAllowDenyOverlapRule {
    fn id(&self) -> &'static str {
        "no-allow-deny-overlap"
    }

    fn name(&self) -> &'static str {
        "No Allow/Deny Overlap"
    }

    fn description(&self) -> &'static str {
        "An allowed pattern fully covered by a denied pattern grants nothing"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Policy
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic> {
        // Malformed entries are reported by valid-pattern-syntax.
        let parse = |raw: &[String]| -> Vec<(String, CapabilityPattern)> {
            raw.iter()
                .filter_map(|entry| {
                    CapabilityPattern::parse(entry)
                        .ok()
                        .map(|pattern| (entry.clone(), pattern))
                })
                .collect()
        };
        let allowed = parse(&ctx.document.allowed_tools);
        let denied = parse(&ctx.document.denied_tools);

        let mut diagnostics = Vec::new();
        for (raw_allow, allow) in &allowed {
            if let Some((raw_deny, _)) = denied.iter().find(|(_, deny)| deny.subsumes(allow)) {
                diagnostics.push(
                    Diagnostic::warning(
                        self.id(),
                        format!("allowed pattern '{raw_allow}' is fully denied by '{raw_deny}'"),
                    )
                    .with_span_opt(ctx.span_of(raw_allow))
                    .with_suggestion(format!("remove '{raw_allow}' from allowed_tools"))
                    .with_category(RuleCategory::Policy),
                );
            }
        }
        diagnostics
    }
}

pub fn structural_rules() -> Vec<BoxedRule> {
    vec![
        Box::new(ValidPatternSyntaxRule),
        Box::new(NoAllowDenyOverlapRule),
    ]
}
