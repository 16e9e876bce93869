//! powerforge lint - Lint constraint documents for policy issues
//!
//! Accepts either a full resolution request (every constraint block in it is
//! linted) or a bare constraint document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::document::{ConstraintDocument, parse_request};
use crate::error::{ForgeError, Result};
use crate::lint::diagnostic::{RuleCategory, Severity};
use crate::lint::rules::all_rules;
use crate::lint::{ValidationConfig, ValidationContext, ValidationEngine, ValidationResult};
use crate::policy::DelegationSecurityDoc;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Request or constraint document to lint
    #[arg(value_name = "FILE", required_unless_present = "list_rules")]
    pub file: Option<PathBuf>,

    /// Only run specific rules (comma-separated IDs)
    #[arg(long, value_delimiter = ',')]
    pub rules: Option<Vec<String>>,

    /// Skip specific rules (comma-separated IDs)
    #[arg(long, value_delimiter = ',')]
    pub skip: Option<Vec<String>>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Stop after N errors
    #[arg(long)]
    pub max_errors: Option<usize>,

    /// List all available rules
    #[arg(long)]
    pub list_rules: bool,
}

/// One constraint block found in the file.
struct LintTarget {
    label: String,
    document: ConstraintDocument,
    delegation: Option<DelegationSecurityDoc>,
}

#[derive(Serialize)]
struct LintTargetResult {
    label: String,
    #[serde(flatten)]
    result: ValidationResult,
}

#[derive(Serialize)]
struct LintReport {
    path: String,
    targets: Vec<LintTargetResult>,
    error_count: usize,
    warning_count: usize,
    passed: bool,
}

pub fn run(ctx: &AppContext, args: &LintArgs) -> Result<()> {
    if args.list_rules {
        return list_rules(ctx);
    }
    let Some(path) = &args.file else {
        return Err(ForgeError::Config("no file to lint".into()));
    };

    let engine = build_engine(ctx, args);
    let source = std::fs::read_to_string(path)?;
    let targets = load_targets(path, &source)?;

    let mut results = Vec::with_capacity(targets.len());
    for target in &targets {
        let mut validation = ValidationContext::new(&target.document, engine.config())
            .with_source(&source)
            .with_file_path(path);
        if let Some(delegation) = &target.delegation {
            validation = validation.with_delegation(delegation);
        }
        results.push(LintTargetResult {
            label: target.label.clone(),
            result: engine.validate_with_context(&validation),
        });
    }

    let report = LintReport {
        path: path.display().to_string(),
        error_count: results.iter().map(|r| r.result.error_count()).sum(),
        warning_count: results.iter().map(|r| r.result.warning_count()).sum(),
        passed: results.iter().all(|r| r.result.passed),
        targets: results,
    };

    if ctx.is_robot() {
        emit_json(&robot_ok(&report))?;
    } else {
        emit_human(render_report(&report));
    }

    if report.error_count > 0 {
        Err(ForgeError::ValidationFailed(format!(
            "{} error(s) found",
            report.error_count
        )))
    } else {
        Ok(())
    }
}

fn build_engine(ctx: &AppContext, args: &LintArgs) -> ValidationEngine {
    let mut config = ValidationConfig::from(&ctx.config.lint);
    if args.strict {
        config = config.strict();
    }
    if let Some(max) = args.max_errors {
        config = config.with_max_errors(max);
    }
    for rule_id in args.skip.iter().flatten() {
        config = config.disable_rule(rule_id);
    }

    let only: Option<HashSet<&str>> = args
        .rules
        .as_ref()
        .map(|ids| ids.iter().map(String::as_str).collect());

    let mut engine = ValidationEngine::new(config);
    for rule in all_rules() {
        if only.as_ref().is_some_and(|only| !only.contains(rule.id())) {
            continue;
        }
        engine.register(rule);
    }
    engine
}

fn load_targets(path: &Path, source: &str) -> Result<Vec<LintTarget>> {
    let invalid = |message: String| ForgeError::InvalidDocument {
        path: path.display().to_string(),
        message,
    };

    let request = match parse_request(source) {
        Ok(request) => request,
        Err(_) => {
            let document: ConstraintDocument =
                serde_yaml::from_str(source).map_err(|err| invalid(err.to_string()))?;
            return Ok(vec![LintTarget {
                label: label_for("document", &document),
                document,
                delegation: None,
            }]);
        }
    };

    let mut targets = vec![LintTarget {
        label: label_for("agent", &request.agent),
        document: request.agent,
        delegation: None,
    }];
    if let Some(collection) = request.collection {
        targets.push(LintTarget {
            label: label_for("collection", &collection),
            document: collection,
            delegation: None,
        });
    }
    if let Some(delegation) = request.delegation {
        targets.push(LintTarget {
            label: label_for("subagent", &delegation.subagent),
            document: delegation.subagent,
            delegation: Some(delegation.security),
        });
    }
    Ok(targets)
}

fn label_for(kind: &str, document: &ConstraintDocument) -> String {
    if document.name.is_empty() {
        kind.to_string()
    } else {
        format!("{kind} '{}'", document.name)
    }
}

fn render_report(report: &LintReport) -> HumanLayout {
    let mut layout = HumanLayout::new();

    for target in &report.targets {
        let heading = format!("{} {}", report.path, target.label);
        if target.result.diagnostics.is_empty() {
            layout.push_line(format!("{} {}", style("✓").green(), style(&heading).dim()));
            continue;
        }

        layout.push_line(format!("{} {}", style("✗").red(), style(&heading).bold()));
        for diag in &target.result.diagnostics {
            let severity = match diag.severity {
                Severity::Error => style("error").red().bold(),
                Severity::Warning => style("warning").yellow(),
                Severity::Info => style("info").blue(),
            };
            let location = diag
                .span
                .as_ref()
                .map(|s| format!("{}:{}", s.start_line, s.start_col))
                .unwrap_or_default();

            layout.push_line(format!(
                "  {severity} {} {} {}",
                style(&diag.rule_id).dim(),
                diag.message,
                style(&location).dim()
            ));
            if let Some(suggestion) = &diag.suggestion {
                layout.push_line(format!("    {} {suggestion}", style("hint:").cyan()));
            }
        }
        if target.result.truncated {
            layout.push_line(format!("  {}", style("(stopped at max errors)").dim()));
        }
        layout.blank();
    }

    layout.section("Summary");
    layout.kv("Targets", &report.targets.len().to_string());
    layout.kv("Errors", &report.error_count.to_string());
    layout.kv("Warnings", &report.warning_count.to_string());
    layout
}

fn list_rules(ctx: &AppContext) -> Result<()> {
    let engine = ValidationEngine::builtin(ValidationConfig::from(&ctx.config.lint));
    let rules = engine.list_rules();

    if ctx.is_robot() {
        return emit_json(&robot_ok(&rules));
    }

    let mut layout = HumanLayout::new();
    layout.title("Available Lint Rules");

    let categories = [
        (RuleCategory::Structure, "Structure"),
        (RuleCategory::Policy, "Policy"),
        (RuleCategory::Security, "Security"),
        (RuleCategory::Audit, "Audit"),
    ];
    for (category, name) in categories {
        let in_category: Vec<_> = rules.iter().filter(|r| r.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        layout.section(name);
        for rule in in_category {
            let disabled = if rule.disabled { " [disabled]" } else { "" };
            layout.bullet(&format!(
                "{} - {} ({}){disabled}",
                rule.id, rule.name, rule.default_severity
            ));
        }
        layout.blank();
    }

    emit_human(layout);
    Ok(())
}
