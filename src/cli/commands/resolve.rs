//! powerforge resolve - Resolve one agent request
//!
//! Loads a YAML/JSON request, discovers the specialist context from
//! `agent_dir` when none is given, runs the engine and prints the report.

use std::path::PathBuf;

use clap::Args;
use console::style;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, join_or_none, robot_ok};
use crate::engine::{Resolution, resolve};
use crate::error::Result;
use crate::lint::Severity;

use super::prepare_request;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Request file (YAML or JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print only the resolution report
    #[arg(long)]
    pub report_only: bool,
}

pub fn run(ctx: &AppContext, args: &ResolveArgs) -> Result<()> {
    let request = prepare_request(&args.file)?;
    let resolution = resolve(&request, &ctx.resolve_options())?;

    if ctx.is_robot() {
        let warnings = resolution.findings.iter().map(ToString::to_string).collect();
        if args.report_only {
            emit_json(&robot_ok(&resolution.report).with_warnings(warnings))
        } else {
            emit_json(&robot_ok(&resolution).with_warnings(warnings))
        }
    } else {
        emit_human(render_resolution(&resolution, args.report_only));
        Ok(())
    }
}

/// Human layout for one resolution.
pub fn render_resolution(resolution: &Resolution, report_only: bool) -> HumanLayout {
    let report = &resolution.report;
    let mut layout = HumanLayout::new();
    layout.title(&format!("Resolution: {}", resolution.agent));

    layout.section("Constraints");
    layout.kv("Allowed", &join_or_none(&report.final_allowed_tools));
    layout.kv("Denied", &join_or_none(&report.final_denied_tools));
    let network = &report.network_access;
    layout.kv(
        "Network",
        &format!(
            "{} ({})",
            if network.final_resolution { "allowed" } else { "denied" },
            network.resolution_reason
        ),
    );
    if report.opt_out.requested {
        layout.kv(
            "Opt-out",
            report.opt_out.justification.as_deref().unwrap_or("requested"),
        );
    }
    layout.blank();

    if let Some(delegation) = &report.delegation {
        layout.section("Delegation");
        layout.kv("Mode", &delegation.mode.to_string());
        layout.kv("Allowed", &join_or_none(&delegation.effective_allowed_tools));
        layout.kv("Denied", &join_or_none(&delegation.effective_denied_tools));
        for elevation in &delegation.elevations {
            layout.bullet(&format!(
                "elevated {} [{:?}]: {}",
                elevation.pattern, elevation.audit_level, elevation.justification
            ));
        }
        layout.blank();
    }

    if !report.collisions.is_empty() {
        layout.section("Collisions");
        let groups = [
            ("tool", &report.collisions.tool_collisions),
            ("server", &report.collisions.server_collisions),
            ("steering", &report.collisions.steering_collisions),
        ];
        for (kind, records) in groups {
            for record in records {
                layout.bullet(&format!(
                    "{kind} {}: {:?} -> {}",
                    record.name, record.resolution, record.final_state
                ));
            }
        }
        layout.blank();
    }

    if report_only {
        return layout;
    }

    if !resolution.specialists.is_empty() {
        layout.section("Specialists");
        for specialist in &resolution.specialists {
            layout.bullet(&format!(
                "{} -> {} ({})",
                specialist.token, specialist.module, specialist.path
            ));
        }
        layout.blank();
    }

    if !resolution.findings.is_empty() {
        layout.section("Findings");
        for finding in &resolution.findings {
            let label = match finding.severity {
                Severity::Error => style("error").red().bold(),
                Severity::Warning => style("warning").yellow(),
                Severity::Info => style("info").blue(),
            };
            layout.push_line(format!(
                "  {label} {} {}",
                style(&finding.rule_id).dim(),
                finding.message
            ));
        }
    }

    layout
}
