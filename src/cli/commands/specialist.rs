//! powerforge specialist - Resolve a specialist token from an agent directory

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::{ForgeError, Result};
use crate::registry::{ResolutionContext, ResolvedSpecialist, discover_context, resolve_specialist};

#[derive(Args, Debug)]
pub struct SpecialistArgs {
    /// Directory of the delegating agent
    #[arg(value_name = "AGENT_DIR")]
    pub agent_dir: PathBuf,

    /// Specialist token as written in the delegation allow-list
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Minimum similarity for "did you mean" suggestions (overrides config)
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Serialize)]
struct SpecialistOutput<'a> {
    context: &'a ResolutionContext,
    resolved: ResolvedSpecialist,
}

pub fn run(ctx: &AppContext, args: &SpecialistArgs) -> Result<()> {
    let context = discover_context(&args.agent_dir)?;
    let threshold = args
        .threshold
        .unwrap_or(ctx.config.resolution.suggestion_threshold);
    let resolved = resolve_specialist(&args.token, &context, threshold)
        .map_err(|err| ForgeError::Policy(err.into()))?;

    if ctx.is_robot() {
        emit_json(&robot_ok(SpecialistOutput {
            context: &context,
            resolved,
        }))
    } else {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Specialist: {}", resolved.token));
        layout.kv("Context", &context.describe());
        layout.kv("Module", &resolved.module);
        layout.kv("Path", &resolved.path);
        if let Some(role) = &resolved.role {
            layout.kv("Role", role);
        }
        emit_human(layout);
        Ok(())
    }
}
