//! powerforge batch - Resolve independent requests in parallel
//!
//! Each file is loaded and resolved on its own; one bad file never hides
//! the results of the others. Outcomes are printed in argument order.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, robot_partial};
use crate::document::ResolutionRequest;
use crate::engine::{Resolution, resolve_batch};
use crate::error::{ForgeError, Result};

use super::prepare_request;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Request files (YAML or JSON)
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Worker threads (0 = rayon default; overrides batch.threads)
    #[arg(long)]
    pub threads: Option<u32>,
}

#[derive(Serialize)]
struct BatchEntry {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &BatchArgs) -> Result<()> {
    // Load failures stay attached to their slot so output order matches input.
    let mut loaded: Vec<std::result::Result<ResolutionRequest, String>> = args
        .files
        .iter()
        .map(|path| prepare_request(path).map_err(|err| err.to_string()))
        .collect();

    let requests: Vec<ResolutionRequest> = loaded
        .iter_mut()
        .filter_map(|slot| slot.as_mut().ok().map(std::mem::take))
        .collect();

    let threads = args.threads.unwrap_or(ctx.config.batch.threads);
    let options = ctx.resolve_options();
    let mut outcomes = if threads == 0 {
        resolve_batch(&requests, &options)
    } else {
        debug!(threads, "using dedicated batch pool");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .build()
            .map_err(|err| ForgeError::Config(format!("batch thread pool: {err}")))?;
        pool.install(|| resolve_batch(&requests, &options))
    }
    .into_iter();

    let mut entries = Vec::with_capacity(args.files.len());
    for (path, slot) in args.files.iter().zip(loaded) {
        let path = path.display().to_string();
        let entry = match slot {
            Err(message) => BatchEntry {
                path,
                ok: false,
                resolution: None,
                errors: vec![message],
            },
            Ok(_) => match outcomes.next() {
                Some(Ok(resolution)) => BatchEntry {
                    path,
                    ok: true,
                    resolution: Some(resolution),
                    errors: Vec::new(),
                },
                Some(Err(errors)) => BatchEntry {
                    path,
                    ok: false,
                    resolution: None,
                    errors: errors.errors().iter().map(ToString::to_string).collect(),
                },
                None => BatchEntry {
                    path,
                    ok: false,
                    resolution: None,
                    errors: vec!["request was not resolved".to_string()],
                },
            },
        };
        if !entry.ok {
            warn!(path = %entry.path, errors = entry.errors.len(), "batch member failed");
        }
        entries.push(entry);
    }

    let failed = entries.iter().filter(|e| !e.ok).count();
    let completed = entries.len() - failed;

    if ctx.is_robot() {
        if failed == 0 {
            emit_json(&robot_ok(&entries))?;
        } else {
            emit_json(&robot_partial(completed, failed, &entries))?;
        }
    } else {
        emit_human(render_batch(&entries, completed, failed));
    }

    if failed > 0 {
        return Err(ForgeError::ValidationFailed(format!(
            "{failed} of {} request(s) failed",
            entries.len()
        )));
    }
    Ok(())
}

fn render_batch(entries: &[BatchEntry], completed: usize, failed: usize) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title("Batch Resolution");

    for entry in entries {
        match &entry.resolution {
            Some(resolution) => {
                layout.push_line(format!(
                    "{} {} {}",
                    style("✓").green(),
                    style(&entry.path).bold(),
                    style(format!(
                        "({} allowed, {} finding(s))",
                        resolution.report.final_allowed_tools.len(),
                        resolution.findings.len()
                    ))
                    .dim()
                ));
            }
            None => {
                layout.push_line(format!("{} {}", style("✗").red(), style(&entry.path).bold()));
                for error in &entry.errors {
                    layout.push_line(format!("    {error}"));
                }
            }
        }
    }

    layout.blank();
    layout.section("Summary");
    layout.kv("Resolved", &completed.to_string());
    layout.kv("Failed", &failed.to_string());
    layout
}
