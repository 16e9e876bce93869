//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::debug;

pub mod batch;
pub mod lint;
pub mod resolve;
pub mod specialist;

use crate::app::AppContext;
use crate::document::{ResolutionRequest, load_request};
use crate::error::Result;
use crate::registry::discover_context;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one agent request into a report
    Resolve(resolve::ResolveArgs),

    /// Resolve many independent requests in parallel
    Batch(batch::BatchArgs),

    /// Lint constraint documents
    Lint(lint::LintArgs),

    /// Look up a specialist from an agent directory
    Specialist(specialist::SpecialistArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Resolve(args) => resolve::run(ctx, args),
        Commands::Batch(args) => batch::run(ctx, args),
        Commands::Lint(args) => lint::run(ctx, args),
        Commands::Specialist(args) => specialist::run(ctx, args),
    }
}

/// Load a request file and fill in its context from the layout on disk.
///
/// A relative `agent_dir` is taken relative to the request file.
pub fn prepare_request(path: &Path) -> Result<ResolutionRequest> {
    let mut request = load_request(path)?;
    if request.context.is_none() {
        if let Some(agent_dir) = &request.agent_dir {
            let agent_dir = resolve_relative(path, agent_dir);
            debug!(path = %agent_dir.display(), "discovering resolution context");
            request.context = Some(discover_context(&agent_dir)?);
        }
    }
    Ok(request)
}

fn resolve_relative(request_path: &Path, dir: &str) -> PathBuf {
    let dir = Path::new(dir);
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    request_path
        .parent()
        .map_or_else(|| dir.to_path_buf(), |parent| parent.join(dir))
}
