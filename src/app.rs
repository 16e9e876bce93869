use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::engine::ResolveOptions;
use crate::error::Result;

pub struct AppContext {
    /// Directory searched for the project config
    pub project_root: PathBuf,
    pub config: Config,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;

        // `robot.format = "json"` in config is as good as --robot.
        let output_format = if config.robot.is_json() {
            OutputFormat::Json
        } else {
            cli.output_format()
        };

        Ok(Self {
            project_root,
            config,
            output_format,
            verbosity: cli.verbose,
        })
    }

    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::from(&self.config.resolution)
    }

    #[must_use]
    pub fn is_robot(&self) -> bool {
        self.output_format == OutputFormat::Json
    }
}
