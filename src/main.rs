//! powerforge - policy and composition resolution
//!
//! Resolve agent, collection and delegation constraints into an auditable
//! report.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use powerforge::Result;
use powerforge::app::AppContext;
use powerforge::cli::Cli;
use powerforge::cli::output::{emit_json, robot_error};
use powerforge::config::robot_requested_by_env;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let robot = cli.robot || robot_requested_by_env();
    init_tracing(&cli, robot);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if robot {
                let (code, data) = match &e {
                    powerforge::ForgeError::Policy(errors) => (
                        "policy_errors",
                        serde_json::to_value(errors).unwrap_or_default(),
                    ),
                    powerforge::ForgeError::ValidationFailed(_) => {
                        ("validation_failed", serde_json::Value::Null)
                    }
                    _ => ("error", serde_json::Value::Null),
                };
                if emit_json(&robot_error(code, e.to_string(), data)).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    powerforge::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli, robot: bool) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,powerforge=info",
        1 => "info,powerforge=debug",
        2 => "debug,powerforge=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
