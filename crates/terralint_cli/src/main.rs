//! Terralint CLI
//!
//! Static analysis for Terraform-style configuration.

use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use terralint_core::{Config, Issue};

mod cli;
mod inspect;
mod orchestrator;
mod output;

use cli::Cli;

/// Interrupted runs exit with neither the success code nor the generic
/// error code.
const EXIT_CANCELED: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    // --chdir is how recursive mode points a child at its directory.
    let dir = cli.chdir.as_ref().unwrap_or(&cli.dir).clone();

    let config = Config::load(&dir, cli.config.as_deref()).into_diagnostic()?;
    let force = cli.force || config.force;

    let issues = if cli.recursive && !cli.machine {
        match orchestrator::run(&dir, cli) {
            Err(orchestrator::OrchestratorError::Canceled) => {
                eprintln!("Canceled");
                return Ok(ExitCode::from(EXIT_CANCELED));
            }
            other => other.into_diagnostic()?,
        }
    } else {
        inspect::inspect_dir(&dir, config, &cli.var)?
    };

    if cli.machine {
        // Exactly one JSON array on stdout; nothing else may be printed.
        println!("{}", output::render_json(&issues)?);
    } else {
        print!("{}", output::render(&issues, &cli.format)?);
        if cli.format == "json" {
            println!();
        }
    }

    Ok(exit_code(&issues, force))
}

fn exit_code(issues: &[Issue], force: bool) -> ExitCode {
    if issues.is_empty() || force {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
