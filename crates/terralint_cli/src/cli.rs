use std::path::PathBuf;

use clap::Parser;

/// Terralint - static analysis for Terraform-style configuration
#[derive(Debug, Parser)]
#[command(name = "terralint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Working directory to inspect
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Inspect every Terraform working directory below DIR
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum number of concurrent child processes in recursive mode
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Exit successfully even when issues were found
    #[arg(long)]
    pub force: bool,

    /// Set a root-module input variable (may be repeated)
    #[arg(long, value_name = "KEY=VALUE")]
    pub var: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Change to this directory before inspecting. Used by recursive mode
    /// to re-invoke the binary per working directory.
    #[arg(long, hide = true)]
    pub chdir: Option<PathBuf>,

    /// Emit exactly one JSON issue array on stdout, for the parent process.
    #[arg(long, hide = true)]
    pub machine: bool,
}

impl Cli {
    /// Flags a recursive parent forwards to its children.
    pub fn child_args(&self, dir: &std::path::Path) -> Vec<String> {
        let mut args = vec![
            "--machine".to_string(),
            "--chdir".to_string(),
            dir.display().to_string(),
        ];
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.display().to_string());
        }
        for var in &self.var {
            args.push("--var".to_string());
            args.push(var.clone());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }
}
