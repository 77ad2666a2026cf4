//! Single-directory inspection.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use terralint_loader::{load_config, LoaderOptions};

use crate::config::Config;
use crate::error::CoreError;
use crate::issue::Issue;
use crate::module_runners::build_runners;
use crate::rule::Rule;
use crate::runner::Runner;
use crate::value::Value;

/// Runs a set of rules against one working directory.
pub struct Inspector {
    config: Config,
    rules: Vec<Box<dyn Rule>>,
}

impl Inspector {
    pub fn new(config: Config, rules: Vec<Box<dyn Rule>>) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the configuration rooted at `dir`, builds the runner tree and
    /// checks every enabled rule against every runner. Issues come back
    /// suppression-filtered and sorted.
    pub fn inspect(
        &self,
        dir: &Path,
        cli_variables: &BTreeMap<String, Value>,
    ) -> Result<Vec<Issue>, CoreError> {
        let load = load_config(
            dir,
            &LoaderOptions {
                inspect_modules: self.config.module,
            },
        )?;
        let workspace = resolve_workspace(dir);
        info!(
            "inspecting {} (workspace {workspace:?})",
            dir.display()
        );

        let mut runners = build_runners(&load, &self.config, &workspace, cli_variables)?;
        for rule in &self.rules {
            if self.config.rule_enabled(rule.name()) == Some(false) {
                debug!("rule `{}` disabled by config; skipping", rule.name());
                continue;
            }
            for runner in runners.iter_mut() {
                rule.check(runner)?;
            }
        }

        let mut issues: Vec<Issue> = runners.into_iter().flat_map(Runner::into_issues).collect();
        Issue::sort(&mut issues);
        Ok(issues)
    }
}

/// The Terraform workspace the configuration would be evaluated in:
/// `TF_WORKSPACE` when set, otherwise the `environment` file under the data
/// directory, otherwise `default`.
pub fn resolve_workspace(dir: &Path) -> String {
    if let Ok(workspace) = std::env::var("TF_WORKSPACE") {
        if !workspace.is_empty() {
            return workspace;
        }
    }

    let data_dir = std::env::var("TF_DATA_DIR").unwrap_or_else(|_| ".terraform".to_string());
    match std::fs::read_to_string(dir.join(data_dir).join("environment")) {
        Ok(contents) if !contents.trim().is_empty() => contents.trim().to_string(),
        _ => "default".to_string(),
    }
}
