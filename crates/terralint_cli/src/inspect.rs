//! The single-directory inspection path, shared by direct invocations and
//! the children of a recursive run.

use std::collections::BTreeMap;
use std::path::Path;

use miette::{miette, IntoDiagnostic, Result, WrapErr};

use terralint_core::{Config, Inspector, Issue, Value};
use terralint_plugin::{BuiltinRuleSet, RuleSetRegistry};

pub fn inspect_dir(dir: &Path, config: Config, vars: &[String]) -> Result<Vec<Issue>> {
    let mut registry = RuleSetRegistry::new();
    registry
        .register(Box::new(BuiltinRuleSet::new(
            "builtin",
            env!("CARGO_PKG_VERSION"),
            terralint_rules::default_rules(),
        )))
        .into_diagnostic()?;
    registry.apply_config(&config).into_diagnostic()?;

    let cli_variables = parse_vars(vars)?;
    let inspector = Inspector::new(config, registry.into_rules());
    inspector
        .inspect(dir, &cli_variables)
        .into_diagnostic()
        .wrap_err_with(|| format!("inspection of {} failed", dir.display()))
}

/// Parses `--var key=value` pairs. Values are taken as strings; rules
/// convert them where a number or bool is expected.
fn parse_vars(vars: &[String]) -> Result<BTreeMap<String, Value>> {
    let mut out = BTreeMap::new();
    for var in vars {
        let (key, value) = var
            .split_once('=')
            .ok_or_else(|| miette!("--var expects key=value, got {var:?}"))?;
        if key.is_empty() {
            return Err(miette!("--var expects key=value, got {var:?}"));
        }
        out.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(out)
}
