//! Flags sensitive variables that carry a literal default.
//!
//! A default on a sensitive variable usually means a secret was committed
//! with the configuration.

use terralint_core::{EvalError, Rule, Runner, Severity, Value};

pub struct SensitiveVariableDefault;

impl Rule for SensitiveVariableDefault {
    fn name(&self) -> &'static str {
        "sensitive_variable_default"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        let decls: Vec<_> = runner
            .config()
            .module
            .variables
            .values()
            .filter(|decl| decl.sensitive)
            .filter_map(|decl| decl.default.clone().map(|d| (decl.name.clone(), d)))
            .collect();

        for (name, default) in decls {
            Runner::ensure_no_error(runner.evaluate_raw(&default), |value| {
                if value.is_null() || value == Value::Unknown {
                    return Ok(());
                }
                runner.emit_issue(
                    self,
                    format!("sensitive variable {name:?} has a default value"),
                    default.range.clone(),
                )
            })?;
        }
        Ok(())
    }
}
