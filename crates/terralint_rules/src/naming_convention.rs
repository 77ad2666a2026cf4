//! Enforces snake_case names for resources, data sources and variables.

use std::sync::LazyLock;

use regex::Regex;
use terralint_core::{EvalError, Rule, Runner, Severity};

static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z][a-z0-9_]*$").expect("valid pattern"));

pub struct NamingConvention;

impl Rule for NamingConvention {
    fn name(&self) -> &'static str {
        "naming_convention"
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        let module = &runner.config().module;
        let mut findings = Vec::new();

        for block in module.resources.iter().chain(&module.data_sources) {
            // Label 0 is the type, label 1 the user-chosen name.
            if let Some(name) = block.labels.get(1) {
                if !is_snake_case(name) {
                    findings.push((name.clone(), block.def_range.clone()));
                }
            }
        }
        for decl in module.variables.values() {
            if !is_snake_case(&decl.name) {
                findings.push((decl.name.clone(), decl.decl_range.clone()));
            }
        }

        for (name, range) in findings {
            runner.emit_issue(self, format!("{name:?} is not snake_case"), range)?;
        }
        Ok(())
    }
}

fn is_snake_case(name: &str) -> bool {
    SNAKE_CASE.is_match(name)
}
