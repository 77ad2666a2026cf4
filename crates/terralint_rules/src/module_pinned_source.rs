//! Requires remote module sources to pin a version.

use terralint_core::{EvalError, Rule, Runner, Severity};

pub struct ModulePinnedSource;

impl Rule for ModulePinnedSource {
    fn name(&self) -> &'static str {
        "module_pinned_source"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        // Local sources are versioned with the surrounding repository.
        let calls: Vec<_> = runner
            .config()
            .module
            .module_calls
            .values()
            .filter(|call| !call.source.starts_with("./") && !call.source.starts_with("../"))
            .filter(|call| call.block.attribute("version").is_none())
            .map(|call| (call.source.clone(), call.source_range.clone()))
            .collect();

        for (source, range) in calls {
            runner.emit_issue(
                self,
                format!("module source {source:?} is not pinned to a version"),
                range,
            )?;
        }
        Ok(())
    }
}
