//! The rule interface.

use crate::error::EvalError;
use crate::issue::Severity;
use crate::runner::Runner;

/// A single check over one module instance.
///
/// Rules are stateless: `check` is called once per runner, walks the
/// configuration through the runner's accessors, and reports findings with
/// [`Runner::emit_issue`]. A returned error aborts the whole inspection.
pub trait Rule: Send + Sync {
    /// Stable identifier, used in config and suppression comments.
    fn name(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// Documentation link included in issue output. Empty when there is none.
    fn link(&self) -> &'static str {
        ""
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError>;
}
