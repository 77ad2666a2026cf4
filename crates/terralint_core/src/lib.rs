//! Evaluation and orchestration engine for terralint.
//!
//! The core crate turns a loaded module tree into [`Runner`]s, one per
//! module instance, and drives [`Rule`]s over them. It owns the expression
//! evaluator with its unknown/null/sensitive semantics, the liveness checks
//! for `count`/`for_each`, the variable-provenance graph that projects
//! child-module findings onto root-module expressions, and suppression via
//! source comments.

pub mod annotation;
pub mod config;
pub mod error;
pub mod eval;
pub mod functions;
pub mod inspector;
pub mod issue;
pub mod module_runners;
pub mod module_variable;
pub mod rule;
pub mod runner;
pub mod value;

pub use config::{Config, ConfigError, RuleConfig};
pub use error::{CoreError, ErrorKind, ErrorLevel, EvalError};
pub use inspector::{resolve_workspace, Inspector};
pub use issue::{Issue, RuleInfo, Severity};
pub use module_runners::build_runners;
pub use module_variable::{RootPath, VarId, VariableGraph};
pub use rule::Rule;
pub use runner::Runner;
pub use value::{FromValue, Value};
