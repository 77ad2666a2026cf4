//! External-ruleset boundary.
//!
//! Rules reach the engine in named, versioned groups. A [`RuleSet`] owns a
//! set of [`Rule`] implementations, gets the resolved [`Config`] applied to
//! it before inspection, and hands its rules over to the registry. The
//! [`RuleSetRegistry`] guards the global rule namespace: duplicate rule
//! names across rulesets and config entries that name no known rule are
//! rejected before any file is loaded.
//!
//! Rule code talks to the engine through the [`Server`] handle, implemented
//! by [`terralint_core::Runner`]. Statically linked sets shortcut the
//! boundary with [`RuleSet::into_rules`]; a wire transport would drive
//! [`RuleSet::check`] instead.
//!
//! [`Rule`]: terralint_core::Rule
//! [`Config`]: terralint_core::Config

mod error;
mod registry;
mod ruleset;
mod server;

pub use error::PluginError;
pub use registry::RuleSetRegistry;
pub use ruleset::{BuiltinRuleSet, RuleSet};
pub use server::Server;
