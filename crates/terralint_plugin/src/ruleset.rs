use terralint_core::{Config, EvalError, Rule};
use tracing::debug;

use crate::error::PluginError;
use crate::server::Server;

/// A named, versioned group of rules.
pub trait RuleSet: Send {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Names of every rule this set provides, whether or not enabled.
    fn rule_names(&self) -> Vec<&'static str>;

    /// Called once with the resolved configuration before inspection. The
    /// default accepts anything; rulesets with their own settings validate
    /// them here.
    fn apply_config(&mut self, _config: &Config) -> Result<(), PluginError> {
        Ok(())
    }

    /// Runs every rule in the set against one module instance, through the
    /// engine handle.
    fn check(&self, server: &mut dyn Server) -> Result<(), EvalError>;

    /// Hands the rules over to the engine for in-process dispatch.
    fn into_rules(self: Box<Self>) -> Vec<Box<dyn Rule>>;
}

/// The in-process ruleset wrapping statically linked rules.
pub struct BuiltinRuleSet {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

impl BuiltinRuleSet {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        rules: Vec<Box<dyn Rule>>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            rules,
        }
    }
}

impl RuleSet for BuiltinRuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    fn apply_config(&mut self, config: &Config) -> Result<(), PluginError> {
        for rule in &self.rules {
            if config.rule_enabled(rule.name()) == Some(false) {
                debug!("rule `{}` disabled by config", rule.name());
            }
        }
        Ok(())
    }

    fn check(&self, server: &mut dyn Server) -> Result<(), EvalError> {
        for rule in &self.rules {
            server.run_rule(rule.as_ref())?;
        }
        Ok(())
    }

    fn into_rules(self: Box<Self>) -> Vec<Box<dyn Rule>> {
        self.rules
    }
}
