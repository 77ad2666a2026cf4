use terralint_core::{Config, Rule};
use tracing::info;

use crate::error::PluginError;
use crate::ruleset::RuleSet;

/// Aggregates rulesets and guards the rule namespace.
#[derive(Default)]
pub struct RuleSetRegistry {
    rulesets: Vec<Box<dyn RuleSet>>,
}

impl RuleSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a ruleset, rejecting rule names already claimed by an
    /// earlier one.
    pub fn register(&mut self, ruleset: Box<dyn RuleSet>) -> Result<(), PluginError> {
        for name in ruleset.rule_names() {
            if let Some(owner) = self.owner_of(name) {
                return Err(PluginError::DuplicateRuleName {
                    name: name.to_string(),
                    first: owner,
                    second: ruleset.name().to_string(),
                });
            }
        }
        info!(
            "registered ruleset {} {} ({} rules)",
            ruleset.name(),
            ruleset.version(),
            ruleset.rule_names().len()
        );
        self.rulesets.push(ruleset);
        Ok(())
    }

    fn owner_of(&self, rule_name: &str) -> Option<String> {
        self.rulesets
            .iter()
            .find(|rs| rs.rule_names().contains(&rule_name))
            .map(|rs| rs.name().to_string())
    }

    /// Applies the configuration to every ruleset and rejects config
    /// entries that name a rule nobody provides.
    pub fn apply_config(&mut self, config: &Config) -> Result<(), PluginError> {
        for name in config.rules.keys() {
            if self.owner_of(name).is_none() {
                return Err(PluginError::UnknownRule { name: name.clone() });
            }
        }
        for ruleset in &mut self.rulesets {
            ruleset.apply_config(config)?;
        }
        Ok(())
    }

    /// Flattens every registered ruleset into the rule list the inspector
    /// runs.
    pub fn into_rules(self) -> Vec<Box<dyn Rule>> {
        self.rulesets
            .into_iter()
            .flat_map(RuleSet::into_rules)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::BuiltinRuleSet;
    use terralint_core::{EvalError, Runner, Severity};

    struct NoopRule(&'static str);

    impl Rule for NoopRule {
        fn name(&self) -> &'static str {
            self.0
        }

        fn severity(&self) -> Severity {
            Severity::Notice
        }

        fn check(&self, _runner: &mut Runner) -> Result<(), EvalError> {
            Ok(())
        }
    }

    fn ruleset(name: &str, rules: &[&'static str]) -> Box<BuiltinRuleSet> {
        Box::new(BuiltinRuleSet::new(
            name,
            "0.1.0",
            rules
                .iter()
                .map(|r| Box::new(NoopRule(r)) as Box<dyn Rule>)
                .collect(),
        ))
    }

    #[test]
    fn test_register_and_flatten() {
        let mut registry = RuleSetRegistry::new();
        registry.register(ruleset("one", &["a", "b"])).unwrap();
        registry.register(ruleset("two", &["c"])).unwrap();
        assert_eq!(registry.into_rules().len(), 3);
    }

    #[test]
    fn test_duplicate_rule_name_is_rejected() {
        let mut registry = RuleSetRegistry::new();
        registry.register(ruleset("one", &["a"])).unwrap();
        let err = registry.register(ruleset("two", &["a"])).unwrap_err();
        assert!(matches!(err, PluginError::DuplicateRuleName { .. }));
    }

    #[test]
    fn test_config_naming_unknown_rule_is_rejected() {
        let mut registry = RuleSetRegistry::new();
        registry.register(ruleset("one", &["a"])).unwrap();

        let mut config = Config::default();
        config
            .rules
            .insert("nope".to_string(), terralint_core::RuleConfig { enabled: true });
        let err = registry.apply_config(&config).unwrap_err();
        assert!(matches!(err, PluginError::UnknownRule { .. }));
    }
}
