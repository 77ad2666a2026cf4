//! Builtin rules.

pub mod aws_instance_previous_type;
pub mod module_pinned_source;
pub mod naming_convention;
pub mod sensitive_variable_default;

use terralint_core::Rule;

/// All builtin rules, in a stable order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(aws_instance_previous_type::AwsInstancePreviousType),
        Box::new(module_pinned_source::ModulePinnedSource),
        Box::new(naming_convention::NamingConvention),
        Box::new(sensitive_variable_default::SensitiveVariableDefault),
    ]
}
