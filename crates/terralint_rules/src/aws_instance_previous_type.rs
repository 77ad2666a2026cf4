//! Flags previous-generation EC2 instance types.
//!
//! This is the evaluation-heavy rule of the builtin set: the instance type
//! may be written literally, derived from a variable, or fed into a child
//! module, and findings follow the value back to where it was written.

use terralint_core::{EvalError, Rule, Runner, Severity};

const PREVIOUS_TYPES: &[&str] = &[
    "t1.micro",
    "m1.small",
    "m1.medium",
    "m1.large",
    "m1.xlarge",
    "c1.medium",
    "c1.xlarge",
    "cc2.8xlarge",
    "m2.xlarge",
    "m2.2xlarge",
    "m2.4xlarge",
    "cr1.8xlarge",
    "hi1.4xlarge",
    "hs1.8xlarge",
];

pub struct AwsInstancePreviousType;

impl Rule for AwsInstancePreviousType {
    fn name(&self) -> &'static str {
        "aws_instance_previous_type"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        runner.walk_resource_blocks("aws_instance", &mut |runner, resource| {
            let Some(attr) = resource.attribute("instance_type") else {
                return Ok(());
            };
            let expr = attr.expr.clone();
            runner.with_expression_context(expr.clone(), |runner| {
                Runner::ensure_no_error(runner.evaluate_expr::<String>(&expr), |instance_type| {
                    if PREVIOUS_TYPES.contains(&instance_type.as_str()) {
                        runner.emit_issue(
                            self,
                            format!("{instance_type:?} is a previous generation instance type"),
                            expr.range.clone(),
                        )?;
                    }
                    Ok(())
                })
            })
        })
    }
}
