//! End-to-end inspection over on-disk fixtures: runner construction,
//! child-module provenance, liveness gating and suppression together.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use terralint_core::{
    build_runners, Config, EvalError, Inspector, Issue, Rule, Runner, Severity, Value,
};
use terralint_loader::{load_config, LoaderOptions};

/// Flags any `instance_type` attribute whose value evaluates to
/// `"t2.micro"`, wherever the value was written.
struct DeprecatedInstanceType;

impl Rule for DeprecatedInstanceType {
    fn name(&self) -> &'static str {
        "deprecated_instance_type"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        runner.walk_resource_blocks("aws_instance", &mut |runner, resource| {
            let Some(attr) = resource.attribute("instance_type") else {
                return Ok(());
            };
            let expr = attr.expr.clone();
            runner.with_expression_context(expr.clone(), |runner| {
                Runner::ensure_no_error(runner.evaluate_expr::<String>(&expr), |value| {
                    if value == "t2.micro" {
                        runner.emit_issue(
                            &DeprecatedInstanceType,
                            "t2.micro is deprecated",
                            expr.range.clone(),
                        )?;
                    }
                    Ok(())
                })
            })
        })
    }
}

fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

fn inspect(files: &[(&str, &str)]) -> Vec<Issue> {
    inspect_with_config(files, Config::default())
}

fn inspect_with_config(files: &[(&str, &str)], config: Config) -> Vec<Issue> {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), files);
    let inspector = Inspector::new(config, vec![Box::new(DeprecatedInstanceType)]);
    inspector.inspect(dir.path(), &BTreeMap::new()).unwrap()
}

/// Flags any expression that evaluates to the string `"forbidden"`.
struct ForbiddenValue;

impl Rule for ForbiddenValue {
    fn name(&self) -> &'static str {
        "forbidden_value"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, runner: &mut Runner) -> Result<(), EvalError> {
        runner.walk_expressions(&mut |runner, expr| {
            Runner::ensure_no_error(runner.evaluate_raw(expr), |value| {
                if value == Value::String("forbidden".into()) {
                    runner.emit_issue(&ForbiddenValue, "forbidden value", expr.range.clone())?;
                }
                Ok(())
            })
        })
    }
}

#[test]
fn test_walk_visits_all_block_kinds_but_skips_dead_ones() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[(
            "main.tf",
            r#"
resource "null_resource" "live" {
  value = "forbidden"
}

resource "null_resource" "dead" {
  count = 0
  value = "forbidden"
}

provider "null" {
  alias = "forbidden"
}

locals {
  bad = "forbidden"
}

output "bad" {
  value = "forbidden"
}
"#,
        )],
    );

    let load = load_config(dir.path(), &LoaderOptions::default()).unwrap();
    let mut runners = build_runners(
        &load,
        &Config::default(),
        "default",
        &std::collections::BTreeMap::new(),
    )
    .unwrap();
    let runner = &mut runners[0];
    ForbiddenValue.check(runner).unwrap();

    // Live resource, provider, local and output; the count = 0 resource is
    // skipped.
    assert_eq!(runner.issues().len(), 4);
    assert_eq!(runner.lookup_issues("main.tf").len(), 4);
    assert!(runner.lookup_issues("other.tf").is_empty());
}

#[test]
fn test_direct_issue_in_root_module() {
    let issues = inspect(&[(
        "main.tf",
        r#"
resource "aws_instance" "web" {
  instance_type = "t2.micro"
}
"#,
    )]);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].rule.name, "deprecated_instance_type");
    assert_eq!(issues[0].range.filename, "main.tf");
    assert_eq!(issues[0].range.start.line, 3);
    assert!(issues[0].callers.is_empty());
}

#[test]
fn test_dead_resource_is_not_inspected() {
    let issues = inspect(&[(
        "main.tf",
        r#"
resource "aws_instance" "web" {
  count         = 0
  instance_type = "t2.micro"
}
"#,
    )]);
    assert!(issues.is_empty());
}

#[test]
fn test_unknown_count_is_not_inspected() {
    let issues = inspect(&[(
        "main.tf",
        r#"
variable "n" {}

resource "aws_instance" "web" {
  count         = var.n
  instance_type = "t2.micro"
}
"#,
    )]);
    assert!(issues.is_empty());
}

#[test]
fn test_issue_in_child_module_is_reported_at_call_site() {
    let issues = inspect(&[
        (
            "main.tf",
            r#"
module "app" {
  source        = "./app"
  instance_type = "t2.micro"
}
"#,
        ),
        (
            "app/main.tf",
            r#"
variable "instance_type" {}

resource "aws_instance" "web" {
  instance_type = var.instance_type
}
"#,
        ),
    ]);
    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    // Reported against the binding in the root module, not inside app/.
    assert_eq!(issue.range.filename, "main.tf");
    assert_eq!(issue.range.start.line, 4);
    // Caller chain ends at the expression inside the child that triggered it.
    assert_eq!(issue.callers.last().unwrap().filename, "app/main.tf");
}

#[test]
fn test_fan_out_to_two_call_sites() {
    let issues = inspect(&[
        (
            "main.tf",
            r#"
module "first" {
  source        = "./app"
  instance_type = "t2.micro"
}

module "second" {
  source        = "./app"
  instance_type = "t2.micro"
}
"#,
        ),
        (
            "app/main.tf",
            r#"
variable "instance_type" {}

resource "aws_instance" "web" {
  instance_type = var.instance_type
}
"#,
        ),
    ]);
    assert_eq!(issues.len(), 2);
    let lines: Vec<_> = issues.iter().map(|i| i.range.start.line).collect();
    assert_eq!(lines, vec![4, 9]);
}

#[test]
fn test_nested_module_chain_in_callers() {
    let issues = inspect(&[
        (
            "main.tf",
            r#"
module "outer" {
  source        = "./outer"
  instance_type = "t2.micro"
}
"#,
        ),
        (
            "outer/main.tf",
            r#"
variable "instance_type" {}

module "inner" {
  source        = "./inner"
  instance_type = var.instance_type
}
"#,
        ),
        (
            "outer/inner/main.tf",
            r#"
variable "instance_type" {}

resource "aws_instance" "web" {
  instance_type = var.instance_type
}
"#,
        ),
    ]);
    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    assert_eq!(issue.range.filename, "main.tf");
    // Root binding, intermediate binding, then the triggering expression.
    let files: Vec<_> = issue.callers.iter().map(|r| r.filename.clone()).collect();
    assert_eq!(files, vec!["main.tf", "outer/main.tf", "outer/inner/main.tf"]);
}

#[test]
fn test_unevaluable_input_produces_no_issue() {
    // The value depends on count.index, so the child sees an unknown input
    // and the rule has nothing concrete to check.
    let issues = inspect(&[
        (
            "main.tf",
            r#"
module "app" {
  source        = "./app"
  count         = 2
  instance_type = "svc-${count.index}"
}
"#,
        ),
        (
            "app/main.tf",
            r#"
variable "instance_type" {}

resource "aws_instance" "web" {
  instance_type = var.instance_type
}
"#,
        ),
    ]);
    assert!(issues.is_empty());
}

#[test]
fn test_line_annotation_suppresses_issue() {
    let issues = inspect(&[(
        "main.tf",
        r#"
resource "aws_instance" "web" {
  # terralint-ignore: deprecated_instance_type
  instance_type = "t2.micro"
}
"#,
    )]);
    assert!(issues.is_empty());
}

#[test]
fn test_annotation_for_other_rule_does_not_suppress() {
    let issues = inspect(&[(
        "main.tf",
        r#"
resource "aws_instance" "web" {
  # terralint-ignore: some_other_rule
  instance_type = "t2.micro"
}
"#,
    )]);
    assert_eq!(issues.len(), 1);
}

#[test]
fn test_file_annotation_suppresses_whole_file() {
    let issues = inspect(&[(
        "main.tf",
        r#"# terralint-ignore-file: all
resource "aws_instance" "web" {
  instance_type = "t2.micro"
}
"#,
    )]);
    assert!(issues.is_empty());
}

#[test]
fn test_misplaced_file_annotation_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[(
            "main.tf",
            "resource \"aws_instance\" \"web\" {}\n# terralint-ignore-file: all\n",
        )],
    );
    let inspector = Inspector::new(Config::default(), vec![Box::new(DeprecatedInstanceType)]);
    assert!(inspector.inspect(dir.path(), &BTreeMap::new()).is_err());
}

#[test]
fn test_disabled_rule_is_skipped() {
    let mut config = Config::default();
    config.rules.insert(
        "deprecated_instance_type".to_string(),
        terralint_core::RuleConfig { enabled: false },
    );
    let issues = inspect_with_config(
        &[(
            "main.tf",
            r#"
resource "aws_instance" "web" {
  instance_type = "t2.micro"
}
"#,
        )],
        config,
    );
    assert!(issues.is_empty());
}
