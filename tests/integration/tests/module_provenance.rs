//! Integration tests for issue attribution across module calls.
//!
//! Runs the real binary against on-disk fixtures and checks that findings
//! inside child modules surface at the root-module expressions that fed
//! them.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn terralint_cmd() -> Command {
    Command::cargo_bin("terralint").expect("terralint binary")
}

#[test]
fn reports_child_module_issue_at_the_call_site() {
    let output = terralint_cmd()
        .arg(fixtures_dir().join("provenance"))
        .args(["--format", "json"])
        .output()
        .expect("run terralint");
    assert_eq!(output.status.code(), Some(1));

    let issues: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(issues.len(), 1);

    let issue = &issues[0];
    assert_eq!(issue["rule"]["name"], "aws_instance_previous_type");
    // Attributed to the binding in the root module, not to the child file.
    assert_eq!(issue["range"]["filename"], "main.tf");
    assert_eq!(issue["range"]["start"]["line"], 7);

    let callers = issue["callers"].as_array().unwrap();
    assert_eq!(callers.len(), 2);
    assert_eq!(callers[0]["filename"], "main.tf");
    assert_eq!(callers[1]["filename"], "modules/compute/main.tf");
}

#[test]
fn text_output_renders_the_caller_chain() {
    terralint_cmd()
        .arg(fixtures_dir().join("provenance"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("on main.tf:7"))
        .stdout(predicate::str::contains("via modules/compute/main.tf"));
}

#[test]
fn variable_override_changes_the_verdict() {
    terralint_cmd()
        .arg(fixtures_dir().join("provenance"))
        .args(["--var", "instance_type=t3.micro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn file_annotation_suppresses_the_finding() {
    terralint_cmd()
        .arg(fixtures_dir().join("suppressed"))
        .assert()
        .success();
}
