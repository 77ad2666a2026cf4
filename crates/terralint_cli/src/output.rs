//! Issue rendering.
//!
//! Text output is for humans on stdout; JSON output is the machine
//! contract, used both by `--format json` and by the children of a
//! recursive run. Machine output owns stdout entirely, logs go to stderr.

use std::fmt::Write;

use miette::{IntoDiagnostic, Result};

use terralint_core::Issue;

pub fn render(issues: &[Issue], format: &str) -> Result<String> {
    match format {
        "json" => render_json(issues),
        _ => Ok(render_text(issues)),
    }
}

pub fn render_json(issues: &[Issue]) -> Result<String> {
    serde_json::to_string(issues).into_diagnostic()
}

pub fn render_text(issues: &[Issue]) -> String {
    let mut out = String::new();

    for issue in issues {
        let _ = writeln!(
            out,
            "{}: {} ({})",
            issue.rule.severity, issue.message, issue.rule.name
        );
        let _ = writeln!(out, "  on {}", issue.range);
        // The first caller is the issue's own range; the rest is the module
        // call chain down to the triggering expression.
        for caller in issue.callers.iter().skip(1) {
            let _ = writeln!(out, "  via {caller}");
        }
        if !issue.rule.link.is_empty() {
            let _ = writeln!(out, "  see {}", issue.rule.link);
        }
        let _ = writeln!(out);
    }

    match issues.len() {
        0 => out.push_str("No issues found.\n"),
        1 => out.push_str("1 issue found.\n"),
        n => {
            let _ = writeln!(out, "{n} issues found.");
        }
    }
    out
}
