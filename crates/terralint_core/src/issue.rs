//! Issues reported by rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use terralint_loader::SourceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notice" => Ok(Severity::Notice),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity {other:?}")),
        }
    }
}

/// Identity of the rule that produced an issue, denormalized into the issue
/// so machine output is self-contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub name: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
}

/// A single finding, attributed to a source range. When the finding was
/// projected from inside a child module, `callers` lists the module call
/// chain from the root declaration down to the expression that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub rule: RuleInfo,
    pub message: String,
    pub range: SourceRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callers: Vec<SourceRange>,
}

impl Issue {
    /// Stable output order: by file, then start position ascending, then end
    /// position descending so enclosing ranges come before enclosed ones.
    /// Rule name and message break the remaining ties.
    pub fn sort(issues: &mut [Issue]) {
        issues.sort_by(|a, b| {
            a.range
                .filename
                .cmp(&b.range.filename)
                .then_with(|| a.range.start.cmp(&b.range.start))
                .then_with(|| b.range.end.cmp(&a.range.end))
                .then_with(|| a.rule.name.cmp(&b.rule.name))
                .then_with(|| a.message.cmp(&b.message))
        });
    }
}
