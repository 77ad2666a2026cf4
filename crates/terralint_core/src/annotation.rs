//! Applying suppression annotations to issues.

use terralint_loader::{Annotation, AnnotationKind};
use tracing::debug;

use crate::issue::Issue;

/// Whether the annotation suppresses this issue.
///
/// Line annotations match when they sit on the issue's start line or on the
/// line directly above it. File annotations match every issue in their file.
/// In both cases the annotation content must name the rule or `all`.
pub fn is_affected(annotation: &Annotation, issue: &Issue) -> bool {
    if annotation.range.filename != issue.range.filename {
        return false;
    }
    if !names_rule(&annotation.content, &issue.rule.name) {
        return false;
    }
    match annotation.kind {
        AnnotationKind::File => true,
        AnnotationKind::Line => {
            let annotation_line = annotation.range.start.line;
            let issue_line = issue.range.start.line;
            annotation_line == issue_line || annotation_line + 1 == issue_line
        }
    }
}

fn names_rule(content: &str, rule_name: &str) -> bool {
    content
        .split(',')
        .map(str::trim)
        .any(|name| name == "all" || name == rule_name)
}

/// Drops issues suppressed by any of the given annotations.
pub fn apply(issues: Vec<Issue>, annotations: &[Annotation]) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|issue| {
            let suppressed = annotations.iter().find(|a| is_affected(a, issue));
            if let Some(annotation) = suppressed {
                debug!(
                    "issue `{}` at {} suppressed by annotation at {}",
                    issue.rule.name, issue.range, annotation.range
                );
            }
            suppressed.is_none()
        })
        .collect()
}
