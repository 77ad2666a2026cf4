//! Suppression annotation extraction.
//!
//! Annotations are special comments recognized by terralint:
//!
//! - `terralint-ignore: rule1, rule2` suppresses issues raised on the same
//!   line or the line immediately below the comment.
//! - `terralint-ignore-file: rule1` suppresses matching issues anywhere in
//!   the file. It must appear at the very first line and column of the file,
//!   otherwise loading fails.
//!
//! Matching against issues happens at emission time in the core crate; this
//! module only scans comment tokens and yields the ordered annotation list
//! per file.

use serde::{Deserialize, Serialize};

use crate::error::LoaderError;
use crate::source::{LineIndex, SourceRange};

/// A single comment token found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    /// Comment text including the delimiter (`#`, `//` or `/* */`).
    pub text: String,
    pub range: SourceRange,
}

/// A suppression directive extracted from a comment token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// Comma-separated rule names, or `all`.
    pub content: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Applies to issues starting on the same line or the line below.
    Line,
    /// Applies to all issues in the file.
    File,
}

const LINE_MARKER: &str = "terralint-ignore:";
const FILE_MARKER: &str = "terralint-ignore-file:";

/// Scans the comment tokens of one file and returns its annotations in
/// source order.
pub fn extract_annotations(tokens: &[CommentToken]) -> Result<Vec<Annotation>, LoaderError> {
    let mut annotations = Vec::new();

    for token in tokens {
        // `terralint-ignore-file:` also contains `terralint-ignore` as a
        // substring, so the file marker must be tested first.
        if let Some(content) = annotation_content(&token.text, FILE_MARKER) {
            if !(token.range.start.line == 1 && token.range.start.column == 1) {
                return Err(LoaderError::MisplacedFileAnnotation {
                    range: token.range.clone(),
                });
            }
            annotations.push(Annotation {
                kind: AnnotationKind::File,
                content,
                range: token.range.clone(),
            });
        } else if let Some(content) = annotation_content(&token.text, LINE_MARKER) {
            annotations.push(Annotation {
                kind: AnnotationKind::Line,
                content,
                range: token.range.clone(),
            });
        }
    }

    Ok(annotations)
}

fn annotation_content(comment: &str, marker: &str) -> Option<String> {
    let idx = comment.find(marker)?;
    let rest = &comment[idx + marker.len()..];
    // Strip the closing delimiter of block comments and anything after a
    // line break.
    let rest = rest.split(['\n', '*']).next().unwrap_or("");
    Some(rest.trim().to_string())
}

/// Lexes the comment tokens of a file. Handles `#` and `//` line comments
/// and `/* */` block comments, and skips comment-looking text inside quoted
/// strings.
pub fn scan_comments(filename: &str, content: &str, index: &LineIndex) -> Vec<CommentToken> {
    let bytes = content.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                // Skip the string literal, honoring escapes.
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'#' => {
                let start = i;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                tokens.push(CommentToken {
                    text: content[start..i].to_string(),
                    range: index.range(filename, start..i),
                });
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                let start = i;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                tokens.push(CommentToken {
                    text: content[start..i].to_string(),
                    range: index.range(filename, start..i),
                });
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                let start = i;
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                tokens.push(CommentToken {
                    text: content[start..i].to_string(),
                    range: index.range(filename, start..i),
                });
            }
            _ => i += 1,
        }
    }

    tokens
}
