//! Source positions and ranges.
//!
//! HCL spans are byte offsets into a single file. Issues and annotations work
//! in terms of line/column positions, so every loaded file keeps a line index
//! that converts byte offsets into [`SourcePos`] values.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A position inside a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl SourcePos {
    pub fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

impl PartialOrd for SourcePos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.byte.cmp(&other.byte)
    }
}

/// A contiguous range inside a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: SourcePos,
    pub end: SourcePos,
}

impl SourceRange {
    pub fn new(filename: impl Into<String>, start: SourcePos, end: SourcePos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.filename, self.start.line, self.start.column)
    }
}

/// Byte-offset to line/column mapping for one file.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: content.len(),
        }
    }

    /// Converts a byte offset into a position. Offsets past the end of the
    /// file are clamped to the last byte.
    pub fn pos(&self, byte: usize) -> SourcePos {
        let byte = byte.min(self.len);
        let line = match self.line_starts.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        SourcePos {
            line: line + 1,
            column: byte - self.line_starts[line] + 1,
            byte,
        }
    }

    /// Converts a byte span into a range within `filename`.
    pub fn range(&self, filename: &str, span: Range<usize>) -> SourceRange {
        SourceRange {
            filename: filename.to_string(),
            start: self.pos(span.start),
            end: self.pos(span.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_index_single_line() {
        let index = LineIndex::new("foo = 1");
        assert_eq!(index.pos(0), SourcePos::new(1, 1, 0));
        assert_eq!(index.pos(6), SourcePos::new(1, 7, 6));
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("a = 1\nbb = 2\n");
        assert_eq!(index.pos(6), SourcePos::new(2, 1, 6));
        assert_eq!(index.pos(11), SourcePos::new(2, 6, 11));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let index = LineIndex::new("a = 1");
        assert_eq!(index.pos(100).byte, 5);
    }

    #[test]
    fn test_range_display() {
        let index = LineIndex::new("a = 1\nb = 2\n");
        let range = index.range("main.tf", 6..11);
        assert_eq!(range.to_string(), "main.tf:2,1");
    }

    #[test]
    fn test_pos_ordering_by_byte() {
        let a = SourcePos::new(1, 5, 4);
        let b = SourcePos::new(2, 1, 6);
        assert!(a < b);
    }
}
