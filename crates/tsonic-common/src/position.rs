//! Position and location utilities.
//!
//! Diagnostics are rendered with line/column positions, while the surface
//! tree and IR use byte offsets. This module provides conversion utilities.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column in bytes
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A location in a source file (file path + range).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file_path: String,
    pub range: Range,
}

/// Precomputed line-start offsets for one source file.
///
/// Built once per file from the source text (or handed over by the host
/// parser) and used to convert byte offsets to line/column positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineMap {
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Build a line map from host-provided line starts.
    ///
    /// The first entry must be 0 and entries must be strictly increasing;
    /// an empty input yields the single-line map.
    #[must_use]
    pub fn from_line_starts(line_starts: Vec<u32>) -> Self {
        if line_starts.is_empty() {
            return Self {
                line_starts: vec![0],
            };
        }
        Self { line_starts }
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Convert a byte offset to a 0-indexed position.
    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let column = offset - self.line_starts[line];
        Position::new(line as u32, column)
    }

    /// Convert a span to a range.
    #[must_use]
    pub fn range(&self, span: Span) -> Range {
        Range::new(self.position(span.start), self.position(span.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_map_positions() {
        let map = LineMap::from_text("line1\nline2\nline3");
        assert_eq!(map.position(0), Position::new(0, 0));
        assert_eq!(map.position(5), Position::new(0, 5));
        assert_eq!(map.position(6), Position::new(1, 0));
        assert_eq!(map.position(12), Position::new(2, 0));
        assert_eq!(map.position(14), Position::new(2, 2));
    }

    #[test]
    fn test_line_map_single_line() {
        let map = LineMap::from_text("abc");
        assert_eq!(map.line_count(), 1);
        assert_eq!(map.position(2), Position::new(0, 2));
    }

    #[test]
    fn test_line_map_from_starts() {
        let map = LineMap::from_line_starts(vec![0, 10, 20]);
        assert_eq!(map.position(15), Position::new(1, 5));
        let empty = LineMap::from_line_starts(Vec::new());
        assert_eq!(empty.position(3), Position::new(0, 3));
    }
}
