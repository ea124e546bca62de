//! Source text positions.
//!
//! Tokens carry byte ranges from `text-size`; diagnostics and model nodes
//! carry 1-based line/column pairs computed through a [`LineIndex`].

use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both fields are 0-indexed internally and displayed 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes)
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create from the 1-indexed line and column reported in messages.
    #[inline]
    pub const fn from_one_indexed(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }

    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    #[inline]
    pub const fn col_one_indexed(self) -> u32 {
        self.col + 1
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

/// Maps byte offsets of one source text to line/column positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// Offsets past the end of the text clamp to the end.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a line/column position back to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        Some(*line_start + TextSize::from(line_col.col))
    }

    /// Number of lines in the text; an empty text still has one line.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_display_is_one_indexed() {
        assert_eq!(LineCol::new(0, 0).to_string(), "1:1");
        assert_eq!(LineCol::new(4, 9).to_string(), "5:10");
        assert_eq!(LineCol::from_one_indexed(5, 10), LineCol::new(4, 9));
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("enum A\n{\n}");

        assert_eq!(index.len(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(5)), LineCol::new(0, 5));
        assert_eq!(index.line_col(TextSize::from(7)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(9)), LineCol::new(2, 0));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.line_col(TextSize::from(40)), LineCol::new(0, 2));
    }

    #[test]
    fn test_line_index_offset_roundtrip() {
        let index = LineIndex::new("structure\nA");
        assert_eq!(index.offset(LineCol::new(1, 0)), Some(TextSize::from(10)));
        assert_eq!(index.offset(LineCol::new(7, 0)), None);
        assert!(!index.is_empty());
        assert!(LineIndex::new("").is_empty());
    }
}
