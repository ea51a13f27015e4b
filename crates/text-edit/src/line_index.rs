//! Offset to line/column conversion for error locations.

use crate::ByteOffset;
use text_size::TextSize;

/// Start offsets of every line in a text, for O(log n) position lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    /// Indexes `text`. `\r\n` endings count as a single line break.
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
            )
            .collect();

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair for messages,
    /// columns counted in bytes.
    ///
    /// Offsets past the end clamp to the last position.
    pub fn one_based(&self, offset: ByteOffset) -> (u32, u32) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let column = u32::from(offset) - u32::from(self.line_starts[line]);
        (line as u32 + 1, column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_based() {
        let index = LineIndex::new("import x;\nfunction Button() {}\n");
        assert_eq!(index.one_based(TextSize::from(0)), (1, 1));
        assert_eq!(index.one_based(TextSize::from(10)), (2, 1));
        assert_eq!(index.one_based(TextSize::from(19)), (2, 10));
        assert_eq!(index.one_based(TextSize::from(500)), (3, 1));
    }

    #[test]
    fn test_crlf_line_breaks() {
        let index = LineIndex::new("import a;\r\nimport b;\nfoo();");
        assert_eq!(index.one_based(TextSize::from(11)), (2, 1));
        assert_eq!(index.one_based(TextSize::from(24)), (3, 4));
    }
}
