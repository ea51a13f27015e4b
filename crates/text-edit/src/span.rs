//! Byte spans over source text.

use text_size::TextSize;

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` in some source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    /// Creates a span from `usize` offsets, as produced by `str` indexing.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        Self {
            start: TextSize::from(start as u32),
            end: TextSize::from(end as u32),
        }
    }

    #[inline]
    pub fn start_usize(&self) -> usize {
        u32::from(self.start) as usize
    }

    #[inline]
    pub fn end_usize(&self) -> usize {
        u32::from(self.end) as usize
    }

    /// The covered text, if the span lies inside `text` on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start_usize()..self.end_usize())
    }
}
