//! Edit lists applied in one pass over immutable text.

use crate::Span;
use thiserror::Error;

/// A single change: replace the bytes covered by `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    span: Span,
    text: String,
    /// Registration order, used to keep insertions at the same offset stable.
    order: usize,
}

/// Errors raised while applying an [`EditSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// An edit points past the end of the text or inside a UTF-8 sequence.
    #[error("edit at {start}..{end} is outside the text or not on a char boundary")]
    OutOfBounds { start: u32, end: u32 },

    /// Two edits touch the same bytes.
    #[error("edit at {start}..{end} overlaps an earlier edit ending at {previous_end}")]
    Overlap {
        start: u32,
        end: u32,
        previous_end: u32,
    },
}

/// Replacements of byte spans of one original text.
///
/// An empty span is a pure insertion, an empty text a pure deletion.
///
/// Edits are recorded in any order and resolved by [`EditSet::apply`], which
/// walks the original from the lowest offset upward. Insertions sharing an
/// offset keep their registration order.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insertion of `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace(Span::from_usize(offset, offset), text);
    }

    /// Records the removal of `span`.
    pub fn delete(&mut self, span: Span) {
        self.replace(span, String::new());
    }

    /// Records a replacement of `span` with `text`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        let order = self.edits.len();
        self.edits.push(TextEdit {
            span,
            text: text.into(),
            order,
        });
    }

    fn sorted(&self) -> Vec<&TextEdit> {
        let mut sorted: Vec<&TextEdit> = self.edits.iter().collect();
        sorted.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(a.span.end.cmp(&b.span.end))
                .then(a.order.cmp(&b.order))
        });
        sorted
    }

    /// Applies every edit to `source` and returns the new text.
    ///
    /// `source` itself is never modified; on error nothing is produced.
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        let extra: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(source.len() + extra);
        let mut last = 0usize;

        for edit in self.sorted() {
            let start = edit.span.start_usize();
            let end = edit.span.end_usize();
            if end > source.len() || !source.is_char_boundary(start) || !source.is_char_boundary(end)
            {
                return Err(EditError::OutOfBounds {
                    start: start as u32,
                    end: end as u32,
                });
            }
            if start < last {
                return Err(EditError::Overlap {
                    start: start as u32,
                    end: end as u32,
                    previous_end: last as u32,
                });
            }
            out.push_str(&source[last..start]);
            out.push_str(&edit.text);
            last = end;
        }

        out.push_str(&source[last..]);
        Ok(out)
    }
}
