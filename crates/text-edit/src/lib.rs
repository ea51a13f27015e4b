//! Text positions and splicing for ts-proptypes.
//!
//! Generated validator declarations are spliced into JavaScript that was not
//! produced by this project. Every change is recorded in an [`EditSet`] against
//! the untouched original text and applied in a single pass, lowest offset
//! first, so no intermediate buffer is ever mutated.
//!
//! # Example
//!
//! ```
//! use text_edit::EditSet;
//!
//! let source = "function Button() {}\n";
//! let mut edits = EditSet::new();
//! edits.insert(20, "\n\nButton.propTypes = {};");
//! assert_eq!(
//!     edits.apply(source).unwrap(),
//!     "function Button() {}\n\nButton.propTypes = {};\n"
//! );
//! ```

mod edit;
mod line_index;
mod span;

pub use edit::{EditError, EditSet};
pub use line_index::LineIndex;
pub use span::{ByteOffset, Span};
