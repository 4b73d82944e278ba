//! Transactional text edits for the instrumenting transformer.
//!
//! The transformer never mutates source text while walking it. Instead it
//! accumulates [`Edit`]s — byte-offset splices — into an [`EditSet`], and the
//! whole set is applied in a single linear pass once the walk is complete.
//! Overlapping edits are a hard error: the walker is responsible for planning
//! disjoint edits, and the applier verifies that guarantee rather than
//! silently producing garbage.
//!
//! [`LineIndex`] maps between 1-based line numbers and byte offsets, which is
//! how line/column spans reported by the parser become edit offsets.
//!
//! # Example
//!
//! ```
//! use stitch_edit::{Edit, EditSet};
//!
//! let mut edits = EditSet::new();
//! edits.push(Edit::insert(0, "// header\n"));
//! edits.push(Edit::replace(4, 5, "there"));
//!
//! let out = edits.apply("say hello")?;
//! assert_eq!(out, "// header\nsay there");
//! # Ok::<(), stitch_edit::EditError>(())
//! ```

mod edit;
mod line_index;

pub use edit::{Edit, EditSet};
pub use line_index::LineIndex;

/// Error type for edit application.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Two edits touch the same byte range.
    #[error("overlapping edit at byte offset {offset}")]
    Overlap {
        /// Offset of the edit that collided with its predecessor
        offset: usize,
    },

    /// An edit reaches past the end of the source.
    #[error("edit at offset {offset} (+{delete_len}) exceeds source length {source_len}")]
    OutOfBounds {
        /// Start offset of the offending edit
        offset: usize,
        /// Bytes the edit wanted to remove
        delete_len: usize,
        /// Length of the source being edited
        source_len: usize,
    },

    /// An edit boundary splits a UTF-8 character.
    #[error("edit boundary at byte offset {offset} is not a character boundary")]
    NotCharBoundary {
        /// The offending offset
        offset: usize,
    },
}
