//! The edit model: byte-offset splices applied in one ordered pass.

use crate::EditError;

/// A single splice into the source text.
///
/// `delete_len` bytes starting at `offset` are removed and `insert` is
/// written in their place. Pure insertions have `delete_len == 0`; pure
/// deletions have an empty `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Byte index into the original source
    pub offset: usize,
    /// Bytes to remove at `offset`
    pub delete_len: usize,
    /// Replacement text
    pub insert: String,
}

impl Edit {
    /// Insertion with no deletion.
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self { offset, delete_len: 0, insert: text.into() }
    }

    /// Replacement of `delete_len` bytes.
    #[must_use]
    pub fn replace(offset: usize, delete_len: usize, text: impl Into<String>) -> Self {
        Self { offset, delete_len, insert: text.into() }
    }

    /// Deletion with no replacement text.
    #[must_use]
    pub fn delete(offset: usize, delete_len: usize) -> Self {
        Self { offset, delete_len, insert: String::new() }
    }

    /// End of the deleted range in the original source.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.delete_len
    }
}

/// An accumulated set of edits, applied in one pass.
///
/// Edits may be pushed in any order; [`EditSet::apply`] sorts them by offset
/// (stable, so same-offset insertions keep their push order) and splices them
/// into the source in O(source + inserted) time.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    /// Create an empty edit set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Number of accumulated edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// True when no edits were planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// True when any planned edit starts inside the given byte range.
    ///
    /// Used to suppress discard deletions that would collide with an
    /// injection planned on the same line.
    #[must_use]
    pub fn touches_range(&self, start: usize, end: usize) -> bool {
        self.edits.iter().any(|e| e.offset >= start && e.offset < end)
    }

    /// Apply all edits to `source`, producing the rewritten text.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Overlap`] when a sorted edit begins before its
    /// predecessor's end, [`EditError::OutOfBounds`] when an edit reaches
    /// past the source, and [`EditError::NotCharBoundary`] when an offset
    /// splits a UTF-8 sequence. None of these occur for edits planned by the
    /// transformer walker; the checks exist so a bug surfaces as an error
    /// instead of corrupt output.
    pub fn apply(mut self, source: &str) -> Result<String, EditError> {
        self.edits.sort_by_key(|e| e.offset);

        let inserted: usize = self.edits.iter().map(|e| e.insert.len()).sum();
        let mut out = String::with_capacity(source.len() + inserted);
        let mut cursor = 0usize;

        for edit in &self.edits {
            if edit.offset < cursor {
                return Err(EditError::Overlap { offset: edit.offset });
            }
            if edit.end() > source.len() {
                return Err(EditError::OutOfBounds {
                    offset: edit.offset,
                    delete_len: edit.delete_len,
                    source_len: source.len(),
                });
            }
            let gap = source
                .get(cursor..edit.offset)
                .ok_or(EditError::NotCharBoundary { offset: edit.offset })?;
            out.push_str(gap);
            out.push_str(&edit.insert);
            cursor = edit.end();
        }

        let tail =
            source.get(cursor..).ok_or(EditError::NotCharBoundary { offset: cursor })?;
        out.push_str(tail);
        Ok(out)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use stitch_test_support::must;

    proptest! {
        // Disjoint single-byte replacements always apply, and the output
        // length is input length plus the net insert/delete delta.
        #[test]
        fn disjoint_edits_apply_cleanly(
            source in "[a-z]{20,80}",
            offsets in proptest::collection::btree_set(0usize..20, 0..8),
        ) {
            let mut edits = EditSet::new();
            let mut delta: isize = 0;
            for &o in &offsets {
                edits.push(Edit::replace(o, 1, "XY"));
                delta += 1;
            }
            let out = must(edits.apply(&source));
            prop_assert_eq!(out.len() as isize, source.len() as isize + delta);
        }
    }
}
