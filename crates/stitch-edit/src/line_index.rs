//! 1-based line number to byte offset mapping.

/// Byte offsets of line starts, for translating parser line/column spans
/// into edit offsets and back.
///
/// Lines are 1-based throughout (both the parser and the breakpoint protocol
/// count from 1). Columns are counted in characters, matching the spans the
/// parser reports, and converted to byte offsets on demand.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of each line start; `line_starts[0] == 0`
    line_starts: Vec<usize>,
    /// Total source length in bytes
    len: usize,
}

impl LineIndex {
    /// Build the index for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts, len: text.len() }
    }

    /// Number of lines, counting a trailing fragment without a newline.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the start of `line` (1-based).
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line as usize - 1).copied()
    }

    /// Byte offset just past the end of `line`, excluding the newline.
    #[must_use]
    pub fn line_end(&self, line: u32, text: &str) -> Option<usize> {
        let start = self.line_start(line)?;
        let next = self.line_starts.get(line as usize).copied().unwrap_or(self.len);
        let mut end = next;
        let bytes = text.as_bytes();
        while end > start && matches!(bytes.get(end - 1), Some(b'\n' | b'\r')) {
            end -= 1;
        }
        Some(end)
    }

    /// Full byte span of `line` including its terminating newline, for
    /// whole-line deletions.
    #[must_use]
    pub fn line_span_with_newline(&self, line: u32) -> Option<(usize, usize)> {
        let start = self.line_start(line)?;
        let end = self.line_starts.get(line as usize).copied().unwrap_or(self.len);
        Some((start, end))
    }

    /// The text of `line`, without its line terminator.
    #[must_use]
    pub fn line_text<'s>(&self, line: u32, text: &'s str) -> Option<&'s str> {
        let start = self.line_start(line)?;
        let end = self.line_end(line, text)?;
        text.get(start..end)
    }

    /// 1-based line containing the byte `offset`.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> u32 {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        idx as u32 + 1
    }

    /// Byte offset of the character at (1-based `line`, 0-based character
    /// `column`), as reported by parser spans.
    #[must_use]
    pub fn offset_at(&self, line: u32, column: usize, text: &str) -> Option<usize> {
        let start = self.line_start(line)?;
        let next = self.line_starts.get(line as usize).copied().unwrap_or(self.len);
        let line_text = text.get(start..next)?;
        let byte_col = line_text
            .char_indices()
            .nth(column)
            .map_or(line_text.len(), |(i, _)| i);
        Some(start + byte_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_test_support::must_some;

    const SRC: &str = "fn main() {\n    let x = 1;\n}\n";

    #[test]
    fn test_line_count_and_starts() {
        let idx = LineIndex::new(SRC);
        assert_eq!(idx.line_count(), 4); // includes the empty trailing fragment
        assert_eq!(must_some(idx.line_start(1)), 0);
        assert_eq!(must_some(idx.line_start(2)), 12);
        assert_eq!(must_some(idx.line_start(3)), 27);
        assert_eq!(idx.line_start(0), None);
        assert_eq!(idx.line_start(9), None);
    }

    #[test]
    fn test_line_text() {
        let idx = LineIndex::new(SRC);
        assert_eq!(must_some(idx.line_text(2, SRC)), "    let x = 1;");
        assert_eq!(must_some(idx.line_text(3, SRC)), "}");
    }

    #[test]
    fn test_line_text_strips_carriage_return() {
        let src = "a\r\nb\r\n";
        let idx = LineIndex::new(src);
        assert_eq!(must_some(idx.line_text(1, src)), "a");
        assert_eq!(must_some(idx.line_text(2, src)), "b");
    }

    #[test]
    fn test_line_span_with_newline() {
        let idx = LineIndex::new(SRC);
        assert_eq!(must_some(idx.line_span_with_newline(2)), (12, 27));
        // Deleting the span removes the whole line.
        let mut rest = String::new();
        rest.push_str(&SRC[..12]);
        rest.push_str(&SRC[27..]);
        assert_eq!(rest, "fn main() {\n}\n");
    }

    #[test]
    fn test_line_of() {
        let idx = LineIndex::new(SRC);
        assert_eq!(idx.line_of(0), 1);
        assert_eq!(idx.line_of(11), 1);
        assert_eq!(idx.line_of(12), 2);
        assert_eq!(idx.line_of(SRC.len()), 4);
    }

    #[test]
    fn test_offset_at_multibyte() {
        let src = "let s = \"héllo\";\n";
        let idx = LineIndex::new(src);
        // Column counts characters; 'é' is two bytes.
        let off = must_some(idx.offset_at(1, 11, src));
        assert_eq!(&src[off..off + 1], "l");
    }

    #[test]
    fn test_no_trailing_newline() {
        let src = "x = 1";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_count(), 1);
        assert_eq!(must_some(idx.line_end(1, src)), 5);
        assert_eq!(must_some(idx.line_span_with_newline(1)), (0, 5));
    }
}
