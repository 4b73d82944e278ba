//! The breakpoint file: parsing and canonical rendering.
//!
//! The file uses the target language's structured-literal style:
//!
//! ```text
//! [
//!     Breakpoint { file: "src/main.rs", line: 42 },
//!     Breakpoint { file: "src/util.rs", line: 7, enabled: false },
//! ]
//! ```
//!
//! Humans edit this file live, so the parser is a token stream fed into a
//! small state machine rather than a grammar: it recognises
//! `file`/`line`/`enabled`/`condition` fields wherever they appear, accepts
//! both `ident: value` and `.ident = value` field forms, and tolerates
//! comments, trailing commas, stray wrapper tokens, and unknown fields. An
//! entry commits on the closing brace once it has both a file and a line.

use crate::breakpoint::Breakpoint;

/// Error type for breakpoint-file parsing.
///
/// On parse failure the runtime keeps its previous set, so these errors are
/// diagnostics, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ListParseError {
    /// A string literal was still open at end of input
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString {
        /// Offset of the opening quote
        offset: usize,
    },

    /// An integer field overflowed or contained garbage
    #[error("invalid integer literal at byte {offset}")]
    InvalidInteger {
        /// Offset of the first digit
        offset: usize,
    },
}

#[derive(Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(u64),
    Punct(u8),
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { bytes: text.as_bytes(), pos: 0 }
    }

    fn skip_trivia(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => self.skip_to_eol(),
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'/') => self.skip_to_eol(),
                _ => break,
            }
        }
    }

    fn skip_to_eol(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    fn next(&mut self) -> Result<Option<Token>, ListParseError> {
        self.skip_trivia();
        let Some(&b) = self.bytes.get(self.pos) else {
            return Ok(None);
        };

        if b == b'"' {
            return self.string().map(Some);
        }
        if b.is_ascii_digit() {
            return self.integer().map(Some);
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = self.pos;
            while let Some(&c) = self.bytes.get(self.pos) {
                if c.is_ascii_alphanumeric() || c == b'_' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let ident = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
            return Ok(Some(Token::Ident(ident)));
        }

        self.pos += 1;
        Ok(Some(Token::Punct(b)))
    }

    fn string(&mut self) -> Result<Token, ListParseError> {
        let open = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            match b {
                b'"' => return Ok(Token::Str(String::from_utf8_lossy(&out).into_owned())),
                b'\\' => {
                    if let Some(&esc) = self.bytes.get(self.pos) {
                        self.pos += 1;
                        out.push(match esc {
                            b'n' => b'\n',
                            b't' => b'\t',
                            other => other,
                        });
                    }
                }
                other => out.push(other),
            }
        }
        Err(ListParseError::UnterminatedString { offset: open })
    }

    fn integer(&mut self) -> Result<Token, ListParseError> {
        let start = self.pos;
        while let Some(&c) = self.bytes.get(self.pos) {
            if c.is_ascii_digit() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).replace('_', "");
        text.parse::<u64>()
            .map(Token::Int)
            .map_err(|_| ListParseError::InvalidInteger { offset: start })
    }
}

#[derive(Default)]
struct PendingEntry {
    file: Option<String>,
    line: Option<u32>,
    enabled: bool,
    condition: Option<String>,
}

impl PendingEntry {
    fn fresh() -> Self {
        Self { enabled: true, ..Self::default() }
    }

    fn commit(&mut self) -> Option<Breakpoint> {
        let file = self.file.take()?;
        let line = self.line.take()?;
        let bp = Breakpoint {
            file,
            line,
            enabled: self.enabled,
            hit_count: 0,
            condition: self.condition.take(),
        };
        *self = Self::fresh();
        Some(bp)
    }
}

/// Parse breakpoint-file text into entries.
///
/// Returns the parsed entries in file order; the caller bounds them via
/// [`crate::BreakpointSet::replace_all`].
///
/// # Errors
///
/// Only lexical damage (unterminated string, garbage integer) is an error;
/// structural oddities are tolerated and skipped.
pub fn parse_list(text: &str) -> Result<Vec<Breakpoint>, ListParseError> {
    let mut lexer = Lexer::new(text);
    let mut entries = Vec::new();
    let mut pending = PendingEntry::fresh();
    let mut field: Option<String> = None;
    let mut awaiting_value = false;

    while let Some(token) = lexer.next()? {
        match token {
            Token::Ident(name) => {
                if awaiting_value {
                    // Bool field value.
                    if let Some(f) = field.take() {
                        if f == "enabled" {
                            pending.enabled = name == "true";
                        }
                    }
                    awaiting_value = false;
                } else {
                    field = Some(name);
                }
            }
            Token::Punct(b':') | Token::Punct(b'=') => {
                awaiting_value = field.is_some();
            }
            Token::Str(value) => {
                if awaiting_value {
                    match field.take().as_deref() {
                        Some("file") => pending.file = Some(value),
                        Some("condition") => pending.condition = Some(value),
                        _ => {}
                    }
                    awaiting_value = false;
                }
            }
            Token::Int(value) => {
                if awaiting_value {
                    if field.take().as_deref() == Some("line") {
                        pending.line = u32::try_from(value).ok();
                    }
                    awaiting_value = false;
                }
            }
            Token::Punct(b'}') => {
                if let Some(bp) = pending.commit() {
                    entries.push(bp);
                }
                field = None;
                awaiting_value = false;
            }
            Token::Punct(_) => {
                // Wrapper braces, brackets, commas, leading dots.
            }
        }
    }

    Ok(entries)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render entries in the canonical form the parser reads back.
#[must_use]
pub fn render_list(entries: &[Breakpoint]) -> String {
    let mut out = String::from("[\n");
    for bp in entries {
        out.push_str(&format!(
            "    Breakpoint {{ file: \"{}\", line: {}",
            escape(&bp.file),
            bp.line
        ));
        if !bp.enabled {
            out.push_str(", enabled: false");
        }
        if let Some(cond) = &bp.condition {
            out.push_str(&format!(", condition: \"{}\"", escape(cond)));
        }
        out.push_str(" },\n");
    }
    out.push_str("]\n");
    out
}

/// Truncate-and-write the canonical list to `path` in one call.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn write_list(path: &std::path::Path, entries: &[Breakpoint]) -> std::io::Result<()> {
    std::fs::write(path, render_list(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_test_support::{must, must_err};

    #[test]
    fn test_parse_canonical_form() {
        let text = r#"
[
    Breakpoint { file: "src/main.rs", line: 42 },
    Breakpoint { file: "src/util.rs", line: 7, enabled: false },
]
"#;
        let entries = must(parse_list(text));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, "src/main.rs");
        assert_eq!(entries[0].line, 42);
        assert!(entries[0].enabled);
        assert_eq!(entries[1].line, 7);
        assert!(!entries[1].enabled);
    }

    #[test]
    fn test_parse_dotted_literal_form() {
        // The `.ident = value` field style some front-ends emit.
        let text = r#"
.{
    .breakpoints = .{
        .{ .file = "src/main.rs", .line = 42 },
        .{ .file = "src/util.rs", .line = 7, .enabled = false },
    },
}
"#;
        let entries = must(parse_list(text));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, "src/main.rs");
        assert_eq!(entries[0].line, 42);
        assert!(!entries[1].enabled);
    }

    #[test]
    fn test_parse_tolerates_comments_and_unknown_fields() {
        let text = r#"
# master list
[
    // main loop
    Breakpoint { file: "a.rs", line: 1, color: "red", weight: 3 },
]
"#;
        let entries = must(parse_list(text));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, "a.rs");
    }

    #[test]
    fn test_parse_carries_condition_text() {
        let text = r#"[ Breakpoint { file: "a.rs", line: 9, condition: "x > 3" } ]"#;
        let entries = must(parse_list(text));
        assert_eq!(entries[0].condition.as_deref(), Some("x > 3"));
    }

    #[test]
    fn test_incomplete_entries_are_skipped() {
        let text = r#"[ Breakpoint { file: "a.rs" }, Breakpoint { line: 3 }, Breakpoint { file: "b.rs", line: 4 } ]"#;
        let entries = must(parse_list(text));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, "b.rs");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(must(parse_list("")).is_empty());
        assert!(must(parse_list("  \n# nothing here\n")).is_empty());
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let err = must_err(parse_list(r#"[ Breakpoint { file: "a.rs, line: 2 } ]"#));
        assert!(matches!(err, ListParseError::UnterminatedString { .. }));
    }

    #[test]
    fn test_render_parses_back() {
        let entries = vec![
            Breakpoint::new("src/main.rs", 42),
            Breakpoint::new("src/util.rs", 7).disabled(),
            Breakpoint::new(r"win\path.rs", 3),
        ];
        let text = render_list(&entries);
        let back = must(parse_list(&text));
        assert_eq!(back, entries);
    }

    #[test]
    fn test_string_escapes() {
        let entries = must(parse_list(r#"[ Breakpoint { file: "dir\\sub\\x.rs", line: 2 } ]"#));
        assert_eq!(entries[0].file, r"dir\sub\x.rs");
    }
}
