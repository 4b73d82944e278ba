//! Breakpoint-line validation for editor front-ends.
//!
//! A UI that lets the user click a gutter line can check, before writing
//! the breakpoint file, whether the line actually carries an injectable
//! statement — and report why not otherwise.

use stitch_edit::LineIndex;

use crate::transform::injectable_lines;

/// Why a line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Line past the end of the file (or 0)
    OutOfRange,
    /// Only whitespace
    BlankLine,
    /// Only a comment
    CommentLine,
    /// Real code, but not an injectable statement (item boundary, closing
    /// brace, expression fragment)
    NotExecutable,
    /// The file does not parse; nothing can be verified
    ParseFailed,
}

/// Validation outcome for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointValidation {
    /// True when a breakpoint on this line can hit
    pub verified: bool,
    /// Reason when not verified
    pub reason: Option<ValidationReason>,
}

impl BreakpointValidation {
    fn ok() -> Self {
        Self { verified: true, reason: None }
    }

    fn rejected(reason: ValidationReason) -> Self {
        Self { verified: false, reason: Some(reason) }
    }
}

/// Validate a 1-based breakpoint line against `source`.
#[must_use]
pub fn validate_breakpoint_line(source: &str, line: u32) -> BreakpointValidation {
    let lines = LineIndex::new(source);
    let Some(text) = lines.line_text(line, source) else {
        return BreakpointValidation::rejected(ValidationReason::OutOfRange);
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BreakpointValidation::rejected(ValidationReason::BlankLine);
    }
    if trimmed.starts_with("//") {
        return BreakpointValidation::rejected(ValidationReason::CommentLine);
    }

    let parse_text = crate::transform::neutralize_prelude(source);
    let Ok(file) = syn::parse_file(&parse_text) else {
        return BreakpointValidation::rejected(ValidationReason::ParseFailed);
    };

    if injectable_lines(source, &file).contains(&line) {
        BreakpointValidation::ok()
    } else {
        BreakpointValidation::rejected(ValidationReason::NotExecutable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "\
// leading comment
fn main() {
    let x = 1;

    helper(x);
}

fn helper(v: i32) {
    println!(\"{v}\");
}
";

    #[test]
    fn test_statement_lines_verify() {
        assert!(validate_breakpoint_line(SRC, 3).verified);
        assert!(validate_breakpoint_line(SRC, 5).verified);
        assert!(validate_breakpoint_line(SRC, 9).verified);
    }

    #[test]
    fn test_comment_line_rejected() {
        let v = validate_breakpoint_line(SRC, 1);
        assert!(!v.verified);
        assert_eq!(v.reason, Some(ValidationReason::CommentLine));
    }

    #[test]
    fn test_blank_line_rejected() {
        let v = validate_breakpoint_line(SRC, 4);
        assert_eq!(v.reason, Some(ValidationReason::BlankLine));
    }

    #[test]
    fn test_signature_and_brace_lines_rejected() {
        assert_eq!(
            validate_breakpoint_line(SRC, 2).reason,
            Some(ValidationReason::NotExecutable)
        );
        assert_eq!(
            validate_breakpoint_line(SRC, 6).reason,
            Some(ValidationReason::NotExecutable)
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            validate_breakpoint_line(SRC, 99).reason,
            Some(ValidationReason::OutOfRange)
        );
        assert_eq!(
            validate_breakpoint_line(SRC, 0).reason,
            Some(ValidationReason::OutOfRange)
        );
    }

    #[test]
    fn test_unparseable_source_rejected() {
        let v = validate_breakpoint_line("fn broken( {\n", 1);
        assert_eq!(v.reason, Some(ValidationReason::ParseFailed));
    }
}
