//! Header planning: where and what to insert at the top of an instrumented
//! file.

/// Marker comment identifying instrumented output. Its presence suppresses
/// a second header on re-runs.
pub(crate) const HEADER_MARKER: &str = "---- stitch debug instrumentation ----";

/// The alias injected calls go through.
pub(crate) const RUNTIME_ALIAS: &str = "__stitch";

/// The header block inserted once per instrumented file.
pub(crate) fn header_text(runtime_path: &str) -> String {
    format!(
        "// {HEADER_MARKER}\n#[allow(unused_imports)]\nuse {runtime_path} as {RUNTIME_ALIAS};\n"
    )
}

/// True when the source already carries the header (or the alias import),
/// which makes header insertion a no-op.
pub(crate) fn has_header(source: &str) -> bool {
    source.contains(HEADER_MARKER) || source.contains(&format!("as {RUNTIME_ALIAS};"))
}

/// Byte offset where the header belongs: after a BOM, a shebang line, the
/// leading comment block (`//`, `//!`, `/* ... */`), and any leading inner
/// attributes (`#![...]`) — inner attributes must stay ahead of all items,
/// and the module doc block reads better unbroken.
pub(crate) fn header_offset(source: &str) -> usize {
    let mut offset = 0;
    let bytes = source.as_bytes();

    if source.starts_with('\u{feff}') {
        offset += '\u{feff}'.len_utf8();
    }
    if source[offset..].starts_with("#!") && !source[offset..].starts_with("#![") {
        offset += line_len(&source[offset..]);
    }

    loop {
        let rest = &source[offset..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let ws = rest.len() - trimmed.len();

        if trimmed.starts_with('\n') {
            offset += ws + 1;
        } else if trimmed.starts_with("\r\n") {
            offset += ws + 2;
        } else if trimmed.starts_with("//") {
            offset += ws + line_len(trimmed);
        } else if trimmed.starts_with("/*") {
            match trimmed.find("*/") {
                Some(end) => offset += ws + end + 2,
                None => break,
            }
            // Consume the line remainder after the block close.
            let after = &source[offset..];
            let eaten = after.len() - after.trim_start_matches([' ', '\t']).len();
            if source[offset + eaten..].starts_with('\n') {
                offset += eaten + 1;
            }
        } else if trimmed.starts_with("#![") {
            // Inner attributes must precede the header; skip to the line
            // holding the closing bracket (attributes can span lines).
            let Some(close) = trimmed.find(']') else {
                break;
            };
            offset += ws + close + line_len(&trimmed[close..]);
        } else {
            break;
        }
        if offset >= bytes.len() {
            break;
        }
    }
    offset
}

fn line_len(text: &str) -> usize {
    text.find('\n').map_or(text.len(), |i| i + 1)
}
