//! Transformer entry points and failure semantics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stitch_edit::{Edit, LineIndex};
use stitch_protocol::file_hash;

use crate::build_file::rewrite_build_file;
use crate::globals::scan_globals;
use crate::header::{has_header, header_offset, header_text};
use crate::walker::Walker;

/// Inputs past this size pass through verbatim.
pub const MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024;

/// Default runtime import path injected into the header.
pub const DEFAULT_RUNTIME_PATH: &str = "stitch_runtime";

/// Transformer options, mirrored by the CLI flags.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Instrument every candidate statement, not just marked lines
    pub step_mode: bool,
    /// Import path of the runtime crate for the header `use`
    pub runtime_path: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { step_mode: false, runtime_path: DEFAULT_RUNTIME_PATH.to_string() }
    }
}

/// What the transformer did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Debug calls were injected
    Instrumented,
    /// Nothing to do; the output is the input verbatim
    NoDebugNeeded,
    /// The input did not parse; passed through verbatim
    ParseErrorPassThrough,
    /// The input was the build manifest; only paths were rewritten
    BuildFileRewrite,
}

/// Result summary for the one-line stderr report.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    /// What happened
    pub outcome: Outcome,
    /// Number of applied edits
    pub edits: usize,
    /// Number of scanned globals
    pub globals: usize,
}

/// Error type for the transformer. Only I/O is fatal; everything else
/// degrades to pass-through so a build is never bricked.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Could not read the input
    #[error("failed to read {path}: {source}")]
    Input {
        /// Input path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Could not write the output
    #[error("failed to write {path}: {source}")]
    Output {
        /// Output path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Planned edits failed to apply; indicates a walker bug
    #[error(transparent)]
    Edit(#[from] stitch_edit::EditError),
}

/// Transform `input` into `output` per `options`.
///
/// # Errors
///
/// Only on unrecoverable I/O ([`TransformError::Input`] /
/// [`TransformError::Output`]) or an internal edit inconsistency.
pub fn transform(
    input: &Path,
    output: &Path,
    options: &TransformOptions,
) -> Result<Summary, TransformError> {
    let read_err =
        |source| TransformError::Input { path: input.to_path_buf(), source };

    let size = fs::metadata(input).map_err(read_err)?.len();
    let source = fs::read_to_string(input).map_err(read_err)?;

    if size > MAX_SOURCE_BYTES {
        tracing::warn!(path = %input.display(), size, "input over size bound, passing through");
        write_output(output, &source)?;
        return Ok(Summary { outcome: Outcome::NoDebugNeeded, edits: 0, globals: 0 });
    }

    if input.file_name().is_some_and(|name| name == "Cargo.toml") {
        let (rewritten, edits) = rewrite_build_file(&source);
        write_output(output, &rewritten)?;
        return Ok(Summary { outcome: Outcome::BuildFileRewrite, edits, globals: 0 });
    }

    let file_path = input.to_string_lossy();
    let (text, summary) = transform_source(&source, &file_path, options)?;
    write_output(output, &text)?;
    Ok(summary)
}

/// The pure core of [`transform`]: source text in, transformed text and
/// summary out. Exposed for embedding and tests.
///
/// # Errors
///
/// Only [`TransformError::Edit`] (walker inconsistency).
pub fn transform_source(
    source: &str,
    file_path: &str,
    options: &TransformOptions,
) -> Result<(String, Summary), TransformError> {
    // Fast path: nothing to instrument, nothing to parse.
    let has_markers = source.contains("breakpoint!") || source.contains("step_mode!");
    if !has_markers && !options.step_mode {
        return Ok((
            source.to_string(),
            Summary { outcome: Outcome::NoDebugNeeded, edits: 0, globals: 0 },
        ));
    }

    // The transformer never corrupts an unparseable file.
    let parse_text = neutralize_prelude(source);
    let Ok(file) = syn::parse_file(&parse_text) else {
        return Ok((
            source.to_string(),
            Summary { outcome: Outcome::ParseErrorPassThrough, edits: 0, globals: 0 },
        ));
    };

    let lines = LineIndex::new(source);
    let globals = scan_globals(&file);
    let hash = file_hash(file_path);

    let mut walker =
        Walker::new(source, &lines, file_path, hash, &globals, options.step_mode);
    walker.walk_file(&file);
    let (mut edits, _) = walker.finish();

    if edits.is_empty() {
        return Ok((
            source.to_string(),
            Summary {
                outcome: Outcome::NoDebugNeeded,
                edits: 0,
                globals: globals.len(),
            },
        ));
    }

    if !has_header(source) {
        edits.push(Edit::insert(
            header_offset(source),
            header_text(&options.runtime_path),
        ));
    }

    let count = edits.len();
    let text = edits.apply(source)?;
    Ok((
        text,
        Summary { outcome: Outcome::Instrumented, edits: count, globals: globals.len() },
    ))
}

/// Walker output needed by breakpoint-line validation.
pub(crate) fn injectable_lines(
    source: &str,
    file: &syn::File,
) -> std::collections::BTreeSet<u32> {
    let lines = LineIndex::new(source);
    let globals = scan_globals(file);
    // Step mode forced on so every candidate statement is classified.
    let mut walker = Walker::new(source, &lines, "", 0, &globals, true);
    walker.walk_file(file);
    let (_, injectable) = walker.finish();
    injectable
}

/// Replace a BOM and/or shebang with same-length neutral bytes so the
/// parser sees plain Rust while every span still lines up with the original
/// text. (The parser would otherwise strip these itself and shift all
/// spans.)
pub(crate) fn neutralize_prelude(source: &str) -> std::borrow::Cow<'_, str> {
    const BOM: char = '\u{feff}';
    let has_bom = source.starts_with(BOM);
    let after_bom = if has_bom { &source[BOM.len_utf8()..] } else { source };
    let has_shebang = after_bom.starts_with("#!") && !after_bom.starts_with("#![");
    if !has_bom && !has_shebang {
        return std::borrow::Cow::Borrowed(source);
    }
    let mut text = String::with_capacity(source.len());
    if has_bom {
        text.push_str("   ");
    }
    if has_shebang {
        text.push_str("//");
        text.push_str(&after_bom[2..]);
    } else {
        text.push_str(after_bom);
    }
    std::borrow::Cow::Owned(text)
}

fn write_output(path: &Path, text: &str) -> Result<(), TransformError> {
    let write_err =
        |source| TransformError::Output { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    fs::write(path, text).map_err(write_err)
}
