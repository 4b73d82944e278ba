//! The instrumenting source transformer.
//!
//! Given a Rust source file, [`transform`] emits a semantically-equivalent
//! file with debug calls injected at every `breakpoint!()` marker and — in
//! step mode — before every candidate statement. The instrumented file links
//! against the runtime crate and consults the externally-edited breakpoint
//! list before every injected statement.
//!
//! The transformer is invoked by a build system and must never brick a
//! build: parse failures and oversized inputs degrade to verbatim
//! pass-through with a diagnostic, and the whole rewrite is transactional —
//! edits are accumulated during the walk and applied in one pass only after
//! the walk finished cleanly.
//!
//! Pipeline: read → marker scan → parse → global scan → statement walk
//! (scope-tracked) → header plan → edit application → write.

mod build_file;
mod globals;
mod header;
mod transform;
mod validate;
mod walker;

pub use build_file::rewrite_build_file;
pub use globals::{Global, GlobalKind, scan_globals};
pub use transform::{
    DEFAULT_RUNTIME_PATH, MAX_SOURCE_BYTES, Outcome, Summary, TransformError,
    TransformOptions, transform, transform_source,
};
pub use validate::{BreakpointValidation, ValidationReason, validate_breakpoint_line};
