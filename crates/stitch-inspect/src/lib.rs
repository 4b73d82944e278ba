//! Depth-bounded, size-bounded value formatting for debugger inspection.
//!
//! The runtime captures paused-scope variables as `&dyn Inspect` trait
//! objects. [`Inspect`] is the dispatch surface the whole inspection side of
//! the debugger runs on: it renders a value into a byte-bounded buffer, names
//! its type, and exposes enough structure (fields, elements, transparent
//! wrappers) for the UI's field-path queries (`player.hp`, `items[3..7]`).
//!
//! Formatting is bounded in three directions and therefore always
//! terminates:
//!
//! - **depth**: containers recurse with `depth - 1` and print only their
//!   short type name at depth 0; primitives print at any depth,
//! - **width**: at most [`ELEMENT_LIMIT`] elements per sequence and an
//!   explicit collapse for structs beyond [`STRUCT_COLLAPSE_LIMIT`] fields,
//! - **bytes**: every write goes through [`ValueFormatter`], which silently
//!   drops appends once the buffer budget is spent.
//!
//! Implementations exist for primitives, strings, slices/arrays/`Vec`,
//! `Option`, references and owning pointers, with [`Bytes`] and [`AsDebug`]
//! wrappers for byte buffers and arbitrary `Debug` types. Custom types get
//! `#[derive(Inspect)]` from the companion derive crate (re-exported behind
//! the `derive` feature).

mod formatter;
mod impls;
mod path;

pub use formatter::ValueFormatter;
pub use impls::{AsDebug, Bytes};
pub use path::{AccessError, PathSegment, Resolved, parse_path, resolve};

#[cfg(feature = "derive")]
pub use stitch_inspect_derive::Inspect;

use std::borrow::Cow;

/// Byte strings and `str` values are truncated to this many bytes.
pub const STRING_LIMIT: usize = 120;

/// Sequences render at most this many elements before the overflow marker.
pub const ELEMENT_LIMIT: usize = 20;

/// Structs with more fields than this collapse to `Name{ ... }`.
pub const STRUCT_COLLAPSE_LIMIT: usize = 16;

/// Structs with more fields than this refuse field-path access.
pub const FIELD_ACCESS_LIMIT: usize = 20;

/// Byte cap for the [`AsDebug`] fallback rendering.
pub const DEBUG_FALLBACK_LIMIT: usize = 128;

/// Field-path queries descend at most this many struct levels past the root.
pub const PATH_DEPTH_LIMIT: usize = 3;

/// A value the debugger can render and navigate.
///
/// Object-safe: the runtime stores captured scopes as `&[&dyn Inspect]`.
pub trait Inspect {
    /// Short human-readable type label (`i32`, `Vec<String>`, `Player`).
    fn type_label(&self) -> Cow<'static, str>;

    /// Render into `f`. Containers print only their type label when
    /// `depth == 0` and recurse into children with `depth - 1` otherwise;
    /// primitives ignore `depth`.
    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize);

    /// Named-field access for structs.
    fn child(&self, name: &str) -> Option<&dyn Inspect> {
        let _ = name;
        None
    }

    /// Indexed access for sequences.
    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        let _ = index;
        None
    }

    /// Element count for sequences.
    fn element_count(&self) -> Option<usize> {
        None
    }

    /// The wrapped value for transparent wrappers (`Option`, owning
    /// pointers): path access unwraps these without consuming path depth.
    fn transparent(&self) -> Option<&dyn Inspect> {
        None
    }

    /// True for types that refuse field-path access (structs past
    /// [`FIELD_ACCESS_LIMIT`] fields).
    fn denies_field_access(&self) -> bool {
        false
    }
}

/// Render `value` to a fresh string.
///
/// `multiline` selects the indented layout (two spaces per level) used for
/// output-file renderings; the inline layout is used for state-file
/// one-liners.
#[must_use]
pub fn render(value: &dyn Inspect, max_depth: usize, byte_limit: usize, multiline: bool) -> String {
    let mut out = String::new();
    let mut f = ValueFormatter::new(&mut out, byte_limit, multiline);
    value.inspect(&mut f, max_depth);
    out
}

/// Strip module paths from a `std::any::type_name` rendering, including
/// inside generic arguments: `alloc::vec::Vec<alloc::string::String>`
/// becomes `Vec<String>`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut ident = String::new();
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() || c == '_' {
            ident.push(c);
        } else if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            ident.clear();
        } else {
            out.push_str(&ident);
            ident.clear();
            out.push(c);
        }
    }
    out.push_str(&ident);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("i32"), "i32");
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(short_type_name("&[u8]"), "&[u8]");
        assert_eq!(
            short_type_name("core::option::Option<my_game::entity::Player>"),
            "Option<Player>"
        );
    }
}
