//! Field-path access for UI value queries.
//!
//! A query like `player.inventory[2].name` parses into a root name plus
//! [`PathSegment`]s, then descends the captured value's `Inspect` structure.
//! `Option`s and owning pointers are unwrapped transparently without
//! consuming path depth; struct descent is capped at
//! [`crate::PATH_DEPTH_LIMIT`] levels past the root.

use crate::{Inspect, PATH_DEPTH_LIMIT, ValueFormatter};

/// One step of a parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name`
    Field(String),
    /// `[i]`
    Index(usize),
    /// `[i..j]`
    Range(usize, usize),
}

/// Error type for path parsing and resolution. The messages are shown
/// verbatim in the output file.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    /// A field name did not resolve on the value
    #[error("No field '{field}' on {type_label}")]
    NoField {
        /// The field that was asked for
        field: String,
        /// Label of the type that lacks it
        type_label: String,
    },

    /// Indexing applied to a non-sequence
    #[error("{type_label} is not indexable")]
    NotIndexable {
        /// Label of the non-sequence type
        type_label: String,
    },

    /// Index past the end of the sequence
    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// The type opted out of field access (too many fields)
    #[error("field access on {type_label} is not supported")]
    AccessDenied {
        /// Label of the refusing type
        type_label: String,
    },

    /// More struct levels than the descent cap allows
    #[error("path descends more than {limit} levels")]
    TooDeep {
        /// The cap that was exceeded
        limit: usize,
    },

    /// Unparseable path text
    #[error("malformed path near '{segment}'")]
    Malformed {
        /// The offending fragment
        segment: String,
    },

    /// A range segment can only terminate a path
    #[error("a range segment must end the path")]
    RangeNotLast,
}

/// Parse `name`, `name.field.field`, `name[i]`, `name[i..j]` and
/// combinations into the root name and its segments.
///
/// # Errors
///
/// [`AccessError::Malformed`] on anything that is not an identifier, `.`,
/// or a bracketed integer/range.
pub fn parse_path(input: &str) -> Result<(String, Vec<PathSegment>), AccessError> {
    let input = input.trim();
    let mut chars = input.char_indices().peekable();
    let mut root = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            root.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if root.is_empty() {
        return Err(AccessError::Malformed { segment: input.to_string() });
    }

    let mut segments = Vec::new();
    while let Some((offset, c)) = chars.next() {
        match c {
            '.' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(AccessError::Malformed {
                        segment: input[offset..].to_string(),
                    });
                }
                segments.push(PathSegment::Field(name));
            }
            '[' => {
                let rest: String =
                    chars.by_ref().take_while(|&(_, c)| c != ']').map(|(_, c)| c).collect();
                let segment = match rest.split_once("..") {
                    Some((a, b)) => {
                        let start = parse_index(a, input, offset)?;
                        let end = parse_index(b, input, offset)?;
                        PathSegment::Range(start, end)
                    }
                    None => PathSegment::Index(parse_index(&rest, input, offset)?),
                };
                segments.push(segment);
            }
            _ => {
                return Err(AccessError::Malformed { segment: input[offset..].to_string() });
            }
        }
    }
    Ok((root, segments))
}

fn parse_index(text: &str, input: &str, offset: usize) -> Result<usize, AccessError> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| AccessError::Malformed { segment: input[offset..].to_string() })
}

/// The outcome of a path resolution.
#[derive(Clone, Copy)]
pub enum Resolved<'a> {
    /// A single value
    Value(&'a dyn Inspect),
    /// A sub-range of a sequence (`[i..j]` query)
    Slice {
        /// The sequence the range was taken from
        parent: &'a dyn Inspect,
        /// Inclusive start, clamped to length
        start: usize,
        /// Exclusive end, clamped to length
        end: usize,
    },
}

impl std::fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Value(v) => {
                f.debug_tuple("Value").field(&v.type_label()).finish()
            }
            Resolved::Slice { parent, start, end } => f
                .debug_struct("Slice")
                .field("parent", &parent.type_label())
                .field("start", start)
                .field("end", end)
                .finish(),
        }
    }
}

impl Resolved<'_> {
    /// Type label for the output-file header.
    #[must_use]
    pub fn type_label(&self) -> String {
        match self {
            Resolved::Value(v) => v.type_label().into_owned(),
            Resolved::Slice { parent, start, end } => {
                format!("{}[{start}..{end}]", parent.type_label())
            }
        }
    }

    /// Render the resolved value (or range of values).
    #[must_use]
    pub fn render(&self, max_depth: usize, byte_limit: usize, multiline: bool) -> String {
        let mut out = String::new();
        let mut f = ValueFormatter::new(&mut out, byte_limit, multiline);
        match self {
            Resolved::Value(v) => v.inspect(&mut f, max_depth),
            Resolved::Slice { parent, start, end } => {
                f.write(&format!("[]({} items)", end - start));
                let mut first = true;
                for index in *start..*end {
                    if let Some(item) = parent.element(index) {
                        if first {
                            f.begin_children();
                        }
                        f.item(first, index);
                        item.inspect(&mut f, max_depth.saturating_sub(1));
                        first = false;
                    }
                }
                if !first {
                    f.end_children();
                }
            }
        }
        out
    }
}

/// Walk `segments` down from `root`.
///
/// # Errors
///
/// Any [`AccessError`] from a failed step; the walk stops at the first
/// failure.
pub fn resolve<'a>(
    root: &'a dyn Inspect,
    segments: &[PathSegment],
) -> Result<Resolved<'a>, AccessError> {
    let mut current = root;
    let mut struct_levels = 0usize;

    for (position, segment) in segments.iter().enumerate() {
        while let Some(inner) = current.transparent() {
            current = inner;
        }
        match segment {
            PathSegment::Field(name) => {
                struct_levels += 1;
                if struct_levels > PATH_DEPTH_LIMIT {
                    return Err(AccessError::TooDeep { limit: PATH_DEPTH_LIMIT });
                }
                if current.denies_field_access() {
                    return Err(AccessError::AccessDenied {
                        type_label: current.type_label().into_owned(),
                    });
                }
                current = current.child(name).ok_or_else(|| AccessError::NoField {
                    field: name.clone(),
                    type_label: current.type_label().into_owned(),
                })?;
            }
            PathSegment::Index(index) => {
                let len = current.element_count().ok_or_else(|| {
                    AccessError::NotIndexable {
                        type_label: current.type_label().into_owned(),
                    }
                })?;
                current = current
                    .element(*index)
                    .ok_or(AccessError::IndexOutOfRange { index: *index, len })?;
            }
            PathSegment::Range(start, end) => {
                if position + 1 != segments.len() {
                    return Err(AccessError::RangeNotLast);
                }
                let len = current.element_count().ok_or_else(|| {
                    AccessError::NotIndexable {
                        type_label: current.type_label().into_owned(),
                    }
                })?;
                let end = (*end).min(len);
                let start = (*start).min(end);
                return Ok(Resolved::Slice { parent: current, start, end });
            }
        }
    }
    Ok(Resolved::Value(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use stitch_test_support::{must, must_err};

    struct Player {
        name: String,
        hp: i32,
        inventory: Vec<String>,
    }

    impl Inspect for Player {
        fn type_label(&self) -> Cow<'static, str> {
            Cow::Borrowed("Player")
        }

        fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
            if depth == 0 {
                f.write("Player");
                return;
            }
            f.write("Player");
            f.begin_children();
            f.field(true, "name");
            self.name.inspect(f, depth - 1);
            f.field(false, "hp");
            self.hp.inspect(f, depth - 1);
            f.field(false, "inventory");
            self.inventory.inspect(f, depth - 1);
            f.end_children();
        }

        fn child(&self, name: &str) -> Option<&dyn Inspect> {
            match name {
                "name" => Some(&self.name),
                "hp" => Some(&self.hp),
                "inventory" => Some(&self.inventory),
                _ => None,
            }
        }
    }

    fn sample() -> Player {
        Player {
            name: "bob".to_string(),
            hp: 10,
            inventory: vec!["sword".to_string(), "shield".to_string()],
        }
    }

    #[test]
    fn test_parse_bare_name() {
        let (root, segments) = must(parse_path("player"));
        assert_eq!(root, "player");
        assert!(segments.is_empty());
    }

    #[test]
    fn test_parse_fields_and_indexes() {
        let (root, segments) = must(parse_path("player.inventory[1]"));
        assert_eq!(root, "player");
        assert_eq!(
            segments,
            vec![PathSegment::Field("inventory".to_string()), PathSegment::Index(1)]
        );
    }

    #[test]
    fn test_parse_range() {
        let (_, segments) = must(parse_path("items[3..7]"));
        assert_eq!(segments, vec![PathSegment::Range(3, 7)]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            must_err(parse_path("items[x]")),
            AccessError::Malformed { .. }
        ));
        assert!(matches!(
            must_err(parse_path(".hp")),
            AccessError::Malformed { .. }
        ));
        assert!(matches!(
            must_err(parse_path("player..hp")),
            AccessError::Malformed { .. }
        ));
    }

    #[test]
    fn test_resolve_field() {
        let player = sample();
        let resolved = must(resolve(&player, &[PathSegment::Field("hp".to_string())]));
        assert_eq!(resolved.type_label(), "i32");
        assert_eq!(resolved.render(1, 256, false), "10");
    }

    #[test]
    fn test_resolve_field_then_index() {
        let player = sample();
        let (_, segments) = must(parse_path("player.inventory[1]"));
        let resolved = must(resolve(&player, &segments));
        assert_eq!(resolved.render(1, 256, false), "\"shield\"");
    }

    #[test]
    fn test_resolve_range_clamps() {
        let items = vec![1i32, 2, 3];
        let (_, segments) = must(parse_path("items[1..9]"));
        let resolved = must(resolve(&items, &segments));
        assert_eq!(resolved.render(2, 256, false), "[](2 items){ [1]: 2, [2]: 3 }");
    }

    #[test]
    fn test_resolve_unknown_field() {
        let player = sample();
        let err = must_err(resolve(&player, &[PathSegment::Field("mp".to_string())]));
        assert_eq!(err.to_string(), "No field 'mp' on Player");
    }

    #[test]
    fn test_resolve_index_on_scalar() {
        let x = 5i32;
        let err = must_err(resolve(&x, &[PathSegment::Index(0)]));
        assert!(matches!(err, AccessError::NotIndexable { .. }));
    }

    #[test]
    fn test_transparent_unwrap_keeps_depth() {
        // Option + Box wrappers do not consume struct levels.
        let wrapped = Some(Box::new(sample()));
        let (_, segments) = must(parse_path("p.hp"));
        let resolved = must(resolve(&wrapped, &segments));
        assert_eq!(resolved.render(1, 256, false), "10");
    }

    #[test]
    fn test_depth_cap() {
        struct Chain(Option<Box<Chain>>, i32);
        impl Inspect for Chain {
            fn type_label(&self) -> Cow<'static, str> {
                Cow::Borrowed("Chain")
            }
            fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
                f.write("Chain");
            }
            fn child(&self, name: &str) -> Option<&dyn Inspect> {
                match name {
                    "next" => self.0.as_ref().map(|b| b as &dyn Inspect),
                    "value" => Some(&self.1),
                    _ => None,
                }
            }
        }
        let chain =
            Chain(Some(Box::new(Chain(Some(Box::new(Chain(None, 3))), 2))), 1);
        let ok = resolve(
            &chain,
            &[
                PathSegment::Field("next".to_string()),
                PathSegment::Field("next".to_string()),
                PathSegment::Field("value".to_string()),
            ],
        );
        assert!(ok.is_ok());
        let err = must_err(resolve(
            &chain,
            &[
                PathSegment::Field("next".to_string()),
                PathSegment::Field("next".to_string()),
                PathSegment::Field("next".to_string()),
                PathSegment::Field("value".to_string()),
            ],
        ));
        assert!(matches!(err, AccessError::TooDeep { .. }));
    }

    #[test]
    fn test_range_must_be_last() {
        let items = vec![vec![1i32]];
        let err = must_err(resolve(
            &items,
            &[PathSegment::Range(0, 1), PathSegment::Index(0)],
        ));
        assert_eq!(err, AccessError::RangeNotLast);
    }
}
