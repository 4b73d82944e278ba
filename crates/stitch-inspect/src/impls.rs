//! `Inspect` implementations for the standard shapes the debugger meets:
//! primitives, strings, sequences, optionals, pointers, plus the `Bytes`
//! and `AsDebug` opt-in wrappers.

use crate::{
    DEBUG_FALLBACK_LIMIT, ELEMENT_LIMIT, Inspect, STRING_LIMIT, ValueFormatter,
    short_type_name,
};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn write_quoted(f: &mut ValueFormatter<'_>, s: &str, total_bytes: usize) {
    if s.len() <= STRING_LIMIT {
        f.write(&format!("\"{}\"", escape(s)));
        return;
    }
    let mut end = STRING_LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    f.write(&format!("\"{}...\" ({total_bytes} bytes)", escape(&s[..end])));
}

// ---- primitives -----------------------------------------------------------

macro_rules! inspect_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Inspect for $ty {
                fn type_label(&self) -> Cow<'static, str> {
                    Cow::Borrowed(stringify!($ty))
                }

                fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
                    f.write(&self.to_string());
                }
            }
        )*
    };
}

inspect_display!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool
);

impl Inspect for char {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Borrowed("char")
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
        f.write(&format!("'{}'", self.escape_default()));
    }
}

impl Inspect for () {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Borrowed("()")
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
        f.write("()");
    }
}

// ---- strings --------------------------------------------------------------

impl Inspect for str {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Borrowed("&str")
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
        write_quoted(f, self, self.len());
    }
}

impl Inspect for String {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Borrowed("String")
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        self.as_str().inspect(f, depth);
    }
}

/// Opt-in quoted rendering for byte buffers.
///
/// The blanket sequence impl renders `[u8]` numerically; wrapping the slice
/// in `Bytes` renders it as a quoted, lossily-decoded string instead.
#[derive(Debug, Clone, Copy)]
pub struct Bytes<'a>(pub &'a [u8]);

impl Inspect for Bytes<'_> {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Borrowed("&[u8]")
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
        let text = String::from_utf8_lossy(self.0);
        write_quoted(f, &text, self.0.len());
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        self.0.get(index).map(|b| b as &dyn Inspect)
    }

    fn element_count(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

// ---- references -----------------------------------------------------------

// Plain borrows are an artifact of the capture ABI (`&[&dyn Inspect]`) and
// fully delegate, so they are invisible to both rendering and path access.
impl<T: Inspect + ?Sized> Inspect for &T {
    fn type_label(&self) -> Cow<'static, str> {
        (**self).type_label()
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        (**self).inspect(f, depth);
    }

    fn child(&self, name: &str) -> Option<&dyn Inspect> {
        (**self).child(name)
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        (**self).element(index)
    }

    fn element_count(&self) -> Option<usize> {
        (**self).element_count()
    }

    fn transparent(&self) -> Option<&dyn Inspect> {
        (**self).transparent()
    }

    fn denies_field_access(&self) -> bool {
        (**self).denies_field_access()
    }
}

impl<T: Inspect + ?Sized> Inspect for &mut T {
    fn type_label(&self) -> Cow<'static, str> {
        (**self).type_label()
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        (**self).inspect(f, depth);
    }

    fn child(&self, name: &str) -> Option<&dyn Inspect> {
        (**self).child(name)
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        (**self).element(index)
    }

    fn element_count(&self) -> Option<usize> {
        (**self).element_count()
    }

    fn transparent(&self) -> Option<&dyn Inspect> {
        (**self).transparent()
    }

    fn denies_field_access(&self) -> bool {
        (**self).denies_field_access()
    }
}

// ---- owning pointers ------------------------------------------------------

// Pointer-to-one: dereference and recurse one level deeper. Path access
// unwraps them transparently.
macro_rules! inspect_owning_ptr {
    ($($ptr:ident),*) => {
        $(
            impl<T: Inspect> Inspect for $ptr<T> {
                fn type_label(&self) -> Cow<'static, str> {
                    Cow::Owned(format!(
                        concat!(stringify!($ptr), "<{}>"),
                        (**self).type_label()
                    ))
                }

                fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
                    (**self).inspect(f, depth.saturating_sub(1))
                }

                fn child(&self, name: &str) -> Option<&dyn Inspect> {
                    (**self).child(name)
                }

                fn element(&self, index: usize) -> Option<&dyn Inspect> {
                    (**self).element(index)
                }

                fn element_count(&self) -> Option<usize> {
                    (**self).element_count()
                }

                fn transparent(&self) -> Option<&dyn Inspect> {
                    Some(&**self)
                }

                fn denies_field_access(&self) -> bool {
                    (**self).denies_field_access()
                }
            }
        )*
    };
}

inspect_owning_ptr!(Box, Rc, Arc);

// ---- optionals ------------------------------------------------------------

impl<T: Inspect> Inspect for Option<T> {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Owned(short_type_name(std::any::type_name::<Self>()))
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        match self {
            None => f.write("null"),
            Some(inner) => inner.inspect(f, depth),
        }
    }

    fn child(&self, name: &str) -> Option<&dyn Inspect> {
        self.as_ref().and_then(|inner| inner.child(name))
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        self.as_ref().and_then(|inner| inner.element(index))
    }

    fn element_count(&self) -> Option<usize> {
        self.as_ref().and_then(Inspect::element_count)
    }

    fn transparent(&self) -> Option<&dyn Inspect> {
        self.as_ref().map(|inner| inner as &dyn Inspect)
    }
}

// ---- sequences ------------------------------------------------------------

impl<T: Inspect> Inspect for [T] {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("[{}]", short_type_name(std::any::type_name::<T>())))
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        if depth == 0 {
            f.write(&self.type_label());
            return;
        }
        f.write(&format!("[]({} items)", self.len()));
        if self.is_empty() {
            return;
        }
        f.begin_children();
        for (i, item) in self.iter().take(ELEMENT_LIMIT).enumerate() {
            f.item(i == 0, i);
            item.inspect(f, depth - 1);
        }
        if self.len() > ELEMENT_LIMIT {
            f.child_sep(false);
            f.write(&format!("... ({} items total)", self.len()));
        }
        f.end_children();
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        self.get(index).map(|v| v as &dyn Inspect)
    }

    fn element_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "[{}; {N}]",
            short_type_name(std::any::type_name::<T>())
        ))
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        if depth == 0 {
            f.write(&self.type_label());
            return;
        }
        self.as_slice().inspect(f, depth);
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        self.as_slice().element(index)
    }

    fn element_count(&self) -> Option<usize> {
        Some(N)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "Vec<{}>",
            short_type_name(std::any::type_name::<T>())
        ))
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, depth: usize) {
        if depth == 0 {
            f.write(&self.type_label());
            return;
        }
        self.as_slice().inspect(f, depth);
    }

    fn element(&self, index: usize) -> Option<&dyn Inspect> {
        self.as_slice().element(index)
    }

    fn element_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

// ---- functions ------------------------------------------------------------

macro_rules! inspect_fn {
    ($($arg:ident),*) => {
        impl<R, $($arg),*> Inspect for fn($($arg),*) -> R {
            fn type_label(&self) -> Cow<'static, str> {
                Cow::Owned(short_type_name(std::any::type_name::<Self>()))
            }

            fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
                f.write(&self.type_label());
            }
        }
    };
}

inspect_fn!();
inspect_fn!(A1);
inspect_fn!(A1, A2);
inspect_fn!(A1, A2, A3);

// ---- fallback -------------------------------------------------------------

/// Fallback rendering through `std::fmt::Debug`, capped at
/// [`DEBUG_FALLBACK_LIMIT`] bytes.
///
/// For values whose type has no structural `Inspect` implementation.
#[derive(Debug, Clone, Copy)]
pub struct AsDebug<'a, T: std::fmt::Debug + ?Sized>(pub &'a T);

impl<T: std::fmt::Debug + ?Sized> Inspect for AsDebug<'_, T> {
    fn type_label(&self) -> Cow<'static, str> {
        Cow::Owned(short_type_name(std::any::type_name::<T>()))
    }

    fn inspect(&self, f: &mut ValueFormatter<'_>, _depth: usize) {
        let full = format!("{:?}", self.0);
        if full.len() <= DEBUG_FALLBACK_LIMIT {
            f.write(&full);
            return;
        }
        let mut end = DEBUG_FALLBACK_LIMIT;
        while !full.is_char_boundary(end) {
            end -= 1;
        }
        f.write(&full[..end]);
        f.write("...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;

    #[test]
    fn test_primitives_render_at_depth_zero() {
        assert_eq!(render(&41i32, 0, 256, false), "41");
        assert_eq!(render(&2.5f64, 0, 256, false), "2.5");
        assert_eq!(render(&true, 0, 256, false), "true");
        assert_eq!(render(&'\n', 0, 256, false), "'\\n'");
    }

    #[test]
    fn test_string_quoting_and_escapes() {
        assert_eq!(render(&"hi\tthere", 1, 256, false), "\"hi\\tthere\"");
        assert_eq!(render(&String::from("a\"b"), 1, 256, false), "\"a\\\"b\"");
    }

    #[test]
    fn test_string_truncation_marker() {
        let long = "x".repeat(200);
        let rendered = render(&long.as_str(), 1, 512, false);
        assert!(rendered.starts_with('"'));
        assert!(rendered.ends_with("...\" (200 bytes)"));
    }

    #[test]
    fn test_option_renders_null_or_inner() {
        let none: Option<i32> = None;
        assert_eq!(render(&none, 1, 256, false), "null");
        assert_eq!(render(&Some(7i32), 1, 256, false), "7");
    }

    #[test]
    fn test_slice_inline_rendering() {
        let items = vec![1i32, 2, 3];
        assert_eq!(
            render(&items, 1, 256, false),
            "[](3 items){ [0]: 1, [1]: 2, [2]: 3 }"
        );
    }

    #[test]
    fn test_slice_multiline_rendering() {
        let items = [10i32, 20];
        assert_eq!(
            render(&items, 1, 256, true),
            "[](2 items)\n  [0]: 10\n  [1]: 20"
        );
    }

    #[test]
    fn test_container_at_depth_zero_shows_type_only() {
        let items = vec![1i32, 2, 3];
        assert_eq!(render(&items, 0, 256, false), "Vec<i32>");
    }

    #[test]
    fn test_element_limit_overflow_marker() {
        let items: Vec<i32> = (0..30).collect();
        let rendered = render(&items, 1, 4096, false);
        assert!(rendered.starts_with("[](30 items)"));
        assert!(rendered.contains("[19]: 19"));
        assert!(!rendered.contains("[20]: 20"));
        assert!(rendered.contains("... (30 items total)"));
    }

    #[test]
    fn test_box_decrements_depth() {
        // depth 1: the box consumes a level, the inner vec is at depth 0.
        let boxed = Box::new(vec![1i32, 2]);
        assert_eq!(render(&boxed, 1, 256, false), "Vec<i32>");
        assert_eq!(render(&boxed, 2, 256, false), "[](2 items){ [0]: 1, [1]: 2 }");
    }

    #[test]
    fn test_bytes_wrapper_quotes() {
        let raw = Bytes(b"abc");
        assert_eq!(render(&raw, 1, 256, false), "\"abc\"");
        let long = vec![b'y'; 300];
        let rendered = render(&Bytes(&long), 1, 512, false);
        assert!(rendered.ends_with("...\" (300 bytes)"));
    }

    #[test]
    fn test_as_debug_fallback_is_capped() {
        let pairs: Vec<(i32, &str)> = (0..50).map(|i| (i, "some text here")).collect();
        let rendered = render(&AsDebug(&pairs), 3, 4096, false);
        assert!(rendered.len() <= DEBUG_FALLBACK_LIMIT + 3);
        assert!(rendered.ends_with("..."));
    }

    #[test]
    fn test_fn_pointer_renders_type_name() {
        fn double(x: i32) -> i32 {
            x * 2
        }
        let f: fn(i32) -> i32 = double;
        assert_eq!(render(&f, 1, 256, false), "fn(i32) -> i32");
    }

    #[test]
    fn test_nested_depth_discipline() {
        let nested = vec![vec![1i32, 2], vec![3]];
        // depth 1: outer renders, inner vecs show type name only.
        assert_eq!(
            render(&nested, 1, 512, false),
            "[](2 items){ [0]: Vec<i32>, [1]: Vec<i32> }"
        );
        // depth 2: both levels render.
        assert_eq!(
            render(&nested, 2, 512, false),
            "[](2 items){ [0]: [](2 items){ [0]: 1, [1]: 2 }, [1]: [](1 items){ [0]: 3 } }"
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::render;
    use proptest::prelude::*;

    proptest! {
        // The byte budget is a hard bound regardless of value shape.
        #[test]
        fn render_respects_byte_budget(
            items in proptest::collection::vec(any::<i64>(), 0..64),
            budget in 0usize..64,
            depth in 0usize..4,
        ) {
            let rendered = render(&items, depth, budget, true);
            prop_assert!(rendered.len() <= budget);
        }

        // Deep nesting terminates and never overruns the budget.
        #[test]
        fn nested_options_terminate(n in 0usize..60) {
            let mut value: Box<dyn crate::Inspect> = Box::new(1u8);
            for _ in 0..n {
                value = Box::new(Some(value));
            }
            let rendered = render(&value, 3, 256, false);
            prop_assert!(rendered.len() <= 256);
        }
    }
}
