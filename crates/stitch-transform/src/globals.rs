//! Top-level global scanning.
//!
//! Runs once per file before the statement walk. The resulting list is
//! captured (alongside the local scope) at every injection site, so a
//! paused program can inspect file-level state too. Globals are per-file by
//! design: items imported from other files are not auto-captured.

use once_cell::sync::Lazy;
use regex::Regex;

/// Classification of a top-level variable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    /// `static NAME`
    Regular,
    /// A name declared inside `thread_local! { ... }`
    ThreadLocal,
    /// `const NAME`
    ComptimeConst,
    /// `pub static NAME`
    ExportedVar,
    /// `pub const NAME`
    ExportedConst,
}

/// One file-level variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    /// Item name
    pub name: String,
    /// Keyword classification
    pub kind: GlobalKind,
    /// Whether an injected call site may take `&NAME`. Mutable statics and
    /// thread-locals are recognised but never captured.
    pub capturable: bool,
}

#[allow(clippy::unwrap_used)]
static THREAD_LOCAL_STATIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"static\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

fn is_pub(vis: &syn::Visibility) -> bool {
    !matches!(vis, syn::Visibility::Inherited)
}

/// Scan a parsed file's top-level items for globals.
#[must_use]
pub fn scan_globals(file: &syn::File) -> Vec<Global> {
    let mut globals = Vec::new();
    for item in &file.items {
        match item {
            syn::Item::Static(item) => {
                let kind = if is_pub(&item.vis) {
                    GlobalKind::ExportedVar
                } else {
                    GlobalKind::Regular
                };
                let immutable = matches!(item.mutability, syn::StaticMutability::None);
                globals.push(Global {
                    name: item.ident.to_string(),
                    kind,
                    capturable: immutable,
                });
            }
            syn::Item::Const(item) => {
                let kind = if is_pub(&item.vis) {
                    GlobalKind::ExportedConst
                } else {
                    GlobalKind::ComptimeConst
                };
                globals.push(Global { name: item.ident.to_string(), kind, capturable: true });
            }
            syn::Item::Macro(item) => {
                let is_thread_local = item
                    .mac
                    .path
                    .segments
                    .last()
                    .is_some_and(|seg| seg.ident == "thread_local");
                if is_thread_local {
                    let tokens = item.mac.tokens.to_string();
                    for caps in THREAD_LOCAL_STATIC.captures_iter(&tokens) {
                        globals.push(Global {
                            name: caps[1].to_string(),
                            kind: GlobalKind::ThreadLocal,
                            capturable: false,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    globals
}
