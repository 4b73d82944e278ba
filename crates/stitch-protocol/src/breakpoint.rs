//! The breakpoint data model.

use crate::hash::hash_matches;
use serde::{Deserialize, Serialize};

/// Capacity of the active breakpoint set. Entries past this bound are
/// dropped on reload (with a diagnostic) rather than grown into: the set is
/// scanned linearly on the hot path and must stay small.
pub const MAX_BREAKPOINTS: usize = 256;

/// A single breakpoint entry.
///
/// Identity is `(file, line)`. `hit_count` is monotonically non-decreasing
/// between reloads; a reload replaces the whole set and resets counters.
/// `condition` is parsed and carried for front-ends but never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Source file as written in the breakpoint file; matched by basename
    /// hash with a full-path-hash fallback
    pub file: String,

    /// 1-based line number
    pub line: u32,

    /// Disabled entries are kept but never hit
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of times this entry matched a call site since the last reload
    #[serde(default)]
    pub hit_count: u64,

    /// Reserved condition text (never evaluated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Breakpoint {
    /// An enabled breakpoint at `file:line`.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self { file: file.into(), line, enabled: true, hit_count: 0, condition: None }
    }

    /// Same entry, disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The active breakpoint set: bounded, insertion-ordered, linearly scanned.
///
/// Duplicate `(file, line)` entries are tolerated (the first one wins the
/// hit count); they are wasteful, not wrong.
#[derive(Debug, Default, Clone)]
pub struct BreakpointSet {
    entries: Vec<Breakpoint>,
}

impl BreakpointSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no breakpoints are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Breakpoint] {
        &self.entries
    }

    /// Replace the whole set (reload semantics). Entries beyond
    /// [`MAX_BREAKPOINTS`] are dropped; the count of dropped entries is
    /// returned so the caller can report it.
    pub fn replace_all(&mut self, entries: Vec<Breakpoint>) -> usize {
        let dropped = entries.len().saturating_sub(MAX_BREAKPOINTS);
        self.entries = entries;
        self.entries.truncate(MAX_BREAKPOINTS);
        dropped
    }

    /// REPLACE semantics for a single file: drop every entry whose `file`
    /// field equals `file`, then append one enabled entry per line, in the
    /// order given.
    pub fn replace_file(&mut self, file: &str, lines: &[u32]) {
        self.entries.retain(|bp| bp.file != file);
        for &line in lines {
            if self.entries.len() >= MAX_BREAKPOINTS {
                tracing::debug!(file, line, "breakpoint set full, dropping entry");
                break;
            }
            self.entries.push(Breakpoint::new(file, line));
        }
    }

    /// Hot-path check: does any enabled entry match `(file_hash, line)`?
    /// Increments the matching entry's hit counter.
    pub fn check_hit(&mut self, file_hash: u32, line: u32) -> bool {
        for bp in &mut self.entries {
            if bp.enabled && bp.line == line && hash_matches(&bp.file, file_hash) {
                bp.hit_count += 1;
                return true;
            }
        }
        false
    }
}
