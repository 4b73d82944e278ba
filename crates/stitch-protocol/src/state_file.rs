//! The state file: debuggee → UI.
//!
//! Rewritten in full (truncate-and-write) on every hit and every resume, so
//! a UI can poll it without coordination. While running, the whole content
//! is the single line `status=running`.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One captured variable as shown in the stopped-state header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableLine {
    /// Variable name as written in the source
    pub name: String,
    /// Short type label
    pub type_name: String,
    /// One-line value summary (formatter depth 1)
    pub summary: String,
}

/// Everything the UI sees when the debuggee pauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppedState {
    /// Source file of the hit call site
    pub file: String,
    /// 1-based line of the hit
    pub line: u32,
    /// Enclosing function name
    pub function: String,
    /// Text of the statement about to execute (step pauses only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_line: Option<String>,
    /// Captured scope and globals, in capture order
    pub variables: Vec<VariableLine>,
}

impl StoppedState {
    /// Render the stopped-state file content.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("status=stopped\n");
        out.push_str(&format!("file={}\n", self.file));
        out.push_str(&format!("line={}\n", self.line));
        out.push_str(&format!("function={}\n", self.function));
        if let Some(next) = &self.next_line {
            out.push_str(&format!("next={next}\n"));
        }
        out.push_str("---\n");
        for var in &self.variables {
            out.push_str(&format!(
                "  {}: {} = {}\n",
                var.name, var.type_name, var.summary
            ));
        }
        out
    }
}

/// Atomically replace the state file with a stopped snapshot.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn write_stopped(path: &Path, state: &StoppedState) -> io::Result<()> {
    std::fs::write(path, state.render())
}

/// Atomically replace the state file with the running marker.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn write_running(path: &Path) -> io::Result<()> {
    std::fs::write(path, "status=running\n")
}
