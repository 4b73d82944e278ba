//! Commands the UI writes into the command file while the debuggee is
//! paused.

/// A parsed command-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resume execution
    Continue,
    /// Terminate the debuggee with exit code 0
    Quit,
    /// Break on the very next instrumented statement, any file
    Step,
    /// Break on the next instrumented statement in the same file
    Next,
    /// Dump the full variable table to the output file
    Vars,
    /// A value query: `NAME`, `NAME.field.field`, `NAME[i]`, `NAME[i..j]`
    Query(String),
}

impl Command {
    /// Parse one command line. Returns `None` for empty input (no command
    /// yet — keep polling).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let line = input.trim();
        if line.is_empty() {
            return None;
        }
        Some(match line {
            "continue" | "c" => Self::Continue,
            "quit" | "q" => Self::Quit,
            "step" | "s" => Self::Step,
            "next" | "n" => Self::Next,
            "vars" | "v" => Self::Vars,
            _ => match line.strip_prefix("print ") {
                Some(expr) => Self::Query(expr.trim().to_string()),
                None => Self::Query(line.to_string()),
            },
        })
    }
}
