//! The in-process debug runtime that stitch-instrumented programs call.
//!
//! The transformer rewrites every breakpoint marker and (in step mode) every
//! candidate statement into a guarded call pair:
//!
//! ```text
//! if __stitch::should_break(HASH, LINE) {
//!     __stitch::on_break("main", "src/main.rs", HASH, LINE, &["x"], &[&x]);
//! }
//! ```
//!
//! [`should_break`] is the hot path: a lock, a poll-throttle tick, and a
//! linear scan of at most 256 breakpoints — cheap enough to run before every
//! instrumented statement. [`on_break`] is the cold path: it writes the
//! state file, then suspends the program in a spin-polled command loop until
//! the external UI resumes it through the command file.
//!
//! The breakpoint file is ground truth. The runtime polls its modification
//! time every [`POLL_EVERY_N`] checks and reloads on change, so breakpoints
//! added from any editor take effect in a running program within tens of
//! milliseconds.
//!
//! Everything lives in one process-wide [`DebugSession`] behind a mutex.
//! Execution between pauses is assumed serial (see the crate-level
//! concurrency notes in `stitch-protocol`); concurrent hits from other
//! threads simply serialise on the lock.
//!
//! Un-instrumented builds still compile: the [`breakpoint!`] and
//! [`step_mode!`] markers expand to `()` until the transformer rewrites
//! them.

mod session;

pub use session::{DebugSession, HitContext, POLL_EVERY_N, SPIN_TICK, StepMode};

pub use stitch_inspect::{AsDebug, Bytes, Inspect, ValueFormatter, render};
pub use stitch_protocol::{Breakpoint, DebugMode, SessionConfig, file_hash, fnv1a_32};

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;

/// Source-level breakpoint marker.
///
/// Write `breakpoint!();` where you want the debugger to stop. The
/// transformer replaces the whole line with an instrumented call; in builds
/// that skip the transformer this expands to `()` and the program runs
/// unchanged.
#[macro_export]
macro_rules! breakpoint {
    () => {
        ()
    };
}

/// Step-instrumentation marker.
///
/// A `step_mode!();` statement asks the transformer to instrument every
/// following candidate statement in the file. The marker itself is consumed
/// by the transformer and expands to `()` otherwise.
#[macro_export]
macro_rules! step_mode {
    () => {
        ()
    };
}

static SESSION: Lazy<Mutex<DebugSession>> =
    Lazy::new(|| Mutex::new(DebugSession::new(SessionConfig::from_env())));

fn with_session<R>(f: impl FnOnce(&mut DebugSession) -> R) -> R {
    let mut guard = SESSION.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// Hot-path check called once per instrumented statement.
///
/// Returns true when the statement at `(file_hash, line)` should pause:
/// either a step mode is pending or an enabled breakpoint matches.
pub fn should_break(file_hash: u32, line: u32) -> bool {
    with_session(|s| s.should_break(file_hash, line))
}

/// Cold path: pause at a breakpoint hit and serve the command loop until
/// resumed.
pub fn on_break(
    function: &str,
    file: &str,
    file_hash: u32,
    line: u32,
    names: &[&str],
    values: &[&dyn Inspect],
) {
    with_session(|s| {
        s.pause(&HitContext { function, file, file_hash, line, names, values, next_line: None });
    });
}

/// Cold path for step pauses: identical to [`on_break`] but records the
/// about-to-execute statement text in the state file.
pub fn handle_step_before(
    function: &str,
    line_text: &str,
    file: &str,
    file_hash: u32,
    line: u32,
    names: &[&str],
    values: &[&dyn Inspect],
) {
    with_session(|s| {
        s.pause(&HitContext {
            function,
            file,
            file_hash,
            line,
            names,
            values,
            next_line: Some(line_text),
        });
    });
}

/// Programmatic breakpoint update with REPLACE semantics for one file.
///
/// Rewrites the breakpoint file as well, so it stays the single source of
/// truth (a DAP front-end calls this on every `setBreakpoints`).
pub fn set_breakpoints_for_file(file: &str, lines: &[u32]) {
    with_session(|s| s.set_breakpoints_for_file(file, lines));
}

/// Snapshot of the active breakpoint set.
#[must_use]
pub fn breakpoints() -> Vec<Breakpoint> {
    with_session(|s| s.breakpoints().to_vec())
}

/// Create the breakpoint file with a template if it does not exist yet, and
/// return its path.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn ensure_breakpoint_file() -> std::io::Result<PathBuf> {
    with_session(DebugSession::ensure_breakpoint_file)
}

/// Explicit initialisation: read the environment and load the breakpoint
/// file now instead of on the first [`should_break`].
pub fn init() {
    with_session(DebugSession::ensure_init);
}
