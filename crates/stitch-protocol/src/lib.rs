//! The on-disk rendezvous protocol between an instrumented program and an
//! external debugger UI.
//!
//! Four files in the debuggee's working directory carry the whole protocol —
//! no sockets, no shared memory:
//!
//! - **breakpoint file** (`breakpoints.list`): editor → debuggee. The ground
//!   truth for the active breakpoint set, polled for live edits.
//! - **state file** (`state.txt`): debuggee → UI. Rewritten on every hit and
//!   resume.
//! - **command file** (`command.txt`): UI → debuggee, consumed and deleted
//!   while paused.
//! - **output file** (`output.txt`): debuggee → UI, query responses.
//!
//! None of the files is locked. Atomicity is truncate-and-write-in-one-call
//! on the writer side and idempotent retry on the reader side.
//!
//! This crate also owns the pieces both halves of the system must agree on:
//! the 32-bit FNV-1a file hash baked into call sites at transform time, the
//! [`Breakpoint`] data model, and the tolerant breakpoint-list parser.

mod breakpoint;
mod command;
mod config;
mod hash;
mod list_file;
mod state_file;

pub use breakpoint::{Breakpoint, BreakpointSet, MAX_BREAKPOINTS};
pub use command::Command;
pub use config::{
    BREAKPOINT_FILE, COMMAND_FILE, DebugMode, ENV_BREAKPOINTS, ENV_DEBUG_MODE,
    ENV_PAUSE_ON_START, OUTPUT_FILE, STATE_FILE, SessionConfig,
};
pub use hash::{basename, file_hash, fnv1a_32, hash_matches};
pub use list_file::{ListParseError, parse_list, render_list, write_list};
pub use state_file::{StoppedState, VariableLine, write_running, write_stopped};
