//! The process-wide debug session: breakpoint set, polling, and the
//! pause/resume rendezvous.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use stitch_inspect::{Inspect, PathSegment, parse_path, render, resolve};
use stitch_protocol::{
    Breakpoint, BreakpointSet, Command, DebugMode, SessionConfig, StoppedState,
    VariableLine, parse_list, write_list, write_running, write_stopped,
};

/// The breakpoint file is stat'ed once per this many `should_break` calls.
/// Keeps the hot path in the low-nanosecond range while bounding
/// editor-to-effect latency.
pub const POLL_EVERY_N: u32 = 50_000;

/// Spin iterations between command-file reads while paused.
pub const SPIN_TICK: u32 = 100_000;

/// Formatter depth for state-file one-line summaries.
const SUMMARY_DEPTH: usize = 1;
/// Byte budget per state-file summary.
const SUMMARY_BYTES: usize = 256;
/// Formatter depth for output-file renderings (`vars` and queries).
const OUTPUT_DEPTH: usize = 3;
/// Byte budget per output-file rendering.
const OUTPUT_BYTES: usize = 4096;

const LIST_TEMPLATE: &str = "[\n    # Breakpoint { file: \"src/main.rs\", line: 1 },\n]\n";

/// Pending step state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    /// No step pending
    #[default]
    None,
    /// Break on the very next instrumented statement
    In,
    /// Break on the next instrumented statement whose call site carries the
    /// anchor file hash
    Over {
        /// File hash of the frame the step was issued from
        anchor: u32,
    },
}

/// Everything an injected call site knows about itself, passed to the cold
/// path on a hit.
#[derive(Clone, Copy)]
pub struct HitContext<'a> {
    /// Enclosing function name
    pub function: &'a str,
    /// Source file path as seen at transform time
    pub file: &'a str,
    /// Compile-time hash of the file's basename
    pub file_hash: u32,
    /// 1-based source line
    pub line: u32,
    /// Captured variable names: scope first, then file globals
    pub names: &'a [&'a str],
    /// Captured values, parallel to `names`
    pub values: &'a [&'a dyn Inspect],
    /// Statement text about to execute (step pauses only)
    pub next_line: Option<&'a str>,
}

impl std::fmt::Debug for HitContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitContext")
            .field("function", &self.function)
            .field("file", &self.file)
            .field("file_hash", &self.file_hash)
            .field("line", &self.line)
            .field("names", &self.names)
            .field(
                "values",
                &self.values.iter().map(|v| v.type_label()).collect::<Vec<_>>(),
            )
            .field("next_line", &self.next_line)
            .finish()
    }
}

/// One process-wide debug session.
///
/// All state the injected calls touch lives here: the active breakpoint
/// set, the poll throttle, and the pending step mode. The library front end
/// wraps a single instance in a mutex; tests construct their own with a
/// scratch-directory [`SessionConfig`].
#[derive(Debug)]
pub struct DebugSession {
    config: SessionConfig,
    breakpoints: BreakpointSet,
    step: StepMode,
    poll_counter: u32,
    last_mtime: Option<SystemTime>,
    initialized: bool,
}

impl DebugSession {
    /// A session over `config`. Lazy: nothing is read until the first
    /// check-in.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            breakpoints: BreakpointSet::new(),
            step: StepMode::None,
            poll_counter: 0,
            last_mtime: None,
            initialized: false,
        }
    }

    /// First-call initialisation: remember the breakpoint file's current
    /// mtime, load it (missing file is an empty set, not an error), and arm
    /// a pause-on-start step if configured.
    pub fn ensure_init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.last_mtime = self.breakpoint_file_mtime();
        self.reload_breakpoints();
        if self.config.pause_on_start {
            self.step = StepMode::In;
        }
    }

    /// The hot path. See the crate docs for the exact semantics.
    pub fn should_break(&mut self, file_hash: u32, line: u32) -> bool {
        self.ensure_init();
        self.poll_breakpoint_file();
        match self.step {
            StepMode::In => return true,
            StepMode::Over { anchor } if anchor == file_hash => return true,
            _ => {}
        }
        self.breakpoints.check_hit(file_hash, line)
    }

    /// The cold path: publish the stopped state, then block in the command
    /// loop until the UI resumes (or quits) the program.
    pub fn pause(&mut self, hit: &HitContext<'_>) {
        self.ensure_init();
        // The landing itself satisfies any pending step.
        self.step = StepMode::None;

        if self.config.mode == DebugMode::Terminal {
            eprintln!(
                "stitch: stopped at {}:{} in {}",
                hit.file, hit.line, hit.function
            );
        }
        tracing::debug!(
            file = hit.file,
            line = hit.line,
            function = hit.function,
            "debuggee paused"
        );

        let state = self.stopped_state(hit);
        if let Err(err) = write_stopped(&self.config.state_path, &state) {
            tracing::warn!(%err, "failed to write state file");
        }
        let _ = fs::remove_file(&self.config.command_path);
        let _ = fs::remove_file(&self.config.output_path);

        self.command_loop(hit);

        let _ = fs::remove_file(&self.config.command_path);
        let _ = fs::remove_file(&self.config.output_path);
        if let Err(err) = write_running(&self.config.state_path) {
            tracing::warn!(%err, "failed to write state file");
        }
    }

    /// REPLACE the breakpoints of one file and rewrite the breakpoint file
    /// so it stays ground truth.
    pub fn set_breakpoints_for_file(&mut self, file: &str, lines: &[u32]) {
        self.ensure_init();
        self.breakpoints.replace_file(file, lines);
        if let Err(err) = write_list(&self.config.breakpoint_path, self.breakpoints.entries())
        {
            tracing::warn!(%err, "failed to rewrite breakpoint file");
        }
        // Our own write is not an external edit; don't reload over it.
        self.last_mtime = self.breakpoint_file_mtime();
    }

    /// The active entries, in insertion order.
    #[must_use]
    pub fn breakpoints(&self) -> &[Breakpoint] {
        self.breakpoints.entries()
    }

    /// Pending step state.
    #[must_use]
    pub fn step_mode(&self) -> StepMode {
        self.step
    }

    /// Arm a step externally (DAP front-ends drive stepping this way).
    pub fn set_step(&mut self, step: StepMode) {
        self.step = step;
    }

    /// Session file paths.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create the breakpoint file with an empty template if absent.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error.
    pub fn ensure_breakpoint_file(&mut self) -> io::Result<PathBuf> {
        let path = self.config.breakpoint_path.clone();
        if !path.exists() {
            fs::write(&path, LIST_TEMPLATE)?;
            self.last_mtime = self.breakpoint_file_mtime();
        }
        Ok(path)
    }

    fn breakpoint_file_mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.config.breakpoint_path).and_then(|m| m.modified()).ok()
    }

    fn poll_breakpoint_file(&mut self) {
        self.poll_counter += 1;
        if self.poll_counter < POLL_EVERY_N {
            return;
        }
        self.poll_counter = 0;
        let mtime = self.breakpoint_file_mtime();
        if mtime != self.last_mtime {
            self.last_mtime = mtime;
            self.reload_breakpoints();
        }
    }

    fn reload_breakpoints(&mut self) {
        let text = match fs::read_to_string(&self.config.breakpoint_path) {
            Ok(text) => text,
            Err(_) => {
                self.breakpoints.replace_all(Vec::new());
                return;
            }
        };
        match parse_list(&text) {
            Ok(entries) => {
                let dropped = self.breakpoints.replace_all(entries);
                if dropped > 0 {
                    eprintln!("stitch: breakpoint list truncated, {dropped} entries dropped");
                }
            }
            Err(err) => {
                tracing::debug!(%err, "breakpoint file unparseable, keeping previous set");
            }
        }
    }

    fn stopped_state(&self, hit: &HitContext<'_>) -> StoppedState {
        let variables = hit
            .names
            .iter()
            .zip(hit.values.iter())
            .map(|(name, value)| VariableLine {
                name: (*name).to_string(),
                type_name: value.type_label().into_owned(),
                summary: render(*value, SUMMARY_DEPTH, SUMMARY_BYTES, false),
            })
            .collect();
        StoppedState {
            file: hit.file.to_string(),
            line: hit.line,
            function: hit.function.to_string(),
            next_line: hit.next_line.map(str::to_string),
            variables,
        }
    }

    fn command_loop(&mut self, hit: &HitContext<'_>) {
        loop {
            for _ in 0..SPIN_TICK {
                std::hint::spin_loop();
            }
            let Some(command) = self.take_command() else {
                continue;
            };
            match command {
                Command::Continue => break,
                Command::Quit => {
                    let _ = fs::remove_file(&self.config.command_path);
                    let _ = fs::remove_file(&self.config.output_path);
                    let _ = write_running(&self.config.state_path);
                    std::process::exit(0);
                }
                Command::Step => {
                    self.step = StepMode::In;
                    break;
                }
                Command::Next => {
                    self.step = StepMode::Over { anchor: hit.file_hash };
                    break;
                }
                Command::Vars => self.write_output(&render_vars(hit)),
                Command::Query(expr) => self.write_output(&answer_query(hit, &expr)),
            }
        }
    }

    /// Read and consume one command. An empty or unreadable file is "no
    /// command yet" and is left in place for the idempotent retry.
    fn take_command(&self) -> Option<Command> {
        let text = fs::read_to_string(&self.config.command_path).ok()?;
        let command = Command::parse(&text)?;
        let _ = fs::remove_file(&self.config.command_path);
        Some(command)
    }

    fn write_output(&self, content: &str) {
        if let Err(err) = fs::write(&self.config.output_path, content) {
            tracing::warn!(%err, "failed to write output file");
        }
    }
}

fn render_vars(hit: &HitContext<'_>) -> String {
    let mut out = String::from("=== Variables ===\n");
    for (name, value) in hit.names.iter().zip(hit.values.iter()) {
        out.push_str(&format!(
            "{}: {} = {}\n",
            name,
            value.type_label(),
            render(*value, OUTPUT_DEPTH, OUTPUT_BYTES, true)
        ));
    }
    out
}

fn answer_query(hit: &HitContext<'_>, expr: &str) -> String {
    let (root, segments) = match parse_path(expr) {
        Ok(parsed) => parsed,
        Err(err) => return format!("{err}\n"),
    };
    let Some(position) = hit.names.iter().position(|name| *name == root) else {
        return format!("Unknown variable or command '{root}'\n");
    };
    let Some(value) = hit.values.get(position) else {
        return format!("Unknown variable or command '{root}'\n");
    };
    match resolve(*value, &segments) {
        Ok(resolved) => {
            // The header names the last field of the path (`player.hp` ->
            // `hp`), falling back to the whole expression.
            let shown = segments
                .iter()
                .rev()
                .find_map(|segment| match segment {
                    PathSegment::Field(name) => Some(name.as_str()),
                    _ => None,
                })
                .unwrap_or(expr);
            format!(
                "{}: {}\n{}\n",
                shown,
                resolved.type_label(),
                resolved.render(OUTPUT_DEPTH, OUTPUT_BYTES, true)
            )
        }
        Err(err) => format!("{err}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_protocol::file_hash;
    use stitch_test_support::must;

    fn session_in(dir: &std::path::Path) -> DebugSession {
        DebugSession::new(SessionConfig::in_dir(dir))
    }

    #[test]
    fn test_missing_breakpoint_file_is_empty_set() {
        let dir = must(tempfile::tempdir());
        let mut session = session_in(dir.path());
        assert!(!session.should_break(file_hash("main.rs"), 1));
        assert!(session.breakpoints().is_empty());
    }

    #[test]
    fn test_should_break_on_loaded_entry() {
        let dir = must(tempfile::tempdir());
        must(std::fs::write(
            dir.path().join("breakpoints.list"),
            "[ Breakpoint { file: \"src/main.rs\", line: 42 } ]\n",
        ));
        let mut session = session_in(dir.path());

        let hash = file_hash("/work/src/main.rs");
        assert!(session.should_break(hash, 42));
        assert!(!session.should_break(hash, 41));
        assert!(!session.should_break(file_hash("other.rs"), 42));
        assert_eq!(session.breakpoints()[0].hit_count, 1);
    }

    #[test]
    fn test_hot_swap_observed_within_poll_window() {
        let dir = must(tempfile::tempdir());
        let mut session = session_in(dir.path());
        let hash = file_hash("main.rs");

        // Initial load: no file, empty set.
        assert!(!session.should_break(hash, 42));

        // An editor writes a breakpoint while the program runs.
        must(std::fs::write(
            dir.path().join("breakpoints.list"),
            "[ Breakpoint { file: \"main.rs\", line: 42 } ]\n",
        ));

        let observed =
            (0..=POLL_EVERY_N).any(|_| session.should_break(hash, 42));
        assert!(observed, "new breakpoint not observed within POLL_EVERY_N calls");
    }

    #[test]
    fn test_unparseable_reload_keeps_previous_set() {
        let dir = must(tempfile::tempdir());
        let path = dir.path().join("breakpoints.list");
        must(std::fs::write(&path, "[ Breakpoint { file: \"main.rs\", line: 7 } ]\n"));
        let mut session = session_in(dir.path());
        let hash = file_hash("main.rs");
        assert!(session.should_break(hash, 7));

        // Corrupt the file; the poll must keep the old set.
        must(std::fs::write(&path, "[ Breakpoint { file: \"broken, line: 9 } ]\n"));
        let mut hit_again = false;
        for _ in 0..=POLL_EVERY_N {
            if session.should_break(hash, 7) {
                hit_again = true;
            }
        }
        assert!(hit_again);
    }

    #[test]
    fn test_step_modes_override_scan() {
        let dir = must(tempfile::tempdir());
        let mut session = session_in(dir.path());
        let here = file_hash("main.rs");
        let elsewhere = file_hash("util.rs");

        session.set_step(StepMode::In);
        assert!(session.should_break(elsewhere, 999));

        session.set_step(StepMode::Over { anchor: here });
        assert!(!session.should_break(elsewhere, 1));
        assert!(session.should_break(here, 1));
    }

    #[test]
    fn test_set_breakpoints_for_file_rewrites_list() {
        let dir = must(tempfile::tempdir());
        let mut session = session_in(dir.path());
        session.set_breakpoints_for_file("src/a.rs", &[3, 9]);

        let text = must(std::fs::read_to_string(dir.path().join("breakpoints.list")));
        assert!(text.contains("\"src/a.rs\", line: 3"));
        assert!(text.contains("\"src/a.rs\", line: 9"));

        // And the in-memory set matches.
        assert!(session.should_break(file_hash("src/a.rs"), 3));
    }

    #[test]
    fn test_ensure_breakpoint_file_writes_template_once() {
        let dir = must(tempfile::tempdir());
        let mut session = session_in(dir.path());
        let path = must(session.ensure_breakpoint_file());
        let template = must(std::fs::read_to_string(&path));
        assert!(template.starts_with("[\n"));

        // A second call leaves an edited file alone.
        must(std::fs::write(&path, "[ Breakpoint { file: \"x.rs\", line: 1 } ]\n"));
        must(session.ensure_breakpoint_file());
        assert!(must(std::fs::read_to_string(&path)).contains("x.rs"));
    }

    #[test]
    fn test_pause_on_start_arms_step() {
        let dir = must(tempfile::tempdir());
        let mut config = SessionConfig::in_dir(dir.path());
        config.pause_on_start = true;
        let mut session = DebugSession::new(config);
        assert!(session.should_break(file_hash("anything.rs"), 1));
    }

    #[test]
    fn test_query_answers() {
        let x = 41i32;
        let items = vec![10i32, 20, 30];
        let values: Vec<&dyn Inspect> = vec![&x, &items];
        let hit = HitContext {
            function: "main",
            file: "src/main.rs",
            file_hash: file_hash("src/main.rs"),
            line: 5,
            names: &["x", "items"],
            values: &values,
            next_line: None,
        };

        assert_eq!(answer_query(&hit, "x"), "x: i32\n41\n");
        assert_eq!(answer_query(&hit, "items[1]"), "items[1]: i32\n20\n");
        assert_eq!(
            answer_query(&hit, "nope"),
            "Unknown variable or command 'nope'\n"
        );
    }

    #[test]
    fn test_vars_table() {
        let x = 1u8;
        let values: Vec<&dyn Inspect> = vec![&x];
        let hit = HitContext {
            function: "f",
            file: "f.rs",
            file_hash: file_hash("f.rs"),
            line: 1,
            names: &["x"],
            values: &values,
            next_line: None,
        };
        let table = render_vars(&hit);
        assert!(table.starts_with("=== Variables ===\n"));
        assert!(table.contains("x: u8 = 1\n"));
    }
}
