//! End-to-end rendezvous tests: a session pauses in one thread while a
//! scripted "UI" thread drives it through the command file, exactly the way
//! an external front-end would.

#![allow(clippy::panic)]

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use stitch_inspect::Inspect;
use stitch_protocol::{SessionConfig, file_hash};
use stitch_runtime::{DebugSession, HitContext, StepMode};
use stitch_test_support::must;

const UI_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait until `path` exists with non-empty content, then read it.
fn wait_for_file(path: &Path) -> String {
    let deadline = Instant::now() + UI_TIMEOUT;
    while Instant::now() < deadline {
        if let Ok(text) = std::fs::read_to_string(path) {
            if !text.is_empty() {
                return text;
            }
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {}", path.display());
}

/// Wait until the state file reports the given status.
fn wait_for_status(state_path: &Path, status: &str) {
    let deadline = Instant::now() + UI_TIMEOUT;
    let want = format!("status={status}");
    while Instant::now() < deadline {
        if let Ok(text) = std::fs::read_to_string(state_path) {
            if text.starts_with(&want) {
                return;
            }
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for status={status}");
}

fn write_command(dir: &Path, command: &str) {
    must(std::fs::write(dir.join("command.txt"), command));
}

struct Paths {
    dir: PathBuf,
    state: PathBuf,
    output: PathBuf,
}

fn paths(dir: &Path) -> Paths {
    Paths {
        dir: dir.to_path_buf(),
        state: dir.join("state.txt"),
        output: dir.join("output.txt"),
    }
}

fn pause_with_sample_scope(session: &mut DebugSession, next_line: Option<&str>) {
    let x = 41i32;
    let name = "z";
    let items = vec![1i32, 2, 3];
    let values: Vec<&dyn Inspect> = vec![&x, &name, &items];
    session.pause(&HitContext {
        function: "main",
        file: "src/main.rs",
        file_hash: file_hash("src/main.rs"),
        line: 42,
        names: &["x", "name", "items"],
        values: &values,
        next_line,
    });
}

#[test]
fn test_pause_writes_state_and_continue_resumes() {
    let tmp = must(tempfile::tempdir());
    let p = paths(tmp.path());

    let ui = {
        let p = paths(tmp.path());
        thread::spawn(move || {
            wait_for_status(&p.state, "stopped");
            let state = must(std::fs::read_to_string(&p.state));
            write_command(&p.dir, "continue");
            state
        })
    };

    let mut session = DebugSession::new(SessionConfig::in_dir(tmp.path()));
    pause_with_sample_scope(&mut session, None);

    let stopped = must(ui.join());
    assert!(stopped.contains("file=src/main.rs\n"));
    assert!(stopped.contains("line=42\n"));
    assert!(stopped.contains("function=main\n"));
    assert!(stopped.contains("  x: i32 = 41\n"));
    assert!(stopped.contains("  name: &str = \"z\"\n"));

    // Resumed: state says running, command and output files are gone.
    assert_eq!(must(std::fs::read_to_string(&p.state)), "status=running\n");
    assert!(!p.dir.join("command.txt").exists());
    assert!(!p.output.exists());
    assert_eq!(session.step_mode(), StepMode::None);
}

#[test]
fn test_vars_command_writes_output_table() {
    let tmp = must(tempfile::tempdir());

    let ui = {
        let p = paths(tmp.path());
        thread::spawn(move || {
            wait_for_status(&p.state, "stopped");
            write_command(&p.dir, "vars");
            let table = wait_for_file(&p.output);
            write_command(&p.dir, "c");
            table
        })
    };

    let mut session = DebugSession::new(SessionConfig::in_dir(tmp.path()));
    pause_with_sample_scope(&mut session, None);

    let table = must(ui.join());
    assert!(table.starts_with("=== Variables ===\n"));
    assert!(table.contains("x: i32 = 41\n"));
    assert!(table.contains("items: Vec<i32> = [](3 items)"));
}

#[test]
fn test_field_path_query_round_trip() {
    let tmp = must(tempfile::tempdir());

    let ui = {
        let p = paths(tmp.path());
        thread::spawn(move || {
            wait_for_status(&p.state, "stopped");
            write_command(&p.dir, "items[1]");
            let first = wait_for_file(&p.output);
            write_command(&p.dir, "bogus");
            let deadline = Instant::now() + UI_TIMEOUT;
            let second = loop {
                let text = wait_for_file(&p.output);
                if text != first {
                    break text;
                }
                assert!(Instant::now() < deadline, "second answer never arrived");
                thread::sleep(Duration::from_millis(5));
            };
            write_command(&p.dir, "continue");
            (first, second)
        })
    };

    let mut session = DebugSession::new(SessionConfig::in_dir(tmp.path()));
    pause_with_sample_scope(&mut session, None);

    let (first, second) = must(ui.join());
    assert_eq!(first, "items[1]: i32\n2\n");
    assert_eq!(second, "Unknown variable or command 'bogus'\n");
}

#[test]
fn test_step_over_anchors_to_issuing_file() {
    let tmp = must(tempfile::tempdir());

    let ui = {
        let p = paths(tmp.path());
        thread::spawn(move || {
            wait_for_status(&p.state, "stopped");
            write_command(&p.dir, "next");
        })
    };

    let mut session = DebugSession::new(SessionConfig::in_dir(tmp.path()));
    pause_with_sample_scope(&mut session, None);
    must(ui.join());

    let here = file_hash("src/main.rs");
    assert_eq!(session.step_mode(), StepMode::Over { anchor: here });
    assert!(session.should_break(here, 999));
    assert!(!session.should_break(file_hash("src/other.rs"), 999));
}

#[test]
fn test_step_pause_records_next_line() {
    let tmp = must(tempfile::tempdir());

    let ui = {
        let p = paths(tmp.path());
        thread::spawn(move || {
            wait_for_status(&p.state, "stopped");
            let state = must(std::fs::read_to_string(&p.state));
            write_command(&p.dir, "s");
            state
        })
    };

    let mut session = DebugSession::new(SessionConfig::in_dir(tmp.path()));
    pause_with_sample_scope(&mut session, Some("x = x + 1;"));

    let stopped = must(ui.join());
    assert!(stopped.contains("next=x = x + 1;\n"));
    assert_eq!(session.step_mode(), StepMode::In);
    // A step-in fires on any file.
    assert!(session.should_break(file_hash("elsewhere.rs"), 1));
}
