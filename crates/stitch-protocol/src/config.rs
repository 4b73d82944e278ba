//! Session configuration: default file names and environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default breakpoint file name (editor-writeable, debuggee-polled).
pub const BREAKPOINT_FILE: &str = "breakpoints.list";
/// Default state file name (debuggee → UI).
pub const STATE_FILE: &str = "state.txt";
/// Default command file name (UI → debuggee).
pub const COMMAND_FILE: &str = "command.txt";
/// Default output file name (debuggee → UI, query responses).
pub const OUTPUT_FILE: &str = "output.txt";

/// Selects how the runtime reports hits: `terminal`, `dap`, or `silent`.
pub const ENV_DEBUG_MODE: &str = "STITCH_DEBUG_MODE";
/// Overrides the breakpoint-file path.
pub const ENV_BREAKPOINTS: &str = "STITCH_BREAKPOINTS";
/// `1` breaks on the first instrumented statement after startup.
pub const ENV_PAUSE_ON_START: &str = "STITCH_PAUSE_ON_START";

/// Runtime front-end mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    /// Human-readable stderr diagnostics on every hit
    #[default]
    Terminal,
    /// Quiet stderr; a DAP front-end owns the user-visible surface
    Dap,
    /// No diagnostics at all
    Silent,
}

impl DebugMode {
    fn from_env_value(value: &str) -> Self {
        match value.trim() {
            "dap" => Self::Dap,
            "silent" => Self::Silent,
            _ => Self::Terminal,
        }
    }
}

/// Paths and flags for one debug session.
///
/// All four rendezvous files default to the debuggee's working directory;
/// only the breakpoint file's location is overridable (the other three are
/// found by the UI relative to it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Diagnostic mode
    pub mode: DebugMode,
    /// Breakpoint file path
    pub breakpoint_path: PathBuf,
    /// State file path
    pub state_path: PathBuf,
    /// Command file path
    pub command_path: PathBuf,
    /// Output file path
    pub output_path: PathBuf,
    /// Break on the first instrumented statement
    pub pause_on_start: bool,
}

impl SessionConfig {
    /// Config with every file in `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            mode: DebugMode::Terminal,
            breakpoint_path: dir.join(BREAKPOINT_FILE),
            state_path: dir.join(STATE_FILE),
            command_path: dir.join(COMMAND_FILE),
            output_path: dir.join(OUTPUT_FILE),
            pause_on_start: false,
        }
    }

    /// Config from the process environment: working-directory defaults with
    /// `STITCH_*` overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::in_dir(Path::new("."));
        if let Ok(mode) = std::env::var(ENV_DEBUG_MODE) {
            config.mode = DebugMode::from_env_value(&mode);
        }
        if let Ok(path) = std::env::var(ENV_BREAKPOINTS) {
            if !path.trim().is_empty() {
                config.breakpoint_path = PathBuf::from(path);
            }
        }
        if let Ok(flag) = std::env::var(ENV_PAUSE_ON_START) {
            config.pause_on_start = flag.trim() == "1";
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_paths() {
        let config = SessionConfig::in_dir(Path::new("/tmp/work"));
        assert_eq!(config.breakpoint_path, Path::new("/tmp/work/breakpoints.list"));
        assert_eq!(config.state_path, Path::new("/tmp/work/state.txt"));
        assert_eq!(config.command_path, Path::new("/tmp/work/command.txt"));
        assert_eq!(config.output_path, Path::new("/tmp/work/output.txt"));
        assert_eq!(config.mode, DebugMode::Terminal);
        assert!(!config.pause_on_start);
    }

    #[test]
    fn test_mode_parsing_is_tolerant() {
        assert_eq!(DebugMode::from_env_value("dap"), DebugMode::Dap);
        assert_eq!(DebugMode::from_env_value(" silent "), DebugMode::Silent);
        assert_eq!(DebugMode::from_env_value("terminal"), DebugMode::Terminal);
        assert_eq!(DebugMode::from_env_value("nonsense"), DebugMode::Terminal);
    }
}
