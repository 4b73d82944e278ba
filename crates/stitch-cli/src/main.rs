//! Transformer entry point.
//!
//! The build system invokes this once per source file; the one-line stderr
//! summary is the whole reporting contract. Exit codes: 0 for success
//! (including pass-through), 2 for usage errors, non-zero for
//! unrecoverable I/O.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use stitch_transform::{DEFAULT_RUNTIME_PATH, Outcome, TransformOptions, transform};
use tracing_subscriber::{EnvFilter, fmt};

/// Instrumenting source transformer for the stitch debugger
#[derive(Parser, Debug)]
#[command(name = "stitch", version, about, long_about = None)]
struct Args {
    /// Source file to transform
    input: PathBuf,

    /// Where to write the transformed file
    output: PathBuf,

    /// Instrument every candidate statement, not just breakpoint markers
    #[arg(long)]
    step: bool,

    /// Import path of the debug runtime for the injected header
    #[arg(long, value_name = "PATH", default_value = DEFAULT_RUNTIME_PATH)]
    runtime_path: String,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let options = TransformOptions {
        step_mode: args.step,
        runtime_path: args.runtime_path.clone(),
    };
    tracing::debug!(input = %args.input.display(), step = options.step_mode, "transforming");
    let summary = transform(&args.input, &args.output, &options)?;

    let input = args.input.display();
    let output = args.output.display();
    match summary.outcome {
        Outcome::Instrumented => eprintln!(
            "Preprocessed {input} -> {output} ({} edits, {} globals)",
            summary.edits, summary.globals
        ),
        Outcome::NoDebugNeeded => {
            eprintln!("Preprocessed {input} -> {output} (no debug needed)");
        }
        Outcome::ParseErrorPassThrough => {
            eprintln!("Preprocessed {input} -> {output} (parse errors, passed through)");
        }
        Outcome::BuildFileRewrite => eprintln!(
            "Preprocessed {input} -> {output} ({} path rewrites)",
            summary.edits
        ),
    }
    Ok(())
}
