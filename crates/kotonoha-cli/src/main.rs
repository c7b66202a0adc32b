//! Process entry point: parses CLI arguments, wires up logging, and
//! dispatches to either file mode or the REPL (§6) — the thin
//! "external collaborators" surface this crate exists to provide around
//! the `kotonoha-core` engine.

mod args;
mod file;
mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = args::Args::parse();
    init_logging(args.verbose);

    let result = match args.path {
        Some(path) => file::run(&PathBuf::from(path)),
        None => repl::run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "operation failed");
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

/// A `tracing-subscriber` filter defaulting to `info`, raised to
/// `debug` by `-v`, writing to stderr so stdout stays reserved for the
/// language's own `表示` output and displayed values (§6/§7).
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
