//! Command-line surface.
//!
//! A single optional positional path argument plus a couple of ambient
//! flags, via a `clap` derive struct with `--verbose` wired to the
//! logging setup — scaled down to this front-end's one-argument
//! contract (§6): no subcommands, since there is exactly one operation
//! (run, either from a file or the REPL).

use clap::Parser;

#[derive(Parser)]
#[command(name = "kotonoha", version, about = "A small interpreter whose lexical surface is Japanese as well as ASCII")]
pub struct Args {
    /// Path to a Kotonoha source file. With no path, starts the REPL.
    pub path: Option<String>,

    /// Raise the tracing log level to debug.
    #[arg(short, long)]
    pub verbose: bool,
}
