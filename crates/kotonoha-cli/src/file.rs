//! File mode: read a whole source file and drive the lex → parse →
//! evaluate pipeline once, with no partial execution on a syntax error
//! (§6).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kotonoha_core::{eval_program, lex_and_parse, Environment};

/// Reads `path` as UTF-8, parses it, and either prints every parse error
/// and returns (stopping the run, per §6's "no partial execution") or
/// evaluates the program top to bottom, printing each non-`Null`
/// top-level value and halting at the first runtime error (§7).
pub fn run(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "read source file");

    let (program, errors) = lex_and_parse(&source);
    if !errors.is_empty() {
        for error in &errors {
            tracing::warn!(%error, "syntax error");
            println!("{error}");
        }
        return Ok(());
    }

    let env = Environment::new_global();
    let (output, runtime_error) = eval_program(&program, &env);
    for line in output {
        println!("{line}");
    }
    if let Some(error) = runtime_error {
        // Converted to `anyhow::Error` purely for structured logging —
        // a language-level runtime error is not a host I/O failure, so
        // it is printed here rather than bubbled through `?` to `main`,
        // which would flip the process exit code (§6).
        let error = anyhow::Error::new(error);
        tracing::warn!(error = %error, "runtime error");
        println!("{error}");
    }
    Ok(())
}
