//! The interactive shell: accumulates input lines into a buffer, lexes
//! and parses the whole buffer after every line, and decides whether to
//! keep reading (a `Missing*` syntax error awaiting continuation, §6) or
//! to flush — printing accumulated syntax errors, or evaluating and
//! printing each top-level node's display form.
//!
//! `>>`/`...`-style prompts; `rustyline` is the line-editing crate
//! reached for here rather than hand-rolling `stdin` line reading.

use kotonoha_core::{eval_program, lex_and_parse, Environment};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = "... ";

pub fn run() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let env = Environment::new_global();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT };
        match editor.readline(prompt) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                process_buffer(&mut buffer, &env);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => {
                tracing::warn!(%error, "readline failed");
                break;
            }
        }
    }
    Ok(())
}

/// Lexes and parses the current buffer. If any accumulated error awaits
/// continuation (an unbalanced `)`, `}`, or `]`), the buffer is left
/// intact for the next line; otherwise the buffer is flushed — errors
/// are printed, or the program is evaluated and each non-`Null` result
/// printed — and cleared.
fn process_buffer(buffer: &mut String, env: &Environment) {
    let (program, errors) = lex_and_parse(buffer);

    if errors.iter().any(|error| error.kind.awaits_continuation()) {
        return;
    }

    if !errors.is_empty() {
        for error in &errors {
            tracing::warn!(%error, "syntax error");
            println!("{error}");
        }
        buffer.clear();
        return;
    }

    let (output, runtime_error) = eval_program(&program, env);
    for line in output {
        println!("{line}");
    }
    if let Some(error) = runtime_error {
        // As in file mode: wrap in `anyhow::Error` for logging only — a
        // bad line should not end the REPL session or its exit code.
        let error = anyhow::Error::new(error);
        tracing::warn!(error = %error, "runtime error");
        println!("{error}");
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_brace_keeps_accumulating() {
        let mut buffer = "もし 真 ならば { a = 1".to_string();
        let env = Environment::new_global();
        process_buffer(&mut buffer, &env);
        assert!(!buffer.is_empty(), "buffer should not be flushed while a brace is unbalanced");
    }

    #[test]
    fn balanced_input_flushes_the_buffer() {
        let mut buffer = "5 + 5".to_string();
        let env = Environment::new_global();
        process_buffer(&mut buffer, &env);
        assert!(buffer.is_empty());
    }
}
