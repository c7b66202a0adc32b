//! Kotonoha (言の葉) — a small interpreted language whose entire lexical
//! surface is expressed in Japanese as well as ASCII, with wide and narrow
//! glyph forms treated as equivalent.
//!
//! This crate is the *core*: a lexer that normalises half/full-width and
//! Japanese keyword spellings into a uniform token stream, a
//! recursive-descent parser that produces a tagged AST, and a tree-walking
//! evaluator with caller-enclosed (not declaration-site) function scopes,
//! first-class arrays and a small fixed set of built-ins.
//!
//! The interactive shell, file reader and process entry point live in the
//! sibling `kotonoha-cli` crate; this crate only exposes the pipeline they
//! drive.

mod ast;
mod engine;
mod error_parsing;
mod lexer;
mod object;
mod parser;
mod scope;
mod token;

pub use ast::{Expr, OperatorKind, Program, Stmt};
pub use engine::Engine;
pub use error_parsing::{SyntaxError, SyntaxErrorKind};
pub use lexer::Lexer;
pub use object::{Object, RuntimeError};
pub use parser::Parser;
pub use scope::Environment;
pub use token::{Position, Token, TokenKind};

/// Lex and parse `source`, handing back the [`Program`] and any
/// accumulated [`SyntaxError`]s. This is the shared front half of the
/// pipeline; callers (the REPL, the file reader, tests) decide what to do
/// with a non-empty error list — the REPL category-filters to decide
/// whether to keep accumulating lines (§6), the file reader always stops.
pub fn lex_and_parse(source: &str) -> (Program, Vec<SyntaxError>) {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse_program()
}

/// Evaluate every top-level node of `program` against `env` in order,
/// stopping at the first runtime [`Object::Error`] (file-mode semantics,
/// §7). Returns the display form of every non-`Null` value produced,
/// together with the error that stopped evaluation, if any.
pub fn eval_program(program: &Program, env: &Environment) -> (Vec<String>, Option<RuntimeError>) {
    let engine = Engine::new();
    let mut out = Vec::new();
    for node in &program.nodes {
        match engine.eval_stmt(node, env) {
            Object::Null => {}
            Object::Error(error) => return (out, Some(error)),
            value => out.push(value.to_string()),
        }
    }
    (out, None)
}
