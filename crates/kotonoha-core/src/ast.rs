//! The abstract syntax tree produced by [`crate::parser::Parser`].
//!
//! Two closed sum types, [`Expr`] and [`Stmt`] — a tagged enum per
//! syntactic category, each parent owning its children through `Box` —
//! rather than a two-tier interface/node split: a sum type is the
//! idiomatic Rust rendition of "one AST, one family per category."

use smallvec::SmallVec;

use crate::token::Position;

/// Argument lists, index chains, and parameter lists are almost always a
/// handful of elements, so inline storage for up to four elements avoids
/// a heap allocation for the overwhelming majority of calls and index
/// expressions.
pub type ExprList = SmallVec<[Expr; 4]>;
pub type ParamList = SmallVec<[String; 4]>;

/// The closed set of operators every `Prefix`/`Infix` expression carries.
/// `Assign` and its compound forms appear as an `Infix` operator rather
/// than a dedicated assignment node — the grammar treats `a = b` and
/// `a + b` the same way at the AST level, differing only in which
/// operator tag they carry and what the evaluator does with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Exponent,
    Modulus,

    Assign,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,

    Gt,
    Ge,
    Eq,
    NotEq,

    And,
    Or,
    Not,

    Range,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident {
        name: String,
        position: Position,
    },
    Integer {
        value: i64,
        position: Position,
    },
    Float {
        value: f64,
        position: Position,
    },
    Boolean {
        value: bool,
        position: Position,
    },
    Str {
        value: String,
        position: Position,
    },
    Array {
        elements: Vec<Expr>,
        position: Position,
    },
    /// `ident[i][j]…[k]` — indices are chained left to right; `ident` is
    /// always the base identifier being indexed, per §3's invariant that
    /// an index expression's target is an `Ident`.
    Index {
        ident: String,
        indices: ExprList,
        position: Position,
    },
    Prefix {
        op: OperatorKind,
        right: Box<Expr>,
        position: Position,
    },
    Infix {
        left: Box<Expr>,
        op: OperatorKind,
        right: Box<Expr>,
        position: Position,
    },
    Call {
        name: String,
        args: ExprList,
        position: Position,
    },
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Ident { position, .. }
            | Expr::Integer { position, .. }
            | Expr::Float { position, .. }
            | Expr::Boolean { position, .. }
            | Expr::Str { position, .. }
            | Expr::Array { position, .. }
            | Expr::Index { position, .. }
            | Expr::Prefix { position, .. }
            | Expr::Infix { position, .. }
            | Expr::Call { position, .. } => *position,
        }
    }
}

/// Position is diagnostic metadata, not semantic content (§3's
/// [EXPANSION] note): two expressions that differ only in *where* their
/// tokens sat in the source are the same expression, which is what
/// lets the comparison-canonicalisation property (§8 property 2) state
/// that `a < b` and `b > a` produce *equal* ASTs.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Ident { name: a, .. }, Expr::Ident { name: b, .. }) => a == b,
            (Expr::Integer { value: a, .. }, Expr::Integer { value: b, .. }) => a == b,
            (Expr::Float { value: a, .. }, Expr::Float { value: b, .. }) => a == b,
            (Expr::Boolean { value: a, .. }, Expr::Boolean { value: b, .. }) => a == b,
            (Expr::Str { value: a, .. }, Expr::Str { value: b, .. }) => a == b,
            (Expr::Array { elements: a, .. }, Expr::Array { elements: b, .. }) => a == b,
            (
                Expr::Index { ident: a_ident, indices: a_indices, .. },
                Expr::Index { ident: b_ident, indices: b_indices, .. },
            ) => a_ident == b_ident && a_indices == b_indices,
            (
                Expr::Prefix { op: a_op, right: a_right, .. },
                Expr::Prefix { op: b_op, right: b_right, .. },
            ) => a_op == b_op && a_right == b_right,
            (
                Expr::Infix { left: a_left, op: a_op, right: a_right, .. },
                Expr::Infix { left: b_left, op: b_op, right: b_right, .. },
            ) => a_left == b_left && a_op == b_op && a_right == b_right,
            (
                Expr::Call { name: a_name, args: a_args, .. },
                Expr::Call { name: b_name, args: b_args, .. },
            ) => a_name == b_name && a_args == b_args,
            _ => false,
        }
    }
}

/// `If`/`For`/`ForEach`/`Func` bodies (and `If`'s alternative) are always
/// a `Stmt::Block`; that invariant lives in the parser, which never
/// constructs these variants with anything else boxed inside.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Return {
        value: Expr,
        position: Position,
    },
    Block {
        statements: Vec<Stmt>,
        position: Position,
    },
    If {
        condition: Expr,
        consequence: Box<Stmt>,
        alternative: Option<Box<Stmt>>,
        position: Position,
    },
    For {
        condition: Expr,
        body: Box<Stmt>,
        position: Position,
    },
    ForEach {
        array: Expr,
        body: Box<Stmt>,
        position: Position,
    },
    Func {
        name: String,
        params: ParamList,
        body: Box<Stmt>,
        position: Position,
    },
}

/// An ordered sequence of top-level nodes; each is evaluated in turn and,
/// per §2, contributes at most one displayable value to the REPL/file
/// runner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub nodes: Vec<Stmt>,
}
