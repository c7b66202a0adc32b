//! Runtime values.
//!
//! A single tagged union covering every value the evaluator can
//! produce, with `Display` implementing the language's own textual
//! rendition rather than Rust's debug form. Shared-mutable values (the
//! arrays) use plain `Rc<RefCell<_>>` for interior mutability — this
//! language has no `sync`/multi-threading feature matrix to support, so
//! there is only ever the one shape.

use std::fmt;
use std::rc::Rc;

use crate::ast::{ParamList, Stmt};
use crate::token::Position;

/// Native functions receive the already-evaluated argument list plus the
/// position of the call expression that invoked them, so a built-in can
/// report its own errors with a location the way every other runtime
/// error does.
pub type NativeFn = fn(&[Object], Position) -> Object;

/// A runtime error: an informal category message (§7 — runtime error
/// categories are informal, unlike the parser's closed
/// `SyntaxErrorKind`) plus the position it was raised at, mirroring
/// `SyntaxError`'s own message+position pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
    pub position: Position,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error:{} ({})", self.message, self.position)
    }
}

impl std::error::Error for RuntimeError {}

/// A user-defined function: its parameter names and its body, shared via
/// `Rc` so binding a `Function` value into many scopes (e.g. passing it
/// around, or simply looking it up repeatedly) never clones the AST.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub params: ParamList,
    pub body: Rc<Stmt>,
}

impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.params == other.params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Shared-mutable: every clone of this value aliases the same
    /// backing vector, which is how `追加(b, 4)` is visible through a
    /// second binding `b = a` (§8 property 5).
    Array(Rc<std::cell::RefCell<Vec<Object>>>),
    Null,
    /// A terminal value. Once produced it is never "unwrapped" — it is
    /// propagated as-is until something prints it or the program ends.
    Error(RuntimeError),
    /// Transport wrapper for an early `戻す`; unwrapped exactly once, at
    /// the call site that invoked the function body currently
    /// returning.
    ReturnValue(Box<Object>),
    Function(Rc<FunctionValue>),
    /// A built-in resolved as a bare identifier rather than called
    /// outright — e.g. `表示` referenced without `(...)`. The name is
    /// carried alongside the function pointer purely for `Display`;
    /// calls still resolve built-ins by name first (§4.3), this variant
    /// only matters when one is looked up as a value.
    Builtin(&'static str, NativeFn),
}

impl Object {
    pub fn array_of(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(std::cell::RefCell::new(elements)))
    }

    /// Boolean true, non-zero Integer, or anything other than `Null` —
    /// the "truthy" rule `if`/ternary-like constructs test against.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Boolean(b) => *b,
            Object::Integer(n) => *n != 0,
            Object::Null => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "Integer",
            Object::Float(_) => "Float",
            Object::Boolean(_) => "Boolean",
            Object::String(_) => "String",
            Object::Array(_) => "Array",
            Object::Null => "Null",
            Object::Error(_) => "Error",
            Object::ReturnValue(_) => "ReturnValue",
            Object::Function(_) => "Function",
            Object::Builtin(_, _) => "Builtin",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{n}"),
            Object::Float(n) => write!(f, "{n}"),
            Object::Boolean(b) => write!(f, "{b}"),
            Object::String(s) => write!(f, "{s}"),
            Object::Array(elements) => {
                write!(f, "{{")?;
                let elements = elements.borrow();
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "}}")
            }
            Object::Null => write!(f, "null"),
            Object::Error(error) => write!(f, "{error}"),
            Object::ReturnValue(inner) => write!(f, "{inner}"),
            Object::Function(function) => {
                write!(f, "関数({})", function.params.join(","))
            }
            Object::Builtin(name, _) => write!(f, "組み込み({name})"),
        }
    }
}
