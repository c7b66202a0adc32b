//! The tree-walking evaluator.
//!
//! One function per AST node category (`eval_expr`, `eval_stmt`),
//! dispatching by `match` rather than a visitor trait, each returning a
//! single runtime value rather than a `Result` — here that value is
//! [`Object`] directly, with [`Object::Error`] itself serving as the
//! short-circuit channel (§3). A dedicated Rust error type would fight
//! the language's own error model, where `Error` is an ordinary
//! first-class value that prints, propagates, and composes through
//! blocks exactly like any other `Object`. Every [`Object::Error`] still
//! carries a [`RuntimeError`] (message + position), the same way a
//! `SyntaxError` does, so user-visible diagnostics can point at source.

use smallvec::SmallVec;

use crate::ast::{Expr, OperatorKind, Stmt};
use crate::builtins;
use crate::object::{FunctionValue, Object, RuntimeError};
use crate::scope::Environment;
use crate::token::Position;
use std::rc::Rc;

/// Evaluated call argument accumulation — almost every call passes few
/// enough arguments that this never spills to the heap.
type ArgValues = SmallVec<[Object; 4]>;

/// Indexed-assignment index values, each paired with the position of the
/// index expression that produced it — so the offending bracket in a
/// chain of several can be blamed precisely.
type IndexValues = SmallVec<[(Object, Position); 4]>;

pub struct Engine;

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_stmt(&self, stmt: &Stmt, env: &Environment) -> Object {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, env),

            Stmt::Return { value, .. } => match self.eval_expr(value, env) {
                error @ Object::Error(_) => error,
                value => Object::ReturnValue(Box::new(value)),
            },

            Stmt::Block { statements, .. } => {
                let inner = Environment::new_enclosed(env);
                self.eval_block(statements, &inner)
            }

            Stmt::If { condition, consequence, alternative, .. } => {
                let condition = self.eval_expr(condition, env);
                if matches!(condition, Object::Error(_)) {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_stmt(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_stmt(alternative, env)
                } else {
                    Object::Null
                }
            }

            Stmt::For { condition, body, .. } => loop {
                let cond = self.eval_expr(condition, env);
                if matches!(cond, Object::Error(_)) {
                    return cond;
                }
                if !cond.is_truthy() {
                    return Object::Null;
                }
                match self.eval_stmt(body, env) {
                    result @ (Object::Error(_) | Object::ReturnValue(_)) => return result,
                    _ => {}
                }
            },

            Stmt::ForEach { array, body, position } => {
                let array = self.eval_expr(array, env);
                let elements = match array {
                    Object::Array(elements) => elements,
                    error @ Object::Error(_) => return error,
                    other => {
                        return Object::Error(RuntimeError::new(
                            format!("それぞれ繰り返す: expected an Array, found {}", other.type_name()),
                            *position,
                        ))
                    }
                };
                let len = elements.borrow().len();
                for index in 0..len {
                    let element = elements.borrow()[index].clone();
                    let iteration = Environment::new_enclosed(env);
                    iteration.set_current("添字", Object::Integer(index as i64));
                    iteration.set_current("要素", element);
                    match self.eval_stmt(body, &iteration) {
                        result @ (Object::Error(_) | Object::ReturnValue(_)) => return result,
                        _ => {}
                    }
                }
                Object::Null
            }

            Stmt::Func { name, params, body, .. } => {
                let function = Object::Function(Rc::new(FunctionValue {
                    params: params.clone(),
                    body: Rc::new((**body).clone()),
                }));
                env.set_current(name, function);
                Object::Null
            }
        }
    }

    /// Evaluates each statement in order; stops at the first `Error` or
    /// `ReturnValue`, which becomes the block's own result (§4.3).
    fn eval_block(&self, statements: &[Stmt], env: &Environment) -> Object {
        for statement in statements {
            match self.eval_stmt(statement, env) {
                result @ (Object::Error(_) | Object::ReturnValue(_)) => return result,
                _ => {}
            }
        }
        Object::Null
    }

    fn eval_expr(&self, expr: &Expr, env: &Environment) -> Object {
        match expr {
            Expr::Ident { name, position } => env.get(name).unwrap_or_else(|| match builtins::lookup_named(name) {
                Some((builtin_name, native)) => Object::Builtin(builtin_name, native),
                None => Object::Error(RuntimeError::new(format!("undeclared identifier {name}"), *position)),
            }),
            Expr::Integer { value, .. } => Object::Integer(*value),
            Expr::Float { value, .. } => Object::Float(*value),
            Expr::Boolean { value, .. } => Object::Boolean(*value),
            Expr::Str { value, .. } => Object::String(value.clone()),

            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    match self.eval_expr(element, env) {
                        error @ Object::Error(_) => return error,
                        value => values.push(value),
                    }
                }
                Object::array_of(values)
            }

            Expr::Index { ident, indices, position } => self.eval_index(ident, indices, env, *position),

            Expr::Prefix { op, right, position } => self.eval_prefix(*op, right, env, *position),

            Expr::Infix { left, op, right, position } => self.eval_infix(left, *op, right, env, *position),

            Expr::Call { name, args, position } => self.eval_call(name, args, env, *position),
        }
    }

    fn eval_index(&self, ident: &str, indices: &[Expr], env: &Environment, position: Position) -> Object {
        let mut current = match env.get(ident) {
            Some(value) => value,
            None => return Object::Error(RuntimeError::new(format!("undeclared identifier {ident}"), position)),
        };
        for index_expr in indices {
            let index_position = index_expr.position();
            let index = match self.eval_expr(index_expr, env) {
                error @ Object::Error(_) => return error,
                Object::Integer(n) => n,
                other => {
                    return Object::Error(RuntimeError::new(
                        format!("index must be an Integer, found {}", other.type_name()),
                        index_position,
                    ))
                }
            };
            current = match current {
                Object::Array(elements) => {
                    let elements = elements.borrow();
                    if index < 0 || index as usize >= elements.len() {
                        return Object::Error(RuntimeError::new(format!("index {index} out of range"), index_position));
                    }
                    elements[index as usize].clone()
                }
                other => {
                    return Object::Error(RuntimeError::new(
                        format!("cannot index into {}", other.type_name()),
                        index_position,
                    ))
                }
            };
        }
        current
    }

    fn eval_prefix(&self, op: OperatorKind, right: &Expr, env: &Environment, position: Position) -> Object {
        let value = self.eval_expr(right, env);
        match (op, value) {
            (_, error @ Object::Error(_)) => error,
            (OperatorKind::Add, Object::Integer(n)) => Object::Integer(n),
            (OperatorKind::Add, Object::Float(n)) => Object::Float(n),
            (OperatorKind::Sub, Object::Integer(n)) => Object::Integer(-n),
            (OperatorKind::Sub, Object::Float(n)) => Object::Float(-n),
            (OperatorKind::Not, Object::Boolean(b)) => Object::Boolean(!b),
            (op, value) => Object::Error(RuntimeError::new(
                format!("unary {op:?} not supported for {}", value.type_name()),
                position,
            )),
        }
    }

    fn eval_infix(&self, left: &Expr, op: OperatorKind, right: &Expr, env: &Environment, position: Position) -> Object {
        use OperatorKind::*;
        match op {
            Assign | PlusAssign | MinusAssign | AsteriskAssign | SlashAssign => {
                self.eval_assignment(left, op, right, env, position)
            }
            Range => {
                let lval = self.eval_expr(left, env);
                if matches!(lval, Object::Error(_)) {
                    return lval;
                }
                let rval = self.eval_expr(right, env);
                if matches!(rval, Object::Error(_)) {
                    return rval;
                }
                match (lval, rval) {
                    (Object::Integer(a), Object::Integer(b)) => {
                        let elements = if a < b { (a..b).map(Object::Integer).collect() } else { Vec::new() };
                        Object::array_of(elements)
                    }
                    (l, r) => Object::Error(RuntimeError::new(
                        format!("〜: expected Integer operands, found {} and {}", l.type_name(), r.type_name()),
                        position,
                    )),
                }
            }
            _ => {
                // Left-to-right evaluation order (§5) — faithfully
                // reproduces the comparison-swap quirk noted in §9:
                // since `<`/`<=` are canonicalised to a swapped `>`/`>=`
                // at parse time, `f() < g()` evaluates `g()` (the new
                // left operand) before `f()`.
                let lval = self.eval_expr(left, env);
                if matches!(lval, Object::Error(_)) {
                    return lval;
                }
                let rval = self.eval_expr(right, env);
                if matches!(rval, Object::Error(_)) {
                    return rval;
                }
                self.eval_infix_values(op, lval, rval, position)
            }
        }
    }

    fn eval_infix_values(&self, op: OperatorKind, lval: Object, rval: Object, position: Position) -> Object {
        use OperatorKind::*;
        match op {
            Add | Sub | Mul | Div | Exponent | Modulus => eval_arithmetic(op, lval, rval, position),
            Gt | Ge | Eq | NotEq => eval_comparison(op, lval, rval, position),
            And | Or => eval_logical(op, lval, rval, position),
            Assign | PlusAssign | MinusAssign | AsteriskAssign | SlashAssign | Range | Not => {
                unreachable!("handled in eval_infix at {position}")
            }
        }
    }

    fn eval_assignment(&self, left: &Expr, op: OperatorKind, right: &Expr, env: &Environment, position: Position) -> Object {
        let rval = self.eval_expr(right, env);
        if matches!(rval, Object::Error(_)) {
            return rval;
        }

        match left {
            Expr::Ident { name, .. } => {
                let new_value = if op == OperatorKind::Assign {
                    rval
                } else {
                    let current = match env.get(name) {
                        Some(value) => value,
                        None => return Object::Error(RuntimeError::new(format!("undeclared identifier {name}"), position)),
                    };
                    let combined = eval_arithmetic(compound_to_arithmetic(op), current, rval, position);
                    if matches!(combined, Object::Error(_)) {
                        return combined;
                    }
                    combined
                };
                env.set(name, new_value.clone());
                new_value
            }

            Expr::Index { ident, indices, .. } => {
                if op != OperatorKind::Assign {
                    return Object::Error(RuntimeError::new(
                        "compound assignment target must be an identifier, not an indexed expression",
                        position,
                    ));
                }
                let target = match env.get(ident) {
                    Some(value) => value,
                    None => return Object::Error(RuntimeError::new(format!("undeclared identifier {ident}"), position)),
                };
                self.assign_indexed(target, indices, rval, env)
            }

            other => Object::Error(RuntimeError::new(format!("cannot assign to {other:?}"), position)),
        }
    }

    fn assign_indexed(&self, mut current: Object, indices: &[Expr], rval: Object, env: &Environment) -> Object {
        let mut index_values: IndexValues = SmallVec::with_capacity(indices.len());
        for index_expr in indices {
            match self.eval_expr(index_expr, env) {
                error @ Object::Error(_) => return error,
                value => index_values.push((value, index_expr.position())),
            }
        }
        let (last, leading) = index_values.split_last().expect("IndexExpr has a non-empty indices list");

        for (index, index_position) in leading {
            let i = match index {
                Object::Integer(n) => *n,
                other => {
                    return Object::Error(RuntimeError::new(
                        format!("index must be an Integer, found {}", other.type_name()),
                        *index_position,
                    ))
                }
            };
            current = match current {
                Object::Array(elements) => {
                    let elements = elements.borrow();
                    if i < 0 || i as usize >= elements.len() {
                        return Object::Error(RuntimeError::new(format!("index {i} out of range"), *index_position));
                    }
                    elements[i as usize].clone()
                }
                other => {
                    return Object::Error(RuntimeError::new(
                        format!("cannot index into {}", other.type_name()),
                        *index_position,
                    ))
                }
            };
        }

        let (last_value, last_position) = last;
        let i = match last_value {
            Object::Integer(n) => *n,
            other => {
                return Object::Error(RuntimeError::new(
                    format!("index must be an Integer, found {}", other.type_name()),
                    *last_position,
                ))
            }
        };
        match current {
            Object::Array(elements) => {
                let mut elements = elements.borrow_mut();
                if i < 0 || i as usize >= elements.len() {
                    return Object::Error(RuntimeError::new(format!("index {i} out of range"), *last_position));
                }
                elements[i as usize] = rval.clone();
                rval
            }
            other => Object::Error(RuntimeError::new(format!("cannot index into {}", other.type_name()), *last_position)),
        }
    }

    fn eval_call(&self, name: &str, args: &[Expr], env: &Environment, position: Position) -> Object {
        let mut values: ArgValues = SmallVec::with_capacity(args.len());
        for arg in args {
            match self.eval_expr(arg, env) {
                error @ Object::Error(_) => return error,
                value => values.push(value),
            }
        }

        if let Some(native) = builtins::lookup(name) {
            return native(&values, position);
        }

        match env.get(name) {
            Some(Object::Function(function)) => self.call_function(name, &function, values, env, position),
            Some(Object::Builtin(_, native)) => native(&values, position),
            Some(other) => Object::Error(RuntimeError::new(
                format!("{name}: {} is not callable", other.type_name()),
                position,
            )),
            None => Object::Error(RuntimeError::new(format!("undefined function {name}"), position)),
        }
    }

    /// Creates a fresh scope enclosing the *caller's* scope — not the
    /// scope the function was declared in — per the caller-enclosed
    /// call semantics this language resolves its closure/dynamic-scope
    /// open question to (see `DESIGN.md`).
    fn call_function(
        &self,
        name: &str,
        function: &FunctionValue,
        values: ArgValues,
        env: &Environment,
        position: Position,
    ) -> Object {
        if function.params.len() != values.len() {
            return Object::Error(RuntimeError::new(
                format!(
                    "{name}: expected {} argument(s), found {}",
                    function.params.len(),
                    values.len()
                ),
                position,
            ));
        }
        let call_scope = Environment::new_enclosed(env);
        for (param, value) in function.params.iter().zip(values) {
            // Duplicate parameter names shadow silently: later binding
            // wins because `set_current` simply overwrites (§9).
            call_scope.set_current(param, value);
        }
        match self.eval_stmt(&function.body, &call_scope) {
            Object::ReturnValue(inner) => *inner,
            result @ Object::Error(_) => result,
            _ => Object::Null,
        }
    }
}

fn compound_to_arithmetic(op: OperatorKind) -> OperatorKind {
    match op {
        OperatorKind::PlusAssign => OperatorKind::Add,
        OperatorKind::MinusAssign => OperatorKind::Sub,
        OperatorKind::AsteriskAssign => OperatorKind::Mul,
        OperatorKind::SlashAssign => OperatorKind::Div,
        other => unreachable!("{other:?} is not a compound assignment operator"),
    }
}

fn eval_arithmetic(op: OperatorKind, lval: Object, rval: Object, position: Position) -> Object {
    match (lval, rval) {
        (Object::Integer(a), Object::Integer(b)) => match op {
            OperatorKind::Add => Object::Integer(a.wrapping_add(b)),
            OperatorKind::Sub => Object::Integer(a.wrapping_sub(b)),
            OperatorKind::Mul => Object::Integer(a.wrapping_mul(b)),
            OperatorKind::Div if b == 0 => Object::Error(RuntimeError::new("division by zero", position)),
            OperatorKind::Div => Object::Integer(a / b),
            // Floating-point pow, truncated back to i64, per §4.3.
            OperatorKind::Exponent => Object::Integer((a as f64).powf(b as f64) as i64),
            OperatorKind::Modulus if b == 0 => Object::Error(RuntimeError::new("division by zero", position)),
            OperatorKind::Modulus => Object::Integer(a % b),
            other => unreachable!("{other:?} is not an arithmetic operator"),
        },
        (Object::Float(a), Object::Float(b)) => match op {
            OperatorKind::Add => Object::Float(a + b),
            OperatorKind::Sub => Object::Float(a - b),
            OperatorKind::Mul => Object::Float(a * b),
            OperatorKind::Div => Object::Float(a / b),
            OperatorKind::Exponent => Object::Float(a.powf(b)),
            OperatorKind::Modulus => Object::Float(a % b),
            other => unreachable!("{other:?} is not an arithmetic operator"),
        },
        (l, r) => Object::Error(RuntimeError::new(
            format!("arithmetic not supported between {} and {}", l.type_name(), r.type_name()),
            position,
        )),
    }
}

fn eval_comparison(op: OperatorKind, lval: Object, rval: Object, position: Position) -> Object {
    match (op, lval, rval) {
        (OperatorKind::Gt, Object::Integer(a), Object::Integer(b)) => Object::Boolean(a > b),
        (OperatorKind::Ge, Object::Integer(a), Object::Integer(b)) => Object::Boolean(a >= b),
        (OperatorKind::Eq, Object::Integer(a), Object::Integer(b)) => Object::Boolean(a == b),
        (OperatorKind::Eq, Object::Boolean(a), Object::Boolean(b)) => Object::Boolean(a == b),
        (OperatorKind::NotEq, Object::Integer(a), Object::Integer(b)) => Object::Boolean(a != b),
        (OperatorKind::NotEq, Object::Boolean(a), Object::Boolean(b)) => Object::Boolean(a != b),
        (_, l, r) => Object::Error(RuntimeError::new(
            format!("comparison not supported between {} and {}", l.type_name(), r.type_name()),
            position,
        )),
    }
}

fn eval_logical(op: OperatorKind, lval: Object, rval: Object, position: Position) -> Object {
    match (lval, rval) {
        (Object::Boolean(a), Object::Boolean(b)) => match op {
            OperatorKind::And => Object::Boolean(a && b),
            OperatorKind::Or => Object::Boolean(a || b),
            other => unreachable!("{other:?} is not a logical operator"),
        },
        (l, r) => Object::Error(RuntimeError::new(
            format!("logical operator not supported between {} and {}", l.type_name(), r.type_name()),
            position,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex_and_parse, Object as O, RuntimeError as RE};
    use test_case::test_case;

    fn run(source: &str) -> (Vec<String>, Option<RE>) {
        let (program, errors) = lex_and_parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let env = Environment::new_global();
        crate::eval_program(&program, &env)
    }

    fn run_expr(source: &str) -> O {
        let env = Environment::new_global();
        let (program, errors) = lex_and_parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        Engine::new().eval_stmt(&program.nodes[0], &env)
    }

    #[test_case("5 + 5", O::Integer(10))]
    #[test_case("９÷３", O::Integer(3))]
    #[test_case("(-9)^3", O::Integer(-729))]
    #[test_case("７％５", O::Integer(2))]
    #[test_case("5 < 7", O::Boolean(true))]
    #[test_case("5 <= 5", O::Boolean(true))]
    #[test_case("8 != 9", O::Boolean(true))]
    fn end_to_end_scenarios(source: &str, expected: O) {
        assert_eq!(run_expr(source), expected);
    }

    #[test]
    fn if_else_and_return() {
        let (out, err) = run("a = 1\nもし a==1 ならば { a = a + 10 } それ以外 { a = a - 10 }\na 戻す");
        assert_eq!(err, None);
        assert_eq!(out, vec!["11".to_string()]);
    }

    #[test]
    fn range_indexing() {
        let (out, err) = run("a = 1〜6\na[0]\na[4]");
        assert_eq!(err, None);
        assert_eq!(out, vec!["1".to_string(), "5".to_string()]);
    }

    #[test]
    fn nested_array_indexing() {
        let (out, err) = run("a = {{1,2},{3,4}}\na[1][0]");
        assert_eq!(err, None);
        assert_eq!(out, vec!["3".to_string()]);
    }

    #[test]
    fn caller_enclosed_function_call() {
        let (out, err) = run(
            "関数 abc(a,b,c){ a+b-c 戻す }\n関数 「あ、い」足す {あ＋い 戻す}\nc=90\nb = abc(10, 足す(2,3), c)\nb 戻す",
        );
        assert_eq!(err, None);
        assert_eq!(out, vec!["-75".to_string()]);
    }

    #[test]
    fn foreach_mutates_through_index_binding() {
        let (out, err) = run("a = 0〜5\na それぞれ繰り返す { a[添字] = 要素＋要素 }\na[3]");
        assert_eq!(err, None);
        assert_eq!(out, vec!["6".to_string()]);
    }

    #[test]
    fn boolean_logic_scenarios() {
        assert_eq!(run_expr("真 かつ 偽"), O::Boolean(false));
        assert_eq!(run_expr("真 または 偽"), O::Boolean(true));
        assert_eq!(run_expr("!真"), O::Boolean(false));
    }

    #[test]
    fn array_aliasing_is_visible_across_bindings() {
        let (out, err) = run("a = {1,2,3}\nb = a\n追加(b, 4)\na");
        assert_eq!(err, None);
        assert_eq!(out, vec!["{1,2,3,4}".to_string()]);
    }

    #[test]
    fn environment_chaining_requires_preexisting_binding() {
        let global = Environment::new_global();
        let engine = Engine::new();
        let (program, errors) = lex_and_parse("じき = 1\n{ じき = 2 }");
        assert!(errors.is_empty());
        for node in &program.nodes {
            engine.eval_stmt(node, &global);
        }
        assert_eq!(global.get("じき"), Some(Object::Integer(2)));
    }

    #[test]
    fn call_sees_callers_free_variable_not_declaration_scope() {
        // Caller-enclosed semantics: 関数 reads `free` from whichever
        // scope is calling it, not from the scope it was declared in.
        let (out, err) = run("関数 f() { free 戻す }\nfree = 1\n{ free = 2\nf() 戻す }");
        assert_eq!(err, None);
        assert_eq!(out, vec!["2".to_string()]);
    }

    #[test]
    fn runtime_errors_carry_the_offending_position() {
        let (_, err) = run("a = 1\nb = a + 真");
        let err = err.expect("expected a runtime error");
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn an_uncalled_builtin_is_a_first_class_value() {
        assert!(matches!(run_expr("表示"), O::Builtin("表示", _)));
    }
}
