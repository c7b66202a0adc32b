//! The fixed built-in function table.
//!
//! A process-wide, immutable registry of native functions consulted
//! before the environment at every call site. This language's built-in
//! surface is four fixed functions, so a `once_cell::sync::Lazy` map of
//! literal entries is the whole of it — no package trait, no
//! registration macro.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::object::{NativeFn, Object, RuntimeError};
use crate::token::Position;

fn display(args: &[Object], _position: Position) -> Object {
    for arg in args {
        println!("{arg}");
    }
    Object::Null
}

fn make_array(args: &[Object], position: Position) -> Object {
    match args {
        [Object::Integer(n)] if *n >= 0 => Object::array_of(vec![Object::Null; *n as usize]),
        [Object::Integer(n), value] if *n >= 0 => Object::array_of(vec![value.clone(); *n as usize]),
        [Object::Integer(n)] | [Object::Integer(n), _] => Object::Error(RuntimeError::new(
            format!("配列: length must be a non-negative Integer, found {n}"),
            position,
        )),
        _ => Object::Error(RuntimeError::new("配列: expected (length) or (length, value)", position)),
    }
}

fn append(args: &[Object], position: Position) -> Object {
    match args {
        [Object::Array(elements), value] => {
            elements.borrow_mut().push(value.clone());
            Object::Null
        }
        [other, _] => Object::Error(RuntimeError::new(
            format!("追加: expected an Array, found {}", other.type_name()),
            position,
        )),
        _ => Object::Error(RuntimeError::new("追加: expected (array, value)", position)),
    }
}

fn remove_at(args: &[Object], position: Position) -> Object {
    match args {
        [Object::Array(elements), Object::Integer(index)] => {
            let mut elements = elements.borrow_mut();
            if *index < 0 || *index as usize >= elements.len() {
                return Object::Error(RuntimeError::new(format!("削除: index {index} out of range"), position));
            }
            elements.remove(*index as usize);
            Object::Null
        }
        [Object::Array(_), other] => Object::Error(RuntimeError::new(
            format!("削除: index must be an Integer, found {}", other.type_name()),
            position,
        )),
        [other, _] => Object::Error(RuntimeError::new(
            format!("削除: expected an Array, found {}", other.type_name()),
            position,
        )),
        _ => Object::Error(RuntimeError::new("削除: expected (array, index)", position)),
    }
}

static TABLE: Lazy<HashMap<&'static str, NativeFn>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, NativeFn> = HashMap::new();
    table.insert("表示", display as NativeFn);
    table.insert("配列", make_array as NativeFn);
    table.insert("追加", append as NativeFn);
    table.insert("削除", remove_at as NativeFn);
    table
});

/// Built-ins are resolved by name before the environment is ever
/// consulted (§4.3's call dispatch order).
pub fn lookup(name: &str) -> Option<NativeFn> {
    TABLE.get(name).copied()
}

/// Same lookup, but also hands back the table's own `&'static str` key —
/// used when a built-in is resolved as a bare value (`Object::Builtin`)
/// rather than called outright, so the value can carry a name to
/// display without borrowing the caller's (possibly shorter-lived)
/// identifier text.
pub fn lookup_named(name: &str) -> Option<(&'static str, NativeFn)> {
    TABLE.get_key_value(name).map(|(&key, &native)| (key, native))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_array_shares_the_fill_value_by_reference() {
        let shared = Object::array_of(vec![Object::Integer(1)]);
        let filled = make_array(&[Object::Integer(3), shared.clone()], Position::NONE);
        let Object::Array(outer) = filled else { panic!("expected an array") };
        let Object::Array(inner_a) = outer.borrow()[0].clone() else { panic!("expected array element") };
        let Object::Array(inner_b) = outer.borrow()[1].clone() else { panic!("expected array element") };
        assert!(std::rc::Rc::ptr_eq(&inner_a, &inner_b));
    }

    #[test]
    fn remove_at_out_of_range_is_an_error() {
        let arr = Object::array_of(vec![Object::Integer(1)]);
        let result = remove_at(&[arr, Object::Integer(5)], Position::NONE);
        assert!(matches!(result, Object::Error(_)));
    }
}
