//! The environment: a chain of name→value scopes.
//!
//! This language's call semantics are caller-enclosed (see
//! `DESIGN.md`) and its blocks nest arbitrarily deep at runtime, so the
//! scope chain has to be a real chain: each `Environment` is a scope
//! plus an optional link to its outer scope, rather than a flat vector
//! with length-markers for block entry/exit. `Rc<RefCell<_>>` gives the
//! sharing a chain of scopes needs (a child scope's `Environment` handle
//! and its parent's must refer to the same underlying store) the same
//! way `object::Object::Array` shares its backing vector.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

struct ScopeData {
    store: HashMap<String, Object>,
    outer: Option<Environment>,
}

/// A handle onto one scope in the chain. Cloning an `Environment` is
/// cheap and aliases the same scope — callers that need a fresh child
/// scope call [`Environment::new_enclosed`], never `.clone()`.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<ScopeData>>);

impl Environment {
    /// A fresh root scope with no outer link — used once, for the
    /// top-level program environment.
    pub fn new_global() -> Self {
        Self(Rc::new(RefCell::new(ScopeData {
            store: HashMap::new(),
            outer: None,
        })))
    }

    /// A fresh scope enclosing `outer`, created on block entry and on
    /// function call.
    pub fn new_enclosed(outer: &Environment) -> Self {
        Self(Rc::new(RefCell::new(ScopeData {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Walks outer links, returning the first binding found.
    pub fn get(&self, name: &str) -> Option<Object> {
        let scope = self.0.borrow();
        if let Some(value) = scope.store.get(name) {
            return Some(value.clone());
        }
        let outer = scope.outer.clone();
        drop(scope);
        outer.and_then(|outer| outer.get(name))
    }

    /// Writes into the nearest enclosing scope that already binds
    /// `name`, or creates the binding in the current scope if none does.
    pub fn set(&self, name: &str, value: Object) {
        match self.find_owner(name) {
            Some(owner) => owner.set_current(name, value),
            None => self.set_current(name, value),
        }
    }

    /// Binds `name` in *this* scope specifically, regardless of whether
    /// an outer scope already binds it. Used for parameter binding,
    /// `それぞれ繰り返す`'s `添字`/`要素` bindings, and function
    /// declarations.
    pub fn set_current(&self, name: &str, value: Object) {
        self.0.borrow_mut().store.insert(name.to_string(), value);
    }

    fn find_owner(&self, name: &str) -> Option<Environment> {
        let scope = self.0.borrow();
        if scope.store.contains_key(name) {
            return Some(self.clone());
        }
        let outer = scope.outer.clone();
        drop(scope);
        outer.and_then(|outer| outer.find_owner(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_in_nested_block_updates_enclosing_binding() {
        let global = Environment::new_global();
        global.set_current("a", Object::Integer(1));

        let block = Environment::new_enclosed(&global);
        block.set("a", Object::Integer(2));

        assert_eq!(global.get("a"), Some(Object::Integer(2)));
    }

    #[test]
    fn assignment_to_unbound_name_creates_it_in_current_scope() {
        let global = Environment::new_global();
        let block = Environment::new_enclosed(&global);
        block.set("fresh", Object::Integer(9));

        assert_eq!(block.get("fresh"), Some(Object::Integer(9)));
        assert_eq!(global.get("fresh"), None);
    }

    #[test]
    fn set_current_always_shadows_in_the_local_scope() {
        let global = Environment::new_global();
        global.set_current("x", Object::Integer(1));

        let block = Environment::new_enclosed(&global);
        block.set_current("x", Object::Integer(2));

        assert_eq!(block.get("x"), Some(Object::Integer(2)));
        assert_eq!(global.get("x"), Some(Object::Integer(1)));
    }
}
