//! Nested lexical scopes.
//!
//! Scopes form a chain of `Rc<RefCell<...>>` handles: lookups walk outward,
//! writes hit the innermost scope, and a `global` declaration diverts a
//! name's reads and writes to the chain's root. Closures hold a handle to
//! the scope in effect at their definition site, which keeps parent scopes
//! alive for as long as the closure exists.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::value::Value;

pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Default)]
pub(crate) struct Scope {
    vars: IndexMap<String, Value>,
    /// Names declared `global` in this scope; reads and writes of these
    /// divert to the root scope.
    globals: AHashSet<String>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub fn new_root() -> ScopeRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            vars: IndexMap::new(),
            globals: AHashSet::new(),
            parent: Some(parent.clone()),
        }))
    }

    /// The chain's root (the top-level scope).
    pub fn root(scope: &ScopeRef) -> ScopeRef {
        let mut current = scope.clone();
        loop {
            let parent = current.borrow().parent.clone();
            match parent {
                Some(next) => current = next,
                None => return current,
            }
        }
    }

    /// Walks the chain from `scope` outward, honoring `global` markers.
    pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
        let mut current = scope.clone();
        loop {
            {
                let inner = current.borrow();
                if inner.globals.contains(name) {
                    let root = Self::root(&current);
                    let value = root.borrow().vars.get(name).cloned();
                    return value;
                }
                if let Some(value) = inner.vars.get(name) {
                    return Some(value.clone());
                }
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(next) => current = next,
                None => return None,
            }
        }
    }

    /// Binds `name` in the innermost scope, unless a `global` declaration
    /// in that scope diverts the write to the root.
    pub fn assign(scope: &ScopeRef, name: &str, value: Value) {
        if scope.borrow().globals.contains(name) {
            let root = Self::root(scope);
            root.borrow_mut().vars.insert(name.to_owned(), value);
            return;
        }
        scope.borrow_mut().vars.insert(name.to_owned(), value);
    }

    /// Installs a `global` alias: later reads and writes of `name` in this
    /// scope reach the root cell. The root entry is seeded with Null when
    /// absent so the alias always resolves.
    pub fn declare_global(scope: &ScopeRef, name: &str) {
        let root = Self::root(scope);
        if !Rc::ptr_eq(scope, &root) {
            scope.borrow_mut().globals.insert(name.to_owned());
        }
        let mut root = root.borrow_mut();
        if !root.vars.contains_key(name) {
            root.vars.insert(name.to_owned(), Value::Null);
        }
    }

    /// Inserts directly into this scope, bypassing global markers.
    /// Used for parameter binding and loop variables.
    pub fn insert(scope: &ScopeRef, name: impl Into<String>, value: Value) {
        scope.borrow_mut().vars.insert(name.into(), value);
    }

    /// Visible bindings, innermost first; shadowed outer names are skipped.
    /// Used for the FFI scope snapshot.
    pub fn flatten(scope: &ScopeRef) -> Vec<(String, Value)> {
        let mut seen = AHashSet::new();
        let mut bindings = Vec::new();
        let mut current = Some(scope.clone());
        while let Some(handle) = current {
            let inner = handle.borrow();
            for (name, value) in &inner.vars {
                if seen.insert(name.clone()) {
                    bindings.push((name.clone(), value.clone()));
                }
            }
            current = inner.parent.clone();
        }
        bindings
    }
}
