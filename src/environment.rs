//! Variable environment for VibeScript
//!
//! Handles scoped variable storage with constant tracking. Scopes are shared
//! (`Rc<RefCell<_>>`) so a skill can keep the scope it was defined in alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ErrorKind, Result, VibeError};
use crate::value::Value;

/// Shared handle to a scope
pub type EnvRef = Rc<RefCell<Environment>>;

/// A binding in the environment
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool, // true for 'lock', false for 'hold'
    order: usize,
}

/// A single binding as seen from outside the environment
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    pub value: Value,
    pub constant: bool,
}

/// Variable environment with lexical scoping
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Binding>,
    parent: Option<EnvRef>,
    next_order: usize,
}

impl Environment {
    /// Create a new root environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared root environment
    pub fn new_ref() -> EnvRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Create a shared child scope of `parent`
    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            parent: Some(Rc::clone(parent)),
            ..Self::default()
        }))
    }

    /// Define a binding in this scope, replacing any previous one
    pub fn define(&mut self, name: impl Into<String>, value: Value, constant: bool) {
        let order = self.next_order;
        self.next_order += 1;
        self.values.insert(name.into(), Binding { value, constant, order });
    }

    /// Get a variable's value
    pub fn get(&self, name: &str) -> Result<Value> {
        if let Some(binding) = self.values.get(name) {
            Ok(binding.value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            Err(VibeError::new(
                ErrorKind::UndefinedVariable(name.to_string()),
                None,
            ))
        }
    }

    /// Assign to the nearest existing binding (only if it isn't constant)
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        if let Some(binding) = self.values.get_mut(name) {
            if binding.constant {
                Err(VibeError::new(
                    ErrorKind::ConstantReassignment(name.to_string()),
                    None,
                ))
            } else {
                binding.value = value;
                Ok(())
            }
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value)
        } else {
            Err(VibeError::new(
                ErrorKind::UndefinedVariable(name.to_string()),
                None,
            ))
        }
    }

    /// Whether the name resolves anywhere in the chain
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.borrow().contains(name))
    }

    /// Whether the nearest binding of the name is constant
    pub fn is_constant(&self, name: &str) -> bool {
        match self.values.get(name) {
            Some(binding) => binding.constant,
            None => self.parent.as_ref().is_some_and(|p| p.borrow().is_constant(name)),
        }
    }

    /// Bindings of this scope only, in definition order
    pub fn local_bindings(&self) -> Vec<BindingInfo> {
        let mut bindings: Vec<(&String, &Binding)> = self.values.iter().collect();
        bindings.sort_by_key(|(_, b)| b.order);
        bindings
            .into_iter()
            .map(|(name, b)| BindingInfo {
                name: name.clone(),
                value: b.value.clone(),
                constant: b.constant,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0), false);
        assert_eq!(env.get("x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_redefine_same_scope_replaces() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0), true);
        env.define("x", Value::Number(2.0), false);
        assert_eq!(env.get("x").unwrap(), Value::Number(2.0));
        assert!(env.assign("x", Value::Number(3.0)).is_ok());
    }

    #[test]
    fn test_lookup_walks_parents() {
        let root = Environment::new_ref();
        root.borrow_mut().define("x", Value::from("outer"), false);
        let child = Environment::child_of(&root);
        let grandchild = Environment::child_of(&child);

        assert_eq!(grandchild.borrow().get("x").unwrap(), Value::from("outer"));
        grandchild.borrow_mut().assign("x", Value::from("changed")).unwrap();
        assert_eq!(root.borrow().get("x").unwrap(), Value::from("changed"));
    }

    #[test]
    fn test_shadowing() {
        let root = Environment::new_ref();
        root.borrow_mut().define("x", Value::Number(1.0), false);
        let child = Environment::child_of(&root);
        child.borrow_mut().define("x", Value::Number(2.0), false);
        child.borrow_mut().assign("x", Value::Number(3.0)).unwrap();

        assert_eq!(child.borrow().get("x").unwrap(), Value::Number(3.0));
        assert_eq!(root.borrow().get("x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_constant_reassignment_through_chain() {
        let root = Environment::new_ref();
        root.borrow_mut().define("pi", Value::Number(3.14), true);
        let child = Environment::child_of(&root);

        let err = child.borrow_mut().assign("pi", Value::Number(3.0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConstantReassignment("pi".to_string()));
        assert!(child.borrow().is_constant("pi"));
    }

    #[test]
    fn test_undefined() {
        let mut env = Environment::new();
        let err = env.get("ghost").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable("ghost".to_string()));
        let err = env.assign("ghost", Value::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable("ghost".to_string()));
        assert!(!env.contains("ghost"));
    }

    #[test]
    fn test_local_bindings_in_definition_order() {
        let mut env = Environment::new();
        env.define("b", Value::Number(1.0), false);
        env.define("a", Value::Number(2.0), true);
        let names: Vec<String> = env.local_bindings().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
