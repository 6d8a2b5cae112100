//! Scoped variable environment for the Koda evaluator.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

/// A single scope level.
#[derive(Debug)]
struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<Environment>,
    /// Function scopes receive `var` declarations.
    is_function: bool,
}

/// Outcome of assigning to an existing name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assign {
    Done,
    NotFound,
    Constant,
}

/// Shared, chained scope.
///
/// Closures hold on to the environment they were created in, so scopes are
/// reference-counted rather than a push/pop stack. Lookups walk from the
/// innermost scope outward; `define` always creates in this scope.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// Create a new root environment (a function scope with no parent).
    pub fn new() -> Self {
        Self::with_parent(None, true)
    }

    fn with_parent(parent: Option<Environment>, is_function: bool) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent,
            is_function,
        })))
    }

    /// Push a block scope.
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()), false)
    }

    /// Push a function scope.
    pub fn function_child(&self) -> Self {
        Self::with_parent(Some(self.clone()), true)
    }

    /// Define a variable in this scope, replacing any existing binding.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// `var` semantics: bind in the nearest function scope. An existing
    /// binding there is only overwritten when `value` is given.
    pub fn define_var(&self, name: &str, value: Option<Value>) {
        let target = self.function_scope();
        let mut scope = target.0.borrow_mut();
        if let Some(existing) = scope.bindings.get_mut(name) {
            if let Some(value) = value {
                existing.value = value;
            }
            return;
        }
        scope.bindings.insert(
            name.to_string(),
            Binding {
                value: value.unwrap_or(Value::Undefined),
                mutable: true,
            },
        );
    }

    fn function_scope(&self) -> Environment {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if scope.is_function {
                    return current.clone();
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// The outermost scope.
    pub fn root(&self) -> Environment {
        let mut current = self.clone();
        loop {
            let parent = current.0.borrow().parent.clone();
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Look up a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if let Some(binding) = scope.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                scope.parent.clone()
            };
            current = parent?;
        }
    }

    /// `true` if `name` is bound somewhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Update a variable in the first scope where it exists.
    pub fn assign(&self, name: &str, value: Value) -> Assign {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if !binding.mutable {
                        return Assign::Constant;
                    }
                    binding.value = value;
                    return Assign::Done;
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Assign::NotFound,
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let root = Environment::new();
        root.define("x", Value::from(1.0), true);
        let inner = root.child();
        inner.define("y", Value::from(2.0), true);
        assert_eq!(inner.get("x"), Some(Value::from(1.0)));
        assert_eq!(inner.get("y"), Some(Value::from(2.0)));
        assert_eq!(root.get("y"), None);
    }

    #[test]
    fn test_shadowing() {
        let root = Environment::new();
        root.define("x", Value::from(1.0), true);
        let inner = root.child();
        inner.define("x", Value::from(5.0), true);
        assert_eq!(inner.get("x"), Some(Value::from(5.0)));
        assert_eq!(root.get("x"), Some(Value::from(1.0)));
    }

    #[test]
    fn test_assign_updates_owning_scope() {
        let root = Environment::new();
        root.define("n", Value::from(0.0), true);
        let inner = root.child();
        assert_eq!(inner.assign("n", Value::from(3.0)), Assign::Done);
        assert_eq!(root.get("n"), Some(Value::from(3.0)));
        assert_eq!(inner.assign("missing", Value::Null), Assign::NotFound);
    }

    #[test]
    fn test_constant_binding() {
        let root = Environment::new();
        root.define("r", Value::from(10.0), false);
        assert_eq!(root.assign("r", Value::from(11.0)), Assign::Constant);
        assert_eq!(root.get("r"), Some(Value::from(10.0)));
    }

    #[test]
    fn test_var_goes_to_function_scope() {
        let root = Environment::new();
        let func = root.function_child();
        let block = func.child().child();
        block.define_var("i", Some(Value::from(4.0)));
        assert_eq!(func.get("i"), Some(Value::from(4.0)));
        assert_eq!(root.get("i"), None);
        // Redeclaring without an initializer keeps the value
        block.define_var("i", None);
        assert_eq!(func.get("i"), Some(Value::from(4.0)));
    }
}
