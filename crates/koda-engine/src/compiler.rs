//! The dynamic-compilation seam.
//!
//! The pipeline and the attribution engine only need "compile this body
//! with these parameter names" and "invoke it with these arguments", so
//! other hosts can plug in their own script engine.

use koda_eval::{Evaluator, Value, DEFAULT_MAX_CALL_DEPTH};
use koda_types::ast::Program;
use koda_types::ScriptError;

/// Compiles a function body over named parameters and invokes it.
pub trait Compiler {
    /// A compiled body, ready to invoke.
    type Unit;

    /// Compile `body` as a function whose formal parameters are `params`.
    ///
    /// Failures are `SyntaxError`s carrying the 1-based line of `body`
    /// where compilation stopped.
    fn compile(&self, params: &[&str], body: &str) -> Result<Self::Unit, ScriptError>;

    /// Call a compiled body with one argument per parameter.
    fn invoke(&self, unit: &Self::Unit, args: Vec<Value>) -> Result<(), ScriptError>;
}

/// A compiled body for the [`Interpreter`].
#[derive(Debug, Clone)]
pub struct CompiledBody {
    pub params: Vec<String>,
    pub program: Program,
}

/// The built-in compiler: parse to an AST, then tree-walk it.
#[derive(Debug, Clone)]
pub struct Interpreter {
    max_call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn with_call_depth(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for Interpreter {
    type Unit = CompiledBody;

    fn compile(&self, params: &[&str], body: &str) -> Result<CompiledBody, ScriptError> {
        let program = koda_parser::parse_function_body(body, params)?;
        Ok(CompiledBody {
            params: params.iter().map(|p| p.to_string()).collect(),
            program,
        })
    }

    fn invoke(&self, unit: &CompiledBody, args: Vec<Value>) -> Result<(), ScriptError> {
        let mut args = args.into_iter();
        let bindings = unit
            .params
            .iter()
            .map(|name| (name.clone(), args.next().unwrap_or(Value::Undefined)))
            .collect();
        Evaluator::with_call_depth(self.max_call_depth).run_function_body(&unit.program, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koda_types::ErrorKind;

    #[test]
    fn test_parameters_are_bound_in_order() {
        let compiler = Interpreter::new();
        let unit = compiler
            .compile(&["a", "b"], "if (a !== 1 || b !== 'two') { throw 'wrong order'; }")
            .unwrap();
        compiler
            .invoke(&unit, vec![Value::from(1.0), Value::from("two")])
            .unwrap();
    }

    #[test]
    fn test_compile_error_is_syntax_error() {
        let err = Interpreter::new().compile(&[], "\"use strict\";\nlet = ;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.line_number, Some(2));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        let compiler = Interpreter::new();
        let unit = compiler
            .compile(&["a"], "if (a !== undefined) throw 'bound';")
            .unwrap();
        compiler.invoke(&unit, Vec::new()).unwrap();
    }

    #[test]
    fn test_call_depth_is_configurable() {
        let compiler = Interpreter::with_call_depth(4);
        let unit = compiler
            .compile(&[], "function f(n) { return n === 0 ? 0 : f(n - 1); }\nf(10);")
            .unwrap();
        let err = compiler.invoke(&unit, Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeError);
        let unit = compiler.compile(&[], "function f(n) { return n === 0 ? 0 : f(n - 1); }\nf(2);").unwrap();
        compiler.invoke(&unit, Vec::new()).unwrap();
    }
}
