//! Core expression and statement evaluator.

use std::rc::Rc;

use koda_types::ast::*;
use koda_types::{ErrorKind, ScriptError, Span};

use crate::builtins::{self, array_index, INVALID_ARRAY_LENGTH, MAX_ARRAY_LENGTH};
use crate::env::{Assign, Environment};
use crate::error::{EvalError, EvalResult};
use crate::value::{Closure, Function, Value};

/// Default bound on nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Bound on statements and expressions being evaluated at once, across
/// all active calls. Keeps deeply nested trees off the host stack.
pub const MAX_EVAL_NESTING: usize = 400;

/// Frame name used for the compiled body itself.
const TOP_LEVEL_FRAME: &str = "anonymous";

/// An active script call, for stack traces.
struct Frame {
    name: Option<String>,
    /// Where the caller invoked this frame.
    call_site: Span,
}

/// An assignable location, resolved once so compound assignment evaluates
/// the object expression a single time.
enum Place {
    Binding(String),
    Member(Value, String),
}

/// The core evaluator: walks AST nodes and produces Values.
pub struct Evaluator {
    /// Outermost scope; capabilities live here.
    globals: Environment,
    /// Variable environment (scoped).
    env: Environment,
    frames: Vec<Frame>,
    max_call_depth: usize,
    /// Statements and expressions currently on the host stack.
    nesting: usize,
    strict: bool,
}

impl Evaluator {
    /// Create a new evaluator with the default call depth limit.
    pub fn new() -> Self {
        Self::with_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Create a new evaluator allowing at most `max_call_depth` nested calls.
    pub fn with_call_depth(max_call_depth: usize) -> Self {
        let globals = Environment::new();
        Self {
            env: globals.clone(),
            globals,
            frames: Vec::new(),
            max_call_depth,
            nesting: 0,
            strict: false,
        }
    }

    /// Bind a name in the outermost scope.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.define(name, value, true);
    }

    /// Run a compiled program with no parameters.
    pub fn run_program(&mut self, program: &Program) -> Result<(), ScriptError> {
        self.run_function_body(program, Vec::new())
    }

    /// Run `program` as the body of a function called with `params` bound
    /// to the given values. A top-level `return` ends the run normally.
    pub fn run_function_body(
        &mut self,
        program: &Program,
        params: Vec<(String, Value)>,
    ) -> Result<(), ScriptError> {
        self.strict = program.strict;
        let body_env = self.globals.function_child();
        for (name, value) in params {
            body_env.define(&name, value, true);
        }
        let saved = std::mem::replace(&mut self.env, body_env);
        self.hoist_vars(&program.body);
        let result = self.exec_stmts(&program.body);
        self.env = saved;

        match result {
            Ok(()) | Err(EvalError::Return(_)) => Ok(()),
            Err(err) => Err(err.into_script_error()),
        }
    }

    /// Call a function value from the host.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        match callee {
            Value::Function(Function::Native(native)) => {
                (native.func)(&args).map_err(|err| EvalError::Thrown(self.locate(err, span)))
            }
            Value::Function(Function::Closure(closure)) => self.call_closure(closure, args, span),
            other => self.throw(
                ScriptError::type_error(format!("{} is not a function", other.inspect())),
                span,
            ),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Errors & stack traces
    // ══════════════════════════════════════════════════════════════════════

    /// Count one more statement or expression in progress.
    fn enter(&mut self, span: Span) -> EvalResult<()> {
        if self.nesting >= MAX_EVAL_NESTING {
            return self.throw(ScriptError::stack_overflow(), span);
        }
        self.nesting += 1;
        Ok(())
    }

    fn throw<T>(&self, err: ScriptError, span: Span) -> EvalResult<T> {
        Err(EvalError::Thrown(self.locate(err, span)))
    }

    /// Attach a stack trace at `span` to an error that has no location yet.
    ///
    /// Frames are listed innermost first:
    /// `    at name (<anonymous>:LINE:COL)`.
    fn locate(&self, err: ScriptError, span: Span) -> ScriptError {
        if !err.is_unlocated() {
            return err;
        }
        let mut stack = format!("{}: {}", err.kind, err.message);
        let mut location = span;
        for frame in self.frames.iter().rev() {
            push_frame_line(&mut stack, frame.name.as_deref(), location);
            location = frame.call_site;
        }
        push_frame_line(&mut stack, Some(TOP_LEVEL_FRAME), location);
        err.with_stack(stack)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute statements in the current scope, after hoisting the function
    /// declarations they contain.
    fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<()> {
        for stmt in stmts {
            if let Stmt::Function(decl) = stmt {
                let closure = self.make_closure(&decl.function, None);
                self.env.define(&decl.name.name, closure, true);
            }
        }
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Run `stmts` in a fresh block scope.
    fn exec_block(&mut self, stmts: &[Stmt]) -> EvalResult<()> {
        let block_env = self.env.child();
        let saved = std::mem::replace(&mut self.env, block_env);
        let result = self.exec_stmts(stmts);
        self.env = saved;
        result
    }

    /// Declare every `var` of a function body up front (as `undefined`).
    fn hoist_vars(&mut self, stmts: &[Stmt]) {
        let mut names = Vec::new();
        collect_var_names(stmts, &mut names);
        for name in names {
            self.env.define_var(&name, None);
        }
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        self.enter(stmt.span())?;
        let result = self.exec_stmt_inner(stmt);
        self.nesting -= 1;
        result
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::VarDecl(decl) => self.exec_var_decl(decl),
            // Hoisted by `exec_stmts`
            Stmt::Function(_) => Ok(()),
            Stmt::If(stmt) => {
                if self.eval_expr(&stmt.condition)?.is_truthy() {
                    self.exec_stmt(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(stmt) => {
                while self.eval_expr(&stmt.condition)?.is_truthy() {
                    match self.exec_stmt(&stmt.body) {
                        Ok(()) | Err(EvalError::Continue) => {}
                        Err(EvalError::Break) => break,
                        Err(err) => return Err(err),
                    }
                }
                Ok(())
            }
            Stmt::DoWhile(stmt) => {
                loop {
                    match self.exec_stmt(&stmt.body) {
                        Ok(()) | Err(EvalError::Continue) => {}
                        Err(EvalError::Break) => break,
                        Err(err) => return Err(err),
                    }
                    if !self.eval_expr(&stmt.condition)?.is_truthy() {
                        break;
                    }
                }
                Ok(())
            }
            Stmt::For(stmt) => {
                let saved = self.env.clone();
                let result = self.exec_for(stmt);
                self.env = saved;
                result
            }
            Stmt::Break(_) => Err(EvalError::Break),
            Stmt::Continue(_) => Err(EvalError::Continue),
            Stmt::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Err(EvalError::Return(value))
            }
            Stmt::Throw(stmt) => {
                let value = self.eval_expr(&stmt.value)?;
                self.throw(
                    ScriptError::new(ErrorKind::Error, value.to_string()),
                    stmt.value.span,
                )
            }
            Stmt::Block(block) => self.exec_block(&block.stmts),
            Stmt::Empty(_) => Ok(()),
            Stmt::Expr(stmt) => {
                self.eval_expr(&stmt.expr)?;
                Ok(())
            }
        }
    }

    fn exec_var_decl(&mut self, decl: &VarDecl) -> EvalResult<()> {
        for declarator in &decl.declarators {
            let name = &declarator.name.name;
            let value = match &declarator.init {
                Some(init) => Some(self.eval_named(init, name)?),
                None => None,
            };
            match decl.kind {
                VarKind::Var => self.env.define_var(name, value),
                VarKind::Let => self.env.define(name, value.unwrap_or(Value::Undefined), true),
                VarKind::Const => {
                    self.env
                        .define(name, value.unwrap_or(Value::Undefined), false)
                }
            }
        }
        Ok(())
    }

    /// `for` with a fresh copy of the header's `let` bindings per iteration,
    /// so closures created in the body keep that iteration's values.
    fn exec_for(&mut self, stmt: &ForStmt) -> EvalResult<()> {
        let loop_env = self.env.child();
        self.env = loop_env.clone();

        let mut per_iteration: Vec<(String, bool)> = Vec::new();
        match &stmt.init {
            Some(ForInit::VarDecl(decl)) => {
                self.exec_var_decl(decl)?;
                if decl.kind.is_lexical() {
                    per_iteration = decl
                        .declarators
                        .iter()
                        .map(|d| (d.name.name.clone(), decl.kind != VarKind::Const))
                        .collect();
                }
            }
            Some(ForInit::Expr(expr)) => {
                self.eval_expr(expr)?;
            }
            None => {}
        }

        let mut iteration = copy_bindings(&loop_env, &loop_env, &per_iteration);
        loop {
            self.env = iteration.clone();
            if let Some(condition) = &stmt.condition {
                if !self.eval_expr(condition)?.is_truthy() {
                    break;
                }
            }
            match self.exec_stmt(&stmt.body) {
                Ok(()) | Err(EvalError::Continue) => {}
                Err(EvalError::Break) => break,
                Err(err) => return Err(err),
            }
            iteration = copy_bindings(&iteration, &loop_env, &per_iteration);
            self.env = iteration.clone();
            if let Some(update) = &stmt.update {
                self.eval_expr(update)?;
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.enter(expr.span)?;
        let result = self.eval_expr_inner(expr);
        self.nesting -= 1;
        result
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => out.push_str(s),
                        TemplatePart::Expr(expr) => {
                            let value = self.eval_expr(expr)?;
                            out.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::String(out))
            }
            ExprKind::ArrayLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::array(values))
            }
            ExprKind::ObjectLit(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (key, value) in fields {
                    values.push((key.clone(), self.eval_named(value, key)?));
                }
                Ok(Value::object(values))
            }

            ExprKind::Identifier(name) => self.lookup(name, expr.span),
            ExprKind::Member { object, property } => {
                let object = self.eval_expr(object)?;
                let key = self.property_key(property)?;
                self.get_member(&object, &key, expr.span)
            }

            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Function(function) => Ok(self.make_closure(function, None)),

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { left, op, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                Ok(binary_op(*op, &left, &right))
            }
            ExprKind::Logical { left, op, right } => {
                let left = self.eval_expr(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval_expr(right),
                }
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }
            ExprKind::Assign { target, op, value } => {
                let place = self.resolve_place(target)?;
                let new_value = match op.binary_op() {
                    None => match &place {
                        Place::Binding(name) => self.eval_named(value, name)?,
                        Place::Member(..) => self.eval_expr(value)?,
                    },
                    Some(bin) => {
                        let current = self.read_place(&place, target.span)?;
                        let rhs = self.eval_expr(value)?;
                        binary_op(bin, &current, &rhs)
                    }
                };
                self.write_place(place, new_value.clone(), target.span)?;
                Ok(new_value)
            }
            ExprKind::Update {
                target,
                increment,
                prefix,
            } => {
                let place = self.resolve_place(target)?;
                let old = self.read_place(&place, target.span)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.write_place(place, Value::Number(new), target.span)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    /// Evaluate `expr`, naming it `name` if it is an anonymous function.
    fn eval_named(&mut self, expr: &Expr, name: &str) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Function(function) if function.name.is_none() => {
                Ok(self.make_closure(function, Some(name.to_string())))
            }
            _ => self.eval_expr(expr),
        }
    }

    fn make_closure(&self, function: &Rc<FunctionExpr>, name: Option<String>) -> Value {
        Value::Function(Function::Closure(Rc::new(Closure {
            function: Rc::clone(function),
            scope: self.env.clone(),
            name: function.name.clone().or(name),
        })))
    }

    // ── Identifiers ───────────────────────────────────────────────────────

    fn lookup(&self, name: &str, span: Span) -> EvalResult<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        match builtin_constant(name) {
            Some(value) => Ok(value),
            None => self.throw(
                ScriptError::reference(format!("{name} is not defined")),
                span,
            ),
        }
    }

    // ── Unary ─────────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        if op == UnaryOp::TypeOf {
            // `typeof` tolerates undeclared names
            if let ExprKind::Identifier(name) = &operand.kind {
                let value = self
                    .env
                    .get(name)
                    .or_else(|| builtin_constant(name))
                    .unwrap_or(Value::Undefined);
                return Ok(Value::String(value.type_of().to_string()));
            }
            let value = self.eval_expr(operand)?;
            return Ok(Value::String(value.type_of().to_string()));
        }
        let value = self.eval_expr(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::String(value.type_of().to_string()),
        })
    }

    // ── Members ───────────────────────────────────────────────────────────

    fn property_key(&mut self, property: &PropertyKey) -> EvalResult<String> {
        match property {
            PropertyKey::Named(ident) => Ok(ident.name.clone()),
            PropertyKey::Computed(expr) => Ok(self.eval_expr(expr)?.to_string()),
        }
    }

    fn get_member(&self, object: &Value, key: &str, span: Span) -> EvalResult<Value> {
        match object {
            Value::Undefined | Value::Null => self.throw(
                ScriptError::type_error(format!(
                    "Cannot read properties of {object} (reading '{key}')"
                )),
                span,
            ),
            Value::Array(items) => Ok(builtins::array_member(items, key)),
            Value::String(s) => Ok(builtins::string_member(s, key)),
            Value::Number(n) => Ok(builtins::number_member(*n, key)),
            Value::Object(fields) => Ok(fields.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
            Value::Function(f) if key == "name" => Ok(Value::String(f.name())),
            Value::Function(_) | Value::Bool(_) => Ok(Value::Undefined),
        }
    }

    fn set_member(&self, object: &Value, key: String, value: Value, span: Span) -> EvalResult<()> {
        match object {
            Value::Undefined | Value::Null => self.throw(
                ScriptError::type_error(format!(
                    "Cannot set properties of {object} (setting '{key}')"
                )),
                span,
            ),
            Value::Object(fields) => {
                fields.borrow_mut().insert(key, value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if let Some(i) = array_index(&key) {
                    if i >= items.len() {
                        if i >= MAX_ARRAY_LENGTH {
                            drop(items);
                            return self.throw(ScriptError::range(INVALID_ARRAY_LENGTH), span);
                        }
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = value;
                } else if key == "length" {
                    let len = value.to_number();
                    let valid = len.is_finite() && len >= 0.0 && len.fract() == 0.0;
                    if !valid || len > MAX_ARRAY_LENGTH as f64 {
                        drop(items);
                        return self.throw(ScriptError::range(INVALID_ARRAY_LENGTH), span);
                    }
                    items.resize(len as usize, Value::Undefined);
                }
                Ok(())
            }
            primitive if self.strict => self.throw(
                ScriptError::type_error(format!(
                    "Cannot create property '{key}' on {} '{primitive}'",
                    primitive.type_of()
                )),
                span,
            ),
            _ => Ok(()),
        }
    }

    // ── Assignment targets ────────────────────────────────────────────────

    fn resolve_place(&mut self, target: &Expr) -> EvalResult<Place> {
        match &target.kind {
            ExprKind::Identifier(name) => Ok(Place::Binding(name.clone())),
            ExprKind::Member { object, property } => {
                let object = self.eval_expr(object)?;
                let key = self.property_key(property)?;
                Ok(Place::Member(object, key))
            }
            ExprKind::Paren(inner) => self.resolve_place(inner),
            // The parser only builds assignments to identifiers and members
            _ => self.throw(
                ScriptError::syntax("Invalid left-hand side in assignment"),
                target.span,
            ),
        }
    }

    fn read_place(&self, place: &Place, span: Span) -> EvalResult<Value> {
        match place {
            Place::Binding(name) => self.lookup(name, span),
            Place::Member(object, key) => self.get_member(object, key, span),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, span: Span) -> EvalResult<()> {
        match place {
            Place::Binding(name) => match self.env.assign(&name, value.clone()) {
                Assign::Done => Ok(()),
                Assign::Constant => {
                    self.throw(ScriptError::type_error("Assignment to constant variable."), span)
                }
                Assign::NotFound if self.strict => self.throw(
                    ScriptError::reference(format!("{name} is not defined")),
                    span,
                ),
                Assign::NotFound => {
                    self.globals.define(&name, value, true);
                    Ok(())
                }
            },
            Place::Member(object, key) => self.set_member(&object, key, value, span),
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> EvalResult<Value> {
        let function = match &callee.kind {
            ExprKind::Member { object, property } => {
                let receiver = self.eval_expr(object)?;
                let key = self.property_key(property)?;
                if let Value::Array(items) = &receiver {
                    if let Some(result) = self.call_array_iterator(items, &key, args, span)? {
                        return Ok(result);
                    }
                }
                self.get_member(&receiver, &key, callee.span)?
            }
            _ => self.eval_expr(callee)?,
        };

        if !matches!(function, Value::Function(_)) {
            return self.throw(
                ScriptError::type_error(format!("{} is not a function", callee_label(callee))),
                span,
            );
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        self.call_value(&function, values, span)
    }

    /// `forEach` / `map` / `filter`, which call back into script code.
    fn call_array_iterator(
        &mut self,
        items: &Rc<std::cell::RefCell<Vec<Value>>>,
        method: &str,
        args: &[Expr],
        span: Span,
    ) -> EvalResult<Option<Value>> {
        if !matches!(method, "forEach" | "map" | "filter") {
            return Ok(None);
        }
        let callback = match args.first() {
            Some(arg) => self.eval_expr(arg)?,
            None => Value::Undefined,
        };
        if !matches!(callback, Value::Function(_)) {
            return self.throw(
                ScriptError::type_error(format!("{} is not a function", callback.inspect())),
                span,
            );
        }

        let array = Value::Array(Rc::clone(items));
        let snapshot: Vec<Value> = items.borrow().clone();
        let mut mapped = Vec::new();
        for (i, item) in snapshot.into_iter().enumerate() {
            let result = self.call_value(
                &callback,
                vec![item.clone(), Value::Number(i as f64), array.clone()],
                span,
            )?;
            match method {
                "map" => mapped.push(result),
                "filter" if result.is_truthy() => mapped.push(item),
                _ => {}
            }
        }
        Ok(Some(match method {
            "forEach" => Value::Undefined,
            _ => Value::array(mapped),
        }))
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        if self.frames.len() >= self.max_call_depth {
            return self.throw(ScriptError::stack_overflow(), span);
        }

        let call_env = closure.scope.function_child();
        let mut args = args.into_iter();
        for param in &closure.function.params {
            call_env.define(&param.name, args.next().unwrap_or(Value::Undefined), true);
        }

        self.frames.push(Frame {
            name: closure.name.clone(),
            call_site: span,
        });
        let saved = std::mem::replace(&mut self.env, call_env);
        let result = match &closure.function.body {
            FunctionBody::Block(block) => {
                self.hoist_vars(&block.stmts);
                self.exec_stmts(&block.stmts).map(|()| Value::Undefined)
            }
            FunctionBody::Expr(expr) => self.eval_expr(expr),
        };
        self.env = saved;
        self.frames.pop();

        match result {
            Err(EvalError::Return(value)) => Ok(value),
            other => other,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn push_frame_line(stack: &mut String, name: Option<&str>, span: Span) {
    let location = format!("<anonymous>:{}:{}", span.start_line, span.start_col);
    match name {
        Some(name) => stack.push_str(&format!("\n    at {name} ({location})")),
        None => stack.push_str(&format!("\n    at {location}")),
    }
}

/// Names that resolve without a binding.
fn builtin_constant(name: &str) -> Option<Value> {
    match name {
        "undefined" => Some(Value::Undefined),
        "NaN" => Some(Value::Number(f64::NAN)),
        "Infinity" => Some(Value::Number(f64::INFINITY)),
        _ => None,
    }
}

/// A new scope under `parent` holding copies of `names` as bound in `from`.
fn copy_bindings(from: &Environment, parent: &Environment, names: &[(String, bool)]) -> Environment {
    let env = parent.child();
    for (name, mutable) in names {
        if let Some(value) = from.get(name) {
            env.define(name, value, *mutable);
        }
    }
    env
}

/// `var` names declared in `stmts`, not descending into nested functions.
fn collect_var_names(stmts: &[Stmt], names: &mut Vec<String>) {
    for stmt in stmts {
        collect_var_names_in(stmt, names);
    }
}

fn collect_var_names_in(stmt: &Stmt, names: &mut Vec<String>) {
    match stmt {
        Stmt::VarDecl(decl) if decl.kind == VarKind::Var => {
            names.extend(decl.declarators.iter().map(|d| d.name.name.clone()));
        }
        Stmt::If(stmt) => {
            collect_var_names_in(&stmt.then_branch, names);
            if let Some(else_branch) = &stmt.else_branch {
                collect_var_names_in(else_branch, names);
            }
        }
        Stmt::While(stmt) | Stmt::DoWhile(stmt) => collect_var_names_in(&stmt.body, names),
        Stmt::For(stmt) => {
            if let Some(ForInit::VarDecl(decl)) = &stmt.init {
                if decl.kind == VarKind::Var {
                    names.extend(decl.declarators.iter().map(|d| d.name.name.clone()));
                }
            }
            collect_var_names_in(&stmt.body, names);
        }
        Stmt::Block(block) => collect_var_names(&block.stmts, names),
        _ => {}
    }
}

/// Source-like label for a callee in "is not a function" messages.
fn callee_label(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::Member { object, property } => match property.as_ref() {
            PropertyKey::Named(ident) => format!("{}.{}", callee_label(object), ident.name),
            PropertyKey::Computed(_) => format!("{}[...]", callee_label(object)),
        },
        ExprKind::Paren(inner) => callee_label(inner),
        _ => "expression".to_string(),
    }
}

/// Arithmetic, comparison and equality operators.
pub fn binary_op(op: BinOp, left: &Value, right: &Value) -> Value {
    match op {
        BinOp::Add => {
            let concatenates = |v: &Value| {
                matches!(
                    v,
                    Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
                )
            };
            if concatenates(left) || concatenates(right) {
                Value::String(format!("{left}{right}"))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinOp::Eq => Value::Bool(left.loose_equals(right)),
        BinOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            Value::Bool(compare(op, left, right))
        }
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> bool {
    use std::cmp::Ordering;
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    match (op, ordering) {
        (_, None) => false,
        (BinOp::Less, Some(o)) => o == Ordering::Less,
        (BinOp::Greater, Some(o)) => o == Ordering::Greater,
        (BinOp::LessEq, Some(o)) => o != Ordering::Greater,
        (BinOp::GreaterEq, Some(o)) => o != Ordering::Less,
        _ => false,
    }
}
