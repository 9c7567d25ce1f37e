//! The tree-walking evaluator and the public `Runner` entry point.
//!
//! `Interp` walks the AST recursively. Expression evaluation is strictly
//! left-to-right; `break`/`continue`/`return` travel as [`Flow`] signals on
//! the error channel and are absorbed by the nearest loop or call frame,
//! never by `try/catch`.

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;

use crate::{
    args::CallArgs,
    ast::{BinOp, CmpOp, Expr, Stmt},
    attrs,
    builtins::install_globals,
    classes::ClassTable,
    exception::{Error, ExecResult, Flow, RunResult},
    ffi::FfiSink,
    io::PrintWriter,
    object::Object,
    parse::parse,
    scope::{Scope, ScopeRef},
    tokenize::tokenize,
    value::{BoundCallee, Function, Instance, Key, Value},
};

/// Configures and runs one program: tokenize, parse, evaluate.
pub struct Runner {
    source: String,
    script_path: Option<PathBuf>,
    argv: Vec<String>,
    ffi: Option<Box<dyn FfiSink>>,
}

impl Runner {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            script_path: None,
            argv: Vec::new(),
            ffi: None,
        }
    }

    /// Sets the path of the executed source file; statement-form includes
    /// resolve relative to its directory.
    #[must_use]
    pub fn with_script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_path = Some(path.into());
        self
    }

    /// Sets the values exposed as `__argv` / `__argc`.
    #[must_use]
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    /// Attaches a host sink for `ffi` blocks.
    #[must_use]
    pub fn with_ffi(mut self, sink: Box<dyn FfiSink>) -> Self {
        self.ffi = Some(sink);
        self
    }

    /// Runs the program to completion, returning its top-level value.
    pub fn run(self, print: &mut dyn PrintWriter) -> RunResult<Object> {
        let mut interp = Interp::new(self.argv);
        interp.script_dir = self
            .script_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        interp.ffi = self.ffi;
        let value = interp.run_source(&self.source, print)?;
        Ok(Object::from_value(&value))
    }
}

/// The evaluator: class table, global scope, include caches, FFI sink.
pub(crate) struct Interp {
    pub(crate) classes: ClassTable,
    pub(crate) globals: ScopeRef,
    pub(crate) script_dir: Option<PathBuf>,
    pub(crate) included: AHashSet<PathBuf>,
    pub(crate) module_cache: AHashMap<PathBuf, Value>,
    pub(crate) ffi: Option<Box<dyn FfiSink>>,
}

impl Interp {
    pub fn new(argv: Vec<String>) -> Self {
        let globals = Scope::new_root();
        install_globals(&globals, &argv);
        Self {
            classes: ClassTable::default(),
            globals,
            script_dir: None,
            included: AHashSet::new(),
            module_cache: AHashMap::new(),
            ffi: None,
        }
    }

    /// Tokenizes, parses, and evaluates one source text against the global
    /// scope. A top-level `return` yields its value.
    pub fn run_source(&mut self, source: &str, print: &mut dyn PrintWriter) -> RunResult<Value> {
        let ast = parse(tokenize(source)?)?;
        let globals = self.globals.clone();
        match self.exec_block(&ast, &globals, print) {
            Ok(value) | Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break) => Err(Error::syntax("'break' outside of a loop")),
            Err(Flow::Continue) => Err(Error::syntax("'continue' outside of a loop")),
            Err(Flow::Error(err)) => Err(err),
        }
    }

    /// Executes statements in order; the block's value is its last
    /// statement's value.
    pub(crate) fn exec_block(
        &mut self,
        stmts: &[Stmt],
        scope: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> ExecResult<Value> {
        let mut result = Value::Null;
        for stmt in stmts {
            result = self.exec_stmt(stmt, scope, print)?;
        }
        Ok(result)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: &ScopeRef, print: &mut dyn PrintWriter) -> ExecResult<Value> {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, scope, print),
            Stmt::Assign { name, value } => {
                let assigned = self.eval_assign_rhs(value, scope, print)?;
                Scope::assign(scope, name, assigned.clone());
                Ok(assigned)
            }
            Stmt::AssignAttr { object, attr, value } => {
                let target = self.eval_expr(object, scope, print)?;
                let assigned = self.eval_expr(value, scope, print)?;
                attrs::set_attr(&target, attr, assigned.clone())?;
                Ok(assigned)
            }
            Stmt::AssignIndex { object, index, value } => {
                let target = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let assigned = self.eval_expr(value, scope, print)?;
                set_index(&target, &index, assigned.clone())?;
                Ok(assigned)
            }
            Stmt::AugAssign { name, op, value } => {
                let current = Scope::lookup(scope, name)
                    .ok_or_else(|| Error::name(format!("{name} not defined")))?;
                let operand = self.eval_expr(value, scope, print)?;
                let updated = binary_op(*op, &current, &operand)?;
                Scope::assign(scope, name, updated.clone());
                Ok(updated)
            }
            Stmt::AugAssignAttr {
                object,
                attr,
                op,
                value,
            } => {
                let target = self.eval_expr(object, scope, print)?;
                let current = attrs::get_attr_for_aug(&target, attr)?;
                let operand = self.eval_expr(value, scope, print)?;
                let updated = binary_op(*op, &current, &operand)?;
                attrs::set_attr(&target, attr, updated.clone())?;
                Ok(updated)
            }
            Stmt::AugAssignIndex {
                object,
                index,
                op,
                value,
            } => {
                let target = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let current = get_index(&target, &index)?;
                let operand = self.eval_expr(value, scope, print)?;
                let updated = binary_op(*op, &current, &operand)?;
                set_index(&target, &index, updated)?;
                Ok(Value::Null)
            }
            Stmt::FuncDef(decl) => {
                match decl.name.rsplit_once('.') {
                    // `def Class.method(...)` attaches to the class table,
                    // creating the record when the class is not yet declared.
                    Some((class_name, method_name)) => {
                        let function = Rc::new(Function {
                            name: Some(Rc::from(method_name)),
                            params: decl.params.clone(),
                            body: decl.body.clone(),
                            scope: scope.clone(),
                        });
                        self.classes.register_method(class_name, method_name, function);
                    }
                    None => {
                        let function = Rc::new(Function {
                            name: Some(Rc::from(decl.name.as_str())),
                            params: decl.params.clone(),
                            body: decl.body.clone(),
                            scope: scope.clone(),
                        });
                        Scope::assign(scope, &decl.name, Value::Function(function));
                    }
                }
                Ok(Value::Null)
            }
            Stmt::Class(decl) => {
                let qualified = self.classes.register(decl, scope);
                Scope::assign(scope, &decl.name, Value::Class(qualified));
                Ok(Value::Null)
            }
            Stmt::IfChain { branches, else_body } => {
                for (cond, body) in branches {
                    if self.eval_expr(cond, scope, print)?.is_truthy() {
                        return self.exec_block(body, scope, print);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body, scope, print),
                    None => Ok(Value::Null),
                }
            }
            Stmt::For {
                var,
                iterable,
                step,
                body,
            } => {
                let items = match self.eval_expr(iterable, scope, print)? {
                    Value::List(items) => items,
                    _ => return Err(Error::type_error("Expected list for 'for' loop iterable").into()),
                };
                let stride = match step {
                    Some(step) => match self.eval_expr(step, scope, print)? {
                        Value::Int(n) if n > 0 => n as usize,
                        _ => {
                            return Err(Error::type_error("for loop step must be a positive integer").into());
                        }
                    },
                    None => 1,
                };
                let mut index = 0usize;
                loop {
                    // Indexed against the live list so mutation during the
                    // loop cannot read out of bounds.
                    let item = {
                        let items = items.borrow();
                        if index >= items.len() {
                            break;
                        }
                        items[index].clone()
                    };
                    Scope::insert(scope, var, item);
                    match self.exec_block(body, scope, print) {
                        Ok(_) | Err(Flow::Continue) => {}
                        Err(Flow::Break) => break,
                        Err(other) => return Err(other),
                    }
                    index += stride;
                }
                Ok(Value::Null)
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, scope, print)?.is_truthy() {
                    match self.exec_block(body, scope, print) {
                        Ok(_) | Err(Flow::Continue) => {}
                        Err(Flow::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Null)
            }
            Stmt::Break => Err(Flow::Break),
            Stmt::Continue => Err(Flow::Continue),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, scope, print)?,
                    None => Value::Null,
                };
                Err(Flow::Return(value))
            }
            Stmt::Global(name) => {
                Scope::declare_global(scope, name);
                Ok(Value::Null)
            }
            Stmt::Try { binder, body, handler } => match self.exec_block(body, scope, print) {
                Ok(value) => Ok(value),
                Err(Flow::Error(err)) => {
                    if let Some(binder) = binder {
                        Scope::assign(scope, binder, Value::str(err.message()));
                    }
                    self.exec_block(handler, scope, print)
                }
                Err(signal) => Err(signal),
            },
            Stmt::Throw(expr) => {
                let value = self.eval_expr(expr, scope, print)?;
                Err(Error::user(value.to_display()).into())
            }
            Stmt::Include(path) => {
                self.exec_include(path, scope, print)?;
                Ok(Value::Null)
            }
            Stmt::Ffi(code) => {
                self.exec_ffi(code, scope)?;
                Ok(Value::Null)
            }
        }
    }

    /// The right-hand side of `name = expr`: a bare `**expr` stores the
    /// keyword-unpack marker, and an empty-literal RHS that somehow
    /// evaluated to Null coerces back to its empty container.
    fn eval_assign_rhs(&mut self, value: &Expr, scope: &ScopeRef, print: &mut dyn PrintWriter) -> ExecResult<Value> {
        if let Expr::KwUnpack(inner) = value {
            return match self.eval_expr(inner, scope, print)? {
                Value::Dict(entries) | Value::KwUnpack(entries) => Ok(Value::KwUnpack(entries)),
                _ => Err(Error::type_error("Right-hand side of ** must evaluate to a dict").into()),
            };
        }
        let assigned = self.eval_expr(value, scope, print)?;
        if matches!(assigned, Value::Null) {
            if let Expr::List(items) = value
                && items.is_empty()
            {
                return Ok(Value::list(Vec::new()));
            }
            if let Expr::Dict(entries) = value
                && entries.is_empty()
            {
                return Ok(Value::dict(IndexMap::new()));
            }
        }
        Ok(assigned)
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: &ScopeRef, print: &mut dyn PrintWriter) -> ExecResult<Value> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Var(name) => Scope::lookup(scope, name)
                .ok_or_else(|| Error::name(format!("Undefined variable {name}")).into()),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, scope, print)?);
                }
                Ok(Value::list(values))
            }
            Expr::Dict(items) => {
                let mut entries = IndexMap::new();
                for (key, value) in items {
                    let key = Key::from_value(&self.eval_expr(key, scope, print)?)?;
                    let value = self.eval_expr(value, scope, print)?;
                    entries.insert(key, value);
                }
                Ok(Value::dict(entries))
            }
            Expr::Block(stmts) => self.exec_block(stmts, scope, print),
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, scope, print)?;
                let right = self.eval_expr(right, scope, print)?;
                Ok(binary_op(*op, &left, &right)?)
            }
            Expr::Compare { op, left, right } => {
                let left = self.eval_expr(left, scope, print)?;
                let right = self.eval_expr(right, scope, print)?;
                Ok(compare_op(*op, &left, &right)?)
            }
            Expr::And(left, right) => {
                if self.eval_expr(left, scope, print)?.is_truthy() {
                    self.eval_expr(right, scope, print)
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Expr::Or(left, right) => {
                if self.eval_expr(left, scope, print)?.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    self.eval_expr(right, scope, print)
                }
            }
            Expr::Not(inner) => Ok(Value::Bool(!self.eval_expr(inner, scope, print)?.is_truthy())),
            Expr::In {
                item,
                container,
                negated,
            } => {
                let item = self.eval_expr(item, scope, print)?;
                let container = self.eval_expr(container, scope, print)?;
                let found = contains(&item, &container)?;
                Ok(Value::Bool(found != *negated))
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(cond, scope, print)?.is_truthy() {
                    self.eval_expr(then, scope, print)
                } else {
                    self.eval_expr(otherwise, scope, print)
                }
            }
            Expr::Neg(inner) => match self.eval_expr(inner, scope, print)? {
                Value::Int(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| Error::type_error("integer overflow").into()),
                Value::Float(f) => Ok(Value::Float(-f)),
                Value::Bool(b) => Ok(Value::Int(-i64::from(b))),
                other => Err(Error::type_error(format!(
                    "bad operand type for unary -: '{}'",
                    other.type_name()
                ))
                .into()),
            },
            Expr::Unpack(inner) => self.eval_expr(inner, scope, print),
            Expr::KwUnpack(inner) => match self.eval_expr(inner, scope, print)? {
                Value::Dict(entries) | Value::KwUnpack(entries) => {
                    let copy = entries.borrow().clone();
                    Ok(Value::dict(copy))
                }
                _ => Err(Error::type_error("** unpack argument must be a dict").into()),
            },
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee, scope, print)?;
                let args = self.eval_call_args(args, scope, print)?;
                Ok(self.call_value(callee, args, print)?)
            }
            Expr::GetAttr { object, attr } => {
                let object = self.eval_expr(object, scope, print)?;
                Ok(attrs::get_attr(&self.classes, &object, attr)?)
            }
            Expr::Index { object, index } => {
                let object = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                Ok(get_index(&object, &index)?)
            }
            Expr::Slice {
                object,
                start,
                stop,
                step,
            } => {
                let object = self.eval_expr(object, scope, print)?;
                let start = self.eval_slice_part(start.as_deref(), scope, print)?;
                let stop = self.eval_slice_part(stop.as_deref(), scope, print)?;
                let step = self.eval_slice_part(step.as_deref(), scope, print)?;
                Ok(slice_value(&object, start, stop, step)?)
            }
            Expr::Lambda { params, body } => Ok(Value::Function(Rc::new(Function {
                name: None,
                params: params.clone(),
                body: body.clone(),
                scope: scope.clone(),
            }))),
            Expr::Match {
                subject,
                arms,
                default,
            } => {
                let subject = self.eval_expr(subject, scope, print)?;
                for arm in arms {
                    for pattern in &arm.patterns {
                        let candidate = self.eval_expr(pattern, scope, print)?;
                        if subject.equals(&candidate) {
                            return self.exec_block(&arm.body, scope, print);
                        }
                    }
                }
                match default {
                    Some(body) => self.exec_block(body, scope, print),
                    None => Ok(Value::Null),
                }
            }
            Expr::ListComp {
                expr,
                var,
                iterable,
                step,
                conds,
            } => {
                let items = match self.eval_expr(iterable, scope, print)? {
                    Value::List(items) => items,
                    other => {
                        return Err(Error::type_error(format!(
                            "comprehension iterable must be a list, not {}",
                            other.type_name()
                        ))
                        .into());
                    }
                };
                let stride = match self.eval_expr(step, scope, print)? {
                    Value::Int(n) if n > 0 => n as usize,
                    _ => {
                        return Err(Error::type_error("comprehension step must be a positive integer").into());
                    }
                };
                let mut collected = Vec::new();
                let mut index = 0usize;
                loop {
                    let item = {
                        let items = items.borrow();
                        if index >= items.len() {
                            break;
                        }
                        items[index].clone()
                    };
                    Scope::insert(scope, var, item);
                    let mut keep = true;
                    for cond in conds {
                        if !self.eval_expr(cond, scope, print)?.is_truthy() {
                            keep = false;
                            break;
                        }
                    }
                    if keep {
                        collected.push(self.eval_expr(expr, scope, print)?);
                    }
                    index += stride;
                }
                Ok(Value::list(collected))
            }
            Expr::DictComp {
                key,
                value,
                var,
                iterable,
                cond,
            } => {
                let items = match self.eval_expr(iterable, scope, print)? {
                    Value::List(items) => items,
                    other => {
                        return Err(Error::type_error(format!(
                            "comprehension iterable must be a list, not {}",
                            other.type_name()
                        ))
                        .into());
                    }
                };
                let mut entries = IndexMap::new();
                let mut index = 0usize;
                loop {
                    let item = {
                        let items = items.borrow();
                        if index >= items.len() {
                            break;
                        }
                        items[index].clone()
                    };
                    Scope::insert(scope, var, item);
                    let keep = match cond {
                        Some(cond) => self.eval_expr(cond, scope, print)?.is_truthy(),
                        None => true,
                    };
                    if keep {
                        let entry_key = Key::from_value(&self.eval_expr(key, scope, print)?)?;
                        let entry_value = self.eval_expr(value, scope, print)?;
                        entries.insert(entry_key, entry_value);
                    }
                    index += 1;
                }
                Ok(Value::dict(entries))
            }
        }
    }

    fn eval_slice_part(
        &mut self,
        part: Option<&Expr>,
        scope: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> ExecResult<Option<Value>> {
        match part {
            Some(expr) => Ok(Some(self.eval_expr(expr, scope, print)?)),
            None => Ok(None),
        }
    }

    /// Evaluates an expression where control signals make no sense
    /// (default arguments, constructor field defaults); a stray signal
    /// becomes a syntax error.
    pub(crate) fn eval_to_value(
        &mut self,
        expr: &Expr,
        scope: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        match self.eval_expr(expr, scope, print) {
            Ok(value) => Ok(value),
            Err(Flow::Error(err)) => Err(err),
            Err(Flow::Return(_)) => Err(Error::syntax("'return' outside of a function")),
            Err(Flow::Break) => Err(Error::syntax("'break' outside of a loop")),
            Err(Flow::Continue) => Err(Error::syntax("'continue' outside of a loop")),
        }
    }

    /// Calls any callable value. Stray `break`/`continue` escaping a
    /// function body surface here as errors; `return` yields its value; a
    /// body without `return` yields its last statement's value.
    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        mut args: CallArgs,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(&function, args, print),
            Value::Builtin(builtin) => self.call_builtin(builtin, args, print),
            Value::Bound(bound) => match &bound.callee {
                BoundCallee::Function(function) => {
                    args.pos.insert(0, bound.receiver.clone());
                    self.call_function(function, args, print)
                }
                BoundCallee::Str(method) => {
                    let Value::Str(receiver) = &bound.receiver else {
                        return Err(Error::type_error("string method on non-string receiver"));
                    };
                    let mut values = args.pos;
                    values.extend(args.kwargs.into_values());
                    attrs::call_str_method(receiver, *method, &values)
                }
                BoundCallee::List(method) => {
                    let Value::List(receiver) = &bound.receiver else {
                        return Err(Error::type_error("list method on non-list receiver"));
                    };
                    let mut values = args.pos;
                    values.extend(args.kwargs.into_values());
                    attrs::call_list_method(receiver, *method, &values)
                }
                BoundCallee::File(method) => {
                    let Value::File(receiver) = &bound.receiver else {
                        return Err(Error::type_error("file method on non-file receiver"));
                    };
                    let mut values = args.pos;
                    values.extend(args.kwargs.into_values());
                    attrs::call_file_method(receiver, *method, &values)
                }
            },
            Value::Class(name) => self.construct(&name, args, print),
            other => Err(Error::type_error(format!(
                "Attempted to call non-callable: {}",
                other.repr()
            ))),
        }
    }

    fn call_function(&mut self, function: &Rc<Function>, args: CallArgs, print: &mut dyn PrintWriter) -> RunResult<Value> {
        let local = Scope::child(&function.scope);
        self.bind_params(&function.params, args, &function.scope, &local, print)?;
        match self.exec_block(&function.body, &local, print) {
            Ok(value) | Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break) => Err(Error::syntax("'break' outside of a loop")),
            Err(Flow::Continue) => Err(Error::syntax("'continue' outside of a loop")),
            Err(Flow::Error(err)) => Err(err),
        }
    }

    /// Constructs an instance: positional args bind to the field list (own
    /// fields, then inherited), keywords bind by field name, and defaults
    /// evaluate at construction time with the class's nested names visible.
    fn construct(&mut self, class_name: &Rc<str>, args: CallArgs, print: &mut dyn PrintWriter) -> RunResult<Value> {
        if !self.classes.contains(class_name) {
            return Err(Error::type_error(format!("Unknown class '{class_name}'")));
        }
        let fields = self.classes.constructor_fields(class_name);
        if args.pos.len() > fields.len() {
            return Err(Error::type_error(format!(
                "{class_name} expects {} fields, got {}",
                fields.len(),
                args.pos.len()
            )));
        }

        // Defaults see the class's nested classes by simple name.
        let env = {
            let nested: Vec<(String, Rc<str>)> = self
                .classes
                .get(class_name)
                .map(|def| {
                    def.nested
                        .iter()
                        .map(|(simple, qualified)| (simple.clone(), qualified.clone()))
                        .collect()
                })
                .unwrap_or_default();
            if nested.is_empty() {
                self.globals.clone()
            } else {
                let env = Scope::child(&self.globals);
                for (simple, qualified) in nested {
                    Scope::insert(&env, simple, Value::Class(qualified));
                }
                env
            }
        };

        let mut pos = args.pos.into_iter();
        let mut kwargs = args.kwargs;
        let mut values = IndexMap::new();
        for (name, default) in fields {
            let value = if let Some(value) = pos.next() {
                value
            } else if let Some(value) = kwargs.shift_remove(name.as_ref()) {
                value
            } else if let Some(default) = &default {
                self.eval_to_value(default, &env, print)?
            } else {
                Value::Null
            };
            values.insert(name.to_string(), value);
        }
        if !kwargs.is_empty() {
            let unexpected = kwargs.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(Error::arity(format!("Unexpected keyword arguments: {unexpected}")));
        }

        Ok(Value::Instance(Rc::new(std::cell::RefCell::new(Instance {
            class: class_name.clone(),
            fields: values,
        }))))
    }
}

// ---- operator helpers ----

enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        _ => None,
    }
}

/// `+ - * / %` on numbers; `+` additionally concatenates two strings or
/// two lists. `/` is true division and always produces a Float.
fn binary_op(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        return numeric_op(op, a, b);
    }
    if op == BinOp::Add {
        if let (Value::Str(a), Value::Str(b)) = (left, right) {
            let mut joined = a.to_string();
            joined.push_str(b);
            return Ok(Value::str(joined));
        }
        if let (Value::List(a), Value::List(b)) = (left, right) {
            let mut joined = a.borrow().clone();
            joined.extend(b.borrow().iter().cloned());
            return Ok(Value::list(joined));
        }
    }
    Err(Error::type_error(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    )))
}

fn numeric_op(op: BinOp, left: Num, right: Num) -> RunResult<Value> {
    if let (Num::Int(a), Num::Int(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        return match op {
            BinOp::Add => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| Error::type_error("integer overflow")),
            BinOp::Sub => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or_else(|| Error::type_error("integer overflow")),
            BinOp::Mul => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or_else(|| Error::type_error("integer overflow")),
            BinOp::Div => {
                if b == 0 {
                    Err(Error::type_error("division by zero"))
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            BinOp::Mod => {
                if b == 0 {
                    Err(Error::type_error("modulo by zero"))
                } else {
                    // Sign-of-divisor semantics.
                    let mut r = a % b;
                    if r != 0 && (r < 0) != (b < 0) {
                        r += b;
                    }
                    Ok(Value::Int(r))
                }
            }
        };
    }

    let a = match left {
        Num::Int(n) => n as f64,
        Num::Float(f) => f,
    };
    let b = match right {
        Num::Int(n) => n as f64,
        Num::Float(f) => f,
    };
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                Err(Error::type_error("float division by zero"))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinOp::Mod => {
            if b == 0.0 {
                Err(Error::type_error("float modulo"))
            } else {
                let mut r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r += b;
                }
                Ok(Value::Float(r))
            }
        }
    }
}

/// `==`/`!=` work structurally on all values; ordering is defined only for
/// two numbers or two strings.
fn compare_op(op: CmpOp, left: &Value, right: &Value) -> RunResult<Value> {
    match op {
        CmpOp::Eq => return Ok(Value::Bool(left.equals(right))),
        CmpOp::Ne => return Ok(Value::Bool(!left.equals(right))),
        _ => {}
    }
    let ordering = if let (Some(a), Some(b)) = (as_num(left), as_num(right)) {
        let a = match a {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        };
        let b = match b {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        };
        a.partial_cmp(&b)
    } else if let (Value::Str(a), Value::Str(b)) = (left, right) {
        Some(a.cmp(b))
    } else {
        return Err(Error::type_error(format!(
            "Cannot compare with operator '{}' between {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    let Some(ordering) = ordering else {
        // NaN ordering comparisons are all false.
        return Ok(Value::Bool(false));
    };
    let result = match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Ge => ordering.is_ge(),
        CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
    };
    Ok(Value::Bool(result))
}

/// Membership: lists by element equality, strings by substring, dicts by
/// key.
fn contains(item: &Value, container: &Value) -> RunResult<bool> {
    match container {
        Value::List(items) => Ok(items.borrow().iter().any(|candidate| candidate.equals(item))),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_ref())),
            other => Err(Error::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Dict(entries) | Value::KwUnpack(entries) => {
            let key = Key::from_value(item)?;
            Ok(entries.borrow().contains_key(&key))
        }
        other => Err(Error::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// `x[i]` on lists (negative indices allowed), strings, dicts, and
/// instances (string keys address fields; `__type__` reads the class).
fn get_index(object: &Value, index: &Value) -> RunResult<Value> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let idx = normalize_index(index, items.len(), "list")?;
            Ok(items[idx].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(index, chars.len(), "string")?;
            Ok(Value::str(chars[idx].to_string()))
        }
        Value::Dict(entries) | Value::KwUnpack(entries) => {
            let key = Key::from_value(index)?;
            entries
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::type_error(format!("key not found: {}", key.repr())))
        }
        Value::Instance(instance) => {
            let Value::Str(name) = index else {
                return Err(Error::type_error("instance fields are indexed by string"));
            };
            let instance = instance.borrow();
            if name.as_ref() == "__type__" {
                return Ok(Value::str(instance.class.as_ref()));
            }
            instance
                .fields
                .get(name.as_ref())
                .cloned()
                .ok_or_else(|| Error::type_error(format!("key not found: '{name}'")))
        }
        other => Err(Error::type_error(format!(
            "Indexing only supported on lists, strings, and dicts, not {}",
            other.type_name()
        ))),
    }
}

/// `x[i] = v` on lists, dicts, and instances.
fn set_index(object: &Value, index: &Value, value: Value) -> RunResult<()> {
    match object {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let idx = normalize_index(index, len, "list")?;
            items[idx] = value;
            Ok(())
        }
        Value::Dict(entries) | Value::KwUnpack(entries) => {
            let key = Key::from_value(index)?;
            entries.borrow_mut().insert(key, value);
            Ok(())
        }
        Value::Instance(instance) => {
            let Value::Str(name) = index else {
                return Err(Error::type_error("instance fields are indexed by string"));
            };
            instance.borrow_mut().fields.insert(name.to_string(), value);
            Ok(())
        }
        other => Err(Error::type_error(format!(
            "Cannot index-assign to non-list/dict object: {}",
            other.repr()
        ))),
    }
}

fn normalize_index(index: &Value, len: usize, what: &str) -> RunResult<usize> {
    let Value::Int(raw) = index else {
        return Err(Error::type_error(format!(
            "{what} indices must be integers, not {}",
            index.type_name()
        )));
    };
    let len = len as i64;
    let idx = if *raw < 0 { raw + len } else { *raw };
    if idx < 0 || idx >= len {
        return Err(Error::type_error(format!("{what} index out of range")));
    }
    Ok(idx as usize)
}

/// Slicing with optional start/stop/step, valid on lists and strings only.
/// Missing components are null; negative indices and steps follow the
/// usual clamp-and-stride rules.
fn slice_value(
    object: &Value,
    start: Option<Value>,
    stop: Option<Value>,
    step: Option<Value>,
) -> RunResult<Value> {
    let step = match slice_part(step)? {
        Some(0) => return Err(Error::type_error("slice step cannot be zero")),
        Some(step) => step,
        None => 1,
    };
    let start = slice_part(start)?;
    let stop = slice_part(stop)?;
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let indices = slice_indices(items.len(), start, stop, step);
            Ok(Value::list(indices.map(|idx| items[idx].clone()).collect()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let indices = slice_indices(chars.len(), start, stop, step);
            Ok(Value::str(indices.map(|idx| chars[idx]).collect::<String>()))
        }
        other => Err(Error::type_error(format!(
            "Slicing only supported on lists and strings, not {}",
            other.type_name()
        ))),
    }
}

fn slice_part(part: Option<Value>) -> RunResult<Option<i64>> {
    match part {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(n)) => Ok(Some(n)),
        Some(other) => Err(Error::type_error(format!(
            "slice indices must be integers, not {}",
            other.type_name()
        ))),
    }
}

/// Resolved index sequence for a slice over a sequence of `len` items.
fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> impl Iterator<Item = usize> {
    let len = len as i64;
    let clamp = |idx: i64, low: i64, high: i64| idx.clamp(low, high);
    let normalize = |idx: i64| if idx < 0 { idx + len } else { idx };

    let (begin, end) = if step > 0 {
        let begin = clamp(start.map_or(0, normalize), 0, len);
        let end = clamp(stop.map_or(len, normalize), 0, len);
        (begin, end)
    } else {
        let begin = clamp(start.map_or(len - 1, normalize), -1, len - 1);
        let end = clamp(stop.map_or(-1, normalize), -1, len - 1);
        (begin, end)
    };

    let mut indices = Vec::new();
    let mut current = begin;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        indices.push(current as usize);
        current += step;
    }
    indices.into_iter()
}
