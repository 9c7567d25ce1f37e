//! Module inclusion.
//!
//! Statement-form `include "path"` evaluates the loaded file into the
//! current scope; call-form `include(expr)` builds a module object (a dict
//! of constructors and top-level functions) while registering the module's
//! classes into the shared class table so cross-module inheritance works.
//! Both forms resolve a file at most once: repeats are no-ops or cache
//! hits, keyed by canonical path.

use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    ast::Stmt,
    exception::{Error, ExecResult, RunResult},
    io::PrintWriter,
    parse::parse,
    run::Interp,
    scope::ScopeRef,
    tokenize::tokenize,
    value::{Function, Key, Value},
};

/// Search list for `@`-prefixed include names, in order.
const INCLUDE_PATH: &[&str] = &["tests", "lib", "examples"];

impl Interp {
    /// Statement-form include: the loaded file's statements run in the
    /// current scope, so its top-level bindings leak in.
    pub(crate) fn exec_include(
        &mut self,
        raw: &str,
        scope: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> ExecResult<()> {
        let path = self.resolve_include(raw, false)?;
        let canonical = canonical(&path);
        if !self.included.insert(canonical) {
            return Ok(());
        }
        let source = read_source(&path, raw)?;
        let ast = parse(tokenize(&source)?)?;
        self.exec_block(&ast, scope, print)?;
        Ok(())
    }

    /// Call-form include: returns the module object.
    pub(crate) fn include_module(&mut self, raw: &str) -> RunResult<Value> {
        let path = self.resolve_include(raw, true)?;
        let canonical = canonical(&path);
        if let Some(cached) = self.module_cache.get(&canonical) {
            return Ok(cached.clone());
        }
        let source = read_source(&path, raw)?;
        let ast = parse(tokenize(&source)?)?;
        let module = self.build_module(&ast);
        self.module_cache.insert(canonical, module.clone());
        Ok(module)
    }

    /// Builds the module object in two passes: classes first (registered
    /// into the shared table, constructors exported), then top-level
    /// functions, with dotted definitions attaching as methods to the
    /// module's own classes.
    fn build_module(&mut self, ast: &[Stmt]) -> Value {
        let globals = self.globals.clone();
        let mut module = IndexMap::new();
        let mut local_classes: Vec<String> = Vec::new();

        for stmt in ast {
            if let Stmt::Class(decl) = stmt {
                let qualified = self.classes.register(decl, &globals);
                local_classes.push(qualified.to_string());
                module.insert(Key::from_name(&decl.name), Value::Class(qualified));
            }
        }

        for stmt in ast {
            if let Stmt::FuncDef(decl) = stmt {
                match decl.name.rsplit_once('.') {
                    Some((class_name, method_name)) => {
                        let is_local = local_classes
                            .iter()
                            .any(|local| class_name == local.as_str() || class_name.starts_with(&format!("{local}.")));
                        if is_local {
                            let function = Rc::new(Function {
                                name: Some(Rc::from(method_name)),
                                params: decl.params.clone(),
                                body: decl.body.clone(),
                                scope: globals.clone(),
                            });
                            self.classes.register_method(class_name, method_name, function);
                        }
                    }
                    None => {
                        let function = Rc::new(Function {
                            name: Some(Rc::from(decl.name.as_str())),
                            params: decl.params.clone(),
                            body: decl.body.clone(),
                            scope: globals.clone(),
                        });
                        module.insert(Key::from_name(&decl.name), Value::Function(function));
                    }
                }
            }
        }
        Value::dict(module)
    }

    /// Resolution order: `@name` searches the path list; otherwise the
    /// directory of the initially executed source file, then the working
    /// directory. The call form appends `.fn` when missing.
    fn resolve_include(&self, raw: &str, call_form: bool) -> RunResult<PathBuf> {
        let mut name = raw.to_owned();
        if call_form && !name.ends_with(".fn") {
            name.push_str(".fn");
        }

        if let Some(stripped) = name.strip_prefix('@') {
            for dir in INCLUDE_PATH {
                let candidate = Path::new(dir).join(stripped);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            let searched = INCLUDE_PATH.join(", ");
            return Err(Error::io(format!("{stripped} not found in [{searched}]")));
        }

        if let Some(dir) = &self.script_dir {
            let candidate = dir.join(&name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        let candidate = PathBuf::from(&name);
        if candidate.exists() {
            return Ok(candidate);
        }
        Err(Error::io(format!("Included file '{raw}' not found")))
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn read_source(path: &Path, raw: &str) -> RunResult<String> {
    fs::read_to_string(path).map_err(|err| Error::io(format!("Included file '{raw}' not readable: {err}")))
}
