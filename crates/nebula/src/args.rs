//! Call-site argument evaluation and parameter binding.
//!
//! Evaluation splices `*expr` lists in place and merges `**expr` dicts into
//! the keyword bundle. Binding walks the formal parameters in order:
//! keyword match first, then the next positional, then the default
//! expression (evaluated lazily, in the function's captured scope), and
//! fails with an arity error otherwise. `*name` and `**name` absorb
//! whatever remains.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::{
    ast::{CallArg, Param},
    exception::{Error, ExecResult, RunResult},
    io::PrintWriter,
    run::Interp,
    scope::{Scope, ScopeRef},
    value::{Key, Value},
};

/// Evaluated arguments for one call: positionals in order plus the keyword
/// bundle in insertion order.
#[derive(Debug, Default)]
pub(crate) struct CallArgs {
    pub pos: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn positional(pos: Vec<Value>) -> Self {
        Self {
            pos,
            kwargs: IndexMap::new(),
        }
    }
}

impl Interp {
    /// Evaluates call arguments left-to-right into a [`CallArgs`].
    ///
    /// A plain argument whose value is a `**` marker (a variable holding
    /// one) merges into the keyword bundle instead of becoming positional.
    pub(crate) fn eval_call_args(
        &mut self,
        args: &[CallArg],
        scope: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> ExecResult<CallArgs> {
        let mut out = CallArgs::default();
        for arg in args {
            match arg {
                CallArg::Pos(expr) => {
                    let value = self.eval_expr(expr, scope, print)?;
                    if let Value::KwUnpack(entries) = value {
                        merge_keywords(&mut out.kwargs, &entries.borrow())?;
                    } else {
                        out.pos.push(value);
                    }
                }
                CallArg::Keyword(name, expr) => {
                    let value = self.eval_expr(expr, scope, print)?;
                    out.kwargs.insert(name.clone(), value);
                }
                CallArg::Unpack(expr) => match self.eval_expr(expr, scope, print)? {
                    Value::List(items) => out.pos.extend(items.borrow().iter().cloned()),
                    _ => return Err(Error::type_error("Can only unpack lists with *").into()),
                },
                CallArg::KwUnpack(expr) => match self.eval_expr(expr, scope, print)? {
                    Value::Dict(entries) | Value::KwUnpack(entries) => {
                        merge_keywords(&mut out.kwargs, &entries.borrow())?;
                    }
                    _ => return Err(Error::type_error("Can only keyword-unpack dicts with **").into()),
                },
            }
        }
        Ok(out)
    }

    /// Binds evaluated arguments to formal parameters inside `local`.
    ///
    /// Default expressions are evaluated at call time in `captured`, the
    /// declaring function's scope chain.
    pub(crate) fn bind_params(
        &mut self,
        params: &[Param],
        args: CallArgs,
        captured: &ScopeRef,
        local: &ScopeRef,
        print: &mut dyn PrintWriter,
    ) -> RunResult<()> {
        let mut pos: VecDeque<Value> = args.pos.into();
        let mut kwargs = args.kwargs;

        for param in params {
            match param {
                Param::Normal { name, default } => {
                    let value = if let Some(value) = kwargs.shift_remove(name) {
                        value
                    } else if let Some(value) = pos.pop_front() {
                        value
                    } else if let Some(default) = default {
                        self.eval_to_value(default, captured, print)?
                    } else {
                        return Err(Error::arity(format!("Missing required argument '{name}'")));
                    };
                    Scope::insert(local, name, value);
                }
                Param::Star(name) => {
                    let rest: Vec<Value> = pos.drain(..).collect();
                    Scope::insert(local, name, Value::list(rest));
                }
                Param::DblStar(name) => {
                    let mut rest = IndexMap::new();
                    for (key, value) in kwargs.drain(..) {
                        rest.insert(Key::from_name(key), value);
                    }
                    Scope::insert(local, name, Value::dict(rest));
                }
            }
        }

        if !kwargs.is_empty() {
            let unexpected = kwargs.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(Error::arity(format!("Unexpected keyword arguments: {unexpected}")));
        }
        if !pos.is_empty() {
            return Err(Error::arity("Too many arguments provided"));
        }
        Ok(())
    }
}

/// Merges a dict's entries into a keyword bundle; keys must be strings.
fn merge_keywords(kwargs: &mut IndexMap<String, Value>, entries: &IndexMap<Key, Value>) -> RunResult<()> {
    for (key, value) in entries {
        let Some(name) = key.as_str() else {
            return Err(Error::type_error("keywords must be strings"));
        };
        kwargs.insert(name.to_owned(), value.clone());
    }
    Ok(())
}
