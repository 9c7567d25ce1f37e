//! Globally pre-bound native functions.
//!
//! Each builtin is an enum variant; the strum derives give the name⇄variant
//! mapping used both to pre-bind the globals and to render
//! `<built-in function print>` reprs. Like user calls, builtins receive
//! evaluated arguments; keyword values are appended positionally.

mod convert;
mod files;
mod iter;
mod print;

use std::io::{self, BufRead, Write as _};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    args::CallArgs,
    exception::{Error, RunResult},
    io::PrintWriter,
    run::Interp,
    scope::{Scope, ScopeRef},
    value::Value,
};

/// Enumerates every interpreter-native builtin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Builtin {
    Print,
    Printf,
    Input,
    Range,
    Type,
    Int,
    Float,
    Str,
    List,
    Dict,
    Length,
    Open,
    Map,
    Filter,
    Reduce,
    Chr,
    Ord,
    Include,
}

/// Pre-binds every builtin plus the constant globals into a scope.
pub(crate) fn install_globals(scope: &ScopeRef, argv: &[String]) {
    for builtin in Builtin::iter() {
        Scope::insert(scope, builtin.to_string(), Value::Builtin(builtin));
    }
    Scope::insert(scope, "True", Value::Bool(true));
    Scope::insert(scope, "False", Value::Bool(false));
    Scope::insert(scope, "None", Value::Null);
    Scope::insert(scope, "__argc", Value::Int(argv.len() as i64));
    Scope::insert(
        scope,
        "__argv",
        Value::list(argv.iter().map(Value::str).collect()),
    );
}

impl Interp {
    /// Dispatches one builtin call.
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: CallArgs,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        let mut values = args.pos;
        values.extend(args.kwargs.into_values());
        match builtin {
            Builtin::Print => {
                print::builtin_print(&values, print);
                Ok(Value::Null)
            }
            Builtin::Printf => print::builtin_printf(&values, print),
            Builtin::Input => builtin_input(&values),
            Builtin::Range => iter::builtin_range(&values),
            Builtin::Type => {
                let [value] = values.as_slice() else {
                    return Err(Error::arity("type() expects 1 argument"));
                };
                Ok(Value::str(value.type_name()))
            }
            Builtin::Int => convert::builtin_int(&values),
            Builtin::Float => convert::builtin_float(&values),
            Builtin::Str => convert::builtin_str(&values),
            Builtin::List => convert::builtin_list(&values),
            Builtin::Dict => convert::builtin_dict(&values),
            Builtin::Length => convert::builtin_length(&values),
            Builtin::Open => files::builtin_open(&values),
            Builtin::Map => self.builtin_map(&values, print),
            Builtin::Filter => self.builtin_filter(&values, print),
            Builtin::Reduce => self.builtin_reduce(&values, print),
            Builtin::Chr => convert::builtin_chr(&values),
            Builtin::Ord => convert::builtin_ord(&values),
            Builtin::Include => {
                let [path] = values.as_slice() else {
                    return Err(Error::arity("include() expects 1 argument"));
                };
                let Value::Str(path) = path else {
                    return Err(Error::type_error("include() expects a string path"));
                };
                let path = path.clone();
                self.include_module(&path)
            }
        }
    }
}

/// Reads a line from stdin, optionally printing a prompt first.
///
/// Input matching `-?\d+\.\d+` comes back as a Float; everything else,
/// including pure integers, stays a string.
fn builtin_input(args: &[Value]) -> RunResult<Value> {
    use std::sync::LazyLock;

    use regex::Regex;

    static FLOAT_INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());

    if let Some(prompt) = args.first() {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(prompt.to_display().as_bytes());
        let _ = stdout.flush();
    }
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| Error::io(format!("stdin read failed: {err}")))?;
    if read == 0 {
        return Err(Error::io("EOF when reading a line"));
    }
    let line = line.trim_end_matches(['\r', '\n']);
    if FLOAT_INPUT.is_match(line)
        && let Ok(value) = line.parse::<f64>()
    {
        return Ok(Value::Float(value));
    }
    Ok(Value::str(line))
}
