//! Coercion builtins: int, float, str, list, dict, length, chr, ord.

use indexmap::IndexMap;

use crate::{
    exception::{Error, RunResult},
    value::{Key, Value},
};

fn one<'a>(args: &'a [Value], name: &str) -> RunResult<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(Error::arity(format!("{name}() expects 1 argument"))),
    }
}

pub(crate) fn builtin_int(args: &[Value]) -> RunResult<Value> {
    match one(args, "int")? {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => {
            let truncated = f.trunc();
            if truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
                Ok(Value::Int(truncated as i64))
            } else {
                Err(Error::type_error("float too large to convert to int"))
            }
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Error::type_error(format!("invalid literal for int(): '{s}'"))),
        other => Err(Error::type_error(format!(
            "int() argument must be a number or string, not {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn builtin_float(args: &[Value]) -> RunResult<Value> {
    match one(args, "float")? {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(f64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::type_error(format!("could not convert string to float: '{s}'"))),
        other => Err(Error::type_error(format!(
            "float() argument must be a number or string, not {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn builtin_str(args: &[Value]) -> RunResult<Value> {
    Ok(Value::str(one(args, "str")?.to_display()))
}

pub(crate) fn builtin_list(args: &[Value]) -> RunResult<Value> {
    match one(args, "list")? {
        Value::List(items) => Ok(Value::list(items.borrow().clone())),
        Value::Str(s) => Ok(Value::list(s.chars().map(|ch| Value::str(ch.to_string())).collect())),
        Value::Dict(entries) | Value::KwUnpack(entries) => {
            Ok(Value::list(entries.borrow().keys().map(Key::to_value).collect()))
        }
        other => Err(Error::type_error(format!(
            "list() argument must be a list, string, or dict, not {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn builtin_dict(args: &[Value]) -> RunResult<Value> {
    match one(args, "dict")? {
        Value::Dict(entries) | Value::KwUnpack(entries) => Ok(Value::dict(entries.borrow().clone())),
        Value::Instance(instance) => {
            let instance = instance.borrow();
            let mut entries = IndexMap::new();
            entries.insert(Key::from_name("__type__"), Value::str(instance.class.as_ref()));
            for (name, value) in &instance.fields {
                entries.insert(Key::from_name(name), value.clone());
            }
            Ok(Value::dict(entries))
        }
        other => Err(Error::type_error(format!(
            "dict() argument must be a dict or instance, not {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn builtin_length(args: &[Value]) -> RunResult<Value> {
    let len = match one(args, "length")? {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Dict(entries) | Value::KwUnpack(entries) => entries.borrow().len(),
        other => {
            return Err(Error::type_error(format!(
                "object of type '{}' has no length",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(len as i64))
}

pub(crate) fn builtin_chr(args: &[Value]) -> RunResult<Value> {
    match one(args, "chr")? {
        Value::Int(n) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .map(|ch| Value::str(ch.to_string()))
            .ok_or_else(|| Error::type_error(format!("chr() arg not in range: {n}"))),
        other => Err(Error::type_error(format!(
            "chr() expects an integer, not {}",
            other.type_name()
        ))),
    }
}

pub(crate) fn builtin_ord(args: &[Value]) -> RunResult<Value> {
    match one(args, "ord")? {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(Value::Int(i64::from(u32::from(ch)))),
                _ => Err(Error::type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        other => Err(Error::type_error(format!(
            "ord() expects a string, not {}",
            other.type_name()
        ))),
    }
}
