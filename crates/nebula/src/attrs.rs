//! Attribute access and the native methods of built-in values.
//!
//! Resolution order for instances: class-chain methods first, then declared
//! fields (own or inherited, Null when unset), then the error listing what
//! is available. Strings, lists, and file handles expose small fixed method
//! sets; plain dicts fall back to key lookup.

use std::{rc::Rc, str::FromStr};

use strum::{Display, EnumString};

use crate::{
    classes::ClassTable,
    exception::{Error, RunResult},
    value::{Bound, BoundCallee, Key, ListRef, Value},
};

/// Methods exposed on string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum StrMethod {
    Reverse,
    Upper,
    Lower,
    Join,
    Split,
    Strip,
}

/// Methods exposed on list values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ListMethod {
    Append,
    Extend,
    Remove,
    Sort,
    Reverse,
    Pop,
    Index,
}

/// Methods exposed on file handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum FileMethod {
    Read,
    Write,
    Close,
    Readlines,
    Readline,
}

/// Resolves `value.attr`, producing bound methods for callables.
pub(crate) fn get_attr(classes: &ClassTable, value: &Value, attr: &str) -> RunResult<Value> {
    match value {
        Value::Instance(instance) => {
            let class = instance.borrow().class.clone();
            if let Some(method) = classes.find_method(&class, attr) {
                return Ok(bound(value, BoundCallee::Function(method)));
            }
            if classes.has_field(&class, attr) {
                let field = instance.borrow().fields.get(attr).cloned();
                return Ok(field.unwrap_or(Value::Null));
            }
            // Undeclared but assigned fields still resolve.
            if let Some(field) = instance.borrow().fields.get(attr) {
                return Ok(field.clone());
            }
            let mut available: Vec<String> = instance.borrow().fields.keys().cloned().collect();
            for name in classes.available_attrs(&class) {
                if !available.contains(&name) {
                    available.push(name);
                }
            }
            let listed = available
                .iter()
                .map(|name| format!("'{name}'"))
                .collect::<Vec<_>>()
                .join(", ");
            Err(Error::attribute(format!(
                "Object of type '{class}' has no attribute '{attr}'. Available: [{listed}]"
            )))
        }
        Value::Str(_) => match StrMethod::from_str(attr) {
            Ok(method) => Ok(bound(value, BoundCallee::Str(method))),
            Err(_) => Err(no_attribute(attr)),
        },
        Value::List(_) => match ListMethod::from_str(attr) {
            Ok(method) => Ok(bound(value, BoundCallee::List(method))),
            Err(_) => Err(no_attribute(attr)),
        },
        Value::File(_) => match FileMethod::from_str(attr) {
            Ok(method) => Ok(bound(value, BoundCallee::File(method))),
            Err(_) => Err(no_attribute(attr)),
        },
        Value::Dict(entries) | Value::KwUnpack(entries) => entries
            .borrow()
            .get(&Key::from_name(attr))
            .cloned()
            .ok_or_else(|| no_attribute(attr)),
        _ => Err(no_attribute(attr)),
    }
}

fn bound(receiver: &Value, callee: BoundCallee) -> Value {
    Value::Bound(Rc::new(Bound {
        receiver: receiver.clone(),
        callee,
    }))
}

fn no_attribute(attr: &str) -> Error {
    Error::attribute(format!("Object has no attribute '{attr}'"))
}

/// Assigns `value.attr = v`. Valid on instances and dicts only.
pub(crate) fn set_attr(target: &Value, attr: &str, value: Value) -> RunResult<()> {
    match target {
        Value::Instance(instance) => {
            instance.borrow_mut().fields.insert(attr.to_owned(), value);
            Ok(())
        }
        Value::Dict(entries) | Value::KwUnpack(entries) => {
            entries.borrow_mut().insert(Key::from_name(attr), value);
            Ok(())
        }
        Value::Null => Err(Error::type_error(format!(
            "Attempted to set attribute '{attr}' on null object"
        ))),
        other => Err(Error::type_error(format!(
            "Cannot set attribute '{attr}' on non-class object {}",
            other.repr()
        ))),
    }
}

/// The current value of an augmented-assignment attribute target, with a
/// missing field reading as Null.
pub(crate) fn get_attr_for_aug(target: &Value, attr: &str) -> RunResult<Value> {
    match target {
        Value::Instance(instance) => Ok(instance.borrow().fields.get(attr).cloned().unwrap_or(Value::Null)),
        Value::Dict(entries) | Value::KwUnpack(entries) => Ok(entries
            .borrow()
            .get(&Key::from_name(attr))
            .cloned()
            .unwrap_or(Value::Null)),
        other => Err(Error::type_error(format!(
            "Cannot set attribute '{attr}' on non-class object {}",
            other.repr()
        ))),
    }
}

/// Invokes a native string method.
pub(crate) fn call_str_method(receiver: &str, method: StrMethod, args: &[Value]) -> RunResult<Value> {
    match method {
        StrMethod::Reverse => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.chars().rev().collect::<String>()))
        }
        StrMethod::Upper => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.to_uppercase()))
        }
        StrMethod::Lower => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.to_lowercase()))
        }
        StrMethod::Join => {
            expect_arity(method, args, 1)?;
            let Value::List(items) = &args[0] else {
                return Err(Error::type_error("join() expects a list"));
            };
            let parts: Vec<String> = items.borrow().iter().map(Value::to_display).collect();
            Ok(Value::str(parts.join(receiver)))
        }
        StrMethod::Split => {
            let delim = match args {
                [] => " ".to_owned(),
                [Value::Str(s)] => s.to_string(),
                [_] => return Err(Error::type_error("split() expects a string delimiter")),
                _ => return Err(Error::arity("split() expects at most 1 argument")),
            };
            let parts: Vec<Value> = receiver.split(delim.as_str()).map(Value::str).collect();
            Ok(Value::list(parts))
        }
        StrMethod::Strip => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.trim()))
        }
    }
}

/// Invokes a native list method. Mutating methods write through the shared
/// reference.
pub(crate) fn call_list_method(receiver: &ListRef, method: ListMethod, args: &[Value]) -> RunResult<Value> {
    match method {
        ListMethod::Append => {
            expect_arity(method, args, 1)?;
            receiver.borrow_mut().push(args[0].clone());
            Ok(Value::Null)
        }
        ListMethod::Extend => {
            expect_arity(method, args, 1)?;
            let Value::List(other) = &args[0] else {
                return Err(Error::type_error("extend() expects a list"));
            };
            // Clone first so `xs.extend(xs)` cannot alias the borrow.
            let items: Vec<Value> = other.borrow().clone();
            receiver.borrow_mut().extend(items);
            Ok(Value::Null)
        }
        ListMethod::Remove => {
            expect_arity(method, args, 1)?;
            let mut items = receiver.borrow_mut();
            match items.iter().position(|item| item.equals(&args[0])) {
                Some(idx) => {
                    items.remove(idx);
                    Ok(Value::Null)
                }
                None => Err(Error::type_error("list.remove(x): x not in list")),
            }
        }
        ListMethod::Sort => {
            let descending = match args {
                [] => false,
                [flag] => flag.is_truthy(),
                _ => return Err(Error::arity("sort() expects at most 1 argument")),
            };
            sort_list(receiver, descending)
        }
        ListMethod::Reverse => {
            expect_arity(method, args, 0)?;
            receiver.borrow_mut().reverse();
            Ok(Value::Null)
        }
        ListMethod::Pop => {
            expect_arity(method, args, 0)?;
            receiver
                .borrow_mut()
                .pop()
                .ok_or_else(|| Error::type_error("pop from empty list"))
        }
        ListMethod::Index => {
            expect_arity(method, args, 1)?;
            let items = receiver.borrow();
            match items.iter().position(|item| item.equals(&args[0])) {
                Some(idx) => Ok(Value::Int(idx as i64)),
                None => Err(Error::type_error(format!("{} is not in list", args[0].repr()))),
            }
        }
    }
}

fn sort_list(receiver: &ListRef, descending: bool) -> RunResult<Value> {
    let mut items = receiver.borrow_mut();
    let all_numbers = items
        .iter()
        .all(|item| matches!(item, Value::Int(_) | Value::Float(_) | Value::Bool(_)));
    if all_numbers {
        items.sort_by(|a, b| {
            let a = numeric(a);
            let b = numeric(b);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else if items.iter().all(|item| matches!(item, Value::Str(_))) {
        items.sort_by(|a, b| match (a, b) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        });
    } else {
        return Err(Error::type_error(
            "sort() expects a list of numbers or a list of strings",
        ));
    }
    if descending {
        items.reverse();
    }
    Ok(Value::Null)
}

fn numeric(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        Value::Bool(b) => f64::from(*b),
        _ => 0.0,
    }
}

/// Invokes a native file method.
pub(crate) fn call_file_method(
    receiver: &Rc<std::cell::RefCell<crate::value::FileHandle>>,
    method: FileMethod,
    args: &[Value],
) -> RunResult<Value> {
    match method {
        FileMethod::Read => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.borrow_mut().read()?))
        }
        FileMethod::Readline => {
            expect_arity(method, args, 0)?;
            Ok(Value::str(receiver.borrow_mut().readline()?))
        }
        FileMethod::Readlines => {
            expect_arity(method, args, 0)?;
            let lines = receiver.borrow_mut().readlines()?;
            Ok(Value::list(lines.into_iter().map(Value::str).collect()))
        }
        FileMethod::Write => {
            expect_arity(method, args, 1)?;
            let Value::Str(data) = &args[0] else {
                return Err(Error::type_error("write() expects a string"));
            };
            Ok(Value::Int(receiver.borrow_mut().write(data)?))
        }
        FileMethod::Close => {
            expect_arity(method, args, 0)?;
            receiver.borrow_mut().close();
            Ok(Value::Null)
        }
    }
}

fn expect_arity(method: impl std::fmt::Display, args: &[Value], expected: usize) -> RunResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::arity(format!(
            "{method}() expects {expected} arguments, got {}",
            args.len()
        )))
    }
}
