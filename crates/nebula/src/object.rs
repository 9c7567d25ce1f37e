//! The public mirror of the internal value type.
//!
//! Evaluation results cross the API boundary as plain owned `Object`s:
//! no interior mutability, no scope handles, safely printable and
//! comparable by callers.

use std::fmt::{self, Display, Write as _};

use indexmap::IndexMap;

use crate::value::{Key, Value, fmt_float};

/// A self-contained snapshot of a runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Object>),
    /// Entries in insertion order; keys are scalar or string objects.
    Dict(Vec<(Object, Object)>),
    /// A function-like value, by name (`<lambda>` when anonymous).
    Function(String),
    /// A class constructor, by qualified name.
    Class(String),
    Instance {
        class: String,
        fields: Vec<(String, Object)>,
    },
    File(String),
}

/// Conversion cut-off for self-referential containers.
const MAX_SNAPSHOT_DEPTH: usize = 64;

impl Object {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn from_value(value: &Value) -> Self {
        Self::from_value_depth(value, 0)
    }

    fn from_value_depth(value: &Value, depth: usize) -> Self {
        if depth >= MAX_SNAPSHOT_DEPTH {
            return Self::Null;
        }
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(n) => Self::Int(*n),
            Value::Float(f) => Self::Float(*f),
            Value::Str(s) => Self::Str(s.to_string()),
            Value::List(items) => Self::List(
                items
                    .borrow()
                    .iter()
                    .map(|item| Self::from_value_depth(item, depth + 1))
                    .collect(),
            ),
            Value::Dict(entries) | Value::KwUnpack(entries) => Self::Dict(
                entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| {
                        (
                            Self::from_value_depth(&key.to_value(), depth + 1),
                            Self::from_value_depth(value, depth + 1),
                        )
                    })
                    .collect(),
            ),
            Value::Function(f) => Self::Function(f.name.as_deref().unwrap_or("<lambda>").to_owned()),
            Value::Builtin(b) => Self::Function(b.to_string()),
            Value::Bound(bound) => Self::Function(bound.callee.name()),
            Value::Class(name) => Self::Class(name.to_string()),
            Value::Instance(instance) => {
                let instance = instance.borrow();
                Self::Instance {
                    class: instance.class.to_string(),
                    fields: instance
                        .fields
                        .iter()
                        .map(|(name, value)| (name.clone(), Self::from_value_depth(value, depth + 1)))
                        .collect(),
                }
            }
            Value::File(handle) => Self::File(handle.borrow().path.clone()),
        }
    }

    /// Converts back into a runtime value. Function-like objects, classes,
    /// and files cannot cross back; those return `None`.
    pub(crate) fn to_value(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Int(n) => Some(Value::Int(*n)),
            Self::Float(f) => Some(Value::Float(*f)),
            Self::Str(s) => Some(Value::str(s)),
            Self::List(items) => {
                let values: Option<Vec<Value>> = items.iter().map(Self::to_value).collect();
                Some(Value::list(values?))
            }
            Self::Dict(entries) => {
                let mut map = IndexMap::new();
                for (key, value) in entries {
                    let key = Key::from_value(&key.to_value()?).ok()?;
                    map.insert(key, value.to_value()?);
                }
                Some(Value::dict(map))
            }
            Self::Function(_) | Self::Class(_) | Self::Instance { .. } | Self::File(_) => None,
        }
    }

    /// The representation form (strings quoted).
    #[must_use]
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.repr_fmt(&mut out);
        out
    }

    fn repr_fmt(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("None"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Float(f) => out.push_str(&fmt_float(*f)),
            Self::Str(s) => {
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\'' => out.push_str("\\'"),
                        '\\' => out.push_str("\\\\"),
                        other => out.push(other),
                    }
                }
                out.push('\'');
            }
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_fmt(out);
                }
                out.push(']');
            }
            Self::Dict(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.repr_fmt(out);
                    out.push_str(": ");
                    value.repr_fmt(out);
                }
                out.push('}');
            }
            Self::Function(name) => {
                if name == "<lambda>" {
                    out.push_str("<lambda>");
                } else {
                    let _ = write!(out, "<function {name}>");
                }
            }
            Self::Class(name) => {
                let _ = write!(out, "<class '{name}'>");
            }
            Self::Instance { class, fields } => {
                let _ = write!(out, "{{'__type__': '{class}'");
                for (name, value) in fields {
                    let _ = write!(out, ", '{name}': ");
                    value.repr_fmt(out);
                }
                out.push('}');
            }
            Self::File(path) => {
                let _ = write!(out, "<file '{path}'>");
            }
        }
    }
}

impl Display for Object {
    /// The display form: top-level strings verbatim, everything else via
    /// repr. This is what the REPL echoes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}
