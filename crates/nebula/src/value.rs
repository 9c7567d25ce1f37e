//! Runtime values.
//!
//! Small scalars are stored inline; lists, dicts, instances, and file
//! handles are shared by reference through `Rc<RefCell<...>>`, so aliases
//! observe mutation, and closures keep their captured scope chain alive.

use std::{
    cell::RefCell,
    fmt,
    fs::{File, OpenOptions},
    hash::{Hash, Hasher},
    io::{BufRead, BufReader, Read, Write},
    mem::discriminant,
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    ast::{Param, Stmt},
    attrs::{FileMethod, ListMethod, StrMethod},
    builtins::Builtin,
    exception::{Error, RunResult},
    scope::ScopeRef,
};

pub(crate) type ListRef = Rc<RefCell<Vec<Value>>>;
pub(crate) type DictRef = Rc<RefCell<IndexMap<Key, Value>>>;

/// Nesting depth past which container reprs collapse to `[...]` / `{...}`,
/// so self-referential containers terminate.
const MAX_REPR_DEPTH: usize = 32;

/// Primary tagged union of runtime values.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(ListRef),
    Dict(DictRef),
    /// A closure: parameters, body, and the scope chain captured at
    /// definition time.
    Function(Rc<Function>),
    /// A built-in function, globally pre-bound by name.
    Builtin(Builtin),
    /// A function or native method with a pre-bound receiver, produced by
    /// attribute lookup.
    Bound(Rc<Bound>),
    /// A user class constructor, carrying the qualified class name.
    Class(Rc<str>),
    Instance(Rc<RefCell<Instance>>),
    File(Rc<RefCell<FileHandle>>),
    /// Transient wrapper produced by `**expr`, consumed during argument
    /// passing.
    KwUnpack(DictRef),
}

impl Value {
    pub fn str(text: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(text.as_ref()))
    }

    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(entries: IndexMap<Key, Self>) -> Self {
        Self::Dict(Rc::new(RefCell::new(entries)))
    }

    /// Truthiness: Null, 0, 0.0, empty string/list/dict, and false are
    /// falsy; all else truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.borrow().is_empty(),
            Self::Dict(entries) | Self::KwUnpack(entries) => !entries.borrow().is_empty(),
            _ => true,
        }
    }

    /// Structural equality, with Int/Float/Bool comparing numerically.
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Bool(a), Self::Int(b)) | (Self::Int(b), Self::Bool(a)) => i64::from(*a) == *b,
            (Self::Bool(a), Self::Float(b)) | (Self::Float(b), Self::Bool(a)) => f64::from(*a) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Self::Dict(a), Self::Dict(b)) | (Self::KwUnpack(a), Self::KwUnpack(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.equals(other)))
            }
            (Self::Instance(a), Self::Instance(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.class == b.class
                    && a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .all(|(name, value)| b.fields.get(name).is_some_and(|other| value.equals(other)))
            }
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Bound(a), Self::Bound(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::File(a), Self::File(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The runtime kind name reported by `type()` and used in error
    /// messages. Instances report their qualified class name.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "NoneType".to_owned(),
            Self::Bool(_) => "bool".to_owned(),
            Self::Int(_) => "int".to_owned(),
            Self::Float(_) => "float".to_owned(),
            Self::Str(_) => "str".to_owned(),
            Self::List(_) => "list".to_owned(),
            Self::Dict(_) | Self::KwUnpack(_) => "dict".to_owned(),
            Self::Function(_) | Self::Builtin(_) | Self::Bound(_) => "function".to_owned(),
            Self::Class(_) => "class".to_owned(),
            Self::Instance(instance) => instance.borrow().class.to_string(),
            Self::File(_) => "file".to_owned(),
        }
    }

    /// The representation form: strings quoted, containers recursive.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.repr_fmt(&mut out, 0);
        out
    }

    /// The display form: strings verbatim, everything else via repr.
    pub fn to_display(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    fn repr_fmt(&self, out: &mut String, depth: usize) {
        match self {
            Self::Null => out.push_str("None"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Int(n) => out.push_str(&n.to_string()),
            Self::Float(f) => out.push_str(fmt_float(*f).as_str()),
            Self::Str(s) => push_str_repr(out, s),
            Self::List(items) => {
                if depth >= MAX_REPR_DEPTH {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_fmt(out, depth + 1);
                }
                out.push(']');
            }
            Self::Dict(entries) | Self::KwUnpack(entries) => {
                if depth >= MAX_REPR_DEPTH {
                    out.push_str("{...}");
                    return;
                }
                out.push('{');
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.repr_fmt(out);
                    out.push_str(": ");
                    value.repr_fmt(out, depth + 1);
                }
                out.push('}');
            }
            Self::Function(f) => match &f.name {
                Some(name) => {
                    out.push_str("<function ");
                    out.push_str(name);
                    out.push('>');
                }
                None => out.push_str("<lambda>"),
            },
            Self::Builtin(b) => {
                out.push_str("<built-in function ");
                out.push_str(&b.to_string());
                out.push('>');
            }
            Self::Bound(bound) => {
                out.push_str("<bound method ");
                out.push_str(&bound.callee.name());
                out.push('>');
            }
            Self::Class(name) => {
                out.push_str("<class '");
                out.push_str(name);
                out.push_str("'>");
            }
            Self::Instance(instance) => {
                if depth >= MAX_REPR_DEPTH {
                    out.push_str("{...}");
                    return;
                }
                let instance = instance.borrow();
                out.push_str("{'__type__': '");
                out.push_str(&instance.class);
                out.push('\'');
                for (name, value) in &instance.fields {
                    out.push_str(", '");
                    out.push_str(name);
                    out.push_str("': ");
                    value.repr_fmt(out, depth + 1);
                }
                out.push('}');
            }
            Self::File(handle) => {
                out.push_str("<file '");
                out.push_str(&handle.borrow().path);
                out.push_str("'>");
            }
        }
    }
}

/// Shortest round-trip float formatting.
pub(crate) fn fmt_float(f: f64) -> String {
    if f.is_finite() {
        ryu::Buffer::new().format(f).to_owned()
    } else if f.is_nan() {
        "nan".to_owned()
    } else if f > 0.0 {
        "inf".to_owned()
    } else {
        "-inf".to_owned()
    }
}

fn push_str_repr(out: &mut String, s: &str) {
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

/// A hashable dict key: Null, Bool, Int, Float, or Str.
///
/// Floats hash and compare by bit pattern, so Int and Float keys never
/// unify and NaN is a usable key.
#[derive(Debug, Clone)]
pub(crate) enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
}

impl Key {
    /// Converts a value into a key, or fails with a TypeError for
    /// unhashable kinds (lists, dicts, functions, instances, files).
    pub fn from_value(value: &Value) -> RunResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Int(n) => Ok(Self::Int(*n)),
            Value::Float(f) => Ok(Self::Float(*f)),
            Value::Str(s) => Ok(Self::Str(s.clone())),
            other => Err(Error::type_error(format!(
                "unhashable key of type '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn from_name(name: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(name.as_ref()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(n) => Value::Int(*n),
            Self::Float(f) => Value::Float(*f),
            Self::Str(s) => Value::Str(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

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
            Self::Int(n) => out.push_str(&n.to_string()),
            Self::Float(f) => out.push_str(fmt_float(*f).as_str()),
            Self::Str(s) => push_str_repr(out, s),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

/// A closure: parameter list, body, and captured scope chain.
///
/// The captured chain keeps parent scopes alive as long as the closure
/// exists.
pub(crate) struct Function {
    pub name: Option<Rc<str>>,
    pub params: Rc<[Param]>,
    pub body: Rc<[Stmt]>,
    pub scope: ScopeRef,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured scope may contain this function; print the name only.
        f.debug_struct("Function")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A receiver paired with the function or native method to invoke on it.
#[derive(Debug, Clone)]
pub(crate) struct Bound {
    pub receiver: Value,
    pub callee: BoundCallee,
}

#[derive(Debug, Clone)]
pub(crate) enum BoundCallee {
    Function(Rc<Function>),
    Str(StrMethod),
    List(ListMethod),
    File(FileMethod),
}

impl BoundCallee {
    pub fn name(&self) -> String {
        match self {
            Self::Function(f) => f.name.as_deref().unwrap_or("<lambda>").to_owned(),
            Self::Str(m) => m.to_string(),
            Self::List(m) => m.to_string(),
            Self::File(m) => m.to_string(),
        }
    }
}

/// A user-defined class instance: its qualified class name plus fields.
#[derive(Debug)]
pub(crate) struct Instance {
    pub class: Rc<str>,
    pub fields: IndexMap<String, Value>,
}

/// An open file produced by `open()`.
///
/// `close()` is idempotent; any other operation on a closed handle is an
/// IOError.
#[derive(Debug)]
pub(crate) struct FileHandle {
    pub path: String,
    file: Option<BufReader<File>>,
}

impl FileHandle {
    pub fn open(path: &str, mode: &str) -> RunResult<Self> {
        let normalized = mode.replace('b', "");
        let mut options = OpenOptions::new();
        match normalized.as_str() {
            "r" => options.read(true),
            "w" => options.write(true).create(true).truncate(true),
            "a" => options.append(true).create(true),
            "r+" => options.read(true).write(true),
            "w+" => options.read(true).write(true).create(true).truncate(true),
            "a+" => options.read(true).append(true).create(true),
            _ => return Err(Error::type_error(format!("invalid file mode '{mode}'"))),
        };
        let file = options
            .open(path)
            .map_err(|err| Error::io(format!("cannot open '{path}': {err}")))?;
        Ok(Self {
            path: path.to_owned(),
            file: Some(BufReader::new(file)),
        })
    }

    fn inner(&mut self) -> RunResult<&mut BufReader<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::io("I/O operation on closed file"))
    }

    pub fn read(&mut self) -> RunResult<String> {
        let file = self.inner()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|err| Error::io(format!("read failed: {err}")))?;
        Ok(contents)
    }

    /// Reads one line, keeping the trailing newline; returns an empty
    /// string at end of file.
    pub fn readline(&mut self) -> RunResult<String> {
        let file = self.inner()?;
        let mut line = String::new();
        file.read_line(&mut line)
            .map_err(|err| Error::io(format!("read failed: {err}")))?;
        Ok(line)
    }

    pub fn readlines(&mut self) -> RunResult<Vec<String>> {
        let contents = self.read()?;
        let mut lines = Vec::new();
        let mut rest = contents.as_str();
        while !rest.is_empty() {
            match rest.find('\n') {
                Some(idx) => {
                    lines.push(rest[..=idx].to_owned());
                    rest = &rest[idx + 1..];
                }
                None => {
                    lines.push(rest.to_owned());
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Writes the text and returns the number of characters written.
    pub fn write(&mut self, data: &str) -> RunResult<i64> {
        let file = self.inner()?;
        file.get_mut()
            .write_all(data.as_bytes())
            .map_err(|err| Error::io(format!("write failed: {err}")))?;
        file.get_mut()
            .flush()
            .map_err(|err| Error::io(format!("write failed: {err}")))?;
        Ok(data.chars().count() as i64)
    }

    pub fn close(&mut self) {
        self.file = None;
    }
}
