//! The open() builtin.

use std::{cell::RefCell, rc::Rc};

use crate::{
    exception::{Error, RunResult},
    value::{FileHandle, Value},
};

/// `open(path, mode?)` — returns a file handle; mode defaults to `"r"`.
pub(crate) fn builtin_open(args: &[Value]) -> RunResult<Value> {
    let (path, mode) = match args {
        [path] => (path, "r".to_owned()),
        [path, Value::Str(mode)] => (path, mode.to_string()),
        [_, other] => {
            return Err(Error::type_error(format!(
                "open() mode must be a string, not {}",
                other.type_name()
            )));
        }
        _ => return Err(Error::type_error("open expects 1 or 2 arguments")),
    };
    let Value::Str(path) = path else {
        return Err(Error::type_error(format!(
            "open() path must be a string, not {}",
            path.type_name()
        )));
    };
    let handle = FileHandle::open(path, &mode)?;
    Ok(Value::File(Rc::new(RefCell::new(handle))))
}
