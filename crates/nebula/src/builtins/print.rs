//! The print() and printf() builtins.

use crate::{
    exception::{Error, RunResult},
    io::PrintWriter,
    value::Value,
};

/// `print(...)`: arguments space-separated, newline-terminated. Strings
/// print verbatim; everything else through its representation.
pub(crate) fn builtin_print(args: &[Value], print: &mut dyn PrintWriter) {
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            print.stdout_push(' ');
        }
        print.stdout_write(value.to_display().into());
    }
    print.stdout_push('\n');
}

/// `printf(values..., sep, end)`: the last two arguments are the separator
/// and the end-of-line, both escape-decoded. With a single argument it is
/// just the end-of-line; with none, a bare newline.
pub(crate) fn builtin_printf(args: &[Value], print: &mut dyn PrintWriter) -> RunResult<Value> {
    let (values, sep, end) = match args {
        [] => (&[] as &[Value], " ".to_owned(), "\n".to_owned()),
        [end] => (&[] as &[Value], " ".to_owned(), text_arg(end, "end")?),
        [values @ .., sep, end] => (values, text_arg(sep, "sep")?, text_arg(end, "end")?),
    };
    let sep = decode_escapes(&sep);
    let end = decode_escapes(&end);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            print.stdout_write(sep.clone().into());
        }
        print.stdout_write(value.to_display().into());
    }
    print.stdout_write(end.into());
    Ok(Value::Null)
}

fn text_arg(value: &Value, name: &str) -> RunResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(Error::type_error(format!(
            "printf {name} must be a string, not {}",
            other.type_name()
        ))),
    }
}

/// Decodes the escape sequences meaningful to printf separators and
/// terminators. Unknown escapes pass through unchanged.
fn decode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
