//! range() and the higher-order list builtins map/filter/reduce.

use crate::{
    args::CallArgs,
    exception::{Error, RunResult},
    io::PrintWriter,
    run::Interp,
    value::Value,
};

/// `range(n)`, `range(a, b)`, `range(a, b, step)` — a materialized list of
/// integers.
pub(crate) fn builtin_range(args: &[Value]) -> RunResult<Value> {
    let bounds: Vec<i64> = args
        .iter()
        .map(|value| match value {
            Value::Int(n) => Ok(*n),
            other => Err(Error::type_error(format!(
                "range() expects integer arguments, not {}",
                other.type_name()
            ))),
        })
        .collect::<RunResult<_>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(Error::arity("range expects 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(Error::type_error("range() arg 3 must not be zero"));
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::Int(current));
        current += step;
    }
    Ok(Value::list(items))
}

impl Interp {
    /// `map(fn, xs)` — applies `fn` to each element of a list.
    pub(crate) fn builtin_map(&mut self, args: &[Value], print: &mut dyn PrintWriter) -> RunResult<Value> {
        let (callable, items) = callable_and_list(args, "map")?;
        let mut mapped = Vec::with_capacity(items.len());
        for item in items {
            mapped.push(self.call_value(callable.clone(), CallArgs::positional(vec![item]), print)?);
        }
        Ok(Value::list(mapped))
    }

    /// `filter(fn, xs)` — keeps the elements for which `fn` is truthy.
    pub(crate) fn builtin_filter(&mut self, args: &[Value], print: &mut dyn PrintWriter) -> RunResult<Value> {
        let (callable, items) = callable_and_list(args, "filter")?;
        let mut kept = Vec::new();
        for item in items {
            let keep = self.call_value(callable.clone(), CallArgs::positional(vec![item.clone()]), print)?;
            if keep.is_truthy() {
                kept.push(item);
            }
        }
        Ok(Value::list(kept))
    }

    /// `reduce(fn, xs, init?)` — folds a list left-to-right.
    pub(crate) fn builtin_reduce(&mut self, args: &[Value], print: &mut dyn PrintWriter) -> RunResult<Value> {
        let (callable, items, init) = match args {
            [callable, items] => (callable, items, None),
            [callable, items, init] => (callable, items, Some(init.clone())),
            _ => return Err(Error::arity("reduce expects 2 or 3 arguments")),
        };
        let Value::List(items) = items else {
            return Err(Error::type_error("reduce() expects a list"));
        };
        let items: Vec<Value> = items.borrow().clone();
        let mut iter = items.into_iter();
        let mut acc = match init {
            Some(value) => value,
            None => iter
                .next()
                .ok_or_else(|| Error::type_error("reduce() of empty sequence with no initial value"))?,
        };
        for item in iter {
            acc = self.call_value(callable.clone(), CallArgs::positional(vec![acc, item]), print)?;
        }
        Ok(acc)
    }
}

fn callable_and_list<'a>(args: &'a [Value], name: &str) -> RunResult<(&'a Value, Vec<Value>)> {
    match args {
        [callable, Value::List(items)] => Ok((callable, items.borrow().clone())),
        [_, other] => Err(Error::type_error(format!(
            "{name}() expects a list, not {}",
            other.type_name()
        ))),
        _ => Err(Error::arity(format!("{name}() expects 2 arguments"))),
    }
}
