//! The foreign-evaluation seam.
//!
//! An `ffi { ... }` block hands its raw text and a snapshot of the
//! non-callable names in scope to a host-provided sink. The sink returns
//! updated name/value pairs, which merge back into the current scope.
//! The core never interprets the raw text.

use crate::{
    exception::{Error, RunResult},
    object::Object,
    run::Interp,
    scope::{Scope, ScopeRef},
    value::Value,
};

/// Host-side executor for `ffi` blocks.
pub trait FfiSink {
    /// Runs the raw block text against the given scope snapshot and returns
    /// the bindings to merge back. An `Err` string surfaces as a catchable
    /// runtime error.
    fn run(&mut self, code: &str, scope: Vec<(String, Object)>) -> Result<Vec<(String, Object)>, String>;
}

impl Interp {
    pub(crate) fn exec_ffi(&mut self, code: &str, scope: &ScopeRef) -> RunResult<()> {
        let Some(sink) = self.ffi.as_mut() else {
            return Err(Error::type_error("no ffi host is configured for this program"));
        };

        let snapshot: Vec<(String, Object)> = Scope::flatten(scope)
            .into_iter()
            .filter(|(_, value)| !is_callable(value))
            .map(|(name, value)| (name, Object::from_value(&value)))
            .collect();

        let updates = sink.run(code, snapshot).map_err(Error::user)?;
        for (name, object) in updates {
            // Callables coming back from the host are dropped, so builtins
            // cannot be shadowed by sink echoes.
            if let Some(value) = object.to_value() {
                Scope::assign(scope, &name, value);
            }
        }
        Ok(())
    }
}

fn is_callable(value: &Value) -> bool {
    matches!(
        value,
        Value::Function(_) | Value::Builtin(_) | Value::Bound(_) | Value::Class(_)
    )
}
