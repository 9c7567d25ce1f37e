//! Persistent REPL sessions.
//!
//! A session keeps its interpreter (globals, class table, include caches)
//! alive across submissions and converts each result to a public
//! [`Object`]. The line-buffering policy lives with the front end; the
//! [`needs_more`] heuristic tells it when a submission is still open.

use crate::{exception::RunResult, ffi::FfiSink, io::PrintWriter, object::Object, run::Interp};

/// A persistent interpreter session for interactive use.
pub struct ReplSession {
    interp: Interp,
    argv: Vec<String>,
}

impl ReplSession {
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            interp: Interp::new(argv.clone()),
            argv,
        }
    }

    /// Attaches a host sink for `ffi` blocks.
    pub fn set_ffi(&mut self, sink: Box<dyn FfiSink>) {
        self.interp.ffi = Some(sink);
    }

    /// Evaluates one balanced submission. Top-level bindings persist into
    /// the next call; the returned object is what the front end echoes
    /// when non-null.
    pub fn execute(&mut self, source: &str, print: &mut dyn PrintWriter) -> RunResult<Object> {
        let value = self.interp.run_source(source, print)?;
        Ok(Object::from_value(&value))
    }

    /// Re-initializes the interpreter, dropping all state except an
    /// attached FFI sink.
    pub fn reset(&mut self) {
        let ffi = self.interp.ffi.take();
        self.interp = Interp::new(self.argv.clone());
        self.interp.ffi = ffi;
    }
}

/// Whether a buffered submission is still open: unbalanced
/// braces/parens/brackets or an odd number of quote characters.
#[must_use]
pub fn needs_more(source: &str) -> bool {
    let mut braces = 0i64;
    let mut parens = 0i64;
    let mut brackets = 0i64;
    let mut double_quotes = 0u64;
    let mut single_quotes = 0u64;
    for ch in source.chars() {
        match ch {
            '{' => braces += 1,
            '}' => braces -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '"' => double_quotes += 1,
            '\'' => single_quotes += 1,
            _ => {}
        }
    }
    braces > 0 || parens > 0 || brackets > 0 || double_quotes % 2 != 0 || single_quotes % 2 != 0
}

impl std::fmt::Debug for ReplSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplSession").finish_non_exhaustive()
    }
}
