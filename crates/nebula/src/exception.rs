use std::fmt::{self, Display};

use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::value::Value;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, Error>;

/// Result type alias used inside the evaluator, where non-error control
/// signals (`break`, `continue`, `return`) travel on the error channel.
pub(crate) type ExecResult<T> = Result<T, Flow>;

/// Error categories raised by the tokenizer, parser, and evaluator.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>`
/// implementations. The string representation matches the variant name exactly
/// (e.g., `NameError` -> "NameError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    /// Unrecognized input during tokenization.
    LexError,
    /// Malformed construct, unexpected EOF, or invalid assignment target.
    SyntaxError,
    /// Undefined identifier.
    NameError,
    /// Missing attribute or method on a value.
    AttributeError,
    /// Operand type mismatch, non-iterable iteration target, invalid
    /// indexing/slicing target, or bad constructor cardinality.
    TypeError,
    /// Missing required argument, unexpected keyword, or too many arguments.
    ArityError,
    /// File not found or read/write failure.
    #[strum(serialize = "IOError")]
    IoError,
    /// Raised by `throw`; carries the thrown value's text form.
    UserError,
}

/// A runtime or parse-time error with a typed kind and a message.
///
/// `try/catch` binds only the message to the catch variable; the kind is
/// used for the one-line report when an error escapes the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LexError, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameError, message)
    }

    pub fn attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArityError, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoError, message)
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserError, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The bare message, as bound to a `catch` variable.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

/// Non-local outcome of evaluating a statement or expression.
///
/// `break`, `continue`, and `return` unwind the evaluator without being
/// errors: loops absorb `Break`/`Continue`, call frames absorb `Return`, and
/// `try/catch` only ever catches the `Error` variant.
#[derive(Debug)]
pub(crate) enum Flow {
    Error(Error),
    Break,
    Continue,
    Return(Value),
}

impl From<Error> for Flow {
    fn from(err: Error) -> Self {
        Self::Error(err)
    }
}
