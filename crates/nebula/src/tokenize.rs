//! Lexical analysis: comment stripping followed by a prioritized,
//! first-match-wins regex scan.
//!
//! Priority matters: two-character operators must precede their
//! single-character prefixes, and string literals must precede identifier
//! and number matching. Type annotations of the form `:: <...>` are matched
//! and dropped, as is whitespace.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

use crate::exception::{Error, RunResult};

/// Classification of a lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Number,
    Str,
    Ident,
    Keyword,
    Op,
    Compare,
    AugAssign,
    Symbol,
}

/// A single token: its kind and its lexeme.
///
/// String tokens carry their content with the surrounding delimiters already
/// stripped; no escape processing happens at tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//.*").unwrap());
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// The prioritized token table. Entries with `None` kinds are recognized and
/// discarded (type annotations, whitespace).
static TOKEN_SPEC: LazyLock<Vec<(Option<TokenKind>, Regex)>> = LazyLock::new(|| {
    let spec: &[(Option<TokenKind>, &str)] = &[
        (Some(TokenKind::AugAssign), r"\+\+|--|\+=|-=|\*=|/=|%="),
        (Some(TokenKind::Compare), r"==|!=|<=|>=|<|>"),
        (Some(TokenKind::Op), r"\*\*|\+|-|\*|/|%|="),
        (Some(TokenKind::Str), r#""[^"]*"|'[^']*'"#),
        (None, r"::\s*<[^>]+>"),
        (Some(TokenKind::Number), r"\d+"),
        (
            Some(TokenKind::Keyword),
            r"\b(?:in|def|if|else|elif|or|and|not|for|while|break|continue|return|global|try|catch|throw|class|ffi|match|case|lambda)\b",
        ),
        (Some(TokenKind::Ident), r"[A-Za-z_]\w*"),
        (Some(TokenKind::Symbol), r"[;|?:{}\[\](),.]"),
        (None, r"\s+"),
    ];
    spec.iter()
        .map(|(kind, pattern)| (*kind, Regex::new(&format!("^(?:{pattern})")).unwrap()))
        .collect()
});

/// Strips `// ...` and `/* ... */` comments from the source.
fn strip_comments(source: &str) -> Cow<'_, str> {
    match LINE_COMMENT.replace_all(source, "") {
        Cow::Borrowed(_) => BLOCK_COMMENT.replace_all(source, ""),
        Cow::Owned(stripped) => Cow::Owned(BLOCK_COMMENT.replace_all(&stripped, "").into_owned()),
    }
}

/// Tokenizes a source program.
///
/// Fails with a [`crate::ErrorKind::LexError`] naming the character offset
/// when no table entry matches.
pub(crate) fn tokenize(source: &str) -> RunResult<Vec<Token>> {
    let code = strip_comments(source);
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < code.len() {
        let rest = &code[pos..];
        let mut matched = None;
        for (kind, pattern) in TOKEN_SPEC.iter() {
            if let Some(found) = pattern.find(rest) {
                matched = Some((*kind, found.end()));
                break;
            }
        }
        let Some((kind, len)) = matched else {
            let ch = rest.chars().next().unwrap_or('\0');
            return Err(Error::lex(format!("unrecognized character '{ch}' at offset {pos}")));
        };
        if let Some(kind) = kind {
            let lexeme = &rest[..len];
            let text = if kind == TokenKind::Str {
                &lexeme[1..lexeme.len() - 1]
            } else {
                lexeme
            };
            tokens.push(Token::new(kind, text));
        }
        pos += len;
    }
    Ok(tokens)
}
