//! Recursive-descent parser with precedence climbing for arithmetic.
//!
//! Statements dispatch on their leading keyword; everything else is an
//! expression statement. Assignments are recognized after the fact by
//! converting an already-parsed postfix expression into an assignment
//! target, which is where "Invalid assignment target" errors come from.

use std::rc::Rc;

use crate::{
    ast::{BinOp, CallArg, ClassDecl, CmpOp, Expr, FuncDecl, MatchArm, Param, Stmt},
    exception::{Error, RunResult},
    tokenize::{Token, TokenKind},
};

/// Parses a token stream into a list of statements.
pub(crate) fn parse(tokens: Vec<Token>) -> RunResult<Vec<Stmt>> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_block(None)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // ---- cursor helpers ----

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at(&self, kind: TokenKind, text: &str) -> bool {
        self.current().is_some_and(|t| t.kind == kind && t.text == text)
    }

    fn at_symbol(&self, text: &str) -> bool {
        self.at(TokenKind::Symbol, text)
    }

    fn at_op(&self, text: &str) -> bool {
        self.at(TokenKind::Op, text)
    }

    fn at_keyword(&self, text: &str) -> bool {
        self.at(TokenKind::Keyword, text)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    /// Consumes the current token unconditionally.
    fn bump(&mut self) -> RunResult<Token> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| Error::syntax("Unexpected EOF"))?;
        self.pos += 1;
        Ok(tok)
    }

    /// Consumes the current token, requiring an exact kind and lexeme.
    fn expect(&mut self, kind: TokenKind, text: &str) -> RunResult<()> {
        match self.current() {
            Some(tok) if tok.kind == kind && tok.text == text => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => Err(Error::syntax(format!("Expected '{text}', got '{}'", tok.text))),
            None => Err(Error::syntax("Unexpected EOF")),
        }
    }

    fn expect_symbol(&mut self, text: &str) -> RunResult<()> {
        self.expect(TokenKind::Symbol, text)
    }

    fn expect_keyword(&mut self, text: &str) -> RunResult<()> {
        self.expect(TokenKind::Keyword, text)
    }

    fn expect_ident(&mut self) -> RunResult<String> {
        match self.current() {
            Some(tok) if tok.kind == TokenKind::Ident => {
                let name = tok.text.clone();
                self.pos += 1;
                Ok(name)
            }
            Some(tok) => Err(Error::syntax(format!("Expected identifier, got '{}'", tok.text))),
            None => Err(Error::syntax("Unexpected EOF")),
        }
    }

    // ---- statements ----

    /// Parses statements until `until` (a closing symbol) or end of input.
    /// Free-standing semicolons between statements are skipped.
    fn parse_block(&mut self, until: Option<&str>) -> RunResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            let Some(tok) = self.current() else { break };
            if tok.kind == TokenKind::Symbol && tok.text == ";" {
                self.pos += 1;
                continue;
            }
            if let Some(close) = until
                && tok.kind == TokenKind::Symbol
                && tok.text == close
            {
                break;
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> RunResult<Stmt> {
        if self.at_kind(TokenKind::Keyword) {
            let keyword = self.current().map(|t| t.text.clone()).unwrap_or_default();
            match keyword.as_str() {
                "def" => return Ok(Stmt::FuncDef(self.parse_function()?)),
                "if" => return self.parse_if(),
                "for" => return self.parse_for(),
                "while" => return self.parse_while(),
                "break" => {
                    self.pos += 1;
                    return Ok(Stmt::Break);
                }
                "continue" => {
                    self.pos += 1;
                    return Ok(Stmt::Continue);
                }
                "return" => {
                    self.pos += 1;
                    let done = self
                        .current()
                        .is_none_or(|t| t.kind == TokenKind::Symbol && (t.text == ";" || t.text == "}"));
                    let expr = if done { None } else { Some(self.parse_expression()?) };
                    return Ok(Stmt::Return(expr));
                }
                "global" => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    return Ok(Stmt::Global(name));
                }
                "try" => return self.parse_try(),
                "throw" => {
                    self.pos += 1;
                    return Ok(Stmt::Throw(self.parse_expression()?));
                }
                "class" => {
                    let decl = self.parse_class_decl()?;
                    return Ok(Stmt::Class(Rc::new(decl)));
                }
                "ffi" => return self.parse_ffi(),
                _ => {}
            }
        }
        // `include` is a contextual identifier: statement form only when a
        // string literal follows directly; `include(expr)` stays a call.
        if self.at(TokenKind::Ident, "include") && self.peek(1).is_some_and(|t| t.kind == TokenKind::Str) {
            self.pos += 1;
            let path = self.bump()?.text;
            return Ok(Stmt::Include(path));
        }

        let expr = self.parse_expression()?;
        if self.at_op("=") {
            self.pos += 1;
            let value = self.parse_expression()?;
            return match expr {
                Expr::Var(name) => Ok(Stmt::Assign { name, value }),
                Expr::GetAttr { object, attr } => Ok(Stmt::AssignAttr {
                    object: *object,
                    attr,
                    value,
                }),
                Expr::Index { object, index } => Ok(Stmt::AssignIndex {
                    object: *object,
                    index: *index,
                    value,
                }),
                _ => Err(Error::syntax("Invalid assignment target")),
            };
        }
        if self.at_kind(TokenKind::AugAssign) {
            let op_text = self.bump()?.text;
            let (op, value) = match op_text.as_str() {
                "++" => (BinOp::Add, Expr::Int(1)),
                "--" => (BinOp::Sub, Expr::Int(1)),
                _ => {
                    let op = BinOp::from_aug_symbol(&op_text)
                        .ok_or_else(|| Error::syntax(format!("Unknown operator '{op_text}'")))?;
                    (op, self.parse_expression()?)
                }
            };
            return match expr {
                Expr::Var(name) => Ok(Stmt::AugAssign { name, op, value }),
                Expr::GetAttr { object, attr } => Ok(Stmt::AugAssignAttr {
                    object: *object,
                    attr,
                    op,
                    value,
                }),
                Expr::Index { object, index } => Ok(Stmt::AugAssignIndex {
                    object: *object,
                    index: *index,
                    op,
                    value,
                }),
                _ => Err(Error::syntax("Invalid augmented assignment target")),
            };
        }
        Ok(Stmt::Expr(expr))
    }

    /// `def name(params) { body }`, where `name` may be dotted for methods.
    /// A dotted name gets a synthetic `self` parameter prepended.
    fn parse_function(&mut self) -> RunResult<FuncDecl> {
        self.expect_keyword("def")?;
        if !self.at_kind(TokenKind::Ident) {
            return Err(Error::syntax("Expected function name"));
        }
        let mut name_parts = vec![self.expect_ident()?];
        while self.at_symbol(".") {
            self.pos += 1;
            name_parts.push(self.expect_ident()?);
        }
        let is_method = name_parts.len() > 1;
        let name = name_parts.join(".");

        self.expect_symbol("(")?;
        let mut params = self.parse_params()?;
        self.expect_symbol(")")?;

        self.expect_symbol("{")?;
        let body = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;

        if is_method {
            params.insert(
                0,
                Param::Normal {
                    name: "self".to_owned(),
                    default: None,
                },
            );
        }
        Ok(FuncDecl {
            name,
            params: Rc::from(params),
            body: Rc::from(body),
        })
    }

    fn parse_params(&mut self) -> RunResult<Vec<Param>> {
        let mut params = Vec::new();
        while !self.at_symbol(")") {
            if self.at_op("**") {
                self.pos += 1;
                params.push(Param::DblStar(self.expect_ident()?));
            } else if self.at_op("*") {
                self.pos += 1;
                params.push(Param::Star(self.expect_ident()?));
            } else {
                let name = self.expect_ident()?;
                let default = if self.at_op("=") {
                    self.pos += 1;
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                params.push(Param::Normal { name, default });
            }
            if self.at_symbol(",") {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(params)
    }

    fn parse_if(&mut self) -> RunResult<Stmt> {
        self.expect_keyword("if")?;
        let mut branches = vec![self.parse_cond_arm()?];
        while self.at_keyword("elif") {
            self.pos += 1;
            branches.push(self.parse_cond_arm()?);
        }
        let else_body = if self.at_keyword("else") {
            self.pos += 1;
            self.expect_symbol("{")?;
            let body = self.parse_block(Some("}"))?;
            self.expect_symbol("}")?;
            Some(body)
        } else {
            None
        };
        Ok(Stmt::IfChain { branches, else_body })
    }

    /// `(cond) { body }` — shared by `if`, `elif`, and `while`.
    fn parse_cond_arm(&mut self) -> RunResult<(Expr, Vec<Stmt>)> {
        self.expect_symbol("(")?;
        let cond = self.parse_expression()?;
        self.expect_symbol(")")?;
        self.expect_symbol("{")?;
        let body = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;
        Ok((cond, body))
    }

    fn parse_for(&mut self) -> RunResult<Stmt> {
        self.expect_keyword("for")?;
        self.expect_symbol("(")?;
        let var = self.expect_ident()?;
        self.expect_symbol(",")?;
        let iterable = self.parse_expression()?;
        let step = if self.at_symbol(",") {
            self.pos += 1;
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_symbol(")")?;
        self.expect_symbol("{")?;
        let body = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;
        Ok(Stmt::For {
            var,
            iterable,
            step,
            body,
        })
    }

    fn parse_while(&mut self) -> RunResult<Stmt> {
        self.expect_keyword("while")?;
        let (cond, body) = self.parse_cond_arm()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_try(&mut self) -> RunResult<Stmt> {
        self.expect_keyword("try")?;
        self.expect_symbol("{")?;
        let body = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;

        self.expect_keyword("catch")?;
        let binder = if self.at_symbol("(") {
            self.pos += 1;
            let name = self.expect_ident()?;
            self.expect_symbol(")")?;
            Some(name)
        } else {
            None
        };

        self.expect_symbol("{")?;
        let handler = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;
        Ok(Stmt::Try { binder, body, handler })
    }

    fn parse_class_decl(&mut self) -> RunResult<ClassDecl> {
        self.expect_keyword("class")?;
        let name = self.expect_ident()?;
        let mut parents = Vec::new();
        if self.at_symbol("(") {
            self.pos += 1;
            while !self.at_symbol(")") {
                parents.push(self.expect_ident()?);
                if self.at_symbol(",") {
                    self.pos += 1;
                }
            }
            self.expect_symbol(")")?;
        }
        self.expect_symbol("{")?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut nested = Vec::new();
        loop {
            match self.current() {
                None => return Err(Error::syntax("Unexpected EOF")),
                Some(tok) if tok.kind == TokenKind::Symbol && tok.text == "}" => break,
                Some(tok) if tok.kind == TokenKind::Keyword && tok.text == "def" => {
                    methods.push(self.parse_function()?);
                }
                Some(tok) if tok.kind == TokenKind::Keyword && tok.text == "class" => {
                    nested.push(self.parse_class_decl()?);
                }
                Some(tok) if tok.kind == TokenKind::Ident => {
                    let field = tok.text.clone();
                    self.pos += 1;
                    let default = if self.at_op("=") {
                        self.pos += 1;
                        Some(Rc::new(self.parse_expression()?))
                    } else {
                        None
                    };
                    fields.push((field, default));
                    if self.at_symbol(";") {
                        self.pos += 1;
                    }
                }
                Some(tok) => {
                    return Err(Error::syntax(format!(
                        "Expected field, method, or nested class in class, got '{}'",
                        tok.text
                    )));
                }
            }
        }
        self.expect_symbol("}")?;
        Ok(ClassDecl {
            name,
            parents,
            fields,
            methods,
            nested,
        })
    }

    /// `ffi { raw-text-until-matching-brace }` — the body is re-serialized
    /// from tokens and handed to the host sink verbatim at evaluation time.
    fn parse_ffi(&mut self) -> RunResult<Stmt> {
        self.expect_keyword("ffi")?;
        self.expect_symbol("{")?;
        let mut raw = String::new();
        let mut depth = 1u32;
        loop {
            let Some(tok) = self.current() else {
                return Err(Error::syntax("Unexpected EOF"));
            };
            if tok.kind == TokenKind::Symbol {
                if tok.text == "{" {
                    depth += 1;
                } else if tok.text == "}" {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        break;
                    }
                }
            }
            if tok.kind == TokenKind::Str {
                raw.push('\'');
                raw.push_str(&tok.text);
                raw.push('\'');
            } else {
                raw.push_str(&tok.text);
            }
            raw.push(' ');
            self.pos += 1;
        }
        Ok(Stmt::Ffi(raw.trim_end().to_owned()))
    }

    fn parse_match(&mut self) -> RunResult<Expr> {
        self.expect_keyword("match")?;
        self.expect_symbol("(")?;
        let subject = self.parse_expression()?;
        self.expect_symbol(")")?;
        self.expect_symbol("{")?;

        let mut arms = Vec::new();
        let mut default = None;
        loop {
            match self.current() {
                None => return Err(Error::syntax("Unexpected EOF")),
                Some(tok) if tok.kind == TokenKind::Symbol && tok.text == "}" => break,
                Some(tok) if tok.kind == TokenKind::Keyword && tok.text == "case" => {
                    self.pos += 1;
                    let mut patterns = vec![self.parse_expression()?];
                    while self.at_symbol("|") {
                        self.pos += 1;
                        patterns.push(self.parse_expression()?);
                    }
                    self.expect_symbol("{")?;
                    let body = self.parse_block(Some("}"))?;
                    self.expect_symbol("}")?;
                    arms.push(MatchArm { patterns, body });
                }
                Some(tok) if tok.kind == TokenKind::Keyword && tok.text == "else" => {
                    self.pos += 1;
                    self.expect_symbol("{")?;
                    let body = self.parse_block(Some("}"))?;
                    self.expect_symbol("}")?;
                    default = Some(body);
                }
                Some(tok) => {
                    return Err(Error::syntax(format!("Expected 'case' or 'else', got '{}'", tok.text)));
                }
            }
        }
        self.expect_symbol("}")?;
        Ok(Expr::Match {
            subject: Box::new(subject),
            arms,
            default,
        })
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> RunResult<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> RunResult<Expr> {
        let cond = self.parse_or()?;
        if self.at_symbol("?") {
            self.pos += 1;
            let then = self.parse_expression()?;
            self.expect_symbol(":")?;
            let otherwise = self.parse_expression()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> RunResult<Expr> {
        let mut left = self.parse_and()?;
        while self.at_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> RunResult<Expr> {
        let mut left = self.parse_membership()?;
        while self.at_keyword("and") {
            self.pos += 1;
            let right = self.parse_membership()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `E in E` and `E not in E`, parsed as non-chained comparisons.
    fn parse_membership(&mut self) -> RunResult<Expr> {
        let left = self.parse_compare()?;
        if self.at_keyword("in") {
            self.pos += 1;
            let container = self.parse_compare()?;
            return Ok(Expr::In {
                item: Box::new(left),
                container: Box::new(container),
                negated: false,
            });
        }
        if self.at_keyword("not") && self.peek(1).is_some_and(|t| t.kind == TokenKind::Keyword && t.text == "in") {
            self.pos += 2;
            let container = self.parse_compare()?;
            return Ok(Expr::In {
                item: Box::new(left),
                container: Box::new(container),
                negated: true,
            });
        }
        Ok(left)
    }

    fn parse_compare(&mut self) -> RunResult<Expr> {
        let left = self.parse_arith(0)?;
        if self.at_kind(TokenKind::Compare) {
            let op_text = self.bump()?.text;
            let op = CmpOp::from_symbol(&op_text)
                .ok_or_else(|| Error::syntax(format!("Unknown operator '{op_text}'")))?;
            let right = self.parse_arith(0)?;
            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    /// Precedence climbing over `+ - * / %`, all left-associative.
    fn parse_arith(&mut self, min_prec: u8) -> RunResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(tok) = self.current() else { break };
            if tok.kind != TokenKind::Op {
                break;
            }
            let Some(op) = BinOp::from_symbol(&tok.text) else { break };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = self.parse_arith(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> RunResult<Expr> {
        if self.at_op("-") {
            self.pos += 1;
            return Ok(match self.parse_unary()? {
                Expr::Int(n) => Expr::Int(-n),
                Expr::Float(f) => Expr::Float(-f),
                expr => Expr::Neg(Box::new(expr)),
            });
        }
        if self.at_keyword("not") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.at_op("**") {
            self.pos += 1;
            return Ok(Expr::KwUnpack(Box::new(self.parse_unary()?)));
        }
        if self.at_op("*") {
            self.pos += 1;
            return Ok(Expr::Unpack(Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> RunResult<Expr> {
        let mut node = self.parse_primary()?;
        loop {
            if self.at_symbol("(") {
                self.pos += 1;
                let args = self.parse_call_args()?;
                self.expect_symbol(")")?;
                node = Expr::Call {
                    callee: Box::new(node),
                    args,
                };
            } else if self.at_symbol("[") {
                self.pos += 1;
                node = self.parse_index_or_slice(node)?;
            } else if self.at_symbol(".") {
                self.pos += 1;
                match self.current() {
                    Some(tok) if tok.kind == TokenKind::Ident => {
                        let attr = tok.text.clone();
                        self.pos += 1;
                        node = Expr::GetAttr {
                            object: Box::new(node),
                            attr,
                        };
                    }
                    // A numeric literal followed by `.` followed by another
                    // numeric literal reassembles into a float literal.
                    Some(tok) if tok.kind == TokenKind::Number => {
                        let Expr::Int(whole) = node else {
                            return Err(Error::syntax("Attribute access must be followed by an ident"));
                        };
                        let fraction = self.bump()?.text;
                        let literal = format!("{whole}.{fraction}");
                        let value: f64 = literal
                            .parse()
                            .map_err(|_| Error::syntax(format!("Invalid number literal '{literal}'")))?;
                        node = Expr::Float(value);
                    }
                    _ => return Err(Error::syntax("Attribute access must be followed by an ident")),
                }
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_call_args(&mut self) -> RunResult<Vec<CallArg>> {
        let mut args = Vec::new();
        while !self.at_symbol(")") {
            if self.at_op("**") {
                self.pos += 1;
                args.push(CallArg::KwUnpack(self.parse_expression()?));
            } else if self.at_op("*") {
                self.pos += 1;
                args.push(CallArg::Unpack(self.parse_expression()?));
            } else if self.at_kind(TokenKind::Ident)
                && self.peek(1).is_some_and(|t| t.kind == TokenKind::Op && t.text == "=")
            {
                let name = self.expect_ident()?;
                self.pos += 1;
                args.push(CallArg::Keyword(name, self.parse_expression()?));
            } else {
                args.push(CallArg::Pos(self.parse_expression()?));
            }
            if self.at_symbol(",") {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(args)
    }

    /// After an opening `[`: an index when no colon appears, a slice with
    /// optional start/stop/step otherwise. Missing slice components stay
    /// `None` and evaluate as nulls.
    fn parse_index_or_slice(&mut self, object: Expr) -> RunResult<Expr> {
        let mut start = None;
        let mut stop = None;
        let mut step = None;
        let mut has_colon = false;

        if !self.at_symbol(":") {
            start = Some(self.parse_expression()?);
        }
        if self.at_symbol(":") {
            has_colon = true;
            self.pos += 1;
            if !self.at_symbol(":") && !self.at_symbol("]") {
                stop = Some(self.parse_expression()?);
            }
        }
        if self.at_symbol(":") {
            self.pos += 1;
            if !self.at_symbol("]") {
                step = Some(self.parse_expression()?);
            }
        }
        self.expect_symbol("]")?;

        if has_colon {
            Ok(Expr::Slice {
                object: Box::new(object),
                start: start.map(Box::new),
                stop: stop.map(Box::new),
                step: step.map(Box::new),
            })
        } else {
            let index = start.ok_or_else(|| Error::syntax("Expected index expression"))?;
            Ok(Expr::Index {
                object: Box::new(object),
                index: Box::new(index),
            })
        }
    }

    fn parse_primary(&mut self) -> RunResult<Expr> {
        let Some(tok) = self.current() else {
            return Err(Error::syntax("Unexpected EOF"));
        };
        match tok.kind {
            TokenKind::Number => {
                let text = self.bump()?.text;
                let value: i64 = text
                    .parse()
                    .map_err(|_| Error::syntax(format!("Number literal too large '{text}'")))?;
                Ok(Expr::Int(value))
            }
            TokenKind::Str => {
                let text = self.bump()?.text;
                Ok(Expr::Str(Rc::from(text.as_str())))
            }
            TokenKind::Ident => {
                let name = self.bump()?.text;
                Ok(Expr::Var(name))
            }
            TokenKind::Keyword if tok.text == "lambda" => self.parse_lambda(),
            TokenKind::Keyword if tok.text == "match" => self.parse_match(),
            TokenKind::Symbol if tok.text == "(" => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                self.expect_symbol(")")?;
                Ok(expr)
            }
            TokenKind::Symbol if tok.text == "[" => {
                self.pos += 1;
                self.parse_list_or_comp()
            }
            TokenKind::Symbol if tok.text == "{" => {
                self.pos += 1;
                self.parse_brace_form()
            }
            _ => Err(Error::syntax(format!(
                "Unexpected token {:?}: '{}'",
                tok.kind, tok.text
            ))),
        }
    }

    fn parse_lambda(&mut self) -> RunResult<Expr> {
        self.expect_keyword("lambda")?;
        self.expect_symbol("(")?;
        let params = self.parse_params()?;
        self.expect_symbol(")")?;
        self.expect_symbol("{")?;
        let body = self.parse_block(Some("}"))?;
        self.expect_symbol("}")?;
        Ok(Expr::Lambda {
            params: Rc::from(params),
            body: Rc::from(body),
        })
    }

    /// After an opening `[`: a list literal, or a pipe-syntax comprehension
    /// `[ expr | var, iterable, step | cond ... ]`.
    fn parse_list_or_comp(&mut self) -> RunResult<Expr> {
        if self.at_symbol("]") {
            self.pos += 1;
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_expression()?;

        if self.at_symbol("|") {
            self.pos += 1;
            let var = self.expect_ident()?;
            self.expect_symbol(",")?;
            let iterable = self.parse_expression()?;
            self.expect_symbol(",")?;
            let step = self.parse_expression()?;
            let mut conds = Vec::new();
            while self.at_symbol("|") {
                self.pos += 1;
                conds.push(self.parse_expression()?);
            }
            self.expect_symbol("]")?;
            return Ok(Expr::ListComp {
                expr: Box::new(first),
                var,
                iterable: Box::new(iterable),
                step: Box::new(step),
                conds,
            });
        }

        let mut items = vec![first];
        while self.at_symbol(",") {
            self.pos += 1;
            items.push(self.parse_expression()?);
        }
        self.expect_symbol("]")?;
        Ok(Expr::List(items))
    }

    /// After an opening `{`: empty dict, dict literal, dict comprehension,
    /// or a block, decided by the lookahead scan.
    fn parse_brace_form(&mut self) -> RunResult<Expr> {
        if self.at_symbol("}") {
            self.pos += 1;
            return Ok(Expr::Dict(Vec::new()));
        }

        if !self.brace_scan_finds_dict() {
            let body = self.parse_block(Some("}"))?;
            self.expect_symbol("}")?;
            return Ok(Expr::Block(body));
        }

        let key = self.parse_expression()?;

        if self.at_symbol("|") {
            self.pos += 1;
            let value = self.parse_expression()?;
            self.expect_symbol(",")?;
            let var = self.expect_ident()?;
            self.expect_symbol(",")?;
            let iterable = self.parse_expression()?;
            let cond = if self.at_symbol("|") {
                self.pos += 1;
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect_symbol("}")?;
            return Ok(Expr::DictComp {
                key: Box::new(key),
                value: Box::new(value),
                var,
                iterable: Box::new(iterable),
                cond,
            });
        }

        if self.at_symbol(":") {
            self.pos += 1;
            let value = self.parse_expression()?;
            let mut items = vec![(key, value)];
            while !self.at_symbol("}") {
                if self.at_symbol(",") {
                    self.pos += 1;
                }
                let k = self.parse_expression()?;
                self.expect_symbol(":")?;
                let v = self.parse_expression()?;
                items.push((k, v));
            }
            self.expect_symbol("}")?;
            return Ok(Expr::Dict(items));
        }

        // Lookahead promised a dict but the shape fell through; treat the
        // already-parsed expression as the first statement of a block.
        let mut body = vec![Stmt::Expr(key)];
        body.extend(self.parse_block(Some("}"))?);
        self.expect_symbol("}")?;
        Ok(Expr::Block(body))
    }

    /// The `{`-disambiguation scan: a dict iff, walking forward with an
    /// explicit depth counter past balanced inner braces, a `:` or `|`
    /// symbol appears at depth 1 before the matching `}`.
    fn brace_scan_finds_dict(&self) -> bool {
        let mut depth = 1u32;
        let mut pos = self.pos;
        while let Some(tok) = self.tokens.get(pos) {
            if tok.kind == TokenKind::Symbol {
                match tok.text.as_str() {
                    "{" => depth += 1,
                    "}" => {
                        depth -= 1;
                        if depth == 0 {
                            return false;
                        }
                    }
                    ":" | "|" if depth == 1 => return true,
                    _ => {}
                }
            }
            pos += 1;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    fn parse_source(source: &str) -> Vec<Stmt> {
        parse(tokenize(source).unwrap()).unwrap()
    }

    #[test]
    fn empty_braces_are_a_dict_not_a_block() {
        let stmts = parse_source("x = {};");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected assignment, got {stmts:?}");
        };
        assert!(matches!(value, Expr::Dict(items) if items.is_empty()));
    }

    #[test]
    fn brace_with_colon_is_a_dict_and_without_is_a_block() {
        let stmts = parse_source("{ 'a': 1 } { y; }");
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Dict(_))));
        assert!(matches!(&stmts[1], Stmt::Expr(Expr::Block(_))));
    }

    #[test]
    fn nested_braces_do_not_confuse_the_scan() {
        // The colon sits inside an inner brace pair, so the outer braces
        // are a block.
        let stmts = parse_source("{ d = { 1: 2 }; }");
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Block(_))));
    }

    #[test]
    fn number_dot_number_becomes_a_float() {
        let stmts = parse_source("x = 0.5;");
        let Stmt::Assign { value, .. } = &stmts[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(value, Expr::Float(f) if (*f - 0.5).abs() < f64::EPSILON));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let stmts = parse_source("2 + 3 * 4");
        let Stmt::Expr(Expr::Binary { op, right, .. }) = &stmts[0] else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn dotted_def_gets_a_self_parameter() {
        let stmts = parse_source("def Point.norm() { return 0; }");
        let Stmt::FuncDef(decl) = &stmts[0] else {
            panic!("expected function definition");
        };
        assert_eq!(decl.name, "Point.norm");
        assert_eq!(decl.params[0].name(), "self");
    }

    #[test]
    fn assignment_target_must_be_assignable() {
        let err = parse(tokenize("1 + 2 = 3;").unwrap()).unwrap_err();
        assert_eq!(err.message(), "Invalid assignment target");
    }

    #[test]
    fn eof_mid_construct_is_an_error() {
        let err = parse(tokenize("if (x) { print(x);").unwrap()).unwrap_err();
        assert_eq!(err.message(), "Unexpected EOF");
    }

    #[test]
    fn slice_forms_keep_missing_components() {
        let stmts = parse_source("xs[:]; xs[1:]; xs[::2];");
        assert!(matches!(
            &stmts[0],
            Stmt::Expr(Expr::Slice {
                start: None,
                stop: None,
                step: None,
                ..
            })
        ));
        assert!(matches!(
            &stmts[1],
            Stmt::Expr(Expr::Slice {
                start: Some(_),
                stop: None,
                ..
            })
        ));
        assert!(matches!(
            &stmts[2],
            Stmt::Expr(Expr::Slice {
                start: None,
                stop: None,
                step: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn call_arguments_support_keywords_and_unpacks() {
        let stmts = parse_source("f(1, x = 2, *rest, **kw);");
        let Stmt::Expr(Expr::Call { args, .. }) = &stmts[0] else {
            panic!("expected call");
        };
        assert!(matches!(args[0], CallArg::Pos(_)));
        assert!(matches!(&args[1], CallArg::Keyword(name, _) if name == "x"));
        assert!(matches!(args[2], CallArg::Unpack(_)));
        assert!(matches!(args[3], CallArg::KwUnpack(_)));
    }

    #[test]
    fn include_statement_requires_a_string_literal() {
        let stmts = parse_source("include \"lib/util.fn\"; include(name);");
        assert!(matches!(&stmts[0], Stmt::Include(path) if path == "lib/util.fn"));
        assert!(matches!(&stmts[1], Stmt::Expr(Expr::Call { .. })));
    }
}
