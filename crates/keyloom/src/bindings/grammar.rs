//! Text grammar for binding descriptions.
//!
//! A single signal is written `name (arg, arg, ...)`:
//!
//! ```text
//! move-handle (SCROLL_PAGE_LEFT)
//! popup (3, -1.5, "hi\n", EDGE_START)
//! "cycle-child-focus" (true)
//! ```
//!
//! Binding sources are sequences of statements:
//!
//! ```text
//! # comments run to end of line
//! bind "<Control>F6" { cycle-child-focus (false) }
//! bind "F8" { cycle-handle-focus (0) accept-position () }
//! unbind "Escape"
//! ```
//!
//! Statements that fail to parse are skipped with a warning logged, and
//! parsing resumes at the next line.

use std::fmt;

use thiserror::Error;

use super::arg::{Arg, SignalSpec};
use super::keys::KeySpec;

/// The token a parser wanted when it failed.
///
/// `None` means the parse succeeded; it is only returned by
/// convenience functions such as [`check_signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expected {
    None,
    LeftParen,
    RightParen,
    Identifier,
    Value,
    Comma,
    UnterminatedString,
    /// A quoted accelerator after `bind`/`unbind`.
    String,
    LeftBrace,
    RightBrace,
    /// `bind` or `unbind`.
    Keyword,
    /// The quoted accelerator did not name a valid key.
    Accelerator,
    /// Trailing input after a complete description.
    End,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "nothing",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Identifier => "a signal name",
            Self::Value => "an argument value",
            Self::Comma => "','",
            Self::UnterminatedString => "a closing '\"'",
            Self::String => "a quoted accelerator",
            Self::LeftBrace => "'{'",
            Self::RightBrace => "'}'",
            Self::Keyword => "'bind' or 'unbind'",
            Self::Accelerator => "a valid accelerator",
            Self::End => "end of input",
        };
        f.write_str(s)
    }
}

/// A grammar failure at a byte offset of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} at offset {offset}")]
pub struct ParseError {
    pub expected: Expected,
    pub offset: usize,
}

impl ParseError {
    fn new(expected: Expected, offset: usize) -> Self {
        Self { expected, offset }
    }

    /// One-based line and column of the error within `source`.
    pub fn line_column(&self, source: &str) -> (usize, usize) {
        let offset = self.offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

/// One parsed binding statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Replace the entry for `key` with these signals.
    Bind { key: KeySpec, signals: Vec<SignalSpec> },
    /// Install a skip marker for `key`.
    Unbind { key: KeySpec },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { key, signals } => {
                write!(f, "bind \"{key}\" {{")?;
                for signal in signals {
                    write!(f, " {signal}")?;
                }
                f.write_str(" }")
            }
            Self::Unbind { key } => write!(f, "unbind \"{key}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    /// Unsigned magnitude; a leading `-` is applied by the parser.
    Int(u64),
    Float(f64),
    Str(String),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Minus,
    Semicolon,
    /// A character or literal the grammar has no use for.
    Invalid,
    Eof,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                self.skip_line();
            } else {
                break;
            }
        }
    }

    /// Advance past the next newline (or to the end of input).
    fn skip_line(&mut self) {
        match self.rest().find('\n') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.src.len(),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek_char().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Lex one token, returning it with its starting offset.
    fn next_token(&mut self) -> Result<(Token, usize), ParseError> {
        self.skip_trivia();
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok((Token::Eof, start));
        };

        let token = match c {
            '(' | ')' | '{' | '}' | ',' | '-' | ';' => {
                self.bump();
                match c {
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '{' => Token::LeftBrace,
                    '}' => Token::RightBrace,
                    ',' => Token::Comma,
                    '-' => Token::Minus,
                    _ => Token::Semicolon,
                }
            }
            '"' => {
                self.bump();
                Token::Str(self.lex_string(start)?)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
                Token::Ident(ident.to_string())
            }
            c if c.is_ascii_digit() || c == '.' => self.lex_number(),
            _ => {
                self.bump();
                Token::Invalid
            }
        };
        Ok((token, start))
    }

    fn lex_string(&mut self, start: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::new(Expected::UnterminatedString, start)),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::new(Expected::UnterminatedString, start)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(other) => out.push(other),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let rest = self.rest();
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            let digits = hex.len() - hex.trim_start_matches(|c: char| c.is_ascii_hexdigit()).len();
            if digits > 0 {
                let text = &hex[..digits];
                self.pos += 2 + digits;
                return u64::from_str_radix(text, 16).map_or(Token::Invalid, Token::Int);
            }
        }

        let start = self.pos;
        let mut is_float = false;
        self.take_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') {
            is_float = true;
            self.bump();
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let save = self.pos;
            self.bump();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.bump();
            }
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                self.pos = save;
            } else {
                is_float = true;
            }
        }

        let text = &self.src[start..self.pos];
        if is_float {
            text.parse().map_or(Token::Invalid, Token::Float)
        } else {
            text.parse().map_or(Token::Invalid, Token::Int)
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let (token, offset) = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            offset,
        })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let (next, offset) = self.lexer.next_token()?;
        self.offset = offset;
        Ok(std::mem::replace(&mut self.token, next))
    }

    fn error(&self, expected: Expected) -> ParseError {
        ParseError::new(expected, self.offset)
    }

    fn eat(&mut self, token: &Token) -> Result<bool, ParseError> {
        if &self.token == token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_signal(&mut self) -> Result<SignalSpec, ParseError> {
        let name = match &self.token {
            Token::Ident(name) | Token::Str(name) => name.clone(),
            _ => return Err(self.error(Expected::Identifier)),
        };
        self.advance()?;

        if !self.eat(&Token::LeftParen)? {
            return Err(self.error(Expected::LeftParen));
        }

        let mut args = Vec::new();
        if self.eat(&Token::RightParen)? {
            return Ok(SignalSpec::new(name, args));
        }
        loop {
            args.push(self.parse_value()?);
            match self.token {
                Token::Comma => {
                    self.advance()?;
                }
                Token::RightParen => {
                    self.advance()?;
                    return Ok(SignalSpec::new(name, args));
                }
                Token::Eof => return Err(self.error(Expected::RightParen)),
                _ => return Err(self.error(Expected::Comma)),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Arg, ParseError> {
        let negate = self.eat(&Token::Minus)?;
        let arg = match (&self.token, negate) {
            (Token::Int(magnitude), _) => {
                let magnitude = i128::from(*magnitude);
                let value = if negate { -magnitude } else { magnitude };
                match i64::try_from(value) {
                    Ok(value) => Arg::Int64(value),
                    Err(_) => return Err(self.error(Expected::Value)),
                }
            }
            (Token::Float(v), _) => Arg::Float64(if negate { -*v } else { *v }),
            (Token::Str(s), false) => Arg::String(s.clone()),
            (Token::Ident(ident), false) => match ident.as_str() {
                "true" | "TRUE" => Arg::bool(true),
                "false" | "FALSE" => Arg::bool(false),
                _ => Arg::enum_named(ident.clone()),
            },
            _ => return Err(self.error(Expected::Value)),
        };
        self.advance()?;
        Ok(arg)
    }

    fn parse_key(&mut self) -> Result<KeySpec, ParseError> {
        let Token::Str(accel) = &self.token else {
            return Err(self.error(Expected::String));
        };
        let key = KeySpec::parse_accelerator(accel).ok_or_else(|| self.error(Expected::Accelerator))?;
        self.advance()?;
        Ok(key)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = match &self.token {
            Token::Ident(kw) if kw == "bind" => {
                self.advance()?;
                let key = self.parse_key()?;
                if !self.eat(&Token::LeftBrace)? {
                    return Err(self.error(Expected::LeftBrace));
                }
                let mut signals = Vec::new();
                loop {
                    match self.token {
                        Token::RightBrace => {
                            self.advance()?;
                            break;
                        }
                        Token::Eof => return Err(self.error(Expected::RightBrace)),
                        _ => {
                            signals.push(self.parse_signal()?);
                            self.eat(&Token::Semicolon)?;
                        }
                    }
                }
                Statement::Bind { key, signals }
            }
            Token::Ident(kw) if kw == "unbind" => {
                self.advance()?;
                Statement::Unbind { key: self.parse_key()? }
            }
            _ => return Err(self.error(Expected::Keyword)),
        };
        self.eat(&Token::Semicolon)?;
        Ok(statement)
    }

    /// Skip the rest of the line holding the failed token and re-prime.
    fn recover(&mut self, failed_at: usize) -> Result<(), ParseError> {
        self.lexer.pos = failed_at.min(self.lexer.src.len());
        self.lexer.skip_line();
        let (token, offset) = self.lexer.next_token()?;
        self.token = token;
        self.offset = offset;
        Ok(())
    }
}

/// Parse a single `name (args)` description.
pub fn parse_signal(text: &str) -> Result<SignalSpec, ParseError> {
    let mut parser = Parser::new(text)?;
    let spec = parser.parse_signal()?;
    parser.eat(&Token::Semicolon)?;
    if parser.token != Token::Eof {
        return Err(parser.error(Expected::End));
    }
    Ok(spec)
}

/// Check a single description, returning [`Expected::None`] on success.
pub fn check_signal(text: &str) -> Expected {
    match parse_signal(text) {
        Ok(_) => Expected::None,
        Err(err) => err.expected,
    }
}

/// Format a description in the form [`parse_signal`] accepts.
pub fn format_signal(spec: &SignalSpec) -> String {
    spec.to_string()
}

/// Parse a binding source of `bind`/`unbind` statements.
///
/// Returns every statement that parsed together with the errors met along
/// the way. After an error the rest of that line is skipped.
pub fn parse_statements(source: &str) -> (Vec<Statement>, Vec<ParseError>) {
    let mut statements = Vec::new();
    let mut errors = Vec::new();

    let mut parser = match Parser::new(source) {
        Ok(parser) => parser,
        Err(err) => {
            // The very first token was an unterminated string; retry after it.
            errors.push(err);
            let mut lexer = Lexer::new(source);
            lexer.pos = err.offset;
            lexer.skip_line();
            let tail = &source[lexer.pos..];
            let (rest, mut more) = parse_statements(tail);
            for e in &mut more {
                e.offset += lexer.pos;
            }
            errors.extend(more);
            return (rest, errors);
        }
    };

    while parser.token != Token::Eof {
        match parser.parse_statement() {
            Ok(statement) => statements.push(statement),
            Err(err) => {
                let (line, column) = err.line_column(source);
                tracing::warn!(target: "keyloom::bindings::grammar", line, column, expected = %err.expected, "skipping malformed binding statement");
                errors.push(err);
                let mut failed_at = err.offset;
                loop {
                    match parser.recover(failed_at) {
                        Ok(()) => break,
                        Err(next) => {
                            let (line, column) = next.line_column(source);
                            tracing::warn!(target: "keyloom::bindings::grammar", line, column, expected = %next.expected, "skipping malformed binding statement");
                            errors.push(next);
                            failed_at = next.offset;
                        }
                    }
                }
            }
        }
    }

    (statements, errors)
}
