//! Tokenizer for protobuf IDL source.

use std::path::Path;

use crate::error::{GenError, Result, SourceLocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`message`, `HealthCheck`, `int32`)
    Ident(String),
    /// Numeric literal, kept as written
    Number(String),
    /// String literal with escapes left as written
    Str(String),
    /// Any other single character (`{`, `;`, `.`, `=`, ...)
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == word)
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) => format!("`{s}`"),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Str(s) => format!("string \"{s}\""),
            TokenKind::Symbol(c) => format!("`{c}`"),
        }
    }
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl Cursor<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
    }
}

/// Split `source` into tokens, dropping whitespace and comments.
pub fn tokenize(file: &Path, source: &str) -> Result<Vec<Token>> {
    let mut cur = Cursor {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    let location = |line, column| SourceLocation {
        file: file.to_path_buf(),
        line,
        column,
    };

    while let Some(c) = cur.peek() {
        let (line, column) = (cur.line, cur.column);
        if c.is_whitespace() {
            cur.bump();
            continue;
        }
        if c == '/' {
            cur.bump();
            match cur.peek() {
                Some('/') => {
                    while let Some(c) = cur.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    cur.bump();
                    let mut prev = '\0';
                    loop {
                        match cur.bump() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => {
                                return Err(GenError::parse(
                                    location(line, column),
                                    "comment",
                                    "unterminated block comment",
                                ))
                            }
                        }
                    }
                }
                _ => tokens.push(Token {
                    kind: TokenKind::Symbol('/'),
                    line,
                    column,
                }),
            }
            continue;
        }
        let kind = if c.is_alphabetic() || c == '_' {
            let mut s = String::new();
            cur.eat_while(&mut s, |c| c.is_alphanumeric() || c == '_');
            TokenKind::Ident(s)
        } else if c.is_ascii_digit() {
            let mut s = String::new();
            let mut prev = '\0';
            while let Some(c) = cur.peek() {
                let exponent_sign = (c == '+' || c == '-') && (prev == 'e' || prev == 'E');
                if !(c.is_alphanumeric() || c == '.' || exponent_sign) {
                    break;
                }
                s.push(c);
                prev = c;
                cur.bump();
            }
            TokenKind::Number(s)
        } else if c == '"' || c == '\'' {
            let quote = c;
            cur.bump();
            let mut s = String::new();
            loop {
                match cur.bump() {
                    Some('\\') => {
                        s.push('\\');
                        if let Some(escaped) = cur.bump() {
                            s.push(escaped);
                        }
                    }
                    Some(c) if c == quote => break,
                    Some('\n') | None => {
                        return Err(GenError::parse(
                            location(line, column),
                            "string literal",
                            "unterminated string literal",
                        ))
                    }
                    Some(c) => s.push(c),
                }
            }
            TokenKind::Str(s)
        } else {
            cur.bump();
            TokenKind::Symbol(c)
        };
        tokens.push(Token { kind, line, column });
    }
    Ok(tokens)
}
