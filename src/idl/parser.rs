//! Recursive descent parser for protobuf IDL files.
//!
//! Only the constructs that matter for scaffolding are modelled: the
//! package, imports, the names of (nested) messages and enums, and services
//! with their RPC signatures. Field declarations, options, reserved ranges,
//! `oneof` and `extend` blocks are syntax-checked just enough to be skipped.

use std::path::{Path, PathBuf};

use super::lexer::{tokenize, Token, TokenKind};
use crate::error::{GenError, Result, SourceLocation};

/// A name as written in the source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTypeName {
    /// Dotted name; a leading `.` marks it fully-qualified
    pub name: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMethod {
    pub name: String,
    pub input: RawTypeName,
    pub output: RawTypeName,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawService {
    pub name: String,
    pub methods: Vec<RawMethod>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

/// Declarations of one parsed IDL file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdlFile {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<RawImport>,
    /// Message names, outermost first (`["Outer", "Inner"]`)
    pub messages: Vec<Vec<String>>,
    /// Enum names, outermost first
    pub enums: Vec<Vec<String>>,
    pub services: Vec<RawService>,
}

impl IdlFile {
    pub fn location(&self, line: usize, column: usize) -> SourceLocation {
        SourceLocation {
            file: self.path.clone(),
            line,
            column,
        }
    }
}

/// Parse the IDL `source` read from `path`.
pub fn parse_source(path: &Path, source: &str) -> Result<IdlFile> {
    let tokens = tokenize(path, source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        file: IdlFile {
            path: path.to_path_buf(),
            ..Default::default()
        },
    };
    parser.parse_file()?;
    Ok(parser.file)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: IdlFile,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn error_at(
        &self,
        token: Option<&Token>,
        construct: &str,
        message: impl Into<String>,
    ) -> GenError {
        let (line, column) = match token.or_else(|| self.tokens.last()) {
            Some(t) => (t.line, t.column),
            None => (1, 1),
        };
        GenError::parse(self.file.location(line, column), construct, message)
    }

    fn next(&mut self, construct: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some(t) => {
                self.pos += 1;
                Ok(t.clone())
            }
            None => Err(self.error_at(None, construct, "unexpected end of file")),
        }
    }

    fn expect_symbol(&mut self, c: char, construct: &str) -> Result<Token> {
        let tok = self.next(construct)?;
        if tok.is_symbol(c) {
            Ok(tok)
        } else {
            Err(self.error_at(
                Some(&tok),
                construct,
                format!("expected `{c}`, found {}", tok.describe()),
            ))
        }
    }

    fn expect_ident(&mut self, construct: &str) -> Result<(String, Token)> {
        let tok = self.next(construct)?;
        match &tok.kind {
            TokenKind::Ident(name) => Ok((name.clone(), tok.clone())),
            _ => Err(self.error_at(
                Some(&tok),
                construct,
                format!("expected an identifier, found {}", tok.describe()),
            )),
        }
    }

    fn expect_keyword(&mut self, word: &str, construct: &str) -> Result<()> {
        let tok = self.next(construct)?;
        if tok.is_ident(word) {
            Ok(())
        } else {
            Err(self.error_at(
                Some(&tok),
                construct,
                format!("expected `{word}`, found {}", tok.describe()),
            ))
        }
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        if self.peek().is_some_and(|t| t.is_symbol(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `ident ('.' ident)*`, optionally with a leading `.`.
    fn dotted_name(&mut self, construct: &str) -> Result<RawTypeName> {
        let first = self.peek().cloned();
        let mut name = String::new();
        if self.eat_symbol('.') {
            name.push('.');
        }
        let (part, tok) = self.expect_ident(construct)?;
        name.push_str(&part);
        while self.peek().is_some_and(|t| t.is_symbol('.')) {
            self.pos += 1;
            let (part, _) = self.expect_ident(construct)?;
            name.push('.');
            name.push_str(&part);
        }
        let anchor = first.unwrap_or(tok);
        Ok(RawTypeName {
            name,
            line: anchor.line,
            column: anchor.column,
        })
    }

    /// Skip one statement: up to a `;` at depth zero, or through a braced
    /// block (and an optional trailing `;`).
    fn skip_statement(&mut self, construct: &str) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let tok = self.next(construct)?;
            match tok.kind {
                TokenKind::Symbol(';') if depth == 0 => return Ok(()),
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => {
                    if depth == 0 {
                        return Err(self.error_at(Some(&tok), construct, "unexpected `}`"));
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.eat_symbol(';');
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_file(&mut self) -> Result<()> {
        while let Some(tok) = self.peek().cloned() {
            match &tok.kind {
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Ident(word) => match word.as_str() {
                    "syntax" | "edition" | "option" | "extend" => {
                        self.pos += 1;
                        self.skip_statement(word)?;
                    }
                    "package" => self.parse_package(&tok)?,
                    "import" => self.parse_import()?,
                    "message" => {
                        self.pos += 1;
                        self.parse_message(&[])?;
                    }
                    "enum" => {
                        self.pos += 1;
                        self.parse_enum(&[])?;
                    }
                    "service" => self.parse_service()?,
                    other => {
                        return Err(self.error_at(
                            Some(&tok),
                            "top-level declaration",
                            format!("unexpected `{other}`"),
                        ))
                    }
                },
                _ => {
                    return Err(self.error_at(
                        Some(&tok),
                        "top-level declaration",
                        format!("unexpected {}", tok.describe()),
                    ))
                }
            }
        }
        Ok(())
    }

    fn parse_package(&mut self, tok: &Token) -> Result<()> {
        self.pos += 1;
        if self.file.package.is_some() {
            return Err(self.error_at(Some(tok), "package", "multiple package declarations"));
        }
        let name = self.dotted_name("package")?;
        self.expect_symbol(';', "package")?;
        self.file.package = Some(name.name.trim_start_matches('.').to_string());
        Ok(())
    }

    fn parse_import(&mut self) -> Result<()> {
        self.pos += 1;
        if self
            .peek()
            .is_some_and(|t| t.is_ident("public") || t.is_ident("weak"))
        {
            self.pos += 1;
        }
        let tok = self.next("import")?;
        let TokenKind::Str(path) = &tok.kind else {
            return Err(self.error_at(
                Some(&tok),
                "import",
                format!("expected a quoted file name, found {}", tok.describe()),
            ));
        };
        self.file.imports.push(RawImport {
            path: path.clone(),
            line: tok.line,
            column: tok.column,
        });
        self.expect_symbol(';', "import")?;
        Ok(())
    }

    /// Called after the `message` keyword.
    fn parse_message(&mut self, scope: &[String]) -> Result<()> {
        let (name, _) = self.expect_ident("message")?;
        let mut path = scope.to_vec();
        path.push(name.clone());
        let construct = format!("message {}", path.join("."));
        self.expect_symbol('{', &construct)?;
        self.file.messages.push(path.clone());
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error_at(None, &construct, "missing closing `}`"));
            };
            if tok.is_symbol('}') {
                self.pos += 1;
                return Ok(());
            }
            if tok.is_symbol(';') {
                self.pos += 1;
                continue;
            }
            let nested_decl = self
                .peek_at(1)
                .is_some_and(|t| matches!(t.kind, TokenKind::Ident(_)))
                && self.peek_at(2).is_some_and(|t| t.is_symbol('{'));
            if nested_decl && tok.is_ident("message") {
                self.pos += 1;
                self.parse_message(&path)?;
            } else if nested_decl && tok.is_ident("enum") {
                self.pos += 1;
                self.parse_enum(&path)?;
            } else {
                self.skip_statement(&construct)?;
            }
        }
    }

    /// Called after the `enum` keyword.
    fn parse_enum(&mut self, scope: &[String]) -> Result<()> {
        let (name, _) = self.expect_ident("enum")?;
        let mut path = scope.to_vec();
        path.push(name);
        let construct = format!("enum {}", path.join("."));
        let open = self.peek().cloned();
        if !open.as_ref().is_some_and(|t| t.is_symbol('{')) {
            return Err(self.error_at(open.as_ref(), &construct, "expected `{`"));
        }
        self.skip_statement(&construct)?;
        self.file.enums.push(path);
        Ok(())
    }

    fn parse_service(&mut self) -> Result<()> {
        let start = self.next("service")?;
        let (name, _) = self.expect_ident("service")?;
        let construct = format!("service {name}");
        self.expect_symbol('{', &construct)?;
        let mut methods = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error_at(None, &construct, "missing closing `}`"));
            };
            if tok.is_symbol('}') {
                self.pos += 1;
                break;
            }
            if tok.is_symbol(';') {
                self.pos += 1;
            } else if tok.is_ident("option") {
                self.pos += 1;
                self.skip_statement(&construct)?;
            } else if tok.is_ident("rpc") {
                self.pos += 1;
                methods.push(self.parse_rpc(&name)?);
            } else {
                return Err(self.error_at(
                    Some(&tok),
                    &construct,
                    format!("expected `rpc` or `option`, found {}", tok.describe()),
                ));
            }
        }
        self.file.services.push(RawService {
            name,
            methods,
            line: start.line,
            column: start.column,
        });
        Ok(())
    }

    /// Called after the `rpc` keyword.
    fn parse_rpc(&mut self, service: &str) -> Result<RawMethod> {
        let (name, name_tok) = self.expect_ident("rpc")?;
        let construct = format!("rpc {service}.{name}");
        let (client_streaming, input) = self.parse_rpc_type(&construct)?;
        self.expect_keyword("returns", &construct)?;
        let (server_streaming, output) = self.parse_rpc_type(&construct)?;
        let tok = self.peek().cloned();
        match tok {
            Some(t) if t.is_symbol(';') => self.pos += 1,
            Some(t) if t.is_symbol('{') => self.skip_statement(&construct)?,
            other => {
                return Err(self.error_at(
                    other.as_ref(),
                    &construct,
                    "expected `;` or an option block after the signature",
                ))
            }
        }
        Ok(RawMethod {
            name,
            input,
            output,
            client_streaming,
            server_streaming,
            line: name_tok.line,
            column: name_tok.column,
        })
    }

    /// `'(' ['stream'] type ')'`
    fn parse_rpc_type(&mut self, construct: &str) -> Result<(bool, RawTypeName)> {
        self.expect_symbol('(', construct)?;
        let streaming = self.peek().is_some_and(|t| t.is_ident("stream"))
            && self.peek_at(1).is_some_and(|t| {
                matches!(t.kind, TokenKind::Ident(_)) || t.is_symbol('.')
            });
        if streaming {
            self.pos += 1;
        }
        let ty = self.dotted_name(construct)?;
        self.expect_symbol(')', construct)?;
        Ok((streaming, ty))
    }
}
