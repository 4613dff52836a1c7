// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The QSOL parser uses recursive descent to turn an input string into an abstract
//! syntax tree, with Pratt parsing for expression operator precedence. The parser
//! produces a tree with placeholder node identifiers that are expected to be replaced
//! with unique identifiers by a later stage.
//!
//! Statements are terminated by semicolons and newlines are insignificant. All parse
//! failures carry the stable diagnostic code `QSOL1001`.

mod expr;
mod item;
mod keyword;
mod lex;
mod prim;
mod scan;

use lex::TokenKind;
use miette::Diagnostic;
use qsolc_ast::ast::{Expr, Item};
use qsolc_data_structures::span::Span;
use scan::Scanner;
use std::result;
use thiserror::Error;

pub use keyword::Keyword;

#[derive(Clone, Copy, Debug, Diagnostic, Eq, Error, PartialEq)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error(ErrorKind);

impl Error {
    #[must_use]
    pub fn with_offset(self, offset: u32) -> Self {
        Self(self.0.with_offset(offset))
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self.0 {
            ErrorKind::Lex(error) => error.span(),
            ErrorKind::Token(_, _, span)
            | ErrorKind::Rule(_, _, span)
            | ErrorKind::Lit(_, span)
            | ErrorKind::MissingSemi(span)
            | ErrorKind::MissingSeqEntry(span) => span,
        }
    }
}

#[derive(Clone, Copy, Debug, Diagnostic, Eq, Error, PartialEq)]
enum ErrorKind {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(lex::Error),
    #[error("invalid {0} literal")]
    #[diagnostic(code("QSOL1001"))]
    Lit(&'static str, #[label] Span),
    #[error("expected {0}, found {1}")]
    #[diagnostic(code("QSOL1001"))]
    Token(TokenKind, TokenKind, #[label] Span),
    #[error("expected {0}, found {1}")]
    #[diagnostic(code("QSOL1001"))]
    Rule(&'static str, TokenKind, #[label] Span),
    #[error("expected statement to end with a semicolon")]
    #[diagnostic(code("QSOL1001"))]
    MissingSemi(#[label] Span),
    #[error("expected an item before this comma")]
    #[diagnostic(code("QSOL1001"))]
    MissingSeqEntry(#[label] Span),
}

impl ErrorKind {
    fn with_offset(self, offset: u32) -> Self {
        match self {
            Self::Lex(error) => Self::Lex(error.with_offset(offset)),
            Self::Lit(name, span) => Self::Lit(name, span + offset),
            Self::Token(expected, actual, span) => Self::Token(expected, actual, span + offset),
            Self::Rule(name, token, span) => Self::Rule(name, token, span + offset),
            Self::MissingSemi(span) => Self::MissingSemi(span + offset),
            Self::MissingSeqEntry(span) => Self::MissingSeqEntry(span + offset),
        }
    }
}

type Result<T> = result::Result<T, Error>;

trait Parser<T>: FnMut(&mut Scanner) -> Result<T> {}

impl<T, F: FnMut(&mut Scanner) -> Result<T>> Parser<T> for F {}

/// Parses a QSOL module: a sequence of top-level items up to EOF.
#[must_use]
pub fn items(input: &str) -> (Vec<Item>, Vec<Error>) {
    let mut scanner = Scanner::new(input);
    match item::parse_items(&mut scanner) {
        Ok(items) => (items, scanner.into_errors()),
        Err(error) => {
            let mut errors = scanner.into_errors();
            errors.push(error);
            (Vec::new(), errors)
        }
    }
}

/// Parses a single expression up to EOF. Used by tests and diagnostics tooling.
#[must_use]
pub fn expr(input: &str) -> (Box<Expr>, Vec<Error>) {
    let mut scanner = Scanner::new(input);
    match expr::expr_eof(&mut scanner) {
        Ok(expr) => (expr, scanner.into_errors()),
        Err(error) => {
            let mut errors = scanner.into_errors();
            errors.push(error);
            (Box::default(), errors)
        }
    }
}
