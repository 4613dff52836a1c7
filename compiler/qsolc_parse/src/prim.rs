// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{Error, Parser, Result};
use crate::{
    lex::TokenKind,
    scan::Scanner,
    ErrorKind,
};
use qsolc_ast::ast::{Ident, NodeId, Path};
use qsolc_data_structures::span::{Span, WithSpan};

pub(super) fn token(s: &mut Scanner, t: TokenKind) -> Result<()> {
    if s.peek().kind == t {
        s.advance();
        Ok(())
    } else {
        Err(Error(ErrorKind::Token(t, s.peek().kind, s.peek().span)))
    }
}

pub(super) fn ident(s: &mut Scanner) -> Result<Ident> {
    let peek = s.peek();
    if peek.kind == TokenKind::Ident {
        let name = s.read().into();
        s.advance();
        Ok(Ident {
            id: NodeId::default(),
            span: peek.span,
            name,
        })
    } else {
        Err(Error(ErrorKind::Rule("identifier", peek.kind, peek.span)))
    }
}

/// A dot-separated list of idents like `stdlib.constraints`. Only the dotted-identifier
/// form is supported for imports.
pub(super) fn path(s: &mut Scanner) -> Result<Path> {
    let lo = s.peek().span.lo;
    let mut parts = vec![ident(s)?];
    while s.peek().kind == TokenKind::Dot {
        s.advance();
        parts.push(ident(s)?);
    }

    Ok(Path {
        id: NodeId::default(),
        span: s.span(lo),
        parts: parts.into_boxed_slice(),
    })
}

/// Optionally parse with the given parser.
/// Returns Ok(Some(value)) if the parser succeeded,
/// Ok(None) if the parser failed on the first token,
/// Err(error) if the parser failed after consuming some tokens.
pub(super) fn opt<T>(s: &mut Scanner, mut p: impl Parser<T>) -> Result<Option<T>> {
    let offset = s.peek().span.lo;
    match p(s) {
        Ok(x) => Ok(Some(x)),
        Err(error) if advanced(s, offset) => Err(error),
        Err(_) => Ok(None),
    }
}

pub(super) fn many<T>(s: &mut Scanner, mut p: impl Parser<T>) -> Result<Vec<T>> {
    let mut xs = Vec::new();
    while let Some(x) = opt(s, &mut p)? {
        xs.push(x);
    }
    Ok(xs)
}

/// Parses a sequence of items separated by commas.
/// Supports recovering on missing items.
pub(super) fn seq<T>(s: &mut Scanner, mut p: impl Parser<T>) -> Result<Vec<T>>
where
    T: Default + WithSpan,
{
    let mut xs = Vec::new();
    while s.peek().kind == TokenKind::Comma {
        let mut span = s.peek().span;
        span.hi = span.lo;
        s.push_error(Error(ErrorKind::MissingSeqEntry(span)));
        xs.push(T::default().with_span(span));
        s.advance();
    }
    while let Some(x) = opt(s, &mut p)? {
        xs.push(x);
        if token(s, TokenKind::Comma).is_err() {
            break;
        }
        while s.peek().kind == TokenKind::Comma {
            let mut span = s.peek().span;
            span.hi = span.lo;
            s.push_error(Error(ErrorKind::MissingSeqEntry(span)));
            xs.push(T::default().with_span(span));
            s.advance();
        }
    }
    Ok(xs)
}

pub(super) fn recovering<T>(
    s: &mut Scanner,
    default: impl FnOnce(Span) -> T,
    tokens: &[TokenKind],
    mut p: impl Parser<T>,
) -> Result<T> {
    let offset = s.peek().span.lo;
    match p(s) {
        Ok(value) => Ok(value),
        Err(error) if advanced(s, offset) => {
            s.push_error(error);
            s.recover(tokens);
            Ok(default(s.span(offset)))
        }
        Err(error) => Err(error),
    }
}

pub(super) fn recovering_semi(s: &mut Scanner) {
    if let Err(error) = token(s, TokenKind::Semi) {
        // no recovery, just move on to the next token
        s.push_error(error);
    }
}

pub(super) fn barrier<'a, T>(
    s: &mut Scanner<'a>,
    tokens: &'a [TokenKind],
    mut p: impl Parser<T>,
) -> Result<T> {
    s.push_barrier(tokens);
    let result = p(s);
    s.pop_barrier().expect("barrier should be popped");
    result
}

fn advanced(s: &Scanner, from: u32) -> bool {
    s.peek().span.lo > from
}
