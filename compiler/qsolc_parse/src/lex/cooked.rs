// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The second lexing phase "cooks" a raw token stream, transforming it into tokens that
//! directly correspond to components in the QSOL grammar: compound operators like `<=`
//! and `=>` are assembled, identifiers matching keywords become keyword tokens.
//!
//! Whitespace and comment tokens are discarded; this means that cooked tokens are not
//! necessarily contiguous, so they carry both a starting and ending byte offset.

#[cfg(test)]
mod tests;

use super::{
    raw::{self, Number, Single},
    Delim,
};
use crate::keyword::Keyword;
use enum_iterator::Sequence;
use miette::Diagnostic;
use qsolc_data_structures::span::Span;
use std::{
    fmt::{self, Display, Formatter},
    iter::Peekable,
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Clone, Copy, Debug, Diagnostic, Eq, Error, PartialEq)]
pub(crate) enum Error {
    #[error("expected `{0}` to complete `{1}`, found {2}")]
    #[diagnostic(code("QSOL1001"))]
    Incomplete(char, &'static str, raw::TokenKind, #[label] Span),

    #[error("expected `{0}` to complete `{1}`, found EOF")]
    #[diagnostic(code("QSOL1001"))]
    IncompleteEof(char, &'static str, #[label] Span),

    #[error("unrecognized character `{0}`")]
    #[diagnostic(code("QSOL1001"))]
    Unknown(char, #[label] Span),
}

impl Error {
    pub(crate) fn with_offset(self, offset: u32) -> Self {
        match self {
            Self::Incomplete(expected, token, actual, span) => {
                Self::Incomplete(expected, token, actual, span + offset)
            }
            Self::IncompleteEof(expected, token, span) => {
                Self::IncompleteEof(expected, token, span + offset)
            }
            Self::Unknown(c, span) => Self::Unknown(c, span + offset),
        }
    }

    pub(crate) fn span(self) -> Span {
        match self {
            Self::Incomplete(_, _, _, span)
            | Self::IncompleteEof(_, _, span)
            | Self::Unknown(_, span) => span,
        }
    }
}

/// A token kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence)]
pub(crate) enum TokenKind {
    /// A closing delimiter.
    Close(Delim),
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// End of file.
    Eof,
    /// `=`
    Eq,
    /// `=>`
    FatArrow,
    /// A floating-point literal.
    Float,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// An identifier.
    Ident,
    /// An integer literal.
    Int,
    /// A keyword.
    Keyword(Keyword),
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `-`
    Minus,
    /// `!=`
    Ne,
    /// An opening delimiter.
    Open(Delim),
    /// `+`
    Plus,
    /// `->`
    RArrow,
    /// `;`
    Semi,
    /// `/`
    Slash,
    /// `*`
    Star,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TokenKind::Close(Delim::Brace) => f.write_str("`}`"),
            TokenKind::Close(Delim::Bracket) => f.write_str("`]`"),
            TokenKind::Close(Delim::Paren) => f.write_str("`)`"),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::DotDot => f.write_str("`..`"),
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Eq => f.write_str("`=`"),
            TokenKind::FatArrow => f.write_str("`=>`"),
            TokenKind::Float => f.write_str("float"),
            TokenKind::Gt => f.write_str("`>`"),
            TokenKind::Gte => f.write_str("`>=`"),
            TokenKind::Ident => f.write_str("identifier"),
            TokenKind::Int => f.write_str("integer"),
            TokenKind::Keyword(keyword) => write!(f, "keyword `{keyword}`"),
            TokenKind::Lt => f.write_str("`<`"),
            TokenKind::Lte => f.write_str("`<=`"),
            TokenKind::Minus => f.write_str("`-`"),
            TokenKind::Ne => f.write_str("`!=`"),
            TokenKind::Open(Delim::Brace) => f.write_str("`{`"),
            TokenKind::Open(Delim::Bracket) => f.write_str("`[`"),
            TokenKind::Open(Delim::Paren) => f.write_str("`(`"),
            TokenKind::Plus => f.write_str("`+`"),
            TokenKind::RArrow => f.write_str("`->`"),
            TokenKind::Semi => f.write_str("`;`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::Star => f.write_str("`*`"),
        }
    }
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    len: u32,
    tokens: Peekable<raw::Lexer<'a>>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        let tokens = raw::Lexer::new(input);
        Self {
            input,
            len: input.len().try_into().expect("input should fit into u32"),
            tokens: tokens.peekable(),
        }
    }

    fn offset(&mut self) -> u32 {
        self.tokens.peek().map_or(self.len, |token| token.offset)
    }

    fn next_if_single(&mut self, single: Single) -> bool {
        self.tokens
            .next_if(|token| token.kind == raw::TokenKind::Single(single))
            .is_some()
    }

    fn cook(&mut self, token: &raw::Token) -> Result<Option<Token>, Error> {
        let lo = token.offset;
        let kind = match &token.kind {
            raw::TokenKind::Comment | raw::TokenKind::Whitespace => return Ok(None),
            raw::TokenKind::Ident => {
                let hi = self.offset();
                let name = &self.input[lo as usize..hi as usize];
                Ok(name
                    .parse()
                    .map_or(TokenKind::Ident, TokenKind::Keyword))
            }
            raw::TokenKind::Number(Number::Float) => Ok(TokenKind::Float),
            raw::TokenKind::Number(Number::Int) => Ok(TokenKind::Int),
            raw::TokenKind::Single(single) => self.single(*single),
            raw::TokenKind::Unknown => {
                let c = self.input[lo as usize..]
                    .chars()
                    .next()
                    .expect("token offset should be within input");
                Err(Error::Unknown(
                    c,
                    Span {
                        lo,
                        hi: lo + u32::try_from(c.len_utf8())
                            .expect("character length should fit into u32"),
                    },
                ))
            }
        }?;

        let hi = self.offset();
        Ok(Some(Token {
            kind,
            span: Span { lo, hi },
        }))
    }

    fn single(&mut self, single: Single) -> Result<TokenKind, Error> {
        match single {
            Single::Bang => {
                if self.next_if_single(Single::Eq) {
                    Ok(TokenKind::Ne)
                } else {
                    Err(self.incomplete('=', "!="))
                }
            }
            Single::Close(delim) => Ok(TokenKind::Close(delim)),
            Single::Colon => Ok(TokenKind::Colon),
            Single::Comma => Ok(TokenKind::Comma),
            Single::Dot => {
                if self.next_if_single(Single::Dot) {
                    Ok(TokenKind::DotDot)
                } else {
                    Ok(TokenKind::Dot)
                }
            }
            Single::Eq => {
                if self.next_if_single(Single::Gt) {
                    Ok(TokenKind::FatArrow)
                } else {
                    Ok(TokenKind::Eq)
                }
            }
            Single::Gt => {
                if self.next_if_single(Single::Eq) {
                    Ok(TokenKind::Gte)
                } else {
                    Ok(TokenKind::Gt)
                }
            }
            Single::Lt => {
                if self.next_if_single(Single::Eq) {
                    Ok(TokenKind::Lte)
                } else {
                    Ok(TokenKind::Lt)
                }
            }
            Single::Minus => {
                if self.next_if_single(Single::Gt) {
                    Ok(TokenKind::RArrow)
                } else {
                    Ok(TokenKind::Minus)
                }
            }
            Single::Open(delim) => Ok(TokenKind::Open(delim)),
            Single::Plus => Ok(TokenKind::Plus),
            Single::Semi => Ok(TokenKind::Semi),
            Single::Slash => Ok(TokenKind::Slash),
            Single::Star => Ok(TokenKind::Star),
        }
    }

    fn incomplete(&mut self, expected: char, token: &'static str) -> Error {
        let lo = self.offset();
        match self.tokens.peek() {
            Some(found) => Error::Incomplete(expected, token, found.kind, Span { lo, hi: lo }),
            None => Error::IncompleteEof(expected, token, Span { lo, hi: lo }),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let token = self.tokens.next()?;
            match self.cook(&token) {
                Ok(None) => {}
                Ok(Some(token)) => return Some(Ok(token)),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
