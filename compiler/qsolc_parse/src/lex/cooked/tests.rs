// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{Error, Lexer, Token, TokenKind};
use crate::{keyword::Keyword, lex::Delim};
use qsolc_data_structures::span::Span;

fn lex(input: &str) -> (Vec<Token>, Vec<Error>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for result in Lexer::new(input) {
        match result {
            Ok(token) => tokens.push(token),
            Err(error) => errors.push(error),
        }
    }
    (tokens, errors)
}

fn kinds(input: &str) -> Vec<TokenKind> {
    let (tokens, errors) = lex(input);
    assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
    tokens.into_iter().map(|token| token.kind).collect()
}

#[test]
fn keyword_is_cooked() {
    assert_eq!(kinds("must"), vec![TokenKind::Keyword(Keyword::Must)]);
}

#[test]
fn ident_is_not_keyword() {
    assert_eq!(kinds("musty"), vec![TokenKind::Ident]);
}

#[test]
fn compound_comparisons() {
    assert_eq!(
        kinds("<= >= != = < >"),
        vec![
            TokenKind::Lte,
            TokenKind::Gte,
            TokenKind::Ne,
            TokenKind::Eq,
            TokenKind::Lt,
            TokenKind::Gt,
        ]
    );
}

#[test]
fn fat_arrow_and_rarrow() {
    assert_eq!(kinds("=> ->"), vec![TokenKind::FatArrow, TokenKind::RArrow]);
}

#[test]
fn dot_dot() {
    assert_eq!(
        kinds("0..5"),
        vec![TokenKind::Int, TokenKind::DotDot, TokenKind::Int]
    );
}

#[test]
fn whitespace_and_comments_are_dropped() {
    assert_eq!(
        kinds("x // comment\n + /* mid */ y"),
        vec![TokenKind::Ident, TokenKind::Plus, TokenKind::Ident]
    );
}

#[test]
fn spans_skip_trivia() {
    let (tokens, _) = lex("a  b");
    assert_eq!(tokens[0].span, Span { lo: 0, hi: 1 });
    assert_eq!(tokens[1].span, Span { lo: 3, hi: 4 });
}

#[test]
fn bang_without_eq_is_error() {
    let (_, errors) = lex("! x");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::Incomplete('=', "!=", _, _)));
}

#[test]
fn bang_at_eof_is_error() {
    let (_, errors) = lex("!");
    assert!(matches!(errors[0], Error::IncompleteEof('=', "!=", _)));
}

#[test]
fn unknown_char_is_error() {
    let (_, errors) = lex("#");
    assert!(matches!(errors[0], Error::Unknown('#', _)));
}

#[test]
fn delimiters() {
    assert_eq!(
        kinds("()[]{}"),
        vec![
            TokenKind::Open(Delim::Paren),
            TokenKind::Close(Delim::Paren),
            TokenKind::Open(Delim::Bracket),
            TokenKind::Close(Delim::Bracket),
            TokenKind::Open(Delim::Brace),
            TokenKind::Close(Delim::Brace),
        ]
    );
}
