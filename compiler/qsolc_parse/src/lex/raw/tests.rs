// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{Lexer, Number, Single, Token, TokenKind};
use crate::lex::Delim;

fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input).into_iter().map(|token| token.kind).collect()
}

#[test]
fn empty_is_empty() {
    assert!(lex("").is_empty());
}

#[test]
fn idents_and_whitespace() {
    assert_eq!(
        kinds("set Items"),
        vec![TokenKind::Ident, TokenKind::Whitespace, TokenKind::Ident]
    );
}

#[test]
fn keywords_are_idents_at_this_stage() {
    assert_eq!(kinds("must"), vec![TokenKind::Ident]);
}

#[test]
fn int_literal() {
    assert_eq!(kinds("42"), vec![TokenKind::Number(Number::Int)]);
}

#[test]
fn float_literal() {
    assert_eq!(kinds("4.25"), vec![TokenKind::Number(Number::Float)]);
}

#[test]
fn float_with_exponent() {
    assert_eq!(kinds("1e-6"), vec![TokenKind::Number(Number::Float)]);
}

#[test]
fn int_followed_by_range_dots() {
    assert_eq!(
        kinds("0..5"),
        vec![
            TokenKind::Number(Number::Int),
            TokenKind::Single(Single::Dot),
            TokenKind::Single(Single::Dot),
            TokenKind::Number(Number::Int),
        ]
    );
}

#[test]
fn line_comment_runs_to_newline() {
    assert_eq!(
        kinds("// note\nx"),
        vec![TokenKind::Comment, TokenKind::Whitespace, TokenKind::Ident]
    );
}

#[test]
fn block_comment() {
    assert_eq!(
        kinds("/* a * b */x"),
        vec![TokenKind::Comment, TokenKind::Ident]
    );
}

#[test]
fn unterminated_block_comment_swallows_rest() {
    assert_eq!(kinds("/* open x"), vec![TokenKind::Comment]);
}

#[test]
fn singles() {
    assert_eq!(
        kinds("(){}[];"),
        vec![
            TokenKind::Single(Single::Open(Delim::Paren)),
            TokenKind::Single(Single::Close(Delim::Paren)),
            TokenKind::Single(Single::Open(Delim::Brace)),
            TokenKind::Single(Single::Close(Delim::Brace)),
            TokenKind::Single(Single::Open(Delim::Bracket)),
            TokenKind::Single(Single::Close(Delim::Bracket)),
            TokenKind::Single(Single::Semi),
        ]
    );
}

#[test]
fn unknown_char() {
    assert_eq!(kinds("#"), vec![TokenKind::Unknown]);
}

#[test]
fn offsets_are_contiguous() {
    let tokens = lex("ab + 1");
    let offsets: Vec<u32> = tokens.iter().map(|token| token.offset).collect();
    assert_eq!(offsets, vec![0, 2, 3, 4, 5]);
}
