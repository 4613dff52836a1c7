// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Expression parsing makes use of Pratt parsing (or "top-down operator-precedence
//! parsing") to handle relative precedence of operators.

#[cfg(test)]
mod tests;

use crate::{
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim::{ident, opt, seq, token},
    scan::Scanner,
    Error, ErrorKind, Result,
};
use qsolc_ast::ast::{
    AggExpr, AggOp, BinOp, CallArg, CompArg, CompRange, CompSpec, Expr, ExprKind, Ident, Lit,
    MethodCall, NodeId, Quant, QuantExpr, UnOp,
};

struct PrefixOp {
    kind: UnOp,
    precedence: u8,
}

struct MixfixOp {
    kind: OpKind,
    precedence: u8,
}

enum OpKind {
    Binary(BinOp, Assoc),
    Rich(fn(&mut Scanner, Box<Expr>) -> Result<Box<ExprKind>>),
}

#[derive(Clone, Copy)]
enum Assoc {
    Left,
    Right,
}

const IMPLIES_PRECEDENCE: u8 = 1;
const OR_PRECEDENCE: u8 = 2;
const AND_PRECEDENCE: u8 = 3;
const CMP_PRECEDENCE: u8 = 4;
const ADDITIVE_PRECEDENCE: u8 = 5;
const MULTIPLICATIVE_PRECEDENCE: u8 = 6;
const UNARY_PRECEDENCE: u8 = 7;
const POSTFIX_PRECEDENCE: u8 = 8;

pub(super) fn expr(s: &mut Scanner) -> Result<Box<Expr>> {
    expr_op(s, 0)
}

pub(super) fn expr_eof(s: &mut Scanner) -> Result<Box<Expr>> {
    let expr = expr(s)?;
    token(s, TokenKind::Eof)?;
    Ok(expr)
}

fn expr_op(s: &mut Scanner, min_precedence: u8) -> Result<Box<Expr>> {
    let lo = s.peek().span.lo;
    let mut lhs = if let Some(op) = prefix_op(s.peek().kind) {
        s.advance();
        let rhs = expr_op(s, op.precedence)?;
        Box::new(Expr {
            id: NodeId::default(),
            span: s.span(lo),
            kind: Box::new(ExprKind::UnOp(op.kind, rhs)),
        })
    } else {
        expr_base(s)?
    };

    while let Some(op) = mixfix_op(s.peek().kind) {
        if op.precedence < min_precedence {
            break;
        }

        s.advance();
        let kind = match op.kind {
            OpKind::Binary(kind, assoc) => {
                let precedence = next_precedence(op.precedence, assoc);
                let rhs = expr_op(s, precedence)?;
                Box::new(ExprKind::BinOp(kind, lhs, rhs))
            }
            OpKind::Rich(f) => f(s, lhs)?,
        };

        lhs = Box::new(Expr {
            id: NodeId::default(),
            span: s.span(lo),
            kind,
        });
    }

    Ok(lhs)
}

fn expr_base(s: &mut Scanner) -> Result<Box<Expr>> {
    let lo = s.peek().span.lo;
    let kind = if token(s, TokenKind::Open(Delim::Paren)).is_ok() {
        let inner = expr(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(Box::new(ExprKind::Paren(inner)))
    } else if token(s, TokenKind::Keyword(Keyword::If)).is_ok() {
        let cond = expr(s)?;
        token(s, TokenKind::Keyword(Keyword::Then))?;
        let then = expr(s)?;
        token(s, TokenKind::Keyword(Keyword::Else))?;
        let alt = expr(s)?;
        Ok(Box::new(ExprKind::If(cond, then, alt)))
    } else if token(s, TokenKind::Keyword(Keyword::Forall)).is_ok() {
        quant_rest(s, Quant::Forall, lo)
    } else if token(s, TokenKind::Keyword(Keyword::Exists)).is_ok() {
        quant_rest(s, Quant::Exists, lo)
    } else if token(s, TokenKind::Keyword(Keyword::Sum)).is_ok() {
        agg_rest(s, AggOp::Sum, lo)
    } else if token(s, TokenKind::Keyword(Keyword::Count)).is_ok() {
        agg_rest(s, AggOp::Count, lo)
    } else if token(s, TokenKind::Keyword(Keyword::Any)).is_ok() {
        agg_rest(s, AggOp::Any, lo)
    } else if token(s, TokenKind::Keyword(Keyword::All)).is_ok() {
        agg_rest(s, AggOp::All, lo)
    } else if token(s, TokenKind::Keyword(Keyword::Size)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let set = ident(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(Box::new(ExprKind::Size(set)))
    } else if let Some(lit) = lit(s)? {
        Ok(Box::new(ExprKind::Lit(lit)))
    } else if let Some(name) = opt(s, ident)? {
        Ok(Box::new(ExprKind::Name(name)))
    } else {
        Err(Error(ErrorKind::Rule(
            "expression",
            s.peek().kind,
            s.peek().span,
        )))
    }?;

    Ok(Box::new(Expr {
        id: NodeId::default(),
        span: s.span(lo),
        kind,
    }))
}

fn quant_rest(s: &mut Scanner, quant: Quant, lo: u32) -> Result<Box<ExprKind>> {
    let iter = ident(s)?;
    token(s, TokenKind::Keyword(Keyword::In))?;
    let set = ident(s)?;
    token(s, TokenKind::Colon)?;
    let body = expr(s)?;
    Ok(Box::new(ExprKind::Quant(Box::new(QuantExpr {
        span: s.span(lo),
        quant,
        iter,
        set,
        body: *body,
    }))))
}

/// Parses the parenthesized comprehension after an aggregate keyword. Three shapes are
/// accepted: the full `body for x in S` comprehension, the `x in S` shorthand for
/// `count`/`any`/`all` where the iterator is the body, and a bare name that splices a
/// `Comp(...)` macro formal.
fn agg_rest(s: &mut Scanner, op: AggOp, lo: u32) -> Result<Box<ExprKind>> {
    token(s, TokenKind::Open(Delim::Paren))?;
    let first = expr(s)?;

    if s.peek().kind == TokenKind::Close(Delim::Paren) {
        let name = name_of(&first).ok_or_else(|| {
            Error(ErrorKind::Token(
                TokenKind::Keyword(Keyword::For),
                s.peek().kind,
                s.peek().span,
            ))
        })?;
        s.advance();
        return Ok(Box::new(ExprKind::Agg(Box::new(AggExpr {
            span: s.span(lo),
            op,
            comp: CompSpec::Splice(name),
        }))));
    }

    let (body, iter, set) = if token(s, TokenKind::Keyword(Keyword::For)).is_ok() {
        let iter = ident(s)?;
        token(s, TokenKind::Keyword(Keyword::In))?;
        let set = ident(s)?;
        (Some(*first), iter, set)
    } else if op != AggOp::Sum && token(s, TokenKind::Keyword(Keyword::In)).is_ok() {
        let iter = name_of(&first).ok_or_else(|| {
            Error(ErrorKind::Rule(
                "comprehension iterator",
                s.peek().kind,
                first.span,
            ))
        })?;
        let set = ident(s)?;
        (None, iter, set)
    } else {
        return Err(Error(ErrorKind::Token(
            TokenKind::Keyword(Keyword::For),
            s.peek().kind,
            s.peek().span,
        )));
    };

    let cond = if token(s, TokenKind::Keyword(Keyword::Where)).is_ok() {
        Some(*expr(s)?)
    } else {
        None
    };
    let alt = if token(s, TokenKind::Keyword(Keyword::Else)).is_ok() {
        Some(*expr(s)?)
    } else {
        None
    };
    token(s, TokenKind::Close(Delim::Paren))?;

    Ok(Box::new(ExprKind::Agg(Box::new(AggExpr {
        span: s.span(lo),
        op,
        comp: CompSpec::Range(Box::new(CompRange {
            body,
            iter,
            set,
            cond,
            alt,
        })),
    }))))
}

fn name_of(expr: &Expr) -> Option<Ident> {
    match &*expr.kind {
        ExprKind::Name(name) => Some(name.clone()),
        _ => None,
    }
}

fn lit(s: &mut Scanner) -> Result<Option<Lit>> {
    let peek = s.peek();
    match peek.kind {
        TokenKind::Int => {
            let value = s
                .read()
                .parse()
                .map_err(|_| Error(ErrorKind::Lit("integer", peek.span)))?;
            s.advance();
            Ok(Some(Lit::Int(value)))
        }
        TokenKind::Float => {
            let value = s
                .read()
                .parse()
                .map_err(|_| Error(ErrorKind::Lit("float", peek.span)))?;
            s.advance();
            Ok(Some(Lit::Real(value)))
        }
        TokenKind::Keyword(Keyword::True) => {
            s.advance();
            Ok(Some(Lit::Bool(true)))
        }
        TokenKind::Keyword(Keyword::False) => {
            s.advance();
            Ok(Some(Lit::Bool(false)))
        }
        _ => Ok(None),
    }
}

fn prefix_op(kind: TokenKind) -> Option<PrefixOp> {
    match kind {
        TokenKind::Keyword(Keyword::Not) => Some(PrefixOp {
            kind: UnOp::Not,
            precedence: UNARY_PRECEDENCE,
        }),
        TokenKind::Minus => Some(PrefixOp {
            kind: UnOp::Neg,
            precedence: UNARY_PRECEDENCE,
        }),
        _ => None,
    }
}

fn mixfix_op(kind: TokenKind) -> Option<MixfixOp> {
    match kind {
        TokenKind::FatArrow => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Implies, Assoc::Right),
            precedence: IMPLIES_PRECEDENCE,
        }),
        TokenKind::Keyword(Keyword::Or) => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Or, Assoc::Left),
            precedence: OR_PRECEDENCE,
        }),
        TokenKind::Keyword(Keyword::And) => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::And, Assoc::Left),
            precedence: AND_PRECEDENCE,
        }),
        TokenKind::Eq => Some(cmp_op(BinOp::Eq)),
        TokenKind::Ne => Some(cmp_op(BinOp::Ne)),
        TokenKind::Lt => Some(cmp_op(BinOp::Lt)),
        TokenKind::Lte => Some(cmp_op(BinOp::Le)),
        TokenKind::Gt => Some(cmp_op(BinOp::Gt)),
        TokenKind::Gte => Some(cmp_op(BinOp::Ge)),
        TokenKind::Plus => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Add, Assoc::Left),
            precedence: ADDITIVE_PRECEDENCE,
        }),
        TokenKind::Minus => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Sub, Assoc::Left),
            precedence: ADDITIVE_PRECEDENCE,
        }),
        TokenKind::Star => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Mul, Assoc::Left),
            precedence: MULTIPLICATIVE_PRECEDENCE,
        }),
        TokenKind::Slash => Some(MixfixOp {
            kind: OpKind::Binary(BinOp::Div, Assoc::Left),
            precedence: MULTIPLICATIVE_PRECEDENCE,
        }),
        TokenKind::Dot => Some(MixfixOp {
            kind: OpKind::Rich(method_call),
            precedence: POSTFIX_PRECEDENCE,
        }),
        TokenKind::Open(Delim::Bracket) => Some(MixfixOp {
            kind: OpKind::Rich(index_read),
            precedence: POSTFIX_PRECEDENCE,
        }),
        TokenKind::Open(Delim::Paren) => Some(MixfixOp {
            kind: OpKind::Rich(macro_call),
            precedence: POSTFIX_PRECEDENCE,
        }),
        _ => None,
    }
}

fn cmp_op(kind: BinOp) -> MixfixOp {
    MixfixOp {
        kind: OpKind::Binary(kind, Assoc::Left),
        precedence: CMP_PRECEDENCE,
    }
}

fn next_precedence(precedence: u8, assoc: Assoc) -> u8 {
    match assoc {
        Assoc::Left => precedence + 1,
        Assoc::Right => precedence,
    }
}

/// `F.has(x)`, `F.is(a, b)`, or a view accessor `X.covers(a)`. The dot has already been
/// consumed.
fn method_call(s: &mut Scanner, lhs: Box<Expr>) -> Result<Box<ExprKind>> {
    let lo = lhs.span.lo;
    let target = target_name(s, &lhs, "method call")?;
    let name = ident(s)?;
    token(s, TokenKind::Open(Delim::Paren))?;
    let args = seq(s, |s| expr(s).map(|e| *e))?;
    token(s, TokenKind::Close(Delim::Paren))?;
    Ok(Box::new(ExprKind::Method(Box::new(MethodCall {
        span: s.span(lo),
        target,
        name,
        args: args.into_boxed_slice(),
    }))))
}

/// `Param[i, j]`. The opening bracket has already been consumed.
fn index_read(s: &mut Scanner, lhs: Box<Expr>) -> Result<Box<ExprKind>> {
    let target = target_name(s, &lhs, "indexed parameter")?;
    let args = seq(s, |s| expr(s).map(|e| *e))?;
    token(s, TokenKind::Close(Delim::Bracket))?;
    Ok(Box::new(ExprKind::Index(
        target,
        args.into_boxed_slice(),
    )))
}

/// A macro call `name(args)` where arguments may be comprehension-shaped. The opening
/// paren has already been consumed.
fn macro_call(s: &mut Scanner, lhs: Box<Expr>) -> Result<Box<ExprKind>> {
    let target = target_name(s, &lhs, "macro call")?;
    let mut args = Vec::new();
    if s.peek().kind != TokenKind::Close(Delim::Paren) {
        loop {
            args.push(call_arg(s)?);
            if token(s, TokenKind::Comma).is_err() {
                break;
            }
        }
    }
    token(s, TokenKind::Close(Delim::Paren))?;
    Ok(Box::new(ExprKind::Call(
        target,
        args.into_boxed_slice(),
    )))
}

fn call_arg(s: &mut Scanner) -> Result<CallArg> {
    let lo = s.peek().span.lo;
    let first = expr(s)?;
    if token(s, TokenKind::Keyword(Keyword::For)).is_err() {
        return Ok(CallArg::Expr(*first));
    }

    let iter = ident(s)?;
    token(s, TokenKind::Keyword(Keyword::In))?;
    let set = ident(s)?;
    let cond = if token(s, TokenKind::Keyword(Keyword::Where)).is_ok() {
        Some(*expr(s)?)
    } else {
        None
    };
    let alt = if token(s, TokenKind::Keyword(Keyword::Else)).is_ok() {
        Some(*expr(s)?)
    } else {
        None
    };
    Ok(CallArg::Comp(Box::new(CompArg {
        span: s.span(lo),
        body: *first,
        iter,
        set,
        cond,
        alt,
    })))
}

fn target_name(s: &Scanner, lhs: &Expr, rule: &'static str) -> Result<Ident> {
    match &*lhs.kind {
        ExprKind::Name(name) => Ok(name.clone()),
        _ => Err(Error(ErrorKind::Rule(rule, s.peek().kind, lhs.span))),
    }
}
