// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The desugarer rewrites surface conveniences into kernel forms, to a fixed point:
//!
//! - `must phi if c` becomes `must (c => phi)`, likewise for `should` and `nice`;
//! - `count(x in X where c)` becomes `sum(1 for x in X where c)`;
//! - `count(b for x in X where c)` counts the elements where `b` holds;
//! - `sum(t for x in X where c)` becomes `sum(if c then t else 0 for x in X)`, and a
//!   trailing `else e` supplies the alternative;
//! - `any(...)` becomes `exists ...` and `all(...)` becomes `forall ...`, folding
//!   `where`/`else` into the body.
//!
//! Every rewrite is a bi-implication under the backend's comparison tolerance, so
//! desugaring preserves semantics, and the output contains none of the rewritten
//! forms, so the pass is idempotent.


use qsolc_ast::ast::{
    AggExpr, AggOp, BinOp, CompRange, CompSpec, Constraint, DeclKind, Expr, ExprKind, ItemKind,
    Lit, NodeId, Program, Quant, QuantExpr,
};

/// Rewrites all sugar in the program. The returned flag reports whether anything
/// changed, which the tests use to establish idempotence.
pub fn desugar(program: &mut Program) -> bool {
    let mut changed_any = false;
    loop {
        let mut changed = false;
        for item in &mut *program.items {
            if let ItemKind::Problem(problem) = &mut *item.kind {
                for decl in &mut *problem.decls {
                    match &mut *decl.kind {
                        DeclKind::Constraint(constraint) => {
                            changed |= fold_guard(constraint);
                            changed |= desugar_expr(&mut constraint.expr);
                        }
                        DeclKind::Objective(objective) => {
                            changed |= desugar_expr(&mut objective.expr);
                        }
                        DeclKind::Param(param) => {
                            if let Some(default) = &mut param.default {
                                changed |= desugar_expr(default);
                            }
                        }
                        DeclKind::Set(_) | DeclKind::Find(_) => {}
                    }
                }
            }
        }
        if !changed {
            break;
        }
        changed_any = true;
    }
    changed_any
}

/// `must phi if c` becomes `must (c => phi)`.
fn fold_guard(constraint: &mut Constraint) -> bool {
    let Some(guard) = constraint.guard.take() else {
        return false;
    };
    let body = std::mem::take(&mut constraint.expr);
    constraint.expr = Expr {
        id: NodeId::default(),
        span: constraint.span,
        kind: Box::new(ExprKind::BinOp(
            BinOp::Implies,
            Box::new(guard),
            Box::new(body),
        )),
    };
    true
}

fn desugar_expr(expr: &mut Expr) -> bool {
    let mut changed = false;

    // Rewrite this node if it is an aggregate in a sugared form.
    let span = expr.span;
    let rewritten = if let ExprKind::Agg(agg) = &mut *expr.kind {
        rewrite_agg(span, agg)
    } else {
        None
    };
    if let Some(rewritten) = rewritten {
        *expr = rewritten;
        changed = true;
    }

    // Then recurse; the rewrite may have introduced new sugar below (a sum with a
    // condition), which the fixed-point loop in [`desugar`] picks up.
    match &mut *expr.kind {
        ExprKind::Lit(_) | ExprKind::Name(_) | ExprKind::Size(_) | ExprKind::Err => {}
        ExprKind::Index(_, args) => {
            for arg in &mut **args {
                changed |= desugar_expr(arg);
            }
        }
        ExprKind::Method(call) => {
            for arg in &mut *call.args {
                changed |= desugar_expr(arg);
            }
        }
        ExprKind::Call(_, args) => {
            for arg in &mut **args {
                match arg {
                    qsolc_ast::ast::CallArg::Expr(expr) => changed |= desugar_expr(expr),
                    qsolc_ast::ast::CallArg::Comp(comp) => {
                        changed |= desugar_expr(&mut comp.body);
                        if let Some(cond) = &mut comp.cond {
                            changed |= desugar_expr(cond);
                        }
                        if let Some(alt) = &mut comp.alt {
                            changed |= desugar_expr(alt);
                        }
                    }
                }
            }
        }
        ExprKind::UnOp(_, operand) => changed |= desugar_expr(operand),
        ExprKind::BinOp(_, lhs, rhs) => {
            changed |= desugar_expr(lhs);
            changed |= desugar_expr(rhs);
        }
        ExprKind::If(cond, then, alt) => {
            changed |= desugar_expr(cond);
            changed |= desugar_expr(then);
            changed |= desugar_expr(alt);
        }
        ExprKind::Quant(quant) => changed |= desugar_expr(&mut quant.body),
        ExprKind::Agg(agg) => {
            if let CompSpec::Range(range) = &mut agg.comp {
                if let Some(body) = &mut range.body {
                    changed |= desugar_expr(body);
                }
                if let Some(cond) = &mut range.cond {
                    changed |= desugar_expr(cond);
                }
                if let Some(alt) = &mut range.alt {
                    changed |= desugar_expr(alt);
                }
            }
        }
        ExprKind::Paren(inner) => changed |= desugar_expr(inner),
    }

    changed
}

/// Rewrites a sugared aggregate into its kernel form, or returns `None` if the
/// aggregate is already a plain `sum` without filters.
fn rewrite_agg(span: qsolc_data_structures::span::Span, agg: &mut AggExpr) -> Option<Expr> {
    let CompSpec::Range(range) = &mut agg.comp else {
        return None;
    };

    match agg.op {
        AggOp::Sum => {
            if range.cond.is_none() && range.alt.is_none() {
                return None;
            }
            // sum(t for x in X where c else e) => sum(if c then t else e for x in X)
            let body = range.body.take().expect("sum should have a body");
            let cond = range.cond.take().expect("filtered sum should have a condition");
            let alt = range
                .alt
                .take()
                .unwrap_or_else(|| num_lit(span, 0));
            let new_body = ite(span, cond, body, alt);
            Some(sum_expr(
                span,
                CompRange {
                    body: Some(new_body),
                    iter: range.iter.clone(),
                    set: range.set.clone(),
                    cond: None,
                    alt: None,
                },
            ))
        }
        AggOp::Count => {
            // count(x in X where c)      => sum(1 for x in X where c)
            // count(b for x in X where c) => sum(if b then 1 else 0 for x in X where c)
            let body = match range.body.take() {
                Some(body) if !is_iter_ref(&body, &range.iter) => ite(
                    span,
                    body,
                    num_lit(span, 1),
                    num_lit(span, 0),
                ),
                _ => num_lit(span, 1),
            };
            Some(sum_expr(
                span,
                CompRange {
                    body: Some(body),
                    iter: range.iter.clone(),
                    set: range.set.clone(),
                    cond: range.cond.take(),
                    alt: None,
                },
            ))
        }
        AggOp::Any | AggOp::All => {
            // any => exists, all => forall, folding where/else into the body.
            let body = match range.body.take() {
                Some(body) if !is_iter_ref(&body, &range.iter) => body,
                _ => bool_lit(span, true),
            };
            let body = match (range.cond.take(), range.alt.take()) {
                (None, _) => body,
                (Some(cond), Some(alt)) => ite(span, cond, body, alt),
                (Some(cond), None) => {
                    if agg.op == AggOp::Any {
                        bin(span, BinOp::And, cond, body)
                    } else {
                        bin(span, BinOp::Implies, cond, body)
                    }
                }
            };
            let quant = if agg.op == AggOp::Any {
                Quant::Exists
            } else {
                Quant::Forall
            };
            Some(Expr {
                id: NodeId::default(),
                span,
                kind: Box::new(ExprKind::Quant(Box::new(QuantExpr {
                    span,
                    quant,
                    iter: range.iter.clone(),
                    set: range.set.clone(),
                    body,
                }))),
            })
        }
    }
}

/// Whether the comprehension body is just the iterator itself, as in
/// `count(x for x in X)`, where the body carries no condition.
fn is_iter_ref(body: &Expr, iter: &qsolc_ast::ast::Ident) -> bool {
    matches!(&*body.kind, ExprKind::Name(name) if name.name == iter.name)
}

fn sum_expr(span: qsolc_data_structures::span::Span, range: CompRange) -> Expr {
    Expr {
        id: NodeId::default(),
        span,
        kind: Box::new(ExprKind::Agg(Box::new(AggExpr {
            span,
            op: AggOp::Sum,
            comp: CompSpec::Range(Box::new(range)),
        }))),
    }
}

fn ite(span: qsolc_data_structures::span::Span, cond: Expr, then: Expr, alt: Expr) -> Expr {
    Expr {
        id: NodeId::default(),
        span,
        kind: Box::new(ExprKind::If(
            Box::new(cond),
            Box::new(then),
            Box::new(alt),
        )),
    }
}

fn bin(span: qsolc_data_structures::span::Span, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        id: NodeId::default(),
        span,
        kind: Box::new(ExprKind::BinOp(op, Box::new(lhs), Box::new(rhs))),
    }
}

fn num_lit(span: qsolc_data_structures::span::Span, value: i64) -> Expr {
    Expr {
        id: NodeId::default(),
        span,
        kind: Box::new(ExprKind::Lit(Lit::Int(value))),
    }
}

fn bool_lit(span: qsolc_data_structures::span::Span, value: bool) -> Expr {
    Expr {
        id: NodeId::default(),
        span,
        kind: Box::new(ExprKind::Lit(Lit::Bool(value))),
    }
}
