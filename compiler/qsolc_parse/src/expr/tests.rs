// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::expr;
use crate::tests::{check, parse_errors, parse_ok};
use expect_test::expect;
use qsolc_ast::ast::{AggOp, BinOp, CompSpec, ExprKind, Quant, UnOp};

#[test]
fn int_literal() {
    check(
        expr,
        "42",
        &expect![[r#"Expr _id_ [0-2]: Lit: Int(42)"#]],
    );
}

#[test]
fn real_literal() {
    check(
        expr,
        "2.5",
        &expect![[r#"Expr _id_ [0-3]: Lit: Real(2.5)"#]],
    );
}

#[test]
fn bool_literals() {
    check(expr, "true", &expect![[r#"Expr _id_ [0-4]: Lit: Bool(true)"#]]);
}

#[test]
fn add_is_left_associative() {
    let e = parse_ok(expr, "1 + 2 + 3");
    let ExprKind::BinOp(BinOp::Add, lhs, _) = &*e.kind else {
        panic!("expected top-level add");
    };
    assert!(matches!(&*lhs.kind, ExprKind::BinOp(BinOp::Add, _, _)));
}

#[test]
fn mul_binds_tighter_than_add() {
    let e = parse_ok(expr, "1 + 2 * 3");
    let ExprKind::BinOp(BinOp::Add, _, rhs) = &*e.kind else {
        panic!("expected top-level add");
    };
    assert!(matches!(&*rhs.kind, ExprKind::BinOp(BinOp::Mul, _, _)));
}

#[test]
fn implies_is_right_associative() {
    let e = parse_ok(expr, "a => b => c");
    let ExprKind::BinOp(BinOp::Implies, _, rhs) = &*e.kind else {
        panic!("expected top-level implies");
    };
    assert!(matches!(&*rhs.kind, ExprKind::BinOp(BinOp::Implies, _, _)));
}

#[test]
fn comparison_binds_tighter_than_and() {
    let e = parse_ok(expr, "x = 1 and y = 2");
    let ExprKind::BinOp(BinOp::And, lhs, rhs) = &*e.kind else {
        panic!("expected top-level and");
    };
    assert!(matches!(&*lhs.kind, ExprKind::BinOp(BinOp::Eq, _, _)));
    assert!(matches!(&*rhs.kind, ExprKind::BinOp(BinOp::Eq, _, _)));
}

#[test]
fn not_binds_tighter_than_and() {
    let e = parse_ok(expr, "not a and b");
    let ExprKind::BinOp(BinOp::And, lhs, _) = &*e.kind else {
        panic!("expected top-level and");
    };
    assert!(matches!(&*lhs.kind, ExprKind::UnOp(UnOp::Not, _)));
}

#[test]
fn unary_minus() {
    let e = parse_ok(expr, "-x + y");
    let ExprKind::BinOp(BinOp::Add, lhs, _) = &*e.kind else {
        panic!("expected top-level add");
    };
    assert!(matches!(&*lhs.kind, ExprKind::UnOp(UnOp::Neg, _)));
}

#[test]
fn method_call_has() {
    check(
        expr,
        "Pick.has(i)",
        &expect![[r#"
            Expr _id_ [0-11]: Method Pick.has:
                Expr _id_ [9-10]: Name: Ident _id_ [9-10] "i""#]],
    );
}

#[test]
fn method_call_is_two_args() {
    let e = parse_ok(expr, "ColorOf.is(v, c)");
    let ExprKind::Method(call) = &*e.kind else {
        panic!("expected method call");
    };
    assert_eq!(call.target.name.as_ref(), "ColorOf");
    assert_eq!(call.name.name.as_ref(), "is");
    assert_eq!(call.args.len(), 2);
}

#[test]
fn indexed_param() {
    let e = parse_ok(expr, "Cost[i, j]");
    let ExprKind::Index(name, args) = &*e.kind else {
        panic!("expected indexed read");
    };
    assert_eq!(name.name.as_ref(), "Cost");
    assert_eq!(args.len(), 2);
}

#[test]
fn size_of_set() {
    check(
        expr,
        "size(V)",
        &expect![[r#"Expr _id_ [0-7]: Size: V"#]],
    );
}

#[test]
fn forall_body_extends_right() {
    let e = parse_ok(expr, "forall x in S: a and b");
    let ExprKind::Quant(quant) = &*e.kind else {
        panic!("expected quantifier");
    };
    assert_eq!(quant.quant, Quant::Forall);
    assert_eq!(quant.iter.name.as_ref(), "x");
    assert_eq!(quant.set.name.as_ref(), "S");
    assert!(matches!(&*quant.body.kind, ExprKind::BinOp(BinOp::And, _, _)));
}

#[test]
fn exists_quantifier() {
    let e = parse_ok(expr, "exists x in S: Pick.has(x)");
    let ExprKind::Quant(quant) = &*e.kind else {
        panic!("expected quantifier");
    };
    assert_eq!(quant.quant, Quant::Exists);
}

#[test]
fn sum_comprehension() {
    let e = parse_ok(expr, "sum(Weight[i] for i in Items where Pick.has(i))");
    let ExprKind::Agg(agg) = &*e.kind else {
        panic!("expected aggregate");
    };
    assert_eq!(agg.op, AggOp::Sum);
    let CompSpec::Range(range) = &agg.comp else {
        panic!("expected explicit comprehension");
    };
    assert!(range.body.is_some());
    assert!(range.cond.is_some());
    assert!(range.alt.is_none());
}

#[test]
fn sum_with_else() {
    let e = parse_ok(expr, "sum(1 for i in Items where Pick.has(i) else 0)");
    let ExprKind::Agg(agg) = &*e.kind else {
        panic!("expected aggregate");
    };
    let CompSpec::Range(range) = &agg.comp else {
        panic!("expected explicit comprehension");
    };
    assert!(range.cond.is_some());
    assert!(range.alt.is_some());
}

#[test]
fn count_shorthand() {
    let e = parse_ok(expr, "count(v in V where Side.has(v))");
    let ExprKind::Agg(agg) = &*e.kind else {
        panic!("expected aggregate");
    };
    assert_eq!(agg.op, AggOp::Count);
    let CompSpec::Range(range) = &agg.comp else {
        panic!("expected explicit comprehension");
    };
    assert!(range.body.is_none());
    assert_eq!(range.iter.name.as_ref(), "v");
    assert_eq!(range.set.name.as_ref(), "V");
}

#[test]
fn count_full_form() {
    let e = parse_ok(expr, "count(x for x in X where c)");
    let ExprKind::Agg(agg) = &*e.kind else {
        panic!("expected aggregate");
    };
    assert!(matches!(&agg.comp, CompSpec::Range(range) if range.body.is_some()));
}

#[test]
fn splice_aggregate() {
    let e = parse_ok(expr, "count(items)");
    let ExprKind::Agg(agg) = &*e.kind else {
        panic!("expected aggregate");
    };
    assert!(matches!(&agg.comp, CompSpec::Splice(name) if name.name.as_ref() == "items"));
}

#[test]
fn sum_requires_for() {
    parse_errors(expr, "sum(x in X)");
}

#[test]
fn if_then_else() {
    let e = parse_ok(expr, "if Pick.has(i) then 1 else 0");
    assert!(matches!(&*e.kind, ExprKind::If(_, _, _)));
}

#[test]
fn macro_call_with_comprehension_arg() {
    let e = parse_ok(expr, "exactly(2, Pick.has(i) for i in Items)");
    let ExprKind::Call(name, args) = &*e.kind else {
        panic!("expected macro call");
    };
    assert_eq!(name.name.as_ref(), "exactly");
    assert_eq!(args.len(), 2);
    assert!(matches!(args[0], qsolc_ast::ast::CallArg::Expr(_)));
    assert!(matches!(args[1], qsolc_ast::ast::CallArg::Comp(_)));
}

#[test]
fn comprehension_arg_keeps_filter() {
    let e = parse_ok(expr, "atmost(1, x.has(i) for i in I where P[i] > 0)");
    let ExprKind::Call(_, args) = &*e.kind else {
        panic!("expected macro call");
    };
    let qsolc_ast::ast::CallArg::Comp(comp) = &args[1] else {
        panic!("expected comprehension argument");
    };
    assert!(comp.cond.is_some());
    assert!(comp.alt.is_none());
}

#[test]
fn parenthesized_expression() {
    let e = parse_ok(expr, "(a or b) and c");
    let ExprKind::BinOp(BinOp::And, lhs, _) = &*e.kind else {
        panic!("expected top-level and");
    };
    assert!(matches!(&*lhs.kind, ExprKind::Paren(_)));
}

#[test]
fn ne_comparison() {
    let e = parse_ok(expr, "S.has(u) != S.has(w)");
    assert!(matches!(&*e.kind, ExprKind::BinOp(BinOp::Ne, _, _)));
}

#[test]
fn division() {
    let e = parse_ok(expr, "a / 2");
    assert!(matches!(&*e.kind, ExprKind::BinOp(BinOp::Div, _, _)));
}

#[test]
fn missing_operand_is_error() {
    parse_errors(expr, "1 +");
}

#[test]
fn lone_operator_is_error() {
    parse_errors(expr, "*");
}

#[test]
fn literal_too_large_is_error() {
    parse_errors(expr, "99999999999999999999999999");
}
