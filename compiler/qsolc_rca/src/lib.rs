// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Required-capability analysis: a single deterministic walk over the Ground IR that
//! computes the set of versioned capability identifiers the model needs from its
//! backend. The analysis is pure, so it is idempotent and depends only on the Ground
//! IR it is given; the targeting layer cross-checks the result against each backend's
//! declared catalog.


use qsolc_gir::gir::{
    CmpOp, Expr, ExprKind, GroundFindKind, GroundProblem, WeightKind,
};
use std::collections::BTreeSet;

/// Capability: a subset decision structure.
pub const UNKNOWN_SUBSET: &str = "unknown.subset.v1";
/// Capability: a mapping decision structure with its one-hot law.
pub const UNKNOWN_MAPPING: &str = "unknown.mapping.v1";
/// Capability: equality constraints.
pub const COMPARE_EQ: &str = "constraint.compare.eq.v1";
/// Capability: less-or-equal (and strict less) constraints.
pub const COMPARE_LE: &str = "constraint.compare.le.v1";
/// Capability: boolean connective encoding.
pub const LOGIC: &str = "constraint.logic.v1";
/// Capability: a summation objective.
pub const OBJECTIVE_SUM: &str = "objective.sum.v1";
/// Capability: weighted soft constraints folded into the objective.
pub const OBJECTIVE_SOFT: &str = "objective.softweight.v1";

/// Computes the capabilities the ground problem requires.
#[must_use]
pub fn required_capabilities(ground: &GroundProblem) -> BTreeSet<String> {
    let mut caps = BTreeSet::new();

    for find in &ground.finds {
        match &find.kind {
            GroundFindKind::Subset { .. } => {
                caps.insert(UNKNOWN_SUBSET.to_string());
            }
            GroundFindKind::Mapping { .. } => {
                caps.insert(UNKNOWN_MAPPING.to_string());
            }
        }
    }

    for constraint in &ground.constraints {
        if matches!(constraint.weight, WeightKind::Should | WeightKind::Nice) {
            caps.insert(OBJECTIVE_SOFT.to_string());
        }
        scan_expr(&constraint.expr, &mut caps);
    }

    if let Some(objective) = &ground.objective {
        caps.insert(OBJECTIVE_SUM.to_string());
        scan_expr(objective, &mut caps);
    }

    caps
}

fn scan_expr(expr: &Expr, caps: &mut BTreeSet<String>) {
    match &expr.kind {
        ExprKind::Const(_) | ExprKind::Bool(_) | ExprKind::Var(_) => {}
        ExprKind::Neg(operand) => scan_expr(operand, caps),
        ExprKind::Not(operand) => {
            caps.insert(LOGIC.to_string());
            scan_expr(operand, caps);
        }
        ExprKind::Add(lhs, rhs)
        | ExprKind::Sub(lhs, rhs)
        | ExprKind::Mul(lhs, rhs)
        | ExprKind::Div(lhs, rhs) => {
            scan_expr(lhs, caps);
            scan_expr(rhs, caps);
        }
        ExprKind::And(lhs, rhs) | ExprKind::Or(lhs, rhs) | ExprKind::Implies(lhs, rhs) => {
            caps.insert(LOGIC.to_string());
            scan_expr(lhs, caps);
            scan_expr(rhs, caps);
        }
        ExprKind::Cmp(op, lhs, rhs) => {
            caps.insert(
                match op {
                    CmpOp::Eq => COMPARE_EQ,
                    CmpOp::Le | CmpOp::Lt => COMPARE_LE,
                }
                .to_string(),
            );
            scan_expr(lhs, caps);
            scan_expr(rhs, caps);
        }
        ExprKind::Ite(cond, then, alt) => {
            scan_expr(cond, caps);
            scan_expr(then, caps);
            scan_expr(alt, caps);
        }
    }
}
