// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The emitter walks Ground IR and produces the compiled model:
//!
//! - every hard constraint becomes one or more labeled CQM constraints, with top-level
//!   conjunctions split and boolean structure reduced through the standard QUBO gadgets
//!   (`z <= x`, `z <= y`, `z >= x + y - 1` for AND, the dual for OR, and `1 - x` for
//!   NOT);
//! - every `Mapping` find contributes its structural one-hot rows;
//! - soft constraints contribute weighted squared-violation penalties to the objective
//!   (10.0 for `should`, 1.0 for `nice`) using the same encoding as hard constraints;
//! - the BQM is derived by adding every CQM constraint's quadratic penalty, scaled by a
//!   weight that dominates the objective's total variation.
//!
//! Strict comparisons use the fixed tolerance: `a < b` is encoded as `a - b <= -eps`.

#[cfg(test)]
mod tests;

use crate::{poly::Poly, Error};
use qsolc_data_structures::span::Span;
use qsolc_gir::gir::{
    CmpOp, Expr, ExprKind, GroundFindKind, GroundProblem, VarId, VarKind, VarTable, WeightKind,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub use qsolc_gir::gir::EPSILON;

/// The objective weight of a violated `should` constraint.
pub const SHOULD_WEIGHT: f64 = 10.0;
/// The objective weight of a violated `nice` constraint.
pub const NICE_WEIGHT: f64 = 1.0;

/// A constraint sense.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

/// A labeled CQM constraint: `poly sense rhs`.
#[derive(Clone, Debug)]
pub struct CqmConstraint {
    /// The stable label, `c0, c1, ...` for user constraints, `onehot:...` for
    /// structural rows, `aux:...` for gadget definitions.
    pub label: String,
    /// The left-hand polynomial; its constant part has been folded into `rhs`.
    pub poly: Poly,
    /// The constraint sense.
    pub sense: Sense,
    /// The right-hand constant.
    pub rhs: f64,
    /// The source span of the originating constraint.
    pub span: Span,
    /// Whether the row is structural (one-hot or gadget) rather than user-written.
    pub structural: bool,
}

impl CqmConstraint {
    /// Whether a sample satisfies this constraint under the tolerance policy.
    #[must_use]
    pub fn satisfied(&self, sample: impl Fn(VarId) -> bool) -> bool {
        let value = self.poly.evaluate(sample);
        match self.sense {
            Sense::Eq => (value - self.rhs).abs() <= EPSILON,
            Sense::Le => value <= self.rhs + EPSILON,
            Sense::Ge => value >= self.rhs - EPSILON,
        }
    }
}

/// Model size statistics.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModelStats {
    /// All binaries, including auxiliaries and slacks.
    pub num_variables: usize,
    /// CQM constraints, structural rows included.
    pub num_constraints: usize,
    /// Distinct quadratic pairs in the BQM.
    pub num_interactions: usize,
}

/// The compiled model: CQM, derived BQM, and the varmap for decoding.
#[derive(Clone, Debug)]
pub struct CompiledModel {
    /// The model kind; always `"cqm"`.
    pub kind: &'static str,
    /// The labeled CQM constraints, in emission order.
    pub cqm: Vec<CqmConstraint>,
    /// The CQM objective, soft penalties included.
    pub objective: Poly,
    /// The derived unconstrained quadratic model.
    pub bqm: Poly,
    /// The penalty weight used for the CQM to BQM conversion.
    pub penalty_weight: f64,
    /// The full variable universe, auxiliaries and slacks included.
    pub vars: VarTable,
    /// Primary binary label to QSOL-level meaning; aux and slack binaries excluded.
    pub varmap: BTreeMap<String, String>,
    /// Size statistics.
    pub stats: ModelStats,
}

impl CompiledModel {
    /// Whether a sample satisfies every CQM constraint, structural rows included.
    #[must_use]
    pub fn is_feasible(&self, sample: &impl Fn(VarId) -> bool) -> bool {
        self.cqm.iter().all(|constraint| constraint.satisfied(sample))
    }
}

/// Emits the compiled model for a ground problem.
///
/// # Errors
/// Returns every shape the quadratic backend cannot encode (`QSOL3001`); no model is
/// produced in that case.
pub fn emit(ground: &GroundProblem) -> Result<CompiledModel, Vec<Error>> {
    let mut emitter = Emitter {
        vars: ground.vars.clone(),
        cqm: Vec::new(),
        aux_count: 0,
        errors: Vec::new(),
    };

    emitter.one_hot_rows(ground);

    let mut soft_penalty = Poly::zero();
    let mut user_index = 0;
    for constraint in &ground.constraints {
        match constraint.weight {
            WeightKind::Hard => {
                let label = format!("c{user_index}");
                user_index += 1;
                emitter.assert_root(&constraint.expr, &label, constraint.span);
            }
            WeightKind::Should | WeightKind::Nice => {
                let weight = match constraint.weight {
                    WeightKind::Should => SHOULD_WEIGHT,
                    _ => NICE_WEIGHT,
                };
                let label = format!("soft{user_index}");
                user_index += 1;
                if let Some(penalty) =
                    emitter.soft_penalty(&constraint.expr, &label, constraint.span)
                {
                    soft_penalty.add_assign(&penalty.scale(weight));
                }
            }
        }
    }

    let mut objective = match &ground.objective {
        Some(expr) => match emitter.numeric(expr) {
            Ok(poly) => poly,
            Err(error) => {
                emitter.errors.push(error);
                Poly::zero()
            }
        },
        None => Poly::zero(),
    };
    objective.add_assign(&soft_penalty);

    if !emitter.errors.is_empty() {
        return Err(emitter.errors);
    }

    // The penalty weight must dominate any objective swing so that violating a single
    // constraint is never worth it.
    let coef_sum: f64 = emitter.cqm.iter().map(|c| c.poly.abs_sum() + c.rhs.abs()).sum();
    let penalty_weight = 10.0 * (objective.abs_sum() + coef_sum + 1.0);

    let mut bqm = objective.clone();
    let constraints = emitter.cqm.clone();
    for constraint in &constraints {
        match emitter.penalty(constraint) {
            Ok(penalty) => bqm.add_assign(&penalty.scale(penalty_weight)),
            Err(error) => emitter.errors.push(error),
        }
    }

    if !emitter.errors.is_empty() {
        return Err(emitter.errors);
    }

    let varmap = emitter
        .vars
        .iter()
        .filter(|(_, decl)| decl.kind == VarKind::Primary)
        .map(|(_, decl)| (decl.label.to_string(), decl.meaning.to_string()))
        .collect();

    let stats = ModelStats {
        num_variables: emitter.vars.len(),
        num_constraints: emitter.cqm.len(),
        num_interactions: bqm.quadratic.len(),
    };

    log::debug!(
        "emitted model for `{}`: {} variables, {} constraints, {} interactions",
        ground.name,
        stats.num_variables,
        stats.num_constraints,
        stats.num_interactions
    );

    Ok(CompiledModel {
        kind: "cqm",
        cqm: emitter.cqm,
        objective,
        bqm,
        penalty_weight,
        vars: emitter.vars,
        varmap,
        stats,
    })
}

struct Emitter {
    vars: VarTable,
    cqm: Vec<CqmConstraint>,
    aux_count: usize,
    errors: Vec<Error>,
}

impl Emitter {
    /// Emits the structural one-hot rows: every Mapping find assigns each domain
    /// element to exactly one codomain element.
    fn one_hot_rows(&mut self, ground: &GroundProblem) {
        for find in &ground.finds {
            let GroundFindKind::Mapping { domain, vars, .. } = &find.kind else {
                continue;
            };
            for (row, elem) in domain.iter().enumerate() {
                let mut poly = Poly::zero();
                for &var in &vars[row] {
                    poly.add_assign(&Poly::var(var));
                }
                self.cqm.push(CqmConstraint {
                    label: format!("onehot:{}[{elem}]", find.name),
                    poly,
                    sense: Sense::Eq,
                    rhs: 1.0,
                    span: Span::default(),
                    structural: true,
                });
            }
        }
    }

    /// Asserts a hard constraint, splitting top-level conjunctions into separate rows.
    fn assert_root(&mut self, expr: &Expr, label: &str, span: Span) {
        let mut parts = Vec::new();
        split_conjuncts(expr, &mut parts);
        if parts.len() == 1 {
            self.assert_one(parts[0], label.to_string(), span);
        } else {
            for (index, part) in parts.iter().enumerate() {
                self.assert_one(part, format!("{label}.{index}"), span);
            }
        }
    }

    fn assert_one(&mut self, expr: &Expr, label: String, span: Span) {
        match &expr.kind {
            ExprKind::Bool(true) => {}
            ExprKind::Bool(false) => {
                // The scenario made this constraint unsatisfiable; assert an explicit
                // contradiction so the model is reported infeasible rather than
                // silently relaxed.
                self.cqm.push(CqmConstraint {
                    label,
                    poly: Poly::zero(),
                    sense: Sense::Eq,
                    rhs: 1.0,
                    span,
                    structural: false,
                });
            }
            ExprKind::Var(id) => self.cqm.push(CqmConstraint {
                label,
                poly: Poly::var(*id),
                sense: Sense::Eq,
                rhs: 1.0,
                span,
                structural: false,
            }),
            ExprKind::Not(inner) => {
                if let Ok(poly) = self.booleanize(inner).map_err(|e| self.errors.push(e)) {
                    self.push_normalized(label, poly, Sense::Eq, 0.0, span, false);
                }
            }
            ExprKind::Cmp(op, lhs, rhs) => {
                let lhs = self.numeric(lhs);
                let rhs = self.numeric(rhs);
                let (Ok(lhs), Ok(rhs)) = (lhs, rhs) else {
                    return;
                };
                let diff = lhs.sub(&rhs);
                let (sense, shift) = match op {
                    CmpOp::Eq => (Sense::Eq, 0.0),
                    CmpOp::Le => (Sense::Le, 0.0),
                    // Strict: a < b encodes as a - b <= -eps.
                    CmpOp::Lt => (Sense::Le, -EPSILON),
                };
                self.push_normalized(label, diff, sense, shift, span, false);
            }
            _ => {
                // Disjunctions, implications, conditionals: reduce to a 0/1 polynomial
                // and require it to be 1.
                match self.booleanize(expr) {
                    Ok(poly) => self.push_normalized(label, poly, Sense::Eq, 1.0, span, false),
                    Err(error) => self.errors.push(error),
                }
            }
        }
    }

    /// Pushes `poly sense (rhs - poly.offset)`, moving the constant part of the
    /// polynomial to the right-hand side.
    fn push_normalized(
        &mut self,
        label: String,
        mut poly: Poly,
        sense: Sense,
        rhs: f64,
        span: Span,
        structural: bool,
    ) {
        let offset = poly.offset;
        poly.offset = 0.0;
        self.cqm.push(CqmConstraint {
            label,
            poly,
            sense,
            rhs: rhs - offset,
            span,
            structural,
        });
    }

    /// Builds the squared-violation penalty of a soft constraint using the hard
    /// encoding, without asserting it. Gadget rows created along the way stay asserted,
    /// since they define the auxiliaries.
    fn soft_penalty(&mut self, expr: &Expr, label: &str, span: Span) -> Option<Poly> {
        let before = self.cqm.len();
        self.assert_root(expr, label, span);
        // Remove the just-asserted user rows (gadget rows are interleaved; keep them).
        let mut scratch = Vec::new();
        let mut index = before;
        while index < self.cqm.len() {
            if self.cqm[index].structural {
                index += 1;
            } else {
                scratch.push(self.cqm.remove(index));
            }
        }

        let mut total = Poly::zero();
        for constraint in &scratch {
            match self.penalty(constraint) {
                Ok(penalty) => total.add_assign(&penalty),
                Err(error) => {
                    self.errors.push(error);
                    return None;
                }
            }
        }
        Some(total)
    }

    /// The quadratic penalty of one constraint: the squared residual, with binary
    /// slack variables absorbing the feasible range of inequalities.
    fn penalty(&mut self, constraint: &CqmConstraint) -> Result<Poly, Error> {
        let residual = match constraint.sense {
            Sense::Eq => constraint.poly.clone().sub(&Poly::constant(constraint.rhs)),
            Sense::Le => {
                let slack = self.slack_poly(constraint, constraint.rhs - constraint.poly.lower_bound());
                constraint
                    .poly
                    .clone()
                    .add(&slack)
                    .sub(&Poly::constant(constraint.rhs))
            }
            Sense::Ge => {
                // a >= b is -a <= -b.
                let negated = constraint.poly.clone().scale(-1.0);
                let slack = self.slack_poly(constraint, -constraint.rhs - negated.lower_bound());
                negated.add(&slack).sub(&Poly::constant(-constraint.rhs))
            }
        };
        residual
            .square()
            .map_err(|_| Error::PenaltyDegree(constraint.span))
    }

    /// A binary expansion `sum 2^k s_k` covering `[0, bound]`, declared as fresh
    /// `slack_` variables. An empty polynomial when the bound is not positive.
    fn slack_poly(&mut self, constraint: &CqmConstraint, bound: f64) -> Poly {
        let mut poly = Poly::zero();
        if bound <= 0.0 {
            return poly;
        }
        let mut coefs = Vec::new();
        let mut remaining = bound;
        let mut power = 1.0;
        while power * 2.0 <= remaining + 1e-9 {
            coefs.push(power);
            remaining -= power;
            power *= 2.0;
        }
        if remaining > 1e-9 {
            coefs.push(remaining);
        }
        for (bit, coef) in coefs.into_iter().enumerate() {
            let id = self.vars.declare(
                format!("slack_{}_{bit}", constraint.label).into(),
                "".into(),
                VarKind::Slack,
            );
            poly.add_assign(&Poly::var(id).scale(coef));
        }
        poly
    }

    /// Reduces a numeric expression to a polynomial of degree at most two.
    fn numeric(&mut self, expr: &Expr) -> Result<Poly, Error> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Const(value) => Ok(Poly::constant(*value)),
            ExprKind::Bool(value) => Ok(Poly::constant(f64::from(*value))),
            ExprKind::Var(id) => Ok(Poly::var(*id)),
            ExprKind::Neg(operand) => Ok(self.numeric(operand)?.scale(-1.0)),
            ExprKind::Add(lhs, rhs) => {
                let lhs = self.numeric(lhs)?;
                Ok(lhs.add(&self.numeric(rhs)?))
            }
            ExprKind::Sub(lhs, rhs) => {
                let lhs = self.numeric(lhs)?;
                Ok(lhs.sub(&self.numeric(rhs)?))
            }
            ExprKind::Mul(lhs, rhs) => {
                let lhs = self.numeric(lhs)?;
                let rhs = self.numeric(rhs)?;
                lhs.mul(&rhs).map_err(|_| Error::Degree(span))
            }
            ExprKind::Div(lhs, rhs) => {
                let denominator = self.numeric(rhs)?;
                if !denominator.is_constant() {
                    return Err(Error::DivisionByVariable(span));
                }
                Ok(self.numeric(lhs)?.scale(1.0 / denominator.offset))
            }
            ExprKind::Ite(cond, then, alt) => {
                // if c then a else b lowers as c*a + (1-c)*b.
                let cond = self.booleanize(cond)?;
                let then = self.numeric(then)?;
                let alt = self.numeric(alt)?;
                let on = cond.mul(&then).map_err(|_| Error::Degree(span))?;
                let off = Poly::constant(1.0)
                    .sub(&cond)
                    .mul(&alt)
                    .map_err(|_| Error::Degree(span))?;
                Ok(on.add(&off))
            }
            ExprKind::Not(_)
            | ExprKind::And(..)
            | ExprKind::Or(..)
            | ExprKind::Implies(..)
            | ExprKind::Cmp(..) => self.booleanize(expr),
        }
    }

    /// Reduces a boolean expression to a 0/1-valued polynomial of degree at most two.
    fn booleanize(&mut self, expr: &Expr) -> Result<Poly, Error> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Bool(value) => Ok(Poly::constant(f64::from(*value))),
            ExprKind::Var(id) => Ok(Poly::var(*id)),
            ExprKind::Not(inner) => Ok(Poly::constant(1.0).sub(&self.booleanize(inner)?)),
            ExprKind::And(lhs, rhs) => {
                let lhs = self.affine(lhs)?;
                let rhs = self.affine(rhs)?;
                lhs.mul(&rhs).map_err(|_| Error::Degree(span))
            }
            ExprKind::Or(lhs, rhs) => {
                let lhs = self.affine(lhs)?;
                let rhs = self.affine(rhs)?;
                let product = lhs.mul(&rhs).map_err(|_| Error::Degree(span))?;
                Ok(lhs.add(&rhs).sub(&product))
            }
            ExprKind::Implies(lhs, rhs) => {
                // x => y is 1 - x + x*y.
                let lhs = self.affine(lhs)?;
                let rhs = self.affine(rhs)?;
                let product = lhs.mul(&rhs).map_err(|_| Error::Degree(span))?;
                Ok(Poly::constant(1.0).sub(&lhs).add(&product))
            }
            ExprKind::Cmp(op, lhs, rhs) => {
                if !is_boolean(lhs) || !is_boolean(rhs) {
                    return Err(Error::NestedComparison(span));
                }
                let x = self.affine(lhs)?;
                let y = self.affine(rhs)?;
                match op {
                    CmpOp::Eq => {
                        // XNOR: 1 - (x - y)^2.
                        let diff = x.sub(&y);
                        let square = diff.mul(&diff).map_err(|_| Error::Degree(span))?;
                        Ok(Poly::constant(1.0).sub(&square))
                    }
                    CmpOp::Lt => {
                        // Over bits, a < b means (1 - a) * b.
                        Poly::constant(1.0)
                            .sub(&x)
                            .mul(&y)
                            .map_err(|_| Error::Degree(span))
                    }
                    CmpOp::Le => {
                        // Over bits, a <= b means 1 - a * (1 - b).
                        let product = x
                            .mul(&Poly::constant(1.0).sub(&y))
                            .map_err(|_| Error::Degree(span))?;
                        Ok(Poly::constant(1.0).sub(&product))
                    }
                }
            }
            ExprKind::Ite(cond, then, alt) => {
                let cond = self.affine(cond)?;
                let then = self.affine(then)?;
                let alt = self.affine(alt)?;
                let on = cond.mul(&then).map_err(|_| Error::Degree(span))?;
                let off = Poly::constant(1.0)
                    .sub(&cond)
                    .mul(&alt)
                    .map_err(|_| Error::Degree(span))?;
                Ok(on.add(&off))
            }
            ExprKind::Const(value) => Ok(Poly::constant(*value)),
            ExprKind::Neg(..) | ExprKind::Add(..) | ExprKind::Sub(..) | ExprKind::Mul(..)
            | ExprKind::Div(..) => Err(Error::Degree(span)),
        }
    }

    /// Reduces a boolean expression to an affine (degree at most one) 0/1-valued
    /// polynomial, introducing `aux:` binaries with their defining gadget rows where
    /// the structure is not already affine.
    fn affine(&mut self, expr: &Expr) -> Result<Poly, Error> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Bool(value) => Ok(Poly::constant(f64::from(*value))),
            ExprKind::Var(id) => Ok(Poly::var(*id)),
            ExprKind::Not(inner) => Ok(Poly::constant(1.0).sub(&self.affine(inner)?)),
            ExprKind::And(lhs, rhs) => {
                let x = self.affine(lhs)?;
                let y = self.affine(rhs)?;
                Ok(Poly::var(self.and_gadget(&x, &y, span)))
            }
            ExprKind::Or(lhs, rhs) => {
                let x = self.affine(lhs)?;
                let y = self.affine(rhs)?;
                Ok(Poly::var(self.or_gadget(&x, &y, span)))
            }
            ExprKind::Implies(lhs, rhs) => {
                // x => y is (not x) or y.
                let x = self.affine(lhs)?;
                let y = self.affine(rhs)?;
                let not_x = Poly::constant(1.0).sub(&x);
                Ok(Poly::var(self.or_gadget(&not_x, &y, span)))
            }
            ExprKind::Cmp(op, lhs, rhs) => {
                if !is_boolean(lhs) || !is_boolean(rhs) {
                    return Err(Error::NestedComparison(span));
                }
                let x = self.affine(lhs)?;
                let y = self.affine(rhs)?;
                let not_x = Poly::constant(1.0).sub(&x);
                let not_y = Poly::constant(1.0).sub(&y);
                match op {
                    CmpOp::Eq => {
                        // Both true or both false.
                        let both = self.and_gadget(&x, &y, span);
                        let neither = self.and_gadget(&not_x, &not_y, span);
                        Ok(Poly::var(both).add(&Poly::var(neither)))
                    }
                    CmpOp::Lt => Ok(Poly::var(self.and_gadget(&not_x, &y, span))),
                    CmpOp::Le => {
                        let violated = self.and_gadget(&x, &not_y, span);
                        Ok(Poly::constant(1.0).sub(&Poly::var(violated)))
                    }
                }
            }
            ExprKind::Ite(cond, then, alt) => {
                let c = self.affine(cond)?;
                let t = self.affine(then)?;
                let e = self.affine(alt)?;
                let not_c = Poly::constant(1.0).sub(&c);
                let on = self.and_gadget(&c, &t, span);
                let off = self.and_gadget(&not_c, &e, span);
                Ok(Poly::var(on).add(&Poly::var(off)))
            }
            ExprKind::Const(value) => Ok(Poly::constant(*value)),
            ExprKind::Neg(..) | ExprKind::Add(..) | ExprKind::Sub(..) | ExprKind::Mul(..)
            | ExprKind::Div(..) => Err(Error::Degree(span)),
        }
    }

    /// Declares `z = x AND y` with its defining rows: `z <= x`, `z <= y`,
    /// `z >= x + y - 1`.
    fn and_gadget(&mut self, x: &Poly, y: &Poly, span: Span) -> VarId {
        let z = self.fresh_aux();
        let zp = Poly::var(z);
        self.push_normalized(
            format!("aux:{z}:le_lhs"),
            zp.clone().sub(x),
            Sense::Le,
            0.0,
            span,
            true,
        );
        self.push_normalized(
            format!("aux:{z}:le_rhs"),
            zp.clone().sub(y),
            Sense::Le,
            0.0,
            span,
            true,
        );
        self.push_normalized(
            format!("aux:{z}:ge_both"),
            zp.sub(x).sub(y),
            Sense::Ge,
            -1.0,
            span,
            true,
        );
        z
    }

    /// Declares `z = x OR y` with its defining rows: `z >= x`, `z >= y`,
    /// `z <= x + y`.
    fn or_gadget(&mut self, x: &Poly, y: &Poly, span: Span) -> VarId {
        let z = self.fresh_aux();
        let zp = Poly::var(z);
        self.push_normalized(
            format!("aux:{z}:ge_lhs"),
            zp.clone().sub(x),
            Sense::Ge,
            0.0,
            span,
            true,
        );
        self.push_normalized(
            format!("aux:{z}:ge_rhs"),
            zp.clone().sub(y),
            Sense::Ge,
            0.0,
            span,
            true,
        );
        self.push_normalized(
            format!("aux:{z}:le_either"),
            zp.sub(x).sub(y),
            Sense::Le,
            0.0,
            span,
            true,
        );
        z
    }

    fn fresh_aux(&mut self) -> VarId {
        let id = self.vars.declare(
            format!("aux:{}", self.aux_count).into(),
            "".into(),
            VarKind::Aux,
        );
        self.aux_count += 1;
        id
    }
}

/// Whether the expression is boolean-valued, so comparisons over it can be encoded as
/// bit algebra.
fn is_boolean(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Bool(_) | ExprKind::Var(_) => true,
        ExprKind::Not(inner) => is_boolean(inner),
        ExprKind::And(lhs, rhs) | ExprKind::Or(lhs, rhs) | ExprKind::Implies(lhs, rhs) => {
            is_boolean(lhs) && is_boolean(rhs)
        }
        ExprKind::Cmp(_, lhs, rhs) => is_boolean(lhs) && is_boolean(rhs),
        ExprKind::Ite(_, then, alt) => is_boolean(then) && is_boolean(alt),
        ExprKind::Const(value) => *value == 0.0 || *value == 1.0,
        ExprKind::Neg(..)
        | ExprKind::Add(..)
        | ExprKind::Sub(..)
        | ExprKind::Mul(..)
        | ExprKind::Div(..) => false,
    }
}

/// Flattens nested top-level conjunctions.
fn split_conjuncts<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    if let ExprKind::And(lhs, rhs) = &expr.kind {
        split_conjuncts(lhs, out);
        split_conjuncts(rhs, out);
    } else {
        out.push(expr);
    }
}
