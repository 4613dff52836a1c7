// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Grounding proper: a partial evaluator over Kernel IR. Constants fold eagerly (set
//! sizes, parameter reads, arithmetic and comparisons on constants), decisions become
//! binary variable references, and quantifiers and sums unroll over set elements in
//! declaration order so variable labels and expansion order are deterministic.


use crate::scenario::{ParamValue, Scenario};
use miette::Diagnostic;
use qsolc_data_structures::{cancel::CancelToken, span::Span};
use qsolc_gir::gir::{
    Expr as GExpr, ExprKind as GExprKind, GroundConstraint, GroundFind, GroundFindKind,
    GroundProblem, VarKind, VarTable,
};
use qsolc_kir::kir::{
    CmpOp, ConstValue, Expr as KExpr, ExprKind as KExprKind, FindKind, KernelProblem, ParamDef,
    ParamTy,
};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use thiserror::Error;

pub use qsolc_gir::gir::EPSILON;

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("scenario does not define set `{0}`")]
    #[diagnostic(code("QSOL2201"))]
    MissingSet(String, #[label("declared here")] Span),

    #[error("set `{0}` lists element `{1}` more than once")]
    #[diagnostic(code("QSOL2201"))]
    DuplicateElem(String, String, #[label("declared here")] Span),

    #[error("scenario provides no value for parameter `{0}` and it has no default")]
    #[diagnostic(code("QSOL2201"))]
    MissingParam(String, #[label("declared here")] Span),

    #[error("parameter `{0}` has no entry for `{1}` and no default")]
    #[diagnostic(code("QSOL2201"))]
    MissingParamEntry(String, String, #[label("declared here")] Span),

    #[error("value for parameter `{0}` does not match its declared type")]
    #[diagnostic(code("QSOL2201"))]
    BadParamShape(String, #[label("declared here")] Span),

    #[error("`{0}` is not a member of set `{1}`")]
    #[diagnostic(code("QSOL2201"))]
    NotMember(String, String, #[label] Span),

    #[error("value {1} for parameter `{0}` is outside its declared bounds [{2}, {3}]")]
    #[diagnostic(code("QSOL2201"))]
    OutOfBounds(String, f64, i64, i64, #[label("declared here")] Span),

    #[error("division by zero while grounding")]
    #[diagnostic(code("QSOL2201"))]
    DivisionByZero(#[label] Span),

    #[error("grounding interrupted by cancellation")]
    Interrupted,
}

/// Grounds one kernel problem against a scenario.
///
/// # Errors
/// Returns all scenario and data-shape errors found; the Ground IR is only produced if
/// there are none.
pub fn ground(
    problem: &KernelProblem,
    scenario: &Scenario,
    cancel: &CancelToken,
) -> Result<GroundProblem, Vec<Error>> {
    let mut grounder = Grounder {
        scenario,
        cancel,
        sets: FxHashMap::default(),
        params: FxHashMap::default(),
        vars: VarTable::new(),
        finds: Vec::new(),
        find_index: FxHashMap::default(),
        env: Vec::new(),
        errors: Vec::new(),
    };

    grounder.bind_sets(problem);
    grounder.bind_params(problem);
    if !grounder.errors.is_empty() {
        return Err(grounder.errors);
    }
    grounder.declare_vars(problem);

    let mut constraints = Vec::new();
    for constraint in &problem.constraints {
        if grounder.cancel.is_cancelled() {
            grounder.errors.push(Error::Interrupted);
            return Err(grounder.errors);
        }
        match grounder.eval(&constraint.expr) {
            Ok(value) => constraints.push(GroundConstraint {
                weight: constraint.weight,
                expr: grounder.to_gexpr(value, constraint.span),
                span: constraint.span,
            }),
            Err(Stop) => {}
        }
    }

    let objective = match &problem.objective {
        Some(expr) => match grounder.eval(expr) {
            Ok(value) => Some(grounder.to_gexpr(value, expr.span)),
            Err(Stop) => None,
        },
        None => None,
    };

    log::debug!(
        "grounded problem `{}`: {} variables, {} constraints",
        problem.name,
        grounder.vars.len(),
        constraints.len()
    );

    if grounder.errors.is_empty() {
        Ok(GroundProblem {
            name: Rc::clone(&problem.name),
            vars: grounder.vars,
            finds: grounder.finds,
            constraints,
            objective,
        })
    } else {
        Err(grounder.errors)
    }
}

/// Sentinel for an evaluation aborted by a recorded error.
struct Stop;

/// A partially evaluated expression: a constant, an element id, or a residual tree
/// over binary variables.
enum Value {
    Num(f64),
    Bool(bool),
    Elem(Rc<str>),
    Resid(GExpr),
}

struct Grounder<'a> {
    scenario: &'a Scenario,
    cancel: &'a CancelToken,
    sets: FxHashMap<Rc<str>, Vec<Rc<str>>>,
    params: FxHashMap<Rc<str>, &'a ParamDef>,
    vars: VarTable,
    finds: Vec<GroundFind>,
    find_index: FxHashMap<Rc<str>, usize>,
    env: Vec<(Rc<str>, Rc<str>)>,
    errors: Vec<Error>,
}

impl<'a> Grounder<'a> {
    fn bind_sets(&mut self, problem: &KernelProblem) {
        for set in &problem.sets {
            let Some(elems) = self.scenario.sets.get(set.name.as_ref()) else {
                self.errors
                    .push(Error::MissingSet(set.name.to_string(), set.span));
                continue;
            };
            let mut seen = FxHashMap::default();
            let mut bound: Vec<Rc<str>> = Vec::with_capacity(elems.len());
            for elem in elems {
                let elem: Rc<str> = elem.as_str().into();
                if seen.insert(Rc::clone(&elem), ()).is_some() {
                    self.errors.push(Error::DuplicateElem(
                        set.name.to_string(),
                        elem.to_string(),
                        set.span,
                    ));
                    continue;
                }
                bound.push(elem);
            }
            self.sets.insert(Rc::clone(&set.name), bound);
        }

        for name in self.scenario.sets.keys() {
            if !self.sets.contains_key(name.as_str()) {
                log::warn!("scenario defines set `{name}` that the problem does not declare");
            }
        }
    }

    fn bind_params(&mut self, problem: &'a KernelProblem) {
        for param in &problem.params {
            let provided = self.scenario.params.contains_key(param.name.as_ref());
            if !provided && param.default.is_none() {
                self.errors
                    .push(Error::MissingParam(param.name.to_string(), param.span));
                continue;
            }
            // Scalar `Elem` values are validated up front and normalized to ids.
            if let (ParamTy::Elem(set), true, Some(ParamValue::Str(value))) = (
                &param.ty,
                param.index.is_empty(),
                self.scenario.params.get(param.name.as_ref()),
            ) {
                if !self.is_member(set, value.as_str()) {
                    self.errors.push(Error::NotMember(
                        value.clone(),
                        set.to_string(),
                        param.span,
                    ));
                }
            }
            self.params.insert(Rc::clone(&param.name), param);
        }
    }

    fn declare_vars(&mut self, problem: &KernelProblem) {
        for find in &problem.finds {
            let kind = match &find.kind {
                FindKind::Subset(set) => {
                    let elems = self.set_elems(set);
                    let vars = elems
                        .iter()
                        .map(|elem| {
                            self.vars.declare(
                                format!("{}.has[{elem}]", find.name).into(),
                                format!("{}.has({elem})", find.name).into(),
                                VarKind::Primary,
                            )
                        })
                        .collect();
                    GroundFindKind::Subset { elems, vars }
                }
                FindKind::Mapping(dom, cod) => {
                    let domain = self.set_elems(dom);
                    let codomain = self.set_elems(cod);
                    let vars = domain
                        .iter()
                        .map(|a| {
                            codomain
                                .iter()
                                .map(|b| {
                                    self.vars.declare(
                                        format!("{}.is[{a},{b}]", find.name).into(),
                                        format!("{}.is({a},{b})", find.name).into(),
                                        VarKind::Primary,
                                    )
                                })
                                .collect()
                        })
                        .collect();
                    GroundFindKind::Mapping {
                        domain,
                        codomain,
                        vars,
                    }
                }
            };
            self.find_index.insert(Rc::clone(&find.name), self.finds.len());
            self.finds.push(GroundFind {
                name: Rc::clone(&find.name),
                kind,
            });
        }
    }

    fn set_elems(&self, set: &Rc<str>) -> Vec<Rc<str>> {
        self.sets.get(set).cloned().unwrap_or_default()
    }

    fn is_member(&self, set: &Rc<str>, elem: &str) -> bool {
        self.sets
            .get(set)
            .is_some_and(|elems| elems.iter().any(|e| e.as_ref() == elem))
    }

    fn to_gexpr(&self, value: Value, span: Span) -> GExpr {
        let kind = match value {
            Value::Num(value) => GExprKind::Const(value),
            Value::Bool(value) => GExprKind::Bool(value),
            Value::Resid(expr) => return expr,
            Value::Elem(_) => {
                unreachable!("element values cannot escape into ground expressions")
            }
        };
        GExpr { span, kind }
    }

    fn eval(&mut self, expr: &KExpr) -> Result<Value, Stop> {
        let span = expr.span;
        match &expr.kind {
            KExprKind::Bool(value) => Ok(Value::Bool(*value)),
            KExprKind::Num(value) => Ok(Value::Num(*value)),
            KExprKind::Iter(name) => {
                let elem = self
                    .env
                    .iter()
                    .rev()
                    .find(|(binder, _)| binder == name)
                    .map(|(_, elem)| Rc::clone(elem))
                    .expect("iterator should be bound by an enclosing expansion");
                Ok(Value::Elem(elem))
            }
            KExprKind::Param(name, args) => self.eval_param(name, args, span),
            KExprKind::Size(set) => {
                #[allow(clippy::cast_precision_loss)]
                Ok(Value::Num(self.set_elems(set).len() as f64))
            }
            KExprKind::Has(find, elem) => {
                let elem = self.eval_elem(elem)?;
                self.membership_var(find, &elem, span)
            }
            KExprKind::Is(find, a, b) => {
                let a = self.eval_elem(a)?;
                let b = self.eval_elem(b)?;
                self.assignment_var(find, &a, &b, span)
            }
            KExprKind::Neg(operand) => match self.eval(operand)? {
                Value::Num(value) => Ok(Value::Num(-value)),
                value => Ok(Value::Resid(GExpr {
                    span,
                    kind: GExprKind::Neg(Box::new(self.to_gexpr(value, span))),
                })),
            },
            KExprKind::Not(operand) => match self.eval(operand)? {
                Value::Bool(value) => Ok(Value::Bool(!value)),
                value => Ok(Value::Resid(GExpr {
                    span,
                    kind: GExprKind::Not(Box::new(self.to_gexpr(value, span))),
                })),
            },
            KExprKind::Add(lhs, rhs) => self.eval_arith(lhs, rhs, span, |a, b| a + b, GExprKind::Add),
            KExprKind::Sub(lhs, rhs) => self.eval_arith(lhs, rhs, span, |a, b| a - b, GExprKind::Sub),
            KExprKind::Mul(lhs, rhs) => self.eval_arith(lhs, rhs, span, |a, b| a * b, GExprKind::Mul),
            KExprKind::Div(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                if let Value::Num(d) = &rhs {
                    if *d == 0.0 {
                        self.errors.push(Error::DivisionByZero(span));
                        return Err(Stop);
                    }
                    if let Value::Num(a) = &lhs {
                        return Ok(Value::Num(a / d));
                    }
                }
                Ok(Value::Resid(GExpr {
                    span,
                    kind: GExprKind::Div(
                        Box::new(self.to_gexpr(lhs, span)),
                        Box::new(self.to_gexpr(rhs, span)),
                    ),
                }))
            }
            KExprKind::And(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if let Value::Bool(false) = lhs {
                    return Ok(Value::Bool(false));
                }
                let rhs = self.eval(rhs)?;
                match (lhs, rhs) {
                    (Value::Bool(true), rhs) => Ok(rhs),
                    (lhs, Value::Bool(true)) => Ok(lhs),
                    (_, Value::Bool(false)) => Ok(Value::Bool(false)),
                    (lhs, rhs) => Ok(Value::Resid(GExpr {
                        span,
                        kind: GExprKind::And(
                            Box::new(self.to_gexpr(lhs, span)),
                            Box::new(self.to_gexpr(rhs, span)),
                        ),
                    })),
                }
            }
            KExprKind::Or(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if let Value::Bool(true) = lhs {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.eval(rhs)?;
                match (lhs, rhs) {
                    (Value::Bool(false), rhs) => Ok(rhs),
                    (lhs, Value::Bool(false)) => Ok(lhs),
                    (_, Value::Bool(true)) => Ok(Value::Bool(true)),
                    (lhs, rhs) => Ok(Value::Resid(GExpr {
                        span,
                        kind: GExprKind::Or(
                            Box::new(self.to_gexpr(lhs, span)),
                            Box::new(self.to_gexpr(rhs, span)),
                        ),
                    })),
                }
            }
            KExprKind::Implies(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if let Value::Bool(false) = lhs {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.eval(rhs)?;
                match (lhs, rhs) {
                    (Value::Bool(true), rhs) => Ok(rhs),
                    (_, Value::Bool(true)) => Ok(Value::Bool(true)),
                    (lhs, rhs) => Ok(Value::Resid(GExpr {
                        span,
                        kind: GExprKind::Implies(
                            Box::new(self.to_gexpr(lhs, span)),
                            Box::new(self.to_gexpr(rhs, span)),
                        ),
                    })),
                }
            }
            KExprKind::Cmp(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                if let (Value::Elem(a), Value::Elem(b)) = (&lhs, &rhs) {
                    // Element comparisons only reach here as equalities.
                    return Ok(Value::Bool(a == b));
                }
                if let (Value::Num(a), Value::Num(b)) = (&lhs, &rhs) {
                    return Ok(Value::Bool(match op {
                        CmpOp::Lt => a - b <= -EPSILON,
                        CmpOp::Le => a - b <= EPSILON,
                        CmpOp::Eq => (a - b).abs() <= EPSILON,
                    }));
                }
                Ok(Value::Resid(GExpr {
                    span,
                    kind: GExprKind::Cmp(
                        *op,
                        Box::new(self.to_gexpr(lhs, span)),
                        Box::new(self.to_gexpr(rhs, span)),
                    ),
                }))
            }
            KExprKind::Ite(cond, then, alt) => {
                let cond = self.eval(cond)?;
                match cond {
                    Value::Bool(true) => self.eval(then),
                    Value::Bool(false) => self.eval(alt),
                    cond => {
                        let then = self.eval(then)?;
                        let alt = self.eval(alt)?;
                        Ok(Value::Resid(GExpr {
                            span,
                            kind: GExprKind::Ite(
                                Box::new(self.to_gexpr(cond, span)),
                                Box::new(self.to_gexpr(then, span)),
                                Box::new(self.to_gexpr(alt, span)),
                            ),
                        }))
                    }
                }
            }
            KExprKind::Sum { iter, set, body } => {
                let elems = self.set_elems(set);
                let mut constant = 0.0;
                let mut residuals: Vec<GExpr> = Vec::new();
                for elem in elems {
                    if self.cancel.is_cancelled() {
                        self.errors.push(Error::Interrupted);
                        return Err(Stop);
                    }
                    self.env.push((Rc::clone(iter), elem));
                    let value = self.eval(body);
                    self.env.pop();
                    match value? {
                        Value::Num(value) => constant += value,
                        value => residuals.push(self.to_gexpr(value, span)),
                    }
                }
                Ok(fold_sum(constant, residuals, span))
            }
            KExprKind::Forall { iter, set, body } => {
                self.eval_quant(iter, set, body, span, true)
            }
            KExprKind::Exists { iter, set, body } => {
                self.eval_quant(iter, set, body, span, false)
            }
        }
    }

    /// Expands a quantifier over its set. `forall` over the empty set is true and
    /// `exists` over the empty set is false.
    fn eval_quant(
        &mut self,
        iter: &Rc<str>,
        set: &Rc<str>,
        body: &KExpr,
        span: Span,
        universal: bool,
    ) -> Result<Value, Stop> {
        let elems = self.set_elems(set);
        let mut residuals: Vec<GExpr> = Vec::new();
        for elem in elems {
            if self.cancel.is_cancelled() {
                self.errors.push(Error::Interrupted);
                return Err(Stop);
            }
            self.env.push((Rc::clone(iter), elem));
            let value = self.eval(body);
            self.env.pop();
            match value? {
                Value::Bool(value) => {
                    if value != universal {
                        // One false conjunct or one true disjunct decides the result.
                        return Ok(Value::Bool(!universal));
                    }
                }
                value => residuals.push(self.to_gexpr(value, span)),
            }
        }

        let mut iter = residuals.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Value::Bool(universal));
        };
        let combined = iter.fold(first, |acc, next| GExpr {
            span,
            kind: if universal {
                GExprKind::And(Box::new(acc), Box::new(next))
            } else {
                GExprKind::Or(Box::new(acc), Box::new(next))
            },
        });
        Ok(Value::Resid(combined))
    }

    fn eval_arith(
        &mut self,
        lhs: &KExpr,
        rhs: &KExpr,
        span: Span,
        fold: impl Fn(f64, f64) -> f64,
        ctor: fn(Box<GExpr>, Box<GExpr>) -> GExprKind,
    ) -> Result<Value, Stop> {
        let lhs = self.eval(lhs)?;
        let rhs = self.eval(rhs)?;
        if let (Value::Num(a), Value::Num(b)) = (&lhs, &rhs) {
            return Ok(Value::Num(fold(*a, *b)));
        }
        Ok(Value::Resid(GExpr {
            span,
            kind: ctor(
                Box::new(self.to_gexpr(lhs, span)),
                Box::new(self.to_gexpr(rhs, span)),
            ),
        }))
    }

    fn eval_elem(&mut self, expr: &KExpr) -> Result<Rc<str>, Stop> {
        match self.eval(expr)? {
            Value::Elem(elem) => Ok(elem),
            _ => unreachable!("element positions should hold element-typed expressions"),
        }
    }

    fn membership_var(&mut self, find: &Rc<str>, elem: &Rc<str>, span: Span) -> Result<Value, Stop> {
        let index = self.find_index[find];
        let GroundFindKind::Subset { elems, vars } = &self.finds[index].kind else {
            unreachable!("`has` applies to subset finds")
        };
        match elems.iter().position(|e| e == elem) {
            Some(position) => Ok(Value::Resid(GExpr {
                span,
                kind: GExprKind::Var(vars[position]),
            })),
            None => {
                let set = subset_name(&self.finds[index]);
                self.errors
                    .push(Error::NotMember(elem.to_string(), set, span));
                Err(Stop)
            }
        }
    }

    fn assignment_var(
        &mut self,
        find: &Rc<str>,
        a: &Rc<str>,
        b: &Rc<str>,
        span: Span,
    ) -> Result<Value, Stop> {
        let index = self.find_index[find];
        let GroundFindKind::Mapping {
            domain,
            codomain,
            vars,
        } = &self.finds[index].kind
        else {
            unreachable!("`is` applies to mapping finds")
        };
        let row = domain.iter().position(|e| e == a);
        let col = codomain.iter().position(|e| e == b);
        match (row, col) {
            (Some(row), Some(col)) => Ok(Value::Resid(GExpr {
                span,
                kind: GExprKind::Var(vars[row][col]),
            })),
            (None, _) => {
                self.errors.push(Error::NotMember(
                    a.to_string(),
                    "the mapping domain".to_string(),
                    span,
                ));
                Err(Stop)
            }
            (_, None) => {
                self.errors.push(Error::NotMember(
                    b.to_string(),
                    "the mapping codomain".to_string(),
                    span,
                ));
                Err(Stop)
            }
        }
    }

    fn eval_param(&mut self, name: &Rc<str>, args: &[KExpr], span: Span) -> Result<Value, Stop> {
        let mut keys = Vec::with_capacity(args.len());
        for arg in args {
            keys.push(self.eval_elem(arg)?);
        }

        let Some(&param) = self.params.get(name) else {
            // Binding already reported the missing parameter.
            return Err(Stop);
        };

        let mut value = self.scenario.params.get(name.as_ref());
        for key in &keys {
            value = match value {
                Some(ParamValue::Map(map)) => map.get(key.as_ref()),
                Some(_) => {
                    self.errors
                        .push(Error::BadParamShape(name.to_string(), param.span));
                    return Err(Stop);
                }
                None => None,
            };
            if value.is_none() {
                break;
            }
        }

        match value {
            Some(value) => self.coerce(param, value, span),
            None => match &param.default {
                Some(ConstValue::Bool(value)) => Ok(Value::Bool(*value)),
                Some(ConstValue::Num(value)) => self.check_bounds(param, *value),
                None => {
                    let path = keys
                        .iter()
                        .map(|k| k.as_ref())
                        .collect::<Vec<_>>()
                        .join(",");
                    self.errors.push(Error::MissingParamEntry(
                        name.to_string(),
                        path,
                        param.span,
                    ));
                    Err(Stop)
                }
            },
        }
    }

    fn coerce(&mut self, param: &ParamDef, value: &ParamValue, span: Span) -> Result<Value, Stop> {
        match (&param.ty, value) {
            (ParamTy::Bool, ParamValue::Bool(value)) => Ok(Value::Bool(*value)),
            (ParamTy::Real, ParamValue::Num(value)) => Ok(Value::Num(*value)),
            (ParamTy::Int(_), ParamValue::Num(value)) if value.fract() == 0.0 => {
                self.check_bounds(param, *value)
            }
            (ParamTy::Elem(set), ParamValue::Str(value)) => {
                if self.is_member(set, value) {
                    Ok(Value::Elem(value.as_str().into()))
                } else {
                    self.errors.push(Error::NotMember(
                        value.clone(),
                        set.to_string(),
                        span,
                    ));
                    Err(Stop)
                }
            }
            _ => {
                self.errors
                    .push(Error::BadParamShape(param.name.to_string(), param.span));
                Err(Stop)
            }
        }
    }

    fn check_bounds(&mut self, param: &ParamDef, value: f64) -> Result<Value, Stop> {
        if let ParamTy::Int(Some((lo, hi))) = &param.ty {
            #[allow(clippy::cast_precision_loss)]
            if value < *lo as f64 || value > *hi as f64 {
                self.errors.push(Error::OutOfBounds(
                    param.name.to_string(),
                    value,
                    *lo,
                    *hi,
                    param.span,
                ));
                return Err(Stop);
            }
        }
        Ok(Value::Num(value))
    }
}

fn subset_name(find: &GroundFind) -> String {
    match &find.kind {
        GroundFindKind::Subset { .. } => format!("the set of `{}`", find.name),
        GroundFindKind::Mapping { .. } => format!("the domain of `{}`", find.name),
    }
}

/// Combines the constant part of a sum with its residual terms, left-associated in
/// expansion order.
fn fold_sum(constant: f64, residuals: Vec<GExpr>, span: Span) -> Value {
    let mut iter = residuals.into_iter();
    let Some(first) = iter.next() else {
        return Value::Num(constant);
    };
    let mut acc = if constant == 0.0 {
        first
    } else {
        GExpr {
            span,
            kind: GExprKind::Add(
                Box::new(GExpr {
                    span,
                    kind: GExprKind::Const(constant),
                }),
                Box::new(first),
            ),
        }
    };
    for next in iter {
        acc = GExpr {
            span,
            kind: GExprKind::Add(Box::new(acc), Box::new(next)),
        };
    }
    Value::Resid(acc)
}
