// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The type checker assigns a type to every expression node, bottom-up, and enforces
//! the shape rules: numeric operands for arithmetic, boolean bodies for quantifiers and
//! constraints, element types for method calls and parameter indices. `Int` coerces to
//! `Real` in numeric positions. Violations carry `QSOL2101`.

#[cfg(test)]
mod tests;

use crate::resolve::{Names, Res};
use miette::Diagnostic;
use qsolc_ast::ast::{
    AggOp, BinOp, CallArg, CompSpec, Decl, DeclKind, Expr, ExprKind, FindTyKind, ItemKind,
    Lit, NodeId, ParamDecl, Program, UnOp, ValueTy,
};
use qsolc_data_structures::{index_map::IndexMap, span::Span};
use rustc_hash::FxHashMap;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};
use thiserror::Error;

/// Maps expression node ids to their types.
pub type Table = IndexMap<NodeId, Ty>;

/// The type of an expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Ty {
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// A real number.
    Real,
    /// An element of the named set.
    Elem(Rc<str>),
    /// The type of an expression that failed to check; suppresses cascading errors.
    Err,
}

impl Ty {
    fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Real | Ty::Err)
    }

    fn is_bool(&self) -> bool {
        matches!(self, Ty::Bool | Ty::Err)
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("Bool"),
            Ty::Int => f.write_str("Int"),
            Ty::Real => f.write_str("Real"),
            Ty::Elem(set) => write!(f, "Elem({set})"),
            Ty::Err => f.write_str("?"),
        }
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("expected {0}, found {1}")]
    #[diagnostic(code("QSOL2101"))]
    Mismatch(Ty, Ty, #[label] Span),

    #[error("`{0}` expects {1} arguments, found {2}")]
    #[diagnostic(code("QSOL2101"))]
    Arity(String, usize, usize, #[label] Span),

    #[error("`{0}` has no method `{1}`")]
    #[diagnostic(code("QSOL2101"))]
    #[diagnostic(help("`has` applies to Subset finds; `is` applies to Mapping finds"))]
    NoMethod(String, String, #[label] Span),

    #[error("`{0}` is not a value in this position")]
    #[diagnostic(code("QSOL2101"))]
    NotValue(String, #[label] Span),

    #[error("operands of `{0}` do not agree")]
    #[diagnostic(code("QSOL2101"))]
    CmpOperands(&'static str, #[label] Span),

    #[error("constraint expression must be boolean")]
    #[diagnostic(code("QSOL2101"))]
    ConstraintShape(#[label] Span),

    #[error("objective expression must be numeric")]
    #[diagnostic(code("QSOL2101"))]
    ObjectiveShape(#[label] Span),

    #[error("branches of `if` do not agree")]
    #[diagnostic(code("QSOL2101"))]
    IfBranches(#[label] Span),
}

/// The declared signature of a parameter.
#[derive(Clone, Debug)]
pub struct ParamSig {
    pub index: Vec<Rc<str>>,
    pub ty: Ty,
    pub has_default: bool,
}

/// The declared signature of a primitive find.
#[derive(Clone, Debug)]
pub enum FindSig {
    Subset(Rc<str>),
    Mapping(Rc<str>, Rc<str>),
}

/// Checks every problem in the program and returns the type table.
#[must_use]
pub fn check(program: &Program, names: &Names) -> (Table, Vec<Error>) {
    let mut checker = Checker {
        names,
        params: FxHashMap::default(),
        finds: FxHashMap::default(),
        tys: Table::new(),
        errors: Vec::new(),
    };

    for item in &*program.items {
        if let ItemKind::Problem(problem) = &*item.kind {
            checker.params.clear();
            checker.finds.clear();
            for decl in &*problem.decls {
                checker.declare(decl);
            }
            for decl in &*problem.decls {
                checker.check_decl(decl);
            }
        }
    }

    (checker.tys, checker.errors)
}

/// Collects parameter and find signatures from a problem's declarations. Shared with
/// the validator, which needs the same view of the declarations.
#[must_use]
pub fn signatures(program: &Program) -> (FxHashMap<NodeId, ParamSig>, FxHashMap<NodeId, FindSig>) {
    let mut params = FxHashMap::default();
    let mut finds = FxHashMap::default();
    for item in &*program.items {
        if let ItemKind::Problem(problem) = &*item.kind {
            for decl in &*problem.decls {
                match &*decl.kind {
                    DeclKind::Param(param) => {
                        params.insert(param.name.id, param_sig(param));
                    }
                    DeclKind::Find(find) => match &find.ty.kind {
                        FindTyKind::Subset(set) => {
                            finds.insert(find.name.id, FindSig::Subset(Rc::clone(&set.name)));
                        }
                        FindTyKind::Mapping(dom, cod) => {
                            finds.insert(
                                find.name.id,
                                FindSig::Mapping(Rc::clone(&dom.name), Rc::clone(&cod.name)),
                            );
                        }
                        FindTyKind::Custom(..) => {}
                    },
                    _ => {}
                }
            }
        }
    }
    (params, finds)
}

fn param_sig(param: &ParamDecl) -> ParamSig {
    ParamSig {
        index: param.index.iter().map(|set| Rc::clone(&set.name)).collect(),
        ty: match &param.ty {
            ValueTy::Bool => Ty::Bool,
            ValueTy::Int(_) => Ty::Int,
            ValueTy::Real => Ty::Real,
            ValueTy::Elem(set) => Ty::Elem(Rc::clone(&set.name)),
        },
        has_default: param.default.is_some(),
    }
}

struct Checker<'a> {
    names: &'a Names,
    params: FxHashMap<NodeId, ParamSig>,
    finds: FxHashMap<NodeId, FindSig>,
    tys: Table,
    errors: Vec<Error>,
}

impl Checker<'_> {
    fn declare(&mut self, decl: &Decl) {
        match &*decl.kind {
            DeclKind::Param(param) => {
                self.params.insert(param.name.id, param_sig(param));
            }
            DeclKind::Find(find) => match &find.ty.kind {
                FindTyKind::Subset(set) => {
                    self.finds
                        .insert(find.name.id, FindSig::Subset(Rc::clone(&set.name)));
                }
                FindTyKind::Mapping(dom, cod) => {
                    self.finds.insert(
                        find.name.id,
                        FindSig::Mapping(Rc::clone(&dom.name), Rc::clone(&cod.name)),
                    );
                }
                FindTyKind::Custom(..) => {}
            },
            _ => {}
        }
    }

    fn check_decl(&mut self, decl: &Decl) {
        match &*decl.kind {
            DeclKind::Set(_) | DeclKind::Find(_) => {}
            DeclKind::Param(param) => {
                if let Some(default) = &param.default {
                    let expected = param_sig(param).ty;
                    let actual = self.check_expr(default);
                    if !compatible(&expected, &actual) {
                        self.errors
                            .push(Error::Mismatch(expected, actual, default.span));
                    }
                }
            }
            DeclKind::Constraint(constraint) => {
                let ty = self.check_expr(&constraint.expr);
                if !ty.is_bool() {
                    self.errors.push(Error::ConstraintShape(constraint.expr.span));
                }
                if let Some(guard) = &constraint.guard {
                    let guard_ty = self.check_expr(guard);
                    if !guard_ty.is_bool() {
                        self.errors.push(Error::ConstraintShape(guard.span));
                    }
                }
            }
            DeclKind::Objective(objective) => {
                let ty = self.check_expr(&objective.expr);
                if !ty.is_numeric() {
                    self.errors.push(Error::ObjectiveShape(objective.expr.span));
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Ty {
        let ty = self.infer_expr(expr);
        self.tys.insert(expr.id, ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &Expr) -> Ty {
        match &*expr.kind {
            ExprKind::Lit(Lit::Bool(_)) => Ty::Bool,
            ExprKind::Lit(Lit::Int(_)) => Ty::Int,
            ExprKind::Lit(Lit::Real(_)) => Ty::Real,
            ExprKind::Err => Ty::Err,
            ExprKind::Name(name) => match self.names.get(name.id) {
                Some(Res::Iter(_, set)) => Ty::Elem(Rc::clone(set)),
                Some(Res::Param(decl)) => self
                    .params
                    .get(decl)
                    .map_or(Ty::Err, |sig| sig.ty.clone()),
                Some(Res::Set(_) | Res::Find(_)) => {
                    self.errors
                        .push(Error::NotValue(name.name.to_string(), name.span));
                    Ty::Err
                }
                None => Ty::Err,
            },
            ExprKind::Size(_) => Ty::Int,
            ExprKind::Index(name, args) => self.infer_index(name, args),
            ExprKind::Method(call) => self.infer_method(call),
            ExprKind::Call(_, args) => {
                // Leftover calls are reported by the validator as misused parameters or
                // by the resolver as unknown names; still check the arguments.
                for arg in &**args {
                    if let CallArg::Expr(expr) = arg {
                        self.check_expr(expr);
                    }
                }
                Ty::Err
            }
            ExprKind::UnOp(UnOp::Neg, operand) => {
                let ty = self.check_expr(operand);
                if ty.is_numeric() {
                    ty
                } else {
                    self.errors.push(Error::Mismatch(Ty::Real, ty, operand.span));
                    Ty::Err
                }
            }
            ExprKind::UnOp(UnOp::Not, operand) => {
                let ty = self.check_expr(operand);
                if !ty.is_bool() {
                    self.errors.push(Error::Mismatch(Ty::Bool, ty, operand.span));
                }
                Ty::Bool
            }
            ExprKind::BinOp(op, lhs, rhs) => self.infer_binop(*op, lhs, rhs, expr.span),
            ExprKind::If(cond, then, alt) => {
                let cond_ty = self.check_expr(cond);
                if !cond_ty.is_bool() {
                    self.errors.push(Error::Mismatch(Ty::Bool, cond_ty, cond.span));
                }
                let then_ty = self.check_expr(then);
                let alt_ty = self.check_expr(alt);
                match join(&then_ty, &alt_ty) {
                    Some(ty) => ty,
                    None => {
                        self.errors.push(Error::IfBranches(expr.span));
                        Ty::Err
                    }
                }
            }
            ExprKind::Quant(quant) => {
                let body_ty = self.check_expr(&quant.body);
                if !body_ty.is_bool() {
                    self.errors
                        .push(Error::Mismatch(Ty::Bool, body_ty, quant.body.span));
                }
                Ty::Bool
            }
            ExprKind::Agg(agg) => match &agg.comp {
                CompSpec::Range(range) => {
                    if let Some(cond) = &range.cond {
                        let cond_ty = self.check_expr(cond);
                        if !cond_ty.is_bool() {
                            self.errors.push(Error::Mismatch(Ty::Bool, cond_ty, cond.span));
                        }
                    }
                    match agg.op {
                        AggOp::Sum => {
                            let mut out = Ty::Int;
                            if let Some(body) = &range.body {
                                let body_ty = self.check_expr(body);
                                if !body_ty.is_numeric() {
                                    self.errors
                                        .push(Error::Mismatch(Ty::Real, body_ty.clone(), body.span));
                                }
                                out = body_ty;
                            }
                            if let Some(alt) = &range.alt {
                                let alt_ty = self.check_expr(alt);
                                if !alt_ty.is_numeric() {
                                    self.errors
                                        .push(Error::Mismatch(Ty::Real, alt_ty.clone(), alt.span));
                                }
                                out = join(&out, &alt_ty).unwrap_or(Ty::Real);
                            }
                            if out.is_numeric() {
                                out
                            } else {
                                Ty::Real
                            }
                        }
                        AggOp::Count => {
                            if let Some(body) = &range.body {
                                let body_ty = self.check_expr(body);
                                // The body may be the iterator itself (filter-shaped) or
                                // a boolean condition.
                                if !body_ty.is_bool() && !matches!(body_ty, Ty::Elem(_)) {
                                    self.errors
                                        .push(Error::Mismatch(Ty::Bool, body_ty, body.span));
                                }
                            }
                            Ty::Int
                        }
                        AggOp::Any | AggOp::All => {
                            if let Some(body) = &range.body {
                                let body_ty = self.check_expr(body);
                                if !body_ty.is_bool() && !matches!(body_ty, Ty::Elem(_)) {
                                    self.errors
                                        .push(Error::Mismatch(Ty::Bool, body_ty, body.span));
                                }
                            }
                            if let Some(alt) = &range.alt {
                                let alt_ty = self.check_expr(alt);
                                if !alt_ty.is_bool() {
                                    self.errors.push(Error::Mismatch(Ty::Bool, alt_ty, alt.span));
                                }
                            }
                            Ty::Bool
                        }
                    }
                }
                CompSpec::Splice(name) => {
                    self.errors
                        .push(Error::NotValue(name.name.to_string(), name.span));
                    Ty::Err
                }
            },
            ExprKind::Paren(inner) => self.check_expr(inner),
        }
    }

    fn infer_index(&mut self, name: &qsolc_ast::ast::Ident, args: &[Expr]) -> Ty {
        let arg_tys: Vec<Ty> = args.iter().map(|arg| self.check_expr(arg)).collect();

        let Some(Res::Param(decl)) = self.names.get(name.id) else {
            // Reading a non-parameter with brackets is reported by the validator.
            return Ty::Err;
        };
        let Some(sig) = self.params.get(decl).cloned() else {
            return Ty::Err;
        };

        if sig.index.is_empty() {
            // Scalar parameter read with brackets; the validator reports this.
            return Ty::Err;
        }
        if sig.index.len() != args.len() {
            self.errors.push(Error::Arity(
                name.name.to_string(),
                sig.index.len(),
                args.len(),
                name.span,
            ));
            return sig.ty;
        }
        for ((expected_set, arg), arg_ty) in sig.index.iter().zip(args).zip(&arg_tys) {
            let expected = Ty::Elem(Rc::clone(expected_set));
            if !compatible(&expected, arg_ty) {
                self.errors
                    .push(Error::Mismatch(expected, arg_ty.clone(), arg.span));
            }
        }
        sig.ty
    }

    fn infer_method(&mut self, call: &qsolc_ast::ast::MethodCall) -> Ty {
        let arg_tys: Vec<Ty> = call.args.iter().map(|arg| self.check_expr(arg)).collect();

        let Some(Res::Find(decl)) = self.names.get(call.target.id) else {
            self.errors.push(Error::NotValue(
                call.target.name.to_string(),
                call.target.span,
            ));
            return Ty::Err;
        };
        let Some(sig) = self.finds.get(decl).cloned() else {
            return Ty::Err;
        };

        let (expected_args, method) = match &sig {
            FindSig::Subset(set) => (vec![Ty::Elem(Rc::clone(set))], "has"),
            FindSig::Mapping(dom, cod) => (
                vec![Ty::Elem(Rc::clone(dom)), Ty::Elem(Rc::clone(cod))],
                "is",
            ),
        };

        if call.name.name.as_ref() != method {
            self.errors.push(Error::NoMethod(
                call.target.name.to_string(),
                call.name.name.to_string(),
                call.name.span,
            ));
            return Ty::Err;
        }
        if call.args.len() != expected_args.len() {
            self.errors.push(Error::Arity(
                format!("{}.{}", call.target.name, call.name.name),
                expected_args.len(),
                call.args.len(),
                call.span,
            ));
            return Ty::Bool;
        }
        for ((expected, arg), arg_ty) in expected_args.iter().zip(&*call.args).zip(&arg_tys) {
            if !compatible(expected, arg_ty) {
                self.errors
                    .push(Error::Mismatch(expected.clone(), arg_ty.clone(), arg.span));
            }
        }
        Ty::Bool
    }

    fn infer_binop(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Ty {
        let lhs_ty = self.check_expr(lhs);
        let rhs_ty = self.check_expr(rhs);
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                if !lhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, lhs_ty.clone(), lhs.span));
                }
                if !rhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, rhs_ty.clone(), rhs.span));
                }
                if lhs_ty == Ty::Int && rhs_ty == Ty::Int {
                    Ty::Int
                } else {
                    Ty::Real
                }
            }
            BinOp::Div => {
                if !lhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, lhs_ty.clone(), lhs.span));
                }
                if !rhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, rhs_ty.clone(), rhs.span));
                }
                Ty::Real
            }
            BinOp::And | BinOp::Or | BinOp::Implies => {
                if !lhs_ty.is_bool() {
                    self.errors
                        .push(Error::Mismatch(Ty::Bool, lhs_ty.clone(), lhs.span));
                }
                if !rhs_ty.is_bool() {
                    self.errors
                        .push(Error::Mismatch(Ty::Bool, rhs_ty.clone(), rhs.span));
                }
                Ty::Bool
            }
            BinOp::Eq | BinOp::Ne => {
                let ok = (lhs_ty.is_numeric() && rhs_ty.is_numeric())
                    || (lhs_ty.is_bool() && rhs_ty.is_bool())
                    || matches!((&lhs_ty, &rhs_ty), (Ty::Elem(a), Ty::Elem(b)) if a == b)
                    || lhs_ty == Ty::Err
                    || rhs_ty == Ty::Err;
                if !ok {
                    self.errors.push(Error::CmpOperands(
                        if op == BinOp::Eq { "=" } else { "!=" },
                        span,
                    ));
                }
                Ty::Bool
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if !lhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, lhs_ty.clone(), lhs.span));
                }
                if !rhs_ty.is_numeric() {
                    self.errors
                        .push(Error::Mismatch(Ty::Real, rhs_ty.clone(), rhs.span));
                }
                Ty::Bool
            }
        }
    }
}

/// Whether a value of type `actual` can be used where `expected` is required. `Int`
/// coerces to `Real`; `Err` is compatible with everything.
fn compatible(expected: &Ty, actual: &Ty) -> bool {
    match (expected, actual) {
        (Ty::Err, _) | (_, Ty::Err) => true,
        (Ty::Real, Ty::Int) => true,
        _ => expected == actual,
    }
}

/// The least upper bound of two branch types, if they agree.
fn join(a: &Ty, b: &Ty) -> Option<Ty> {
    match (a, b) {
        (Ty::Err, other) | (other, Ty::Err) => Some(other.clone()),
        (Ty::Int, Ty::Int) => Some(Ty::Int),
        (Ty::Int | Ty::Real, Ty::Int | Ty::Real) => Some(Ty::Real),
        (Ty::Bool, Ty::Bool) => Some(Ty::Bool),
        (Ty::Elem(x), Ty::Elem(y)) if x == y => Some(Ty::Elem(Rc::clone(x))),
        _ => None,
    }
}
