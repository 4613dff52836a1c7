// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The lowerer turns a desugared, typed AST into Kernel IR. Comparisons are
//! canonicalized to `<`, `<=`, and `=` (rewriting `>`, `>=` by swapping operands and
//! `!=` through negation, matching the backend's tolerance policy), `maximize E`
//! becomes `minimize -E`, and parentheses are flattened away.


use qsolc_ast::ast::{
    AggOp, BinOp, CompSpec, DeclKind, Expr, ExprKind, FindTyKind, ItemKind, Lit, ObjDir, Program,
    Strength, UnOp, ValueTy,
};
use qsolc_frontend::resolve::{Names, Res};
use qsolc_kir::kir::{
    CmpOp, ConstValue, Constraint, Expr as KExpr, ExprKind as KExprKind, FindDef, FindKind,
    KernelProblem, ParamDef, ParamTy, SetDef, WeightKind,
};
use std::rc::Rc;

/// Lowers every problem in the program. The program must have passed the front end and
/// the desugarer; sugared or unelaborated nodes are compiler invariants here.
#[must_use]
pub fn lower(program: &Program, names: &Names) -> Vec<KernelProblem> {
    let lowerer = Lowerer { names };
    program
        .items
        .iter()
        .filter_map(|item| match &*item.kind {
            ItemKind::Problem(problem) => Some(lowerer.lower_problem(problem)),
            _ => None,
        })
        .collect()
}

struct Lowerer<'a> {
    names: &'a Names,
}

impl Lowerer<'_> {
    fn lower_problem(&self, problem: &qsolc_ast::ast::ProblemDef) -> KernelProblem {
        let mut sets = Vec::new();
        let mut params = Vec::new();
        let mut finds = Vec::new();
        let mut constraints = Vec::new();
        let mut objective = None;

        for decl in &*problem.decls {
            match &*decl.kind {
                DeclKind::Set(names) => {
                    sets.extend(names.iter().map(|name| SetDef {
                        name: Rc::clone(&name.name),
                        span: name.span,
                    }));
                }
                DeclKind::Param(param) => params.push(ParamDef {
                    name: Rc::clone(&param.name.name),
                    index: param.index.iter().map(|set| Rc::clone(&set.name)).collect(),
                    ty: match &param.ty {
                        ValueTy::Bool => ParamTy::Bool,
                        ValueTy::Int(bounds) => ParamTy::Int(*bounds),
                        ValueTy::Real => ParamTy::Real,
                        ValueTy::Elem(set) => ParamTy::Elem(Rc::clone(&set.name)),
                    },
                    default: param.default.as_ref().map(const_value),
                    span: param.span,
                }),
                DeclKind::Find(find) => finds.push(FindDef {
                    name: Rc::clone(&find.name.name),
                    kind: match &find.ty.kind {
                        FindTyKind::Subset(set) => FindKind::Subset(Rc::clone(&set.name)),
                        FindTyKind::Mapping(dom, cod) => {
                            FindKind::Mapping(Rc::clone(&dom.name), Rc::clone(&cod.name))
                        }
                        FindTyKind::Custom(..) => {
                            unreachable!("custom finds should be removed by elaboration")
                        }
                    },
                    span: find.span,
                }),
                DeclKind::Constraint(constraint) => {
                    assert!(
                        constraint.guard.is_none(),
                        "guards should be folded by the desugarer"
                    );
                    constraints.push(Constraint {
                        weight: match constraint.strength {
                            Strength::Must => WeightKind::Hard,
                            Strength::Should => WeightKind::Should,
                            Strength::Nice => WeightKind::Nice,
                        },
                        expr: self.lower_expr(&constraint.expr),
                        span: constraint.span,
                    });
                }
                DeclKind::Objective(obj) => {
                    let expr = self.lower_expr(&obj.expr);
                    let expr = match obj.dir {
                        ObjDir::Minimize => expr,
                        ObjDir::Maximize => KExpr {
                            span: expr.span,
                            kind: KExprKind::Neg(Box::new(expr)),
                        },
                    };
                    objective = Some(expr);
                }
            }
        }

        KernelProblem {
            name: Rc::clone(&problem.name.name),
            sets,
            params,
            finds,
            constraints,
            objective,
        }
    }

    fn lower_expr(&self, expr: &Expr) -> KExpr {
        let span = expr.span;
        let kind = match &*expr.kind {
            ExprKind::Lit(Lit::Bool(value)) => KExprKind::Bool(*value),
            #[allow(clippy::cast_precision_loss)]
            ExprKind::Lit(Lit::Int(value)) => KExprKind::Num(*value as f64),
            ExprKind::Lit(Lit::Real(value)) => KExprKind::Num(*value),
            ExprKind::Name(name) => match self.names.get(name.id) {
                Some(Res::Iter(..)) => KExprKind::Iter(Rc::clone(&name.name)),
                Some(Res::Param(_)) => KExprKind::Param(Rc::clone(&name.name), Vec::new()),
                _ => unreachable!("names should be resolved before lowering"),
            },
            ExprKind::Index(name, args) => KExprKind::Param(
                Rc::clone(&name.name),
                args.iter().map(|arg| self.lower_expr(arg)).collect(),
            ),
            ExprKind::Size(set) => KExprKind::Size(Rc::clone(&set.name)),
            ExprKind::Method(call) => {
                let find = Rc::clone(&call.target.name);
                match call.name.name.as_ref() {
                    "has" => KExprKind::Has(find, Box::new(self.lower_expr(&call.args[0]))),
                    "is" => KExprKind::Is(
                        find,
                        Box::new(self.lower_expr(&call.args[0])),
                        Box::new(self.lower_expr(&call.args[1])),
                    ),
                    _ => unreachable!("view methods should be inlined by elaboration"),
                }
            }
            ExprKind::Call(..) => unreachable!("macro calls should be inlined by elaboration"),
            ExprKind::UnOp(UnOp::Neg, operand) => {
                KExprKind::Neg(Box::new(self.lower_expr(operand)))
            }
            ExprKind::UnOp(UnOp::Not, operand) => {
                KExprKind::Not(Box::new(self.lower_expr(operand)))
            }
            ExprKind::BinOp(op, lhs, rhs) => {
                let lhs = self.lower_expr(lhs);
                let rhs = self.lower_expr(rhs);
                match op {
                    BinOp::Add => KExprKind::Add(Box::new(lhs), Box::new(rhs)),
                    BinOp::Sub => KExprKind::Sub(Box::new(lhs), Box::new(rhs)),
                    BinOp::Mul => KExprKind::Mul(Box::new(lhs), Box::new(rhs)),
                    BinOp::Div => KExprKind::Div(Box::new(lhs), Box::new(rhs)),
                    BinOp::And => KExprKind::And(Box::new(lhs), Box::new(rhs)),
                    BinOp::Or => KExprKind::Or(Box::new(lhs), Box::new(rhs)),
                    BinOp::Implies => KExprKind::Implies(Box::new(lhs), Box::new(rhs)),
                    BinOp::Eq => KExprKind::Cmp(CmpOp::Eq, Box::new(lhs), Box::new(rhs)),
                    BinOp::Ne => KExprKind::Not(Box::new(KExpr {
                        span,
                        kind: KExprKind::Cmp(CmpOp::Eq, Box::new(lhs), Box::new(rhs)),
                    })),
                    BinOp::Lt => KExprKind::Cmp(CmpOp::Lt, Box::new(lhs), Box::new(rhs)),
                    BinOp::Le => KExprKind::Cmp(CmpOp::Le, Box::new(lhs), Box::new(rhs)),
                    // `a > b` and `a >= b` are stored with swapped operands.
                    BinOp::Gt => KExprKind::Cmp(CmpOp::Lt, Box::new(rhs), Box::new(lhs)),
                    BinOp::Ge => KExprKind::Cmp(CmpOp::Le, Box::new(rhs), Box::new(lhs)),
                }
            }
            ExprKind::If(cond, then, alt) => KExprKind::Ite(
                Box::new(self.lower_expr(cond)),
                Box::new(self.lower_expr(then)),
                Box::new(self.lower_expr(alt)),
            ),
            ExprKind::Quant(quant) => {
                let body = Box::new(self.lower_expr(&quant.body));
                let iter = Rc::clone(&quant.iter.name);
                let set = Rc::clone(&quant.set.name);
                match quant.quant {
                    qsolc_ast::ast::Quant::Forall => KExprKind::Forall { iter, set, body },
                    qsolc_ast::ast::Quant::Exists => KExprKind::Exists { iter, set, body },
                }
            }
            ExprKind::Agg(agg) => {
                assert!(
                    agg.op == AggOp::Sum,
                    "count/any/all should be rewritten by the desugarer"
                );
                let CompSpec::Range(range) = &agg.comp else {
                    unreachable!("splices should be substituted by elaboration")
                };
                assert!(
                    range.cond.is_none() && range.alt.is_none(),
                    "filtered sums should be rewritten by the desugarer"
                );
                let body = range.body.as_ref().expect("sum should have a body");
                KExprKind::Sum {
                    iter: Rc::clone(&range.iter.name),
                    set: Rc::clone(&range.set.name),
                    body: Box::new(self.lower_expr(body)),
                }
            }
            ExprKind::Paren(inner) => return self.lower_expr(inner),
            ExprKind::Err => unreachable!("parse errors should stop the pipeline"),
        };

        KExpr { span, kind }
    }
}

#[allow(clippy::cast_precision_loss)]
fn const_value(expr: &Expr) -> ConstValue {
    match &*expr.kind {
        ExprKind::Lit(Lit::Bool(value)) => ConstValue::Bool(*value),
        ExprKind::Lit(Lit::Int(value)) => ConstValue::Num(*value as f64),
        ExprKind::Lit(Lit::Real(value)) => ConstValue::Num(*value),
        ExprKind::UnOp(UnOp::Neg, inner) => match const_value(inner) {
            ConstValue::Num(value) => ConstValue::Num(-value),
            ConstValue::Bool(_) => ConstValue::Bool(false),
        },
        _ => ConstValue::Num(0.0),
    }
}
