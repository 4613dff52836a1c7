// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Cross-cutting checks that are easier after typing: scalar vs indexed parameter
//! usage, defaults on `Elem` parameters, the single-objective rule, and `size` over a
//! declared set.


use crate::{
    resolve::{Names, Res},
    typeck::{self, Table},
};
use miette::Diagnostic;
use qsolc_ast::{
    ast::{DeclKind, Expr, ExprKind, ItemKind, Program, ValueTy},
    visit::{self, Visitor},
};
use qsolc_data_structures::span::Span;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("indexed parameter `{0}` must be read with brackets")]
    #[diagnostic(code("QSOL2101"))]
    #[diagnostic(help("write `{0}[i, ...]` with one index per declared set"))]
    MissingIndex(String, #[label] Span),

    #[error("scalar parameter `{0}` does not take indices")]
    #[diagnostic(code("QSOL2101"))]
    UnexpectedIndex(String, #[label] Span),

    #[error("`{0}` cannot be indexed")]
    #[diagnostic(code("QSOL2101"))]
    NotIndexable(String, #[label] Span),

    #[error("`{0}` is not callable")]
    #[diagnostic(code("QSOL2101"))]
    #[diagnostic(help("parameters are read as `Name` or `Name[i, ...]`, never called"))]
    NotCallable(String, #[label] Span),

    #[error("`Elem` parameter `{0}` may not declare a default")]
    #[diagnostic(code("QSOL2101"))]
    ElemDefault(String, #[label] Span),

    #[error("default value of `{0}` must be a literal constant")]
    #[diagnostic(code("QSOL2101"))]
    NonConstDefault(String, #[label] Span),

    #[error("problem `{0}` declares more than one objective")]
    #[diagnostic(code("QSOL2101"))]
    MultipleObjectives(String, #[label("second objective here")] Span),

    #[error("`size` requires a declared set name")]
    #[diagnostic(code("QSOL2101"))]
    SizeArg(#[label] Span),
}

/// Validates the typed program.
#[must_use]
pub fn validate(program: &Program, names: &Names, _tys: &Table) -> Vec<Error> {
    let (params, _) = typeck::signatures(program);
    let mut validator = Validator {
        names,
        params,
        errors: Vec::new(),
    };

    for item in &*program.items {
        if let ItemKind::Problem(problem) = &*item.kind {
            let mut objective: Option<Span> = None;
            for decl in &*problem.decls {
                match &*decl.kind {
                    DeclKind::Param(param) => {
                        if matches!(param.ty, ValueTy::Elem(_)) && param.default.is_some() {
                            validator.errors.push(Error::ElemDefault(
                                param.name.name.to_string(),
                                param.span,
                            ));
                        }
                        if let Some(default) = &param.default {
                            if !is_const(default) {
                                validator.errors.push(Error::NonConstDefault(
                                    param.name.name.to_string(),
                                    default.span,
                                ));
                            }
                        }
                    }
                    DeclKind::Objective(obj) => {
                        if objective.is_some() {
                            validator.errors.push(Error::MultipleObjectives(
                                problem.name.name.to_string(),
                                obj.span,
                            ));
                        } else {
                            objective = Some(obj.span);
                        }
                    }
                    _ => {}
                }
            }
            visit::walk_problem_def(&mut validator, problem);
        }
    }

    validator.errors
}

fn is_const(expr: &Expr) -> bool {
    match &*expr.kind {
        ExprKind::Lit(_) => true,
        ExprKind::UnOp(qsolc_ast::ast::UnOp::Neg, inner) => is_const(inner),
        _ => false,
    }
}

struct Validator<'a> {
    names: &'a Names,
    params: rustc_hash::FxHashMap<qsolc_ast::ast::NodeId, typeck::ParamSig>,
    errors: Vec<Error>,
}

impl<'a> Visitor<'a> for Validator<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        match &*expr.kind {
            ExprKind::Name(name) => {
                if let Some(Res::Param(decl)) = self.names.get(name.id) {
                    if self
                        .params
                        .get(decl)
                        .is_some_and(|sig| !sig.index.is_empty())
                    {
                        self.errors
                            .push(Error::MissingIndex(name.name.to_string(), name.span));
                    }
                }
            }
            ExprKind::Index(name, _) => match self.names.get(name.id) {
                Some(Res::Param(decl)) => {
                    if self.params.get(decl).is_some_and(|sig| sig.index.is_empty()) {
                        self.errors
                            .push(Error::UnexpectedIndex(name.name.to_string(), name.span));
                    }
                }
                Some(_) => {
                    self.errors
                        .push(Error::NotIndexable(name.name.to_string(), name.span));
                }
                None => {}
            },
            ExprKind::Call(name, _) => {
                // Macro calls were inlined by elaboration; anything left is a
                // misused parameter or find.
                if self.names.get(name.id).is_some() {
                    self.errors
                        .push(Error::NotCallable(name.name.to_string(), name.span));
                }
            }
            ExprKind::Size(set) => {
                if !matches!(self.names.get(set.id), Some(Res::Set(_)) | None) {
                    self.errors.push(Error::SizeArg(set.span));
                }
            }
            _ => {}
        }
        visit::walk_expr(self, expr);
    }
}
