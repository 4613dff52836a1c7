// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Name resolution binds every identifier in the elaborated program to its declaration.
//! Problems declare sets, parameters, and finds in a single scope; quantifiers and
//! aggregates push inner scopes that bind their iterator. Declarations must precede use.


use miette::Diagnostic;
use qsolc_ast::ast::{
    CallArg, CompRange, Constraint, Decl, DeclKind, Expr, ExprKind, FindTyKind, Ident, ItemKind,
    NodeId, ProblemDef, Program, ValueTy,
};
use qsolc_data_structures::{index_map::IndexMap, span::Span};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use thiserror::Error;

/// Maps identifier node ids (both uses and binders) to their resolutions.
pub type Names = IndexMap<NodeId, Res>;

/// A resolution: what an identifier refers to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Res {
    /// A declared set.
    Set(Rc<str>),
    /// A parameter; the id is the declaration's name node.
    Param(NodeId),
    /// A find; the id is the declaration's name node.
    Find(NodeId),
    /// An iterator; the id is the binder's name node and the string is the set iterated
    /// over.
    Iter(NodeId, Rc<str>),
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("`{0}` not found in this scope")]
    #[diagnostic(code("QSOL2001"))]
    NotFound(String, #[label("not found")] Span),

    #[error("duplicate declaration of `{0}`")]
    #[diagnostic(code("QSOL2002"))]
    Duplicate(String, #[label("redeclared here")] Span),
}

/// Resolves every name in the program, returning the name table and any errors.
#[must_use]
pub fn resolve(program: &Program) -> (Names, Vec<Error>) {
    let mut resolver = Resolver {
        names: Names::new(),
        globals: FxHashMap::default(),
        locals: Vec::new(),
        errors: Vec::new(),
    };

    let mut problem_names: FxHashMap<Rc<str>, ()> = FxHashMap::default();
    for item in &*program.items {
        if let ItemKind::Problem(problem) = &*item.kind {
            if problem_names
                .insert(Rc::clone(&problem.name.name), ())
                .is_some()
            {
                resolver.errors.push(Error::Duplicate(
                    problem.name.name.to_string(),
                    problem.name.span,
                ));
            }
            resolver.globals.clear();
            resolver.visit_problem(problem);
        }
    }

    (resolver.names, resolver.errors)
}

struct Resolver {
    names: Names,
    globals: FxHashMap<Rc<str>, Res>,
    locals: Vec<FxHashMap<Rc<str>, Res>>,
    errors: Vec<Error>,
}

impl Resolver {
    fn visit_problem(&mut self, problem: &ProblemDef) {
        for decl in &*problem.decls {
            self.visit_decl(decl);
        }
    }

    fn visit_decl(&mut self, decl: &Decl) {
        match &*decl.kind {
            DeclKind::Set(names) => {
                for name in &**names {
                    self.declare(name, Res::Set(Rc::clone(&name.name)));
                }
            }
            DeclKind::Param(param) => {
                for set in &*param.index {
                    self.resolve_set(set);
                }
                if let ValueTy::Elem(set) = &param.ty {
                    self.resolve_set(set);
                }
                if let Some(default) = &param.default {
                    self.visit_expr(default);
                }
                self.declare(&param.name, Res::Param(param.name.id));
            }
            DeclKind::Find(find) => {
                match &find.ty.kind {
                    FindTyKind::Subset(set) => self.resolve_set(set),
                    FindTyKind::Mapping(dom, cod) => {
                        self.resolve_set(dom);
                        self.resolve_set(cod);
                    }
                    FindTyKind::Custom(name, _) => {
                        // Custom finds should have been removed by elaboration; treat a
                        // leftover as an unresolved name.
                        self.errors
                            .push(Error::NotFound(name.name.to_string(), name.span));
                    }
                }
                self.declare(&find.name, Res::Find(find.name.id));
            }
            DeclKind::Constraint(constraint) => self.visit_constraint(constraint),
            DeclKind::Objective(objective) => self.visit_expr(&objective.expr),
        }
    }

    fn visit_constraint(&mut self, constraint: &Constraint) {
        self.visit_expr(&constraint.expr);
        if let Some(guard) = &constraint.guard {
            self.visit_expr(guard);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &*expr.kind {
            ExprKind::Lit(_) | ExprKind::Err => {}
            ExprKind::Name(name) => self.resolve_use(name),
            ExprKind::Size(set) => self.resolve_use(set),
            ExprKind::Index(name, args) => {
                self.resolve_use(name);
                for arg in &**args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Method(call) => {
                self.resolve_use(&call.target);
                for arg in &*call.args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Call(name, args) => {
                self.resolve_use(name);
                for arg in &**args {
                    match arg {
                        CallArg::Expr(expr) => self.visit_expr(expr),
                        CallArg::Comp(comp) => {
                            self.resolve_set(&comp.set);
                            self.with_iter(&comp.iter, &comp.set, |resolver| {
                                resolver.visit_expr(&comp.body);
                                if let Some(cond) = &comp.cond {
                                    resolver.visit_expr(cond);
                                }
                                if let Some(alt) = &comp.alt {
                                    resolver.visit_expr(alt);
                                }
                            });
                        }
                    }
                }
            }
            ExprKind::UnOp(_, operand) => self.visit_expr(operand),
            ExprKind::BinOp(_, lhs, rhs) => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            ExprKind::If(cond, then, alt) => {
                self.visit_expr(cond);
                self.visit_expr(then);
                self.visit_expr(alt);
            }
            ExprKind::Quant(quant) => {
                self.resolve_set(&quant.set);
                self.with_iter(&quant.iter, &quant.set, |resolver| {
                    resolver.visit_expr(&quant.body);
                });
            }
            ExprKind::Agg(agg) => match &agg.comp {
                qsolc_ast::ast::CompSpec::Range(range) => self.visit_range(range),
                qsolc_ast::ast::CompSpec::Splice(name) => self.resolve_use(name),
            },
            ExprKind::Paren(inner) => self.visit_expr(inner),
        }
    }

    fn visit_range(&mut self, range: &CompRange) {
        self.resolve_set(&range.set);
        self.with_iter(&range.iter, &range.set, |resolver| {
            if let Some(body) = &range.body {
                resolver.visit_expr(body);
            }
            if let Some(cond) = &range.cond {
                resolver.visit_expr(cond);
            }
            if let Some(alt) = &range.alt {
                resolver.visit_expr(alt);
            }
        });
    }

    fn with_iter(&mut self, iter: &Ident, set: &Ident, f: impl FnOnce(&mut Self)) {
        let res = Res::Iter(iter.id, Rc::clone(&set.name));
        self.names.insert(iter.id, res.clone());
        let mut scope = FxHashMap::default();
        scope.insert(Rc::clone(&iter.name), res);
        self.locals.push(scope);
        f(self);
        self.locals.pop();
    }

    /// Declares a name in the problem scope, failing on duplicates in the same scope.
    fn declare(&mut self, name: &Ident, res: Res) {
        if self.globals.contains_key(name.name.as_ref()) {
            self.errors
                .push(Error::Duplicate(name.name.to_string(), name.span));
            return;
        }
        self.names.insert(name.id, res.clone());
        self.globals.insert(Rc::clone(&name.name), res);
    }

    /// Resolves a name that must refer to a declared set.
    fn resolve_set(&mut self, set: &Ident) {
        match self.globals.get(set.name.as_ref()) {
            Some(res @ Res::Set(_)) => self.names.insert(set.id, res.clone()),
            Some(_) | None => self
                .errors
                .push(Error::NotFound(set.name.to_string(), set.span)),
        }
    }

    /// Resolves a name against the iterator scopes and then the problem scope.
    fn resolve_use(&mut self, name: &Ident) {
        for scope in self.locals.iter().rev() {
            if let Some(res) = scope.get(name.name.as_ref()) {
                self.names.insert(name.id, res.clone());
                return;
            }
        }
        match self.globals.get(name.name.as_ref()) {
            Some(res) => self.names.insert(name.id, res.clone()),
            None => self
                .errors
                .push(Error::NotFound(name.name.to_string(), name.span)),
        }
    }
}
