// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Elaboration rewrites user-defined unknowns and predicate/function macros away,
//! leaving a program over primitive finds only.
//!
//! A `find X : MyUnknown(A)` is replaced by the unknown's `rep` finds (mangled
//! `X$rep`), its `laws` are instantiated as fresh `must` constraints on the enclosing
//! problem, and every method call through the unknown's `view` is inlined. Macro calls
//! are inlined by substituting formals with actual arguments; comprehension-shaped
//! arguments are substituted as unexpanded trees into aggregate splice positions.
//!
//! Elaboration runs to a fixed point, since one expansion may reveal calls to other
//! macros or unknowns. The expansion depth is bounded; definitions that recurse into
//! themselves exhaust the bound and are reported as `QSOL2101`.

#[cfg(test)]
mod tests;

use miette::Diagnostic;
use qsolc_ast::{
    assigner::Assigner,
    ast::{
        CallArg, CompArg, CompRange, CompSpec, Constraint, Decl, DeclKind, Expr, ExprKind,
        FindDecl, FindTy, FindTyKind, FormalKind, Ident, ItemKind, MacroDef, NodeId, ProblemDef,
        Program, Strength, UnknownDef,
    },
    mut_visit::{self, MutVisitor},
};
use qsolc_data_structures::span::Span;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use thiserror::Error;

const MAX_DEPTH: u32 = 64;

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("duplicate definition of `{0}`")]
    #[diagnostic(code("QSOL2002"))]
    Duplicate(String, #[label("redefined here")] Span),

    #[error("`{0}` is not a known decision type")]
    #[diagnostic(code("QSOL2001"))]
    UndefinedUnknown(String, #[label("not found")] Span),

    #[error("unknown `{0}` expects {1} set arguments, found {2}")]
    #[diagnostic(code("QSOL2101"))]
    UnknownArity(String, usize, usize, #[label] Span),

    #[error("`{0}` has no view member `{1}`")]
    #[diagnostic(code("QSOL2101"))]
    UndefinedView(String, String, #[label("not a view member")] Span),

    #[error("macro `{0}` expects {1} arguments, found {2}")]
    #[diagnostic(code("QSOL2101"))]
    MacroArity(String, usize, usize, #[label] Span),

    #[error("argument to `{0}` does not match its declared kind")]
    #[diagnostic(code("QSOL2101"))]
    #[diagnostic(help("`Comp(...)` formals require a `body for x in S` argument; other formals require a plain expression"))]
    BadArgument(String, #[label] Span),

    #[error("elaboration did not terminate; definitions are cyclic or nested too deeply")]
    #[diagnostic(code("QSOL2101"))]
    TooDeep(#[label] Span),
}

/// Expands every user-defined unknown and macro in the program. On success the program
/// contains only `problem` items over primitive finds.
#[must_use]
pub fn elaborate(program: &mut Program, assigner: &mut Assigner) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut macros: FxHashMap<Rc<str>, MacroDef> = FxHashMap::default();
    let mut unknowns: FxHashMap<Rc<str>, UnknownDef> = FxHashMap::default();

    for item in &*program.items {
        match &*item.kind {
            ItemKind::Predicate(def) | ItemKind::Function(def) => {
                if macros
                    .insert(Rc::clone(&def.name.name), (**def).clone())
                    .is_some()
                {
                    errors.push(Error::Duplicate(def.name.name.to_string(), def.name.span));
                }
            }
            ItemKind::Unknown(def) => {
                if unknowns
                    .insert(Rc::clone(&def.name.name), (**def).clone())
                    .is_some()
                {
                    errors.push(Error::Duplicate(def.name.name.to_string(), def.name.span));
                }
            }
            ItemKind::Use(_) | ItemKind::Problem(_) => {}
        }
    }

    let mut fresh = FreshNames::default();
    let items = std::mem::take(&mut program.items).into_vec();
    let mut kept = Vec::new();
    for mut item in items {
        if let ItemKind::Problem(problem) = &mut *item.kind {
            elaborate_problem(problem, &macros, &unknowns, &mut fresh, &mut errors);
            kept.push(item);
        }
    }
    program.items = kept.into_boxed_slice();

    assigner.visit_program(program);
    errors
}

fn elaborate_problem(
    problem: &mut ProblemDef,
    macros: &FxHashMap<Rc<str>, MacroDef>,
    unknowns: &FxHashMap<Rc<str>, UnknownDef>,
    fresh: &mut FreshNames,
    errors: &mut Vec<Error>,
) {
    let mut depth = 0;
    loop {
        let before = errors.len();
        let mut changed = expand_custom_finds(problem, unknowns, fresh, errors);
        changed |= inline_macro_calls(problem, macros, fresh, errors);
        if errors.len() > before {
            break;
        }
        if !changed {
            break;
        }
        depth += 1;
        if depth > MAX_DEPTH {
            errors.push(Error::TooDeep(problem.name.span));
            break;
        }
    }
}

/// Replaces each `find X : Custom(...)` with the unknown's rep finds, instantiates its
/// laws as `must` constraints, and rewrites view calls on `X` throughout the problem.
fn expand_custom_finds(
    problem: &mut ProblemDef,
    unknowns: &FxHashMap<Rc<str>, UnknownDef>,
    fresh: &mut FreshNames,
    errors: &mut Vec<Error>,
) -> bool {
    // Collect this round's custom finds and their instantiation maps.
    let mut instances: Vec<Instance> = Vec::new();
    let mut new_decls: Vec<Decl> = Vec::new();
    let mut changed = false;

    for decl in std::mem::take(&mut problem.decls).into_vec() {
        let DeclKind::Find(find) = &*decl.kind else {
            new_decls.push(decl);
            continue;
        };
        let FindTyKind::Custom(ty_name, args) = &find.ty.kind else {
            new_decls.push(decl);
            continue;
        };

        let Some(def) = unknowns.get(ty_name.name.as_ref()) else {
            errors.push(Error::UndefinedUnknown(
                ty_name.name.to_string(),
                ty_name.span,
            ));
            new_decls.push(decl.clone());
            continue;
        };
        if def.ty_params.len() != args.len() {
            errors.push(Error::UnknownArity(
                ty_name.name.to_string(),
                def.ty_params.len(),
                args.len(),
                find.ty.span,
            ));
            new_decls.push(decl.clone());
            continue;
        }

        changed = true;

        // Type parameters map to the actual set names; rep finds are mangled with the
        // declared find's name so instantiations cannot collide.
        let mut rename = FxHashMap::default();
        for (param, arg) in def.ty_params.iter().zip(args.iter()) {
            rename.insert(Rc::clone(&param.name), Rc::clone(&arg.name));
        }
        for rep in &*def.rep {
            let mangled: Rc<str> = format!("{}${}", find.name.name, rep.name.name).into();
            rename.insert(Rc::clone(&rep.name.name), mangled);
        }

        // Substitute the rep finds in place of the custom find.
        for rep in &*def.rep {
            let mangled = Rc::clone(
                rename
                    .get(rep.name.name.as_ref())
                    .expect("rep name should be in rename map"),
            );
            let mut ty = rep.ty.clone();
            clear_find_ty_ids(&mut ty);
            rename_find_ty(&mut ty, &rename);
            new_decls.push(Decl {
                id: NodeId::default(),
                span: decl.span,
                kind: Box::new(DeclKind::Find(Box::new(FindDecl {
                    span: decl.span,
                    name: Ident {
                        id: NodeId::default(),
                        span: find.name.span,
                        name: mangled,
                    },
                    ty,
                }))),
            });
        }

        instances.push(Instance {
            find_name: Rc::clone(&find.name.name),
            def: def.clone(),
            rename,
        });
    }

    // Instantiate laws as hard constraints appended to the problem.
    for instance in &instances {
        for law in &*instance.def.laws {
            let mut law = fresh_tree(law);
            fresh.freshen_expr(&mut law);
            let subst = Subst {
                rename: &instance.rename,
                replace: &FxHashMap::default(),
                splice: &FxHashMap::default(),
            };
            apply_subst(&mut law, &subst);
            new_decls.push(Decl {
                id: NodeId::default(),
                span: law.span,
                kind: Box::new(DeclKind::Constraint(Box::new(Constraint {
                    span: law.span,
                    strength: Strength::Must,
                    expr: law,
                    guard: None,
                }))),
            });
        }
    }

    problem.decls = new_decls.into_boxed_slice();

    // Rewrite view calls on the expanded finds everywhere in the problem.
    if !instances.is_empty() {
        let mut views: FxHashMap<Rc<str>, &Instance> = FxHashMap::default();
        for instance in &instances {
            views.insert(Rc::clone(&instance.find_name), instance);
        }

        for_each_expr(problem, &mut |expr| {
            rewrite_views(expr, &views, fresh, errors);
        });
    }

    changed
}

/// A custom find together with the substitutions its expansion introduced.
struct Instance {
    find_name: Rc<str>,
    def: UnknownDef,
    rename: FxHashMap<Rc<str>, Rc<str>>,
}

fn rewrite_views(
    expr: &mut Expr,
    views: &FxHashMap<Rc<str>, &Instance>,
    fresh: &mut FreshNames,
    errors: &mut Vec<Error>,
) {
    walk_expr_mut(expr, &mut |expr| {
        let ExprKind::Method(call) = &mut *expr.kind else {
            return;
        };
        let Some(instance) = views.get(call.target.name.as_ref()) else {
            return;
        };

        let Some(view) = instance
            .def
            .views
            .iter()
            .find(|view| view.name.name == call.name.name)
        else {
            errors.push(Error::UndefinedView(
                instance.def.name.name.to_string(),
                call.name.name.to_string(),
                call.name.span,
            ));
            return;
        };
        if view.params.len() != call.args.len() {
            errors.push(Error::MacroArity(
                call.name.name.to_string(),
                view.params.len(),
                call.args.len(),
                call.span,
            ));
            return;
        }

        let mut replace = FxHashMap::default();
        for (param, arg) in view.params.iter().zip(call.args.iter()) {
            replace.insert(Rc::clone(&param.name.name), fresh_tree(arg));
        }

        let mut body = fresh_tree(&view.body);
        fresh.freshen_expr(&mut body);
        let subst = Subst {
            rename: &instance.rename,
            replace: &replace,
            splice: &FxHashMap::default(),
        };
        apply_subst(&mut body, &subst);
        body.span = expr.span;
        *expr = body;
    });
}

/// Inlines macro calls by substituting formals with actual arguments. Returns true if
/// any call was inlined.
fn inline_macro_calls(
    problem: &mut ProblemDef,
    macros: &FxHashMap<Rc<str>, MacroDef>,
    fresh: &mut FreshNames,
    errors: &mut Vec<Error>,
) -> bool {
    let mut changed = false;
    for_each_expr(problem, &mut |expr| {
        walk_expr_mut(expr, &mut |expr| {
            let ExprKind::Call(name, args) = &mut *expr.kind else {
                return;
            };
            let Some(def) = macros.get(name.name.as_ref()) else {
                // Not a macro; the resolver or validator reports this.
                return;
            };

            if def.params.len() != args.len() {
                errors.push(Error::MacroArity(
                    name.name.to_string(),
                    def.params.len(),
                    args.len(),
                    expr.span,
                ));
                return;
            }

            let mut replace: FxHashMap<Rc<str>, Expr> = FxHashMap::default();
            let mut splice: FxHashMap<Rc<str>, CompArg> = FxHashMap::default();
            for (param, arg) in def.params.iter().zip(args.iter()) {
                match (&param.kind, arg) {
                    (FormalKind::CompBool | FormalKind::CompReal, CallArg::Comp(comp)) => {
                        let mut comp = (**comp).clone();
                        clear_comp_ids(&mut comp);
                        splice.insert(Rc::clone(&param.name.name), comp);
                    }
                    (
                        FormalKind::Bool | FormalKind::Real | FormalKind::Elem(_),
                        CallArg::Expr(arg),
                    ) => {
                        replace.insert(Rc::clone(&param.name.name), fresh_tree(arg));
                    }
                    _ => {
                        errors.push(Error::BadArgument(
                            param.name.name.to_string(),
                            expr.span,
                        ));
                        return;
                    }
                }
            }

            let mut body = fresh_tree(&def.body);
            fresh.freshen_expr(&mut body);
            let subst = Subst {
                rename: &FxHashMap::default(),
                replace: &replace,
                splice: &splice,
            };
            apply_subst(&mut body, &subst);
            body.span = expr.span;
            *expr = body;
            changed = true;
        });
    });
    changed
}

/// Applies `f` to every expression owned by the problem's declarations.
fn for_each_expr(problem: &mut ProblemDef, f: &mut impl FnMut(&mut Expr)) {
    for decl in &mut *problem.decls {
        match &mut *decl.kind {
            DeclKind::Constraint(constraint) => {
                f(&mut constraint.expr);
                if let Some(guard) = &mut constraint.guard {
                    f(guard);
                }
            }
            DeclKind::Objective(objective) => f(&mut objective.expr),
            DeclKind::Param(param) => {
                if let Some(default) = &mut param.default {
                    f(default);
                }
            }
            DeclKind::Set(_) | DeclKind::Find(_) => {}
        }
    }
}

/// Post-order walk that lets the callback replace each expression node in place.
fn walk_expr_mut(expr: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    match &mut *expr.kind {
        ExprKind::Lit(_) | ExprKind::Name(_) | ExprKind::Size(_) | ExprKind::Err => {}
        ExprKind::Index(_, args) => {
            for arg in &mut **args {
                walk_expr_mut(arg, f);
            }
        }
        ExprKind::Method(call) => {
            for arg in &mut *call.args {
                walk_expr_mut(arg, f);
            }
        }
        ExprKind::Call(_, args) => {
            for arg in &mut **args {
                match arg {
                    CallArg::Expr(expr) => walk_expr_mut(expr, f),
                    CallArg::Comp(comp) => {
                        walk_expr_mut(&mut comp.body, f);
                        if let Some(cond) = &mut comp.cond {
                            walk_expr_mut(cond, f);
                        }
                        if let Some(alt) = &mut comp.alt {
                            walk_expr_mut(alt, f);
                        }
                    }
                }
            }
        }
        ExprKind::UnOp(_, operand) => walk_expr_mut(operand, f),
        ExprKind::BinOp(_, lhs, rhs) => {
            walk_expr_mut(lhs, f);
            walk_expr_mut(rhs, f);
        }
        ExprKind::If(cond, then, alt) => {
            walk_expr_mut(cond, f);
            walk_expr_mut(then, f);
            walk_expr_mut(alt, f);
        }
        ExprKind::Quant(quant) => walk_expr_mut(&mut quant.body, f),
        ExprKind::Agg(agg) => {
            if let CompSpec::Range(range) = &mut agg.comp {
                if let Some(body) = &mut range.body {
                    walk_expr_mut(body, f);
                }
                if let Some(cond) = &mut range.cond {
                    walk_expr_mut(cond, f);
                }
                if let Some(alt) = &mut range.alt {
                    walk_expr_mut(alt, f);
                }
            }
        }
        ExprKind::Paren(inner) => walk_expr_mut(inner, f),
    }
    f(expr);
}

struct Subst<'a> {
    rename: &'a FxHashMap<Rc<str>, Rc<str>>,
    replace: &'a FxHashMap<Rc<str>, Expr>,
    splice: &'a FxHashMap<Rc<str>, CompArg>,
}

/// Applies renames, formal replacements, and comprehension splices to a tree. The tree
/// must have been freshened first so its binders cannot capture substituted names.
fn apply_subst(expr: &mut Expr, subst: &Subst) {
    if let ExprKind::Name(name) = &*expr.kind {
        if let Some(replacement) = subst.replace.get(name.name.as_ref()) {
            let span = expr.span;
            *expr = fresh_tree(replacement);
            expr.span = span;
            return;
        }
    }

    if let ExprKind::Agg(agg) = &mut *expr.kind {
        if let CompSpec::Splice(name) = &agg.comp {
            if let Some(comp) = subst.splice.get(name.name.as_ref()) {
                let mut comp = comp.clone();
                clear_comp_ids(&mut comp);
                agg.comp = CompSpec::Range(Box::new(CompRange {
                    body: Some(comp.body),
                    iter: comp.iter,
                    set: comp.set,
                    cond: comp.cond,
                    alt: comp.alt,
                }));
                // The spliced comprehension is caller-side text; no further
                // substitution applies inside it.
                return;
            }
        }
    }

    match &mut *expr.kind {
        ExprKind::Lit(_) | ExprKind::Err => {}
        ExprKind::Name(name) | ExprKind::Size(name) => rename_ident(name, subst.rename),
        ExprKind::Index(name, args) => {
            rename_ident(name, subst.rename);
            for arg in &mut **args {
                apply_subst(arg, subst);
            }
        }
        ExprKind::Method(call) => {
            rename_ident(&mut call.target, subst.rename);
            for arg in &mut *call.args {
                apply_subst(arg, subst);
            }
        }
        ExprKind::Call(name, args) => {
            rename_ident(name, subst.rename);
            for arg in &mut **args {
                match arg {
                    CallArg::Expr(expr) => apply_subst(expr, subst),
                    CallArg::Comp(comp) => {
                        apply_subst(&mut comp.body, subst);
                        rename_ident(&mut comp.set, subst.rename);
                        if let Some(cond) = &mut comp.cond {
                            apply_subst(cond, subst);
                        }
                        if let Some(alt) = &mut comp.alt {
                            apply_subst(alt, subst);
                        }
                    }
                }
            }
        }
        ExprKind::UnOp(_, operand) => apply_subst(operand, subst),
        ExprKind::BinOp(_, lhs, rhs) => {
            apply_subst(lhs, subst);
            apply_subst(rhs, subst);
        }
        ExprKind::If(cond, then, alt) => {
            apply_subst(cond, subst);
            apply_subst(then, subst);
            apply_subst(alt, subst);
        }
        ExprKind::Quant(quant) => {
            rename_ident(&mut quant.set, subst.rename);
            apply_subst(&mut quant.body, subst);
        }
        ExprKind::Agg(agg) => match &mut agg.comp {
            CompSpec::Range(range) => {
                rename_ident(&mut range.set, subst.rename);
                if let Some(body) = &mut range.body {
                    apply_subst(body, subst);
                }
                if let Some(cond) = &mut range.cond {
                    apply_subst(cond, subst);
                }
                if let Some(alt) = &mut range.alt {
                    apply_subst(alt, subst);
                }
            }
            CompSpec::Splice(name) => rename_ident(name, subst.rename),
        },
        ExprKind::Paren(inner) => apply_subst(inner, subst),
    }
}

fn rename_ident(ident: &mut Ident, rename: &FxHashMap<Rc<str>, Rc<str>>) {
    if let Some(new) = rename.get(ident.name.as_ref()) {
        ident.name = Rc::clone(new);
    }
}

fn rename_find_ty(ty: &mut FindTy, rename: &FxHashMap<Rc<str>, Rc<str>>) {
    match &mut ty.kind {
        FindTyKind::Subset(set) => rename_ident(set, rename),
        FindTyKind::Mapping(dom, cod) => {
            rename_ident(dom, rename);
            rename_ident(cod, rename);
        }
        FindTyKind::Custom(name, args) => {
            rename_ident(name, rename);
            for arg in &mut **args {
                rename_ident(arg, rename);
            }
        }
    }
}

/// Generates capture-free names for the binders of an instantiated tree. Iterator
/// binders are renamed `name$N` before substitution so they cannot collide with
/// substituted sets, reps, or formals.
#[derive(Default)]
struct FreshNames {
    counter: u32,
}

impl FreshNames {
    fn fresh(&mut self, base: &str) -> Rc<str> {
        self.counter += 1;
        format!("{base}${}", self.counter).into()
    }

    fn freshen_expr(&mut self, expr: &mut Expr) {
        self.freshen_scoped(expr, &FxHashMap::default());
    }

    fn freshen_scoped(&mut self, expr: &mut Expr, scope: &FxHashMap<Rc<str>, Rc<str>>) {
        match &mut *expr.kind {
            ExprKind::Lit(_) | ExprKind::Err => {}
            ExprKind::Name(name) => {
                if let Some(new) = scope.get(name.name.as_ref()) {
                    name.name = Rc::clone(new);
                }
            }
            ExprKind::Size(_) => {}
            ExprKind::Index(_, args) => {
                for arg in &mut **args {
                    self.freshen_scoped(arg, scope);
                }
            }
            ExprKind::Method(call) => {
                if let Some(new) = scope.get(call.target.name.as_ref()) {
                    call.target.name = Rc::clone(new);
                }
                for arg in &mut *call.args {
                    self.freshen_scoped(arg, scope);
                }
            }
            ExprKind::Call(_, args) => {
                for arg in &mut **args {
                    match arg {
                        CallArg::Expr(expr) => self.freshen_scoped(expr, scope),
                        CallArg::Comp(comp) => self.freshen_comp(comp, scope),
                    }
                }
            }
            ExprKind::UnOp(_, operand) => self.freshen_scoped(operand, scope),
            ExprKind::BinOp(_, lhs, rhs) => {
                self.freshen_scoped(lhs, scope);
                self.freshen_scoped(rhs, scope);
            }
            ExprKind::If(cond, then, alt) => {
                self.freshen_scoped(cond, scope);
                self.freshen_scoped(then, scope);
                self.freshen_scoped(alt, scope);
            }
            ExprKind::Quant(quant) => {
                let new = self.fresh(&quant.iter.name);
                let mut inner = scope.clone();
                inner.insert(Rc::clone(&quant.iter.name), Rc::clone(&new));
                quant.iter.name = new;
                self.freshen_scoped(&mut quant.body, &inner);
            }
            ExprKind::Agg(agg) => match &mut agg.comp {
                CompSpec::Range(range) => {
                    let new = self.fresh(&range.iter.name);
                    let mut inner = scope.clone();
                    inner.insert(Rc::clone(&range.iter.name), Rc::clone(&new));
                    range.iter.name = new;
                    if let Some(body) = &mut range.body {
                        self.freshen_scoped(body, &inner);
                    }
                    if let Some(cond) = &mut range.cond {
                        self.freshen_scoped(cond, &inner);
                    }
                    if let Some(alt) = &mut range.alt {
                        self.freshen_scoped(alt, &inner);
                    }
                }
                CompSpec::Splice(_) => {}
            },
            ExprKind::Paren(inner) => self.freshen_scoped(inner, scope),
        }
    }

    fn freshen_comp(&mut self, comp: &mut CompArg, scope: &FxHashMap<Rc<str>, Rc<str>>) {
        let new = self.fresh(&comp.iter.name);
        let mut inner = scope.clone();
        inner.insert(Rc::clone(&comp.iter.name), Rc::clone(&new));
        comp.iter.name = new;
        self.freshen_scoped(&mut comp.body, &inner);
        if let Some(cond) = &mut comp.cond {
            self.freshen_scoped(cond, &inner);
        }
        if let Some(alt) = &mut comp.alt {
            self.freshen_scoped(alt, &inner);
        }
    }
}

/// Clones a tree and resets its node ids, so the assigner gives the copy fresh ids.
fn fresh_tree(tree: &Expr) -> Expr {
    let mut expr = tree.clone();
    ClearIds.visit_expr(&mut expr);
    expr
}

fn clear_comp_ids(comp: &mut CompArg) {
    ClearIds.visit_comp_arg(comp);
}

fn clear_find_ty_ids(ty: &mut FindTy) {
    mut_visit::walk_find_ty(&mut ClearIds, ty);
}

struct ClearIds;

impl MutVisitor for ClearIds {
    fn visit_expr(&mut self, expr: &mut Expr) {
        expr.id = NodeId::default();
        mut_visit::walk_expr(self, expr);
    }

    fn visit_decl(&mut self, decl: &mut Decl) {
        decl.id = NodeId::default();
        mut_visit::walk_decl(self, decl);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        ident.id = NodeId::default();
    }
}
