// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use crate::ast::{
    CallArg, CompArg, CompSpec, Constraint, Decl, DeclKind, Expr, ExprKind, FindTy, FindTyKind,
    FormalKind, Ident, Item, ItemKind, MacroDef, MacroParam, MethodCall, Objective, ParamDecl,
    Path, ProblemDef, Program, UnknownDef, ValueTy,
};
use qsolc_data_structures::span::Span;

pub trait MutVisitor: Sized {
    fn visit_program(&mut self, program: &mut Program) {
        walk_program(self, program);
    }

    fn visit_item(&mut self, item: &mut Item) {
        walk_item(self, item);
    }

    fn visit_unknown_def(&mut self, def: &mut UnknownDef) {
        walk_unknown_def(self, def);
    }

    fn visit_macro_def(&mut self, def: &mut MacroDef) {
        walk_macro_def(self, def);
    }

    fn visit_problem_def(&mut self, def: &mut ProblemDef) {
        walk_problem_def(self, def);
    }

    fn visit_decl(&mut self, decl: &mut Decl) {
        walk_decl(self, decl);
    }

    fn visit_constraint(&mut self, constraint: &mut Constraint) {
        walk_constraint(self, constraint);
    }

    fn visit_objective(&mut self, objective: &mut Objective) {
        walk_objective(self, objective);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_comp_arg(&mut self, comp: &mut CompArg) {
        walk_comp_arg(self, comp);
    }

    fn visit_path(&mut self, path: &mut Path) {
        walk_path(self, path);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        walk_ident(self, ident);
    }

    fn visit_span(&mut self, _: &mut Span) {}
}

pub fn walk_program(vis: &mut impl MutVisitor, program: &mut Program) {
    program
        .items
        .iter_mut()
        .for_each(|item| vis.visit_item(item));
}

pub fn walk_item(vis: &mut impl MutVisitor, item: &mut Item) {
    vis.visit_span(&mut item.span);
    match &mut *item.kind {
        ItemKind::Use(path) => vis.visit_path(path),
        ItemKind::Unknown(def) => vis.visit_unknown_def(def),
        ItemKind::Predicate(def) | ItemKind::Function(def) => vis.visit_macro_def(def),
        ItemKind::Problem(def) => vis.visit_problem_def(def),
    }
}

pub fn walk_unknown_def(vis: &mut impl MutVisitor, def: &mut UnknownDef) {
    vis.visit_span(&mut def.span);
    vis.visit_ident(&mut def.name);
    def.ty_params.iter_mut().for_each(|p| vis.visit_ident(p));
    for rep in &mut *def.rep {
        vis.visit_span(&mut rep.span);
        vis.visit_ident(&mut rep.name);
        walk_find_ty(vis, &mut rep.ty);
    }
    def.laws.iter_mut().for_each(|law| vis.visit_expr(law));
    for view in &mut *def.views {
        vis.visit_span(&mut view.span);
        vis.visit_ident(&mut view.name);
        view.params
            .iter_mut()
            .for_each(|p| walk_macro_param(vis, p));
        vis.visit_expr(&mut view.body);
    }
}

pub fn walk_macro_def(vis: &mut impl MutVisitor, def: &mut MacroDef) {
    vis.visit_span(&mut def.span);
    vis.visit_ident(&mut def.name);
    def.params
        .iter_mut()
        .for_each(|p| walk_macro_param(vis, p));
    vis.visit_expr(&mut def.body);
}

pub fn walk_macro_param(vis: &mut impl MutVisitor, param: &mut MacroParam) {
    vis.visit_span(&mut param.span);
    vis.visit_ident(&mut param.name);
    if let FormalKind::Elem(set) = &mut param.kind {
        vis.visit_ident(set);
    }
}

pub fn walk_problem_def(vis: &mut impl MutVisitor, def: &mut ProblemDef) {
    vis.visit_span(&mut def.span);
    vis.visit_ident(&mut def.name);
    def.decls.iter_mut().for_each(|decl| vis.visit_decl(decl));
}

pub fn walk_decl(vis: &mut impl MutVisitor, decl: &mut Decl) {
    vis.visit_span(&mut decl.span);
    match &mut *decl.kind {
        DeclKind::Set(names) => names.iter_mut().for_each(|name| vis.visit_ident(name)),
        DeclKind::Param(param) => walk_param_decl(vis, param),
        DeclKind::Find(find) => {
            vis.visit_span(&mut find.span);
            vis.visit_ident(&mut find.name);
            walk_find_ty(vis, &mut find.ty);
        }
        DeclKind::Constraint(constraint) => vis.visit_constraint(constraint),
        DeclKind::Objective(objective) => vis.visit_objective(objective),
    }
}

pub fn walk_param_decl(vis: &mut impl MutVisitor, param: &mut ParamDecl) {
    vis.visit_span(&mut param.span);
    vis.visit_ident(&mut param.name);
    param.index.iter_mut().for_each(|set| vis.visit_ident(set));
    if let ValueTy::Elem(set) = &mut param.ty {
        vis.visit_ident(set);
    }
    if let Some(default) = &mut param.default {
        vis.visit_expr(default);
    }
}

pub fn walk_find_ty(vis: &mut impl MutVisitor, ty: &mut FindTy) {
    vis.visit_span(&mut ty.span);
    match &mut ty.kind {
        FindTyKind::Subset(set) => vis.visit_ident(set),
        FindTyKind::Mapping(dom, cod) => {
            vis.visit_ident(dom);
            vis.visit_ident(cod);
        }
        FindTyKind::Custom(name, args) => {
            vis.visit_ident(name);
            args.iter_mut().for_each(|arg| vis.visit_ident(arg));
        }
    }
}

pub fn walk_constraint(vis: &mut impl MutVisitor, constraint: &mut Constraint) {
    vis.visit_span(&mut constraint.span);
    vis.visit_expr(&mut constraint.expr);
    if let Some(guard) = &mut constraint.guard {
        vis.visit_expr(guard);
    }
}

pub fn walk_objective(vis: &mut impl MutVisitor, objective: &mut Objective) {
    vis.visit_span(&mut objective.span);
    vis.visit_expr(&mut objective.expr);
}

pub fn walk_expr(vis: &mut impl MutVisitor, expr: &mut Expr) {
    vis.visit_span(&mut expr.span);
    match &mut *expr.kind {
        ExprKind::Lit(_) | ExprKind::Err => {}
        ExprKind::Name(name) | ExprKind::Size(name) => vis.visit_ident(name),
        ExprKind::Index(name, args) => {
            vis.visit_ident(name);
            args.iter_mut().for_each(|arg| vis.visit_expr(arg));
        }
        ExprKind::Method(call) => walk_method_call(vis, call),
        ExprKind::Call(name, args) => {
            vis.visit_ident(name);
            for arg in &mut **args {
                match arg {
                    CallArg::Expr(expr) => vis.visit_expr(expr),
                    CallArg::Comp(comp) => vis.visit_comp_arg(comp),
                }
            }
        }
        ExprKind::UnOp(_, operand) => vis.visit_expr(operand),
        ExprKind::BinOp(_, lhs, rhs) => {
            vis.visit_expr(lhs);
            vis.visit_expr(rhs);
        }
        ExprKind::If(cond, then, alt) => {
            vis.visit_expr(cond);
            vis.visit_expr(then);
            vis.visit_expr(alt);
        }
        ExprKind::Quant(quant) => {
            vis.visit_span(&mut quant.span);
            vis.visit_ident(&mut quant.iter);
            vis.visit_ident(&mut quant.set);
            vis.visit_expr(&mut quant.body);
        }
        ExprKind::Agg(agg) => {
            vis.visit_span(&mut agg.span);
            match &mut agg.comp {
                CompSpec::Range(range) => {
                    vis.visit_ident(&mut range.iter);
                    vis.visit_ident(&mut range.set);
                    if let Some(body) = &mut range.body {
                        vis.visit_expr(body);
                    }
                    if let Some(cond) = &mut range.cond {
                        vis.visit_expr(cond);
                    }
                    if let Some(alt) = &mut range.alt {
                        vis.visit_expr(alt);
                    }
                }
                CompSpec::Splice(name) => vis.visit_ident(name),
            }
        }
        ExprKind::Paren(inner) => vis.visit_expr(inner),
    }
}

pub fn walk_method_call(vis: &mut impl MutVisitor, call: &mut MethodCall) {
    vis.visit_span(&mut call.span);
    vis.visit_ident(&mut call.target);
    vis.visit_ident(&mut call.name);
    call.args.iter_mut().for_each(|arg| vis.visit_expr(arg));
}

pub fn walk_comp_arg(vis: &mut impl MutVisitor, comp: &mut CompArg) {
    vis.visit_span(&mut comp.span);
    vis.visit_ident(&mut comp.iter);
    vis.visit_ident(&mut comp.set);
    vis.visit_expr(&mut comp.body);
    if let Some(cond) = &mut comp.cond {
        vis.visit_expr(cond);
    }
    if let Some(alt) = &mut comp.alt {
        vis.visit_expr(alt);
    }
}

pub fn walk_path(vis: &mut impl MutVisitor, path: &mut Path) {
    vis.visit_span(&mut path.span);
    path.parts.iter_mut().for_each(|part| vis.visit_ident(part));
}

pub fn walk_ident(vis: &mut impl MutVisitor, ident: &mut Ident) {
    vis.visit_span(&mut ident.span);
}
