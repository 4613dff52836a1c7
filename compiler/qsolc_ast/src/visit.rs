// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use crate::ast::{
    AggExpr, CallArg, CompArg, CompSpec, Constraint, Decl, DeclKind, Expr, ExprKind, FindDecl,
    FindTy, FindTyKind, FormalKind, Ident, Item, ItemKind, MacroDef, MacroParam, MethodCall,
    Objective, ParamDecl, Path, ProblemDef, Program, QuantExpr, UnknownDef, ValueTy,
};

pub trait Visitor<'a>: Sized {
    fn visit_program(&mut self, program: &'a Program) {
        walk_program(self, program);
    }

    fn visit_item(&mut self, item: &'a Item) {
        walk_item(self, item);
    }

    fn visit_unknown_def(&mut self, def: &'a UnknownDef) {
        walk_unknown_def(self, def);
    }

    fn visit_macro_def(&mut self, def: &'a MacroDef) {
        walk_macro_def(self, def);
    }

    fn visit_problem_def(&mut self, def: &'a ProblemDef) {
        walk_problem_def(self, def);
    }

    fn visit_decl(&mut self, decl: &'a Decl) {
        walk_decl(self, decl);
    }

    fn visit_constraint(&mut self, constraint: &'a Constraint) {
        walk_constraint(self, constraint);
    }

    fn visit_objective(&mut self, objective: &'a Objective) {
        walk_objective(self, objective);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_comp_arg(&mut self, comp: &'a CompArg) {
        walk_comp_arg(self, comp);
    }

    fn visit_path(&mut self, path: &'a Path) {
        walk_path(self, path);
    }

    fn visit_ident(&mut self, _: &'a Ident) {}
}

pub fn walk_program<'a>(vis: &mut impl Visitor<'a>, program: &'a Program) {
    program.items.iter().for_each(|item| vis.visit_item(item));
}

pub fn walk_item<'a>(vis: &mut impl Visitor<'a>, item: &'a Item) {
    match &*item.kind {
        ItemKind::Use(path) => vis.visit_path(path),
        ItemKind::Unknown(def) => vis.visit_unknown_def(def),
        ItemKind::Predicate(def) | ItemKind::Function(def) => vis.visit_macro_def(def),
        ItemKind::Problem(def) => vis.visit_problem_def(def),
    }
}

pub fn walk_unknown_def<'a>(vis: &mut impl Visitor<'a>, def: &'a UnknownDef) {
    vis.visit_ident(&def.name);
    def.ty_params.iter().for_each(|p| vis.visit_ident(p));
    for rep in &*def.rep {
        vis.visit_ident(&rep.name);
        walk_find_ty(vis, &rep.ty);
    }
    def.laws.iter().for_each(|law| vis.visit_expr(law));
    for view in &*def.views {
        vis.visit_ident(&view.name);
        view.params.iter().for_each(|p| walk_macro_param(vis, p));
        vis.visit_expr(&view.body);
    }
}

pub fn walk_macro_def<'a>(vis: &mut impl Visitor<'a>, def: &'a MacroDef) {
    vis.visit_ident(&def.name);
    def.params.iter().for_each(|p| walk_macro_param(vis, p));
    vis.visit_expr(&def.body);
}

pub fn walk_macro_param<'a>(vis: &mut impl Visitor<'a>, param: &'a MacroParam) {
    vis.visit_ident(&param.name);
    if let FormalKind::Elem(set) = &param.kind {
        vis.visit_ident(set);
    }
}

pub fn walk_problem_def<'a>(vis: &mut impl Visitor<'a>, def: &'a ProblemDef) {
    vis.visit_ident(&def.name);
    def.decls.iter().for_each(|decl| vis.visit_decl(decl));
}

pub fn walk_decl<'a>(vis: &mut impl Visitor<'a>, decl: &'a Decl) {
    match &*decl.kind {
        DeclKind::Set(names) => names.iter().for_each(|name| vis.visit_ident(name)),
        DeclKind::Param(param) => walk_param_decl(vis, param),
        DeclKind::Find(find) => walk_find_decl(vis, find),
        DeclKind::Constraint(constraint) => vis.visit_constraint(constraint),
        DeclKind::Objective(objective) => vis.visit_objective(objective),
    }
}

pub fn walk_param_decl<'a>(vis: &mut impl Visitor<'a>, param: &'a ParamDecl) {
    vis.visit_ident(&param.name);
    param.index.iter().for_each(|set| vis.visit_ident(set));
    if let ValueTy::Elem(set) = &param.ty {
        vis.visit_ident(set);
    }
    if let Some(default) = &param.default {
        vis.visit_expr(default);
    }
}

pub fn walk_find_decl<'a>(vis: &mut impl Visitor<'a>, find: &'a FindDecl) {
    vis.visit_ident(&find.name);
    walk_find_ty(vis, &find.ty);
}

pub fn walk_find_ty<'a>(vis: &mut impl Visitor<'a>, ty: &'a FindTy) {
    match &ty.kind {
        FindTyKind::Subset(set) => vis.visit_ident(set),
        FindTyKind::Mapping(dom, cod) => {
            vis.visit_ident(dom);
            vis.visit_ident(cod);
        }
        FindTyKind::Custom(name, args) => {
            vis.visit_ident(name);
            args.iter().for_each(|arg| vis.visit_ident(arg));
        }
    }
}

pub fn walk_constraint<'a>(vis: &mut impl Visitor<'a>, constraint: &'a Constraint) {
    vis.visit_expr(&constraint.expr);
    if let Some(guard) = &constraint.guard {
        vis.visit_expr(guard);
    }
}

pub fn walk_objective<'a>(vis: &mut impl Visitor<'a>, objective: &'a Objective) {
    vis.visit_expr(&objective.expr);
}

pub fn walk_expr<'a>(vis: &mut impl Visitor<'a>, expr: &'a Expr) {
    match &*expr.kind {
        ExprKind::Lit(_) | ExprKind::Err => {}
        ExprKind::Name(name) | ExprKind::Size(name) => vis.visit_ident(name),
        ExprKind::Index(name, args) => {
            vis.visit_ident(name);
            args.iter().for_each(|arg| vis.visit_expr(arg));
        }
        ExprKind::Method(call) => walk_method_call(vis, call),
        ExprKind::Call(name, args) => {
            vis.visit_ident(name);
            for arg in &**args {
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
        ExprKind::Quant(quant) => walk_quant_expr(vis, quant),
        ExprKind::Agg(agg) => walk_agg_expr(vis, agg),
        ExprKind::Paren(inner) => vis.visit_expr(inner),
    }
}

pub fn walk_method_call<'a>(vis: &mut impl Visitor<'a>, call: &'a MethodCall) {
    vis.visit_ident(&call.target);
    vis.visit_ident(&call.name);
    call.args.iter().for_each(|arg| vis.visit_expr(arg));
}

pub fn walk_quant_expr<'a>(vis: &mut impl Visitor<'a>, quant: &'a QuantExpr) {
    vis.visit_ident(&quant.iter);
    vis.visit_ident(&quant.set);
    vis.visit_expr(&quant.body);
}

pub fn walk_agg_expr<'a>(vis: &mut impl Visitor<'a>, agg: &'a AggExpr) {
    match &agg.comp {
        CompSpec::Range(range) => {
            vis.visit_ident(&range.iter);
            vis.visit_ident(&range.set);
            if let Some(body) = &range.body {
                vis.visit_expr(body);
            }
            if let Some(cond) = &range.cond {
                vis.visit_expr(cond);
            }
            if let Some(alt) = &range.alt {
                vis.visit_expr(alt);
            }
        }
        CompSpec::Splice(name) => vis.visit_ident(name),
    }
}

pub fn walk_comp_arg<'a>(vis: &mut impl Visitor<'a>, comp: &'a CompArg) {
    vis.visit_ident(&comp.iter);
    vis.visit_ident(&comp.set);
    vis.visit_expr(&comp.body);
    if let Some(cond) = &comp.cond {
        vis.visit_expr(cond);
    }
    if let Some(alt) = &comp.alt {
        vis.visit_expr(alt);
    }
}

pub fn walk_path<'a>(vis: &mut impl Visitor<'a>, path: &'a Path) {
    path.parts.iter().for_each(|part| vis.visit_ident(part));
}
