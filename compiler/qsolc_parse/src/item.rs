// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use crate::{
    expr::expr,
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim::{barrier, ident, many, path, recovering, recovering_semi, seq, token},
    scan::Scanner,
    Error, ErrorKind, Result,
};
use qsolc_ast::ast::{
    Constraint, Decl, DeclKind, Expr, ExprKind, FindDecl, FindTy, FindTyKind, FormalKind, Item,
    ItemKind, MacroDef, MacroKind, MacroParam, NodeId, ObjDir, Objective, ParamDecl, ProblemDef,
    RepFind, Strength, UnknownDef, ValueTy, ViewDef,
};

pub(super) fn parse_items(s: &mut Scanner) -> Result<Vec<Item>> {
    let items = many(s, parse_item)?;
    token(s, TokenKind::Eof)?;
    Ok(items)
}

fn parse_item(s: &mut Scanner) -> Result<Item> {
    let lo = s.peek().span.lo;
    let kind = if token(s, TokenKind::Keyword(Keyword::Use)).is_ok() {
        let path = path(s)?;
        recovering_semi(s);
        Ok(ItemKind::Use(path))
    } else if token(s, TokenKind::Keyword(Keyword::Unknown)).is_ok() {
        parse_unknown(s).map(|def| ItemKind::Unknown(Box::new(def)))
    } else if token(s, TokenKind::Keyword(Keyword::Predicate)).is_ok() {
        parse_macro(s).map(|def| ItemKind::Predicate(Box::new(def)))
    } else if token(s, TokenKind::Keyword(Keyword::Function)).is_ok() {
        parse_macro(s).map(|def| ItemKind::Function(Box::new(def)))
    } else if token(s, TokenKind::Keyword(Keyword::Problem)).is_ok() {
        parse_problem(s).map(|def| ItemKind::Problem(Box::new(def)))
    } else {
        Err(Error(ErrorKind::Rule(
            "item",
            s.peek().kind,
            s.peek().span,
        )))
    }?;

    Ok(Item {
        id: NodeId::default(),
        span: s.span(lo),
        kind: Box::new(kind),
    })
}

/// `unknown Name(S, T) { rep { ... } laws { ... } view { ... } }`. The `unknown` keyword
/// has already been consumed.
fn parse_unknown(s: &mut Scanner) -> Result<UnknownDef> {
    let lo = s.peek().span.lo;
    let name = ident(s)?;
    token(s, TokenKind::Open(Delim::Paren))?;
    let ty_params = seq(s, ident)?;
    token(s, TokenKind::Close(Delim::Paren))?;
    token(s, TokenKind::Open(Delim::Brace))?;

    token(s, TokenKind::Keyword(Keyword::Rep))?;
    token(s, TokenKind::Open(Delim::Brace))?;
    let rep = many(s, parse_rep_find)?;
    token(s, TokenKind::Close(Delim::Brace))?;

    let laws = if token(s, TokenKind::Keyword(Keyword::Laws)).is_ok() {
        token(s, TokenKind::Open(Delim::Brace))?;
        let laws = many(s, |s| {
            let law = expr(s)?;
            recovering_semi(s);
            Ok(*law)
        })?;
        token(s, TokenKind::Close(Delim::Brace))?;
        laws
    } else {
        Vec::new()
    };

    let views = if token(s, TokenKind::Keyword(Keyword::View)).is_ok() {
        token(s, TokenKind::Open(Delim::Brace))?;
        let views = many(s, parse_view)?;
        token(s, TokenKind::Close(Delim::Brace))?;
        views
    } else {
        Vec::new()
    };

    token(s, TokenKind::Close(Delim::Brace))?;
    Ok(UnknownDef {
        span: s.span(lo),
        name,
        ty_params: ty_params.into_boxed_slice(),
        rep: rep.into_boxed_slice(),
        laws: laws.into_boxed_slice(),
        views: views.into_boxed_slice(),
    })
}

fn parse_rep_find(s: &mut Scanner) -> Result<RepFind> {
    let lo = s.peek().span.lo;
    token(s, TokenKind::Keyword(Keyword::Find))?;
    let name = ident(s)?;
    token(s, TokenKind::Colon)?;
    let ty = parse_find_ty(s)?;
    recovering_semi(s);
    Ok(RepFind {
        span: s.span(lo),
        name,
        ty,
    })
}

fn parse_view(s: &mut Scanner) -> Result<ViewDef> {
    let lo = s.peek().span.lo;
    let kind = if token(s, TokenKind::Keyword(Keyword::Predicate)).is_ok() {
        MacroKind::Predicate
    } else if token(s, TokenKind::Keyword(Keyword::Function)).is_ok() {
        MacroKind::Function
    } else {
        return Err(Error(ErrorKind::Rule(
            "view member",
            s.peek().kind,
            s.peek().span,
        )));
    };

    let def = parse_macro(s)?;
    Ok(ViewDef {
        span: s.span(lo),
        kind,
        name: def.name,
        params: def.params,
        body: def.body,
    })
}

/// `name(params) = body;`. The `predicate`/`function` keyword has already been consumed.
fn parse_macro(s: &mut Scanner) -> Result<MacroDef> {
    let lo = s.peek().span.lo;
    let name = ident(s)?;
    token(s, TokenKind::Open(Delim::Paren))?;
    let params = seq(s, parse_macro_param)?;
    token(s, TokenKind::Close(Delim::Paren))?;
    token(s, TokenKind::Eq)?;
    let body = expr(s)?;
    recovering_semi(s);
    Ok(MacroDef {
        span: s.span(lo),
        name,
        params: params.into_boxed_slice(),
        body: *body,
    })
}

fn parse_macro_param(s: &mut Scanner) -> Result<MacroParam> {
    let lo = s.peek().span.lo;
    let name = ident(s)?;
    token(s, TokenKind::Colon)?;
    let kind = parse_formal_kind(s)?;
    Ok(MacroParam {
        span: s.span(lo),
        name,
        kind,
    })
}

fn parse_formal_kind(s: &mut Scanner) -> Result<FormalKind> {
    if token(s, TokenKind::Keyword(Keyword::Bool)).is_ok() {
        Ok(FormalKind::Bool)
    } else if token(s, TokenKind::Keyword(Keyword::Real)).is_ok() {
        Ok(FormalKind::Real)
    } else if token(s, TokenKind::Keyword(Keyword::Elem)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let set = ident(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(FormalKind::Elem(set))
    } else if token(s, TokenKind::Keyword(Keyword::Comp)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let kind = if token(s, TokenKind::Keyword(Keyword::Bool)).is_ok() {
            FormalKind::CompBool
        } else if token(s, TokenKind::Keyword(Keyword::Real)).is_ok() {
            FormalKind::CompReal
        } else {
            return Err(Error(ErrorKind::Rule(
                "comprehension kind",
                s.peek().kind,
                s.peek().span,
            )));
        };
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(kind)
    } else {
        Err(Error(ErrorKind::Rule(
            "parameter kind",
            s.peek().kind,
            s.peek().span,
        )))
    }
}

/// `problem Name { decls }`. The `problem` keyword has already been consumed.
fn parse_problem(s: &mut Scanner) -> Result<ProblemDef> {
    let lo = s.peek().span.lo;
    let name = ident(s)?;
    token(s, TokenKind::Open(Delim::Brace))?;
    let decls = barrier(s, &[TokenKind::Close(Delim::Brace)], |s| {
        many(s, parse_decl)
    })?;
    token(s, TokenKind::Close(Delim::Brace))?;
    Ok(ProblemDef {
        span: s.span(lo),
        name,
        decls: decls.into_boxed_slice(),
    })
}

fn parse_decl(s: &mut Scanner) -> Result<Decl> {
    let lo = s.peek().span.lo;
    recovering(
        s,
        |span| Decl {
            id: NodeId::default(),
            span,
            kind: Box::new(DeclKind::Constraint(Box::new(Constraint {
                span,
                strength: Strength::Must,
                expr: Expr {
                    id: NodeId::default(),
                    span,
                    kind: Box::new(ExprKind::Err),
                },
                guard: None,
            }))),
        },
        &[TokenKind::Semi],
        |s| {
            let kind = parse_decl_kind(s, lo)?;
            Ok(Decl {
                id: NodeId::default(),
                span: s.span(lo),
                kind: Box::new(kind),
            })
        },
    )
}

fn parse_decl_kind(s: &mut Scanner, lo: u32) -> Result<DeclKind> {
    if token(s, TokenKind::Keyword(Keyword::Set)).is_ok() {
        let names = seq(s, ident)?;
        recovering_semi(s);
        Ok(DeclKind::Set(names.into_boxed_slice()))
    } else if token(s, TokenKind::Keyword(Keyword::Param)).is_ok() {
        parse_param(s, lo).map(|param| DeclKind::Param(Box::new(param)))
    } else if token(s, TokenKind::Keyword(Keyword::Find)).is_ok() {
        let name = ident(s)?;
        token(s, TokenKind::Colon)?;
        let ty = parse_find_ty(s)?;
        recovering_semi(s);
        Ok(DeclKind::Find(Box::new(FindDecl {
            span: s.span(lo),
            name,
            ty,
        })))
    } else if let Some(strength) = parse_strength(s) {
        let body = expr(s)?;
        let guard = if token(s, TokenKind::Keyword(Keyword::If)).is_ok() {
            Some(*expr(s)?)
        } else {
            None
        };
        recovering_semi(s);
        Ok(DeclKind::Constraint(Box::new(Constraint {
            span: s.span(lo),
            strength,
            expr: *body,
            guard,
        })))
    } else if let Some(dir) = parse_obj_dir(s) {
        let body = expr(s)?;
        recovering_semi(s);
        Ok(DeclKind::Objective(Box::new(Objective {
            span: s.span(lo),
            dir,
            expr: *body,
        })))
    } else {
        Err(Error(ErrorKind::Rule(
            "declaration",
            s.peek().kind,
            s.peek().span,
        )))
    }
}

fn parse_strength(s: &mut Scanner) -> Option<Strength> {
    if token(s, TokenKind::Keyword(Keyword::Must)).is_ok() {
        Some(Strength::Must)
    } else if token(s, TokenKind::Keyword(Keyword::Should)).is_ok() {
        Some(Strength::Should)
    } else if token(s, TokenKind::Keyword(Keyword::Nice)).is_ok() {
        Some(Strength::Nice)
    } else {
        None
    }
}

fn parse_obj_dir(s: &mut Scanner) -> Option<ObjDir> {
    if token(s, TokenKind::Keyword(Keyword::Minimize)).is_ok() {
        Some(ObjDir::Minimize)
    } else if token(s, TokenKind::Keyword(Keyword::Maximize)).is_ok() {
        Some(ObjDir::Maximize)
    } else {
        None
    }
}

/// `param Name(I, J): Real = 0.0;` or `param Name: Elem(S);`. The `param` keyword has
/// already been consumed.
fn parse_param(s: &mut Scanner, lo: u32) -> Result<ParamDecl> {
    let name = ident(s)?;
    let index = if token(s, TokenKind::Open(Delim::Paren)).is_ok() {
        let sets = seq(s, ident)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        sets
    } else {
        Vec::new()
    };
    token(s, TokenKind::Colon)?;
    let ty = parse_value_ty(s)?;
    let default = if token(s, TokenKind::Eq).is_ok() {
        Some(*expr(s)?)
    } else {
        None
    };
    recovering_semi(s);
    Ok(ParamDecl {
        span: s.span(lo),
        name,
        index: index.into_boxed_slice(),
        ty,
        default,
    })
}

fn parse_value_ty(s: &mut Scanner) -> Result<ValueTy> {
    if token(s, TokenKind::Keyword(Keyword::Bool)).is_ok() {
        Ok(ValueTy::Bool)
    } else if token(s, TokenKind::Keyword(Keyword::Real)).is_ok() {
        Ok(ValueTy::Real)
    } else if token(s, TokenKind::Keyword(Keyword::Int)).is_ok() {
        if token(s, TokenKind::Open(Delim::Bracket)).is_ok() {
            let lo_bound = int_lit(s)?;
            token(s, TokenKind::DotDot)?;
            let hi_bound = int_lit(s)?;
            token(s, TokenKind::Close(Delim::Bracket))?;
            Ok(ValueTy::Int(Some((lo_bound, hi_bound))))
        } else {
            Ok(ValueTy::Int(None))
        }
    } else if token(s, TokenKind::Keyword(Keyword::Elem)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let set = ident(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(ValueTy::Elem(set))
    } else {
        Err(Error(ErrorKind::Rule(
            "value type",
            s.peek().kind,
            s.peek().span,
        )))
    }
}

fn int_lit(s: &mut Scanner) -> Result<i64> {
    let negative = token(s, TokenKind::Minus).is_ok();
    let peek = s.peek();
    if peek.kind == TokenKind::Int {
        let value: i64 = s
            .read()
            .parse()
            .map_err(|_| Error(ErrorKind::Lit("integer", peek.span)))?;
        s.advance();
        Ok(if negative { -value } else { value })
    } else {
        Err(Error(ErrorKind::Rule("integer", peek.kind, peek.span)))
    }
}

fn parse_find_ty(s: &mut Scanner) -> Result<FindTy> {
    let lo = s.peek().span.lo;
    let kind = if token(s, TokenKind::Keyword(Keyword::Subset)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let set = ident(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(FindTyKind::Subset(set))
    } else if token(s, TokenKind::Keyword(Keyword::Mapping)).is_ok() {
        token(s, TokenKind::Open(Delim::Paren))?;
        let dom = ident(s)?;
        token(s, TokenKind::RArrow)?;
        let cod = ident(s)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(FindTyKind::Mapping(dom, cod))
    } else if let Ok(name) = ident(s) {
        token(s, TokenKind::Open(Delim::Paren))?;
        let args = seq(s, ident)?;
        token(s, TokenKind::Close(Delim::Paren))?;
        Ok(FindTyKind::Custom(name, args.into_boxed_slice()))
    } else {
        Err(Error(ErrorKind::Rule(
            "find type",
            s.peek().kind,
            s.peek().span,
        )))
    }?;

    Ok(FindTy {
        span: s.span(lo),
        kind,
    })
}
