// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::parse_items;
use crate::tests::{parse_errors, parse_ok};
use indoc::indoc;
use qsolc_ast::ast::{
    DeclKind, FindTyKind, FormalKind, ItemKind, MacroKind, ObjDir, Strength, ValueTy,
};

#[test]
fn use_import() {
    let items = parse_ok(parse_items, "use stdlib.constraints;");
    assert_eq!(items.len(), 1);
    let ItemKind::Use(path) = &*items[0].kind else {
        panic!("expected use item");
    };
    assert_eq!(path.joined(), "stdlib.constraints");
}

#[test]
fn quoted_import_is_rejected() {
    // Only the dotted-identifier form of `use` is supported.
    parse_errors(parse_items, r#"use "stdlib/constraints.qsol";"#);
}

#[test]
fn empty_problem() {
    let items = parse_ok(parse_items, "problem P { }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    assert_eq!(problem.name.name.as_ref(), "P");
    assert!(problem.decls.is_empty());
}

#[test]
fn set_declaration_multiple_names() {
    let items = parse_ok(parse_items, "problem P { set A, B; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Set(names) = &*problem.decls[0].kind else {
        panic!("expected set declaration");
    };
    assert_eq!(names.len(), 2);
}

#[test]
fn scalar_param_with_default() {
    let items = parse_ok(parse_items, "problem P { param Capacity: Real = 5.0; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Param(param) = &*problem.decls[0].kind else {
        panic!("expected param declaration");
    };
    assert!(param.index.is_empty());
    assert!(matches!(param.ty, ValueTy::Real));
    assert!(param.default.is_some());
}

#[test]
fn indexed_param() {
    let items = parse_ok(parse_items, "problem P { param Cost(I, J): Real; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Param(param) = &*problem.decls[0].kind else {
        panic!("expected param declaration");
    };
    assert_eq!(param.index.len(), 2);
    assert!(param.default.is_none());
}

#[test]
fn bounded_int_param() {
    let items = parse_ok(parse_items, "problem P { param K: Int[0..10]; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Param(param) = &*problem.decls[0].kind else {
        panic!("expected param declaration");
    };
    assert!(matches!(param.ty, ValueTy::Int(Some((0, 10)))));
}

#[test]
fn elem_param() {
    let items = parse_ok(parse_items, "problem P { param Home: Elem(Cities); }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Param(param) = &*problem.decls[0].kind else {
        panic!("expected param declaration");
    };
    assert!(matches!(&param.ty, ValueTy::Elem(set) if set.name.as_ref() == "Cities"));
}

#[test]
fn subset_find() {
    let items = parse_ok(parse_items, "problem P { find Pick: Subset(Items); }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Find(find) = &*problem.decls[0].kind else {
        panic!("expected find declaration");
    };
    assert!(matches!(&find.ty.kind, FindTyKind::Subset(set) if set.name.as_ref() == "Items"));
}

#[test]
fn mapping_find() {
    let items = parse_ok(parse_items, "problem P { find ColorOf: Mapping(V -> C); }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Find(find) = &*problem.decls[0].kind else {
        panic!("expected find declaration");
    };
    assert!(matches!(&find.ty.kind, FindTyKind::Mapping(_, _)));
}

#[test]
fn custom_find() {
    let items = parse_ok(parse_items, "problem P { find X: Partition(A); }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Find(find) = &*problem.decls[0].kind else {
        panic!("expected find declaration");
    };
    assert!(matches!(&find.ty.kind, FindTyKind::Custom(name, args)
        if name.name.as_ref() == "Partition" && args.len() == 1));
}

#[test]
fn constraint_strengths() {
    let source = indoc! {"
        problem P {
            must a = 1;
            should b = 2;
            nice c = 3;
        }
    "};
    let items = parse_ok(parse_items, source);
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let strengths: Vec<Strength> = problem
        .decls
        .iter()
        .map(|decl| match &*decl.kind {
            DeclKind::Constraint(c) => c.strength,
            _ => panic!("expected constraint"),
        })
        .collect();
    assert_eq!(
        strengths,
        vec![Strength::Must, Strength::Should, Strength::Nice]
    );
}

#[test]
fn guarded_constraint() {
    let items = parse_ok(parse_items, "problem P { must a = 1 if b = 2; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Constraint(constraint) = &*problem.decls[0].kind else {
        panic!("expected constraint");
    };
    assert!(constraint.guard.is_some());
}

#[test]
fn objectives() {
    let items = parse_ok(parse_items, "problem P { minimize x; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Objective(objective) = &*problem.decls[0].kind else {
        panic!("expected objective");
    };
    assert_eq!(objective.dir, ObjDir::Minimize);

    let items = parse_ok(parse_items, "problem P { maximize x; }");
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    let DeclKind::Objective(objective) = &*problem.decls[0].kind else {
        panic!("expected objective");
    };
    assert_eq!(objective.dir, ObjDir::Maximize);
}

#[test]
fn predicate_macro() {
    let items = parse_ok(
        parse_items,
        "predicate covered(x: Elem(S), picked: Comp(Bool)) = any(p for p in S where p = x);",
    );
    let ItemKind::Predicate(def) = &*items[0].kind else {
        panic!("expected predicate");
    };
    assert_eq!(def.name.name.as_ref(), "covered");
    assert_eq!(def.params.len(), 2);
    assert!(matches!(def.params[0].kind, FormalKind::Elem(_)));
    assert!(matches!(def.params[1].kind, FormalKind::CompBool));
}

#[test]
fn function_macro() {
    let items = parse_ok(parse_items, "function half(x: Real) = x / 2;");
    assert!(matches!(&*items[0].kind, ItemKind::Function(_)));
}

#[test]
fn unknown_definition() {
    let source = indoc! {"
        unknown Partition(S) {
            rep {
                find left: Subset(S);
            }
            laws {
                forall x in S: left.has(x) or not left.has(x);
            }
            view {
                predicate onLeft(x: Elem(S)) = left.has(x);
            }
        }
    "};
    let items = parse_ok(parse_items, source);
    let ItemKind::Unknown(def) = &*items[0].kind else {
        panic!("expected unknown definition");
    };
    assert_eq!(def.name.name.as_ref(), "Partition");
    assert_eq!(def.ty_params.len(), 1);
    assert_eq!(def.rep.len(), 1);
    assert_eq!(def.laws.len(), 1);
    assert_eq!(def.views.len(), 1);
    assert_eq!(def.views[0].kind, MacroKind::Predicate);
}

#[test]
fn missing_semicolon_is_reported() {
    let errors = parse_errors(parse_items, "problem P { set A\n must x = 1; }");
    assert!(!errors.is_empty());
}

#[test]
fn full_problem_parses() {
    let source = indoc! {"
        problem ExactK {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "};
    let items = parse_ok(parse_items, source);
    let ItemKind::Problem(problem) = &*items[0].kind else {
        panic!("expected problem");
    };
    assert_eq!(problem.decls.len(), 4);
}
