// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::elaborate;
use indoc::indoc;
use miette::Diagnostic;
use qsolc_ast::{
    assigner::Assigner,
    ast::{DeclKind, ExprKind, ItemKind, Program},
    mut_visit::MutVisitor,
    visit::{self, Visitor},
};

fn elaborated(source: &str) -> (Program, Vec<super::Error>) {
    let (items, errors) = qsolc_parse::items(source);
    assert!(errors.is_empty(), "parse errors: {errors:?}");
    let mut program = Program {
        id: qsolc_ast::ast::NodeId::default(),
        items: items.into_boxed_slice(),
    };
    let mut assigner = Assigner::new();
    assigner.visit_program(&mut program);
    let errors = elaborate(&mut program, &mut assigner);
    (program, errors)
}

struct CountCalls(usize);

impl<'a> Visitor<'a> for CountCalls {
    fn visit_expr(&mut self, expr: &'a qsolc_ast::ast::Expr) {
        if matches!(&*expr.kind, ExprKind::Call(..)) {
            self.0 += 1;
        }
        visit::walk_expr(self, expr);
    }
}

#[test]
fn non_macro_program_is_unchanged() {
    let (program, errors) = elaborated("problem P { set A; find X : Subset(A); }");
    assert!(errors.is_empty());
    assert_eq!(program.items.len(), 1);
}

#[test]
fn macro_items_are_removed() {
    let (program, errors) = elaborated(indoc! {"
        predicate yes(x: Bool) = x;
        problem P { set A; }
    "});
    assert!(errors.is_empty());
    assert_eq!(program.items.len(), 1);
    assert!(matches!(&*program.items[0].kind, ItemKind::Problem(_)));
}

#[test]
fn predicate_call_is_inlined() {
    let (program, errors) = elaborated(indoc! {"
        predicate both(a: Bool, b: Bool) = a and b;
        problem P {
            set S;
            find X : Subset(S);
            must forall v in S: both(X.has(v), true);
        }
    "});
    assert!(errors.is_empty(), "errors: {errors:?}");
    let mut calls = CountCalls(0);
    calls.visit_program(&program);
    assert_eq!(calls.0, 0, "macro calls should be inlined");
}

#[test]
fn comp_argument_splices_into_count() {
    let (program, errors) = elaborated(indoc! {"
        predicate exactly(k: Real, items: Comp(Bool)) = count(items) = k;
        problem P {
            set Items;
            find Pick : Subset(Items);
            must exactly(2, Pick.has(i) for i in Items);
        }
    "});
    assert!(errors.is_empty(), "errors: {errors:?}");

    // The constraint should now be `count(Pick.has(i$N) for i$N in Items) = 2`.
    struct FindAgg(bool);
    impl<'a> Visitor<'a> for FindAgg {
        fn visit_expr(&mut self, expr: &'a qsolc_ast::ast::Expr) {
            if let ExprKind::Agg(agg) = &*expr.kind {
                if let qsolc_ast::ast::CompSpec::Range(range) = &agg.comp {
                    assert_eq!(range.set.name.as_ref(), "Items");
                    assert!(range.body.is_some());
                    self.0 = true;
                }
            }
            visit::walk_expr(self, expr);
        }
    }
    let mut finder = FindAgg(false);
    finder.visit_program(&program);
    assert!(finder.0, "expected a spliced comprehension");
}

#[test]
fn custom_unknown_expands_to_rep_laws_and_views() {
    let (program, errors) = elaborated(indoc! {"
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
        problem P {
            set V;
            find Cut : Partition(V);
            must Cut.onLeft(v) if Cut.onLeft(v);
        }
    "});
    assert!(errors.is_empty(), "errors: {errors:?}");

    let ItemKind::Problem(problem) = &*program.items[0].kind else {
        panic!("expected problem");
    };

    let mut find_names = Vec::new();
    let mut constraint_count = 0;
    for decl in &*problem.decls {
        match &*decl.kind {
            DeclKind::Find(find) => find_names.push(find.name.name.to_string()),
            DeclKind::Constraint(_) => constraint_count += 1,
            _ => {}
        }
    }
    assert_eq!(find_names, vec!["Cut$left".to_string()]);
    // The original constraint plus the instantiated law.
    assert_eq!(constraint_count, 2);
}

#[test]
fn undefined_unknown_is_reported() {
    let (_, errors) = elaborated("problem P { set A; find X : Ghost(A); }");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].code().map(|c| c.to_string()),
        Some("QSOL2001".to_string())
    );
}

#[test]
fn cyclic_unknowns_are_reported() {
    let (_, errors) = elaborated(indoc! {"
        unknown A(S) {
            rep {
                find inner: B(S);
            }
        }
        unknown B(S) {
            rep {
                find inner: A(S);
            }
        }
        problem P {
            set V;
            find X : A(V);
        }
    "});
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].code().map(|c| c.to_string()),
        Some("QSOL2101".to_string())
    );
}

#[test]
fn macro_arity_mismatch_is_reported() {
    let (_, errors) = elaborated(indoc! {"
        predicate yes(x: Bool) = x;
        problem P {
            set A;
            find X : Subset(A);
            must yes(X.has(a), true) if exists a in A: X.has(a);
        }
    "});
    assert!(!errors.is_empty());
    assert_eq!(
        errors[0].code().map(|c| c.to_string()),
        Some("QSOL2101".to_string())
    );
}

#[test]
fn comp_formal_rejects_plain_argument() {
    let (_, errors) = elaborated(indoc! {"
        predicate all_of(items: Comp(Bool)) = all(items);
        problem P {
            set A;
            find X : Subset(A);
            must all_of(true);
        }
    "});
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].code().map(|c| c.to_string()),
        Some("QSOL2101".to_string())
    );
}

#[test]
fn elaboration_is_idempotent_for_plain_programs() {
    let (mut program, errors) = elaborated(indoc! {"
        problem P {
            set A;
            find X : Subset(A);
            must forall a in A: X.has(a);
        }
    "});
    assert!(errors.is_empty());
    let rendered = program.to_string();
    let mut assigner = Assigner::new();
    let errors = elaborate(&mut program, &mut assigner);
    assert!(errors.is_empty());
    assert_eq!(program.to_string(), rendered);
}
