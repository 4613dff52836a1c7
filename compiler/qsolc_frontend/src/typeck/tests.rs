// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use crate::compile::tests::{error_codes, unit};
use indoc::indoc;

#[test]
fn constraint_must_be_boolean() {
    let u = unit(indoc! {"
        problem P {
            set A;
            find X : Subset(A);
            must 1 + 2;
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn objective_must_be_numeric() {
    let u = unit(indoc! {"
        problem P {
            set A;
            find X : Subset(A);
            minimize forall a in A: X.has(a);
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn has_requires_element_of_the_set() {
    let u = unit(indoc! {"
        problem P {
            set A, B;
            param b: Elem(B);
            find X : Subset(A);
            must X.has(b);
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn is_requires_domain_and_codomain_elements() {
    let u = unit(indoc! {"
        problem P {
            set V, C;
            find ColorOf : Mapping(V -> C);
            must forall v in V: exists c in C: ColorOf.is(c, v);
        }
    "});
    // Both arguments are swapped.
    assert_eq!(error_codes(&u), vec!["QSOL2101", "QSOL2101"]);
}

#[test]
fn has_on_mapping_is_rejected() {
    let u = unit(indoc! {"
        problem P {
            set V, C;
            find ColorOf : Mapping(V -> C);
            must forall v in V: ColorOf.has(v);
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn arithmetic_requires_numbers() {
    let u = unit(indoc! {"
        problem P {
            set A;
            find X : Subset(A);
            must forall a in A: X.has(a) + 1 > 0;
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn int_coerces_to_real() {
    let u = unit(indoc! {"
        problem P {
            set A;
            param Weight(A): Real = 0.0;
            find X : Subset(A);
            must sum(Weight[a] for a in A where X.has(a)) <= 3;
        }
    "});
    assert!(u.errors.is_empty(), "errors: {:?}", u.errors);
}

#[test]
fn elem_comparison_requires_same_set() {
    let u = unit(indoc! {"
        problem P {
            set A, B;
            param x: Elem(A);
            param y: Elem(B);
            find F : Subset(A);
            must x = y;
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}

#[test]
fn elem_ordering_is_rejected() {
    let u = unit(indoc! {"
        problem P {
            set A;
            param x: Elem(A);
            param y: Elem(A);
            find F : Subset(A);
            must x < y;
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101", "QSOL2101"]);
}

#[test]
fn if_branches_must_agree() {
    let u = unit(indoc! {"
        problem P {
            set A;
            find X : Subset(A);
            minimize sum(if X.has(a) then 1 else true for a in A);
        }
    "});
    assert!(error_codes(&u).contains(&"QSOL2101".to_string()));
}

#[test]
fn boolean_equality_is_allowed() {
    let u = unit(indoc! {"
        problem P {
            set V;
            find S : Subset(V);
            must forall u in V: exists w in V: S.has(u) != S.has(w);
        }
    "});
    assert!(u.errors.is_empty(), "errors: {:?}", u.errors);
}

#[test]
fn guard_must_be_boolean() {
    let u = unit(indoc! {"
        problem P {
            set A;
            param K: Real = 1.0;
            find X : Subset(A);
            must forall a in A: X.has(a) if K;
        }
    "});
    assert_eq!(error_codes(&u), vec!["QSOL2101"]);
}
