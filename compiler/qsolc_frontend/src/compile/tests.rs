// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{compile, CompileUnit, SourceMap};
use indoc::indoc;
use miette::Diagnostic;

pub(crate) fn unit(source: &str) -> CompileUnit {
    compile(
        SourceMap::new([("test.qsol".into(), source.into())]),
        Vec::new(),
    )
}

pub(crate) fn error_codes(unit: &CompileUnit) -> Vec<String> {
    unit.errors
        .iter()
        .map(|error| {
            error
                .code()
                .map_or_else(|| "<none>".to_string(), |code| code.to_string())
        })
        .collect()
}

#[test]
fn empty_source_compiles() {
    let unit = unit("");
    assert!(unit.errors.is_empty());
    assert!(unit.program.items.is_empty());
}

#[test]
fn well_formed_problem_compiles() {
    let unit = unit(indoc! {"
        problem P {
            set Items;
            param Weight(Items): Real = 0.0;
            find Pick : Subset(Items);
            must sum(Weight[i] for i in Items where Pick.has(i)) <= 5;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "});
    assert!(unit.errors.is_empty(), "errors: {:?}", unit.errors);
    assert_eq!(unit.program.items.len(), 1);
}

#[test]
fn parse_error_stops_pipeline() {
    let unit = unit("problem P { set A }");
    assert_eq!(error_codes(&unit), vec!["QSOL1001"]);
    // No later-stage tables are produced.
    assert!(unit.names.is_empty());
}

#[test]
fn unknown_identifier_is_reported() {
    let unit = unit(indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must Pick.has(ghost);
        }
    "});
    assert_eq!(error_codes(&unit), vec!["QSOL2001"]);
}

#[test]
fn duplicate_declaration_is_reported() {
    let unit = unit(indoc! {"
        problem P {
            set Items;
            set Items;
        }
    "});
    assert_eq!(error_codes(&unit), vec!["QSOL2002"]);
}

#[test]
fn has_arity_is_type_error() {
    let unit = unit(indoc! {"
        problem P {
            set Items;
            param a: Elem(Items);
            param b: Elem(Items);
            find Pick : Subset(Items);
            must Pick.has(a, b);
        }
    "});
    assert_eq!(error_codes(&unit), vec!["QSOL2101"]);
}

#[test]
fn indexed_param_called_like_macro_is_reported() {
    let unit = unit(indoc! {"
        problem P {
            set I, J;
            param Cost(I, J): Real = 0.0;
            find Pick : Subset(I);
            must sum(Cost(i, i) for i in I) >= 0;
        }
    "});
    // `Cost(i, i)` is a call, not an indexed read.
    assert!(error_codes(&unit).contains(&"QSOL2101".to_string()));
}

#[test]
fn sources_keep_offsets() {
    let map = SourceMap::new([
        ("a.qsol".into(), "set A;".into()),
        ("b.qsol".into(), "set B;".into()),
    ]);
    let first = map.file_named("a.qsol").expect("source should exist");
    let second = map.file_named("b.qsol").expect("source should exist");
    assert_eq!(first.base, 0);
    assert!(second.base > first.base);
    let (found, at) = map.locate(second.base + 4).expect("offset should resolve");
    assert_eq!(found.name, "b.qsol");
    assert_eq!(at.line, 1);
    assert_eq!(at.column, 5);
}
