// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{emit, CompiledModel, Sense};
use crate::Error;
use indoc::indoc;
use qsolc_data_structures::cancel::CancelToken;
use qsolc_gir::gir::{VarId, VarKind};
use qsolc_ground::scenario::Scenario;

fn compiled(source: &str, scenario: &str) -> CompiledModel {
    emit(&ground(source, scenario)).expect("emission should succeed")
}

fn emit_errors(source: &str, scenario: &str) -> Vec<Error> {
    emit(&ground(source, scenario)).expect_err("emission should fail")
}

fn ground(source: &str, scenario: &str) -> qsolc_gir::gir::GroundProblem {
    let mut unit = qsolc_frontend::compile::compile(
        qsolc_frontend::compile::SourceMap::new([("test.qsol".into(), source.into())]),
        Vec::new(),
    );
    assert!(unit.errors.is_empty(), "errors: {:?}", unit.errors);
    qsolc_lowerer::desugar::desugar(&mut unit.program);
    let kernel = qsolc_lowerer::lower::lower(&unit.program, &unit.names)
        .into_iter()
        .next()
        .expect("source should declare a problem");
    let scenario = Scenario::from_json(scenario).expect("scenario should parse");
    qsolc_ground::ground::ground(&kernel, &scenario, &CancelToken::new())
        .expect("grounding should succeed")
}

/// Every assignment of the model's binaries, for brute-force checks on tiny models.
fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
    (0u32..(1 << n)).map(move |bits| (0..n).map(|i| bits & (1 << i) != 0).collect())
}

fn sample_fn(bits: &[bool]) -> impl Fn(VarId) -> bool + '_ {
    move |id| bits[usize::from(id)]
}

const EXACT_K: &str = indoc! {"
    problem P {
        set Items;
        find Pick : Subset(Items);
        must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
        minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
    }
"};
const EXACT_K_DATA: &str = r#"{"sets": {"Items": ["i1", "i2", "i3", "i4"]}}"#;

#[test]
fn exact_k_has_one_user_equality_and_no_structural_laws() {
    let model = compiled(EXACT_K, EXACT_K_DATA);
    assert_eq!(model.cqm.len(), 1);
    let constraint = &model.cqm[0];
    assert_eq!(constraint.sense, Sense::Eq);
    assert_eq!(constraint.rhs, 2.0);
    assert!(!constraint.structural);
    assert!(model.stats.num_variables >= 4);
}

#[test]
fn varmap_covers_primaries_and_nothing_else() {
    let model = compiled(EXACT_K, EXACT_K_DATA);
    assert_eq!(model.varmap.len(), 4);
    assert_eq!(model.varmap["Pick.has[i1]"], "Pick.has(i1)");
    for (_, decl) in model.vars.iter() {
        if decl.kind != VarKind::Primary {
            assert!(!model.varmap.contains_key(decl.label.as_ref()));
        }
    }
}

#[test]
fn mapping_emits_one_hot_row_per_domain_element() {
    let model = compiled(
        indoc! {"
            problem P {
                set V, C;
                find ColorOf : Mapping(V -> C);
            }
        "},
        r#"{"sets": {"V": ["n1", "n2", "n3"], "C": ["r", "g", "b"]}}"#,
    );
    let one_hot: Vec<_> = model.cqm.iter().filter(|c| c.structural).collect();
    assert_eq!(one_hot.len(), 3);
    for row in &one_hot {
        assert_eq!(row.sense, Sense::Eq);
        assert_eq!(row.rhs, 1.0);
        assert_eq!(row.poly.linear.len(), 3);
    }
}

#[test]
fn feasible_samples_satisfy_one_hot() {
    let model = compiled(
        indoc! {"
            problem P {
                set V, C;
                find F : Mapping(V -> C);
            }
        "},
        r#"{"sets": {"V": ["a"], "C": ["x", "y"]}}"#,
    );
    // Exactly the assignments with one variable set are feasible.
    let feasible: Vec<Vec<bool>> = assignments(2)
        .filter(|bits| model.is_feasible(&sample_fn(bits)))
        .collect();
    assert_eq!(feasible, vec![vec![true, false], vec![false, true]]);
}

#[test]
fn inequality_grows_slack_in_bqm() {
    let model = compiled(
        indoc! {"
            problem P {
                set I;
                param W(I): Real = 0.0;
                find X : Subset(I);
                must sum(if X.has(i) then W[i] else 0 for i in I) <= 5;
            }
        "},
        r#"{"sets": {"I": ["a", "b"]}, "params": {"W": {"a": 2.0, "b": 3.0}}}"#,
    );
    let slack_count = model
        .vars
        .iter()
        .filter(|(_, decl)| decl.kind == VarKind::Slack)
        .count();
    assert!(slack_count > 0, "a <= constraint should introduce slack");
    for (_, decl) in model.vars.iter() {
        if decl.kind == VarKind::Slack {
            assert!(decl.label.starts_with("slack_"));
        }
    }
}

#[test]
fn negated_conjunction_is_a_quadratic_equality() {
    // not (a and b) over two membership bits: a * b = 0.
    let model = compiled(
        indoc! {"
            problem P {
                set V;
                param u: Elem(V);
                param w: Elem(V);
                find S : Subset(V);
                must not (S.has(u) and S.has(w)) if size(V) = 2;
            }
        "},
        r#"{"sets": {"V": ["p", "q"]}, "params": {"u": "p", "w": "q"}}"#,
    );
    let user: Vec<_> = model.cqm.iter().filter(|c| !c.structural).collect();
    assert_eq!(user.len(), 1);
    assert_eq!(user[0].sense, Sense::Eq);
    assert_eq!(user[0].rhs, 0.0);
    assert_eq!(user[0].poly.quadratic.len(), 1);
}

#[test]
fn bqm_minimum_is_feasible() {
    // Backend soundness: a zero-penalty BQM minimum satisfies the CQM.
    let model = compiled(EXACT_K, EXACT_K_DATA);
    let n = model.vars.len();
    assert!(n <= 16, "test model should stay tiny");

    let mut best_energy = f64::INFINITY;
    let mut best: Vec<bool> = Vec::new();
    for bits in assignments(n) {
        let energy = model.bqm.evaluate(sample_fn(&bits));
        if energy < best_energy {
            best_energy = energy;
            best = bits;
        }
    }
    assert!(
        model.is_feasible(&sample_fn(&best)),
        "the BQM minimum should satisfy every constraint"
    );
    // Exactly two items picked, energy 2 under minimization.
    let picked = best.iter().take(4).filter(|&&b| b).count();
    assert_eq!(picked, 2);
    let objective = model.objective.evaluate(sample_fn(&best));
    assert!((objective - 2.0).abs() < 1e-9);
}

#[test]
fn xor_objective_stays_quadratic() {
    // S.has(u) != S.has(w) in an objective reduces to the XOR polynomial.
    let model = compiled(
        indoc! {"
            problem P {
                set V;
                param u: Elem(V);
                param w: Elem(V);
                find S : Subset(V);
                maximize if S.has(u) != S.has(w) then 1 else 0;
            }
        "},
        r#"{"sets": {"V": ["p", "q"]}, "params": {"u": "p", "w": "q"}}"#,
    );
    assert!(model.cqm.is_empty());
    // Objective is -(x + y - 2xy); cut assignments reach -1.
    let best = assignments(2)
        .map(|bits| model.objective.evaluate(sample_fn(&bits)))
        .fold(f64::INFINITY, f64::min);
    assert!((best - -1.0).abs() < 1e-9);
}

#[test]
fn soft_constraints_weight_the_objective() {
    let model = compiled(
        indoc! {"
            problem P {
                set V;
                param a: Elem(V);
                param b: Elem(V);
                find S : Subset(V);
                should S.has(a);
                nice S.has(b);
            }
        "},
        r#"{"sets": {"V": ["p", "q"]}, "params": {"a": "p", "b": "q"}}"#,
    );
    // No hard rows; the objective is the weighted penalties. Violating the `should`
    // costs 10, the `nice` costs 1.
    assert!(model.cqm.is_empty());
    let none = model.objective.evaluate(|_| false);
    let both = model.objective.evaluate(|_| true);
    assert!((none - 11.0).abs() < 1e-9);
    assert!(both.abs() < 1e-9);
}

#[test]
fn objective_without_declaration_is_soft_penalties_only() {
    let model = compiled(
        indoc! {"
            problem P {
                set V;
                find S : Subset(V);
            }
        "},
        r#"{"sets": {"V": ["p"]}}"#,
    );
    assert!(model.objective.is_constant());
    assert_eq!(model.objective.offset, 0.0);
}

#[test]
fn cubic_objective_is_rejected() {
    let errors = emit_errors(
        indoc! {"
            problem P {
                set V;
                param a: Elem(V);
                param b: Elem(V);
                param c: Elem(V);
                find S : Subset(V);
                minimize (if S.has(a) then 1 else 0)
                    * (if S.has(b) then 1 else 0)
                    * (if S.has(c) then 1 else 0);
            }
        "},
        r#"{"sets": {"V": ["p", "q", "r"]}, "params": {"a": "p", "b": "q", "c": "r"}}"#,
    );
    assert!(matches!(errors[0], Error::Degree(_)));
}

#[test]
fn stats_count_everything() {
    let model = compiled(
        indoc! {"
            problem P {
                set I;
                find X : Subset(I);
                must sum(if X.has(i) then 1 else 0 for i in I) <= 1;
            }
        "},
        r#"{"sets": {"I": ["a", "b", "c"]}}"#,
    );
    assert_eq!(model.stats.num_constraints, model.cqm.len());
    assert_eq!(model.stats.num_variables, model.vars.len());
    assert_eq!(model.stats.num_interactions, model.bqm.quadratic.len());
    assert!(model.stats.num_variables > 3, "slack binaries should count");
}

#[test]
fn disjunction_uses_aux_gadget() {
    let model = compiled(
        indoc! {"
            problem P {
                set V;
                param a: Elem(V);
                param b: Elem(V);
                param c: Elem(V);
                find S : Subset(V);
                must S.has(a) or S.has(b) or S.has(c);
            }
        "},
        r#"{"sets": {"V": ["p", "q", "r"]}, "params": {"a": "p", "b": "q", "c": "r"}}"#,
    );
    // Nested or introduces at least one aux binary with its defining rows.
    let aux_count = model
        .vars
        .iter()
        .filter(|(_, decl)| decl.kind == VarKind::Aux)
        .count();
    assert!(aux_count >= 1);
    assert!(model.cqm.iter().any(|c| c.structural));

    // Brute-force: feasible samples are exactly those where some element is chosen.
    let n = model.vars.len();
    for bits in assignments(n) {
        if model.is_feasible(&sample_fn(&bits)) {
            assert!(bits[..3].iter().any(|&b| b));
        }
    }
    // And every choice of the primaries extends to some feasible aux assignment.
    for primary in 1usize..8 {
        let found = assignments(n).any(|bits| {
            (0..3).all(|i| bits[i] == (primary & (1 << i) != 0))
                && model.is_feasible(&sample_fn(&bits))
        });
        assert!(found, "primaries {primary:03b} should be extensible");
    }
}
