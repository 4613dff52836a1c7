// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{FailurePolicy, Interpreter, MergePolicy, PipelineConfig, ScenarioSpec};
use crate::{error::Error, run::RunStatus, test_utils};
use indoc::indoc;
use qsolc_ground::scenario::Scenario;
use serde_json::json;
use std::collections::BTreeMap;

fn spec(scenario: &str) -> ScenarioSpec {
    ScenarioSpec {
        name: "default".to_string(),
        scenario: Scenario::from_json(scenario).expect("scenario should parse"),
        ..ScenarioSpec::default()
    }
}

fn run(source: &str, scenario: &str) -> crate::run::StandardRunResult {
    Interpreter::new(PipelineConfig::default())
        .run_scenario("main.qsol", source, &spec(scenario))
        .expect("run should succeed")
}

fn run_errors(source: &str, scenario: &str) -> Vec<Error> {
    Interpreter::new(PipelineConfig::default())
        .run_scenario("main.qsol", source, &spec(scenario))
        .expect_err("run should fail")
}

fn codes(errors: &[Error]) -> Vec<String> {
    errors
        .iter()
        .map(|error| error.code_string().unwrap_or_else(|| "<none>".to_string()))
        .collect()
}

#[test]
fn exact_k_subset() {
    let source = indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "};
    let data = r#"{"sets": {"Items": ["i1", "i2", "i3", "i4"]}}"#;

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.energy, Some(2.0));
    assert_eq!(result.selected_assignments.len(), 2);
    for assignment in &result.selected_assignments {
        assert!(assignment.meaning.starts_with("Pick.has("));
    }

    // Exactly one user equality constraint, zero structural laws, at least four
    // variables.
    let model = test_utils::model(source, data);
    assert_eq!(model.cqm.len(), 1);
    assert!(model.cqm.iter().all(|c| !c.structural));
    assert!(model.stats.num_variables >= 4);
}

#[test]
fn three_coloring_of_a_triangle() {
    let source = indoc! {"
        problem Coloring {
            set V, C, E;
            param U(E): Elem(V);
            param W(E): Elem(V);
            find ColorOf : Mapping(V -> C);
            must forall e in E: forall c in C:
                not (ColorOf.is(U[e], c) and ColorOf.is(W[e], c));
        }
    "};
    let data = r#"{
        "sets": {"V": ["N1", "N2", "N3"], "C": ["Red", "Green", "Blue"], "E": ["e1", "e2", "e3"]},
        "params": {
            "U": {"e1": "N1", "e2": "N2", "e3": "N1"},
            "W": {"e1": "N2", "e2": "N3", "e3": "N3"}
        }
    }"#;

    let model = test_utils::model(source, data);
    let one_hot = model.cqm.iter().filter(|c| c.structural).count();
    assert_eq!(one_hot, 3, "one structural one-hot row per vertex");

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.energy, Some(0.0));

    // Exactly one color per vertex, and adjacent vertices differ.
    let mut colors: BTreeMap<&str, &str> = BTreeMap::new();
    for assignment in &result.selected_assignments {
        let inner = assignment
            .meaning
            .strip_prefix("ColorOf.is(")
            .and_then(|rest| rest.strip_suffix(')'))
            .expect("meaning should be a mapping assignment");
        let (vertex, color) = inner.split_once(',').expect("pair");
        assert!(
            colors.insert(vertex, color).is_none(),
            "vertex {vertex} should be colored once"
        );
    }
    assert_eq!(colors.len(), 3);
    for (u, w) in [("N1", "N2"), ("N2", "N3"), ("N1", "N3")] {
        assert_ne!(colors[u], colors[w], "edge {u}-{w} should not be monochrome");
    }
}

#[test]
fn max_cut_on_k3() {
    let source = indoc! {"
        problem MaxCut {
            set V, E;
            param U(E): Elem(V);
            param W(E): Elem(V);
            find S : Subset(V);
            maximize sum(if S.has(U[e]) != S.has(W[e]) then 1 else 0 for e in E);
        }
    "};
    let data = r#"{
        "sets": {"V": ["a", "b", "c"], "E": ["e1", "e2", "e3"]},
        "params": {
            "U": {"e1": "a", "e2": "b", "e3": "a"},
            "W": {"e1": "b", "e2": "c", "e3": "c"}
        }
    }"#;

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    // Maximum cut of a triangle is 2; internally minimized as -2.
    assert_eq!(result.energy, Some(-2.0));
}

#[test]
fn knapsack() {
    let source = indoc! {"
        problem Knapsack {
            set I;
            param Value(I): Real;
            param Weight(I): Real;
            param Capacity: Real;
            find Take : Subset(I);
            must sum(if Take.has(i) then Weight[i] else 0 for i in I) <= Capacity;
            maximize sum(if Take.has(i) then Value[i] else 0 for i in I);
        }
    "};
    let data = r#"{
        "sets": {"I": ["i1", "i2", "i3"]},
        "params": {
            "Value": {"i1": 3, "i2": 5, "i3": 4},
            "Weight": {"i1": 2, "i2": 3, "i3": 4},
            "Capacity": 5
        }
    }"#;

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.energy, Some(-8.0));
    let meanings: Vec<&str> = result
        .selected_assignments
        .iter()
        .map(|a| a.meaning.as_str())
        .collect();
    assert_eq!(meanings, vec!["Take.has(i1)", "Take.has(i2)"]);
}

#[test]
fn min_bisection_on_a_four_cycle() {
    let source = indoc! {"
        problem Bisect {
            set V, E;
            param U(E): Elem(V);
            param W(E): Elem(V);
            find Side : Subset(V);
            must count(v in V where Side.has(v)) * 2 = size(V);
            minimize sum(if Side.has(U[e]) != Side.has(W[e]) then 1 else 0 for e in E);
        }
    "};
    let data = r#"{
        "sets": {"V": ["v1", "v2", "v3", "v4"], "E": ["e1", "e2", "e3", "e4"]},
        "params": {
            "U": {"e1": "v1", "e2": "v2", "e3": "v3", "e4": "v4"},
            "W": {"e1": "v2", "e2": "v3", "e3": "v4", "e4": "v1"}
        }
    }"#;

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    // The minimum number of crossing edges on a 4-cycle bisection is 2, with two
    // vertices on each side.
    assert_eq!(result.energy, Some(2.0));
    assert_eq!(result.selected_assignments.len(), 2);
}

#[test]
fn exactly_two_via_stdlib_macro() {
    let source = indoc! {"
        use stdlib.constraints;

        problem P {
            set Items;
            find Pick : Subset(Items);
            must exactly(2, Pick.has(i) for i in Items);
        }
    "};
    let data = r#"{"sets": {"Items": ["i1", "i2", "i3"]}}"#;

    let result = run(source, data);
    assert_eq!(result.status, RunStatus::Ok);
    let picks: Vec<&str> = result
        .selected_assignments
        .iter()
        .map(|a| a.meaning.as_str())
        .collect();
    assert_eq!(picks.len(), 2);
    for pick in picks {
        assert!(pick.starts_with("Pick.has("));
    }
}

#[test]
fn missing_semicolon_is_a_parse_error() {
    let errors = run_errors(
        "problem P { set A\n find X : Subset(A); }",
        r#"{"sets": {"A": []}}"#,
    );
    assert!(codes(&errors).contains(&"QSOL1001".to_string()));
}

#[test]
fn missing_scenario_set_is_a_data_error() {
    let errors = run_errors(
        indoc! {"
            problem P {
                set V;
                find S : Subset(V);
            }
        "},
        r#"{}"#,
    );
    assert_eq!(codes(&errors), vec!["QSOL2201"]);
}

#[test]
fn cubic_objective_is_a_backend_error() {
    let errors = run_errors(
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
    assert_eq!(codes(&errors), vec!["QSOL3001"]);
}

#[test]
fn unknown_problem_name_is_a_config_error() {
    let errors = run_errors(
        "problem P { set V; find S : Subset(V); }",
        r#"{"problem": "Ghost", "sets": {"V": ["a"]}}"#,
    );
    assert_eq!(codes(&errors), vec!["QSOL4002"]);
}

#[test]
fn multiple_problems_require_a_selector() {
    let errors = run_errors(
        indoc! {"
            problem A { set V; find S : Subset(V); }
            problem B { set V; find S : Subset(V); }
        "},
        r#"{"sets": {"V": ["a"]}}"#,
    );
    assert_eq!(codes(&errors), vec!["QSOL4002"]);
}

#[test]
fn threshold_failure_keeps_the_result() {
    let source = indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "};
    let mut config = PipelineConfig::default();
    config
        .cli_options
        .insert("energy_max".to_string(), json!(1.0));
    let result = Interpreter::new(config)
        .run_scenario(
            "main.qsol",
            source,
            &spec(r#"{"sets": {"Items": ["i1", "i2", "i3"]}}"#),
        )
        .expect("threshold failures still finalize the run");
    assert_eq!(result.status, RunStatus::ThresholdFailed);
    assert_eq!(result.energy, Some(2.0));
}

#[test]
fn cancellation_aborts_between_stages() {
    let interpreter = Interpreter::new(PipelineConfig::default());
    interpreter.cancel_token().cancel();
    let errors = interpreter
        .run_scenario(
            "main.qsol",
            "problem P { set V; find S : Subset(V); }",
            &spec(r#"{"sets": {"V": ["a"]}}"#),
        )
        .expect_err("cancelled run should abort");
    assert!(matches!(errors[0], Error::Cancelled));
}

#[test]
fn artifacts_are_written_for_successful_runs() {
    let dir = test_utils::scratch_dir("interpret-artifacts");
    let config = PipelineConfig {
        out_dir: Some(dir.clone()),
        ..PipelineConfig::default()
    };
    let result = Interpreter::new(config)
        .run_scenario(
            "main.qsol",
            indoc! {"
                problem P {
                    set Items;
                    find Pick : Subset(Items);
                    must sum(if Pick.has(i) then 1 else 0 for i in Items) = 1;
                }
            "},
            &spec(r#"{"sets": {"Items": ["a", "b"]}}"#),
        )
        .expect("run should succeed");

    for name in [
        "model.cqm",
        "model.bqm",
        "qubo.json",
        "ising.json",
        "varmap.json",
        "capability_report.json",
        "run.json",
        "explain.json",
        "qsol.log",
    ] {
        assert!(dir.join(name).exists(), "{name} should be written");
    }
    assert_eq!(
        result.capability_report_path,
        Some(dir.join("capability_report.json").display().to_string())
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cancelled_runs_do_not_finalize_run_json() {
    let dir = test_utils::scratch_dir("interpret-cancelled");
    let config = PipelineConfig {
        out_dir: Some(dir.clone()),
        ..PipelineConfig::default()
    };
    let interpreter = Interpreter::new(config);
    interpreter.cancel_token().cancel();
    let _ = interpreter.run_scenario(
        "main.qsol",
        "problem P { set V; find S : Subset(V); }",
        &spec(r#"{"sets": {"V": ["a"]}}"#),
    );
    assert!(!dir.join("run.json").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scenarios_merge_by_intersection_and_union() {
    let source = indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 1;
        }
    "};
    // Two scenarios over overlapping item sets; top-2 solutions each.
    let mut solve_options = BTreeMap::new();
    solve_options.insert("solutions".to_string(), json!(3));
    let specs = vec![
        ScenarioSpec {
            name: "first".to_string(),
            scenario: Scenario::from_json(r#"{"sets": {"Items": ["a", "b"]}}"#).expect("payload"),
            solve_options: solve_options.clone(),
            ..ScenarioSpec::default()
        },
        ScenarioSpec {
            name: "second".to_string(),
            scenario: Scenario::from_json(r#"{"sets": {"Items": ["b", "c"]}}"#).expect("payload"),
            solve_options,
            ..ScenarioSpec::default()
        },
    ];

    let intersect = Interpreter::new(PipelineConfig {
        merge: MergePolicy::Intersection,
        ..PipelineConfig::default()
    })
    .run_scenarios("main.qsol", source, &specs);
    assert_eq!(intersect.outcomes.len(), 2);
    assert_eq!(intersect.merged, vec!["Pick.has(b)".to_string()]);

    let union = Interpreter::new(PipelineConfig {
        merge: MergePolicy::Union,
        ..PipelineConfig::default()
    })
    .run_scenarios("main.qsol", source, &specs);
    assert_eq!(
        union.merged,
        vec![
            "Pick.has(a)".to_string(),
            "Pick.has(b)".to_string(),
            "Pick.has(c)".to_string(),
        ]
    );
}

#[test]
fn fail_fast_stops_after_the_first_failure() {
    let source = "problem P { set V; find S : Subset(V); }";
    let specs = vec![
        ScenarioSpec {
            name: "broken".to_string(),
            scenario: Scenario::from_json(r#"{}"#).expect("payload"),
            ..ScenarioSpec::default()
        },
        ScenarioSpec {
            name: "fine".to_string(),
            scenario: Scenario::from_json(r#"{"sets": {"V": ["a"]}}"#).expect("payload"),
            ..ScenarioSpec::default()
        },
    ];

    let fail_fast = Interpreter::new(PipelineConfig {
        failure_policy: FailurePolicy::FailFast,
        ..PipelineConfig::default()
    })
    .run_scenarios("main.qsol", source, &specs);
    assert_eq!(fail_fast.outcomes.len(), 1);
    assert!(fail_fast.outcomes[0].result.is_err());

    let best_effort = Interpreter::new(PipelineConfig {
        failure_policy: FailurePolicy::BestEffort,
        ..PipelineConfig::default()
    })
    .run_scenarios("main.qsol", source, &specs);
    assert_eq!(best_effort.outcomes.len(), 2);
    assert!(best_effort.outcomes[0].result.is_err());
    assert!(best_effort.outcomes[1].result.is_ok());
}

#[test]
fn identical_runs_decode_identically() {
    let source = indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "};
    let data = r#"{"sets": {"Items": ["i1", "i2", "i3", "i4"]}}"#;
    let first = run(source, data);
    let second = run(source, data);
    assert_eq!(first.selected_assignments, second.selected_assignments);
    assert_eq!(first.energy, second.energy);
}
