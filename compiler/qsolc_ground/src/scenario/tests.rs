// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{ParamValue, Scenario};

#[test]
fn minimal_payload() {
    let scenario = Scenario::from_json(r#"{}"#).expect("payload should parse");
    assert!(scenario.problem.is_none());
    assert!(scenario.sets.is_empty());
    assert!(scenario.params.is_empty());
}

#[test]
fn sets_keep_order() {
    let scenario = Scenario::from_json(r#"{"sets": {"Items": ["i1", "i2", "i3"]}}"#)
        .expect("payload should parse");
    assert_eq!(scenario.sets["Items"], vec!["i1", "i2", "i3"]);
}

#[test]
fn scalar_params() {
    let scenario = Scenario::from_json(
        r#"{"params": {"Capacity": 5, "Open": true, "Home": "paris"}}"#,
    )
    .expect("payload should parse");
    assert!(matches!(scenario.params["Capacity"], ParamValue::Num(n) if n == 5.0));
    assert!(matches!(scenario.params["Open"], ParamValue::Bool(true)));
    assert!(matches!(&scenario.params["Home"], ParamValue::Str(s) if s == "paris"));
}

#[test]
fn nested_params() {
    let scenario = Scenario::from_json(
        r#"{"params": {"Cost": {"a": {"x": 1.5, "y": 2.0}, "b": {"x": 0.0}}}}"#,
    )
    .expect("payload should parse");
    let ParamValue::Map(outer) = &scenario.params["Cost"] else {
        panic!("expected nested map");
    };
    let ParamValue::Map(inner) = &outer["a"] else {
        panic!("expected nested map");
    };
    assert!(matches!(inner["x"], ParamValue::Num(n) if n == 1.5));
}

#[test]
fn problem_selector() {
    let scenario =
        Scenario::from_json(r#"{"problem": "Knapsack"}"#).expect("payload should parse");
    assert_eq!(scenario.problem.as_deref(), Some("Knapsack"));
}
