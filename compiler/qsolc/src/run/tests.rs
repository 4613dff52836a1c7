// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{postprocess, RunStatus};
use crate::{
    runtimes::{RawSample, RuntimeError, RuntimeOptions},
    test_utils,
};
use serde_json::json;

const EXACT_K: &str = indoc::indoc! {"
    problem P {
        set Items;
        find Pick : Subset(Items);
        must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
        minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
    }
"};
const DATA: &str = r#"{"sets": {"Items": ["i1", "i2", "i3", "i4"]}}"#;

fn sample(bits: Vec<bool>, occurrences: u32) -> RawSample {
    RawSample {
        bits,
        energy: 0.0,
        num_occurrences: occurrences,
    }
}

#[test]
fn infeasible_samples_are_filtered() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![
        sample(vec![true, false, false, false], 1),  // one picked: infeasible
        sample(vec![true, true, false, false], 1),   // two picked: feasible
        sample(vec![true, true, true, true], 1),     // four picked: infeasible
    ];
    let (result, error) = postprocess(
        &model,
        "exact-v1",
        "dimod-cqm-v1",
        samples,
        &RuntimeOptions::new(),
        1,
    );
    assert!(error.is_none());
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.selected_assignments.len(), 2);
}

#[test]
fn duplicates_accumulate_occurrences() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![
        sample(vec![true, true, false, false], 1),
        sample(vec![true, true, false, false], 2),
        sample(vec![false, false, true, true], 1),
    ];
    let mut options = RuntimeOptions::new();
    options.set("solutions", json!(5));
    let (result, _) = postprocess(&model, "exact-v1", "dimod-cqm-v1", samples, &options, 1);
    assert_eq!(result.extensions.solutions.len(), 2);
    let merged = result
        .extensions
        .solutions
        .iter()
        .find(|s| s.sample["Pick.has[i1]"] == 1)
        .expect("the duplicated sample should survive");
    assert_eq!(merged.num_occurrences, 3);
}

#[test]
fn results_order_by_energy_then_sample() {
    // With equal energies, the canonical sample ordering breaks ties.
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![
        sample(vec![false, false, true, true], 1),
        sample(vec![true, true, false, false], 1),
    ];
    let mut options = RuntimeOptions::new();
    options.set("solutions", json!(2));
    let (result, _) = postprocess(&model, "exact-v1", "dimod-cqm-v1", samples, &options, 1);
    // [false, ...] sorts before [true, ...].
    assert_eq!(result.extensions.solutions[0].sample["Pick.has[i1]"], 0);
    assert_eq!(result.extensions.solutions[1].sample["Pick.has[i1]"], 1);
}

#[test]
fn no_feasible_sample_fails_the_run() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![sample(vec![false, false, false, false], 1)];
    let (result, error) = postprocess(
        &model,
        "exact-v1",
        "dimod-cqm-v1",
        samples,
        &RuntimeOptions::new(),
        1,
    );
    assert_eq!(result.status, RunStatus::Failed);
    assert!(matches!(error, Some(RuntimeError::Execution(_))));
}

#[test]
fn threshold_violation_sets_status() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![sample(vec![true, true, false, false], 1)];
    let mut options = RuntimeOptions::new();
    options.set("energy_max", json!(1.0));
    let (result, error) = postprocess(&model, "exact-v1", "dimod-cqm-v1", samples, &options, 1);
    // The best energy is 2, above the maximum of 1.
    assert_eq!(result.status, RunStatus::ThresholdFailed);
    assert!(matches!(error, Some(RuntimeError::ThresholdFailed { .. })));
}

#[test]
fn decoded_assignments_are_the_active_primaries() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![sample(vec![true, false, true, false], 1)];
    let (result, _) = postprocess(
        &model,
        "exact-v1",
        "dimod-cqm-v1",
        samples,
        &RuntimeOptions::new(),
        1,
    );
    let meanings: Vec<&str> = result
        .selected_assignments
        .iter()
        .map(|a| a.meaning.as_str())
        .collect();
    assert_eq!(meanings, vec!["Pick.has(i1)", "Pick.has(i3)"]);
    // Decoded assignments are a subset of the best sample's set bits.
    for assignment in &result.selected_assignments {
        assert_eq!(result.best_sample[&assignment.label], 1);
    }
}

#[test]
fn energy_is_the_objective_value() {
    let model = test_utils::model(EXACT_K, DATA);
    let samples = vec![sample(vec![true, true, false, false], 1)];
    let (result, _) = postprocess(
        &model,
        "exact-v1",
        "dimod-cqm-v1",
        samples,
        &RuntimeOptions::new(),
        1,
    );
    assert_eq!(result.energy, Some(2.0));
}
