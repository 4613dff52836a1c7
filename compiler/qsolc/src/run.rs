// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Post-processing of raw runtime samples: filter to CQM-feasible assignments,
//! deduplicate, order deterministically, apply energy thresholds, and decode the
//! selected solutions through the varmap into user-level assignments.

#[cfg(test)]
mod tests;

use crate::runtimes::{RawSample, RuntimeError, RuntimeOptions};
use qsolc_codegen::emit::CompiledModel;
use qsolc_gir::gir::VarKind;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The stable schema version of [`StandardRunResult`].
pub const SCHEMA_VERSION: u32 = 1;

/// The run outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run produced solutions within the thresholds.
    Ok,
    /// Solutions were produced but violate the energy thresholds.
    ThresholdFailed,
    /// The scenario could not be grounded or compiled.
    ScenarioFailed,
    /// The runtime failed or returned no feasible sample.
    Failed,
}

/// One decoded assignment: a primary binary with value 1.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Assignment {
    pub label: String,
    pub meaning: String,
    pub value: u8,
}

/// One decoded solution.
#[derive(Clone, Debug, Serialize)]
pub struct Solution {
    pub energy: f64,
    pub num_occurrences: u32,
    pub sample: BTreeMap<String, u8>,
    pub assignments: Vec<Assignment>,
}

/// Extension payload of the run result.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Extensions {
    pub solutions: Vec<Solution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_threshold: Option<(Option<f64>, Option<f64>)>,
    pub runtime_options: BTreeMap<String, Value>,
}

/// The stable JSON contract produced by the run phase.
#[derive(Clone, Debug, Serialize)]
pub struct StandardRunResult {
    pub schema_version: u32,
    pub runtime: String,
    pub backend: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    pub reads: usize,
    pub best_sample: BTreeMap<String, u8>,
    pub selected_assignments: Vec<Assignment>,
    pub timing_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_report_path: Option<String>,
    pub extensions: Extensions,
}

/// Ranks and decodes raw samples into a run result.
///
/// # Errors
/// `QSOL5002` when solutions exist but every selected one violates the inclusive
/// energy thresholds; the partially filled result is returned with the error.
pub fn postprocess(
    model: &CompiledModel,
    runtime_id: &str,
    backend_id: &str,
    samples: Vec<RawSample>,
    options: &RuntimeOptions,
    timing_ms: u128,
) -> (StandardRunResult, Option<RuntimeError>) {
    let reads = samples.len();

    // 1. Keep samples satisfying every CQM constraint, structural laws included.
    let mut feasible: Vec<RawSample> = samples
        .into_iter()
        .filter(|sample| model.is_feasible(&|id| sample.bits[usize::from(id)]))
        .collect();

    // 2. Deduplicate by sample identity, accumulating occurrences.
    feasible.sort_by(|a, b| {
        a.bits
            .cmp(&b.bits)
    });
    feasible.dedup_by(|next, kept| {
        if next.bits == kept.bits {
            kept.num_occurrences += next.num_occurrences;
            true
        } else {
            false
        }
    });

    // 3. Recompute energy as the CQM objective and order by energy, ties broken by
    //    the canonical sample ordering.
    for sample in &mut feasible {
        sample.energy = model.objective.evaluate(|id| sample.bits[usize::from(id)]);
    }
    feasible.sort_by(|a, b| {
        a.energy
            .total_cmp(&b.energy)
            .then_with(|| a.bits.cmp(&b.bits))
    });

    // 4. Take the top N.
    let take = options.solutions().max(1);
    let selected: Vec<RawSample> = feasible.into_iter().take(take).collect();

    // 5. Inclusive energy thresholds.
    let min = options.f64("energy_min");
    let max = options.f64("energy_max");
    let threshold_violated = selected.iter().any(|sample| {
        min.is_some_and(|min| sample.energy < min) || max.is_some_and(|max| sample.energy > max)
    });

    let solutions: Vec<Solution> = selected
        .iter()
        .map(|sample| Solution {
            energy: sample.energy,
            num_occurrences: sample.num_occurrences,
            sample: full_sample(model, &sample.bits),
            assignments: decode(model, &sample.bits),
        })
        .collect();

    let (status, error) = if selected.is_empty() {
        (
            RunStatus::Failed,
            Some(RuntimeError::Execution(
                "no feasible sample was returned".to_string(),
            )),
        )
    } else if threshold_violated {
        (
            RunStatus::ThresholdFailed,
            Some(RuntimeError::ThresholdFailed {
                min: min.unwrap_or(f64::NEG_INFINITY),
                max: max.unwrap_or(f64::INFINITY),
            }),
        )
    } else {
        (RunStatus::Ok, None)
    };

    let best = selected.first();
    let result = StandardRunResult {
        schema_version: SCHEMA_VERSION,
        runtime: runtime_id.to_string(),
        backend: backend_id.to_string(),
        status,
        energy: best.map(|sample| sample.energy),
        reads,
        best_sample: best.map(|sample| full_sample(model, &sample.bits)).unwrap_or_default(),
        selected_assignments: best.map(|sample| decode(model, &sample.bits)).unwrap_or_default(),
        timing_ms,
        capability_report_path: None,
        extensions: Extensions {
            solutions,
            energy_threshold: if min.is_some() || max.is_some() {
                Some((min, max))
            } else {
                None
            },
            runtime_options: options.values().clone(),
        },
    };

    (result, error)
}

/// The full sample keyed by variable label, in canonical label order.
fn full_sample(model: &CompiledModel, bits: &[bool]) -> BTreeMap<String, u8> {
    model
        .vars
        .iter()
        .map(|(id, decl)| (decl.label.to_string(), u8::from(bits[usize::from(id)])))
        .collect()
}

/// Every primary binary with value 1, through the varmap.
fn decode(model: &CompiledModel, bits: &[bool]) -> Vec<Assignment> {
    model
        .vars
        .iter()
        .filter(|(id, decl)| decl.kind == VarKind::Primary && bits[usize::from(*id)])
        .map(|(_, decl)| Assignment {
            label: decl.label.to_string(),
            meaning: decl.meaning.to_string(),
            value: 1,
        })
        .collect()
}
