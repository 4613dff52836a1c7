// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Built-in runtimes and the runtime option surface. The runtime call is an opaque
//! synchronous operation; runtimes honor a cooperative `timeout_ms` option and report
//! overruns as `QSOL5001`.

mod anneal;
mod exact;

pub use anneal::AnnealRuntime;
pub use exact::ExactRuntime;

use crate::plugins::{BackendPlugin, CapabilityCatalog, CapabilityLevel};
use miette::Diagnostic;
use qsolc_codegen::emit::CompiledModel;
use qsolc_gir::gir::GroundProblem;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One raw sample returned by a runtime: variable assignments in declaration order,
/// the sampled energy, and how often the sampler saw it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    pub bits: Vec<bool>,
    pub energy: f64,
    pub num_occurrences: u32,
}

/// Runtime errors.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum RuntimeError {
    #[error("runtime execution failed: {0}")]
    #[diagnostic(code("QSOL5001"))]
    Execution(String),

    #[error("runtime exceeded its timeout of {0} ms")]
    #[diagnostic(code("QSOL5001"))]
    Timeout(u64),

    #[error("no solution within the energy thresholds [{min}, {max}]")]
    #[diagnostic(code("QSOL5002"))]
    ThresholdFailed { min: f64, max: f64 },
}

/// Free-form runtime options with layered precedence: CLI pairs over an options file
/// over the scenario's solve section over config defaults.
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    values: BTreeMap<String, Value>,
}

impl RuntimeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the layers, strongest last wins per key.
    #[must_use]
    pub fn layered(layers: &[&BTreeMap<String, Value>]) -> Self {
        let mut values = BTreeMap::new();
        for layer in layers.iter().rev() {
            for (key, value) in *layer {
                values.insert(key.clone(), value.clone());
            }
        }
        Self { values }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    /// The requested number of decoded solutions; defaults to one.
    #[must_use]
    pub fn solutions(&self) -> usize {
        usize::try_from(self.u64_or("solutions", 1)).unwrap_or(1)
    }

    /// The cooperative timeout, if any.
    #[must_use]
    pub fn timeout_ms(&self) -> Option<u64> {
        self.values.get("timeout_ms").and_then(Value::as_u64)
    }

    /// All option values, for the run report.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

/// The built-in quadratic-model backend: the `qsolc_codegen` emitter behind the stable
/// id `dimod-cqm-v1`.
pub struct DimodCqmBackend;

impl BackendPlugin for DimodCqmBackend {
    fn id(&self) -> &str {
        crate::target::DEFAULT_BACKEND
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        [
            qsolc_rca::UNKNOWN_SUBSET,
            qsolc_rca::UNKNOWN_MAPPING,
            qsolc_rca::COMPARE_EQ,
            qsolc_rca::COMPARE_LE,
            qsolc_rca::LOGIC,
            qsolc_rca::OBJECTIVE_SUM,
            qsolc_rca::OBJECTIVE_SOFT,
        ]
        .into_iter()
        .map(|capability| (capability.to_string(), CapabilityLevel::Full))
        .collect()
    }

    fn compile_model(
        &self,
        ground: &GroundProblem,
    ) -> Result<CompiledModel, Vec<qsolc_codegen::Error>> {
        qsolc_codegen::emit::emit(ground)
    }
}
