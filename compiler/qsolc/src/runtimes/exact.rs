// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The exact runtime: exhaustive enumeration of every binary assignment. Intended for
//! model validation and tests; refuses models past a fixed size.


use super::{RawSample, RuntimeError, RuntimeOptions};
use crate::plugins::{CapabilityCatalog, RuntimePlugin};
use qsolc_codegen::emit::CompiledModel;
use std::time::Instant;

/// Enumeration past this many variables would take too long to be useful.
const MAX_VARIABLES: usize = 24;

pub struct ExactRuntime;

impl RuntimePlugin for ExactRuntime {
    fn id(&self) -> &str {
        "exact-v1"
    }

    fn compatible_backend_ids(&self) -> Vec<String> {
        vec![crate::target::DEFAULT_BACKEND.to_string()]
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        // The exact runtime evaluates any quadratic model the backend can produce.
        crate::runtimes::DimodCqmBackend.capability_catalog()
    }

    fn run_model(
        &self,
        model: &CompiledModel,
        options: &RuntimeOptions,
    ) -> Result<Vec<RawSample>, RuntimeError> {
        let n = model.vars.len();
        if n > MAX_VARIABLES {
            return Err(RuntimeError::Execution(format!(
                "exact enumeration is limited to {MAX_VARIABLES} variables, model has {n}"
            )));
        }

        let started = Instant::now();
        let timeout = options.timeout_ms();
        let mut samples = Vec::with_capacity(1 << n);
        for assignment in 0u64..(1 << n) {
            if let Some(limit) = timeout {
                if started.elapsed().as_millis() > u128::from(limit) {
                    return Err(RuntimeError::Timeout(limit));
                }
            }
            let bits: Vec<bool> = (0..n).map(|i| assignment & (1 << i) != 0).collect();
            let energy = model.bqm.evaluate(|id| bits[usize::from(id)]);
            samples.push(RawSample {
                bits,
                energy,
                num_occurrences: 1,
            });
        }
        Ok(samples)
    }
}

impl ExactRuntime {
    /// The enumeration bound, exposed for capability reporting.
    #[must_use]
    pub fn max_variables() -> usize {
        MAX_VARIABLES
    }
}
