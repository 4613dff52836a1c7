// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The simulated-annealing runtime: seeded single-flip Metropolis sweeps over the BQM
//! with a geometric inverse-temperature schedule. Identical seeds and options produce
//! identical samples.

#[cfg(test)]
mod tests;

use super::{RawSample, RuntimeError, RuntimeOptions};
use crate::plugins::{CapabilityCatalog, RuntimePlugin};
use qsolc_codegen::emit::CompiledModel;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;

const DEFAULT_READS: u64 = 16;
const DEFAULT_SWEEPS: u64 = 500;
const DEFAULT_SEED: u64 = 0x51_50_4f_4c;

pub struct AnnealRuntime;

impl RuntimePlugin for AnnealRuntime {
    fn id(&self) -> &str {
        "anneal-v1"
    }

    fn compatible_backend_ids(&self) -> Vec<String> {
        vec![crate::target::DEFAULT_BACKEND.to_string()]
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        crate::runtimes::DimodCqmBackend.capability_catalog()
    }

    fn run_model(
        &self,
        model: &CompiledModel,
        options: &RuntimeOptions,
    ) -> Result<Vec<RawSample>, RuntimeError> {
        let n = model.vars.len();
        if n == 0 {
            return Ok(vec![RawSample {
                bits: Vec::new(),
                energy: model.bqm.offset,
                num_occurrences: 1,
            }]);
        }

        let reads = options.u64_or("reads", DEFAULT_READS);
        let sweeps = options.u64_or("sweeps", DEFAULT_SWEEPS);
        let seed = options.u64_or("seed", DEFAULT_SEED);
        let beta0 = options.f64("beta0").unwrap_or(0.1);
        let beta1 = options.f64("beta1").unwrap_or(10.0);

        let started = Instant::now();
        let timeout = options.timeout_ms();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = Vec::with_capacity(usize::try_from(reads).unwrap_or(0));

        for _ in 0..reads {
            if let Some(limit) = timeout {
                if started.elapsed().as_millis() > u128::from(limit) {
                    return Err(RuntimeError::Timeout(limit));
                }
            }

            let mut bits: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();
            let mut energy = model.bqm.evaluate(|id| bits[usize::from(id)]);

            for sweep in 0..sweeps {
                #[allow(clippy::cast_precision_loss)]
                let progress = sweep as f64 / sweeps.max(1) as f64;
                let beta = beta0 * (beta1 / beta0).powf(progress);
                for flip in 0..n {
                    bits[flip] = !bits[flip];
                    let candidate = model.bqm.evaluate(|id| bits[usize::from(id)]);
                    let delta = candidate - energy;
                    if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
                        energy = candidate;
                    } else {
                        bits[flip] = !bits[flip];
                    }
                }
            }

            samples.push(RawSample {
                bits,
                energy,
                num_occurrences: 1,
            });
        }

        Ok(samples)
    }
}
