// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The QSOL compiler driver: ties the staged pipeline together (parse, elaborate,
//! resolve, check, desugar, lower, ground, emit), selects a runtime and backend through
//! the plugin registry with capability gating, dispatches the compiled model, and
//! decodes ranked solutions back to user-level assignments.

pub mod artifacts;
pub mod error;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod interpret;
pub mod plugins;
pub mod report;
pub mod run;
pub mod runtimes;
pub mod support;
pub mod target;

pub use error::Error;
pub use interpret::{Interpreter, PipelineConfig};
pub use run::StandardRunResult;
