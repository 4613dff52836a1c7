// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Target selection: resolving the `(runtime, backend)` pair from the layered
//! configuration surface. Precedence, strongest first: CLI, scenario execution,
//! config entrypoint, built-in defaults.


use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// The default runtime id.
pub const DEFAULT_RUNTIME: &str = "exact-v1";
/// The default backend id.
pub const DEFAULT_BACKEND: &str = "dimod-cqm-v1";

/// A resolved runtime/backend pair.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TargetSelection {
    pub runtime_id: String,
    pub backend_id: String,
}

/// One layer of the selection surface; unset fields defer to the next layer.
#[derive(Clone, Debug, Default)]
pub struct SelectionLayer {
    pub runtime: Option<String>,
    pub backend: Option<String>,
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("no {0} selection could be resolved")]
    #[diagnostic(code("QSOL4006"))]
    Unresolved(&'static str),

    #[error("unknown {0} id `{1}`")]
    #[diagnostic(code("QSOL4007"))]
    UnknownId(&'static str, String),

    #[error("runtime `{0}` is not compatible with backend `{1}`")]
    #[diagnostic(code("QSOL4008"))]
    Incompatible(String, String),
}

/// Resolves the selection from the layered surface: CLI over scenario execution over
/// config entrypoint over defaults.
#[must_use]
pub fn resolve(
    cli: &SelectionLayer,
    scenario: &SelectionLayer,
    config: &SelectionLayer,
) -> TargetSelection {
    let runtime = cli
        .runtime
        .clone()
        .or_else(|| scenario.runtime.clone())
        .or_else(|| config.runtime.clone())
        .unwrap_or_else(|| DEFAULT_RUNTIME.to_string());
    let backend = cli
        .backend
        .clone()
        .or_else(|| scenario.backend.clone())
        .or_else(|| config.backend.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND.to_string());
    TargetSelection {
        runtime_id: runtime,
        backend_id: backend,
    }
}
