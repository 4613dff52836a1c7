// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The capability gate: before dispatch, the required capabilities computed from the
//! Ground IR are cross-checked against the selected backend's and runtime's declared
//! catalogs, and the runtime's backend compatibility list. The outcome is a structured
//! support report that is also written as `capability_report.json`.

#[cfg(test)]
mod tests;

use crate::{
    plugins::{CapabilityLevel, PluginRegistry},
    target::{self, TargetSelection},
};
use miette::Diagnostic;
use qsolc_gir::gir::GroundProblem;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A typed support failure, for propagation as a diagnostic.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum SupportError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Target(#[from] target::Error),

    #[error("{owner} `{id}` does not support required capability `{capability}`")]
    #[diagnostic(code("QSOL4010"))]
    Unsupported {
        owner: &'static str,
        id: String,
        capability: String,
    },
}

/// One problem found while checking support, in its serializable report form.
#[derive(Clone, Debug, Serialize)]
pub struct SupportIssue {
    /// The stable diagnostic code (`QSOL4006`..`QSOL4010`).
    pub code: String,
    /// A human-readable message.
    pub message: String,
    /// The capability involved, when the issue is capability-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

/// The structured outcome of a support check.
#[derive(Debug, Serialize)]
pub struct SupportReport {
    pub selection: TargetSelection,
    pub supported: bool,
    pub required_capabilities: Vec<String>,
    pub backend_catalog: BTreeMap<String, CapabilityLevel>,
    pub runtime_catalog: BTreeMap<String, CapabilityLevel>,
    pub issues: Vec<SupportIssue>,
    /// Capabilities supported only partially; selection proceeds with these recorded.
    pub notes: Vec<String>,
    /// The typed counterparts of `issues`.
    #[serde(skip)]
    pub errors: Vec<SupportError>,
}

/// Checks the selection against the registry and the model's required capabilities.
#[must_use]
pub fn check(
    registry: &PluginRegistry,
    selection: &TargetSelection,
    ground: &GroundProblem,
) -> SupportReport {
    let required: Vec<String> = qsolc_rca::required_capabilities(ground)
        .into_iter()
        .collect();
    let mut errors: Vec<SupportError> = Vec::new();
    let mut notes = Vec::new();

    if selection.runtime_id.is_empty() {
        errors.push(target::Error::Unresolved("runtime").into());
    }
    if selection.backend_id.is_empty() {
        errors.push(target::Error::Unresolved("backend").into());
    }

    let backend = registry.backend(&selection.backend_id);
    if backend.is_none() && !selection.backend_id.is_empty() {
        errors.push(target::Error::UnknownId("backend", selection.backend_id.clone()).into());
    }
    let runtime = registry.runtime(&selection.runtime_id);
    if runtime.is_none() && !selection.runtime_id.is_empty() {
        errors.push(target::Error::UnknownId("runtime", selection.runtime_id.clone()).into());
    }

    if let (Some(backend), Some(runtime)) = (backend, runtime) {
        if !runtime
            .compatible_backend_ids()
            .iter()
            .any(|id| id == backend.id())
        {
            errors.push(
                target::Error::Incompatible(
                    selection.runtime_id.clone(),
                    selection.backend_id.clone(),
                )
                .into(),
            );
        }
    }

    let backend_catalog = backend.map(|b| b.capability_catalog()).unwrap_or_default();
    let runtime_catalog = runtime.map(|r| r.capability_catalog()).unwrap_or_default();

    if backend.is_some() {
        for capability in &required {
            let catalogs = [
                (&backend_catalog, "backend", &selection.backend_id),
                (&runtime_catalog, "runtime", &selection.runtime_id),
            ];
            for (catalog, owner, id) in catalogs {
                match catalog.get(capability) {
                    Some(CapabilityLevel::Full) => {}
                    Some(CapabilityLevel::Partial) => {
                        notes.push(format!("{owner} supports `{capability}` only partially"));
                    }
                    Some(CapabilityLevel::None) | None => {
                        errors.push(SupportError::Unsupported {
                            owner,
                            id: id.clone(),
                            capability: capability.clone(),
                        });
                    }
                }
            }
        }
    }

    let issues = errors.iter().map(to_issue).collect::<Vec<_>>();

    SupportReport {
        selection: selection.clone(),
        supported: errors.is_empty(),
        required_capabilities: required,
        backend_catalog,
        runtime_catalog,
        issues,
        notes,
        errors,
    }
}

fn to_issue(error: &SupportError) -> SupportIssue {
    SupportIssue {
        code: error
            .code()
            .map_or_else(|| "QSOL4006".to_string(), |code| code.to_string()),
        message: error.to_string(),
        capability: match error {
            SupportError::Unsupported { capability, .. } => Some(capability.clone()),
            SupportError::Target(_) => None,
        },
    }
}
