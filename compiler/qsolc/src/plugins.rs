// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The plugin registry. Backends compile Ground IR into quadratic models and declare a
//! capability catalog; runtimes sample compiled models and declare which backends they
//! can consume. Built-in plugins register first, then externally supplied bundles in
//! registration order with exact-string deduplication; after `freeze` the registry is
//! read-only for the rest of the process.

#[cfg(test)]
mod tests;

use crate::runtimes::{RawSample, RuntimeError, RuntimeOptions};
use miette::Diagnostic;
use qsolc_codegen::emit::CompiledModel;
use qsolc_gir::gir::GroundProblem;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// How fully a backend or runtime supports a capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityLevel {
    /// Fully supported.
    Full,
    /// Supported with caveats; selection proceeds with a recorded note.
    Partial,
    /// Not supported; selection fails.
    None,
}

/// A capability catalog: capability id to declared support level.
pub type CapabilityCatalog = BTreeMap<String, CapabilityLevel>;

/// A backend plugin: compiles Ground IR to a quadratic model.
pub trait BackendPlugin {
    /// The stable backend id.
    fn id(&self) -> &str;

    /// The capabilities this backend declares.
    fn capability_catalog(&self) -> CapabilityCatalog;

    /// Compiles a ground problem.
    ///
    /// # Errors
    /// Backend shape errors (`QSOL3001`).
    fn compile_model(&self, ground: &GroundProblem) -> Result<CompiledModel, Vec<qsolc_codegen::Error>>;
}

/// A runtime plugin: samples a compiled model.
pub trait RuntimePlugin {
    /// The stable runtime id.
    fn id(&self) -> &str;

    /// Backend ids this runtime can consume.
    fn compatible_backend_ids(&self) -> Vec<String>;

    /// The capabilities this runtime declares, checked alongside the backend's.
    fn capability_catalog(&self) -> CapabilityCatalog;

    /// Runs the model and returns raw samples.
    ///
    /// # Errors
    /// Runtime execution errors (`QSOL5001`).
    fn run_model(
        &self,
        model: &CompiledModel,
        options: &RuntimeOptions,
    ) -> Result<Vec<RawSample>, RuntimeError>;
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("duplicate plugin id `{0}`")]
    #[diagnostic(code("QSOL4009"))]
    DuplicateId(String),

    #[error("plugin registry is frozen")]
    #[diagnostic(code("QSOL4009"))]
    Frozen,
}

/// The process-wide plugin registry.
#[derive(Default)]
pub struct PluginRegistry {
    backends: Vec<Box<dyn BackendPlugin>>,
    runtimes: Vec<Box<dyn RuntimePlugin>>,
    frozen: bool,
}

impl PluginRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in plugins already inserted.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_backend(Box::new(crate::runtimes::DimodCqmBackend))
            .expect("built-in backend id should be unique");
        registry
            .register_runtime(Box::new(crate::runtimes::ExactRuntime))
            .expect("built-in runtime id should be unique");
        registry
            .register_runtime(Box::new(crate::runtimes::AnnealRuntime))
            .expect("built-in runtime id should be unique");
        registry
    }

    /// Registers a backend.
    ///
    /// # Errors
    /// Fails on duplicate ids or a frozen registry (`QSOL4009`).
    pub fn register_backend(&mut self, backend: Box<dyn BackendPlugin>) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        if self.backends.iter().any(|b| b.id() == backend.id()) {
            return Err(Error::DuplicateId(backend.id().to_string()));
        }
        self.backends.push(backend);
        Ok(())
    }

    /// Registers a runtime.
    ///
    /// # Errors
    /// Fails on duplicate ids or a frozen registry (`QSOL4009`).
    pub fn register_runtime(&mut self, runtime: Box<dyn RuntimePlugin>) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::Frozen);
        }
        if self.runtimes.iter().any(|r| r.id() == runtime.id()) {
            return Err(Error::DuplicateId(runtime.id().to_string()));
        }
        self.runtimes.push(runtime);
        Ok(())
    }

    /// Freezes the registry; later registrations fail.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the registry is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Looks up a backend by id.
    #[must_use]
    pub fn backend(&self, id: &str) -> Option<&dyn BackendPlugin> {
        self.backends
            .iter()
            .find(|b| b.id() == id)
            .map(Box::as_ref)
    }

    /// Looks up a runtime by id.
    #[must_use]
    pub fn runtime(&self, id: &str) -> Option<&dyn RuntimePlugin> {
        self.runtimes
            .iter()
            .find(|r| r.id() == id)
            .map(Box::as_ref)
    }

    /// All backend ids, in registration order.
    #[must_use]
    pub fn backend_ids(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.id().to_string()).collect()
    }

    /// All runtime ids, in registration order.
    #[must_use]
    pub fn runtime_ids(&self) -> Vec<String> {
        self.runtimes.iter().map(|r| r.id().to_string()).collect()
    }
}
