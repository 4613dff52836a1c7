// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{BackendPlugin, CapabilityCatalog, Error, PluginRegistry, RuntimePlugin};
use crate::runtimes::{RawSample, RuntimeError, RuntimeOptions};
use qsolc_codegen::emit::CompiledModel;
use qsolc_gir::gir::GroundProblem;

struct FakeBackend(&'static str);

impl BackendPlugin for FakeBackend {
    fn id(&self) -> &str {
        self.0
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        CapabilityCatalog::new()
    }

    fn compile_model(
        &self,
        _: &GroundProblem,
    ) -> Result<CompiledModel, Vec<qsolc_codegen::Error>> {
        unimplemented!("not used by registry tests")
    }
}

struct FakeRuntime(&'static str);

impl RuntimePlugin for FakeRuntime {
    fn id(&self) -> &str {
        self.0
    }

    fn compatible_backend_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        CapabilityCatalog::new()
    }

    fn run_model(
        &self,
        _: &CompiledModel,
        _: &RuntimeOptions,
    ) -> Result<Vec<RawSample>, RuntimeError> {
        Ok(Vec::new())
    }
}

#[test]
fn builtins_are_registered_first() {
    let registry = PluginRegistry::with_builtins();
    assert_eq!(registry.backend_ids(), vec!["dimod-cqm-v1".to_string()]);
    assert_eq!(
        registry.runtime_ids(),
        vec!["exact-v1".to_string(), "anneal-v1".to_string()]
    );
}

#[test]
fn external_plugins_register_after_builtins() {
    let mut registry = PluginRegistry::with_builtins();
    registry
        .register_runtime(Box::new(FakeRuntime("vendor-rt")))
        .expect("new id should register");
    assert_eq!(registry.runtime_ids().last().map(String::as_str), Some("vendor-rt"));
}

#[test]
fn duplicate_backend_id_is_rejected() {
    let mut registry = PluginRegistry::with_builtins();
    let error = registry
        .register_backend(Box::new(FakeBackend("dimod-cqm-v1")))
        .expect_err("duplicate id should fail");
    assert!(matches!(error, Error::DuplicateId(id) if id == "dimod-cqm-v1"));
}

#[test]
fn duplicate_runtime_id_is_rejected() {
    let mut registry = PluginRegistry::new();
    registry
        .register_runtime(Box::new(FakeRuntime("rt")))
        .expect("first registration");
    let error = registry
        .register_runtime(Box::new(FakeRuntime("rt")))
        .expect_err("duplicate id should fail");
    assert!(matches!(error, Error::DuplicateId(_)));
}

#[test]
fn frozen_registry_rejects_registration() {
    let mut registry = PluginRegistry::with_builtins();
    registry.freeze();
    assert!(registry.is_frozen());
    let error = registry
        .register_runtime(Box::new(FakeRuntime("late")))
        .expect_err("frozen registry should fail");
    assert!(matches!(error, Error::Frozen));
}

#[test]
fn lookup_by_id() {
    let registry = PluginRegistry::with_builtins();
    assert!(registry.backend("dimod-cqm-v1").is_some());
    assert!(registry.runtime("exact-v1").is_some());
    assert!(registry.runtime("ghost").is_none());
}
