// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{check, SupportError};
use crate::{
    plugins::{
        BackendPlugin, CapabilityCatalog, CapabilityLevel, PluginRegistry, RuntimePlugin,
    },
    runtimes::{RawSample, RuntimeError, RuntimeOptions},
    target::{self, TargetSelection},
    test_utils,
};
use qsolc_codegen::emit::CompiledModel;
use qsolc_gir::gir::GroundProblem;

const SOURCE: &str = indoc::indoc! {"
    problem P {
        set Items;
        find Pick : Subset(Items);
        must sum(if Pick.has(i) then 1 else 0 for i in Items) = 2;
    }
"};
const DATA: &str = r#"{"sets": {"Items": ["i1", "i2", "i3"]}}"#;

fn selection(runtime: &str, backend: &str) -> TargetSelection {
    TargetSelection {
        runtime_id: runtime.to_string(),
        backend_id: backend.to_string(),
    }
}

#[test]
fn builtin_pair_is_supported() {
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(
        &PluginRegistry::with_builtins(),
        &selection("exact-v1", "dimod-cqm-v1"),
        &ground,
    );
    assert!(report.supported, "issues: {:?}", report.issues);
    assert!(report.issues.is_empty());
    assert!(!report.required_capabilities.is_empty());
}

#[test]
fn unknown_runtime_id_is_reported() {
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(
        &PluginRegistry::with_builtins(),
        &selection("ghost-rt", "dimod-cqm-v1"),
        &ground,
    );
    assert!(!report.supported);
    assert_eq!(report.issues[0].code, "QSOL4007");
}

#[test]
fn empty_selection_is_unresolved() {
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(
        &PluginRegistry::with_builtins(),
        &selection("", "dimod-cqm-v1"),
        &ground,
    );
    assert!(!report.supported);
    assert_eq!(report.issues[0].code, "QSOL4006");
}

struct ForeignRuntime;

impl RuntimePlugin for ForeignRuntime {
    fn id(&self) -> &str {
        "foreign-rt"
    }

    fn compatible_backend_ids(&self) -> Vec<String> {
        vec!["some-other-backend".to_string()]
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        crate::runtimes::DimodCqmBackend.capability_catalog()
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
fn incompatible_pair_is_reported() {
    let mut registry = PluginRegistry::with_builtins();
    registry
        .register_runtime(Box::new(ForeignRuntime))
        .expect("registration");
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(&registry, &selection("foreign-rt", "dimod-cqm-v1"), &ground);
    assert!(!report.supported);
    assert_eq!(report.issues[0].code, "QSOL4008");
    assert!(matches!(
        report.errors[0],
        SupportError::Target(target::Error::Incompatible(..))
    ));
}

struct WeakBackend;

impl BackendPlugin for WeakBackend {
    fn id(&self) -> &str {
        "weak-be"
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        // Declares subsets only partially and nothing else.
        [(
            qsolc_rca::UNKNOWN_SUBSET.to_string(),
            CapabilityLevel::Partial,
        )]
        .into_iter()
        .collect()
    }

    fn compile_model(
        &self,
        ground: &GroundProblem,
    ) -> Result<CompiledModel, Vec<qsolc_codegen::Error>> {
        qsolc_codegen::emit::emit(ground)
    }
}

struct WeakRuntime;

impl RuntimePlugin for WeakRuntime {
    fn id(&self) -> &str {
        "weak-rt"
    }

    fn compatible_backend_ids(&self) -> Vec<String> {
        vec!["weak-be".to_string()]
    }

    fn capability_catalog(&self) -> CapabilityCatalog {
        crate::runtimes::DimodCqmBackend.capability_catalog()
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
fn missing_capability_is_unsupported_and_partial_is_noted() {
    let mut registry = PluginRegistry::new();
    registry
        .register_backend(Box::new(WeakBackend))
        .expect("registration");
    registry
        .register_runtime(Box::new(WeakRuntime))
        .expect("registration");
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(&registry, &selection("weak-rt", "weak-be"), &ground);

    assert!(!report.supported);
    // The equality capability is required but absent from the weak backend.
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.code == "QSOL4010"
            && issue.capability.as_deref() == Some("constraint.compare.eq.v1")));
    // The partial subset support is noted, not fatal by itself.
    assert!(report
        .notes
        .iter()
        .any(|note| note.contains("unknown.subset.v1")));
}

#[test]
fn report_serializes() {
    let ground = test_utils::ground(SOURCE, DATA);
    let report = check(
        &PluginRegistry::with_builtins(),
        &selection("exact-v1", "dimod-cqm-v1"),
        &ground,
    );
    let json = serde_json::to_string(&report).expect("report should serialize");
    assert!(json.contains("required_capabilities"));
    assert!(json.contains("exact-v1"));
}
