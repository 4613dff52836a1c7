// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use qsolc_codegen::emit::CompiledModel;
use qsolc_data_structures::cancel::CancelToken;
use qsolc_gir::gir::GroundProblem;
use qsolc_ground::scenario::Scenario;

/// Compiles, desugars, lowers, and grounds one problem, panicking on any diagnostic.
pub(crate) fn ground(source: &str, scenario: &str) -> GroundProblem {
    let mut unit = qsolc_frontend::compile::compile(
        qsolc_frontend::compile::SourceMap::new([("test.qsol".into(), source.into())]),
        Vec::new(),
    );
    assert!(unit.errors.is_empty(), "errors: {:?}", unit.errors);
    qsolc_lowerer::desugar::desugar(&mut unit.program);
    let kernel = qsolc_lowerer::lower::lower(&unit.program, &unit.names)
        .into_iter()
        .next()
        .expect("source should declare a problem");
    let scenario = Scenario::from_json(scenario).expect("scenario should parse");
    qsolc_ground::ground::ground(&kernel, &scenario, &CancelToken::new())
        .expect("grounding should succeed")
}

/// Grounds and emits one problem.
pub(crate) fn model(source: &str, scenario: &str) -> CompiledModel {
    qsolc_codegen::emit::emit(&ground(source, scenario)).expect("emission should succeed")
}

/// A unique scratch directory under the system temp dir.
pub(crate) fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "qsolc-test-{tag}-{}-{:?}",
        std::process::id(),
        std::thread::current().id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}
