// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{bqm_file, cqm_file, ising_file, qubo_file};
use indoc::indoc;
use qsolc_data_structures::cancel::CancelToken;
use qsolc_ground::scenario::Scenario;

fn model() -> crate::emit::CompiledModel {
    let source = indoc! {"
        problem P {
            set Items;
            find Pick : Subset(Items);
            must sum(if Pick.has(i) then 1 else 0 for i in Items) = 1;
            minimize sum(if Pick.has(i) then 1 else 0 for i in Items);
        }
    "};
    let mut unit = qsolc_frontend::compile::compile(
        qsolc_frontend::compile::SourceMap::new([("test.qsol".into(), source.into())]),
        Vec::new(),
    );
    assert!(unit.errors.is_empty(), "errors: {:?}", unit.errors);
    qsolc_lowerer::desugar::desugar(&mut unit.program);
    let kernel = qsolc_lowerer::lower::lower(&unit.program, &unit.names)
        .into_iter()
        .next()
        .expect("problem");
    let scenario = Scenario::from_json(r#"{"sets": {"Items": ["i1", "i2"]}}"#).expect("scenario");
    let ground =
        qsolc_ground::ground::ground(&kernel, &scenario, &CancelToken::new()).expect("ground");
    crate::emit::emit(&ground).expect("emit")
}

#[test]
fn cqm_file_lists_variables_and_constraints() {
    let model = model();
    let file = cqm_file(&model);
    assert_eq!(file.kind, "cqm");
    assert_eq!(file.variables.len(), model.vars.len());
    assert_eq!(file.constraints.len(), 1);
    assert_eq!(file.constraints[0].rhs, 1.0);
    let json = serde_json::to_string(&file).expect("serializes");
    assert!(json.contains("Pick.has[i1]"));
}

#[test]
fn qubo_terms_use_u_equals_v_for_linear() {
    let model = model();
    let file = qubo_file(&model);
    assert_eq!(file.offset, model.bqm.offset);
    let linear_terms = file.terms.iter().filter(|t| t.u == t.v).count();
    let quad_terms = file.terms.iter().filter(|t| t.u != t.v).count();
    assert_eq!(linear_terms, model.bqm.linear.len());
    assert_eq!(quad_terms, model.bqm.quadratic.len());
}

#[test]
fn ising_preserves_energies() {
    // The spin model must agree with the binary model on every assignment, under
    // x = (1 + s) / 2.
    let model = model();
    let file = ising_file(&model);

    let labels: Vec<String> = model
        .vars
        .iter()
        .map(|(_, decl)| decl.label.to_string())
        .collect();
    let n = labels.len();
    for bits in 0u32..(1 << n) {
        let x = |i: usize| bits & (1 << i) != 0;
        let binary_energy = model
            .bqm
            .evaluate(|id| x(usize::from(id)));

        let spin = |i: usize| if x(i) { 1.0 } else { -1.0 };
        let mut spin_energy = file.offset;
        for (label, h) in &file.h {
            let index = labels.iter().position(|l| l == label).expect("label");
            spin_energy += h * spin(index);
        }
        for (pair, j) in &file.j {
            let (u, v) = pair.split_once('|').expect("pair key");
            let ui = labels.iter().position(|l| l == u).expect("label");
            let vi = labels.iter().position(|l| l == v).expect("label");
            spin_energy += j * spin(ui) * spin(vi);
        }
        assert!(
            (binary_energy - spin_energy).abs() < 1e-6,
            "assignment {bits:b}: binary {binary_energy} vs spin {spin_energy}"
        );
    }
}

#[test]
fn bqm_file_carries_penalty_weight() {
    let model = model();
    let file = bqm_file(&model);
    assert!(file.penalty_weight > 0.0);
    assert_eq!(file.offset, model.bqm.offset);
}
