// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Artifact output: the files a pipeline run writes into its output directory.
//! `run.json` is only written for finalized runs; a cancelled pipeline may leave the
//! other artifacts behind but never an invalid final result.


use crate::{
    report::ExplainFile,
    run::StandardRunResult,
    support::SupportReport,
};
use miette::Diagnostic;
use qsolc_codegen::{emit::CompiledModel, export};
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error)]
#[error("cannot write `{0}`: {1}")]
#[diagnostic(code("QSOL4003"))]
pub struct WriteError(String, String);

/// Writes the model artifacts: `model.cqm`, `model.bqm`, `qubo.json`, `ising.json`,
/// and `varmap.json`.
///
/// # Errors
/// `QSOL4003` when a file cannot be written.
pub fn write_model(out_dir: &Path, model: &CompiledModel) -> Result<(), WriteError> {
    write_json(out_dir, "model.cqm", &export::cqm_file(model))?;
    write_json(out_dir, "model.bqm", &export::bqm_file(model))?;
    write_json(out_dir, "qubo.json", &export::qubo_file(model))?;
    write_json(out_dir, "ising.json", &export::ising_file(model))?;
    write_json(out_dir, "varmap.json", &model.varmap)?;
    Ok(())
}

/// Writes `capability_report.json` and returns its path.
///
/// # Errors
/// `QSOL4003` when the file cannot be written.
pub fn write_capability_report(
    out_dir: &Path,
    report: &SupportReport,
    model_stats: Option<&qsolc_codegen::emit::ModelStats>,
) -> Result<PathBuf, WriteError> {
    #[derive(Serialize)]
    struct CapabilityFile<'a> {
        #[serde(flatten)]
        report: &'a SupportReport,
        model_summary: ModelSummary<'a>,
    }

    #[derive(Serialize)]
    struct ModelSummary<'a> {
        kind: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        stats: Option<&'a qsolc_codegen::emit::ModelStats>,
    }

    let file = CapabilityFile {
        report,
        model_summary: ModelSummary {
            kind: "cqm",
            stats: model_stats,
        },
    };
    write_json(out_dir, "capability_report.json", &file)?;
    Ok(out_dir.join("capability_report.json"))
}

/// Writes the finalized `run.json`.
///
/// # Errors
/// `QSOL4003` when the file cannot be written.
pub fn write_run(out_dir: &Path, result: &StandardRunResult) -> Result<(), WriteError> {
    write_json(out_dir, "run.json", result)
}

/// Writes `explain.json`.
///
/// # Errors
/// `QSOL4003` when the file cannot be written.
pub fn write_explain(out_dir: &Path, explain: &ExplainFile) -> Result<(), WriteError> {
    write_json(out_dir, "explain.json", explain)
}

/// Writes the textual `qsol.log`.
///
/// # Errors
/// `QSOL4003` when the file cannot be written.
pub fn write_log(out_dir: &Path, lines: &[String]) -> Result<(), WriteError> {
    let path = out_dir.join("qsol.log");
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(&path, contents).map_err(|error| wrap(&path, &error))
}

fn write_json<T: Serialize>(out_dir: &Path, name: &str, value: &T) -> Result<(), WriteError> {
    let path = out_dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| WriteError(path.display().to_string(), error.to_string()))?;
    fs::create_dir_all(out_dir).map_err(|error| wrap(out_dir, &error))?;
    fs::write(&path, json).map_err(|error| wrap(&path, &error))
}

fn wrap(path: &Path, error: &io::Error) -> WriteError {
    WriteError(path.display().to_string(), error.to_string())
}
