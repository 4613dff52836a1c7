// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The pipeline driver: one compilation-and-run pipeline per scenario, with strict
//! sequential stage ordering inside a run and deterministic, declaration-ordered
//! results across scenarios. Cancellation is honored at every stage boundary; a
//! cancelled run reports [`Error::Cancelled`] and never finalizes `run.json`.

#[cfg(test)]
mod tests;

use crate::{
    artifacts,
    error::Error,
    plugins::PluginRegistry,
    report::{self, ExplainFile},
    run::{postprocess, RunStatus, StandardRunResult},
    runtimes::RuntimeOptions,
    support,
    target::{self, SelectionLayer},
};
use qsolc_data_structures::cancel::CancelToken;
use qsolc_frontend::{
    compile::{compile, CompileUnit, SourceMap},
    error::Reported,
    loader::Loader,
};
use qsolc_ground::scenario::Scenario;
use qsolc_kir::kir::KernelProblem;
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
    time::Instant,
};

/// Static pipeline configuration shared by every scenario of a run.
#[derive(Default)]
pub struct PipelineConfig {
    /// Where artifacts are written; no artifacts when absent.
    pub out_dir: Option<PathBuf>,
    /// The CLI selection layer (strongest).
    pub cli_selection: SelectionLayer,
    /// The config entrypoint selection layer (weakest before defaults).
    pub config_selection: SelectionLayer,
    /// CLI `--runtime-option` pairs (strongest).
    pub cli_options: BTreeMap<String, Value>,
    /// The `--runtime-options-file` contents.
    pub options_file: BTreeMap<String, Value>,
    /// Config-level runtime option defaults (weakest).
    pub config_options: BTreeMap<String, Value>,
    /// How multi-scenario solutions merge.
    pub merge: MergePolicy,
    /// Whether one failing scenario fails the whole run.
    pub failure_policy: FailurePolicy,
}

/// How decoded solutions from multiple scenarios combine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MergePolicy {
    /// Keep only solutions appearing in every scenario's top-K.
    #[default]
    Intersection,
    /// Keep the union of all scenarios' top-K solutions.
    Union,
}

/// What a scenario failure does to the remaining scenarios.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// The first failure stops the run.
    #[default]
    FailFast,
    /// Remaining scenarios still execute; failures are reported per scenario.
    BestEffort,
}

/// One scenario to run: its payload plus the selection and option layers it carries.
#[derive(Clone, Debug, Default)]
pub struct ScenarioSpec {
    pub name: String,
    pub scenario: Scenario,
    /// The scenario execution section's selection layer.
    pub selection: SelectionLayer,
    /// The scenario solve section's runtime options.
    pub solve_options: BTreeMap<String, Value>,
}

/// The outcome of one scenario's pipeline.
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<StandardRunResult, Vec<Error>>,
}

/// The joined outcome of a multi-scenario run. Outcomes keep scenario declaration
/// order regardless of completion order.
pub struct MultiRunResult {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Canonical solution signatures after applying the merge policy.
    pub merged: Vec<String>,
}

/// Drives compilations and runs against a frozen plugin registry.
pub struct Interpreter {
    registry: PluginRegistry,
    config: PipelineConfig,
    cancel: CancelToken,
}

impl Interpreter {
    /// An interpreter over the built-in plugins.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_registry(PluginRegistry::with_builtins(), config)
    }

    /// An interpreter over a caller-assembled registry; the registry is frozen here.
    #[must_use]
    pub fn with_registry(mut registry: PluginRegistry, config: PipelineConfig) -> Self {
        registry.freeze();
        Self {
            registry,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// The cancellation token callers may trip from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Compiles a root module through the front end, loading its imports.
    ///
    /// # Errors
    /// All diagnostics of the first failing stage.
    pub fn compile_source(&self, name: &str, text: &str) -> Result<CompileUnit, Vec<Error>> {
        let (sources, loader_errors) = Loader::new().load_root(name, text, None);
        let pre_errors = loader_errors
            .into_iter()
            .map(qsolc_frontend::compile::Error::from)
            .collect();
        let unit = compile(sources, pre_errors);
        if unit.errors.is_empty() {
            Ok(unit)
        } else {
            let errors = unit
                .errors
                .iter()
                .map(|error| {
                    Error::Compile(Box::new(Reported::new(&unit.sources, error.clone())))
                })
                .collect();
            Err(errors)
        }
    }

    /// Runs one scenario end to end and returns its decoded result.
    ///
    /// # Errors
    /// The diagnostics of whichever stage failed; a threshold violation returns the
    /// finalized result with status `threshold_failed` alongside its `QSOL5002`.
    pub fn run_scenario(
        &self,
        name: &str,
        text: &str,
        spec: &ScenarioSpec,
    ) -> Result<StandardRunResult, Vec<Error>> {
        let started = Instant::now();
        let mut log_lines: Vec<String> = Vec::new();
        let mut explain = ExplainFile::default();

        let outcome = self.run_scenario_inner(name, text, spec, started, &mut log_lines, &mut explain);

        if let Err(errors) = &outcome {
            // Failed runs still leave their diagnostics behind.
            for error in errors {
                let entry = report::entry(error, &SourceMap::default());
                log_lines.push(report::render_line(&entry));
                explain.diagnostics.push(entry);
            }
        }
        if let Some(out_dir) = &self.config.out_dir {
            let _ = artifacts::write_explain(out_dir, &explain);
            let _ = artifacts::write_log(out_dir, &log_lines);
        }

        outcome
    }

    #[allow(clippy::too_many_lines)]
    fn run_scenario_inner(
        &self,
        name: &str,
        text: &str,
        spec: &ScenarioSpec,
        started: Instant,
        log_lines: &mut Vec<String>,
        explain: &mut ExplainFile,
    ) -> Result<StandardRunResult, Vec<Error>> {
        log_lines.push(format!("compile {name}"));
        let unit = self.compile_source(name, text)?;
        self.checkpoint()?;

        let mut program = unit.program;
        qsolc_lowerer::desugar::desugar(&mut program);
        let kernels = qsolc_lowerer::lower::lower(&program, &unit.names);
        self.checkpoint()?;

        let kernel = select_problem(&kernels, spec.scenario.problem.as_deref())?;
        log_lines.push(format!("ground problem `{}`", kernel.name));

        let ground = qsolc_ground::ground::ground(kernel, &spec.scenario, &self.cancel)
            .map_err(|errors| {
                if self.cancel.is_cancelled() {
                    return vec![Error::Cancelled];
                }
                errors
                    .into_iter()
                    .map(|error| {
                        Error::Ground(Box::new(Reported::new(&unit.sources, error)))
                    })
                    .collect::<Vec<_>>()
            })?;
        self.checkpoint()?;

        let selection = target::resolve(
            &self.config.cli_selection,
            &spec.selection,
            &self.config.config_selection,
        );
        log_lines.push(format!(
            "target runtime `{}` backend `{}`",
            selection.runtime_id, selection.backend_id
        ));

        let support = support::check(&self.registry, &selection, &ground);
        for note in &support.notes {
            log_lines.push(format!("note: {note}"));
        }
        if !support.supported {
            if let Some(out_dir) = &self.config.out_dir {
                let _ = artifacts::write_capability_report(out_dir, &support, None);
            }
            return Err(support
                .errors
                .into_iter()
                .map(Error::from)
                .collect());
        }

        let backend = self
            .registry
            .backend(&selection.backend_id)
            .expect("support check should have verified the backend");
        let model = backend.compile_model(&ground).map_err(|errors| {
            errors
                .into_iter()
                .map(|error| Error::Codegen(Box::new(Reported::new(&unit.sources, error))))
                .collect::<Vec<_>>()
        })?;
        self.checkpoint()?;
        log_lines.push(format!(
            "compiled model: {} variables, {} constraints, {} interactions",
            model.stats.num_variables, model.stats.num_constraints, model.stats.num_interactions
        ));

        let mut capability_report_path = None;
        if let Some(out_dir) = &self.config.out_dir {
            artifacts::write_model(out_dir, &model).map_err(|e| vec![Error::from_write(e)])?;
            let path = artifacts::write_capability_report(out_dir, &support, Some(&model.stats))
                .map_err(|e| vec![Error::from_write(e)])?;
            capability_report_path = Some(path.display().to_string());
        }

        let options = RuntimeOptions::layered(&[
            &self.config.cli_options,
            &self.config.options_file,
            &spec.solve_options,
            &self.config.config_options,
        ]);

        let runtime = self
            .registry
            .runtime(&selection.runtime_id)
            .expect("support check should have verified the runtime");
        log_lines.push(format!("dispatch to `{}`", selection.runtime_id));
        let samples = runtime
            .run_model(&model, &options)
            .map_err(|error| vec![Error::Runtime(error)])?;
        self.checkpoint()?;

        let timing_ms = started.elapsed().as_millis();
        let (mut result, runtime_error) = postprocess(
            &model,
            &selection.runtime_id,
            &selection.backend_id,
            samples,
            &options,
            timing_ms,
        );
        result.capability_report_path = capability_report_path;

        if result.status == RunStatus::Failed {
            let error = runtime_error.map_or_else(
                || Error::Runtime(crate::runtimes::RuntimeError::Execution(
                    "runtime returned no feasible sample".to_string(),
                )),
                Error::Runtime,
            );
            return Err(vec![error]);
        }

        if let Some(out_dir) = &self.config.out_dir {
            artifacts::write_run(out_dir, &result).map_err(|e| vec![Error::from_write(e)])?;
        }
        log_lines.push(format!(
            "run finished with status {:?} after {timing_ms} ms",
            result.status
        ));

        if let Some(error) = runtime_error {
            // Threshold violations finalize the run but still surface their code to
            // the caller for a non-zero process exit.
            let entry = report::entry(&error, &unit.sources);
            log_lines.push(report::render_line(&entry));
            explain.diagnostics.push(entry);
        }

        Ok(result)
    }

    /// Runs every scenario in declaration order and merges the decoded solutions.
    #[must_use]
    pub fn run_scenarios(
        &self,
        name: &str,
        text: &str,
        specs: &[ScenarioSpec],
    ) -> MultiRunResult {
        let mut outcomes = Vec::new();
        for spec in specs {
            if self.cancel.is_cancelled() {
                outcomes.push(ScenarioOutcome {
                    name: spec.name.clone(),
                    result: Err(vec![Error::Cancelled]),
                });
                continue;
            }
            let result = self.run_scenario(name, text, spec);
            let failed = result.is_err();
            outcomes.push(ScenarioOutcome {
                name: spec.name.clone(),
                result,
            });
            if failed && self.config.failure_policy == FailurePolicy::FailFast {
                break;
            }
        }

        let merged = merge_solutions(&outcomes, self.config.merge);
        MultiRunResult { outcomes, merged }
    }

    fn checkpoint(&self) -> Result<(), Vec<Error>> {
        if self.cancel.is_cancelled() {
            Err(vec![Error::Cancelled])
        } else {
            Ok(())
        }
    }
}

impl Error {
    fn from_write(error: artifacts::WriteError) -> Self {
        Error::Artifact(error)
    }
}

fn select_problem<'a>(
    kernels: &'a [KernelProblem],
    requested: Option<&str>,
) -> Result<&'a KernelProblem, Vec<Error>> {
    match requested {
        Some(name) => kernels
            .iter()
            .find(|kernel| kernel.name.as_ref() == name)
            .ok_or_else(|| vec![Error::UnknownProblem(name.to_string())]),
        None if kernels.len() == 1 => Ok(&kernels[0]),
        None => Err(vec![Error::AmbiguousProblem(kernels.len())]),
    }
}

/// Builds canonical solution signatures per scenario and applies the merge policy.
/// Signatures sort lexicographically so the merged list is deterministic.
fn merge_solutions(outcomes: &[ScenarioOutcome], policy: MergePolicy) -> Vec<String> {
    let per_scenario: Vec<BTreeSet<String>> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok())
        .map(|result| {
            result
                .extensions
                .solutions
                .iter()
                .map(|solution| {
                    solution
                        .assignments
                        .iter()
                        .map(|assignment| assignment.meaning.clone())
                        .collect::<Vec<_>>()
                        .join(" & ")
                })
                .collect()
        })
        .collect();

    let Some(first) = per_scenario.first() else {
        return Vec::new();
    };

    let merged: BTreeSet<String> = match policy {
        MergePolicy::Intersection => first
            .iter()
            .filter(|signature| per_scenario.iter().all(|set| set.contains(*signature)))
            .cloned()
            .collect(),
        MergePolicy::Union => per_scenario.iter().flatten().cloned().collect(),
    };
    merged.into_iter().collect()
}
