// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use crate::{plugins, runtimes::RuntimeError, support::SupportError, target};
use miette::Diagnostic;
use qsolc_frontend::error::Reported;
use thiserror::Error;

/// Any failure the pipeline can report. Every variant carries a stable `QSOLxxxx`
/// diagnostic code through its source.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(Box<Reported<qsolc_frontend::compile::Error>>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ground(Box<Reported<qsolc_ground::ground::Error>>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codegen(Box<Reported<qsolc_codegen::Error>>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Target(#[from] target::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] plugins::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Support(#[from] SupportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Artifact(#[from] crate::artifacts::WriteError),

    #[error("scenario names problem `{0}`, which the program does not declare")]
    #[diagnostic(code("QSOL4002"))]
    UnknownProblem(String),

    #[error("program declares {0} problems; the scenario must name one")]
    #[diagnostic(code("QSOL4002"))]
    AmbiguousProblem(usize),

    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    /// The stable diagnostic code, when the error carries one.
    #[must_use]
    pub fn code_string(&self) -> Option<String> {
        self.code().map(|code| code.to_string())
    }
}
