// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Backend code generation: Ground IR is emitted as a constrained quadratic model
//! (CQM), then converted into an unconstrained binary quadratic model (BQM) by turning
//! every constraint into a quadratic penalty. Boolean structure is encoded with the
//! standard QUBO gadgets, introducing `aux:` binaries; inequalities become equalities
//! with `slack_` binaries in the penalty form. The varmap ties primary binaries back to
//! their user-level meanings.

pub mod emit;
pub mod export;
pub mod poly;

use miette::Diagnostic;
use qsolc_data_structures::span::Span;
use thiserror::Error;

/// Backend errors: everything the quadratic target cannot express.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum Error {
    #[error("expression exceeds quadratic degree after substitution")]
    #[diagnostic(code("QSOL3001"))]
    #[diagnostic(help("products of more than two decision variables cannot be encoded"))]
    Degree(#[label("this expression")] Span),

    #[error("division by a non-constant expression")]
    #[diagnostic(code("QSOL3001"))]
    DivisionByVariable(#[label] Span),

    #[error("comparison cannot be encoded in this position")]
    #[diagnostic(code("QSOL3001"))]
    #[diagnostic(help(
        "nested comparisons must have boolean-valued operands; numeric comparisons are only supported as whole constraints"
    ))]
    NestedComparison(#[label] Span),

    #[error("constraint penalty exceeds quadratic degree")]
    #[diagnostic(code("QSOL3001"))]
    #[diagnostic(help(
        "penalty conversion squares the constraint residual; only linear residuals and single products can be squared"
    ))]
    PenaltyDegree(#[label] Span),
}
