// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Desugaring and lowering: the typed AST is normalized into Kernel IR. The desugarer
//! rewrites guards, `count`/`any`/`all`, and filtered sums into kernel forms; the
//! lowerer canonicalizes comparisons and objectives and produces [`qsolc_kir`] nodes.
//! Both passes are semantics-preserving and idempotent.

pub mod desugar;
pub mod lower;
