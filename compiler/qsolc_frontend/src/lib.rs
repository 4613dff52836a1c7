// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The QSOL front end: module loading, elaboration of user-defined unknowns and macros,
//! name resolution, type checking, and validation. The output is a [`compile::CompileUnit`]
//! holding the elaborated program, the name and type tables, and any diagnostics
//! collected along the way.

pub mod compile;
pub mod elaborate;
pub mod error;
pub mod loader;
pub mod resolve;
pub mod typeck;
pub mod validate;
