// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The Kernel IR: the minimal normalized expression language the grounder consumes.
//! After desugaring and lowering, only this reduced form survives: quantifiers, `sum`,
//! numeric if-then-else, canonical comparisons (`<`, `<=`, `=`), boolean connectives,
//! method calls on primitive finds, parameter reads, and literals. There are no guards,
//! no `count`/`any`/`all`, and no filter/else sugar.

pub mod kir;
