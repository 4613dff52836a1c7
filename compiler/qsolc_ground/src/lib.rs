// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The grounder expands a Kernel IR problem against a concrete scenario: sets bind to
//! ordered element lists, parameters bind to values (falling back to model defaults),
//! and every quantifier and aggregate is expanded over its finite domain, producing a
//! Ground IR whose only variable references are binary decision variables with stable
//! labels.

pub mod ground;
pub mod scenario;
