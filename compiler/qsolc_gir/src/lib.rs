// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The Ground IR: Kernel IR with all sets and parameters resolved against a scenario.
//! Every quantifier and aggregate has been expanded into a finite tree whose only
//! variable references are declared binary decision variables with stable labels.

pub mod gir;
