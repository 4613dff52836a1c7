// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Serializable artifact forms of the compiled model: the delegated `model.cqm` and
//! `model.bqm` documents, plus the `qubo.json` and `ising.json` exchange formats. All
//! collections are ordered so identical models serialize identically.

#[cfg(test)]
mod tests;

use crate::{
    emit::{CompiledModel, Sense},
    poly::Poly,
};
use qsolc_gir::gir::VarKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// The serialized CQM document (`model.cqm`).
#[derive(Debug, Serialize)]
pub struct CqmFile {
    pub kind: &'static str,
    pub variables: Vec<VariableEntry>,
    pub objective: PolyEntry,
    pub constraints: Vec<ConstraintEntry>,
}

/// One variable declaration in the CQM document.
#[derive(Debug, Serialize)]
pub struct VariableEntry {
    pub label: String,
    pub role: &'static str,
}

/// A serialized polynomial.
#[derive(Debug, Serialize)]
pub struct PolyEntry {
    pub offset: f64,
    pub linear: BTreeMap<String, f64>,
    pub quadratic: Vec<QuadTerm>,
}

/// A quadratic term between two labeled variables.
#[derive(Debug, Serialize)]
pub struct QuadTerm {
    pub u: String,
    pub v: String,
    pub bias: f64,
}

/// One constraint in the CQM document.
#[derive(Debug, Serialize)]
pub struct ConstraintEntry {
    pub label: String,
    pub lhs: PolyEntry,
    pub sense: Sense,
    pub rhs: f64,
}

/// The serialized BQM document (`model.bqm`).
#[derive(Debug, Serialize)]
pub struct BqmFile {
    pub offset: f64,
    pub linear: BTreeMap<String, f64>,
    pub quadratic: Vec<QuadTerm>,
    pub penalty_weight: f64,
}

/// The `qubo.json` document: `{offset, terms}` where a term with `u == v` is linear.
#[derive(Debug, Serialize)]
pub struct QuboFile {
    pub offset: f64,
    pub terms: Vec<QuboTerm>,
}

/// One QUBO term.
#[derive(Debug, Serialize)]
pub struct QuboTerm {
    pub u: String,
    pub v: String,
    pub bias: f64,
}

/// The `ising.json` document in spin space.
#[derive(Debug, Serialize)]
pub struct IsingFile {
    pub offset: f64,
    pub h: BTreeMap<String, f64>,
    #[serde(rename = "J")]
    pub j: BTreeMap<String, f64>,
}

/// Builds the CQM document.
#[must_use]
pub fn cqm_file(model: &CompiledModel) -> CqmFile {
    CqmFile {
        kind: model.kind,
        variables: model
            .vars
            .iter()
            .map(|(_, decl)| VariableEntry {
                label: decl.label.to_string(),
                role: match decl.kind {
                    VarKind::Primary => "primary",
                    VarKind::Aux => "aux",
                    VarKind::Slack => "slack",
                },
            })
            .collect(),
        objective: poly_entry(model, &model.objective),
        constraints: model
            .cqm
            .iter()
            .map(|constraint| ConstraintEntry {
                label: constraint.label.clone(),
                lhs: poly_entry(model, &constraint.poly),
                sense: constraint.sense,
                rhs: constraint.rhs,
            })
            .collect(),
    }
}

/// Builds the BQM document.
#[must_use]
pub fn bqm_file(model: &CompiledModel) -> BqmFile {
    let entry = poly_entry(model, &model.bqm);
    BqmFile {
        offset: entry.offset,
        linear: entry.linear,
        quadratic: entry.quadratic,
        penalty_weight: model.penalty_weight,
    }
}

/// Builds `qubo.json` from the BQM.
#[must_use]
pub fn qubo_file(model: &CompiledModel) -> QuboFile {
    let mut terms = Vec::new();
    for (&id, &bias) in &model.bqm.linear {
        let label = model.vars.get(id).label.to_string();
        terms.push(QuboTerm {
            u: label.clone(),
            v: label,
            bias,
        });
    }
    for (&(a, b), &bias) in &model.bqm.quadratic {
        terms.push(QuboTerm {
            u: model.vars.get(a).label.to_string(),
            v: model.vars.get(b).label.to_string(),
            bias,
        });
    }
    QuboFile {
        offset: model.bqm.offset,
        terms,
    }
}

/// Builds `ising.json` from the BQM with the substitution `x = (1 + s) / 2`.
#[must_use]
pub fn ising_file(model: &CompiledModel) -> IsingFile {
    let mut offset = model.bqm.offset;
    let mut h: BTreeMap<String, f64> = BTreeMap::new();
    let mut j: BTreeMap<String, f64> = BTreeMap::new();

    for (&id, &bias) in &model.bqm.linear {
        offset += bias / 2.0;
        *h.entry(model.vars.get(id).label.to_string()).or_insert(0.0) += bias / 2.0;
    }
    for (&(a, b), &bias) in &model.bqm.quadratic {
        let ua = model.vars.get(a).label.to_string();
        let ub = model.vars.get(b).label.to_string();
        offset += bias / 4.0;
        *h.entry(ua.clone()).or_insert(0.0) += bias / 4.0;
        *h.entry(ub.clone()).or_insert(0.0) += bias / 4.0;
        // Labels can contain commas (`F.is[a,b]`), so pair keys join with `|`.
        j.insert(format!("{ua}|{ub}"), bias / 4.0);
    }

    IsingFile { offset, h, j }
}

fn poly_entry(model: &CompiledModel, poly: &Poly) -> PolyEntry {
    PolyEntry {
        offset: poly.offset,
        linear: poly
            .linear
            .iter()
            .map(|(&id, &coef)| (model.vars.get(id).label.to_string(), coef))
            .collect(),
        quadratic: poly
            .quadratic
            .iter()
            .map(|(&(a, b), &bias)| QuadTerm {
                u: model.vars.get(a).label.to_string(),
                v: model.vars.get(b).label.to_string(),
                bias,
            })
            .collect(),
    }
}
