// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! The scenario payload: concrete set members and parameter values for one grounding
//! run. Scenarios are materialized by the caller (typically from a config file) and
//! deserialized with serde; the grounder only reads them.

#[cfg(test)]
mod tests;

use serde::Deserialize;
use std::collections::BTreeMap;

/// A concrete data scenario.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Scenario {
    /// The problem this scenario targets; needed when a program declares several.
    #[serde(default)]
    pub problem: Option<String>,
    /// Ordered members for each declared set.
    #[serde(default)]
    pub sets: BTreeMap<String, Vec<String>>,
    /// Values for declared parameters: scalars or nested maps keyed by element ids.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl Scenario {
    /// Parses a scenario from its JSON form.
    ///
    /// # Errors
    /// Returns the underlying serde error when the payload is malformed.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// A parameter value: a scalar or a nested map with one level per index set.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A boolean scalar.
    Bool(bool),
    /// A numeric scalar.
    Num(f64),
    /// An element id, for `Elem(...)` parameters.
    Str(String),
    /// One map level per index set, keyed by element id.
    Map(BTreeMap<String, ParamValue>),
}
